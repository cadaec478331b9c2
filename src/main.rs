//! corsica-irc - IRC bridge daemon.
//!
//! Runs one bridge session and prints forwarded commands to stdout as JSON lines.

use corsica_irc::config::{self, Config, IrcSettings, StoreBackend};
use corsica_irc::store::{FileStore, MemoryStore, SettingsHandle, SettingsStore};
use corsica_irc::{
    Bridge, ConnectionOptions, IrcConnection, SessionParts, StdoutBus, http, metrics, telemetry,
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration; no argument means built-in defaults.
    let config_path = std::env::args().nth(1);
    let config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    telemetry::init(config.logging.format);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "configuration has {} error(s), see log above",
            errors.len()
        ));
    }

    info!(
        config = config_path.as_deref().unwrap_or("<defaults>"),
        namespace = %config.settings.namespace,
        "Starting corsica-irc"
    );

    // Convention: port 0 disables the HTTP endpoint.
    let http_enabled = config.metrics.port != 0;
    if http_enabled {
        metrics::init();
    } else {
        info!("Metrics and health endpoint disabled");
    }

    let store: Arc<dyn SettingsStore> = match config.settings.backend {
        StoreBackend::File => {
            let store = Arc::new(FileStore::open(config.settings.path.clone()).await?);
            let _watcher = FileStore::spawn_watcher(&store, config.settings.poll_interval());
            info!(path = %config.settings.path.display(), "Using settings file");
            store
        }
        StoreBackend::Memory => {
            warn!("Using in-memory settings; changes are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let defaults = IrcSettings::default();
    let settings = SettingsHandle::setup(store, config.settings.namespace.clone(), defaults.clone());
    let options = ConnectionOptions::new(&defaults, &config.identity);
    let (connection, events) = IrcConnection::new(options, &config.connection);

    let bridge = Bridge::spawn(
        SessionParts {
            settings,
            connection,
            events,
            bus: Arc::new(StdoutBus::stdout()),
            policy: config.connection.clone(),
        },
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C, running until killed");
                std::future::pending::<()>().await;
            }
        },
    );

    if http_enabled {
        tokio::spawn(http::run_http_server(config.metrics.socket_addr(), bridge.status()));
    }

    bridge.join().await;
    info!("corsica-irc stopped");
    Ok(())
}
