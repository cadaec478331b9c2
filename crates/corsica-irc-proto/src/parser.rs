//! Nom grammar for a single IRC line.
//!
//! ```text
//! [@tags SPACE] [:prefix SPACE] <command> *( SPACE param ) [ SPACE :trailing ]
//! ```

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space1},
    combinator::{cut, opt, rest},
    error::ErrorKind,
    sequence::{preceded, terminated},
    IResult,
};

use crate::error::MessageParseError;

/// RFC 2812 limit on parameters per message.
pub(crate) const MAX_PARAMS: usize = 15;

type NomErr<'a> = nom::Err<nom::error::Error<&'a str>>;

/// Borrowed pieces of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedLine<'a> {
    /// Raw prefix without the leading `:`.
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub params: Vec<&'a str>,
}

/// Tags are skipped; an `@` with nothing after it but tags is unterminated.
fn parse_tags(input: &str) -> IResult<&str, &str> {
    terminated(preceded(char('@'), cut(take_until(" "))), space1)(input)
}

fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(
        char(':'),
        cut(terminated(take_while1(|c| c != ' '), space1)),
    )(input)
}

/// `1*letter / 3digit`
fn parse_command(input: &str) -> IResult<&str, &str> {
    let (rest, cmd) = take_while1::<_, _, nom::error::Error<&str>>(|c: char| {
        c.is_ascii_alphanumeric()
    })(input)?;

    let is_all_letters = cmd.chars().all(|c| c.is_ascii_alphabetic());
    let is_three_digits = cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit());

    if is_all_letters || is_three_digits {
        Ok((rest, cmd))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::AlphaNumeric,
        )))
    }
}

fn parse_trailing(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), rest)(input)
}

fn parse_middle(input: &str) -> IResult<&str, &str> {
    take_while1(|c| c != ' ')(input)
}

fn parse_last(input: &str) -> IResult<&str, &str> {
    preceded(opt(char(':')), rest)(input)
}

fn separator(input: &str) -> IResult<&str, &str> {
    space1(input)
}

/// Parameters after the command, each introduced by one or more spaces.
///
/// The fifteenth parameter takes the rest of the line, spaces included,
/// whether or not it starts with `:`.
fn parse_params(mut input: &str) -> IResult<&str, Vec<&str>> {
    let mut params = Vec::new();

    while !input.is_empty() {
        let (after_space, _) = separator(input)?;
        if after_space.is_empty() {
            return Ok((after_space, params));
        }

        if params.len() == MAX_PARAMS - 1 {
            let (remaining, last) = parse_last(after_space)?;
            params.push(last);
            return Ok((remaining, params));
        }

        if let Ok((remaining, trailing)) = parse_trailing(after_space) {
            params.push(trailing);
            return Ok((remaining, params));
        }

        let (remaining, middle) = parse_middle(after_space)?;
        params.push(middle);
        input = remaining;
    }

    Ok((input, params))
}

/// Split a line (CRLF already trimmed or not) into prefix, command and parameters.
pub(crate) fn parse_line(input: &str) -> Result<ParsedLine<'_>, MessageParseError> {
    let line = input.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Err(MessageParseError::EmptyMessage);
    }

    let (line, _tags) =
        opt(parse_tags)(line).map_err(|_: NomErr<'_>| MessageParseError::UnterminatedTags)?;
    let (line, prefix) =
        opt(parse_prefix)(line).map_err(|_: NomErr<'_>| MessageParseError::UnterminatedOrigin)?;
    let (line, command) =
        parse_command(line).map_err(|_: NomErr<'_>| MessageParseError::InvalidCommand)?;
    let (_, params) =
        parse_params(line).map_err(|_: NomErr<'_>| MessageParseError::InvalidCommand)?;

    Ok(ParsedLine {
        prefix,
        command,
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_prefix_command_and_trailing() {
        let parsed = parse_line(":alice!a@h PRIVMSG #bots :hello  there\r\n").unwrap();
        assert_eq!(parsed.prefix, Some("alice!a@h"));
        assert_eq!(parsed.command, "PRIVMSG");
        assert_eq!(parsed.params, vec!["#bots", "hello  there"]);
    }

    #[test]
    fn fifteenth_param_keeps_the_rest_of_the_line() {
        let line = "CMD p1 p2 p3 p4 p5 p6 p7 p8 p9 p10 p11 p12 p13 p14 p15 with spaces";
        let parsed = parse_line(line).unwrap();
        assert_eq!(parsed.params.len(), MAX_PARAMS);
        assert_eq!(parsed.params[13], "p14");
        assert_eq!(parsed.params[14], "p15 with spaces");
    }

    #[test]
    fn fifteenth_param_drops_its_colon() {
        let line = "CMD 1 2 3 4 5 6 7 8 9 10 11 12 13 14 :last one";
        let parsed = parse_line(line).unwrap();
        assert_eq!(parsed.params[14], "last one");
    }

    #[test]
    fn trailing_space_is_not_a_parameter() {
        let parsed = parse_line("JOIN #bots ").unwrap();
        assert_eq!(parsed.params, vec!["#bots"]);
    }

    #[test]
    fn command_shape_is_enforced() {
        assert_eq!(parse_line("PRIV-MSG #x"), Err(MessageParseError::InvalidCommand));
        assert_eq!(parse_line("01 x"), Err(MessageParseError::InvalidCommand));
        assert_eq!(parse_line("P1NG x"), Err(MessageParseError::InvalidCommand));
        assert!(parse_line("433 * corsica :in use").is_ok());
    }

    #[test]
    fn unterminated_sections() {
        assert_eq!(parse_line("@a=b"), Err(MessageParseError::UnterminatedTags));
        assert_eq!(parse_line(":irc.example.org"), Err(MessageParseError::UnterminatedOrigin));
    }
}
