//! IRC line parser.
//!
//! Turns one raw protocol line into a [`Message`]:
//!
//! ```text
//! [':' name ['!' user] ['@' host] SPACE] COMMAND [SPACE params]
//! ```
//!
//! The parameter tail is kept verbatim in [`Message::params`] and split on
//! spaces into [`Message::params_array`]. A token starting with `:` marks
//! the trailing parameter but is not re-joined with the tokens after it.

use std::fmt;

/// A parsed IRC line. Fields from an absent prefix are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// The original line without its CR/LF terminator.
    pub raw: String,
    pub name: String,
    pub user: String,
    pub host: String,
    /// Verb or three-digit numeric, uppercased.
    pub command: String,
    /// Unsplit parameter tail, including a leading `:` on the trailing part.
    pub params: String,
    pub params_array: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed message: {0:?}")]
    Malformed(String),
}

/// Parse a single line. A blank line (only CR/LF) yields an empty message.
pub fn parse(line: &str) -> Result<Message, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Ok(Message::default());
    }

    let malformed = || ParseError::Malformed(line.to_string());

    let (prefix, rest) = match line.strip_prefix(':') {
        Some(tail) => {
            let (prefix, rest) = tail.split_once(' ').ok_or_else(malformed)?;
            (Some(prefix), rest)
        }
        None => (None, line),
    };

    let (command, params) = match rest.split_once(' ') {
        Some((command, params)) => (command, params),
        None => (rest, ""),
    };
    if !is_command_token(command) {
        return Err(malformed());
    }

    let (name, user, host) = prefix.map(split_prefix).unwrap_or_default();

    Ok(Message {
        raw: line.to_string(),
        name: name.to_string(),
        user: user.to_string(),
        host: host.to_string(),
        command: command.to_ascii_uppercase(),
        params: params.to_string(),
        params_array: params
            .split(' ')
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// A command is either a word of ASCII letters or a three-digit numeric.
fn is_command_token(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    token.bytes().all(|b| b.is_ascii_alphabetic())
        || (token.len() == 3 && token.bytes().all(|b| b.is_ascii_digit()))
}

/// Split `name!user@host`. Missing parts come back empty.
fn split_prefix(prefix: &str) -> (&str, &str, &str) {
    let (rest, host) = prefix.split_once('@').unwrap_or((prefix, ""));
    let (name, user) = rest.split_once('!').unwrap_or((rest, ""));
    (name, user, host)
}

impl Message {
    /// True for the blank-line message produced by [`parse`].
    pub fn is_empty(&self) -> bool {
        self.command.is_empty()
    }

    pub fn is_numeric(&self) -> bool {
        self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit())
    }

    /// The `i`th space-separated parameter token, as written on the wire.
    pub fn param(&self, i: usize) -> Option<&str> {
        self.params_array.get(i).map(String::as_str)
    }

    /// Text of the trailing parameter without its leading `:`.
    ///
    /// Falls back to the last token when the line has no `:` parameter.
    pub fn trailing(&self) -> Option<&str> {
        if let Some(text) = self.params.strip_prefix(':') {
            return Some(text);
        }
        match self.params.split_once(" :") {
            Some((_, text)) => Some(text),
            None => self.params_array.last().map(String::as_str),
        }
    }
}

/// Rebuilds the wire form from the parsed fields (without CR/LF).
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            write!(f, ":{}", self.name)?;
            if !self.user.is_empty() {
                write!(f, "!{}", self.user)?;
            }
            if !self.host.is_empty() {
                write!(f, "@{}", self.host)?;
            }
            f.write_str(" ")?;
        }
        f.write_str(&self.command)?;
        if !self.params.is_empty() {
            write!(f, " {}", self.params)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join_with_full_prefix() {
        let m = parse(":foo!~bar@127.0.0.1 JOIN :#foo\r\n").unwrap();
        assert_eq!(m.raw, ":foo!~bar@127.0.0.1 JOIN :#foo");
        assert_eq!(m.command, "JOIN");
        assert_eq!(m.name, "foo");
        assert_eq!(m.user, "~bar");
        assert_eq!(m.host, "127.0.0.1");
        assert_eq!(m.params, ":#foo");
        assert_eq!(m.params_array, vec![":#foo"]);
    }

    #[test]
    fn test_parse_ping_without_prefix() {
        let m = parse("PING :irc.foo.com\r\n").unwrap();
        assert_eq!(m.command, "PING");
        assert_eq!(m.name, "");
        assert_eq!(m.user, "");
        assert_eq!(m.host, "");
        assert_eq!(m.params, ":irc.foo.com");
        assert_eq!(m.params_array, vec![":irc.foo.com"]);
        assert_eq!(m.trailing(), Some("irc.foo.com"));
    }

    #[test]
    fn test_parse_numeric_with_server_prefix() {
        let m = parse(":irc.foo.com 372 foo :- *  foo\r\n").unwrap();
        assert_eq!(m.command, "372");
        assert!(m.is_numeric());
        assert_eq!(m.name, "irc.foo.com");
        assert_eq!(m.user, "");
        assert_eq!(m.host, "");
        assert_eq!(m.params, "foo :- *  foo");
        assert_eq!(m.params_array, vec!["foo", ":-", "*", "foo"]);
        assert_eq!(m.trailing(), Some("- *  foo"));
    }

    #[test]
    fn test_parse_prefix_with_host_only() {
        let m = parse(":nick@host.example NOTICE me :hi").unwrap();
        assert_eq!(m.name, "nick");
        assert_eq!(m.user, "");
        assert_eq!(m.host, "host.example");
    }

    #[test]
    fn test_parse_lowercase_command_is_uppercased() {
        let m = parse("privmsg #chan :hello there").unwrap();
        assert_eq!(m.command, "PRIVMSG");
        assert_eq!(m.param(0), Some("#chan"));
        assert_eq!(m.trailing(), Some("hello there"));
    }

    #[test]
    fn test_parse_command_without_params() {
        let m = parse("QUIT\r\n").unwrap();
        assert_eq!(m.command, "QUIT");
        assert_eq!(m.params, "");
        assert!(m.params_array.is_empty());
        assert_eq!(m.trailing(), None);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse("foo:\r\n").is_err());
        assert!(parse(":prefix-only\r\n").is_err());
        assert!(parse(":prefix \r\n").is_err());
        assert!(parse("12 too short").is_err());
    }

    #[test]
    fn test_parse_blank_lines_are_empty() {
        for line in ["", "\r\n", "\n", "\r", "\r\n\r\n", "\n\r"] {
            let m = parse(line).unwrap();
            assert_eq!(m, Message::default(), "line {:?}", line);
            assert!(m.is_empty());
        }
    }

    #[test]
    fn test_display_reproduces_command_and_params() {
        let lines = [
            ":foo!~bar@127.0.0.1 JOIN :#foo",
            ":irc.example.net 433 * foo :Nickname already in use",
            "PING :irc.example.net",
            ":bar!bar@127.0.0.1 PRIVMSG foo :\x01VERSION\x01",
            "AWAY",
        ];
        for line in lines {
            let m = parse(line).unwrap();
            let rebuilt = m.to_string();
            assert_eq!(rebuilt, line);
            let again = parse(&rebuilt).unwrap();
            assert_eq!(again.command, m.command);
            assert_eq!(again.params_array, m.params_array);
        }
    }

    #[test]
    fn test_reparse_raw_is_idempotent() {
        let m = parse(":a!b@c MODE #chan +o  d\r\n").unwrap();
        assert_eq!(parse(&m.raw).unwrap(), m);
    }
}
