//! User slash-command parser.
//!
//! Parses `/command arg1 arg2 ...` input lines into typed [`ParsedCommand`]
//! values, then [`execute`] maps them onto the client's outbound helpers.

use crate::irc::client::Client;
use crate::irc::error::Result;

/// A parsed user command. Each variant corresponds to a `/command`.
#[derive(Debug, PartialEq, Eq)]
pub enum ParsedCommand {
    Msg { target: String, text: String },
    Notice { target: String, text: String },
    Nick { nick: String },
    Whois { nick: String },
    Mode { target: String, modes: String, arg: String },
    Join { channel: String },
    Part { channel: String, reason: Option<String> },
    Reclaim,
    Raw { command: String },
    Quit { message: Option<String> },
    Help,
}

/// Parse a slash-command string into a [`ParsedCommand`].
///
/// Returns `None` if the input does not start with `/`, is not a recognized
/// command, or is missing a required argument. Commands are case-insensitive.
pub fn parse_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim();
    let body = input.strip_prefix('/')?;

    let parts: Vec<&str> = body.splitn(3, ' ').collect();
    let cmd = parts.first()?.to_lowercase();
    let arg = |i: usize| parts.get(i).map(|s| s.trim()).filter(|s| !s.is_empty());

    match cmd.as_str() {
        "msg" | "query" => Some(ParsedCommand::Msg {
            target: arg(1)?.to_string(),
            text: parts.get(2).unwrap_or(&"").to_string(),
        }),
        "notice" => Some(ParsedCommand::Notice {
            target: arg(1)?.to_string(),
            text: parts.get(2).unwrap_or(&"").to_string(),
        }),
        "nick" => Some(ParsedCommand::Nick {
            nick: arg(1)?.to_string(),
        }),
        "whois" | "wi" => Some(ParsedCommand::Whois {
            nick: arg(1)?.to_string(),
        }),
        "mode" => {
            let target = arg(1)?.to_string();
            let mut rest = parts.get(2).unwrap_or(&"").splitn(2, ' ');
            let modes = rest.next().filter(|m| !m.is_empty())?.to_string();
            let arg = rest.next().unwrap_or("").trim().to_string();
            Some(ParsedCommand::Mode { target, modes, arg })
        }
        "join" | "j" => {
            let channel = arg(1)?;
            let channel = if channel.starts_with('#') || channel.starts_with('&') {
                channel.to_string()
            } else {
                format!("#{}", channel)
            };
            Some(ParsedCommand::Join { channel })
        }
        "part" | "leave" => Some(ParsedCommand::Part {
            channel: arg(1)?.to_string(),
            reason: arg(2).map(str::to_string),
        }),
        "reclaim" => Some(ParsedCommand::Reclaim),
        "raw" | "quote" => {
            let command = body[cmd.len()..].trim();
            if command.is_empty() {
                return None;
            }
            Some(ParsedCommand::Raw {
                command: command.to_string(),
            })
        }
        "quit" | "exit" => {
            let message = body[cmd.len()..].trim();
            Some(ParsedCommand::Quit {
                message: (!message.is_empty()).then(|| message.to_string()),
            })
        }
        "help" | "h" => Some(ParsedCommand::Help),
        _ => None,
    }
}

/// Run a parsed command against `client`. `default_quit` is used when
/// `/quit` has no message.
pub async fn execute(client: &Client, command: ParsedCommand, default_quit: &str) -> Result<()> {
    match command {
        ParsedCommand::Msg { target, text } => client.privmsg(&target, &text).await,
        ParsedCommand::Notice { target, text } => client.notice(&target, &text).await,
        ParsedCommand::Nick { nick } => client.nick(&nick).await,
        ParsedCommand::Whois { nick } => client.whois(&nick).await,
        ParsedCommand::Mode { target, modes, arg } => client.mode(&target, &modes, &arg).await,
        ParsedCommand::Join { channel } => client.join(&channel).await,
        ParsedCommand::Part { channel, reason } => client.part(&channel, reason.as_deref()).await,
        ParsedCommand::Reclaim => client.reclaim_nick().await,
        ParsedCommand::Raw { command } => client.send(&command).await,
        ParsedCommand::Quit { message } => {
            client.quit(message.as_deref().unwrap_or(default_quit)).await;
            Ok(())
        }
        ParsedCommand::Help => {
            println!("{}", HELP);
            Ok(())
        }
    }
}

pub const HELP: &str = "\
/msg <target> <text>      send a message
/notice <target> <text>   send a notice
/nick <nick>              change nick
/whois <nick>             query a user
/mode <target> <modes> [arg]
/join <channel>           join a channel
/part <channel> [reason]  leave a channel
/reclaim                  try to get the configured nick back
/raw <line>               send a raw protocol line
/quit [message]           disconnect";
