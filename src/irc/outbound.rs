//! Outbound command helpers. Every helper formats one command and hands it
//! to [`Client::send`], which frames and length-limits it.

use crate::irc::client::Client;
use crate::irc::connection::{EOL, MAX_LINE_LEN};
use crate::irc::error::Result;

impl Client {
    /// Send a chat message, split over several lines when it does not fit in
    /// one. Stops at the first failed line.
    pub async fn privmsg(&self, target: &str, message: &str) -> Result<()> {
        let prefix = format!("PRIVMSG {} :", target);
        for chunk in split_message(&prefix, message) {
            self.send(&format!("{}{}", prefix, chunk)).await?;
        }
        Ok(())
    }

    pub async fn notice(&self, target: &str, message: &str) -> Result<()> {
        self.send(&format!("NOTICE {} :{}", target, message)).await
    }

    /// Send a CTCP reply (a `\x01`-framed NOTICE).
    pub async fn ctcp_reply(&self, target: &str, response: &str) -> Result<()> {
        let clean = response.replace('\x01', "");
        self.notice(target, &format!("\x01{}\x01", clean)).await
    }

    /// Set `mode` on `channel`, e.g. `mode("#chan", "+o", "nick")`.
    pub async fn mode(&self, channel: &str, mode: &str, target: &str) -> Result<()> {
        if target.is_empty() {
            self.send(&format!("MODE {} {}", channel, mode)).await
        } else {
            self.send(&format!("MODE {} {} {}", channel, mode, target)).await
        }
    }

    pub async fn whois(&self, nick: &str) -> Result<()> {
        self.send(&format!("WHOIS {}", nick)).await
    }

    pub async fn join(&self, channel: &str) -> Result<()> {
        self.send(&format!("JOIN {}", channel)).await
    }

    pub async fn part(&self, channel: &str, reason: Option<&str>) -> Result<()> {
        match reason {
            Some(reason) => self.send(&format!("PART {} :{}", channel, reason)).await,
            None => self.send(&format!("PART {}", channel)).await,
        }
    }

    /// Send `QUIT` and stop the read loop. The send is best effort.
    pub async fn quit(&self, message: &str) {
        if let Err(e) = self.send(&format!("QUIT :{}", message)).await {
            tracing::debug!(error = %e, "QUIT not delivered");
        }
        self.request_quit();
    }
}

/// Pack the words of `message` into as few chunks as possible so that
/// `prefix` plus a chunk fits in one framed line. Words keep their order; a
/// single word longer than the budget gets a chunk of its own. Each chunk
/// boundary consumes one separating space, so `chunks.join(" ")` gives back
/// `message` and runs of spaces survive.
pub fn split_message(prefix: &str, message: &str) -> Vec<String> {
    let budget = (MAX_LINE_LEN - EOL.len()).saturating_sub(prefix.len());
    if message.len() <= budget {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current: Option<String> = None;
    for word in message.split(' ') {
        match current.as_mut() {
            Some(chunk) if chunk.len() + 1 + word.len() <= budget => {
                chunk.push(' ');
                chunk.push_str(word);
            }
            Some(_) => chunks.extend(current.replace(word.to_string())),
            None => current = Some(word.to_string()),
        }
    }
    chunks.extend(current);
    chunks
}
