//! Default subscriptions every client starts with: PING keepalive, CTCP
//! VERSION replies, nick-collision retry and nick reclamation.

use crate::irc::client::Client;
use crate::irc::hub::Hub;
use crate::irc::message::Message;
use std::sync::Arc;

pub const RPL_WELCOME: &str = "001";
pub const ERR_NOSUCHNICK: &str = "401";
pub const ERR_NICKNAMEINUSE: &str = "433";

const CTCP_VERSION_QUERY: &str = "\x01VERSION\x01";

pub(crate) fn register(hub: &Hub<Client>) {
    hub.subscribe("PING", on_ping);
    hub.subscribe("PRIVMSG", on_privmsg);
    hub.subscribe(ERR_NICKNAMEINUSE, on_nick_in_use);
    hub.subscribe(ERR_NOSUCHNICK, on_no_such_nick);
}

/// Answer with the same argument, then use the round trip as a chance to
/// win back the configured nick.
async fn on_ping(client: Client, msg: Arc<Message>) {
    let pong = if msg.params.is_empty() {
        "PONG".to_string()
    } else {
        format!("PONG {}", msg.params)
    };
    if let Err(e) = client.send(&pong).await {
        tracing::warn!(error = %e, "failed to answer PING");
        return;
    }
    if let Err(e) = client.reclaim_nick().await {
        tracing::warn!(error = %e, "nick reclaim failed");
    }
}

async fn on_privmsg(client: Client, msg: Arc<Message>) {
    if msg.trailing() != Some(CTCP_VERSION_QUERY) || msg.name.is_empty() {
        return;
    }
    tracing::debug!(from = %msg.name, "CTCP VERSION request");
    let reply = format!("VERSION {}", client.version());
    if let Err(e) = client.ctcp_reply(&msg.name, &reply).await {
        tracing::warn!(error = %e, "failed to send CTCP VERSION reply");
    }
}

/// `433 <me> <nick> :Nickname is already in use`.
async fn on_nick_in_use(client: Client, msg: Arc<Message>) {
    if let Err(e) = client.retry_nick(msg.param(1)).await {
        tracing::warn!(error = %e, "failed to retry nick");
    }
}

/// `401 <me> <nick> :No such nick` means `nick` is free.
async fn on_no_such_nick(client: Client, msg: Arc<Message>) {
    let Some(nick) = msg.param(1) else {
        return;
    };
    if let Err(e) = client.claim_if_desired(nick).await {
        tracing::warn!(error = %e, "failed to reclaim nick");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_subscribes_builtin_events() {
        let hub: Hub<Client> = Hub::new();
        register(&hub);
        for event in ["PING", "PRIVMSG", ERR_NICKNAMEINUSE, ERR_NOSUCHNICK] {
            assert_eq!(hub.handler_count(event), 1, "{}", event);
        }
        assert_eq!(hub.handler_count(RPL_WELCOME), 0);
    }
}
