//! ferric-irc: a small asynchronous IRC client library.
//!
//! [`irc::parse`] turns raw lines into [`irc::Message`] values, an
//! [`irc::Hub`] fans them out to handlers, and [`irc::Client`] runs the
//! session: handshake, read loop, reconnects, keepalive and nick recovery.
//! The `config` and `logging` modules back the `ferric-irc` binary.

pub mod config;
pub mod irc;
pub mod logging;

pub use irc::{Client, ClientBuilder, Error, Message};
