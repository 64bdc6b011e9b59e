use std::io;

/// Errors returned by [`Client::connect`](crate::irc::client::Client::connect)
/// and the outbound helpers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no connection or address configured, use ClientBuilder::conn or ClientBuilder::addr")]
    MissingTransport,

    #[error("no nick configured, use ClientBuilder::nick")]
    MissingNick,

    #[error("failed to connect to {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("connection error: {0}")]
    Io(#[from] io::Error),

    #[error("unable to reconnect after {attempts} attempts, giving up")]
    ReconnectExhausted { attempts: u32 },
}

impl Error {
    /// Configuration problems are reported before any I/O happens.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::MissingTransport | Error::MissingNick)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
