//! Transport boundary: a byte stream split into a line reader and a writer.
//!
//! Any `AsyncRead + AsyncWrite` stream works, a dialled [`TcpStream`] in
//! production and an in-memory `tokio::io::duplex` pipe in tests.

use crate::irc::error::{Error, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, BufReader};
use tokio::net::TcpStream;

/// Hard cap on an outbound line, CR-LF included.
pub const MAX_LINE_LEN: usize = 510;

pub(crate) const EOL: &str = "\r\n";

/// Longest inbound line kept, terminator included. The rest of a longer
/// line is discarded.
pub const MAX_INBOUND_LEN: usize = 8192;

pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// An open connection that has not been handed to the read loop yet.
pub struct Transport {
    reader: LineReader,
    writer: BoxWriter,
}

impl Transport {
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: LineReader::new(Box::new(reader)),
            writer: Box::new(writer),
        }
    }

    /// Open a plain TCP connection to `addr` (`host:port`).
    pub async fn dial(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.map_err(|source| Error::Dial {
            addr: addr.to_string(),
            source,
        })?;
        let _ = stream.set_nodelay(true);
        tracing::info!(%addr, "connected");
        Ok(Self::new(stream))
    }

    pub(crate) fn into_parts(self) -> (LineReader, BoxWriter) {
        (self.reader, self.writer)
    }
}

/// Reads CR-LF (or bare LF) terminated lines. Invalid UTF-8 is replaced
/// rather than treated as an error, since servers relay arbitrary bytes.
pub struct LineReader {
    inner: BufReader<BoxReader>,
    buf: Vec<u8>,
}

impl LineReader {
    fn new(reader: BoxReader) -> Self {
        Self {
            inner: BufReader::new(reader),
            buf: Vec::with_capacity(512),
        }
    }

    /// Next line without its terminator, or `None` at end of stream. Lines
    /// over [`MAX_INBOUND_LEN`] bytes are cut and the remainder skipped.
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        let n = (&mut self.inner)
            .take(MAX_INBOUND_LEN as u64)
            .read_until(b'\n', &mut self.buf)
            .await?;
        if n == 0 {
            return Ok(None);
        }
        if n == MAX_INBOUND_LEN && self.buf.last() != Some(&b'\n') {
            tracing::warn!(limit = MAX_INBOUND_LEN, "inbound line too long, truncated");
            self.skip_line().await?;
        }
        let line = String::from_utf8_lossy(&self.buf);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Drop buffered input up to and including the next LF.
    async fn skip_line(&mut self) -> std::io::Result<()> {
        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }
            let newline = available.iter().position(|&b| b == b'\n');
            let len = available.len();
            match newline {
                Some(idx) => {
                    self.inner.consume(idx + 1);
                    return Ok(());
                }
                None => self.inner.consume(len),
            }
        }
    }
}

/// Terminate `line` with CR-LF, cutting it so the result fits in
/// [`MAX_LINE_LEN`] bytes. Anything after an embedded CR or LF is dropped so
/// one call can never put two lines on the wire.
pub fn frame_line(line: &str) -> String {
    let line = match line.find(['\r', '\n']) {
        Some(idx) => &line[..idx],
        None => line,
    };
    let mut end = line.len().min(MAX_LINE_LEN - EOL.len());
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    let mut framed = String::with_capacity(end + EOL.len());
    framed.push_str(&line[..end]);
    framed.push_str(EOL);
    framed
}
