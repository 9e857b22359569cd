//! Newline-delimited message framing.

use std::io;

use futures_util::Stream;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::{ListenerError, Result};

/// Reads a byte stream one `\n`-terminated line at a time.
///
/// A trailing `\r` is stripped along with the delimiter. Bytes that are not
/// valid UTF-8 are replaced rather than treated as a read failure, so one
/// garbled message cannot take the connection down with it.
///
/// A line longer than `max_line_bytes` (delimiter excluded) is a read error.
pub struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
    max_line_bytes: usize,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, max_line_bytes: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            buf: Vec::new(),
            max_line_bytes,
        }
    }

    /// Returns the next line, or `None` once the peer has closed the stream.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Read`] if the underlying read fails or the
    /// line exceeds the length limit.
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        // Room for a full-length line plus its delimiter.
        let cap = self.max_line_bytes.saturating_add(1) as u64;
        let read = (&mut self.inner)
            .take(cap)
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(ListenerError::Read)?;

        if read == 0 {
            return Ok(None);
        }

        if self.buf.len() > self.max_line_bytes && self.buf.last() != Some(&b'\n') {
            return Err(ListenerError::Read(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line exceeds {} bytes", self.max_line_bytes),
            )));
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }

        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

/// Turns a [`LineReader`] into a lazy stream of lines.
///
/// The stream ends after the peer closes the connection or after the first
/// read error, which is yielded as its last item.
pub fn lines<R>(reader: LineReader<R>) -> impl Stream<Item = Result<String>>
where
    R: AsyncRead + Unpin,
{
    futures_util::stream::try_unfold(reader, |mut reader| async move {
        Ok(reader.next_line().await?.map(|line| (line, reader)))
    })
}
