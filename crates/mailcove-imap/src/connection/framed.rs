//! Frame-level I/O.
//!
//! IMAP responses are CRLF lines that may end in `{n}` literal markers;
//! a complete frame is the line plus exactly `n` further octets for each
//! literal, resumed by the rest of the line. [`FramedStream::read_frame`]
//! assembles one frame at a time and never reads past it.
//!
//! After a successful `COMPRESS DEFLATE`, [`FramedStream::enable_deflate`]
//! rewires both directions through raw-deflate codecs, starting with the
//! first byte after the tagged OK.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_compression::tokio::bufread::DeflateDecoder;
use async_compression::tokio::write::DeflateEncoder;
use bytes::BytesMut;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadBuf,
    ReadHalf, WriteHalf,
};

use crate::{Error, Result};

const BUFFER_SIZE: usize = 8192;

/// Upper bound on a single response line.
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Upper bound on a single literal.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024;

/// The byte transport under the framing layer: the caller's stream, or the
/// same stream split and wrapped in deflate codecs.
enum Transport<S> {
    Plain(S),
    Deflate {
        reader: DeflateDecoder<BufReader<ReadHalf<S>>>,
        writer: DeflateEncoder<WriteHalf<S>>,
    },
    // Placeholder that only exists for the instant of rewiring.
    Detached,
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn into_deflate(self) -> Result<Self> {
        match self {
            Self::Plain(stream) => {
                let (read_half, write_half) = tokio::io::split(stream);
                Ok(Self::Deflate {
                    reader: DeflateDecoder::new(BufReader::new(read_half)),
                    writer: DeflateEncoder::new(write_half),
                })
            }
            Self::Deflate { .. } => {
                Err(Error::Protocol("compression already active".to_string()))
            }
            Self::Detached => Err(Error::Protocol("transport detached".to_string())),
        }
    }
}

impl<S> AsyncRead for Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Deflate { reader, .. } => Pin::new(reader).poll_read(cx, buf),
            Self::Detached => Poll::Ready(Err(io::Error::other("transport detached"))),
        }
    }
}

impl<S> AsyncWrite for Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Deflate { writer, .. } => Pin::new(writer).poll_write(cx, buf),
            Self::Detached => Poll::Ready(Err(io::Error::other("transport detached"))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Deflate { writer, .. } => Pin::new(writer).poll_flush(cx),
            Self::Detached => Poll::Ready(Err(io::Error::other("transport detached"))),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Deflate { writer, .. } => Pin::new(writer).poll_shutdown(cx),
            Self::Detached => Poll::Ready(Err(io::Error::other("transport detached"))),
        }
    }
}

/// Buffered, literal-aware framing over a duplex byte stream.
pub struct FramedStream<S> {
    reader: BufReader<Transport<S>>,
    write_buf: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(BUFFER_SIZE, Transport::Plain(stream)),
            write_buf: BytesMut::with_capacity(BUFFER_SIZE),
        }
    }

    /// Reads one complete frame: a CRLF line plus the exact octets of any
    /// literals it announces, and the line fragments that resume after them.
    pub async fn read_frame(&mut self) -> Result<Vec<u8>> {
        let mut frame = Vec::new();

        loop {
            let line = self.read_line().await?;
            frame.extend_from_slice(&line);

            let Some(len) = literal_length(&line) else {
                break;
            };
            if len > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal of {len} bytes exceeds the {MAX_LITERAL_SIZE} byte cap"
                )));
            }

            let mut literal = vec![0u8; len];
            self.reader.read_exact(&mut literal).await?;
            frame.extend_from_slice(&literal);
            // The line containing `)` (or further attributes) resumes next.
        }

        Ok(frame)
    }

    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by peer",
                )));
            }

            // The CRLF may straddle fill_buf calls; re-check the seam.
            if line.last() == Some(&b'\r') && buf[0] == b'\n' {
                line.push(b'\n');
                self.reader.consume(1);
                return Ok(line);
            }

            if let Some(pos) = buf.windows(2).position(|w| w == b"\r\n") {
                line.extend_from_slice(&buf[..pos + 2]);
                self.reader.consume(pos + 2);
                return Ok(line);
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("response line too long".to_string()));
            }
        }
    }

    /// Writes bytes and flushes.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.write_buf.clear();
        self.write_buf.extend_from_slice(data);

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buf).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Switches both directions to raw deflate.
    ///
    /// Call only after the tagged OK for `COMPRESS DEFLATE`; the server's
    /// compressed stream starts immediately after that line, which must be
    /// the last frame read before this call.
    pub fn enable_deflate(&mut self) -> Result<()> {
        let transport =
            std::mem::replace(&mut self.reader, BufReader::new(Transport::Detached)).into_inner();
        self.reader = BufReader::with_capacity(BUFFER_SIZE, transport.into_deflate()?);
        Ok(())
    }

    /// True once [`FramedStream::enable_deflate`] has run.
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        matches!(self.reader.get_ref(), Transport::Deflate { .. })
    }

    /// Detaches the raw underlying stream, e.g. for a STARTTLS upgrade.
    ///
    /// Only available while the transport is plaintext. Buffered data is
    /// discarded, so call this only when the peer is quiescent — right
    /// after a tagged OK.
    pub fn into_inner(self) -> Result<S> {
        match self.reader.into_inner() {
            Transport::Plain(stream) => Ok(stream),
            _ => Err(Error::Protocol(
                "cannot detach a compressed transport".to_string(),
            )),
        }
    }
}

/// Extracts a trailing `{n}` or `{n+}` literal marker from a CRLF line.
fn literal_length(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\r\n")?;

    let line = if line.ends_with(b"+}") {
        &line[..line.len() - 2]
    } else {
        line.strip_suffix(b"}")?
    };
    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    if digits.is_empty() {
        return None;
    }

    std::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_marker_forms() {
        assert_eq!(literal_length(b"* 1 FETCH (BODY {123}\r\n"), Some(123));
        assert_eq!(literal_length(b"* 1 FETCH (BODY {123+}\r\n"), Some(123));
        assert_eq!(literal_length(b"a OK done\r\n"), None);
        assert_eq!(literal_length(b"{0}\r\n"), Some(0));
        assert_eq!(literal_length(b"{}\r\n"), None);
        assert_eq!(literal_length(b"{abc}\r\n"), None);
        assert_eq!(literal_length(b"no crlf {5}"), None);
    }

    #[tokio::test]
    async fn reads_a_simple_line() {
        let mock = tokio_test::io::Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedStream::new(mock);

        let frame = framed.read_frame().await.unwrap();
        assert_eq!(frame, b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn reads_a_frame_with_a_literal() {
        let mock = tokio_test::io::Builder::new()
            .read(b"* 1 FETCH (RFC822.HEADER {11}\r\n")
            .read(b"Subject: hi")
            .read(b")\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let frame = framed.read_frame().await.unwrap();
        assert_eq!(frame, b"* 1 FETCH (RFC822.HEADER {11}\r\nSubject: hi)\r\n");
    }

    #[tokio::test]
    async fn literal_octets_may_contain_crlf() {
        let mock = tokio_test::io::Builder::new()
            .read(b"* 1 FETCH (RFC822 {20}\r\n")
            .read(b"line one\r\nline two\r\n")
            .read(b")\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let frame = framed.read_frame().await.unwrap();
        assert!(frame.ends_with(b"line two\r\n)\r\n"));
    }

    #[tokio::test]
    async fn multiple_literals_in_one_frame() {
        let mock = tokio_test::io::Builder::new()
            .read(b"* 2 FETCH (BODY[1] {2}\r\n")
            .read(b"ab")
            .read(b" BODY[2] {3}\r\n")
            .read(b"cde")
            .read(b")\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let frame = framed.read_frame().await.unwrap();
        assert_eq!(frame, b"* 2 FETCH (BODY[1] {2}\r\nab BODY[2] {3}\r\ncde)\r\n");
    }

    #[tokio::test]
    async fn oversized_literal_is_rejected() {
        let header = format!("* 1 FETCH (BODY {{{}}}\r\n", MAX_LITERAL_SIZE + 1);
        let mock = tokio_test::io::Builder::new().read(header.as_bytes()).build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_frame().await.unwrap_err();
        assert!(err.to_string().contains("byte cap"));
    }

    #[tokio::test]
    async fn eof_is_an_io_error() {
        let mock = tokio_test::io::Builder::new().build();
        let mut framed = FramedStream::new(mock);

        assert!(matches!(
            framed.read_frame().await.unwrap_err(),
            Error::Io(_)
        ));
    }

    #[tokio::test]
    async fn writes_are_flushed() {
        let mock = tokio_test::io::Builder::new()
            .write(b"A001 NOOP\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        framed.write_all(b"A001 NOOP\r\n").await.unwrap();
    }

    #[tokio::test]
    async fn into_inner_detaches_a_plain_transport() {
        let mock = tokio_test::io::Builder::new().build();
        let framed = FramedStream::new(mock);
        assert!(framed.into_inner().is_ok());

        let mock = tokio_test::io::Builder::new().build();
        let mut framed = FramedStream::new(mock);
        framed.enable_deflate().unwrap();
        assert!(framed.into_inner().is_err());
    }

    #[tokio::test]
    async fn deflate_cannot_be_enabled_twice() {
        let mock = tokio_test::io::Builder::new().build();
        let mut framed = FramedStream::new(mock);

        assert!(!framed.is_compressed());
        framed.enable_deflate().unwrap();
        assert!(framed.is_compressed());
        assert!(framed.enable_deflate().is_err());
    }
}
