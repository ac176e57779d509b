use std::fmt;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::config::MAX_FRAME_SIZE;
use crate::protocol::Message;
use crate::transport::Transport;

/// Default timeout for network operations (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Framing failures that are not plain I/O errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The peer closed the stream.
    Closed,
    /// Zero-length frames carry no message.
    Empty,
    TooLarge(u32),
    /// A complete frame whose body is not a valid message.
    Malformed(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Closed => write!(f, "connection closed by peer"),
            FrameError::Empty => write!(f, "invalid frame length: 0"),
            FrameError::TooLarge(len) => write!(
                f,
                "frame too large: {} bytes (max: {})",
                len, MAX_FRAME_SIZE
            ),
            FrameError::Malformed(e) => write!(f, "malformed frame: {}", e),
        }
    }
}

impl std::error::Error for FrameError {}

fn map_io(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::ConnectionReset => FrameError::Closed.into(),
        _ => anyhow::anyhow!("I/O error: {}", e),
    }
}

/// Write `msg` as a big-endian length prefix followed by its bincode body.
pub async fn write_frame<W>(writer: &mut W, msg: &Message) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let data = bincode::serialize(msg)
        .map_err(|e| anyhow::anyhow!("serialization error: {}", e))?;
    let len = u32::try_from(data.len()).map_err(|_| FrameError::TooLarge(u32::MAX))?;
    if len > MAX_FRAME_SIZE {
        return Err(FrameError::TooLarge(len).into());
    }
    writer.write_all(&len.to_be_bytes()).await.map_err(map_io)?;
    writer.write_all(&data).await.map_err(map_io)?;
    writer.flush().await.map_err(map_io)?;
    Ok(())
}

/// Read one frame. Oversized and empty frames are rejected before any body
/// bytes are buffered.
pub async fn read_frame<R>(reader: &mut R) -> anyhow::Result<Message>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(map_io)?;
    let len = u32::from_be_bytes(len_buf);
    if len == 0 {
        return Err(FrameError::Empty.into());
    }
    if len > MAX_FRAME_SIZE {
        return Err(FrameError::TooLarge(len).into());
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await.map_err(map_io)?;
    bincode::deserialize(&buf).map_err(|e| FrameError::Malformed(e.to_string()).into())
}

/// Whether `err` means the peer simply went away.
pub fn is_closed(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<FrameError>(), Some(FrameError::Closed))
}

/// Whether the stream is still aligned on a frame boundary after `err`.
pub fn is_recoverable(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<FrameError>(), Some(FrameError::Malformed(_)))
}

/// Client side of a framed TCP connection.
pub struct TcpTransport {
    stream: TcpStream,
    timeout_duration: Duration,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_timeout(stream, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(stream: TcpStream, timeout_duration: Duration) -> Self {
        Self {
            stream,
            timeout_duration,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        timeout(self.timeout_duration, write_frame(&mut self.stream, &msg))
            .await
            .map_err(|_| anyhow::anyhow!("send timeout after {:?}", self.timeout_duration))?
    }

    async fn recv(&mut self) -> anyhow::Result<Message> {
        timeout(self.timeout_duration, read_frame(&mut self.stream))
            .await
            .map_err(|_| anyhow::anyhow!("receive timeout after {:?}", self.timeout_duration))?
    }
}
