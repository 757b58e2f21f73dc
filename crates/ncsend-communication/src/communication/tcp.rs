//! TCP transport for the CSAV protocol
//!
//! Thin async helpers over `tokio::net::TcpStream`: resolve and connect,
//! write a frame, collect the reply, shut down. Deadlines and cancellation
//! are applied by the session, not here.

use crate::protocol::response::interpret;
use ncsend_core::ConnectionError;
use std::fmt;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};

/// Upper bound on buffered reply bytes before the reply is interpreted
pub const MAX_REPLY_LEN: usize = 1024;

const READ_CHUNK_LEN: usize = 256;

/// Controller endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpConnectionInfo {
    /// Hostname or IP address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl TcpConnectionInfo {
    /// Create connection info for `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for TcpConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Resolve the endpoint and connect to the first address that accepts.
pub async fn connect(info: &TcpConnectionInfo) -> Result<TcpStream, ConnectionError> {
    let addrs: Vec<_> = lookup_host((info.host.as_str(), info.port))
        .await
        .map_err(|e| {
            tracing::debug!("Failed to resolve {}: {}", info.host, e);
            ConnectionError::HostnameResolution {
                hostname: info.host.clone(),
            }
        })?
        .collect();

    if addrs.is_empty() {
        return Err(ConnectionError::HostnameResolution {
            hostname: info.host.clone(),
        });
    }

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                // Frames are written in one go; don't let Nagle hold the tail.
                if let Err(e) = stream.set_nodelay(true) {
                    tracing::debug!("Failed to set TCP_NODELAY on {}: {}", addr, e);
                }
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!("Connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(match last_err {
        Some(e) if e.kind() == io::ErrorKind::ConnectionRefused => ConnectionError::Refused {
            address: info.to_string(),
        },
        Some(e) => e.into(),
        None => ConnectionError::Io {
            reason: format!("no address to connect to for {}", info),
        },
    })
}

/// Write the complete frame and flush it.
pub async fn write_frame(stream: &mut TcpStream, frame: &[u8]) -> Result<(), ConnectionError> {
    stream.write_all(frame).await?;
    stream.flush().await?;
    Ok(())
}

/// Collect reply bytes until they hold a result code, the peer closes, or
/// [`MAX_REPLY_LEN`] bytes are buffered.
///
/// Lines without a code (status text, echoes) keep the read going. Returns
/// `ConnectionClosed` if the peer closes without sending anything.
pub async fn read_reply(stream: &mut TcpStream) -> Result<Vec<u8>, ConnectionError> {
    let mut reply = Vec::with_capacity(READ_CHUNK_LEN);
    let mut chunk = [0u8; READ_CHUNK_LEN];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            if reply.is_empty() {
                return Err(ConnectionError::ConnectionClosed);
            }
            return Ok(reply);
        }

        reply.extend_from_slice(&chunk[..n]);
        if interpret(&reply).is_ok() || reply.len() >= MAX_REPLY_LEN {
            return Ok(reply);
        }
    }
}

/// Shut down the write half. Errors are logged and otherwise ignored since
/// the stream is dropped right after.
pub async fn close(stream: &mut TcpStream) {
    if let Err(e) = stream.shutdown().await {
        tracing::debug!("Socket shutdown failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_connection_info_display() {
        let info = TcpConnectionInfo::new("192.168.0.20", 10000);
        assert_eq!(info.to_string(), "192.168.0.20:10000");
    }

    #[tokio::test]
    async fn test_read_reply_stops_once_code_arrives() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"00\r\n").await.unwrap();
            // Keep the socket open; read_reply must not wait for EOF
            let mut buf = [0u8; 8];
            let _ = socket.read(&mut buf).await;
        });

        let mut stream = connect(&TcpConnectionInfo::new("127.0.0.1", port))
            .await
            .unwrap();
        let reply = read_reply(&mut stream).await.unwrap();
        assert_eq!(reply, b"00\r\n");

        close(&mut stream).await;
        drop(stream);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_read_reply_skips_lines_without_code() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"ACK\n").await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(30)).await;
            socket.write_all(b"05\n").await.unwrap();
            let mut buf = [0u8; 8];
            let _ = socket.read(&mut buf).await;
        });

        let mut stream = connect(&TcpConnectionInfo::new("127.0.0.1", port))
            .await
            .unwrap();
        let reply = read_reply(&mut stream).await.unwrap();
        assert_eq!(reply, b"ACK\n05\n");

        close(&mut stream).await;
        drop(stream);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_read_reply_closed_without_data() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let mut stream = connect(&TcpConnectionInfo::new("127.0.0.1", port))
            .await
            .unwrap();
        server.await.unwrap();
        assert_eq!(
            read_reply(&mut stream).await,
            Err(ConnectionError::ConnectionClosed)
        );
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect(&TcpConnectionInfo::new("127.0.0.1", port))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Refused { .. }));
    }
}
