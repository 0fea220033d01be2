use std::{fmt, net::SocketAddr, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream, UdpSocket,
    },
};

use crate::messages::{LinkCommand, LinkMessage};

/// Where to find the vehicle, parsed from a connection string such as
/// `tcp:127.0.0.1:5760` or `udp:0.0.0.0:14550`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Connect out to a TCP endpoint.
    Tcp { addr: String },
    /// Listen for datagrams on a local address. Commands go back to the last sender.
    Udp { addr: String },
}

impl FromStr for LinkTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (scheme, addr) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| anyhow!("Invalid link target \"{}\", expected <tcp|udp>:<host>:<port>", s))?;
        if !addr.contains(':') {
            bail!("Link target \"{}\" is missing a port", s);
        }
        match scheme.to_ascii_lowercase().as_str() {
            "tcp" => Ok(LinkTarget::Tcp {
                addr: addr.to_owned(),
            }),
            "udp" | "udpin" => Ok(LinkTarget::Udp {
                addr: addr.to_owned(),
            }),
            other => bail!("Unsupported link scheme \"{}\"", other),
        }
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkTarget::Tcp { addr } => write!(f, "tcp:{}", addr),
            LinkTarget::Udp { addr } => write!(f, "udp:{}", addr),
        }
    }
}

enum TransportType {
    Tcp {
        lines: Lines<BufReader<OwnedReadHalf>>,
        writer: OwnedWriteHalf,
    },
    Udp {
        socket: UdpSocket,
        peer: Option<SocketAddr>,
    },
}

/// Carries decoded vehicle messages in and commands out, one JSON object per line (TCP)
/// or per datagram (UDP).
pub struct Transport {
    transport_type: TransportType,
    buf: Vec<u8>,
    closed: bool,
}

impl Transport {
    pub async fn open(target: &LinkTarget) -> Result<Self> {
        match target {
            LinkTarget::Tcp { addr } => Self::tcp(addr).await,
            LinkTarget::Udp { addr } => Self::udp(addr).await,
        }
    }

    pub async fn tcp(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.context(format!(
            "Failed to connect to TCP stream with address {:?}",
            addr
        ))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            transport_type: TransportType::Tcp {
                lines: BufReader::new(reader).lines(),
                writer,
            },
            buf: Vec::new(),
            closed: false,
        })
    }

    pub async fn udp(addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .context(format!("Failed to bind UDP socket to {}", addr))?;
        log::debug!("Link listening on {:?}", socket.local_addr());
        Ok(Self {
            transport_type: TransportType::Udp { socket, peer: None },
            buf: vec![0u8; 4 * 1024],
            closed: false,
        })
    }

    /// Whether the remote end has closed the stream. Only TCP transports close.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Receives the next message. Cancel safe.
    pub async fn recv(&mut self) -> Result<LinkMessage> {
        match &mut self.transport_type {
            TransportType::Tcp { lines, .. } => {
                let line = match lines.next_line().await {
                    Ok(line) => line,
                    Err(err) => {
                        self.closed = true;
                        return Err(err).context("Failed to read from TCP stream");
                    }
                };
                match line {
                    Some(line) => serde_json::from_str(line.trim())
                        .context(format!("Failed to decode link message {:?}", line)),
                    None => {
                        self.closed = true;
                        bail!("Link closed by peer");
                    }
                }
            }
            TransportType::Udp { socket, peer } => {
                let (len, from) = socket
                    .recv_from(&mut self.buf)
                    .await
                    .context("Failed to receive data from UDP socket")?;
                *peer = Some(from);
                serde_json::from_slice(&self.buf[..len]).context("Failed to decode link datagram")
            }
        }
    }

    pub async fn send(&mut self, cmd: &LinkCommand) -> Result<()> {
        let mut buf = serde_json::to_vec(cmd)?;
        match &mut self.transport_type {
            TransportType::Tcp { writer, .. } => {
                buf.push(b'\n');
                writer
                    .write_all(&buf)
                    .await
                    .context("Failed to write to TCP stream")?;
                Ok(())
            }
            TransportType::Udp { socket, peer } => {
                let peer = peer.ok_or_else(|| anyhow!("No vehicle has sent to this socket yet"))?;
                socket
                    .send_to(&buf, peer)
                    .await
                    .context("Failed to send on UDP socket")?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!(
            "tcp:127.0.0.1:5760".parse::<LinkTarget>().unwrap(),
            LinkTarget::Tcp {
                addr: "127.0.0.1:5760".into()
            }
        );
        assert_eq!(
            "UDP:0.0.0.0:14550".parse::<LinkTarget>().unwrap(),
            LinkTarget::Udp {
                addr: "0.0.0.0:14550".into()
            }
        );
        assert!("serial:/dev/ttyUSB0".parse::<LinkTarget>().is_err());
        assert!("tcp:localhost".parse::<LinkTarget>().is_err());
        assert!("nonsense".parse::<LinkTarget>().is_err());
    }

    #[test]
    fn test_target_display_round_trips() {
        let target: LinkTarget = "tcp:10.0.0.2:5760".parse().unwrap();
        assert_eq!(target.to_string(), "tcp:10.0.0.2:5760");
    }
}
