//! Command channel protocol.
//!
//! A running tool instance listens on a loopback TCP port. Requests and
//! replies are newline-delimited JSON, one object per line:
//!
//! ```text
//! -> {"cmd":"load","path":"/tmp/rizomuv_bridge/Body.ruvx.json"}
//! <- {"ok":true}
//! -> {"cmd":"ping"}
//! <- {"ok":false,"error":"busy"}
//! ```

use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, BufReader, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::path::PathBuf;
use std::time::Duration;

/// Request sent to a tool instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ToolCommand {
    /// Liveness check.
    Ping,
    /// Open an interchange file.
    Load {
        /// Absolute path of the file.
        path: PathBuf,
    },
}

/// Reply from a tool instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReply {
    /// Whether the command was accepted.
    pub ok: bool,
    /// Reason for a refusal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolReply {
    /// Acknowledgement.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    /// Refusal with a reason.
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(msg.into()),
        }
    }
}

/// Open connection to one tool instance.
///
/// Valid for a single negotiation attempt; a new session is opened for
/// every export.
#[derive(Debug)]
pub struct ToolSession {
    port: u16,
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl ToolSession {
    /// Connects to `127.0.0.1:<port>`.
    ///
    /// `ack_timeout` bounds every later read and write on the session.
    pub fn connect(port: u16, connect_timeout: Duration, ack_timeout: Duration) -> io::Result<Self> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        let stream = TcpStream::connect_timeout(&addr, connect_timeout)?;
        stream.set_read_timeout(Some(ack_timeout))?;
        stream.set_write_timeout(Some(ack_timeout))?;
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            port,
            reader,
            writer: stream,
        })
    }

    /// Port of the connected instance.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Sends a command and waits for its reply.
    ///
    /// A closed connection or an undecodable reply is an
    /// [`io::ErrorKind::InvalidData`] or [`io::ErrorKind::UnexpectedEof`]
    /// error.
    pub fn send(&mut self, command: &ToolCommand) -> io::Result<ToolReply> {
        let mut line = serde_json::to_string(command)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before acknowledgement",
            ));
        }
        parse_reply(reply.trim())
    }
}

/// Parses one reply line.
pub fn parse_reply(line: &str) -> io::Result<ToolReply> {
    serde_json::from_str(line).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("invalid reply: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let load = ToolCommand::Load {
            path: PathBuf::from("/tmp/rizomuv_bridge/Body.ruvx.json"),
        };
        assert_eq!(
            serde_json::to_string(&load).unwrap(),
            r#"{"cmd":"load","path":"/tmp/rizomuv_bridge/Body.ruvx.json"}"#
        );
        assert_eq!(
            serde_json::to_string(&ToolCommand::Ping).unwrap(),
            r#"{"cmd":"ping"}"#
        );
    }

    #[test]
    fn test_reply_wire_format() {
        assert_eq!(
            serde_json::to_string(&ToolReply::success()).unwrap(),
            r#"{"ok":true}"#
        );
        assert_eq!(
            parse_reply(r#"{"ok":false,"error":"busy"}"#).unwrap(),
            ToolReply::error("busy")
        );
    }

    #[test]
    fn test_parse_reply_garbage() {
        let err = parse_reply("RizomUV 2024.1 ready").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
