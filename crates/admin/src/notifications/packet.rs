//! Engine.IO v4 / Socket.IO v5 text packet codec.
//!
//! Every WebSocket text frame is one Engine.IO packet: a type digit followed
//! by its payload. Socket.IO packets ride inside Engine.IO `message` packets
//! as `<type>[<namespace>,][<ack id>][<json>]`.
//!
//! Only text framing is handled; binary attachments are rejected.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PacketError {
    #[error("empty packet")]
    Empty,

    #[error("unknown packet type '{0}'")]
    UnknownType(char),

    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("malformed packet: {0}")]
    Malformed(&'static str),

    #[error("unsupported packet: {0}")]
    Unsupported(&'static str),
}

/// Handshake data sent by the server in the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    pub sid: String,
    /// Milliseconds between server pings.
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
}

const fn default_ping_interval() -> u64 {
    25_000
}

const fn default_ping_timeout() -> u64 {
    20_000
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(OpenInfo),
    Close,
    Ping,
    Pong,
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    /// # Errors
    ///
    /// Returns an error for empty frames, unknown types or a bad open payload.
    pub fn decode(frame: &str) -> Result<Self, PacketError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let rest = chars.as_str();
        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(rest)?)),
            '1' => Ok(Self::Close),
            // "2probe" only appears during transport upgrades.
            '2' => Ok(Self::Ping),
            '3' => Ok(Self::Pong),
            '4' => Ok(Self::Message(rest.to_string())),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(PacketError::UnknownType(other)),
        }
    }

    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Open(_) => "0".to_string(),
            Self::Close => "1".to_string(),
            Self::Ping => "2".to_string(),
            Self::Pong => "3".to_string(),
            Self::Message(payload) => format!("4{payload}"),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        message: String,
    },
}

impl SocketPacket {
    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::Connect { namespace, .. }
            | Self::Disconnect { namespace }
            | Self::Event { namespace, .. }
            | Self::Ack { namespace, .. }
            | Self::ConnectError { namespace, .. } => namespace,
        }
    }

    /// Decode the payload of an Engine.IO `message` packet.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown types, binary packets or bad JSON.
    pub fn decode(payload: &str) -> Result<Self, PacketError> {
        let mut chars = payload.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let rest = chars.as_str();

        let (namespace, rest) = if rest.starts_with('/') {
            match rest.split_once(',') {
                Some((nsp, tail)) => (nsp.to_string(), tail),
                None => (rest.to_string(), ""),
            }
        } else {
            ("/".to_string(), rest)
        };

        let id_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (id_digits, json) = rest.split_at(id_len);
        let id = if id_digits.is_empty() {
            None
        } else {
            Some(
                id_digits
                    .parse::<u64>()
                    .map_err(|_| PacketError::Malformed("ack id out of range"))?,
            )
        };

        match kind {
            '0' => Ok(Self::Connect {
                namespace,
                data: parse_optional(json)?,
            }),
            '1' => Ok(Self::Disconnect { namespace }),
            '2' => {
                let mut args = parse_args(json)?;
                if args.is_empty() {
                    return Err(PacketError::Malformed("event without a name"));
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    _ => return Err(PacketError::Malformed("event name is not a string")),
                };
                Ok(Self::Event {
                    namespace,
                    id,
                    name,
                    args,
                })
            }
            '3' => Ok(Self::Ack {
                namespace,
                id: id.ok_or(PacketError::Malformed("ack without id"))?,
                args: parse_args(json)?,
            }),
            '4' => {
                let message = match parse_optional(json)? {
                    Some(Value::Object(map)) => map
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("connection refused")
                        .to_string(),
                    Some(Value::String(message)) => message,
                    _ => "connection refused".to_string(),
                };
                Ok(Self::ConnectError { namespace, message })
            }
            '5' | '6' => Err(PacketError::Unsupported("binary attachments")),
            other => Err(PacketError::UnknownType(other)),
        }
    }

    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = String::new();
        let kind = match self {
            Self::Connect { .. } => '0',
            Self::Disconnect { .. } => '1',
            Self::Event { .. } => '2',
            Self::Ack { .. } => '3',
            Self::ConnectError { .. } => '4',
        };
        out.push(kind);

        let namespace = self.namespace();
        if namespace != "/" {
            out.push_str(namespace);
            out.push(',');
        }

        match self {
            Self::Connect { data, .. } => {
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
            }
            Self::Disconnect { .. } => {}
            Self::Event { id, name, args, .. } => {
                if let Some(id) = id {
                    out.push_str(&id.to_string());
                }
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                out.push_str(&Value::Array(array).to_string());
            }
            Self::Ack { id, args, .. } => {
                out.push_str(&id.to_string());
                out.push_str(&Value::Array(args.clone()).to_string());
            }
            Self::ConnectError { message, .. } => {
                out.push_str(&serde_json::json!({ "message": message }).to_string());
            }
        }
        out
    }

    /// Wrap in an Engine.IO `message` packet, ready to send as a text frame.
    #[must_use]
    pub fn to_frame(&self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}

fn parse_optional(json: &str) -> Result<Option<Value>, PacketError> {
    if json.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(json)?))
}

fn parse_args(json: &str) -> Result<Vec<Value>, PacketError> {
    match parse_optional(json)? {
        None => Ok(Vec::new()),
        Some(Value::Array(args)) => Ok(args),
        Some(_) => Err(PacketError::Malformed("payload is not an array")),
    }
}
