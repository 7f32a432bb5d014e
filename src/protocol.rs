//! TCP protocol for pose-model client ↔ rep server communication.
//!
//! The client runs the pose model and streams landmark frames; the server
//! answers every frame with telemetry.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::config::PoseConfig;
use crate::pose::LandmarkFrame;
use crate::render::OverlayColors;
use crate::tracker::{SessionSummary, Telemetry};

// --- Message types ---

/// Client → server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Replace the pose model settings before the next `Start`
    Configure { pose: PoseConfig },
    Start,
    Frame { frame: LandmarkFrame },
    Reset,
    Stop,
}

/// Server → client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Telemetry {
        telemetry: Telemetry,
        overlay: Option<OverlayColors>,
    },
    Summary(SessionSummary),
    Error { message: String },
}

// --- TCP codec helpers ---

pub type MessageStream = Framed<TcpStream, LengthDelimitedCodec>;

/// A 33-landmark frame is well under a kilobyte; anything near this is garbage.
const MAX_FRAME_LENGTH: usize = 1024 * 1024;

/// Create a framed message stream with length-delimited framing.
pub fn message_stream(stream: TcpStream) -> MessageStream {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LENGTH)
        .new_codec();
    Framed::new(stream, codec)
}

pub fn encode<T: Serialize>(msg: &T) -> anyhow::Result<Bytes> {
    Ok(Bytes::from(bincode::serialize(msg)?))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> anyhow::Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

/// Send a serializable message (bincode + length prefix).
pub async fn send_message<T: Serialize>(
    stream: &mut MessageStream,
    msg: &T,
) -> anyhow::Result<()> {
    stream.send(encode(msg)?).await?;
    Ok(())
}

/// Receive and deserialize a message. `Ok(None)` on clean close.
pub async fn recv_message<T: DeserializeOwned>(
    stream: &mut MessageStream,
) -> anyhow::Result<Option<T>> {
    match stream.next().await {
        Some(Ok(bytes)) => Ok(Some(decode(&bytes)?)),
        Some(Err(e)) => Err(e.into()),
        None => Ok(None),
    }
}
