use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use rep_tracker::config::Config;
use rep_tracker::pose::ExternalSource;
use rep_tracker::protocol::{message_stream, recv_message, send_message, ClientMessage, ServerMessage};
use rep_tracker::render::overlay_colors;
use rep_tracker::tracker::{FrameOutcome, RepTracker};
use rep_tracker::TrackerError;

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_PATH.to_string());
    let config = Config::load_or_default(&config_path);
    rep_tracker::init_tracing(&config.app.log_level);

    println!("Rep Server {}", rep_tracker::GIT_VERSION);
    println!("Listening: {}", config.server.addr);

    let listener = TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;

    loop {
        let (socket, peer) = listener.accept().await?;
        info!(%peer, "client connected");
        let config = config.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, config).await {
                warn!(%peer, error = %e, "client session failed");
            }
            info!(%peer, "client disconnected");
        });
    }
}

/// One tracker per connection. Every message gets exactly one reply.
async fn handle_client(socket: TcpStream, config: Config) -> Result<()> {
    let mut stream = message_stream(socket);
    let mut tracker = RepTracker::new(ExternalSource::new(), &config);

    while let Some(msg) = recv_message::<ClientMessage>(&mut stream).await? {
        let reply = match msg {
            ClientMessage::Configure { pose } => match tracker.configure(pose) {
                Ok(()) => telemetry_reply(&tracker, None),
                Err(e) => error_reply(e),
            },
            ClientMessage::Start => match tracker.start() {
                Ok(()) => telemetry_reply(&tracker, None),
                Err(e) => error_reply(e),
            },
            ClientMessage::Frame { frame } => {
                let result = tracker.process_frame(&frame);
                let overlay = match result.outcome {
                    FrameOutcome::Tracked => result.elbow_angle.map(overlay_colors),
                    FrameOutcome::NoSignal | FrameOutcome::Idle => None,
                };
                telemetry_reply(&tracker, overlay)
            }
            ClientMessage::Reset => {
                tracker.reset();
                telemetry_reply(&tracker, None)
            }
            ClientMessage::Stop => ServerMessage::Summary(tracker.stop()),
        };
        send_message(&mut stream, &reply).await?;
    }

    tracker.stop();
    Ok(())
}

fn telemetry_reply(
    tracker: &RepTracker<ExternalSource>,
    overlay: Option<rep_tracker::render::OverlayColors>,
) -> ServerMessage {
    ServerMessage::Telemetry {
        telemetry: tracker.telemetry(),
        overlay,
    }
}

fn error_reply(err: TrackerError) -> ServerMessage {
    ServerMessage::Error {
        message: err.to_string(),
    }
}
