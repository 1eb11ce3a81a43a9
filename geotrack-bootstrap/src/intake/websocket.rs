use std::time::Duration;

use anyhow::{anyhow, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use geotrack_application::ops::Delivery;
use geotrack_application::Metrics;

use super::parse_event_payload;

const RECONNECT_DELAY_SECONDS: u64 = 5;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Consumes events from a WebSocket feed, one event per text frame.
/// Reconnects forever; returns only when the delivery queue closes.
pub async fn run_ws_intake(
    ws_url: &str,
    sender: mpsc::Sender<Delivery>,
    metrics: &Metrics,
) -> Result<()> {
    loop {
        match tokio_tungstenite::connect_async(ws_url).await {
            Ok((mut ws, _)) => {
                info!("ws intake connected: url={}", ws_url);
                match run_ws_loop(&mut ws, &sender, metrics).await {
                    Ok(()) => return Ok(()),
                    Err(err) => warn!("ws intake loop exited: url={}, err={}", ws_url, err),
                }
            }
            Err(err) => {
                warn!("ws intake connect failed: url={}, err={}", ws_url, err);
            }
        }
        if sender.is_closed() {
            return Ok(());
        }
        sleep(Duration::from_secs(RECONNECT_DELAY_SECONDS)).await;
    }
}

/// `Ok(())` means the queue closed; any error means reconnect.
async fn run_ws_loop(
    ws: &mut WsStream,
    sender: &mpsc::Sender<Delivery>,
    metrics: &Metrics,
) -> Result<()> {
    while let Some(next) = ws.next().await {
        match next {
            Ok(Message::Text(text)) => {
                let event = match parse_event_payload(&text) {
                    Ok(event) => event,
                    Err(err) => {
                        warn!("ws intake skipping frame: {}", err);
                        metrics.record_rejected();
                        continue;
                    }
                };
                if sender.send(Delivery::new(event)).await.is_err() {
                    let _ = ws.close(None).await;
                    return Ok(());
                }
            }
            Ok(Message::Ping(bytes)) => {
                ws.send(Message::Pong(bytes)).await?;
            }
            Ok(Message::Close(frame)) => {
                return Err(anyhow!("ws closed by peer: {:?}", frame));
            }
            Ok(_) => {}
            Err(err) => {
                return Err(anyhow!("ws stream error: {}", err));
            }
        }
    }
    Err(anyhow!("ws stream ended"))
}
