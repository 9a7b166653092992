//! WebSocket link to the car.
//!
//! The bridge cycles through the configured car addresses until one accepts
//! a connection, then forwards motor frames to it and republishes every
//! frame the car sends on the shared event channel.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, Stream, StreamExt};
use rover_core::MotorCommand;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type CarSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LinkStatus {
    pub connected: bool,
    pub status: String,
    pub endpoint: Option<String>,
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self { connected: false, status: "Disconnected".to_string(), endpoint: None }
    }
}

/// Outbound side of the car connection.
#[async_trait]
pub trait RoverLink: Send + Sync {
    /// Returns false when no car is connected and the frame was dropped.
    async fn send(&self, cmd: &MotorCommand) -> Result<bool>;
    fn status(&self) -> LinkStatus;
}

pub struct CarBridge {
    endpoints: Vec<String>,
    retry_delay: Duration,
    round_delay: Duration,
    sink: Mutex<Option<CarSink>>,
    status: RwLock<LinkStatus>,
    events: broadcast::Sender<String>,
}

impl CarBridge {
    pub fn new(
        endpoints: Vec<String>,
        retry_delay: Duration,
        round_delay: Duration,
        events: broadcast::Sender<String>,
    ) -> Self {
        Self {
            endpoints,
            retry_delay,
            round_delay,
            sink: Mutex::new(None),
            status: RwLock::new(LinkStatus::default()),
            events,
        }
    }

    /// Starts the reconnect loop on the runtime and returns the shared bridge.
    pub fn spawn(self) -> Arc<Self> {
        let bridge = Arc::new(self);
        let worker = Arc::clone(&bridge);
        tokio::spawn(async move { worker.connect_loop().await });
        bridge
    }

    fn set_status(&self, connected: bool, status: String, endpoint: Option<&str>) {
        if let Ok(mut s) = self.status.write() {
            *s = LinkStatus { connected, status, endpoint: endpoint.map(str::to_string) };
        }
    }

    async fn connect_loop(self: Arc<Self>) {
        loop {
            for endpoint in &self.endpoints {
                match connect_async(endpoint.as_str()).await {
                    Ok((stream, _)) => {
                        info!(%endpoint, "car connected");
                        let (sink, source) = stream.split();
                        *self.sink.lock().await = Some(sink);
                        self.set_status(true, format!("Connected to {endpoint}"), Some(endpoint.as_str()));
                        self.forward_incoming(source).await;
                        *self.sink.lock().await = None;
                        self.set_status(false, "Disconnected".to_string(), None);
                        warn!(%endpoint, "car disconnected");
                    }
                    Err(e) => {
                        debug!(%endpoint, error = %e, "car connect failed");
                        self.set_status(false, format!("Connection failed: {e}"), None);
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
            tokio::time::sleep(self.round_delay).await;
        }
    }

    async fn forward_incoming<S>(&self, mut source: S)
    where
        S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        while let Some(frame) = source.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    let _ = self.events.send(text);
                }
                Ok(Message::Binary(bytes)) => {
                    let _ = self.events.send(String::from_utf8_lossy(&bytes).into_owned());
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "car read failed");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl RoverLink for CarBridge {
    async fn send(&self, cmd: &MotorCommand) -> Result<bool> {
        let mut guard = self.sink.lock().await;
        let Some(sink) = guard.as_mut() else {
            debug!(?cmd, "no car connected, dropping command");
            return Ok(false);
        };
        let frame = serde_json::to_string(cmd)?;
        if let Err(e) = sink.send(Message::Text(frame)).await {
            warn!(error = %e, "car write failed");
            *guard = None;
            self.set_status(false, "Disconnected".to_string(), None);
            return Ok(false);
        }
        Ok(true)
    }

    fn status(&self) -> LinkStatus {
        self.status.read().map(|s| s.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn bridge(endpoints: Vec<String>, events: broadcast::Sender<String>) -> CarBridge {
        CarBridge::new(endpoints, Duration::from_millis(10), Duration::from_millis(10), events)
    }

    #[tokio::test]
    async fn send_without_car_is_dropped() {
        let (events, _) = broadcast::channel(4);
        let b = bridge(vec!["ws://127.0.0.1:9".to_string()], events);
        assert!(!b.send(&MotorCommand::stop(90, 90)).await.unwrap());
        assert_eq!(b.status(), LinkStatus::default());
    }

    #[tokio::test]
    async fn falls_through_to_next_endpoint_and_republishes_frames() {
        let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead_addr = dead.local_addr().unwrap();
        drop(dead);
        let live = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let live_url = format!("ws://{}", live.local_addr().unwrap());

        let (events, mut rx) = broadcast::channel(16);
        let b = bridge(vec![format!("ws://{dead_addr}"), live_url.clone()], events).spawn();

        let (tcp, _) = live.accept().await.unwrap();
        let mut car = tokio_tungstenite::accept_async(tcp).await.unwrap();
        car.send(Message::Text(r#"{"battery":80}"#.to_string())).await.unwrap();

        let got = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        assert_eq!(got, r#"{"battery":80}"#);
        let status = b.status();
        assert!(status.connected);
        assert_eq!(status.endpoint.as_deref(), Some(live_url.as_str()));

        let cmd = MotorCommand::drive(150, 150, 90, 90);
        assert!(b.send(&cmd).await.unwrap());
        let frame = tokio::time::timeout(Duration::from_secs(5), car.next()).await.unwrap().unwrap().unwrap();
        assert_eq!(frame, Message::Text(serde_json::to_string(&cmd).unwrap()));

        drop(car);
        tokio::time::timeout(Duration::from_secs(5), async {
            while b.status().connected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        assert!(!b.send(&cmd).await.unwrap());
    }
}
