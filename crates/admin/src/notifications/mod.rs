//! Real-time admin notifications over Socket.IO.
//!
//! One WebSocket carries Engine.IO v4 text frames. The client joins the
//! `/admin` namespace with the admin token, answers server pings, and
//! forwards every event on an `mpsc` channel. Dropped connections are
//! retried at a fixed interval; the attempt counter resets once a
//! connection reaches the namespace.

pub mod events;
pub mod packet;

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, sleep_until, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

pub use events::{AdminEvent, OrderNotice, PaymentNotice, ReviewNotice, StockNotice};
pub use packet::{EnginePacket, OpenInfo, PacketError, SocketPacket};

use crate::config::AdminConfig;

/// Namespace the backend emits admin events on.
pub const ADMIN_NAMESPACE: &str = "/admin";

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] PacketError),

    #[error("server rejected the admin connection: {0}")]
    ConnectRejected(String),

    #[error("connection closed by server")]
    Closed,

    #[error("timed out waiting for the server")]
    Timeout,

    #[error("gave up after {0} reconnect attempts")]
    ReconnectExhausted(u32),

    #[error("notification task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Fixed-interval reconnects with an attempt cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    #[must_use]
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Delay before reconnect attempt number `attempt` (1-based), or `None`
    /// once the cap is reached.
    #[must_use]
    pub const fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt <= self.max_attempts {
            Some(self.interval)
        } else {
            None
        }
    }
}

/// Why a single connection ended without an error.
enum SessionEnd {
    Shutdown,
    ReceiverDropped,
}

/// Deadline for the next sign of life from the server.
struct Heartbeat {
    window: Duration,
    deadline: Instant,
}

impl Heartbeat {
    fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: Instant::now() + window,
        }
    }

    fn reset(&mut self) {
        self.deadline = Instant::now() + self.window;
    }
}

enum FrameAction {
    Continue,
    Reply(String),
    Stop,
}

/// Client for the backend's admin event channel.
#[derive(Clone)]
pub struct NotificationClient {
    url: Url,
    token: SecretString,
    namespace: String,
    policy: ReconnectPolicy,
}

impl std::fmt::Debug for NotificationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationClient")
            .field("url", &self.url.as_str())
            .field("token", &"[REDACTED]")
            .field("namespace", &self.namespace)
            .field("policy", &self.policy)
            .finish()
    }
}

/// A running notification task.
#[derive(Debug)]
pub struct NotificationHandle {
    pub events: mpsc::Receiver<AdminEvent>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<(), NotificationError>>,
}

impl NotificationHandle {
    /// Ask the task to disconnect.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Stop the task and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the task, if any.
    pub async fn join(self) -> Result<(), NotificationError> {
        self.stop();
        self.task.await?
    }
}

impl NotificationClient {
    #[must_use]
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            url: config.websocket_url(),
            token: config.token.clone(),
            namespace: ADMIN_NAMESPACE.to_string(),
            policy: ReconnectPolicy::new(config.reconnect_interval, config.reconnect_max_attempts),
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Run the client on a background task.
    #[must_use]
    pub fn spawn(self, buffer: usize) -> NotificationHandle {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.run(tx, shutdown_rx).await });
        NotificationHandle {
            events: rx,
            shutdown,
            task,
        }
    }

    /// Connect and forward events until `shutdown` turns true, the receiver
    /// is dropped, or reconnects are exhausted.
    ///
    /// # Errors
    ///
    /// Returns `ConnectRejected` when the server refuses the token and
    /// `ReconnectExhausted` after the configured number of failed attempts.
    #[instrument(skip_all, fields(url = %self.url))]
    pub async fn run(
        &self,
        events: mpsc::Sender<AdminEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), NotificationError> {
        let mut failures: u32 = 0;

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            let mut joined = false;
            let outcome = self.session(&events, &mut shutdown, &mut joined).await;
            if joined {
                failures = 0;
            }

            match outcome {
                Ok(SessionEnd::Shutdown) => {
                    info!("Admin notifications stopped");
                    return Ok(());
                }
                Ok(SessionEnd::ReceiverDropped) => {
                    debug!("Event receiver dropped, disconnecting");
                    return Ok(());
                }
                Err(NotificationError::ConnectRejected(message)) => {
                    error!(message = %message, "Admin channel rejected the token");
                    return Err(NotificationError::ConnectRejected(message));
                }
                Err(e) => {
                    failures += 1;
                    let Some(delay) = self.policy.next_delay(failures) else {
                        error!(
                            error = %e,
                            attempts = self.policy.max_attempts,
                            "Giving up on admin notifications"
                        );
                        return Err(NotificationError::ReconnectExhausted(
                            self.policy.max_attempts,
                        ));
                    };
                    warn!(
                        error = %e,
                        attempt = failures,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Admin socket dropped, reconnecting"
                    );
                    tokio::select! {
                        () = sleep(delay) => {}
                        () = wait_for_stop(&mut shutdown) => return Ok(()),
                    }
                }
            }
        }
    }

    async fn session(
        &self,
        events: &mpsc::Sender<AdminEvent>,
        shutdown: &mut watch::Receiver<bool>,
        joined: &mut bool,
    ) -> Result<SessionEnd, NotificationError> {
        let (socket, _) = timeout(HANDSHAKE_TIMEOUT, connect_async(self.url.as_str()))
            .await
            .map_err(|_| NotificationError::Timeout)??;
        debug!("WebSocket connected");
        let (mut sink, mut stream) = socket.split();
        let mut heartbeat = Heartbeat::new(HANDSHAKE_TIMEOUT);

        loop {
            tokio::select! {
                () = wait_for_stop(shutdown) => {
                    let goodbye = SocketPacket::Disconnect { namespace: self.namespace.clone() };
                    let _ = sink.send(Message::text(goodbye.to_frame())).await;
                    let _ = sink.close().await;
                    return Ok(SessionEnd::Shutdown);
                }
                () = sleep_until(heartbeat.deadline) => {
                    return Err(NotificationError::Timeout);
                }
                frame = stream.next() => {
                    let Some(frame) = frame else {
                        return Err(NotificationError::Closed);
                    };
                    let text = match frame? {
                        Message::Text(text) => text,
                        Message::Close(_) => return Err(NotificationError::Closed),
                        _ => continue,
                    };
                    match self.handle_frame(text.as_str(), events, joined, &mut heartbeat).await? {
                        FrameAction::Continue => {}
                        FrameAction::Reply(reply) => sink.send(Message::text(reply)).await?,
                        FrameAction::Stop => {
                            let _ = sink.close().await;
                            return Ok(SessionEnd::ReceiverDropped);
                        }
                    }
                }
            }
        }
    }

    async fn handle_frame(
        &self,
        frame: &str,
        events: &mpsc::Sender<AdminEvent>,
        joined: &mut bool,
        heartbeat: &mut Heartbeat,
    ) -> Result<FrameAction, NotificationError> {
        match EnginePacket::decode(frame)? {
            EnginePacket::Open(info) => {
                debug!(sid = %info.sid, ping_interval = info.ping_interval, "Engine.IO open");
                heartbeat.window = Duration::from_millis(
                    info.ping_interval.saturating_add(info.ping_timeout),
                );
                heartbeat.reset();
                let connect = SocketPacket::Connect {
                    namespace: self.namespace.clone(),
                    data: Some(json!({ "token": self.token.expose_secret() })),
                };
                Ok(FrameAction::Reply(connect.to_frame()))
            }
            EnginePacket::Ping => {
                heartbeat.reset();
                Ok(FrameAction::Reply(EnginePacket::Pong.encode()))
            }
            EnginePacket::Close => Err(NotificationError::Closed),
            EnginePacket::Message(payload) => match SocketPacket::decode(&payload) {
                Ok(packet) => self.handle_packet(packet, events, joined).await,
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable Socket.IO packet");
                    Ok(FrameAction::Continue)
                }
            },
            EnginePacket::Pong | EnginePacket::Upgrade | EnginePacket::Noop => {
                Ok(FrameAction::Continue)
            }
        }
    }

    async fn handle_packet(
        &self,
        packet: SocketPacket,
        events: &mpsc::Sender<AdminEvent>,
        joined: &mut bool,
    ) -> Result<FrameAction, NotificationError> {
        if packet.namespace() != self.namespace {
            return Ok(FrameAction::Continue);
        }

        match packet {
            SocketPacket::Connect { .. } => {
                *joined = true;
                info!(namespace = %self.namespace, "Joined admin channel");
                Ok(FrameAction::Continue)
            }
            SocketPacket::ConnectError { message, .. } => {
                Err(NotificationError::ConnectRejected(message))
            }
            SocketPacket::Disconnect { .. } => Err(NotificationError::Closed),
            SocketPacket::Event { name, args, .. } => {
                let payload = args.into_iter().next().unwrap_or(Value::Null);
                let event = AdminEvent::parse(&name, payload);
                debug!(event = event.name(), "Admin event");
                if events.send(event).await.is_err() {
                    return Ok(FrameAction::Stop);
                }
                Ok(FrameAction::Continue)
            }
            SocketPacket::Ack { .. } => Ok(FrameAction::Continue),
        }
    }
}

/// Resolves once `shutdown` is true. Never resolves if the sender is gone.
async fn wait_for_stop(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::net::{TcpListener, TcpStream};
    use tokio_tungstenite::{WebSocketStream, accept_async};

    use super::*;

    const OPEN: &str = r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

    async fn listener() -> (TcpListener, AdminConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = AdminConfig::new(&format!("http://{addr}/api"), "admin-test-token").unwrap();
        (listener, config)
    }

    async fn recv_text(ws: &mut WebSocketStream<TcpStream>) -> String {
        loop {
            match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => return text.as_str().to_string(),
                _ => continue,
            }
        }
    }

    /// Open the Engine.IO session and accept the namespace join.
    async fn handshake(stream: TcpStream) -> WebSocketStream<TcpStream> {
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::text(OPEN)).await.unwrap();
        assert_eq!(
            recv_text(&mut ws).await,
            r#"40/admin,{"token":"admin-test-token"}"#
        );
        ws.send(Message::text(r#"40/admin,{"sid":"n1"}"#)).await.unwrap();
        ws
    }

    #[test]
    fn test_reconnect_policy_caps_attempts() {
        let policy = ReconnectPolicy::new(Duration::from_secs(3), 2);
        assert_eq!(policy.next_delay(1), Some(Duration::from_secs(3)));
        assert_eq!(policy.next_delay(2), Some(Duration::from_secs(3)));
        assert_eq!(policy.next_delay(3), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = AdminConfig::new("https://api.fastbite.vn", "super-secret").unwrap();
        let debug = format!("{:?}", NotificationClient::new(&config));
        assert!(debug.contains("wss://api.fastbite.vn/socket.io/"));
        assert!(!debug.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_forwards_events_and_answers_pings() {
        let (listener, config) = listener().await;
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = handshake(stream).await;
            ws.send(Message::text("2")).await.unwrap();
            assert_eq!(recv_text(&mut ws).await, "3");
            ws.send(Message::text(
                r#"42/admin,["order:created",{"_id":"o1","orderNumber":"FB1001"}]"#,
            ))
            .await
            .unwrap();
            // Wait for the client to leave the namespace.
            recv_text(&mut ws).await
        });

        let mut handle = NotificationClient::new(&config).spawn(8);
        let event = handle.events.recv().await.unwrap();
        assert_eq!(event.name(), "order:created");
        assert_eq!(event.toast(), "Đơn hàng mới #FB1001");

        handle.join().await.unwrap();
        assert_eq!(server.await.unwrap(), "41/admin,");
    }

    #[tokio::test]
    async fn test_rejected_token_is_fatal() {
        let (listener, config) = listener().await;
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.send(Message::text(OPEN)).await.unwrap();
            recv_text(&mut ws).await;
            ws.send(Message::text(r#"44/admin,{"message":"Invalid token"}"#))
                .await
                .unwrap();
            let _ = ws.next().await;
        });

        let (tx, _rx) = mpsc::channel(1);
        let (_stop, stop_rx) = watch::channel(false);
        let err = NotificationClient::new(&config)
            .run(tx, stop_rx)
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::ConnectRejected(ref m) if m == "Invalid token"));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (listener, config) = listener().await;
        drop(listener);

        let client = NotificationClient::new(&config)
            .with_policy(ReconnectPolicy::new(Duration::from_millis(5), 3));
        let (tx, _rx) = mpsc::channel(1);
        let (_stop, stop_rx) = watch::channel(false);
        let err = client.run(tx, stop_rx).await.unwrap_err();
        assert!(matches!(err, NotificationError::ReconnectExhausted(3)));
    }

    #[tokio::test]
    async fn test_successful_join_resets_attempts() {
        let (listener, config) = listener().await;
        let server = tokio::spawn(async move {
            let mut served = 0;
            let mut listener = Some(listener);
            while let Some(current) = listener.take() {
                let (stream, _) = current.accept().await.unwrap();
                served += 1;
                if served < 3 {
                    listener = Some(current);
                } else {
                    drop(current);
                }
                let mut ws = handshake(stream).await;
                ws.close(None).await.unwrap();
            }
            served
        });

        // One retry allowed per outage; three short-lived sessions still
        // only ever see one consecutive failure each.
        let client = NotificationClient::new(&config)
            .with_policy(ReconnectPolicy::new(Duration::from_millis(5), 1));
        let (tx, _rx) = mpsc::channel(1);
        let (_stop, stop_rx) = watch::channel(false);
        let err = client.run(tx, stop_rx).await.unwrap_err();

        assert!(matches!(err, NotificationError::ReconnectExhausted(1)));
        assert_eq!(server.await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_stop_while_waiting_to_reconnect() {
        let (listener, config) = listener().await;
        drop(listener);

        let client = NotificationClient::new(&config)
            .with_policy(ReconnectPolicy::new(Duration::from_secs(60), 5));
        let handle = client.spawn(1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.join().await.unwrap();
    }
}
