//! Channel multiplexer
//!
//! One WebSocket connection carries every topic. Callers subscribe by
//! (channel kind, instrument); the driver task sends control messages,
//! tracks acknowledgments, and routes data frames to the listeners of the
//! exact topic they address.

use crate::events::{ConnectInfo, ConnectionState, DisconnectReason, ResubscribePolicy};
use crate::listeners::{ListenerId, Listeners};
use crate::reconnect::{ReconnectConfig, DEFAULT_CONNECT_TIMEOUT};
use crate::subscription::SubscriptionSet;
use crate::transport::{Transport, TransportError, WsTransport};

use bitstamp_types::{ChannelKind, ControlRequest, FrameKind, InboundFrame, StreamError, StreamResult, TopicEvent};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, trace, warn};

/// Bitstamp WebSocket API v2 endpoint
pub const STREAM_URL: &str = "wss://ws.bitstamp.net";

/// Builds a fresh transport for each connection attempt
pub type TransportFactory = Arc<dyn Fn(&str, Duration) -> Box<dyn Transport> + Send + Sync>;

/// Configuration for the multiplexer's connection
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket endpoint
    pub url: String,
    /// Timeout for each connection attempt
    pub connect_timeout: Duration,
    /// Reconnection settings for dropped transports
    pub reconnect: ReconnectConfig,
    /// Resubscription after reconnects
    pub resubscribe: ResubscribePolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: STREAM_URL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect: ReconnectConfig::default(),
            resubscribe: ResubscribePolicy::default(),
        }
    }
}

impl StreamConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set connection timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set reconnection config
    pub fn with_reconnect(mut self, config: ReconnectConfig) -> Self {
        self.reconnect = config;
        self
    }

    /// Set the resubscription policy
    pub fn with_resubscribe(mut self, policy: ResubscribePolicy) -> Self {
        self.resubscribe = policy;
        self
    }
}

/// Result of handling one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FrameAction {
    /// Keep reading
    Continue,
    /// Tear down and recreate the connection; carries the topics dropped
    /// from tracking
    Reconnect(Vec<String>),
}

/// State shared by the caller handle and the driver task
#[derive(Debug)]
pub(crate) struct Shared {
    subscriptions: RwLock<SubscriptionSet>,
    listeners: Listeners,
    state: RwLock<ConnectionState>,
}

impl Shared {
    fn new() -> Self {
        Self {
            subscriptions: RwLock::new(SubscriptionSet::new()),
            listeners: Listeners::new(),
            state: RwLock::new(ConnectionState::Idle),
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }

    /// Apply one inbound frame
    pub(crate) fn handle_frame(&self, raw: &str) -> FrameAction {
        let frame = match InboundFrame::parse(raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Dropping malformed frame");
                self.listeners.emit_error(&StreamError::malformed(e, raw));
                return FrameAction::Continue;
            }
        };

        match frame.kind() {
            FrameKind::UnsubscriptionSucceeded => {
                debug!(topic = %frame.channel, "Unsubscribed");
                self.subscriptions.write().remove(&frame.channel);
                FrameAction::Continue
            }
            FrameKind::SubscriptionSucceeded => {
                debug!(topic = %frame.channel, "Subscribed");
                self.subscriptions.write().confirm(&frame.channel);
                FrameAction::Continue
            }
            FrameKind::RequestReconnect => {
                info!("Server requested reconnect");
                FrameAction::Reconnect(self.subscriptions.write().drain())
            }
            FrameKind::Data => {
                let event = frame.into_topic_event();
                let delivered = self.listeners.dispatch(&event);
                trace!(topic = %event.channel, event = %event.event, delivered, "Data frame routed");
                FrameAction::Continue
            }
        }
    }
}

enum Command {
    Send(String),
    Close,
}

/// Multiplexed subscription client for the Bitstamp WebSocket API
///
/// # Example
///
/// ```no_run
/// use bitstamp_ws::{ChannelMultiplexer, StreamConfig};
/// use bitstamp_types::{ChannelKind, Pair};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let stream = ChannelMultiplexer::new(StreamConfig::default());
///     let topic = stream.subscribe(ChannelKind::LiveTrades, Pair::BTC_USD)?;
///     stream.on_topic(topic, |event| {
///         println!("{} cost={:?}", event.event, event.cost());
///     });
///     stream.start()?;
///
///     tokio::time::sleep(std::time::Duration::from_secs(10)).await;
///     stream.close();
///     Ok(())
/// }
/// ```
pub struct ChannelMultiplexer {
    config: StreamConfig,
    shared: Arc<Shared>,
    factory: TransportFactory,
    command_tx: mpsc::UnboundedSender<Command>,
    command_rx: Mutex<Option<mpsc::UnboundedReceiver<Command>>>,
    driver: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl ChannelMultiplexer {
    /// Create a multiplexer over WebSocket; nothing connects until [`start`]
    ///
    /// [`start`]: ChannelMultiplexer::start
    pub fn new(config: StreamConfig) -> Self {
        let factory: TransportFactory = Arc::new(|url: &str, connect_timeout: Duration| {
            Box::new(WsTransport::new(url).with_timeout(connect_timeout)) as Box<dyn Transport>
        });
        Self::with_transport_factory(config, factory)
    }

    /// Create a multiplexer over a custom transport
    pub fn with_transport_factory(config: StreamConfig, factory: TransportFactory) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Self {
            config,
            shared: Arc::new(Shared::new()),
            factory,
            command_tx,
            command_rx: Mutex::new(Some(command_rx)),
            driver: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a multiplexer and start connecting
    pub fn connect(config: StreamConfig) -> StreamResult<Self> {
        let multiplexer = Self::new(config);
        multiplexer.start()?;
        Ok(multiplexer)
    }

    /// Spawn the driver task on the current tokio runtime
    ///
    /// Subscriptions requested before this are sent once connected.
    pub fn start(&self) -> StreamResult<()> {
        let handle = Handle::try_current().map_err(|e| StreamError::ConnectionFailed {
            url: self.config.url.clone(),
            reason: format!("no tokio runtime: {}", e),
        })?;
        let commands = self.command_rx.lock().take().ok_or(StreamError::Closed)?;

        let driver = Driver {
            config: self.config.clone(),
            shared: Arc::clone(&self.shared),
            factory: Arc::clone(&self.factory),
            commands,
            outbox: VecDeque::new(),
        };
        *self.driver.lock() = Some(handle.spawn(driver.run()));
        Ok(())
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.read()
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Subscribe to a channel for one instrument; returns the topic identifier
    pub fn subscribe(&self, kind: ChannelKind, instrument: &str) -> StreamResult<String> {
        let topic = kind.topic(instrument);
        self.send_control(ControlRequest::subscribe(topic.as_str()))?;
        self.shared.subscriptions.write().request(&topic);
        debug!(topic = %topic, "Subscribe requested");
        Ok(topic)
    }

    /// Unsubscribe from a channel for one instrument
    ///
    /// The topic stays active until the server acknowledges.
    pub fn unsubscribe(&self, kind: ChannelKind, instrument: &str) -> StreamResult<()> {
        let topic = kind.topic(instrument);
        self.send_control(ControlRequest::unsubscribe(topic.as_str()))?;
        self.shared.subscriptions.write().cancel_pending(&topic);
        debug!(topic = %topic, "Unsubscribe requested");
        Ok(())
    }

    /// Unsubscribe from every tracked topic
    pub fn unsubscribe_all(&self) -> StreamResult<()> {
        let topics = self.shared.subscriptions.read().topics();
        for topic in &topics {
            self.send_control(ControlRequest::unsubscribe(topic.as_str()))?;
            self.shared.subscriptions.write().cancel_pending(topic);
        }
        debug!(count = topics.len(), "Unsubscribe all requested");
        Ok(())
    }

    /// Topics acknowledged by the server
    pub fn active_topics(&self) -> Vec<String> {
        self.shared.subscriptions.read().active()
    }

    /// Topics requested but not yet acknowledged
    pub fn pending_topics(&self) -> Vec<String> {
        self.shared.subscriptions.read().pending()
    }

    /// Register a listener for data events on one topic
    pub fn on_topic<F>(&self, topic: impl Into<String>, f: F) -> ListenerId
    where
        F: Fn(&TopicEvent) + Send + Sync + 'static,
    {
        self.shared.listeners.on_topic(topic, Arc::new(f))
    }

    /// Register a listener for successful connections, reconnections included
    pub fn on_connected<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&ConnectInfo) + Send + Sync + 'static,
    {
        self.shared.listeners.on_connected(Arc::new(f))
    }

    /// Register a listener for disconnections
    pub fn on_disconnected<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&DisconnectReason) + Send + Sync + 'static,
    {
        self.shared.listeners.on_disconnected(Arc::new(f))
    }

    /// Register a listener for errors (malformed frames, exhausted reconnects)
    pub fn on_error<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&StreamError) + Send + Sync + 'static,
    {
        self.shared.listeners.on_error(Arc::new(f))
    }

    /// Remove a listener; returns false if it was not registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    /// Disconnect without waiting for acknowledgments
    ///
    /// Tracked topics are dropped. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Closing channel multiplexer");
        let _ = self.command_tx.send(Command::Close);
        if self.driver.lock().is_none() {
            self.shared.subscriptions.write().drain();
            self.shared.set_state(ConnectionState::Closed);
        }
    }

    /// Wait for the driver task to finish after [`close`]
    ///
    /// [`close`]: ChannelMultiplexer::close
    pub async fn closed(&self) {
        let driver = self.driver.lock().take();
        if let Some(driver) = driver {
            let _ = driver.await;
        }
    }

    fn send_control(&self, request: ControlRequest) -> StreamResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StreamError::Closed);
        }
        let json = request.to_json().map_err(|e| StreamError::Encode(e.to_string()))?;
        self.command_tx
            .send(Command::Send(json))
            .map_err(|_| StreamError::Closed)
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }
}

impl Drop for ChannelMultiplexer {
    fn drop(&mut self) {
        let _ = self.command_tx.send(Command::Close);
    }
}

impl std::fmt::Debug for ChannelMultiplexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelMultiplexer")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("listeners", &self.shared.listeners)
            .finish()
    }
}

/// Why a connection's read loop ended
enum Exit {
    Close,
    Reconnect {
        reason: DisconnectReason,
        dropped: Option<Vec<String>>,
    },
}

/// Owns the socket; runs until closed or reconnection gives up
struct Driver {
    config: StreamConfig,
    shared: Arc<Shared>,
    factory: TransportFactory,
    commands: mpsc::UnboundedReceiver<Command>,
    outbox: VecDeque<String>,
}

impl Driver {
    async fn run(mut self) {
        self.shared.set_state(ConnectionState::Connecting);
        let mut is_reconnection = false;

        loop {
            let Some(mut transport) = self.connect_with_retry().await else {
                self.finish();
                return;
            };

            self.shared.set_state(ConnectionState::Connected);
            info!(url = %self.config.url, is_reconnection, "Connected to Bitstamp stream");
            self.shared.listeners.emit_connected(&ConnectInfo {
                url: self.config.url.clone(),
                is_reconnection,
            });

            let exit = self.serve(transport.as_mut()).await;
            let _ = transport.close().await;

            match exit {
                Exit::Close => {
                    self.shared.listeners.emit_disconnected(&DisconnectReason::Shutdown);
                    self.finish();
                    return;
                }
                Exit::Reconnect { reason, dropped } => {
                    warn!(reason = %reason, "Stream disconnected");
                    self.shared.listeners.emit_disconnected(&reason);
                    self.shared.set_state(ConnectionState::Reconnecting);
                    self.queue_resubscribe(dropped);
                    is_reconnection = true;
                }
            }
        }
    }

    fn finish(&mut self) {
        self.shared.subscriptions.write().drain();
        self.shared.set_state(ConnectionState::Closed);
        info!("Stream driver stopped");
    }

    /// Queue subscribe messages for the next connection
    ///
    /// After a transport drop every tracked topic is sent again and waits
    /// for a fresh ack. Topics cleared by a server reconnect request are
    /// only sent again under [`ResubscribePolicy::Automatic`].
    fn queue_resubscribe(&mut self, dropped: Option<Vec<String>>) {
        let topics = {
            let mut subscriptions = self.shared.subscriptions.write();
            match dropped {
                None => subscriptions.mark_all_pending(),
                Some(_) if self.config.resubscribe != ResubscribePolicy::Automatic => return,
                Some(dropped) => {
                    for topic in &dropped {
                        subscriptions.request(topic);
                    }
                    subscriptions.mark_all_pending()
                }
            }
        };

        for topic in topics {
            match ControlRequest::subscribe(topic.as_str()).to_json() {
                Ok(json) => self.outbox.push_back(json),
                Err(e) => self
                    .shared
                    .listeners
                    .emit_error(&StreamError::Encode(e.to_string())),
            }
        }
    }

    /// Connect, retrying per the reconnect config; None means stop
    async fn connect_with_retry(&mut self) -> Option<Box<dyn Transport>> {
        let mut attempt = 0u32;
        loop {
            let mut transport = (self.factory)(&self.config.url, self.config.connect_timeout);
            let error = match timeout(self.config.connect_timeout, transport.connect()).await {
                Ok(Ok(())) => return Some(transport),
                Ok(Err(e)) => StreamError::ConnectionFailed {
                    url: self.config.url.clone(),
                    reason: e.to_string(),
                },
                Err(_) => StreamError::ConnectionTimeout {
                    url: self.config.url.clone(),
                    timeout: self.config.connect_timeout,
                },
            };

            attempt += 1;
            if !self.config.reconnect.should_reconnect(attempt) {
                error!(attempts = attempt, error = %error, "Reconnection attempts exhausted");
                self.shared
                    .listeners
                    .emit_error(&StreamError::ReconnectExhausted { attempts: attempt });
                return None;
            }

            let delay = self.config.reconnect.delay_with_jitter(attempt);
            warn!(attempt, ?delay, error = %error, "Connection failed, retrying");

            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    command = self.commands.recv() => match command {
                        Some(Command::Send(text)) => self.outbox.push_back(text),
                        Some(Command::Close) | None => return None,
                    },
                }
            }
        }
    }

    /// Read frames and forward commands until the connection ends
    async fn serve(&mut self, transport: &mut dyn Transport) -> Exit {
        while let Some(text) = self.outbox.pop_front() {
            if let Err(e) = transport.send(&text).await {
                self.outbox.push_front(text);
                return Exit::Reconnect {
                    reason: DisconnectReason::NetworkError(e.to_string()),
                    dropped: None,
                };
            }
        }

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Send(text)) => {
                        trace!(len = text.len(), "Sending control message");
                        if let Err(e) = transport.send(&text).await {
                            self.outbox.push_back(text);
                            return Exit::Reconnect {
                                reason: DisconnectReason::NetworkError(e.to_string()),
                                dropped: None,
                            };
                        }
                    }
                    Some(Command::Close) | None => return Exit::Close,
                },
                frame = transport.recv() => match frame {
                    Ok(Some(text)) => {
                        if let FrameAction::Reconnect(dropped) = self.shared.handle_frame(&text) {
                            return Exit::Reconnect {
                                reason: DisconnectReason::ReconnectRequested,
                                dropped: Some(dropped),
                            };
                        }
                    }
                    Ok(None) => {
                        return Exit::Reconnect {
                            reason: DisconnectReason::ServerClosed,
                            dropped: None,
                        };
                    }
                    Err(TransportError::ConnectionClosed) => {
                        return Exit::Reconnect {
                            reason: DisconnectReason::ServerClosed,
                            dropped: None,
                        };
                    }
                    Err(e) => {
                        return Exit::Reconnect {
                            reason: DisconnectReason::NetworkError(e.to_string()),
                            dropped: None,
                        };
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn mock_multiplexer(config: StreamConfig) -> (ChannelMultiplexer, MockTransport) {
        let mock = MockTransport::new("wss://mock.test");
        let shared_mock = mock.clone();
        let factory: TransportFactory = Arc::new(move |_url: &str, _timeout: Duration| {
            Box::new(shared_mock.clone()) as Box<dyn Transport>
        });
        (ChannelMultiplexer::with_transport_factory(config, factory), mock)
    }

    fn fast_config() -> StreamConfig {
        StreamConfig::new().with_reconnect(
            ReconnectConfig::new()
                .with_initial_delay(Duration::from_millis(1))
                .with_max_delay(Duration::from_millis(5))
                .with_jitter(0.0)
                .with_max_attempts(3),
        )
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not met in time");
    }

    #[test]
    fn test_config_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.url, "wss://ws.bitstamp.net");
        assert_eq!(config.connect_timeout, Duration::from_millis(1000));
        assert_eq!(config.reconnect.max_attempts, Some(10));
        assert_eq!(config.resubscribe, ResubscribePolicy::Manual);
    }

    #[test]
    fn test_trade_frame_gets_cost() {
        let (stream, _mock) = mock_multiplexer(fast_config());
        let seen = Arc::new(Mutex::new(None));

        let topic = stream.subscribe(ChannelKind::LiveTrades, "ethusd").unwrap();
        assert_eq!(topic, "live_trades_ethusd");

        let slot = Arc::clone(&seen);
        stream.on_topic(&topic, move |event| {
            *slot.lock() = Some(event.data.clone());
        });

        let action = stream.shared().handle_frame(
            r#"{"event":"trade","channel":"live_trades_ethusd","data":{"amount":2,"price":100}}"#,
        );
        assert_eq!(action, FrameAction::Continue);

        let data = seen.lock().clone().unwrap();
        assert_eq!(data["cost"], json!(200));
    }

    #[test]
    fn test_order_book_frame_has_no_cost() {
        let (stream, _mock) = mock_multiplexer(fast_config());
        let seen = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&seen);
        stream.on_topic("order_book_btcusd", move |event| {
            *slot.lock() = Some(event.data.clone());
        });
        stream.shared().handle_frame(
            r#"{"event":"data","channel":"order_book_btcusd","data":{"bids":[],"asks":[],"amount":1,"price":1}}"#,
        );

        assert!(seen.lock().clone().unwrap().get("cost").is_none());
    }

    #[test]
    fn test_acks_move_topics() {
        let (stream, _mock) = mock_multiplexer(fast_config());
        stream.subscribe(ChannelKind::LiveOrders, "btcusd").unwrap();
        assert_eq!(stream.pending_topics(), vec!["live_orders_btcusd"]);

        stream.shared().handle_frame(
            r#"{"event":"bts:subscription_succeeded","channel":"live_orders_btcusd","data":{}}"#,
        );
        assert_eq!(stream.active_topics(), vec!["live_orders_btcusd"]);
        assert!(stream.pending_topics().is_empty());

        stream.shared().handle_frame(
            r#"{"event":"bts:unsubscription_succeeded","channel":"live_orders_btcusd","data":{}}"#,
        );
        assert!(stream.active_topics().is_empty());
    }

    #[test]
    fn test_reconnect_request_clears_active_without_events() {
        let (stream, _mock) = mock_multiplexer(fast_config());
        let events = Arc::new(AtomicUsize::new(0));

        for instrument in ["btcusd", "ethusd"] {
            let topic = stream.subscribe(ChannelKind::LiveTrades, instrument).unwrap();
            let counter = Arc::clone(&events);
            stream.on_topic(&topic, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            stream.shared().handle_frame(&format!(
                r#"{{"event":"bts:subscription_succeeded","channel":"{}","data":{{}}}}"#,
                topic
            ));
        }
        assert_eq!(stream.active_topics().len(), 2);

        let action = stream
            .shared()
            .handle_frame(r#"{"event":"bts:request_reconnect","channel":"","data":""}"#);
        assert_eq!(
            action,
            FrameAction::Reconnect(vec![
                "live_trades_btcusd".to_string(),
                "live_trades_ethusd".to_string()
            ])
        );
        assert!(stream.active_topics().is_empty());
        assert_eq!(events.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_malformed_frame_reports_error() {
        let (stream, _mock) = mock_multiplexer(fast_config());
        let errors = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&errors);
        stream.on_error(move |e| log.lock().push(e.clone()));

        assert_eq!(stream.shared().handle_frame("{not json"), FrameAction::Continue);
        assert_eq!(stream.shared().handle_frame(r#"{"channel":"x"}"#), FrameAction::Continue);

        let errors = errors.lock();
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], StreamError::MalformedFrame { raw, .. } if raw == "{not json"));
    }

    #[tokio::test]
    async fn test_end_to_end_routing() {
        let (stream, mock) = mock_multiplexer(fast_config());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let topic = stream.subscribe(ChannelKind::LiveTrades, "btcusd").unwrap();
        stream.on_topic(&topic, move |event| {
            let _ = tx.send(event.clone());
        });
        stream.start().unwrap();

        wait_until(|| mock.sent_messages().len() == 1).await;
        assert_eq!(
            mock.sent_messages()[0],
            r#"{"event":"bts:subscribe","data":{"channel":"live_trades_btcusd"}}"#
        );
        assert!(stream.is_connected());

        mock.push_responses([
            r#"{"event":"bts:subscription_succeeded","channel":"live_trades_btcusd","data":{}}"#,
            r#"{"event":"trade","channel":"live_trades_btcusd","data":{"amount":"0.5","price":"30000"}}"#,
        ]);

        let event = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(event.event, "trade");
        assert_eq!(event.data["cost"], json!(15000));
        assert_eq!(stream.active_topics(), vec!["live_trades_btcusd"]);

        stream.close();
        stream.closed().await;
        assert_eq!(stream.state(), ConnectionState::Closed);
        assert!(stream.active_topics().is_empty());
        assert!(matches!(
            stream.subscribe(ChannelKind::LiveTrades, "btcusd"),
            Err(StreamError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_request_reconnect_recreates_connection() {
        let (stream, mock) = mock_multiplexer(fast_config());
        let connects = Arc::new(Mutex::new(Vec::new()));
        let disconnects = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&connects);
        stream.on_connected(move |info| log.lock().push(info.is_reconnection));
        let log = Arc::clone(&disconnects);
        stream.on_disconnected(move |reason| log.lock().push(reason.clone()));

        stream.subscribe(ChannelKind::OrderBook, "btcusd").unwrap();
        stream.start().unwrap();
        mock.push_response(r#"{"event":"bts:subscription_succeeded","channel":"order_book_btcusd","data":{}}"#);
        wait_until(|| !stream.active_topics().is_empty()).await;

        mock.push_response(r#"{"event":"bts:request_reconnect","channel":"","data":""}"#);
        wait_until(|| connects.lock().len() == 2).await;

        assert_eq!(*connects.lock(), vec![false, true]);
        assert_eq!(*disconnects.lock(), vec![DisconnectReason::ReconnectRequested]);
        assert!(stream.active_topics().is_empty());
        assert!(stream.pending_topics().is_empty());
        // Manual policy: no resubscribe was sent
        assert_eq!(mock.sent_messages().len(), 1);
        assert_eq!(mock.connect_count(), 2);

        stream.close();
        stream.closed().await;
    }

    #[tokio::test]
    async fn test_automatic_resubscribe_after_reconnect_request() {
        let config = fast_config().with_resubscribe(ResubscribePolicy::Automatic);
        let (stream, mock) = mock_multiplexer(config);

        stream.subscribe(ChannelKind::DiffOrderBook, "ethusd").unwrap();
        stream.start().unwrap();
        mock.push_responses([
            r#"{"event":"bts:subscription_succeeded","channel":"diff_order_book_ethusd","data":{}}"#,
            r#"{"event":"bts:request_reconnect","channel":"","data":""}"#,
        ]);

        wait_until(|| mock.sent_messages().len() == 2).await;
        let sent = mock.sent_messages();
        assert_eq!(sent[0], sent[1]);
        assert_eq!(stream.pending_topics(), vec!["diff_order_book_ethusd"]);

        stream.close();
        stream.closed().await;
    }

    #[tokio::test]
    async fn test_transport_drop_resubscribes_tracked_topics() {
        let (stream, mock) = mock_multiplexer(fast_config());

        stream.subscribe(ChannelKind::LiveTrades, "xrpusd").unwrap();
        stream.start().unwrap();
        mock.push_response(r#"{"event":"bts:subscription_succeeded","channel":"live_trades_xrpusd","data":{}}"#);
        wait_until(|| !stream.active_topics().is_empty()).await;

        mock.push_error(TransportError::ReceiveFailed("reset by peer".into()));
        wait_until(|| mock.connect_count() == 2).await;
        wait_until(|| mock.sent_messages().len() == 2).await;

        let sent = mock.sent_messages();
        assert!(sent.iter().all(|m| m.contains("bts:subscribe") && m.contains("live_trades_xrpusd")));
        assert!(stream.active_topics().is_empty());
        assert_eq!(stream.pending_topics(), vec!["live_trades_xrpusd"]);

        mock.push_response(r#"{"event":"bts:subscription_succeeded","channel":"live_trades_xrpusd","data":{}}"#);
        wait_until(|| !stream.active_topics().is_empty()).await;
        assert_eq!(stream.active_topics(), vec!["live_trades_xrpusd"]);

        stream.close();
        stream.closed().await;
    }

    #[tokio::test]
    async fn test_reconnect_exhausted() {
        let (stream, mock) = mock_multiplexer(fast_config());
        mock.fail_connects(100);
        let errors = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&errors);
        stream.on_error(move |e| log.lock().push(e.clone()));
        stream.start().unwrap();
        stream.closed().await;

        assert_eq!(mock.connect_count(), 3);
        assert_eq!(stream.state(), ConnectionState::Closed);
        assert!(matches!(
            errors.lock().as_slice(),
            [StreamError::ReconnectExhausted { attempts: 3 }]
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_all_sends_for_every_topic() {
        let (stream, mock) = mock_multiplexer(fast_config());

        stream.subscribe(ChannelKind::LiveTrades, "btcusd").unwrap();
        stream.subscribe(ChannelKind::LiveOrders, "btcusd").unwrap();
        stream.start().unwrap();
        mock.push_response(r#"{"event":"bts:subscription_succeeded","channel":"live_trades_btcusd","data":{}}"#);
        wait_until(|| !stream.active_topics().is_empty()).await;

        stream.unsubscribe_all().unwrap();
        wait_until(|| mock.sent_messages().len() == 4).await;

        let sent = mock.sent_messages();
        assert!(sent[2..].iter().all(|m| m.contains("bts:unsubscribe")));
        // Active topic stays until acknowledged; pending one is dropped
        assert_eq!(stream.active_topics(), vec!["live_trades_btcusd"]);
        assert!(stream.pending_topics().is_empty());

        stream.close();
        stream.closed().await;
    }

    #[test]
    fn test_start_requires_runtime() {
        let (stream, _mock) = mock_multiplexer(fast_config());
        assert!(matches!(
            stream.start(),
            Err(StreamError::ConnectionFailed { .. })
        ));
    }
}
