//! The connection: handshake, paced sending and callback dispatch.
//!
//! The flow is:
//!   1. POST LOGIN → capture the session cookies
//!   2. Poll with GET until a HELLO shows up → connected. Whatever the
//!      server sent along the way is kept for the first `poll()`
//!   3. Caller loop: `while conn.step_loop().await? {}` drains the queue,
//!      one message per pacing interval, and hands each response to the
//!      message type's subscribers
//!   4. `close()` → POST LOGOUT, forget the cookies
//!
//! There are no background tasks. Everything happens inside the caller's
//! awaits, so pacing and ordering can be read straight off this file.

use std::time::Duration;

use kgsbot_protocol::{
    Action, Formatter, LoginMessage, Message, MessageType, ProtocolError,
    ServerResponse,
};
use kgsbot_transport::{HttpResponse, HttpTransport};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    Callback, CallbackRegistry, ConnectionConfig, ConnectionState,
    Credentials, MessageQueue, Session, SessionError,
};

/// Content type of every POST.
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// A logged-in connection to the servlet.
///
/// All mutating operations take `&mut self`, so one connection never has
/// two sends in flight. To share it between tasks, put it behind an
/// `Arc<tokio::sync::Mutex<_>>`; to let other code queue messages without
/// the lock, hand out [`queue`](Self::queue) handles.
pub struct Connection<T: HttpTransport> {
    url: String,
    transport: T,
    config: ConnectionConfig,
    state: ConnectionState,
    session: Session,
    queue: MessageQueue,
    registry: CallbackRegistry,
    formatter: Formatter,
    /// When the last request left, for pacing sends made outside the loop.
    last_sent: Option<Instant>,
    /// Messages polled during the handshake, handed out by the first `poll`.
    backlog: Vec<Message>,
}

impl<T: HttpTransport> Connection<T> {
    /// Logs in and waits for HELLO.
    ///
    /// The HELLO wait is unbounded unless
    /// [`ConnectionConfig::handshake_max_polls`] is set; wrap this in
    /// `tokio::time::timeout` to bound it by wall time instead.
    ///
    /// # Errors
    /// - [`SessionError::Transport`] if the login POST cannot be made
    /// - [`SessionError::LoginRejected`] if the login POST is refused
    /// - [`SessionError::HandshakeExhausted`] if the poll budget runs out
    pub async fn connect(
        url: impl Into<String>,
        credentials: Credentials,
        transport: T,
        config: ConnectionConfig,
    ) -> Result<Self, SessionError> {
        let mut conn = Self {
            url: url.into(),
            transport,
            config: config.validated(),
            state: ConnectionState::Init,
            session: Session::default(),
            queue: MessageQueue::new(),
            registry: CallbackRegistry::new(),
            formatter: Formatter,
            last_sent: None,
            backlog: Vec::new(),
        };
        conn.handshake(credentials).await?;
        Ok(conn)
    }

    async fn handshake(
        &mut self,
        credentials: Credentials,
    ) -> Result<(), SessionError> {
        // --- Login ---
        self.state = ConnectionState::LoggingIn;
        info!(url = %self.url, name = %credentials.name, "logging in");

        let login = Message::login(
            LoginMessage::new(credentials.name, credentials.password)
                .with_locale(self.config.locale.clone()),
        );
        // The registry is empty at this point, so the login goes out
        // directly rather than through the processable check.
        let response = self.transmit(&login).await?;
        if !response.is_success() {
            return Err(SessionError::LoginRejected {
                status: response.status,
            });
        }
        self.session.cookies = Some(response.cookies);

        // --- Wait for HELLO ---
        self.state = ConnectionState::AwaitingHello;
        let mut polls: u32 = 0;
        loop {
            if let Some(max) = self.config.handshake_max_polls {
                if polls >= max {
                    warn!(polls, "giving up on handshake");
                    return Err(SessionError::HandshakeExhausted { polls });
                }
            }
            if polls > 0 && !self.config.handshake_poll_interval.is_zero() {
                tokio::time::sleep(self.config.handshake_poll_interval).await;
            }
            polls += 1;

            match self.fetch().await {
                Ok(batch) => {
                    let hello = batch.contains(MessageType::Hello);
                    self.backlog.extend(batch.into_messages());
                    if hello {
                        self.state = ConnectionState::Connected;
                        info!(polls, backlog = self.backlog.len(), "handshake complete");
                        return Ok(());
                    }
                    debug!(polls, "no HELLO yet");
                }
                Err(e) => {
                    warn!(polls, error = %e, "handshake poll failed, retrying");
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Loop
    // -----------------------------------------------------------------

    /// Runs one pass of the send loop and returns whether to keep going.
    ///
    /// With an empty queue the pass waits one pacing interval and counts it
    /// as idle time; reaching the inactivity threshold queues a `WAKE_UP`.
    /// Otherwise the queue is drained, waiting one pacing interval before
    /// each message. Responses are handed to the sent message type's
    /// subscribers in registration order.
    ///
    /// Returns `Ok(false)` once the connection is closed.
    ///
    /// # Errors
    /// Send failures are returned as they happen; messages still queued stay
    /// queued for the next pass.
    pub async fn step_loop(&mut self) -> Result<bool, SessionError> {
        if self.state == ConnectionState::Closed {
            return Ok(false);
        }

        if self.queue.is_empty() {
            tokio::time::sleep(self.config.pacing_interval).await;
            self.record_idle()?;
            return Ok(self.session.keep_alive);
        }

        while !self.queue.is_empty() {
            // Don't hammer the server.
            tokio::time::sleep(self.config.pacing_interval).await;

            match self.queue.dequeue() {
                // Another queue handle drained it while we slept.
                None => self.record_idle()?,
                Some(message) => {
                    self.session.idle = Duration::ZERO;
                    if let Some(response) = self.send_message(&message).await? {
                        self.dispatch(message.message_type(), &response);
                    }
                }
            }
        }

        Ok(self.session.keep_alive)
    }

    fn record_idle(&mut self) -> Result<(), SessionError> {
        self.session.idle += self.config.pacing_interval;
        if self.session.idle >= self.config.inactivity_threshold {
            debug!(
                idle_ms = self.session.idle.as_millis() as u64,
                "inactivity threshold reached, queueing WAKE_UP"
            );
            self.queue.enqueue(Message::wake_up())?;
            self.session.idle = Duration::ZERO;
        }
        Ok(())
    }

    fn dispatch(&self, message_type: MessageType, response: &HttpResponse) {
        let subscribers = self.registry.subscribers(message_type);
        debug!(%message_type, subscribers = subscribers.len(), "dispatching response");
        for callback in subscribers {
            callback(response);
        }
    }

    // -----------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------

    /// Sends one message now, bypassing the pacing queue.
    ///
    /// Returns `Ok(None)` without touching the network when nobody is
    /// subscribed to the message's type.
    async fn send_message(
        &mut self,
        message: &Message,
    ) -> Result<Option<HttpResponse>, SessionError> {
        self.ensure_open()?;

        let message_type = message.message_type();
        if !self.is_processable(message_type) {
            debug!(%message_type, "no subscribers, skipping send");
            return Ok(None);
        }

        let response = self.transmit(message).await?;
        if !response.is_success() {
            warn!(%message_type, status = response.status, "send refused");
            return Err(SessionError::UnexpectedStatus(response.status));
        }
        Ok(Some(response))
    }

    /// Formats and transmits a message with the session cookies attached.
    async fn transmit(
        &mut self,
        message: &Message,
    ) -> Result<HttpResponse, SessionError> {
        let payload = self.formatter.format(message)?;
        let cookies = self.session.cookies.as_ref();

        let response = match message.action() {
            Action::Post => {
                let body =
                    serde_json::to_vec(&payload).map_err(ProtocolError::Encode)?;
                self.transport
                    .post(
                        &self.url,
                        body,
                        &[("content-type", JSON_CONTENT_TYPE)],
                        cookies,
                    )
                    .await?
            }
            Action::Get => {
                let params = self.formatter.to_query(&payload);
                self.transport.get(&self.url, &params, cookies).await?
            }
        };

        self.last_sent = Some(Instant::now());
        debug!(
            message_type = %message.message_type(),
            action = %message.action(),
            status = response.status,
            "message sent"
        );
        Ok(response)
    }

    /// One GET with the session cookies, parsed.
    async fn fetch(&self) -> Result<ServerResponse, SessionError> {
        let response = self
            .transport
            .get(&self.url, &[], self.session.cookies.as_ref())
            .await?;
        if !response.is_success() {
            return Err(SessionError::UnexpectedStatus(response.status));
        }
        Ok(ServerResponse::from_http(&response)?)
    }

    /// Fetches whatever the server has queued for us.
    ///
    /// The first call after connecting returns the messages that arrived
    /// during the handshake (HELLO included, in arrival order) without
    /// touching the network.
    ///
    /// # Errors
    /// [`SessionError::SessionClosed`] after close; transport, status and
    /// parse failures otherwise.
    pub async fn poll(&mut self) -> Result<Vec<Message>, SessionError> {
        self.ensure_open()?;
        if !self.backlog.is_empty() {
            return Ok(std::mem::take(&mut self.backlog));
        }
        let batch = self.fetch().await?;
        debug!(received = batch.len(), "polled server");
        Ok(batch.into_messages())
    }

    /// `true` if a message of this type would be transmitted.
    ///
    /// Session-control messages (`WAKE_UP`, `LOGOUT`) always are; anything
    /// else needs at least one subscriber.
    pub fn is_processable(&self, message_type: MessageType) -> bool {
        message_type.is_session_control()
            || self.registry.is_processable(message_type)
    }

    // -----------------------------------------------------------------
    // Queue
    // -----------------------------------------------------------------

    /// Queues a message for the send loop.
    ///
    /// # Errors
    /// [`SessionError::SessionClosed`] after close.
    pub fn enqueue(&self, message: Message) -> Result<(), SessionError> {
        self.queue.enqueue(message)
    }

    /// Takes the oldest queued message off the queue without sending it.
    pub fn dequeue(&self) -> Option<Message> {
        self.queue.dequeue()
    }

    /// A handle to the outgoing queue, for producers that don't own the
    /// connection.
    pub fn queue(&self) -> MessageQueue {
        self.queue.clone()
    }

    // -----------------------------------------------------------------
    // Callbacks
    // -----------------------------------------------------------------

    /// Registers `callback` for responses to messages tagged `message_type`.
    ///
    /// # Errors
    /// [`ProtocolError::UnsupportedMessageType`] (as
    /// [`SessionError::Protocol`]) for an unknown tag.
    pub fn subscribe(
        &mut self,
        message_type: &str,
        callback: Callback,
    ) -> Result<(), SessionError> {
        let message_type: MessageType = message_type.parse()?;
        self.registry.add(message_type, callback);
        debug!(%message_type, "callback subscribed");
        Ok(())
    }

    /// Removes the first registration of `callback` for `message_type`.
    ///
    /// # Errors
    /// [`SessionError::NoSubscribers`], [`SessionError::CallbackNotFound`],
    /// or an unsupported-type protocol error.
    pub fn unsubscribe(
        &mut self,
        message_type: &str,
        callback: &Callback,
    ) -> Result<(), SessionError> {
        let message_type: MessageType = message_type.parse()?;
        self.registry.remove(message_type, callback)?;
        debug!(%message_type, "callback unsubscribed");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Close
    // -----------------------------------------------------------------

    /// Logs out and closes the session for good.
    ///
    /// Queued messages are dropped, not flushed. The connection is closed
    /// even if the LOGOUT fails; that failure is still returned.
    ///
    /// # Errors
    /// [`SessionError::SessionClosed`] if already closed.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        self.ensure_open()?;

        if let Some(last) = self.last_sent {
            tokio::time::sleep_until(last + self.config.pacing_interval).await;
        }
        let result = self.transmit(&Message::logout()).await;

        self.state = ConnectionState::Closed;
        self.session.invalidate();
        self.backlog.clear();
        let dropped = self.queue.close();
        info!(dropped, "connection closed");

        match result? {
            response if response.is_success() => Ok(()),
            response => Err(SessionError::UnexpectedStatus(response.status)),
        }
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.state == ConnectionState::Closed {
            return Err(SessionError::SessionClosed);
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

// =========================================================================
// Tests
// =========================================================================
