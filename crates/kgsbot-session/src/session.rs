//! Session types: configuration, connection state and the session record.
//!
//! A "session" is the client's half of a login: the cookies the servlet
//! handed back, whether the caller's loop should keep going, and how long
//! the connection has been sitting idle.

use std::fmt;
use std::time::Duration;

use kgsbot_transport::Cookies;
use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// ConnectionConfig
// ---------------------------------------------------------------------------

/// Tunables for a [`Connection`](crate::Connection).
///
/// Start from `ConnectionConfig::default()` and override the fields you care
/// about. The connection calls [`validated`](Self::validated) itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Delay before every outgoing message. At most one message leaves per
    /// interval. Default: 1 second.
    pub pacing_interval: Duration,

    /// Idle time after which a `WAKE_UP` is queued so the server does not
    /// drop the session. Default: 10 seconds.
    pub inactivity_threshold: Duration,

    /// Locale sent with the login. Default: `en_US`.
    pub locale: String,

    /// Give up the handshake after this many polls without a HELLO.
    /// `None` (the default) polls until the caller cancels.
    pub handshake_max_polls: Option<u32>,

    /// Delay between handshake polls. Default: none, the servlet holds the
    /// GET open until it has something to say.
    pub handshake_poll_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pacing_interval: Duration::from_secs(1),
            inactivity_threshold: Duration::from_secs(10),
            locale: "en_US".to_string(),
            handshake_max_polls: None,
            handshake_poll_interval: Duration::ZERO,
        }
    }
}

impl ConnectionConfig {
    /// Shortest pacing interval accepted.
    pub const MIN_PACING_INTERVAL: Duration = Duration::from_millis(100);

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// - `pacing_interval` is raised to [`Self::MIN_PACING_INTERVAL`].
    /// - `inactivity_threshold` is raised to at least one pacing interval.
    /// - an empty `locale` falls back to `en_US`.
    pub fn validated(mut self) -> Self {
        if self.pacing_interval < Self::MIN_PACING_INTERVAL {
            warn!(
                pacing_ms = self.pacing_interval.as_millis() as u64,
                min_ms = Self::MIN_PACING_INTERVAL.as_millis() as u64,
                "pacing interval below minimum, clamping"
            );
            self.pacing_interval = Self::MIN_PACING_INTERVAL;
        }
        if self.inactivity_threshold < self.pacing_interval {
            warn!("inactivity threshold shorter than pacing interval, clamping");
            self.inactivity_threshold = self.pacing_interval;
        }
        if self.locale.trim().is_empty() {
            self.locale = "en_US".to_string();
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// The account a bot logs in with.
#[derive(Clone, Default)]
pub struct Credentials {
    pub name: String,
    pub password: String,
}

impl Credentials {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
        }
    }
}

// Keeps passwords out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// Where a connection is in its lifecycle.
///
/// ```text
/// Init → LoggingIn → AwaitingHello → Connected → Closed
/// ```
///
/// Transitions only move forward; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionState {
    /// Built, nothing sent yet.
    Init,
    /// LOGIN posted, waiting for its response.
    LoggingIn,
    /// Cookies captured, polling for HELLO.
    AwaitingHello,
    /// HELLO seen; messages may flow.
    Connected,
    /// Logged out. Nothing more can be sent.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::LoggingIn => "logging-in",
            Self::AwaitingHello => "awaiting-hello",
            Self::Connected => "connected",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The client's session with the servlet.
#[derive(Debug, Clone)]
pub struct Session {
    /// Cookies captured from the login response. `None` before the login
    /// and after close.
    pub(crate) cookies: Option<Cookies>,

    /// Whether the caller's loop should keep stepping.
    pub(crate) keep_alive: bool,

    /// Time spent with nothing to send since the last message went out.
    pub(crate) idle: Duration,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            cookies: None,
            keep_alive: true,
            idle: Duration::ZERO,
        }
    }
}

impl Session {
    pub fn cookies(&self) -> Option<&Cookies> {
        self.cookies.as_ref()
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub fn idle(&self) -> Duration {
        self.idle
    }

    /// Forgets the login for good.
    pub(crate) fn invalidate(&mut self) {
        self.cookies = None;
        self.keep_alive = false;
        self.idle = Duration::ZERO;
    }
}
