//! `KgsClient` builder.
//!
//! This is the entry point for connecting a bot. It ties the layers
//! together: reqwest transport → protocol → session.

use std::time::Duration;

use kgsbot_session::{Connection, ConnectionConfig, Credentials};
use kgsbot_transport::{HttpTransport, ReqwestTransport, DEFAULT_REQUEST_TIMEOUT};

use crate::KgsError;

/// A connection over the default reqwest transport.
pub type KgsConnection = Connection<ReqwestTransport>;

/// Entry point for building a client connection.
///
/// # Example
///
/// ```rust,no_run
/// use kgsbot::prelude::*;
///
/// # async fn run() -> Result<(), KgsError> {
/// let mut conn = KgsClient::builder()
///     .url("http://localhost:8080/jsonClient/access")
///     .credentials("OSRBot", "")
///     .connect()
///     .await?;
/// while conn.step_loop().await? {}
/// # Ok(())
/// # }
/// ```
pub struct KgsClient;

impl KgsClient {
    /// Creates a new builder.
    pub fn builder() -> KgsClientBuilder {
        KgsClientBuilder::new()
    }
}

/// Builder for configuring and connecting a client.
#[derive(Debug, Clone)]
pub struct KgsClientBuilder {
    url: Option<String>,
    credentials: Option<Credentials>,
    config: ConnectionConfig,
    request_timeout: Duration,
}

impl KgsClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: None,
            credentials: None,
            config: ConnectionConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the servlet access URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the account to log in with.
    pub fn credentials(
        mut self,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::new(name, password));
        self
    }

    /// Sets the connection configuration.
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the per-request HTTP timeout. Only applies to [`connect`](Self::connect).
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds a reqwest transport and performs the handshake.
    ///
    /// # Errors
    /// [`KgsError::Config`] without a URL or credentials; otherwise whatever
    /// the transport or handshake fails with.
    pub async fn connect(self) -> Result<KgsConnection, KgsError> {
        let transport = ReqwestTransport::with_timeout(self.request_timeout)?;
        self.connect_with(transport).await
    }

    /// Performs the handshake over a caller-supplied transport.
    pub async fn connect_with<T: HttpTransport>(
        self,
        transport: T,
    ) -> Result<Connection<T>, KgsError> {
        let url = self
            .url
            .ok_or_else(|| KgsError::Config("no servlet URL set".into()))?;
        let credentials = self
            .credentials
            .ok_or_else(|| KgsError::Config("no credentials set".into()))?;

        tracing::info!(%url, "connecting");
        let conn = Connection::connect(url, credentials, transport, self.config)
            .await?;
        Ok(conn)
    }
}

impl Default for KgsClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
