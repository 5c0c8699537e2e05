//! Featrack client implementation.

use crate::builders::{CustomerBuilder, UsageBuilder};
use crate::config::{Config, ErrorMode, FeatrackBuilder};
use crate::state::ClientState;
use crate::transport::{Endpoint, HttpTransport};
use crate::types::{
    Ack, Customer, IdentifySessionPayload, SessionStarted, SessionTimePayload,
    StartSessionPayload, UsageAck,
};
use crate::Error;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Featrack usage analytics client.
///
/// One client tracks one session and one customer identity. Every
/// operation resolves to `Ok(Some(_))` on success; failures follow the
/// configured [`ErrorMode`]: `Ok(None)` after a logged warning, or `Err`.
///
/// # Example
///
/// ```rust,no_run
/// use featrack::{ErrorMode, Featrack};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), featrack::Error> {
///     let client = Featrack::builder("ft_token", "my-app")
///         .error_mode(ErrorMode::Throw)
///         .build()?;
///
///     client.customers().create("user-42").name("Ann").send().await?;
///
///     // Starts a session on the way if none is active
///     client.sessions().identify("user-42").await?;
///
///     client.usages().track("export-csv").feature_emoji("📄").send().await?;
///
///     client.sessions().end(Duration::from_secs(95)).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct Featrack {
    error_mode: ErrorMode,
    bound: Option<Bound>,
    state: ClientState,
}

/// Configuration and transport of an initialized client.
#[derive(Debug)]
struct Bound {
    config: Config,
    transport: HttpTransport,
}

impl Featrack {
    /// Create a new builder with the given token and application slug.
    pub fn builder(
        auth_token: impl Into<String>,
        application_slug: impl Into<String>,
    ) -> FeatrackBuilder {
        FeatrackBuilder::new(auth_token, application_slug)
    }

    /// Create a client that has not been initialized yet.
    ///
    /// Every operation reports [`Error::NotInitialized`] until [`init`] succeeds.
    ///
    /// [`init`]: Featrack::init
    pub fn uninitialized(error_mode: ErrorMode) -> Self {
        Self {
            error_mode,
            ..Self::default()
        }
    }

    /// Initialize the client: validate token and slug, build the transport.
    ///
    /// An empty token or slug is reported through the error policy; in
    /// warn mode initialization carries on. If the transport cannot be
    /// built the client stays uninitialized. Session and identity state
    /// are kept.
    pub fn init(&mut self, builder: FeatrackBuilder) -> Result<(), Error> {
        let config = builder.build_config();
        self.error_mode = config.error_mode();

        if config.auth_token().is_empty() {
            self.report::<()>(Error::Validation("token is required".into()))?;
        }

        if config.application_slug().is_empty() {
            self.report::<()>(Error::Validation("application slug is required".into()))?;
        }

        match HttpTransport::new(&config) {
            Ok(transport) => {
                info!(
                    api_url = %config.api_url(),
                    application_slug = %config.application_slug(),
                    error_mode = %config.error_mode(),
                    "featrack client initialized"
                );
                self.bound = Some(Bound { config, transport });
            }
            Err(e) => {
                self.bound = None;
                self.report::<()>(e)?;
            }
        }

        Ok(())
    }

    /// Get the client configuration, if initialized.
    pub fn config(&self) -> Option<&Config> {
        self.bound.as_ref().map(|b| &b.config)
    }

    /// Whether [`init`](Featrack::init) has bound a transport.
    pub fn is_initialized(&self) -> bool {
        self.bound.is_some()
    }

    /// Get the error mode.
    pub fn error_mode(&self) -> ErrorMode {
        self.error_mode
    }

    /// Id of the active session.
    pub fn session_id(&self) -> Option<String> {
        self.state.session_id()
    }

    /// Unique id of the identified customer.
    pub fn customer_unique_id(&self) -> Option<String> {
        self.state.customer_unique_id()
    }

    // ============================================
    // NAMESPACES
    // ============================================

    /// Customer methods.
    pub fn customers(&self) -> CustomerMethods<'_> {
        CustomerMethods { client: self }
    }

    /// Session lifecycle methods.
    pub fn sessions(&self) -> SessionMethods<'_> {
        SessionMethods { client: self }
    }

    /// Usage tracking methods.
    pub fn usages(&self) -> UsageMethods<'_> {
        UsageMethods { client: self }
    }

    // ============================================
    // INTERNAL
    // ============================================

    fn report<T>(&self, error: Error) -> Result<Option<T>, Error> {
        self.error_mode.report(error)
    }

    #[instrument(skip_all, fields(unique_id = %builder.unique_id()))]
    async fn create_customer(&self, builder: CustomerBuilder) -> Result<Option<Customer>, Error> {
        let Some(bound) = &self.bound else {
            return self.report(Error::NotInitialized);
        };

        if builder.unique_id().is_empty() {
            return self.report(Error::Validation("customer unique ID is required".into()));
        }

        if bound.config.application_slug().is_empty() {
            return self.report(Error::Validation("application slug is required".into()));
        }

        let payload = builder.build(bound.config.application_slug());
        match bound
            .transport
            .post::<_, Customer>(Endpoint::CustomersCreate, &payload)
            .await
        {
            Ok(customer) => {
                if builder.identifies() {
                    self.state.set_customer_unique_id(builder.unique_id());
                    debug!("customer identified after creation");
                }
                Ok(Some(customer))
            }
            Err(e) => self.report(e),
        }
    }

    #[instrument(skip(self))]
    async fn start_session(
        &self,
        customer_unique_id: Option<String>,
    ) -> Result<Option<SessionStarted>, Error> {
        let Some(bound) = &self.bound else {
            return self.report(Error::NotInitialized);
        };

        // Held until the response arrives so a concurrent start sees it.
        let Some(guard) = self.state.begin_start() else {
            return self.report(Error::SessionAlreadyStarted);
        };

        if bound.config.application_slug().is_empty() {
            return self.report(Error::Validation("application slug is required".into()));
        }

        let payload = StartSessionPayload {
            application_slug: bound.config.application_slug().into(),
            customer_unique_id,
        };

        match bound
            .transport
            .post::<_, SessionStarted>(Endpoint::SessionsStart, &payload)
            .await
        {
            Ok(started) => {
                guard.complete(started.session_id.clone());
                info!(session_id = %started.session_id, "session started");
                Ok(Some(started))
            }
            Err(e) => self.report(e),
        }
    }

    async fn post_session_time(
        &self,
        endpoint: Endpoint,
        time_spent: Duration,
    ) -> Result<Option<Ack>, Error> {
        let Some(bound) = &self.bound else {
            return self.report(Error::NotInitialized);
        };

        let Some(session_id) = self.state.session_id() else {
            return self.report(Error::SessionNotStarted);
        };

        let payload = SessionTimePayload {
            session_id,
            time_spent_ms: duration_ms(time_spent),
        };

        match bound.transport.post::<_, Ack>(endpoint, &payload).await {
            Ok(ack) => Ok(Some(ack)),
            Err(e) => self.report(e),
        }
    }

    #[instrument(skip(self))]
    async fn set_time_spent(&self, time_spent: Duration) -> Result<Option<Ack>, Error> {
        self.post_session_time(Endpoint::SessionsSetTime, time_spent)
            .await
    }

    #[instrument(skip(self))]
    async fn end_session(&self, time_spent: Duration) -> Result<Option<Ack>, Error> {
        let ack = self
            .post_session_time(Endpoint::SessionsEnd, time_spent)
            .await?;

        if ack.is_some() {
            info!(time_spent_ms = duration_ms(time_spent), "session ended");
            if self.config().is_some_and(Config::clear_session_on_end) {
                self.state.clear_session();
            }
        }

        Ok(ack)
    }

    /// Return the active session id, starting a session for
    /// `customer_unique_id` if there is none.
    async fn ensure_session(&self, customer_unique_id: &str) -> Result<Option<String>, Error> {
        if let Some(session_id) = self.state.session_id() {
            return Ok(Some(session_id));
        }

        debug!("no active session, starting one before identify");
        self.start_session(Some(customer_unique_id.to_string()))
            .await?;

        match self.state.session_id() {
            Some(session_id) => Ok(Some(session_id)),
            None => self.report(Error::SessionNotStarted),
        }
    }

    #[instrument(skip(self))]
    async fn identify_session(&self, customer_unique_id: String) -> Result<Option<Ack>, Error> {
        let Some(bound) = &self.bound else {
            return self.report(Error::NotInitialized);
        };

        if customer_unique_id.is_empty() {
            return self.report(Error::Validation("customer unique ID is required".into()));
        }

        if bound.config.application_slug().is_empty() {
            return self.report(Error::Validation("application slug is required".into()));
        }

        let Some(session_id) = self.ensure_session(&customer_unique_id).await? else {
            return Ok(None);
        };

        let payload = IdentifySessionPayload {
            application_slug: bound.config.application_slug().into(),
            session_id,
            customer_unique_id,
        };

        match bound
            .transport
            .post::<_, Ack>(Endpoint::SessionsIdentify, &payload)
            .await
        {
            Ok(ack) => {
                self.state
                    .set_customer_unique_id(payload.customer_unique_id.clone());
                info!(customer_unique_id = %payload.customer_unique_id, "session identified");
                Ok(Some(ack))
            }
            Err(e) => self.report(e),
        }
    }

    #[instrument(skip_all, fields(feature_slug = %builder.feature_slug()))]
    async fn track_usage(&self, builder: UsageBuilder) -> Result<Option<UsageAck>, Error> {
        let Some(bound) = &self.bound else {
            return self.report(Error::NotInitialized);
        };

        let Some(customer_unique_id) = self.state.customer_unique_id() else {
            return self.report(Error::NotIdentified);
        };

        if builder.feature_slug().is_empty() {
            return self.report(Error::Validation("feature slug is required".into()));
        }

        let payload = builder.build(
            bound.config.application_slug(),
            customer_unique_id,
            self.state.session_id(),
        );

        match bound
            .transport
            .post::<_, UsageAck>(Endpoint::UsagesConsume, &payload)
            .await
        {
            Ok(ack) => Ok(Some(ack)),
            Err(e) => self.report(e),
        }
    }
}

impl FeatrackBuilder {
    /// Build and initialize a Featrack client.
    pub fn build(self) -> Result<Featrack, Error> {
        let mut client = Featrack::default();
        client.init(self)?;
        Ok(client)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================
// SENDABLE WRAPPERS
// ============================================

/// Sendable customer creation.
pub struct SendableCustomer<'a> {
    builder: CustomerBuilder,
    client: &'a Featrack,
}

impl<'a> SendableCustomer<'a> {
    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.builder = self.builder.name(name);
        self
    }

    /// Identify as this customer once it has been created.
    pub fn and_identify(mut self) -> Self {
        self.builder = self.builder.and_identify();
        self
    }

    /// Send the request. Resolves to the customer record echoed by the API.
    pub async fn send(self) -> Result<Option<Customer>, Error> {
        self.client.create_customer(self.builder).await
    }
}

/// Sendable session start.
pub struct SendableStart<'a> {
    customer_unique_id: Option<String>,
    client: &'a Featrack,
}

impl<'a> SendableStart<'a> {
    /// Attach the session to a customer.
    pub fn customer_unique_id(mut self, id: impl Into<String>) -> Self {
        self.customer_unique_id = Some(id.into());
        self
    }

    /// Send the request. On success the returned session id becomes the
    /// active session.
    pub async fn send(self) -> Result<Option<SessionStarted>, Error> {
        self.client.start_session(self.customer_unique_id).await
    }
}

/// Sendable usage event.
pub struct SendableUsage<'a> {
    builder: UsageBuilder,
    client: &'a Featrack,
}

impl<'a> SendableUsage<'a> {
    /// Set when the usage happened. Defaults to now.
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.builder = self.builder.date(date);
        self
    }

    /// Set the customer display name.
    pub fn customer_name(mut self, name: impl Into<String>) -> Self {
        self.builder = self.builder.customer_name(name);
        self
    }

    /// Set the feature emoji.
    pub fn feature_emoji(mut self, emoji: impl Into<String>) -> Self {
        self.builder = self.builder.feature_emoji(emoji);
        self
    }

    /// Set the feature display name.
    pub fn feature_name(mut self, name: impl Into<String>) -> Self {
        self.builder = self.builder.feature_name(name);
        self
    }

    /// Set the feature description.
    pub fn feature_description(mut self, description: impl Into<String>) -> Self {
        self.builder = self.builder.feature_description(description);
        self
    }

    /// Send the event.
    pub async fn send(self) -> Result<Option<UsageAck>, Error> {
        self.client.track_usage(self.builder).await
    }
}

// ============================================
// NAMESPACE METHODS
// ============================================

/// Customer methods.
pub struct CustomerMethods<'a> {
    client: &'a Featrack,
}

impl<'a> CustomerMethods<'a> {
    /// Create a customer.
    ///
    /// Does not change the identified customer unless
    /// [`and_identify`](SendableCustomer::and_identify) is set.
    pub fn create(&self, unique_id: impl Into<String>) -> SendableCustomer<'a> {
        SendableCustomer {
            builder: CustomerBuilder::new(unique_id),
            client: self.client,
        }
    }

    /// Set the identified customer locally, without contacting the API.
    ///
    /// Use [`SessionMethods::identify`] to also tie the customer to the
    /// active session server-side.
    pub fn identify(&self, unique_id: impl Into<String>) -> Result<Option<()>, Error> {
        let unique_id = unique_id.into();
        if unique_id.is_empty() {
            return self
                .client
                .report(Error::Validation("customer unique ID is required".into()));
        }

        self.client.state.set_customer_unique_id(unique_id);
        Ok(Some(()))
    }
}

/// Session lifecycle methods.
pub struct SessionMethods<'a> {
    client: &'a Featrack,
}

impl<'a> SessionMethods<'a> {
    /// Start a session.
    ///
    /// Fails with [`Error::SessionAlreadyStarted`] while a session is active
    /// or another start is still waiting for its response.
    pub fn start(&self) -> SendableStart<'a> {
        SendableStart {
            customer_unique_id: None,
            client: self.client,
        }
    }

    /// Report the time spent so far in the active session.
    pub async fn set_time_spent(&self, time_spent: Duration) -> Result<Option<Ack>, Error> {
        self.client.set_time_spent(time_spent).await
    }

    /// End the active session.
    ///
    /// The session id is kept afterwards unless the client was built with
    /// `clear_session_on_end(true)`.
    pub async fn end(&self, time_spent: Duration) -> Result<Option<Ack>, Error> {
        self.client.end_session(time_spent).await
    }

    /// Identify the customer of the active session, starting a session for
    /// them first if none is active (identify-or-start).
    ///
    /// On success the customer becomes the identified customer used by
    /// usage tracking.
    pub async fn identify(
        &self,
        customer_unique_id: impl Into<String>,
    ) -> Result<Option<Ack>, Error> {
        self.client.identify_session(customer_unique_id.into()).await
    }

    /// Adopt a session id issued earlier, e.g. one persisted by the host.
    pub fn resume(&self, session_id: impl Into<String>) -> Result<Option<()>, Error> {
        let session_id = session_id.into();
        if session_id.is_empty() {
            return self
                .client
                .report(Error::Validation("session ID is required".into()));
        }

        self.client.state.set_session_id(session_id);
        Ok(Some(()))
    }

    /// Forget the active session locally. The server is not notified.
    pub fn reset(&self) {
        self.client.state.clear_session();
    }
}

/// Usage tracking methods.
pub struct UsageMethods<'a> {
    client: &'a Featrack,
}

impl<'a> UsageMethods<'a> {
    /// Track usage of a feature by the identified customer.
    ///
    /// The active session id is attached when there is one.
    pub fn track(&self, feature_slug: impl Into<String>) -> SendableUsage<'a> {
        SendableUsage {
            builder: UsageBuilder::new(feature_slug),
            client: self.client,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(mode: ErrorMode) -> Featrack {
        Featrack::builder("tok", "app")
            .api_url("http://127.0.0.1:9")
            .error_mode(mode)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_uninitialized_reports_not_initialized() {
        let client = Featrack::uninitialized(ErrorMode::Throw);

        assert!(matches!(
            client.sessions().start().send().await,
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            client.customers().create("u1").send().await,
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            client.sessions().set_time_spent(Duration::from_secs(1)).await,
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            client.sessions().end(Duration::from_secs(1)).await,
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            client.sessions().identify("u1").await,
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            client.usages().track("export").send().await,
            Err(Error::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_uninitialized_warn_mode_returns_none() {
        let client = Featrack::default();

        assert!(!client.is_initialized());
        assert!(matches!(client.sessions().start().send().await, Ok(None)));
        assert!(matches!(client.usages().track("export").send().await, Ok(None)));
    }

    #[test]
    fn test_init_rejects_empty_token_in_throw_mode() {
        let result = Featrack::builder("", "app")
            .error_mode(ErrorMode::Throw)
            .build();

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_init_warns_on_empty_slug_and_continues() {
        let client = Featrack::builder("tok", "").build().unwrap();

        assert!(client.is_initialized());
        assert_eq!(client.config().unwrap().application_slug(), "");
    }

    #[test]
    fn test_invalid_token_leaves_client_uninitialized_in_warn_mode() {
        let client = Featrack::builder("bad\ntoken", "app").build().unwrap();
        assert!(!client.is_initialized());
    }

    #[tokio::test]
    async fn test_start_with_empty_slug_releases_claim() {
        let client = Featrack::builder("tok", "")
            .api_url("http://127.0.0.1:9")
            .build()
            .unwrap();

        assert!(matches!(client.sessions().start().send().await, Ok(None)));
        assert!(client.state.begin_start().is_some());
    }

    #[tokio::test]
    async fn test_start_twice_is_precondition_error() {
        let client = client(ErrorMode::Throw);
        client.sessions().resume("s1").unwrap();

        let result = client.sessions().start().send().await;

        assert!(matches!(result, Err(Error::SessionAlreadyStarted)));
    }

    #[tokio::test]
    async fn test_session_ops_need_session() {
        let client = client(ErrorMode::Throw);

        assert!(matches!(
            client.sessions().set_time_spent(Duration::from_secs(1)).await,
            Err(Error::SessionNotStarted)
        ));
        assert!(matches!(
            client.sessions().end(Duration::from_secs(1)).await,
            Err(Error::SessionNotStarted)
        ));
    }

    #[tokio::test]
    async fn test_track_needs_identity() {
        let client = client(ErrorMode::Throw);
        client.sessions().resume("s1").unwrap();

        let result = client
            .usages()
            .track("export")
            .feature_name("Export")
            .send()
            .await;

        assert!(matches!(result, Err(Error::NotIdentified)));
    }

    #[tokio::test]
    async fn test_track_needs_feature_slug() {
        let client = client(ErrorMode::Throw);
        client.customers().identify("u1").unwrap();

        let result = client.usages().track("").send().await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_identify_needs_customer_id() {
        let client = client(ErrorMode::Throw);

        let result = client.sessions().identify("").await;

        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(client.session_id(), None);
    }

    #[tokio::test]
    async fn test_create_needs_unique_id() {
        let client = client(ErrorMode::Throw);

        let result = client.customers().create("").send().await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_local_identify_and_resume() {
        let client = client(ErrorMode::Warn);

        assert!(matches!(client.customers().identify(""), Ok(None)));
        assert_eq!(client.customer_unique_id(), None);

        client.customers().identify("u1").unwrap();
        client.sessions().resume("s1").unwrap();
        assert_eq!(client.customer_unique_id().as_deref(), Some("u1"));
        assert_eq!(client.session_id().as_deref(), Some("s1"));

        client.sessions().reset();
        assert_eq!(client.session_id(), None);
        assert_eq!(client.customer_unique_id().as_deref(), Some("u1"));
    }

    #[test]
    fn test_duration_ms() {
        assert_eq!(duration_ms(Duration::from_millis(1000)), 1000);
        assert_eq!(duration_ms(Duration::from_micros(1500)), 1);
    }
}
