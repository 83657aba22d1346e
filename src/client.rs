//! The Monit client: status fetching, snapshot reconciliation, and
//! authenticated control actions.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{
    cookie::{CookieStore, Jar},
    Url,
};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::ClientError;
use crate::service::Service;
use crate::status::parse_status_document;

/// Control verb accepted by the daemon's per-service POST endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Restart,
    Monitor,
    Unmonitor,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Monitor => "monitor",
            Self::Unmonitor => "unmonitor",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Seam between the client and the daemon's wire protocol.
///
/// The production implementation is [`HttpTransport`]; tests substitute
/// scripted implementations to exercise the reconciliation logic without a
/// network.
#[async_trait]
pub trait StatusTransport: Send + Sync {
    /// Fetches the raw XML status document.
    async fn fetch_status(&self) -> Result<String, ClientError>;

    /// Posts a control action for one service. Resolves once the daemon has
    /// accepted the request; the action itself may still be in flight.
    async fn post_action(&self, service: &str, action: Action) -> Result<(), ClientError>;
}

/// HTTP transport speaking to a real Monit daemon.
///
/// Keeps a persistent cookie jar because the daemon issues a
/// `securitytoken` cookie on the first authenticated response, which must be
/// echoed back as a form field on every state-changing POST.
pub struct HttpTransport {
    http: reqwest::Client,
    cookies: Arc<Jar>,
    base_url: Url,
    credentials: Option<(String, String)>,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url())
            .map_err(|err| ClientError::transport(format!("invalid base url: {err}")))?;
        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(|err| ClientError::transport(format!("failed to build http client: {err}")))?;
        let credentials = config
            .username
            .clone()
            .map(|username| (username, config.password.clone()));

        Ok(Self {
            http,
            cookies,
            base_url,
            credentials,
        })
    }

    fn authenticated(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, Some(password)),
            None => request,
        }
    }

    /// CSRF token issued by the daemon, read back out of the cookie jar.
    fn security_token(&self) -> Option<String> {
        let header = self.cookies.cookies(&self.base_url)?;
        let raw = header.to_str().ok()?;
        raw.split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| name.eq_ignore_ascii_case("securitytoken"))
            .map(|(_, value)| value.to_string())
    }
}

#[async_trait]
impl StatusTransport for HttpTransport {
    async fn fetch_status(&self) -> Result<String, ClientError> {
        let url = self
            .base_url
            .join("/_status?format=xml")
            .map_err(|err| ClientError::transport(format!("invalid status url: {err}")))?;

        let response = self
            .authenticated(self.http.get(url.clone()))
            .send()
            .await
            .map_err(|err| ClientError::transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|err| ClientError::transport(err.to_string()))
    }

    async fn post_action(&self, service: &str, action: Action) -> Result<(), ClientError> {
        let url = self
            .base_url
            .join(service)
            .map_err(|err| ClientError::transport(format!("invalid service url: {err}")))?;

        let mut form: Vec<(&str, String)> = vec![("action", action.as_str().to_string())];
        if let Some(token) = self.security_token() {
            form.push(("securitytoken", token));
        }

        let response = self
            .authenticated(self.http.post(url.clone()).form(&form))
            .send()
            .await
            .map_err(|err| ClientError::transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }
}

/// Client for one Monit daemon.
///
/// Owns connectivity and the authoritative snapshot of monitored services.
/// All mutating operations take `&mut self`; the type assumes a single
/// caller at a time and does no internal locking.
pub struct Monit {
    transport: Arc<dyn StatusTransport>,
    services: HashMap<String, Service>,
    base_url: String,
    stabilize_backoff: Duration,
    max_stabilize_attempts: usize,
}

impl fmt::Debug for Monit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monit")
            .field("services", &self.services)
            .field("base_url", &self.base_url)
            .field("stabilize_backoff", &self.stabilize_backoff)
            .field("max_stabilize_attempts", &self.max_stabilize_attempts)
            .finish_non_exhaustive()
    }
}

impl Monit {
    /// Connects to the daemon and performs the initial reconcile.
    /// Fails outright if that first fetch fails; no partially-initialized
    /// client is ever returned.
    pub async fn connect(config: Config) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&config)?;
        let mut client = Self::with_transport(Arc::new(transport), &config);
        client.reconcile().await?;
        Ok(client)
    }

    /// Builds a client over an arbitrary transport without fetching.
    /// Callers are expected to run [`Monit::reconcile`] before reading
    /// services.
    pub fn with_transport(transport: Arc<dyn StatusTransport>, config: &Config) -> Self {
        Self {
            transport,
            services: HashMap::new(),
            base_url: config.base_url(),
            stabilize_backoff: config.stabilize_backoff,
            max_stabilize_attempts: config.max_stabilize_attempts,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Read-only view of the last published snapshot, keyed by service name.
    pub fn services(&self) -> &HashMap<String, Service> {
        &self.services
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    /// Fetches, parses, and publishes a stable snapshot.
    ///
    /// While the daemon reports transitional state (a pending action, or a
    /// monitor still initializing) the fetched snapshot is discarded and the
    /// fetch retried after `stabilize_backoff`. The loop is bounded by
    /// `max_stabilize_attempts`; exceeding it returns
    /// [`ClientError::Unstable`] rather than blocking forever. Transport and
    /// parse failures abort immediately and leave the previously published
    /// snapshot untouched.
    pub async fn reconcile(&mut self) -> Result<(), ClientError> {
        let mut transitional_attempts = 0usize;
        loop {
            let body = self.transport.fetch_status().await?;
            let snapshot = parse_status_document(&body)?;

            match snapshot.iter().find(|service| service.is_transitional()) {
                None => {
                    self.services = snapshot
                        .into_iter()
                        .map(|service| (service.name.clone(), service))
                        .collect();
                    debug!(services = self.services.len(), "published stable snapshot");
                    return Ok(());
                }
                Some(transitional) => {
                    transitional_attempts += 1;
                    if transitional_attempts >= self.max_stabilize_attempts {
                        warn!(
                            attempts = transitional_attempts,
                            service = %transitional.name,
                            "daemon did not stabilize, giving up"
                        );
                        return Err(ClientError::Unstable {
                            attempts: transitional_attempts,
                        });
                    }
                    debug!(
                        service = %transitional.name,
                        attempt = transitional_attempts,
                        "snapshot transitional, retrying after backoff"
                    );
                    tokio::time::sleep(self.stabilize_backoff).await;
                }
            }
        }
    }

    /// Posts a control action and reconciles, so the caller's next read
    /// reflects the action's stabilized effect. A failure of the follow-up
    /// reconcile is reported as a failure of the whole operation.
    pub async fn dispatch(&mut self, name: &str, action: Action) -> Result<(), ClientError> {
        info!(service = name, action = %action, "dispatching action");
        self.transport.post_action(name, action).await?;
        self.reconcile().await
    }

    pub async fn start(&mut self, name: &str) -> Result<(), ClientError> {
        self.dispatch(name, Action::Start).await
    }

    pub async fn stop(&mut self, name: &str) -> Result<(), ClientError> {
        self.dispatch(name, Action::Stop).await
    }

    pub async fn restart(&mut self, name: &str) -> Result<(), ClientError> {
        self.dispatch(name, Action::Restart).await
    }

    pub async fn monitor(&mut self, name: &str, enable: bool) -> Result<(), ClientError> {
        let action = if enable {
            Action::Monitor
        } else {
            Action::Unmonitor
        };
        self.dispatch(name, action).await
    }

    pub async fn unmonitor(&mut self, name: &str) -> Result<(), ClientError> {
        self.dispatch(name, Action::Unmonitor).await
    }

    /// Borrowing control handle for one service. Fails if the name is not in
    /// the current snapshot, so typos surface before any POST goes out.
    pub fn control<'a>(&'a mut self, name: &str) -> Result<ServiceHandle<'a>, ClientError> {
        if !self.services.contains_key(name) {
            return Err(ClientError::unknown_service(name));
        }
        Ok(ServiceHandle {
            client: self,
            name: name.to_string(),
        })
    }
}

/// Non-owning handle pairing a service name with its client, so control
/// verbs read naturally at call sites. The handle never outlives the borrow
/// of the client that produced it.
#[derive(Debug)]
pub struct ServiceHandle<'a> {
    client: &'a mut Monit,
    name: String,
}

impl ServiceHandle<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot for this service, if it survived the last reconcile.
    pub fn status(&self) -> Option<&Service> {
        self.client.service(&self.name)
    }

    pub async fn start(&mut self) -> Result<(), ClientError> {
        self.client.dispatch(&self.name, Action::Start).await
    }

    pub async fn stop(&mut self) -> Result<(), ClientError> {
        self.client.dispatch(&self.name, Action::Stop).await
    }

    pub async fn restart(&mut self) -> Result<(), ClientError> {
        self.client.dispatch(&self.name, Action::Restart).await
    }

    pub async fn monitor(&mut self, enable: bool) -> Result<(), ClientError> {
        self.client.monitor(&self.name, enable).await
    }

    pub async fn unmonitor(&mut self) -> Result<(), ClientError> {
        self.client.dispatch(&self.name, Action::Unmonitor).await
    }
}
