//! Rate-limited call gateway
//!
//! All REST traffic goes through [`CallGateway::call`]. It owns the call
//! budget, signs private requests, and classifies every response into a
//! single outcome. A background task started at construction resets the
//! per-window counter until the gateway is closed or dropped.

use bitstamp_auth::{Credentials, Params, RequestSigner};
use bitstamp_types::{CallBudget, RateLimitResult};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, trace, warn};

use crate::config::GatewayConfig;
use crate::endpoints::OperationRequest;
use crate::error::{CallError, CallResult};
use crate::response::{classify, CallResponse};
use crate::transport::{HttpMethod, HttpRequest, HttpTransport, ReqwestTransport};

/// Content type of every request body
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Bitstamp REST gateway
///
/// Must be created inside a tokio runtime.
///
/// # Example
///
/// ```no_run
/// use bitstamp_rest::{CallGateway, OperationRequest};
/// use bitstamp_types::Pair;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let gateway = CallGateway::new()?;
///     let ticker = gateway.execute(&OperationRequest::ticker(Some(Pair::BTC_USD))).await?;
///     println!("{:?}", ticker.json());
///     gateway.close();
///     Ok(())
/// }
/// ```
pub struct CallGateway {
    config: GatewayConfig,
    transport: Arc<dyn HttpTransport>,
    signer: Option<RequestSigner>,
    budget: Arc<Mutex<CallBudget>>,
    window_task: Mutex<Option<JoinHandle<()>>>,
}

impl CallGateway {
    /// Create a gateway for public endpoints with default settings
    pub fn new() -> CallResult<Self> {
        Self::with_config(GatewayConfig::default(), None)
    }

    /// Create a gateway that can also call private endpoints
    pub fn with_credentials(credentials: Credentials) -> CallResult<Self> {
        Self::with_config(GatewayConfig::default(), Some(credentials))
    }

    /// Create a gateway over the reqwest transport
    pub fn with_config(config: GatewayConfig, credentials: Option<Credentials>) -> CallResult<Self> {
        let transport = ReqwestTransport::new(&config.user_agent)
            .map_err(|e| CallError::Config(e.to_string()))?;
        Self::with_transport(config, Arc::new(transport), credentials.map(RequestSigner::new))
    }

    /// Create a gateway over a custom transport and signer
    pub fn with_transport(
        config: GatewayConfig,
        transport: Arc<dyn HttpTransport>,
        signer: Option<RequestSigner>,
    ) -> CallResult<Self> {
        let handle = Handle::try_current()
            .map_err(|e| CallError::Config(format!("no tokio runtime: {}", e)))?;

        let budget = Arc::new(Mutex::new(CallBudget::new()));
        let window_task = spawn_window_reset(&handle, Arc::clone(&budget), config.rate_limit.window);

        info!(
            base_url = %config.base_url,
            limit = config.rate_limit.max_calls_per_window,
            authenticated = signer.is_some(),
            "Created Bitstamp call gateway"
        );

        Ok(Self {
            config,
            transport,
            signer,
            budget,
            window_task: Mutex::new(Some(window_task)),
        })
    }

    /// Gateway configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Check if the gateway can sign private requests
    pub fn has_credentials(&self) -> bool {
        self.signer.is_some()
    }

    /// Snapshot of the call counters
    pub fn budget(&self) -> CallBudget {
        *self.budget.lock()
    }

    /// Perform one catalog operation
    pub async fn execute(&self, request: &OperationRequest) -> CallResult<CallResponse> {
        let spec = request.operation().spec();
        let params = request.body();
        self.call(
            &request.path(),
            spec.method,
            (!params.is_empty()).then_some(params),
            spec.requires_auth,
            spec.legacy,
        )
        .await
    }

    /// Perform one HTTP call
    ///
    /// `path` is relative to the selected base URL. Every attempt counts
    /// against the budget, including ones refused for exceeding it.
    #[instrument(skip(self, params), fields(method = %method))]
    pub async fn call(
        &self,
        path: &str,
        method: HttpMethod,
        params: Option<&Params>,
        requires_auth: bool,
        use_legacy_base: bool,
    ) -> CallResult<CallResponse> {
        let verdict = self
            .budget
            .lock()
            .register_call(&self.config.rate_limit, Utc::now());
        if let RateLimitResult::Limited { limit, window } = verdict {
            warn!(limit, ?window, "Call budget exhausted, request not sent");
            return Err(CallError::RateLimitExceeded { limit, window });
        }

        let body = self.encode_body(params, requires_auth)?;
        let request = HttpRequest {
            method,
            url: join_url(self.config.base_for(use_legacy_base), path),
            headers: vec![
                ("content-type".to_string(), FORM_CONTENT_TYPE.to_string()),
                ("accept".to_string(), "application/json".to_string()),
            ],
            body,
            timeout: self.config.timeout,
        };

        debug!(url = %request.url, signed = requires_auth, "Sending request");
        let response = self.transport.send(request).await.map_err(|e| {
            warn!(error = %e, "Transport failed");
            CallError::Network(e)
        })?;

        let outcome = classify(response, self.config.parse_failure);
        if let Err(e) = &outcome {
            debug!(error = %e, "Call failed");
        }
        outcome
    }

    /// Stop the window reset task
    ///
    /// Calls still go through afterwards, but the window counter no longer
    /// resets. Idempotent.
    pub fn close(&self) {
        if let Some(task) = self.window_task.lock().take() {
            task.abort();
            info!("Call gateway closed");
        }
    }

    /// Returns true once `close` has been called
    pub fn is_closed(&self) -> bool {
        self.window_task.lock().is_none()
    }

    fn encode_body(&self, params: Option<&Params>, requires_auth: bool) -> CallResult<Option<String>> {
        let empty = Params::new();
        let params = params.unwrap_or(&empty);

        let encoded = if requires_auth {
            let signer = self.signer.as_ref().ok_or(CallError::AuthRequired)?;
            signer.sign(params)?
        } else {
            params.to_urlencoded()?
        };

        Ok((!encoded.is_empty()).then_some(encoded))
    }
}

impl Drop for CallGateway {
    fn drop(&mut self) {
        if let Some(task) = self.window_task.get_mut().take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for CallGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGateway")
            .field("config", &self.config)
            .field("authenticated", &self.signer.is_some())
            .field("budget", &self.budget())
            .finish()
    }
}

fn spawn_window_reset(
    handle: &Handle,
    budget: Arc<Mutex<CallBudget>>,
    window: Duration,
) -> JoinHandle<()> {
    handle.spawn(async move {
        let mut ticker = interval_at(Instant::now() + window, window);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            budget.lock().reset_window(Utc::now());
            trace!("Call window reset");
        }
    })
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
