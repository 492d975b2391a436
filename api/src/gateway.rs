use futures::future::{FutureExt, LocalBoxFuture};
use reqwest::{Client, RequestBuilder, StatusCode};
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::model::ProfileSummary;

/// Why a gateway call did not produce what was asked for.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("gateway answered with HTTP {0}")]
    Status(u16),

    #[error("unreadable profile summary: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Result of asking the gateway for the signed-in user's summary.
///
/// `Unauthenticated` is an expected terminal state (show the login prompt),
/// `FetchError` is a failure worth offering a retry for.
#[derive(Debug)]
pub enum FetchOutcome {
    Authenticated(ProfileSummary),
    Unauthenticated,
    FetchError(GatewayError),
}

impl FetchOutcome {
    pub fn summary(&self) -> Option<&ProfileSummary> {
        match self {
            FetchOutcome::Authenticated(summary) => Some(summary),
            _ => None,
        }
    }
}

impl From<Result<Option<ProfileSummary>, GatewayError>> for FetchOutcome {
    fn from(result: Result<Option<ProfileSummary>, GatewayError>) -> Self {
        match result {
            Ok(Some(summary)) => FetchOutcome::Authenticated(summary),
            Ok(None) => FetchOutcome::Unauthenticated,
            Err(err) => FetchOutcome::FetchError(err),
        }
    }
}

/// Operations the UI needs from the session gateway.
pub trait SessionGateway {
    /// Credentialed read of the current user's summary.
    fn fetch_wrapped(&self) -> LocalBoxFuture<'_, FetchOutcome>;

    /// Credentialed POST that ends the session.
    fn logout(&self) -> LocalBoxFuture<'_, Result<(), GatewayError>>;

    /// Navigation target that starts the OAuth login flow.
    fn login_url(&self) -> String;
}

/// `reqwest`-backed gateway client.
///
/// In the browser every request carries the ambient session cookie
/// (`credentials: include`); native builds keep their own cookie store.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    config: GatewayConfig,
    http: Client,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        #[cfg(target_arch = "wasm32")]
        let http = Client::new();

        #[cfg(not(target_arch = "wasm32"))]
        let http = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(GatewayError::Transport)?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn credentialed(&self, request: RequestBuilder) -> RequestBuilder {
        #[cfg(target_arch = "wasm32")]
        {
            request.fetch_credentials_include()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            request
        }
    }

    async fn request_summary(&self) -> Result<Option<ProfileSummary>, GatewayError> {
        let url = self.config.wrapped_url();
        let response = self
            .credentialed(self.http.get(&url))
            .send()
            .await
            .map_err(GatewayError::Transport)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!(%url, "no active session");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let summary = response
            .json::<ProfileSummary>()
            .await
            .map_err(GatewayError::Decode)?;
        Ok(Some(summary))
    }

    async fn request_logout(&self) -> Result<(), GatewayError> {
        let response = self
            .credentialed(self.http.post(self.config.logout_url()))
            .send()
            .await
            .map_err(GatewayError::Transport)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(GatewayError::Status(status.as_u16()))
        }
    }
}

impl SessionGateway for HttpGateway {
    fn fetch_wrapped(&self) -> LocalBoxFuture<'_, FetchOutcome> {
        async move {
            let outcome = FetchOutcome::from(self.request_summary().await);
            if let FetchOutcome::FetchError(err) = &outcome {
                tracing::error!("Error fetching wrapped data: {err}");
            }
            outcome
        }
        .boxed_local()
    }

    fn logout(&self) -> LocalBoxFuture<'_, Result<(), GatewayError>> {
        self.request_logout().boxed_local()
    }

    fn login_url(&self) -> String {
        self.config.login_url()
    }
}
