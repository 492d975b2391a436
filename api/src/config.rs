/// Gateway used when nothing else is configured (local development backend).
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000";

/// Environment variable naming the gateway base URL.
///
/// Read at build time for browser builds; native builds also honour it at
/// run time.
pub const GATEWAY_URL_VAR: &str = "SDE_WRAPPED_GATEWAY_URL";

/// Where the session gateway lives. Endpoint URLs are derived from the base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    base_url: String,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Some(url) = std::env::var(GATEWAY_URL_VAR)
                .ok()
                .filter(|url| !url.trim().is_empty())
            {
                return Self::new(url);
            }
        }

        match option_env!("SDE_WRAPPED_GATEWAY_URL") {
            Some(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full-page navigation target that starts the GitHub OAuth flow.
    pub fn login_url(&self) -> String {
        format!("{}/auth/github", self.base_url)
    }

    pub fn logout_url(&self) -> String {
        format!("{}/auth/logout", self.base_url)
    }

    pub fn wrapped_url(&self) -> String {
        format!("{}/api/wrapped", self.base_url)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY_URL)
    }
}
