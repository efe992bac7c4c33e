#[derive(Debug, Clone)]
pub struct SessionAdapterConfig {
    /// JSON-RPC endpoint of the wallet bridge. Absent means the wallet
    /// adapter runs deterministically.
    pub bridge_url: Option<String>,
    /// Overrides the configured fallback endpoint when set.
    pub rpc_url_override: Option<String>,
    pub request_timeout_ms: u64,
    pub confirmation_poll_interval_ms: u64,
    pub max_confirmation_polls: u64,
}

impl Default for SessionAdapterConfig {
    fn default() -> Self {
        Self {
            bridge_url: None,
            rpc_url_override: None,
            request_timeout_ms: 15_000,
            confirmation_poll_interval_ms: 1_000,
            max_confirmation_polls: 60,
        }
    }
}

impl SessionAdapterConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bridge_url: std::env::var("WALLET_BRIDGE_URL").ok(),
            rpc_url_override: std::env::var("WALLET_RPC_URL").ok(),
            request_timeout_ms: env_u64("WALLET_REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout_ms),
            confirmation_poll_interval_ms: env_u64("WALLET_CONFIRMATION_POLL_INTERVAL_MS")
                .unwrap_or(defaults.confirmation_poll_interval_ms),
            max_confirmation_polls: env_u64("WALLET_MAX_CONFIRMATION_POLLS")
                .unwrap_or(defaults.max_confirmation_polls),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|raw| raw.parse().ok())
}
