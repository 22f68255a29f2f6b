use crate::Result;
use keyring::Entry;
use reqwest::Proxy;
use std::env;
use std::time::Duration;

/// Keyring service name under which provider credentials are stored.
const KEYRING_SERVICE: &str = "tts-lib";

/// Build the shared `reqwest` client used by every provider.
///
/// Minimal production-friendly defaults (env-overridable):
/// - `TTS_HTTP_TIMEOUT_SECS` overrides the per-provider request timeout
/// - `TTS_HTTP_POOL_MAX_IDLE_PER_HOST` / `TTS_HTTP_POOL_IDLE_TIMEOUT_SECS`
/// - `TTS_PROXY_URL` routes all provider traffic through a proxy
pub fn build_client(default_timeout_secs: u64) -> Result<reqwest::Client> {
    let timeout_secs = env::var("TTS_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default_timeout_secs);

    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .pool_max_idle_per_host(
            env::var("TTS_HTTP_POOL_MAX_IDLE_PER_HOST")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(32),
        )
        .pool_idle_timeout(Some(Duration::from_secs(
            env::var("TTS_HTTP_POOL_IDLE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(90),
        )))
        // Conservative HTTP/2 keepalive defaults for long-lived connections.
        .http2_adaptive_window(true)
        .http2_keep_alive_interval(Some(Duration::from_secs(30)))
        .http2_keep_alive_timeout(Duration::from_secs(10));

    if let Ok(proxy_url) = env::var("TTS_PROXY_URL") {
        if let Ok(proxy) = Proxy::all(&proxy_url) {
            builder = builder.proxy(proxy);
        }
    }

    builder
        .build()
        .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))
}

/// Resolve an API key for a provider.
///
/// 1. Keyring entry (`tts-lib` / provider id)
/// 2. Environment variable `{PROVIDER_ID}_API_KEY` (e.g. `OPENAI_API_KEY`)
pub fn resolve_api_key(provider_id: &str) -> Option<String> {
    if let Ok(entry) = Entry::new(KEYRING_SERVICE, provider_id) {
        if let Ok(key) = entry.get_password() {
            return Some(key);
        }
    }

    let env_var = format!("{}_API_KEY", provider_id.to_uppercase());
    env::var(env_var).ok()
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
