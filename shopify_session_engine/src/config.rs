use std::time::Duration;

use log::*;
use ssg_common::Secret;

const DEFAULT_JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_JWKS_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Credentials and protocol settings for the Shopify app this gateway fronts.
///
/// `allow_dev_domains` controls whether development-domain suffixes (tunnels, localhost) are accepted as
/// shop domains in session tokens. It is an explicit flag that callers set from their environment
/// configuration. It is never inferred.
#[derive(Debug, Clone)]
pub struct ShopifyAppConfig {
    /// The app's public client id. Session tokens must carry this value in their `aud` claim.
    pub client_id: String,
    /// The app's client secret. Used for the shared-secret verification fallback and for the
    /// token-exchange call. Never logged.
    pub client_secret: Secret<String>,
    /// Accept development shop-domain suffixes (tunnel hosts, localhost) in addition to the production
    /// marketplace domain. Only enable this outside production.
    pub allow_dev_domains: bool,
    /// How long a fetched key set may be served from the per-shop cache.
    pub jwks_cache_ttl: Duration,
    /// Network budget for a single key-set fetch.
    pub jwks_timeout: Duration,
    /// Network budget for the token-exchange POST.
    pub exchange_timeout: Duration,
}

impl Default for ShopifyAppConfig {
    fn default() -> Self {
        Self {
            client_id: String::default(),
            client_secret: Secret::default(),
            allow_dev_domains: false,
            jwks_cache_ttl: DEFAULT_JWKS_CACHE_TTL,
            jwks_timeout: DEFAULT_JWKS_TIMEOUT,
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }
}

impl ShopifyAppConfig {
    pub fn new_from_env_or_default() -> Self {
        let client_id = std::env::var("SSG_SHOPIFY_CLIENT_ID").unwrap_or_else(|_| {
            error!("🪛️ SSG_SHOPIFY_CLIENT_ID is not set. Session tokens cannot be validated without it.");
            String::default()
        });
        let client_secret = Secret::new(std::env::var("SSG_SHOPIFY_CLIENT_SECRET").unwrap_or_else(|_| {
            error!("🪛️ SSG_SHOPIFY_CLIENT_SECRET is not set. Token exchange will be rejected upstream.");
            String::default()
        }));
        let allow_dev_domains = match std::env::var("SSG_ENVIRONMENT").map(|s| s.to_lowercase()) {
            Ok(s) if s == "development" || s == "dev" => {
                warn!("🪛️ SSG_ENVIRONMENT is set to development. Development shop domains will be accepted.");
                true
            },
            Ok(s) if s == "production" => false,
            Ok(s) => {
                warn!("🪛️ SSG_ENVIRONMENT has unrecognised value '{s}'. Assuming production.");
                false
            },
            Err(_) => false,
        };
        let jwks_cache_ttl = duration_from_env("SSG_JWKS_CACHE_TTL_SECS", DEFAULT_JWKS_CACHE_TTL);
        let jwks_timeout = duration_from_env("SSG_JWKS_TIMEOUT_SECS", DEFAULT_JWKS_TIMEOUT);
        let exchange_timeout = duration_from_env("SSG_EXCHANGE_TIMEOUT_SECS", DEFAULT_EXCHANGE_TIMEOUT);
        Self { client_id, client_secret, allow_dev_domains, jwks_cache_ttl, jwks_timeout, exchange_timeout }
    }
}

fn duration_from_env(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| {
            s.parse::<u64>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for {var}: {e}. Using the default."))
                .ok()
        })
        .map(Duration::from_secs)
        .unwrap_or(default)
}
