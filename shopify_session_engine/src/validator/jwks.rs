//! Fetching and caching of shop key sets (JWKS).
//!
//! Each shop publishes its signing keys at `https://{shop}/.well-known/jwks.json` and may rotate them
//! independently of other shops, so key sets are cached per shop hostname. Entries past their TTL are
//! never served; the next validation refetches. The network fetch happens outside the cache lock, so a
//! refresh for one shop does not block validation for another.

use std::{collections::HashMap, sync::Arc, time::Duration};

use log::*;
use serde::Deserialize;
use tokio::{sync::RwLock, time::Instant};

use crate::{db_types::ShopDomain, validator::ValidationError};

/// A single public signing key from a shop's key set.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonWebKey {
    pub kty: String,
    pub kid: Option<String>,
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    pub alg: Option<String>,
    /// RSA modulus, base64url.
    pub n: Option<String>,
    /// RSA public exponent, base64url.
    pub e: Option<String>,
}

/// A shop's published key set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    pub fn find(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}

/// Retrieves a shop's key set. The production implementation is [`HttpKeySetFetcher`]; tests substitute
/// their own.
#[allow(async_fn_in_trait)]
pub trait KeySetFetcher {
    async fn fetch(&self, shop: &ShopDomain) -> Result<JsonWebKeySet, ValidationError>;
}

/// Fetches key sets over HTTPS with a bounded timeout.
#[derive(Clone)]
pub struct HttpKeySetFetcher {
    client: reqwest::Client,
}

impl HttpKeySetFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ValidationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ValidationError::KeySetFetchError(e.to_string()))?;
        Ok(Self { client })
    }
}

impl KeySetFetcher for HttpKeySetFetcher {
    async fn fetch(&self, shop: &ShopDomain) -> Result<JsonWebKeySet, ValidationError> {
        let url = format!("https://{shop}/.well-known/jwks.json");
        trace!("🌍️ Fetching key set from {url}");
        let response =
            self.client.get(&url).send().await.map_err(|e| ValidationError::KeySetFetchError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ValidationError::KeySetFetchError(format!(
                "key-set endpoint for {shop} returned {}",
                response.status()
            )));
        }
        let key_set = response
            .json::<JsonWebKeySet>()
            .await
            .map_err(|e| ValidationError::KeySetFetchError(format!("malformed key-set document: {e}")))?;
        debug!("🌍️ Fetched {} key(s) for {shop}", key_set.keys.len());
        Ok(key_set)
    }
}

struct CachedKeySet {
    fetched_at: Instant,
    key_set: JsonWebKeySet,
}

/// Process-wide, per-shop key-set cache. Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct JwksCache {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, CachedKeySet>>>,
}

impl JwksCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Returns the cached key set for the shop, or `None` on a miss or an expired entry.
    pub async fn get(&self, shop: &ShopDomain) -> Option<JsonWebKeySet> {
        let entries = self.entries.read().await;
        let entry = entries.get(shop.as_str())?;
        if entry.fetched_at.elapsed() >= self.ttl {
            trace!("🔐️ Cached key set for {shop} has expired");
            return None;
        }
        Some(entry.key_set.clone())
    }

    pub async fn put(&self, shop: &ShopDomain, key_set: JsonWebKeySet) {
        let mut entries = self.entries.write().await;
        entries.insert(shop.as_str().to_string(), CachedKeySet { fetched_at: Instant::now(), key_set });
    }
}
