use std::{
    env,
    fmt::{self, Debug},
    sync::{Arc, Mutex, RwLock},
};

use log::*;
use shopify_session_engine::config::ShopifyAppConfig;

const DEFAULT_SSG_HOST: &str = "127.0.0.1";
const DEFAULT_SSG_PORT: u16 = 8380;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Credentials and protocol settings for the Shopify app this gateway fronts.
    pub shopify: ShopifyAppConfig,
    /// The public URL the app is served from. Tunnel-based development setups change this at
    /// runtime, so it lives behind [`AppUrl`] rather than in a plain field.
    pub app_url: AppUrl,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SSG_HOST.to_string(),
            port: DEFAULT_SSG_PORT,
            database_url: String::default(),
            shopify: ShopifyAppConfig::default(),
            app_url: AppUrl::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SSG_HOST").ok().unwrap_or_else(|| DEFAULT_SSG_HOST.into());
        let port = env::var("SSG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SSG_PORT. {e} Using the default, {DEFAULT_SSG_PORT}, instead."
                    );
                    DEFAULT_SSG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SSG_PORT);
        let database_url = env::var("SSG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SSG_DATABASE_URL is not set. Please set it to the URL for the session database.");
            String::default()
        });
        let shopify = ShopifyAppConfig::new_from_env_or_default();
        let app_url = AppUrl::new(env::var("SSG_APP_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SSG_APP_URL is not set. The app URL starts out empty until it is replaced.");
            String::default()
        }));
        Self { host, port, database_url, shopify, app_url }
    }
}

type Observer = Box<dyn Fn(&str) + Send + Sync>;

struct AppUrlInner {
    url: RwLock<String>,
    observers: Mutex<Vec<Observer>>,
}

/// Process-wide holder for the app's public URL.
///
/// The URL is only ever read through [`AppUrl::current`] and changed through [`AppUrl::replace`],
/// which notifies every registered observer with the new value. Nothing here touches the process
/// environment. Cheap to clone; clones share the same value and observers.
#[derive(Clone, Default)]
pub struct AppUrl {
    inner: Arc<AppUrlInner>,
}

impl Default for AppUrlInner {
    fn default() -> Self {
        Self { url: RwLock::new(String::new()), observers: Mutex::new(Vec::new()) }
    }
}

impl AppUrl {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self { inner: Arc::new(AppUrlInner { url: RwLock::new(url.into()), observers: Mutex::new(Vec::new()) }) }
    }

    pub fn current(&self) -> String {
        self.inner.url.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replaces the app URL, returning the previous value. Observers are called with the new value
    /// after the swap, outside the URL lock.
    pub fn replace<S: Into<String>>(&self, new_url: S) -> String {
        let new_url = new_url.into();
        let previous = {
            let mut url = self.inner.url.write().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *url, new_url.clone())
        };
        let observers = self.inner.observers.lock().unwrap_or_else(|e| e.into_inner());
        for observer in observers.iter() {
            observer(&new_url);
        }
        previous
    }

    pub fn on_change<F: Fn(&str) + Send + Sync + 'static>(&self, observer: F) {
        self.inner.observers.lock().unwrap_or_else(|e| e.into_inner()).push(Box::new(observer));
    }
}

impl Debug for AppUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AppUrl({})", self.current())
    }
}
