//! Small helpers for working with shop domains and token material.

use regex::Regex;
use reqwest::Url;

/// Development-only hostname suffixes. These are only consulted when the explicit `allow_dev_domains`
/// configuration flag is set.
const DEV_DOMAIN_SUFFIXES: [&str; 4] = [".trycloudflare.com", ".ngrok.io", ".ngrok-free.app", ".myshopify.io"];

/// Extracts the hostname from a URL-valued claim. The scheme is optional, so both
/// `https://shop.myshopify.com/admin` and `shop.myshopify.com` resolve to `shop.myshopify.com`.
pub fn extract_hostname(value: &str) -> Option<String> {
    let candidate =
        if value.contains("://") { value.to_string() } else { format!("https://{}", value.trim_end_matches('/')) };
    Url::parse(&candidate).ok().and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

/// Checks a hostname against the accepted shop-domain suffix patterns.
///
/// The production marketplace suffix (`*.myshopify.com`) is always accepted. Tunnel and localhost
/// suffixes are accepted only when `allow_dev_domains` is set.
pub fn is_accepted_shop_domain(hostname: &str, allow_dev_domains: bool) -> bool {
    let production = Regex::new(r"^[a-z0-9][a-z0-9\-]*\.myshopify\.com$").unwrap();
    if production.is_match(hostname) {
        return true;
    }
    if !allow_dev_domains {
        return false;
    }
    hostname == "localhost" || DEV_DOMAIN_SUFFIXES.iter().any(|suffix| hostname.ends_with(suffix))
}
