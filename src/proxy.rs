//! Cross-origin rule of the chat proxy.
//!
//! A request is accepted when it carries no `Origin`, when the origin is
//! `localhost` / `127.0.0.1` on any port, or when it exactly matches an
//! entry of the allow-list.

use crate::config::ProxyConfig;

#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(config.allowed_origins.clone())
    }

    pub fn allows(&self, origin: Option<&str>) -> bool {
        match origin {
            None => true,
            Some(o) => is_local_origin(o) || self.allowed.iter().any(|a| a == o),
        }
    }
}

fn is_local_origin(origin: &str) -> bool {
    let Some(authority) = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
    else {
        return false;
    };
    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    };
    let port_ok = port.is_none_or(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    matches!(host, "localhost" | "127.0.0.1") && port_ok
}
