//! Server configuration from environment variables.
//!
//! HOST, PORT, SPIN_DELAY_MS, READY_POLICY (`both-slots` | `any-slot`), SECURE_COOKIES, ADMIN_TOKEN.

use crate::models::ReadyPolicy;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Fixed wheel animation time before a spin is committed.
    pub spin_delay: Duration,
    /// Ready policy given to newly generated brackets.
    pub ready_policy: ReadyPolicy,
    /// Mark the session cookie `Secure` (needs HTTPS).
    pub secure_cookies: bool,
    /// Shared secret required to open an admin session. Unset means any caller may claim a role.
    pub admin_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            spin_delay: Duration::from_millis(default_spin_delay_ms()),
            ready_policy: ReadyPolicy::default(),
            secure_cookies: false,
            admin_token: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_spin_delay_ms() -> u64 {
    1500
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", lookup("PORT"), defaults.port),
            spin_delay: Duration::from_millis(parse_or(
                "SPIN_DELAY_MS",
                lookup("SPIN_DELAY_MS"),
                default_spin_delay_ms(),
            )),
            ready_policy: parse_or("READY_POLICY", lookup("READY_POLICY"), defaults.ready_policy),
            secure_cookies: parse_or("SECURE_COOKIES", lookup("SECURE_COOKIES"), defaults.secure_cookies),
            admin_token: lookup("ADMIN_TOKEN").filter(|t| !t.is_empty()),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {}={:?}, using default", key, value);
            default
        }),
    }
}
