//! Runtime configuration loaded from environment variables.
//!
//! Every setting has a default so the gate starts on a developer machine with
//! an empty environment. The JWT secret default is public and only fit for
//! development; a warning is logged whenever it is in use.
//!
//! # Environment Variables
//!
//! - `GATE_HOST` / `GATE_PORT`: bind address (`127.0.0.1:8080`)
//! - `JWT_SECRET`: HS256 secret shared with the backend
//! - `ACCESS_COOKIE_NAME`: cookie holding the access token (`access_token`)
//! - `UPSTREAM_URL`: page renderer that allowed requests are forwarded to
//! - `ROLE_CHECK_URL`: backend role-check endpoint
//! - `ROLE_POLL_INTERVAL`: role polling period, humantime syntax (`5s`)

use anyhow::{Context, Result};
use std::{env, time::Duration};

use crate::{
    auth::{ACCESS_COOKIE, GuardPolicy, RouteTable, TokenVerifier},
    roles::{DEFAULT_POLL_INTERVAL, HttpRoleFetcher, RoleResolver},
};

/// Fallback secret used when `JWT_SECRET` is not set. Override in deployment.
pub const INSECURE_DEFAULT_SECRET: &str = "insecure-dev-secret-change-me";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub cookie_name: String,
    pub upstream_url: String,
    pub role_check_url: String,
    pub role_poll_interval: Duration,
    pub routes: RouteTable,
}

impl GateConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| {
                    tracing::debug!("{key} not set, using default: {default}");
                    default.to_string()
                })
        };

        let port = get("GATE_PORT", "8080")
            .parse::<u16>()
            .context("GATE_PORT must be a port number")?;

        let role_poll_interval = match lookup("ROLE_POLL_INTERVAL") {
            Some(raw) => humantime::parse_duration(raw.trim())
                .with_context(|| format!("ROLE_POLL_INTERVAL is not a duration: {raw}"))?,
            None => DEFAULT_POLL_INTERVAL,
        };
        anyhow::ensure!(
            !role_poll_interval.is_zero(),
            "ROLE_POLL_INTERVAL must be greater than zero"
        );

        let jwt_secret = get("JWT_SECRET", INSECURE_DEFAULT_SECRET);
        if jwt_secret == INSECURE_DEFAULT_SECRET {
            tracing::warn!("JWT_SECRET not set, using the insecure development default");
        }

        Ok(Self {
            host: get("GATE_HOST", "127.0.0.1"),
            port,
            jwt_secret,
            cookie_name: get("ACCESS_COOKIE_NAME", ACCESS_COOKIE),
            upstream_url: get("UPSTREAM_URL", "http://127.0.0.1:3000"),
            role_check_url: get(
                "ROLE_CHECK_URL",
                "http://127.0.0.1:8000/api/auth/check-role/",
            ),
            role_poll_interval,
            routes: RouteTable::default(),
        })
    }

    pub fn guard_policy(&self) -> GuardPolicy {
        GuardPolicy::new(
            self.routes.clone(),
            TokenVerifier::new(&self.jwt_secret),
            self.cookie_name.clone(),
        )
    }

    /// Fetcher for `ROLE_CHECK_URL`, forwarding the session's Cookie header.
    pub fn role_fetcher(&self, cookie: Option<&str>) -> HttpRoleFetcher {
        let fetcher = HttpRoleFetcher::new(self.role_check_url.clone());
        match cookie {
            Some(cookie) => fetcher.with_cookie(cookie),
            None => fetcher,
        }
    }

    /// Starts a session resolver polling `ROLE_CHECK_URL` every
    /// `ROLE_POLL_INTERVAL`. Must be called inside a tokio runtime.
    pub fn role_resolver(&self, cookie: Option<&str>) -> RoleResolver {
        RoleResolver::start(self.role_fetcher(cookie), self.role_poll_interval)
    }

    pub fn uses_insecure_secret(&self) -> bool {
        self.jwt_secret == INSECURE_DEFAULT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<GateConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GateConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.cookie_name, "access_token");
        assert_eq!(cfg.role_poll_interval, Duration::from_secs(5));
        assert!(cfg.uses_insecure_secret());
        assert_eq!(cfg.routes, RouteTable::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("GATE_PORT", "9090"),
            ("JWT_SECRET", "prod-secret"),
            ("ACCESS_COOKIE_NAME", "canteen_at"),
            ("ROLE_POLL_INTERVAL", "1m 30s"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.cookie_name, "canteen_at");
        assert_eq!(cfg.role_poll_interval, Duration::from_secs(90));
        assert!(!cfg.uses_insecure_secret());
        assert_eq!(cfg.guard_policy().cookie_name(), "canteen_at");
    }

    #[test]
    fn blank_secret_falls_back_to_default() {
        let cfg = config(&[("JWT_SECRET", "  ")]).unwrap();
        assert!(cfg.uses_insecure_secret());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("GATE_PORT", "eighty")]).is_err());
        assert!(config(&[("GATE_PORT", "70000")]).is_err());
        assert!(config(&[("ROLE_POLL_INTERVAL", "often")]).is_err());
        assert!(config(&[("ROLE_POLL_INTERVAL", "0s")]).is_err());
    }

    #[test]
    fn role_fetcher_targets_the_configured_endpoint() {
        let cfg = config(&[("ROLE_CHECK_URL", "https://api.canteen.test/api/auth/check-role/")]).unwrap();
        assert_eq!(
            cfg.role_fetcher(Some("access_token=abc")).url(),
            "https://api.canteen.test/api/auth/check-role/"
        );
        assert_eq!(
            config(&[]).unwrap().role_fetcher(None).url(),
            "http://127.0.0.1:8000/api/auth/check-role/"
        );
    }
}
