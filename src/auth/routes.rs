//! Route classification table.
//!
//! Every request path falls into exactly one [`RouteClass`]. The checks run
//! in a fixed order: static-asset paths and prefixes, then exact public
//! paths, then the admin prefix. Anything left over is
//! [`RouteClass::Protected`].
//!
//! Paths are compared as given. Callers classify the canonical form from
//! [`canonical_path`](crate::auth::path::canonical_path).

use serde::{Deserialize, Serialize};

/// Which access rule applies to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// Framework assets, images, uploads. Never checked.
    StaticAsset,
    /// Pages reachable without logging in.
    Public,
    /// Under the admin prefix; needs `is_staff` or `is_superuser`.
    AdminRestricted,
    /// Everything else; needs any valid token.
    Protected,
}

impl RouteClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaticAsset => "static_asset",
            Self::Public => "public",
            Self::AdminRestricted => "admin_restricted",
            Self::Protected => "protected",
        }
    }
}

/// Path table plus the two redirect targets the guard may send users to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    /// Matched with `starts_with`.
    pub static_prefixes: Vec<String>,
    /// Matched exactly, for gate-owned endpoints such as `/healthz`.
    pub static_paths: Vec<String>,
    /// Matched exactly. `/login/loading` is not covered by `/login`.
    pub public_paths: Vec<String>,
    /// Matched with `starts_with`.
    pub admin_prefix: String,
    pub login_path: String,
    pub home_path: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            static_prefixes: ["/_next", "/favicon.ico", "/logo", "/images", "/uploads"]
                .into_iter()
                .map(String::from)
                .collect(),
            static_paths: vec!["/healthz".to_string()],
            public_paths: ["/", "/login", "/signup", "/change-password"]
                .into_iter()
                .map(String::from)
                .collect(),
            admin_prefix: "/admin".to_string(),
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
        }
    }
}

impl RouteTable {
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.static_paths.iter().any(|p| p == path)
            || self
                .static_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
        {
            RouteClass::StaticAsset
        } else if self.public_paths.iter().any(|public| public == path) {
            RouteClass::Public
        } else if path.starts_with(self.admin_prefix.as_str()) {
            RouteClass::AdminRestricted
        } else {
            RouteClass::Protected
        }
    }
}
