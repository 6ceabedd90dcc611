//! Route guard decision logic.
//!
//! [`GuardPolicy::evaluate`] is the whole authorization rule for page requests.
//! It is a pure function of the path and the access-token cookie, and every
//! path through it ends in one of the three [`GuardDecision`] variants. There
//! is no error case. Anything that goes wrong while reading the token sends
//! the user to the login page.
//!
//! The path is canonicalized before it is classified, so dot segments,
//! encoded letters and repeated slashes cannot move a request out of the
//! admin area. A path with no canonical form is treated like a missing token.
//!
//! Only the admin prefix is privilege-checked here. Other staff areas are
//! gated by the rendering layer using the role resolver.

use crate::{
    auth::{
        path::canonical_path,
        routes::{RouteClass, RouteTable},
        token::{AccessClaims, TokenVerifier},
    },
    error::TokenError,
};

/// Default name of the cookie carrying the access token.
pub const ACCESS_COOKIE: &str = "access_token";

/// Outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Let the request through. Carries the verified claims when a token was
    /// checked (not for static assets or public pages).
    Allow(Option<AccessClaims>),
    /// No usable token.
    RedirectToLogin,
    /// Authenticated, but not allowed into the admin area.
    RedirectToHome,
}

impl GuardDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow(_) => "allow",
            Self::RedirectToLogin => "redirect_login",
            Self::RedirectToHome => "redirect_home",
        }
    }
}

/// Route table, token verifier and cookie name, shared by all workers.
#[derive(Debug, Clone)]
pub struct GuardPolicy {
    routes: RouteTable,
    verifier: TokenVerifier,
    cookie_name: String,
}

impl GuardPolicy {
    pub fn new(routes: RouteTable, verifier: TokenVerifier, cookie_name: impl Into<String>) -> Self {
        Self {
            routes,
            verifier,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Where a redirect decision sends the browser. `None` for `Allow`.
    pub fn redirect_location(&self, decision: &GuardDecision) -> Option<&str> {
        match decision {
            GuardDecision::Allow(_) => None,
            GuardDecision::RedirectToLogin => Some(self.routes.login_path.as_str()),
            GuardDecision::RedirectToHome => Some(self.routes.home_path.as_str()),
        }
    }

    /// Class of the canonical form of `path`, or `None` when it has none.
    pub fn classify(&self, path: &str) -> Option<RouteClass> {
        canonical_path(path).map(|canonical| self.routes.classify(&canonical))
    }

    /// Decides what happens to a request for `path` carrying `token`.
    ///
    /// `path` is the raw request path; it is canonicalized here.
    pub fn evaluate(&self, path: &str, token: Option<&str>) -> GuardDecision {
        let Some(canonical) = canonical_path(path) else {
            tracing::warn!(path = %path, "Path has no canonical form, redirecting to login");
            return GuardDecision::RedirectToLogin;
        };
        let path = canonical.as_str();
        let class = self.routes.classify(path);
        if matches!(class, RouteClass::StaticAsset | RouteClass::Public) {
            return GuardDecision::Allow(None);
        }

        let claims = match token.ok_or(TokenError::Missing).and_then(|t| self.verifier.verify(t)) {
            Ok(claims) => claims,
            Err(TokenError::Missing) => {
                tracing::debug!(path = %path, "No access token, redirecting to login");
                return GuardDecision::RedirectToLogin;
            }
            Err(e) => {
                tracing::warn!(path = %path, reason = %e, "Rejected access token");
                return GuardDecision::RedirectToLogin;
            }
        };

        if class == RouteClass::AdminRestricted && !claims.is_privileged() {
            tracing::info!(
                path = %path,
                user_id = ?claims.user_id,
                "Non-staff user denied admin area"
            );
            return GuardDecision::RedirectToHome;
        }

        GuardDecision::Allow(Some(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header};

    const SECRET: &str = "guard-secret";

    fn policy() -> GuardPolicy {
        GuardPolicy::new(RouteTable::default(), TokenVerifier::new(SECRET), ACCESS_COOKIE)
    }

    fn token(is_staff: bool, is_superuser: bool, exp_offset: i64) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            &serde_json::json!({
                "is_staff": is_staff,
                "is_superuser": is_superuser,
                "exp": Utc::now().timestamp() + exp_offset,
            }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("failed to encode jwt")
    }

    #[test]
    fn static_and_public_paths_ignore_the_token() {
        let policy = policy();
        for token in [None, Some("garbage"), Some("")] {
            assert_eq!(policy.evaluate("/images/logo.png", token), GuardDecision::Allow(None));
            assert_eq!(policy.evaluate("/login", token), GuardDecision::Allow(None));
        }
    }

    #[test]
    fn protected_paths_fail_closed() {
        let policy = policy();
        let expired = token(true, true, -1);
        for bad in [None, Some(""), Some("garbage"), Some(expired.as_str())] {
            assert_eq!(policy.evaluate("/cart", bad), GuardDecision::RedirectToLogin);
            assert_eq!(policy.evaluate("/admin/orders", bad), GuardDecision::RedirectToLogin);
            assert_eq!(policy.evaluate("/login/loading", bad), GuardDecision::RedirectToLogin);
        }
    }

    #[test]
    fn admin_area_needs_a_privilege_claim() {
        let policy = policy();
        let plain = token(false, false, 600);
        assert_eq!(policy.evaluate("/admin/orders", Some(&plain)), GuardDecision::RedirectToHome);
        assert!(matches!(policy.evaluate("/cart", Some(&plain)), GuardDecision::Allow(Some(_))));

        for privileged in [token(true, false, 600), token(false, true, 600)] {
            assert!(matches!(
                policy.evaluate("/admin/orders", Some(&privileged)),
                GuardDecision::Allow(Some(_))
            ));
        }
    }

    #[test]
    fn redirect_locations_follow_the_table() {
        let policy = policy();
        assert_eq!(policy.redirect_location(&GuardDecision::RedirectToLogin), Some("/login"));
        assert_eq!(policy.redirect_location(&GuardDecision::RedirectToHome), Some("/"));
        assert_eq!(policy.redirect_location(&GuardDecision::Allow(None)), None);
    }

    #[test]
    fn disguised_admin_paths_are_still_admin() {
        let policy = policy();
        let plain = token(false, false, 600);
        for path in [
            "/images/../admin/orders",
            "/images/%2e%2e/admin/orders",
            "/_next/./../admin",
            "/%61dmin/orders",
            "//admin/orders",
        ] {
            assert_eq!(policy.classify(path), Some(RouteClass::AdminRestricted), "path {path}");
            assert_eq!(policy.evaluate(path, None), GuardDecision::RedirectToLogin, "path {path}");
            assert_eq!(
                policy.evaluate(path, Some(&plain)),
                GuardDecision::RedirectToHome,
                "path {path}"
            );
        }
    }

    #[test]
    fn paths_without_canonical_form_fail_closed() {
        let policy = policy();
        let staff = token(true, true, 600);
        for path in ["/images/..%2Fadmin", "/images\\..\\admin", "/admin%00", "/images/%zz"] {
            assert_eq!(policy.classify(path), None, "path {path}");
            assert_eq!(
                policy.evaluate(path, Some(&staff)),
                GuardDecision::RedirectToLogin,
                "path {path}"
            );
        }
    }

    #[test]
    fn dot_segments_inside_static_area_stay_static() {
        let policy = policy();
        assert_eq!(policy.evaluate("/images/./logo.png", None), GuardDecision::Allow(None));
        assert_eq!(policy.evaluate("/cart/../login", None), GuardDecision::Allow(None));
    }
}
