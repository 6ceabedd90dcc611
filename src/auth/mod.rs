//! Edge route guard: token verification, route classification, and the
//! middleware that turns both into allow/redirect decisions.

pub mod guard;
pub mod middleware;
pub mod path;
pub mod routes;
pub mod token;

pub use guard::{ACCESS_COOKIE, GuardDecision, GuardPolicy};
pub use middleware::{RouteGuard, RouteGuardService};
pub use path::canonical_path;
pub use routes::{RouteClass, RouteTable};
pub use token::{AccessClaims, TokenVerifier};
