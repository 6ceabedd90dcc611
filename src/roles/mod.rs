//! Client role/permission resolver and the backend documents it caches.

pub mod fetcher;
pub mod model;
pub mod resolver;

pub use fetcher::{HttpRoleFetcher, RoleFetcher};
pub use model::{Permission, Profile, Role, UserStatus};
pub use resolver::{DEFAULT_POLL_INTERVAL, RoleResolver};
