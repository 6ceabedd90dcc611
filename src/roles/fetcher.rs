//! Fetching the user's role status from the backend.
//!
//! [`RoleFetcher`] is the seam between the resolver and the network. The
//! production implementation, [`HttpRoleFetcher`], sends a credentialed `GET`
//! to the role-check endpoint by forwarding the browser session's `Cookie`
//! header.

use futures::future::BoxFuture;
use reqwest::{Client, header};

use crate::{error::FetchError, roles::model::UserStatus};

/// Source of [`UserStatus`] snapshots.
pub trait RoleFetcher: Send + Sync + 'static {
    fn fetch(&self) -> BoxFuture<'static, Result<UserStatus, FetchError>>;
}

/// Fetches [`UserStatus`] from the backend role-check endpoint.
#[derive(Debug, Clone)]
pub struct HttpRoleFetcher {
    client: Client,
    url: String,
    cookie: Option<String>,
}

impl HttpRoleFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            cookie: None,
        }
    }

    /// Sets the raw `Cookie` header sent with every request.
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RoleFetcher for HttpRoleFetcher {
    fn fetch(&self) -> BoxFuture<'static, Result<UserStatus, FetchError>> {
        let mut request = self
            .client
            .get(&self.url)
            .header(header::ACCEPT, "application/json");
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let url = self.url.clone();

        Box::pin(async move {
            tracing::debug!(url = %url, "Fetching user role status");

            let res = request.send().await.map_err(|e| {
                tracing::debug!(url = %url, error = ?e, "Role check request failed");
                FetchError::Request(e.to_string())
            })?;

            let status = res.status();
            if !status.is_success() {
                tracing::debug!(
                    url = %url,
                    status_code = %status.as_u16(),
                    "Role check rejected"
                );
                return Err(FetchError::Status(status.as_u16()));
            }

            let body = res
                .bytes()
                .await
                .map_err(|e| FetchError::Request(e.to_string()))?;

            serde_json::from_slice::<UserStatus>(&body).map_err(|e| {
                tracing::debug!(url = %url, error = %e, "Role check body did not parse");
                FetchError::Parse(e.to_string())
            })
        })
    }
}
