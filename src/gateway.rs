//! HTTP client for the remote `/users` resource.
//!
//! Every call is a single, unretried request. Non-2xx responses are errors.

use reqwest::Client;
use url::Url;

use crate::error::{GatewayError, Operation, Result};
use crate::model::{User, UserFields};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Clone, Debug)]
pub struct UserGateway {
    http: Client,
    users_url: Url,
}

impl UserGateway {
    /// Build a gateway for `<base_url>/users` with a default HTTP client.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let mut users_url = Url::parse(base_url).map_err(|source| GatewayError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        users_url
            .path_segments_mut()
            .map_err(|_| GatewayError::UnsupportedBaseUrl(base_url.to_string()))?
            .pop_if_empty()
            .push("users");
        Ok(Self { http, users_url })
    }

    /// The collection url, e.g. `http://localhost:8080/users`.
    pub fn users_url(&self) -> &Url {
        &self.users_url
    }

    /// Url of a single record; the id is percent-encoded as one path segment.
    pub fn user_url(&self, id: &str) -> Url {
        let mut url = self.users_url.clone();
        // users_url was validated as a base url in `with_client`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        tracing::debug!(url = %self.users_url, "GET users");
        let users: Vec<User> = self
            .http
            .get(self.users_url.clone())
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(GatewayError::transport(Operation::List))?
            .json()
            .await
            .map_err(GatewayError::transport(Operation::List))?;
        tracing::trace!(count = users.len(), "fetched users");
        Ok(users)
    }

    pub async fn create_user(&self, fields: &UserFields) -> Result<User> {
        tracing::debug!(url = %self.users_url, "POST user");
        self.http
            .post(self.users_url.clone())
            .json(fields)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(GatewayError::transport(Operation::Create))?
            .json()
            .await
            .map_err(GatewayError::transport(Operation::Create))
    }

    /// Full-record replacement of the user `id`.
    pub async fn update_user(&self, id: &str, fields: &UserFields) -> Result<User> {
        let url = self.user_url(id);
        tracing::debug!(%url, "PUT user");
        self.http
            .put(url)
            .json(fields)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(GatewayError::transport(Operation::Update))?
            .json()
            .await
            .map_err(GatewayError::transport(Operation::Update))
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let url = self.user_url(id);
        tracing::debug!(%url, "DELETE user");
        self.http
            .delete(url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(GatewayError::transport(Operation::Delete))?;
        Ok(())
    }
}
