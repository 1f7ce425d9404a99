//! Mirror service HTTP client (reqwest-based).

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use tracing::debug;

use groupcast_core::error::MirrorError;
use groupcast_core::model::MirrorGroup;
use groupcast_core::ports::MirrorPort;

use crate::models::{WireMirrorGroup, WireServiceError};

/// Application error code the mirror uses for "group does not exist".
///
/// The service sends this inside a JSON error body, usually under a generic
/// 5xx status rather than a 404. The error code is authoritative; the
/// transport status is not. Do not "fix" this by trusting the status instead,
/// or behavior diverges from the deployed service.
const ERR_DOES_NOT_EXIST: &str = "ERR_DOES_NOT_EXIST";

/// Value sent on the status ping.
const STATUS_EXPECTING: &str = "data-store";

/// HTTP client for the downstream mirror service.
///
/// Every request carries the acting user as a `user` query parameter. The
/// underlying `reqwest::Client` is injected by the caller and shared.
#[derive(Debug, Clone)]
pub struct MirrorClient {
    http: Client,
    base_url: String,
    acting_user: String,
}

impl MirrorClient {
    pub fn new(http: Client, base_url: impl Into<String>, acting_user: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            acting_user: acting_user.into(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn group_url(&self, name: &str) -> String {
        format!("{}/groups/{}", self.base_url, urlencoding::encode(name))
    }

    fn builder(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .query(&[("user", self.acting_user.as_str())])
    }

    /// Send a request and decode the success body, translating the mirror's
    /// error-code convention on failure.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        target: &str,
        builder: RequestBuilder,
    ) -> Result<T, MirrorError> {
        let response = builder.send().await.map_err(|e| MirrorError::Transport {
            operation,
            target: target.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| MirrorError::Decode {
                operation,
                target: target.to_string(),
                message: e.to_string(),
            });
        }

        Err(self.translate_failure(operation, target, status.as_u16(), response).await)
    }

    /// Like [`Self::execute`] but for endpoints whose success body is
    /// irrelevant (delete, status ping).
    async fn execute_no_body(
        &self,
        operation: &'static str,
        target: &str,
        builder: RequestBuilder,
    ) -> Result<(), MirrorError> {
        let response = builder.send().await.map_err(|e| MirrorError::Transport {
            operation,
            target: target.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(self.translate_failure(operation, target, status.as_u16(), response).await)
    }

    async fn translate_failure(
        &self,
        operation: &'static str,
        target: &str,
        status: u16,
        response: reqwest::Response,
    ) -> MirrorError {
        let body = response.text().await.unwrap_or_default();
        let code = serde_json::from_str::<WireServiceError>(&body)
            .ok()
            .and_then(|e| e.error_code);

        debug!(operation, target, status, code = code.as_deref(), "mirror request failed");

        if code.as_deref() == Some(ERR_DOES_NOT_EXIST) {
            return MirrorError::NotFound(target.to_string());
        }

        MirrorError::Api {
            operation,
            target: target.to_string(),
            status,
            code,
        }
    }
}

#[async_trait]
impl MirrorPort for MirrorClient {
    async fn members(&self, name: &str) -> Result<BTreeSet<String>, MirrorError> {
        let url = self.group_url(name);
        let wire: WireMirrorGroup = self
            .execute("probe", name, self.builder(Method::GET, &url))
            .await?;
        Ok(wire.into_group(name).members)
    }

    async fn create(
        &self,
        name: &str,
        members: &BTreeSet<String>,
    ) -> Result<MirrorGroup, MirrorError> {
        let url = format!("{}/groups", self.base_url);
        let payload = WireMirrorGroup::create_payload(name, members);
        let wire: WireMirrorGroup = self
            .execute(
                "create",
                name,
                self.builder(Method::POST, &url).json(&payload),
            )
            .await?;
        Ok(wire.into_group(name))
    }

    async fn replace_members(
        &self,
        name: &str,
        members: &BTreeSet<String>,
    ) -> Result<MirrorGroup, MirrorError> {
        let url = self.group_url(name);
        let payload = WireMirrorGroup::replace_payload(members);
        let wire: WireMirrorGroup = self
            .execute(
                "replace members",
                name,
                self.builder(Method::PUT, &url).json(&payload),
            )
            .await?;
        Ok(wire.into_group(name))
    }

    async fn delete(&self, name: &str) -> Result<(), MirrorError> {
        let url = self.group_url(name);
        self.execute_no_body("delete", name, self.builder(Method::DELETE, &url))
            .await
    }

    async fn check(&self) -> Result<(), MirrorError> {
        let url = format!("{}/?expecting={}", self.base_url, STATUS_EXPECTING);
        self.execute_no_body("status check", STATUS_EXPECTING, self.http.get(&url))
            .await
    }
}
