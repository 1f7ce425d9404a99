//! Directory service HTTP client (reqwest-based).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use groupcast_core::error::DirectoryError;
use groupcast_core::model::{DirectoryGroup, DirectoryMember};
use groupcast_core::ports::DirectoryPort;

use crate::models::{WireGroup, WireGroupList, WireMemberList};

/// Value sent on the status ping so the remote side can confirm we reached
/// the service we think we reached.
const STATUS_EXPECTING: &str = "groups";

/// HTTP client for the upstream directory service.
///
/// Every request carries the acting user as a `user` query parameter; the
/// directory evaluates visibility against that account. The underlying
/// `reqwest::Client` is constructed by the caller (with its timeout) and
/// injected, so all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: Client,
    base_url: String,
    acting_user: String,
}

impl DirectoryClient {
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

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        target: &str,
        url: String,
        extra_query: &[(&str, &str)],
    ) -> Result<T, DirectoryError> {
        debug!(%url, operation, "directory GET");
        let mut query: Vec<(&str, &str)> = extra_query.to_vec();
        query.push(("user", self.acting_user.as_str()));

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| DirectoryError::Transport {
                operation,
                target: target.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound(target.to_string()));
        }
        if !status.is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                operation,
                target: target.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| DirectoryError::Decode {
                operation,
                target: target.to_string(),
                message: e.to_string(),
            })
    }

    fn group_url(&self, segments: &[&str]) -> String {
        let mut url = format!("{}/groups", self.base_url);
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }
}

#[async_trait]
impl DirectoryPort for DirectoryClient {
    async fn group_by_id(&self, id: &str) -> Result<DirectoryGroup, DirectoryError> {
        let url = self.group_url(&["id", id]);
        let wire: WireGroup = self.get_json("fetch group", id, url, &[]).await?;
        Ok(wire.into())
    }

    async fn group_by_name(&self, name: &str) -> Result<DirectoryGroup, DirectoryError> {
        let url = self.group_url(&[name]);
        let wire: WireGroup = self.get_json("fetch group", name, url, &[]).await?;
        Ok(wire.into())
    }

    async fn groups_by_prefix(
        &self,
        prefix: &str,
        folder: &str,
    ) -> Result<Vec<DirectoryGroup>, DirectoryError> {
        let url = format!("{}/groups", self.base_url);
        let query: Vec<(&str, &str)> = if folder.is_empty() {
            vec![("search", prefix)]
        } else {
            vec![("search", prefix), ("folder", folder)]
        };
        let wire: WireGroupList = self
            .get_json("list groups", prefix, url, &query)
            .await?;
        Ok(wire.groups.into_iter().map(Into::into).collect())
    }

    async fn group_members(&self, name: &str) -> Result<Vec<DirectoryMember>, DirectoryError> {
        let url = self.group_url(&[name, "members"]);
        let wire: WireMemberList = self.get_json("fetch members", name, url, &[]).await?;
        Ok(wire.members.into_iter().map(Into::into).collect())
    }

    async fn check(&self) -> Result<(), DirectoryError> {
        let url = format!("{}/?expecting={}", self.base_url, STATUS_EXPECTING);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| DirectoryError::Transport {
                operation: "status check",
                target: STATUS_EXPECTING.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                operation: "status check",
                target: STATUS_EXPECTING.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
