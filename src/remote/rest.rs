//! Hosted REST store client
//!
//! Talks to a PostgREST-style endpoint (`/rest/v1/<table>`) with the
//! project key and the signed-in user's bearer token. Row ownership is
//! enforced server side; `user_id` filters are sent anyway so a misconfigured
//! policy never leaks rows into the local collection.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{FetchOrder, RemoteStore};
use crate::bookmark::{Bookmark, NewBookmark, VisitUpdate};
use crate::config::Config;
use crate::error::RemoteError;

/// Error codes meaning "the column or sort you asked for is not there"
const SCHEMA_ERROR_CODES: &[&str] = &["42703", "PGRST100", "PGRST204"];

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct RestStore {
    client: Client,
    base_url: String,
    table: String,
    api_key: String,
    access_token: String,
    user_id: String,
}

impl RestStore {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.store_url.trim_end_matches('/').to_string(),
            table: config.table.clone(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
            user_id: config.user_id.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, self.endpoint())
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.access_token))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::RequestFailed(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = classify_error(status, &body);
        warn!("⚠️  Store rejected request: {}", error);
        Err(error)
    }
}

/// Map a rejected response to a typed error by its error code, never by message text
fn classify_error(status: StatusCode, body: &str) -> RemoteError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { code: Some(code), message }) if SCHEMA_ERROR_CODES.contains(&code.as_str()) => {
            RemoteError::SchemaUnavailable(message.unwrap_or(code))
        }
        _ => RemoteError::RequestFailed(format!("{} - {}", status, body)),
    }
}

impl RemoteStore for RestStore {
    async fn select_all(&self, order: FetchOrder) -> Result<Vec<Bookmark>, RemoteError> {
        debug!("GET {} order={}", self.endpoint(), order.clause());

        let owner = format!("eq.{}", self.user_id);
        let builder = self.request(Method::GET).query(&[
            ("select", "*"),
            ("user_id", owner.as_str()),
            ("order", order.clause()),
        ]);

        let rows: Vec<Bookmark> = self
            .send(builder)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::RequestFailed(format!("Failed to parse rows: {}", e)))?;

        info!("📖 Fetched {} bookmarks", rows.len());
        Ok(rows)
    }

    async fn insert(&self, bookmark: NewBookmark) -> Result<Bookmark, RemoteError> {
        let builder = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(&bookmark);

        let rows: Vec<Bookmark> = self
            .send(builder)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::RequestFailed(format!("Failed to parse inserted row: {}", e)))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::RequestFailed("insert returned no row".to_string()))
    }

    async fn update(&self, id: &str, fields: VisitUpdate) -> Result<(), RemoteError> {
        let target = format!("eq.{}", id);
        let builder = self
            .request(Method::PATCH)
            .query(&[("id", target.as_str())])
            .json(&fields);

        self.send(builder).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        let target = format!("eq.{}", id);
        let builder = self
            .request(Method::DELETE)
            .query(&[("id", target.as_str())]);

        self.send(builder).await?;
        Ok(())
    }
}
