//! Typed client for the site's REST endpoints
//!
//! Thin wrappers over the JSON API: every call unwraps the
//! `{ success, data, error }` envelope and surfaces the server's error
//! message. Failures are additionally reported through the telemetry
//! logger when one is attached.

use std::time::Duration;

use himafi_telemetry::{ErrorContext, ErrorDetail, Logger};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::constants::api;
use crate::model::{
    Alumni, ApiResponse, Article, CareerStats, Comment, ContactForm, Event, Favorite,
    FavoriteKind, MentorshipForm, NewAlumni, NewArticle, NewComment, NewEvent, NewOpportunity,
    Opportunity,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("response was missing its data payload")]
    MissingData,
}

pub type ApiResult<T> = Result<T, ApiError>;

pub struct ApiClient {
    base_url: String,
    client: Client,
    token: Option<String>,
    logger: Option<Logger>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(api::TIMEOUT_MS))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            token: None,
            logger: None,
        }
    }

    /// Base URL from `HIMAFI_API_URL`, falling back to the local default.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("HIMAFI_API_URL").unwrap_or_else(|_| api::BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Report request failures through this logger.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ApiResult<ApiResponse<T>> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let result = async {
            let response = request.send().await?;
            let status = response.status();
            let envelope: ApiResponse<T> = response.json().await?;
            if !status.is_success() || !envelope.success {
                return Err(ApiError::Api {
                    status,
                    message: envelope
                        .error
                        .unwrap_or_else(|| "An error occurred".to_string()),
                });
            }
            Ok(envelope)
        }
        .await;

        if let Err(err) = &result {
            self.report_failure(path, err);
        }
        result
    }

    fn report_failure(&self, path: &str, err: &ApiError) {
        if let Some(logger) = &self.logger {
            logger.error(
                ErrorDetail::new(err.to_string()),
                Some(ErrorContext::for_action("api_request").with_path(path)),
            );
        } else {
            tracing::warn!(path, error = %err, "api request failed");
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(Method::GET, path, None)
            .await?
            .data
            .ok_or(ApiError::MissingData)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, Some(body))
            .await?
            .data
            .ok_or(ApiError::MissingData)
    }

    async fn put<T: DeserializeOwned>(&self, path: &str, body: Value) -> ApiResult<T> {
        self.send(Method::PUT, path, Some(body))
            .await?
            .data
            .ok_or(ApiError::MissingData)
    }

    /// For endpoints whose success response carries no data payload.
    async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> ApiResult<()> {
        let body = serde_json::to_value(body)?;
        self.send::<Value>(Method::POST, path, Some(body)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send::<Value>(Method::DELETE, path, None).await?;
        Ok(())
    }

    // Opportunities

    pub async fn opportunities(&self) -> ApiResult<Vec<Opportunity>> {
        self.get("/opportunities").await
    }

    pub async fn opportunity(&self, id: &str) -> ApiResult<Opportunity> {
        self.get(&format!("/opportunities/{id}")).await
    }

    pub async fn create_opportunity(&self, draft: &NewOpportunity) -> ApiResult<Opportunity> {
        self.post("/opportunities", draft).await
    }

    pub async fn update_opportunity(&self, id: &str, patch: Value) -> ApiResult<Opportunity> {
        self.put(&format!("/opportunities/{id}"), patch).await
    }

    pub async fn delete_opportunity(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/opportunities/{id}")).await
    }

    // Articles

    pub async fn articles(&self) -> ApiResult<Vec<Article>> {
        self.get("/articles").await
    }

    pub async fn article(&self, id: &str) -> ApiResult<Article> {
        self.get(&format!("/articles/{id}")).await
    }

    pub async fn create_article(&self, draft: &NewArticle) -> ApiResult<Article> {
        self.post("/articles", draft).await
    }

    pub async fn update_article(&self, id: &str, patch: Value) -> ApiResult<Article> {
        self.put(&format!("/articles/{id}"), patch).await
    }

    pub async fn delete_article(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/articles/{id}")).await
    }

    // Alumni

    pub async fn alumni(&self) -> ApiResult<Vec<Alumni>> {
        self.get("/alumni").await
    }

    pub async fn alumni_profile(&self, id: &str) -> ApiResult<Alumni> {
        self.get(&format!("/alumni/{id}")).await
    }

    pub async fn create_alumni_profile(&self, draft: &NewAlumni) -> ApiResult<Alumni> {
        self.post("/alumni", draft).await
    }

    pub async fn update_alumni_profile(&self, id: &str, patch: Value) -> ApiResult<Alumni> {
        self.put(&format!("/alumni/{id}"), patch).await
    }

    pub async fn delete_alumni_profile(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/alumni/{id}")).await
    }

    pub async fn career_stats(&self) -> ApiResult<CareerStats> {
        self.get("/alumni/stats").await
    }

    // Events

    pub async fn events(&self) -> ApiResult<Vec<Event>> {
        self.get("/events").await
    }

    pub async fn event(&self, id: &str) -> ApiResult<Event> {
        self.get(&format!("/events/{id}")).await
    }

    pub async fn create_event(&self, draft: &NewEvent) -> ApiResult<Event> {
        self.post("/events", draft).await
    }

    pub async fn update_event(&self, id: &str, patch: Value) -> ApiResult<Event> {
        self.put(&format!("/events/{id}"), patch).await
    }

    pub async fn delete_event(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/events/{id}")).await
    }

    // Comments

    /// List comments for an article or an opportunity; the article wins if
    /// both are given.
    pub async fn comments(
        &self,
        article_id: Option<&str>,
        opportunity_id: Option<&str>,
    ) -> ApiResult<Vec<Comment>> {
        let query = if let Some(article_id) = article_id {
            format!("?articleId={article_id}")
        } else if let Some(opportunity_id) = opportunity_id {
            format!("?opportunityId={opportunity_id}")
        } else {
            String::new()
        };
        self.get(&format!("/comments{query}")).await
    }

    pub async fn create_comment(&self, draft: &NewComment) -> ApiResult<Comment> {
        self.post("/comments", draft).await
    }

    pub async fn delete_comment(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/comments/{id}")).await
    }

    // Forms

    pub async fn submit_contact_form(&self, form: &ContactForm) -> ApiResult<()> {
        self.post_unit("/contact", form).await
    }

    pub async fn submit_mentorship_request(&self, form: &MentorshipForm) -> ApiResult<()> {
        self.post_unit("/mentorship", form).await
    }

    pub async fn subscribe_to_newsletter(&self, email: &str) -> ApiResult<()> {
        self.post_unit("/newsletter/subscribe", &serde_json::json!({ "email": email }))
            .await
    }

    // Favorites

    pub async fn favorites(&self) -> ApiResult<Vec<Favorite>> {
        self.get("/favorites").await
    }

    pub async fn add_to_favorites(&self, item_id: &str, kind: FavoriteKind) -> ApiResult<()> {
        self.post_unit(
            "/favorites",
            &serde_json::json!({ "itemId": item_id, "type": kind.as_str() }),
        )
        .await
    }

    pub async fn remove_from_favorites(&self, item_id: &str) -> ApiResult<()> {
        self.delete(&format!("/favorites/{item_id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn trailing_slash_is_normalized() {
        let client = ApiClient::new("http://localhost:3000/api/");
        assert_eq!(client.base_url, "http://localhost:3000/api");
    }

    #[test]
    #[serial]
    fn from_env_respects_override() {
        let original = std::env::var("HIMAFI_API_URL").ok();

        std::env::set_var("HIMAFI_API_URL", "https://api.himafi.example.org/v1");
        let client = ApiClient::from_env();
        assert_eq!(client.base_url, "https://api.himafi.example.org/v1");

        std::env::remove_var("HIMAFI_API_URL");
        let client = ApiClient::from_env();
        assert_eq!(client.base_url, api::BASE_URL);

        if let Some(val) = original {
            std::env::set_var("HIMAFI_API_URL", val);
        }
    }
}
