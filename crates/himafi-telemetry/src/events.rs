//! Analytics event names and payload types

use serde::Serialize;
use serde_json::{Map, Value};

/// The site's fixed event taxonomy.
pub mod names {
    pub const PAGE_VIEW: &str = "page_view";
    pub const USER_SIGN_IN: &str = "user_sign_in";
    pub const USER_SIGN_OUT: &str = "user_sign_out";
    pub const USER_REGISTER: &str = "user_register";
    pub const CONTENT_VIEW: &str = "content_view";
    pub const CONTENT_SHARE: &str = "content_share";
    pub const CONTENT_SAVE: &str = "content_save";
    pub const OPPORTUNITY_APPLY: &str = "opportunity_apply";
    pub const CLICK: &str = "click";
    pub const SCROLL: &str = "scroll";
    pub const SEARCH: &str = "search";
    pub const FILTER: &str = "filter";
    pub const PAGE_PERFORMANCE: &str = "page_performance";
    pub const ERROR: &str = "error";
}

/// How a user authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Email,
    Google,
    Github,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Email => "email",
            AuthMethod::Google => "google",
            AuthMethod::Github => "github",
        }
    }
}

/// Kind of content being viewed, shared, or saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Article,
    Opportunity,
    Event,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Article => "article",
            ContentKind::Opportunity => "opportunity",
            ContentKind::Event => "event",
        }
    }
}

/// Inputs for a page-view event.
#[derive(Debug, Clone, Default)]
pub struct PageView {
    pub path: String,
    pub title: String,
    pub referrer: Option<String>,
}

/// Navigation-timing millisecond metrics for one page load.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLoadTiming {
    pub dns_lookup: u64,
    pub tcp_connection: u64,
    pub server_response: u64,
    pub dom_load: u64,
    pub total_page_load: u64,
}

/// Host-supplied environment details attached to every analytics event.
#[derive(Debug, Clone)]
pub struct ClientEnvironment {
    pub user_agent: String,
    pub language: String,
    pub screen_resolution: String,
    pub viewport_size: String,
}

impl Default for ClientEnvironment {
    fn default() -> Self {
        let language = std::env::var("LANG")
            .ok()
            .and_then(|lang| lang.split('.').next().map(str::to_string))
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| "en-US".to_string());

        Self {
            user_agent: format!("himafi-client/{}", env!("CARGO_PKG_VERSION")),
            language,
            screen_resolution: "unknown".to_string(),
            viewport_size: "unknown".to_string(),
        }
    }
}

/// The enriched wire payload for one analytics event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    /// Epoch milliseconds
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub session_id: String,
    pub user_agent: String,
    pub language: String,
    pub screen_resolution: String,
    pub viewport_size: String,
}
