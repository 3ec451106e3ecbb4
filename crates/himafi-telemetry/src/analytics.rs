//! Analytics event collection and forwarding
//!
//! Events tracked before `init` are buffered in arrival order and replayed
//! once the collector is ready. After that every event is sent immediately
//! and independently; there is no batching and no retry.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::TelemetryConfig;
use crate::events::{
    names, AuthMethod, ClientEnvironment, ContentKind, EventPayload, PageLoadTiming, PageView,
};
use crate::records::{ErrorContext, ErrorDetail};
use crate::transport::{HttpTransport, Transport};

/// Analytics event collector for the career portal front end.
///
/// Cheap to clone; all clones share one session and one pre-init buffer.
#[derive(Clone)]
pub struct Analytics {
    inner: Arc<AnalyticsInner>,
}

struct AnalyticsInner {
    config: TelemetryConfig,
    transport: Arc<dyn Transport>,
    session_id: String,
    environment: ClientEnvironment,
    state: Mutex<CollectorState>,
}

#[derive(Default)]
struct CollectorState {
    initialized: bool,
    user_id: Option<String>,
    pending: Vec<(String, Option<Map<String, Value>>)>,
    scroll_depth: u32,
}

impl Analytics {
    pub fn new(config: TelemetryConfig, environment: ClientEnvironment) -> Self {
        let transport = Arc::new(HttpTransport::new(&config));
        Self::with_transport(config, environment, transport)
    }

    /// Construct with an injected transport (tests, alternative sinks).
    pub fn with_transport(
        config: TelemetryConfig,
        environment: ClientEnvironment,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: Arc::new(AnalyticsInner {
                config,
                transport,
                session_id: Uuid::new_v4().to_string(),
                environment,
                state: Mutex::new(CollectorState::default()),
            }),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.config.enabled
    }

    /// Mark the collector ready and replay events tracked before readiness,
    /// in arrival order.
    pub fn init(&self, user_id: Option<String>) {
        if !self.inner.config.enabled {
            return;
        }

        let pending = {
            let mut state = self.inner.state.lock().unwrap();
            state.initialized = true;
            state.user_id = user_id;
            std::mem::take(&mut state.pending)
        };

        for (name, properties) in pending {
            self.send(name, properties);
        }

        if self.inner.config.debug {
            eprintln!(
                "Analytics initialized (session {})",
                self.inner.session_id
            );
        }
    }

    /// Track a named event with optional structured properties.
    ///
    /// Disabled telemetry makes this a no-op. Before `init` the event is
    /// buffered; afterwards it is sent immediately, fire-and-forget.
    pub fn track_event(&self, name: impl Into<String>, properties: Option<Map<String, Value>>) {
        if !self.inner.config.enabled {
            return;
        }

        let name = name.into();
        {
            let mut state = self.inner.state.lock().unwrap();
            if !state.initialized {
                state.pending.push((name, properties));
                return;
            }
        }

        self.send(name, properties);
    }

    fn send(&self, name: String, properties: Option<Map<String, Value>>) {
        let user_id = self.inner.state.lock().unwrap().user_id.clone();
        let payload = EventPayload {
            name,
            properties,
            timestamp: Utc::now().timestamp_millis(),
            user_id,
            session_id: self.inner.session_id.clone(),
            user_agent: self.inner.environment.user_agent.clone(),
            language: self.inner.environment.language.clone(),
            screen_resolution: self.inner.environment.screen_resolution.clone(),
            viewport_size: self.inner.environment.viewport_size.clone(),
        };

        if self.inner.config.debug || self.inner.config.is_development() {
            // Print instead of sending
            eprintln!(
                "Analytics event: {}",
                serde_json::to_string(&payload).unwrap_or_default()
            );
            return;
        }

        let transport = Arc::clone(&self.inner.transport);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(err) = transport.send_event(&payload).await {
                    tracing::warn!(event = %payload.name, error = %err, "failed to send analytics event");
                }
            });
        } else {
            tracing::debug!(event = %payload.name, "no async runtime; analytics event dropped");
        }
    }

    pub fn track_page_view(&self, view: PageView) {
        let mut properties = Map::new();
        properties.insert("path".to_string(), Value::from(view.path));
        properties.insert("title".to_string(), Value::from(view.title));
        if let Some(referrer) = view.referrer {
            properties.insert("referrer".to_string(), Value::from(referrer));
        }
        self.track_event(names::PAGE_VIEW, Some(properties));
    }

    pub fn track_user_sign_in(&self, method: AuthMethod) {
        let mut properties = Map::new();
        properties.insert("method".to_string(), Value::from(method.as_str()));
        self.track_event(names::USER_SIGN_IN, Some(properties));
    }

    pub fn track_user_sign_out(&self) {
        self.track_event(names::USER_SIGN_OUT, None);
    }

    pub fn track_user_register(&self, method: AuthMethod) {
        let mut properties = Map::new();
        properties.insert("method".to_string(), Value::from(method.as_str()));
        self.track_event(names::USER_REGISTER, Some(properties));
    }

    pub fn track_content_view(&self, kind: ContentKind, content_id: &str) {
        self.track_event(names::CONTENT_VIEW, Some(content_properties(kind, content_id)));
    }

    pub fn track_content_share(&self, kind: ContentKind, content_id: &str, platform: &str) {
        let mut properties = content_properties(kind, content_id);
        properties.insert("platform".to_string(), Value::from(platform));
        self.track_event(names::CONTENT_SHARE, Some(properties));
    }

    /// Saving applies to articles and opportunities only.
    pub fn track_content_save(&self, kind: ContentKind, content_id: &str) {
        self.track_event(names::CONTENT_SAVE, Some(content_properties(kind, content_id)));
    }

    pub fn track_opportunity_apply(&self, opportunity_id: &str) {
        let mut properties = Map::new();
        properties.insert("opportunityId".to_string(), Value::from(opportunity_id));
        self.track_event(names::OPPORTUNITY_APPLY, Some(properties));
    }

    pub fn track_search(&self, query: &str, filters: Option<Map<String, Value>>) {
        let mut properties = Map::new();
        properties.insert("query".to_string(), Value::from(query));
        if let Some(filters) = filters {
            properties.insert("filters".to_string(), Value::Object(filters));
        }
        self.track_event(names::SEARCH, Some(properties));
    }

    pub fn track_filter(&self, filters: Map<String, Value>) {
        let mut properties = Map::new();
        properties.insert("filters".to_string(), Value::Object(filters));
        self.track_event(names::FILTER, Some(properties));
    }

    /// Emits only when the session's scroll-depth high-water mark increases.
    pub fn track_scroll_depth(&self, depth_percent: u32) {
        if !self.inner.config.enabled {
            return;
        }
        {
            let mut state = self.inner.state.lock().unwrap();
            if depth_percent <= state.scroll_depth {
                return;
            }
            state.scroll_depth = depth_percent;
        }
        let mut properties = Map::new();
        properties.insert("depth".to_string(), Value::from(depth_percent));
        self.track_event(names::SCROLL, Some(properties));
    }

    pub fn track_page_load_performance(&self, timing: PageLoadTiming) {
        let properties = serde_json::to_value(timing)
            .ok()
            .and_then(|value| value.as_object().cloned());
        self.track_event(names::PAGE_PERFORMANCE, properties);
    }

    /// Error report forwarded from the logger for metrics purposes.
    pub fn track_error(&self, detail: &ErrorDetail, context: Option<&ErrorContext>) {
        let mut properties = Map::new();
        properties.insert("message".to_string(), Value::from(detail.message.clone()));
        if let Some(stack) = &detail.stack {
            properties.insert("stack".to_string(), Value::from(stack.clone()));
        }
        if let Some(context) = context {
            if let Some(user_id) = &context.user_id {
                properties.insert("userId".to_string(), Value::from(user_id.clone()));
            }
            if let Some(path) = &context.path {
                properties.insert("path".to_string(), Value::from(path.clone()));
            }
            if let Some(action) = &context.action {
                properties.insert("action".to_string(), Value::from(action.clone()));
            }
        }
        self.track_event(names::ERROR, Some(properties));
    }
}

fn content_properties(kind: ContentKind, content_id: &str) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("contentType".to_string(), Value::from(kind.as_str()));
    properties.insert("contentId".to_string(), Value::from(content_id));
    properties
}
