//! Per-event data visible to body templates.

use std::collections::BTreeMap;

use serde::Serialize;

/// Multi-valued string mapping (headers, query parameters).
pub type Multimap = BTreeMap<String, Vec<String>>;

/// Snapshot of one inbound event.
///
/// Built once per inbound request and shared read-only by every destination.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventContext {
    pub host: String,
    pub headers: Multimap,
    pub method: String,
    pub path: String,
    pub query: Multimap,
    pub body: serde_json::Value,
}

impl EventContext {
    /// Create an event carrying only a decoded body.
    pub fn new(body: serde_json::Value) -> Self {
        Self {
            method: "POST".to_string(),
            path: "/".to_string(),
            body,
            ..Default::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Append a header value; names are stored lowercased.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    /// Decode a raw (`a=1&b=2`) query string into the query multimap.
    pub fn with_query_string(mut self, query: &str) -> Self {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            self.query
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        self
    }
}

/// What one template step sees: the event plus every prior step's output.
#[derive(Debug, Serialize)]
pub(crate) struct TemplateScope<'a> {
    host: &'a str,
    headers: &'a Multimap,
    method: &'a str,
    path: &'a str,
    query: &'a Multimap,
    body: &'a serde_json::Value,
    #[serde(rename = "executedTemplates")]
    executed_templates: &'a [String],
}

impl<'a> TemplateScope<'a> {
    pub(crate) fn new(event: &'a EventContext, executed_templates: &'a [String]) -> Self {
        Self {
            host: &event.host,
            headers: &event.headers,
            method: &event.method,
            path: &event.path,
            query: &event.query,
            body: &event.body,
            executed_templates,
        }
    }
}
