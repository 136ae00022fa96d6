//! Inbound event extraction.
//!
//! Converts the parts of an accepted POST into the [`EventContext`] that
//! templates see. Header names arrive lowercased; non-UTF-8 header bytes are
//! replaced rather than rejected. `Host` is exposed only as `host`, and the
//! path is percent-decoded.

use axum::http::{header::HOST, HeaderMap, Method, Uri};
use percent_encoding::percent_decode_str;

use crate::template::EventContext;

/// Build the event snapshot for one inbound request.
pub fn event_from_parts(method: &Method, uri: &Uri, headers: &HeaderMap, body: serde_json::Value) -> EventContext {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_default();

    let mut event = EventContext::new(body)
        .with_host(host)
        .with_method(method.as_str())
        .with_path(percent_decode_str(uri.path()).decode_utf8_lossy())
        .with_query_string(uri.query().unwrap_or_default());

    for (name, value) in headers {
        if *name == HOST {
            continue;
        }
        event = event.with_header(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }

    event
}
