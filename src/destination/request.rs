//! Outbound request construction.
//!
//! # Responsibilities
//! - Turn a destination, its rendered body and resolved credentials into a
//!   ready-to-send request
//! - Share the method/URL/header parsers with config validation
//!
//! # Design Decisions
//! - Auth is applied before static headers, and static headers are appended,
//!   so a configured `Authorization` header adds a value instead of replacing
//! - No `Content-Type` is implied; configure it as a static header

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request, Url};

use crate::config::HeaderValues;
use crate::destination::credentials::Credentials;
use crate::destination::registry::Destination;

/// Why a destination's target cannot form a request.
#[derive(Debug, thiserror::Error)]
pub enum InvalidTarget {
    #[error("invalid method {0:?}")]
    Method(String),

    #[error("invalid url {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported url scheme {0:?}")]
    Scheme(String),

    #[error("invalid header name {0:?}")]
    HeaderName(String),

    #[error("invalid value for header {0:?}")]
    HeaderValue(String),

    #[error("credentials cannot be encoded as a header value")]
    Credentials,
}

/// A request could not be constructed for a destination.
#[derive(Debug, thiserror::Error)]
#[error("destination {destination}: cannot build request: {reason}")]
pub struct BuildError {
    pub destination: String,
    pub reason: InvalidTarget,
}

/// Parse a configured method; empty means GET.
pub fn parse_method(raw: &str) -> Result<Method, InvalidTarget> {
    if raw.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(raw.as_bytes()).map_err(|_| InvalidTarget::Method(raw.to_string()))
}

/// Parse a configured URL; only absolute http and https URLs are accepted.
pub fn parse_url(raw: &str) -> Result<Url, InvalidTarget> {
    let url = Url::parse(raw).map_err(|source| InvalidTarget::Url {
        url: raw.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(InvalidTarget::Scheme(other.to_string())),
    }
}

/// Convert configured static headers, keeping every value of repeated names.
pub fn parse_headers(raw: &HeaderValues) -> Result<HeaderMap, InvalidTarget> {
    let mut headers = HeaderMap::new();
    for (name, values) in raw {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| InvalidTarget::HeaderName(name.clone()))?;
        for value in values {
            let header_value =
                HeaderValue::from_str(value).map_err(|_| InvalidTarget::HeaderValue(name.clone()))?;
            headers.append(header_name.clone(), header_value);
        }
    }
    Ok(headers)
}

/// Build the outbound request for one destination.
pub fn build_request(
    destination: &Destination,
    body: Option<String>,
    credentials: Option<&Credentials>,
) -> Result<Request, BuildError> {
    let fail = |reason: InvalidTarget| BuildError {
        destination: destination.name.clone(),
        reason,
    };

    let method = parse_method(&destination.method).map_err(fail)?;
    let url = parse_url(&destination.url).map_err(fail)?;
    let static_headers = parse_headers(&destination.headers).map_err(fail)?;

    let mut request = Request::new(method, url);

    if let Some(body) = body {
        *request.body_mut() = Some(body.into());
    }

    if let Some(credentials) = credentials {
        let mut value =
            HeaderValue::from_str(&credentials.authorization()).map_err(|_| fail(InvalidTarget::Credentials))?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
    }

    for (name, value) in static_headers.iter() {
        request.headers_mut().append(name.clone(), value.clone());
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateChain;

    fn destination(method: &str, url: &str) -> Destination {
        Destination {
            name: "d1".into(),
            method: method.into(),
            url: url.into(),
            headers: HeaderValues::new(),
            auth: None,
            chain: TemplateChain::default(),
        }
    }

    fn body_text(request: &Request) -> Option<&[u8]> {
        request.body().and_then(|body| body.as_bytes())
    }

    #[test]
    fn test_method_url_and_body() {
        let request = build_request(
            &destination("PUT", "https://logs.example.com/push?x=1"),
            Some("payload".into()),
            None,
        )
        .unwrap();

        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.url().as_str(), "https://logs.example.com/push?x=1");
        assert_eq!(body_text(&request), Some(&b"payload"[..]));
        assert!(request.headers().is_empty());
    }

    #[test]
    fn test_no_body_for_empty_chain() {
        let request = build_request(&destination("", "http://localhost:9/"), None, None).unwrap();
        assert_eq!(request.method(), Method::GET);
        assert!(request.body().is_none());
    }

    #[test]
    fn test_static_headers_merge_with_auth() {
        let mut dest = destination("POST", "http://localhost:9/");
        dest.headers.insert("Authorization".into(), vec!["Bearer extra".into()]);
        dest.headers.insert("X-Tag".into(), vec!["a".into(), "b".into()]);

        let creds = Credentials::new("Aladdin", "open sesame");
        let request = build_request(&dest, None, Some(&creds)).unwrap();

        let auth: Vec<_> = request.headers().get_all(AUTHORIZATION).iter().collect();
        assert_eq!(auth.len(), 2);
        assert_eq!(auth[0], "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
        assert!(auth[0].is_sensitive());
        assert_eq!(auth[1], "Bearer extra");

        let tags: Vec<_> = request.headers().get_all("x-tag").iter().collect();
        assert_eq!(tags, ["a", "b"]);
    }

    #[test]
    fn test_invalid_method() {
        let err = build_request(&destination("NOT VALID", "http://localhost/"), None, None).unwrap_err();
        assert_eq!(err.destination, "d1");
        assert!(matches!(err.reason, InvalidTarget::Method(_)));
    }

    #[test]
    fn test_invalid_url() {
        let err = build_request(&destination("POST", "localhost:8080"), None, None).unwrap_err();
        assert!(matches!(err.reason, InvalidTarget::Scheme(_) | InvalidTarget::Url { .. }));

        let err = build_request(&destination("POST", "::"), None, None).unwrap_err();
        assert!(matches!(err.reason, InvalidTarget::Url { .. }));
    }

    #[test]
    fn test_invalid_header_value() {
        let mut dest = destination("POST", "http://localhost/");
        dest.headers.insert("X-Bad".into(), vec!["line\nbreak".into()]);

        let err = build_request(&dest, None, None).unwrap_err();
        assert!(matches!(err.reason, InvalidTarget::HeaderValue(ref name) if name == "X-Bad"));
    }
}
