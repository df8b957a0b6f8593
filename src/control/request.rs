//! Transport-neutral request/response model for the control surface.
//!
//! The HTTP adapter flattens each incoming request into a
//! [`ControlRequest`]; the router answers with an [`HttpResponse`].

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Other,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRequest {
    /// Stamped by the bridge; pairs the request with its response.
    pub seq: u32,
    pub method: Method,
    pub path: String,
    /// Decoded query arguments in arrival order.
    pub args: Vec<(String, String)>,
    pub body: String,
}

impl ControlRequest {
    /// Split `uri` into path and decoded query arguments.
    pub fn new(method: Method, uri: &str, body: impl Into<String>) -> Self {
        let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
        Self {
            seq: 0,
            method,
            path: path.to_string(),
            args: parse_query(query),
            body: body.into(),
        }
    }

    /// First value of argument `name`.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn has_arg(&self, name: &str) -> bool {
        self.args.iter().any(|(k, _)| k == name)
    }
}

/// `a=1&b=two+words` → `[("a","1"), ("b","two words")]`.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (url_decode(k), url_decode(v))
        })
        .collect()
}

/// Decode `+` and `%XX` escapes.  Malformed escapes are kept literally.
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    Text,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Text => "text/plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: ContentType,
    pub body: String,
}

impl HttpResponse {
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: ContentType::Text,
            body: body.into(),
        }
    }

    /// Serialize `payload`; a serializer failure becomes a plain `500`.
    pub fn json<T: Serialize>(status: u16, payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self {
                status,
                content_type: ContentType::Json,
                body,
            },
            Err(_) => Self::text(500, "serialization failed"),
        }
    }

    pub fn service_unavailable() -> Self {
        Self::text(503, "busy, try again")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_path_and_query() {
        let req = ControlRequest::new(Method::Get, "/state?light=1&x", "");
        assert_eq!(req.path, "/state");
        assert_eq!(req.arg("light"), Some("1"));
        assert!(req.has_arg("x"));
        assert_eq!(req.arg("x"), Some(""));
        assert_eq!(req.arg("missing"), None);
    }

    #[test]
    fn decodes_escapes() {
        assert_eq!(url_decode("a+b%20c"), "a b c");
        assert_eq!(url_decode("100%"), "100%");
        assert_eq!(url_decode("%zz"), "%zz");
    }

    #[test]
    fn json_response_sets_content_type() {
        let r = HttpResponse::json(200, &[1, 2]);
        assert_eq!(r.body, "[1,2]");
        assert_eq!(r.content_type.as_str(), "application/json");
    }
}
