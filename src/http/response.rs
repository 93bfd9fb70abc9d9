use bytes::Bytes;
use std::collections::HashMap;
use tokio::fs::File;

/// HTTP status codes the preview server sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 413 Payload Too Large
    PayloadTooLarge,
    /// 431 Request Header Fields Too Large
    HeadersTooLarge,
    /// 501 Not Implemented
    NotImplemented,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use livepeek::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::Forbidden.as_u16(), 403);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::HeadersTooLarge => 431,
            StatusCode::NotImplemented => 501,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::HeadersTooLarge => "Request Header Fields Too Large",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }
}

/// Response payload.
///
/// Files are streamed by the writer and never read into memory up front.
#[derive(Debug, Default)]
pub enum Body {
    #[default]
    Empty,
    Bytes(Bytes),
    /// Open file and the number of bytes to send from it
    File { file: File, len: u64 },
}

impl Body {
    /// In-memory bytes of the body, or `None` for a file body.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Empty => Some(&[]),
            Body::Bytes(b) => Some(&b[..]),
            Body::File { .. } => None,
        }
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// HTTP headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// Response body
    pub body: Body,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/html; charset=utf-8")
///     .body("<h1>Hi</h1>")
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Body,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Body::Empty,
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets an in-memory response body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Body::Bytes(body.into());
        self
    }

    /// Streams the response body from an open file of `len` bytes.
    pub fn file(mut self, file: File, len: u64) -> Self {
        self.headers
            .insert("Content-Length".to_string(), len.to_string());
        self.body = Body::File { file, len };
        self
    }

    /// Builds the final Response.
    ///
    /// Adds a Content-Length header from the in-memory body size if one is
    /// not already present.
    pub fn build(mut self) -> Response {
        if let Some(bytes) = self.body.as_bytes() {
            let len = bytes.len();
            self.headers
                .entry("Content-Length".to_string())
                .or_insert_with(|| len.to_string());
        }

        self.build_head()
    }

    /// Builds a response to a HEAD request: headers only, no body and no
    /// automatic Content-Length.
    pub fn build_head(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Creates a 200 OK HTML response with the given body.
    pub fn html(body: impl Into<Bytes>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "text/html; charset=utf-8")
            .body(body)
            .build()
    }

    /// Creates a bodiless response with the given status.
    pub fn empty(status: StatusCode) -> Self {
        ResponseBuilder::new(status).build()
    }

    /// Creates a 403 Forbidden response with no body.
    pub fn forbidden() -> Self {
        Self::empty(StatusCode::Forbidden)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
