//! A chat backend that talks to the game's HTTP service.
//!
//! The service exposes a single route, `POST <base>/chat/`, that takes the
//! visible conversation as `{"messages": [{"role", "content"}, ...]}` and
//! answers `{"msg": "..."}`.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use reqwest::{Client, Response, header};
use tell_no_lie_backend::{BackendError, ChatBackend, ChatRequest, ErrorKind};

pub use config::{DEFAULT_TIMEOUT, HttpBackendConfig, HttpBackendConfigBuilder};
use proto::ChatReply;

/// Error type for [`HttpBackend`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {}

impl BackendError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::TimedOut
        } else if err.is_connect() {
            ErrorKind::Unreachable
        } else if err.is_status() {
            ErrorKind::Rejected
        } else if err.is_decode() {
            ErrorKind::Malformed
        } else {
            ErrorKind::Other
        };
        Self::new(format!("{err}"), kind)
    }
}

/// Chat backend reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    config: Arc<HttpBackendConfig>,
}

impl HttpBackend {
    /// Creates a new `HttpBackend` with the given configuration.
    #[inline]
    pub fn new(config: HttpBackendConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this backend.
    #[inline]
    pub fn config(&self) -> &HttpBackendConfig {
        &self.config
    }
}

impl ChatBackend for HttpBackend {
    type Error = Error;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        let body = proto::create_body(req);
        let resp_fut = self
            .client
            .post(&self.config.chat_url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .timeout(self.config.timeout)
            .json(&body)
            .send();
        let message_count = req.messages.len();

        async move {
            trace!("posting {message_count} messages");
            let resp = resp_fut.await.and_then(Response::error_for_status)?;

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_json = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| {
                    m.type_() == mime::APPLICATION && m.subtype() == mime::JSON
                })
                .unwrap_or(false);
            if !is_json {
                return Err(Error::new(
                    format!("unexpected content type: {content_type:?}"),
                    ErrorKind::Malformed,
                ));
            }

            let reply: ChatReply = resp.json().await?;
            debug!("got a reply of {} bytes", reply.msg.len());
            Ok(reply.msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tell_no_lie_backend::ChatMessage;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Answers a single connection with a canned response and returns the
    /// base URL along with the raw request it received.
    async fn serve_once(
        status: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0; 1024];
            while !is_complete(&request) {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\n\
                 Content-Type: {content_type}\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            String::from_utf8(request).unwrap()
        });
        (base_url, handle)
    }

    /// Whether the headers and the whole body have arrived.
    fn is_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        body.len() >= length
    }

    fn backend(base_url: &str) -> HttpBackend {
        let config = HttpBackendConfigBuilder::with_base_url(base_url)
            .with_timeout(Duration::from_secs(5))
            .build();
        HttpBackend::new(config)
    }

    fn request() -> ChatRequest {
        ChatRequest {
            messages: vec![
                ChatMessage::assistant("a"),
                ChatMessage::user("Hi"),
            ],
        }
    }

    #[test]
    fn test_error_display() {
        let err = Error::new("status 502", ErrorKind::Rejected);
        assert_eq!(
            err.to_string(),
            "Backend rejected the request: status 502"
        );
        assert_eq!(err.message(), "status 502");
        assert_eq!(err.kind(), ErrorKind::Rejected);
    }

    #[tokio::test]
    async fn test_reply() {
        let (base_url, server) =
            serve_once("200 OK", "application/json", r#"{"msg":"Five."}"#)
                .await;
        let reply = backend(&base_url).send_request(&request()).await;
        assert_eq!(reply.unwrap(), "Five.");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /chat/ HTTP/1.1\r\n"), "{raw}");
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let head = head.to_ascii_lowercase();
        assert!(head.contains("\r\ncontent-type: application/json\r\n"));
        assert!(head.contains("\r\naccept: application/json\r\n"));

        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        let expected = json!({
            "messages": [
                { "role": "assistant", "content": "a" },
                { "role": "user", "content": "Hi" },
            ]
        });
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn test_server_error() {
        let (base_url, server) = serve_once(
            "500 Internal Server Error",
            "application/json",
            r#"{"msg":"oops"}"#,
        )
        .await;
        let err = backend(&base_url)
            .send_request(&request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected, "{err}");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_content_type() {
        let (base_url, server) =
            serve_once("200 OK", "text/html", "<p>Five.</p>").await;
        let err = backend(&base_url)
            .send_request(&request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed, "{err}");
        assert!(err.message().contains("text/html"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_reply_field() {
        let (base_url, server) =
            serve_once("200 OK", "application/json", "{}").await;
        let err = backend(&base_url)
            .send_request(&request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed, "{err}");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // Nothing listens on port 1 of the loopback interface.
        let err = backend("http://127.0.0.1:1")
            .send_request(&request())
            .await
            .unwrap_err();
        assert!(
            matches!(err.kind(), ErrorKind::Unreachable | ErrorKind::TimedOut),
            "unexpected error: {err}"
        );
    }
}
