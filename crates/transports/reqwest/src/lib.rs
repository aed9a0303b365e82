//! [`HttpTransport`] over a pooled `reqwest::Client`.

use crate::core::error::{build_http_status_transport_error, TransportError};
use crate::core::json::without_null_fields;
use crate::core::transport::{
    emit_transport_event, ByteStream, Headers, HttpTransport, TransportConfig, TransportEvent,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::Value;
use std::error::Error as StdError;
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;

const TARGET: &str = "open_responses::transport::reqwest";

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn try_new(cfg: &TransportConfig) -> Result<Self, TransportError> {
        Self::from_builder(Client::builder(), cfg)
    }

    /// Like [`Self::try_new`], but falls back to a default client if the
    /// configured one cannot be built.
    pub fn new(cfg: &TransportConfig) -> Self {
        Self::from_builder_or_default(Client::builder(), cfg)
    }

    fn from_builder(
        builder: reqwest::ClientBuilder,
        cfg: &TransportConfig,
    ) -> Result<Self, TransportError> {
        // No client-wide timeout: it would cut long streams. Non-streaming
        // calls get `request_timeout` per request.
        builder
            .connect_timeout(cfg.connect_timeout)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map(|client| Self { client })
            .map_err(|err| {
                TransportError::Other(format!("reqwest client build failed: {}", error_chain(&err)))
            })
    }

    fn from_builder_or_default(builder: reqwest::ClientBuilder, cfg: &TransportConfig) -> Self {
        Self::from_builder(builder, cfg).unwrap_or_else(|err| {
            debug!(target: TARGET, error = %err, "using a default reqwest client");
            Self {
                client: Client::new(),
            }
        })
    }

    /// Send the POST and check the status. A non-2xx body is read in full and
    /// returned as [`TransportError::HttpStatus`].
    async fn open(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        cfg: &TransportConfig,
        is_stream: bool,
    ) -> Result<(reqwest::Response, Exchange), TransportError> {
        let body = if cfg.strip_null_fields {
            without_null_fields(body)
        } else {
            body.clone()
        };

        let mut req = self.client.post(url).json(&body);
        for (name, value) in headers {
            // .json() owns the content type
            if !name.eq_ignore_ascii_case("content-type") {
                req = req.header(name.as_str(), value.as_str());
            }
        }
        if let (false, Some(timeout)) = (is_stream, cfg.request_timeout) {
            req = req.timeout(timeout);
        }

        let exchange = Exchange {
            started_at: SystemTime::now(),
            clock: Instant::now(),
            url: url.to_string(),
            request_headers: headers.to_vec(),
            request_body: body,
            is_stream,
        };
        debug!(target: TARGET, url, is_stream, "POST");

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(err) => {
                let err = classify_send_error(&err, cfg, is_stream);
                debug!(target: TARGET, url, error = %err, "request failed");
                exchange.finish(None, Vec::new(), None, Some(err.to_string()));
                return Err(err);
            }
        };

        let status = resp.status().as_u16();
        debug!(target: TARGET, url, status, "response head");
        if !resp.status().is_success() {
            let response_headers = header_pairs(resp.headers());
            let (text, read_error) = match resp.text().await {
                Ok(text) => (text, None),
                Err(err) => {
                    let detail = error_chain(&err);
                    debug!(target: TARGET, url, status, error = %detail, "error body unreadable");
                    (String::new(), Some(detail))
                }
            };
            let err =
                build_http_status_transport_error(status, text.clone(), response_headers.clone());
            let reported = status_error_report(&err, read_error.as_deref());
            exchange.finish(Some(status), response_headers, Some(text), Some(reported));
            return Err(err);
        }
        Ok((resp, exchange))
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

/// Request facts held until the exchange is reported to the observer.
struct Exchange {
    started_at: SystemTime,
    clock: Instant,
    url: String,
    request_headers: Headers,
    request_body: Value,
    is_stream: bool,
}

impl Exchange {
    fn finish(
        self,
        status: Option<u16>,
        response_headers: Headers,
        response_body: Option<String>,
        error: Option<String>,
    ) {
        emit_transport_event(TransportEvent {
            started_at: self.started_at,
            latency: self.clock.elapsed(),
            method: "POST",
            url: self.url,
            status,
            is_stream: self.is_stream,
            request_headers: self.request_headers,
            response_headers,
            request_body: self.request_body,
            response_body,
            error,
        });
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    type StreamResponse = (ByteStream, Headers);

    fn into_stream(resp: Self::StreamResponse) -> (ByteStream, Headers) {
        resp
    }

    async fn post_json_stream(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        cfg: &TransportConfig,
    ) -> Result<Self::StreamResponse, TransportError> {
        let (resp, exchange) = self.open(url, headers, body, cfg, true).await?;
        let response_headers = header_pairs(resp.headers());
        exchange.finish(
            Some(resp.status().as_u16()),
            response_headers.clone(),
            None,
            None,
        );
        let chunks = idle_bounded(resp.bytes_stream(), cfg.idle_read_timeout);
        Ok((Box::pin(chunks), response_headers))
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
        cfg: &TransportConfig,
    ) -> Result<(Bytes, Headers), TransportError> {
        let (resp, exchange) = self.open(url, headers, body, cfg, false).await?;
        let status = resp.status().as_u16();
        let response_headers = header_pairs(resp.headers());
        match resp.bytes().await {
            Ok(bytes) => {
                exchange.finish(
                    Some(status),
                    response_headers.clone(),
                    Some(String::from_utf8_lossy(&bytes).into_owned()),
                    None,
                );
                Ok((bytes, response_headers))
            }
            Err(err) => {
                let err = match (err.is_timeout(), cfg.request_timeout) {
                    (true, Some(timeout)) => TransportError::RequestTimeout(timeout),
                    _ => TransportError::BodyRead(error_chain(&err)),
                };
                exchange.finish(Some(status), response_headers, None, Some(err.to_string()));
                Err(err)
            }
        }
    }
}

/// Fail the body stream when no chunk arrives within `idle`.
fn idle_bounded<S>(body: S, idle: Duration) -> impl Stream<Item = Result<Bytes, TransportError>> + Send
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    async_stream::try_stream! {
        let mut body = Box::pin(body);
        loop {
            let chunk = match tokio::time::timeout(idle, body.next()).await {
                Err(_) => Err(TransportError::IdleReadTimeout(idle))?,
                Ok(None) => break,
                Ok(Some(Err(err))) if err.is_timeout() => Err(TransportError::IdleReadTimeout(idle))?,
                Ok(Some(Err(err))) => Err(TransportError::BodyRead(error_chain(&err)))?,
                Ok(Some(Ok(chunk))) => chunk,
            };
            yield chunk;
        }
    }
}

fn classify_send_error(err: &reqwest::Error, cfg: &TransportConfig, is_stream: bool) -> TransportError {
    let detail = error_chain(err);
    if err.is_connect() {
        TransportError::Network(format!("connect: {detail}"))
    } else if err.is_timeout() {
        match cfg.request_timeout {
            Some(timeout) if !is_stream => TransportError::RequestTimeout(timeout),
            _ => TransportError::ConnectTimeout(cfg.connect_timeout),
        }
    } else {
        TransportError::Network(detail)
    }
}

/// Observer text for a non-2xx exchange; notes when the body could not be read.
fn status_error_report(err: &TransportError, read_error: Option<&str>) -> String {
    match read_error {
        Some(detail) => format!("{err} (body read failed: {detail})"),
        None => err.to_string(),
    }
}

fn header_pairs(headers: &http::HeaderMap) -> Headers {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

/// Display an error together with all of its sources.
fn error_chain(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
