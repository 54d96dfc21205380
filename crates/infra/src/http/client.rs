use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use socialcontext_core::{HttpTransport, TransportError};
use socialcontext_domain::constants::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use socialcontext_domain::{HttpMethod, HttpRequest, HttpResponse, RequestBody, SocialContextError};
use tracing::debug;

use crate::errors::{transport_error, InfraError};

/// reqwest-backed [`HttpTransport`] with timeout and retry support.
///
/// Every request is sent once unless `max_attempts` is raised. Only
/// idempotent methods (GET, PUT, DELETE) are then retried, on connection
/// failures and 5xx responses. POST is always sent once.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, SocialContextError> {
        Self::builder().build()
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let attempts = if is_idempotent(request.method) { self.max_attempts.max(1) } else { 1 };
        let builder = self.to_builder(&request);

        for attempt in 0..attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                TransportError::Network("request body cannot be cloned".to_string())
            })?;

            let prepared = cloned_builder.build().map_err(|err| transport_error(&err))?;
            let method = prepared.method().clone();
            let url = prepared.url().clone();
            debug!(attempt = attempt + 1, %method, %url, "sending HTTP request");

            match self.client.execute(prepared).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %method, %url, %status, "received HTTP response");

                    if status.is_server_error() && attempt + 1 < attempts {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return into_response(response).await;
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, %method, %url, error = %err, "HTTP request failed");

                    if attempt + 1 < attempts && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Err(transport_error(&err));
                }
            }
        }

        Err(TransportError::Network("http client exhausted retries without a result".into()))
    }

    fn to_builder(&self, request: &HttpRequest) -> RequestBuilder {
        let mut builder = self.client.request(to_method(request.method), &request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        match &request.body {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Form(pairs)) => builder.form(pairs),
            None => builder,
        }
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.execute(request).await
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: String,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_attempts: 1,
            base_backoff: Duration::from_millis(200),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ReqwestTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, SocialContextError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()
            .map_err(|err| SocialContextError::from(InfraError::from(err)))?;

        Ok(ReqwestTransport {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

async fn into_response(response: Response) -> Result<HttpResponse, TransportError> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response.bytes().await.map_err(|err| transport_error(&err))?;

    Ok(HttpResponse { status, headers, body: body.to_vec() })
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn is_idempotent(method: HttpMethod) -> bool {
    !matches!(method, HttpMethod::Post)
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_request() {
        return true;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn transport_with_defaults() -> ReqwestTransport {
        ReqwestTransport::builder()
            .base_backoff(Duration::from_millis(10))
            .max_attempts(3)
            .build()
            .expect("http transport")
    }

    #[tokio::test]
    async fn returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_with_defaults();
        let response =
            transport.send(HttpRequest::new(HttpMethod::Get, server.uri())).await.expect("response");

        assert_eq!(response.status, 200);
        assert_eq!(response.text(), "ok");
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn default_transport_sends_server_errors_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().expect("http transport");
        let response =
            transport.send(HttpRequest::new(HttpMethod::Get, server.uri())).await.expect("response");

        assert_eq!(response.status, 503);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn retries_idempotent_server_errors_until_success() {
        let server = MockServer::start().await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        Mock::given(method("GET"))
            .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
                let current = attempts_clone.fetch_add(1, Ordering::SeqCst);
                if current < 2 {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let transport = transport_with_defaults();
        let response =
            transport.send(HttpRequest::new(HttpMethod::Get, server.uri())).await.expect("response");

        assert_eq!(response.status, 200);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn post_is_never_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_with_defaults();
        let request = HttpRequest::new(HttpMethod::Post, server.uri()).json(json!({"a": 1}));
        let response = transport.send(request).await.expect("response");

        assert_eq!(response.status, 503);
    }

    #[tokio::test]
    async fn client_errors_are_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "nope"})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_with_defaults();
        let response =
            transport.send(HttpRequest::new(HttpMethod::Get, server.uri())).await.expect("response");

        assert_eq!(response.status, 401);
        assert_eq!(response.json::<serde_json::Value>().unwrap()["detail"], "nope");
    }

    #[tokio::test]
    async fn sends_headers_query_and_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0.1a/jobs"))
            .and(query_param("page", "2 of 3"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/v0.1a/jobs/7"))
            .and(body_json(json!({"action": "cancel"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v0.1/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=client_credentials"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_with_defaults();
        let base = server.uri();

        let mut get = HttpRequest::new(HttpMethod::Get, format!("{base}/v0.1a/jobs"))
            .header("Authorization", "Bearer abc");
        get.query.push(("page".into(), "2 of 3".into()));
        assert_eq!(transport.send(get).await.unwrap().status, 200);

        let put = HttpRequest::new(HttpMethod::Put, format!("{base}/v0.1a/jobs/7"))
            .json(json!({"action": "cancel"}));
        assert_eq!(transport.send(put).await.unwrap().status, 200);

        let form = HttpRequest::new(HttpMethod::Post, format!("{base}/v0.1/token"))
            .form(vec![("grant_type".into(), "client_credentials".into())]);
        assert_eq!(transport.send(form).await.unwrap().status, 200);
    }

    #[tokio::test]
    async fn network_failure_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = format!("http://{}", addr);

        let transport = ReqwestTransport::builder()
            .base_backoff(Duration::from_millis(5))
            .max_attempts(2)
            .build()
            .expect("http transport");

        let result = transport.send(HttpRequest::new(HttpMethod::Get, url)).await;
        match result {
            Err(TransportError::Network(msg)) => {
                assert!(msg.to_lowercase().contains("http"));
            }
            other => panic!("expected network error, got {:?}", other),
        }
    }
}
