//! Resource endpoints
//!
//! Thin request builders over [`AuthenticatedDispatcher`]. Each method checks
//! its input locally, failing with `InvalidRequest` before any network
//! traffic, and otherwise returns the service response untouched. Only the
//! classify and clients operations interpret a status: a 403 that survived
//! reauthentication becomes `Unauthorized`.

use std::sync::Arc;

use serde_json::{json, Value};
use socialcontext_domain::constants::OPENAPI_PATH;
use socialcontext_domain::{
    ApiVersion, ClassifyRequest, ContentType, HttpResponse, JobAction, JobSpec, ModelCatalog,
    RequestDescriptor, Result, SocialContextError,
};
use tracing::instrument;

use super::content::ContentEndpoint;
use crate::dispatch::AuthenticatedDispatcher;

const FORBIDDEN: u16 = 403;

/// Typed client for the socialcontext.ai API
#[derive(Debug, Clone)]
pub struct SocialContextClient {
    dispatcher: Arc<AuthenticatedDispatcher>,
}

impl SocialContextClient {
    pub fn new(dispatcher: Arc<AuthenticatedDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &AuthenticatedDispatcher {
        &self.dispatcher
    }

    /// Authenticate eagerly instead of on the first request.
    pub async fn connect(&self) -> Result<()> {
        self.dispatcher.connect().await
    }

    /// Operations bound to news content.
    pub fn news(&self) -> ContentEndpoint<'_> {
        self.content(ContentType::News)
    }

    pub fn content(&self, content_type: ContentType) -> ContentEndpoint<'_> {
        ContentEndpoint::new(self, content_type)
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    /// Classify a URL or a piece of text.
    ///
    /// # Errors
    /// - `InvalidRequest` unless exactly one of url and text is set
    /// - `Unauthorized` if the service forbids the call
    #[instrument(skip(self, request), fields(content_type = %request.content_type))]
    pub async fn classify(&self, request: &ClassifyRequest) -> Result<HttpResponse> {
        let body = request.to_body()?;
        let response = self
            .dispatcher
            .dispatch(RequestDescriptor::post(ApiVersion::V0_1a, request.path(), body))
            .await?;
        deny_forbidden(response, "classify")
    }

    /// Classify through the generic `classification/classify-content` route.
    #[instrument(skip(self, request), fields(content_type = %request.content_type))]
    pub async fn classify_content(&self, request: &ClassifyRequest) -> Result<HttpResponse> {
        let mut body = request.to_body()?;
        if let Value::Object(map) = &mut body {
            map.insert("content_type".to_string(), json!(request.content_type));
        }
        let response = self
            .dispatcher
            .dispatch(RequestDescriptor::post(
                ApiVersion::V0_1a,
                "classification/classify-content",
                body,
            ))
            .await?;
        deny_forbidden(response, "classify")
    }

    /// List the classification models the service offers.
    #[instrument(skip(self))]
    pub async fn models(&self) -> Result<HttpResponse> {
        self.dispatcher.dispatch(RequestDescriptor::get(ApiVersion::V0_1a, "models")).await
    }

    /// Fetch the model listing and parse it into a catalog.
    ///
    /// # Errors
    /// `RequestFailed` for a non-2xx response or an unrecognized body.
    pub async fn model_catalog(&self) -> Result<ModelCatalog> {
        let response = self.models().await?.error_for_status()?;
        ModelCatalog::from_response(&response.json::<Value>()?)
    }

    // ------------------------------------------------------------------
    // Account
    // ------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn account_info(&self) -> Result<HttpResponse> {
        self.dispatcher.dispatch(RequestDescriptor::get(ApiVersion::V0_1a, "account")).await
    }

    /// List API clients registered to the account.
    #[instrument(skip(self))]
    pub async fn clients(&self) -> Result<HttpResponse> {
        let response =
            self.dispatcher.dispatch(RequestDescriptor::get(ApiVersion::V0_1, "clients")).await?;
        deny_forbidden(response, "list clients")
    }

    /// Register a new API client.
    #[instrument(skip(self))]
    pub async fn create_client(&self, name: &str) -> Result<HttpResponse> {
        let name = require(name, "client name")?;
        let response = self
            .dispatcher
            .dispatch(RequestDescriptor::post(ApiVersion::V0_1, "clients", json!({ "name": name })))
            .await?;
        deny_forbidden(response, "create client")
    }

    // ------------------------------------------------------------------
    // Batch jobs
    // ------------------------------------------------------------------

    /// Submit a batch job.
    ///
    /// # Errors
    /// `InvalidRequest` for an empty input file or when no model was named.
    #[instrument(skip(self, spec), fields(input_file = %spec.input_file))]
    pub async fn create_job(&self, spec: &JobSpec) -> Result<HttpResponse> {
        let body = spec.to_body()?;
        self.dispatcher.dispatch(RequestDescriptor::post(ApiVersion::V0_1a, "jobs", body)).await
    }

    #[instrument(skip(self))]
    pub async fn jobs(&self) -> Result<HttpResponse> {
        self.dispatcher.dispatch(RequestDescriptor::get(ApiVersion::V0_1a, "jobs")).await
    }

    #[instrument(skip(self))]
    pub async fn job(&self, job_id: &str) -> Result<HttpResponse> {
        let job_id = require(job_id, "job id")?;
        self.dispatcher
            .dispatch(RequestDescriptor::get(ApiVersion::V0_1a, format!("jobs/{job_id}")))
            .await
    }

    #[instrument(skip(self, body))]
    pub async fn update_job(&self, job_id: &str, body: Value) -> Result<HttpResponse> {
        let job_id = require(job_id, "job id")?;
        self.dispatcher
            .dispatch(RequestDescriptor::put(ApiVersion::V0_1a, format!("jobs/{job_id}"), body))
            .await
    }

    /// Schedule a cancelled or failed job again.
    pub async fn run_job(&self, job_id: &str) -> Result<HttpResponse> {
        self.update_job(job_id, JobAction::Schedule.to_body()).await
    }

    pub async fn cancel_job(&self, job_id: &str) -> Result<HttpResponse> {
        self.update_job(job_id, JobAction::Cancel.to_body()).await
    }

    /// Start an execution of a previously defined job.
    #[instrument(skip(self))]
    pub async fn execute_job(&self, job_name: &str) -> Result<HttpResponse> {
        let job_name = require(job_name, "job name")?;
        self.dispatcher
            .dispatch(RequestDescriptor::post(
                ApiVersion::V0_1a,
                "executions",
                json!({ "job_name": job_name }),
            ))
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_job(&self, job_id: &str) -> Result<HttpResponse> {
        let job_id = require(job_id, "job id")?;
        self.dispatcher
            .dispatch(RequestDescriptor::delete(ApiVersion::V0_1a, format!("jobs/{job_id}")))
            .await
    }

    // ------------------------------------------------------------------
    // Misc
    // ------------------------------------------------------------------

    /// Fetch the service's OpenAPI document.
    #[instrument(skip(self))]
    pub async fn openapi(&self) -> Result<HttpResponse> {
        self.dispatcher.dispatch(RequestDescriptor::get(ApiVersion::Root, OPENAPI_PATH)).await
    }

    /// Discard the cached token for this client id.
    pub async fn clear_token(&self) -> Result<()> {
        self.dispatcher.invalidate().await
    }
}

fn require<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SocialContextError::InvalidRequest(format!("{what} is required")));
    }
    if value.contains('/') {
        return Err(SocialContextError::InvalidRequest(format!("{what} must not contain '/'")));
    }
    Ok(value)
}

fn deny_forbidden(response: HttpResponse, operation: &str) -> Result<HttpResponse> {
    if response.status == FORBIDDEN {
        return Err(SocialContextError::Unauthorized(format!(
            "{operation} was denied by the service"
        )));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use socialcontext_domain::{HttpMethod, RequestBody};

    use super::*;
    use crate::testing::{credential, Harness};

    fn client(h: &Harness) -> SocialContextClient {
        let dispatcher = AuthenticatedDispatcher::new(
            "http://api.test",
            credential(),
            h.transport.clone(),
            h.provider.clone(),
            h.store.clone(),
        );
        SocialContextClient::new(Arc::new(dispatcher))
    }

    #[tokio::test]
    async fn classify_without_content_makes_no_calls() {
        let h = Harness::default();
        let client = client(&h);

        let err = client.classify(&ClassifyRequest::default()).await.unwrap_err();

        assert!(matches!(err, SocialContextError::InvalidRequest(_)));
        assert_eq!(h.transport.request_count(), 0);
        assert_eq!(h.provider.fetch_count(), 0);
    }

    #[tokio::test]
    async fn news_classify_posts_to_content_route() {
        let h = Harness::default();
        let client = client(&h);

        client.news().classify_url("https://example.com/story", ["political"]).await.unwrap();

        let request = &h.transport.requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "http://api.test/v0.1a/news/classify");
        assert_eq!(
            request.body,
            Some(RequestBody::Json(
                json!({"url": "https://example.com/story", "models": ["political"]})
            ))
        );
    }

    #[tokio::test]
    async fn forbidden_after_reauth_is_unauthorized() {
        let h = Harness::default();
        h.transport.respond(403, json!({})).respond(403, json!({}));
        let client = client(&h);

        let err = client.clients().await.unwrap_err();

        assert!(matches!(err, SocialContextError::Unauthorized(_)));
        assert_eq!(h.transport.request_count(), 2);
        assert_eq!(h.provider.fetch_count(), 2);
    }

    #[tokio::test]
    async fn forbidden_is_passed_through_for_other_operations() {
        let h = Harness::default();
        h.transport.respond(403, json!({})).respond(403, json!({"detail": "no"}));
        let client = client(&h);

        let response = client.account_info().await.unwrap();
        assert_eq!(response.status, 403);
    }

    #[tokio::test]
    async fn job_operations_build_expected_requests() {
        let h = Harness::default();
        let client = client(&h);

        client.jobs().await.unwrap();
        client.job("abc").await.unwrap();
        client.run_job("abc").await.unwrap();
        client.cancel_job("abc").await.unwrap();
        client.execute_job("nightly").await.unwrap();
        client.delete_job("abc").await.unwrap();

        let seen: Vec<(HttpMethod, String)> =
            h.transport.requests().into_iter().map(|r| (r.method, r.url)).collect();
        assert_eq!(
            seen,
            vec![
                (HttpMethod::Get, "http://api.test/v0.1a/jobs".to_string()),
                (HttpMethod::Get, "http://api.test/v0.1a/jobs/abc".to_string()),
                (HttpMethod::Put, "http://api.test/v0.1a/jobs/abc".to_string()),
                (HttpMethod::Put, "http://api.test/v0.1a/jobs/abc".to_string()),
                (HttpMethod::Post, "http://api.test/v0.1a/executions".to_string()),
                (HttpMethod::Delete, "http://api.test/v0.1a/jobs/abc".to_string()),
            ]
        );

        let requests = h.transport.requests();
        assert_eq!(requests[2].body, Some(RequestBody::Json(json!({"action": "schedule"}))));
        assert_eq!(requests[3].body, Some(RequestBody::Json(json!({"action": "cancel"}))));
    }

    #[tokio::test]
    async fn empty_identifiers_are_rejected_locally() {
        let h = Harness::default();
        let client = client(&h);

        assert!(client.job(" ").await.is_err());
        assert!(client.delete_job("").await.is_err());
        assert!(client.create_client("").await.is_err());
        assert!(client.update_job("a/b", json!({})).await.is_err());
        assert!(client.create_job(&JobSpec::new("s3://b/in.csv")).await.is_err());
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn create_job_sends_resolved_body() {
        let h = Harness::default();
        let client = client(&h);
        let spec = JobSpec::new("s3://bucket/in/urls.csv").with_content_models(["political"]);

        client.create_job(&spec).await.unwrap();

        let request = &h.transport.requests()[0];
        let Some(RequestBody::Json(body)) = &request.body else {
            panic!("expected JSON body");
        };
        assert_eq!(body["output_path"], "s3://bucket/in/");
        assert_eq!(body["batch_size"], 1000);
    }

    #[tokio::test]
    async fn clients_and_openapi_use_their_versions() {
        let h = Harness::default();
        let client = client(&h);

        client.create_client("reporting").await.unwrap();
        client.openapi().await.unwrap();

        let urls: Vec<String> = h.transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec!["http://api.test/v0.1/clients", "http://api.test/docs/openapi.json"]
        );
    }

    #[tokio::test]
    async fn model_catalog_parses_listing() {
        let h = Harness::default();
        h.transport.respond(200, json!(["political", "wire"]));
        let client = client(&h);

        let catalog = client.model_catalog().await.unwrap();

        assert!(catalog.contains("wire"));
        assert_eq!(h.transport.requests()[0].url, "http://api.test/v0.1a/models");
    }
}
