//! Content-type scoped endpoint, e.g. `client.news().classify(...)`

use socialcontext_domain::{ClassifyRequest, ContentType, HttpResponse, Result};

use super::client::SocialContextClient;

#[derive(Debug, Clone, Copy)]
pub struct ContentEndpoint<'a> {
    client: &'a SocialContextClient,
    content_type: ContentType,
}

impl<'a> ContentEndpoint<'a> {
    pub(crate) fn new(client: &'a SocialContextClient, content_type: ContentType) -> Self {
        Self { client, content_type }
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Classify with this endpoint's content type, whatever the request says.
    pub async fn classify(&self, request: ClassifyRequest) -> Result<HttpResponse> {
        let request = request.with_content_type(self.content_type);
        self.client.classify(&request).await
    }

    pub async fn classify_url<I, S>(&self, url: &str, models: I) -> Result<HttpResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classify(ClassifyRequest::url(url).with_models(models)).await
    }

    pub async fn classify_text<I, S>(&self, text: &str, models: I) -> Result<HttpResponse>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classify(ClassifyRequest::text(text).with_models(models)).await
    }
}
