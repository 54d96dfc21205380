//! Classification request payloads

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{Result, SocialContextError};

/// Kind of content the service can classify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    News,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::News => "news",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = SocialContextError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(Self::News),
            other => Err(SocialContextError::InvalidRequest(format!(
                "unsupported content type '{other}' (only 'news' is supported)"
            ))),
        }
    }
}

/// The single piece of content a classify call carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Url(String),
    Text(String),
}

impl ContentSource {
    fn key(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Text(_) => "text",
        }
    }

    fn value(&self) -> &str {
        match self {
            Self::Url(v) | Self::Text(v) => v,
        }
    }
}

/// Classify request as supplied by a caller
///
/// Exactly one of `url` and `text` must be set; empty strings count as
/// unset. The check happens in [`ClassifyRequest::source`], which endpoint
/// code calls before anything touches the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
}

impl ClassifyRequest {
    pub fn url(url: impl Into<String>) -> Self {
        Self { url: Some(url.into()), ..Self::default() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Self::default() }
    }

    #[must_use]
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Resolve which content the request carries.
    ///
    /// # Errors
    /// `InvalidRequest` when neither or both of url and text are set.
    pub fn source(&self) -> Result<ContentSource> {
        let url = self.url.as_deref().filter(|v| !v.trim().is_empty());
        let text = self.text.as_deref().filter(|v| !v.trim().is_empty());

        match (url, text) {
            (Some(url), None) => Ok(ContentSource::Url(url.to_string())),
            (None, Some(text)) => Ok(ContentSource::Text(text.to_string())),
            (None, None) => {
                Err(SocialContextError::InvalidRequest("url or text parameter required".into()))
            }
            (Some(_), Some(_)) => Err(SocialContextError::InvalidRequest(
                "url and text are mutually exclusive".into(),
            )),
        }
    }

    /// JSON body sent to `{content_type}/classify`.
    pub fn to_body(&self) -> Result<Value> {
        let source = self.source()?;
        let mut body = json!({ "models": self.models });
        if let Value::Object(map) = &mut body {
            map.insert(source.key().to_string(), Value::String(source.value().to_string()));
        }
        Ok(body)
    }

    /// Resource path, relative to the API version.
    pub fn path(&self) -> String {
        format!("{}/classify", self.content_type)
    }
}
