//! Batch job payloads

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE, MIN_BATCH_SIZE};
use crate::errors::{Result, SocialContextError};
use crate::types::classify::ContentType;

/// Batch job definition submitted to `jobs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,

    /// File of URLs, readable by the remote batch system
    pub input_file: String,

    /// Output location; defaults to the input file's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,

    #[serde(default)]
    pub content_type: ContentType,

    /// Rows per written batch, coerced into the supported range
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default)]
    pub content_models: Vec<String>,
    #[serde(default)]
    pub domain_models: Vec<String>,

    /// Reserved for administrative use
    #[serde(default)]
    pub options: Vec<String>,
}

fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}

impl JobSpec {
    pub fn new(input_file: impl Into<String>) -> Self {
        Self {
            job_name: None,
            input_file: input_file.into(),
            output_path: None,
            content_type: ContentType::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            content_models: Vec::new(),
            domain_models: Vec::new(),
            options: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_content_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content_models = models.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_domain_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domain_models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Merge a named profile into this spec, dropping duplicates.
    pub fn apply_profile(&mut self, profile: &JobProfile) {
        merge_unique(&mut self.content_models, &profile.content_models);
        merge_unique(&mut self.domain_models, &profile.domain_models);
        merge_unique(&mut self.options, &profile.options);
    }

    /// Output path sent to the service.
    ///
    /// Without an explicit value this is the directory part of
    /// `input_file`, always with a trailing `/`.
    pub fn resolved_output_path(&self) -> String {
        match self.output_path.as_deref().filter(|p| !p.is_empty()) {
            Some(path) => path.to_string(),
            None => match self.input_file.rfind('/') {
                Some(idx) => self.input_file[..=idx].to_string(),
                None => "/".to_string(),
            },
        }
    }

    pub fn clamped_batch_size(&self) -> u32 {
        self.batch_size.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE)
    }

    /// Check the shape of the job before submission.
    ///
    /// # Errors
    /// `InvalidRequest` for an empty input file or when no model of either
    /// category was requested.
    pub fn validate(&self) -> Result<()> {
        if self.input_file.trim().is_empty() {
            return Err(SocialContextError::InvalidRequest("input file is required".into()));
        }

        let has_models = self.content_models.iter().chain(&self.domain_models).any(|m| !m.trim().is_empty());
        if !has_models {
            return Err(SocialContextError::InvalidRequest(
                "at least one content model or domain model is required".into(),
            ));
        }

        Ok(())
    }

    /// Validated JSON body for `POST jobs`.
    pub fn to_body(&self) -> Result<Value> {
        self.validate()?;

        let mut body = json!({
            "input_file": self.input_file,
            "output_path": self.resolved_output_path(),
            "content_type": self.content_type,
            "batch_size": self.clamped_batch_size(),
            "content_models": non_empty(&self.content_models),
            "domain_models": non_empty(&self.domain_models),
            "options": self.options,
        });

        if let (Some(name), Value::Object(map)) = (&self.job_name, &mut body) {
            map.insert("job_name".to_string(), Value::String(name.clone()));
        }

        Ok(body)
    }
}

fn non_empty(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).filter(|v| !v.trim().is_empty()).collect()
}

fn merge_unique(target: &mut Vec<String>, extra: &[String]) {
    for value in extra {
        if !target.contains(value) {
            target.push(value.clone());
        }
    }
}

/// Reusable job settings stored under `profiles.{name}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobProfile {
    pub content_models: Vec<String>,
    pub domain_models: Vec<String>,
    pub options: Vec<String>,
}

/// State change requested through `PUT jobs/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    /// Run a cancelled or failed job again
    Schedule,
    Cancel,
}

impl JobAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Cancel => "cancel",
        }
    }

    pub fn to_body(&self) -> Value {
        json!({ "action": self.as_str() })
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
