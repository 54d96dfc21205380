//! Command handlers. Each handler makes its calls through the one client
//! built in `main` and returns a [`Reply`] for printing.

mod clients;
mod jobs;
mod token;

use anyhow::bail;
use serde_json::Value;
use socialcontext_core::SocialContextClient;
use socialcontext_domain::{ApiVersion, ClassifyRequest, HttpResponse};
use tracing::{instrument, warn};

pub use clients::ClientsAction;
pub use jobs::JobsAction;
pub use token::TokenAction;

use crate::Commands;

/// Result of a command, ready to print
#[derive(Debug)]
pub enum Reply {
    Response(HttpResponse),
    Value(Value),
}

impl Reply {
    /// JSON shown to the user. Non-JSON bodies are shown as a string.
    pub fn body(&self) -> Value {
        match self {
            Self::Response(response) if response.body.is_empty() => Value::Null,
            Self::Response(response) => serde_json::from_slice(&response.body)
                .unwrap_or_else(|_| Value::String(response.text())),
            Self::Value(value) => value.clone(),
        }
    }

    /// Fail with the response status when the service did not succeed.
    pub fn ensure_success(&self) -> anyhow::Result<()> {
        match self {
            Self::Response(response) if !response.is_success() => {
                bail!("service returned status {}", response.status)
            }
            _ => Ok(()),
        }
    }
}

pub async fn execute(command: Commands, client: &SocialContextClient) -> anyhow::Result<Reply> {
    let reply = match command {
        Commands::Version => Value::from(ApiVersion::default().prefix()).into(),
        Commands::Models => client.models().await?.into(),
        Commands::Classify { content_type, url, text, models } => {
            classify(client, ClassifyRequest { content_type, url, text, models }).await?
        }
        Commands::Account => client.account_info().await?.into(),
        Commands::Clients { action } => clients::handle(action, client).await?,
        Commands::Jobs { action } => jobs::handle(action, client).await?,
        Commands::Token { action } => token::handle(action, client).await?,
        Commands::Openapi => client.openapi().await?.into(),
    };

    Ok(reply)
}

/// Classify after checking the models against the service's catalogue.
#[instrument(skip_all, fields(models = request.models.len()))]
async fn classify(client: &SocialContextClient, request: ClassifyRequest) -> anyhow::Result<Reply> {
    request.source()?;
    if !request.models.is_empty() {
        check_models(client, &request.models).await?;
    }
    Ok(client.classify(&request).await?.into())
}

/// Validate `requested` against the live catalogue.
///
/// Returns the offered models this build has no [`Model`] for; each one is
/// logged at `warn`.
///
/// [`Model`]: socialcontext_domain::Model
pub(crate) async fn check_models(
    client: &SocialContextClient,
    requested: &[String],
) -> anyhow::Result<Vec<String>> {
    let catalog = client.model_catalog().await?;
    let unrecognized: Vec<String> =
        catalog.unrecognized().into_iter().map(str::to_string).collect();
    for model in &unrecognized {
        warn!(model = %model, "service offers a model this client does not know");
    }
    catalog.validate(requested)?;
    Ok(unrecognized)
}

impl From<HttpResponse> for Reply {
    fn from(response: HttpResponse) -> Self {
        Self::Response(response)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}
