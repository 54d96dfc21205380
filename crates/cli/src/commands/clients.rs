//! `socialcontext clients ...`

use clap::Subcommand;
use socialcontext_core::SocialContextClient;

use super::Reply;

#[derive(Debug, Subcommand)]
pub enum ClientsAction {
    /// List API clients for the account.
    List,
    /// Create a new API client.
    Create {
        /// Display name of the new client.
        name: String,
    },
}

pub async fn handle(action: ClientsAction, client: &SocialContextClient) -> anyhow::Result<Reply> {
    let response = match action {
        ClientsAction::List => client.clients().await?,
        ClientsAction::Create { name } => client.create_client(&name).await?,
    };
    Ok(response.into())
}
