//! `socialcontext token ...`

use clap::Subcommand;
use serde_json::json;
use socialcontext_core::SocialContextClient;

use super::Reply;

#[derive(Debug, Subcommand)]
pub enum TokenAction {
    /// Remove the cached token so the next command authenticates again.
    Clear,
}

pub async fn handle(action: TokenAction, client: &SocialContextClient) -> anyhow::Result<Reply> {
    match action {
        TokenAction::Clear => {
            client.clear_token().await?;
            Ok(json!({ "cleared": client.dispatcher().client_id() }).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::Fixture;

    #[tokio::test]
    async fn clear_reports_client_id_without_network() {
        let fixture = Fixture::new().await;

        let reply = handle(TokenAction::Clear, &fixture.client).await.unwrap();

        assert_eq!(reply.body(), json!({"cleared": "cli-app"}));
        assert!(fixture.paths().await.is_empty());
    }
}
