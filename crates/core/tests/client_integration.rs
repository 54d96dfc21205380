//! Integration tests for SocialContextClient over in-memory ports
//!
//! **Coverage:**
//! - Shared client used from several tasks at once
//! - Token invalidation in the middle of a run of requests
//! - Eager connect followed by requests
//!
//! **Infrastructure:**
//! - `socialcontext_core::testing` doubles (scripted transport, counting
//!   provider, memory store)

use std::sync::Arc;

use serde_json::json;
use socialcontext_core::testing::{credential, token, CountingTokenProvider, Harness, MemoryTokenStore};
use socialcontext_core::{AuthenticatedDispatcher, DispatchState, ReauthPolicy, SocialContextClient};
use socialcontext_domain::ClassifyRequest;

// ============================================================================
// Helpers
// ============================================================================

fn build(h: &Harness, policy: ReauthPolicy) -> SocialContextClient {
    let dispatcher = AuthenticatedDispatcher::new(
        "https://api.test/",
        credential(),
        h.transport.clone(),
        h.provider.clone(),
        h.store.clone(),
    )
    .with_policy(policy);
    SocialContextClient::new(Arc::new(dispatcher))
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn parallel_classify_calls_share_one_token() {
    let h = Harness::default();
    let client = build(&h, ReauthPolicy::default());
    client.connect().await.unwrap();

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client.news().classify_text(&format!("story {i}"), ["political"]).await
            })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.status, 200);
    }

    assert_eq!(h.provider.fetch_count(), 1);
    assert_eq!(h.transport.request_count(), 5);
    assert!(h.transport.bearer_tokens().iter().all(|t| t == "Bearer token-1"));
}

#[tokio::test]
async fn token_rotation_mid_session_is_transparent() {
    let h = Harness::new(
        CountingTokenProvider::new(),
        MemoryTokenStore::new().with_token("test-app", token("first")),
    );
    h.transport
        .respond(200, json!({"n": 1}))
        .respond(401, json!({}))
        .respond(200, json!({"n": 2}))
        .respond(200, json!({"n": 3}));
    let client = build(&h, ReauthPolicy::default());

    for expected in 1..=3 {
        let response = client.account_info().await.unwrap();
        assert_eq!(response.json::<serde_json::Value>().unwrap()["n"], expected);
    }

    assert_eq!(
        h.transport.bearer_tokens(),
        vec!["Bearer first", "Bearer first", "Bearer token-1", "Bearer token-1"]
    );
    assert_eq!(h.store.get("test-app").unwrap().access_token, "token-1");
    assert_eq!(client.dispatcher().state(), DispatchState::Authenticated);
}

#[tokio::test]
async fn invalid_request_never_authenticates() {
    let h = Harness::default();
    let client = build(&h, ReauthPolicy::default());

    let both = ClassifyRequest { url: Some("u".into()), text: Some("t".into()), ..Default::default() };
    assert!(client.classify(&both).await.is_err());

    assert_eq!(client.dispatcher().state(), DispatchState::Unauthenticated);
    assert_eq!(h.provider.fetch_count(), 0);
}

#[tokio::test]
async fn clear_token_forces_new_exchange() {
    let h = Harness::default();
    let client = build(&h, ReauthPolicy::new([401]));

    client.account_info().await.unwrap();
    client.clear_token().await.unwrap();
    client.account_info().await.unwrap();

    assert_eq!(h.provider.fetch_count(), 2);
    assert_eq!(h.transport.bearer_tokens(), vec!["Bearer token-1", "Bearer token-2"]);
}
