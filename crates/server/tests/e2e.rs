use std::net::SocketAddr;
use std::sync::Arc;

use httpmock::prelude::*;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;

use server::startup::build_app;
use server::state::AppState;
use service::neynar::NeynarClient;
use service::signing::AppSigner;
use service::errors::ServiceError;
use service::neynar::SignerRecord;
use service::storage::{MemorySignerStore, SignerStore};

const MNEMONIC: &str = "test test test test test test test test test test test junk";
const PUBLIC_KEY: &str = "0x3daa8f99c5f2c8d7a6ec1b34b1c2e9d0b7f1a2c3d4e5f60718293a4b5c6d7e8f";

struct TestApp {
    base_url: String,
    neynar: MockServer,
    signers: Arc<MemorySignerStore>,
}

/// Signer cache whose writes always fail.
struct ReadOnlySignerStore;

#[async_trait::async_trait]
impl SignerStore for ReadOnlySignerStore {
    async fn put_if_absent(&self, _fid: u64, _record: SignerRecord) -> Result<bool, ServiceError> {
        Err(ServiceError::Storage("read-only file system".into()))
    }

    async fn get(&self, _fid: u64) -> Result<Option<SignerRecord>, ServiceError> {
        Ok(None)
    }
}

async fn serve(state: AppState) -> anyhow::Result<String> {
    let app = build_app(state);
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(format!("http://{}:{}", addr.ip(), addr.port()))
}

async fn start_server(with_identity: bool) -> anyhow::Result<TestApp> {
    let neynar = MockServer::start_async().await;
    let signers = Arc::new(MemorySignerStore::new());
    let app_signer = if with_identity {
        Some(Arc::new(AppSigner::from_mnemonic(42, MNEMONIC)?))
    } else {
        None
    };

    let state = AppState {
        neynar: NeynarClient::with_client(reqwest::Client::new(), &neynar.base_url(), "test-key"),
        signers: Arc::clone(&signers) as Arc<dyn SignerStore>,
        app_signer,
    };

    let base_url = serve(state).await?;
    Ok(TestApp { base_url, neynar, signers })
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_cast_missing_fields_is_bad_request() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    let upstream = app.neynar.mock_async(|_when, then| { then.status(200); }).await;

    let res = client()
        .post(format!("{}/api/cast", app.base_url))
        .json(&json!({"signerUuid": "s-1"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["message"], "Request body missing");

    let res = client()
        .post(format!("{}/api/cast", app.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);

    assert_eq!(upstream.hits_async().await, 0);
    Ok(())
}

#[tokio::test]
async fn e2e_cast_returns_hash() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    let cast = app
        .neynar
        .mock_async(|when, then| {
            when.method(POST)
                .path("/cast")
                .header("api_key", "test-key")
                .json_body(json!({"signer_uuid": "s-1", "text": "gm", "parent": "https://warpcast.com/~/channel/dev"}));
            then.status(200).json_body(json!({"success": true, "cast": {"hash": "0xfeed"}}));
        })
        .await;

    let res = client()
        .post(format!("{}/api/cast", app.base_url))
        .json(&json!({"signerUuid": "s-1", "content": "gm", "parent": "https://warpcast.com/~/channel/dev"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body, json!({"status": 200, "hash": "0xfeed"}));
    cast.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn e2e_cast_resolves_channel_field() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    app.neynar
        .mock_async(|when, then| {
            when.method(GET).path("/channel").query_param("id", "memes");
            then.status(200).json_body(json!({"channel": {"id": "memes", "url": "chain://eip155:1/erc721:0xfd8427165df67df6d7fd689ae67c8ebf56d9ca61"}}));
        })
        .await;
    let cast = app
        .neynar
        .mock_async(|when, then| {
            when.method(POST)
                .path("/cast")
                .json_body_partial(r#"{"parent": "chain://eip155:1/erc721:0xfd8427165df67df6d7fd689ae67c8ebf56d9ca61"}"#);
            then.status(200).json_body(json!({"cast": {"hash": "0xbeef"}}));
        })
        .await;

    let res = client()
        .post(format!("{}/api/cast", app.base_url))
        .json(&json!({"signerUuid": "s-1", "content": "lol", "channel": "/memes"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    cast.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn e2e_cast_upstream_failure_is_generic_server_error() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    app.neynar
        .mock_async(|when, then| {
            when.method(POST).path("/cast");
            then.status(400).json_body(json!({"message": "Signer is not approved"}));
        })
        .await;

    let res = client()
        .post(format!("{}/api/cast", app.base_url))
        .json(&json!({"signerUuid": "s-1", "content": "gm"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body, json!({"error": "internal_error", "message": "Unable to send cast"}));
    Ok(())
}

#[tokio::test]
async fn e2e_connect_returns_signer_and_deeplink() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    let create = app
        .neynar
        .mock_async(|when, then| {
            when.method(POST).path("/signer").header("api_key", "test-key");
            then.status(200).json_body(json!({"signer_uuid": "uuid-9", "public_key": PUBLIC_KEY, "status": "generated"}));
        })
        .await;
    let register = app
        .neynar
        .mock_async(|when, then| {
            when.method(POST)
                .path("/signer/signed_key")
                .json_body_partial(r#"{"signer_uuid": "uuid-9", "app_fid": 42}"#);
            then.status(200).json_body(json!({
                "signer_uuid": "uuid-9",
                "public_key": PUBLIC_KEY,
                "status": "pending_approval",
                "signer_approval_url": "https://client.warpcast.com/deeplinks/signed-key-request?token=abc"
            }));
        })
        .await;

    let res = client().post(format!("{}/api/connect", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], 200);
    assert_eq!(body["signerUuid"], "uuid-9");
    assert_eq!(body["deeplinkUrl"], "https://client.warpcast.com/deeplinks/signed-key-request?token=abc");
    create.assert_async().await;
    register.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn e2e_connect_without_identity_fails_before_upstream() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    let upstream = app.neynar.mock_async(|_when, then| { then.status(200); }).await;

    let res = client().post(format!("{}/api/connect", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(upstream.hits_async().await, 0);
    Ok(())
}

#[tokio::test]
async fn e2e_connect_registration_failure() -> anyhow::Result<()> {
    let app = start_server(true).await?;
    app.neynar
        .mock_async(|when, then| {
            when.method(POST).path("/signer");
            then.status(200).json_body(json!({"signer_uuid": "uuid-9", "public_key": PUBLIC_KEY, "status": "generated"}));
        })
        .await;
    app.neynar
        .mock_async(|when, then| {
            when.method(POST).path("/signer/signed_key");
            then.status(500);
        })
        .await;

    let res = client().post(format!("{}/api/connect", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Failed to register signed key");
    Ok(())
}

#[tokio::test]
async fn e2e_signer_status_requires_uuid() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    let upstream = app.neynar.mock_async(|_when, then| { then.status(200); }).await;

    let res = client().get(format!("{}/api/signer", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    assert_eq!(upstream.hits_async().await, 0);
    Ok(())
}

#[tokio::test]
async fn e2e_signer_status_pending_includes_deeplink() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    app.neynar
        .mock_async(|when, then| {
            when.method(GET).path("/signer").query_param("signer_uuid", "p-1").header("api_key", "test-key");
            then.status(200).json_body(json!({
                "signer_uuid": "p-1",
                "public_key": PUBLIC_KEY,
                "status": "pending_approval",
                "signer_approval_url": "https://deeplink/p-1"
            }));
        })
        .await;

    let res = client().get(format!("{}/api/signer?signer_uuid=p-1", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(
        body,
        json!({"status": 200, "uuid": "p-1", "signerStatus": "pending_approval", "deeplink": "https://deeplink/p-1"})
    );
    assert!(app.signers.is_empty());
    Ok(())
}

#[tokio::test]
async fn e2e_signer_status_approved_is_cached_once() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    app.neynar
        .mock_async(|when, then| {
            when.method(GET).path("/signer").query_param("signer_uuid", "a-1");
            then.status(200).json_body(json!({"signer_uuid": "a-1", "public_key": PUBLIC_KEY, "status": "approved", "fid": 1001}));
        })
        .await;
    app.neynar
        .mock_async(|when, then| {
            when.method(GET).path("/signer").query_param("signer_uuid", "a-2");
            then.status(200).json_body(json!({"signer_uuid": "a-2", "public_key": PUBLIC_KEY, "status": "approved", "fid": 1001}));
        })
        .await;

    for uuid in ["a-1", "a-2"] {
        let res = client()
            .get(format!("{}/api/signer?signer_uuid={}", app.base_url, uuid))
            .send()
            .await?;
        assert_eq!(res.status(), HttpStatusCode::OK);
        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["uuid"], uuid);
        assert_eq!(body["fid"], 1001);
        assert!(body.get("deeplink").is_none());
    }

    assert_eq!(app.signers.len(), 1);
    let cached = app.signers.get(1001).await?.expect("cached signer");
    assert_eq!(cached.signer_uuid, "a-1");
    Ok(())
}

#[tokio::test]
async fn e2e_signer_status_malformed_upstream_writes_nothing() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    app.neynar
        .mock_async(|when, then| {
            when.method(GET).path("/signer");
            then.status(200).json_body(json!({"status": "approved", "fid": 5}));
        })
        .await;

    let res = client().get(format!("{}/api/signer?signer_uuid=x", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Failed to get signer connection status");
    assert!(app.signers.is_empty());
    Ok(())
}

#[tokio::test]
async fn e2e_signer_status_cache_write_failure_is_server_error() -> anyhow::Result<()> {
    let neynar = MockServer::start_async().await;
    neynar
        .mock_async(|when, then| {
            when.method(GET).path("/signer").query_param("signer_uuid", "a-5");
            then.status(200).json_body(json!({"signer_uuid": "a-5", "public_key": PUBLIC_KEY, "status": "approved", "fid": 55}));
        })
        .await;
    let base_url = serve(AppState {
        neynar: NeynarClient::with_client(reqwest::Client::new(), &neynar.base_url(), "test-key"),
        signers: Arc::new(ReadOnlySignerStore),
        app_signer: None,
    })
    .await?;

    let res = client().get(format!("{}/api/signer?signer_uuid=a-5", base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "internal_error");
    assert_eq!(body["message"], "Failed to get signer connection status");
    Ok(())
}

#[tokio::test]
async fn e2e_metrics_exposes_relay_counters() -> anyhow::Result<()> {
    let app = start_server(false).await?;
    let res = client().get(format!("{}/metrics", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let text = res.text().await?;
    assert!(text.contains("farcaster_relay_casts_total"));
    assert!(text.contains("farcaster_relay_signers_created_total"));
    Ok(())
}
