//! HTTP surface: Discord's interactions webhook and the health check.

use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mtb_core::{errors::Error, Result};

use crate::{router::AppState, wire::RawInteraction, DiscordResponder};

const HEADER_SIGNATURE: &str = "x-signature-ed25519";
const HEADER_TIMESTAMP: &str = "x-signature-timestamp";

/// Discord drops interactions not acknowledged within three seconds.
pub const INITIAL_RESPONSE_TIMEOUT: Duration = Duration::from_millis(2500);

/// Checks Discord's request signatures against the application public key.
#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn from_hex(public_key: &str) -> Result<Self> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|e| Error::Config(format!("public key is not hex: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::Config("public key must be 32 bytes".to_string()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| Error::Config(format!("invalid public key: {e}")))?;
        Ok(Self { key })
    }

    /// Signature is over `timestamp ‖ body`.
    pub fn verify(&self, signature_hex: &str, timestamp: &str, body: &[u8]) -> bool {
        let Ok(raw) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(raw) = <[u8; 64]>::try_from(raw) else {
            return false;
        };
        let signature = Signature::from_bytes(&raw);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);
        self.key.verify(&message, &signature).is_ok()
    }
}

pub struct ServerState {
    pub app: Arc<AppState>,
    pub responder: Arc<DiscordResponder>,
    pub verifier: SignatureVerifier,
    /// Set once slash commands are registered.
    pub ready: Arc<AtomicBool>,
    pub response_timeout: Duration,
}

#[derive(Debug, PartialEq)]
pub enum Outcome {
    Unauthorized,
    BadRequest,
    Json(Value),
    NoContent,
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "invalid request signature").into_response()
            }
            Outcome::BadRequest => StatusCode::BAD_REQUEST.into_response(),
            Outcome::Json(body) => Json(body).into_response(),
            Outcome::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// Verify, decode and dispatch one webhook request.
///
/// Dispatch runs on its own task; the first response it produces within the
/// timeout becomes the HTTP body.
pub async fn process_interaction(state: &ServerState, headers: &HeaderMap, body: &[u8]) -> Outcome {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let (Some(signature), Some(timestamp)) = (header(HEADER_SIGNATURE), header(HEADER_TIMESTAMP))
    else {
        return Outcome::Unauthorized;
    };
    if !state.verifier.verify(signature, timestamp, body) {
        return Outcome::Unauthorized;
    }

    let raw: RawInteraction = match serde_json::from_slice(body) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("undecodable interaction: {e}");
            return Outcome::BadRequest;
        }
    };
    if raw.is_ping() {
        return Outcome::Json(crate::wire::pong());
    }

    let interaction = match raw.into_interaction() {
        Ok(Some(interaction)) => interaction,
        Ok(None) => return Outcome::NoContent,
        Err(e) => {
            warn!("unusable interaction: {e}");
            return Outcome::BadRequest;
        }
    };

    let id = interaction.id.clone();
    let rx = state.responder.register(&id).await;
    {
        let app = state.app.clone();
        let responder = state.responder.clone();
        let id = id.clone();
        tokio::spawn(async move {
            crate::router::dispatch(app, interaction).await;
            responder.forget(&id).await;
        });
    }

    match tokio::time::timeout(state.response_timeout, rx).await {
        Ok(Ok(body)) => Outcome::Json(body),
        Ok(Err(_)) => {
            debug!(interaction = %id, "no initial response");
            Outcome::NoContent
        }
        Err(_) => {
            warn!(interaction = %id, "initial response timed out");
            state.responder.forget(&id).await;
            Outcome::NoContent
        }
    }
}

async fn interactions(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Outcome {
    process_interaction(&state, &headers, &body).await
}

pub fn health_status(ready: &AtomicBool) -> (StatusCode, &'static str) {
    if ready.load(Ordering::SeqCst) {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")
    }
}

async fn health(State(state): State<Arc<ServerState>>) -> (StatusCode, &'static str) {
    health_status(&state.ready)
}

pub fn app(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/interactions", post(interactions))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve until `shutdown` is cancelled.
pub async fn serve(
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let server = axum::Server::try_bind(&addr)
        .with_context(|| format!("failed to bind {addr}"))?
        .serve(app(state).into_make_service());
    info!("listening on {addr}");

    server
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("http server error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{FakeGithub, StaticModals};
    use ed25519_dalek::{Signer, SigningKey};
    use mtb_core::domain::RepoRef;
    use serde_json::json;

    struct Fixture {
        state: ServerState,
        key: SigningKey,
    }

    fn fixture() -> Fixture {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let responder = Arc::new(DiscordResponder::new("app", Duration::from_secs(1)).unwrap());
        let app = Arc::new(AppState::new(
            Arc::new(FakeGithub::default()),
            Arc::new(StaticModals { modals: Vec::new() }),
            responder.clone(),
            None,
            RepoRef::new("meshtastic", "firmware"),
            Duration::from_secs(60),
            Duration::from_secs(60),
        ));
        let verifier =
            SignatureVerifier::from_hex(&hex::encode(key.verifying_key().to_bytes())).unwrap();
        Fixture {
            state: ServerState {
                app,
                responder,
                verifier,
                ready: Arc::new(AtomicBool::new(false)),
                response_timeout: Duration::from_millis(500),
            },
            key,
        }
    }

    fn signed(key: &SigningKey, body: &[u8]) -> HeaderMap {
        let timestamp = "1700000000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        let signature = key.sign(&message);

        let mut headers = HeaderMap::new();
        headers.insert(
            HEADER_SIGNATURE,
            hex::encode(signature.to_bytes()).parse().unwrap(),
        );
        headers.insert(HEADER_TIMESTAMP, timestamp.parse().unwrap());
        headers
    }

    fn command_body(name: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": format!("id-{name}"), "type": 2, "token": "tok", "channel_id": "chan",
            "member": { "user": { "id": "u1", "username": "alice" } },
            "data": { "name": name }
        }))
        .unwrap()
    }

    #[test]
    fn verifier_rejects_tampering() {
        let f = fixture();
        let headers = signed(&f.key, b"{}");
        let sig = headers[HEADER_SIGNATURE].to_str().unwrap();
        assert!(f.state.verifier.verify(sig, "1700000000", b"{}"));
        assert!(!f.state.verifier.verify(sig, "1700000000", b"{ }"));
        assert!(!f.state.verifier.verify(sig, "1700000001", b"{}"));
        assert!(!f.state.verifier.verify("zz", "1700000000", b"{}"));
        assert!(SignatureVerifier::from_hex("abcd").is_err());
    }

    #[tokio::test]
    async fn unsigned_requests_are_unauthorized() {
        let f = fixture();
        let body = br#"{"id":"p","type":1}"#;
        assert_eq!(
            process_interaction(&f.state, &HeaderMap::new(), body).await,
            Outcome::Unauthorized
        );

        let other = SigningKey::from_bytes(&[9u8; 32]);
        let headers = signed(&other, body);
        assert_eq!(
            process_interaction(&f.state, &headers, body).await,
            Outcome::Unauthorized
        );
    }

    #[tokio::test]
    async fn ping_gets_pong() {
        let f = fixture();
        let body = br#"{"id":"p","type":1}"#;
        let headers = signed(&f.key, body);
        assert_eq!(
            process_interaction(&f.state, &headers, body).await,
            Outcome::Json(json!({ "type": 1 }))
        );
    }

    #[tokio::test]
    async fn command_response_becomes_http_body() {
        let f = fixture();
        let body = command_body("tapsign");
        let headers = signed(&f.key, &body);

        let Outcome::Json(response) = process_interaction(&f.state, &headers, &body).await else {
            panic!("expected json");
        };
        assert_eq!(response["type"], 4);
        assert!(response["data"]["content"]
            .as_str()
            .unwrap()
            .contains("/changelog"));
    }

    #[tokio::test]
    async fn unanswered_interaction_is_no_content() {
        let f = fixture();
        let body = command_body("unknown");
        let headers = signed(&f.key, &body);
        assert_eq!(
            process_interaction(&f.state, &headers, &body).await,
            Outcome::NoContent
        );
    }

    #[tokio::test]
    async fn garbage_body_is_bad_request() {
        let f = fixture();
        let body = b"not json";
        let headers = signed(&f.key, body);
        assert_eq!(
            process_interaction(&f.state, &headers, body).await,
            Outcome::BadRequest
        );
    }

    #[test]
    fn health_reflects_readiness() {
        let ready = AtomicBool::new(false);
        assert_eq!(
            health_status(&ready),
            (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")
        );
        ready.store(true, Ordering::SeqCst);
        assert_eq!(health_status(&ready), (StatusCode::OK, "OK"));
    }
}
