//! Credential verification and authentication middleware.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use critic_core::Identity;
use critic_core::config::AuthConfig;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the request's trace ID, in both directions.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Maximum length for trace IDs.
/// Longer trace IDs are truncated to prevent log bloat and log injection.
const MAX_TRACE_ID_LEN: usize = 128;

/// Accepted signing algorithms. Anything outside the HMAC family is rejected.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value, truncated and
    /// restricted to printable ASCII.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    /// Get the trace ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Claims carried by a credential. Both identity claims must be present with
/// the right JSON type; nothing is coerced.
#[derive(Debug, Deserialize)]
struct Claims {
    user_id: i64,
    username: String,
}

/// Verifies signed credentials and extracts the caller's identity.
#[derive(Clone)]
pub struct TokenAuthenticator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenAuthenticator {
    /// Build an authenticator from configuration.
    pub fn new(config: &AuthConfig) -> critic_core::Result<Self> {
        config.validate().map_err(critic_core::Error::Config)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = config.leeway_secs;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        })
    }

    /// Verify a credential and return the identity it names.
    ///
    /// Fails when the signature does not verify, the algorithm is not HMAC,
    /// the credential has expired, or `user_id`/`username` are missing or
    /// mistyped.
    pub fn verify(&self, credential: &str) -> critic_core::Result<Identity> {
        let data = jsonwebtoken::decode::<Claims>(credential, &self.key, &self.validation)
            .map_err(|e| critic_core::Error::InvalidCredential(e.to_string()))?;
        Ok(Identity::new(data.claims.user_id, data.claims.username))
    }
}

/// Authenticated request extension.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    /// The verified caller.
    pub identity: Identity,
}

/// Request extension recording why a presented credential was refused.
#[derive(Clone, Debug)]
struct RejectedCredential(String);

/// Extract the credential from the Authorization header.
///
/// Accepts `Bearer <token>` (scheme case-insensitive) as well as a bare token.
fn extract_credential(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = if value.len() >= 7 && value[..7].eq_ignore_ascii_case("bearer ") {
        value[7..].trim()
    } else {
        value
    };
    (!token.is_empty()).then_some(token)
}

/// Extract trace ID from X-Trace-Id header or generate a new one.
fn extract_or_generate_trace_id(req: &Request) -> TraceId {
    req.headers()
        .get(TRACE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Authentication middleware that verifies credentials and sets up trace context.
///
/// A missing or invalid credential does not fail the request here; guarded
/// handlers reject it through [`require_auth`], so unauthenticated routes
/// stay reachable. The trace ID is echoed on every response.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let trace_id = extract_or_generate_trace_id(&req);
    let trace_id_str = trace_id.as_str().to_string();

    let verified =
        extract_credential(&req).map(|credential| state.authenticator.verify(credential));

    match verified {
        Some(Ok(identity)) => {
            req.extensions_mut().insert(AuthenticatedUser { identity });
        }
        Some(Err(e)) => {
            tracing::debug!(trace_id = %trace_id_str, error = %e, "credential rejected");
            crate::metrics::record_auth_failure("invalid_credential");
            req.extensions_mut().insert(RejectedCredential(e.to_string()));
        }
        None => {}
    }

    let mut response = next
        .run(req)
        .instrument(tracing::info_span!("request", trace_id = %trace_id_str))
        .await;

    if let Ok(value) = HeaderValue::from_str(trace_id.as_str()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

/// Require authentication (a verified credential must be present).
pub fn require_auth(req: &Request) -> ApiResult<&AuthenticatedUser> {
    if let Some(user) = req.extensions().get::<AuthenticatedUser>() {
        return Ok(user);
    }
    match req.extensions().get::<RejectedCredential>() {
        Some(RejectedCredential(reason)) => Err(ApiError::Unauthorized(reason.clone())),
        None => {
            crate::metrics::record_auth_failure("missing_credential");
            Err(ApiError::Unauthorized("authentication required".to_string()))
        }
    }
}
