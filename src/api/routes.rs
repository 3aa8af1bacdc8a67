use crate::admin::TokenGrant;
use crate::api::api_error::APIError;
use crate::api::model::{CreatedToken, LogLevelChange, TokenDetail, TokenSummary, Whoami};
use crate::api::request_id;
use crate::api::server::AppState;
use crate::auth::{self, BootstrapState, Decision};
use crate::error::Error;
use crate::token_store::TokenId;
use crate::upstream::{UpstreamRequest, UpstreamResponse, ACCESS_KEY_HEADER};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the HTTP router: health and readiness checks, Admin API under `/admin/api`, and the
/// DNS proxy for every other path.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/tokens", get(list_tokens).post(create_token))
        .route("/tokens/:id", get(get_token).delete(delete_token))
        .route("/whoami", get(whoami))
        .route("/loglevel", post(set_log_level));

    Router::new()
        .route("/healthcheck", get(health_check))
        .route("/ready", get(ready))
        .nest("/admin/api", admin)
        .fallback(proxy)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http().make_span_with(request_id::request_span))
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(middleware::map_request(request_id::drop_invalid))
        .with_state(state)
}

/// The presented credential: a non-blank `AccessKey` header, otherwise a bearer `Authorization`
/// header. A header that isn't valid text is an invalid key rather than a missing one.
fn credential(headers: &HeaderMap) -> Result<Option<&str>, Error> {
    if let Some(key) = header_text(headers, ACCESS_KEY_HEADER)? {
        if !key.trim().is_empty() {
            return Ok(Some(key));
        }
    }
    Ok(header_text(headers, AUTHORIZATION.as_str())?.and_then(|v| v.strip_prefix("Bearer ")))
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, Error> {
    headers
        .get(name)
        .map(|value| value.to_str().map_err(|_| Error::InvalidApiKey))
        .transpose()
}

fn parse_token_id(id: &str) -> Result<TokenId, Error> {
    id.parse()
        .map_err(|_| Error::InvalidRequest(format!("invalid token id {id:?}")))
}

#[allow(clippy::unused_async)]
async fn health_check() -> impl IntoResponse {
    Json(json!({"ok":"healthy"}))
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.tokens.read().await.check_ready().await {
        Ok(()) => (StatusCode::OK, Json(json!({"status":"ok"}))),
        Err(err) => {
            tracing::warn!("token store not ready: {err:#}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status":"not_ready","error":"token store unavailable"})),
            )
        }
    }
}

async fn create_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedToken>), APIError> {
    let caller = state.admin.authenticate(credential(&headers)?).await?;
    let grant: TokenGrant = serde_json::from_slice(&body).map_err(Error::MalformedRequest)?;
    let issued = state.admin.create_token(&caller, grant).await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

async fn list_tokens(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<TokenSummary>>, APIError> {
    state.admin.authenticate(credential(&headers)?).await?;
    let tokens = state.admin.list_tokens().await;
    Ok(Json(tokens.into_iter().map(TokenSummary::from).collect()))
}

async fn get_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<TokenDetail>, APIError> {
    state.admin.authenticate(credential(&headers)?).await?;
    let token = state.admin.get_token(parse_token_id(&id)?).await?;
    Ok(Json(token.into()))
}

async fn delete_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, APIError> {
    let caller = state.admin.authenticate(credential(&headers)?).await?;
    state
        .admin
        .delete_token(&caller, parse_token_id(&id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_log_level(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<LogLevelChange>, APIError> {
    let caller = state.admin.authenticate(credential(&headers)?).await?;
    state.admin.require_admin(&caller).await?;
    let change: LogLevelChange = serde_json::from_slice(&body).map_err(Error::MalformedRequest)?;
    state.log_filter.set_level(change.level)?;
    tracing::info!("{caller} set log level to {}", change.level);
    Ok(Json(change))
}

async fn whoami(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Whoami>, APIError> {
    let identity = state.admin.authenticate(credential(&headers)?).await?;
    let bootstrap_state = state.admin.bootstrap_state().await;
    Ok(Json(Whoami::new(identity, bootstrap_state)))
}

/// Authenticate, classify and authorize under a single read of the token store, then forward
/// with the lock released. The body is buffered first, so an oversized one is refused (413)
/// before any of these checks.
async fn proxy(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<UpstreamResponse, APIError> {
    {
        let store = state.tokens.read().await;
        let identity = state
            .authenticator
            .resolve(&*store, credential(&headers)?)
            .await?;
        let descriptor = auth::classify(&method, uri.path(), &body).map_err(Error::from)?;
        let decision = auth::check(&identity, BootstrapState::of(&*store), &descriptor);
        if let Decision::Deny(reason) = decision {
            tracing::debug!(
                "denied {identity} {} on zone {:?}: {reason:?}",
                descriptor.action,
                descriptor.zone.map(|z| z.get())
            );
        }
        decision.into_result()?;
    }

    let request = UpstreamRequest {
        path_and_query: uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), ToString::to_string),
        method,
        content_type: headers.get(CONTENT_TYPE).cloned(),
        body,
    };
    Ok(state.upstream.forward(request).await?)
}
