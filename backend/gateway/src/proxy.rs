//! The gateway request handler.
//!
//! Per request: rate check, endpoint validation, allow-list authorization,
//! credential extraction, signed header construction, forwarding, relay, and
//! on a successful sign-in, session cookie issuance. The rate counter is
//! consumed in the first step regardless of what happens afterwards.

use std::collections::HashMap;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use fingate_core::{OutboundRequest, UpstreamMethod};
use fingate_logging::{EventLogger, GatewayEvent};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{client_key, extract_bearer_token};
use crate::error::{GatewayError, GatewayResult};
use crate::headers::{apply_defensive_headers, build_outbound_headers, X_REQUEST_ID};
use crate::server::GatewayState;
use crate::session_cookie::{append_set_cookie, clear_session_cookie, create_session_cookie, session_token};

/// Request-scoped bookkeeping for logging.
struct CallContext {
    request_id: String,
    endpoint: Option<String>,
}

/// Handler for `POST /gateway` with body `{ endpoint, data }`.
pub async fn proxy_post(State(state): State<GatewayState>, headers: HeaderMap, body: Bytes) -> Response {
    dispatch(&state, &headers, || parse_post_body(&body)).await
}

/// Handler for `GET /gateway?endpoint=<path>`.
pub async fn proxy_get(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    dispatch(&state, &headers, || {
        params
            .get("endpoint")
            .filter(|endpoint| !endpoint.is_empty())
            .map(|endpoint| OutboundRequest::get(endpoint.clone()))
            .ok_or(GatewayError::InvalidEndpoint)
    })
    .await
}

/// Handler for `POST /gateway/logout`: expires the session cookie.
pub async fn logout(State(state): State<GatewayState>) -> GatewayResult<Response> {
    let mut response = (StatusCode::OK, Json(json!({ "status": "success" }))).into_response();
    apply_defensive_headers(response.headers_mut());
    append_set_cookie(
        response.headers_mut(),
        &clear_session_cookie(&state.session.cookie_name),
    )?;
    EventLogger::log_event(&Uuid::new_v4().to_string(), GatewayEvent::SessionCleared);
    Ok(response)
}

fn parse_post_body(body: &Bytes) -> GatewayResult<OutboundRequest> {
    let value: Value = serde_json::from_slice(body).map_err(|_| GatewayError::InvalidBody)?;
    let endpoint = value
        .get("endpoint")
        .and_then(Value::as_str)
        .filter(|endpoint| !endpoint.is_empty())
        .ok_or(GatewayError::InvalidEndpoint)?;

    Ok(OutboundRequest::post(endpoint, value.get("data").cloned()))
}

async fn dispatch<F>(state: &GatewayState, headers: &HeaderMap, resolve: F) -> Response
where
    F: FnOnce() -> GatewayResult<OutboundRequest>,
{
    let mut ctx = CallContext {
        request_id: Uuid::new_v4().to_string(),
        endpoint: None,
    };

    let mut response = match forward(state, headers, resolve, &mut ctx).await {
        Ok(response) => response,
        Err(err) => {
            if err.status_code().is_server_error() {
                EventLogger::log_event(
                    &ctx.request_id,
                    GatewayEvent::Failed {
                        endpoint: ctx.endpoint.clone(),
                        error_msg: err.to_string(),
                    },
                );
            } else {
                debug!(request_id = %ctx.request_id, error = %err, "Gateway request rejected");
            }
            err.into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&ctx.request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

async fn forward<F>(
    state: &GatewayState,
    headers: &HeaderMap,
    resolve: F,
    ctx: &mut CallContext,
) -> GatewayResult<Response>
where
    F: FnOnce() -> GatewayResult<OutboundRequest>,
{
    // RateCheck
    let client = client_key(headers);
    let decision = state.rate_limiter.check_and_increment(&client).await?;
    if !decision.allowed {
        let retry_after = decision.retry_after_secs();
        EventLogger::log_event(
            &ctx.request_id,
            GatewayEvent::RateLimited {
                client,
                retry_after_secs: retry_after,
            },
        );
        return Err(GatewayError::RateLimited { retry_after });
    }

    // Validate
    let request = resolve()?;
    ctx.endpoint = Some(request.endpoint.clone());

    // Authorize endpoint
    if state.routes.match_route(&request.endpoint, request.method).is_none() {
        EventLogger::log_event(
            &ctx.request_id,
            GatewayEvent::EndpointRejected {
                endpoint: request.endpoint.clone(),
                method: request.method.to_string(),
            },
        );
        return Err(GatewayError::EndpointNotAllowed);
    }

    // ExtractAuth
    let request = request.with_bearer(extract_bearer_token(headers, &state.session.cookie_name));

    // BuildHeaders
    let signed = state.signer.sign(request.method, &request.endpoint)?;
    let outbound = build_outbound_headers(
        state.api_key.expose(),
        request.bearer_token.as_deref(),
        &signed,
    )?;

    // Forward
    let started = Instant::now();
    let upstream = state.upstream.send(&request, outbound).await?;
    EventLogger::log_event(
        &ctx.request_id,
        GatewayEvent::Forwarded {
            endpoint: request.endpoint.clone(),
            method: request.method.to_string(),
            status: upstream.status.as_u16(),
            latency_ms: started.elapsed().as_millis() as u64,
            authenticated: request.bearer_token.is_some(),
        },
    );

    // ConditionalCookie is decided before relaying so a contract error
    // replaces the relayed body instead of trailing it.
    let issued = if request.method == UpstreamMethod::Post
        && request.endpoint == state.session.signin_path
    {
        session_token(upstream.status, &upstream.body)?
    } else {
        None
    };

    // Relay
    let mut response = (upstream.status, Json(upstream.body)).into_response();
    apply_defensive_headers(response.headers_mut());

    if let Some(token) = issued {
        append_set_cookie(
            response.headers_mut(),
            &create_session_cookie(&state.session.cookie_name, &token, state.session.max_age_secs),
        )?;
        EventLogger::log_event(
            &ctx.request_id,
            GatewayEvent::SessionIssued {
                max_age_secs: state.session.max_age_secs,
            },
        );
    }

    Ok(response)
}
