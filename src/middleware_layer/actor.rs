use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::models::actor::{Actor, Role};

/// A middleware that turns the identity headers set by the upstream auth
/// proxy into an `Extension<Actor>`.
///
/// Credentials are verified before the request reaches this service; the
/// core only trusts the resolved `x-actor-id` / `x-actor-role` pair and
/// rejects requests where either is missing or malformed.
pub async fn resolve_actor(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let actor_id = request
        .headers()
        .get("x-actor-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| {
            tracing::warn!("Missing or malformed x-actor-id header");
            StatusCode::FORBIDDEN
        })?;

    let role = request
        .headers()
        .get("x-actor-role")
        .and_then(|v| v.to_str().ok())
        .and_then(Role::parse)
        .ok_or_else(|| {
            tracing::warn!("Missing or malformed x-actor-role header");
            StatusCode::FORBIDDEN
        })?;

    tracing::debug!(actor_id = %actor_id, role = role.as_str(), "Actor resolved");

    request.extensions_mut().insert(Actor {
        id: actor_id,
        role,
    });

    Ok(next.run(request).await)
}
