//! Routes guarded by the engine.

use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    auth::{Params, RoleRequest},
    authlane::state::AppState,
};

/// Role checked by the admin routes.
pub const ADMIN_ROLE: &str = "admin";

pub async fn protected(state: Extension<Arc<AppState>>, headers: HeaderMap) -> Response {
    state.exchange(&headers, &Params::new(), |lane, context| {
        lane.require_authorization(context, None)?;
        Ok("protected".into_response())
    })
}

/// The signed-in user's credential record.
pub async fn account(state: Extension<Arc<AppState>>, headers: HeaderMap) -> Response {
    state.exchange(&headers, &Params::new(), |lane, context| {
        lane.require_authorization(context, None)?;
        let record = lane
            .current_user(context)
            .map(|user| user.to_map())
            .unwrap_or_default();
        Ok(Json(Value::Object(record)).into_response())
    })
}

pub async fn authorized(state: Extension<Arc<AppState>>, headers: HeaderMap) -> Response {
    state.exchange(&headers, &Params::new(), |lane, context| {
        let body = if lane.is_authorized(context, None)? {
            "authorized"
        } else {
            "unauthorized"
        };
        Ok(body.into_response())
    })
}

pub async fn admin(state: Extension<Arc<AppState>>, headers: HeaderMap) -> Response {
    state.exchange(&headers, &Params::new(), |lane, context| {
        lane.require_authorization(context, Some(&RoleRequest::named(ADMIN_ROLE)))?;
        Ok("admin".into_response())
    })
}

/// `GET /admin/:rank`, the role request carries the required rank.
pub async fn admin_rank(
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    Path(rank): Path<i64>,
) -> Response {
    let role = RoleRequest::with_argument(ADMIN_ROLE, json!(rank));
    state.exchange(&headers, &Params::new(), |lane, context| {
        lane.require_authorization(context, Some(&role))?;
        Ok(format!("admin {rank}").into_response())
    })
}

/// Id of the signed-in user.
pub async fn user(state: Extension<Arc<AppState>>, headers: HeaderMap) -> Response {
    state.exchange(&headers, &Params::new(), |lane, context| {
        lane.require_authorization(context, None)?;
        let id = match lane.current_user(context).and_then(|user| user.id()) {
            Some(Value::String(id)) => id,
            Some(id) => id.to_string(),
            None => String::new(),
        };
        Ok(id.into_response())
    })
}

/// Landing page of the failed route.
pub async fn unauthorized() -> impl IntoResponse {
    "unauthorized"
}
