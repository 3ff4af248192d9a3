//! Sign-in and sign-out endpoints.

use axum::{
    extract::{Extension, Form},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::instrument;

use super::ACCOUNT_ROUTE;
use crate::{auth::Params, authlane::state::AppState};

/// `POST /signin` with the `username`, `password` and optional `remember`
/// form fields. A refused login is redirected to the failed route by the
/// engine.
#[instrument(skip_all)]
pub async fn signin(
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    Form(params): Form<Params>,
) -> Response {
    state.exchange(&headers, &params, |lane, context| {
        lane.login(context)?;
        Ok(Redirect::to(ACCOUNT_ROUTE).into_response())
    })
}

/// `GET /signout`
#[instrument(skip_all)]
pub async fn signout(state: Extension<Arc<AppState>>, headers: HeaderMap) -> Response {
    state.exchange(&headers, &Params::new(), |lane, context| {
        lane.logout(context)?;
        Ok(Redirect::to(lane.registry().failed_route()).into_response())
    })
}
