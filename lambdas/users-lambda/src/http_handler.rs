use lambda_http::{Body, Error, Request, Response};
use std::sync::Arc;
use user_files_shared::{routes, AppState};

/// Main Lambda handler - routes user and attachment requests
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    routes::dispatch(&state, &event).await
}
