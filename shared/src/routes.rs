use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};

use crate::error::ApiError;
use crate::{attachments, response, users, AppState};

const USER_ID_PARAM: &str = "userId";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    CreateUser,
    GetUser,
    UpdateUser,
    DeleteUser,
    UploadAttachment,
    ListDownloads,
}

/// Match method + path against the route table.
///
/// Segments before the first `users` segment (an API stage, for example) are
/// ignored, so `/prod/users/{id}` routes like `/users/{id}`.
pub fn match_route(method: &Method, path: &str) -> Option<Route> {
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let anchor = parts.iter().position(|p| *p == "users")?;

    match (method, &parts[anchor..]) {
        // POST /users
        (&Method::POST, ["users"]) => Some(Route::CreateUser),
        // GET /users/{id}
        (&Method::GET, ["users", _]) => Some(Route::GetUser),
        // PUT /users/{id}
        (&Method::PUT, ["users", _]) => Some(Route::UpdateUser),
        // DELETE /users/{id}
        (&Method::DELETE, ["users", _]) => Some(Route::DeleteUser),
        // POST /users/{id}/upload
        (&Method::POST, ["users", _, "upload"]) => Some(Route::UploadAttachment),
        // GET /users/{id}/files
        (&Method::GET, ["users", _, "files"]) => Some(Route::ListDownloads),
        _ => None,
    }
}

/// 36 characters with exactly four hyphens.
pub fn is_uuid_shaped(segment: &str) -> bool {
    segment.len() == 36 && segment.matches('-').count() == 4
}

/// Prefer the `userId` path parameter, else the first UUID-shaped path segment.
pub fn extract_user_id<'a>(path_param: Option<&'a str>, path: &'a str) -> Option<&'a str> {
    path_param
        .filter(|id| !id.is_empty())
        .or_else(|| path.split('/').find(|part| is_uuid_shaped(part)))
}

/// Route one request and turn every handler error into an error envelope
pub async fn dispatch(state: &AppState, event: &Request) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    tracing::info!("Users API invoked - Method: {} Path: {}", method, path);

    if *method == Method::OPTIONS {
        return Ok(response::preflight()?);
    }

    let result = match match_route(method, path) {
        Some(route) => {
            let path_params = event.path_parameters_ref();
            let user_id = extract_user_id(path_params.and_then(|p| p.first(USER_ID_PARAM)), path);
            run_route(state, route, user_id, event.body()).await
        }
        None => {
            tracing::warn!("No route matched - Method: {} Path: {}", method, path);
            Err(ApiError::RouteNotFound {
                method: method.to_string(),
                path: path.to_string(),
            })
        }
    };

    match result {
        Ok(resp) => Ok(resp),
        Err(err) => {
            let status = err.status_code();
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!("{} {} failed: {}", method, path, err);
            } else {
                tracing::info!("{} {} rejected ({}): {}", method, path, status, err);
            }
            Ok(response::error(status, &err.to_string())?)
        }
    }
}

async fn run_route(
    state: &AppState,
    route: Route,
    user_id: Option<&str>,
    body: &[u8],
) -> Result<Response<Body>, ApiError> {
    let records = state.records.as_ref();
    let blobs = state.blobs.as_ref();

    match route {
        Route::CreateUser => users::create_user(records, body).await,
        Route::GetUser => users::get_user(records, user_id).await,
        Route::UpdateUser => users::update_user(records, user_id, body).await,
        Route::DeleteUser => users::delete_user(records, blobs, user_id).await,
        Route::UploadAttachment => attachments::upload_attachment(records, blobs, user_id, body).await,
        Route::ListDownloads => {
            attachments::list_downloads(records, blobs, user_id, state.config.download_url_ttl).await
        }
    }
}
