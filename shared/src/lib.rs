pub mod types;
pub mod error;
pub mod config;
pub mod records;
pub mod s3;
pub mod response;
pub mod routes;
pub mod users;
pub mod attachments;

#[cfg(test)]
pub(crate) mod memory;

use config::Config;
use records::RecordStore;
use s3::BlobStore;
use std::sync::Arc;

/// Shared application state, built once per Lambda container
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        config: Config,
    ) -> Arc<Self> {
        Arc::new(Self {
            records,
            blobs,
            config,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::memory::{InMemoryBlobStore, InMemoryRecordStore};
    use lambda_http::{Body, Request, RequestExt};
    use std::collections::HashMap;

    pub struct Harness {
        pub state: Arc<AppState>,
        pub records: Arc<InMemoryRecordStore>,
        pub blobs: Arc<InMemoryBlobStore>,
    }

    pub fn harness() -> Harness {
        let records = Arc::new(InMemoryRecordStore::default());
        let blobs = Arc::new(InMemoryBlobStore::default());
        let state = AppState::new(records.clone(), blobs.clone(), Config::default());
        Harness {
            state,
            records,
            blobs,
        }
    }

    pub fn request(method: &str, path: &str, body: Option<serde_json::Value>) -> Request {
        let body = match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::Empty,
        };
        lambda_http::http::Request::builder()
            .method(method)
            .uri(path)
            .body(body)
            .unwrap()
    }

    pub fn with_user_id_param(request: Request, user_id: &str) -> Request {
        let mut params = HashMap::new();
        params.insert("userId".to_string(), user_id.to_string());
        request.with_path_parameters(params)
    }

    pub fn body_json(response: &lambda_http::Response<Body>) -> serde_json::Value {
        serde_json::from_slice(response.body()).unwrap()
    }
}
