use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use lambda_http::{run, service_fn, tracing, Error, Request};
use std::sync::Arc;
use user_files_shared::{
    config::Config, records::DynamoRecordStore, s3::S3BlobStore, AppState,
};

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    // Initialize AWS clients once at startup
    let aws_config = aws_config::load_from_env().await;
    let config = Config::from_env();
    tracing::info!(
        "Starting users lambda (table: {}, bucket: {})",
        config.table_name,
        config.bucket_name
    );

    let state = AppState::new(
        Arc::new(DynamoRecordStore::new(
            DynamoClient::new(&aws_config),
            config.table_name.clone(),
        )),
        Arc::new(S3BlobStore::new(
            S3Client::new(&aws_config),
            config.bucket_name.clone(),
        )),
        config,
    );

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
