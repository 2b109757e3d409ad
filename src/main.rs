use std::sync::Arc;

use aide::axum::ApiRouter;
use aide::openapi::OpenApi;
use axum::Extension;
use log::info;
use tower_http::cors::CorsLayer;

mod api;
mod database;
mod docs;
mod env;
mod error;
mod models;
mod points;
mod request_state;

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};

pub const SESSION_COOKIE_NAME: &str = "session_token";

#[tokio::main]
async fn main() {
    let result = init().await;

    let exit_code = match result {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn init() -> ServiceResult<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let app_state = AppState::connect(
        env::DATABASE_URL.as_str(),
        *env::DATABASE_CONNECT_RETRIES,
    )
    .await?;

    aide::gen::on_error(|error| {
        log::error!("Api generation error: {error}");
    });
    aide::gen::extract_schemas(true);

    let mut open_api = OpenApi::default();
    let router = ApiRouter::new()
        .nest_api_service("/api/v1", api::init(app_state.clone()))
        .nest_api_service("/docs", docs::docs_routes())
        .finish_api_with(&mut open_api, docs::api_docs)
        .layer(Extension(Arc::new(open_api)))
        .layer(CorsLayer::permissive());

    let address = format!("{}:{}", env::API_HOST.as_str(), env::API_PORT.as_str());
    info!("Start http server at {}", address);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::InternalServerError(e.to_string()))?;
    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|e| ServiceError::InternalServerError(e.to_string()))?;

    Ok(())
}
