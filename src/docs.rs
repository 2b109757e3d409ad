use std::sync::Arc;

use aide::{
    axum::{
        routing::{get, get_with},
        ApiRouter, IntoApiResponse,
    },
    openapi::{OpenApi, Tag},
    redoc::Redoc,
    transform::TransformOpenApi,
};
use axum::{response::IntoResponse, Extension, Json};

pub fn api_docs(api: TransformOpenApi) -> TransformOpenApi {
    api.title("bistro-server Open API")
        .summary("Restaurant ordering backend")
        .description(include_str!("../README.md"))
        .tag(Tag {
            name: "auth".into(),
            description: Some("Registration, login and sessions".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "users".into(),
            description: Some("User profiles".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "points".into(),
            description: Some("Loyalty point balance and history".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "orders".into(),
            description: Some("Order placement and payment".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "reservations".into(),
            description: Some("Table reservations".into()),
            ..Default::default()
        })
        .security_scheme(
            "SessionToken",
            aide::openapi::SecurityScheme::Http {
                scheme: "bearer".into(),
                bearer_format: None,
                description: Some("Session token issued by login or registration.".into()),
                extensions: Default::default(),
            },
        )
}

pub fn docs_routes() -> ApiRouter {
    aide::gen::infer_responses(true);

    let router = ApiRouter::new()
        .api_route_with(
            "/",
            get_with(
                Redoc::new("/docs/api.json")
                    .with_title("bistro-server")
                    .axum_handler(),
                |op| op.description("This documentation page."),
            ),
            |p| p,
        )
        .route("/api.json", get(serve_docs));

    aide::gen::infer_responses(false);

    router
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
    Json(api).into_response()
}
