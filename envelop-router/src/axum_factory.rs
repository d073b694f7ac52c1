//! Axum http server factory. Axum provides routing capability on top of Hyper HTTP.
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use http::HeaderMap;
use http::Method;
use http::StatusCode;
use http::Uri;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::configuration::Server;
use crate::context::TransportInput;
use crate::graphql;
use crate::pipeline::Pipeline;

const INVALID_REQUEST_CODE: &str = "INVALID_GRAPHQL_REQUEST";
const INTERNAL_ERROR_CODE: &str = "INTERNAL_SERVER_ERROR";

/// Builds the HTTP routes serving `pipeline`.
///
/// * `POST <graphql_path>`: a JSON `{query, variables?, operationName?}` body
/// * `GET <health_check_path>`: `{"status":"pass"}`
/// * `GET /`: the GraphiQL page, when `landing_page` is enabled
///
/// Anything else is answered with a `404`.
pub fn make_router(pipeline: Arc<Pipeline>, server: &Server) -> Router {
    let mut router = Router::new()
        .route(&server.graphql_path, post(handle_post))
        .route(&server.health_check_path, get(health_check));

    if server.landing_page {
        let page = landing_page(&server.graphql_path);
        router = router.route(
            "/",
            get(move || std::future::ready(Html(page.clone()))),
        );
    }

    router
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

fn landing_page(graphql_path: &str) -> String {
    include_str!("../resources/graphiql.html").replace("{{GRAPHQL_PATH}}", graphql_path)
}

async fn handle_post(
    State(pipeline): State<Arc<Pipeline>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match serde_json::from_slice::<graphql::Request>(&body) {
        Ok(request) => request,
        Err(error) => {
            tracing::debug!(%error, "could not deserialize the GraphQL request");
            let response = graphql::Response::builder()
                .error(
                    graphql::Error::builder()
                        .message(format!("invalid GraphQL request: {error}"))
                        .extension_code(INVALID_REQUEST_CODE)
                        .build(),
                )
                .build();
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    let input = TransportInput {
        method,
        uri,
        headers,
    };
    // parsing, validation and execution are CPU bound
    let span = tracing::Span::current();
    let result = tokio::task::spawn_blocking(move || {
        span.in_scope(|| pipeline.process(&input, request))
    })
    .await;
    match result {
        Ok(Ok(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(Err(error)) => (error.status_code(), Json(error.to_response())).into_response(),
        Err(err) => {
            tracing::error!("GraphQL request processing failed: {}", err);
            let response = graphql::Response::builder()
                .error(
                    graphql::Error::builder()
                        .message("GraphQL request processing failed")
                        .extension_code(INTERNAL_ERROR_CODE)
                        .build(),
                )
                .build();
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
        }
    }
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "pass" }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
