use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::formats::ErrorEnvelope;
use crate::tools::{ToolRegistry, ToolSpec};

pub fn router(registry: ToolRegistry) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/tools", get(list_tools))
        .route("/tools/:name", post(call_tool))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

async fn list_tools() -> Json<Vec<ToolSpec>> {
    Json(ToolRegistry::specs())
}

async fn call_tool(
    State(registry): State<ToolRegistry>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let arguments = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(arguments) => arguments,
            Err(err) => {
                tracing::warn!(tool = %name, ?err, "tool arguments are not valid JSON");
                let envelope = ErrorEnvelope::new(
                    format!("Invalid JSON arguments for tool '{name}': {err}"),
                    registry.support_contact(),
                );
                return Json(envelope).into_response();
            }
        }
    };

    Json(registry.dispatch(&name, arguments).await).into_response()
}
