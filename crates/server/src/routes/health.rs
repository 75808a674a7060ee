use axum::response::Json;
use utils_core::response::MessageResponse;

pub async fn health_check() -> Json<MessageResponse> {
    Json(MessageResponse::new("ok"))
}
