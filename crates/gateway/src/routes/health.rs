use axum::Json;

use crate::dto::StatusMessage;

pub async fn root_handler() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: "toolchat API is running!".to_string(),
    })
}
