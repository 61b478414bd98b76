//! Axum route handlers for one-to-one chat rooms.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::queries::ensure_job_exists;
use crate::models::chat::{normalize_pair, ChatRoomRow, ChatRoomSummary, MessageRow};
use crate::notifications::fanout::{display_name, notify, NotificationTemplate};
use crate::state::AppState;
use crate::users::queries::find_by_id;

const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub participant_id: i64,
    pub job_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

fn validate_content(raw: &str) -> Result<&str, AppError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Message content is required".to_string()));
    }
    if content.chars().count() > MAX_MESSAGE_LEN {
        return Err(AppError::Validation(format!(
            "Message must be at most {MAX_MESSAGE_LEN} characters"
        )));
    }
    Ok(content)
}

async fn find_room_by_pair(
    pool: &MySqlPool,
    user_one: i64,
    user_two: i64,
) -> Result<Option<ChatRoomRow>, sqlx::Error> {
    sqlx::query_as::<_, ChatRoomRow>(
        "SELECT * FROM chat_rooms WHERE user_one_id = ? AND user_two_id = ?",
    )
    .bind(user_one)
    .bind(user_two)
    .fetch_optional(pool)
    .await
}

/// Loads a room and checks that `auth` takes part in it.
async fn load_room(state: &AppState, auth: &AuthUser, room_id: i64) -> Result<ChatRoomRow, AppError> {
    let room = sqlx::query_as::<_, ChatRoomRow>("SELECT * FROM chat_rooms WHERE id = ?")
        .bind(room_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Chat room {room_id} not found")))?;
    if !room.has_participant(auth.id) {
        return Err(AppError::Forbidden(
            "You are not a participant of this chat".to_string(),
        ));
    }
    Ok(room)
}

/// POST /api/chat/rooms
///
/// Returns the existing room for the pair when there is one (200), otherwise
/// creates it (201).
pub async fn handle_create_room(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ChatRoomRow>), AppError> {
    if req.participant_id == auth.id {
        return Err(AppError::Validation("You cannot chat with yourself".to_string()));
    }
    if find_by_id(&state.db, req.participant_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "User {} not found",
            req.participant_id
        )));
    }

    ensure_job_exists(&state.db, req.job_id).await?;

    let (user_one, user_two) = normalize_pair(auth.id, req.participant_id);
    if let Some(room) = find_room_by_pair(&state.db, user_one, user_two).await? {
        return Ok((StatusCode::OK, Json(room)));
    }

    // A concurrent request may have created the room between the lookup and
    // this insert; INSERT IGNORE leaves that row in place.
    let result = sqlx::query(
        "INSERT IGNORE INTO chat_rooms (user_one_id, user_two_id, job_id) VALUES (?, ?, ?)",
    )
    .bind(user_one)
    .bind(user_two)
    .bind(req.job_id)
    .execute(&state.db)
    .await?;

    let room = find_room_by_pair(&state.db, user_one, user_two)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Chat room vanished after insert")))?;
    if result.rows_affected() == 0 {
        return Ok((StatusCode::OK, Json(room)));
    }

    info!("User {} opened chat room {} with user {}", auth.id, room.id, req.participant_id);
    Ok((StatusCode::CREATED, Json(room)))
}

/// GET /api/chat/rooms
pub async fn handle_list_rooms(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ChatRoomSummary>>, AppError> {
    let rooms = sqlx::query_as::<_, ChatRoomSummary>(
        r#"
        SELECT r.id, r.job_id,
               u.id AS other_user_id, u.name AS other_user_name,
               (SELECT m.content FROM messages m WHERE m.room_id = r.id
                ORDER BY m.created_at DESC, m.id DESC LIMIT 1) AS last_message,
               (SELECT MAX(m.created_at) FROM messages m WHERE m.room_id = r.id) AS last_message_at,
               (SELECT COUNT(*) FROM messages m
                WHERE m.room_id = r.id AND m.sender_id <> ? AND m.is_read = FALSE) AS unread_count,
               r.created_at
        FROM chat_rooms r
        JOIN users u ON u.id = IF(r.user_one_id = ?, r.user_two_id, r.user_one_id)
        WHERE r.user_one_id = ? OR r.user_two_id = ?
        ORDER BY COALESCE(
            (SELECT MAX(m.created_at) FROM messages m WHERE m.room_id = r.id),
            r.created_at
        ) DESC
        "#,
    )
    .bind(auth.id)
    .bind(auth.id)
    .bind(auth.id)
    .bind(auth.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rooms))
}

/// GET /api/chat/rooms/:id/messages
///
/// Oldest first. Marks the other participant's messages as read.
pub async fn handle_list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(room_id): Path<i64>,
) -> Result<Json<Vec<MessageRow>>, AppError> {
    load_room(&state, &auth, room_id).await?;

    sqlx::query("UPDATE messages SET is_read = TRUE WHERE room_id = ? AND sender_id <> ? AND is_read = FALSE")
        .bind(room_id)
        .bind(auth.id)
        .execute(&state.db)
        .await?;

    let messages = sqlx::query_as::<_, MessageRow>(
        "SELECT * FROM messages WHERE room_id = ? ORDER BY created_at ASC, id ASC",
    )
    .bind(room_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(messages))
}

/// POST /api/chat/rooms/:id/messages
pub async fn handle_send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(room_id): Path<i64>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageRow>), AppError> {
    let content = validate_content(&req.content)?;
    let room = load_room(&state, &auth, room_id).await?;

    let result = sqlx::query("INSERT INTO messages (room_id, sender_id, content) VALUES (?, ?, ?)")
        .bind(room_id)
        .bind(auth.id)
        .bind(content)
        .execute(&state.db)
        .await?;
    let message_id = result.last_insert_id() as i64;

    let message = sqlx::query_as::<_, MessageRow>("SELECT * FROM messages WHERE id = ?")
        .bind(message_id)
        .fetch_one(&state.db)
        .await?;

    let sender_name = display_name(&state.db, auth.id, &auth.email).await;
    notify(
        &state.db,
        room.other_participant(auth.id),
        NotificationTemplate::new_message(room_id, &sender_name, content),
    );

    Ok((StatusCode::CREATED, Json(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_is_trimmed() {
        assert_eq!(validate_content("  hello \n").unwrap(), "hello");
    }

    #[test]
    fn test_blank_content_rejected() {
        assert!(validate_content("   ").is_err());
    }

    #[test]
    fn test_overlong_content_rejected() {
        let long = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert!(validate_content(&long).is_err());
        assert!(validate_content(&"x".repeat(MAX_MESSAGE_LEN)).is_ok());
    }
}
