//! Room administration. Reads are open to any signed-in user; creation is admin-only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::CreateRoomRequest,
    models::{Principal, Room, RoomStatus},
    startup::AppState,
};

pub async fn list_rooms(
    State(state): State<AppState>,
    _principal: Principal,
) -> Result<Json<Vec<Room>>, AppError> {
    Ok(Json(state.rooms.list().await?))
}

pub async fn get_room(
    State(state): State<AppState>,
    _principal: Principal,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, AppError> {
    let room = state
        .rooms
        .find_by_id(&room_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Room not found")))?;
    Ok(Json(room))
}

pub async fn create_room(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    if !principal.is_admin() {
        return Err(AppError::Forbidden(anyhow::anyhow!("Admin role required")));
    }
    payload.validate()?;

    let taken = state
        .rooms
        .list()
        .await?
        .iter()
        .any(|room| room.room_number == payload.room_number);
    if taken {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Room {} already exists",
            payload.room_number
        )));
    }

    let now = Utc::now();
    let room = Room {
        id: Uuid::new_v4().to_string(),
        room_number: payload.room_number,
        room_type: payload.room_type,
        price: payload.price,
        status: RoomStatus::Available,
        created_at: now,
        updated_at: now,
    };

    state.rooms.insert(&room).await?;

    tracing::info!(
        room_id = %room.id,
        room_number = %room.room_number,
        created_by = %principal.user_id,
        "Room created"
    );

    Ok((StatusCode::CREATED, Json(room)))
}
