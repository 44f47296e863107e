//! Booking endpoints. Every route requires an authenticated [`Principal`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    dtos::{
        CancelBookingResponse, CreateBookingRequest, CreateBookingResponse, UpdateBookingRequest,
    },
    error::BookingError,
    models::{Booking, BookingDetails, Principal},
    services::metrics::record_operation,
    startup::AppState,
};

fn observe<T>(operation: &str, result: Result<T, BookingError>) -> Result<T, BookingError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.code(),
    };
    record_operation(operation, outcome);
    result
}

pub async fn create_booking(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), BookingError> {
    tracing::info!(
        user_id = %principal.user_id,
        room_id = ?payload.room_id,
        check_in = ?payload.check_in_date,
        check_out = ?payload.check_out_date,
        "Creating booking"
    );

    let created = observe(
        "create",
        state.manager.create_booking(payload, &principal).await,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking: created.booking,
            payment_intent: created.payment_intent,
        }),
    ))
}

pub async fn list_user_bookings(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<BookingDetails>>, BookingError> {
    let bookings = observe(
        "list_user",
        state.manager.list_user_bookings(&principal).await,
    )?;
    Ok(Json(bookings))
}

pub async fn list_all_bookings(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<Booking>>, BookingError> {
    let bookings = observe("list_all", state.manager.list_all_bookings(&principal).await)?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<AppState>,
    principal: Principal,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, BookingError> {
    let booking = observe(
        "get",
        state.manager.get_booking(&booking_id, &principal).await,
    )?;
    Ok(Json(booking))
}

pub async fn update_booking(
    State(state): State<AppState>,
    principal: Principal,
    Path(booking_id): Path<String>,
    Json(payload): Json<UpdateBookingRequest>,
) -> Result<Json<Booking>, BookingError> {
    tracing::info!(
        booking_id = %booking_id,
        user_id = %principal.user_id,
        "Updating booking"
    );

    let booking = observe(
        "update",
        state
            .manager
            .update_booking(&booking_id, payload, &principal)
            .await,
    )?;
    Ok(Json(booking))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    principal: Principal,
    Path(booking_id): Path<String>,
) -> Result<Json<CancelBookingResponse>, BookingError> {
    tracing::info!(
        booking_id = %booking_id,
        user_id = %principal.user_id,
        "Cancelling booking"
    );

    let booking = observe(
        "cancel",
        state.manager.cancel_booking(&booking_id, &principal).await,
    )?;
    Ok(Json(CancelBookingResponse {
        message: "Booking cancelled".to_string(),
        booking,
    }))
}
