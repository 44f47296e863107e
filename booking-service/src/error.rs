//! Booking-domain failures and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Booking id is required")]
    MissingId,

    #[error("Room is not available for the selected dates")]
    RoomUnavailable { conflicting_booking_id: String },

    /// Carries the gateway's message verbatim.
    #[error("{0}")]
    PaymentFailed(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Bookings whose check-in date has passed cannot be changed")]
    PastBooking,

    #[error(transparent)]
    App(#[from] AppError),

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl BookingError {
    /// Machine-readable code returned in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::MissingFields(_) => "MISSING_FIELDS",
            BookingError::MissingId => "MISSING_ID",
            BookingError::RoomUnavailable { .. } => "ROOM_UNAVAILABLE",
            BookingError::PaymentFailed(_) => "PAYMENT_FAILED",
            BookingError::NotFound(_) => "NOT_FOUND",
            BookingError::Forbidden(_) => "FORBIDDEN",
            BookingError::PastBooking => "PAST_BOOKING",
            BookingError::App(_) => "REQUEST_ERROR",
            BookingError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::MissingFields(_)
            | BookingError::MissingId
            | BookingError::RoomUnavailable { .. }
            | BookingError::PaymentFailed(_)
            | BookingError::PastBooking => StatusCode::BAD_REQUEST,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
            BookingError::App(err) => err.status_code(),
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<Vec<&'static str>>,
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        let fields = match self {
            BookingError::App(err) => return err.into_response(),
            BookingError::Internal(ref err) => {
                tracing::error!(error = ?err, "Booking operation failed");
                None
            }
            BookingError::MissingFields(fields) => Some(fields),
            _ => None,
        };

        (
            status,
            Json(ErrorResponse {
                error: code,
                message,
                fields,
            }),
        )
            .into_response()
    }
}
