use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Booking, PaymentMethod};
use crate::services::PaymentIntent;

/// Body of `POST /bookings`.
///
/// Required fields are optional at the wire level so their absence is reported
/// as a missing-fields error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub room_id: Option<String>,
    pub room_type: Option<String>,
    pub room_number: Option<String>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
    #[validate(range(min = 1, message = "guests must be at least 1"))]
    pub guests: Option<u32>,
    pub payment: Option<PaymentMethod>,
    #[validate(range(exclusive_min = 0.0, message = "totalPrice must be positive"))]
    pub total_price: Option<f64>,
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(max = 2000))]
    pub special_requests: Option<String>,
    pub payment_method_id: Option<String>,
}

/// A create request whose required fields are known to be present.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub room_id: String,
    pub room_type: Option<String>,
    pub room_number: Option<String>,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub guests: u32,
    pub payment: PaymentMethod,
    pub total_price: f64,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub special_requests: Option<String>,
    pub payment_method_id: Option<String>,
}

impl CreateBookingRequest {
    /// Splits the request into a [`NewBooking`], or the camelCase names of the absent fields.
    pub fn into_new_booking(self) -> Result<NewBooking, Vec<&'static str>> {
        let mut missing = Vec::new();
        if self.room_id.as_deref().map_or(true, str::is_empty) {
            missing.push("roomId");
        }
        if self.check_in_date.is_none() {
            missing.push("checkInDate");
        }
        if self.check_out_date.is_none() {
            missing.push("checkOutDate");
        }
        if self.guests.is_none() {
            missing.push("guests");
        }
        if self.payment.is_none() {
            missing.push("payment");
        }
        if self.total_price.is_none() {
            missing.push("totalPrice");
        }

        match (
            self.room_id,
            self.check_in_date,
            self.check_out_date,
            self.guests,
            self.payment,
            self.total_price,
        ) {
            (
                Some(room_id),
                Some(check_in_date),
                Some(check_out_date),
                Some(guests),
                Some(payment),
                Some(total_price),
            ) if missing.is_empty() => Ok(NewBooking {
                room_id,
                room_type: self.room_type,
                room_number: self.room_number,
                check_in_date,
                check_out_date,
                guests,
                payment,
                total_price,
                full_name: self.full_name,
                email: self.email,
                phone: self.phone,
                special_requests: self.special_requests,
                payment_method_id: self.payment_method_id.filter(|id| !id.is_empty()),
            }),
            _ => Err(missing),
        }
    }
}

/// Body of `PUT /bookings/:id`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
    #[validate(range(min = 1, message = "guests must be at least 1"))]
    pub guests: Option<u32>,
    pub payment: Option<PaymentMethod>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub booking: Booking,
    pub payment_intent: Option<PaymentIntent>,
}

#[derive(Debug, Serialize)]
pub struct CancelBookingResponse {
    pub message: String,
    pub booking: Booking,
}

/// Body of `POST /rooms`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[validate(length(min = 1, max = 20))]
    pub room_number: String,
    #[validate(length(min = 1, max = 50))]
    pub room_type: String,
    #[validate(range(exclusive_min = 0.0, message = "price must be positive"))]
    pub price: f64,
}
