//! Booking lifecycle: conflict checks, card payment, room status sync.
//!
//! Each mutation is a sequence of separately-failing steps (check, charge,
//! insert, room update). Nothing is rolled back when a later step fails; the
//! failing step is logged with enough context to reconcile by hand.

use dashmap::DashMap;
use service_core::error::AppError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{CreateBookingRequest, NewBooking, UpdateBookingRequest};
use crate::error::BookingError;
use crate::models::{
    Booking, BookingDetails, BookingStatus, PaymentMethod, PaymentStatus, Principal, RoomStatus,
};

use super::clock::Clock;
use super::conflict::find_conflict;
use super::gateway::{IntentMetadata, PaymentGateway, PaymentIntent};
use super::metrics::record_payment;
use super::repository::{BookingStore, RoomStore};

/// A freshly persisted booking and the intent that paid for it, if any.
#[derive(Debug, Clone)]
pub struct CreatedBooking {
    pub booking: Booking,
    pub payment_intent: Option<PaymentIntent>,
}

#[derive(Clone)]
pub struct BookingManager {
    bookings: Arc<dyn BookingStore>,
    rooms: Arc<dyn RoomStore>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    currency: String,
    room_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl BookingManager {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        rooms: Arc<dyn RoomStore>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            bookings,
            rooms,
            gateway,
            clock,
            currency: currency.into(),
            room_locks: Arc::new(DashMap::new()),
        }
    }

    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
        principal: &Principal,
    ) -> Result<CreatedBooking, BookingError> {
        let validation = request.validate();
        let new = request
            .into_new_booking()
            .map_err(BookingError::MissingFields)?;
        validation.map_err(AppError::from)?;

        let room = self
            .rooms
            .find_by_id(&new.room_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Room {} not found", new.room_id)))?;

        // Creates for one room are serialized within this process so two
        // overlapping requests cannot both pass the conflict scan.
        let room_lock = self.room_lock(&new.room_id);
        let _guard = room_lock.lock().await;

        let existing = self.bookings.find_by_room(&new.room_id).await?;
        if let Some(conflict) = find_conflict(&existing, new.check_in_date, new.check_out_date) {
            tracing::info!(
                room_id = %new.room_id,
                conflicting_booking_id = %conflict.id,
                check_in = %new.check_in_date,
                check_out = %new.check_out_date,
                "Requested dates overlap an existing booking"
            );
            return Err(BookingError::RoomUnavailable {
                conflicting_booking_id: conflict.id.clone(),
            });
        }

        let room_type = new.room_type.clone().unwrap_or_else(|| room.room_type.clone());
        let room_number = new
            .room_number
            .clone()
            .unwrap_or_else(|| room.room_number.clone());

        let payment_intent = match (new.payment, new.payment_method_id.as_deref()) {
            (PaymentMethod::Card, Some(payment_method_id)) => Some(
                self.charge_card(&new, &room_number, payment_method_id, principal)
                    .await?,
            ),
            _ => None,
        };

        let now = self.clock.now();
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            room_type,
            room_number,
            room_id: new.room_id,
            check_in_date: new.check_in_date,
            check_out_date: new.check_out_date,
            guests: new.guests,
            payment: new.payment,
            total_price: new.total_price,
            user_id: principal.user_id.clone(),
            full_name: new.full_name,
            email: new.email,
            phone: new.phone,
            special_requests: new.special_requests,
            payment_intent_id: payment_intent.as_ref().map(|intent| intent.id.clone()),
            payment_status: if payment_intent.is_some() {
                PaymentStatus::Succeeded
            } else {
                PaymentStatus::Pending
            },
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };

        self.bookings.insert(&booking).await.map_err(|e| {
            if let Some(intent) = &payment_intent {
                tracing::error!(
                    payment_intent_id = %intent.id,
                    room_id = %booking.room_id,
                    error = %e,
                    "Card charged but booking could not be stored"
                );
            }
            e
        })?;

        self.mark_room(&booking, RoomStatus::Booked).await?;

        tracing::info!(
            booking_id = %booking.id,
            room_id = %booking.room_id,
            user_id = %booking.user_id,
            payment = ?booking.payment,
            payment_status = ?booking.payment_status,
            "Booking created"
        );

        Ok(CreatedBooking {
            booking,
            payment_intent,
        })
    }

    /// Creates and immediately confirms an intent for the booking total.
    async fn charge_card(
        &self,
        new: &NewBooking,
        room_number: &str,
        payment_method_id: &str,
        principal: &Principal,
    ) -> Result<PaymentIntent, BookingError> {
        let amount = to_minor_units(new.total_price);
        let metadata = IntentMetadata::from([
            ("roomId".to_string(), new.room_id.clone()),
            ("roomNumber".to_string(), room_number.to_string()),
            ("checkInDate".to_string(), new.check_in_date.to_string()),
            ("checkOutDate".to_string(), new.check_out_date.to_string()),
            ("guests".to_string(), new.guests.to_string()),
            ("userId".to_string(), principal.user_id.clone()),
        ]);

        let intent = self
            .gateway
            .create_intent(amount, &self.currency, &metadata)
            .await
            .map_err(|e| payment_failed("create", e.to_string()))?;

        let confirmed = self
            .gateway
            .confirm_intent(&intent.id, payment_method_id)
            .await
            .map_err(|e| payment_failed("confirm", e.to_string()))?;

        record_payment(&confirmed.status);

        if !confirmed.is_succeeded() {
            let message = confirmed.failure_message();
            tracing::warn!(
                payment_intent_id = %confirmed.id,
                status = %confirmed.status,
                "Payment intent did not succeed"
            );
            return Err(BookingError::PaymentFailed(message));
        }

        Ok(confirmed)
    }

    /// Edits dates, guest count and payment method of a caller-owned booking.
    ///
    /// The lookup is owner-scoped for admins too; admins only skip the
    /// past-date rule. New dates are not re-checked for conflicts.
    pub async fn update_booking(
        &self,
        booking_id: &str,
        updates: UpdateBookingRequest,
        principal: &Principal,
    ) -> Result<Booking, BookingError> {
        updates.validate().map_err(AppError::from)?;

        let mut booking = self
            .bookings
            .find_owned(booking_id, &principal.user_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;

        if booking.check_in_date < self.clock.today() && !principal.is_admin() {
            return Err(BookingError::PastBooking);
        }

        if let Some(check_in_date) = updates.check_in_date {
            booking.check_in_date = check_in_date;
        }
        if let Some(check_out_date) = updates.check_out_date {
            booking.check_out_date = check_out_date;
        }
        if let Some(guests) = updates.guests {
            booking.guests = guests;
        }
        if let Some(payment) = updates.payment {
            booking.payment = payment;
        }
        booking.updated_at = self.clock.now();

        if !self.bookings.update(&booking).await? {
            return Err(BookingError::NotFound("Booking not found".to_string()));
        }

        tracing::info!(booking_id = %booking.id, user_id = %principal.user_id, "Booking updated");
        Ok(booking)
    }

    /// Deletes a booking and frees its room when nothing else holds it.
    pub async fn cancel_booking(
        &self,
        booking_id: &str,
        principal: &Principal,
    ) -> Result<Booking, BookingError> {
        if booking_id.trim().is_empty() {
            return Err(BookingError::MissingId);
        }

        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;

        let today = self.clock.today();
        if booking.check_in_date < today && !principal.is_admin() {
            return Err(BookingError::PastBooking);
        }

        if !booking.is_owned_by(&principal.user_id) && !principal.is_admin() {
            return Err(BookingError::Forbidden(
                "You are not allowed to cancel this booking".to_string(),
            ));
        }

        // Held until the room status is settled; creates for this room wait.
        let room_lock = self.room_lock(&booking.room_id);
        let _guard = room_lock.lock().await;

        if self.bookings.delete(&booking.id).await? == 0 {
            return Err(BookingError::NotFound(
                "Failed to delete booking".to_string(),
            ));
        }

        if !self
            .bookings
            .has_booking_until(&booking.room_id, today)
            .await?
        {
            self.mark_room(&booking, RoomStatus::Available).await?;
        }

        tracing::info!(
            booking_id = %booking.id,
            room_id = %booking.room_id,
            cancelled_by = %principal.user_id,
            "Booking cancelled"
        );
        Ok(booking)
    }

    pub async fn get_booking(
        &self,
        booking_id: &str,
        principal: &Principal,
    ) -> Result<Booking, BookingError> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Booking not found".to_string()))?;

        if !booking.is_owned_by(&principal.user_id) && !principal.is_admin() {
            return Err(BookingError::Forbidden(
                "You are not allowed to view this booking".to_string(),
            ));
        }

        Ok(booking)
    }

    /// The caller's bookings, each with its room expanded.
    pub async fn list_user_bookings(
        &self,
        principal: &Principal,
    ) -> Result<Vec<BookingDetails>, BookingError> {
        let bookings = self.bookings.find_by_user(&principal.user_id).await?;

        let room_ids: Vec<String> = bookings
            .iter()
            .map(|b| b.room_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let rooms = self.rooms.find_many(&room_ids).await?;

        Ok(bookings
            .into_iter()
            .map(|booking| {
                let room = rooms.iter().find(|r| r.id == booking.room_id).cloned();
                BookingDetails { booking, room }
            })
            .collect())
    }

    pub async fn list_all_bookings(
        &self,
        principal: &Principal,
    ) -> Result<Vec<Booking>, BookingError> {
        if !principal.is_admin() {
            return Err(BookingError::Forbidden(
                "Admin role required".to_string(),
            ));
        }
        Ok(self.bookings.find_all().await?)
    }

    async fn mark_room(&self, booking: &Booking, status: RoomStatus) -> Result<(), BookingError> {
        match self.rooms.set_status(&booking.room_id, status).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(
                    room_id = %booking.room_id,
                    status = %status,
                    "Room disappeared before its status could be updated"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    booking_id = %booking.id,
                    room_id = %booking.room_id,
                    status = %status,
                    error = %e,
                    "Booking stored but room status update failed"
                );
                Err(e.into())
            }
        }
    }

    fn room_lock(&self, room_id: &str) -> Arc<Mutex<()>> {
        self.room_locks
            .entry(room_id.to_string())
            .or_default()
            .clone()
    }
}

fn payment_failed(step: &str, message: String) -> BookingError {
    tracing::warn!(step = %step, error = %message, "Payment gateway call failed");
    record_payment("error");
    BookingError::PaymentFailed(message)
}

/// Major currency units to the gateway's smallest unit.
fn to_minor_units(amount: f64) -> u64 {
    (amount * 100.0).round() as u64
}
