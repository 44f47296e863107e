//! Process-local stores, used for `BOOKING_STORAGE=memory` and in tests.

use crate::models::{Booking, Room, RoomStatus};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use std::cmp::Reverse;

use super::repository::{BookingStore, RoomStore};

#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: DashMap<String, Booking>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    fn collect_where(&self, predicate: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let mut found: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by_key(|b| (Reverse(b.created_at), b.id.clone()));
        found
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: &Booking) -> Result<()> {
        if self.bookings.contains_key(&booking.id) {
            anyhow::bail!("Duplicate booking id {}", booking.id);
        }
        self.bookings.insert(booking.id.clone(), booking.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>> {
        Ok(self.bookings.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_owned(&self, id: &str, user_id: &str) -> Result<Option<Booking>> {
        Ok(self
            .bookings
            .get(id)
            .filter(|entry| entry.is_owned_by(user_id))
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_room(&self, room_id: &str) -> Result<Vec<Booking>> {
        Ok(self.collect_where(|b| b.room_id == room_id))
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        Ok(self.collect_where(|b| b.is_owned_by(user_id)))
    }

    async fn find_all(&self) -> Result<Vec<Booking>> {
        Ok(self.collect_where(|_| true))
    }

    async fn update(&self, booking: &Booking) -> Result<bool> {
        match self.bookings.get_mut(&booking.id) {
            Some(mut entry) => {
                *entry = booking.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &str) -> Result<u64> {
        Ok(self.bookings.remove(id).map_or(0, |_| 1))
    }

    async fn has_booking_until(&self, room_id: &str, date: NaiveDate) -> Result<bool> {
        Ok(self
            .bookings
            .iter()
            .any(|entry| entry.room_id == room_id && entry.check_out_date >= date))
    }
}

#[derive(Default)]
pub struct InMemoryRoomStore {
    rooms: DashMap<String, Room>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn insert(&self, room: &Room) -> Result<()> {
        let duplicate = self
            .rooms
            .iter()
            .any(|entry| entry.id == room.id || entry.room_number == room.room_number);
        if duplicate {
            anyhow::bail!("Room {} already exists", room.room_number);
        }
        self.rooms.insert(room.id.clone(), room.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Room>> {
        Ok(self.rooms.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_many(&self, ids: &[String]) -> Result<Vec<Room>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.rooms.get(id).map(|entry| entry.value().clone()))
            .collect())
    }

    async fn list(&self) -> Result<Vec<Room>> {
        let mut rooms: Vec<Room> = self
            .rooms
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(rooms)
    }

    async fn set_status(&self, id: &str, status: RoomStatus) -> Result<bool> {
        match self.rooms.get_mut(id) {
            Some(mut entry) => {
                entry.status = status;
                entry.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
