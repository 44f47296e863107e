//! Booking ledger and room store, with their MongoDB implementations.

use crate::models::{Booking, Room, RoomStatus};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use futures::TryStreamExt;
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{bson::doc, Collection, Database, IndexModel};

/// Persisted bookings.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: &Booking) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>>;

    /// Lookup restricted to bookings owned by `user_id`.
    async fn find_owned(&self, id: &str, user_id: &str) -> Result<Option<Booking>>;

    async fn find_by_room(&self, room_id: &str) -> Result<Vec<Booking>>;

    /// Newest first.
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Booking>>;

    /// Newest first.
    async fn find_all(&self) -> Result<Vec<Booking>>;

    /// Replaces the stored record; `false` when no record had that id.
    async fn update(&self, booking: &Booking) -> Result<bool>;

    /// Number of records removed.
    async fn delete(&self, id: &str) -> Result<u64>;

    /// Whether any booking on `room_id` checks out on or after `date`.
    async fn has_booking_until(&self, room_id: &str, date: NaiveDate) -> Result<bool>;
}

/// Rooms and their availability status.
#[async_trait]
pub trait RoomStore: Send + Sync {
    async fn insert(&self, room: &Room) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Room>>;

    async fn find_many(&self, ids: &[String]) -> Result<Vec<Room>>;

    async fn list(&self) -> Result<Vec<Room>>;

    /// `false` when the room does not exist.
    async fn set_status(&self, id: &str, status: RoomStatus) -> Result<bool>;
}

/// Calendar dates are stored as `YYYY-MM-DD` strings, which order lexically.
fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn newest_first() -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "createdAt": -1 })
        .build()
}

#[derive(Clone)]
pub struct MongoBookingRepository {
    collection: Collection<Booking>,
}

impl MongoBookingRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("bookings"),
        }
    }

    pub async fn init_indexes(&self) -> Result<()> {
        // Conflict scans and the upcoming-booking check filter by room.
        let room_index = IndexModel::builder()
            .keys(doc! { "roomId": 1, "checkOutDate": 1 })
            .options(
                IndexOptions::builder()
                    .name("room_checkout_idx".to_string())
                    .build(),
            )
            .build();

        let user_index = IndexModel::builder()
            .keys(doc! { "userId": 1, "createdAt": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_bookings_idx".to_string())
                    .build(),
            )
            .build();

        self.collection
            .create_indexes([room_index, user_index], None)
            .await?;

        tracing::info!("Booking indexes initialized");
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MongoBookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<()> {
        self.collection.insert_one(booking, None).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_owned(&self, id: &str, user_id: &str) -> Result<Option<Booking>> {
        let filter = doc! { "_id": id, "userId": user_id };
        Ok(self.collection.find_one(filter, None).await?)
    }

    async fn find_by_room(&self, room_id: &str) -> Result<Vec<Booking>> {
        let cursor = self
            .collection
            .find(doc! { "roomId": room_id }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Booking>> {
        let cursor = self
            .collection
            .find(doc! { "userId": user_id }, Some(newest_first()))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_all(&self) -> Result<Vec<Booking>> {
        let cursor = self.collection.find(doc! {}, Some(newest_first())).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update(&self, booking: &Booking) -> Result<bool> {
        let result = self
            .collection
            .replace_one(doc! { "_id": booking.id.as_str() }, booking, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: &str) -> Result<u64> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count)
    }

    async fn has_booking_until(&self, room_id: &str, date: NaiveDate) -> Result<bool> {
        let filter = doc! {
            "roomId": room_id,
            "checkOutDate": { "$gte": date_key(date) }
        };
        Ok(self.collection.find_one(filter, None).await?.is_some())
    }
}

#[derive(Clone)]
pub struct MongoRoomRepository {
    collection: Collection<Room>,
}

impl MongoRoomRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("rooms"),
        }
    }

    pub async fn init_indexes(&self) -> Result<()> {
        let number_index = IndexModel::builder()
            .keys(doc! { "roomNumber": 1 })
            .options(
                IndexOptions::builder()
                    .name("room_number_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.collection.create_index(number_index, None).await?;

        tracing::info!("Room indexes initialized");
        Ok(())
    }
}

#[async_trait]
impl RoomStore for MongoRoomRepository {
    async fn insert(&self, room: &Room) -> Result<()> {
        self.collection.insert_one(room, None).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Room>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_many(&self, ids: &[String]) -> Result<Vec<Room>> {
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids } }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list(&self) -> Result<Vec<Room>> {
        let options = FindOptions::builder()
            .sort(doc! { "roomNumber": 1 })
            .build();
        let cursor = self.collection.find(doc! {}, Some(options)).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_status(&self, id: &str, status: RoomStatus) -> Result<bool> {
        let update = doc! {
            "$set": {
                "status": mongodb::bson::to_bson(&status)?,
                "updatedAt": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true),
            }
        };
        let result = self
            .collection
            .update_one(doc! { "_id": id }, update, None)
            .await?;
        Ok(result.matched_count > 0)
    }
}
