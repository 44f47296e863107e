#![allow(dead_code)]

use booking_service::config::{
    AuthConfig, BookingConfig, MongoConfig, StorageBackend, StripeConfig,
};
use booking_service::middleware::AuthClaims;
use booking_service::models::Role;
use booking_service::startup::Application;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CommonConfig;
use wiremock::MockServer;

pub const TEST_JWT_SECRET: &str = "booking-test-secret";
pub const TEST_USER_ID: &str = "user-1";
pub const OTHER_USER_ID: &str = "user-2";
pub const TEST_ADMIN_ID: &str = "admin-1";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: Client,
    pub stripe: MockServer,
}

impl TestApp {
    /// Boots the service on a random port with in-memory storage and a mocked Stripe API.
    pub async fn spawn() -> Self {
        let stripe = MockServer::start().await;

        let config = BookingConfig {
            common: CommonConfig {
                port: 0,
                ..CommonConfig::default()
            },
            storage: StorageBackend::Memory,
            mongodb: MongoConfig {
                uri: Secret::new(String::new()),
                database: "booking_test".to_string(),
            },
            stripe: StripeConfig {
                secret_key: Secret::new("sk_test_123".to_string()),
                api_base_url: stripe.uri(),
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(TEST_JWT_SECRET.to_string()),
            },
            currency: "usd".to_string(),
            service_name: "booking-service".to_string(),
        };

        let application = Application::build(config)
            .await
            .expect("Failed to build application");
        let port = application.port();

        tokio::spawn(async move {
            application
                .run_until_stopped()
                .await
                .expect("Server failed");
        });

        Self {
            address: format!("http://127.0.0.1:{}", port),
            port,
            client: Client::new(),
            stripe,
        }
    }

    pub fn token(&self, user_id: &str, role: Role) -> String {
        let claims = AuthClaims {
            sub: user_id.to_string(),
            role,
            exp: chrono::Utc::now().timestamp() + 3600,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .expect("Failed to sign token")
    }

    pub fn user_token(&self) -> String {
        self.token(TEST_USER_ID, Role::User)
    }

    pub fn admin_token(&self) -> String {
        self.token(TEST_ADMIN_ID, Role::Admin)
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, token: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(format!("{}{}", self.address, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates a room as admin and returns its id.
    pub async fn create_room(&self, room_number: &str) -> String {
        let response = self
            .post(
                "/rooms",
                &self.admin_token(),
                &json!({
                    "roomNumber": room_number,
                    "roomType": "Deluxe",
                    "price": 180.0
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let room: Value = response.json().await.expect("Failed to parse room");
        room["_id"]
            .as_str()
            .expect("Room has no id")
            .to_string()
    }

    pub async fn room_status(&self, room_id: &str) -> String {
        let room: Value = self
            .get(&format!("/rooms/{}", room_id), &self.user_token())
            .await
            .json()
            .await
            .expect("Failed to parse room");
        room["status"].as_str().unwrap_or_default().to_string()
    }
}

/// A paypal booking request, which never touches the gateway.
pub fn booking_body(room_id: &str, check_in: &str, check_out: &str) -> Value {
    json!({
        "roomId": room_id,
        "checkInDate": check_in,
        "checkOutDate": check_out,
        "guests": 2,
        "payment": "paypal",
        "totalPrice": 450.0,
        "fullName": "Ada Guest",
        "email": "ada@example.com"
    })
}

/// `YYYY-MM-DD` of the UTC date `days` away from today.
pub fn date_in(days: i64) -> String {
    (chrono::Utc::now().date_naive() + chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}
