mod common;

use common::{booking_body, date_in, TestApp, OTHER_USER_ID, TEST_USER_ID};
use booking_service::models::Role;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn create(app: &TestApp, token: &str, body: &Value) -> (u16, Value) {
    let response = app.post("/bookings", token, body).await;
    let status = response.status().as_u16();
    let body = response.json().await.expect("Failed to parse JSON");
    (status, body)
}

#[tokio::test]
async fn create_booking_without_card_marks_room_booked() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room("101").await;

    let (status, body) = create(
        &app,
        &app.user_token(),
        &booking_body(&room_id, &date_in(400), &date_in(405)),
    )
    .await;

    assert_eq!(status, 201);
    let booking = &body["booking"];
    assert_eq!(booking["userId"], TEST_USER_ID);
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["paymentStatus"], "pending");
    assert!(booking["paymentIntentId"].is_null());
    assert_eq!(booking["roomNumber"], "101");
    assert_eq!(booking["roomType"], "Deluxe");
    assert_eq!(booking["checkInDate"], date_in(400));
    assert!(body["paymentIntent"].is_null());

    assert_eq!(app.room_status(&room_id).await, "Booked");
}

#[tokio::test]
async fn overlapping_booking_is_rejected_and_adjacent_one_accepted() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room("102").await;
    let token = app.user_token();

    let (status, _) = create(&app, &token, &booking_body(&room_id, &date_in(400), &date_in(405))).await;
    assert_eq!(status, 201);

    let (status, body) =
        create(&app, &token, &booking_body(&room_id, &date_in(402), &date_in(410))).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "ROOM_UNAVAILABLE");
    assert!(body["message"].as_str().unwrap().contains("not available"));

    let (status, _) = create(&app, &token, &booking_body(&room_id, &date_in(405), &date_in(410))).await;
    assert_eq!(status, 201);

    let list: Vec<Value> = app
        .get("/bookings/user", &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 2);
}

#[tokio::test]
async fn missing_fields_are_listed() {
    let app = TestApp::spawn().await;

    let (status, body) = create(
        &app,
        &app.user_token(),
        &json!({ "roomId": "whatever", "guests": 2 }),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "MISSING_FIELDS");
    assert_eq!(
        body["fields"],
        json!(["checkInDate", "checkOutDate", "payment", "totalPrice"])
    );
}

#[tokio::test]
async fn invalid_field_values_are_rejected() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room("103").await;

    let mut body = booking_body(&room_id, &date_in(400), &date_in(405));
    body["guests"] = json!(0);
    body["email"] = json!("not-an-email");

    let response = app.post("/bookings", &app.user_token(), &body).await;
    assert_eq!(response.status().as_u16(), 422);
    assert_eq!(app.room_status(&room_id).await, "Available");
}

#[tokio::test]
async fn booking_an_unknown_room_is_not_found() {
    let app = TestApp::spawn().await;

    let (status, body) = create(
        &app,
        &app.user_token(),
        &booking_body("no-such-room", &date_in(400), &date_in(405)),
    )
    .await;

    assert_eq!(status, 404);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn card_booking_confirms_payment_intent() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room("201").await;

    Mock::given(method("POST"))
        .and(path("/payment_intents"))
        .and(header("authorization", "Bearer sk_test_123"))
        .and(body_string_contains("amount=45000"))
        .and(body_string_contains("currency=usd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_123",
            "status": "requires_confirmation",
            "amount": 45000,
            "currency": "usd",
            "metadata": { "roomId": room_id }
        })))
        .expect(1)
        .mount(&app.stripe)
        .await;

    Mock::given(method("POST"))
        .and(path("/payment_intents/pi_123/confirm"))
        .and(body_string_contains("payment_method=pm_card_visa"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_123",
            "status": "succeeded",
            "amount": 45000,
            "currency": "usd"
        })))
        .expect(1)
        .mount(&app.stripe)
        .await;

    let mut body = booking_body(&room_id, &date_in(421), &date_in(424));
    body["payment"] = json!("card");
    body["paymentMethodId"] = json!("pm_card_visa");

    let (status, body) = create(&app, &app.user_token(), &body).await;

    assert_eq!(status, 201);
    assert_eq!(body["booking"]["paymentIntentId"], "pi_123");
    assert_eq!(body["booking"]["paymentStatus"], "succeeded");
    assert_eq!(body["paymentIntent"]["id"], "pi_123");
    assert_eq!(body["paymentIntent"]["status"], "succeeded");
    assert_eq!(app.room_status(&room_id).await, "Booked");
}

#[tokio::test]
async fn declined_card_persists_nothing() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room("202").await;

    Mock::given(method("POST"))
        .and(path("/payment_intents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pi_456",
            "status": "requires_confirmation",
            "amount": 45000,
            "currency": "usd"
        })))
        .mount(&app.stripe)
        .await;

    Mock::given(method("POST"))
        .and(path("/payment_intents/pi_456/confirm"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": {
                "message": "Your card was declined.",
                "code": "card_declined",
                "type": "card_error"
            }
        })))
        .mount(&app.stripe)
        .await;

    let mut body = booking_body(&room_id, &date_in(421), &date_in(424));
    body["payment"] = json!("card");
    body["paymentMethodId"] = json!("pm_card_chargeDeclined");

    let (status, body) = create(&app, &app.user_token(), &body).await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "PAYMENT_FAILED");
    assert_eq!(body["message"], "Your card was declined.");

    let list: Vec<Value> = app
        .get("/bookings/user", &app.user_token())
        .await
        .json()
        .await
        .unwrap();
    assert!(list.is_empty());
    assert_eq!(app.room_status(&room_id).await, "Available");
}

#[tokio::test]
async fn only_owner_or_admin_can_read_a_booking() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room("301").await;

    let (_, body) = create(
        &app,
        &app.user_token(),
        &booking_body(&room_id, &date_in(452), &date_in(454)),
    )
    .await;
    let booking_id = body["booking"]["_id"].as_str().unwrap().to_string();
    let path = format!("/bookings/{}", booking_id);

    let response = app.get(&path, &app.user_token()).await;
    assert_eq!(response.status().as_u16(), 200);

    let response = app.get(&path, &app.token(OTHER_USER_ID, Role::User)).await;
    assert_eq!(response.status().as_u16(), 403);

    let response = app.get(&path, &app.admin_token()).await;
    assert_eq!(response.status().as_u16(), 200);

    let response = app.get("/bookings/missing", &app.user_token()).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn cancelling_last_booking_frees_the_room() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room("401").await;
    let token = app.user_token();

    let (_, body) = create(&app, &token, &booking_body(&room_id, &date_in(483), &date_in(487))).await;
    let booking_id = body["booking"]["_id"].as_str().unwrap().to_string();
    let path = format!("/bookings/{}", booking_id);

    let response = app.delete(&path, &app.token(OTHER_USER_ID, Role::User)).await;
    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(app.room_status(&room_id).await, "Booked");

    let response = app.delete(&path, &token).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Booking cancelled");
    assert_eq!(body["booking"]["_id"], booking_id.as_str());

    assert_eq!(app.room_status(&room_id).await, "Available");
    assert_eq!(app.get(&path, &token).await.status().as_u16(), 404);
}

#[tokio::test]
async fn cancelling_keeps_room_booked_while_future_bookings_remain() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room("402").await;
    let token = app.user_token();

    let (_, first) = create(&app, &token, &booking_body(&room_id, &date_in(483), &date_in(487))).await;
    let (status, _) = create(&app, &token, &booking_body(&room_id, &date_in(513), &date_in(517))).await;
    assert_eq!(status, 201);

    let path = format!("/bookings/{}", first["booking"]["_id"].as_str().unwrap());
    assert_eq!(app.delete(&path, &token).await.status().as_u16(), 200);

    assert_eq!(app.room_status(&room_id).await, "Booked");
}

#[tokio::test]
async fn past_bookings_are_locked_for_users_but_not_admins() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room("501").await;
    let token = app.user_token();

    let (status, body) = create(&app, &token, &booking_body(&room_id, &date_in(-30), &date_in(-28))).await;
    assert_eq!(status, 201);
    let path = format!("/bookings/{}", body["booking"]["_id"].as_str().unwrap());

    let response = app.put(&path, &token, &json!({ "guests": 3 })).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "PAST_BOOKING");

    let response = app.delete(&path, &token).await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app.delete(&path, &app.admin_token()).await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn update_overwrites_given_fields_for_the_owner_only() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room("601").await;
    let token = app.user_token();

    let (_, body) = create(&app, &token, &booking_body(&room_id, &date_in(544), &date_in(546))).await;
    let path = format!("/bookings/{}", body["booking"]["_id"].as_str().unwrap());

    let response = app
        .put(
            &path,
            &token,
            &json!({ "checkOutDate": date_in(547), "guests": 3 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["checkInDate"], date_in(544));
    assert_eq!(updated["checkOutDate"], date_in(547));
    assert_eq!(updated["guests"], 3);
    assert_eq!(updated["payment"], "paypal");

    // Update lookups are scoped to the caller, admins included.
    let response = app.put(&path, &app.admin_token(), &json!({ "guests": 1 })).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn user_listing_expands_room_and_admin_listing_is_restricted() {
    let app = TestApp::spawn().await;
    let room_id = app.create_room("701").await;

    create(&app, &app.user_token(), &booking_body(&room_id, &date_in(574), &date_in(576))).await;
    create(
        &app,
        &app.token(OTHER_USER_ID, Role::User),
        &booking_body(&room_id, &date_in(583), &date_in(585)),
    )
    .await;

    let mine: Vec<Value> = app
        .get("/bookings/user", &app.user_token())
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["room"]["roomNumber"], "701");
    assert_eq!(mine[0]["room"]["status"], "Booked");

    let response = app.get("/bookings", &app.user_token()).await;
    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "FORBIDDEN");

    let all: Vec<Value> = app
        .get("/bookings", &app.admin_token())
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}
