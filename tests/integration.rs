mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use ride_booking::api::rest::router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{in_minutes, setup, PHONE};

fn app() -> Router {
    let (state, _backend) = setup();
    router(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn agent_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-actor-id", "agent-1")
        .header("x-actor-name", "Omar Travel")
        .header("x-actor-email", "omar@agency.example")
        .header("x-actor-role", "agent")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn booking_payload() -> Value {
    json!({
        "customer": { "name": "Layla", "phone": PHONE },
        "routeId": "airport-downtown",
        "carType": "camry",
        "pickupTime": in_minutes(45),
        "pickupLocation": "Terminal 1, Gate B"
    })
}

async fn create(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/bookings", booking_payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn health_returns_ok() {
    let response = app().oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["subscribers"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = app();
    create(&app).await;

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("bookings_created_total 1"));
    assert!(body.contains("notifications_published_total"));
}

#[tokio::test]
async fn create_booking_returns_enriched_booking() {
    let app = app();
    let body = create(&app).await;

    assert_eq!(body["status"], "pending");
    assert_eq!(body["price"], 45.0);
    assert_eq!(body["agentCommission"], 0.0);
    assert_eq!(body["commissionPaid"], false);
    assert_eq!(body["customer"]["phone"], PHONE);
    assert_eq!(body["route"]["id"], "airport-downtown");
    assert!(body["driverId"].is_null());
    assert!(body["agentId"].is_null());
    assert!(!body["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn create_booking_too_soon_returns_400() {
    let mut payload = booking_payload();
    payload["pickupTime"] = json!(in_minutes(5));

    let response = app()
        .oneshot(json_request("POST", "/bookings", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("15 minutes"));
}

#[tokio::test]
async fn create_booking_bad_phone_returns_400() {
    let mut payload = booking_payload();
    payload["customer"]["phone"] = json!("0501234567");

    let response = app()
        .oneshot(json_request("POST", "/bookings", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_booking_unknown_route_returns_404() {
    let mut payload = booking_payload();
    payload["routeId"] = json!("moon-base");

    let response = app()
        .oneshot(json_request("POST", "/bookings", payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn agent_headers_attribute_the_booking() {
    let app = app();
    let response = app
        .clone()
        .oneshot(agent_request("POST", "/bookings", booking_payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["agentId"], "agent-1");
    assert_eq!(body["agent"]["bookingsCreated"], 1);

    let response = app.oneshot(get_request("/agents")).await.unwrap();
    let agents = body_json(response).await;
    assert_eq!(agents[0]["bookingsCreated"], 1);
}

#[tokio::test]
async fn unknown_role_header_returns_400() {
    let request = Request::builder()
        .method("POST")
        .uri("/bookings")
        .header("content-type", "application/json")
        .header("x-actor-id", "someone")
        .header("x-actor-role", "overlord")
        .body(Body::from(booking_payload().to_string()))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_unknown_booking_returns_404() {
    let response = app()
        .oneshot(get_request("/bookings/nonexistent"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("nonexistent"));
}

#[tokio::test]
async fn list_bookings_filters_by_status() {
    let app = app();
    let first = create(&app).await;
    create(&app).await;

    let uri = format!("/bookings/{}/assign", first["id"].as_str().unwrap());
    let response = app
        .clone()
        .oneshot(json_request("POST", &uri, json!({ "driverId": "driver-1" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/bookings"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = app
        .oneshot(get_request("/bookings?status=assigned"))
        .await
        .unwrap();
    let assigned = body_json(response).await;
    assert_eq!(assigned.as_array().unwrap().len(), 1);
    assert_eq!(assigned[0]["driver"]["id"], "driver-1");
}

#[tokio::test]
async fn assign_then_release_clears_driver() {
    let app = app();
    let booking = create(&app).await;
    let id = booking["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{id}/assign"),
            json!({ "driverId": "driver-2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "assigned");
    assert_eq!(body["driverId"], "driver-2");

    let response = app
        .oneshot(empty_request("POST", &format!("/bookings/{id}/release")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert!(body["driverId"].is_null());
}

#[tokio::test]
async fn assign_unknown_driver_returns_404() {
    let app = app();
    let booking = create(&app).await;

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{}/assign", booking["id"].as_str().unwrap()),
            json!({ "driverId": "driver-404" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_transition_returns_409() {
    let app = app();
    let booking = create(&app).await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/bookings/{}/status", booking["id"].as_str().unwrap()),
            json!({ "status": "completed" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("pending"));
}

#[tokio::test]
async fn status_update_walks_the_ride() {
    let app = app();
    let booking = create(&app).await;
    let uri = format!("/bookings/{}/status", booking["id"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &uri,
            json!({ "status": "assigned", "driverId": "driver-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for status in ["pickup", "drop", "completed"] {
        let response = app
            .clone()
            .oneshot(json_request("PATCH", &uri, json!({ "status": status })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], status);
        assert_eq!(body["driverId"], "driver-1");
    }
}

#[tokio::test]
async fn patch_booking_updates_price() {
    let app = app();
    let booking = create(&app).await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/bookings/{}", booking["id"].as_str().unwrap()),
            json!({ "price": 55.5, "specialInstructions": "Two suitcases" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["price"], 55.5);
    assert_eq!(body["specialInstructions"], "Two suitcases");
}

#[tokio::test]
async fn patch_booking_unknown_field_returns_422() {
    let app = app();
    let booking = create(&app).await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/bookings/{}", booking["id"].as_str().unwrap()),
            json!({ "status": "completed" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn commission_paid_is_idempotent_and_final() {
    let app = app();
    let booking = create(&app).await;
    let id = booking["id"].as_str().unwrap();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(empty_request("POST", &format!("/bookings/{id}/commission/paid")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["commissionPaid"], true);
    }

    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/bookings/{id}"),
            json!({ "commissionPaid": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_booking_returns_204_then_404() {
    let app = app();
    let booking = create(&app).await;
    let uri = format!("/bookings/{}", booking["id"].as_str().unwrap());

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn available_drivers_are_online_and_matching() {
    let app = app();
    let response = app
        .clone()
        .oneshot(get_request("/drivers/available?car_type=camry"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], "driver-1");

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/drivers/driver-3/online",
            json!({ "isOnline": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["isOnline"], true);

    let response = app
        .oneshot(get_request("/drivers/available?car_type=camry"))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn reference_lists_are_served() {
    let app = app();

    let response = app.clone().oneshot(get_request("/car-types")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 4);

    let response = app.clone().oneshot(get_request("/routes")).await.unwrap();
    let routes = body_json(response).await;
    assert_eq!(routes.as_array().unwrap().len(), 2);

    let response = app.oneshot(get_request("/drivers")).await.unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn snapshot_contains_every_collection() {
    let app = app();
    create(&app).await;

    let response = app.oneshot(get_request("/snapshot")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["carTypes"].as_array().unwrap().len(), 4);
    assert_eq!(body["routes"].as_array().unwrap().len(), 2);
    assert_eq!(body["bookings"].as_array().unwrap().len(), 1);
    assert_eq!(body["drivers"].as_array().unwrap().len(), 3);
    assert_eq!(body["agents"].as_array().unwrap().len(), 1);
    assert!(body["warnings"].as_array().unwrap().is_empty());
}
