//! In-process request-to-response tests over the full router.
//!
//! Each test builds the application state over a fresh temp directory and
//! drives the router directly with `tower::ServiceExt::oneshot`; checkout
//! tests run against a stub payment gateway on an ephemeral local port.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;
use url::Url;

use ovenside_api::config::{ApiConfig, MailConfig, PaymentConfig};
use ovenside_api::routes;
use ovenside_api::state::AppState;
use ovenside_core::Email;

struct TestApi {
    _dir: TempDir,
    state: AppState,
}

impl TestApi {
    async fn new() -> Self {
        Self::build(None, false).await
    }

    async fn with_gateway(gateway: Url) -> Self {
        Self::build(Some(gateway), false).await
    }

    async fn strict() -> Self {
        Self::build(None, true).await
    }

    async fn build(gateway: Option<Url>, strict_methods: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(dir.path().join("templates"))
            .await
            .unwrap();
        tokio::fs::write(
            dir.path().join("templates/index.html"),
            "<html><body>Ovenside</body></html>",
        )
        .await
        .unwrap();

        // Port 9 (discard) - anything that actually dials this fails fast.
        let gateway =
            gateway.unwrap_or_else(|| Url::parse("http://127.0.0.1:9/").unwrap());

        let config = ApiConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            data_dir: dir.path().join("data"),
            log_dir: dir.path().join("logs"),
            public_dir: dir.path().join("public"),
            templates_dir: dir.path().join("templates"),
            session_validity: Duration::from_secs(3600),
            refresh_validity: Duration::from_secs(86_400),
            strict_methods,
            log_rotation: Duration::from_secs(86_400),
            payment: PaymentConfig {
                base_url: gateway.clone(),
                secret_key: secrecy::SecretString::from("sk_test_x"),
                currency: ovenside_core::Currency::default(),
            },
            mail: MailConfig {
                base_url: gateway,
                api_key: secrecy::SecretString::from("key-x"),
                domain: "mg.example.com".to_owned(),
                sender: "no-reply@mg.example.com".to_owned(),
            },
        };

        let state = AppState::bootstrap(config).await.unwrap();
        Self { _dir: dir, state }
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("x-auth-token", token);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = routes::router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    async fn seed_menu(&self) {
        self.state
            .store()
            .create(
                "menu",
                "default",
                &json!([
                    { "menu_id": "m1", "name": "Margherita", "price": "8.50" },
                    { "menu_id": "m2", "name": "Diavola", "price": "10.00" },
                ]),
            )
            .await
            .unwrap();
    }

    async fn signup(&self, email: &str) {
        let (status, _) = self
            .send(
                "POST",
                "/api/users",
                None,
                Some(json!({
                    "firstName": "Franco",
                    "lastName": "Pivotti",
                    "email": email,
                    "address": "1 Oven Lane",
                    "password": "margherita1",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/tokens",
                None,
                Some(json!({ "email": email, "password": "margherita1" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"].as_str().unwrap().to_owned()
    }
}

/// Minimal HTTP responder standing in for the payment gateway (and the
/// mail provider, which shares the base URL in these tests).
async fn spawn_gateway(decline_charges: bool) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(respond(socket, decline_charges));
        }
    });

    Url::parse(&format!("http://{addr}/")).unwrap()
}

async fn respond(mut socket: TcpStream, decline_charges: bool) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];

    // Read the head, then as many body bytes as content-length promises.
    let (head_end, content_length) = loop {
        let Ok(n) = socket.read(&mut tmp).await else { return };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]);
            let length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            break (pos + 4, length);
        }
    };
    while buf.len() < head_end + content_length {
        let Ok(n) = socket.read(&mut tmp).await else { break };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&tmp[..n]);
    }

    let head = String::from_utf8_lossy(&buf[..head_end]);
    let (status, body) = if head.contains("/v1/tokens") {
        ("200 OK", r#"{"id":"tok_test_visa"}"#)
    } else if head.contains("/v1/charges") && decline_charges {
        (
            "402 Payment Required",
            r#"{"error":{"message":"Your card was declined."}}"#,
        )
    } else if head.contains("/v1/charges") {
        ("200 OK", r#"{"id":"ch_test_1","status":"succeeded"}"#)
    } else {
        ("200 OK", "{}")
    };

    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\n\
         content-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn card_payload(order_id: &str) -> Value {
    json!({
        "number": "4242424242424242",
        "exp_month": "04",
        "exp_year": "2031",
        "cvc": "314",
        "order_id": order_id,
    })
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn unknown_path_is_a_uniform_404() {
    let api = TestApi::new().await;

    let (status, body) = api.send("GET", "/api/desserts", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Request could not be processed.");
}

#[tokio::test]
async fn unsupported_method_is_404_by_default() {
    let api = TestApi::new().await;

    let (status, body) = api.send("DELETE", "/api/menu", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Request could not be processed.");
}

#[tokio::test]
async fn unsupported_method_is_405_when_strict() {
    let api = TestApi::strict().await;

    let (status, body) = api.send("DELETE", "/api/menu", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["message"], "Request could not be processed.");
}

#[tokio::test]
async fn home_serves_the_template_shell() {
    let api = TestApi::new().await;

    let (status, body) = api.send("GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("<html><body>Ovenside</body></html>".into()));

    let (status, body) = api.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn server_errors_reach_the_error_log() {
    let api = TestApi::new().await;

    // No menu seeded: the read fails and the 500 is recorded.
    let (status, _) = api.send("GET", "/api/menu", None, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let log = tokio::fs::read_to_string(api.state.errors().path())
        .await
        .unwrap();
    assert!(log.contains("GET /api/menu responded 500"));
}

// ============================================================================
// Accounts and sessions
// ============================================================================

#[tokio::test]
async fn signup_login_profile_round_trip() {
    let api = TestApi::new().await;
    api.signup("frank@example.com").await;

    // The token payload exposes the value and expiry, nothing else.
    let (status, body) = api
        .send(
            "POST",
            "/api/tokens",
            None,
            Some(json!({ "email": "frank@example.com", "password": "margherita1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_object().unwrap();
    assert!(data.contains_key("token"));
    assert!(data.contains_key("expiresIn"));
    assert!(!data.contains_key("email"));
    assert!(!data.contains_key("refreshValidity"));

    // The profile hides credentials and internal back-references.
    let token = data["token"].as_str().unwrap();
    let (status, body) = api.send("GET", "/api/users", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    let profile = body["data"].as_object().unwrap();
    assert_eq!(profile["email"], "frank@example.com");
    for hidden in ["password", "tokens", "orders"] {
        assert!(!profile.contains_key(hidden), "leaked {hidden}");
    }
}

#[tokio::test]
async fn signup_rejects_short_fields() {
    let api = TestApi::new().await;

    let (status, body) = api
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({
                "firstName": "Al",
                "lastName": "Po",
                "email": "al@example.com",
                "address": "1 Oven Lane",
                "password": "short",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["message"],
        "Some required fields are either missing or incorrectly filled."
    );
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let api = TestApi::new().await;
    api.signup("frank@example.com").await;

    let (status, body) = api
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({
                "firstName": "Franco",
                "lastName": "Pivotti",
                "email": "frank@example.com",
                "address": "2 Oven Lane",
                "password": "margherita1",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists.");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let api = TestApi::new().await;

    let (status, body) = api.send("GET", "/api/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided.");
}

#[tokio::test]
async fn foreign_account_access_is_forbidden() {
    let api = TestApi::new().await;
    api.signup("frank@example.com").await;
    api.signup("mallory@example.com").await;
    let token = api.login("mallory@example.com").await;

    let (status, body) = api
        .send(
            "PUT",
            "/api/users?email=frank@example.com",
            Some(&token),
            Some(json!({ "address": "99 Hijack Street" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Forbidden user.");
}

#[tokio::test]
async fn profile_update_requires_a_field() {
    let api = TestApi::new().await;
    api.signup("frank@example.com").await;
    let token = api.login("frank@example.com").await;

    let (status, body) = api
        .send(
            "PUT",
            "/api/users?email=frank@example.com",
            Some(&token),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["message"],
        "At least one field must be filled appropriately."
    );

    let (status, body) = api
        .send(
            "PUT",
            "/api/users?email=frank@example.com",
            Some(&token),
            Some(json!({ "address": "2 Oven Lane" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["address"], "2 Oven Lane");
}

#[tokio::test]
async fn account_deletion_cascades() {
    let api = TestApi::new().await;
    api.signup("frank@example.com").await;
    let token = api.login("frank@example.com").await;

    let (status, body) = api
        .send(
            "DELETE",
            "/api/users?email=frank@example.com",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted.");

    // The session died with the account.
    let (status, body) = api.send("GET", "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token.");
}

#[tokio::test]
async fn refresh_extends_an_expired_token_inside_the_window() {
    let api = TestApi::new().await;
    let now = Utc::now().timestamp_millis();
    let refresh_deadline = now + 60_000;

    let record = json!({
        "token": "staleTokenStaleToke1",
        "email": "frank@example.com",
        "expiresIn": now - 60_000,
        "refreshValidity": refresh_deadline,
    });
    api.state
        .store()
        .create("tokens", "staleTokenStaleToke1", &record)
        .await
        .unwrap();

    // Expired, so it cannot authenticate...
    let (status, body) = api
        .send("GET", "/api/users", Some("staleTokenStaleToke1"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token expired.");

    // ...but it can still be refreshed. The new expiry is capped at the
    // refresh deadline.
    let (status, body) = api
        .send(
            "PUT",
            "/api/tokens",
            Some("staleTokenStaleToke1"),
            Some(json!({ "extend": true })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["expiresIn"].as_i64().unwrap(), refresh_deadline);
}

#[tokio::test]
async fn refresh_rejects_a_dead_token() {
    let api = TestApi::new().await;
    let now = Utc::now().timestamp_millis();

    let record = json!({
        "token": "deadTokenDeadToken12",
        "email": "frank@example.com",
        "expiresIn": now - 120_000,
        "refreshValidity": now - 60_000,
    });
    api.state
        .store()
        .create("tokens", "deadTokenDeadToken12", &record)
        .await
        .unwrap();

    let (status, body) = api
        .send(
            "PUT",
            "/api/tokens",
            Some("deadTokenDeadToken12"),
            Some(json!({ "extend": true })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has expired and is not extendable.");
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let api = TestApi::new().await;
    api.signup("frank@example.com").await;
    let token = api.login("frank@example.com").await;

    let (status, body) = api
        .send("DELETE", "/api/tokens", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Token deleted.");

    let (status, _) = api.send("GET", "/api/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The back-reference is gone too.
    let user: Value = api
        .state
        .store()
        .read("users", "frank@example.com")
        .await
        .unwrap();
    assert_eq!(user["tokens"].as_array().unwrap().len(), 0);
}

// ============================================================================
// Menu and carts
// ============================================================================

#[tokio::test]
async fn menu_is_public() {
    let api = TestApi::new().await;
    api.seed_menu().await;

    let (status, body) = api.send("GET", "/api/menu", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn cart_flow_adds_adjusts_and_removes_lines() {
    let api = TestApi::new().await;
    api.seed_menu().await;
    api.signup("frank@example.com").await;
    let token = api.login("frank@example.com").await;

    // An account starts with an empty cart and no cart record.
    let (status, body) = api.send("GET", "/api/carts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    // Add a line.
    let (status, body) = api
        .send(
            "POST",
            "/api/carts",
            Some(&token),
            Some(json!({ "menu_id": "m1", "qty": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"][0]["qty"], 2);

    // Same menu_id again replaces the quantity, not a second line.
    let (status, body) = api
        .send(
            "POST",
            "/api/carts",
            Some(&token),
            Some(json!({ "menu_id": "m1", "qty": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"].as_array().unwrap().len(), 1);
    assert_eq!(body["cart"][0]["qty"], 5);

    // Increment.
    let (status, body) = api
        .send(
            "PUT",
            "/api/carts?menu_id=m1",
            Some(&token),
            Some(json!({ "action": "incr" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["cart"][0]["qty"], 6);

    // Adjusting a line that is not there reports the current cart.
    let (status, body) = api
        .send(
            "PUT",
            "/api/carts?menu_id=m2",
            Some(&token),
            Some(json!({ "action": "decr" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Cannot add to or remove from a non-existing item."
    );
    assert_eq!(body["cart"].as_array().unwrap().len(), 1);

    // Remove the line.
    let (status, body) = api
        .send("DELETE", "/api/carts?menu_id=m1", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["cart"], json!([]));

    let (status, body) = api
        .send("DELETE", "/api/carts?menu_id=m1", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Menu item not found in cart.");
}

#[tokio::test]
async fn unknown_menu_item_cannot_be_added() {
    let api = TestApi::new().await;
    api.seed_menu().await;
    api.signup("frank@example.com").await;
    let token = api.login("frank@example.com").await;

    let (status, body) = api
        .send(
            "POST",
            "/api/carts",
            Some(&token),
            Some(json!({ "menu_id": "m999", "qty": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Menu item not found.");
}

#[tokio::test]
async fn decrement_to_zero_drops_the_line() {
    let api = TestApi::new().await;
    api.seed_menu().await;
    api.signup("frank@example.com").await;
    let token = api.login("frank@example.com").await;

    api.send(
        "POST",
        "/api/carts",
        Some(&token),
        Some(json!({ "menu_id": "m2", "qty": 1 })),
    )
    .await;

    let (status, body) = api
        .send(
            "PUT",
            "/api/carts?menu_id=m2",
            Some(&token),
            Some(json!({ "action": "decr" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["cart"], json!([]));
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn placing_an_order_snapshots_and_clears_the_cart() {
    let api = TestApi::new().await;
    api.seed_menu().await;
    api.signup("frank@example.com").await;
    let token = api.login("frank@example.com").await;

    api.send(
        "POST",
        "/api/carts",
        Some(&token),
        Some(json!({ "menu_id": "m1", "qty": 2 })),
    )
    .await;
    api.send(
        "POST",
        "/api/carts",
        Some(&token),
        Some(json!({ "menu_id": "m2", "qty": 1 })),
    )
    .await;

    let (status, body) = api.send("GET", "/api/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order saved successfully.");

    // Line totals are price x qty: 2 x 8.50 + 1 x 10.00.
    let data = body["data"].as_object().unwrap();
    assert_eq!(data["amount"], "27.00");
    assert!(!data.contains_key("owner"));
    let order_id = data["id"].as_str().unwrap();

    // The record landed in pending and the cart is empty again.
    let pending: Value = api
        .state
        .store()
        .read("orders/pending", order_id)
        .await
        .unwrap();
    assert_eq!(pending["owner"], "frank@example.com");

    let (_, body) = api.send("GET", "/api/carts", Some(&token), None).await;
    assert_eq!(body["data"], json!([]));

    // And the user carries the reference.
    let user: Value = api
        .state
        .store()
        .read("users", "frank@example.com")
        .await
        .unwrap();
    assert_eq!(user["orders"][0]["order"], order_id);
    assert_eq!(user["orders"][0]["state"], "pending");
}

#[tokio::test]
async fn ordering_an_empty_cart_fails() {
    let api = TestApi::new().await;
    api.signup("frank@example.com").await;
    let token = api.login("frank@example.com").await;

    let (status, body) = api.send("GET", "/api/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cart is empty.");
}

#[tokio::test]
async fn checkout_moves_the_order_to_processing() {
    let gateway = spawn_gateway(false).await;
    let api = TestApi::with_gateway(gateway).await;
    api.seed_menu().await;
    api.signup("frank@example.com").await;
    let token = api.login("frank@example.com").await;

    api.send(
        "POST",
        "/api/carts",
        Some(&token),
        Some(json!({ "menu_id": "m1", "qty": 2 })),
    )
    .await;
    let (_, body) = api.send("GET", "/api/orders", Some(&token), None).await;
    let order_id = body["data"]["id"].as_str().unwrap().to_owned();

    let pending: Value = api
        .state
        .store()
        .read("orders/pending", &order_id)
        .await
        .unwrap();

    let (status, body) = api
        .send(
            "POST",
            "/api/orders",
            Some(&token),
            Some(card_payload(&order_id)),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "checkout failed: {body}");

    // Absent from pending, present in processing, content unchanged.
    assert!(
        api.state
            .store()
            .silent()
            .read::<Value>("orders/pending", &order_id)
            .await
            .is_err()
    );
    let processing: Value = api
        .state
        .store()
        .read("orders/processing", &order_id)
        .await
        .unwrap();
    assert_eq!(processing, pending);

    let user: Value = api
        .state
        .store()
        .read("users", "frank@example.com")
        .await
        .unwrap();
    assert_eq!(user["orders"][0]["state"], "processing");

    // Paying again finds nothing in pending.
    let (status, body) = api
        .send(
            "POST",
            "/api/orders",
            Some(&token),
            Some(card_payload(&order_id)),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order does not exist.");

    // A record left behind in pending (the duplication window of a
    // non-atomic move) still cannot be charged twice: the user's order
    // state wins.
    api.state
        .store()
        .move_or_copy("orders/processing", "orders/pending", &order_id, false)
        .await
        .unwrap();
    let (status, body) = api
        .send(
            "POST",
            "/api/orders",
            Some(&token),
            Some(card_payload(&order_id)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Order already being processed.");
}

#[tokio::test]
async fn declined_charge_leaves_the_order_pending() {
    let gateway = spawn_gateway(true).await;
    let api = TestApi::with_gateway(gateway).await;
    api.seed_menu().await;
    api.signup("frank@example.com").await;
    let token = api.login("frank@example.com").await;

    api.send(
        "POST",
        "/api/carts",
        Some(&token),
        Some(json!({ "menu_id": "m2", "qty": 1 })),
    )
    .await;
    let (_, body) = api.send("GET", "/api/orders", Some(&token), None).await;
    let order_id = body["data"]["id"].as_str().unwrap().to_owned();

    let (status, body) = api
        .send(
            "POST",
            "/api/orders",
            Some(&token),
            Some(card_payload(&order_id)),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Could not charge card.");

    // Nothing moved.
    assert!(
        api.state
            .store()
            .read::<Value>("orders/pending", &order_id)
            .await
            .is_ok()
    );
    let user: Value = api
        .state
        .store()
        .read("users", "frank@example.com")
        .await
        .unwrap();
    assert_eq!(user["orders"][0]["state"], "pending");
}

#[tokio::test]
async fn checkout_of_a_foreign_order_is_forbidden() {
    let gateway = spawn_gateway(false).await;
    let api = TestApi::with_gateway(gateway).await;
    api.seed_menu().await;
    api.signup("frank@example.com").await;
    api.signup("mallory@example.com").await;
    let frank = api.login("frank@example.com").await;
    let mallory = api.login("mallory@example.com").await;

    api.send(
        "POST",
        "/api/carts",
        Some(&frank),
        Some(json!({ "menu_id": "m1", "qty": 1 })),
    )
    .await;
    let (_, body) = api.send("GET", "/api/orders", Some(&frank), None).await;
    let order_id = body["data"]["id"].as_str().unwrap().to_owned();

    let (status, body) = api
        .send(
            "POST",
            "/api/orders",
            Some(&mallory),
            Some(card_payload(&order_id)),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Order does not belong to user.");
}

#[tokio::test]
async fn checkout_of_an_unknown_order_is_not_found() {
    let api = TestApi::new().await;
    api.signup("frank@example.com").await;
    let token = api.login("frank@example.com").await;

    let (status, body) = api
        .send(
            "POST",
            "/api/orders",
            Some(&token),
            Some(card_payload("1700000000000abcDEF1234")),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order does not exist.");
}

// Email is pulled in for the store's key validation; keep the type exercised
// end to end.
#[tokio::test]
async fn emails_with_path_separators_never_reach_the_store() {
    let api = TestApi::new().await;

    let (status, _) = api
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({
                "firstName": "Franco",
                "lastName": "Pivotti",
                "email": "../../etc/passwd@example.com",
                "address": "1 Oven Lane",
                "password": "margherita1",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(Email::parse("../../etc/passwd@example.com").is_err());
}
