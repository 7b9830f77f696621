//! Integration tests driving the real router against the in-memory store.
//!
//! These cover the full authentication and sharing flow:
//! 1. The auth gate rejects missing, malformed, expired, and orphaned tokens
//! 2. Ownership rules on the route endpoints (view vs mutate, 404 before 403)
//! 3. The share capability path end to end, including anonymous reads

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use waymark::auth::token::TokenSigner;
use waymark::config::Config;
use waymark::share::RandomTokenSource;
use waymark::store::memory::MemStore;
use waymark::{app, AppState};

const TEST_SECRET: &str = "test-secret";

fn test_app() -> Router {
    let store = Arc::new(MemStore::new());
    let config = Config {
        port: 0,
        database_url: String::new(),
        jwt_secret: TEST_SECRET.into(),
        token_ttl_days: 30,
        frontend_url: "http://localhost:8000".into(),
    };
    let state = Arc::new(AppState {
        users: store.clone(),
        routes: store,
        signer: TokenSigner::new(TEST_SECRET, 30),
        share_tokens: Arc::new(RandomTokenSource),
        config,
    });
    app(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Registers an account and returns (token, user id).
async fn register(app: &Router, name: &str, email: &str) -> (String, Uuid) {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let token = body["token"].as_str().unwrap().to_string();
    let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
    (token, id)
}

fn route_payload(name: &str) -> Value {
    json!({
        "name": name,
        "origin": { "address": "1 Main St", "lat": 40.0, "lng": -74.0 },
        "destination": { "address": "2 Oak Ave", "lat": 41.0, "lng": -73.0 },
        "waypoints": [
            { "address": "Midpoint", "lat": 40.5, "lng": -73.5, "order": 0 }
        ],
        "travel_mode": "DRIVING",
        "distance": { "text": "12 km", "value": 12000 },
        "duration": { "text": "18 mins", "value": 1080 },
        "tags": ["commute"],
        "notes": "avoid the bridge at rush hour"
    })
}

async fn create_route(app: &Router, token: &str, name: &str) -> Uuid {
    let (status, body) = send(
        app,
        "POST",
        "/api/routes",
        Some(token),
        Some(route_payload(name)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create route failed: {body}");
    body["route"]["id"].as_str().unwrap().parse().unwrap()
}

mod auth_flow {
    use super::*;

    #[tokio::test]
    async fn register_login_me() {
        let app = test_app();
        let (token, id) = register(&app, "Ada", "ada@example.com").await;

        let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], id.to_string());
        assert_eq!(body["user"]["name"], "Ada");

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().is_some());
    }

    #[tokio::test]
    async fn login_failures_are_uniform_401() {
        let app = test_app();
        register(&app, "Ada", "ada@example.com").await;

        let (wrong_pw, body_pw) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong!" })),
        )
        .await;
        let (no_user, body_user) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "secret123" })),
        )
        .await;

        assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
        assert_eq!(no_user, StatusCode::UNAUTHORIZED);
        // Same envelope whether the email or the password was wrong.
        assert_eq!(body_pw["error"]["message"], body_user["error"]["message"]);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let app = test_app();
        register(&app, "Ada", "ada@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "name": "Imposter", "email": "ada@example.com", "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_failed");
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let app = test_app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "abc" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod auth_gate {
    use super::*;

    #[tokio::test]
    async fn missing_header_is_401() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/api/routes", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["type"], "authentication_error");
    }

    #[tokio::test]
    async fn malformed_token_is_401() {
        let app = test_app();
        let (status, _) = send(&app, "GET", "/api/routes", Some("not.a.token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_401() {
        let app = test_app();
        let (_, id) = register(&app, "Ada", "ada@example.com").await;

        let signer = TokenSigner::new(TEST_SECRET, 30);
        let expired = signer
            .issue_with_ttl(id, chrono::Duration::seconds(-60))
            .unwrap();
        let (status, _) = send(&app, "GET", "/api/routes", Some(&expired), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_with_wrong_secret_is_401() {
        let app = test_app();
        let (_, id) = register(&app, "Ada", "ada@example.com").await;

        let forged = TokenSigner::new("other-secret", 30).issue(id).unwrap();
        let (status, _) = send(&app, "GET", "/api/routes", Some(&forged), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_for_unknown_account_is_401() {
        // Identity deleted (or never existed) after token issuance.
        let app = test_app();
        let ghost = TokenSigner::new(TEST_SECRET, 30)
            .issue(Uuid::new_v4())
            .unwrap();
        let (status, body) = send(&app, "GET", "/api/routes", Some(&ghost), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        // Same message as every other gate failure.
        assert_eq!(
            body["error"]["message"],
            "not authorized to access this route"
        );
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn stranger_gets_403_on_private_route() {
        let app = test_app();
        let (owner, _) = register(&app, "Ada", "ada@example.com").await;
        let (stranger, _) = register(&app, "Bob", "bob@example.com").await;
        let route_id = create_route(&app, &owner, "commute").await;

        let uri = format!("/api/routes/{route_id}");
        let (status, _) = send(&app, "GET", &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            "PUT",
            &uri,
            Some(&stranger),
            Some(json!({ "name": "hijacked" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, "DELETE", &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_route_is_404_for_everyone() {
        // Existence is checked before ownership, so a nonexistent id never
        // reveals whether it would have been forbidden.
        let app = test_app();
        let (owner, _) = register(&app, "Ada", "ada@example.com").await;
        let (stranger, _) = register(&app, "Bob", "bob@example.com").await;

        let uri = format!("/api/routes/{}", Uuid::new_v4());
        for token in [&owner, &stranger] {
            let (status, body) = send(&app, "GET", &uri, Some(token), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["error"]["code"], "not_found");
        }
    }

    #[tokio::test]
    async fn owner_can_update_and_delete() {
        let app = test_app();
        let (owner, _) = register(&app, "Ada", "ada@example.com").await;
        let route_id = create_route(&app, &owner, "commute").await;
        let uri = format!("/api/routes/{route_id}");

        let (status, body) = send(
            &app,
            "PUT",
            &uri,
            Some(&owner),
            Some(json!({ "name": "weekend trip", "tags": ["leisure"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["route"]["name"], "weekend trip");
        assert_eq!(body["route"]["tags"], json!(["leisure"]));
        // Untouched fields survive a partial update.
        assert_eq!(body["route"]["origin"]["address"], "1 Main St");

        let (status, _) = send(&app, "DELETE", &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn viewing_returns_refreshed_last_used() {
        let app = test_app();
        let (owner, _) = register(&app, "Ada", "ada@example.com").await;
        let route_id = create_route(&app, &owner, "commute").await;
        let uri = format!("/api/routes/{route_id}");

        fn last_used(body: &Value) -> chrono::DateTime<chrono::Utc> {
            body["route"]["last_used"]
                .as_str()
                .unwrap()
                .parse()
                .unwrap()
        }

        let (_, created) = send(&app, "GET", &uri, Some(&owner), None).await;
        let first_seen = last_used(&created);

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        // Each view refreshes last_used, and the response must carry the
        // refreshed instant, not the pre-view snapshot.
        let (status, body) = send(&app, "GET", &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(last_used(&body) > first_seen);
    }

    #[tokio::test]
    async fn list_only_returns_own_routes() {
        let app = test_app();
        let (ada, _) = register(&app, "Ada", "ada@example.com").await;
        let (bob, _) = register(&app, "Bob", "bob@example.com").await;
        create_route(&app, &ada, "one").await;
        create_route(&app, &ada, "two").await;
        create_route(&app, &bob, "theirs").await;

        let (status, body) = send(&app, "GET", "/api/routes", Some(&ada), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
    }
}

mod sharing {
    use super::*;

    #[tokio::test]
    async fn share_end_to_end() {
        let app = test_app();
        let (ada, _) = register(&app, "Ada", "ada@example.com").await;
        let (bob, _) = register(&app, "Bob", "bob@example.com").await;

        // Ada saves a private route; Bob cannot see it.
        let route_id = create_route(&app, &ada, "commute").await;
        let route_uri = format!("/api/routes/{route_id}");
        let (status, _) = send(&app, "GET", &route_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Ada shares it and receives a 128-bit hex capability.
        let share_uri = format!("/api/routes/{route_id}/share");
        let (status, body) = send(&app, "POST", &share_uri, Some(&ada), None).await;
        assert_eq!(status, StatusCode::OK);
        let token = body["share_token"].as_str().unwrap().to_string();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            body["share_url"],
            format!("http://localhost:8000/shared/{token}")
        );

        // Sharing again returns the same capability.
        let (_, body) = send(&app, "POST", &share_uri, Some(&ada), None).await;
        assert_eq!(body["share_token"], token);

        // Anyone holding the capability can read the route anonymously.
        let shared_uri = format!("/api/routes/shared/{token}");
        let (status, body) = send(&app, "GET", &shared_uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["route"]["id"], route_id.to_string());
        assert_eq!(body["route"]["is_public"], true);

        // Bob can now view the public route, but still cannot mutate it.
        let (status, _) = send(&app, "GET", &route_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(
            &app,
            "PUT",
            &route_uri,
            Some(&bob),
            Some(json!({ "name": "mine now" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "POST", &share_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_capability_is_404() {
        let app = test_app();
        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/routes/shared/{}", "0".repeat(32)),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn only_owner_may_share() {
        let app = test_app();
        let (ada, _) = register(&app, "Ada", "ada@example.com").await;
        let (bob, _) = register(&app, "Bob", "bob@example.com").await;
        let route_id = create_route(&app, &ada, "commute").await;

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/routes/{route_id}/share"),
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn profile_reports_saved_route_count() {
        let app = test_app();
        let (ada, _) = register(&app, "Ada", "ada@example.com").await;
        create_route(&app, &ada, "one").await;
        create_route(&app, &ada, "two").await;

        let (status, body) = send(&app, "GET", "/api/users/profile", Some(&ada), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saved_routes_count"], 2);
        assert_eq!(body["user"]["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn update_profile_name() {
        let app = test_app();
        let (ada, _) = register(&app, "Ada", "ada@example.com").await;

        let (status, body) = send(
            &app,
            "PUT",
            "/api/users/profile",
            Some(&ada),
            Some(json!({ "name": "Ada L." })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["name"], "Ada L.");
    }

    #[tokio::test]
    async fn preferences_merge_partially() {
        let app = test_app();
        let (ada, _) = register(&app, "Ada", "ada@example.com").await;

        let (status, body) = send(
            &app,
            "PUT",
            "/api/users/preferences",
            Some(&ada),
            Some(json!({ "dark_mode": true, "default_travel_mode": "TRANSIT" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["preferences"]["dark_mode"], true);
        assert_eq!(body["preferences"]["default_travel_mode"], "TRANSIT");
        // Unmentioned fields keep their defaults.
        assert_eq!(body["preferences"]["avoid_tolls"], false);
    }
}
