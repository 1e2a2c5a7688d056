mod common;

use axum::http::{Method, StatusCode};
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;

use common::TestApp;
use property_admin_api::middleware::PAGE_PATH_HEADER;

async fn decision(app: &TestApp, path: &str, token: Option<&str>) -> serde_json::Value {
    let uri = format!("/api/v1/navigation?path={}", path);
    let res = app.call(Method::GET, &uri, token, None).await;
    assert_eq!(res.status, StatusCode::OK);
    res.body["decision"].clone()
}

#[tokio::test]
async fn test_protected_paths_redirect_anonymous_users_to_login() {
    let app = TestApp::new();

    for path in ["/", "/dashboard", "/tenants", "/backoffice/users", "/no-such-page"] {
        let d = decision(&app, path, None).await;
        assert_eq!(d, json!({ "decision": "redirect_to_login", "from": path }), "{}", path);
    }

    assert_eq!(decision(&app, "/login", None).await, json!({ "decision": "render" }));
}

#[tokio::test]
async fn test_guarded_api_reports_requested_page() {
    let app = TestApp::new();

    let mut request = TestApp::request(Method::GET, "/api/v1/tenants", None, None);
    request
        .headers_mut()
        .insert(PAGE_PATH_HEADER, "/tenants".parse().unwrap());
    let res = app.send(request).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, json!({ "redirect": "/login", "from": "/tenants" }));
}

#[tokio::test]
async fn test_property_pages_require_a_selected_property() {
    let app = TestApp::new();
    let owner = app.add_user("owner@kostra.id");
    let property = app.add_property("Kost Melati", owner);
    let token = app.login("owner@kostra.id").await;

    assert_eq!(
        decision(&app, "/payments", Some(&token)).await,
        json!({ "decision": "redirect_to_property_selection" })
    );
    assert_eq!(decision(&app, "/properties", Some(&token)).await, json!({ "decision": "render" }));
    assert_eq!(decision(&app, "/backoffice", Some(&token)).await, json!({ "decision": "render" }));

    let res = app.get("/api/v1/payments", &token).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body, json!({ "redirect": "/properties" }));

    app.select_property(&token, property).await;
    assert_eq!(decision(&app, "/payments", Some(&token)).await, json!({ "decision": "render" }));
    assert_eq!(app.get("/api/v1/payments", &token).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_route_metadata() {
    let app = TestApp::new();
    let res = app.call(Method::GET, "/api/v1/navigation?path=/rooms", None, None).await;

    assert_eq!(res.body["route"]["title"], "Manajemen Kamar");
    assert_eq!(res.body["route"]["layout"], "tenant");
    assert!(res.body["route"]["nav_items"].as_array().unwrap().len() > 5);

    let res = app.call(Method::GET, "/api/v1/navigation?path=/nowhere", None, None).await;
    assert!(res.body["route"].is_null());
}

#[tokio::test]
async fn test_login_echoes_origin_page() {
    let app = TestApp::new();
    app.add_user("owner@kostra.id");

    let body = json!({ "email": "owner@kostra.id", "password": common::PASSWORD, "from": "/reports" });
    let res = app.call(Method::POST, "/api/v1/auth/login", None, Some(body)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["redirect_to"], "/reports");

    let body = json!({ "email": "owner@kostra.id", "password": common::PASSWORD });
    let res = app.call(Method::POST, "/api/v1/auth/login", None, Some(body)).await;
    assert_eq!(res.body["redirect_to"], "/dashboard");

    let body = json!({ "email": "owner@kostra.id", "password": "wrong" });
    let res = app.call(Method::POST, "/api/v1/auth/login", None, Some(body)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"]["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_stream_flips_to_login_on_sign_out() {
    let app = TestApp::new();
    app.add_user("owner@kostra.id");
    let token = app.login("owner@kostra.id").await;

    let request = TestApp::request(
        Method::GET,
        "/api/v1/navigation/stream?path=/properties",
        Some(&token),
        None,
    );
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut body = response.into_body().into_data_stream();

    let mut seen = String::new();
    let mut logged_out = false;
    let finished = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(chunk) = body.next().await {
            seen.push_str(&String::from_utf8_lossy(&chunk.unwrap()));

            if !logged_out && seen.contains(r#""decision":"render""#) {
                let res = app.call(Method::POST, "/api/v1/auth/logout", Some(&token), None).await;
                assert_eq!(res.status, StatusCode::OK);
                logged_out = true;
            }
            if seen.contains("redirect_to_login") {
                break;
            }
        }
    })
    .await;

    assert!(finished.is_ok(), "stream never redirected: {}", seen);
    let loading = seen.find(r#""decision":"loading""#).unwrap();
    let render = seen.find(r#""decision":"render""#).unwrap();
    let redirect = seen.find("redirect_to_login").unwrap();
    assert!(loading < render && render < redirect);
    assert!(seen.contains("event: guard"));
}
