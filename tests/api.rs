//! End-to-end router tests over the in-memory store.

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use docrest::{
    api::router,
    cli::globals::GlobalArgs,
    store::{DocumentStore, MemoryStore},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn globals() -> GlobalArgs {
    GlobalArgs::new("memory://".to_string()).with_bcrypt_cost(4)
}

fn app_with(globals: GlobalArgs) -> Result<Router> {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    router(store, globals)
}

fn app() -> Result<Router> {
    app_with(globals())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, body))
}

fn message(text: &str) -> Value {
    json!({ "message": text })
}

fn id_of(body: &Value) -> String {
    body.get("_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn signup_then_login() -> Result<()> {
    let app = app()?;
    let alice = json!({ "username": "alice", "password": "hunter2" });

    let (status, body) = send(&app, Method::POST, "/api/signup", Some(alice.clone())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("username"), Some(&json!("alice")));
    assert_eq!(body.get("emailAddresses"), Some(&json!([])));
    assert!(!id_of(&body).is_empty());
    assert!(body.get("password").is_none());

    let (status, body) = send(&app, Method::POST, "/api/login", Some(alice.clone())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, message("User logged in"));

    let (status, body) = send(&app, Method::POST, "/api/signup", Some(alice)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, message("Username is already in use"));

    Ok(())
}

#[tokio::test]
async fn login_failures_are_indistinguishable() -> Result<()> {
    let app = app()?;
    send(
        &app,
        Method::POST,
        "/api/signup",
        Some(json!({ "username": "alice", "password": "hunter2" })),
    )
    .await?;

    let wrong_password = send(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({ "username": "alice", "password": "nope" })),
    )
    .await?;
    let unknown_user = send(
        &app,
        Method::POST,
        "/api/login",
        Some(json!({ "username": "bob", "password": "hunter2" })),
    )
    .await?;

    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password.1, message("Invalid username and/or password"));
    Ok(())
}

#[tokio::test]
async fn signup_can_expose_password_hash() -> Result<()> {
    let app = app_with(globals().with_expose_password_hash(true))?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/signup",
        Some(json!({
            "username": "alice",
            "password": "hunter2",
            "emailAddresses": [{ "email": "alice@example.com" }]
        })),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    let hash = body.get("password").and_then(Value::as_str).unwrap_or("");
    assert!(hash.starts_with("$2"));
    assert_ne!(hash, "hunter2");
    assert_eq!(
        body.get("emailAddresses"),
        Some(&json!([{ "email": "alice@example.com" }]))
    );
    Ok(())
}

#[tokio::test]
async fn missing_payloads_are_rejected() -> Result<()> {
    let app = app()?;

    for uri in ["/api/signup", "/api/login", "/api/composers", "/api/teams"] {
        let (status, body) = send(&app, Method::POST, uri, None).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body, message("Missing payload"));
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/signup",
        Some(json!({ "username": "alice", "password": "" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Missing username or password"));

    Ok(())
}

#[tokio::test]
async fn composer_lifecycle() -> Result<()> {
    let app = app()?;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/composers",
        Some(json!({ "firstName": "Johann", "lastName": "Bach" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let id = id_of(&created);
    assert_eq!(created.get("lastName"), Some(&json!("Bach")));

    let (status, all) = send(&app, Method::GET, "/api/composers", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all, json!([created.clone()]));

    let uri = format!("/api/composers/{id}");
    let (status, found) = send(&app, Method::GET, &uri, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found, created);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "firstName": "Johann Sebastian", "lastName": "Bach" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(id_of(&updated), id);
    assert_eq!(updated.get("firstName"), Some(&json!("Johann Sebastian")));

    let (status, deleted) = send(&app, Method::DELETE, &uri, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, updated);

    let (status, body) = send(&app, Method::GET, &uri, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, message("Invalid composerId"));

    Ok(())
}

#[tokio::test]
async fn unknown_composer_id_on_update_and_delete() -> Result<()> {
    let app = app()?;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/composers/missing",
        Some(json!({ "firstName": "Nobody" })),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, message("Invalid composerId"));

    let (status, body) = send(&app, Method::DELETE, "/api/composers/missing", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, message("Invalid composerId"));
    Ok(())
}

#[tokio::test]
async fn persons_are_listed() -> Result<()> {
    let app = app()?;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/persons",
        Some(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "roles": [{ "text": "analyst" }],
            "dependents": [{ "firstName": "Byron" }],
            "birthDate": "1815-12-10"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created.get("roles"), Some(&json!([{ "text": "analyst" }])));

    let (status, all) = send(&app, Method::GET, "/api/persons", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all, json!([created]));
    Ok(())
}

#[tokio::test]
async fn team_players() -> Result<()> {
    let app = app()?;

    let (status, team) = send(
        &app,
        Method::POST,
        "/api/teams",
        Some(json!({ "name": "Cubs", "mascot": "Clark" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(team.get("players"), Some(&json!([])));
    let id = id_of(&team);

    let player = json!({ "firstName": "Ernie", "lastName": "Banks", "salary": 1000.5 });
    let players_uri = format!("/api/teams/{id}/players");
    let (status, body) = send(&app, Method::POST, &players_uri, Some(player.clone())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, player);

    let (status, body) = send(&app, Method::GET, &players_uri, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([player]));

    let (status, teams) = send(&app, Method::GET, "/api/teams", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(teams.as_array().map(Vec::len), Some(1));

    let (status, deleted) = send(&app, Method::DELETE, &format!("/api/teams/{id}"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted.get("name"), Some(&json!("Cubs")));

    let (status, body) = send(&app, Method::GET, &players_uri, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, message("Invalid teamId"));
    Ok(())
}

#[tokio::test]
async fn customer_invoices() -> Result<()> {
    let app = app()?;

    let (status, customer) = send(
        &app,
        Method::POST,
        "/api/customers",
        Some(json!({ "firstName": "Jane", "lastName": "Doe", "username": "jdoe" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customer.get("invoices"), Some(&json!([])));

    let invoice = json!({
        "subtotal": 10.0,
        "tax": 0.8,
        "dateCreated": "2024-01-01",
        "lineItems": [{ "name": "pen", "price": 2.0, "quantity": 5.0 }]
    });
    let (status, updated) = send(
        &app,
        Method::POST,
        "/api/customers/jdoe/invoices",
        Some(invoice.clone()),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(id_of(&updated), id_of(&customer));
    assert_eq!(updated.get("invoices"), Some(&json!([invoice.clone()])));

    let (status, invoices) = send(&app, Method::GET, "/api/customers/jdoe/invoices", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(invoices, json!([invoice]));

    let (status, body) = send(&app, Method::GET, "/api/customers/nobody/invoices", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, message("Invalid username"));
    Ok(())
}

#[tokio::test]
async fn health_and_request_id() -> Result<()> {
    let app = app()?;

    let (status, body) = send(&app, Method::GET, "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.get("database"), Some(&json!("ok")));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let app = app()?;

    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.pointer("/paths/~1api~1signup").is_some());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_player_and_invoice_appends_are_kept() -> Result<()> {
    let app = app()?;

    let (_, team) = send(
        &app,
        Method::POST,
        "/api/teams",
        Some(json!({ "name": "Cubs" })),
    )
    .await?;
    let players_uri = format!("/api/teams/{}/players", id_of(&team));
    send(
        &app,
        Method::POST,
        "/api/customers",
        Some(json!({ "username": "jdoe" })),
    )
    .await?;

    let mut tasks = tokio::task::JoinSet::new();
    for n in 0..50 {
        let app = app.clone();
        let players_uri = players_uri.clone();
        tasks.spawn(async move {
            let player = send(
                &app,
                Method::POST,
                &players_uri,
                Some(json!({ "firstName": format!("player-{n}") })),
            )
            .await?;
            let invoice = send(
                &app,
                Method::POST,
                "/api/customers/jdoe/invoices",
                Some(json!({ "subtotal": n })),
            )
            .await?;
            Ok::<_, anyhow::Error>((player.0, invoice.0))
        });
    }
    while let Some(result) = tasks.join_next().await {
        assert_eq!(result??, (StatusCode::OK, StatusCode::OK));
    }

    let (_, players) = send(&app, Method::GET, &players_uri, None).await?;
    assert_eq!(players.as_array().map(Vec::len), Some(50));

    let (_, invoices) = send(&app, Method::GET, "/api/customers/jdoe/invoices", None).await?;
    assert_eq!(invoices.as_array().map(Vec::len), Some(50));
    Ok(())
}
