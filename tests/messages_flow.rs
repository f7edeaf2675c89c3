use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool, Row};
use std::net::TcpListener;
use whisperbox::configuration::{get_configuration, DatabaseSettings};
use whisperbox::startup::run;

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    let server =
        run(listener, connection_pool.clone(), configuration).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

fn session_cookie_from(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("session="))
        .and_then(|value| value.split(';').next())
        .map(|pair| pair.to_string())
}

/// Register and verify an account, returning its session cookie pair.
async fn verified_session(app: &TestApp, email: &str, username: &str) -> String {
    let client = reqwest::Client::new();

    client
        .post(&format!("{}/api/register", &app.address))
        .json(&json!({"email": email, "username": username, "password": "secretpw"}))
        .send()
        .await
        .expect("Failed to execute request.");

    let code: String = sqlx::query("SELECT verification_code FROM accounts WHERE email = $1")
        .bind(email)
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to fetch verification code")
        .get("verification_code");

    let response = client
        .post(&format!("{}/api/verify", &app.address))
        .json(&json!({"email": email, "code": code}))
        .send()
        .await
        .expect("Failed to execute request.");

    session_cookie_from(&response).expect("No session cookie set")
}

async fn send_message(app: &TestApp, username: &str, content: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(&format!("{}/api/send-message", &app.address))
        .json(&json!({"username": username, "content": content}))
        .send()
        .await
        .expect("Failed to execute request.")
}

#[tokio::test]
async fn anonymous_message_reaches_a_verified_recipient() {
    let app = spawn_app().await;
    let cookie = verified_session(&app, "a@x.com", "alice").await;

    let response = send_message(&app, "alice", "Your talk today was great!").await;
    assert_eq!(201, response.status().as_u16());

    let client = reqwest::Client::new();
    let response = client
        .get(&format!("{}/api/messages", &app.address))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    let messages = body["messages"].as_array().expect("messages should be an array");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], json!("Your talk today was great!"));
}

#[tokio::test]
async fn sending_to_unknown_user_returns_404() {
    let app = spawn_app().await;

    let response = send_message(&app, "nobody", "Hello out there").await;
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn sending_to_unverified_user_returns_400() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    client
        .post(&format!("{}/api/register", &app.address))
        .json(&json!({"email": "a@x.com", "username": "alice", "password": "secretpw"}))
        .send()
        .await
        .expect("Failed to execute request.");

    let response = send_message(&app, "alice", "Too early for feedback").await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn sending_when_not_accepting_returns_403() {
    let app = spawn_app().await;
    let cookie = verified_session(&app, "a@x.com", "alice").await;

    let client = reqwest::Client::new();
    let toggle = client
        .post(&format!("{}/api/toggle-acceptance", &app.address))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({"isAccepting": false}))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, toggle.status().as_u16());

    let response = send_message(&app, "alice", "You won't receive this").await;
    assert_eq!(403, response.status().as_u16());

    // Toggling back on reopens the inbox.
    client
        .post(&format!("{}/api/toggle-acceptance", &app.address))
        .header(reqwest::header::COOKIE, &cookie)
        .json(&json!({"isAccepting": true}))
        .send()
        .await
        .expect("Failed to execute request.");

    let response = send_message(&app, "alice", "But this one arrives").await;
    assert_eq!(201, response.status().as_u16());
}

#[tokio::test]
async fn messages_are_listed_newest_first() {
    let app = spawn_app().await;
    let cookie = verified_session(&app, "a@x.com", "alice").await;

    send_message(&app, "alice", "first message").await;
    send_message(&app, "alice", "second message").await;

    let response = reqwest::Client::new()
        .get(&format!("{}/api/messages", &app.address))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .expect("Failed to execute request.");

    let body: Value = response.json().await.expect("Failed to parse response");
    let messages = body["messages"].as_array().expect("messages should be an array");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], json!("second message"));
    assert_eq!(messages[1]["content"], json!("first message"));
}

#[tokio::test]
async fn reading_messages_requires_a_session() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .get(&format!("{}/api/messages", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn owner_can_delete_a_message_exactly_once() {
    let app = spawn_app().await;
    let cookie = verified_session(&app, "a@x.com", "alice").await;

    send_message(&app, "alice", "to be deleted").await;

    let client = reqwest::Client::new();
    let body: Value = client
        .get(&format!("{}/api/messages", &app.address))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .expect("Failed to parse response");
    let message_id = body["messages"][0]["id"].as_str().expect("message id").to_string();

    let deleted = client
        .delete(&format!("{}/api/messages/{}", &app.address, message_id))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, deleted.status().as_u16());

    let repeat = client
        .delete(&format!("{}/api/messages/{}", &app.address, message_id))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, repeat.status().as_u16());
}

#[tokio::test]
async fn deleting_another_accounts_message_returns_404() {
    let app = spawn_app().await;
    let alice_cookie = verified_session(&app, "a@x.com", "alice").await;
    let bob_cookie = verified_session(&app, "b@x.com", "bob").await;

    send_message(&app, "alice", "alice's message").await;

    let client = reqwest::Client::new();
    let body: Value = client
        .get(&format!("{}/api/messages", &app.address))
        .header(reqwest::header::COOKIE, &alice_cookie)
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .expect("Failed to parse response");
    let message_id = body["messages"][0]["id"].as_str().expect("message id").to_string();

    let response = client
        .delete(&format!("{}/api/messages/{}", &app.address, message_id))
        .header(reqwest::header::COOKIE, &bob_cookie)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, response.status().as_u16());

    // Alice still has her message.
    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM messages")
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to count messages")
        .get("n");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn profile_reports_message_count() {
    let app = spawn_app().await;
    let cookie = verified_session(&app, "a@x.com", "alice").await;

    send_message(&app, "alice", "one").await;
    send_message(&app, "alice", "two").await;

    let body: Value = reqwest::Client::new()
        .get(&format!("{}/api/user", &app.address))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .expect("Failed to execute request.")
        .json()
        .await
        .expect("Failed to parse response");

    assert_eq!(body["user"]["username"], json!("alice"));
    assert_eq!(body["user"]["messageCount"], json!(2));
}
