use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use jsonwebtoken::{EncodingKey, Header, encode};
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tungstenite::protocol::Message as WsMessage;
use tungstenite::protocol::frame::coding::CloseCode;

use super::message::Claims;
use super::websocket::{CLOSE_AUTH_REJECTED, CLOSE_CITY_NOT_FOUND, serve};
use crate::broker::{AlertDispatcher, Broker, Severity};
use crate::cities::{City, CityDirectory};
use crate::config::Settings;

fn city(uuid: &str, name: &str) -> City {
    City {
        uuid: uuid.to_string(),
        name: name.to_string(),
        country: "Testland".to_string(),
        latitude: 0.0,
        longitude: 0.0,
    }
}

fn valid_token() -> String {
    let claims = Claims {
        sub: "subscriber".to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(Settings::default().server.jwt_secret.as_ref()),
    )
    .unwrap()
}

/// Bind an ephemeral port, run the accept loop in the background and return
/// the address plus the shared broker for registry assertions.
async fn start_server(directory: Arc<CityDirectory>) -> (String, Arc<Mutex<Broker>>) {
    let broker = Arc::new(Mutex::new(Broker::new()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(
        listener,
        broker.clone(),
        directory,
        Settings::default(),
    ));
    (addr.to_string(), broker)
}

async fn next_json(
    ws: &mut (impl Stream<Item = tungstenite::Result<WsMessage>> + Unpin),
) -> serde_json::Value {
    match tokio::time::timeout(Duration::from_secs(2), ws.next()).await {
        Ok(Some(Ok(WsMessage::Text(text)))) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

async fn expect_close_code(
    ws: &mut (impl Stream<Item = tungstenite::Result<WsMessage>> + Unpin),
    code: u16,
) {
    match tokio::time::timeout(Duration::from_secs(2), ws.next()).await {
        Ok(Some(Ok(WsMessage::Close(Some(frame))))) => {
            assert_eq!(frame.code, CloseCode::Library(code));
        }
        other => panic!("expected a close frame with code {code}, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_city_is_rejected_with_not_found_code() {
    let directory = Arc::new(CityDirectory::new());
    let (addr, broker) = start_server(directory).await;

    let url = format!("ws://{addr}/ws/alerts/no-such-city?token={}", valid_token());
    let (mut ws, _) = connect_async(url).await.expect("connect");

    expect_close_code(&mut ws, CLOSE_CITY_NOT_FOUND).await;

    let broker = broker.lock().unwrap();
    assert!(broker.topics.is_empty());
    assert!(broker.clients.is_empty());
}

#[tokio::test]
async fn missing_token_is_rejected_with_auth_code() {
    let directory = Arc::new(CityDirectory::new());
    directory.insert(city("cph", "Copenhagen"));
    let (addr, broker) = start_server(directory).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws/alerts/cph"))
        .await
        .expect("connect");

    expect_close_code(&mut ws, CLOSE_AUTH_REJECTED).await;
    assert!(broker.lock().unwrap().topics.is_empty());
}

#[tokio::test]
async fn auth_is_checked_before_city_resolution() {
    let directory = Arc::new(CityDirectory::new());
    let (addr, _broker) = start_server(directory).await;

    // Unknown city AND no token: the capability gate answers first.
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws/alerts/no-such-city"))
        .await
        .expect("connect");

    expect_close_code(&mut ws, CLOSE_AUTH_REJECTED).await;
}

#[tokio::test]
async fn invalid_token_is_rejected_with_auth_code() {
    let directory = Arc::new(CityDirectory::new());
    directory.insert(city("cph", "Copenhagen"));
    let (addr, _broker) = start_server(directory).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws/alerts/cph?token=not-a-jwt"))
        .await
        .expect("connect");

    expect_close_code(&mut ws, CLOSE_AUTH_REJECTED).await;
}

#[tokio::test]
async fn connect_confirms_then_answers_pings_and_reports_garbage() {
    let directory = Arc::new(CityDirectory::new());
    directory.insert(city("cph", "Copenhagen"));
    let (addr, _broker) = start_server(directory).await;

    let url = format!("ws://{addr}/ws/alerts/cph?token={}", valid_token());
    let (mut ws, _) = connect_async(url).await.expect("connect");

    let established = next_json(&mut ws).await;
    assert_eq!(established["type"], "connection_established");
    assert_eq!(established["city_uuid"], "cph");
    assert_eq!(established["city_name"], "Copenhagen");

    ws.send(WsMessage::text(r#"{"type": "ping"}"#)).await.unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "pong");

    // Malformed frames are reported, not fatal.
    ws.send(WsMessage::text("definitely not json")).await.unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "error");

    ws.send(WsMessage::text(r#"{"type": "ping"}"#)).await.unwrap();
    assert_eq!(next_json(&mut ws).await["type"], "pong");
}

#[tokio::test]
async fn alerts_fan_out_to_city_subscribers_only() {
    let directory = Arc::new(CityDirectory::new());
    directory.insert(city("cph", "Copenhagen"));
    directory.insert(city("tokyo", "Tokyo"));
    let (addr, broker) = start_server(directory).await;
    let token = valid_token();

    let (mut cph_a, _) = connect_async(format!("ws://{addr}/ws/alerts/cph?token={token}"))
        .await
        .expect("connect a");
    let (mut cph_b, _) = connect_async(format!("ws://{addr}/ws/alerts/cph?token={token}"))
        .await
        .expect("connect b");
    let (mut tokyo, _) = connect_async(format!("ws://{addr}/ws/alerts/tokyo?token={token}"))
        .await
        .expect("connect tokyo");

    // Confirmations prove each connection is registered and subscribed.
    assert_eq!(next_json(&mut cph_a).await["type"], "connection_established");
    assert_eq!(next_json(&mut cph_b).await["type"], "connection_established");
    assert_eq!(next_json(&mut tokyo).await["type"], "connection_established");

    let dispatcher = AlertDispatcher::new(broker);
    let delivered = dispatcher.dispatch(
        &city("cph", "Copenhagen"),
        Severity::Severe,
        "Violent storm approaching",
    );
    assert_eq!(delivered, 2);

    for ws in [&mut cph_a, &mut cph_b] {
        let frame = next_json(ws).await;
        assert_eq!(frame["type"], "weather_alert");
        assert_eq!(frame["alert"]["city_uuid"], "cph");
        assert_eq!(frame["alert"]["severity"], "severe");
        assert_eq!(frame["alert"]["description"], "Violent storm approaching");
    }

    // The Tokyo subscriber sees nothing.
    let quiet = tokio::time::timeout(Duration::from_millis(300), tokyo.next()).await;
    assert!(quiet.is_err(), "Tokyo connection received a foreign alert");
}

#[tokio::test]
async fn disconnect_is_cleaned_up_before_the_next_publish() {
    let directory = Arc::new(CityDirectory::new());
    directory.insert(city("cph", "Copenhagen"));
    let (addr, broker) = start_server(directory).await;

    let url = format!("ws://{addr}/ws/alerts/cph?token={}", valid_token());
    let (mut ws, _) = connect_async(url).await.expect("connect");
    assert_eq!(next_json(&mut ws).await["type"], "connection_established");

    ws.close(None).await.unwrap();

    // Give the server a moment to run its cleanup path.
    let mut emptied = false;
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if broker.lock().unwrap().topics.is_empty() {
            emptied = true;
            break;
        }
    }
    assert!(emptied, "subscription survived the disconnect");

    let dispatcher = AlertDispatcher::new(broker.clone());
    let delivered = dispatcher.dispatch(&city("cph", "Copenhagen"), Severity::High, "Gale");
    assert_eq!(delivered, 0);
    assert!(broker.lock().unwrap().clients.is_empty());
}
