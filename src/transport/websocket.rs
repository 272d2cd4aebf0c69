//! WebSocket transport
//!
//! Implements the alert channel server. Responsibilities:
//! - Accept TCP/WebSocket connections on `ws/alerts/{city_uuid}?token=...`
//! - Validate the capability token and resolve the requested city before
//!   the connection ever reaches the broker; rejections close with a
//!   distinguishing code (4401 auth, 4004 unknown city)
//! - Register a `Client` with the broker, subscribe it to its city topic
//!   and confirm the connection
//! - Run the receive loop (ping/pong, malformed-frame reports) and a send
//!   loop that drains the connection's outbound channel onto the socket
//! - Guarantee broker cleanup exactly once on every exit path
//!
//! Token issuance happens elsewhere; this layer only checks the HS256
//! signature and expiry against the configured secret.

use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};
use tungstenite::handshake::server::{Request, Response};
use tungstenite::protocol::CloseFrame;
use tungstenite::protocol::Message as WsMessage;
use tungstenite::protocol::frame::coding::CloseCode;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::broker::Broker;
use crate::cities::CityDirectory;
use crate::client::Client;
use crate::config::Settings;
use crate::transport::message::{Claims, ClientMessage, ServerMessage};
use crate::utils::{Error, Result};
use tracing::{debug, info, warn};

/// Close code for a connect attempt without a valid capability token.
pub const CLOSE_AUTH_REJECTED: u16 = 4401;
/// Close code for a city UUID that resolves to nothing.
pub const CLOSE_CITY_NOT_FOUND: u16 = 4004;

pub async fn start_websocket_server(
    addr: String,
    broker: Arc<Mutex<Broker>>,
    directory: Arc<CityDirectory>,
    settings: Settings,
) -> Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket server listening on ws://{addr}");
    serve(listener, broker, directory, settings).await
}

/// Accept loop over an already-bound listener. Split out so tests can bind
/// an ephemeral port first.
pub async fn serve(
    listener: TcpListener,
    broker: Arc<Mutex<Broker>>,
    directory: Arc<CityDirectory>,
    settings: Settings,
) -> Result<()> {
    while let Ok((stream, _)) = listener.accept().await {
        let broker = broker.clone();
        let directory = directory.clone();
        let settings = settings.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, broker, directory, settings).await {
                debug!("connection ended: {e}");
            }
        });
    }
    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    broker: Arc<Mutex<Broker>>,
    directory: Arc<CityDirectory>,
    settings: Settings,
) -> Result<()> {
    let mut request_uri = String::new();
    let mut ws_stream = accept_hdr_async(stream, |req: &Request, resp: Response| {
        request_uri = req.uri().to_string();
        Ok(resp)
    })
    .await?;

    let Some((city_uuid, token)) = parse_connect_request(&request_uri) else {
        reject(&mut ws_stream, CLOSE_CITY_NOT_FOUND, "city not found").await;
        return Err(Error::CityNotFound(request_uri));
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let mut client = Client::new(&city_uuid, tx.clone());

    if !token_is_valid(token.as_deref(), &settings.server.jwt_secret) {
        client.reject();
        warn!("rejecting {}: missing or invalid token", client.id);
        reject(
            &mut ws_stream,
            CLOSE_AUTH_REJECTED,
            "authentication missing or invalid",
        )
        .await;
        return Err(Error::AuthRejected);
    }

    let Some(city) = directory.resolve(&city_uuid) else {
        client.reject();
        warn!("rejecting {}: unknown city {city_uuid}", client.id);
        reject(&mut ws_stream, CLOSE_CITY_NOT_FOUND, "city not found").await;
        return Err(Error::CityNotFound(city_uuid));
    };

    client.open();
    let client_id = client.id.clone();
    {
        let mut broker = broker.lock().unwrap();
        broker.register_client(client);
        broker.subscribe(&city.uuid, client_id.clone());
    }
    info!("{client_id} subscribed to weather alerts for {}", city.name);

    queue_frame(
        &tx,
        &ServerMessage::ConnectionEstablished {
            message: format!("Connected to weather alerts for {}", city.name),
            city_uuid: city.uuid.clone(),
            city_name: city.name.clone(),
        },
    );

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let cleanup_called = Arc::new(AtomicBool::new(false));

    let do_cleanup = {
        let broker = broker.clone();
        let client_id = client_id.clone();
        let cleanup_called = cleanup_called.clone();

        move || {
            if !cleanup_called.swap(true, Ordering::SeqCst) {
                let mut broker = broker.lock().unwrap();
                broker.cleanup_client(&client_id);
            }
        }
    };

    {
        let client_id = client_id.clone();
        let do_cleanup = do_cleanup.clone();

        spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    debug!("failed to send to {client_id}: {e}");
                    break;
                }
            }

            do_cleanup();
            debug!("send loop closed for {client_id}");
        });
    }

    while let Some(Ok(msg)) = ws_receiver.next().await {
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        let text = msg.to_text().unwrap_or_default();

        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Ping) => {
                queue_frame(&tx, &ServerMessage::Pong);
            }
            Err(err) => {
                // Reported back, never fatal: the connection stays open.
                let reason = Error::MalformedMessage(err.to_string());
                debug!("{client_id} sent malformed frame: {reason}");
                queue_frame(
                    &tx,
                    &ServerMessage::Error {
                        message: reason.to_string(),
                    },
                );
            }
        }
    }

    do_cleanup();
    Ok(())
}

/// Parse `/ws/alerts/{city_uuid}` plus an optional `token` query parameter.
pub(crate) fn parse_connect_request(uri: &str) -> Option<(String, Option<String>)> {
    let (path, query) = match uri.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (uri, None),
    };

    let city_uuid = path.strip_prefix("/ws/alerts/")?.trim_end_matches('/');
    if city_uuid.is_empty() || city_uuid.contains('/') {
        return None;
    }

    let token = query.and_then(|q| {
        q.split('&')
            .find_map(|pair| pair.strip_prefix("token=").map(str::to_string))
    });

    Some((city_uuid.to_string(), token))
}

pub(crate) fn token_is_valid(token: Option<&str>, secret: &str) -> bool {
    let Some(token) = token else {
        return false;
    };
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .is_ok()
}

fn queue_frame(tx: &UnboundedSender<WsMessage>, frame: &ServerMessage) {
    match serde_json::to_string(frame) {
        Ok(text) => {
            let _ = tx.send(WsMessage::text(text));
        }
        Err(e) => warn!("failed to serialize server frame: {e}"),
    }
}

async fn reject(ws: &mut WebSocketStream<TcpStream>, code: u16, reason: &str) {
    let frame = CloseFrame {
        code: CloseCode::Library(code),
        reason: reason.into(),
    };
    if let Err(e) = ws.close(Some(frame)).await {
        debug!("close handshake failed: {e}");
    }
}
