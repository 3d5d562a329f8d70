use crate::agent::CatAgent;
use crate::cli::Args;
use crate::generation::delay::token_delay;
use crate::models::chat::{ ChatMessage, Role };
use crate::models::websocket::{ ClientEvent, ServerEvent, StreamingMessage };

use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::io::{ AsyncRead, AsyncWrite };

use tokio_tungstenite::{ accept_async, WebSocketStream };
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_rustls::TlsAcceptor;

use rustls::ServerConfig;
use rustls::pki_types::{ CertificateDer, PrivateKeyDer };
use rustls_pemfile::{ certs, pkcs8_private_keys };

use lazy_static::lazy_static;
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };

use chrono::{ Local, Timelike, Utc };
use futures::stream::SplitSink;
use futures::{ SinkExt, StreamExt };
use log::{ info, warn, error };
use rand::SeedableRng;
use rand::rngs::StdRng;

const MAX_MESSAGE_SIZE: usize = 64 * 1024;

lazy_static! {
    static ref CONNECTION_LIMITER: RateLimiter<NotKeyed, InMemoryState, DefaultClock> =
        RateLimiter::direct(Quota::per_second(NonZeroU32::new(10).unwrap()));
}

fn load_tls_config(
    cert_path: &str,
    key_path: &str
) -> Result<Arc<ServerConfig>, Box<dyn Error + Send + Sync>> {
    let cert_file = File::open(cert_path).map_err(|e|
        format!("Failed to open TLS certificate file '{}': {}", cert_path, e)
    )?;
    let key_file = File::open(key_path).map_err(|e|
        format!("Failed to open TLS key file '{}': {}", key_path, e)
    )?;

    let mut cert_reader = BufReader::new(cert_file);
    let mut key_reader = BufReader::new(key_file);
    let cert_chain: Vec<CertificateDer<'static>> = certs(&mut cert_reader)
        .collect::<Result<_, _>>()
        .map_err(|e| format!("Failed to read certificate(s): {}", e))?;

    let mut keys = pkcs8_private_keys(&mut key_reader);
    let key = match keys.next() {
        Some(Ok(k)) => PrivateKeyDer::Pkcs8(k),
        Some(Err(e)) => {
            return Err(format!("Error reading private key: {}", e).into());
        }
        None => {
            return Err("No PKCS8 private key found in key file".into());
        }
    };

    let config = ServerConfig::builder().with_no_client_auth().with_single_cert(cert_chain, key)?;
    Ok(Arc::new(config))
}

pub async fn start_ws_server(
    addr: &str,
    agent: Arc<CatAgent>,
    args: Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    let protocol = if args.enable_tls && args.tls_cert_path.is_some() && args.tls_key_path.is_some() {
        "wss"
    } else {
        "ws"
    };
    info!("{} server listening on: {}", protocol.to_uppercase(), addr);

    let tls_acceptor = if args.enable_tls {
        match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert_path), Some(key_path)) => {
                info!(
                    "TLS enabled. Loading certificate from '{}' and key from '{}'",
                    cert_path,
                    key_path
                );
                let config = load_tls_config(cert_path, key_path)?;
                Some(TlsAcceptor::from(config))
            }
            (Some(_), None) | (None, Some(_)) => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                return Err("Missing TLS certificate or key path".into());
            }
            (None, None) => {
                error!("--enable-tls was set but no certificate/key paths provided.");
                return Err("TLS enabled without cert/key".into());
            }
        }
    } else {
        info!("TLS not enabled. Running plain WebSocket (WS) server.");
        None
    };

    loop {
        let (stream, peer) = listener.accept().await?;

        if CONNECTION_LIMITER.check().is_err() {
            warn!("Global connection rate limit exceeded for {}. Dropping connection.", peer);
            continue;
        }

        info!("Incoming connection from: {}", peer);
        let agent_clone = Arc::clone(&agent);
        let tls_acceptor_clone = tls_acceptor.clone();

        tokio::spawn(async move {
            let process_result = if let Some(acceptor) = tls_acceptor_clone {
                match acceptor.accept(stream).await {
                    Ok(tls_stream) => {
                        info!("TLS handshake successful for {}", peer);
                        process_connection(peer, tls_stream, agent_clone).await
                    }
                    Err(e) => {
                        error!("TLS handshake error for {}: {}", peer, e);
                        Err(Box::new(e) as Box<dyn Error + Send + Sync>)
                    }
                }
            } else {
                process_connection(peer, stream, agent_clone).await
            };

            if let Err(e) = process_result {
                error!("Failed to process connection for {}: {}", peer, e);
            }
        });
    }
}

async fn process_connection<S>(
    peer: SocketAddr,
    stream: S,
    agent: Arc<CatAgent>
) -> Result<(), Box<dyn Error + Send + Sync>>
    where S: AsyncRead + AsyncWrite + Unpin + Send + 'static
{
    match accept_async(stream).await {
        Ok(ws) => {
            handle_connection(peer, ws, agent).await;
            Ok(())
        }
        Err(e) => {
            error!("Handshake failed for {}: {}", peer, e);
            Err(Box::new(e) as _)
        }
    }
}

async fn send_event<S>(
    tx: &mut SplitSink<WebSocketStream<S>, Message>,
    event: &ServerEvent
) -> Result<(), tokio_tungstenite::tungstenite::Error>
    where S: AsyncRead + AsyncWrite + Unpin
{
    let json = serde_json::to_string(event).unwrap();
    tx.send(Message::Text(json)).await
}

pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    agent: Arc<CatAgent>
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    info!("New WebSocket connection: {}", peer);

    let (mut tx, mut rx) = websocket.split();
    let mut rng = StdRng::from_entropy();

    let conversation_id = match agent.open_conversation().await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to open conversation for {}: {}", peer, e);
            return;
        }
    };
    info!("Assigned conversation ID {} to {}", conversation_id, peer);

    if send_event(&mut tx, &ServerEvent::ConversationId(conversation_id.clone())).await.is_err() {
        error!("Failed to send conversation id to {}", peer);
        return;
    }
    let welcome = agent.welcome_line(&mut rng);
    if send_event(&mut tx, &ServerEvent::WelcomeMeows(welcome)).await.is_err() {
        error!("Failed to send welcome line to {}", peer);
        return;
    }

    while let Some(msg) = rx.next().await {
        match msg {
            Ok(message) => {
                if message.len() > MAX_MESSAGE_SIZE {
                    warn!(
                        "Message from {} exceeds size limit ({} > {})",
                        peer,
                        message.len(),
                        MAX_MESSAGE_SIZE
                    );
                    let error_msg = ServerEvent::Error {
                        message: "Message too large".to_string(),
                    };
                    if send_event(&mut tx, &error_msg).await.is_err() {
                        error!("Failed to send size limit error to {}", peer);
                    }
                    break;
                }

                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(ClientEvent::SendMessage { message, conversation_id: target, client_time }) => {
                                let hour = client_time
                                    .map(|time| time.hour.min(23))
                                    .unwrap_or_else(|| Local::now().hour());
                                let aborted = stream_reply(
                                    &mut tx,
                                    &agent,
                                    &target,
                                    &message,
                                    hour,
                                    &mut rng
                                ).await;
                                if aborted {
                                    info!("Client {} went away during reply streaming", peer);
                                    break;
                                }
                            }
                            Ok(ClientEvent::GetConversation(target)) => {
                                let messages = agent.conversation_messages(&target).await;
                                if
                                    send_event(
                                        &mut tx,
                                        &ServerEvent::ConversationHistory(messages)
                                    ).await.is_err()
                                {
                                    error!("Error sending history to {}", peer);
                                    break;
                                }
                            }
                            Ok(ClientEvent::RequestWelcomeMeows) => {
                                let line = agent.welcome_line(&mut rng);
                                if send_event(&mut tx, &ServerEvent::WelcomeMeows(line)).await.is_err() {
                                    error!("Error sending welcome line to {}", peer);
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("Failed to parse message from {}: {}", peer, e);
                                let error_msg = ServerEvent::Error {
                                    message: format!("Failed to parse message: {}", e),
                                };
                                if send_event(&mut tx, &error_msg).await.is_err() {
                                    error!("Error sending parse error to {}", peer);
                                    break;
                                }
                            }
                        }
                    }
                    Message::Close(_) => {
                        info!("Received close frame from {}", peer);
                        break;
                    }
                    Message::Ping(ping_data) => {
                        if tx.send(Message::Pong(ping_data)).await.is_err() {
                            error!("Failed to send pong to {}", peer);
                            break;
                        }
                    }
                    Message::Pong(_) => {/* Usually ignore pongs */}
                    Message::Binary(_) => {
                        warn!("Ignoring binary message from {}", peer);
                    }
                    Message::Frame(_) => {/* Usually ignore raw frames */}
                }
            }
            Err(e) => {
                match e {
                    | tokio_tungstenite::tungstenite::Error::ConnectionClosed
                    | tokio_tungstenite::tungstenite::Error::Protocol(_)
                    | tokio_tungstenite::tungstenite::Error::Utf8 => {
                        info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                    }
                    tokio_tungstenite::tungstenite::Error::Io(ref io_err) if
                        io_err.kind() == std::io::ErrorKind::ConnectionReset
                    => {
                        info!("WebSocket connection reset by peer {}", peer);
                    }
                    tokio_tungstenite::tungstenite::Error::Capacity(ref cap_err) => {
                        error!("WebSocket capacity error for {}: {}", peer, cap_err);
                        let error_msg = ServerEvent::Error {
                            message: "Server capacity error".to_string(),
                        };
                        let _ = send_event(&mut tx, &error_msg).await;
                    }
                    _ => {
                        error!("Error receiving message from {}: {}", peer, e);
                    }
                }
                break;
            }
        }
    }
    info!("WebSocket connection closed for {} (Conv ID: {})", peer, conversation_id);
}

/// Generates a reply and emits it token by token with model-like pacing.
/// Returns `true` when the client went away mid-stream; in that case the
/// partial assistant message is not persisted.
async fn stream_reply<S>(
    tx: &mut SplitSink<WebSocketStream<S>, Message>,
    agent: &CatAgent,
    conversation_id: &str,
    message: &str,
    hour: u32,
    rng: &mut StdRng
) -> bool
    where S: AsyncRead + AsyncWrite + Unpin
{
    let user_message = ChatMessage::now(Role::User, message);
    if send_event(tx, &ServerEvent::UserMessage(user_message.clone())).await.is_err() {
        return true;
    }
    agent.record_message(conversation_id, user_message).await;

    let plan = agent.plan_reply(message, hour, rng);
    info!(
        "Reply for {}: complexity {}, sentiment {:?}/{:?}, {} tokens",
        conversation_id,
        plan.complexity,
        plan.sentiment.sentiment,
        plan.sentiment.intensity,
        plan.tokens.len()
    );

    let started_at = Utc::now().timestamp_millis();
    let start = StreamingMessage {
        role: Role::Assistant,
        content: String::new(),
        timestamp: started_at,
        streaming: true,
    };
    if send_event(tx, &ServerEvent::AiMessageStart(start)).await.is_err() {
        return true;
    }

    let total = plan.tokens.len();
    let mut content = String::new();
    for (position, token) in plan.tokens.iter().enumerate() {
        let delay = token_delay(token, position, total, plan.complexity, rng);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        if position > 0 {
            content.push(' ');
        }
        content.push_str(token);

        let chunk = ServerEvent::AiMessageChunk {
            content: content.clone(),
            is_complete: position == total - 1,
        };
        // A failed send means the client is gone; stop computing delays
        // for a stream nobody is reading.
        if send_event(tx, &chunk).await.is_err() {
            return true;
        }
    }

    let final_message = ChatMessage {
        role: Role::Assistant,
        content,
        timestamp: started_at,
    };
    agent.record_message(conversation_id, final_message.clone()).await;

    let complete = StreamingMessage {
        role: final_message.role,
        content: final_message.content,
        timestamp: final_message.timestamp,
        streaming: false,
    };
    send_event(tx, &ServerEvent::AiMessageComplete(complete)).await.is_err()
}
