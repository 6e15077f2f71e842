use std::future::Future;

use axum::{
    extract::{
        ws::{Message as Frame, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::Response,
    Json,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::constants::NO_CONNECTION_SELECTED_MESSAGE;
use crate::db::{connections, messages};
use crate::error::{AppError, AppResult};
use crate::models::{Connection, Message, MessageThread, NewMessage};
use crate::services::{unread_status, ChangeFeed, FeedEvent, MessageFilter, Subscription, UnreadStatus};
use crate::session::Session;

use super::nav::Navbar;

type FrameSink = SplitSink<WebSocket, Frame>;

#[derive(Debug, Serialize)]
pub struct ConversationEntry {
    pub id: Uuid,
    pub connected_user_id: Uuid,
    pub connected_user_name: String,
    pub has_unread: bool,
}

#[derive(Debug, Serialize)]
pub struct MessagingPage {
    pub nav: Navbar,
    pub connections: Vec<ConversationEntry>,
    pub placeholder: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ThreadMessage {
    #[serde(flatten)]
    pub message: Message,
    pub mine: bool,
}

#[derive(Debug, Serialize)]
pub struct ThreadView {
    pub connection_id: Uuid,
    pub peer_id: Uuid,
    pub messages: Vec<ThreadMessage>,
}

impl ThreadView {
    fn new(connection_id: Uuid, thread: MessageThread) -> Self {
        let messages = thread
            .messages
            .iter()
            .map(|m| ThreadMessage { mine: thread.is_mine(m), message: m.clone() })
            .collect();
        Self { connection_id, peer_id: thread.peer, messages }
    }
}

pub async fn messaging_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<MessagingPage>> {
    let peers = connections::list_connections_with_peers(&db_pool, session.user_id).await?;
    let unread = unread_status(&db_pool, session.user_id).await?;

    let connections = peers
        .into_iter()
        .map(|peer| ConversationEntry {
            has_unread: unread.get(&peer.id).copied().unwrap_or(false),
            id: peer.id,
            connected_user_id: peer.connected_user_id,
            connected_user_name: peer.connected_user_name,
        })
        .collect();

    Ok(Json(MessagingPage {
        nav: Navbar::authenticated("/messaging"),
        connections,
        placeholder: NO_CONNECTION_SELECTED_MESSAGE,
    }))
}

/// The caller's side of `connection_id`; anyone else's connection is
/// reported as missing.
async fn own_connection(db_pool: &SqlitePool, connection_id: Uuid, user_id: Uuid) -> AppResult<Connection> {
    connections::get_connection(db_pool, connection_id, user_id)
        .await?
        .ok_or(AppError::NotFound("Connection"))
}

/// Full history with the connected player. Opening a thread marks it read.
pub async fn thread(
    State(db_pool): State<SqlitePool>,
    State(feed): State<ChangeFeed>,
    session: Session,
    Path(connection_id): Path<Uuid>,
) -> AppResult<Json<ThreadView>> {
    let connection = own_connection(&db_pool, connection_id, session.user_id).await?;
    let history = messages::read_thread(&db_pool, &connection).await?;
    if !history.is_empty() {
        feed.publish_read(connection.user_id, connection.id);
    }

    let thread = MessageThread::new(connection.user_id, connection.connected_user_id, history);
    Ok(Json(ThreadView::new(connection.id, thread)))
}

/// Stores a message and returns the row so the sender can show it at once.
pub async fn send(
    State(db_pool): State<SqlitePool>,
    State(feed): State<ChangeFeed>,
    session: Session,
    Path(connection_id): Path<Uuid>,
    Json(NewMessage { content }): Json<NewMessage>,
) -> AppResult<(StatusCode, Json<Message>)> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }

    let connection = own_connection(&db_pool, connection_id, session.user_id).await?;
    let message = messages::send_message(&db_pool, &connection, content).await?;

    feed.publish(message.clone());
    tracing::debug!(message_id = %message.id, %connection_id, "message sent");
    Ok((StatusCode::CREATED, Json(message)))
}

/// Live inserts from the peer to the caller on one connection. Each
/// delivered row also moves the caller's read cursor, and the move is
/// announced so an open unread socket recomputes after it.
pub async fn thread_ws(
    State(db_pool): State<SqlitePool>,
    State(feed): State<ChangeFeed>,
    session: Session,
    Path(connection_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let connection = own_connection(&db_pool, connection_id, session.user_id).await?;
    let mut subscription = feed.subscribe(
        MessageFilter::to_receiver(connection.user_id).from_sender(connection.connected_user_id),
    );

    Ok(ws.on_upgrade(move |socket| {
        run_socket(socket, move |mut sink| async move {
            while let Some(event) = subscription.next().await {
                let FeedEvent::Inserted(message) = event else {
                    continue;
                };
                match messages::mark_read(&db_pool, connection.id, message.created_at).await {
                    Ok(_) => feed.publish_read(connection.user_id, connection.id),
                    Err(err) => {
                        tracing::warn!(connection_id = %connection.id, error = %err, "failed to advance read cursor");
                    }
                }
                if !send_json(&mut sink, &message).await {
                    break;
                }
            }
        })
    }))
}

pub async fn unread(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<UnreadStatus>> {
    Ok(Json(unread_status(&db_pool, session.user_id).await?))
}

/// Pushes the unread map on connect, again after every insert that
/// touches the caller, and after each of the caller's reads.
pub async fn unread_ws(
    State(db_pool): State<SqlitePool>,
    State(feed): State<ChangeFeed>,
    session: Session,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id = session.user_id;
    let subscription = feed.subscribe(MessageFilter::involving(user_id));

    ws.on_upgrade(move |socket| {
        run_socket(socket, move |sink| push_unread(sink, subscription, db_pool, user_id))
    })
}

async fn push_unread(mut sink: FrameSink, mut subscription: Subscription, db_pool: SqlitePool, user_id: Uuid) {
    loop {
        let status = match unread_status(&db_pool, user_id).await {
            Ok(status) => status,
            Err(err) => {
                tracing::error!(%user_id, error = %err, "Error checking unread messages");
                break;
            }
        };
        if !send_json(&mut sink, &status).await {
            break;
        }
        if subscription.next().await.is_none() {
            break;
        }
    }
}

async fn send_json<T: Serialize>(sink: &mut FrameSink, value: &T) -> bool {
    let text = match serde_json::to_string(value) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(error = %err, "failed to encode frame");
            return false;
        }
    };
    sink.send(Frame::Text(text.into())).await.is_ok()
}

/// Splits the socket, hands the write half to `produce` and drains the
/// read half until the client goes away. Whichever side finishes first
/// stops the other, which drops the feed subscription.
async fn run_socket<P, Fut>(socket: WebSocket, produce: P)
where
    P: FnOnce(FrameSink) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (sink, mut stream) = socket.split();
    let mut outbound = tokio::spawn(produce(sink));
    let mut inbound = tokio::spawn(async move {
        while let Some(Ok(frame)) = stream.next().await {
            if matches!(frame, Frame::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut outbound => inbound.abort(),
        _ = &mut inbound => outbound.abort(),
    }
}
