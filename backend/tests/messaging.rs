mod common;

use std::time::Duration;

use axum::http::{Method, StatusCode};
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message as Frame, MaybeTlsStream, WebSocketStream};

use common::TestApp;
use spinsync::models::{Delivery, Message, MessageThread, SkillLevel};
use spinsync::services::{FeedEvent, MessageFilter};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn open_socket(url: String) -> Client {
    let (client, _) = connect_async(url).await.unwrap();
    client
}

/// Next JSON text frame, skipping pings.
async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("no frame in time")
            .expect("socket closed")
            .unwrap();
        if let Frame::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn test_unread_follows_reads_and_new_messages() {
    let app = TestApp::new().await;
    let ann = app.user("Ann", "Oslo", SkillLevel::Beginner).await;
    let bo = app.user("Bo", "Oslo", SkillLevel::Pro).await;
    let (ann_side, bo_side) = app.connect(&ann, &bo).await;

    // no messages yet: absent, not unread
    let (status, unread) = app.get("/api/unread", Some(&bo.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(unread.as_object().unwrap().is_empty());

    let send_uri = format!("/api/messaging/{ann_side}/messages");
    let (status, _) = app
        .send(Method::POST, &send_uri, Some(&ann.token), Some(json!({ "content": "Game tonight?" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, unread) = app.get("/api/unread", Some(&bo.token)).await;
    assert_eq!(unread[bo_side.to_string()], true);
    // the sender has read their own message
    let (_, unread) = app.get("/api/unread", Some(&ann.token)).await;
    assert_eq!(unread[ann_side.to_string()], false);

    let (status, thread) = app
        .get(&format!("/api/messaging/{bo_side}/messages"), Some(&bo.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thread["messages"][0]["content"], "Game tonight?");
    assert_eq!(thread["messages"][0]["mine"], false);

    let (_, unread) = app.get("/api/unread", Some(&bo.token)).await;
    assert_eq!(unread[bo_side.to_string()], false);

    tokio::time::sleep(Duration::from_millis(5)).await;
    app.send(Method::POST, &send_uri, Some(&ann.token), Some(json!({ "content": "7pm?" })))
        .await;

    let (_, unread) = app.get("/api/unread", Some(&bo.token)).await;
    assert_eq!(unread[bo_side.to_string()], true);

    let (_, page) = app.get("/messaging", Some(&bo.token)).await;
    assert_eq!(page["connections"][0]["has_unread"], true);
    assert_eq!(page["placeholder"], "Select a connection to start messaging");
}

#[tokio::test]
async fn test_send_returns_the_stored_row_and_thread_is_ordered() {
    let app = TestApp::new().await;
    let ann = app.user("Ann", "Oslo", SkillLevel::Beginner).await;
    let bo = app.user("Bo", "Oslo", SkillLevel::Pro).await;
    let (ann_side, bo_side) = app.connect(&ann, &bo).await;

    let (status, sent) = app
        .send(
            Method::POST,
            &format!("/api/messaging/{ann_side}/messages"),
            Some(&ann.token),
            Some(json!({ "content": "  first  " })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["content"], "first");
    assert_eq!(sent["sender_id"], ann.id.to_string());
    assert_eq!(sent["receiver_id"], bo.id.to_string());

    app.send(
        Method::POST,
        &format!("/api/messaging/{bo_side}/messages"),
        Some(&bo.token),
        Some(json!({ "content": "second" })),
    )
    .await;

    let (_, thread) = app
        .get(&format!("/api/messaging/{ann_side}/messages"), Some(&ann.token))
        .await;
    let contents: Vec<_> = thread["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| (m["content"].as_str().unwrap(), m["mine"].as_bool().unwrap()))
        .collect();
    assert_eq!(contents, vec![("first", true), ("second", false)]);
    assert_eq!(thread["messages"][0]["id"], sent["id"]);
}

#[tokio::test]
async fn test_blank_message_is_rejected() {
    let app = TestApp::new().await;
    let ann = app.user("Ann", "Oslo", SkillLevel::Beginner).await;
    let bo = app.user("Bo", "Oslo", SkillLevel::Pro).await;
    let (ann_side, _) = app.connect(&ann, &bo).await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/messaging/{ann_side}/messages"),
            Some(&ann.token),
            Some(json!({ "content": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["description"], "Message cannot be empty");
}

#[tokio::test]
async fn test_other_peoples_connections_are_hidden() {
    let app = TestApp::new().await;
    let ann = app.user("Ann", "Oslo", SkillLevel::Beginner).await;
    let bo = app.user("Bo", "Oslo", SkillLevel::Pro).await;
    let eve = app.user("Eve", "Oslo", SkillLevel::Pro).await;
    let (ann_side, _) = app.connect(&ann, &bo).await;

    let (status, _) = app
        .get(&format!("/api/messaging/{ann_side}/messages"), Some(&eve.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_send_is_published_once_to_the_receiver() {
    let app = TestApp::new().await;
    let ann = app.user("Ann", "Oslo", SkillLevel::Beginner).await;
    let bo = app.user("Bo", "Oslo", SkillLevel::Pro).await;
    let (ann_side, _) = app.connect(&ann, &bo).await;

    let mut bo_live = app.feed.subscribe(MessageFilter::to_receiver(bo.id).from_sender(ann.id));
    let mut ann_live = app.feed.subscribe(MessageFilter::to_receiver(ann.id).from_sender(bo.id));

    let (_, sent) = app
        .send(
            Method::POST,
            &format!("/api/messaging/{ann_side}/messages"),
            Some(&ann.token),
            Some(json!({ "content": "ping" })),
        )
        .await;
    let sent: Message = serde_json::from_value(sent).unwrap();

    let delivered = tokio::time::timeout(Duration::from_secs(1), bo_live.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(delivered, FeedEvent::Inserted(sent.clone()));

    // the sender's own insert never reaches their thread subscription
    assert!(
        tokio::time::timeout(Duration::from_millis(50), ann_live.next())
            .await
            .is_err()
    );

    // optimistic append plus any echo of the same row shows it once
    let mut ann_view = MessageThread::new(ann.id, bo.id, Vec::new());
    assert!(ann_view.apply(sent.clone(), Delivery::Sent));
    assert!(!ann_view.apply(sent, Delivery::Realtime));
    assert_eq!(ann_view.messages.len(), 1);
}

#[tokio::test]
async fn test_unread_socket_pushes_on_connect_insert_and_read() {
    let app = TestApp::new().await;
    let ann = app.user("Ann", "Oslo", SkillLevel::Beginner).await;
    let bo = app.user("Bo", "Oslo", SkillLevel::Pro).await;
    let (ann_side, bo_side) = app.connect(&ann, &bo).await;
    let addr = app.serve().await;

    let mut unread = open_socket(format!("ws://{addr}/api/unread/ws?access_token={}", bo.token)).await;
    assert_eq!(next_json(&mut unread).await, json!({}));

    app.send(
        Method::POST,
        &format!("/api/messaging/{ann_side}/messages"),
        Some(&ann.token),
        Some(json!({ "content": "Game tonight?" })),
    )
    .await;
    assert_eq!(next_json(&mut unread).await, json!({ bo_side.to_string(): true }));

    let (status, _) = app
        .get(&format!("/api/messaging/{bo_side}/messages"), Some(&bo.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next_json(&mut unread).await, json!({ bo_side.to_string(): false }));
}

#[tokio::test]
async fn test_thread_socket_delivers_only_the_peers_rows() {
    let app = TestApp::new().await;
    let ann = app.user("Ann", "Oslo", SkillLevel::Beginner).await;
    let bo = app.user("Bo", "Oslo", SkillLevel::Pro).await;
    let (ann_side, bo_side) = app.connect(&ann, &bo).await;
    let addr = app.serve().await;

    let mut thread = open_socket(format!(
        "ws://{addr}/api/messaging/{bo_side}/ws?access_token={}",
        bo.token
    ))
    .await;
    let ann_uri = format!("/api/messaging/{ann_side}/messages");

    app.send(Method::POST, &ann_uri, Some(&ann.token), Some(json!({ "content": "hi" })))
        .await;
    let delivered = next_json(&mut thread).await;
    assert_eq!(delivered["content"], "hi");
    assert_eq!(delivered["sender_id"], ann.id.to_string());

    // delivery over the socket counts as reading it
    let (_, unread) = app.get("/api/unread", Some(&bo.token)).await;
    assert_eq!(unread[bo_side.to_string()], false);

    app.send(
        Method::POST,
        &format!("/api/messaging/{bo_side}/messages"),
        Some(&bo.token),
        Some(json!({ "content": "mine" })),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    app.send(Method::POST, &ann_uri, Some(&ann.token), Some(json!({ "content": "again" })))
        .await;
    // bo's own row was skipped
    assert_eq!(next_json(&mut thread).await["content"], "again");

    thread.close(None).await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), async {
        while app.feed.subscriber_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscription outlived the socket");
}

#[tokio::test]
async fn test_live_delivery_clears_the_unread_socket() {
    let app = TestApp::new().await;
    let ann = app.user("Ann", "Oslo", SkillLevel::Beginner).await;
    let bo = app.user("Bo", "Oslo", SkillLevel::Pro).await;
    let (ann_side, bo_side) = app.connect(&ann, &bo).await;
    let addr = app.serve().await;

    let mut unread = open_socket(format!("ws://{addr}/api/unread/ws?access_token={}", bo.token)).await;
    let mut thread = open_socket(format!(
        "ws://{addr}/api/messaging/{bo_side}/ws?access_token={}",
        bo.token
    ))
    .await;
    assert_eq!(next_json(&mut unread).await, json!({}));

    app.send(
        Method::POST,
        &format!("/api/messaging/{ann_side}/messages"),
        Some(&ann.token),
        Some(json!({ "content": "hi" })),
    )
    .await;
    assert_eq!(next_json(&mut thread).await["content"], "hi");

    // the insert may be seen before or after the cursor moves; the read
    // that follows it always settles on false
    let key = bo_side.to_string();
    loop {
        let status = next_json(&mut unread).await;
        if status[&key] == false {
            break;
        }
        assert_eq!(status[&key], true);
    }
}
