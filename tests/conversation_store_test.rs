// ABOUTME: Integration tests for the conversation and message store
// ABOUTME: Covers seq ordering, ownership scoping, deletion, and concurrent appends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use minaret_server::llm::MessageRole;
use minaret_server::test_utils::test_database;

#[tokio::test]
async fn test_messages_keep_append_order() {
    let db = test_database().await;
    let chat = db.chat();
    let conversation = chat.create_conversation("user-a", "Ordering").await.unwrap();

    for i in 1..=5 {
        chat.append_message(&conversation.id, MessageRole::User, &format!("message {i}"), None)
            .await
            .unwrap();
    }

    let messages = chat.get_messages(&conversation.id).await.unwrap();
    let seqs: Vec<i64> = messages.iter().map(|m| m.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    assert_eq!(messages[0].content, "message 1");
    assert_eq!(messages[4].content, "message 5");

    // Re-reading returns the identical sequence
    let again = chat.get_messages(&conversation.id).await.unwrap();
    let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
    let ids_again: Vec<&str> = again.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ids_again);
}

#[tokio::test]
async fn test_recent_messages_window_is_chronological() {
    let db = test_database().await;
    let chat = db.chat();
    let conversation = chat.create_conversation("user-a", "Window").await.unwrap();

    for i in 1..=8 {
        chat.append_message(&conversation.id, MessageRole::User, &format!("m{i}"), None)
            .await
            .unwrap();
    }

    let recent = chat.get_recent_messages(&conversation.id, 3).await.unwrap();
    let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m6", "m7", "m8"]);
}

#[tokio::test]
async fn test_append_bumps_conversation_updated_at() {
    let db = test_database().await;
    let chat = db.chat();
    let conversation = chat.create_conversation("user-a", "Bump").await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    chat.append_message(&conversation.id, MessageRole::User, "hello", None)
        .await
        .unwrap();

    let reloaded = chat
        .get_conversation(&conversation.id, "user-a")
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.updated_at > conversation.updated_at);
}

#[tokio::test]
async fn test_concurrent_appends_both_land_with_distinct_seq() {
    let db = test_database().await;
    let chat1 = db.chat();
    let chat2 = db.chat();
    let conversation = chat1
        .create_conversation("user-a", "Concurrent")
        .await
        .unwrap();
    let id1 = conversation.id.clone();
    let id2 = conversation.id.clone();

    let (a, b) = tokio::join!(
        chat1.append_message(&id1, MessageRole::User, "first", None),
        chat2.append_message(&id2, MessageRole::Assistant, "second", None),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    assert_ne!(a.seq, b.seq);

    let messages = chat1.get_messages(&conversation.id).await.unwrap();
    assert_eq!(messages.len(), 2);
    let seqs: Vec<i64> = messages.iter().map(|m| m.seq).collect();
    assert_eq!(seqs, vec![1, 2]);
}

#[tokio::test]
async fn test_message_metadata_round_trips() {
    let db = test_database().await;
    let chat = db.chat();
    let conversation = chat.create_conversation("user-a", "Trace").await.unwrap();

    chat.append_message(&conversation.id, MessageRole::User, "prayer times?", None)
        .await
        .unwrap();

    let trace = serde_json::json!({
        "agent_steps": [{"tool": "get_prayer_times", "ok": true}],
        "tools_used": ["get_prayer_times"],
    });
    let appended = chat
        .append_message(
            &conversation.id,
            MessageRole::Assistant,
            "Fajr is at 04:12.",
            Some(&trace),
        )
        .await
        .unwrap();
    assert_eq!(appended.metadata, Some(trace.clone()));

    let messages = chat.get_messages(&conversation.id).await.unwrap();
    assert_eq!(messages[0].metadata, None);
    assert_eq!(messages[1].metadata.as_ref(), Some(&trace));
    assert_eq!(
        messages[1].metadata.as_ref().unwrap()["tools_used"],
        serde_json::json!(["get_prayer_times"])
    );
}

#[tokio::test]
async fn test_conversations_are_owner_scoped() {
    let db = test_database().await;
    let chat = db.chat();
    let conversation = chat.create_conversation("user-a", "Private").await.unwrap();

    assert!(chat
        .get_conversation(&conversation.id, "user-b")
        .await
        .unwrap()
        .is_none());
    assert!(chat.conversation_exists(&conversation.id).await.unwrap());

    let listing = chat.list_conversations("user-b", 10, 0).await.unwrap();
    assert!(listing.is_empty());
}

#[tokio::test]
async fn test_listing_orders_by_recency_and_counts_messages() {
    let db = test_database().await;
    let chat = db.chat();

    let older = chat.create_conversation("user-a", "Older").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = chat.create_conversation("user-a", "Newer").await.unwrap();

    chat.append_message(&older.id, MessageRole::User, "one", None)
        .await
        .unwrap();
    chat.append_message(&older.id, MessageRole::Assistant, "two", None)
        .await
        .unwrap();

    let listing = chat.list_conversations("user-a", 10, 0).await.unwrap();
    assert_eq!(listing.len(), 2);
    // The append bumped updated_at, so the older conversation leads
    assert_eq!(listing[0].id, older.id);
    assert_eq!(listing[0].message_count, 2);
    assert_eq!(listing[1].id, newer.id);
    assert_eq!(listing[1].message_count, 0);
}

#[tokio::test]
async fn test_delete_removes_conversation_and_messages() {
    let db = test_database().await;
    let chat = db.chat();
    let conversation = chat.create_conversation("user-a", "Doomed").await.unwrap();
    chat.append_message(&conversation.id, MessageRole::User, "hello", None)
        .await
        .unwrap();

    // Another owner cannot delete it
    assert!(!chat
        .delete_conversation(&conversation.id, "user-b")
        .await
        .unwrap());

    assert!(chat
        .delete_conversation(&conversation.id, "user-a")
        .await
        .unwrap());
    assert!(!chat.conversation_exists(&conversation.id).await.unwrap());
    assert_eq!(chat.get_message_count(&conversation.id).await.unwrap(), 0);
}
