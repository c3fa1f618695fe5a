// ABOUTME: End-to-end runs through the orchestrator over an in-memory database
// ABOUTME: Covers direct answers, tool runs, upstream failure isolation, and ownership
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Minaret

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{test_resources, test_resources_with_registry};
use minaret_server::agent::AgentRunInput;
use minaret_server::errors::ErrorCode;
use minaret_server::test_utils::{build_registry_with_failing_geocoder, MockLlmProvider};

fn input(message: &str) -> AgentRunInput {
    AgentRunInput {
        message: message.to_owned(),
        conversation_id: None,
        location: None,
        timezone: None,
    }
}

fn continue_input(message: &str, conversation_id: &str) -> AgentRunInput {
    AgentRunInput {
        message: message.to_owned(),
        conversation_id: Some(conversation_id.to_owned()),
        location: None,
        timezone: None,
    }
}

// ============================================================================
// Direct Answers
// ============================================================================

#[tokio::test]
async fn test_direct_answer_uses_no_tools() {
    // One plan call choosing respond_directly, one synthesis call
    let resources = test_resources(MockLlmProvider::scripted(vec![
        r#"{"intent": "pillars of Islam", "steps": [{"action": "respond_directly"}]}"#,
        "The five pillars of Islam are the shahada, salah, zakat, sawm, and hajj.",
    ]))
    .await;

    let output = resources
        .orchestrator
        .handle_message("user-a", input("What are the five pillars of Islam?"))
        .await
        .unwrap();

    assert!(output.success);
    assert!(output.tools_used.is_empty());
    assert!(output.steps.is_empty());
    assert!(output.response.contains("pillars"));

    // Both sides of the exchange are persisted, in order
    let messages = resources
        .database
        .chat()
        .get_messages(&output.conversation_id)
        .await
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "user");
    assert_eq!(messages[0].seq, 1);
    assert_eq!(messages[1].role, "assistant");
    assert_eq!(messages[1].seq, 2);
    assert_eq!(messages[1].content, output.response);
}

#[tokio::test]
async fn test_greeting_answers_without_model() {
    // No scripted responses: any model call would panic the mock
    let resources = test_resources(MockLlmProvider::scripted(vec![])).await;

    let output = resources
        .orchestrator
        .handle_message("user-a", input("Assalamu alaikum"))
        .await
        .unwrap();

    assert!(output.success);
    assert!(output.tools_used.is_empty());
    assert!(output.response.contains("Wa alaikum assalam"));
}

// ============================================================================
// Tool Runs
// ============================================================================

#[tokio::test]
async fn test_prayer_times_run_records_tool() {
    let resources = test_resources(MockLlmProvider::scripted(vec![
        r#"{"intent": "prayer times for New York", "steps": [{"action": "use_tool", "tool": "get_prayer_times", "reasoning": "user wants today's times", "parameters": {"location": "New York"}}]}"#,
        "Today in New York, Fajr is at 04:12 and Isha at 21:53.",
    ]))
    .await;

    let output = resources
        .orchestrator
        .handle_message("user-a", input("What are the prayer times in New York?"))
        .await
        .unwrap();

    assert!(output.success);
    assert_eq!(output.tools_used, vec!["get_prayer_times"]);
    assert_eq!(output.steps.len(), 1);
    assert!(output.steps[0].ok);

    // The run is recorded against the conversation
    let executions = resources
        .database
        .executions()
        .list_for_conversation(&output.conversation_id)
        .await
        .unwrap();
    assert_eq!(executions.len(), 1);
    assert!(executions[0].success);
    assert_eq!(executions[0].tools_used, vec!["get_prayer_times"]);
    assert_eq!(executions[0].user_query, "What are the prayer times in New York?");

    // The assistant message carries the trace in its metadata
    let messages = resources
        .database
        .chat()
        .get_messages(&output.conversation_id)
        .await
        .unwrap();
    let metadata = messages[1].metadata.as_ref().unwrap();
    assert_eq!(metadata["tools_used"], serde_json::json!(["get_prayer_times"]));
    assert_eq!(metadata["agent_steps"][0]["tool"], "get_prayer_times");
}

#[tokio::test]
async fn test_upstream_failure_is_isolated() {
    // Geocoding fails, so the tool step fails; synthesis still runs
    let resources = test_resources_with_registry(
        MockLlmProvider::scripted(vec![
            r#"{"intent": "prayer times", "steps": [{"action": "use_tool", "tool": "get_prayer_times", "reasoning": "needs times", "parameters": {"location": "Atlantis"}}]}"#,
            "I could not reach the prayer times service right now. Please try again shortly.",
        ]),
        build_registry_with_failing_geocoder(),
    )
    .await;

    let output = resources
        .orchestrator
        .handle_message("user-a", input("What are the prayer times in Atlantis?"))
        .await
        .unwrap();

    assert!(!output.success);
    assert_eq!(output.steps.len(), 1);
    assert!(!output.steps[0].ok);
    // The failed invocation is still listed; the step flag carries the outcome
    assert_eq!(output.tools_used, vec!["get_prayer_times"]);
    // The user still gets prose, never an error payload
    assert!(output.response.contains("try again"));

    let executions = resources
        .database
        .executions()
        .list_for_conversation(&output.conversation_id)
        .await
        .unwrap();
    assert_eq!(executions.len(), 1);
    assert!(!executions[0].success);
    assert_eq!(executions[0].tools_used, vec!["get_prayer_times"]);
    assert!(executions[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("get_prayer_times"));
}

// ============================================================================
// Conversation Continuity and Ownership
// ============================================================================

#[tokio::test]
async fn test_second_message_continues_conversation() {
    let resources = test_resources(MockLlmProvider::scripted(vec![
        r#"{"intent": "pillars", "steps": [{"action": "respond_directly"}]}"#,
        "There are five pillars of Islam.",
        r#"{"intent": "zakat detail", "steps": [{"action": "respond_directly"}]}"#,
        "Zakat is the obligatory annual alms, typically 2.5% of savings.",
    ]))
    .await;

    let first = resources
        .orchestrator
        .handle_message("user-a", input("What are the pillars of Islam?"))
        .await
        .unwrap();
    let second = resources
        .orchestrator
        .handle_message(
            "user-a",
            continue_input("Tell me more about zakat", &first.conversation_id),
        )
        .await
        .unwrap();

    assert_eq!(second.conversation_id, first.conversation_id);

    let messages = resources
        .database
        .chat()
        .get_messages(&first.conversation_id)
        .await
        .unwrap();
    assert_eq!(messages.len(), 4);
    let seqs: Vec<i64> = messages.iter().map(|m| m.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_foreign_conversation_is_rejected_before_persistence() {
    let resources = test_resources(MockLlmProvider::scripted(vec![])).await;

    // User A establishes a conversation via a canned greeting run
    let owned = resources
        .orchestrator
        .handle_message("user-a", input("salam"))
        .await
        .unwrap();

    let err = resources
        .orchestrator
        .handle_message(
            "user-b",
            continue_input("salam", &owned.conversation_id),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotAuthorized);

    // Nothing was appended to user A's conversation
    let count = resources
        .database
        .chat()
        .get_message_count(&owned.conversation_id)
        .await
        .unwrap();
    assert_eq!(count, 2);

    // And user B gained no conversation of their own
    let theirs = resources
        .database
        .chat()
        .list_conversations("user-b", 10, 0)
        .await
        .unwrap();
    assert!(theirs.is_empty());
}

#[tokio::test]
async fn test_unknown_conversation_id_is_not_found() {
    let resources = test_resources(MockLlmProvider::scripted(vec![])).await;

    let err = resources
        .orchestrator
        .handle_message("user-a", continue_input("salam", "no-such-conversation"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let resources = test_resources(MockLlmProvider::scripted(vec![])).await;

    let err = resources
        .orchestrator
        .handle_message("user-a", input("   "))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let conversations = resources
        .database
        .chat()
        .list_conversations("user-a", 10, 0)
        .await
        .unwrap();
    assert!(conversations.is_empty());
}

// ============================================================================
// Profile-Aware Context
// ============================================================================

#[tokio::test]
async fn test_profile_location_backs_tool_defaults() {
    let resources = test_resources(MockLlmProvider::scripted(vec![
        // Planner omits the location; the profile default fills it in
        r#"{"intent": "prayer times", "steps": [{"action": "use_tool", "tool": "get_prayer_times", "reasoning": "", "parameters": {}}]}"#,
        "Here are today's prayer times for your saved location.",
    ]))
    .await;

    let mut profile =
        minaret_server::database::UserProfileSnapshot::empty("user-a");
    profile.location = Some("Cairo, Egypt".to_owned());
    resources.database.profiles().upsert(&profile).await.unwrap();

    let output = resources
        .orchestrator
        .handle_message("user-a", input("What are the prayer times today?"))
        .await
        .unwrap();

    assert!(output.success);
    assert_eq!(output.tools_used, vec!["get_prayer_times"]);
}
