//! Threads synthetic tool-call ids from Gemini `functionCall` parts to the
//! `functionResponse` parts that answer them.
//!
//! Gemini does not require ids on either side, while chat completions needs
//! every `tool` message to name the `tool_calls[].id` it answers. Results are
//! paired with calls strictly in issue order. All queues are locals of a
//! single [`correlate`] call.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use gembridge_protocol::gemini::generate_content::types::{Content, Part};
use gembridge_protocol::openai::create_chat_completions::types::{
    ChatMessage, FunctionCall as OpenAIFunctionCall, MessageContent, ToolCall, ToolType,
};
use time::OffsetDateTime;
use tracing::debug;

static CALL_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CorrelationStats {
    pub calls: usize,
    pub results: usize,
    pub duplicates_dropped: usize,
    pub orphans_dropped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Correlated {
    pub messages: Vec<ChatMessage>,
    pub stats: CorrelationStats,
}

struct PendingCall {
    id: String,
    name: String,
}

/// Translate `turns` into chat messages.
///
/// Turns carrying function calls become assistant messages with
/// `tool_calls`; turns carrying function responses become one `tool`
/// message per answered call. Every other turn is handed to `plain`, which
/// may return `None` to skip it. Never fails: duplicate and orphaned
/// results are dropped and counted.
pub fn correlate<F>(turns: &[Content], mut plain: F) -> Correlated
where
    F: FnMut(&Content) -> Option<ChatMessage>,
{
    let mut ids: VecDeque<String> = turns
        .iter()
        .filter(|turn| turn.has_function_call())
        .flat_map(|turn| turn.parts.iter())
        .filter_map(|part| match part {
            Part::FunctionCall(call) => Some(next_call_id(&call.name)),
            _ => None,
        })
        .collect();

    let mut pending: VecDeque<PendingCall> = VecDeque::new();
    let mut seen_results: HashSet<String> = HashSet::new();
    let mut stats = CorrelationStats::default();
    let mut messages = Vec::with_capacity(turns.len());

    for turn in turns {
        if turn.has_function_call() {
            let mut text = Vec::new();
            let mut tool_calls = Vec::new();
            for part in &turn.parts {
                match part {
                    Part::FunctionCall(call) => {
                        let id = ids.pop_front().unwrap_or_else(|| next_call_id(&call.name));
                        let arguments = match &call.args {
                            Some(args) if !args.is_null() => args.to_string(),
                            _ => "{}".to_string(),
                        };
                        pending.push_back(PendingCall {
                            id: id.clone(),
                            name: call.name.clone(),
                        });
                        tool_calls.push(ToolCall {
                            id,
                            r#type: ToolType::Function,
                            function: OpenAIFunctionCall {
                                name: call.name.clone(),
                                arguments,
                            },
                        });
                        stats.calls += 1;
                    }
                    Part::Text(value) => text.push(value.as_str()),
                    _ => {}
                }
            }
            let content = if text.is_empty() {
                None
            } else {
                Some(MessageContent::Text(text.join("\n")))
            };
            messages.push(ChatMessage::Assistant {
                content,
                tool_calls: Some(tool_calls),
            });
            // Results sharing a turn with calls follow the assistant message.
            answer_results(turn, &mut pending, &mut seen_results, &mut stats, &mut messages);
            continue;
        }

        if turn.has_function_response() {
            answer_results(turn, &mut pending, &mut seen_results, &mut stats, &mut messages);
            continue;
        }

        if let Some(message) = plain(turn) {
            messages.push(message);
        }
    }

    if stats.duplicates_dropped > 0 || stats.orphans_dropped > 0 || !pending.is_empty() {
        debug!(
            event = "tool_correlation",
            calls = stats.calls,
            results = stats.results,
            duplicates_dropped = stats.duplicates_dropped,
            orphans_dropped = stats.orphans_dropped,
            unanswered = pending.len()
        );
    }

    Correlated { messages, stats }
}

fn answer_results(
    turn: &Content,
    pending: &mut VecDeque<PendingCall>,
    seen_results: &mut HashSet<String>,
    stats: &mut CorrelationStats,
    messages: &mut Vec<ChatMessage>,
) {
    for part in &turn.parts {
        let Part::FunctionResponse(response) = part else {
            continue;
        };
        stats.results += 1;
        if let Some(id) = &response.id
            && !seen_results.insert(id.clone())
        {
            stats.duplicates_dropped += 1;
            debug!(event = "tool_result_dropped", reason = "duplicate", result_id = %id, name = %response.name);
            continue;
        }
        let Some(call) = pending.pop_front() else {
            stats.orphans_dropped += 1;
            debug!(event = "tool_result_dropped", reason = "orphan", name = %response.name);
            continue;
        };
        messages.push(ChatMessage::Tool {
            content: response.response.to_string(),
            tool_call_id: call.id,
            name: Some(call.name),
        });
    }
}

/// `call_{name}_{counter}_{millis}`; unique within the process.
fn next_call_id(name: &str) -> String {
    let counter = CALL_COUNTER.fetch_add(1, Ordering::Relaxed);
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("call_{name}_{counter}_{millis}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use gembridge_protocol::gemini::generate_content::types::{
        ContentRole, FunctionCall, FunctionResponse,
    };

    fn call(name: &str) -> Part {
        Part::FunctionCall(FunctionCall {
            id: None,
            name: name.to_string(),
            args: Some(json!({"q": name})),
        })
    }

    fn result(id: Option<&str>, name: &str) -> Part {
        Part::FunctionResponse(FunctionResponse {
            id: id.map(str::to_string),
            name: name.to_string(),
            response: json!({"ok": name}),
        })
    }

    fn turn(role: ContentRole, parts: Vec<Part>) -> Content {
        Content {
            role: Some(role),
            parts,
        }
    }

    fn as_user(turn: &Content) -> Option<ChatMessage> {
        let text = turn.parts.iter().filter_map(Part::as_text).collect::<Vec<_>>().join("\n");
        Some(ChatMessage::User {
            content: MessageContent::Text(text),
        })
    }

    fn call_ids(messages: &[ChatMessage]) -> Vec<String> {
        messages
            .iter()
            .filter_map(|message| match message {
                ChatMessage::Assistant {
                    tool_calls: Some(calls),
                    ..
                } => Some(calls.iter().map(|call| call.id.clone()).collect::<Vec<_>>()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn result_ids(messages: &[ChatMessage]) -> Vec<String> {
        messages
            .iter()
            .filter_map(|message| match message {
                ChatMessage::Tool { tool_call_id, .. } => Some(tool_call_id.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn pairs_results_with_calls_in_order() {
        let turns = vec![
            turn(ContentRole::User, vec![Part::text("weather?")]),
            turn(ContentRole::Model, vec![call("a"), call("b")]),
            turn(ContentRole::User, vec![result(None, "a"), result(None, "b")]),
            turn(ContentRole::Model, vec![call("c")]),
            turn(ContentRole::Function, vec![result(None, "c")]),
        ];

        let correlated = correlate(&turns, as_user);

        let calls = call_ids(&correlated.messages);
        assert_eq!(calls.len(), 3);
        assert_eq!(calls.iter().collect::<HashSet<_>>().len(), 3);
        assert_eq!(result_ids(&correlated.messages), calls);
        assert!(calls[0].starts_with("call_a_"));
        assert_eq!(
            correlated.stats,
            CorrelationStats {
                calls: 3,
                results: 3,
                duplicates_dropped: 0,
                orphans_dropped: 0,
            }
        );
    }

    #[test]
    fn tool_message_carries_name_and_encoded_response() {
        let turns = vec![
            turn(ContentRole::Model, vec![call("lookup")]),
            turn(ContentRole::User, vec![result(None, "lookup")]),
        ];

        let correlated = correlate(&turns, as_user);

        let ChatMessage::Tool { content, name, .. } = &correlated.messages[1] else {
            panic!("expected tool message, got {:?}", correlated.messages[1]);
        };
        assert_eq!(name.as_deref(), Some("lookup"));
        assert_eq!(serde_json::from_str::<serde_json::Value>(content).unwrap(), json!({"ok": "lookup"}));
    }

    #[test]
    fn duplicate_result_ids_are_dropped() {
        let turns = vec![
            turn(ContentRole::Model, vec![call("f"), call("g")]),
            turn(
                ContentRole::User,
                vec![result(Some("r1"), "f"), result(Some("r1"), "f")],
            ),
        ];

        let correlated = correlate(&turns, as_user);

        assert_eq!(result_ids(&correlated.messages).len(), 1);
        assert_eq!(correlated.stats.duplicates_dropped, 1);
    }

    #[test]
    fn orphan_results_do_not_disturb_later_pairs() {
        let turns = vec![
            turn(ContentRole::User, vec![result(None, "stray")]),
            turn(ContentRole::Model, vec![call("f")]),
            turn(ContentRole::User, vec![result(None, "f")]),
        ];

        let correlated = correlate(&turns, as_user);

        assert_eq!(correlated.stats.orphans_dropped, 1);
        assert_eq!(correlated.messages.len(), 2);
        assert_eq!(result_ids(&correlated.messages), call_ids(&correlated.messages));
    }

    #[test]
    fn results_in_a_call_turn_are_answered_not_lost() {
        let turns = vec![
            turn(ContentRole::Model, vec![call("f"), result(None, "f")]),
            turn(ContentRole::User, vec![result(None, "extra")]),
        ];

        let correlated = correlate(&turns, as_user);

        assert_eq!(correlated.messages.len(), 2);
        assert!(matches!(correlated.messages[0], ChatMessage::Assistant { .. }));
        assert_eq!(result_ids(&correlated.messages), call_ids(&correlated.messages));
        assert_eq!(
            correlated.stats,
            CorrelationStats {
                calls: 1,
                results: 2,
                duplicates_dropped: 0,
                orphans_dropped: 1,
            }
        );
    }

    #[test]
    fn call_turn_keeps_its_text() {
        let turns = vec![turn(ContentRole::Model, vec![Part::text("checking"), call("f")])];

        let correlated = correlate(&turns, as_user);

        let ChatMessage::Assistant { content, tool_calls } = &correlated.messages[0] else {
            panic!("expected assistant message");
        };
        assert_eq!(content, &Some(MessageContent::Text("checking".to_string())));
        let calls = tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.arguments, r#"{"q":"f"}"#);
    }

    #[test]
    fn missing_args_encode_as_empty_object() {
        let turns = vec![turn(
            ContentRole::Model,
            vec![Part::FunctionCall(FunctionCall {
                id: None,
                name: "now".to_string(),
                args: None,
            })],
        )];

        let correlated = correlate(&turns, as_user);

        let ChatMessage::Assistant { tool_calls: Some(calls), .. } = &correlated.messages[0] else {
            panic!("expected tool calls");
        };
        assert_eq!(calls[0].function.arguments, "{}");
    }

    #[test]
    fn plain_turns_go_through_callback() {
        let turns = vec![
            turn(ContentRole::User, vec![Part::text("one")]),
            turn(ContentRole::User, vec![Part::text("skip")]),
        ];

        let correlated = correlate(&turns, |turn| {
            (turn.parts[0].as_text() != Some("skip")).then(|| ChatMessage::User {
                content: MessageContent::Text("kept".to_string()),
            })
        });

        assert_eq!(correlated.messages.len(), 1);
    }
}
