//! Display model for a conversation thread.
//!
//! Tool results arrive as their own blocks (usually in the message following
//! the tool call).  [`build_thread`] attaches each result to the call it
//! answers so a renderer can show them together.

use std::collections::HashMap;

use parley_protocol::{ContentBlock, Message, Role};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub content: Value,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThreadBlock {
    Text(String),
    ToolCall {
        id: String,
        name: String,
        input: Value,
        result: Option<ToolOutcome>,
    },
    /// A result whose call is not (or not yet) in the thread.
    ToolResult {
        tool_use_id: String,
        content: Value,
        is_error: bool,
    },
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadEntry {
    pub role: Role,
    pub blocks: Vec<ThreadBlock>,
}

/// Build the display thread for `messages`.
///
/// System messages are skipped.  A `tool_result` is attached to the earlier
/// unanswered `tool_use` with the same id; a result without such a call stays
/// a standalone block.  Entries left without blocks are dropped.
pub fn build_thread(messages: &[Message]) -> Vec<ThreadEntry> {
    let mut entries: Vec<ThreadEntry> = Vec::new();
    // tool_use id -> (entry index, block index) of calls still waiting for a result
    let mut open_calls: HashMap<String, (usize, usize)> = HashMap::new();

    for msg in messages.iter().filter(|m| m.role != Role::System) {
        let mut entry = ThreadEntry { role: msg.role, blocks: Vec::new() };
        let entry_idx = entries.len();

        for block in &msg.content {
            match block {
                ContentBlock::Text { text } => entry.blocks.push(ThreadBlock::Text(text.clone())),
                ContentBlock::ToolUse { id, name, input } => {
                    open_calls.insert(id.clone(), (entry_idx, entry.blocks.len()));
                    entry.blocks.push(ThreadBlock::ToolCall {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                        result: None,
                    });
                }
                ContentBlock::ToolResult { tool_use_id, content, is_error } => {
                    let outcome = ToolOutcome { content: content.clone(), is_error: *is_error };
                    match open_calls.remove(tool_use_id) {
                        Some((e, b)) if e == entry_idx => attach(&mut entry.blocks, b, outcome),
                        Some((e, b)) => attach(&mut entries[e].blocks, b, outcome),
                        None => entry.blocks.push(ThreadBlock::ToolResult {
                            tool_use_id: tool_use_id.clone(),
                            content: outcome.content,
                            is_error: outcome.is_error,
                        }),
                    }
                }
                ContentBlock::Unknown => entry.blocks.push(ThreadBlock::Unknown),
            }
        }

        entries.push(entry);
    }

    entries.retain(|e| !e.blocks.is_empty());
    entries
}

fn attach(blocks: &mut [ThreadBlock], idx: usize, outcome: ToolOutcome) {
    if let Some(ThreadBlock::ToolCall { result, .. }) = blocks.get_mut(idx) {
        *result = Some(outcome);
    }
}
