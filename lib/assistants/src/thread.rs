//! Thread message types.

use serde::{Deserialize, Serialize};
use smart_dialogue_conversation::TurnRole;

/// A message on a remote thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    /// Message identifier.
    pub id: String,
    /// Author of the message.
    pub role: TurnRole,
    /// The run that produced the message; absent for messages the client
    /// placed on the thread.
    #[serde(default)]
    pub run_id: Option<String>,
    /// Content segments in display order.
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Returns true if this message was produced by the given run.
    #[must_use]
    pub fn is_from_run(&self, run_id: &str) -> bool {
        self.run_id.as_deref() == Some(run_id)
    }

    /// Iterates over the text segments, skipping non-text content.
    pub fn text_segments(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(MessageContent::as_text)
    }
}

/// One content segment of a thread message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// A text segment.
    Text { text: TextContent },
    /// Image, file or other content this client does not render.
    #[serde(other)]
    Unsupported,
}

impl MessageContent {
    /// Returns the segment text, if this is a text segment.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(&text.value),
            Self::Unsupported => None,
        }
    }
}

/// Text payload of a text segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    /// The text.
    pub value: String,
}

/// One page of the thread message listing.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessagePage {
    pub data: Vec<ThreadMessage>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub last_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_listing_page() {
        let json = serde_json::json!({
            "object": "list",
            "data": [
                {
                    "id": "msg_1",
                    "object": "thread.message",
                    "thread_id": "thread_1",
                    "role": "user",
                    "run_id": null,
                    "content": [{"type": "text", "text": {"value": "Hi", "annotations": []}}]
                },
                {
                    "id": "msg_2",
                    "object": "thread.message",
                    "thread_id": "thread_1",
                    "role": "assistant",
                    "run_id": "run_1",
                    "content": [
                        {"type": "text", "text": {"value": "Hello", "annotations": []}},
                        {"type": "image_file", "image_file": {"file_id": "file_1"}},
                        {"type": "text", "text": {"value": " there", "annotations": []}}
                    ]
                }
            ],
            "first_id": "msg_1",
            "last_id": "msg_2",
            "has_more": false
        });

        let page: MessagePage = serde_json::from_value(json).expect("deserialize");
        assert_eq!(page.data.len(), 2);
        assert!(!page.has_more);

        let reply = &page.data[1];
        assert_eq!(reply.role, TurnRole::Assistant);
        assert!(reply.is_from_run("run_1"));
        assert_eq!(reply.content[1], MessageContent::Unsupported);
        assert_eq!(reply.text_segments().collect::<String>(), "Hello there");

        assert!(!page.data[0].is_from_run("run_1"));
    }
}
