//! Gateway WebSocket wire shapes.
//!
//! All communication uses JSON frames over WebSocket:
//! - `InboundMessage`  — client → gateway, one conversational turn
//! - `OutboundFrame`   — gateway → client, tagged by `type`

use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

pub const MAX_PAYLOAD_BYTES: usize = 65_536; // 64 KB
pub const GREETING: &str = "Welcome to the AI chatbot";

// ── Inbound ──────────────────────────────────────────────────────────────────

/// A single user message. The credential travels inside every message, not
/// just at connect time, so a channel can outlive a rotated or expired token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub text: String,
    pub token: String,
}

// ── Outbound ─────────────────────────────────────────────────────────────────

/// A persisted exchange, mirrored back to the originating client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeFrame {
    pub id: String,
    pub input_text: String,
    pub output_text: String,
    pub created_at: String,
}

/// Gateway → client frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum OutboundFrame {
    /// One-time message sent when the channel opens.
    Greeting { message: String },
    /// Successful turn: the exchange as persisted (or as resolved, when
    /// persistence failed — see the gateway's durability policy).
    Exchange(ExchangeFrame),
    /// The message was rejected before resolution (bad credential, bad
    /// frame). The channel stays open.
    Error { text: String, response: String },
}

impl OutboundFrame {
    pub fn greeting() -> Self {
        Self::Greeting {
            message: GREETING.into(),
        }
    }

    pub fn error(text: impl Into<String>, response: impl Into<String>) -> Self {
        Self::Error {
            text: text.into(),
            response: response.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_decodes_text_and_token() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"text":"hi","token":"abc"}"#).unwrap();
        assert_eq!(msg.text, "hi");
        assert_eq!(msg.token, "abc");
    }

    #[test]
    fn exchange_frame_uses_camel_case_on_the_wire() {
        let frame = OutboundFrame::Exchange(ExchangeFrame {
            id: "1".into(),
            input_text: "q".into(),
            output_text: "a".into(),
            created_at: "2024-09-09T00:00:00Z".into(),
        });
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "exchange");
        assert_eq!(json["inputText"], "q");
        assert_eq!(json["outputText"], "a");
        assert_eq!(json["createdAt"], "2024-09-09T00:00:00Z");
    }

    #[test]
    fn error_frame_carries_both_fields() {
        let json = serde_json::to_value(OutboundFrame::error("t", "r")).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["text"], "t");
        assert_eq!(json["response"], "r");
    }
}
