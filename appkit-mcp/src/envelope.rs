//! Invocation envelopes
//!
//! The result of a tool call: human-readable content blocks plus optional
//! machine-readable `structuredContent`. The JSON shape matches MCP's
//! `CallToolResult`, so envelopes convert to and from rmcp and bridge
//! payloads through serde.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// One content block of an envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        data: String,
        mime_type: String,
    },
    #[serde(rename_all = "camelCase")]
    ResourceLink {
        uri: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    /// Block types this crate does not interpret (audio, embedded resources)
    #[serde(other)]
    Unsupported,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// Text of this block, if it is a text block
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Response of a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Envelope {
    /// Successful envelope carrying a single text block
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            structured_content: None,
            is_error: false,
        }
    }

    /// Attach machine-readable content
    pub fn with_structured(mut self, structured: Value) -> Self {
        self.structured_content = Some(structured);
        self
    }

    /// Envelope reporting a failed invocation
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(message)],
            structured_content: None,
            is_error: true,
        }
    }

    /// Envelope for an error raised while handling an invocation
    pub fn from_error(err: &Error) -> Self {
        Self::error(err.to_string()).with_structured(serde_json::json!({
            "error": { "kind": err.kind(), "message": err.to_string() }
        }))
    }

    /// First text block, the human-readable fallback
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(ContentBlock::as_text)
    }

    /// Domain payload: `structuredContent` when present, else the first
    /// text block parsed as JSON.
    pub fn payload(&self) -> Result<Value> {
        if let Some(structured) = &self.structured_content {
            return Ok(structured.clone());
        }
        let text = self
            .first_text()
            .ok_or_else(|| Error::Parse("envelope has no text content".to_string()))?;
        serde_json::from_str(text).map_err(|e| Error::Parse(format!("text content is not JSON: {}", e)))
    }
}

impl From<&rmcp::model::CallToolResult> for Envelope {
    fn from(result: &rmcp::model::CallToolResult) -> Self {
        serde_json::to_value(result)
            .and_then(serde_json::from_value)
            .unwrap_or_else(|e| Envelope::error(format!("unreadable tool result: {}", e)))
    }
}

impl TryFrom<Envelope> for rmcp::model::CallToolResult {
    type Error = Error;

    fn try_from(envelope: Envelope) -> Result<Self> {
        Ok(serde_json::from_value(serde_json::to_value(envelope)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let envelope = Envelope::text("hello").with_structured(json!({"action": "x"}));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "content": [{"type": "text", "text": "hello"}],
                "structuredContent": {"action": "x"}
            })
        );
    }

    #[test]
    fn test_error_envelope_flags_error() {
        let envelope = Envelope::from_error(&Error::UnknownTool("nope".into()));
        assert!(envelope.is_error);
        assert_eq!(envelope.first_text(), Some("Unknown tool: nope"));
        assert_eq!(
            envelope.structured_content.unwrap()["error"]["kind"],
            json!("unknownTool")
        );
    }

    #[test]
    fn test_payload_prefers_structured_content() {
        let envelope = Envelope::text("[1]").with_structured(json!({"todos": []}));
        assert_eq!(envelope.payload().unwrap(), json!({"todos": []}));
    }

    #[test]
    fn test_payload_falls_back_to_text() {
        let envelope = Envelope::text(r#"[{"id":"1"}]"#);
        assert_eq!(envelope.payload().unwrap(), json!([{"id": "1"}]));
    }

    #[test]
    fn test_payload_parse_failure() {
        assert!(matches!(
            Envelope::text("not json").payload(),
            Err(Error::Parse(_))
        ));
        let empty = Envelope {
            content: vec![],
            structured_content: None,
            is_error: false,
        };
        assert!(matches!(empty.payload(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_rmcp_conversion() {
        let envelope = Envelope::text("done").with_structured(json!({"ok": true}));
        let result = rmcp::model::CallToolResult::try_from(envelope.clone()).unwrap();
        assert_eq!(result.structured_content, Some(json!({"ok": true})));
        assert_eq!(Envelope::from(&result), envelope);
    }
}
