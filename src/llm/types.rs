//! Wire model of the Gemini `generateContent` API.
//!
//! The same types are the persisted history format, so they serialize
//! exactly as the API expects them (camelCase, untagged parts).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a content turn.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user, or function results sent back on the user's behalf.
    User,
    /// The model.
    #[default]
    Model,
}

impl Role {
    /// Stable string form used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "model" => Ok(Self::Model),
            _ => Err(value.to_string()),
        }
    }
}

/// A single turn: a role and its ordered parts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// Who produced the turn.
    #[serde(default)]
    pub role: Role,
    /// Ordered segments of the turn.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn holding one text part.
    #[must_use]
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    /// A model turn holding one text part.
    #[must_use]
    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::text(text)],
        }
    }

    /// A user turn carrying function results back to the model.
    #[must_use]
    pub fn function_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: Role::User,
            parts: responses
                .into_iter()
                .map(|function_response| Part::FunctionResponse { function_response })
                .collect(),
        }
    }

    /// Function calls requested in this turn, in order.
    #[must_use]
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionCall { function_call } => Some(function_call),
                _ => None,
            })
            .collect()
    }

    /// Non-empty text parts of this turn, in order.
    #[must_use]
    pub fn text_segments(&self) -> Vec<String> {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Whether this is a user turn that carries typed text.
    #[must_use]
    pub fn is_user_text(&self) -> bool {
        self.role == Role::User && self.parts.iter().any(|part| part.as_text().is_some())
    }
}

/// One segment of a turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// The model asks for a function to be run.
    #[serde(rename_all = "camelCase")]
    FunctionCall {
        /// The requested call.
        function_call: FunctionCall,
    },
    /// The result of a function call.
    #[serde(rename_all = "camelCase")]
    FunctionResponse {
        /// The call result.
        function_response: FunctionResponse,
    },
    /// Any other part kind, kept verbatim.
    Other(Value),
}

impl Part {
    /// A text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Get the text content if this is a text part.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A function invocation requested by the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Declared function name.
    pub name: String,
    /// Arguments as a JSON object.
    #[serde(default)]
    pub args: Value,
}

/// The result of running a requested function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// Function name the result belongs to.
    pub name: String,
    /// Result payload; must be a JSON object.
    pub response: Value,
}

/// A group of function declarations offered to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Declared functions.
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// Schema of a function the model may call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Function name.
    pub name: String,
    /// What the function does; the model reads this.
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// System prompt wrapper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SystemInstruction {
    /// Prompt parts.
    pub parts: Vec<Part>,
}

impl SystemInstruction {
    /// A system instruction with a single text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(text)],
        }
    }
}

/// Body of a `generateContent` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation so far, ending with the newest user turn.
    pub contents: Vec<Content>,
    /// Functions the model may call.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tools: Vec<Tool>,
    /// Fixed system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    /// Sampling parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// Sampling parameters for a `generateContent` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Cap on generated tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Response of a `generateContent` call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate replies; the first is used.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Token accounting, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    /// Content of the first candidate.
    #[must_use]
    pub fn into_first_content(self) -> Option<Content> {
        self.candidates.into_iter().next().and_then(|c| c.content)
    }
}

/// One candidate reply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Reply content; absent when generation was blocked.
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Token usage reported by the API.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_token_count: u32,
    /// Generated tokens.
    #[serde(default)]
    pub candidates_token_count: u32,
    /// Total tokens.
    #[serde(default)]
    pub total_token_count: u32,
}
