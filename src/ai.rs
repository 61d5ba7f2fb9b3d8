use anyhow::{anyhow, Context, Result};
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

use crate::models::JobAnalysis;

pub const EXTRACTION_MODEL: &str = "llama-3.3-70b-versatile";

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

// Near-deterministic sampling to keep run-to-run variance down.
const TEMPERATURE: f32 = 0.1;

/// How many times a non-conformant model response is sent back for repair
/// before the extraction is reported as failed.
const MAX_SCHEMA_ATTEMPTS: usize = 3;

const TOOL_NAME: &str = "record_job_analysis";

const SYSTEM_PROMPT: &str = "You are an expert IT recruiter. Analyze the job posting text \
     objectively. Identify the technologies involved and any potential problems (red flags). \
     Respond strictly in the required structured format; write the summary in Romanian, \
     at most two sentences.";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("model output failed schema validation after {attempts} attempts: {reason}")]
    SchemaViolation { attempts: usize, reason: String },

    #[error("model request failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self { role: "system".to_string(), content: content.to_string() }
    }

    fn user(content: String) -> Self {
        Self { role: "user".to_string(), content }
    }

    fn assistant(content: String) -> Self {
        Self { role: "assistant".to_string(), content }
    }
}

// --- Provider trait ---

/// A hosted model that can be asked for output shaped by a JSON Schema.
/// Returns the raw JSON text of the structured response; the caller owns
/// validation.
pub trait StructuredProvider {
    fn complete_structured(
        &self,
        messages: &[ChatMessage],
        schema: &serde_json::Value,
    ) -> Result<String>;

    fn model_name(&self) -> &str;
}

// --- Groq provider (OpenAI-compatible chat completions, tool calling) ---

#[derive(Debug, Serialize)]
struct ToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "type")]
    kind: String,
    function: ToolFunction,
}

#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
    tools: Vec<Tool>,
    tool_choice: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GroqFunctionCall {
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct GroqToolCall {
    function: GroqFunctionCall,
}

#[derive(Debug, Deserialize)]
struct GroqResponseMessage {
    #[serde(default)]
    tool_calls: Vec<GroqToolCall>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqResponseMessage,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Debug)]
pub struct GroqProvider {
    api_key: String,
    model_id: String,
    client: reqwest::blocking::Client,
}

impl GroqProvider {
    pub fn new(model_id: String) -> Result<Self> {
        let api_key = env::var("GROQ_API_KEY")
            .context("GROQ_API_KEY environment variable not set. Set it with: export GROQ_API_KEY=your-key-here")?;
        let client = reqwest::blocking::Client::new();
        Ok(Self { api_key, model_id, client })
    }
}

impl StructuredProvider for GroqProvider {
    fn complete_structured(
        &self,
        messages: &[ChatMessage],
        schema: &serde_json::Value,
    ) -> Result<String> {
        let request = GroqRequest {
            model: self.model_id.clone(),
            temperature: TEMPERATURE,
            messages: messages.to_vec(),
            tools: vec![Tool {
                kind: "function".to_string(),
                function: ToolFunction {
                    name: TOOL_NAME.to_string(),
                    description: "Record the structured analysis of a job posting".to_string(),
                    parameters: schema.clone(),
                },
            }],
            tool_choice: serde_json::json!({
                "type": "function",
                "function": { "name": TOOL_NAME }
            }),
        };

        let response = self
            .client
            .post(GROQ_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .context("Failed to send request to Groq API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(anyhow!(
                "Groq API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: GroqResponse = response
            .json()
            .context("Failed to parse Groq API response")?;

        let message = api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| anyhow!("No choices in Groq API response"))?;

        if let Some(call) = message.tool_calls.into_iter().next() {
            return Ok(call.function.arguments);
        }

        // Some models answer inline instead of calling the tool.
        message
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow!("No structured content in Groq API response"))
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

// --- Extractor ---

/// Turns normalized posting text into a validated `JobAnalysis` by asking
/// the provider for schema-shaped output and sending non-conformant
/// responses back for repair, up to a fixed attempt budget.
pub struct JobExtractor {
    provider: Box<dyn StructuredProvider>,
    schema: serde_json::Value,
}

impl JobExtractor {
    pub fn new(provider: Box<dyn StructuredProvider>) -> Result<Self> {
        let schema = serde_json::to_value(schema_for!(JobAnalysis))
            .context("Failed to build JobAnalysis schema")?;
        Ok(Self { provider, schema })
    }

    pub fn extract(&self, text: &str) -> Result<JobAnalysis, ExtractError> {
        let mut messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("Analyze this job description:\n\n{text}")),
        ];

        let mut last_reason = String::new();
        for _ in 0..MAX_SCHEMA_ATTEMPTS {
            let raw = self
                .provider
                .complete_structured(&messages, &self.schema)
                .map_err(|e| ExtractError::Transport(e.to_string()))?;

            match JobAnalysis::parse(&raw) {
                Ok(analysis) => return Ok(analysis),
                Err(e) => {
                    last_reason = e.to_string();
                    messages.push(ChatMessage::assistant(raw));
                    messages.push(ChatMessage::user(format!(
                        "The previous response violates the required schema: {last_reason}. \
                         Produce a corrected response that satisfies every constraint."
                    )));
                }
            }
        }

        Err(ExtractError::SchemaViolation {
            attempts: MAX_SCHEMA_ATTEMPTS,
            reason: last_reason,
        })
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }
}
