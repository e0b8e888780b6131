use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GatewayError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAISettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl OpenAISettings {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(12),
        }
    }
}

pub fn build_prompt(
    prompt: &str,
    prompt_type: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let full_prompt = match prompt_type {
        "meeting_suggestions" => format!(
            "You are a meeting time planner for a distributed team.\n\
             Task: pick the best start times for a 60-minute meeting.\n\
             The JSON below lists every participant with their IANA timezone and optional \
             unavailability notes, the inclusive date range to search, and the local-hour \
             thresholds that define working hours and waking hours.\n\
             Rules:\n\
             - Prefer times inside everyone's working hours.\n\
             - Otherwise prefer times where everyone is awake (inside waking hours).\n\
             - Never pick a time inside anyone's sleeping hours unless nothing else exists.\n\
             - Honor every unavailability note exactly (e.g. \"No Fridays\" means no Friday in that person's timezone).\n\
             - Only pick dates inside the date range.\n\
             - Return {count} distinct suggestions, best first.\n\
             - \"startTime\" must be formatted as \"YYYY-MM-DD HH:mm UTC\".\n\
             - \"reason\" explains why the time works; \"impact\" names who is inconvenienced, if anyone.\n\
             - Output ONLY raw JSON, no prose, markdown, or code fences.\n\
             - The JSON shape must be exactly:\n\
             [{{\"startTime\":\"<YYYY-MM-DD HH:mm UTC>\",\"reason\":\"<string>\",\"impact\":\"<string>\"}}]\n\
             Scheduling request:\n\
             {request}",
            count = suggestion_count(prompt),
            request = prompt
        ),
        _ => return Err(format!("Not a valid base prompt: {}", prompt_type).into()),
    };
    Ok(full_prompt)
}

fn suggestion_count(request: &str) -> u64 {
    serde_json::from_str::<serde_json::Value>(request)
        .ok()
        .and_then(|v| v.get("suggestionCount").and_then(|c| c.as_u64()))
        .unwrap_or(3)
}

pub async fn generate_openai_prompt(
    prompt: &str,
    prompt_type: &str,
    settings: &OpenAISettings,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let full_prompt = build_prompt(prompt, prompt_type)?;
    query_openai(full_prompt, prompt_type, settings).await
}

async fn query_openai(
    prompt: String,
    prompt_type: &str,
    settings: &OpenAISettings,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let system_message = match prompt_type {
        "meeting_suggestions" => {
            "You are a strict JSON scheduling engine. You read a scheduling request and reply ONLY with a JSON array of suggestion objects, with no markdown, no backticks, and no extra text."
        }
        _ => "You are a helpful assistant.",
    };

    let request = OpenAIRequest {
        model: settings.model.clone(),
        messages: vec![
            OpenAIMessage {
                role: "system".to_string(),
                content: system_message.to_string(),
            },
            OpenAIMessage {
                role: "user".to_string(),
                content: prompt,
            },
        ],
        max_tokens: 1500,
        temperature: 0.2,
    };

    let client = reqwest::Client::builder().timeout(settings.timeout).build()?;
    let url = format!("{}/chat/completions", settings.base_url.trim_end_matches('/'));
    debug!(%url, model = %settings.model, prompt_type, "Querying OpenAI");
    let response = client
        .post(url)
        .bearer_auth(&settings.api_key)
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        warn!(status = status.as_u16(), body = %text, "OpenAI request failed");
        return Err(Box::new(GatewayError::Status {
            status: status.as_u16(),
            body: text,
        }));
    }

    let parsed: OpenAIResponse = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse JSON: {}\nRaw body: {}", e, text))?;

    match parsed.choices.into_iter().next().and_then(|c| c.message.content) {
        Some(content) => Ok(content),
        None => {
            warn!(body = %text, "No choices found in response");
            Err(Box::new(GatewayError::EmptyResponse))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meeting_prompt_embeds_request_and_count() {
        let request = r#"{"participants":[],"suggestionCount":5}"#;
        let prompt = build_prompt(request, "meeting_suggestions").unwrap();
        assert!(prompt.contains("Return 5 distinct suggestions"));
        assert!(prompt.contains(request));
        assert!(prompt.contains("YYYY-MM-DD HH:mm UTC"));
    }

    #[test]
    fn unknown_prompt_type_is_rejected() {
        assert!(build_prompt("{}", "notification").is_err());
    }
}
