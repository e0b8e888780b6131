use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::GatewayError;
use crate::models::participant::Participant;
use crate::models::schedule::{parse_start_time, DateRange, Suggestion};
use crate::service::classifier::ClassificationBoundaries;
use crate::service::openai_service::OpenAIClient;
use crate::service::ranker::SlotRanker;

pub const SUGGESTION_PROMPT: &str = "meeting_suggestions";

/// Anything that can turn a roster and a date range into suggestions. Both
/// implementations return the same shape, and neither returns an error.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn fetch_suggestions(&self, participants: &[Participant], range: &DateRange) -> Vec<Suggestion>;
}

/// Suggestions computed on this machine only.
pub struct LocalSuggestions {
    ranker: SlotRanker,
}

impl LocalSuggestions {
    pub fn new(ranker: SlotRanker) -> Self {
        Self { ranker }
    }
}

#[async_trait]
impl SuggestionProvider for LocalSuggestions {
    async fn fetch_suggestions(&self, participants: &[Participant], range: &DateRange) -> Vec<Suggestion> {
        rank_locally(&self.ranker, participants, range)
    }
}

fn rank_locally(ranker: &SlotRanker, participants: &[Participant], range: &DateRange) -> Vec<Suggestion> {
    match ranker.rank(participants, range) {
        Ok(suggestions) => suggestions,
        Err(err) => {
            warn!(error = %err, "Local ranking failed");
            Vec::new()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParticipant {
    pub name: String,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailability: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub participants: Vec<RequestParticipant>,
    pub date_range: DateRange,
    pub thresholds: ClassificationBoundaries,
    pub suggestion_count: usize,
}

/// Asks the external reasoning service first and ranks locally whenever it
/// fails, times out or answers with something unusable.
pub struct SuggestionGateway {
    openai: Arc<dyn OpenAIClient>,
    ranker: SlotRanker,
    timeout: Duration,
}

impl SuggestionGateway {
    pub fn new(openai: Arc<dyn OpenAIClient>, ranker: SlotRanker, timeout: Duration) -> Self {
        Self {
            openai,
            ranker,
            timeout,
        }
    }

    pub fn build_request(&self, participants: &[Participant], range: &DateRange) -> SuggestionRequest {
        SuggestionRequest {
            participants: participants
                .iter()
                .map(|p| RequestParticipant {
                    name: p.name.clone(),
                    timezone: p.timezone.clone(),
                    unavailability: p.unavailability.clone(),
                })
                .collect(),
            date_range: *range,
            thresholds: *self.ranker.scorer().classifier().boundaries(),
            suggestion_count: self.ranker.options().top_k,
        }
    }

    pub async fn fetch_remote(
        &self,
        participants: &[Participant],
        range: &DateRange,
    ) -> Result<Vec<Suggestion>, GatewayError> {
        let request = serde_json::to_string(&self.build_request(participants, range))
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        let payload = tokio::time::timeout(
            self.timeout,
            self.openai.generate_prompt(&request, SUGGESTION_PROMPT),
        )
        .await
        .map_err(|_| GatewayError::Timeout(self.timeout.as_secs()))?
        .map_err(classify_client_error)?;

        parse_suggestions(&payload)
    }
}

#[async_trait]
impl SuggestionProvider for SuggestionGateway {
    async fn fetch_suggestions(&self, participants: &[Participant], range: &DateRange) -> Vec<Suggestion> {
        match self.fetch_remote(participants, range).await {
            Ok(suggestions) => {
                info!(count = suggestions.len(), "Using suggestions from reasoning service");
                suggestions
            }
            Err(err) => {
                warn!(error = %err, "Reasoning service unavailable, ranking locally");
                rank_locally(&self.ranker, participants, range)
            }
        }
    }
}

fn classify_client_error(err: Box<dyn std::error::Error + Send + Sync>) -> GatewayError {
    let err = match err.downcast::<GatewayError>() {
        Ok(gateway) => return *gateway,
        Err(other) => other,
    };
    match err.downcast::<reqwest::Error>() {
        Ok(transport) => GatewayError::Transport(*transport),
        Err(other) => GatewayError::Client(other.to_string()),
    }
}

fn strip_code_fence(payload: &str) -> &str {
    let trimmed = payload.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Every element must carry `startTime`, `reason` and `impact`, and every
/// `startTime` must read as a UTC time. One bad element rejects the lot.
pub fn parse_suggestions(payload: &str) -> Result<Vec<Suggestion>, GatewayError> {
    let body = strip_code_fence(payload);
    if body.is_empty() {
        return Err(GatewayError::EmptyResponse);
    }
    let suggestions: Vec<Suggestion> =
        serde_json::from_str(body).map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
    for suggestion in &suggestions {
        parse_start_time(&suggestion.start_time)
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
    }
    Ok(suggestions)
}
