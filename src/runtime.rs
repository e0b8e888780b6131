use std::sync::Arc;

use chrono::NaiveDate;
use inquire::{Select, Text};
use tokio::sync::watch;
use tracing::info;

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::events::queue::EventBus;
use crate::events::worker::{run_suggestion_worker, SuggestionUpdate};
use crate::models::participant::{Roster, COMMON_TIMEZONES};
use crate::models::schedule::{DateRange, Suggestion};
use crate::service::openai_service::OpenAIService;
use crate::service::suggestion_gateway::{LocalSuggestions, SuggestionGateway, SuggestionProvider};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The reasoning service when an API key is configured, local ranking
/// otherwise.
pub fn build_provider(config: &SchedulerConfig) -> Result<Arc<dyn SuggestionProvider>> {
    let ranker = config.ranker()?;
    Ok(match &config.openai {
        Some(settings) => {
            info!(model = %settings.model, "Suggestions backed by reasoning service");
            Arc::new(SuggestionGateway::new(
                Arc::new(OpenAIService::new(settings.clone())),
                ranker,
                config.gateway_timeout,
            ))
        }
        None => {
            info!("No OPENAI_API_KEY configured, suggestions are computed locally");
            Arc::new(LocalSuggestions::new(ranker))
        }
    })
}

pub fn render_suggestions(suggestions: &[Suggestion]) -> String {
    if suggestions.is_empty() {
        return "Could not find a good slot within the current constraints.".to_string();
    }
    let mut body = String::new();
    for (idx, s) in suggestions.iter().enumerate() {
        body.push_str(&format!("{}) {}\n   {}\n   {}\n", idx + 1, s.start_time, s.reason, s.impact));
    }
    body.trim_end().to_string()
}

const ADD: &str = "Add participant";
const REMOVE: &str = "Remove participant";
const EDIT: &str = "Edit unavailability";
const SHOW: &str = "Show roster";
const QUIT: &str = "Quit";

async fn ask<T, F>(prompt: F) -> std::result::Result<T, BoxError>
where
    T: Send + 'static,
    F: FnOnce() -> std::result::Result<T, inquire::InquireError> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(prompt).await??)
}

/// Interactive roster editing. Every edit is sent through the debounced
/// suggestion worker and the latest suggestions are printed as they land.
pub async fn run_session(config: SchedulerConfig, today: NaiveDate) -> std::result::Result<(), BoxError> {
    let provider = build_provider(&config)?;
    let mut roster = Roster::new(&config.local_name, &config.local_timezone)?;
    let range = DateRange::week_from(today);

    let (bus, rx) = EventBus::new(32);
    let (updates_tx, mut updates_rx) = watch::channel(SuggestionUpdate::default());
    let worker = tokio::spawn(run_suggestion_worker(rx, provider, config.debounce, updates_tx));
    let printer = tokio::spawn(async move {
        while updates_rx.changed().await.is_ok() {
            let update = updates_rx.borrow_and_update().clone();
            println!("\nSuggestions for {}..{}:\n{}\n", range.start_date(), range.end_date(), render_suggestions(&update.suggestions));
        }
    });

    println!("Searching {} to {}", range.start_date(), range.end_date());
    loop {
        let choice = ask(|| Select::new("What next?", vec![ADD, REMOVE, EDIT, SHOW, QUIT]).prompt()).await?;
        match choice {
            ADD => {
                let name = ask(|| Text::new("Name").prompt()).await?;
                if name.trim().is_empty() {
                    continue;
                }
                let zones: Vec<&str> = COMMON_TIMEZONES.to_vec();
                let zone = ask(move || Select::new("Timezone", zones).prompt()).await?;
                let constraint = ask(|| {
                    Text::new("Unavailability (e.g. No Fridays, Busy after 4pm)").prompt()
                })
                .await?;
                if let Err(err) = roster.add(&name, zone, Some(constraint.as_str())) {
                    println!("{}", err);
                    continue;
                }
            }
            REMOVE | EDIT => {
                let labels: Vec<String> = roster
                    .participants()
                    .iter()
                    .map(|p| format!("{} ({}) [{}]", p.name, p.timezone, p.id))
                    .collect();
                let picked = ask(move || Select::new("Participant", labels).prompt()).await?;
                let Some(id) = picked
                    .rsplit_once('[')
                    .and_then(|(_, rest)| rest.strip_suffix(']'))
                    .map(str::to_string)
                else {
                    continue;
                };
                let outcome = if choice == REMOVE {
                    roster.remove(&id).map(|_| ())
                } else {
                    let text = ask(|| Text::new("Unavailability").prompt()).await?;
                    roster.set_unavailability(&id, Some(text.as_str()))
                };
                if let Err(err) = outcome {
                    println!("{}", err);
                    continue;
                }
            }
            SHOW => {
                for p in roster.participants() {
                    let marker = if p.is_me { " (you)" } else { "" };
                    let note = p.unavailability.as_deref().unwrap_or("-");
                    println!("{}{} {} {}", p.name, marker, p.timezone, note);
                }
                continue;
            }
            _ => break,
        }
        bus.roster_changed(roster.snapshot(), range).await;
    }

    drop(bus);
    let _ = worker.await;
    printer.abort();
    Ok(())
}
