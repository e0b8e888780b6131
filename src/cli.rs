use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use syncZone::config::SchedulerConfig;
use syncZone::events::worker::MIN_PARTICIPANTS;
use syncZone::models::participant::{Participant, Roster};
use syncZone::models::schedule::{DateRange, SlotScore, Suggestion};
use syncZone::runtime::{build_provider, render_suggestions, run_session};
use syncZone::service::classifier::HourClassifier;
use syncZone::service::overlap::OverlapScorer;
use syncZone::service::ranker::SlotRanker;
use syncZone::service::suggestion_gateway::SuggestionProvider;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(about = "Find meeting times that work across timezones")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a 24-hour working/waking/sleeping grid for one day
    Heatmap {
        /// NAME=ZONE[;UNAVAILABILITY], repeatable
        #[arg(short, long = "participant")]
        participants: Vec<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Rank slots locally
    Rank {
        #[arg(short, long = "participant")]
        participants: Vec<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        top: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Ask the reasoning service, falling back to local ranking
    Suggest {
        #[arg(short, long = "participant")]
        participants: Vec<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Edit a roster interactively and watch suggestions update
    Session,
}

pub async fn cli(config: SchedulerConfig, today: NaiveDate) -> Result<(), BoxError> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Heatmap { participants, date } => {
            let roster = build_roster(&config, &participants)?;
            let classifier = HourClassifier::new(config.boundaries)?;
            let grid = OverlapScorer::new(classifier).day_grid(date.unwrap_or(today), roster.participants())?;
            println!("{}", render_heatmap(&grid));
        }
        Commands::Rank {
            participants,
            start,
            end,
            top,
            json,
        } => {
            let roster = build_roster(&config, &participants)?;
            let range = date_range(today, start, end)?;
            let mut options = config.ranking;
            if let Some(top) = top {
                options.top_k = top;
            }
            let ranker = SlotRanker::new(OverlapScorer::new(HourClassifier::new(config.boundaries)?), options);
            let suggestions = ranker.rank(roster.participants(), &range)?;
            print_suggestions(&suggestions, json)?;
        }
        Commands::Suggest {
            participants,
            start,
            end,
            json,
        } => {
            let roster = build_roster(&config, &participants)?;
            let range = date_range(today, start, end)?;
            let suggestions = if roster.len() < MIN_PARTICIPANTS {
                Vec::new()
            } else {
                build_provider(&config)?
                    .fetch_suggestions(roster.participants(), &range)
                    .await
            };
            print_suggestions(&suggestions, json)?;
        }
        Commands::Session => run_session(config, today).await?,
    }
    Ok(())
}

fn build_roster(config: &SchedulerConfig, entries: &[String]) -> Result<Roster, BoxError> {
    let mut roster = Roster::new(&config.local_name, &config.local_timezone)?;
    for entry in entries {
        roster.push(Participant::parse_entry(entry)?)?;
    }
    Ok(roster)
}

fn date_range(today: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<DateRange, BoxError> {
    let start = start.unwrap_or(today);
    Ok(match end {
        Some(end) => DateRange::new(start, end)?,
        None => DateRange::week_from(start),
    })
}

fn print_suggestions(suggestions: &[Suggestion], json: bool) -> Result<(), BoxError> {
    if json {
        println!("{}", serde_json::to_string_pretty(suggestions)?);
    } else {
        println!("{}", render_suggestions(suggestions));
    }
    Ok(())
}

/// One row per participant, one column per UTC hour. Cells read local hour
/// then category symbol; the last row is the slot score as a percentage.
pub fn render_heatmap(grid: &[SlotScore]) -> String {
    let Some(first) = grid.first() else {
        return String::new();
    };
    let width = first
        .participants
        .iter()
        .map(|p| p.participant_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("score".len())
        .max("UTC".len());

    let mut lines = Vec::with_capacity(first.participants.len() + 2);
    let mut header = format!("{:<width$}", "UTC");
    for slot in grid {
        header.push_str(&format!(" {:>3}", format!("{:02}", slot.utc_hour)));
    }
    lines.push(header);

    for (idx, info) in first.participants.iter().enumerate() {
        let mut row = format!("{:<width$}", info.participant_name);
        for slot in grid {
            let cell = slot
                .participants
                .get(idx)
                .map(|p| format!("{:02}{}", p.local_hour, p.category.symbol()))
                .unwrap_or_default();
            row.push_str(&format!(" {:>3}", cell));
        }
        lines.push(row);
    }

    let mut scores = format!("{:<width$}", "score");
    for slot in grid {
        scores.push_str(&format!(" {:>3}", (slot.score * 100.0).round() as u32));
    }
    lines.push(scores);
    lines.join("\n")
}
