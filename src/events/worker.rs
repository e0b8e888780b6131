use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::events::queue::RosterEvent;
use crate::models::participant::Participant;
use crate::models::schedule::{DateRange, Suggestion};
use crate::service::suggestion_gateway::SuggestionProvider;

/// Suggestions are only fetched for rosters at least this large.
pub const MIN_PARTICIPANTS: usize = 2;

/// Latest published suggestions. `generation` counts the roster events seen
/// so far; a consumer holding an older generation is looking at stale data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionUpdate {
    pub generation: u64,
    pub suggestions: Vec<Suggestion>,
}

struct Snapshot {
    participants: Vec<Participant>,
    date_range: DateRange,
}

impl From<RosterEvent> for Snapshot {
    fn from(event: RosterEvent) -> Self {
        match event {
            RosterEvent::Changed {
                participants,
                date_range,
            } => Snapshot {
                participants,
                date_range,
            },
        }
    }
}

/// Waits for the roster to settle for `debounce`, then fetches suggestions.
/// A roster event that arrives while a fetch is in flight drops that fetch
/// and starts over with the newer snapshot.
pub async fn run_suggestion_worker(
    mut rx: mpsc::Receiver<RosterEvent>,
    provider: Arc<dyn SuggestionProvider>,
    debounce: Duration,
    updates: watch::Sender<SuggestionUpdate>,
) {
    let mut generation: u64 = 0;
    let mut closed = false;
    let mut pending: Option<Snapshot> = None;

    loop {
        let mut snapshot = match pending.take() {
            Some(snapshot) => snapshot,
            None if closed => break,
            None => match rx.recv().await {
                Some(event) => {
                    generation += 1;
                    Snapshot::from(event)
                }
                None => break,
            },
        };

        while !closed {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(event) => {
                        generation += 1;
                        snapshot = Snapshot::from(event);
                    }
                    None => closed = true,
                },
                _ = sleep(debounce) => break,
            }
        }

        if snapshot.participants.len() < MIN_PARTICIPANTS {
            debug!(generation, "Roster too small for suggestions");
            updates.send_replace(SuggestionUpdate {
                generation,
                suggestions: Vec::new(),
            });
            continue;
        }

        let fetched = {
            let fetch = provider.fetch_suggestions(&snapshot.participants, &snapshot.date_range);
            tokio::pin!(fetch);
            loop {
                tokio::select! {
                    suggestions = &mut fetch => break Some(suggestions),
                    next = rx.recv(), if !closed => match next {
                        Some(event) => {
                            generation += 1;
                            pending = Some(Snapshot::from(event));
                            break None;
                        }
                        None => closed = true,
                    },
                }
            }
        };

        match fetched {
            Some(suggestions) => {
                info!(generation, count = suggestions.len(), "Publishing suggestions");
                updates.send_replace(SuggestionUpdate {
                    generation,
                    suggestions,
                });
            }
            None => debug!(generation, "Roster changed mid-fetch, discarding in-flight request"),
        }
    }
}
