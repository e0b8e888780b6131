use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use syncZone::events::queue::EventBus;
use syncZone::events::worker::{run_suggestion_worker, SuggestionUpdate};
use syncZone::models::participant::Participant;
use syncZone::models::schedule::{DateRange, Suggestion};
use syncZone::service::suggestion_gateway::SuggestionProvider;
use tokio::sync::watch;

const DEBOUNCE: Duration = Duration::from_secs(1);

struct RecordingProvider {
    delay: Duration,
    calls: Mutex<Vec<usize>>,
}

#[async_trait::async_trait]
impl SuggestionProvider for RecordingProvider {
    async fn fetch_suggestions(&self, participants: &[Participant], _range: &DateRange) -> Vec<Suggestion> {
        self.calls.lock().unwrap().push(participants.len());
        tokio::time::sleep(self.delay).await;
        vec![Suggestion {
            start_time: "2026-01-15 15:00 UTC".to_string(),
            reason: format!("{} participants", participants.len()),
            impact: "None".to_string(),
        }]
    }
}

fn roster(size: usize) -> Vec<Participant> {
    (0..size)
        .map(|i| Participant::new(&format!("p{i}"), "UTC", None))
        .collect()
}

fn range() -> DateRange {
    DateRange::single(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
}

fn start(
    delay: Duration,
) -> (
    EventBus,
    Arc<RecordingProvider>,
    watch::Receiver<SuggestionUpdate>,
    tokio::task::JoinHandle<()>,
) {
    let provider = Arc::new(RecordingProvider {
        delay,
        calls: Mutex::new(Vec::new()),
    });
    let (bus, rx) = EventBus::new(16);
    let (tx, updates) = watch::channel(SuggestionUpdate::default());
    let handle = tokio::spawn(run_suggestion_worker(rx, provider.clone(), DEBOUNCE, tx));
    (bus, provider, updates, handle)
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_are_coalesced_into_one_fetch() {
    let (bus, provider, mut updates, handle) = start(Duration::ZERO);

    bus.roster_changed(roster(2), range()).await;
    bus.roster_changed(roster(3), range()).await;
    bus.roster_changed(roster(4), range()).await;

    updates.changed().await.unwrap();
    let update = updates.borrow_and_update().clone();
    assert_eq!(update.generation, 3);
    assert_eq!(update.suggestions[0].reason, "4 participants");
    assert_eq!(*provider.calls.lock().unwrap(), vec![4]);

    drop(bus);
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn small_roster_publishes_empty_without_fetching() {
    let (bus, provider, mut updates, _handle) = start(Duration::ZERO);

    bus.roster_changed(roster(1), range()).await;

    updates.changed().await.unwrap();
    let update = updates.borrow_and_update().clone();
    assert_eq!(update.generation, 1);
    assert!(update.suggestions.is_empty());
    assert!(provider.calls.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn edit_during_fetch_discards_the_stale_result() {
    let (bus, provider, mut updates, _handle) = start(Duration::from_secs(10));

    bus.roster_changed(roster(2), range()).await;
    tokio::time::sleep(DEBOUNCE + Duration::from_millis(500)).await;
    assert_eq!(*provider.calls.lock().unwrap(), vec![2]);

    bus.roster_changed(roster(3), range()).await;

    updates.changed().await.unwrap();
    let update = updates.borrow_and_update().clone();
    assert_eq!(update.generation, 2);
    assert_eq!(update.suggestions[0].reason, "3 participants");
    assert_eq!(*provider.calls.lock().unwrap(), vec![2, 3]);
}
