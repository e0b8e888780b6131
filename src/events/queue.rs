use tokio::sync::mpsc;

use crate::models::participant::Participant;
use crate::models::schedule::DateRange;

#[derive(Debug, Clone)]
pub enum RosterEvent {
    /// A participant or a constraint was added, removed or edited. Carries a
    /// snapshot of the whole roster.
    Changed {
        participants: Vec<Participant>,
        date_range: DateRange,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::Sender<RosterEvent>,
}

impl EventBus {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<RosterEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    pub async fn emit(&self, event: RosterEvent) {
        let _ = self.tx.send(event).await;
    }

    pub async fn roster_changed(&self, participants: Vec<Participant>, date_range: DateRange) {
        self.emit(RosterEvent::Changed {
            participants,
            date_range,
        })
        .await;
    }
}
