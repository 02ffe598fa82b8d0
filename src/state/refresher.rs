use crate::state::messages::UiEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Emits a `PollTick` every poll interval. Whether a tick starts a fetch is
/// up to the session: no code or a fetch in flight means the tick is ignored.
pub struct PeriodicRefresher {
    ui_events: mpsc::Sender<UiEvent>,
    period: Duration,
}

impl PeriodicRefresher {
    pub fn new(ui_events: mpsc::Sender<UiEvent>, period: Duration) -> Self {
        Self { ui_events, period }
    }

    pub async fn run(self) {
        let mut poll_interval = interval(self.period);
        // Skip the immediate first tick; code entry already starts a fetch.
        poll_interval.tick().await;

        loop {
            poll_interval.tick().await;
            if self.ui_events.send(UiEvent::PollTick).await.is_err() {
                break;
            }
        }
    }
}
