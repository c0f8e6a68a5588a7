use crate::state::messages::UiEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

pub const CLOCK_TICK: Duration = Duration::from_secs(60);

/// Recomputes the card countdowns once a minute. Only asks for a redraw with a
/// fresh "now"; it never triggers a fetch.
pub struct ClockTicker {
    ui_events: mpsc::Sender<UiEvent>,
}

impl ClockTicker {
    pub fn new(ui_events: mpsc::Sender<UiEvent>) -> Self {
        Self { ui_events }
    }

    pub async fn run(self) {
        let mut ticks = interval(CLOCK_TICK);
        // The first tick fires immediately; startup already rendered with the current time.
        ticks.tick().await;

        loop {
            ticks.tick().await;
            if self.ui_events.send(UiEvent::ClockTick).await.is_err() {
                break;
            }
        }
    }
}
