use crate::app::MenuItem;
use crate::state::view_state::{Screen, ViewState};
use chrono::{DateTime, Utc};
use seatduty_api::{AssignmentRecord, GameRecord, UserRecord};

#[derive(Debug, Default)]
pub struct ListView<T> {
    pub screen: Screen<Vec<T>>,
    /// Index of the first visible item.
    pub scroll_offset: u16,
}

impl<T> ListView<T> {
    pub fn row_count(&self) -> usize {
        match self.screen.state() {
            ViewState::Success(items) => items.len(),
            _ => 0,
        }
    }

    pub fn scroll_down(&mut self) {
        let max = self.row_count().saturating_sub(1) as u16;
        self.scroll_offset = self.scroll_offset.saturating_add(1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }
}

#[derive(Debug)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    /// Reference instant for every countdown on screen. Moves only on clock ticks
    /// and completed fetches, so redraws in between are stable.
    pub now: DateTime<Utc>,
    pub games: ListView<GameRecord>,
    pub assignments: ListView<AssignmentRecord>,
    pub users: ListView<UserRecord>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl AppState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            active_tab: MenuItem::default(),
            previous_tab: MenuItem::default(),
            show_logs: false,
            now,
            games: ListView::default(),
            assignments: ListView::default(),
            users: ListView::default(),
        }
    }
}
