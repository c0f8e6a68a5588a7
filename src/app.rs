use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use crate::state::messages::{NetworkRequest, ScreenKind};
use crate::state::view_state::RequestToken;
use chrono::{DateTime, Utc};
use seatduty_api::{AssignmentRecord, GameRecord, UserRecord};
use serde_json::Value;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Games,
    Assignments,
    Users,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new() -> Self {
        Self::with_settings(AppSettings::load(), Utc::now())
    }

    pub fn with_settings(settings: AppSettings, now: DateTime<Utc>) -> Self {
        let app = Self { state: AppState::new(now), settings };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_games_loaded(&mut self, token: RequestToken, games: Vec<GameRecord>, now: DateTime<Utc>) {
        if self.state.games.screen.on_success(token, games) {
            self.state.games.scroll_offset = 0;
            self.state.now = now;
        }
    }

    pub fn on_assignments_loaded(
        &mut self,
        token: RequestToken,
        assignments: Vec<AssignmentRecord>,
        now: DateTime<Utc>,
    ) {
        if self.state.assignments.screen.on_success(token, assignments) {
            self.state.assignments.scroll_offset = 0;
            self.state.now = now;
        }
    }

    pub fn on_users_loaded(&mut self, token: RequestToken, users: Vec<UserRecord>, now: DateTime<Utc>) {
        if self.state.users.screen.on_success(token, users) {
            self.state.users.scroll_offset = 0;
            self.state.now = now;
        }
    }

    pub fn on_load_failed(&mut self, screen: ScreenKind, token: RequestToken, report: Value) {
        let _ = match screen {
            ScreenKind::Games => self.state.games.screen.on_failure(token, report),
            ScreenKind::Assignments => self.state.assignments.screen.on_failure(token, report),
            ScreenKind::Users => self.state.users.screen.on_failure(token, report),
        };
    }

    pub fn on_clock_tick(&mut self, now: DateTime<Utc>) {
        self.state.now = now;
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    /// Switches tabs. The first visit to a screen returns the fetch that mounts it.
    pub fn update_tab(&mut self, next: MenuItem) -> Option<NetworkRequest> {
        if self.state.active_tab == next {
            return None;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        self.mount_active()
    }

    /// Fetch for the active screen if it has never been loaded.
    pub fn mount_active(&mut self) -> Option<NetworkRequest> {
        match self.state.active_tab {
            MenuItem::Games => self
                .state
                .games
                .screen
                .mount()
                .map(|token| NetworkRequest::LoadGames { token }),
            MenuItem::Assignments => self
                .state
                .assignments
                .screen
                .mount()
                .map(|token| NetworkRequest::LoadAssignments { token }),
            MenuItem::Users => self
                .state
                .users
                .screen
                .mount()
                .map(|token| NetworkRequest::LoadUsers { token }),
            MenuItem::Help => None,
        }
    }

    /// Explicit refresh of the active screen. Supersedes any fetch in flight.
    pub fn refresh_active(&mut self) -> Option<NetworkRequest> {
        match self.state.active_tab {
            MenuItem::Games => Some(NetworkRequest::LoadGames { token: self.state.games.screen.start() }),
            MenuItem::Assignments => Some(NetworkRequest::LoadAssignments {
                token: self.state.assignments.screen.start(),
            }),
            MenuItem::Users => Some(NetworkRequest::LoadUsers { token: self.state.users.screen.start() }),
            MenuItem::Help => None,
        }
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn scroll_down(&mut self) {
        match self.state.active_tab {
            MenuItem::Games => self.state.games.scroll_down(),
            MenuItem::Assignments => self.state.assignments.scroll_down(),
            MenuItem::Users => self.state.users.scroll_down(),
            MenuItem::Help => {}
        }
    }

    pub fn scroll_up(&mut self) {
        match self.state.active_tab {
            MenuItem::Games => self.state.games.scroll_up(),
            MenuItem::Assignments => self.state.assignments.scroll_up(),
            MenuItem::Users => self.state.users.scroll_up(),
            MenuItem::Help => {}
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::view_state::ViewState;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn app() -> App {
        App::with_settings(
            AppSettings::default(),
            Utc.with_ymd_and_hms(2025, 8, 20, 12, 0, 0).unwrap(),
        )
    }

    fn token_of(request: Option<NetworkRequest>) -> RequestToken {
        match request {
            Some(NetworkRequest::LoadGames { token })
            | Some(NetworkRequest::LoadAssignments { token })
            | Some(NetworkRequest::LoadUsers { token }) => token,
            None => panic!("expected a request"),
        }
    }

    #[test]
    fn visiting_a_tab_mounts_it_once() {
        let mut app = app();
        let first = app.update_tab(MenuItem::Users);
        assert!(matches!(first, Some(NetworkRequest::LoadUsers { .. })));
        assert!(app.state.users.screen.is_loading());

        app.update_tab(MenuItem::Games);
        assert!(app.update_tab(MenuItem::Users).is_none());
    }

    #[test]
    fn help_never_fetches() {
        let mut app = app();
        assert!(app.update_tab(MenuItem::Help).is_none());
        assert!(app.refresh_active().is_none());
        app.exit_help();
        assert_eq!(app.state.active_tab, MenuItem::Games);
    }

    #[test]
    fn refresh_supersedes_pending_fetch() {
        let mut app = app();
        let stale = token_of(app.mount_active());
        let fresh = token_of(app.refresh_active());
        let now = app.state.now + Duration::minutes(1);

        app.on_games_loaded(fresh, vec![GameRecord::default()], now);
        app.on_games_loaded(stale, vec![], now);

        match app.state.games.screen.state() {
            ViewState::Success(games) => assert_eq!(games.len(), 1),
            other => panic!("unexpected state {other:?}"),
        }
        assert_eq!(app.state.now, now);
    }

    #[test]
    fn failure_lands_on_the_right_screen() {
        let mut app = app();
        app.update_tab(MenuItem::Assignments);
        let token = token_of(app.refresh_active());
        app.on_load_failed(ScreenKind::Assignments, token, json!({ "error": "Failed to fetch assignments" }));

        assert!(matches!(app.state.assignments.screen.state(), ViewState::Failure(_)));
        assert!(matches!(app.state.games.screen.state(), ViewState::Idle));
    }

    #[test]
    fn scrolling_is_bounded_by_loaded_rows() {
        let mut app = app();
        let token = token_of(app.mount_active());
        app.on_games_loaded(token, vec![GameRecord::default(); 2], app.state.now);

        app.scroll_down();
        app.scroll_down();
        app.scroll_down();
        assert_eq!(app.state.games.scroll_offset, 1);
        app.scroll_up();
        app.scroll_up();
        assert_eq!(app.state.games.scroll_offset, 0);
    }

    #[test]
    fn clock_tick_only_moves_now() {
        let mut app = app();
        let later = app.state.now + Duration::minutes(1);
        app.on_clock_tick(later);
        assert_eq!(app.state.now, later);
        assert!(matches!(app.state.games.screen.state(), ViewState::Idle));
    }
}
