use crate::state::network::LoadingState;
use crate::state::view_state::RequestToken;
use crossterm::event::KeyEvent;
use seatduty_api::{AssignmentRecord, GameRecord, UserRecord};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Games,
    Assignments,
    Users,
}

impl ScreenKind {
    pub fn label(&self) -> &'static str {
        match self {
            ScreenKind::Games => "games",
            ScreenKind::Assignments => "assignments",
            ScreenKind::Users => "users",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkRequest {
    LoadGames { token: RequestToken },
    LoadAssignments { token: RequestToken },
    LoadUsers { token: RequestToken },
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    GamesLoaded { token: RequestToken, games: Vec<GameRecord> },
    AssignmentsLoaded { token: RequestToken, assignments: Vec<AssignmentRecord> },
    UsersLoaded { token: RequestToken, users: Vec<UserRecord> },
    /// `report` is the JSON shown verbatim on the failed screen.
    Failed { screen: ScreenKind, token: RequestToken, report: Value },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    ClockTick,
}
