use crate::state::messages::{NetworkRequest, NetworkResponse, ScreenKind};
use crate::state::view_state::RequestToken;
use log::{debug, error, warn};
use seatduty_api::client::{ApiError, SeatDutyApi};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

/// Runs proxy fetches off the UI task. Every request gets its own task so a
/// refresh never waits behind a slow fetch for another screen.
pub struct NetworkWorker {
    client: SeatDutyApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    activity: Arc<Activity>,
}

impl NetworkWorker {
    pub fn new(
        api_url: &str,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client: SeatDutyApi::new(api_url),
            requests,
            responses,
            activity: Arc::default(),
        }
    }

    pub async fn run(mut self) {
        debug!("network worker using {}", self.client.base_url());
        while let Some(request) = self.requests.recv().await {
            start_loading_animation(&self.activity, &self.responses).await;

            let client = self.client.clone();
            let responses = self.responses.clone();
            let activity = self.activity.clone();
            tokio::spawn(async move {
                let response = execute(&client, request).await;
                let is_ok = !matches!(response, NetworkResponse::Failed { .. });
                stop_loading_animation(&activity, &responses, is_ok).await;

                if let Err(e) = responses.send(response).await {
                    error!("Failed to send network response: {e}");
                }
            });
        }
    }
}

async fn execute(client: &SeatDutyApi, request: NetworkRequest) -> NetworkResponse {
    match request {
        NetworkRequest::LoadGames { token } => {
            debug!("loading games ({token:?})");
            match client.fetch_games().await {
                Ok(games) => NetworkResponse::GamesLoaded { token, games },
                Err(e) => failed(ScreenKind::Games, token, e),
            }
        }
        NetworkRequest::LoadAssignments { token } => {
            debug!("loading assignments ({token:?})");
            match client.fetch_assignments().await {
                Ok(assignments) => NetworkResponse::AssignmentsLoaded { token, assignments },
                Err(e) => failed(ScreenKind::Assignments, token, e),
            }
        }
        NetworkRequest::LoadUsers { token } => {
            debug!("loading users ({token:?})");
            match client.fetch_users().await {
                Ok(users) => NetworkResponse::UsersLoaded { token, users },
                Err(e) => failed(ScreenKind::Users, token, e),
            }
        }
    }
}

fn failed(screen: ScreenKind, token: RequestToken, err: ApiError) -> NetworkResponse {
    warn!("failed to load {}: {err}", screen.label());
    NetworkResponse::Failed { screen, token, report: err.report() }
}

/// Fetches in flight, plus whether a spinner loop is currently running.
#[derive(Debug, Default)]
struct Activity {
    in_flight: AtomicUsize,
    spinning: AtomicBool,
}

/// The spinner runs while at least one fetch is in flight.
async fn start_loading_animation(activity: &Arc<Activity>, responses: &mpsc::Sender<NetworkResponse>) {
    if activity.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
        return;
    }

    let mut loading_state = LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
    let _ = responses
        .send(NetworkResponse::LoadingStateChanged { loading_state })
        .await;

    // A loop that has not noticed the idle gap yet keeps spinning for us.
    if activity
        .spinning
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return;
    }

    let responses = responses.clone();
    let activity = activity.clone();

    tokio::spawn(async move {
        let mut spinner_index = 1;
        let mut interval = tokio::time::interval(Duration::from_millis(33));
        loop {
            interval.tick().await;
            if activity.in_flight.load(Ordering::SeqCst) == 0 {
                activity.spinning.store(false, Ordering::SeqCst);
                // A fetch may have started between the check and the store.
                let restarted = activity.in_flight.load(Ordering::SeqCst) > 0
                    && activity
                        .spinning
                        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                        .is_ok();
                if !restarted {
                    break;
                }
            }
            loading_state.spinner_char = SPINNER_CHARS[spinner_index];
            spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
            let _ = responses
                .send(NetworkResponse::LoadingStateChanged { loading_state })
                .await;
        }
    });
}

async fn stop_loading_animation(
    activity: &Arc<Activity>,
    responses: &mpsc::Sender<NetworkResponse>,
    is_ok: bool,
) {
    if activity.in_flight.fetch_sub(1, Ordering::SeqCst) > 1 {
        return;
    }
    tokio::time::sleep(Duration::from_millis(15)).await;
    if activity.in_flight.load(Ordering::SeqCst) > 0 {
        return;
    }

    let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
    let _ = responses
        .send(NetworkResponse::LoadingStateChanged {
            loading_state: LoadingState { is_loading: false, spinner_char },
        })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::view_state::Screen;

    async fn next_payload(rx: &mut mpsc::Receiver<NetworkResponse>) -> NetworkResponse {
        loop {
            match rx.recv().await {
                Some(NetworkResponse::LoadingStateChanged { .. }) => continue,
                Some(other) => return other,
                None => panic!("worker channel closed"),
            }
        }
    }

    #[tokio::test]
    async fn failed_fetch_carries_proxy_envelope() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/users")
            .with_status(500)
            .with_body(r#"{"error":"Failed to fetch users","name":"TimeoutError"}"#)
            .create_async()
            .await;

        let (req_tx, req_rx) = mpsc::channel(4);
        let (resp_tx, mut resp_rx) = mpsc::channel(64);
        tokio::spawn(NetworkWorker::new(&server.url(), req_rx, resp_tx).run());

        let token = Screen::<()>::default().start();
        req_tx.send(NetworkRequest::LoadUsers { token }).await.unwrap();

        match next_payload(&mut resp_rx).await {
            NetworkResponse::Failed { screen, token: got, report } => {
                assert_eq!(screen, ScreenKind::Users);
                assert_eq!(got, token);
                assert_eq!(report["name"], "TimeoutError");
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn loaded_games_keep_their_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/assignments")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let (req_tx, req_rx) = mpsc::channel(4);
        let (resp_tx, mut resp_rx) = mpsc::channel(64);
        tokio::spawn(NetworkWorker::new(&server.url(), req_rx, resp_tx).run());

        let token = Screen::<()>::default().start();
        req_tx.send(NetworkRequest::LoadGames { token }).await.unwrap();

        match next_payload(&mut resp_rx).await {
            NetworkResponse::GamesLoaded { token: got, games } => {
                assert_eq!(got, token);
                assert!(games.is_empty());
            }
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_started_during_idle_gap_keeps_loading() {
        let activity = Arc::new(Activity::default());
        let (tx, mut rx) = mpsc::channel(64);

        start_loading_animation(&activity, &tx).await;
        let stop = stop_loading_animation(&activity, &tx, true);
        let restart = async {
            tokio::task::yield_now().await;
            start_loading_animation(&activity, &tx).await;
        };
        tokio::join!(stop, restart);

        assert_eq!(activity.in_flight.load(Ordering::SeqCst), 1);
        while let Ok(response) = rx.try_recv() {
            if let NetworkResponse::LoadingStateChanged { loading_state } = response {
                assert!(loading_state.is_loading, "spinner stopped with a fetch in flight");
            }
        }
    }

    #[tokio::test]
    async fn last_fetch_finishing_stops_spinner() {
        let activity = Arc::new(Activity::default());
        let (tx, mut rx) = mpsc::channel(64);

        start_loading_animation(&activity, &tx).await;
        stop_loading_animation(&activity, &tx, false).await;

        let mut last = None;
        while let Ok(NetworkResponse::LoadingStateChanged { loading_state }) = rx.try_recv() {
            last = Some(loading_state);
        }
        let last = last.unwrap();
        assert!(!last.is_loading);
        assert_eq!(last.spinner_char, ERROR_CHAR);
    }
}
