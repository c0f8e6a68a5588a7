use log::debug;
use serde_json::Value;

/// Identifies one fetch issued by a [`Screen`]. Only the most recent token of
/// a screen may change its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// The latest fetch outcome of a screen. Each fetch replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Success(T),
    /// The error JSON, rendered verbatim.
    Failure(Value),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Idle
    }
}

#[derive(Debug)]
pub struct Screen<T> {
    state: ViewState<T>,
    issued: u64,
    mounted: bool,
}

impl<T> Default for Screen<T> {
    fn default() -> Self {
        Self { state: ViewState::Idle, issued: 0, mounted: false }
    }
}

impl<T> Screen<T> {
    pub fn state(&self) -> &ViewState<T> {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ViewState::Loading)
    }

    /// Enter Loading (dropping any previous payload or error) and hand out a
    /// fresh token for the fetch about to be sent.
    pub fn start(&mut self) -> RequestToken {
        self.issued += 1;
        self.mounted = true;
        self.state = ViewState::Loading;
        RequestToken(self.issued)
    }

    /// First activation of the screen starts a fetch; later ones do nothing.
    pub fn mount(&mut self) -> Option<RequestToken> {
        if self.mounted { None } else { Some(self.start()) }
    }

    /// Returns false when `token` was superseded and the payload was dropped.
    pub fn on_success(&mut self, token: RequestToken, payload: T) -> bool {
        if !self.is_current(token) {
            debug!("dropping stale result for request {token:?}");
            return false;
        }
        self.state = ViewState::Success(payload);
        true
    }

    pub fn on_failure(&mut self, token: RequestToken, error: Value) -> bool {
        if !self.is_current(token) {
            debug!("dropping stale failure for request {token:?}");
            return false;
        }
        self.state = ViewState::Failure(error);
        true
    }

    fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_moves_to_loading_and_clears_error() {
        let mut screen: Screen<Vec<u32>> = Screen::default();
        let t = screen.start();
        assert!(screen.on_failure(t, json!({ "error": "boom" })));
        assert!(matches!(screen.state(), ViewState::Failure(_)));

        screen.start();
        assert!(screen.is_loading());
    }

    #[test]
    fn success_replaces_state_wholesale() {
        let mut screen = Screen::default();
        let t = screen.start();
        assert!(screen.on_success(t, vec![1, 2]));
        let t = screen.start();
        assert!(screen.on_success(t, vec![3]));
        assert_eq!(screen.state(), &ViewState::Success(vec![3]));
    }

    #[test]
    fn mount_fires_once() {
        let mut screen: Screen<()> = Screen::default();
        assert!(screen.mount().is_some());
        assert!(screen.mount().is_none());
        assert!(screen.is_loading());
    }

    #[test]
    fn refresh_before_mount_counts_as_mounted() {
        let mut screen: Screen<()> = Screen::default();
        screen.start();
        assert!(screen.mount().is_none());
    }

    #[test]
    fn stale_response_resolving_last_is_discarded() {
        let mut screen = Screen::default();
        let first = screen.start();
        let second = screen.start();

        assert!(screen.on_success(second, "fresh"));
        assert!(!screen.on_success(first, "stale"));
        assert_eq!(screen.state(), &ViewState::Success("fresh"));
    }

    #[test]
    fn stale_failure_does_not_mask_pending_request() {
        let mut screen: Screen<&str> = Screen::default();
        let first = screen.start();
        let _second = screen.start();

        assert!(!screen.on_failure(first, json!({ "error": "timeout" })));
        assert!(screen.is_loading());
    }

    #[test]
    fn proxy_envelope_is_kept_verbatim() {
        let mut screen: Screen<Vec<u8>> = Screen::default();
        let t = screen.start();
        let envelope = json!({
            "error": "Failed to fetch from n8n",
            "status": 503,
            "statusText": "Service Unavailable",
            "details": "overloaded",
        });
        screen.on_failure(t, envelope.clone());
        assert_eq!(screen.state(), &ViewState::Failure(envelope));
    }
}
