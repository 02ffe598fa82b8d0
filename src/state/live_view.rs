use crate::state::session::{Phase, Session};
use crate::state::view_model::ViewModel;
use chrono::Utc;
use chrono_tz::Tz;
use log::debug;
use pickleview_api::RoomStore;

/// Drives a `Session` against a store. Every operation takes the session by
/// value and hands back the next one.
pub struct LiveView<S> {
    store: S,
    tz: Tz,
}

impl<S: RoomStore> LiveView<S> {
    pub fn new(store: S, tz: Tz) -> Self {
        Self { store, tz }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn submit(&self, mut session: Session, input: &str) -> Session {
        session.submit_code(input);
        session
    }

    pub fn refresh(&self, mut session: Session) -> Session {
        session.request_refresh();
        session
    }

    pub fn switch_match(&self, mut session: Session) -> Session {
        session.switch_match();
        session
    }

    /// Run the pending fetch, if any, and fold its result. A session in
    /// `Displaying` or `Invalid` is first moved back to `Fetching`, so one
    /// call is one poll tick.
    pub async fn poll(&self, mut session: Session) -> Session {
        let code = match (session.phase(), session.code.clone()) {
            (Phase::Fetching, Some(code)) => code,
            _ => match session.begin_poll() {
                Some(code) => code,
                None => return session,
            },
        };
        debug!("polling room {code} from {}", self.store.describe());
        let result = self.store.fetch(&code).await;
        session.apply_fetch(&code, result, Utc::now());
        session
    }

    pub fn view(&self, session: &Session) -> ViewModel {
        ViewModel::from_session(session, &self.tz)
    }
}
