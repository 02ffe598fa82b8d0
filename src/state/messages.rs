use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use pickleview_api::{RawRecord, RoomCode, StoreError};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    FetchRoom { code: RoomCode },
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    /// Raw outcome of one fetch. The session decides whether it is still wanted.
    RoomFetched {
        code: RoomCode,
        result: Result<RawRecord, StoreError>,
    },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    PollTick,
}
