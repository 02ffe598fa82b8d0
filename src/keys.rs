use crate::app::App;
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use pickleview_api::RoomCode;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// What a key press asks the event loop to do.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Quit,
    Fetch(RoomCode),
}

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let action = {
        let mut guard = app.lock().await;
        apply_key(&mut guard, key_event)
    };

    match action {
        KeyAction::Quit => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }
        KeyAction::Fetch(code) => {
            let _ = network_requests.send(NetworkRequest::FetchRoom { code }).await;
        }
        KeyAction::None => {}
    }
}

/// While code entry is visible, printable keys type into it and the match
/// controls move to Ctrl-R / Ctrl-S.
pub fn apply_key(app: &mut App, key_event: KeyEvent) -> KeyAction {
    if key_event.kind == KeyEventKind::Release {
        return KeyAction::None;
    }

    if app.state.show_help {
        match (key_event.code, key_event.modifiers) {
            (Char('q'), _) | (Char('c'), KeyModifiers::CONTROL) => return KeyAction::Quit,
            _ => app.exit_help(),
        }
        return KeyAction::None;
    }

    let entry = app.code_entry_active();
    let fetch = |code: Option<RoomCode>| code.map_or(KeyAction::None, KeyAction::Fetch);

    match (entry, key_event.code, key_event.modifiers) {
        (_, Char('c'), KeyModifiers::CONTROL) => KeyAction::Quit,
        (false, Char('q'), _) => KeyAction::Quit,

        (_, Char('?'), _) => {
            app.toggle_help();
            KeyAction::None
        }
        (false, Char('"'), _) | (true, Char('l'), KeyModifiers::CONTROL) => {
            app.toggle_show_logs();
            KeyAction::None
        }

        // Match controls
        (false, Char('r'), _) | (true, Char('r'), KeyModifiers::CONTROL) => fetch(app.refresh()),
        (false, Char('s'), _) | (true, Char('s'), KeyModifiers::CONTROL) => {
            app.switch_match();
            KeyAction::None
        }
        (false, Char('f'), _) => {
            app.toggle_full_screen();
            KeyAction::None
        }

        // Code entry
        (true, KeyCode::Enter, _) => fetch(app.submit_input()),
        (true, KeyCode::Backspace, _) => {
            app.backspace();
            KeyAction::None
        }
        (true, KeyCode::Esc, _) => {
            app.clear_input();
            KeyAction::None
        }
        (true, Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
            app.type_char(c);
            KeyAction::None
        }

        _ => KeyAction::None,
    }
}
