use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use crate::state::view_model::ViewModel;
use chrono::Utc;
use pickleview_api::{RawRecord, RoomCode, StoreError};

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        Self { state: AppState::new(), settings }
    }

    pub fn view(&self) -> ViewModel {
        ViewModel::from_session(&self.state.session, &self.settings.timezone)
    }

    /// Code entry is shown while there is nothing to display for a good code.
    pub fn code_entry_active(&self) -> bool {
        self.view().controls.code_entry
    }

    // -----------------------------------------------------------------------
    // Session transitions. Each returns the code to fetch, if any.
    // -----------------------------------------------------------------------

    /// Submit the `--code` given on the command line, if there was one.
    pub fn on_app_started(&mut self) -> Option<RoomCode> {
        let code = self.settings.initial_code.clone()?;
        self.state.session.submit_code(&code)
    }

    pub fn submit_input(&mut self) -> Option<RoomCode> {
        let code = self.state.session.submit_code(self.state.code_input.as_str());
        if self.state.session.input_error.is_none() {
            self.state.code_input.clear();
        }
        code
    }

    pub fn on_poll_tick(&mut self) -> Option<RoomCode> {
        self.state.session.begin_poll()
    }

    pub fn refresh(&mut self) -> Option<RoomCode> {
        self.state.session.request_refresh()
    }

    pub fn switch_match(&mut self) {
        self.state.session.switch_match();
        self.state.code_input.clear();
    }

    pub fn on_room_fetched(&mut self, code: RoomCode, result: Result<RawRecord, StoreError>) -> bool {
        self.state.session.apply_fetch(&code, result, Utc::now())
    }

    // -----------------------------------------------------------------------
    // Code entry
    // -----------------------------------------------------------------------

    pub fn type_char(&mut self, c: char) {
        self.state.code_input.push(c);
    }

    pub fn backspace(&mut self) {
        self.state.code_input.backspace();
    }

    pub fn clear_input(&mut self) {
        self.state.code_input.clear();
        self.state.session.input_error = None;
    }

    // -----------------------------------------------------------------------
    // Panes
    // -----------------------------------------------------------------------

    pub fn toggle_help(&mut self) {
        self.state.show_help = !self.state.show_help;
    }

    pub fn exit_help(&mut self) {
        self.state.show_help = false;
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }
}
