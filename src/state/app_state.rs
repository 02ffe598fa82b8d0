use crate::state::session::Session;

/// Longest code-entry buffer. Anything beyond a few characters is already a
/// rejected code, so further keystrokes are dropped.
pub const MAX_INPUT_LEN: usize = 8;

/// Text typed into the code entry field.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CodeInput {
    buffer: String,
}

impl CodeInput {
    pub fn push(&mut self, c: char) {
        if !c.is_control() && self.buffer.chars().count() < MAX_INPUT_LEN {
            self.buffer.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct AppState {
    pub session: Session,
    pub code_input: CodeInput,
    pub show_logs: bool,
    pub show_help: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
