use tui::layout::{Constraint, Layout, Rect, Size};

pub const HEADER_HEIGHT: u16 = 3;
pub const CODE_ENTRY_HEIGHT: u16 = 3;
pub const LOG_PANE_PERCENT: u16 = 35;

/// Pre-computed layout areas for the main draw loop.
pub struct LayoutAreas {
    pub header: [Rect; 2],
    pub main: Rect,
    pub logs: Rect,
    pub footer: Rect,
}

impl LayoutAreas {
    pub fn new(size: Size) -> Self {
        let rect = Rect::new(0, 0, size.width, size.height);
        Self::from_rect(rect, false, false)
    }

    pub fn update(&mut self, area: Rect, full_screen: bool, show_logs: bool) {
        *self = Self::from_rect(area, full_screen, show_logs);
    }

    fn from_rect(area: Rect, full_screen: bool, show_logs: bool) -> Self {
        let (header, body, footer) = if full_screen {
            (Rect::ZERO, area, Rect::ZERO)
        } else {
            let [header, body, footer] = Layout::vertical([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .areas(area);
            (header, body, footer)
        };

        let (main, logs) = if show_logs {
            let [main, logs] = Layout::vertical([
                Constraint::Fill(1),
                Constraint::Percentage(LOG_PANE_PERCENT),
            ])
            .areas(body);
            (main, logs)
        } else {
            (body, Rect::ZERO)
        };

        LayoutAreas {
            header: Self::split_header(header),
            main,
            logs,
            footer,
        }
    }

    fn split_header(area: Rect) -> [Rect; 2] {
        Layout::horizontal([Constraint::Percentage(85), Constraint::Percentage(15)]).areas(area)
    }

    /// Code entry box above the match body, when it is shown.
    pub fn split_main(main: Rect, code_entry: bool) -> (Rect, Rect) {
        if !code_entry {
            return (Rect::ZERO, main);
        }
        let [entry, body] =
            Layout::vertical([Constraint::Length(CODE_ENTRY_HEIGHT), Constraint::Fill(1)]).areas(main);
        (entry, body)
    }
}
