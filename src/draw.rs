use log::error;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::App;
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::state::session::Phase;
use crate::state::view_model::ViewModel;
use crate::ui::layout::LayoutAreas;

const HELP_LINES: &[(&str, &str)] = &[
    ("Enter", "watch the typed match code"),
    ("Esc", "clear the code entry"),
    ("r", "refresh now (Ctrl-R while entering a code)"),
    ("s", "switch match (Ctrl-S while entering a code)"),
    ("f", "toggle full screen"),
    ("\"", "toggle logs (Ctrl-L while entering a code)"),
    ("?", "toggle this help"),
    ("q", "quit (Ctrl-C anywhere)"),
];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);
    let view = app.view();

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_header(f, layout.header, &view);
            draw_footer(f, layout.footer, &view);
        }

        let (entry, body) = LayoutAreas::split_main(layout.main, view.controls.code_entry);
        if view.controls.code_entry {
            draw_code_entry(f, entry, app, &view);
        }
        draw_match(f, body, &view);

        if app.state.show_logs {
            draw_logs(f, layout.logs);
        }
        if app.state.show_help {
            draw_help(f, f.area());
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = result {
        error!("failed to draw frame: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_header(f: &mut Frame, header: [Rect; 2], view: &ViewModel) {
    let mut spans = vec![Span::styled(
        " pickleview ",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )];
    if let Some(code) = &view.room_code {
        spans.push(Span::styled("  match ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(code.as_str(), Style::default().fg(Color::White)));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(default_border(Color::White)),
        header[0],
    );

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(default_border(Color::White));
    f.render_widget(help, header[1]);
}

fn draw_footer(f: &mut Frame, area: Rect, view: &ViewModel) {
    let mut keys = Vec::new();
    if view.controls.code_entry {
        keys.push("Enter=watch");
    }
    match (view.controls.code_entry, view.controls.refresh) {
        (false, true) => keys.extend(["r=refresh", "s=switch match"]),
        (true, true) => keys.extend(["^R=refresh", "^S=switch match"]),
        _ => {}
    }
    keys.push(if view.controls.code_entry { "^L=logs" } else { "\"=logs" });
    keys.push("?=help");
    keys.push(if view.controls.code_entry { "^C=quit" } else { "q=quit" });

    f.render_widget(
        Paragraph::new(format!(" {}", keys.join("  "))).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn draw_code_entry(f: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
    let invalid = app.state.session.error.is_some() || app.state.session.input_error.is_some();
    let color = if invalid { Color::Red } else { Color::Yellow };
    let block = default_border(color).title(" Match code ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let input = app.state.code_input.as_str();
    let mut spans = vec![
        Span::styled("> ", Style::default().fg(Color::DarkGray)),
        Span::styled(input, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::styled("_", Style::default().fg(Color::Yellow).add_modifier(Modifier::SLOW_BLINK)),
    ];
    if let Some(message) = &view.message {
        let style = if invalid {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::raw("   "));
        spans.push(Span::styled(message.as_str(), style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn draw_match(f: &mut Frame, area: Rect, view: &ViewModel) {
    let (Some(group), Some(round)) = (&view.group_name, &view.round) else {
        let msg = match (&view.phase, &view.room_code) {
            (Phase::Fetching, Some(code)) => format!("Loading match {code}..."),
            _ => String::new(),
        };
        draw_placeholder(f, area, &msg);
        return;
    };

    let (border, text) = if view.stale {
        (Color::DarkGray, Style::default().fg(Color::DarkGray))
    } else {
        (Color::Green, Style::default().fg(Color::White))
    };
    let title = if view.stale {
        format!(" {group} - Round {round} (last known) ")
    } else {
        format!(" {group} - Round {round} ")
    };
    let block = default_border(border).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let [courts_area, footer_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(3)]).areas(inner);

    let label = Style::default().fg(Color::Gray);
    let mut lines = Vec::with_capacity(view.courts.len() + 1);
    if view.courts.is_empty() {
        lines.push(Line::from(Span::styled("No courts yet", label)));
    }
    for court in &view.courts {
        let style = match court.text {
            Some(_) => text,
            None => Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("Court {}: ", court.number), label),
            Span::styled(court.display().to_string(), style),
        ]));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), courts_area);

    let footer = vec![
        Line::from(vec![
            Span::styled("Benched: ", label),
            Span::styled(view.benched.clone().unwrap_or_default(), text),
        ]),
        Line::from(vec![
            Span::styled("Last updated: ", label),
            Span::styled(view.last_updated.clone().unwrap_or_default(), text),
        ]),
    ];
    f.render_widget(Paragraph::new(footer), footer_area);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Cyan))
        .style_debug(Style::default().fg(Color::Gray))
        .output_target(false)
        .output_file(false)
        .output_line(false);
    f.render_widget(logs, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let width = 56.min(area.width);
    let height = (HELP_LINES.len() as u16 + 2).min(area.height);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    let lines: Vec<Line> = HELP_LINES
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(
                    format!("{key:>6}  "),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                Span::raw(*what),
            ])
        })
        .collect();

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).block(default_border(Color::White).title(" Help ")),
        popup,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::app_settings::AppSettings;
    use serde_json::json;
    use tui::backend::TestBackend;

    fn app() -> App {
        let matches = AppSettings::command()
            .try_get_matches_from(["pickleview", "--source", "https://db.example.com"])
            .unwrap();
        App::new(AppSettings::from_matches(&matches))
    }

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        draw(&mut terminal, app, LoadingState::default());
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn prompt_is_drawn_without_a_code() {
        let mut app = app();
        let screen = screen(&mut app);
        assert!(screen.contains("Match code"));
        assert!(screen.contains("Enter your 3-character match code"));
    }

    #[test]
    fn courts_and_bench_are_drawn() {
        let mut app = app();
        for c in "TNL".chars() {
            app.type_char(c);
        }
        let code = app.submit_input().unwrap();
        let serde_json::Value::Object(raw) = json!({
            "group_name": "Tuesday Night",
            "round": 3,
            "courts": [["A", "B", "C", "D"], {"bad": "shape"}],
            "benched": ["E"]
        }) else {
            unreachable!()
        };
        app.on_room_fetched(code, Ok(raw));

        let screen = screen(&mut app);
        assert!(screen.contains("Tuesday Night - Round 3"));
        assert!(screen.contains("Court 1: A + B vs C + D"));
        assert!(screen.contains("Court 2: unavailable"));
        assert!(screen.contains("Benched: E"));
        assert!(screen.contains("Last updated: Just now"));
    }
}
