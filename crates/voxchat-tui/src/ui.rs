use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Tabs};
use ratatui::Frame;
use voxchat_core::{MessageRole, SessionPhase, AMPLITUDE_IDLE};

use crate::app::{App, Tab};

pub fn draw(frame: &mut Frame, app: &App) {
    let [tabs_area, main_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Fill(1)]).areas(frame.area());

    draw_tabs(frame, app, tabs_area);

    match app.tab {
        Tab::Chat => draw_chat(frame, app, main_area),
        Tab::Logs => draw_logs(frame, app, main_area),
    }
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles = vec!["1:Chat", "2:Logs"];
    let selected = match app.tab {
        Tab::Chat => 0,
        Tab::Logs => 1,
    };
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("voxchat"))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, area);
}

fn draw_chat(frame: &mut Frame, app: &App, area: Rect) {
    let has_error = app.state.error.is_some();
    let constraints = if has_error {
        vec![
            Constraint::Fill(1),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(3),
        ]
    } else {
        vec![
            Constraint::Fill(1),
            Constraint::Length(4),
            Constraint::Length(3),
        ]
    };
    let areas = Layout::vertical(constraints).split(area);

    draw_messages(frame, app, areas[0]);
    draw_transcript(frame, app, areas[1]);

    if has_error {
        draw_error(frame, app, areas[2]);
        draw_status(frame, app, areas[3]);
    } else {
        draw_status(frame, app, areas[2]);
    }
}

fn draw_messages(frame: &mut Frame, app: &App, area: Rect) {
    let visible_height = area.height.saturating_sub(2) as usize;
    let total = app.state.messages.len();
    let scroll = app.scroll.min(total.saturating_sub(visible_height));
    let end = total.saturating_sub(scroll);
    let start = end.saturating_sub(visible_height);

    let items: Vec<ListItem> = app.state.messages[start..end]
        .iter()
        .map(|msg| {
            let (prefix, style) = match msg.role {
                MessageRole::User => ("you", Style::default().fg(Color::Cyan)),
                MessageRole::Ai => (" ai", Style::default().fg(Color::Green)),
            };
            let text = msg.text.as_deref().unwrap_or("(audio only)");
            let audio_marker = if msg.audio_url.is_some() { " ♪" } else { "" };
            let line = Line::from(vec![
                Span::styled(format!("{}: ", prefix), style.add_modifier(Modifier::BOLD)),
                Span::raw(text.to_string()),
                Span::styled(audio_marker.to_string(), Style::default().fg(Color::Magenta)),
            ]);
            ListItem::new(line)
        })
        .collect();

    let title = if app.auto_scroll {
        "Messages".to_string()
    } else {
        format!("Messages (scrolled {}, G=bottom)", scroll)
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

fn draw_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(app.state.transcript.clone())];
    if !app.state.interim.is_empty() {
        spans.push(Span::styled(
            app.state.interim.clone(),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    }

    let title = match app.state.phase {
        SessionPhase::Listening => "Transcript (listening…)",
        SessionPhase::Stopping => "Transcript (stopping)",
        SessionPhase::Idle => "Transcript",
    };
    let para = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(para, area);
}

fn draw_error(frame: &mut Frame, app: &App, area: Rect) {
    let msg = app.state.error.as_deref().unwrap_or("");
    let para = Paragraph::new(msg)
        .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title("Error"));
    frame.render_widget(para, area);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let [label_area, gauge_area] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(24)]).areas(area);

    let recording = match app.state.phase {
        SessionPhase::Listening => "● REC",
        SessionPhase::Stopping => "◌ stopping",
        SessionPhase::Idle => "○ idle",
    };
    let processing = if app.state.is_processing {
        "  [processing…]"
    } else {
        ""
    };
    let muted = if app.state.muted { "  [muted]" } else { "" };
    let line = Line::from(vec![
        Span::styled(
            recording,
            if app.state.phase == SessionPhase::Listening {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            },
        ),
        Span::raw(processing),
        Span::raw(muted),
        Span::raw("  (Space=record, m=mute, q=quit)"),
    ]);
    let para = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(para, label_area);

    // Amplitude scale [0.9, 1.15] maps onto the full gauge width
    let ratio = ((app.state.amplitude - AMPLITUDE_IDLE) / 0.25).clamp(0.0, 1.0) as f64;
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Playback"))
        .gauge_style(Style::default().fg(if app.state.is_playing {
            Color::Magenta
        } else {
            Color::DarkGray
        }))
        .ratio(ratio);
    frame.render_widget(gauge, gauge_area);
}

fn draw_logs(frame: &mut Frame, app: &App, area: Rect) {
    let logs = app.logs.lock().unwrap();
    let total = logs.len();

    let visible_height = area.height.saturating_sub(2) as usize;
    let scroll = app.scroll.min(total.saturating_sub(visible_height));
    let end = total.saturating_sub(scroll);
    let start = end.saturating_sub(visible_height);

    let items: Vec<ListItem> = logs
        .iter()
        .skip(start)
        .take(end - start)
        .map(|s| ListItem::new(s.as_str()))
        .collect();

    let title = if app.auto_scroll {
        "Logs (auto-scroll)"
    } else {
        "Logs (Up/Down=scroll, G=bottom)"
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::Terminal;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use voxchat_core::{ChatMessage, ChatState};

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area();
        let mut text = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                text.push_str(buf.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "));
            }
            text.push('\n');
        }
        text
    }

    fn make_app() -> App {
        App::new(Arc::new(Mutex::new(VecDeque::new())))
    }

    fn render(app: &App) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_chat_renders_messages_in_order() {
        let mut app = make_app();
        app.update_state(ChatState {
            messages: vec![
                ChatMessage::user("what is rust", None),
                ChatMessage::ai(Some("a systems language".to_string()), None),
            ],
            ..Default::default()
        });

        let text = render(&app);
        assert!(text.contains("what is rust"), "missing user text:\n{}", text);
        assert!(
            text.contains("a systems language"),
            "missing ai text:\n{}",
            text,
        );
        let user_pos = text.find("what is rust").unwrap();
        let ai_pos = text.find("a systems language").unwrap();
        assert!(user_pos < ai_pos, "messages out of order");
    }

    #[test]
    fn test_chat_renders_transcript_and_interim() {
        let mut app = make_app();
        app.update_state(ChatState {
            phase: SessionPhase::Listening,
            transcript: "hello ".to_string(),
            interim: "wor".to_string(),
            ..Default::default()
        });

        let text = render(&app);
        assert!(text.contains("hello"), "missing transcript:\n{}", text);
        assert!(text.contains("wor"), "missing interim:\n{}", text);
        assert!(text.contains("listening"), "missing listening marker:\n{}", text);
    }

    #[test]
    fn test_error_banner_shown_when_error_set() {
        let mut app = make_app();
        app.update_state(ChatState {
            error: Some("network error: speech recognition unavailable".to_string()),
            ..Default::default()
        });

        let text = render(&app);
        assert!(text.contains("Error"), "missing error block:\n{}", text);
        assert!(
            text.contains("network error"),
            "missing error message:\n{}",
            text,
        );
    }

    #[test]
    fn test_no_error_banner_by_default() {
        let app = make_app();
        let text = render(&app);
        assert!(!text.contains("network error"));
    }

    #[test]
    fn test_status_shows_recording_and_mute() {
        let mut app = make_app();
        app.update_state(ChatState {
            phase: SessionPhase::Listening,
            muted: true,
            ..Default::default()
        });

        let text = render(&app);
        assert!(text.contains("REC"), "missing recording marker:\n{}", text);
        assert!(text.contains("[muted]"), "missing mute marker:\n{}", text);
    }

    #[test]
    fn test_message_without_text_renders_placeholder() {
        let mut app = make_app();
        app.update_state(ChatState {
            messages: vec![ChatMessage::ai(None, Some("/a.wav".to_string()))],
            ..Default::default()
        });

        let text = render(&app);
        assert!(text.contains("(audio only)"), "missing placeholder:\n{}", text);
    }

    #[test]
    fn test_logs_tab_renders_log_lines() {
        let logs = Arc::new(Mutex::new(VecDeque::new()));
        {
            let mut buf = logs.lock().unwrap();
            for i in 0..10 {
                buf.push_back(format!("[INFO] test: log message {}", i));
            }
        }
        let mut app = App::new(Arc::clone(&logs));
        app.tab = Tab::Logs;

        let text = render(&app);
        assert!(
            text.contains("log message"),
            "expected log text in output:\n{}",
            text,
        );
    }
}
