// src/chat_view.rs
//
// Pure projection of (messages, draft, loading) into the terminal:
// header, welcome screen or message list with the optional streaming
// bubble and typing placeholder, status line, input bar, info line.

use crate::app::App;
use crate::chat_message::{render_message, render_streaming, render_typing};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

pub const SUGGESTIONS: [&str; 4] = [
    "Explain quantum computing in simple terms",
    "Write a creative story about space",
    "Help me with coding",
    "Generate an image of a sunset",
];

pub fn draw_chat(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(1), // header
                Constraint::Min(1),    // messages / welcome
                Constraint::Length(1), // status line
                Constraint::Length(3), // input bar
                Constraint::Length(1), // info line
            ]
            .as_ref(),
        )
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_messages(f, app, chunks[1]);
    app.status_indicator.render(f, chunks[2]);
    draw_input(f, app, chunks[3]);
    draw_info(f, app, chunks[4]);

    if app.screen == crate::app::AppScreen::QuitConfirm {
        draw_quit_confirm(f);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "✦ Cortex",
            Style::default()
                .fg(Color::LightMagenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "  terminal client",
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    f.render_widget(title, area);

    let session_tag = Paragraph::new(Span::styled(
        short_session_tag(&app.session.session_id),
        Style::default().fg(Color::DarkGray),
    ))
    .alignment(Alignment::Right);
    f.render_widget(session_tag, area);
}

/// Short session id for the header, enough to tell sessions apart.
/// The id file can be hand-edited, so truncation must respect char
/// boundaries.
fn short_session_tag(id: &str) -> String {
    match id.char_indices().nth(18) {
        Some((byte_idx, _)) => format!("[{}…]", &id[..byte_idx]),
        None => format!("[{}]", id),
    }
}

fn draw_messages(f: &mut Frame, app: &mut App, area: Rect) {
    if app.on_welcome() {
        draw_welcome(f, area);
        return;
    }

    let mut lines = Vec::new();
    for message in &app.session.messages {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.extend(render_message(message, area));
    }

    if !app.session.draft.is_empty() {
        lines.push(Line::from(""));
        lines.extend(render_streaming(&app.session.draft, area));
    } else if app.session.loading {
        lines.push(Line::from(""));
        lines.push(render_typing(app.tick));
    }

    let total_lines = lines.len() as u16;
    let max_scroll = total_lines.saturating_sub(area.height);
    app.last_max_scroll = max_scroll;

    let scroll = if app.follow {
        max_scroll
    } else {
        app.chat_scroll.min(max_scroll)
    };

    // Lines are pre-wrapped to the area width, so the scroll offset is
    // exact without a Wrap pass.
    f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), area);
}

fn draw_welcome(f: &mut Frame, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            "◉",
            Style::default().fg(Color::LightMagenta),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Hello, I'm Cortex",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "How can I help you today?",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
    ];

    for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", i + 1),
                Style::default()
                    .fg(Color::LightMagenta)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(*suggestion, Style::default().fg(Color::Gray)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "press a number to try one, or just start typing",
        Style::default().fg(Color::DarkGray),
    )));

    let top_pad = area.height.saturating_sub(lines.len() as u16) / 2;
    let centered = Rect {
        x: area.x,
        y: area.y + top_pad,
        width: area.width,
        height: area.height.saturating_sub(top_pad),
    };

    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        centered,
    );
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let separator = "─".repeat(area.width as usize);
    let separator_style = Style::default().fg(Color::DarkGray);

    f.render_widget(
        Paragraph::new(Span::styled(separator.clone(), separator_style)),
        Rect { height: 1, ..area },
    );

    // Only the last logical line is shown; earlier Shift+Enter lines
    // are summarized in the prefix.
    let line_count = app.composer.input().lines().count().max(1);
    let last_line = app.composer.input().rsplit('\n').next().unwrap_or("");

    let prefix = if line_count > 1 {
        format!("[{}⏎] ", line_count - 1)
    } else {
        "→ ".to_string()
    };
    let prefix_width = prefix.width() as u16;

    let visible_width = area.width.saturating_sub(prefix_width);
    let text_width = last_line.width() as u16;
    let scroll_offset = text_width.saturating_sub(visible_width);

    let input = Line::from(vec![
        Span::styled(prefix, Style::default().fg(Color::DarkGray)),
        Span::styled(last_line.to_string(), Style::default().fg(Color::White)),
    ]);

    f.render_widget(
        Paragraph::new(input).scroll((0, scroll_offset)),
        Rect {
            y: area.y + 1,
            height: 1,
            ..area
        },
    );

    f.render_widget(
        Paragraph::new(Span::styled(separator, separator_style)),
        Rect {
            y: area.y + 2,
            height: 1,
            ..area
        },
    );

    let cursor_x = area.x + prefix_width + text_width.saturating_sub(scroll_offset);
    f.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y + 1));
}

fn draw_info(f: &mut Frame, app: &App, area: Rect) {
    let mut parts = Vec::new();

    if !app.composer.attached().is_empty() {
        let chips = app
            .composer
            .attached()
            .iter()
            .enumerate()
            .map(|(i, file)| format!("{}:📎{}", i + 1, file.name))
            .collect::<Vec<_>>()
            .join(" ");
        parts.push(chips);
    }

    parts.push(input_summary(
        app.composer.input(),
        app.composer.attached().len(),
    ));
    parts.push("Enter send · Shift+Enter newline · /attach <path> · /clear · Esc quit".to_string());

    let info = Paragraph::new(Span::styled(
        parts.join(" · "),
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(info, area);
}

/// Counts characters, not bytes, so non-ASCII input is not inflated.
fn input_summary(input: &str, file_count: usize) -> String {
    format!(
        "{} characters · {} file(s)",
        input.chars().count(),
        file_count
    )
}

fn draw_quit_confirm(f: &mut Frame) {
    let size = f.area();
    if size.height < 4 || size.width < 12 {
        return;
    }

    let width = 36.min(size.width);
    let popup = Rect {
        x: (size.width - width) / 2,
        y: size.height / 2 - 1,
        width,
        height: 3,
    };

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Quit? (y/n)",
                Style::default()
                    .fg(Color::LightYellow)
                    .add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center),
        popup,
    );
}
