// src/chat_message.rs
//
// Line rendering for a single conversation entry: a role-colored
// bracket gutter, timestamp header, attachment badges, and the body.
// Markdown bodies get fenced-code-block styling; plain bodies (the
// fixed error reply) are wrapped as-is.

use crate::models::{Message, Role};
use chrono::Local;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use textwrap::wrap;

pub fn render_message(message: &Message, area: Rect) -> Vec<Line<'static>> {
    let style = base_style(message.role);
    let indent = indent_for(message.role);
    let mut lines = Vec::new();

    render_header(message, indent, style, &mut lines);
    render_badges(message, indent, style, &mut lines);

    if message.is_markdown {
        render_markdown_body(&message.content, area, indent, style, &mut lines);
    } else {
        render_plain_body(&message.content, area, indent, style, &mut lines);
    }

    lines.push(Line::from(vec![
        Span::styled(indent.to_string(), style),
        Span::styled("╰─".to_string(), style),
    ]));

    lines
}

/// The in-progress assistant bubble shown while tokens stream in.
pub fn render_streaming(draft: &str, area: Rect) -> Vec<Line<'static>> {
    let style = base_style(Role::Assistant).add_modifier(Modifier::DIM);
    let mut lines = vec![Line::from(vec![
        Span::styled("┌─".to_string(), style),
        Span::styled("Cortex ".to_string(), style),
        Span::styled("…".to_string(), style),
    ])];

    render_markdown_body(draft, area, "", style, &mut lines);
    lines
}

/// The typing placeholder shown while loading with no draft yet.
pub fn render_typing(spinner_idx: usize) -> Line<'static> {
    let dots = ["·  ", "·· ", "···", " ··", "  ·", "   "];
    let style = Style::default().fg(Color::DarkGray);
    Line::from(vec![
        Span::styled("┌─Cortex ".to_string(), style),
        Span::styled(dots[spinner_idx % dots.len()].to_string(), style),
    ])
}

fn base_style(role: Role) -> Style {
    Style::default().fg(match role {
        Role::User => Color::Rgb(255, 223, 128),
        Role::Assistant => Color::Rgb(144, 238, 144),
    })
}

fn indent_for(role: Role) -> &'static str {
    match role {
        Role::User => "  ",
        Role::Assistant => "",
    }
}

fn render_header(message: &Message, indent: &str, style: Style, lines: &mut Vec<Line<'static>>) {
    let local = message.timestamp.with_timezone(&Local);
    let label = match message.role {
        Role::User => "You",
        Role::Assistant => "Cortex",
    };

    lines.push(Line::from(vec![
        Span::styled(indent.to_string(), style),
        Span::styled("┌─".to_string(), style),
        Span::styled(format!("{} ", label), style.add_modifier(Modifier::BOLD)),
        Span::styled(
            local.format("%H:%M").to_string(),
            style.add_modifier(Modifier::DIM),
        ),
    ]));
}

fn render_badges(message: &Message, indent: &str, style: Style, lines: &mut Vec<Line<'static>>) {
    if message.files.is_empty() {
        return;
    }

    let mut spans = vec![
        Span::styled(indent.to_string(), style),
        Span::styled("│ ".to_string(), style),
    ];
    for (i, file) in message.files.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!("[📎 {}]", file.name),
            style.add_modifier(Modifier::DIM),
        ));
    }
    lines.push(Line::from(spans));
}

fn render_plain_body(
    content: &str,
    area: Rect,
    indent: &str,
    style: Style,
    lines: &mut Vec<Line<'static>>,
) {
    flush_text(content, area, indent, style, lines);
}

fn render_markdown_body(
    content: &str,
    area: Rect,
    indent: &str,
    style: Style,
    lines: &mut Vec<Line<'static>>,
) {
    let mut in_code_block = false;
    let mut code_buffer = String::new();
    let mut text_buffer = String::new();
    let mut code_language = String::new();

    for line in content.lines() {
        if let Some(fence_rest) = line.trim().strip_prefix("```") {
            if in_code_block {
                flush_code(&code_buffer, &code_language, indent, style, lines);
                code_buffer.clear();
            } else {
                flush_text(&text_buffer, area, indent, style, lines);
                text_buffer.clear();
                code_language = fence_rest.trim().to_string();
            }
            in_code_block = !in_code_block;
            continue;
        }

        if in_code_block {
            code_buffer.push_str(line);
            code_buffer.push('\n');
        } else {
            text_buffer.push_str(line);
            text_buffer.push('\n');
        }
    }

    flush_text(&text_buffer, area, indent, style, lines);
    // An unclosed fence still renders as code.
    flush_code(&code_buffer, &code_language, indent, style, lines);
}

fn flush_text(buffer: &str, area: Rect, indent: &str, style: Style, lines: &mut Vec<Line<'static>>) {
    if buffer.trim().is_empty() {
        return;
    }

    let wrap_width = (area.width as usize).saturating_sub(4).max(8);
    for paragraph in buffer.lines() {
        if paragraph.is_empty() {
            lines.push(Line::from(vec![
                Span::styled(indent.to_string(), style),
                Span::styled("│".to_string(), style),
            ]));
            continue;
        }
        for wrapped in wrap(paragraph, wrap_width) {
            lines.push(Line::from(vec![
                Span::styled(indent.to_string(), style),
                Span::styled("│ ".to_string(), style),
                Span::styled(wrapped.to_string(), style),
            ]));
        }
    }
}

fn flush_code(
    buffer: &str,
    language: &str,
    indent: &str,
    style: Style,
    lines: &mut Vec<Line<'static>>,
) {
    if buffer.is_empty() {
        return;
    }

    let code_style = Style::default()
        .fg(Color::Rgb(209, 154, 102))
        .add_modifier(Modifier::BOLD);

    if !language.is_empty() {
        lines.push(Line::from(vec![
            Span::styled(indent.to_string(), style),
            Span::styled("│ ".to_string(), style),
            Span::styled(
                format!("▎ {}", language),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    for code_line in buffer.lines() {
        lines.push(Line::from(vec![
            Span::styled(indent.to_string(), style),
            Span::styled("│ ".to_string(), style),
            Span::styled("▎".to_string(), Style::default().fg(Color::DarkGray)),
            Span::styled(format!(" {}", code_line), code_style),
        ]));
    }
}
