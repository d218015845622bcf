//! Conversation history display component

use crate::config::UiConfig;
use crate::message::{ConversationState, Message, Sender};
use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Renders a conversation snapshot, newest message at the bottom.
pub struct ConversationHistory<'a> {
    state: &'a ConversationState,
    bot_name: &'a str,
    ui: &'a UiConfig,
    /// Lines scrolled up from the bottom; 0 follows the latest message
    scroll_offset: usize,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(state: &'a ConversationState, bot_name: &'a str, ui: &'a UiConfig) -> Self {
        Self {
            state,
            bot_name,
            ui,
            scroll_offset: 0,
        }
    }

    pub fn scroll_offset(mut self, offset: usize) -> Self {
        self.scroll_offset = offset;
        self
    }

    /// All lines for the current width, including the typing indicator
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let mut all_lines = Vec::new();
        for message in &self.state.messages {
            all_lines.extend(self.render_message(message, width));
            all_lines.push(Line::default());
        }
        if self.state.loading {
            all_lines.push(Line::from(vec![Span::styled(
                format!("{} is typing...", self.bot_name),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )]));
        }
        all_lines
    }

    /// Render a single message into lines
    fn render_message(&self, message: &Message, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let (author, alignment, style) = match message.sender() {
            Sender::User => ("You".to_string(), Alignment::Right, Style::default().fg(Color::Cyan)),
            Sender::Bot => (self.bot_name.to_string(), Alignment::Left, Style::default().fg(Color::Green)),
        };

        let mut header = vec![Span::styled(author, style.add_modifier(Modifier::BOLD))];
        if self.ui.show_timestamps {
            let time = message
                .timestamp()
                .with_timezone(&Local)
                .format(&self.ui.timestamp_format)
                .to_string();
            header.push(Span::styled(format!("  {time}"), Style::default().fg(Color::DarkGray)));
        }
        lines.push(Line::from(header).alignment(alignment));

        if let Some(attachment) = message.attachment() {
            let size = attachment
                .decode()
                .map(|bytes| format_size(bytes.len()))
                .unwrap_or_else(|_| "unreadable".to_string());
            lines.push(
                Line::from(vec![Span::styled(
                    format!("[image: {}, {}]", attachment.mime_type(), size),
                    Style::default().fg(Color::Magenta),
                )])
                .alignment(alignment),
            );
        }

        // Bubbles take at most three quarters of the width.
        let bubble_width = (width as usize * 3 / 4).max(1);
        for content_line in wrap_text(message.text(), bubble_width) {
            lines.push(Line::from(vec![Span::styled(content_line, style)]).alignment(alignment));
        }

        lines
    }
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Conversation ");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.state.messages.is_empty() && !self.state.loading {
            let empty = Line::from(vec![Span::styled(
                "No messages yet. Say hello below.",
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &empty, inner_area.width);
            return;
        }

        let all_lines = self.lines(inner_area.width);
        let height = inner_area.height as usize;
        let max_offset = all_lines.len().saturating_sub(height);
        let offset = self.scroll_offset.min(max_offset);
        let start = max_offset - offset;

        for (i, line) in all_lines.iter().skip(start).take(height).enumerate() {
            let line_width = line.width() as u16;
            let x = match line.alignment {
                Some(Alignment::Right) => inner_area.x + inner_area.width.saturating_sub(line_width),
                _ => inner_area.x,
            };
            buf.set_line(x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + word_len + 1 > width {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            if current_len > 0 {
                current_line.push(' ');
                current_len += 1;
            }
            current_line.push_str(word);
            current_len += word_len;
        }

        lines.push(current_line);
    }

    lines
}

fn format_size(bytes: usize) -> String {
    match bytes {
        b if b >= 1024 * 1024 => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
        b if b >= 1024 => format!("{:.1} KB", b as f64 / 1024.0),
        b => format!("{} B", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::DataUri;

    fn text_of(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 7), ["one two", "three"]);
        assert_eq!(wrap_text("line\nbreak", 40), ["line", "break"]);
        assert_eq!(wrap_text("", 10), [""]);
        assert_eq!(wrap_text("Привет мир", 6), ["Привет", "мир"]);
    }

    #[test]
    fn test_messages_render_in_order_with_indicator() {
        let ui = UiConfig {
            show_timestamps: false,
            ..UiConfig::default()
        };
        let state = ConversationState {
            messages: vec![Message::user("Hello", None), Message::bot("Hi there")],
            loading: true,
        };

        let history = ConversationHistory::new(&state, "TuTiBot", &ui);
        let text = text_of(&history.lines(80));

        assert_eq!(
            text,
            ["You", "Hello", "", "TuTiBot", "Hi there", "", "TuTiBot is typing..."]
        );
    }

    #[test]
    fn test_attachment_marker_shows_decoded_size() {
        let ui = UiConfig {
            show_timestamps: false,
            ..UiConfig::default()
        };
        let image = DataUri::encode("image/png", &[0u8; 2048]);
        let state = ConversationState {
            messages: vec![Message::user("look", Some(image))],
            loading: false,
        };

        let lines = ConversationHistory::new(&state, "Bot", &ui).lines(80);
        assert_eq!(text_of(&lines)[1], "[image: image/png, 2.0 KB]");
        assert_eq!(lines[0].alignment, Some(Alignment::Right));
    }

    #[test]
    fn test_render_follows_latest_message() {
        let ui = UiConfig {
            show_timestamps: false,
            ..UiConfig::default()
        };
        let state = ConversationState {
            messages: (0..10).map(|i| Message::bot(format!("message {i}"))).collect(),
            loading: false,
        };
        let area = Rect::new(0, 0, 30, 5);
        let mut buf = Buffer::empty(area);

        ConversationHistory::new(&state, "Bot", &ui).render(area, &mut buf);

        let rows: Vec<String> = (1..4)
            .map(|y| (1..29).map(|x| buf.get(x, y).symbol().to_string()).collect::<String>())
            .collect();
        assert!(rows.iter().any(|row| row.contains("message 9")));
        assert!(!rows.iter().any(|row| row.contains("message 0")));
    }
}
