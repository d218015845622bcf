use crate::ui::conversation::commands::{
    CommandEntry, ParsedCommand, command_entries, parse_slash_command,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};
use std::cell::{Cell, RefCell};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Byte offset, always on a char boundary
    pub cursor_position: usize,
}

/// Single input box for chat messages, slash commands and file paths
#[derive(Clone)]
pub struct ChatComposer {
    state: RefCell<TextAreaState>,
    placeholder: String,
    title: String,
    has_focus: bool,
    commands_enabled: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: RefCell<Vec<CommandEntry>>,
    show_command_palette: Cell<bool>,
    selected_command: Cell<Option<usize>>,
}

impl ChatComposer {
    pub fn new(title: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            state: RefCell::new(TextAreaState::default()),
            placeholder: placeholder.into(),
            title: title.into(),
            has_focus: true,
            commands_enabled: true,
            command_entries: command_entries(),
            filtered_commands: RefCell::new(Vec::new()),
            show_command_palette: Cell::new(false),
            selected_command: Cell::new(None),
        }
    }

    /// Handle key input
    pub fn handle_key(&self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        let mut state = self.state.borrow_mut();

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char(&mut state, '\n');
                } else if self.show_command_palette.get() {
                    if self.apply_selected_command(&mut state) {
                        return ComposerResult::None;
                    }
                } else if !state.content.trim().is_empty() {
                    let content = std::mem::take(&mut state.content);
                    state.cursor_position = 0;
                    self.close_command_palette();
                    drop(state);
                    if self.commands_enabled {
                        if let Some(command) = parse_slash_command(&content) {
                            return ComposerResult::Command(command);
                        }
                    }
                    return ComposerResult::Submitted(content);
                }
            }
            KeyCode::Up => {
                if self.show_command_palette.get() {
                    self.move_command_selection(-1);
                }
            }
            KeyCode::Down => {
                if self.show_command_palette.get() {
                    self.move_command_selection(1);
                }
            }
            KeyCode::Esc => {
                if self.show_command_palette.get() {
                    self.close_command_palette();
                }
            }
            KeyCode::Tab => {
                if self.show_command_palette.get() {
                    self.apply_selected_command(&mut state);
                }
            }
            KeyCode::Char(c) => {
                self.insert_char(&mut state, c);

                if self.show_command_palette.get() {
                    if state.content.starts_with('/') && !c.is_whitespace() {
                        self.refresh_command_palette(&state);
                    } else {
                        self.close_command_palette();
                    }
                } else if self.commands_enabled && state.content == "/" {
                    self.open_command_palette(&state);
                }
            }
            KeyCode::Backspace => {
                if self.backspace(&mut state) {
                    self.sync_palette(&state);
                }
            }
            KeyCode::Delete => {
                if self.delete(&mut state) {
                    self.sync_palette(&state);
                }
            }
            KeyCode::Left => {
                state.cursor_position = previous_boundary(&state);
            }
            KeyCode::Right => {
                let step = state.content[state.cursor_position..]
                    .chars()
                    .next()
                    .map_or(0, char::len_utf8);
                state.cursor_position += step;
            }
            KeyCode::Home => {
                state.cursor_position = 0;
            }
            KeyCode::End => {
                state.cursor_position = state.content.len();
            }
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert a character at the cursor position
    fn insert_char(&self, state: &mut TextAreaState, c: char) {
        state.content.insert(state.cursor_position, c);
        state.cursor_position += c.len_utf8();
    }

    /// Delete character before cursor
    fn backspace(&self, state: &mut TextAreaState) -> bool {
        if state.cursor_position == 0 {
            return false;
        }
        let index = previous_boundary(state);
        state.content.remove(index);
        state.cursor_position = index;
        true
    }

    /// Delete character at cursor
    fn delete(&self, state: &mut TextAreaState) -> bool {
        if state.cursor_position < state.content.len() {
            state.content.remove(state.cursor_position);
            true
        } else {
            false
        }
    }

    fn sync_palette(&self, state: &TextAreaState) {
        if !self.show_command_palette.get() {
            return;
        }
        if state.content.starts_with('/') {
            self.refresh_command_palette(state);
        } else {
            self.close_command_palette();
        }
    }

    fn open_command_palette(&self, state: &TextAreaState) {
        self.show_command_palette.set(true);
        self.selected_command.set(Some(0));
        self.refresh_command_palette(state);
    }

    fn close_command_palette(&self) {
        self.show_command_palette.set(false);
        self.filtered_commands.borrow_mut().clear();
        self.selected_command.set(None);
    }

    fn refresh_command_palette(&self, state: &TextAreaState) {
        let query = state.content.trim_start_matches('/').to_lowercase();
        let mut filtered = self.filtered_commands.borrow_mut();
        filtered.clear();
        filtered.extend(
            self.command_entries
                .iter()
                .filter(|entry| query.is_empty() || entry.keyword.starts_with(&query))
                .copied(),
        );

        if filtered.is_empty() {
            self.selected_command.set(None);
        } else {
            let index = self.selected_command.get().unwrap_or(0);
            self.selected_command.set(Some(index.min(filtered.len() - 1)));
        }
    }

    fn move_command_selection(&self, delta: isize) {
        let filtered = self.filtered_commands.borrow();
        if filtered.is_empty() {
            self.selected_command.set(None);
            return;
        }

        let len = filtered.len() as isize;
        let current = self.selected_command.get().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len);
        self.selected_command.set(Some(next as usize));
    }

    fn apply_selected_command(&self, state: &mut TextAreaState) -> bool {
        let entry = {
            let filtered = self.filtered_commands.borrow();
            match self.selected_command.get().and_then(|index| filtered.get(index)) {
                Some(entry) => *entry,
                None => return false,
            }
        };

        state.content = format!("/{} ", entry.keyword);
        state.cursor_position = state.content.len();
        self.close_command_palette();
        true
    }

    /// Switch between chat input (slash commands on) and a plain prompt
    pub fn set_mode(&mut self, title: impl Into<String>, placeholder: impl Into<String>, commands_enabled: bool) {
        self.title = title.into();
        self.placeholder = placeholder.into();
        self.commands_enabled = commands_enabled;
        self.close_command_palette();
    }

    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    /// Get current content
    pub fn content(&self) -> String {
        self.state.borrow().content.clone()
    }

    pub fn is_palette_open(&self) -> bool {
        self.show_command_palette.get()
    }

    /// Clear content
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.content.clear();
        state.cursor_position = 0;
        drop(state);
        self.close_command_palette();
    }
}

/// Byte offset of the char just before the cursor (0 at the start)
fn previous_boundary(state: &TextAreaState) -> usize {
    state.content[..state.cursor_position]
        .char_indices()
        .next_back()
        .map_or(0, |(index, _)| index)
}

impl Widget for &ChatComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state.borrow();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title.as_str())
            .style(if self.has_focus {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = state.content.clone();
            if self.has_focus {
                content.insert(state.cursor_position.min(content.len()), '▌');
            }

            // Keep the line holding the cursor visible.
            let lines: Vec<&str> = content.split('\n').collect();
            let height = inner_area.height as usize;
            let skip = lines.len().saturating_sub(height);
            for (i, line_text) in lines.iter().skip(skip).enumerate() {
                let line = Line::from(vec![Span::raw(*line_text)]);
                buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
            }
        }

        if self.show_command_palette.get() {
            let filtered = self.filtered_commands.borrow();
            let palette_height = (filtered.len().min(6) + 2) as u16;
            let palette_area = Rect {
                x: area.x,
                y: area.y.saturating_sub(palette_height),
                width: area.width,
                height: palette_height.min(area.y),
            };
            if palette_area.height < 3 {
                return;
            }

            Clear.render(palette_area, buf);
            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            let selected = self.selected_command.get();
            for (index, entry) in filtered.iter().enumerate().take(inner.height as usize) {
                let style = if selected == Some(index) {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" - ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);
                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}
