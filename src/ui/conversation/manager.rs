use crate::attachment::is_image;
use crate::client::ChatClient;
use crate::config::UiConfig;
use crate::events::AppEvent;
use crate::ports::PickerKind;
use crate::profile::{Profile, ProfileUpdate};
use crate::ui::conversation::commands::{ParsedCommand, SlashCommand, get_help_text};
use crate::ui::conversation::composer::{ChatComposer, ComposerResult};
use crate::ui::conversation::history::ConversationHistory;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::path::PathBuf;
use tokio::sync::mpsc;

const SCROLL_STEP: usize = 5;
const CHAT_TITLE: &str = " Message ";
const CHAT_PLACEHOLDER: &str = "Type a message, / for commands, Ctrl+O to attach an image";

/// Actions the run loop has to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    None,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

/// An open file prompt and the input it collects
struct FilePrompt {
    kind: PickerKind,
    composer: ChatComposer,
}

/// Terminal front end over one [`ChatClient`]
pub struct ChatApp {
    client: ChatClient,
    ui: UiConfig,
    composer: ChatComposer,
    prompt: Option<FilePrompt>,
    scroll_offset: usize,
    status: Option<Status>,
    show_help: bool,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl ChatApp {
    pub fn new(client: ChatClient, ui: UiConfig, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            client,
            ui,
            composer: ChatComposer::new(CHAT_TITLE, CHAT_PLACEHOLDER),
            prompt: None,
            scroll_offset: 0,
            status: None,
            show_help: false,
            events,
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn prompt_kind(&self) -> Option<PickerKind> {
        self.prompt.as_ref().map(|prompt| prompt.kind)
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        if key.kind != KeyEventKind::Press {
            return AppAction::None;
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return AppAction::Exit;
        }

        if self.show_help {
            self.show_help = false;
            return AppAction::None;
        }

        match key.code {
            KeyCode::PageUp => {
                self.scroll_offset += SCROLL_STEP;
                return AppAction::None;
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(SCROLL_STEP);
                return AppAction::None;
            }
            _ => {}
        }

        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return AppAction::None;
        }

        if key.code == KeyCode::Char('o') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.client.request_attachment();
            return AppAction::None;
        }

        if key.code == KeyCode::Esc && !self.composer.is_palette_open() {
            self.status = None;
            if self.client.profile().is_editing() {
                self.client.profile().discard();
            }
            return AppAction::None;
        }

        let result = self.composer.handle_key(key);
        // The text being typed doubles as the caption for a picked image.
        self.client.dispatcher().set_input(self.composer.content());

        match result {
            ComposerResult::Submitted(text) => {
                self.send(text);
                AppAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => AppAction::None,
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_ref() else {
            return;
        };

        if key.code == KeyCode::Esc {
            self.prompt = None;
            return;
        }

        if let ComposerResult::Submitted(path) = prompt.composer.handle_key(key) {
            let kind = prompt.kind;
            self.prompt = None;
            self.pick_file(kind, PathBuf::from(path.trim()));
        }
    }

    /// Handle events coming back from the chat core and background tasks
    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ScrollToLatest => self.scroll_offset = 0,
            AppEvent::OpenFilePicker(kind) => self.open_prompt(kind),
            AppEvent::Notify(message) => self.status = Some(Status::Info(message)),
            AppEvent::ShowError(message) => self.status = Some(Status::Error(message)),
        }
    }

    fn open_prompt(&mut self, kind: PickerKind) {
        let title = match kind {
            PickerKind::ChatAttachment => " Image to send ",
            PickerKind::Avatar => " Avatar image ",
        };
        let mut composer = ChatComposer::new("", "");
        composer.set_mode(title, "Path to an image file, Esc to cancel", false);
        self.prompt = Some(FilePrompt { kind, composer });
    }

    fn pick_file(&mut self, kind: PickerKind, path: PathBuf) {
        if !is_image(&path) {
            self.status = Some(Status::Error(format!("Not an image: {}", path.display())));
            return;
        }

        match kind {
            PickerKind::ChatAttachment => {
                self.composer.clear();
                self.spawn_attachment(path);
            }
            PickerKind::Avatar => self.spawn_avatar_upload(path),
        }
    }

    fn send(&self, text: String) {
        let dispatcher = self.client.dispatcher().clone();
        tokio::spawn(async move {
            dispatcher.send(&text, None).await;
        });
    }

    fn spawn_attachment(&self, path: PathBuf) {
        let dispatcher = self.client.dispatcher().clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            if let Err(err) = dispatcher.send_attachment(&path).await {
                let _ = events.send(AppEvent::ShowError(format!(
                    "Couldn't read {}: {}",
                    path.display(),
                    err
                )));
            }
        });
    }

    fn spawn_avatar_upload(&self, path: PathBuf) {
        let profile = self.client.profile().clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            match profile.upload_avatar(&path).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(path = %path.display(), "Avatar arrived after the settings closed");
                }
                Err(err) => {
                    let _ = events.send(AppEvent::ShowError(format!(
                        "Couldn't read {}: {}",
                        path.display(),
                        err
                    )));
                }
            }
        });
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: ParsedCommand) -> AppAction {
        let profile = self.client.profile();
        match command.command {
            SlashCommand::Attach => match command.path_and_caption() {
                Some((path, caption)) => {
                    if !caption.is_empty() {
                        self.client.dispatcher().set_input(caption);
                    }
                    self.pick_file(PickerKind::ChatAttachment, PathBuf::from(path));
                }
                None => self.client.request_attachment(),
            },
            SlashCommand::New => self.client.session().new_chat(),
            SlashCommand::Reset => self.client.session().reset_chat(),
            SlashCommand::Settings => profile.begin_edit(),
            SlashCommand::Name => match command.argument() {
                Some(name) => {
                    if !profile.update_draft(ProfileUpdate::name(name)) {
                        self.status = Some(Status::Error("Open /settings first".to_string()));
                    }
                }
                None => self.status = Some(Status::Error("Usage: /name <name>".to_string())),
            },
            SlashCommand::Avatar => match command.argument() {
                Some(path) => {
                    if !profile.is_editing() {
                        profile.begin_edit();
                    }
                    self.pick_file(PickerKind::Avatar, PathBuf::from(path));
                }
                None => self.client.request_avatar(),
            },
            SlashCommand::Save => {
                if !profile.save() {
                    self.status = Some(Status::Error("Nothing to save, open /settings first".to_string()));
                }
            }
            SlashCommand::Discard => profile.discard(),
            SlashCommand::Help => self.show_help = true,
            SlashCommand::Quit => return AppAction::Exit,
        }
        AppAction::None
    }

    /// Draw the whole screen
    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(5),    // History
                Constraint::Length(1), // Status
                Constraint::Length(3), // Composer
            ])
            .split(frame.size());

        let committed = self.client.profile().committed();
        frame.render_widget(Paragraph::new(header_line(&committed)), chunks[0]);

        let state = self.client.store().current_state();
        let history = ConversationHistory::new(&state, &committed.display_name, &self.ui)
            .scroll_offset(self.scroll_offset);
        frame.render_widget(history, chunks[1]);

        frame.render_widget(Paragraph::new(self.status_line()), chunks[2]);

        match &self.prompt {
            Some(prompt) => frame.render_widget(&prompt.composer, chunks[3]),
            None => frame.render_widget(&self.composer, chunks[3]),
        }

        if let Some(draft) = self.client.profile().draft() {
            render_settings(frame, &draft, &committed);
        }

        if self.show_help {
            render_help(frame);
        }
    }

    fn status_line(&self) -> Line<'static> {
        match &self.status {
            Some(Status::Info(message)) => Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Green),
            )),
            Some(Status::Error(message)) => Line::from(Span::styled(
                message.clone(),
                Style::default().fg(Color::Red),
            )),
            None => Line::from(Span::styled(
                "PageUp/PageDown scroll  /help commands  Ctrl+C quit",
                Style::default().fg(Color::DarkGray),
            )),
        }
    }
}

fn avatar_badge(profile: &Profile) -> String {
    match (&profile.avatar, profile.initial()) {
        (Some(_), _) => "[img]".to_string(),
        (None, Some(initial)) => format!("[{initial}]"),
        (None, None) => "[?]".to_string(),
    }
}

fn header_line(profile: &Profile) -> Line<'static> {
    Line::from(vec![
        Span::styled(avatar_badge(profile), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            profile.display_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(" online", Style::default().fg(Color::Green)),
    ])
}

fn render_settings(frame: &mut Frame, draft: &Profile, committed: &Profile) {
    let area = centered_rect(60, 9, frame.size());
    frame.render_widget(Clear, area);

    let unsaved = draft != committed;
    let lines = vec![
        Line::from(vec![
            Span::styled("Name:   ", Style::default().fg(Color::Gray)),
            Span::raw(draft.display_name.clone()),
        ]),
        Line::from(vec![
            Span::styled("Avatar: ", Style::default().fg(Color::Gray)),
            Span::raw(match &draft.avatar {
                Some(avatar) => avatar.mime_type().to_string(),
                None => "none".to_string(),
            }),
        ]),
        Line::default(),
        Line::from(Span::styled(
            if unsaved { "Unsaved changes" } else { "No changes" },
            Style::default().fg(if unsaved { Color::Yellow } else { Color::DarkGray }),
        )),
        Line::from(Span::styled(
            "/name <name>  /avatar [path]  /save  /discard (Esc)",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Bot settings ")
        .style(Style::default().fg(Color::Blue));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(70, 18, frame.size());
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help (any key to close) ");
    frame.render_widget(
        Paragraph::new(get_help_text()).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// A rect of `percent_x` width and `height` rows centered in `area`
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
