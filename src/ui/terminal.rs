use crate::events::AppEvent;
use crate::ui::conversation::{AppAction, ChatApp};
use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

const TICK: Duration = Duration::from_millis(50);

/// Puts the terminal back the way it was, even on early return or panic unwind
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run the chat UI until the user quits.
pub async fn run(mut app: ChatApp, mut events: mpsc::UnboundedReceiver<AppEvent>) -> Result<()> {
    let mut guard = TerminalGuard::enter()?;
    tracing::info!("Terminal UI started");

    loop {
        while let Ok(app_event) = events.try_recv() {
            app.handle_app_event(app_event);
        }

        guard.terminal.draw(|frame| app.render(frame))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if app.handle_key(key) == AppAction::Exit {
                    break;
                }
            }
        } else {
            // Let spawned sends make progress on a current-thread runtime.
            tokio::task::yield_now().await;
        }
    }

    tracing::info!("Terminal UI stopped");
    Ok(())
}
