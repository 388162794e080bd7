//! Debugger application state and logic.

use crate::Session;

/// Debugger application state.
pub struct DebuggerApp {
    /// The session being driven.
    pub session: Session,
    /// Current contents of the input line.
    pub input: String,
    /// Position while recalling history with Up/Down.
    history_cursor: Option<usize>,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
}

impl DebuggerApp {
    /// Create a debugger around an existing session.
    pub fn new(session: Session) -> Self {
        let status = match session.queue().reserved_len() {
            0 => "Ready. Type an instruction and press Enter; 'q' to quit.".to_string(),
            n => format!("{} reserved line(s). Press Enter on an empty line to step.", n),
        };
        Self {
            session,
            input: String::new(),
            history_cursor: None,
            should_quit: false,
            status,
        }
    }

    /// Handle Enter.
    ///
    /// Runs the typed line, or steps the reserved queue if the line is empty.
    pub fn submit(&mut self) {
        let command = std::mem::take(&mut self.input);
        let command = command.trim();
        self.history_cursor = None;

        if command.is_empty() {
            self.step();
            return;
        }
        if command.eq_ignore_ascii_case("q") {
            self.should_quit = true;
            return;
        }

        self.status = match self.session.execute(command) {
            Ok(()) => format!("Executed: {}", command),
            Err(e) => format!("Error: {}", e),
        };
    }

    /// Execute the next reserved line.
    pub fn step(&mut self) {
        self.status = match self.session.step_reserved() {
            Some(step) => {
                let left = self.session.queue().reserved_len();
                match step.result {
                    Ok(()) => format!("Stepped: {} ({} left)", step.line, left),
                    Err(e) => format!("Error in `{}`: {} ({} left)", step.line, e, left),
                }
            }
            None => "Nothing reserved.".to_string(),
        };
    }

    /// Recall the previous history entry into the input line.
    pub fn recall_prev(&mut self) {
        let history = self.session.history();
        if history.is_empty() {
            return;
        }
        let idx = match self.history_cursor {
            Some(0) => 0,
            Some(i) => i - 1,
            None => history.len() - 1,
        };
        self.history_cursor = Some(idx);
        self.input = history[idx].clone();
    }

    /// Move forward through history; past the newest entry clears the input.
    pub fn recall_next(&mut self) {
        let len = self.session.history().len();
        match self.history_cursor {
            Some(i) if i + 1 < len => {
                self.history_cursor = Some(i + 1);
                self.input = self.session.history()[i + 1].clone();
            }
            _ => {
                self.history_cursor = None;
                self.input.clear();
            }
        }
    }
}

/// Run the debugger on a session.
pub fn run_debugger(session: Session) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(session);

    // Main loop
    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc => app.should_quit = true,
                        KeyCode::Enter => app.submit(),
                        KeyCode::Backspace => {
                            app.input.pop();
                        }
                        KeyCode::Up => app.recall_prev(),
                        KeyCode::Down => app.recall_next(),
                        KeyCode::Char(c) => app.input.push(c),
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
