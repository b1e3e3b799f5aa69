//! Terminal front end state: which controls are live, what the user is
//! typing, and how key presses map onto lifecycle and history operations.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::Error;
use crate::history::HistoryStore;
use crate::manager::SessionManager;
use crate::runtime::AppEvent;
use crate::session::SessionState;
use crate::storage::BlobStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Editing the task label: the draft for the next session when idle, the
    /// active session's label otherwise
    EditingTask { buffer: String },
    Renaming { id: String, buffer: String },
    ConfirmDelete { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// User-facing controls; only the ones valid for the current state are offered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Pause,
    Resume,
    Stop,
    EditTask,
    Rename,
    Delete,
    Quit,
}

impl Control {
    pub fn key_hint(&self) -> &'static str {
        match self {
            Control::Start => "(s)tart",
            Control::Pause => "(p)ause",
            Control::Resume => "(r)esume",
            Control::Stop => "(x) stop",
            Control::EditTask => "(t)ask",
            Control::Rename => "(e)dit name",
            Control::Delete => "(d)elete",
            Control::Quit => "(q)uit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub is_error: bool,
}

#[derive(Debug)]
pub struct App<C: Clock, S: BlobStore> {
    pub manager: SessionManager<C>,
    pub history: HistoryStore<S>,
    pub mode: InputMode,
    /// Task name for the next session
    pub task_input: String,
    /// Index into the history list
    pub selected: usize,
    pub status: Option<Status>,
    pub confirm_delete: bool,
}

impl<C: Clock, S: BlobStore> App<C, S> {
    pub fn new(manager: SessionManager<C>, history: HistoryStore<S>) -> Self {
        Self {
            manager,
            history,
            mode: InputMode::Normal,
            task_input: String::new(),
            selected: 0,
            status: None,
            confirm_delete: true,
        }
    }

    pub fn with_confirm_delete(mut self, confirm_delete: bool) -> Self {
        self.confirm_delete = confirm_delete;
        self
    }

    /// Live refresh is only needed while the timer is visibly moving
    pub fn wants_refresh(&self) -> bool {
        self.manager.is_active()
    }

    pub fn state(&self) -> SessionState {
        self.manager.state()
    }

    pub fn controls(&self) -> Vec<Control> {
        let mut controls = match self.state() {
            SessionState::Idle => vec![Control::Start, Control::EditTask],
            SessionState::Running => vec![Control::Pause, Control::Stop, Control::EditTask],
            SessionState::Paused => vec![Control::Resume, Control::Stop, Control::EditTask],
        };
        if !self.history.is_empty() {
            controls.extend([Control::Rename, Control::Delete]);
        }
        controls.push(Control::Quit);
        controls
    }

    pub fn is_enabled(&self, control: Control) -> bool {
        self.controls().contains(&control)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.history
            .records()
            .get(self.selected)
            .map(|record| record.id.as_str())
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Flow {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            // elapsed time is recomputed on draw, nothing to advance
            AppEvent::Tick | AppEvent::Resize => Flow::Continue,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.shutdown();
            return Flow::Quit;
        }

        match std::mem::replace(&mut self.mode, InputMode::Normal) {
            InputMode::Normal => return self.handle_normal_key(key),
            InputMode::EditingTask { mut buffer } => match key.code {
                KeyCode::Enter => self.commit_task_name(buffer),
                KeyCode::Esc => {}
                code => {
                    edit_buffer(&mut buffer, code);
                    self.mode = InputMode::EditingTask { buffer };
                }
            },
            InputMode::Renaming { id, mut buffer } => match key.code {
                KeyCode::Enter => self.rename(&id, &buffer),
                KeyCode::Esc => {}
                code => {
                    edit_buffer(&mut buffer, code);
                    self.mode = InputMode::Renaming { id, buffer };
                }
            },
            InputMode::ConfirmDelete { id } => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.delete(&id),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {}
                _ => self.mode = InputMode::ConfirmDelete { id },
            },
        }
        Flow::Continue
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Char('q') => {
                self.shutdown();
                return Flow::Quit;
            }
            KeyCode::Char('s') | KeyCode::Enter if self.is_enabled(Control::Start) => {
                self.start()
            }
            KeyCode::Char('p') if self.is_enabled(Control::Pause) => self.pause(),
            KeyCode::Char('r') if self.is_enabled(Control::Resume) => self.resume(),
            KeyCode::Char(' ') => match self.state() {
                SessionState::Running => self.pause(),
                SessionState::Paused => self.resume(),
                SessionState::Idle => {}
            },
            KeyCode::Char('x') if self.is_enabled(Control::Stop) => self.stop(),
            KeyCode::Char('t') | KeyCode::Char('i') => {
                let buffer = match self.manager.active() {
                    Some(session) => session.task_name().to_string(),
                    None => self.task_input.clone(),
                };
                self.mode = InputMode::EditingTask { buffer };
            }
            KeyCode::Char('e') if self.is_enabled(Control::Rename) => {
                if let Some(record) = self.history.records().get(self.selected) {
                    self.mode = InputMode::Renaming {
                        id: record.id.clone(),
                        buffer: record.task_name.clone(),
                    };
                }
            }
            KeyCode::Char('d') | KeyCode::Delete if self.is_enabled(Control::Delete) => {
                if let Some(id) = self.selected_id().map(str::to_string) {
                    if self.confirm_delete {
                        self.mode = InputMode::ConfirmDelete { id };
                    } else {
                        self.delete(&id);
                    }
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected += 1;
                self.clamp_selection();
            }
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.history.len().saturating_sub(1),
            _ => {}
        }
        Flow::Continue
    }

    fn start(&mut self) {
        let task_name = std::mem::take(&mut self.task_input);
        match self.manager.start(task_name) {
            Ok(_) => self.status = None,
            Err(err) => self.report(err),
        }
    }

    fn pause(&mut self) {
        if let Err(err) = self.manager.pause() {
            self.report(err);
        }
    }

    fn resume(&mut self) {
        if let Err(err) = self.manager.resume() {
            self.report(err);
        }
    }

    fn stop(&mut self) {
        match self.manager.stop(&mut self.history) {
            Ok(record) => {
                self.selected = 0;
                self.set_status(format!(
                    "Saved \"{}\" ({})",
                    record.task_name,
                    crate::format::format_hours_minutes(record.duration_seconds)
                ));
            }
            Err(err) => {
                self.selected = 0;
                self.report(err);
            }
        }
    }

    fn commit_task_name(&mut self, buffer: String) {
        if self.manager.is_active() {
            self.manager.set_task_name(buffer);
        } else {
            self.task_input = buffer;
        }
    }

    fn rename(&mut self, id: &str, new_name: &str) {
        match self.history.rename(id, new_name) {
            Ok(_) => self.status = None,
            Err(err) => self.report(err.into()),
        }
    }

    fn delete(&mut self, id: &str) {
        match self.history.delete(id) {
            Ok(true) => self.set_status("Session deleted".to_string()),
            Ok(false) => {}
            Err(err) => self.report(err.into()),
        }
        self.clamp_selection();
    }

    /// Finalize a running or paused session so quitting never loses it
    pub fn shutdown(&mut self) {
        if !self.manager.is_active() {
            return;
        }
        info!("finalizing active session on exit");
        if let Err(err) = self.manager.stop(&mut self.history) {
            warn!(error = %err, "could not save session on exit");
        }
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.history.len().saturating_sub(1));
    }

    fn set_status(&mut self, message: String) {
        self.status = Some(Status {
            message,
            is_error: false,
        });
    }

    fn report(&mut self, err: Error) {
        if err.is_invalid_transition() {
            warn!(error = %err, "rejected lifecycle call");
        }
        self.status = Some(Status {
            message: err.to_string(),
            is_error: true,
        });
    }
}

fn edit_buffer(buffer: &mut String, code: KeyCode) {
    match code {
        KeyCode::Char(c) => buffer.push(c),
        KeyCode::Backspace => {
            buffer.pop();
        }
        _ => {}
    }
}
