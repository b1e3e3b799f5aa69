// Library surface shared by the binary and the integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod manager;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod ui;

pub use error::{Error, PersistenceError, Result, SessionError};
pub use history::HistoryStore;
pub use manager::SessionManager;
pub use session::{ActiveSession, SessionRecord, SessionState};
