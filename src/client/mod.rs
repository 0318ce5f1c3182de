//! Client-side pieces: API client, background refresh scheduler, and the
//! terminal UI state machine.

pub mod api;
pub mod scheduler;
pub mod ui;

pub use api::{ApiClient, ClientError};
pub use scheduler::{RefreshApi, RefreshScheduler, SessionEvent};
pub use ui::{Command, Ui, UiEvent, UiState};
