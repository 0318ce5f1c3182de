//! Terminal UI state machine
//!
//! Single-threaded event loop core: every input line and every scheduler
//! event funnels through [`Ui::handle`], which mutates state and returns a
//! [`Command`] for the driver to execute. The struct itself performs no I/O,
//! so transitions are unit testable without a server.

use crate::models::TokenPair;

use super::scheduler::SessionEvent;

/// Input to the event loop: a line of user input or a scheduler message.
/// One channel carries both so the loop stays single-threaded.
#[derive(Debug)]
pub enum UiEvent {
    Line(String),
    Session(SessionEvent),
}

/// Which screen the user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    /// Not signed in; only auth commands are accepted.
    Auth,
    /// Signed in with a live token pair.
    Browse,
}

/// What the driver should do after an event is handled.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    None,
    Quit,
    SignIn { login: String, password: String },
    SignUp { login: String, password: String },
    /// Fetch and display vault records.
    Sync,
    /// Store a new free-text record.
    AddText(String),
    /// Drop the session and stop the refresh scheduler.
    Logout,
}

/// UI model: current screen, held tokens, and a one-line status message.
pub struct Ui {
    state: UiState,
    tokens: Option<TokenPair>,
    status: String,
}

impl Ui {
    pub fn new() -> Self {
        Self {
            state: UiState::Auth,
            tokens: None,
            status: "Sign in to continue. Commands: signin <login> <password>, signup <login> <password>, quit".to_string(),
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Access token of the live session, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.access_token.as_str())
    }

    /// Called by the driver after a successful sign-in or sign-up.
    pub fn authenticated(&mut self, tokens: TokenPair) {
        self.tokens = Some(tokens);
        self.state = UiState::Browse;
        self.status = "Signed in. Commands: list, add <text>, logout, quit".to_string();
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn handle(&mut self, event: UiEvent) -> Command {
        match event {
            UiEvent::Line(line) => self.handle_line(&line),
            UiEvent::Session(session_event) => self.handle_session_event(session_event),
        }
    }

    pub fn handle_session_event(&mut self, event: SessionEvent) -> Command {
        match event {
            SessionEvent::TokensRefreshed(pair) => {
                if self.state == UiState::Browse {
                    self.tokens = Some(pair);
                }
                Command::None
            }
            SessionEvent::RefreshFailed(e) => {
                // The session is gone; drop the tokens and fall back to the
                // auth screen regardless of what the user was doing.
                self.tokens = None;
                self.state = UiState::Auth;
                self.status = format!("Session ended ({}). Sign in again.", e);
                Command::None
            }
        }
    }

    pub fn handle_line(&mut self, line: &str) -> Command {
        let mut words = line.split_whitespace();
        let verb = match words.next() {
            Some(v) => v,
            None => return Command::None,
        };

        if verb == "quit" || verb == "exit" {
            return Command::Quit;
        }

        match self.state {
            UiState::Auth => self.handle_auth_line(verb, words),
            UiState::Browse => self.handle_browse_line(verb, words),
        }
    }

    fn handle_auth_line<'a>(
        &mut self,
        verb: &str,
        mut args: impl Iterator<Item = &'a str>,
    ) -> Command {
        match verb {
            "signin" | "signup" => {
                let (login, password) = match (args.next(), args.next()) {
                    (Some(l), Some(p)) => (l.to_string(), p.to_string()),
                    _ => {
                        self.status = format!("Usage: {} <login> <password>", verb);
                        return Command::None;
                    }
                };
                if verb == "signin" {
                    Command::SignIn { login, password }
                } else {
                    Command::SignUp { login, password }
                }
            }
            _ => {
                self.status =
                    "Unknown command. Commands: signin <login> <password>, signup <login> <password>, quit".to_string();
                Command::None
            }
        }
    }

    fn handle_browse_line<'a>(
        &mut self,
        verb: &str,
        args: impl Iterator<Item = &'a str>,
    ) -> Command {
        match verb {
            "list" | "sync" => Command::Sync,
            "add" => {
                let text = args.collect::<Vec<_>>().join(" ");
                if text.is_empty() {
                    self.status = "Usage: add <text>".to_string();
                    Command::None
                } else {
                    Command::AddText(text)
                }
            }
            "logout" => {
                self.tokens = None;
                self.state = UiState::Auth;
                self.status = "Signed out.".to_string();
                Command::Logout
            }
            _ => {
                self.status =
                    "Unknown command. Commands: list, add <text>, logout, quit".to_string();
                Command::None
            }
        }
    }
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}
