//! Interactive terminal client for the VaultKeeper server.
//!
//! One event loop owns the UI state; stdin lines and refresh-scheduler
//! events are funneled into the same channel so the loop never blocks on
//! either source.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use vaultkeeper::client::{ApiClient, Command, RefreshScheduler, SessionEvent, Ui, UiEvent};
use vaultkeeper::models::{TextRecord, TokenPair};

const DEFAULT_SERVER_URL: &str = "http://localhost:8081";
const DEFAULT_REFRESH_SECONDS: u64 = 25;

enum Event {
    Ui(UiEvent),
    StdinClosed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let server_url =
        std::env::var("VAULT_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
    let refresh_period = std::env::var("VAULT_REFRESH_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_REFRESH_SECONDS);
    let refresh_period = Duration::from_secs(refresh_period);

    let api = Arc::new(ApiClient::new(server_url));
    let (events_tx, mut events_rx) = mpsc::channel::<Event>(32);

    // Stdin reader task; forwards each line into the shared event channel.
    let stdin_tx = events_tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if stdin_tx.send(Event::Ui(UiEvent::Line(line))).await.is_err() {
                        return;
                    }
                }
                Ok(None) | Err(_) => {
                    let _ = stdin_tx.send(Event::StdinClosed).await;
                    return;
                }
            }
        }
    });

    let mut ui = Ui::new();
    let mut scheduler: Option<RefreshScheduler> = None;
    println!("{}", ui.status());

    while let Some(event) = events_rx.recv().await {
        let command = match event {
            Event::Ui(ui_event) => ui.handle(ui_event),
            Event::StdinClosed => Command::Quit,
        };

        match command {
            Command::None => {}
            Command::Quit => break,
            Command::SignIn { login, password } => {
                match api.sign_in(&login, &password).await {
                    Ok(tokens) => {
                        start_session(
                            &mut ui,
                            &mut scheduler,
                            api.clone(),
                            tokens,
                            refresh_period,
                            events_tx.clone(),
                        )
                        .await;
                    }
                    Err(e) => ui.set_status(format!("Sign-in failed: {}", e)),
                }
            }
            Command::SignUp { login, password } => {
                match api.sign_up(&login, &password).await {
                    Ok(tokens) => {
                        start_session(
                            &mut ui,
                            &mut scheduler,
                            api.clone(),
                            tokens,
                            refresh_period,
                            events_tx.clone(),
                        )
                        .await;
                    }
                    Err(e) => ui.set_status(format!("Sign-up failed: {}", e)),
                }
            }
            Command::Sync => {
                if let Some(token) = ui.access_token().map(str::to_string) {
                    sync_vault(&api, &token, &mut ui).await;
                }
            }
            Command::AddText(text) => {
                if let Some(token) = ui.access_token().map(str::to_string) {
                    let record = TextRecord {
                        text,
                        ..Default::default()
                    };
                    match api.create_text(&token, &record).await {
                        Ok(()) => ui.set_status("Saved."),
                        Err(e) => ui.set_status(format!("Save failed: {}", e)),
                    }
                }
            }
            Command::Logout => {
                if let Some(s) = scheduler.take() {
                    s.shutdown().await;
                }
            }
        }

        println!("{}", ui.status());
    }

    if let Some(s) = scheduler.take() {
        s.shutdown().await;
    }
    Ok(())
}

async fn start_session(
    ui: &mut Ui,
    scheduler: &mut Option<RefreshScheduler>,
    api: Arc<ApiClient>,
    tokens: TokenPair,
    period: Duration,
    events_tx: mpsc::Sender<Event>,
) {
    // Replace any scheduler from a previous session before starting a new one.
    if let Some(old) = scheduler.take() {
        old.shutdown().await;
    }

    let (session_tx, mut session_rx) = mpsc::channel::<SessionEvent>(16);
    *scheduler = Some(RefreshScheduler::spawn(
        api,
        tokens.clone(),
        period,
        session_tx,
    ));
    tokio::spawn(async move {
        while let Some(ev) = session_rx.recv().await {
            if events_tx.send(Event::Ui(UiEvent::Session(ev))).await.is_err() {
                return;
            }
        }
    });

    ui.authenticated(tokens);
}

async fn sync_vault(api: &ApiClient, access_token: &str, ui: &mut Ui) {
    let text = api.list_text(access_token).await;
    let cards = api.list_cards(access_token).await;
    let credentials = api.list_credentials(access_token).await;

    match (text, cards, credentials) {
        (Ok(text), Ok(cards), Ok(credentials)) => {
            for record in &text {
                println!("text #{}: {} ({})", record.id, record.text, record.metadata);
            }
            for record in &cards {
                println!(
                    "card #{}: {} exp {} ({})",
                    record.id, record.card_number, record.exp_date, record.metadata
                );
            }
            for record in &credentials {
                println!(
                    "cred #{}: {} ({})",
                    record.id, record.login, record.metadata
                );
            }
            ui.set_status(format!(
                "{} text, {} card, {} credential records.",
                text.len(),
                cards.len(),
                credentials.len()
            ));
        }
        (text, cards, credentials) => {
            let e = [
                text.err().map(|e| e.to_string()),
                cards.err().map(|e| e.to_string()),
                credentials.err().map(|e| e.to_string()),
            ]
            .into_iter()
            .flatten()
            .next()
            .unwrap_or_else(|| "unknown error".to_string());
            ui.set_status(format!("Sync failed: {}", e));
        }
    }
}
