use cortex_tui::api::CortexClient;
use cortex_tui::chat::{ChatSession, StateDelta};
use cortex_tui::chat_view::draw_chat;
use cortex_tui::key_handlers::handle_key;
use cortex_tui::session::SessionStore;
use cortex_tui::{config, logging, App};
use crossterm::{
    event::{self, Event as CEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    config::initialize_config()?;
    let cfg = config::get_config();
    let data_dir = config::data_dir();

    // Handle must outlive the app; dropping it stops the logger.
    let _logger = logging::init(&cfg.log_level, &data_dir)?;
    log::info!("starting cortex-tui against {}", cfg.base_url);

    let (delta_tx, delta_rx) = mpsc::channel::<StateDelta>(100);
    let store = SessionStore::open(data_dir);
    let client = CortexClient::new(cfg.base_url.clone());
    let session = ChatSession::new(store, client, delta_tx);
    session.spawn_history_fetch();

    let app = App::new(session);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, delta_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

/// Enum for the different event sources feeding the UI loop.
enum Event {
    Input(CEvent),
    Tick,
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    mut delta_rx: mpsc::Receiver<StateDelta>,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<Event>(100);

    // Input reader: polls the terminal and emits ticks for animations.
    tokio::spawn(async move {
        let mut last_tick = Instant::now();
        loop {
            if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                if let Ok(ev) = event::read() {
                    if tx.send(Event::Input(ev)).await.is_err() {
                        return;
                    }
                }
            }

            if last_tick.elapsed() >= Duration::from_millis(100) {
                if tx.send(Event::Tick).await.is_err() {
                    return;
                }
                last_tick = Instant::now();
            }
        }
    });

    loop {
        terminal.draw(|f| draw_chat(f, &mut app))?;

        tokio::select! {
            Some(event) = rx.recv() => {
                match event {
                    Event::Input(CEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        handle_key(&mut app, key).await;
                    }
                    Event::Input(_) => {}
                    Event::Tick => app.update_tick(),
                }
            }
            Some(delta) = delta_rx.recv() => {
                app.on_delta(delta).await;
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
