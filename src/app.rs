/// Main TUI application

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::core::{DashboardConfig, DashboardSnapshot, HttpFetcher, MetricsPoller, PollLogger, TracingLogger};
use crate::screens::Dashboard;
use crate::utils::UI_TICK;

pub struct App {
    dashboard: Dashboard,
    poller: MetricsPoller,
    // Snapshots pushed by the poller after every fetch
    snapshot_rx: UnboundedReceiver<DashboardSnapshot>,
    should_quit: bool,
    show_help: bool,
    status_message: Option<String>,
}

impl App {
    pub fn new(config: Arc<DashboardConfig>) -> Self {
        let logger: Arc<dyn PollLogger> = Arc::new(TracingLogger);
        let fetcher = Arc::new(HttpFetcher::new(&config, logger.clone()));

        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();
        let poller = MetricsPoller::new(fetcher, logger).with_updates(snapshot_tx);

        Self::from_parts(
            Dashboard::new(config.metrics_url().as_str()),
            poller,
            snapshot_rx,
        )
    }

    pub fn from_parts(
        dashboard: Dashboard,
        poller: MetricsPoller,
        snapshot_rx: UnboundedReceiver<DashboardSnapshot>,
    ) -> Self {
        Self {
            dashboard,
            poller,
            snapshot_rx,
            should_quit: false,
            show_help: false,
            status_message: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = match self.poller.start() {
            Ok(()) => self.run_loop(&mut terminal).await,
            Err(e) => Err(e.into()),
        };

        self.poller.stop().await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    async fn run_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<()> {
        loop {
            self.apply_updates();

            terminal.draw(|f| self.render(f))?;

            // crossterm polling blocks, keep it off the runtime threads
            let key = tokio::task::block_in_place(|| -> io::Result<Option<KeyEvent>> {
                if event::poll(UI_TICK)? {
                    if let Event::Key(key_event) = event::read()? {
                        return Ok(Some(key_event));
                    }
                }
                Ok(None)
            })?;

            if let Some(key_event) = key {
                self.handle_key(key_event);
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Drain pending snapshots (non-blocking), keeping only the newest
    pub fn apply_updates(&mut self) -> usize {
        let mut received = 0;
        while let Ok(snapshot) = self.snapshot_rx.try_recv() {
            self.dashboard.update_snapshot(snapshot);
            received += 1;
        }
        received
    }

    pub fn handle_key(&mut self, key_event: KeyEvent) {
        self.status_message = None;

        match key_event.code {
            KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Esc => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('?') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
            }
            _ => {
                self.status_message = Some("Unknown key - press [?] for help".to_string());
            }
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    fn render(&self, frame: &mut ratatui::Frame) {
        self.dashboard
            .render(frame, self.status_message.as_deref(), self.show_help);
    }
}
