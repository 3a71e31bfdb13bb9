//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, mouse, resize)
//! - SessionClient for the embedded session host
//! - DisplayState for rendering
//!
//! The App:
//! 1. Converts terminal events to HostEvents
//! 2. Sends events to the embedded host via SessionClient
//! 3. Receives HostMessages and updates DisplayState
//! 4. Renders based on DisplayState

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use live_session_core::{OverlayPanel, ScrollDirection, SessionConfigFile};

use crate::display::DisplayState;
use crate::session_client::SessionClient;
use crate::ui::{self, FrameMetrics, SettingsSummary};

/// Main application state
pub struct App {
    // === Core State ===
    /// Is the app still running?
    running: bool,

    // === Host Integration ===
    /// Client for the embedded session host
    client: SessionClient,
    /// Display state derived from HostMessages
    display: DisplayState,

    // === Rendering ===
    /// Rows shown in the settings popup
    settings: SettingsSummary,
    /// Layout facts from the last frame (for scroll bounds)
    metrics: FrameMetrics,
    /// Last frame time (for notification timers)
    last_frame: Instant,
}

impl App {
    /// Create a new App instance
    pub fn new(config: &SessionConfigFile) -> Self {
        Self {
            running: true,
            client: SessionClient::new(config),
            display: DisplayState::new(),
            settings: SettingsSummary::from_config(config),
            metrics: FrameMetrics::default(),
            last_frame: Instant::now(),
        }
    }

    /// Run the main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        // Target ~10 FPS; replies and capture results are applied per frame
        let frame_duration = Duration::from_millis(100);

        // Create async event stream for non-blocking terminal events
        let mut event_stream = EventStream::new();

        self.client.start().await;
        self.process_host_messages();

        // Render initial frame immediately so user sees UI
        self.render(terminal)?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                // Check for terminal events - highest priority
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => match event {
                            // Only handle Press events (not Release or Repeat)
                            Event::Key(key) if key.kind == KeyEventKind::Press => {
                                self.handle_key(key).await;
                            }
                            Event::Mouse(mouse) => self.handle_mouse(mouse).await,
                            _ => {}
                        },
                        Some(Err(e)) => tracing::warn!("Terminal event error: {}", e),
                        None => self.running = false,
                    }
                }

                // Frame tick
                _ = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            // Apply due replies and capture results
            self.client.poll().await;

            // Receive and process messages from the host
            self.process_host_messages();

            self.update();
            self.render(terminal)?;

            if self.display.quitting {
                self.running = false;
            }

            // Frame rate limiting
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                tokio::time::sleep(frame_duration - elapsed).await;
            }
        }

        Ok(())
    }

    fn process_host_messages(&mut self) {
        for msg in self.client.recv_all() {
            self.display.apply_message(msg);
        }
    }

    /// Handle keyboard input
    async fn handle_key(&mut self, key: event::KeyEvent) {
        let result = match key.code {
            // Quit, or close the media panel first if it is open
            KeyCode::Esc if self.display.media.visible => self.client.close_media().await,
            KeyCode::Esc => self.quit().await,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit().await
            }

            // Submit message
            KeyCode::Enter => self.client.submit().await,

            // Typing
            KeyCode::Char(c) => {
                self.display.input.push(c);
                self.client.input_changed(self.display.input.clone()).await
            }
            KeyCode::Backspace => {
                self.display.input.pop();
                self.client.input_changed(self.display.input.clone()).await
            }

            // Media controls
            KeyCode::F(2) => self.client.toggle_media().await,
            KeyCode::F(3) => self.client.toggle_audio().await,
            KeyCode::F(4) => self.client.toggle_video().await,
            KeyCode::F(5) => self.client.select_overlay(OverlayPanel::Chat).await,
            KeyCode::F(6) => self.client.select_overlay(OverlayPanel::Settings).await,
            KeyCode::F(7) => self.client.gift().await,

            // Conversation scrolling
            KeyCode::PageUp => {
                let page = (self.metrics.conversation_height / 2).max(1);
                self.display.scroll_up(page, self.metrics.conversation_lines);
                self.client.user_scrolled(ScrollDirection::Up).await
            }
            KeyCode::PageDown => {
                let page = (self.metrics.conversation_height / 2).max(1);
                self.display.scroll_down(page);
                self.client.user_scrolled(ScrollDirection::Down).await
            }
            KeyCode::Home if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.display.scroll_offset = self.metrics.conversation_lines.saturating_sub(1);
                self.client.user_scrolled(ScrollDirection::Top).await
            }
            KeyCode::End if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.display.scroll_offset = 0;
                self.client.user_scrolled(ScrollDirection::Bottom).await
            }

            _ => Ok(()),
        };

        if let Err(e) = result {
            tracing::warn!(key = ?key.code, "Key handling failed: {}", e);
        }
        self.process_host_messages();
    }

    /// Handle mouse input
    async fn handle_mouse(&mut self, mouse: event::MouseEvent) {
        let result = match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.display.scroll_up(3, self.metrics.conversation_lines);
                self.client.user_scrolled(ScrollDirection::Up).await
            }
            MouseEventKind::ScrollDown => {
                self.display.scroll_down(3);
                self.client.user_scrolled(ScrollDirection::Down).await
            }
            _ => Ok(()),
        };

        if let Err(e) = result {
            tracing::warn!("Mouse handling failed: {}", e);
        }
    }

    async fn quit(&mut self) -> anyhow::Result<()> {
        self.client.request_quit().await?;
        self.running = false;
        Ok(())
    }

    /// Update timers
    fn update(&mut self) {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.display.update(delta);
    }

    fn render(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let display = &self.display;
        let settings = &self.settings;
        let mut metrics = self.metrics;
        terminal.draw(|frame| metrics = ui::draw(frame, display, settings))?;
        self.metrics = metrics;
        Ok(())
    }

    /// Goodbye message to print after the terminal is restored
    pub fn goodbye(&self) -> Option<&str> {
        self.display.goodbye.as_deref()
    }
}
