//! Terminal Dashboard
//!
//! Full-screen view of the live metrics for operators at the field:
//! connection header, core metrics, and the raw contents of the latest
//! payload.

mod ui;
mod view;

pub use ui::render;
pub use view::DashboardView;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::application::services::RawPayloadStore;
use crate::domain::aggregator::MetricAggregator;
use crate::domain::streaming::FeedState;

/// Shared sources the dashboard reads each refresh.
#[derive(Debug, Clone)]
pub struct DashboardSources {
    /// Metric aggregator.
    pub aggregator: Arc<MetricAggregator>,
    /// Feed status.
    pub feed_state: Arc<FeedState>,
    /// Latest raw payload.
    pub raw_store: Arc<RawPayloadStore>,
}

impl DashboardSources {
    /// Build the view from the current shared state.
    #[must_use]
    pub fn view(&self) -> DashboardView {
        let rolling = self.aggregator.rolling_summary();
        let latest = self.aggregator.latest_summary();
        let raw = self.raw_store.snapshot();
        DashboardView::build(
            self.feed_state.state(),
            &rolling,
            latest.as_ref(),
            raw.as_ref(),
            Utc::now(),
        )
    }
}

/// Whether a key press ends the dashboard.
#[must_use]
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Initialize the terminal for full-screen mode.
///
/// # Errors
///
/// Returns an error if the terminal cannot enter raw mode.
pub fn init_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Restore the terminal to normal mode.
///
/// # Errors
///
/// Returns an error if the terminal mode cannot be reset.
pub fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Redraw every `refresh` until a quit key or cancellation.
///
/// Blocks the calling thread; run it on a blocking task. Cancels `cancel`
/// on a quit key so the feed tasks stop with it.
///
/// # Errors
///
/// Returns an error if the terminal cannot be drawn or read.
pub fn run_dashboard(
    sources: &DashboardSources,
    refresh: Duration,
    cancel: &CancellationToken,
) -> io::Result<()> {
    let mut terminal = init_terminal()?;
    let result = draw_loop(&mut terminal, sources, refresh, cancel);
    let restored = restore_terminal();
    result.and(restored)
}

fn draw_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    sources: &DashboardSources,
    refresh: Duration,
    cancel: &CancellationToken,
) -> io::Result<()> {
    while !cancel.is_cancelled() {
        let view = sources.view();
        terminal.draw(|f| render(f, &view))?;

        if event::poll(refresh)?
            && let Event::Key(key) = event::read()?
            && is_quit_key(&key)
        {
            tracing::info!("Dashboard quit requested");
            cancel.cancel();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(KeyCode::Char('q'), KeyModifiers::NONE => true ; "q")]
    #[test_case(KeyCode::Esc, KeyModifiers::NONE => true ; "escape")]
    #[test_case(KeyCode::Char('c'), KeyModifiers::CONTROL => true ; "ctrl c")]
    #[test_case(KeyCode::Char('c'), KeyModifiers::NONE => false ; "plain c")]
    #[test_case(KeyCode::Enter, KeyModifiers::NONE => false ; "enter")]
    fn quit_keys(code: KeyCode, modifiers: KeyModifiers) -> bool {
        is_quit_key(&KeyEvent::new(code, modifiers))
    }

    #[test]
    fn key_release_is_ignored() {
        let mut key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert!(!is_quit_key(&key));
    }

    #[test]
    fn sources_build_view_from_shared_state() {
        let sources = DashboardSources {
            aggregator: Arc::new(MetricAggregator::default()),
            feed_state: Arc::new(FeedState::new()),
            raw_store: Arc::new(RawPayloadStore::new()),
        };
        let view = sources.view();
        assert_eq!(view.connection, "STARTING");
        assert_eq!(view.last_event, "--");
        assert!(view.last_update.ends_with("s ago)"));
    }
}
