//! Watch mode: a file on disk driven through the refresh controller.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use livecalc_core::{BufferSurface, CoreError, CycleOutcome, RefreshController, RefreshOptions};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The file's content mirrored in a [`BufferSurface`]. Disk changes become
/// edits; applied cycles are handed back for writing.
pub struct WatchSession {
    surface: BufferSurface,
    controller: RefreshController,
}

impl WatchSession {
    pub fn start(options: RefreshOptions, functions: &str) -> Result<Self, CoreError> {
        let mut surface = BufferSurface::new("");
        let controller = RefreshController::attach(&mut surface, options)?.with_functions(functions)?;
        Ok(WatchSession {
            surface,
            controller,
        })
    }

    /// Feed the file's current content. Returns the new content to write
    /// when a cycle replaced it.
    pub fn step(&mut self, now: Instant, on_disk: &str) -> Option<String> {
        if on_disk != self.surface.content() {
            self.surface.edit(on_disk);
        }
        for _ in 0..self.surface.take_notifications() {
            self.controller.content_changed(now);
        }
        match self.controller.poll(now, &mut self.surface) {
            CycleOutcome::Applied(cycle) => {
                log::info!(
                    "evaluated {} placeholders ({} failed)",
                    cycle.placeholders,
                    cycle.failures
                );
                Some(self.surface.content().to_string())
            }
            _ => None,
        }
    }

    #[cfg(test)]
    fn replace_count(&self) -> usize {
        self.surface.replace_count()
    }
}

/// Watch `path` until the process is interrupted.
pub fn run(path: &Path, mut session: WatchSession) -> anyhow::Result<()> {
    log::info!("watching {}", path.display());
    loop {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if let Some(markup) = session.step(Instant::now(), &content) {
            std::fs::write(path, markup)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn applies_after_debounce_and_ignores_own_write() {
        let start = Instant::now();
        let mut session = WatchSession::start(RefreshOptions::default(), "").unwrap();

        assert_eq!(session.step(start, "<p>{1+1}</p>"), None);
        assert_eq!(session.step(start + ms(300), "<p>{1+1}</p>"), Some("<p>2</p>".to_string()));

        // The file now holds what was written.
        assert_eq!(session.step(start + ms(350), "<p>2</p>"), None);
        assert_eq!(session.step(start + ms(700), "<p>2</p>"), None);
        assert_eq!(session.replace_count(), 1);
    }

    #[test]
    fn edits_during_debounce_restart_it() {
        let start = Instant::now();
        let mut session = WatchSession::start(RefreshOptions::default(), "").unwrap();

        assert_eq!(session.step(start, "<p>{2*</p>"), None);
        assert_eq!(session.step(start + ms(250), "<p>{2*4}</p>"), None);
        assert_eq!(session.step(start + ms(400), "<p>{2*4}</p>"), None);
        assert_eq!(session.step(start + ms(550), "<p>{2*4}</p>"), Some("<p>8</p>".to_string()));
    }

    #[test]
    fn functions_are_available() {
        let start = Instant::now();
        let mut session = WatchSession::start(RefreshOptions::default(), "fn sq(x) { x * x }").unwrap();
        session.step(start, "{sq(9)}");
        assert_eq!(session.step(start + ms(300), "{sq(9)}"), Some("81".to_string()));
    }
}
