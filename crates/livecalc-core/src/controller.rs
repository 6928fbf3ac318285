//! Debounced refresh of a document's placeholders.
//!
//! One controller per open document. The host forwards change notifications
//! to [`RefreshController::content_changed`] and calls
//! [`RefreshController::poll`] once [`RefreshController::next_deadline`] has
//! passed. A cycle runs synchronously inside `poll`, so notifications raised by
//! the controller's own replacement arrive after the cycle has finished and
//! are recognised by comparing against the last applied snapshot.

use std::time::{Duration, Instant};

use livecalc_engine::engine::{
    EvalCache, EvalOptions, MathRenderer, MathmlRenderer, RenderContext, check_functions,
    render_document,
};

use crate::error::{CoreError, Result};
use crate::surface::{EditingSurface, ReplaceOptions, Selection, SubscriptionId};
use crate::timer::DebounceTimer;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshOptions {
    /// Quiet period after the last notification before a cycle runs.
    pub debounce: Duration,
    pub eval: EvalOptions,
    pub preserve_formatting: bool,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        RefreshOptions {
            debounce: DEFAULT_DEBOUNCE,
            eval: EvalOptions::default(),
            preserve_formatting: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    /// Debounce timer running.
    Pending,
    Evaluating,
    Applying,
}

/// Why a cycle left the surface untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The snapshot is the one this controller applied last.
    OwnReplacement,
    /// No `}` anywhere in the snapshot.
    NoPlaceholders,
    /// Rendering produced the snapshot unchanged.
    Unchanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppliedCycle {
    pub placeholders: usize,
    pub failures: usize,
    /// Selection captured before the replacement and restored after it.
    pub selection: Selection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No cycle was due.
    NotDue,
    Skipped(SkipReason),
    Applied(AppliedCycle),
}

impl CycleOutcome {
    pub fn applied(&self) -> bool {
        matches!(self, CycleOutcome::Applied(_))
    }
}

pub struct RefreshController {
    options: RefreshOptions,
    cache: EvalCache,
    renderer: Box<dyn MathRenderer>,
    custom_functions: Option<String>,
    timer: DebounceTimer,
    state: RefreshState,
    last_applied: Option<String>,
    subscription: Option<SubscriptionId>,
    deferred: bool,
}

impl RefreshController {
    /// Create a controller for one document and subscribe to its changes.
    pub fn attach<S: EditingSurface>(surface: &mut S, options: RefreshOptions) -> Result<Self> {
        if options.debounce.is_zero() {
            return Err(CoreError::ZeroDebounce);
        }
        let subscription = surface.subscribe();
        log::debug!("refresh controller attached ({:?})", subscription);
        Ok(RefreshController {
            timer: DebounceTimer::new(options.debounce),
            options,
            cache: EvalCache::new(),
            renderer: Box::new(MathmlRenderer),
            custom_functions: None,
            state: RefreshState::Idle,
            last_applied: None,
            subscription: Some(subscription),
            deferred: false,
        })
    }

    pub fn with_renderer(mut self, renderer: Box<dyn MathRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Make the functions defined in `script` callable from every arithmetic
    /// placeholder. The script must compile.
    pub fn with_functions(mut self, script: impl Into<String>) -> Result<Self> {
        let script = script.into();
        if !script.trim().is_empty() {
            check_functions(&script).map_err(CoreError::Functions)?;
            self.custom_functions = Some(script);
        }
        Ok(self)
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn cache(&self) -> &EvalCache {
        &self.cache
    }

    pub fn options(&self) -> &RefreshOptions {
        &self.options
    }

    pub fn last_applied(&self) -> Option<&str> {
        self.last_applied.as_deref()
    }

    /// When the pending cycle is due, if one is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// A change notification from the surface.
    pub fn content_changed(&mut self, now: Instant) {
        match self.state {
            RefreshState::Idle | RefreshState::Pending => {
                self.timer.schedule(now);
                self.state = RefreshState::Pending;
            }
            RefreshState::Evaluating | RefreshState::Applying => {
                log::debug!("change during {:?} deferred", self.state);
                self.deferred = true;
            }
        }
    }

    /// Run the pending cycle if its debounce has expired.
    pub fn poll<S: EditingSurface>(&mut self, now: Instant, surface: &mut S) -> CycleOutcome {
        if self.state != RefreshState::Pending || self.timer.fire(now).is_none() {
            return CycleOutcome::NotDue;
        }
        self.run_cycle(now, surface)
    }

    /// Run a cycle immediately, dropping any pending debounce.
    pub fn refresh_now<S: EditingSurface>(&mut self, now: Instant, surface: &mut S) -> CycleOutcome {
        self.timer.cancel();
        self.run_cycle(now, surface)
    }

    /// Unsubscribe and cancel the pending cycle.
    pub fn teardown<S: EditingSurface>(mut self, surface: &mut S) {
        if self.timer.cancel().is_some() {
            log::debug!("pending refresh cancelled by teardown");
        }
        if let Some(id) = self.subscription.take() {
            surface.unsubscribe(id);
        }
    }

    fn run_cycle<S: EditingSurface>(&mut self, now: Instant, surface: &mut S) -> CycleOutcome {
        self.state = RefreshState::Evaluating;
        let outcome = self.evaluate_and_apply(surface);
        log::debug!("refresh cycle finished: {:?}", outcome);

        self.state = RefreshState::Idle;
        if std::mem::take(&mut self.deferred) {
            self.content_changed(now);
        }
        outcome
    }

    fn evaluate_and_apply<S: EditingSurface>(&mut self, surface: &mut S) -> CycleOutcome {
        let snapshot = surface.content_snapshot();
        if self.last_applied.as_deref() == Some(snapshot.as_str()) {
            return CycleOutcome::Skipped(SkipReason::OwnReplacement);
        }
        if !snapshot.contains('}') {
            return CycleOutcome::Skipped(SkipReason::NoPlaceholders);
        }

        let ctx = RenderContext {
            cache: &self.cache,
            renderer: self.renderer.as_ref(),
            options: &self.options.eval,
            custom_functions: self.custom_functions.as_deref(),
        };
        let rendered = render_document(&snapshot, &ctx);
        if rendered.markup == snapshot {
            return CycleOutcome::Skipped(SkipReason::Unchanged);
        }

        self.state = RefreshState::Applying;
        let selection = surface.selection();
        surface.replace_content(
            &rendered.markup,
            ReplaceOptions {
                preserve_formatting: self.options.preserve_formatting,
            },
        );
        surface.set_selection(selection);
        self.last_applied = Some(rendered.markup);

        CycleOutcome::Applied(AppliedCycle {
            placeholders: rendered.placeholders,
            failures: rendered.failures,
            selection,
        })
    }
}
