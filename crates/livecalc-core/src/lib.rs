//! livecalc-core - UI-agnostic refresh loop over an editing surface.

pub mod buffer;
pub mod controller;
pub mod error;
pub mod surface;
pub mod timer;

pub use buffer::BufferSurface;
pub use controller::{
    AppliedCycle, CycleOutcome, DEFAULT_DEBOUNCE, RefreshController, RefreshOptions, RefreshState,
    SkipReason,
};
pub use error::{CoreError, Result};
pub use surface::{EditingSurface, ReplaceOptions, Selection, SubscriptionId};
pub use timer::{DebounceTimer, TimerHandle};

pub use livecalc_engine::engine::{EvalCache, EvalOptions, MathRenderer, MathmlRenderer};
