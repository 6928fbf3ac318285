//! The editing surface a refresh controller works against.
//!
//! Cursor handling, undo, formatting and everything else about editing stays
//! with the surface; the controller only reads snapshots, swaps content and
//! puts the selection back.

/// Selection offsets in the surface's own coordinate space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub from: usize,
    pub to: usize,
}

impl Selection {
    pub fn new(from: usize, to: usize) -> Self {
        Selection { from, to }
    }

    pub fn caret(at: usize) -> Self {
        Selection { from: at, to: at }
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplaceOptions {
    /// Keep marks and block formatting of the incoming markup as-is.
    pub preserve_formatting: bool,
}

impl Default for ReplaceOptions {
    fn default() -> Self {
        ReplaceOptions {
            preserve_formatting: true,
        }
    }
}

/// Handle returned by [`EditingSurface::subscribe`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct SubscriptionId(pub u64);

/// What a host editor exposes to the refresh loop.
///
/// Change notifications are delivered by the host calling
/// [`RefreshController::content_changed`](crate::RefreshController::content_changed)
/// for every notification raised while the subscription is live.
pub trait EditingSurface {
    /// Serialized markup of the whole document.
    fn content_snapshot(&self) -> String;

    fn selection(&self) -> Selection;

    fn set_selection(&mut self, selection: Selection);

    /// Replace the whole content in one step.
    fn replace_content(&mut self, snapshot: &str, options: ReplaceOptions);

    /// Start delivering change notifications.
    fn subscribe(&mut self) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId);
}
