//! In-memory editing surface.

use crate::surface::{EditingSurface, ReplaceOptions, Selection, SubscriptionId};

/// A document held as a markup string.
///
/// Every content change while a subscription is live counts as one pending
/// notification; the host drains them with [`take_notifications`] and feeds
/// them to the controller. Selections are clamped to the content length.
///
/// [`take_notifications`]: BufferSurface::take_notifications
#[derive(Clone, Debug, Default)]
pub struct BufferSurface {
    content: String,
    selection: Selection,
    subscribers: Vec<SubscriptionId>,
    next_subscription: u64,
    notifications: usize,
    replacements: Vec<ReplaceOptions>,
}

impl BufferSurface {
    pub fn new(content: impl Into<String>) -> Self {
        BufferSurface {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// An edit made by the author (as opposed to a controller replacement).
    pub fn edit(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.selection = self.clamp(self.selection);
        self.notify();
    }

    /// Number of notifications raised since the last call.
    pub fn take_notifications(&mut self) -> usize {
        std::mem::take(&mut self.notifications)
    }

    /// Options of every `replace_content` call so far, oldest first.
    pub fn replacements(&self) -> &[ReplaceOptions] {
        &self.replacements
    }

    pub fn replace_count(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_subscribed(&self) -> bool {
        !self.subscribers.is_empty()
    }

    fn notify(&mut self) {
        if self.is_subscribed() {
            self.notifications += 1;
        }
    }

    fn clamp(&self, selection: Selection) -> Selection {
        let len = self.content.len();
        Selection::new(selection.from.min(len), selection.to.min(len))
    }
}

impl EditingSurface for BufferSurface {
    fn content_snapshot(&self) -> String {
        self.content.clone()
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = self.clamp(selection);
    }

    fn replace_content(&mut self, snapshot: &str, options: ReplaceOptions) {
        self.content = snapshot.to_string();
        self.replacements.push(options);
        // Replacing resets the selection, as rich-text editors do.
        self.selection = Selection::caret(self.content.len());
        self.notify();
    }

    fn subscribe(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(id);
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|s| *s != id);
    }
}
