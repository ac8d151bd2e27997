// SPDX-License-Identifier: MIT OR Apache-2.0
//! Change topics and listener registry.

use crate::state::TimelineState;
use indexmap::IndexMap;
use std::fmt;

/// Category of state change a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Horizontal or vertical zoom
    Zoom,
    /// Scroll offsets
    Scroll,
    /// Scrollable content width
    ContentSize,
    /// Playhead position or transport flags
    Playhead,
    /// Time selection or edit cursor
    Selection,
    /// Loop region
    Loop,
    /// Punch region or punch flags
    Punch,
    /// Tempo or time signature
    Tempo,
    /// Display toggles
    Display,
    /// Arrangement sections
    Sections,
    /// Timeline length
    Timeline,
    /// Requested cursor
    CursorHint,
    /// Drag-to-zoom started or ended
    ZoomGesture,
}

impl Topic {
    /// Every topic, in bit order
    pub const ALL: [Topic; 13] = [
        Topic::Zoom,
        Topic::Scroll,
        Topic::ContentSize,
        Topic::Playhead,
        Topic::Selection,
        Topic::Loop,
        Topic::Punch,
        Topic::Tempo,
        Topic::Display,
        Topic::Sections,
        Topic::Timeline,
        Topic::CursorHint,
        Topic::ZoomGesture,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// Set of topics touched by one applied event
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Changes(u16);

impl Changes {
    /// No change
    pub const NONE: Changes = Changes(0);

    /// Every topic
    pub fn all() -> Self {
        Topic::ALL.iter().fold(Self::NONE, |acc, &t| acc.with(t))
    }

    /// Add a topic
    pub fn insert(&mut self, topic: Topic) {
        self.0 |= topic.bit();
    }

    /// Builder form of [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, topic: Topic) -> Self {
        self.insert(topic);
        self
    }

    /// Merge another set
    pub fn extend(&mut self, other: Changes) {
        self.0 |= other.0;
    }

    /// Whether `topic` is part of the set
    pub fn contains(self, topic: Topic) -> bool {
        self.0 & topic.bit() != 0
    }

    /// Whether nothing changed
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Topics in the set
    pub fn iter(self) -> impl Iterator<Item = Topic> {
        Topic::ALL.into_iter().filter(move |&t| self.contains(t))
    }
}

impl fmt::Debug for Changes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Handle returned by a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Boxed listener callback
pub type ListenerFn = Box<dyn FnMut(&TimelineState)>;

struct Listener {
    topic: Topic,
    callback: ListenerFn,
}

/// Ordered listener registry
///
/// Listeners are notified in registration order. Removal keeps the order of
/// the remaining listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: IndexMap<SubscriptionId, Listener>,
    next_id: u64,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `topic`
    pub fn subscribe(&mut self, topic: Topic, callback: ListenerFn) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.insert(id, Listener { topic, callback });
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.shift_remove(&id).is_some()
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Call every listener whose topic is in `changes`
    pub fn notify(&mut self, state: &TimelineState, changes: Changes) {
        if changes.is_empty() {
            return;
        }
        for listener in self.listeners.values_mut() {
            if changes.contains(listener.topic) {
                (listener.callback)(state);
            }
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_changes_bitset() {
        let mut changes = Changes::NONE;
        assert!(changes.is_empty());
        changes.insert(Topic::Zoom);
        changes.extend(Changes::NONE.with(Topic::Loop));
        assert!(changes.contains(Topic::Zoom));
        assert!(changes.contains(Topic::Loop));
        assert!(!changes.contains(Topic::Scroll));
        assert_eq!(changes.iter().collect::<Vec<_>>(), vec![Topic::Zoom, Topic::Loop]);
        assert_eq!(Changes::all().iter().count(), Topic::ALL.len());
    }

    #[test]
    fn test_notify_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ListenerRegistry::new();

        for name in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            registry.subscribe(Topic::Zoom, Box::new(move |_| log.borrow_mut().push(name)));
        }
        let other = Rc::clone(&log);
        registry.subscribe(Topic::Loop, Box::new(move |_| other.borrow_mut().push("loop")));

        registry.notify(&TimelineState::default(), Changes::NONE.with(Topic::Zoom));
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let count = Rc::new(RefCell::new(0));
        let mut registry = ListenerRegistry::new();

        let c = Rc::clone(&count);
        let first = registry.subscribe(Topic::Scroll, Box::new(move |_| *c.borrow_mut() += 1));
        let c = Rc::clone(&count);
        registry.subscribe(Topic::Scroll, Box::new(move |_| *c.borrow_mut() += 10));

        assert!(registry.unsubscribe(first));
        assert!(!registry.unsubscribe(first));
        assert_eq!(registry.len(), 1);

        registry.notify(&TimelineState::default(), Changes::NONE.with(Topic::Scroll));
        assert_eq!(*count.borrow(), 10);
    }
}
