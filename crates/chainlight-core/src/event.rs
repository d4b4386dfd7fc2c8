//! Typed event system with pre-allocated ring buffers.
//!
//! Events are emitted while clicks are handled and while the tick pipeline
//! runs, and are delivered in batch during the post-tick phase. Each event
//! kind has its own [`EventBuffer`] with a configurable capacity.
//!
//! Subscribers are passive: they observe events for UI, audio, or logging
//! and cannot mutate the world from inside delivery.
//!
//! Event kinds can be suppressed via [`EventBus::suppress`], which prevents
//! any allocation or recording for that kind.

use crate::fixed::Ticks;
use crate::id::AgentId;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Chain --
    /// A click started a chain; `hops` agents were marked `BeingLit`.
    ChainStarted {
        origin: AgentId,
        hops: usize,
        tick: Ticks,
    },
    AgentBeingLit {
        agent: AgentId,
        source: AgentId,
        tick: Ticks,
    },
    AgentLit {
        agent: AgentId,
        tick: Ticks,
    },
    /// The terminal agent of a chain finished its reveal.
    ChainCompleted {
        origin: AgentId,
        terminal: AgentId,
        tick: Ticks,
    },

    // -- Feedback --
    FeedbackStarted {
        agent: AgentId,
        target: AgentId,
        tick: Ticks,
    },
    FeedbackDelivered {
        agent: AgentId,
        target: AgentId,
        tick: Ticks,
    },
    /// Every hop of the chain rooted at `origin` has played its feedback.
    FeedbackCompleted {
        origin: AgentId,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ChainStarted,
    AgentBeingLit,
    AgentLit,
    ChainCompleted,
    FeedbackStarted,
    FeedbackDelivered,
    FeedbackCompleted,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 7;

impl Event {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ChainStarted { .. } => EventKind::ChainStarted,
            Event::AgentBeingLit { .. } => EventKind::AgentBeingLit,
            Event::AgentLit { .. } => EventKind::AgentLit,
            Event::ChainCompleted { .. } => EventKind::ChainCompleted,
            Event::FeedbackStarted { .. } => EventKind::FeedbackStarted,
            Event::FeedbackDelivered { .. } => EventKind::FeedbackDelivered,
            Event::FeedbackCompleted { .. } => EventKind::FeedbackCompleted,
        }
    }

    /// The tick stamped on this event.
    pub fn tick(&self) -> Ticks {
        match self {
            Event::ChainStarted { tick, .. }
            | Event::AgentBeingLit { tick, .. }
            | Event::AgentLit { tick, .. }
            | Event::ChainCompleted { tick, .. }
            | Event::FeedbackStarted { tick, .. }
            | Event::FeedbackDelivered { tick, .. }
            | Event::FeedbackCompleted { tick, .. } => *tick,
        }
    }
}

impl EventKind {
    /// All kinds, in index order.
    pub const ALL: [EventKind; EVENT_KIND_COUNT] = [
        EventKind::ChainStarted,
        EventKind::AgentBeingLit,
        EventKind::AgentLit,
        EventKind::ChainCompleted,
        EventKind::FeedbackStarted,
        EventKind::FeedbackDelivered,
        EventKind::FeedbackCompleted,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer: pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
    /// Events overwritten before they were read.
    dropped: u64,
}

impl EventBuffer {
    /// Create a new ring buffer with the given capacity.
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
            dropped: 0,
        }
    }

    /// Push an event into the ring buffer. If full, the oldest event is dropped.
    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        } else {
            self.dropped += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events that were dropped because the buffer was full.
    /// Survives [`clear`](Self::clear), like `total_written`.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Iterate over events in order from oldest to newest.
    pub fn iter(&self) -> EventBufferIter<'_> {
        let start = if self.len < self.capacity() {
            0
        } else {
            // head is the next write position, which holds the oldest entry
            self.head
        };
        EventBufferIter {
            buffer: self,
            index: start,
            remaining: self.len,
        }
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

/// Iterator over events in an [`EventBuffer`], from oldest to newest.
pub struct EventBufferIter<'a> {
    buffer: &'a EventBuffer,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for EventBufferIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let event = self.buffer.events[self.index].as_ref();
        self.index = (self.index + 1) % self.buffer.capacity();
        self.remaining -= 1;
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EventBufferIter<'_> {}

// ---------------------------------------------------------------------------
// Subscribers
// ---------------------------------------------------------------------------

/// A passive listener receives events read-only.
pub type PassiveListener = Box<dyn FnMut(&Event)>;

/// Optional predicate that filters events for a subscriber.
pub type EventFilter = Box<dyn Fn(&Event) -> bool>;

/// Priority level for event subscribers. Lower priorities run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubscriberPriority {
    Pre = 0,
    Normal = 1,
    Post = 2,
}

struct SubscriberEntry {
    listener: PassiveListener,
    priority: SubscriberPriority,
    filter: Option<EventFilter>,
    insertion_order: u64,
}

impl std::fmt::Debug for SubscriberEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberEntry")
            .field("priority", &self.priority)
            .field("filtered", &self.filter.is_some())
            .field("insertion_order", &self.insertion_order)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Holds one ring buffer per event kind, subscriber lists, and suppression
/// flags.
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    subscribers: [Vec<SubscriberEntry>; EVENT_KIND_COUNT],
    default_capacity: usize,
    /// Monotonically increasing counter for stable sort ordering.
    next_insertion_order: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("default_capacity", &self.default_capacity)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create a new event bus with the given default buffer capacity per kind.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            subscribers: Default::default(),
            default_capacity,
            next_insertion_order: 0,
        }
    }

    /// Suppress an event kind. Suppressed events are never allocated or buffered.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Record an event in its kind's ring buffer. No-op if suppressed.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        let capacity = self.default_capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    /// Register a listener with Normal priority and no filter. Listeners of
    /// equal priority run in registration order.
    pub fn on_passive(&mut self, kind: EventKind, listener: PassiveListener) {
        self.on_passive_filtered(kind, SubscriberPriority::Normal, None, listener);
    }

    /// Register a listener with explicit priority and optional filter.
    pub fn on_passive_filtered(
        &mut self,
        kind: EventKind,
        priority: SubscriberPriority,
        filter: Option<EventFilter>,
        listener: PassiveListener,
    ) {
        let order = self.next_insertion_order;
        self.next_insertion_order += 1;
        let list = &mut self.subscribers[kind.index()];
        list.push(SubscriberEntry {
            listener,
            priority,
            filter,
            insertion_order: order,
        });
        list.sort_by_key(|entry| (entry.priority, entry.insertion_order));
    }

    /// Deliver all buffered events to subscribers, kind by kind, oldest
    /// first, then clear the buffers. Called during post-tick.
    pub fn deliver(&mut self) {
        for idx in 0..EVENT_KIND_COUNT {
            let Some(buffer) = self.buffers[idx].as_mut() else {
                continue;
            };
            if buffer.is_empty() {
                continue;
            }

            for entry in &mut self.subscribers[idx] {
                for event in buffer.iter() {
                    if let Some(filter) = &entry.filter
                        && !filter(event)
                    {
                        continue;
                    }
                    (entry.listener)(event);
                }
            }

            buffer.clear();
        }
    }

    /// Get the event buffer for a specific kind (read-only).
    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    /// Count of events currently buffered for a kind.
    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffers[kind.index()].as_ref().map_or(0, EventBuffer::len)
    }

    /// Total events ever emitted for a kind (including dropped).
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffers[kind.index()]
            .as_ref()
            .map_or(0, EventBuffer::total_written)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn agent_ids() -> (AgentId, AgentId) {
        let mut sm = SlotMap::<AgentId, ()>::with_key();
        (sm.insert(()), sm.insert(()))
    }

    fn lit(agent: AgentId, tick: Ticks) -> Event {
        Event::AgentLit { agent, tick }
    }

    #[test]
    fn event_buffer_ring_wraps_and_drops_oldest() {
        let (a, _) = agent_ids();
        let mut buf = EventBuffer::new(3);
        for t in 0..5 {
            buf.push(lit(a, t));
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.total_written(), 5);
        assert_eq!(buf.dropped_count(), 2);
        let ticks: Vec<_> = buf.iter().map(Event::tick).collect();
        assert_eq!(ticks, vec![2, 3, 4]);
    }

    #[test]
    fn event_buffer_clear_is_not_a_drop() {
        let (a, _) = agent_ids();
        let mut buf = EventBuffer::new(4);
        for t in 0..3 {
            buf.push(lit(a, t));
        }
        buf.clear();
        for t in 3..6 {
            buf.push(lit(a, t));
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.total_written(), 6);
        assert_eq!(buf.dropped_count(), 0);

        // Two more overflow the ring by one.
        buf.push(lit(a, 6));
        buf.push(lit(a, 7));
        assert_eq!(buf.dropped_count(), 1);
        let ticks: Vec<_> = buf.iter().map(Event::tick).collect();
        assert_eq!(ticks, vec![4, 5, 6, 7]);
    }

    #[test]
    fn event_buffer_zero_capacity_clamped() {
        let (a, _) = agent_ids();
        let mut buf = EventBuffer::new(0);
        assert_eq!(buf.capacity(), 1);
        buf.push(lit(a, 1));
        buf.push(lit(a, 2));
        assert_eq!(buf.iter().next().map(Event::tick), Some(2));
        assert_eq!(buf.iter().len(), 1);
    }

    #[test]
    fn suppressed_events_not_buffered() {
        let (a, _) = agent_ids();
        let mut bus = EventBus::new(8);
        bus.suppress(EventKind::AgentLit);
        bus.emit(lit(a, 0));
        assert!(bus.buffer(EventKind::AgentLit).is_none());
        assert_eq!(bus.total_emitted(EventKind::AgentLit), 0);
        assert!(bus.is_suppressed(EventKind::AgentLit));
    }

    #[test]
    fn delivery_reaches_listeners_and_clears() {
        let (a, b) = agent_ids();
        let mut bus = EventBus::new(8);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.on_passive(
            EventKind::FeedbackStarted,
            Box::new(move |e| sink.borrow_mut().push(e.clone())),
        );
        bus.emit(Event::FeedbackStarted {
            agent: b,
            target: a,
            tick: 3,
        });
        bus.emit(lit(a, 3));
        bus.deliver();

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(bus.buffered_count(EventKind::FeedbackStarted), 0);
        assert_eq!(bus.buffered_count(EventKind::AgentLit), 0);
        assert_eq!(bus.total_emitted(EventKind::FeedbackStarted), 1);
    }

    #[test]
    fn priorities_order_listeners() {
        let (a, _) = agent_ids();
        let mut bus = EventBus::new(8);
        let order = Rc::new(RefCell::new(Vec::new()));
        for (label, priority) in [
            ("post", SubscriberPriority::Post),
            ("normal", SubscriberPriority::Normal),
            ("pre", SubscriberPriority::Pre),
        ] {
            let order = Rc::clone(&order);
            bus.on_passive_filtered(
                EventKind::AgentLit,
                priority,
                None,
                Box::new(move |_| order.borrow_mut().push(label)),
            );
        }
        bus.emit(lit(a, 0));
        bus.deliver();
        assert_eq!(*order.borrow(), vec!["pre", "normal", "post"]);
    }

    #[test]
    fn filter_blocks_non_matching() {
        let (a, b) = agent_ids();
        let mut bus = EventBus::new(8);
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        bus.on_passive_filtered(
            EventKind::AgentLit,
            SubscriberPriority::Normal,
            Some(Box::new(move |e| matches!(e, Event::AgentLit { agent, .. } if *agent == b))),
            Box::new(move |_| *c.borrow_mut() += 1),
        );
        bus.emit(lit(a, 0));
        bus.emit(lit(b, 0));
        bus.emit(lit(a, 1));
        bus.deliver();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn kinds_cover_all_events() {
        let (a, b) = agent_ids();
        let events = [
            Event::ChainStarted { origin: a, hops: 1, tick: 0 },
            Event::AgentBeingLit { agent: b, source: a, tick: 0 },
            lit(b, 0),
            Event::ChainCompleted { origin: a, terminal: b, tick: 0 },
            Event::FeedbackStarted { agent: b, target: a, tick: 0 },
            Event::FeedbackDelivered { agent: b, target: a, tick: 0 },
            Event::FeedbackCompleted { origin: a, tick: 0 },
        ];
        let kinds: Vec<_> = events.iter().map(Event::kind).collect();
        assert_eq!(kinds, EventKind::ALL.to_vec());
    }
}
