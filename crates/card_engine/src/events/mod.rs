//! Notification bus for interaction events
//!
//! Key principles:
//! - Key-value arguments (no order dependency)
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Registration system (only notify interested handlers)
//! - Queued delivery: producers `send`, the owner of the loop `dispatch`es

use std::collections::HashMap;

use crate::foundation::math::Vec3;
use crate::scene::FragmentId;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A label fragment was picked with the pointer
    LabelSelected,
    /// A selected label fragment moved across the card face
    LabelDragged,
    /// The pointer was released and the selection cleared
    LabelReleased,
    /// Camera/orbit interaction was suspended or resumed
    CameraControlChanged,
}

/// Variant for type-safe event arguments
/// Uses key-value pairs to avoid order dependency problems
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    /// Fragment handle in the card assembly
    Fragment(FragmentId),
    /// Label identifier ("fullName", "phone", ...)
    LabelId(String),
    /// Card-local position
    Position(Vec3),
    /// Enabled state
    Enabled(bool),
}

/// Event with type ID and key-value arguments
#[derive(Debug, Clone)]
pub struct Event {
    /// Type of event
    pub event_type: EventType,
    args: HashMap<&'static str, EventArg>,
}

impl Event {
    /// Create a new event with the given type
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            args: HashMap::new(),
        }
    }

    /// Add an argument to the event (builder pattern)
    pub fn with_arg(mut self, key: &'static str, value: EventArg) -> Self {
        self.args.insert(key, value);
        self
    }

    /// Get an argument by key
    pub fn get_arg(&self, key: &str) -> Option<&EventArg> {
        self.args.get(key)
    }

    /// Get fragment argument if present
    pub fn get_fragment(&self) -> Option<FragmentId> {
        if let Some(EventArg::Fragment(id)) = self.get_arg("fragment") {
            Some(*id)
        } else {
            None
        }
    }

    /// Get label id argument if present
    pub fn get_label_id(&self) -> Option<&str> {
        if let Some(EventArg::LabelId(id)) = self.get_arg("label_id") {
            Some(id.as_str())
        } else {
            None
        }
    }

    /// Get position argument if present
    pub fn get_position(&self) -> Option<Vec3> {
        if let Some(EventArg::Position(position)) = self.get_arg("position") {
            Some(*position)
        } else {
            None
        }
    }

    /// Get enabled argument if present
    pub fn get_enabled(&self) -> Option<bool> {
        if let Some(EventArg::Enabled(enabled)) = self.get_arg("enabled") {
            Some(*enabled)
        } else {
            None
        }
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
/// Returns false to allow forwarding to other handlers
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &Event) -> bool;
}

/// Event system with registration and queuing
/// Follows chain of responsibility pattern
pub struct EventSystem {
    queue: Vec<Event>,
    handlers: HashMap<EventType, Vec<Box<dyn EventHandler>>>,
}

impl EventSystem {
    /// Create a new empty event system
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a specific event type
    /// Only handlers registered for this type will be notified
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.handlers
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    /// Queue an event for the next dispatch
    pub fn send(&mut self, event: Event) {
        self.queue.push(event);
    }

    /// Number of queued events
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Dispatch all pending events to registered handlers
    pub fn dispatch(&mut self) {
        let queued = std::mem::take(&mut self.queue);
        for event in queued {
            self.dispatch_event(&event);
        }
    }

    /// Take all pending events without dispatching them
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.queue)
    }

    /// Dispatch single event to registered handlers
    /// Stops on first handler that returns true (consumed)
    fn dispatch_event(&mut self, event: &Event) {
        if let Some(handlers) = self.handlers.get_mut(&event.event_type) {
            for handler in handlers.iter_mut() {
                if handler.on_event(event) {
                    break;
                }
            }
        }
    }

    /// Clear all queued events
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingHandler {
        received: Rc<RefCell<Vec<EventType>>>,
        consume: bool,
    }

    impl EventHandler for RecordingHandler {
        fn on_event(&mut self, event: &Event) -> bool {
            self.received.borrow_mut().push(event.event_type);
            self.consume
        }
    }

    fn recorder(consume: bool) -> (Box<RecordingHandler>, Rc<RefCell<Vec<EventType>>>) {
        let received = Rc::new(RefCell::new(Vec::new()));
        let handler = Box::new(RecordingHandler { received: Rc::clone(&received), consume });
        (handler, received)
    }

    #[test]
    fn test_dispatch_reaches_registered_handler_only() {
        let mut system = EventSystem::new();
        let (handler, received) = recorder(false);
        system.register_handler(EventType::LabelSelected, handler);

        system.send(Event::new(EventType::LabelSelected)
            .with_arg("label_id", EventArg::LabelId("fullName".to_string())));
        system.send(Event::new(EventType::LabelDragged));
        system.dispatch();

        assert_eq!(*received.borrow(), vec![EventType::LabelSelected]);
        assert_eq!(system.pending(), 0);
    }

    #[test]
    fn test_event_consumption_stops_forwarding() {
        let mut system = EventSystem::new();
        let (first, first_received) = recorder(true);
        let (second, second_received) = recorder(false);
        system.register_handler(EventType::LabelReleased, first);
        system.register_handler(EventType::LabelReleased, second);

        system.send(Event::new(EventType::LabelReleased));
        system.dispatch();

        assert_eq!(first_received.borrow().len(), 1);
        assert!(second_received.borrow().is_empty());
    }

    #[test]
    fn test_typed_argument_accessors() {
        let event = Event::new(EventType::LabelDragged)
            .with_arg("position", EventArg::Position(Vec3::new(1.0, 2.0, 3.0)))
            .with_arg("enabled", EventArg::Enabled(false));

        assert_eq!(event.get_position(), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(event.get_enabled(), Some(false));
        assert_eq!(event.get_label_id(), None);
        assert_eq!(event.get_fragment(), None);
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut system = EventSystem::new();
        system.send(Event::new(EventType::CameraControlChanged));
        let drained = system.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(system.pending(), 0);
    }
}
