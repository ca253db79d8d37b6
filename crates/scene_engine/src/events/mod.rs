//! Per-node event bus
//!
//! Key properties of the dispatch model:
//! - Synchronous: every matching subscriber runs before `fire` returns
//! - Ordered: subscribers run in registration order
//! - Retained values: the last value fired for a name is replayed to late
//!   subscribers at registration time, so they learn current state without
//!   polling
//! - Handle-based removal: subscription keys come from a versioned slot map,
//!   so a stale or doubled `off` is a harmless no-op

use crate::scene::NodeRef;
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;
use std::fmt;

new_key_type! {
    /// Opaque, reusable handle for one subscription on one bus.
    pub struct SubscriptionKey;
}

/// Payload carried by a fired event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    /// No payload (e.g. a cleared child slot).
    Null,
    /// Boolean payload (e.g. `dirty`, `destroyed`).
    Bool(bool),
    /// Numeric payload (e.g. a coerced scalar property).
    Number(f64),
    /// Text payload (e.g. a formatted log record).
    Text(String),
    /// Reference to a node in the same scene (e.g. a newly attached child).
    Node(NodeRef),
    /// Structured payload (e.g. tick info or an error record).
    Json(serde_json::Value),
}

impl EventValue {
    /// Boolean payload, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric payload, if this is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Node payload, if this is one.
    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Text payload, if this is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Structured payload, if this is one.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Subscription handle returned by [`crate::scene::Scene::on`]: the bus key
/// plus the node the bus belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    node: NodeRef,
    key: SubscriptionKey,
}

impl Subscription {
    pub(crate) fn new(node: NodeRef, key: SubscriptionKey) -> Self {
        Self { node, key }
    }

    /// Node whose bus this subscription lives on.
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    pub(crate) fn key(&self) -> SubscriptionKey {
        self.key
    }
}

type Callback = Box<dyn FnMut(&EventValue)>;

struct Subscriber {
    name: String,
    callback: Callback,
    once: bool,
    // Guards `once` subscribers against re-entrant double delivery.
    spent: bool,
}

/// Event bus embedded in every node.
#[derive(Default)]
pub struct EventBus {
    subs: SlotMap<SubscriptionKey, Subscriber>,
    order: HashMap<String, Vec<SubscriptionKey>>,
    retained: HashMap<String, EventValue>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subs.len())
            .field("retained", &self.retained.len())
            .finish()
    }
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `name`.
    ///
    /// If a retained value exists for `name` the callback is invoked with it
    /// immediately, before `on` returns.
    pub fn on(&mut self, name: &str, callback: impl FnMut(&EventValue) + 'static) -> SubscriptionKey {
        self.subscribe(name, Box::new(callback), false)
    }

    /// Register `callback` to run at most once for `name`.
    ///
    /// A retained value counts as the one delivery: the subscription is
    /// consumed during registration in that case.
    pub fn once(
        &mut self,
        name: &str,
        callback: impl FnMut(&EventValue) + 'static,
    ) -> SubscriptionKey {
        self.subscribe(name, Box::new(callback), true)
    }

    fn subscribe(&mut self, name: &str, callback: Callback, once: bool) -> SubscriptionKey {
        let key = self.subs.insert(Subscriber {
            name: name.to_owned(),
            callback,
            once,
            spent: false,
        });
        self.order.entry(name.to_owned()).or_default().push(key);

        if let Some(value) = self.retained.get(name).cloned() {
            let mut consumed = false;
            if let Some(sub) = self.subs.get_mut(key) {
                if sub.once {
                    sub.spent = true;
                    consumed = true;
                }
                (sub.callback)(&value);
            }
            if consumed {
                self.remove(key);
            }
        }
        key
    }

    /// Remove a subscription. Idempotent: unknown or stale keys are ignored.
    pub fn off(&mut self, key: SubscriptionKey) {
        self.remove(key);
    }

    /// Invoke every current subscriber for `name`, in subscription order.
    ///
    /// When `retain` is set, `value` overwrites the retained value for `name`
    /// before dispatch, so subscribers added during a callback see it too.
    pub fn fire(&mut self, name: &str, value: EventValue, retain: bool) {
        if retain {
            self.retained.insert(name.to_owned(), value.clone());
        }
        let Some(keys) = self.order.get(name).cloned() else {
            return;
        };
        for key in keys {
            let mut consumed = false;
            if let Some(sub) = self.subs.get_mut(key) {
                if sub.spent {
                    continue;
                }
                if sub.once {
                    sub.spent = true;
                    consumed = true;
                }
                (sub.callback)(&value);
            }
            if consumed {
                self.remove(key);
            }
        }
    }

    /// Last retained value for `name`, if any.
    pub fn retained(&self, name: &str) -> Option<&EventValue> {
        self.retained.get(name)
    }

    /// Number of live subscriptions across all event names.
    pub fn subscriber_count(&self) -> usize {
        self.subs.len()
    }

    fn remove(&mut self, key: SubscriptionKey) {
        if let Some(sub) = self.subs.remove(key) {
            if let Some(keys) = self.order.get_mut(&sub.name) {
                keys.retain(|k| *k != key);
                if keys.is_empty() {
                    self.order.remove(&sub.name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<EventValue>>>, impl FnMut(&EventValue)) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |value: &EventValue| {
            sink.borrow_mut().push(value.clone());
        })
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let mut bus = EventBus::new();
        let trace = Rc::new(RefCell::new(Vec::new()));
        for label in ["a", "b", "c"] {
            let sink = Rc::clone(&trace);
            bus.on("ping", move |_| sink.borrow_mut().push(label));
        }

        bus.fire("ping", EventValue::Null, true);
        assert_eq!(*trace.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn retained_value_replays_to_late_subscriber_exactly_once() {
        let mut bus = EventBus::new();
        bus.fire("radius", EventValue::Number(5.0), true);

        let (seen, callback) = recorder();
        bus.on("radius", callback);

        assert_eq!(*seen.borrow(), vec![EventValue::Number(5.0)]);

        bus.fire("radius", EventValue::Number(7.0), true);
        assert_eq!(
            *seen.borrow(),
            vec![EventValue::Number(5.0), EventValue::Number(7.0)]
        );
    }

    #[test]
    fn unretained_fire_does_not_replay() {
        let mut bus = EventBus::new();
        bus.fire("dirty", EventValue::Bool(true), false);

        let (seen, callback) = recorder();
        bus.on("dirty", callback);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn retain_overwrites_previous_value() {
        let mut bus = EventBus::new();
        bus.fire("radius", EventValue::Number(1.0), true);
        bus.fire("radius", EventValue::Number(2.0), true);
        assert_eq!(bus.retained("radius"), Some(&EventValue::Number(2.0)));
    }

    #[test]
    fn off_is_idempotent() {
        let mut bus = EventBus::new();
        let (seen, callback) = recorder();
        let key = bus.on("ping", callback);

        bus.off(key);
        bus.off(key); // stale key, no-op
        bus.fire("ping", EventValue::Null, false);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn once_fires_at_most_once() {
        let mut bus = EventBus::new();
        let (seen, callback) = recorder();
        bus.once("ping", callback);

        bus.fire("ping", EventValue::Number(1.0), false);
        bus.fire("ping", EventValue::Number(2.0), false);
        assert_eq!(*seen.borrow(), vec![EventValue::Number(1.0)]);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn once_consumed_by_retained_replay() {
        let mut bus = EventBus::new();
        bus.fire("ready", EventValue::Bool(true), true);

        let (seen, callback) = recorder();
        bus.once("ready", callback);

        assert_eq!(*seen.borrow(), vec![EventValue::Bool(true)]);

        bus.fire("ready", EventValue::Bool(false), true);
        assert_eq!(*seen.borrow(), vec![EventValue::Bool(true)]);
    }

    #[test]
    fn events_with_different_names_are_independent() {
        let mut bus = EventBus::new();
        let (seen, callback) = recorder();
        bus.on("a", callback);

        bus.fire("b", EventValue::Number(9.0), true);
        assert!(seen.borrow().is_empty());
    }
}
