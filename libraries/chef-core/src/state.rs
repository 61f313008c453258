//! Reactive state store
//!
//! A key/value context with synchronous change notification, used to fan
//! preset updates out to the UI components that render them.
//!
//! Two kinds of callbacks can be registered per key:
//! - **Watchers** observe the new value after it is stored.
//! - **Reducers** derive a further `(key, value)` update from the new value,
//!   which is fed back into [`StateStore::set_prop`] before watchers run.
//!
//! Setting a key to a value equal to the stored one is a no-op and fires
//! nothing. Callbacks run synchronously, in registration order, on the
//! calling thread. Registration is append-only.
//!
//! The store is an explicit context object: create one, share it via `Rc`,
//! and pass it to whatever needs it. There is no process-wide singleton.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::warn;

/// Value type stored per key.
///
/// JSON values compare structurally, which is what the idempotence guard in
/// [`StateStore::set_prop`] needs, and they serialize the same way the preset
/// blobs do.
pub type StateValue = serde_json::Value;

type Watcher = Rc<dyn Fn(&StateValue)>;
type Reducer = Rc<dyn Fn(&StateValue) -> (String, StateValue)>;

#[derive(Default)]
struct Registry {
    values: HashMap<String, StateValue>,
    watchers: HashMap<String, Vec<Watcher>>,
    reducers: HashMap<String, Vec<Reducer>>,
}

/// Watchable key/value state
#[derive(Default)]
pub struct StateStore {
    registry: RefCell<Registry>,
    // Keys currently being updated in this cascade. A reducer that loops back
    // to a key on this stack is dropped instead of recursing forever.
    cascade: RefCell<Vec<String>>,
}

impl StateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key` and notify.
    ///
    /// No-op when `value` equals the currently stored value. Otherwise the
    /// value is stored, every reducer registered for `key` derives a further
    /// update which is applied recursively, and finally every watcher for
    /// `key` is invoked with the new value.
    pub fn set_prop(&self, key: &str, value: StateValue) {
        if self.registry.borrow().values.get(key) == Some(&value) {
            return;
        }

        if self.cascade.borrow().iter().any(|k| k == key) {
            warn!(key, "reducer cycle detected, dropping re-entrant update");
            return;
        }
        self.cascade.borrow_mut().push(key.to_string());

        self.registry
            .borrow_mut()
            .values
            .insert(key.to_string(), value.clone());

        // Clone the callback lists so no borrow is held while user callbacks
        // run; they are free to call back into the store.
        let reducers: Vec<Reducer> = self
            .registry
            .borrow()
            .reducers
            .get(key)
            .cloned()
            .unwrap_or_default();
        for reducer in reducers {
            let (derived_key, derived_value) = reducer(&value);
            self.set_prop(&derived_key, derived_value);
        }

        let watchers: Vec<Watcher> = self
            .registry
            .borrow()
            .watchers
            .get(key)
            .cloned()
            .unwrap_or_default();
        for watcher in watchers {
            watcher(&value);
        }

        self.cascade.borrow_mut().pop();
    }

    /// Current value for `key`, if any
    pub fn get_prop(&self, key: &str) -> Option<StateValue> {
        self.registry.borrow().values.get(key).cloned()
    }

    /// Current value for `key`, or `default` when the key is absent
    pub fn get_prop_or(&self, key: &str, default: StateValue) -> StateValue {
        self.get_prop(key).unwrap_or(default)
    }

    /// Register a watcher for `key`
    pub fn set_watcher(&self, key: &str, callback: impl Fn(&StateValue) + 'static) {
        self.registry
            .borrow_mut()
            .watchers
            .entry(key.to_string())
            .or_default()
            .push(Rc::new(callback));
    }

    /// Register a reducer for `key`
    pub fn set_reducers(
        &self,
        key: &str,
        callback: impl Fn(&StateValue) -> (String, StateValue) + 'static,
    ) {
        self.registry
            .borrow_mut()
            .reducers
            .entry(key.to_string())
            .or_default()
            .push(Rc::new(callback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_after_set_returns_value() {
        let store = StateStore::new();
        store.set_prop("ext", json!("wav"));
        assert_eq!(store.get_prop("ext"), Some(json!("wav")));
    }

    #[test]
    fn missing_key_yields_default() {
        let store = StateStore::new();
        assert_eq!(store.get_prop("nope"), None);
        assert_eq!(store.get_prop_or("nope", json!(42)), json!(42));
    }

    #[test]
    fn watcher_fires_on_change() {
        let store = StateStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        store.set_watcher("ext", move |v| sink.borrow_mut().push(v.clone()));

        store.set_prop("ext", json!("mp3"));
        store.set_prop("ext", json!("flac"));
        assert_eq!(*seen.borrow(), vec![json!("mp3"), json!("flac")]);
    }

    #[test]
    fn equal_value_does_not_reinvoke_watchers() {
        let store = StateStore::new();
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        store.set_watcher("ext", move |_| *sink.borrow_mut() += 1);

        store.set_prop("ext", json!("wav"));
        store.set_prop("ext", json!("wav"));
        assert_eq!(*count.borrow(), 1);
        assert_eq!(store.get_prop("ext"), Some(json!("wav")));
    }

    #[test]
    fn watchers_run_in_registration_order() {
        let store = StateStore::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let sink = order.clone();
            store.set_watcher("k", move |_| sink.borrow_mut().push(tag));
        }

        store.set_prop("k", json!(1));
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn reducer_derives_further_update() {
        let store = StateStore::new();
        store.set_reducers("preset", |v| {
            ("ext".to_string(), v.get("ext").cloned().unwrap_or_default())
        });
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        store.set_watcher("ext", move |v| *sink.borrow_mut() = Some(v.clone()));

        store.set_prop("preset", json!({ "ext": "ogg" }));
        assert_eq!(store.get_prop("ext"), Some(json!("ogg")));
        assert_eq!(*seen.borrow(), Some(json!("ogg")));
    }

    #[test]
    fn reducer_runs_before_watcher_of_same_key() {
        let store = StateStore::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let sink = order.clone();
        store.set_reducers("a", move |_| {
            sink.borrow_mut().push("reducer");
            ("b".to_string(), json!(true))
        });
        let sink = order.clone();
        store.set_watcher("a", move |_| sink.borrow_mut().push("watcher"));

        store.set_prop("a", json!(1));
        assert_eq!(*order.borrow(), vec!["reducer", "watcher"]);
    }

    #[test]
    fn reducer_cycle_terminates() {
        let store = StateStore::new();
        // a -> b -> a, would recurse forever without the cascade guard
        store.set_reducers("a", |v| ("b".to_string(), v.clone()));
        store.set_reducers("b", |v| ("a".to_string(), json!([v])));

        store.set_prop("a", json!(0));
        assert_eq!(store.get_prop("a"), Some(json!(0)));
        assert_eq!(store.get_prop("b"), Some(json!(0)));
    }

    #[test]
    fn self_referencing_reducer_terminates() {
        let store = StateStore::new();
        store.set_reducers("a", |v| {
            ("a".to_string(), json!(v.as_i64().unwrap_or(0) + 1))
        });

        store.set_prop("a", json!(1));
        // The re-entrant update is dropped, the original value stays.
        assert_eq!(store.get_prop("a"), Some(json!(1)));
    }
}
