//! The three built-in container variants: `List`, `Map`, `Object`. Each is
//! a thin `Rc<RefCell<..>>` wrapper so container identity and mutation are
//! shared the way a reference type should be.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::identity::ValueIdentity;
use crate::value::Value;

#[derive(Default)]
pub struct ArkList {
    pub items: Vec<Value>,
}

impl ArkList {
    pub fn new(items: Vec<Value>) -> Self {
        ArkList { items }
    }

    /// Recomputed on every read rather than cached at construction, so a
    /// mutation via `set`/`push`/`pop` is always reflected immediately.
    pub fn length(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.get(index).cloned()
    }

    pub fn set(&mut self, index: usize, value: Value) -> Option<Value> {
        let slot = self.items.get_mut(index)?;
        *slot = value.clone();
        Some(value)
    }
}

/// `Map` keys are compared by raw identity, not structural equality. For
/// interned primitives those coincide; for containers and closures they
/// don't, which is a known sharp edge rather than an oversight.
#[derive(Default)]
pub struct ArkMap {
    entries: HashMap<ValueIdentity, (Value, Value)>,
}

impl ArkMap {
    pub fn new() -> Self {
        ArkMap::default()
    }

    pub fn get(&self, key: &Value) -> Value {
        self.entries
            .get(&ValueIdentity::of(key))
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null)
    }

    pub fn set(&mut self, key: Value, value: Value) {
        self.entries
            .insert(ValueIdentity::of(&key), (key, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates `(key, value)` pairs. Used by the host adapter, since
    /// arbitrary Ark values as keys have no homomorphic JSON shape — the
    /// host projection renders a `Map` as an array of pairs rather than a
    /// JSON object.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.values().map(|(k, v)| (k, v))
    }
}

/// `Object` fields are looked up by plain string key. An absent property
/// read returns `Null`; a write always succeeds and creates the entry.
#[derive(Default)]
pub struct ArkObject {
    pub fields: HashMap<Rc<str>, Value>,
}

impl ArkObject {
    pub fn new() -> Self {
        ArkObject::default()
    }

    pub fn get(&self, name: &str) -> Value {
        self.fields.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn set(&mut self, name: Rc<str>, value: Value) {
        self.fields.insert(name, value);
    }
}

pub type ListHandle = Rc<RefCell<ArkList>>;
pub type MapHandle = Rc<RefCell<ArkMap>>;
pub type ObjectHandle = Rc<RefCell<ArkObject>>;
