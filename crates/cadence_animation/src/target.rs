//! Tween targets
//!
//! The engine only ever reads and writes named properties on a target. It
//! never owns it beyond the shared handle and never calls anything else.

use std::cell::RefCell;
use std::rc::Rc;

use crate::value::{PropMap, PropValue};

/// Anything with named, assignable properties
pub trait Target {
    /// Current value of `name`, or `None` if the target has no such property
    fn get(&self, name: &str) -> Option<PropValue>;

    fn set(&mut self, name: &str, value: PropValue);
}

/// Shared handle to a target, as held by tweens
pub type SharedTarget = Rc<RefCell<dyn Target>>;

/// Identity of a target allocation, used for per-target bookkeeping
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TargetKey(usize);

impl TargetKey {
    pub fn of(target: &SharedTarget) -> Self {
        Self(Rc::as_ptr(target) as *const () as usize)
    }
}

/// A plain property bag target backed by an ordered map
#[derive(Clone, Debug, Default)]
pub struct PropertyBag {
    values: PropMap,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a property
    pub fn with(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// Wrap into a shared handle
    pub fn shared(self) -> Rc<RefCell<PropertyBag>> {
        Rc::new(RefCell::new(self))
    }

    pub fn value(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    /// Numeric value of `name`, if it holds a number
    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(PropValue::as_number)
    }

    pub fn values(&self) -> &PropMap {
        &self.values
    }
}

impl Target for PropertyBag {
    fn get(&self, name: &str) -> Option<PropValue> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: PropValue) {
        self.values.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_reads_and_writes() {
        let mut bag = PropertyBag::new().with("x", 1.0).with("name", "sofa");
        assert_eq!(bag.number("x"), Some(1.0));
        assert_eq!(bag.get("name"), Some(PropValue::from("sofa")));
        assert_eq!(bag.get("missing"), None);

        bag.set("x", PropValue::from(5.0));
        assert_eq!(bag.number("x"), Some(5.0));
    }

    #[test]
    fn target_keys_follow_allocation_identity() {
        let a = PropertyBag::new().shared();
        let b = PropertyBag::new().shared();
        let a_dyn: SharedTarget = a.clone();
        let a_again: SharedTarget = a;
        let b_dyn: SharedTarget = b;

        assert_eq!(TargetKey::of(&a_dyn), TargetKey::of(&a_again));
        assert_ne!(TargetKey::of(&a_dyn), TargetKey::of(&b_dyn));
    }
}
