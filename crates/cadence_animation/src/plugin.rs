//! Tween plugins
//!
//! A plugin hooks three points of a tween's life:
//!
//! - `init`: a property is seen for the first time and needs a starting value
//! - `step`: a `to` step was appended
//! - `change`: a property is about to be written during playback
//!
//! Plugins installed on the registry get `init` for every tween. Plugins
//! added to a single tween (usually from their own `init`) get `step` and
//! `change` for that tween only. Both lists are ordered by ascending priority.

use std::rc::Rc;

use crate::tween::Tween;
use crate::value::{PropMap, PropValue};

/// What a plugin hook wants done with a property
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PluginOutcome {
    /// Carry on normally
    #[default]
    Default,
    /// Use this value instead
    Value(PropValue),
    /// Drop the property: skip tracking it (from `init`) or skip writing it
    /// (from `change`)
    Suppress,
}

/// Read-only view of a step handed to plugin hooks
#[derive(Debug, Clone, Copy)]
pub struct StepView<'a> {
    pub index: usize,
    pub start: f64,
    pub duration: f64,
    pub passive: bool,
    /// Property values at the end of this step
    pub props: &'a PropMap,
    /// Property values at the end of the previous step
    pub prev_props: &'a PropMap,
    /// Whether this step shares its snapshot with its predecessor (a wait)
    pub is_wait: bool,
}

pub trait Plugin {
    /// Unique id. Adding a plugin to a tween twice is a no-op.
    fn id(&self) -> &str;

    fn priority(&self) -> i32 {
        0
    }

    /// Called, highest priority first, when `tween` meets `prop` for the
    /// first time. `value` is what earlier plugins proposed.
    fn init(&self, tween: &Tween, prop: &str, value: Option<&PropValue>) -> PluginOutcome {
        let _ = (tween, prop, value);
        PluginOutcome::Default
    }

    /// Called, highest priority first, after `props` were appended as a new step
    fn step(&self, tween: &Tween, step: &StepView<'_>, props: &PropMap) {
        let _ = (tween, step, props);
    }

    /// Called, lowest priority first, before `prop` is written to the target
    fn change(
        &self,
        tween: &Tween,
        step: &StepView<'_>,
        prop: &str,
        value: &PropValue,
        ratio: f64,
        end: bool,
    ) -> PluginOutcome {
        let _ = (tween, step, prop, value, ratio, end);
        PluginOutcome::Default
    }
}

/// Insert `plugin` into a priority-ordered list. Equal priorities keep
/// insertion order. Returns `false` if a plugin with the same id is present.
pub(crate) fn insert_by_priority(list: &mut Vec<Rc<dyn Plugin>>, plugin: Rc<dyn Plugin>) -> bool {
    if list.iter().any(|p| p.id() == plugin.id()) {
        return false;
    }
    let priority = plugin.priority();
    let index = list
        .iter()
        .position(|p| p.priority() > priority)
        .unwrap_or(list.len());
    list.insert(index, plugin);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, i32);

    impl Plugin for Named {
        fn id(&self) -> &str {
            self.0
        }

        fn priority(&self) -> i32 {
            self.1
        }
    }

    #[test]
    fn priority_order_is_stable() {
        let mut list: Vec<Rc<dyn Plugin>> = Vec::new();
        insert_by_priority(&mut list, Rc::new(Named("b", 5)));
        insert_by_priority(&mut list, Rc::new(Named("a", 0)));
        insert_by_priority(&mut list, Rc::new(Named("c", 5)));
        insert_by_priority(&mut list, Rc::new(Named("d", -1)));

        let ids: Vec<&str> = list.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn duplicate_ids_are_ignored() {
        let mut list: Vec<Rc<dyn Plugin>> = Vec::new();
        assert!(insert_by_priority(&mut list, Rc::new(Named("a", 0))));
        assert!(!insert_by_priority(&mut list, Rc::new(Named("a", 3))));
        assert_eq!(list.len(), 1);
    }
}
