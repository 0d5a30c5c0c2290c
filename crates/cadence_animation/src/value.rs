//! Property values carried by tween steps
//!
//! Numbers interpolate. Everything else switches discretely at the end of a
//! step.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::motion_guide::MotionGuide;

/// An ordered name → value snapshot
pub type PropMap = IndexMap<String, PropValue>;

/// A value a tween can drive on its target
#[derive(Clone, Default)]
pub enum PropValue {
    /// The target had no value for this property
    #[default]
    Null,
    Number(f64),
    Bool(bool),
    Text(String),
    /// Motion-guide path description, consumed by the motion guide plugin
    Guide(Rc<MotionGuide>),
}

impl PropValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_guide(&self) -> Option<&Rc<MotionGuide>> {
        match self {
            PropValue::Guide(g) => Some(g),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, PropValue::Number(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropValue::Null)
    }
}

/// Guides compare by identity, everything else by value.
impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Number(a), PropValue::Number(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Text(a), PropValue::Text(b)) => a == b,
            (PropValue::Guide(a), PropValue::Guide(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => write!(f, "Null"),
            PropValue::Number(n) => write!(f, "Number({n})"),
            PropValue::Bool(b) => write!(f, "Bool({b})"),
            PropValue::Text(s) => write!(f, "Text({s:?})"),
            PropValue::Guide(g) => write!(f, "Guide({:?})", g.spec()),
        }
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<f32> for PropValue {
    fn from(value: f32) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

impl From<Rc<MotionGuide>> for PropValue {
    fn from(value: Rc<MotionGuide>) -> Self {
        PropValue::Guide(value)
    }
}

/// Build a [`PropMap`] from `name => value` pairs
///
/// ```
/// use cadence_animation::{props, PropValue};
///
/// let map = props! { "x" => 100.0, "visible" => true };
/// assert_eq!(map.get("x"), Some(&PropValue::Number(100.0)));
/// ```
#[macro_export]
macro_rules! props {
    () => { $crate::PropMap::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::PropMap::new();
        $( map.insert(::std::string::String::from($name), $crate::PropValue::from($value)); )+
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion_guide::GuideSpec;

    #[test]
    fn guides_compare_by_identity() {
        let spec = GuideSpec::new(vec![0.0, 0.0, 50.0, 0.0, 100.0, 0.0]);
        let a = MotionGuide::new(spec.clone());
        let b = MotionGuide::new(spec);

        assert_eq!(PropValue::Guide(a.clone()), PropValue::Guide(a.clone()));
        assert_ne!(PropValue::Guide(a), PropValue::Guide(b));
    }

    #[test]
    fn accessors_match_variants() {
        assert_eq!(PropValue::from(2).as_number(), Some(2.0));
        assert_eq!(PropValue::from(true).as_bool(), Some(true));
        assert_eq!(PropValue::from("a").as_text(), Some("a"));
        assert!(PropValue::Null.is_null());
        assert!(!PropValue::from("1").is_number());
        assert_ne!(PropValue::from(1.0), PropValue::from("1"));
    }

    #[test]
    fn props_macro_keeps_insertion_order() {
        let map = props! { "y" => 1.0, "x" => 2.0, "label" => "a" };
        let names: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["y", "x", "label"]);
        assert!(props! {}.is_empty());
    }
}
