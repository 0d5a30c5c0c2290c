//! Motion guides: move a target along a chain of quadratic Bezier curves
//!
//! A tween step carrying a `guide` property drives the target's `x` and `y`
//! (and, with an orientation, `rotation`) along the path instead of
//! interpolating them linearly. Arc length is approximated per curve by
//! sampling chord lengths, so a uniform ratio moves at a near-constant speed.
//!
//! ```
//! use cadence_animation::{props, Animation, AnimationRegistry, Easing, GuideSpec, MotionGuide,
//!     MotionGuidePlugin, PropertyBag, TweenProps};
//!
//! let registry = AnimationRegistry::new();
//! MotionGuidePlugin::install(&registry);
//!
//! let ship = PropertyBag::new().with("x", 0.0).with("y", 0.0).shared();
//! let guide = MotionGuide::new(GuideSpec::new(vec![0.0, 0.0, 50.0, 100.0, 100.0, 0.0]));
//! let tween = registry.get(ship.clone(), TweenProps::default());
//! tween.to(props! { "guide" => guide }, 1000.0, Easing::Linear);
//!
//! registry.tick(1000.0, false);
//! assert!((ship.borrow().number("x").unwrap() - 100.0).abs() < 1e-6);
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use crate::error::{self, GuideError};
use crate::plugin::{Plugin, PluginOutcome, StepView};
use crate::registry::AnimationRegistry;
use crate::tween::Tween;
use crate::value::{PropMap, PropValue};

/// Name of the property that carries a guide
pub const GUIDE: &str = "guide";

/// Chord samples taken per curve
pub const DEFAULT_PRECISION: usize = 10;

/// Window around ratio 1 inside which the exact end rotation is used
const END_RATIO_EPSILON: f64 = 0.00001;

/// How a guided target is rotated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Rotation is not touched
    #[default]
    None,
    /// Keep the starting offset from the path tangent
    Fixed,
    /// Follow the tangent and ease towards the final rotation by the shortest raw delta
    Auto,
    /// Like `Auto`, but only ever turning clockwise
    Clockwise,
    /// Like `Auto`, but only ever turning counter-clockwise
    CounterClockwise,
}

impl FromStr for Orientation {
    type Err = GuideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Orientation::None),
            "fixed" => Ok(Orientation::Fixed),
            "auto" => Ok(Orientation::Auto),
            "cw" => Ok(Orientation::Clockwise),
            "ccw" => Ok(Orientation::CounterClockwise),
            other => Err(GuideError::UnknownOrientation(other.to_string())),
        }
    }
}

/// Path description: `[sx, sy, (cx, cy, ex, ey)+]`
#[derive(Debug, Clone, PartialEq)]
pub struct GuideSpec {
    pub path: Vec<f64>,
    /// Where along the path (0..=1 of its length) the step starts
    pub start: f64,
    /// Where along the path the step ends. May be below `start`.
    pub end: f64,
    pub orient: Orientation,
    pub precision: usize,
}

impl GuideSpec {
    pub fn new(path: Vec<f64>) -> Self {
        Self {
            path,
            start: 0.0,
            end: 1.0,
            orient: Orientation::None,
            precision: DEFAULT_PRECISION,
        }
    }

    pub fn with_range(mut self, start: f64, end: f64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_orient(mut self, orient: Orientation) -> Self {
        self.orient = orient;
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Check the description without solving it
    pub fn validate(&self) -> Result<(), GuideError> {
        let len = self.path.len();
        if len < 6 || (len - 2) % 4 != 0 {
            return Err(GuideError::BadPathLength(len));
        }
        if let Some((index, &value)) = self.path.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(GuideError::NonFinite { index, value });
        }
        if !(0.0..=1.0).contains(&self.start) {
            return Err(GuideError::StartOutOfBounds(self.start));
        }
        if !(0.0..=1.0).contains(&self.end) {
            return Err(GuideError::EndOutOfBounds(self.end));
        }
        if self.precision == 0 {
            return Err(GuideError::ZeroPrecision);
        }
        Ok(())
    }
}

/// A position on the path with its tangent angle in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

#[derive(Debug)]
struct Segment {
    /// Fraction of the whole path length before this curve
    offset: f64,
    /// Fraction of the whole path length this curve covers
    portion: f64,
    /// Cumulative normalized chord lengths, ending at 1
    cumulative: Vec<f64>,
}

#[derive(Debug, Default)]
struct Solved {
    segments: Vec<Segment>,
    start: PathPoint,
    end: PathPoint,
    start_offset_rotation: f64,
    end_rotation: Option<f64>,
    delta_rotation: f64,
}

/// A guide shared by the steps that reference it
#[derive(Debug)]
pub struct MotionGuide {
    spec: GuideSpec,
    solved: RefCell<Option<Solved>>,
}

impl MotionGuide {
    pub fn new(spec: GuideSpec) -> Rc<Self> {
        Rc::new(Self {
            spec,
            solved: RefCell::new(None),
        })
    }

    /// Create a guide and solve it, failing on malformed path data
    pub fn try_new(spec: GuideSpec) -> error::Result<Rc<Self>> {
        let guide = Self::new(spec);
        guide.solve()?;
        Ok(guide)
    }

    pub fn spec(&self) -> &GuideSpec {
        &self.spec
    }

    /// Check the path data without solving it
    pub fn validate(&self) -> Result<(), GuideError> {
        self.spec.validate()
    }

    /// Whether the last solve succeeded
    pub fn is_valid(&self) -> bool {
        self.solved.borrow().is_some()
    }

    /// Validate and precompute the arc-length tables
    pub fn solve(&self) -> Result<(), GuideError> {
        let result = build_segments(&self.spec).map(|segments| {
            let start = locate(&self.spec.path, &segments, self.spec.start);
            let end = locate(&self.spec.path, &segments, self.spec.end);
            Solved {
                segments,
                start,
                end,
                ..Solved::default()
            }
        });
        match result {
            Ok(solved) => {
                *self.solved.borrow_mut() = Some(solved);
                Ok(())
            }
            Err(err) => {
                *self.solved.borrow_mut() = None;
                Err(err)
            }
        }
    }

    /// Point at `ratio` of the path length, solving first if needed
    pub fn sample(&self, ratio: f64) -> Result<PathPoint, GuideError> {
        if !self.is_valid() {
            self.solve()?;
        }
        let solved = self.solved.borrow();
        let segments = solved.as_ref().map(|s| s.segments.as_slice()).unwrap_or_default();
        Ok(locate(&self.spec.path, segments, ratio))
    }

    /// Start and end points of the configured sub-range
    pub fn endpoints(&self) -> Option<(PathPoint, PathPoint)> {
        self.solved.borrow().as_ref().map(|s| (s.start, s.end))
    }

    fn set_rotation(&self, start_offset: f64, end_rotation: f64, delta: f64) {
        if let Some(solved) = self.solved.borrow_mut().as_mut() {
            solved.start_offset_rotation = start_offset;
            solved.end_rotation = Some(end_rotation);
            solved.delta_rotation = delta;
        }
    }

    /// Position (and rotation, if oriented) for a step ratio
    fn position_at(&self, ratio: f64) -> Option<PathPoint> {
        let solved = self.solved.borrow();
        let solved = solved.as_ref()?;
        let path_ratio = self.spec.start + ratio * (self.spec.end - self.spec.start);
        let mut point = locate(&self.spec.path, &solved.segments, path_ratio);

        if self.spec.orient != Orientation::None {
            point.rotation = match solved.end_rotation {
                Some(end) if (ratio - 1.0).abs() <= END_RATIO_EPSILON => end,
                _ => point.rotation + solved.start_offset_rotation + ratio * solved.delta_rotation,
            };
        }
        Some(point)
    }
}

fn quadratic(path: &[f64], i: usize, t: f64) -> PathPoint {
    let (sx, sy, cx, cy, ex, ey) = (path[i], path[i + 1], path[i + 2], path[i + 3], path[i + 4], path[i + 5]);
    let inv = 1.0 - t;
    let x = inv * inv * sx + 2.0 * inv * t * cx + t * t * ex;
    let y = inv * inv * sy + 2.0 * inv * t * cy + t * t * ey;
    let rotation = ((cy - sy) * inv + (ey - cy) * t)
        .atan2((cx - sx) * inv + (ex - cx) * t)
        .to_degrees();
    PathPoint { x, y, rotation }
}

fn build_segments(spec: &GuideSpec) -> Result<Vec<Segment>, GuideError> {
    spec.validate()?;
    let path = &spec.path;
    let precision = spec.precision;
    let curves = (path.len() - 2) / 4;
    if path.chunks(2).all(|point| point[0] == path[0] && point[1] == path[1]) {
        return Err(GuideError::ZeroLength);
    }

    let mut chords = Vec::with_capacity(curves);
    let mut total = 0.0;
    for curve in 0..curves {
        let i = curve * 4;
        let mut previous = quadratic(path, i, 0.0);
        let mut lengths = Vec::with_capacity(precision);
        for step in 1..=precision {
            let point = quadratic(path, i, step as f64 / precision as f64);
            lengths.push((point.x - previous.x).hypot(point.y - previous.y));
            previous = point;
        }
        total += lengths.iter().sum::<f64>();
        chords.push(lengths);
    }
    if total <= 0.0 {
        return Err(GuideError::ZeroLength);
    }

    let mut offset = 0.0;
    let segments = chords
        .into_iter()
        .map(|lengths| {
            let length: f64 = lengths.iter().sum();
            let mut running = 0.0;
            let cumulative = lengths
                .iter()
                .enumerate()
                .map(|(n, chord)| {
                    running += if length > 0.0 {
                        chord / length
                    } else {
                        1.0 / precision as f64
                    };
                    if n + 1 == precision {
                        1.0
                    } else {
                        running
                    }
                })
                .collect();
            let segment = Segment {
                offset,
                portion: length / total,
                cumulative,
            };
            offset += segment.portion;
            segment
        })
        .collect();
    Ok(segments)
}

/// Map a fraction of total path length to a curve point. Ratios outside
/// `[0, 1]` extrapolate along the first or last curve.
fn locate(path: &[f64], segments: &[Segment], ratio: f64) -> PathPoint {
    let Some(last) = segments.len().checked_sub(1) else {
        return PathPoint::default();
    };
    let index = segments
        .partition_point(|s| s.offset + s.portion <= ratio)
        .min(last);
    let segment = &segments[index];

    let within = if segment.portion > 0.0 {
        (ratio - segment.offset) / segment.portion
    } else {
        0.0
    };

    let precision = segment.cumulative.len();
    let sub = segment
        .cumulative
        .partition_point(|&c| c <= within)
        .min(precision - 1);
    let sub_start = if sub == 0 { 0.0 } else { segment.cumulative[sub - 1] };
    let width = segment.cumulative[sub] - sub_start;
    let local = if width > 0.0 { (within - sub_start) / width } else { 0.0 };
    let t = (sub as f64 + local) / precision as f64;

    quadratic(path, index * 4, t)
}

fn number(map: &PropMap, name: &str) -> Option<f64> {
    map.get(name).and_then(PropValue::as_number)
}

/// Tween plugin that drives `x`, `y` and `rotation` from a `guide` property
pub struct MotionGuidePlugin {
    self_ref: Weak<MotionGuidePlugin>,
}

impl MotionGuidePlugin {
    pub const ID: &'static str = "MotionGuide";

    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
        })
    }

    /// Create the plugin and install it on `registry`
    pub fn install(registry: &AnimationRegistry) -> Rc<Self> {
        let plugin = Self::new();
        registry.install_plugin(plugin.clone());
        plugin
    }

    fn target_number(tween: &Tween, name: &str) -> Option<f64> {
        tween
            .target()
            .and_then(|target| target.borrow().get(name))
            .and_then(|value| value.as_number())
    }
}

impl Plugin for MotionGuidePlugin {
    fn id(&self) -> &str {
        Self::ID
    }

    fn init(&self, tween: &Tween, prop: &str, _value: Option<&PropValue>) -> PluginOutcome {
        if prop == GUIDE {
            if let Some(this) = self.self_ref.upgrade() {
                tween.add_plugin(this);
            }
        }
        PluginOutcome::Default
    }

    fn step(&self, tween: &Tween, step: &StepView<'_>, props: &PropMap) {
        let Some(PropValue::Guide(guide)) = props.get(GUIDE) else {
            return;
        };
        if let Err(err) = guide.solve() {
            tracing::warn!(%err, "invalid motion guide");
            return;
        }
        let Some((start, end)) = guide.endpoints() else {
            return;
        };

        tween.inject_prop("x", end.x);
        tween.inject_prop("y", end.y);

        let orient = guide.spec().orient;
        if orient == Orientation::None {
            return;
        }

        let initial = number(step.prev_props, "rotation")
            .or_else(|| Self::target_number(tween, "rotation"))
            .unwrap_or(0.0);
        let start_offset = initial - start.rotation;

        let (end_rotation, delta) = if orient == Orientation::Fixed {
            (end.rotation + start_offset, 0.0)
        } else {
            let target_rotation = number(props, "rotation")
                .or_else(|| Self::target_number(tween, "rotation"))
                .unwrap_or(0.0);
            let raw_delta = (target_rotation - end.rotation) - start_offset;
            let partial = raw_delta % 360.0;
            let turns = (raw_delta / 360.0).trunc().abs();
            let delta = match orient {
                Orientation::Clockwise => ((partial + 360.0) % 360.0) + 360.0 * turns,
                Orientation::CounterClockwise => ((partial - 360.0) % 360.0) - 360.0 * turns,
                _ => raw_delta,
            };
            (target_rotation, delta)
        };

        guide.set_rotation(start_offset, end_rotation, delta);
        tween.inject_prop("rotation", end_rotation);
    }

    fn change(
        &self,
        tween: &Tween,
        step: &StepView<'_>,
        prop: &str,
        _value: &PropValue,
        ratio: f64,
        _end: bool,
    ) -> PluginOutcome {
        let Some(PropValue::Guide(guide)) = step.props.get(GUIDE) else {
            return PluginOutcome::Default;
        };
        if step.is_wait {
            return PluginOutcome::Default;
        }
        if let Some(PropValue::Guide(previous)) = step.prev_props.get(GUIDE) {
            if Rc::ptr_eq(previous, guide) {
                return PluginOutcome::Default;
            }
        }

        let orient = guide.spec().orient;
        let valid = guide.is_valid();
        if (prop == GUIDE && !valid)
            || prop == "x"
            || prop == "y"
            || (prop == "rotation" && orient != Orientation::None)
        {
            return PluginOutcome::Suppress;
        }

        if prop == GUIDE {
            if let (Some(point), Some(target)) = (guide.position_at(ratio), tween.target()) {
                let mut target = target.borrow_mut();
                target.set("x", PropValue::Number(point.x));
                target.set("y", PropValue::Number(point.y));
                if orient != Orientation::None {
                    target.set("rotation", PropValue::Number(point.rotation));
                }
            }
        }
        PluginOutcome::Default
    }
}
