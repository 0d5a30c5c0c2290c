//! Shared playback model for tweens and timelines
//!
//! An [`Animation`] owns a [`TimelineState`] and knows how to apply a local
//! position and how to fire actions inside a local time range. Everything
//! else (loop folding, reversal, bounce, pause bookkeeping, change and
//! complete events, label jumps) lives in the provided methods here.
//!
//! Positions come in two flavors. The raw position grows monotonically across
//! loops. The local position is folded into `[0, duration]` with reversal and
//! bounce applied.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use cadence_core::{event_types, Dispatchable};

use crate::config::{TweenProps, LOOP_FOREVER};
use crate::error::{AnimationError, Result};
use crate::labels::{Label, LabelTable};
use crate::registry::{ActiveKey, AnimationRegistry};
use crate::target::TargetKey;
use crate::timeline::Timeline;

/// Where to jump: an absolute time or a label name
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    Time(f64),
    Label(String),
}

impl From<f64> for Position {
    fn from(time: f64) -> Self {
        Position::Time(time)
    }
}

impl From<&str> for Position {
    fn from(label: &str) -> Self {
        Position::Label(label.to_string())
    }
}

impl From<String> for Position {
    fn from(label: String) -> Self {
        Position::Label(label)
    }
}

/// Playback state common to every animation
#[derive(Debug)]
pub struct TimelineState {
    position: Cell<f64>,
    raw_position: Cell<f64>,
    duration: Cell<f64>,
    loop_count: Cell<i32>,
    reversed: Cell<bool>,
    bounce: Cell<bool>,
    time_scale: Cell<f64>,
    use_ticks: Cell<bool>,
    ignore_global_pause: Cell<bool>,
    paused: Cell<bool>,
    labels: RefCell<LabelTable>,
    parent: RefCell<Option<Weak<Timeline>>>,
    active_key: Cell<Option<ActiveKey>>,
}

impl TimelineState {
    /// Fresh state: paused, never positioned (raw position −1)
    pub fn new(props: &TweenProps) -> Self {
        let time_scale = if props.time_scale == 0.0 || props.time_scale.is_nan() {
            1.0
        } else {
            props.time_scale
        };
        Self {
            position: Cell::new(0.0),
            raw_position: Cell::new(-1.0),
            duration: Cell::new(0.0),
            loop_count: Cell::new(normalize_loop(props.loop_count)),
            reversed: Cell::new(props.reversed),
            bounce: Cell::new(props.bounce),
            time_scale: Cell::new(time_scale),
            use_ticks: Cell::new(props.use_ticks),
            ignore_global_pause: Cell::new(props.ignore_global_pause),
            paused: Cell::new(true),
            labels: RefCell::new(LabelTable::new()),
            parent: RefCell::new(None),
            active_key: Cell::new(None),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    pub(crate) fn set_duration(&self, duration: f64) {
        self.duration.set(duration);
    }

    pub(crate) fn set_paused_flag(&self, paused: bool) {
        self.paused.set(paused);
    }

    pub(crate) fn active_key(&self) -> Option<ActiveKey> {
        self.active_key.get()
    }

    pub(crate) fn set_active_key(&self, key: Option<ActiveKey>) {
        self.active_key.set(key);
    }

    pub(crate) fn parent(&self) -> Option<Rc<Timeline>> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set_parent(&self, parent: Option<Weak<Timeline>>) {
        *self.parent.borrow_mut() = parent;
    }
}

fn normalize_loop(loop_count: i32) -> i32 {
    if loop_count < 0 {
        LOOP_FOREVER
    } else {
        loop_count
    }
}

/// Whether loop `loop_index` plays backwards
fn reversed_in_loop(reversed: bool, bounce: bool, loop_index: i64) -> bool {
    reversed != (bounce && loop_index.rem_euclid(2) == 1)
}

/// Compare two animation handles by allocation
pub fn same_animation(a: &Rc<dyn Animation>, b: &Rc<dyn Animation>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// A positionable, loopable, event-emitting animation
pub trait Animation: Dispatchable {
    fn state(&self) -> &TimelineState;

    /// Apply the current local position. `end` is set when playback just
    /// reached its final position.
    fn update_position(&self, jump: bool, end: bool);

    /// Fire actions inside the local range `[start, end]`. Returns `true` if
    /// an action moved this animation, which aborts the current pass.
    fn run_actions_range(&self, start: f64, end: f64, jump: bool, include_start: bool) -> bool;

    fn has_actions(&self) -> bool {
        true
    }

    /// Identity of the driven target, used for per-target bookkeeping
    fn target_key(&self) -> Option<TargetKey> {
        None
    }

    /// Registry that ticks this animation while it is unpaused
    fn registry(&self) -> Option<AnimationRegistry>;

    /// Strong handle to this animation
    fn as_animation(&self) -> Option<Rc<dyn Animation>>;

    fn position(&self) -> f64 {
        self.state().position.get()
    }

    fn raw_position(&self) -> f64 {
        self.state().raw_position.get()
    }

    fn duration(&self) -> f64 {
        self.state().duration.get()
    }

    fn loop_count(&self) -> i32 {
        self.state().loop_count.get()
    }

    fn set_loop_count(&self, loop_count: i32) {
        self.state().loop_count.set(normalize_loop(loop_count));
    }

    fn reversed(&self) -> bool {
        self.state().reversed.get()
    }

    fn set_reversed(&self, reversed: bool) {
        self.state().reversed.set(reversed);
    }

    fn bounce(&self) -> bool {
        self.state().bounce.get()
    }

    fn set_bounce(&self, bounce: bool) {
        self.state().bounce.set(bounce);
    }

    fn time_scale(&self) -> f64 {
        self.state().time_scale.get()
    }

    fn set_time_scale(&self, time_scale: f64) {
        self.state().time_scale.set(time_scale);
    }

    fn use_ticks(&self) -> bool {
        self.state().use_ticks.get()
    }

    fn set_use_ticks(&self, use_ticks: bool) {
        self.state().use_ticks.set(use_ticks);
    }

    fn ignore_global_pause(&self) -> bool {
        self.state().ignore_global_pause.get()
    }

    fn set_ignore_global_pause(&self, ignore: bool) {
        self.state().ignore_global_pause.set(ignore);
    }

    fn is_paused(&self) -> bool {
        self.state().paused.get()
    }

    /// Pause or resume. Unpaused animations are ticked by their registry.
    fn set_paused(&self, paused: bool) {
        match (self.registry(), self.as_animation()) {
            (Some(registry), Some(this)) => registry.register(&this, paused),
            _ => self.state().paused.set(paused),
        }
    }

    /// Timeline this animation was added to, if any
    fn parent_timeline(&self) -> Option<Rc<Timeline>> {
        self.state().parent()
    }

    /// Move to `raw_position`, apply it, fire actions crossed on the way and
    /// emit change (and complete, at the end). Returns whether playback ended.
    ///
    /// `jump` means only actions at the destination fire.
    fn set_position(&self, raw_position: f64, ignore_actions: bool, jump: bool) -> bool {
        self.set_position_with(raw_position, ignore_actions, jump, None)
    }

    /// [`Animation::set_position`] with a hook that runs after the position is
    /// applied and before actions fire
    fn set_position_with(
        &self,
        raw_position: f64,
        ignore_actions: bool,
        jump: bool,
        callback: Option<&dyn Fn()>,
    ) -> bool {
        let state = self.state();
        let d = state.duration.get();
        let loop_count = state.loop_count.get();
        let prev_raw = state.raw_position.get();

        let mut raw = raw_position.max(0.0);
        let mut t = 0.0;
        let end;

        if d == 0.0 {
            end = true;
            if prev_raw != -1.0 {
                return end;
            }
        } else {
            let mut loop_index = (raw / d).floor() as i64;
            t = raw - loop_index as f64 * d;
            end = loop_count != LOOP_FOREVER && raw >= (loop_count as f64 + 1.0) * d;
            if end {
                t = d;
                loop_index = loop_count as i64;
                raw = (loop_count as f64 + 1.0) * d;
            }
            if raw == prev_raw {
                return end;
            }
            if reversed_in_loop(state.reversed.get(), state.bounce.get(), loop_index) {
                t = d - t;
            }
        }

        state.position.set(t);
        state.raw_position.set(raw);

        self.update_position(jump, end);
        if end {
            self.set_paused(true);
        }
        if let Some(callback) = callback {
            callback();
        }
        if !ignore_actions {
            self.run_actions(prev_raw, raw, jump, !jump && prev_raw == -1.0);
        }

        self.dispatch(event_types::CHANGE);
        if end {
            self.dispatch(event_types::COMPLETE);
        }
        end
    }

    /// The local position `raw_position` maps to, without moving
    fn calculate_position(&self, raw_position: f64) -> f64 {
        let state = self.state();
        let d = state.duration.get();
        let loop_count = state.loop_count.get();
        if d == 0.0 {
            return 0.0;
        }

        let (t, loop_index) =
            if loop_count != LOOP_FOREVER && raw_position >= (loop_count as f64 + 1.0) * d {
                (d, loop_count as i64)
            } else if raw_position < 0.0 {
                (0.0, 0)
            } else {
                let loop_index = (raw_position / d).floor() as i64;
                (raw_position - loop_index as f64 * d, loop_index)
            };

        if reversed_in_loop(state.reversed.get(), state.bounce.get(), loop_index) {
            d - t
        } else {
            t
        }
    }

    /// Advance by `delta` milliseconds (or ticks), scaled by the time scale
    fn advance(&self, delta: f64, ignore_actions: bool) {
        let base = self.raw_position().max(0.0);
        self.set_position(base + delta * self.time_scale(), ignore_actions, false);
    }

    /// Fire the actions crossed moving from `start_raw` to `end_raw`, loop by
    /// loop in traversal order. Returns `true` if an action moved this
    /// animation.
    fn run_actions(&self, start_raw: f64, end_raw: f64, jump: bool, include_start: bool) -> bool {
        if !self.has_actions() {
            return false;
        }
        let state = self.state();
        let d = state.duration.get();
        let loop_count = state.loop_count.get();

        let (mut reversed, mut bounce) = (state.reversed.get(), state.bounce.get());
        let (mut loop0, mut loop1, mut t0, mut t1) = (0i64, 0i64, 0.0, 0.0);
        if d == 0.0 {
            reversed = false;
            bounce = false;
        } else {
            let start_raw = start_raw.max(0.0);
            loop0 = (start_raw / d).floor() as i64;
            loop1 = (end_raw / d).floor() as i64;
            t0 = start_raw - loop0 as f64 * d;
            t1 = end_raw - loop1 as f64 * d;
        }

        if loop_count != LOOP_FOREVER {
            let last = loop_count as i64;
            if loop1 > last {
                t1 = d;
                loop1 = last;
            }
            if loop0 > last {
                t0 = d;
                loop0 = last;
            }
        }

        if jump {
            return self.run_actions_range(t1, t1, jump, include_start);
        }
        if loop0 == loop1 && t0 == t1 && !include_start {
            return false;
        }

        let forward = start_raw <= end_raw;
        let mut include_start = include_start;
        let mut loop_index = loop0;
        loop {
            let mut start = if loop_index == loop0 {
                t0
            } else if forward {
                0.0
            } else {
                d
            };
            let mut end = if loop_index == loop1 {
                t1
            } else if forward {
                d
            } else {
                0.0
            };
            if reversed_in_loop(reversed, bounce, loop_index) {
                start = d - start;
                end = d - end;
            }

            // A bounce turnaround lands on the instant the previous loop ended on.
            let turnaround = bounce && loop_index != loop0 && start == end;
            if !turnaround
                && self.run_actions_range(
                    start,
                    end,
                    jump,
                    include_start || (loop_index != loop0 && !bounce),
                )
            {
                return true;
            }
            include_start = false;

            if loop_index == loop1 {
                break;
            }
            loop_index += if forward { 1 } else { -1 };
        }
        false
    }

    fn add_label(&self, name: &str, position: f64) {
        self.state().labels.borrow_mut().add(name, position);
    }

    /// Replace every label
    fn set_labels(&self, labels: &[(&str, f64)]) {
        self.state()
            .labels
            .borrow_mut()
            .set_all(labels.iter().map(|&(name, pos)| (name, pos)));
    }

    /// Labels sorted by ascending position
    fn labels(&self) -> Vec<Label> {
        self.state().labels.borrow_mut().sorted().to_vec()
    }

    /// The last label at or before the current position
    fn current_label(&self) -> Option<String> {
        let position = self.position();
        self.state().labels.borrow_mut().current(position)
    }

    /// Resolve a time or label to a time. Label names that parse as numbers
    /// are taken as times.
    fn resolve(&self, position: &Position) -> Option<f64> {
        match position {
            Position::Time(time) => Some(*time),
            Position::Label(name) => name
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|time| time.is_finite())
                .or_else(|| self.state().labels.borrow().get(name)),
        }
    }

    /// Unpause and jump to `position`
    fn goto_and_play<P: Into<Position>>(&self, position: P) -> Result<()>
    where
        Self: Sized,
    {
        self.set_paused(false);
        self.goto(&position.into())
    }

    /// Pause and jump to `position`
    fn goto_and_stop<P: Into<Position>>(&self, position: P) -> Result<()>
    where
        Self: Sized,
    {
        self.set_paused(true);
        self.goto(&position.into())
    }

    /// Jump to `position`, firing only actions at the destination
    fn goto(&self, position: &Position) -> Result<()> {
        let Some(time) = self.resolve(position) else {
            let name = match position {
                Position::Label(name) => name.clone(),
                Position::Time(time) => time.to_string(),
            };
            return Err(AnimationError::UnknownLabel(name));
        };
        self.set_position(time, false, true);
        Ok(())
    }
}
