//! Single-target tweens
//!
//! A tween is a chain of steps over one target, built with `wait`, `to`,
//! `label` and the action builders (`call`, `set`, `play`, `pause`). Each
//! step records the full property snapshot at its end time, so any position
//! interpolates between two snapshots without looking further back.
//!
//! ```
//! use cadence_animation::{props, AnimationRegistry, Animation, Easing, PropertyBag, TweenProps};
//!
//! let registry = AnimationRegistry::new();
//! let ball = PropertyBag::new().with("x", 0.0).shared();
//! let tween = registry.get(ball.clone(), TweenProps::default());
//! tween
//!     .to(props! { "x" => 100.0 }, 1000.0, Easing::QUAD_OUT)
//!     .wait(500.0, false)
//!     .to(props! { "x" => 0.0 }, 1000.0, Easing::Linear);
//!
//! registry.tick(1000.0, false);
//! assert_eq!(ball.borrow().number("x"), Some(100.0));
//! assert_eq!(tween.duration(), 2500.0);
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use cadence_core::{event_types, listener, Dispatchable, Event, EventDispatcher, Listener};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::animation::{Animation, TimelineState};
use crate::config::TweenProps;
use crate::easing::Easing;
use crate::plugin::{insert_by_priority, Plugin, PluginOutcome, StepView};
use crate::registry::{AnimationRegistry, RegistryInner};
use crate::target::{SharedTarget, TargetKey};
use crate::value::{PropMap, PropValue};

/// One keyframe span of a tween
#[derive(Debug, Clone)]
pub struct Step {
    pub index: usize,
    pub start: f64,
    pub duration: f64,
    pub easing: Easing,
    /// Target properties are left alone while this step plays
    pub passive: bool,
    props: usize,
}

impl Step {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

#[derive(Clone)]
enum ActionKind {
    Call(Rc<dyn Fn(&Tween)>),
    Set {
        target: SharedTarget,
        props: Rc<PropMap>,
    },
    SetPaused {
        animation: Weak<dyn Animation>,
        paused: bool,
    },
}

#[derive(Clone)]
struct Action {
    time: f64,
    kind: ActionKind,
}

/// Steps, their property snapshots and the scheduled actions.
///
/// Index 0 is the head step: zero length, passive, holding the initial
/// values. A `wait` step shares its predecessor's snapshot slot.
struct StepChain {
    steps: Vec<Step>,
    props: Vec<PropMap>,
    actions: Vec<Action>,
    cursor: usize,
}

impl StepChain {
    fn new() -> Self {
        Self {
            steps: vec![Step {
                index: 0,
                start: 0.0,
                duration: 0.0,
                easing: Easing::Linear,
                passive: true,
                props: 0,
            }],
            props: vec![PropMap::new()],
            actions: Vec::new(),
            cursor: 1,
        }
    }

    fn tail(&self) -> &Step {
        &self.steps[self.steps.len() - 1]
    }

    /// Append a step. Without a snapshot slot, the predecessor's snapshot is
    /// copied into a fresh one.
    fn push_step(
        &mut self,
        start: f64,
        duration: f64,
        props: Option<usize>,
        easing: Easing,
        passive: bool,
    ) -> usize {
        let props = props.unwrap_or_else(|| {
            let copy = self.props[self.tail().props].clone();
            self.props.push(copy);
            self.props.len() - 1
        });
        let index = self.steps.len();
        self.steps.push(Step {
            index,
            start,
            duration,
            easing,
            passive,
            props,
        });
        index
    }

    /// Copy `name` from step `from` back into earlier steps until one that
    /// already defines it. Steps sharing a slot with their successor are
    /// skipped over.
    fn backfill(&mut self, from: usize, name: &str) {
        let Some(value) = self.props[self.steps[from].props].get(name).cloned() else {
            return;
        };
        let mut current = from;
        while current > 0 {
            let prev = current - 1;
            let (prev_slot, slot) = (self.steps[prev].props, self.steps[current].props);
            current = prev;
            if prev_slot == slot {
                continue;
            }
            if self.props[prev_slot].contains_key(name) {
                break;
            }
            self.props[prev_slot].insert(name.to_string(), value.clone());
        }
    }

    /// Index of the last real step starting at or before `t`, searched from
    /// the previous hit
    fn locate(&mut self, t: f64) -> usize {
        let last = self.steps.len() - 1;
        let mut index = self.cursor.clamp(1, last);
        if self.steps[index].start <= t {
            while index < last && self.steps[index + 1].start <= t {
                index += 1;
            }
        } else {
            while index > 1 && self.steps[index].start > t {
                index -= 1;
            }
        }
        self.cursor = index;
        index
    }

    fn view(&self, index: usize) -> StepView<'_> {
        let step = &self.steps[index];
        let prev_slot = self.steps[index.saturating_sub(1)].props;
        StepView {
            index,
            start: step.start,
            duration: step.duration,
            passive: step.passive,
            props: &self.props[step.props],
            prev_props: &self.props[prev_slot],
            is_wait: index > 0 && prev_slot == step.props,
        }
    }
}

/// A keyframed animation of one target's properties
pub struct Tween {
    state: TimelineState,
    events: EventDispatcher,
    chain: RefCell<StepChain>,
    target: Option<SharedTarget>,
    target_key: Option<TargetKey>,
    registry: Weak<RegistryInner>,
    plugins: RefCell<Vec<Rc<dyn Plugin>>>,
    plugin_data: RefCell<FxHashMap<String, Rc<dyn Any>>>,
    injected: RefCell<Option<PropMap>>,
    passive: Cell<bool>,
    step_position: Cell<f64>,
    self_ref: Weak<Tween>,
}

impl Tween {
    /// Create a tween ticked by `registry`. It starts playing right away
    /// unless `props.paused` is set.
    pub fn new(registry: &AnimationRegistry, target: Option<SharedTarget>, props: TweenProps) -> Rc<Self> {
        Self::build(registry.downgrade(), target, props)
    }

    /// Create a tween that nothing ticks; drive it with `advance` or
    /// `set_position`, or add it to a timeline
    pub fn standalone(target: Option<SharedTarget>, props: TweenProps) -> Rc<Self> {
        Self::build(Weak::new(), target, props)
    }

    fn build(registry: Weak<RegistryInner>, target: Option<SharedTarget>, props: TweenProps) -> Rc<Self> {
        if props.override_existing {
            if let (Some(registry), Some(target)) = (AnimationRegistry::from_weak(&registry), &target) {
                registry.remove_tweens(target);
            }
        }

        let target_key = target.as_ref().map(TargetKey::of);
        let tween = Rc::new_cyclic(|self_ref| Tween {
            state: TimelineState::new(&props),
            events: EventDispatcher::new(),
            chain: RefCell::new(StepChain::new()),
            target,
            target_key,
            registry,
            plugins: RefCell::new(Vec::new()),
            plugin_data: RefCell::new(FxHashMap::default()),
            injected: RefCell::new(None),
            passive: Cell::new(false),
            step_position: Cell::new(0.0),
            self_ref: self_ref.clone(),
        });

        if !props.paused {
            tween.set_paused(false);
        }
        if let Some(position) = props.position {
            tween.set_position(position, false, false);
        }
        tween
    }

    pub fn target(&self) -> Option<&SharedTarget> {
        self.target.as_ref()
    }

    /// Whether the step at the current position is passive
    pub fn is_passive(&self) -> bool {
        self.passive.get()
    }

    /// Time elapsed inside the current step
    pub fn step_position(&self) -> f64 {
        self.step_position.get()
    }

    /// Number of steps appended with `wait` or `to`
    pub fn step_count(&self) -> usize {
        self.chain.borrow().steps.len() - 1
    }

    pub fn action_count(&self) -> usize {
        self.chain.borrow().actions.len()
    }

    /// Steps appended with `wait` or `to`, in time order
    pub fn steps(&self) -> Vec<Step> {
        self.chain.borrow().steps[1..].to_vec()
    }

    /// Property snapshot at the end of step `index`. Index 0 holds the
    /// initial values.
    pub fn step_props(&self, index: usize) -> Option<PropMap> {
        let chain = self.chain.borrow();
        let step = chain.steps.get(index)?;
        Some(chain.props[step.props].clone())
    }

    /// Per-plugin storage attached to this tween
    pub fn plugin_data(&self, id: &str) -> Option<Rc<dyn Any>> {
        self.plugin_data.borrow().get(id).cloned()
    }

    pub fn set_plugin_data(&self, id: &str, data: Rc<dyn Any>) {
        self.plugin_data.borrow_mut().insert(id.to_string(), data);
    }

    /// Attach a plugin to this tween only. Adding the same id twice is a no-op.
    pub fn add_plugin(&self, plugin: Rc<dyn Plugin>) {
        insert_by_priority(&mut self.plugins.borrow_mut(), plugin);
    }

    pub fn has_plugin(&self, id: &str) -> bool {
        self.plugins.borrow().iter().any(|p| p.id() == id)
    }

    /// Queue a property for the step currently being appended. Meant for
    /// plugin `step` hooks.
    pub fn inject_prop(&self, name: &str, value: impl Into<PropValue>) {
        self.injected
            .borrow_mut()
            .get_or_insert_with(PropMap::new)
            .insert(name.to_string(), value.into());
    }

    /// Listen for every position change
    pub fn on_change<F>(&self, f: F) -> Listener
    where
        F: Fn(&mut Event) + 'static,
    {
        self.add_listener(event_types::CHANGE, listener(f), false)
    }

    /// Listen for playback reaching its end
    pub fn on_complete<F>(&self, f: F) -> Listener
    where
        F: Fn(&mut Event) + 'static,
    {
        self.add_listener(event_types::COMPLETE, listener(f), false)
    }

    /// Hold the current values for `duration`
    pub fn wait(&self, duration: f64, passive: bool) -> &Self {
        if duration > 0.0 {
            let start = self.duration();
            let mut chain = self.chain.borrow_mut();
            let slot = chain.tail().props;
            chain.push_step(start, duration, Some(slot), Easing::Linear, passive);
            drop(chain);
            self.state.set_duration(start + duration);
        }
        self
    }

    /// Animate to `props` over `duration`. Zero duration jumps.
    pub fn to(&self, props: PropMap, duration: f64, easing: Easing) -> &Self {
        let duration = if duration > 0.0 { duration } else { 0.0 };
        let start = self.duration();
        let step = self
            .chain
            .borrow_mut()
            .push_step(start, duration, None, easing, false);
        self.state.set_duration(start + duration);
        self.append_props(props, step, true);
        self
    }

    /// Label the current end of the tween
    pub fn label(&self, name: &str) -> &Self {
        self.add_label(name, self.duration());
        self
    }

    /// Run `callback` when playback crosses the current end of the tween
    pub fn call<F>(&self, callback: F) -> &Self
    where
        F: Fn(&Tween) + 'static,
    {
        self.add_action(ActionKind::Call(Rc::new(callback)))
    }

    /// Assign `props` to this tween's target at the current end of the tween
    pub fn set(&self, props: PropMap) -> &Self {
        match self.target.clone() {
            Some(target) => self.set_on(props, target),
            None => {
                tracing::warn!("set action on a tween without a target ignored");
                self
            }
        }
    }

    /// Assign `props` to `target` at the current end of the tween
    pub fn set_on(&self, props: PropMap, target: SharedTarget) -> &Self {
        self.add_action(ActionKind::Set {
            target,
            props: Rc::new(props),
        })
    }

    /// Unpause `animation` (this tween, or another) at the current end of the tween
    pub fn play<A: Animation + 'static>(&self, animation: &Rc<A>) -> &Self {
        let weak: Weak<A> = Rc::downgrade(animation);
        self.add_action(ActionKind::SetPaused {
            animation: weak,
            paused: false,
        })
    }

    /// Pause `animation` (this tween, or another) at the current end of the tween
    pub fn pause<A: Animation + 'static>(&self, animation: &Rc<A>) -> &Self {
        let weak: Weak<A> = Rc::downgrade(animation);
        self.add_action(ActionKind::SetPaused {
            animation: weak,
            paused: true,
        })
    }

    fn add_action(&self, kind: ActionKind) -> &Self {
        let time = self.duration();
        self.chain.borrow_mut().actions.push(Action { time, kind });
        self
    }

    fn read_target(&self, name: &str) -> Option<PropValue> {
        self.target.as_ref().and_then(|target| target.borrow().get(name))
    }

    fn append_props(&self, props: PropMap, step: usize, run_step_plugins: bool) {
        // Record the values and find names this tween has never tracked.
        let (mut appended, fresh) = {
            let mut chain = self.chain.borrow_mut();
            let slot = chain.steps[step].props;
            let mut fresh: SmallVec<[String; 4]> = SmallVec::new();
            for (name, value) in &props {
                if !chain.props[0].contains_key(name) {
                    fresh.push(name.clone());
                }
                chain.props[slot].insert(name.clone(), value.clone());
            }
            (props, fresh)
        };

        // Resolve starting values. Registry plugins may supply or veto them.
        let installed = AnimationRegistry::from_weak(&self.registry)
            .map(|registry| registry.plugins())
            .unwrap_or_default();
        let mut initial: SmallVec<[(String, PropValue); 4]> = SmallVec::new();
        let mut ignored: SmallVec<[String; 2]> = SmallVec::new();
        for name in fresh {
            let mut value = None;
            let mut suppressed = false;
            for plugin in installed.iter().rev() {
                match plugin.init(self, &name, value.as_ref()) {
                    PluginOutcome::Default => {}
                    PluginOutcome::Value(v) => value = Some(v),
                    PluginOutcome::Suppress => {
                        suppressed = true;
                        break;
                    }
                }
            }
            if suppressed {
                ignored.push(name);
                continue;
            }
            let value = value
                .or_else(|| self.read_target(&name))
                .unwrap_or_default();
            initial.push((name, value));
        }

        {
            let mut chain = self.chain.borrow_mut();
            let slot = chain.steps[step].props;
            for name in &ignored {
                chain.props[slot].shift_remove(name);
                appended.shift_remove(name);
            }
            let prev_slot = chain.steps[step - 1].props;
            for (name, value) in initial {
                chain.props[prev_slot].insert(name, value);
            }
            for name in appended.keys() {
                chain.backfill(step - 1, name);
            }
        }

        if run_step_plugins {
            let plugins = self.plugins.borrow().clone();
            if !plugins.is_empty() {
                let chain = self.chain.borrow();
                let view = chain.view(step);
                for plugin in plugins.iter().rev() {
                    plugin.step(self, &view, &appended);
                }
            }
        }

        let injected = self.injected.borrow_mut().take();
        if let Some(injected) = injected {
            self.append_props(injected, step, false);
        }
    }

    fn apply_step(&self, index: usize, ratio: f64, end: bool) {
        let Some(target) = &self.target else {
            return;
        };
        let chain = self.chain.borrow();
        let step = &chain.steps[index];
        self.passive.set(step.passive);
        if step.passive {
            return;
        }

        let ratio = step.easing.apply(ratio);
        let view = chain.view(index);
        let plugins = self.plugins.borrow().clone();

        'props: for (name, v0) in view.prev_props {
            let v1 = view.props.get(name).unwrap_or(v0);
            let mut value = match (v0, v1) {
                (PropValue::Number(a), PropValue::Number(b)) if a != b => {
                    PropValue::Number(a + (b - a) * ratio)
                }
                _ if ratio >= 1.0 => v1.clone(),
                _ => v0.clone(),
            };

            for plugin in &plugins {
                match plugin.change(self, &view, name, &value, ratio, end) {
                    PluginOutcome::Default => {}
                    PluginOutcome::Value(v) => value = v,
                    PluginOutcome::Suppress => continue 'props,
                }
            }
            target.borrow_mut().set(name, value);
        }
    }

    fn invoke(&self, action: &Action) {
        match &action.kind {
            ActionKind::Call(callback) => callback(self),
            ActionKind::Set { target, props } => {
                let mut target = target.borrow_mut();
                for (name, value) in props.iter() {
                    target.set(name, value.clone());
                }
            }
            ActionKind::SetPaused { animation, paused } => {
                if let Some(animation) = animation.upgrade() {
                    animation.set_paused(*paused);
                }
            }
        }
    }
}

impl Dispatchable for Tween {
    fn dispatcher(&self) -> &EventDispatcher {
        &self.events
    }
}

impl Animation for Tween {
    fn state(&self) -> &TimelineState {
        &self.state
    }

    fn update_position(&self, _jump: bool, end: bool) {
        let t = self.position();
        let d = self.duration();

        let located = {
            let mut chain = self.chain.borrow_mut();
            if chain.steps.len() < 2 {
                None
            } else {
                let index = chain.locate(t);
                let step = &chain.steps[index];
                Some((index, step.start, step.duration))
            }
        };
        let Some((index, start, duration)) = located else {
            self.step_position.set(0.0);
            return;
        };

        let ratio = if end {
            if d == 0.0 {
                1.0
            } else {
                t / d
            }
        } else if duration == 0.0 {
            1.0
        } else {
            (t - start) / duration
        };

        self.apply_step(index, ratio, end);
        self.step_position.set(t - start);
    }

    fn run_actions_range(&self, start: f64, end: f64, _jump: bool, include_start: bool) -> bool {
        let position = self.position();
        let actions = self.chain.borrow().actions.clone();
        if actions.is_empty() {
            return false;
        }

        let reverse = start > end;
        let (low, high) = if reverse { (end, start) } else { (start, end) };
        let fires = |time: f64| {
            time == end || (time > low && time < high) || (include_start && time == start)
        };

        let mut run = |action: &Action| {
            if fires(action.time) {
                self.invoke(action);
                if position != self.position() {
                    return true;
                }
            }
            false
        };

        if reverse {
            actions.iter().rev().any(&mut run)
        } else {
            actions.iter().any(&mut run)
        }
    }

    fn has_actions(&self) -> bool {
        !self.chain.borrow().actions.is_empty()
    }

    fn target_key(&self) -> Option<TargetKey> {
        self.target_key
    }

    fn registry(&self) -> Option<AnimationRegistry> {
        AnimationRegistry::from_weak(&self.registry)
    }

    fn as_animation(&self) -> Option<Rc<dyn Animation>> {
        let this: Rc<dyn Animation> = self.self_ref.upgrade()?;
        Some(this)
    }
}

impl std::fmt::Display for Tween {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Tween (steps={}, duration={})]", self.step_count(), self.duration())
    }
}
