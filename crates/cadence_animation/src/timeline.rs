//! Composite timelines
//!
//! A timeline plays a group of child animations against one shared clock.
//! Children are force-paused when added so only the timeline moves them.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use cadence_core::{Dispatchable, EventDispatcher};

use crate::animation::{same_animation, Animation, TimelineState};
use crate::config::TimelineProps;
use crate::registry::{AnimationRegistry, RegistryInner};

/// A group of animations synchronized to one position
pub struct Timeline {
    state: TimelineState,
    events: EventDispatcher,
    children: RefCell<Vec<Rc<dyn Animation>>>,
    registry: Weak<RegistryInner>,
    self_ref: Weak<Timeline>,
}

impl Timeline {
    /// Create a timeline ticked by `registry`, starting with `tweens`
    pub fn new(
        registry: &AnimationRegistry,
        tweens: Vec<Rc<dyn Animation>>,
        props: TimelineProps,
    ) -> Rc<Self> {
        Self::build(registry.downgrade(), tweens, props)
    }

    /// Create a timeline that nothing ticks
    pub fn standalone(tweens: Vec<Rc<dyn Animation>>, props: TimelineProps) -> Rc<Self> {
        Self::build(Weak::new(), tweens, props)
    }

    fn build(
        registry: Weak<RegistryInner>,
        tweens: Vec<Rc<dyn Animation>>,
        props: TimelineProps,
    ) -> Rc<Self> {
        let timeline = Rc::new_cyclic(|self_ref| Timeline {
            state: TimelineState::new(&props.playback),
            events: EventDispatcher::new(),
            children: RefCell::new(Vec::new()),
            registry,
            self_ref: self_ref.clone(),
        });

        for tween in tweens {
            timeline.add_tween(tween);
        }
        if !props.labels.is_empty() {
            let labels: Vec<(&str, f64)> = props
                .labels
                .iter()
                .map(|(name, position)| (name.as_str(), *position))
                .collect();
            timeline.set_labels(&labels);
        }

        if !props.playback.paused {
            timeline.set_paused(false);
        }
        if let Some(position) = props.playback.position {
            timeline.set_position(position, false, false);
        }
        timeline
    }

    /// Adopt `tween`, detaching it from any previous timeline first.
    ///
    /// The child is paused and the timeline duration grows to cover it. If
    /// the timeline has already been positioned, the child is seeked to match.
    pub fn add_tween(&self, tween: Rc<dyn Animation>) -> Rc<dyn Animation> {
        if let Some(previous) = tween.parent_timeline() {
            previous.remove_tween(&tween);
        }

        self.children.borrow_mut().push(tween.clone());
        tween.state().set_parent(Some(self.self_ref.clone()));
        tween.set_paused(true);

        let span = covered_duration(&*tween);
        if span > self.duration() {
            self.state.set_duration(span);
        }

        let raw = self.raw_position();
        if raw >= 0.0 {
            tween.set_position(raw, false, false);
        }
        tween
    }

    pub fn add_tweens<I>(&self, tweens: I)
    where
        I: IntoIterator<Item = Rc<dyn Animation>>,
    {
        for tween in tweens {
            self.add_tween(tween);
        }
    }

    /// Detach `tween`. Returns `false` if it was not a child.
    pub fn remove_tween(&self, tween: &Rc<dyn Animation>) -> bool {
        let removed = {
            let mut children = self.children.borrow_mut();
            match children.iter().rposition(|child| same_animation(child, tween)) {
                Some(index) => Some(children.remove(index)),
                None => None,
            }
        };
        let Some(removed) = removed else {
            return false;
        };

        removed.state().set_parent(None);
        if covered_duration(&*removed) >= self.duration() {
            self.update_duration();
        }
        true
    }

    /// Detach several tweens. Returns `true` only if every one was a child.
    pub fn remove_tweens(&self, tweens: &[Rc<dyn Animation>]) -> bool {
        tweens
            .iter()
            .fold(true, |all, tween| self.remove_tween(tween) && all)
    }

    /// Recompute the duration from the children
    pub fn update_duration(&self) {
        let duration = self
            .children
            .borrow()
            .iter()
            .map(|child| covered_duration(&**child))
            .fold(0.0, f64::max);
        self.state.set_duration(duration);
    }

    pub fn tweens(&self) -> Vec<Rc<dyn Animation>> {
        self.children.borrow().clone()
    }

    pub fn tween_count(&self) -> usize {
        self.children.borrow().len()
    }
}

/// Time a child needs to play out all its loops once
fn covered_duration(animation: &dyn Animation) -> f64 {
    let loops = animation.loop_count();
    let plays = if loops > 0 { loops as f64 + 1.0 } else { 1.0 };
    animation.duration() * plays
}

impl Dispatchable for Timeline {
    fn dispatcher(&self) -> &EventDispatcher {
        &self.events
    }
}

impl Animation for Timeline {
    fn state(&self) -> &TimelineState {
        &self.state
    }

    fn update_position(&self, jump: bool, _end: bool) {
        let t = self.position();
        for child in self.tweens() {
            child.set_position(t, true, jump);
        }
    }

    fn run_actions_range(&self, start: f64, end: f64, jump: bool, include_start: bool) -> bool {
        let position = self.position();
        for child in self.tweens() {
            child.run_actions(start, end, jump, include_start);
            if position != self.position() {
                return true;
            }
        }
        false
    }

    fn has_actions(&self) -> bool {
        !self.children.borrow().is_empty()
    }

    fn registry(&self) -> Option<AnimationRegistry> {
        AnimationRegistry::from_weak(&self.registry)
    }

    fn as_animation(&self) -> Option<Rc<dyn Animation>> {
        let this: Rc<dyn Animation> = self.self_ref.upgrade()?;
        Some(this)
    }
}

impl std::fmt::Display for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Timeline (tweens={}, duration={})]", self.tween_count(), self.duration())
    }
}
