//! Animation registry
//!
//! Tracks every unpaused animation in registration order and advances them
//! on each tick. The active list is a doubly linked list threaded through a
//! slotmap, so registration and removal are O(1) and animations can leave
//! the list while it is being walked.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use cadence_core::{event_types, listener, Dispatchable, Listener};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::animation::Animation;
use crate::config::TweenProps;
use crate::plugin::{insert_by_priority, Plugin};
use crate::target::{SharedTarget, TargetKey};
use crate::ticker::Ticker;
use crate::tween::Tween;

new_key_type! {
    /// Node of the active list
    pub struct ActiveKey;
}

struct ActiveNode {
    animation: Rc<dyn Animation>,
    prev: Option<ActiveKey>,
    next: Option<ActiveKey>,
}

#[derive(Default)]
struct ActiveList {
    nodes: SlotMap<ActiveKey, ActiveNode>,
    head: Option<ActiveKey>,
    tail: Option<ActiveKey>,
}

impl ActiveList {
    fn push_back(&mut self, animation: Rc<dyn Animation>) -> ActiveKey {
        let key = self.nodes.insert(ActiveNode {
            animation,
            prev: self.tail,
            next: None,
        });
        match self.tail.and_then(|tail| self.nodes.get_mut(tail)) {
            Some(tail) => tail.next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        key
    }

    fn remove(&mut self, key: ActiveKey) -> Option<Rc<dyn Animation>> {
        let node = self.nodes.remove(key)?;
        match node.prev.and_then(|prev| self.nodes.get_mut(prev)) {
            Some(prev) => prev.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|next| self.nodes.get_mut(next)) {
            Some(next) => next.prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(node.animation)
    }

    fn entry(&self, key: ActiveKey) -> Option<(Rc<dyn Animation>, Option<ActiveKey>)> {
        self.nodes
            .get(key)
            .map(|node| (node.animation.clone(), node.next))
    }

    fn iter(&self) -> impl Iterator<Item = &Rc<dyn Animation>> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.nodes.get(cursor?)?;
            cursor = node.next;
            Some(&node.animation)
        })
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn drain(&mut self) -> Vec<Rc<dyn Animation>> {
        let drained = self.iter().cloned().collect();
        self.nodes.clear();
        self.head = None;
        self.tail = None;
        drained
    }
}

pub(crate) struct RegistryInner {
    active: RefCell<ActiveList>,
    target_counts: RefCell<FxHashMap<TargetKey, usize>>,
    plugins: RefCell<Vec<Rc<dyn Plugin>>>,
    ticker: Option<Rc<Ticker>>,
    subscription: RefCell<Option<Listener>>,
}

/// Shared handle to the set of running animations
///
/// Cloning is cheap and yields another handle to the same registry.
#[derive(Clone)]
pub struct AnimationRegistry {
    inner: Rc<RegistryInner>,
}

impl AnimationRegistry {
    /// A registry that is only advanced by explicit [`AnimationRegistry::tick`] calls
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A registry that subscribes to `ticker` once the first animation starts
    pub fn with_ticker(ticker: Rc<Ticker>) -> Self {
        Self::build(Some(ticker))
    }

    fn build(ticker: Option<Rc<Ticker>>) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                active: RefCell::new(ActiveList::default()),
                target_counts: RefCell::new(FxHashMap::default()),
                plugins: RefCell::new(Vec::new()),
                ticker,
                subscription: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<RegistryInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn from_weak(weak: &Weak<RegistryInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn ticker(&self) -> Option<&Rc<Ticker>> {
        self.inner.ticker.as_ref()
    }

    /// Create a tween on `target` driven by this registry
    pub fn get(&self, target: SharedTarget, props: TweenProps) -> Rc<Tween> {
        Tween::new(self, Some(target), props)
    }

    /// Install a plugin for every tween created afterwards. Plugins run their
    /// `init` hook in descending priority.
    pub fn install_plugin(&self, plugin: Rc<dyn Plugin>) {
        let id = plugin.id().to_string();
        if insert_by_priority(&mut self.inner.plugins.borrow_mut(), plugin) {
            tracing::debug!("installed tween plugin {:?}", id);
        }
    }

    pub fn plugins(&self) -> Vec<Rc<dyn Plugin>> {
        self.inner.plugins.borrow().clone()
    }

    /// Move `animation` between the paused and active sets. Only transitions
    /// touch the bookkeeping, so repeated calls are harmless.
    pub fn register(&self, animation: &Rc<dyn Animation>, paused: bool) {
        let state = animation.state();
        let was_paused = state.is_paused();
        let target = animation.target_key();

        if !paused && was_paused {
            if let Some(target) = target {
                *self.inner.target_counts.borrow_mut().entry(target).or_insert(0) += 1;
            }
            let key = self.inner.active.borrow_mut().push_back(animation.clone());
            state.set_active_key(Some(key));
            tracing::trace!("animation registered, {} active", self.active_count());
            self.subscribe();
        } else if paused && !was_paused {
            if let Some(target) = target {
                let mut counts = self.inner.target_counts.borrow_mut();
                if let Some(count) = counts.get_mut(&target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        counts.remove(&target);
                    }
                }
            }
            if let Some(key) = state.active_key() {
                state.set_active_key(None);
                // Dropped after the list borrow ends; it may be the last strong handle.
                let removed = self.inner.active.borrow_mut().remove(key);
                drop(removed);
            }
            tracing::trace!("animation unregistered, {} active", self.active_count());
        }

        state.set_paused_flag(paused);
    }

    fn subscribe(&self) {
        let Some(ticker) = &self.inner.ticker else {
            return;
        };
        if let Some(existing) = self.inner.subscription.borrow().as_ref() {
            if ticker
                .dispatcher()
                .contains_listener(event_types::TICK, existing, false)
            {
                return;
            }
        }

        let weak = Rc::downgrade(&self.inner);
        let handle = ticker.add_listener(
            event_types::TICK,
            listener(move |event| {
                let (Some(inner), Some(tick)) = (weak.upgrade(), event.tick()) else {
                    return;
                };
                AnimationRegistry { inner }.tick(tick.delta, tick.paused);
            }),
            false,
        );
        *self.inner.subscription.borrow_mut() = Some(handle);
        tracing::debug!("animation registry subscribed to ticker");
    }

    /// Advance every active animation by `delta`.
    ///
    /// Animations that are paused, or globally paused without
    /// `ignore_global_pause`, are skipped. Animations using ticks advance by
    /// exactly one.
    pub fn tick(&self, delta: f64, paused: bool) {
        let mut cursor = self.inner.active.borrow().head;
        while let Some(key) = cursor {
            // The next node is captured before advancing. If advancing removes
            // it from the list, the walk stops there.
            let Some((animation, next)) = self.inner.active.borrow().entry(key) else {
                break;
            };
            let skip = (paused && !animation.ignore_global_pause()) || animation.is_paused();
            if !skip {
                let step = if animation.use_ticks() { 1.0 } else { delta };
                animation.advance(step, false);
            }
            cursor = next;
        }
    }

    /// Pause and unregister every active animation driving `target`
    pub fn remove_tweens(&self, target: &SharedTarget) {
        let key = TargetKey::of(target);
        if !self.inner.target_counts.borrow().contains_key(&key) {
            return;
        }

        let matching: Vec<Rc<dyn Animation>> = self
            .inner
            .active
            .borrow()
            .iter()
            .filter(|animation| animation.target_key() == Some(key))
            .cloned()
            .collect();
        for animation in &matching {
            self.register(animation, true);
        }
        self.inner.target_counts.borrow_mut().remove(&key);
        tracing::debug!("removed {} tweens from target", matching.len());
    }

    /// Pause and unregister every active animation
    pub fn remove_all_tweens(&self) {
        let drained = self.inner.active.borrow_mut().drain();
        for animation in &drained {
            let state = animation.state();
            state.set_active_key(None);
            state.set_paused_flag(true);
        }
        self.inner.target_counts.borrow_mut().clear();
        tracing::debug!("removed all {} active tweens", drained.len());
    }

    /// With a target: whether it has active tweens. Without: whether
    /// anything is active at all.
    pub fn has_active_tweens(&self, target: Option<&SharedTarget>) -> bool {
        match target {
            Some(target) => self.tween_count(target) > 0,
            None => self.active_count() > 0,
        }
    }

    /// Number of active tweens driving `target`
    pub fn tween_count(&self, target: &SharedTarget) -> usize {
        self.inner
            .target_counts
            .borrow()
            .get(&TargetKey::of(target))
            .copied()
            .unwrap_or(0)
    }

    pub fn active_count(&self) -> usize {
        self.inner.active.borrow().len()
    }

    /// Active animations in registration order
    pub fn active(&self) -> Vec<Rc<dyn Animation>> {
        self.inner.active.borrow().iter().cloned().collect()
    }
}

impl Default for AnimationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
