//! Integration tests for timelines driving several tweens together

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cadence_animation::{
    Animation, AnimationRegistry, Easing, PropMap, PropValue, PropertyBag, Timeline, TimelineProps,
    Tween, TweenProps,
};

const EPS: f64 = 1e-9;

fn bag() -> Rc<RefCell<PropertyBag>> {
    PropertyBag::new().with("x", 0.0).with("y", 0.0).shared()
}

fn tween_over(
    registry: &AnimationRegistry,
    target: &Rc<RefCell<PropertyBag>>,
    prop: &str,
    duration: f64,
    props: TweenProps,
) -> Rc<dyn Animation> {
    let tween = registry.get(target.clone(), props);
    let mut values = PropMap::new();
    values.insert(prop.to_string(), PropValue::Number(100.0));
    tween.to(values, duration, Easing::Linear);
    tween
}

#[test]
fn test_composite_duration_covers_loops() {
    let registry = AnimationRegistry::new();
    let target = bag();
    let short = tween_over(&registry, &target, "x", 1000.0, TweenProps::default());
    let looping = tween_over(&registry, &target, "y", 2000.0, TweenProps::default().with_loop(1));

    let timeline = Timeline::new(&registry, vec![short, looping], TimelineProps::default());
    assert_eq!(timeline.duration(), 4000.0);
    assert_eq!(timeline.tween_count(), 2);
}

/// Only the timeline is ticked; its children follow its position
#[test]
fn test_children_follow_the_timeline() {
    let registry = AnimationRegistry::new();
    let target = bag();
    let x = tween_over(&registry, &target, "x", 1000.0, TweenProps::default());
    let y = tween_over(&registry, &target, "y", 500.0, TweenProps::default());
    let timeline = Timeline::new(&registry, vec![x.clone(), y.clone()], TimelineProps::default());

    assert!(x.is_paused() && y.is_paused());
    assert_eq!(registry.active_count(), 1);

    registry.tick(250.0, false);
    assert!((target.borrow().number("x").unwrap() - 25.0).abs() < EPS);
    assert!((target.borrow().number("y").unwrap() - 50.0).abs() < EPS);

    registry.tick(750.0, false);
    assert!((target.borrow().number("x").unwrap() - 100.0).abs() < EPS);
    assert!((target.borrow().number("y").unwrap() - 100.0).abs() < EPS);
    assert!(timeline.is_paused());
    assert_eq!(registry.active_count(), 0);
}

#[test]
fn test_timeline_labels_and_goto() {
    let registry = AnimationRegistry::new();
    let target = bag();
    let x = tween_over(&registry, &target, "x", 1000.0, TweenProps::default());
    let props = TimelineProps::default()
        .with_playback(TweenProps::default().with_paused(true))
        .with_label("half", 500.0);
    let timeline = Timeline::new(&registry, vec![x], props);

    timeline.goto_and_stop("half").unwrap();
    assert_eq!(timeline.position(), 500.0);
    assert!((target.borrow().number("x").unwrap() - 50.0).abs() < EPS);
    assert_eq!(timeline.current_label().as_deref(), Some("half"));

    timeline.goto_and_play(0.0).unwrap();
    assert!(!timeline.is_paused());
    registry.tick(100.0, false);
    assert!((target.borrow().number("x").unwrap() - 10.0).abs() < EPS);
}

/// Child actions fire as the timeline sweeps over them
#[test]
fn test_child_actions_fire_through_timeline() {
    let registry = AnimationRegistry::new();
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();

    let tween = Tween::new(&registry, Some(bag()), TweenProps::default());
    tween
        .wait(300.0, false)
        .call(move |_| h.set(h.get() + 1))
        .wait(300.0, false);
    let child: Rc<dyn Animation> = tween.clone();
    let timeline = Timeline::new(&registry, vec![child], TimelineProps::default());

    registry.tick(200.0, false);
    assert_eq!(hits.get(), 0);
    registry.tick(200.0, false);
    assert_eq!(hits.get(), 1);
    registry.tick(400.0, false);
    assert_eq!(hits.get(), 1);
    assert_eq!(timeline.position(), 600.0);
}

#[test]
fn test_bouncing_timeline_runs_children_backwards() {
    let registry = AnimationRegistry::new();
    let target = bag();
    let x = tween_over(&registry, &target, "x", 1000.0, TweenProps::default());
    let props = TimelineProps::default()
        .with_playback(TweenProps::default().with_loop(1).with_bounce(true));
    let timeline = Timeline::new(&registry, vec![x], props);

    registry.tick(1250.0, false);
    assert_eq!(timeline.position(), 750.0);
    assert!((target.borrow().number("x").unwrap() - 75.0).abs() < EPS);

    registry.tick(750.0, false);
    assert!(target.borrow().number("x").unwrap().abs() < EPS);
    assert!(timeline.is_paused());
}

#[test]
fn test_removing_children_shrinks_duration() {
    let registry = AnimationRegistry::new();
    let target = bag();
    let long = tween_over(&registry, &target, "x", 3000.0, TweenProps::default());
    let short = tween_over(&registry, &target, "y", 1000.0, TweenProps::default());
    let timeline = Timeline::new(&registry, vec![long.clone(), short], TimelineProps::default());

    assert!(timeline.remove_tween(&long));
    assert_eq!(timeline.duration(), 1000.0);
    assert!(long.parent_timeline().is_none());
    assert_eq!(timeline.to_string(), "[Timeline (tweens=1, duration=1000)]");
}

/// Once a child's action moves the timeline, later children skip the old range
#[test]
fn test_child_action_moving_timeline_stops_fan_out() {
    let registry = AnimationRegistry::new();
    let target = bag();
    let timeline = Timeline::new(
        &registry,
        Vec::new(),
        TimelineProps::default().with_playback(TweenProps::default().with_paused(true)),
    );
    let skipped = Rc::new(Cell::new(0));

    let leader = registry.get(target.clone(), TweenProps::default());
    let weak = Rc::downgrade(&timeline);
    leader
        .to(PropMap::new(), 300.0, Easing::Linear)
        .call(move |_: &Tween| {
            if let Some(timeline) = weak.upgrade() {
                timeline.set_position(800.0, false, false);
            }
        })
        .wait(700.0, false);

    let follower = registry.get(target.clone(), TweenProps::default());
    let s = skipped.clone();
    follower
        .to(PropMap::new(), 300.0, Easing::Linear)
        .call(move |_: &Tween| s.set(s.get() + 1))
        .wait(700.0, false);

    timeline.add_tween(leader);
    timeline.add_tween(follower);
    assert_eq!(timeline.duration(), 1000.0);

    timeline.set_position(500.0, false, false);
    assert_eq!(timeline.position(), 800.0);
    assert_eq!(skipped.get(), 0);
}
