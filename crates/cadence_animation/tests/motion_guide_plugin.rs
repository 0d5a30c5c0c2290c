//! Integration tests for tweens moving targets along motion guides

use std::cell::RefCell;
use std::rc::Rc;

use cadence_animation::{
    props, Animation, AnimationRegistry, Easing, GuideError, GuideSpec, MotionGuide,
    MotionGuidePlugin, Orientation, PropertyBag, TweenProps,
};

const EPS: f64 = 1e-6;

/// A symmetric arch from (0, 0) over (50, 100) to (100, 0)
fn arch() -> GuideSpec {
    GuideSpec::new(vec![0.0, 0.0, 50.0, 100.0, 100.0, 0.0])
}

fn ship(rotation: f64) -> Rc<RefCell<PropertyBag>> {
    PropertyBag::new()
        .with("x", 0.0)
        .with("y", 0.0)
        .with("rotation", rotation)
        .shared()
}

fn read(target: &Rc<RefCell<PropertyBag>>, name: &str) -> f64 {
    target.borrow().number(name).unwrap_or(f64::NAN)
}

fn guided(registry: &AnimationRegistry, target: &Rc<RefCell<PropertyBag>>, spec: GuideSpec) {
    registry
        .get(target.clone(), TweenProps::default())
        .to(props! { "guide" => MotionGuide::new(spec) }, 1000.0, Easing::Linear);
}

#[test]
fn test_endpoints_match_path_anchors() {
    let path = vec![10.0, 20.0, 60.0, -40.0, 110.0, 20.0, 160.0, 80.0, 210.0, 5.0];
    let guide = MotionGuide::new(GuideSpec::new(path));
    let first = guide.sample(0.0).unwrap();
    let last = guide.sample(1.0).unwrap();

    assert!((first.x - 10.0).abs() < EPS && (first.y - 20.0).abs() < EPS);
    assert!((last.x - 210.0).abs() < EPS && (last.y - 5.0).abs() < EPS);
}

#[test]
fn test_guided_tween_follows_the_curve() {
    let registry = AnimationRegistry::new();
    MotionGuidePlugin::install(&registry);
    let target = ship(0.0);
    guided(&registry, &target, arch());

    registry.tick(500.0, false);
    assert!((read(&target, "x") - 50.0).abs() < EPS);
    assert!((read(&target, "y") - 50.0).abs() < EPS);

    registry.tick(500.0, false);
    assert!((read(&target, "x") - 100.0).abs() < EPS);
    assert!(read(&target, "y").abs() < EPS);
    assert_eq!(registry.active_count(), 0);
}

#[test]
fn test_sub_range_limits_travel() {
    let registry = AnimationRegistry::new();
    MotionGuidePlugin::install(&registry);
    let target = ship(0.0);
    let line = GuideSpec::new(vec![0.0, 0.0, 50.0, 0.0, 100.0, 0.0]).with_range(0.25, 0.75);
    guided(&registry, &target, line);

    registry.tick(1.0, false);
    assert!((read(&target, "x") - 25.05).abs() < EPS);
    registry.tick(499.0, false);
    assert!((read(&target, "x") - 50.0).abs() < EPS);
    registry.tick(500.0, false);
    assert!((read(&target, "x") - 75.0).abs() < EPS);
}

/// Fixed orientation keeps the initial offset from the path tangent
#[test]
fn test_fixed_orientation_tracks_tangent() {
    let registry = AnimationRegistry::new();
    MotionGuidePlugin::install(&registry);
    let target = ship(30.0);
    guided(&registry, &target, arch().with_orient(Orientation::Fixed));

    let start_tangent = 100.0_f64.atan2(50.0).to_degrees();
    registry.tick(500.0, false);
    assert!((read(&target, "rotation") - (30.0 - start_tangent)).abs() < EPS);

    registry.tick(500.0, false);
    assert!((read(&target, "rotation") - (30.0 - 2.0 * start_tangent)).abs() < EPS);
}

#[test]
fn test_auto_and_counter_clockwise_orientation() {
    let registry = AnimationRegistry::new();
    MotionGuidePlugin::install(&registry);

    let auto = ship(0.0);
    guided(&registry, &auto, arch().with_orient(Orientation::Auto));
    let ccw = ship(0.0);
    guided(&registry, &ccw, arch().with_orient(Orientation::CounterClockwise));

    registry.tick(500.0, false);
    assert!(read(&auto, "rotation").abs() < EPS);
    assert!((read(&ccw, "rotation") + 180.0).abs() < EPS);

    // Both settle on the target's own rotation.
    registry.tick(500.0, false);
    assert!(read(&auto, "rotation").abs() < EPS);
    assert!(read(&ccw, "rotation").abs() < EPS);
}

#[test]
fn test_unoriented_guide_leaves_rotation_alone() {
    let registry = AnimationRegistry::new();
    MotionGuidePlugin::install(&registry);
    let target = ship(12.0);
    guided(&registry, &target, arch());

    registry.tick(250.0, false);
    assert_eq!(read(&target, "rotation"), 12.0);
}

#[test]
fn test_invalid_guide_is_skipped() {
    let registry = AnimationRegistry::new();
    MotionGuidePlugin::install(&registry);
    let target = ship(0.0);
    let bad = MotionGuide::new(GuideSpec::new(vec![0.0, 0.0, 1.0, 1.0]));
    assert_eq!(bad.validate(), Err(GuideError::BadPathLength(4)));

    let tween = registry.get(target.clone(), TweenProps::default());
    tween.to(props! { "guide" => bad.clone() }, 1000.0, Easing::Linear);
    assert!(!bad.is_valid());

    registry.tick(1000.0, false);
    assert_eq!(read(&target, "x"), 0.0);
    assert_eq!(read(&target, "y"), 0.0);
    assert_eq!(tween.position(), 1000.0);
}

#[test]
fn test_plugin_attaches_only_to_guided_tweens() {
    let registry = AnimationRegistry::new();
    MotionGuidePlugin::install(&registry);

    let plain = registry.get(ship(0.0), TweenProps::default());
    plain.to(props! { "x" => 5.0 }, 100.0, Easing::Linear);
    assert!(!plain.has_plugin(MotionGuidePlugin::ID));

    let target = ship(0.0);
    let tween = registry.get(target, TweenProps::default());
    tween.to(props! { "guide" => MotionGuide::new(arch()) }, 100.0, Easing::Linear);
    assert!(tween.has_plugin(MotionGuidePlugin::ID));

    // Installing twice keeps one copy.
    MotionGuidePlugin::install(&registry);
    assert_eq!(registry.plugins().len(), 1);
}
