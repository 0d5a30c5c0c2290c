//! Integration tests for a registry driven by the heartbeat ticker
//!
//! The clock and wake driver are manual, so each "frame" is an explicit
//! `clock.advance` followed by `ticker.handle_wake`.

use std::cell::RefCell;
use std::rc::Rc;

use cadence_animation::{
    props, Animation, AnimationConfig, AnimationRegistry, Easing, PropertyBag, Ticker, TickerConfig,
    TimingMode, TweenProps,
};
use cadence_platform::{ManualClock, ManualDriver, WakeRequest};

const EPS: f64 = 1e-9;

struct Harness {
    clock: Rc<ManualClock>,
    driver: Rc<ManualDriver>,
    ticker: Rc<Ticker>,
    registry: AnimationRegistry,
}

impl Harness {
    fn new(config: TickerConfig) -> Self {
        let clock = Rc::new(ManualClock::new(0.0));
        let driver = Rc::new(ManualDriver::new());
        let ticker = Rc::new(Ticker::with_config(clock.clone(), driver.clone(), &config));
        let registry = AnimationRegistry::with_ticker(ticker.clone());
        Self {
            clock,
            driver,
            ticker,
            registry,
        }
    }

    fn frame(&self, ms: f64) -> bool {
        self.clock.advance(ms);
        self.ticker.handle_wake()
    }
}

fn ball() -> Rc<RefCell<PropertyBag>> {
    PropertyBag::new().with("x", 0.0).shared()
}

fn x_of(target: &Rc<RefCell<PropertyBag>>) -> f64 {
    target.borrow().number("x").unwrap_or(f64::NAN)
}

#[test]
fn test_first_tween_starts_the_ticker() {
    let h = Harness::new(TickerConfig::default());
    assert!(!h.ticker.is_initialized());

    let target = ball();
    h.registry
        .get(target.clone(), TweenProps::default())
        .to(props! { "x" => 100.0 }, 200.0, Easing::Linear);

    assert!(h.ticker.is_initialized());
    assert_eq!(h.driver.last_request(), Some(WakeRequest::After(50.0)));

    for _ in 0..4 {
        assert!(h.frame(50.0));
    }
    assert!((x_of(&target) - 100.0).abs() < EPS);
    assert_eq!(h.ticker.ticks(false), 4);
    assert_eq!(h.registry.active_count(), 0);
}

#[test]
fn test_global_pause_holds_tweens_unless_ignored() {
    let h = Harness::new(TickerConfig::default());
    let held = ball();
    let free = ball();
    h.registry
        .get(held.clone(), TweenProps::default())
        .to(props! { "x" => 100.0 }, 1000.0, Easing::Linear);
    h.registry
        .get(free.clone(), TweenProps::default().with_ignore_global_pause(true))
        .to(props! { "x" => 100.0 }, 1000.0, Easing::Linear);

    h.ticker.set_paused(true);
    h.frame(100.0);
    assert_eq!(x_of(&held), 0.0);
    assert!((x_of(&free) - 10.0).abs() < EPS);

    h.ticker.set_paused(false);
    h.frame(100.0);
    assert!((x_of(&held) - 10.0).abs() < EPS);
    assert!((x_of(&free) - 20.0).abs() < EPS);

    // Paused ticks are counted but excluded from the pauseable count.
    assert_eq!(h.ticker.ticks(false), 2);
    assert_eq!(h.ticker.ticks(true), 1);
}

#[test]
fn test_max_delta_limits_a_long_stall() {
    let h = Harness::new(TickerConfig::default().with_max_delta(100.0));
    let target = ball();
    h.registry
        .get(target.clone(), TweenProps::default())
        .to(props! { "x" => 100.0 }, 1000.0, Easing::Linear);

    h.frame(700.0);
    assert!((x_of(&target) - 10.0).abs() < EPS);
    // The ticker's own clock is not capped.
    assert_eq!(h.ticker.event_time(false), 700.0);
}

#[test]
fn test_use_ticks_counts_frames() {
    let h = Harness::new(TickerConfig::default());
    let target = ball();
    h.registry
        .get(target.clone(), TweenProps::default().with_use_ticks(true))
        .to(props! { "x" => 10.0 }, 10.0, Easing::Linear);

    h.frame(500.0);
    h.frame(500.0);
    h.frame(500.0);
    assert!((x_of(&target) - 3.0).abs() < EPS);
}

/// After a reset the registry subscribes again on its next registration
#[test]
fn test_registry_resubscribes_after_reset() {
    let h = Harness::new(TickerConfig::default());
    let first = ball();
    h.registry
        .get(first.clone(), TweenProps::default())
        .to(props! { "x" => 100.0 }, 1000.0, Easing::Linear);
    h.frame(50.0);

    h.ticker.reset();
    assert!(!h.ticker.is_initialized());
    assert_eq!(h.driver.pending_count(), 0);
    assert!(!h.frame(50.0));

    let second = ball();
    h.registry
        .get(second.clone(), TweenProps::default())
        .to(props! { "x" => 100.0 }, 1000.0, Easing::Linear);
    assert!(h.ticker.is_initialized());

    assert!(h.frame(100.0));
    assert!((x_of(&second) - 10.0).abs() < EPS);
    // The first tween stayed registered and picks up where it left off.
    assert!((x_of(&first) - 15.0).abs() < EPS);
}

#[test]
fn test_frame_modes_fall_back_without_frames() {
    let clock = Rc::new(ManualClock::new(0.0));
    let driver = Rc::new(ManualDriver::without_frames());
    let config = TickerConfig::default().with_timing_mode(TimingMode::RafSynched);
    let ticker = Rc::new(Ticker::with_config(clock.clone(), driver.clone(), &config));
    let registry = AnimationRegistry::with_ticker(ticker.clone());

    let target = ball();
    registry
        .get(target.clone(), TweenProps::default())
        .to(props! { "x" => 100.0 }, 1000.0, Easing::Linear);
    assert_eq!(driver.last_request(), Some(WakeRequest::After(50.0)));

    clock.advance(250.0);
    assert!(ticker.handle_wake());
    assert!((x_of(&target) - 25.0).abs() < EPS);
}

#[test]
fn test_config_file_drives_ticker_and_tweens() {
    let config = AnimationConfig::from_toml_str(
        r#"
        [ticker]
        interval_ms = 20.0
        timing_mode = "raf"

        [tween]
        loop_count = 1
        bounce = true
        "#,
    )
    .unwrap();

    let h = Harness::new(config.ticker.clone());
    assert_eq!(h.ticker.framerate(), 50.0);
    assert_eq!(h.ticker.timing_mode(), TimingMode::Raf);

    let target = ball();
    let tween = h.registry.get(target.clone(), config.tween.clone());
    tween.to(props! { "x" => 100.0 }, 100.0, Easing::Linear);
    assert_eq!(h.driver.last_request(), Some(WakeRequest::NextFrame));

    h.frame(150.0);
    assert!((x_of(&target) - 50.0).abs() < EPS);
    h.frame(50.0);
    assert!(x_of(&target).abs() < EPS);
    assert!(tween.is_paused());
}
