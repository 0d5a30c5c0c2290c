//! Guided Path Demo
//!
//! A ship follows an S-shaped motion guide, turning to face its heading:
//! - Validating and solving guide data up front
//! - Previewing points along the path with `sample`
//! - A looping, bouncing tween driven through the motion guide plugin
//!
//! Run with: cargo run -p cadence_animation --example guided_path

use std::rc::Rc;

use cadence_animation::{
    props, Animation, AnimationRegistry, Easing, GuideSpec, MotionGuide, MotionGuidePlugin,
    Orientation, PropertyBag, Result, Ticker, TickerConfig, TimingMode, TweenProps,
};
use cadence_core::{event_types, listener, Dispatchable};
use cadence_platform::{ManualDriver, SystemClock};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let spec = GuideSpec::new(vec![
        0.0, 200.0, 100.0, 0.0, 200.0, 200.0, 300.0, 400.0, 400.0, 200.0,
    ])
    .with_orient(Orientation::Auto);
    let guide = MotionGuide::try_new(spec)?;
    for step in 0..=4 {
        let ratio = step as f64 / 4.0;
        let point = guide.sample(ratio)?;
        println!(
            "preview {ratio:.2}: ({:.1}, {:.1}) heading {:.1}",
            point.x, point.y, point.rotation
        );
    }

    let config = TickerConfig::default()
        .with_framerate(30.0)
        .with_timing_mode(TimingMode::RafSynched);
    let ticker = Rc::new(Ticker::with_config(
        Rc::new(SystemClock::new()),
        Rc::new(ManualDriver::new()),
        &config,
    ));
    let registry = AnimationRegistry::with_ticker(ticker.clone());
    MotionGuidePlugin::install(&registry);

    let ship = PropertyBag::new()
        .with("x", 0.0)
        .with("y", 200.0)
        .with("rotation", 0.0)
        .shared();
    let voyage = registry.get(ship.clone(), TweenProps::default().with_loop(1).with_bounce(true));
    voyage.to(props! { "guide" => guide }, 1500.0, Easing::SineInOut);

    {
        let ship = ship.clone();
        ticker.add_listener(
            event_types::TICK,
            listener(move |event| {
                let Some(tick) = event.tick() else {
                    return;
                };
                let ship = ship.borrow();
                println!(
                    "t={:>6.0}ms  ({:>6.1}, {:>6.1})  heading {:>7.1}",
                    tick.time,
                    ship.number("x").unwrap_or_default(),
                    ship.number("y").unwrap_or_default(),
                    ship.number("rotation").unwrap_or_default(),
                );
            }),
            false,
        );
    }

    ticker.run_blocking(|| !voyage.is_paused());
    println!("{voyage} docked");
    Ok(())
}
