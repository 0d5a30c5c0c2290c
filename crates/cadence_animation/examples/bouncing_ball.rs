//! Bouncing Ball Demo
//!
//! A ball drops, bounces and rolls on in real time, printed once per tick:
//! - A tween chaining `to`, `wait` and `call` steps with different easings
//! - A timeline fading a shadow in step with the ball
//! - Ticker settings loaded from TOML
//!
//! Run with: cargo run -p cadence_animation --example bouncing_ball
//! Set `RUST_LOG=cadence_animation=trace` to watch registry traffic.

use std::rc::Rc;

use cadence_animation::{
    props, Animation, AnimationConfig, AnimationRegistry, Easing, PropertyBag, Result, Ticker,
    Timeline, TimelineProps, TweenProps,
};
use cadence_core::{event_types, listener, Dispatchable};
use cadence_platform::{ManualDriver, SystemClock};

const SETTINGS: &str = r#"
[ticker]
interval_ms = 40.0
max_delta = 100.0
"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = AnimationConfig::from_toml_str(SETTINGS)?;
    let ticker = Rc::new(Ticker::with_config(
        Rc::new(SystemClock::new()),
        Rc::new(ManualDriver::new()),
        &config.ticker,
    ));
    let registry = AnimationRegistry::with_ticker(ticker.clone());

    let ball = PropertyBag::new().with("x", 0.0).with("y", 0.0).shared();
    let shadow = PropertyBag::new().with("alpha", 0.2).shared();

    let fall = registry.get(ball.clone(), TweenProps::default().with_paused(true));
    fall.to(props! { "y" => 300.0 }, 600.0, Easing::BounceOut)
        .label("landed")
        .call(|tween| tracing::info!("{tween} landed"))
        .wait(200.0, false)
        .to(props! { "x" => 400.0 }, 800.0, Easing::QUAD_IN_OUT);

    let fade = registry.get(shadow.clone(), TweenProps::default().with_paused(true));
    fade.to(props! { "alpha" => 0.8 }, 600.0, Easing::BounceOut)
        .wait(1000.0, false);

    let children = vec![fall as Rc<dyn Animation>, fade as Rc<dyn Animation>];
    let timeline = Timeline::new(
        &registry,
        children,
        TimelineProps::default().with_playback(TweenProps::default().with_paused(true)),
    );
    timeline.on(
        event_types::COMPLETE,
        listener(|_| tracing::info!("timeline complete")),
        true,
    );

    {
        let ball = ball.clone();
        let shadow = shadow.clone();
        ticker.add_listener(
            event_types::TICK,
            listener(move |event| {
                let Some(tick) = event.tick() else {
                    return;
                };
                let ball = ball.borrow();
                println!(
                    "t={:>6.0}ms  x={:>6.1}  y={:>6.1}  shadow={:.2}",
                    tick.time,
                    ball.number("x").unwrap_or_default(),
                    ball.number("y").unwrap_or_default(),
                    shadow.borrow().number("alpha").unwrap_or_default(),
                );
            }),
            false,
        );
    }

    timeline.goto_and_play(0.0)?;
    ticker.run_blocking(|| !timeline.is_paused());

    println!(
        "{timeline} finished after {} ticks, measured {:.1} fps",
        ticker.ticks(false),
        ticker.measured_fps(None)
    );
    Ok(())
}
