//! Cadence Animation System
//!
//! Keyframed property animation driven by a heartbeat ticker.
//!
//! # Features
//!
//! - **Ticker**: broadcasts `tick` events at a target rate through an
//!   injected clock and frame driver
//! - **Tweens**: chained `to`/`wait`/`call`/`set` steps over one target's
//!   named properties, with per-step easing
//! - **Timelines**: several animations synchronized to one position, with
//!   labels and loop/bounce/reverse playback
//! - **Registry**: the set of running animations, advanced once per tick
//! - **Plugins**: hooks into property initialization, step creation and
//!   per-frame writes; the motion guide plugin moves targets along curves
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use cadence_animation::{props, Animation, AnimationRegistry, Easing, PropertyBag, Ticker, TweenProps};
//! use cadence_platform::{ManualClock, ManualDriver};
//!
//! let clock = Rc::new(ManualClock::new(0.0));
//! let ticker = Rc::new(Ticker::new(clock.clone(), Rc::new(ManualDriver::new())));
//! let registry = AnimationRegistry::with_ticker(ticker.clone());
//!
//! let ball = PropertyBag::new().with("x", 0.0).shared();
//! registry
//!     .get(ball.clone(), TweenProps::default())
//!     .to(props! { "x" => 100.0 }, 200.0, Easing::Linear);
//!
//! clock.advance(50.0);
//! ticker.handle_wake();
//! assert_eq!(ball.borrow().number("x"), Some(25.0));
//! ```

pub mod animation;
pub mod config;
pub mod easing;
pub mod error;
pub mod labels;
pub mod motion_guide;
pub mod plugin;
pub mod registry;
pub mod target;
pub mod ticker;
pub mod timeline;
pub mod tween;
pub mod value;

pub use animation::{same_animation, Animation, Position, TimelineState};
pub use config::{AnimationConfig, TickerConfig, TimelineProps, TimingMode, TweenProps, LOOP_FOREVER};
pub use easing::Easing;
pub use error::{AnimationError, GuideError, Result};
pub use labels::{Label, LabelTable};
pub use motion_guide::{GuideSpec, MotionGuide, MotionGuidePlugin, Orientation, PathPoint};
pub use plugin::{Plugin, PluginOutcome, StepView};
pub use registry::{ActiveKey, AnimationRegistry};
pub use target::{PropertyBag, SharedTarget, Target, TargetKey};
pub use ticker::Ticker;
pub use timeline::Timeline;
pub use tween::{Step, Tween};
pub use value::{PropMap, PropValue};
