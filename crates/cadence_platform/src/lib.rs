//! Cadence Platform Abstraction
//!
//! The environment dependencies of the animation runtime, behind small
//! injectable traits:
//!
//! - [`Clock`]: a monotonic millisecond clock ([`SystemClock`], [`ManualClock`])
//! - [`FrameDriver`]: "wake me on the next frame" / "wake me after N ms"
//!   ([`ManualDriver`])

pub mod clock;
pub mod driver;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{FrameDriver, ManualDriver, WakeHandle, WakeRequest};
pub use error::{PlatformError, Result};
