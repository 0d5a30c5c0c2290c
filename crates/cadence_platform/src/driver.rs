//! Wake drivers
//!
//! A [`FrameDriver`] is the "call me back later" primitive: either on the
//! next display refresh or after a fixed delay. The driver only records and
//! schedules; whoever owns the event loop fires the wake by calling back into
//! the ticker.

use std::cell::{Cell, RefCell};

use crate::error::{PlatformError, Result};

/// What kind of wake the ticker wants next
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WakeRequest {
    /// On the next display refresh
    NextFrame,
    /// After roughly this many milliseconds
    After(f64),
}

/// Handle for a scheduled wake, used to cancel it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WakeHandle(u64);

impl WakeHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Scheduling primitive supplied by the host platform
pub trait FrameDriver {
    /// Whether [`WakeRequest::NextFrame`] is available
    fn supports_frames(&self) -> bool;

    fn request(&self, request: WakeRequest) -> Result<WakeHandle>;

    fn cancel(&self, handle: WakeHandle);

    /// Called by the ticker when a wake it requested has fired
    fn fired(&self, _handle: WakeHandle) {}
}

/// A driver that queues requests for the host (or a test) to fire by hand
#[derive(Debug)]
pub struct ManualDriver {
    frames: bool,
    next_id: Cell<u64>,
    pending: RefCell<Vec<(WakeHandle, WakeRequest)>>,
}

impl ManualDriver {
    pub fn new() -> Self {
        Self {
            frames: true,
            next_id: Cell::new(1),
            pending: RefCell::new(Vec::new()),
        }
    }

    /// A driver without a frame primitive, as on hosts with no display
    pub fn without_frames() -> Self {
        Self {
            frames: false,
            ..Self::new()
        }
    }

    /// Requests that were made and neither fired nor cancelled
    pub fn pending(&self) -> Vec<(WakeHandle, WakeRequest)> {
        self.pending.borrow().clone()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// The most recent outstanding request
    pub fn last_request(&self) -> Option<WakeRequest> {
        self.pending.borrow().last().map(|(_, request)| *request)
    }
}

impl Default for ManualDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver for ManualDriver {
    fn supports_frames(&self) -> bool {
        self.frames
    }

    fn request(&self, request: WakeRequest) -> Result<WakeHandle> {
        if request == WakeRequest::NextFrame && !self.frames {
            return Err(PlatformError::FramesUnsupported);
        }
        if let WakeRequest::After(ms) = request {
            if !ms.is_finite() {
                return Err(PlatformError::WakeRejected(format!("delay {ms} is not finite")));
            }
        }
        let handle = WakeHandle::new(self.next_id.get());
        self.next_id.set(handle.value() + 1);
        self.pending.borrow_mut().push((handle, request));
        tracing::trace!(?handle, ?request, "wake requested");
        Ok(handle)
    }

    fn cancel(&self, handle: WakeHandle) {
        self.pending.borrow_mut().retain(|(h, _)| *h != handle);
    }

    fn fired(&self, handle: WakeHandle) {
        self.cancel(handle);
    }
}
