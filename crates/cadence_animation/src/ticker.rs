//! Heartbeat scheduler
//!
//! The ticker broadcasts `tick` events at a target interval. It never owns an
//! event loop: it asks its [`FrameDriver`] for the next wake and the host
//! calls [`Ticker::handle_wake`] when that wake fires. Time is read through
//! an injected [`Clock`].
//!
//! The ticker initializes itself lazily when the first listener is added.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use cadence_core::{event_types, Dispatchable, Event, EventData, EventDispatcher, Listener, TickData};
use cadence_platform::{Clock, FrameDriver, WakeHandle, WakeRequest};

use crate::config::{TickerConfig, TimingMode};

/// Samples kept for the measured-rate statistics
const MAX_SAMPLES: usize = 100;

/// Approximate frame period used when sleeping for a frame wake
const FRAME_MS: f64 = 1000.0 / 60.0;

#[derive(Debug, Clone, Copy)]
struct PendingWake {
    handle: WakeHandle,
    request: WakeRequest,
    synched: bool,
}

#[derive(Debug)]
struct TickerState {
    initialized: bool,
    interval: f64,
    timing_mode: TimingMode,
    max_delta: f64,
    paused: bool,
    start_time: f64,
    last_time: f64,
    ticks: u64,
    paused_ticks: u64,
    paused_time: f64,
    times: VecDeque<f64>,
    tick_times: VecDeque<f64>,
    pending: Option<PendingWake>,
}

/// Broadcasts `tick` events at a steady rate
pub struct Ticker {
    state: RefCell<TickerState>,
    events: EventDispatcher,
    clock: Rc<dyn Clock>,
    driver: Rc<dyn FrameDriver>,
}

impl Ticker {
    pub fn new(clock: Rc<dyn Clock>, driver: Rc<dyn FrameDriver>) -> Self {
        Self::with_config(clock, driver, &TickerConfig::default())
    }

    pub fn with_config(clock: Rc<dyn Clock>, driver: Rc<dyn FrameDriver>, config: &TickerConfig) -> Self {
        Self {
            state: RefCell::new(TickerState {
                initialized: false,
                interval: config.interval_ms,
                timing_mode: config.timing_mode,
                max_delta: config.max_delta,
                paused: config.paused,
                start_time: 0.0,
                last_time: 0.0,
                ticks: 0,
                paused_ticks: 0,
                paused_time: 0.0,
                times: VecDeque::new(),
                tick_times: VecDeque::new(),
                pending: None,
            }),
            events: EventDispatcher::new(),
            clock,
            driver,
        }
    }

    /// Start the clock and schedule the first wake. Idempotent.
    pub fn init(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.initialized {
                return;
            }
            state.initialized = true;
            state.times.clear();
            state.tick_times.clear();
            state.start_time = self.clock.now_ms();
            state.last_time = 0.0;
            state.times.push_front(0.0);
        }
        tracing::debug!(interval = self.interval(), "ticker initialized");
        self.setup_tick();
    }

    /// Cancel the pending wake, drop every tick listener and zero the counters
    pub fn reset(&self) {
        let pending = {
            let mut state = self.state.borrow_mut();
            state.initialized = false;
            state.times.clear();
            state.tick_times.clear();
            state.start_time = 0.0;
            state.last_time = 0.0;
            state.ticks = 0;
            state.paused_ticks = 0;
            state.paused_time = 0.0;
            state.pending.take()
        };
        if let Some(pending) = pending {
            self.driver.cancel(pending.handle);
        }
        self.events.remove_all_listeners(Some(event_types::TICK));
        tracing::debug!("ticker reset");
    }

    pub fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    /// Target milliseconds between ticks
    pub fn interval(&self) -> f64 {
        self.state.borrow().interval
    }

    /// Change the interval. Takes effect from the next scheduled wake.
    pub fn set_interval(&self, interval: f64) {
        let initialized = {
            let mut state = self.state.borrow_mut();
            state.interval = interval;
            state.initialized
        };
        if initialized {
            self.setup_tick();
        }
    }

    /// Target ticks per second
    pub fn framerate(&self) -> f64 {
        1000.0 / self.interval()
    }

    pub fn set_framerate(&self, fps: f64) {
        self.set_interval(1000.0 / fps);
    }

    pub fn timing_mode(&self) -> TimingMode {
        self.state.borrow().timing_mode
    }

    pub fn set_timing_mode(&self, mode: TimingMode) {
        self.state.borrow_mut().timing_mode = mode;
    }

    pub fn max_delta(&self) -> f64 {
        self.state.borrow().max_delta
    }

    /// Cap the delta reported to listeners. Zero disables the cap.
    pub fn set_max_delta(&self, max_delta: f64) {
        self.state.borrow_mut().max_delta = max_delta;
    }

    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    /// Global pause. Ticks keep firing, flagged as paused, and paused time
    /// is excluded from run time.
    pub fn set_paused(&self, paused: bool) {
        self.state.borrow_mut().paused = paused;
    }

    /// The wake currently awaited, if any
    pub fn pending_wake(&self) -> Option<WakeRequest> {
        self.state.borrow().pending.map(|p| p.request)
    }

    fn elapsed(&self) -> f64 {
        self.clock.now_ms() - self.state.borrow().start_time
    }

    fn setup_tick(&self) {
        let (mode, interval) = {
            let state = self.state.borrow();
            if state.pending.is_some() {
                return;
            }
            (state.timing_mode, state.interval)
        };

        if matches!(mode, TimingMode::RafSynched | TimingMode::Raf) && self.driver.supports_frames() {
            match self.driver.request(WakeRequest::NextFrame) {
                Ok(handle) => {
                    self.state.borrow_mut().pending = Some(PendingWake {
                        handle,
                        request: WakeRequest::NextFrame,
                        synched: mode == TimingMode::RafSynched,
                    });
                    return;
                }
                Err(err) => {
                    tracing::warn!(%err, "frame wake rejected, falling back to timeout");
                }
            }
        } else if mode != TimingMode::Timeout {
            tracing::debug!("frame driver has no frame primitive, using timeout mode");
        }

        let request = WakeRequest::After(interval);
        match self.driver.request(request) {
            Ok(handle) => {
                self.state.borrow_mut().pending = Some(PendingWake {
                    handle,
                    request,
                    synched: false,
                });
            }
            Err(err) => tracing::warn!(%err, "timeout wake rejected, ticker stalled"),
        }
    }

    /// Called by the host when the requested wake fires. Schedules the next
    /// wake, then ticks. Returns whether a tick was dispatched.
    ///
    /// In synched frame mode, frames arriving well before the interval has
    /// elapsed are skipped.
    pub fn handle_wake(&self) -> bool {
        let Some(pending) = self.state.borrow_mut().pending.take() else {
            return false;
        };
        self.driver.fired(pending.handle);
        self.setup_tick();

        if pending.synched {
            let (last_time, interval) = {
                let state = self.state.borrow();
                (state.last_time, state.interval)
            };
            let since_last = self.elapsed() - last_time;
            if since_last < (interval - 1.0) * 0.97 {
                tracing::trace!(since_last, "early frame skipped");
                return false;
            }
        }
        self.tick();
        true
    }

    fn tick(&self) {
        let time = self.elapsed();
        let (elapsed, paused, paused_time, max_delta) = {
            let mut state = self.state.borrow_mut();
            let elapsed = time - state.last_time;
            state.last_time = time;
            state.ticks += 1;
            if state.paused {
                state.paused_ticks += 1;
                state.paused_time += elapsed;
            }
            (elapsed, state.paused, state.paused_time, state.max_delta)
        };

        if self.events.has_listener(event_types::TICK) {
            let delta = if max_delta > 0.0 && elapsed > max_delta {
                max_delta
            } else {
                elapsed
            };
            let data = TickData {
                delta,
                paused,
                time,
                run_time: time - paused_time,
            };
            self.dispatch_event(Event::new(event_types::TICK).with_data(EventData::Tick(data)));
        }

        let spent = self.elapsed() - time;
        let mut state = self.state.borrow_mut();
        // A listener may have reset the ticker mid-dispatch.
        if state.initialized {
            state.tick_times.push_front(spent);
            state.tick_times.truncate(MAX_SAMPLES);
            state.times.push_front(time);
            state.times.truncate(MAX_SAMPLES);
        }
    }

    /// Average milliseconds spent dispatching over the last `ticks` ticks
    /// (default: one second's worth). −1 before any tick.
    pub fn measured_tick_time(&self, ticks: Option<usize>) -> f64 {
        let state = self.state.borrow();
        if state.tick_times.is_empty() {
            return -1.0;
        }
        let n = ticks
            .unwrap_or_else(|| (1000.0 / state.interval) as usize)
            .clamp(1, state.tick_times.len());
        state.tick_times.iter().take(n).sum::<f64>() / n as f64
    }

    /// Ticks per second actually achieved over the last `ticks` ticks
    /// (default: one second's worth). −1 until two samples exist.
    pub fn measured_fps(&self, ticks: Option<usize>) -> f64 {
        let state = self.state.borrow();
        if state.times.len() < 2 {
            return -1.0;
        }
        let n = ticks
            .unwrap_or_else(|| (1000.0 / state.interval) as usize)
            .clamp(1, state.times.len() - 1);
        1000.0 / ((state.times[0] - state.times[n]) / n as f64)
    }

    /// Milliseconds since init, optionally excluding paused time. −1 before init.
    pub fn time(&self, run_time: bool) -> f64 {
        let state = self.state.borrow();
        if !state.initialized {
            return -1.0;
        }
        let paused = if run_time { state.paused_time } else { 0.0 };
        self.clock.now_ms() - state.start_time - paused
    }

    /// Time of the last tick, optionally excluding paused time. −1 before init.
    pub fn event_time(&self, run_time: bool) -> f64 {
        let state = self.state.borrow();
        if !state.initialized {
            return -1.0;
        }
        let paused = if run_time { state.paused_time } else { 0.0 };
        state.last_time - paused
    }

    /// Ticks since init, optionally excluding ticks that fired while paused
    pub fn ticks(&self, pauseable: bool) -> u64 {
        let state = self.state.borrow();
        if pauseable {
            state.ticks - state.paused_ticks
        } else {
            state.ticks
        }
    }

    /// Drive the ticker from the current thread, sleeping until each
    /// requested wake is due. For drivers that only record requests, such as
    /// `ManualDriver` paired with `SystemClock`. Stops when `keep_running`
    /// returns `false` or nothing is scheduled.
    pub fn run_blocking<F>(&self, mut keep_running: F)
    where
        F: FnMut() -> bool,
    {
        self.init();
        while keep_running() {
            let Some(request) = self.pending_wake() else {
                tracing::debug!("ticker has nothing scheduled, leaving run loop");
                break;
            };
            let wait_ms = match request {
                WakeRequest::NextFrame => FRAME_MS,
                WakeRequest::After(ms) => ms,
            };
            std::thread::sleep(Duration::from_secs_f64(wait_ms.max(0.0) / 1000.0));
            self.handle_wake();
        }
    }
}

impl Dispatchable for Ticker {
    fn dispatcher(&self) -> &EventDispatcher {
        &self.events
    }

    /// Adding the first listener starts the ticker
    fn add_listener(&self, event_type: &str, listener: Listener, use_capture: bool) -> Listener {
        self.init();
        self.events.add_listener(event_type, listener, use_capture)
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Ticker]")
    }
}
