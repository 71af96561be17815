//! Game clock tracking the time used by each color.
//!
//! The clock is either stopped or running for one color. Time comes from a
//! [`TimeSource`] so tests can drive it by hand. All state lives behind one
//! mutex per clock: ticks from a [`Ticker`] thread and calls from the owner
//! never interleave. Listeners are invoked synchronously after every change,
//! outside the lock, and are expected to hand any display work to their own
//! execution context.
//!
//! When a color stops (by `stop` or by the other color starting) its time
//! left is written back into a [`Node`] if one is given.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::color::{BlackWhite, Color};
use crate::constants::CLOCK_TICK_INTERVAL;
use crate::game_info::TimeSettings;
use crate::node::Node;

/// Monotonic time in milliseconds.
pub trait TimeSource: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock time measured from creation.
pub struct SystemTimeSource {
    start: Instant,
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// What changed, passed to listeners.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    Started(Color),
    Stopped(Color),
    Tick(Color),
    Reset,
}

pub type Listener = Arc<dyn Fn(&Clock, ClockEvent) + Send + Sync>;

#[derive(Clone, Debug, Default)]
struct TimeRecord {
    /// Milliseconds used in the main time or in the current byo-yomi period,
    /// excluding the running move.
    used: u64,
    in_byoyomi: bool,
    moves_left: u32,
}

#[derive(Default)]
struct State {
    settings: Option<TimeSettings>,
    records: BlackWhite<TimeRecord>,
    /// Running color and the time it started.
    running: Option<(Color, u64)>,
}

pub struct Clock {
    source: Box<dyn TimeSource>,
    state: Mutex<State>,
    listeners: Mutex<Vec<Listener>>,
}

impl Clock {
    pub fn new(source: impl TimeSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            state: Mutex::new(State::default()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn with_system_time() -> Self {
        Self::new(SystemTimeSource::default())
    }

    /// Register a callback invoked after every state change and tick.
    pub fn add_listener(&self, listener: impl Fn(&Clock, ClockEvent) + Send + Sync + 'static) {
        self.listeners.lock().push(Arc::new(listener));
    }

    fn notify(&self, event: ClockEvent) {
        let listeners: Vec<_> = self.listeners.lock().clone();
        for l in listeners {
            l(self, event);
        }
    }

    pub fn time_settings(&self) -> Option<TimeSettings> {
        self.state.lock().settings
    }

    /// Replace the time settings and reset both colors.
    pub fn set_time_settings(&self, settings: Option<TimeSettings>) {
        self.state.lock().settings = settings;
        self.reset();
    }

    /// Stop the clock and clear the time used by both colors.
    pub fn reset(&self) {
        {
            let mut state = self.state.lock();
            state.running = None;
            state.records = BlackWhite::default();
        }
        self.notify(ClockEvent::Reset);
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running.is_some()
    }

    pub fn running_color(&self) -> Option<Color> {
        self.state.lock().running.map(|(c, _)| c)
    }

    /// Start the clock for `color`, stopping the other color if it runs.
    pub fn start(&self, color: Color) {
        self.start_into(color, None);
    }

    /// Like [`start`](Self::start), writing the stopped color's time into
    /// `node`.
    pub fn start_into(&self, color: Color, node: Option<&mut Node>) {
        let now = self.source.now_millis();
        let stopped = {
            let mut state = self.state.lock();
            if state.running.is_some_and(|(c, _)| c == color) {
                return;
            }
            let stopped = state.halt(now);
            if let (Some(c), Some(node)) = (stopped, node) {
                state.write_back(c, node);
            }
            state.running = Some((color, now));
            stopped
        };
        debug!(%color, "clock started");
        if let Some(c) = stopped {
            self.notify(ClockEvent::Stopped(c));
        }
        self.notify(ClockEvent::Started(color));
    }

    /// Stop the clock. Does nothing if it is not running.
    pub fn stop(&self) {
        self.stop_into(None);
    }

    /// Stop the clock and write the stopped color's time left into `node`.
    ///
    /// Nothing is written without time settings, since the time left is then
    /// unknown.
    pub fn stop_into(&self, node: Option<&mut Node>) {
        let now = self.source.now_millis();
        let stopped = {
            let mut state = self.state.lock();
            let stopped = state.halt(now);
            if let (Some(c), Some(node)) = (stopped, node) {
                state.write_back(c, node);
            }
            stopped
        };
        if let Some(c) = stopped {
            debug!(color = %c, "clock stopped");
            self.notify(ClockEvent::Stopped(c));
        }
    }

    /// Notify listeners of the running color's current reading.
    pub fn tick(&self) {
        if let Some(c) = self.running_color() {
            trace!(color = %c, "clock tick");
            self.notify(ClockEvent::Tick(c));
        }
    }

    /// Seconds used by `color` in the current period, including the running
    /// move.
    pub fn elapsed(&self, color: Color) -> f64 {
        let now = self.source.now_millis();
        self.state.lock().used_at(color, now) as f64 / 1000.0
    }

    /// Seconds left for `color`, or `None` without time settings.
    pub fn time_left(&self, color: Color) -> Option<f64> {
        let now = self.source.now_millis();
        self.state.lock().time_left_at(color, now)
    }

    /// Moves left in the byo-yomi period, or `None` outside byo-yomi.
    pub fn moves_left(&self, color: Color) -> Option<u32> {
        let state = self.state.lock();
        let r = &state.records[color];
        r.in_byoyomi.then_some(r.moves_left)
    }

    pub fn is_in_byoyomi(&self, color: Color) -> bool {
        self.state.lock().records[color].in_byoyomi
    }

    /// True if `color` has no time left.
    pub fn lost_on_time(&self, color: Color) -> bool {
        self.time_left(color).is_some_and(|t| t < 0.0)
    }

    /// Set the clock of a stopped color from recorded values.
    ///
    /// A `moves_left` puts the color into byo-yomi.
    pub fn restore(&self, color: Color, time_left: f64, moves_left: Option<u32>) {
        {
            let mut state = self.state.lock();
            let Some(settings) = state.settings else {
                return;
            };
            let record = &mut state.records[color];
            let period = match (moves_left, settings.byoyomi) {
                (Some(n), Some(b)) => {
                    record.in_byoyomi = true;
                    record.moves_left = n;
                    b.time
                }
                _ => {
                    record.in_byoyomi = false;
                    settings.main_time
                }
            };
            let left = (time_left.max(0.0) * 1000.0) as u64;
            record.used = period.saturating_mul(1000).saturating_sub(left);
        }
        self.notify(ClockEvent::Reset);
    }

    /// Restore both colors from the time fields of a node.
    pub fn restore_from(&self, node: &Node) {
        for c in Color::ALL {
            if let Some(t) = node.time_left(c) {
                self.restore(c, t, node.moves_left(c));
            }
        }
    }
}

impl State {
    fn used_at(&self, color: Color, now: u64) -> u64 {
        let running = match self.running {
            Some((c, since)) if c == color => now.saturating_sub(since),
            _ => 0,
        };
        self.records[color].used.saturating_add(running)
    }

    fn time_left_at(&self, color: Color, now: u64) -> Option<f64> {
        let settings = self.settings?;
        let period = if self.records[color].in_byoyomi {
            settings.byoyomi.map_or(0, |b| b.time)
        } else {
            settings.main_time
        };
        Some(period as f64 - self.used_at(color, now) as f64 / 1000.0)
    }

    /// Stop the running color, account for the finished move, and return
    /// the stopped color.
    fn halt(&mut self, now: u64) -> Option<Color> {
        let (color, since) = self.running.take()?;
        let settings = self.settings;
        let record = &mut self.records[color];
        record.used = record.used.saturating_add(now.saturating_sub(since));
        if let Some(b) = settings.and_then(|s| s.byoyomi) {
            let main = settings.map_or(0, |s| s.main_time).saturating_mul(1000);
            if !record.in_byoyomi && record.used > main {
                record.in_byoyomi = true;
                record.used -= main;
                record.moves_left = b.moves;
            }
            if record.in_byoyomi {
                record.moves_left = record.moves_left.saturating_sub(1);
                if record.moves_left == 0 {
                    record.used = 0;
                    record.moves_left = b.moves;
                }
            }
        }
        Some(color)
    }

    fn write_back(&self, color: Color, node: &mut Node) {
        // The clock is stopped here, so `now` does not matter.
        let Some(left) = self.time_left_at(color, 0) else {
            return;
        };
        node.set_time_left(color, left);
        let r = &self.records[color];
        node.set_moves_left(color, r.in_byoyomi.then_some(r.moves_left));
    }
}

/// Background thread calling [`Clock::tick`] periodically.
///
/// The thread stops when the ticker is dropped or [`Ticker::stop`] is called.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn(clock: Arc<Clock>, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !flag.load(Ordering::Acquire) {
                thread::sleep(interval);
                clock.tick();
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Tick every [`CLOCK_TICK_INTERVAL`].
    pub fn spawn_default(clock: Arc<Clock>) -> Self {
        Self::spawn(clock, CLOCK_TICK_INTERVAL)
    }

    /// Stop the thread and wait for it. Calling this twice is harmless.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
