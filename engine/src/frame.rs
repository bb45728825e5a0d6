//! # Frame pump
//!
//! One call to [`Engine::update_all`] is one display refresh:
//!
//! ```text
//!  clock.now() ─► hook.on_time() ─► backgrounds.update() ─► sprites.update()
//!                                                                │
//!        compose both screens ◄─ flush both OAMs ◄─ vblank.wait()┘
//! ```
//!
//! Later steps read what earlier steps wrote, so the order is fixed.

use std::thread;
use std::time::{Duration, Instant};

use crate::background::BackgroundManager;
use crate::clamp::normalize_screen;
use crate::clock::{Clock, DateTime, SystemClock};
use crate::render::color::Color;
use crate::render::{Display, SCREEN_COUNT};
use crate::sprite::SpriteManager;

/// Blocks until the next refresh boundary.
pub trait VBlank {
    fn wait(&mut self);
}

/// Paces frames at a fixed rate by sleeping until each deadline.
pub struct FixedRate {
    period: Duration,
    deadline: Option<Instant>,
}

impl FixedRate {
    pub fn new(frames_per_second: u32) -> Self {
        Self {
            period: Duration::from_secs(1) / frames_per_second.max(1),
            deadline: None,
        }
    }
}

impl Default for FixedRate {
    fn default() -> Self {
        Self::new(60)
    }
}

impl VBlank for FixedRate {
    fn wait(&mut self) {
        let now = Instant::now();
        let deadline = self.deadline.unwrap_or(now + self.period);
        if let Some(remaining) = deadline.checked_duration_since(now) {
            thread::sleep(remaining);
        }
        // A late frame restarts the schedule instead of rushing to catch up.
        self.deadline = Some(deadline.max(now) + self.period);
    }
}

/// Never waits. For tests and headless runs.
#[derive(Default)]
pub struct Immediate;

impl VBlank for Immediate {
    fn wait(&mut self) {}
}

/// State outside the engine that depends on the time of day.
pub trait FrameHook {
    fn on_time(&mut self, now: &DateTime);
}

impl FrameHook for () {
    fn on_time(&mut self, _now: &DateTime) {}
}

pub struct Engine {
    pub backgrounds: BackgroundManager,
    pub sprites: SpriteManager,
    display: Display,
    clock: Box<dyn Clock + Send>,
    vblank: Box<dyn VBlank + Send>,
    now: DateTime,
    frame: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Box::new(SystemClock), Box::new(FixedRate::default()))
    }
}

impl Engine {
    pub fn new(clock: Box<dyn Clock + Send>, vblank: Box<dyn VBlank + Send>) -> Self {
        let now = clock.now();
        Self {
            backgrounds: BackgroundManager::default(),
            sprites: SpriteManager::default(),
            display: Display::default(),
            clock,
            vblank,
            now,
            frame: 0,
        }
    }

    /// Runs one refresh tick.
    pub fn update_all(&mut self, hook: &mut impl FrameHook) {
        self.now = self.clock.now();
        hook.on_time(&self.now);

        self.backgrounds.update();
        self.sprites.update();
        self.vblank.wait();

        for screen in 0..SCREEN_COUNT {
            self.sprites.flush(screen);
            self.display.compose(
                screen,
                self.backgrounds.layers(screen),
                self.sprites.oam(screen),
            );
        }

        self.frame += 1;
        tracing::trace!("frame {} done", self.frame);
    }

    /// Time read at the start of the last tick.
    pub const fn now(&self) -> DateTime {
        self.now
    }

    /// Ticks completed so far.
    pub const fn frame_count(&self) -> u64 {
        self.frame
    }

    pub const fn display(&self) -> &Display {
        &self.display
    }

    /// Color shown where no layer or sprite is opaque.
    pub fn set_backdrop(&mut self, screen: i32, color: Color) {
        self.display.set_backdrop(normalize_screen(screen), color);
    }

    /// Swaps the pacing of the pump, e.g. after a frame rate change.
    pub fn set_vblank(&mut self, vblank: Box<dyn VBlank + Send>) {
        self.vblank = vblank;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::render::color::colors;
    use crate::render::oam::ObjEntry;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<&'static str>>>;

    struct LoggingClock(Log);

    impl Clock for LoggingClock {
        fn now(&self) -> DateTime {
            self.0.lock().unwrap().push("clock");
            DateTime::default()
        }
    }

    struct LoggingVBlank(Log);

    impl VBlank for LoggingVBlank {
        fn wait(&mut self) {
            self.0.lock().unwrap().push("vblank");
        }
    }

    struct LoggingHook(Log);

    impl FrameHook for LoggingHook {
        fn on_time(&mut self, _now: &DateTime) {
            self.0.lock().unwrap().push("hook");
        }
    }

    fn headless() -> Engine {
        Engine::new(Box::new(FixedClock::default()), Box::new(Immediate))
    }

    #[test]
    fn tick_order() {
        let log = Log::default();
        let mut engine = Engine::new(
            Box::new(LoggingClock(log.clone())),
            Box::new(LoggingVBlank(log.clone())),
        );
        log.lock().unwrap().clear();

        engine.update_all(&mut LoggingHook(log.clone()));
        assert_eq!(*log.lock().unwrap(), ["clock", "hook", "vblank"]);
        assert_eq!(engine.frame_count(), 1);
    }

    #[test]
    fn sprites_are_published_after_tick() {
        let mut engine = headless();
        engine
            .sprites
            .create(1, 0, 0, &[1; 64], &[0, colors::RED.0], 8, 8)
            .unwrap();
        engine.sprites.set_xy(1, 0, 20, 30);

        assert_eq!(
            engine.sprites.oam(1).visible_entry(0),
            Some(&ObjEntry::default())
        );
        engine.update_all(&mut ());
        assert_eq!(engine.sprites.oam(1).visible_entry(0).unwrap().x, 20);
        assert_eq!(engine.display().pixel(1, 20, 30), colors::RED);
        assert_eq!(engine.display().pixel(0, 20, 30), Color::default());
    }

    #[test]
    fn backdrop_fills_empty_screens() {
        let mut engine = headless();
        engine.set_backdrop(-1, colors::BLUE);
        engine.update_all(&mut ());

        assert!(engine.display().framebuffer(0).iter().all(|c| *c == colors::BLUE));
        assert_eq!(engine.display().pixel(1, 0, 0), Color::default());
    }

    #[test]
    fn fixed_rate_paces_frames() {
        let mut vblank = FixedRate::new(200);
        let start = Instant::now();
        for _ in 0..4 {
            vblank.wait();
        }
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
