//! Fixed-timestep clock
//!
//! Converts variable wall-clock frame time into a whole number of fixed-size
//! logical ticks. The frame driver calls [`SimulationClock::advance`] once per
//! frame, then [`SimulationClock::consume_tick`] once for every tick it runs.
//!
//! After every `advance`, `accumulated_time < tick_duration` holds. When more
//! ticks are owed than `max_ticks_per_frame`, the excess whole ticks are
//! dropped (not deferred) and the simulation falls behind wall time instead
//! of spiralling.

use crate::core::calendar::{Calendar, TimePeriod};
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::Tick;

/// Largest f32 below 1.0
const MAX_RUNNING_ALPHA: f32 = 1.0 - f32::EPSILON / 2.0;

/// The single simulation clock
#[derive(Debug, Clone)]
pub struct SimulationClock {
    current_tick: Tick,
    ticks_per_second: u32,
    tick_duration: f64,
    accumulated_time: f64,
    pending_ticks: u32,
    max_ticks_per_frame: u32,
    interpolation_alpha: f32,
    paused: bool,
    time_scale: f32,
    /// Raised by `advance` when the frame owes at least one tick
    tick_fired: bool,
    dropped_ticks: u64,
    calendar: Calendar,
}

impl SimulationClock {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            current_tick: 0,
            ticks_per_second: config.ticks_per_second.max(1),
            tick_duration: 1.0 / config.ticks_per_second.max(1) as f64,
            accumulated_time: 0.0,
            pending_ticks: 0,
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            interpolation_alpha: 0.0,
            paused: false,
            time_scale: if config.time_scale > 0.0 { config.time_scale } else { 1.0 },
            tick_fired: false,
            dropped_ticks: 0,
            calendar: Calendar::new(config.ticks_per_hour, config.hours_per_day),
        }
    }

    /// Feed one frame's elapsed wall time; returns the ticks due this frame
    ///
    /// Negative or non-finite deltas count as zero elapsed time.
    pub fn advance(&mut self, frame_delta_seconds: f64) -> u32 {
        if self.paused {
            self.pending_ticks = 0;
            self.interpolation_alpha = 1.0;
            self.tick_fired = false;
            return 0;
        }

        let frame_delta = if frame_delta_seconds.is_finite() && frame_delta_seconds > 0.0 {
            frame_delta_seconds
        } else {
            0.0
        };

        self.accumulated_time += frame_delta * self.time_scale as f64;

        let owed = (self.accumulated_time / self.tick_duration).floor();
        let mut owed = if owed.is_finite() && owed > 0.0 { owed as u64 } else { 0 };

        // Remove every owed tick from the accumulator, kept or dropped
        self.accumulated_time = (self.accumulated_time - owed as f64 * self.tick_duration).max(0.0);
        if self.accumulated_time >= self.tick_duration {
            // Division rounded just under a whole tick
            owed += 1;
            self.accumulated_time = (self.accumulated_time - self.tick_duration).max(0.0);
        }

        let pending = owed.min(self.max_ticks_per_frame as u64) as u32;
        let dropped = owed - pending as u64;
        if dropped > 0 {
            self.dropped_ticks += dropped;
            tracing::warn!(
                owed,
                dropped,
                cap = self.max_ticks_per_frame,
                "Frame overran tick budget, dropping owed simulation time"
            );
        }

        self.pending_ticks = pending;
        self.tick_fired = pending > 0;
        // The f32 cast can round a remainder just under one tick up to 1.0,
        // which is reserved for the paused state
        self.interpolation_alpha =
            ((self.accumulated_time / self.tick_duration) as f32).min(MAX_RUNNING_ALPHA);
        pending
    }

    /// Consume one pending tick, advancing the tick counter
    ///
    /// Returns the new tick number, or `None` when nothing is pending.
    pub fn consume_tick(&mut self) -> Option<Tick> {
        if self.pending_ticks == 0 {
            return None;
        }
        self.pending_ticks -= 1;
        Some(self.increment_tick())
    }

    /// Advance one tick outside the accumulator (debug stepping)
    pub(crate) fn force_tick(&mut self) -> Tick {
        self.increment_tick()
    }

    fn increment_tick(&mut self) -> Tick {
        self.current_tick += 1;
        self.calendar.sync(self.current_tick);
        self.current_tick
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    /// Seconds per tick
    pub fn tick_duration(&self) -> f64 {
        self.tick_duration
    }

    /// Seconds per tick, for tick-scoped f32 math
    pub fn seconds_per_tick(&self) -> f32 {
        self.tick_duration as f32
    }

    pub fn accumulated_time(&self) -> f64 {
        self.accumulated_time
    }

    pub fn pending_ticks(&self) -> u32 {
        self.pending_ticks
    }

    pub fn max_ticks_per_frame(&self) -> u32 {
        self.max_ticks_per_frame
    }

    /// Fraction of the way from the last tick to the next
    ///
    /// In `[0, 1)` while running; pinned to `1.0` while paused.
    pub fn interpolation_alpha(&self) -> f32 {
        self.interpolation_alpha
    }

    /// One-shot signal: did the latest `advance` make any tick due
    pub fn tick_fired(&self) -> bool {
        self.tick_fired
    }

    /// Total owed ticks discarded by the overload cap
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.set_paused(true);
    }

    pub fn resume(&mut self) {
        self.set_paused(false);
    }

    /// Takes effect at the next `advance`; a tick in progress is not interrupted
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            tracing::debug!(paused, tick = self.current_tick, "Clock pause toggled");
        }
        self.paused = paused;
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) -> Result<()> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(SimError::InvalidCommand(format!(
                "time scale must be finite and > 0, got {scale}"
            )));
        }
        self.time_scale = scale;
        Ok(())
    }

    pub fn game_hour(&self) -> u64 {
        self.calendar.game_hour()
    }

    pub fn game_day(&self) -> u64 {
        self.calendar.game_day()
    }

    pub fn time_of_day(&self) -> f32 {
        self.calendar.time_of_day()
    }

    pub fn time_period(&self) -> TimePeriod {
        self.calendar.current_time_period()
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(clock: &mut SimulationClock) -> u32 {
        let mut n = 0;
        while clock.consume_tick().is_some() {
            n += 1;
        }
        n
    }

    #[test]
    fn test_full_cap_frame_leaves_no_remainder() {
        let mut clock = SimulationClock::default();
        let due = clock.advance(0.2);

        assert_eq!(due, 4);
        assert_eq!(clock.pending_ticks(), 4);
        assert_eq!(clock.accumulated_time(), 0.0);
        assert_eq!(clock.interpolation_alpha(), 0.0);
        assert!(clock.tick_fired());
        assert_eq!(clock.dropped_ticks(), 0);
    }

    #[test]
    fn test_partial_tick_accumulates() {
        let mut clock = SimulationClock::default();
        assert_eq!(clock.advance(0.03), 0);
        assert!(!clock.tick_fired());
        assert!((clock.interpolation_alpha() - 0.6).abs() < 1e-5);

        assert_eq!(clock.advance(0.03), 1);
        assert!(clock.tick_fired());
        assert!((clock.accumulated_time() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_alpha_below_one_just_short_of_a_tick() {
        let mut clock = SimulationClock::default();
        assert_eq!(clock.advance(0.05 - 1e-12), 0);
        assert!(clock.accumulated_time() < clock.tick_duration());
        assert!(clock.interpolation_alpha() < 1.0);
        assert!(clock.interpolation_alpha() > 0.99);
    }

    #[test]
    fn test_overload_drops_excess() {
        let mut clock = SimulationClock::default();
        // 1.02s owes 20 ticks at 20 Hz; only 4 may run
        let due = clock.advance(1.02);

        assert_eq!(due, 4);
        assert_eq!(clock.pending_ticks(), clock.max_ticks_per_frame());
        assert_eq!(clock.dropped_ticks(), 16);
        assert!(clock.accumulated_time() < clock.tick_duration());

        assert_eq!(drain(&mut clock), 4);
        assert_eq!(clock.current_tick(), 4);

        // Dropped time is not owed later
        assert_eq!(clock.advance(0.0), 0);
    }

    #[test]
    fn test_tick_fired_clears_on_idle_frame() {
        let mut clock = SimulationClock::default();
        clock.advance(0.05);
        assert!(clock.tick_fired());
        drain(&mut clock);
        clock.advance(0.01);
        assert!(!clock.tick_fired());
    }

    #[test]
    fn test_paused_freezes_ticks_and_alpha() {
        let mut clock = SimulationClock::default();
        clock.advance(0.02);
        clock.pause();

        assert_eq!(clock.advance(10.0), 0);
        assert_eq!(clock.interpolation_alpha(), 1.0);
        assert!(!clock.tick_fired());
        assert_eq!(clock.current_tick(), 0);

        clock.resume();
        // Accumulated time from before the pause is still there
        assert_eq!(clock.advance(0.04), 1);
    }

    #[test]
    fn test_time_scale_multiplies_elapsed() {
        let mut clock = SimulationClock::default();
        clock.set_time_scale(2.0).unwrap();
        assert_eq!(clock.advance(0.1), 4);
    }

    #[test]
    fn test_time_scale_rejects_non_positive() {
        let mut clock = SimulationClock::default();
        assert!(clock.set_time_scale(0.0).is_err());
        assert!(clock.set_time_scale(-1.0).is_err());
        assert!(clock.set_time_scale(f32::NAN).is_err());
        assert_eq!(clock.time_scale(), 1.0);
    }

    #[test]
    fn test_bad_delta_counts_as_zero() {
        let mut clock = SimulationClock::default();
        assert_eq!(clock.advance(-1.0), 0);
        assert_eq!(clock.advance(f64::NAN), 0);
        assert_eq!(clock.advance(f64::INFINITY), 0);
        assert_eq!(clock.accumulated_time(), 0.0);
    }

    #[test]
    fn test_calendar_tracks_ticks() {
        let config = SimulationConfig {
            ticks_per_hour: 2,
            hours_per_day: 3,
            max_ticks_per_frame: 100,
            ..Default::default()
        };
        let mut clock = SimulationClock::new(&config);
        clock.advance(0.36); // 7 ticks
        drain(&mut clock);
        assert_eq!(clock.current_tick(), 7);
        assert_eq!(clock.game_hour(), 0);
        assert_eq!(clock.game_day(), 1);
    }

    #[test]
    fn test_consume_without_pending_is_noop() {
        let mut clock = SimulationClock::default();
        assert_eq!(clock.consume_tick(), None);
        assert_eq!(clock.current_tick(), 0);
    }
}
