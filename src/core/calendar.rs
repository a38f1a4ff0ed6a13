//! Calendar derived from the tick counter
//!
//! Every field is a pure function of the current tick. The clock calls
//! [`Calendar::sync`] after each consumed tick; nothing else writes here.

use serde::{Deserialize, Serialize};

use crate::core::types::Tick;

/// Time of day periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePeriod {
    Morning,    // 06:00-12:00
    Afternoon,  // 12:00-18:00
    Evening,    // 18:00-22:00
    Night,      // 22:00-06:00
}

impl TimePeriod {
    /// Period for an hour on a 24-hour dial
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimePeriod::Morning,
            12..=17 => TimePeriod::Afternoon,
            18..=21 => TimePeriod::Evening,
            _ => TimePeriod::Night, // 22-23, 0-5
        }
    }
}

/// Game hour, day and normalized time of day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    ticks_per_hour: u64,
    hours_per_day: u64,
    game_hour: u64,
    game_day: u64,
    time_of_day: f32,
}

impl Calendar {
    pub fn new(ticks_per_hour: u64, hours_per_day: u64) -> Self {
        let mut calendar = Self {
            ticks_per_hour: ticks_per_hour.max(1),
            hours_per_day: hours_per_day.max(1),
            game_hour: 0,
            game_day: 0,
            time_of_day: 0.0,
        };
        calendar.sync(0);
        calendar
    }

    /// Recompute all derived fields from `tick`
    pub fn sync(&mut self, tick: Tick) {
        let ticks_per_day = self.ticks_per_day();
        let total_hours = tick / self.ticks_per_hour;
        self.game_hour = total_hours % self.hours_per_day;
        self.game_day = total_hours / self.hours_per_day;
        self.time_of_day = (tick % ticks_per_day) as f32 / ticks_per_day as f32;
    }

    pub fn game_hour(&self) -> u64 {
        self.game_hour
    }

    pub fn game_day(&self) -> u64 {
        self.game_day
    }

    /// Fraction of the current day elapsed, in `[0, 1)`
    pub fn time_of_day(&self) -> f32 {
        self.time_of_day
    }

    /// Period of the day, mapping the game day onto a 24-hour dial
    pub fn current_time_period(&self) -> TimePeriod {
        TimePeriod::from_hour((self.time_of_day * 24.0) as u32)
    }

    pub fn ticks_per_day(&self) -> u64 {
        self.ticks_per_hour * self.hours_per_day
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(1200, 24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_period_from_hour() {
        assert_eq!(TimePeriod::from_hour(6), TimePeriod::Morning);
        assert_eq!(TimePeriod::from_hour(11), TimePeriod::Morning);
        assert_eq!(TimePeriod::from_hour(12), TimePeriod::Afternoon);
        assert_eq!(TimePeriod::from_hour(17), TimePeriod::Afternoon);
        assert_eq!(TimePeriod::from_hour(18), TimePeriod::Evening);
        assert_eq!(TimePeriod::from_hour(21), TimePeriod::Evening);
        assert_eq!(TimePeriod::from_hour(22), TimePeriod::Night);
        assert_eq!(TimePeriod::from_hour(5), TimePeriod::Night);
    }

    #[test]
    fn test_calendar_fields_follow_tick() {
        let mut cal = Calendar::new(10, 24);
        cal.sync(0);
        assert_eq!(cal.game_hour(), 0);
        assert_eq!(cal.game_day(), 0);

        cal.sync(25);
        assert_eq!(cal.game_hour(), 2);
        assert_eq!(cal.game_day(), 0);

        // One full day plus three hours
        cal.sync(240 + 30);
        assert_eq!(cal.game_hour(), 3);
        assert_eq!(cal.game_day(), 1);
    }

    #[test]
    fn test_sync_is_pure_in_tick() {
        let mut a = Calendar::new(7, 5);
        let mut b = Calendar::new(7, 5);
        for t in 0..500 {
            a.sync(t);
        }
        b.sync(499);
        assert_eq!(a.game_hour(), b.game_hour());
        assert_eq!(a.game_day(), b.game_day());
        assert_eq!(a.time_of_day(), b.time_of_day());
    }

    #[test]
    fn test_calendar_time_period() {
        let mut cal = Calendar::new(10, 24);
        assert_eq!(cal.current_time_period(), TimePeriod::Night);

        // 06:00 at 10 ticks per hour
        cal.sync(60);
        assert_eq!(cal.current_time_period(), TimePeriod::Morning);
    }
}
