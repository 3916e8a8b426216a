use chrono::{NaiveTime, Timelike};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Advisory delay the display client should wait before polling again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub active_minutes: u32,
    pub quiet_start_hour: u32,
    /// The hour the client should wake up at.
    pub quiet_end_hour: u32,
}

impl PollSchedule {
    pub fn is_quiet(&self, hour: u32) -> bool {
        let (start, end) = (self.quiet_start_hour, self.quiet_end_hour);
        if start == end {
            false
        } else if start < end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }

    pub fn minutes_until_next_poll(&self, now: NaiveTime) -> u32 {
        if !self.is_quiet(now.hour()) {
            return self.active_minutes.max(1);
        }

        let now_minutes = now.hour() * 60 + now.minute();
        let wake_minutes = self.quiet_end_hour * 60;
        let until_wake = (wake_minutes + MINUTES_PER_DAY - now_minutes) % MINUTES_PER_DAY;

        until_wake.max(1)
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            active_minutes: 5,
            quiet_start_hour: 22,
            quiet_end_hour: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_active_hours_use_short_delay() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.minutes_until_next_poll(at(6, 0)), 5);
        assert_eq!(schedule.minutes_until_next_poll(at(12, 30)), 5);
        assert_eq!(schedule.minutes_until_next_poll(at(21, 59)), 5);
    }

    #[test]
    fn test_quiet_window_sleeps_until_wake_hour() {
        let schedule = PollSchedule::default();
        assert_eq!(schedule.minutes_until_next_poll(at(22, 0)), 8 * 60);
        assert_eq!(schedule.minutes_until_next_poll(at(23, 15)), 6 * 60 + 45);
        assert_eq!(schedule.minutes_until_next_poll(at(0, 0)), 6 * 60);
        assert_eq!(schedule.minutes_until_next_poll(at(5, 30)), 30);
        assert_eq!(schedule.minutes_until_next_poll(at(5, 59)), 1);
    }

    #[test]
    fn test_quiet_window_within_one_day() {
        let schedule = PollSchedule {
            active_minutes: 10,
            quiet_start_hour: 1,
            quiet_end_hour: 5,
        };
        assert!(!schedule.is_quiet(0));
        assert!(schedule.is_quiet(1));
        assert!(!schedule.is_quiet(5));
        assert_eq!(schedule.minutes_until_next_poll(at(3, 0)), 120);
        assert_eq!(schedule.minutes_until_next_poll(at(23, 0)), 10);
    }

    #[test]
    fn test_empty_quiet_window() {
        let schedule = PollSchedule {
            active_minutes: 5,
            quiet_start_hour: 6,
            quiet_end_hour: 6,
        };
        assert_eq!(schedule.minutes_until_next_poll(at(3, 0)), 5);
    }
}
