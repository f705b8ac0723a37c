//! Window arithmetic: next-fire computation for both task shapes
//!
//! Pure and deterministic. All functions operate on wall-clock time in the
//! timezone of the `now` argument; production callers pass `Local` (the
//! `*_ms` wrappers do so), tests pass fixed zones for determinism.
//!
//! Start/end/fixed times are resolved against the calendar date of `now`
//! (and its successor), so windows degrade correctly across daylight-saving
//! transitions: a wall-clock time skipped by a forward jump resolves to the
//! first representable instant after the gap, an ambiguous one to its
//! earliest mapping. No 24h-exact-day assumption is made anywhere.

use std::time::Duration;

use chime_domain::constants::MIN_PERIOD_MS;
use chime_domain::{ChimeError, Result, TimeOfDay};
use chrono::{DateTime, Duration as TimeDelta, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// Resolve a wall-clock datetime in `tz`.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // Skipped by a forward DST jump: probe forward in half-hour
            // steps until the wall clock exists again.
            let mut probe = naive;
            for _ in 0..48 {
                probe = probe + TimeDelta::minutes(30);
                if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
                    return dt;
                }
            }
            tz.from_utc_datetime(&naive)
        }
    }
}

/// `date` at `at` in `tz`.
fn day_at<Tz: TimeZone>(tz: &Tz, date: NaiveDate, at: TimeOfDay) -> DateTime<Tz> {
    let naive = date
        .and_hms_opt(at.hour(), at.minute(), 0)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN));
    resolve_local(tz, naive)
}

/// Calendar successor of `date`.
fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

/// Next fire instant of a fixed task: today at `at` if that is strictly
/// after `now`, else tomorrow at `at`.
pub fn next_fixed_fire<Tz: TimeZone>(now: &DateTime<Tz>, at: TimeOfDay) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();

    let target = day_at(&tz, today, at);
    if target > *now {
        target
    } else {
        day_at(&tz, next_day(today), at)
    }
}

/// Re-arm computation for an interval task.
///
/// The window is `[start, end)` on the calendar date of `now`; `end <=
/// start` (equality included) spans into the next day. Before the window the
/// next fire is the window start, at/after the end it is tomorrow's window
/// start, inside it is `now + period` clamped to tomorrow's window start
/// when that would land at/after the end.
///
/// A zero period is rejected; periods below one second are raised to one
/// second.
pub fn next_interval_fire<Tz: TimeZone>(
    now: &DateTime<Tz>,
    start: TimeOfDay,
    end: TimeOfDay,
    period: Duration,
) -> Result<DateTime<Tz>> {
    if period.is_zero() {
        return Err(ChimeError::InvalidInput("interval period must be positive".into()));
    }

    let tz = now.timezone();
    let today = now.date_naive();

    let start_dt = day_at(&tz, today, start);
    let mut end_dt = day_at(&tz, today, end);
    if end_dt <= start_dt {
        end_dt = day_at(&tz, next_day(today), end);
    }

    if *now < start_dt {
        return Ok(start_dt);
    }
    if *now >= end_dt {
        return Ok(day_at(&tz, next_day(today), start));
    }

    let period_ms = (period.as_millis() as i64).max(MIN_PERIOD_MS);
    let next = now.clone() + TimeDelta::milliseconds(period_ms);
    if next >= end_dt {
        Ok(day_at(&tz, next_day(today), start))
    } else {
        Ok(next)
    }
}

/// First arming instant for an interval task: the window start when before
/// the window, `now` when already inside it (backends floor the actual arm
/// delay), tomorrow's window start when at/after the end.
pub fn first_interval_fire<Tz: TimeZone>(
    now: &DateTime<Tz>,
    start: TimeOfDay,
    end: TimeOfDay,
) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();

    let start_dt = day_at(&tz, today, start);
    let mut end_dt = day_at(&tz, today, end);
    if end_dt <= start_dt {
        end_dt = day_at(&tz, next_day(today), end);
    }

    if *now < start_dt {
        start_dt
    } else if *now >= end_dt {
        day_at(&tz, next_day(today), start)
    } else {
        now.clone()
    }
}

/// Epoch-ms instant in the system's local timezone.
pub(crate) fn local_from_ms(ms: i64) -> DateTime<Local> {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .unwrap_or_else(|| DateTime::UNIX_EPOCH.with_timezone(&Local))
}

/// [`next_fixed_fire`] over epoch milliseconds in the local timezone.
pub fn next_fixed_fire_ms(now_ms: i64, at: TimeOfDay) -> i64 {
    next_fixed_fire(&local_from_ms(now_ms), at).timestamp_millis()
}

/// [`next_interval_fire`] over epoch milliseconds in the local timezone.
pub fn next_interval_fire_ms(
    now_ms: i64,
    start: TimeOfDay,
    end: TimeOfDay,
    period: Duration,
) -> Result<i64> {
    next_interval_fire(&local_from_ms(now_ms), start, end, period).map(|dt| dt.timestamp_millis())
}

/// [`first_interval_fire`] over epoch milliseconds in the local timezone.
pub fn first_interval_fire_ms(now_ms: i64, start: TimeOfDay, end: TimeOfDay) -> i64 {
    first_interval_fire(&local_from_ms(now_ms), start, end).timestamp_millis()
}

#[cfg(test)]
mod tests {
    use chrono_tz::Tz;

    use super::*;

    const BERLIN: Tz = chrono_tz::Europe::Berlin;

    fn at(tz: Tz, y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
        tz.with_ymd_and_hms(y, mo, d, h, mi, s).single().expect("unambiguous test instant")
    }

    fn tod(h: u32, m: u32) -> TimeOfDay {
        TimeOfDay::new(h, m)
    }

    #[test]
    fn fixed_fire_is_strictly_future_and_within_a_day() {
        let samples = [(0, 0, 0), (6, 59, 59), (7, 0, 0), (7, 0, 1), (23, 59, 59)];
        for (h, mi, s) in samples {
            let now = at(BERLIN, 2026, 8, 5, h, mi, s);
            let next = next_fixed_fire(&now, tod(7, 0));
            assert!(next > now, "next {next} must be after now {now}");
            assert!(next - now <= TimeDelta::hours(24));
        }
    }

    #[test]
    fn fixed_fire_one_second_late_rolls_to_tomorrow() {
        let now = at(BERLIN, 2026, 8, 5, 7, 0, 1);
        let next = next_fixed_fire(&now, tod(7, 0));
        assert_eq!(next, at(BERLIN, 2026, 8, 6, 7, 0, 0));
    }

    #[test]
    fn fixed_fire_exactly_at_time_rolls_to_tomorrow() {
        // "strictly after now" - firing at the exact second counts as missed
        let now = at(BERLIN, 2026, 8, 5, 7, 0, 0);
        let next = next_fixed_fire(&now, tod(7, 0));
        assert_eq!(next, at(BERLIN, 2026, 8, 6, 7, 0, 0));
    }

    #[test]
    fn interval_before_window_fires_at_start() {
        let now = at(BERLIN, 2026, 8, 5, 7, 0, 0);
        let next = next_interval_fire(&now, tod(8, 0), tod(10, 0), Duration::from_secs(60))
            .expect("valid window");
        assert_eq!(next, at(BERLIN, 2026, 8, 5, 8, 0, 0));
    }

    #[test]
    fn interval_after_window_fires_at_tomorrows_start() {
        let now = at(BERLIN, 2026, 8, 5, 11, 0, 0);
        let next = next_interval_fire(&now, tod(8, 0), tod(10, 0), Duration::from_secs(60))
            .expect("valid window");
        assert_eq!(next, at(BERLIN, 2026, 8, 6, 8, 0, 0));
    }

    #[test]
    fn interval_inside_window_fires_a_period_from_now() {
        let now = at(BERLIN, 2026, 8, 5, 9, 0, 0);
        let next = next_interval_fire(&now, tod(8, 0), tod(10, 0), Duration::from_secs(60))
            .expect("valid window");
        assert_eq!(next, at(BERLIN, 2026, 8, 5, 9, 1, 0));
    }

    #[test]
    fn interval_clamps_to_tomorrow_instead_of_firing_past_end() {
        let now = at(BERLIN, 2026, 8, 5, 9, 59, 30);
        let next = next_interval_fire(&now, tod(8, 0), tod(10, 0), Duration::from_secs(60))
            .expect("valid window");
        assert_eq!(next, at(BERLIN, 2026, 8, 6, 8, 0, 0));
    }

    #[test]
    fn wrapped_window_spans_midnight() {
        // start=22:00, end=06:00, period=1h, now=23:00 -> 00:00 next day
        let now = at(BERLIN, 2026, 8, 5, 23, 0, 0);
        let next = next_interval_fire(&now, tod(22, 0), tod(6, 0), Duration::from_secs(3600))
            .expect("valid window");
        assert_eq!(next, at(BERLIN, 2026, 8, 6, 0, 0, 0));
    }

    #[test]
    fn degenerate_window_means_full_day() {
        // start == end encodes a full-day wrap
        let now = at(BERLIN, 2026, 8, 5, 8, 0, 30);
        let next = next_interval_fire(&now, tod(8, 0), tod(8, 0), Duration::from_secs(60))
            .expect("valid window");
        assert_eq!(next, at(BERLIN, 2026, 8, 5, 8, 1, 30));
    }

    #[test]
    fn interval_result_never_lands_outside_the_window() {
        let start = tod(22, 0);
        let end = tod(6, 0);
        for hour in 0..24 {
            let now = at(BERLIN, 2026, 8, 5, hour, 30, 0);
            let next = next_interval_fire(&now, start, end, Duration::from_secs(600))
                .expect("valid window");
            assert!(next > now);
            // inside the (wrapped) window: minutes past 22:00 or before 06:00
            let t = TimeOfDay::of(&next);
            let inside = t.minutes_from_midnight() >= start.minutes_from_midnight()
                || t.minutes_from_midnight() < end.minutes_from_midnight();
            assert!(inside, "{next} is outside the wrapped window");
        }
    }

    #[test]
    fn zero_period_is_rejected() {
        let now = at(BERLIN, 2026, 8, 5, 9, 0, 0);
        let err = next_interval_fire(&now, tod(8, 0), tod(10, 0), Duration::ZERO)
            .expect_err("zero period must fail");
        assert!(matches!(err, ChimeError::InvalidInput(_)));
    }

    #[test]
    fn sub_second_periods_are_raised_to_one_second() {
        let now = at(BERLIN, 2026, 8, 5, 9, 0, 0);
        let next = next_interval_fire(&now, tod(8, 0), tod(10, 0), Duration::from_millis(10))
            .expect("valid window");
        assert_eq!(next, at(BERLIN, 2026, 8, 5, 9, 0, 1));
    }

    #[test]
    fn first_fire_inside_window_is_immediate() {
        let now = at(BERLIN, 2026, 8, 5, 23, 0, 0);
        assert_eq!(first_interval_fire(&now, tod(22, 0), tod(6, 0)), now);
    }

    #[test]
    fn first_fire_outside_window_waits_for_start() {
        let before = at(BERLIN, 2026, 8, 5, 7, 0, 0);
        assert_eq!(
            first_interval_fire(&before, tod(8, 0), tod(10, 0)),
            at(BERLIN, 2026, 8, 5, 8, 0, 0)
        );

        let after = at(BERLIN, 2026, 8, 5, 11, 0, 0);
        assert_eq!(
            first_interval_fire(&after, tod(8, 0), tod(10, 0)),
            at(BERLIN, 2026, 8, 6, 8, 0, 0)
        );
    }

    #[test]
    fn fixed_time_skipped_by_dst_jump_resolves_after_the_gap() {
        // Berlin springs forward 2026-03-29 02:00 -> 03:00; 02:30 does not
        // exist on that day.
        let now = at(BERLIN, 2026, 3, 29, 1, 30, 0);
        let next = next_fixed_fire(&now, tod(2, 30));
        assert!(next > now);
        assert_eq!(next, at(BERLIN, 2026, 3, 29, 3, 0, 0));
    }

    #[test]
    fn ambiguous_fixed_time_resolves_to_earliest_mapping() {
        // Berlin falls back 2026-10-25 03:00 -> 02:00; 02:30 occurs twice.
        let now = at(BERLIN, 2026, 10, 25, 1, 0, 0);
        let next = next_fixed_fire(&now, tod(2, 30));
        let earliest = BERLIN
            .with_ymd_and_hms(2026, 10, 25, 2, 30, 0)
            .earliest()
            .expect("ambiguous instant has an earliest mapping");
        assert_eq!(next, earliest);
    }

    #[test]
    fn ms_wrappers_agree_with_the_instant_api() {
        // Local-timezone wrappers: only ordering properties are portable
        // across test machines.
        let now_ms = 1_770_000_000_000; // 2026-02-02, well away from DST edges
        let next = next_fixed_fire_ms(now_ms, tod(7, 0));
        assert!(next > now_ms);
        assert!(next - now_ms <= 25 * 3_600_000);

        let first = first_interval_fire_ms(now_ms, tod(0, 0), tod(0, 0));
        assert_eq!(first, now_ms); // full-day window: inside, immediate

        let re_arm = next_interval_fire_ms(now_ms, tod(0, 0), tod(0, 0), Duration::from_secs(60))
            .expect("valid window");
        assert_eq!(re_arm, now_ms + 60_000);
    }
}
