//! Facade parameter validation
//!
//! Builds a [`TaskShape`] from the raw epoch-ms/seconds parameters the
//! facade receives, rejecting bad input before any task id is allocated.

use std::time::Duration;

use chime_domain::{ChimeError, Result, TaskShape, TimeOfDay};

use super::window;

/// Shape of a fixed task whose daily time is taken from the local wall
/// clock of `fixed_time_ms`.
pub fn fixed_shape_from_ms(fixed_time_ms: i64) -> Result<TaskShape> {
    if fixed_time_ms <= 0 {
        return Err(ChimeError::InvalidInput("fixed trigger time is required".into()));
    }
    let at = TimeOfDay::of(&window::local_from_ms(fixed_time_ms));
    Ok(TaskShape::Fixed { at })
}

/// Shape of an interval task.
///
/// `start_ms`/`end_ms` of zero (or less) mean "unset". Both unset is a
/// full-day window; exactly one unset is rejected; both set derive the
/// window from their local times of day, wrap allowed. A non-positive
/// period is rejected.
pub fn interval_shape_from_ms(start_ms: i64, end_ms: i64, period_secs: i64) -> Result<TaskShape> {
    if period_secs <= 0 {
        return Err(ChimeError::InvalidInput("interval period must be positive".into()));
    }
    if (start_ms > 0) != (end_ms > 0) {
        return Err(ChimeError::InvalidInput(
            "interval window must set both ends or neither".into(),
        ));
    }

    let (start, end) = if start_ms > 0 {
        (
            TimeOfDay::of(&window::local_from_ms(start_ms)),
            TimeOfDay::of(&window::local_from_ms(end_ms)),
        )
    } else {
        (TimeOfDay::new(0, 0), TimeOfDay::new(0, 0))
    };

    Ok(TaskShape::Interval { start, end, period: Duration::from_secs(period_secs as u64) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_shape_requires_a_trigger_time() {
        assert!(matches!(fixed_shape_from_ms(0), Err(ChimeError::InvalidInput(_))));
        assert!(matches!(fixed_shape_from_ms(-5), Err(ChimeError::InvalidInput(_))));
        assert!(fixed_shape_from_ms(1_770_000_000_000).is_ok());
    }

    #[test]
    fn interval_shape_rejects_non_positive_period() {
        assert!(matches!(interval_shape_from_ms(0, 0, 0), Err(ChimeError::InvalidInput(_))));
        assert!(matches!(interval_shape_from_ms(0, 0, -60), Err(ChimeError::InvalidInput(_))));
    }

    #[test]
    fn interval_shape_rejects_half_set_window() {
        assert!(matches!(
            interval_shape_from_ms(1_770_000_000_000, 0, 60),
            Err(ChimeError::InvalidInput(_))
        ));
        assert!(matches!(
            interval_shape_from_ms(0, 1_770_000_000_000, 60),
            Err(ChimeError::InvalidInput(_))
        ));
    }

    #[test]
    fn unset_window_means_full_day() {
        let shape = interval_shape_from_ms(0, 0, 60).expect("valid shape");
        match shape {
            TaskShape::Interval { start, end, period } => {
                assert_eq!(start, TimeOfDay::new(0, 0));
                assert_eq!(end, TimeOfDay::new(0, 0));
                assert_eq!(period, Duration::from_secs(60));
            }
            TaskShape::Fixed { .. } => panic!("expected interval shape"),
        }
    }
}
