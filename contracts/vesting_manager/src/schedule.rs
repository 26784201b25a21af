use crate::storage::{VestingSchedule, VestingStrategy};

/// Check schedule parameters before anything is stored
///
/// Rules:
/// - duration must be positive and at least as long as the cliff
/// - epoch strategy: epoch_duration × epoch_count == duration, both positive
/// - linear strategy: epoch fields must be zero
pub fn validate_params(
    strategy: VestingStrategy,
    duration: u64,
    cliff_duration: u64,
    epoch_duration: u64,
    epoch_count: u32,
) -> bool {
    if duration == 0 || cliff_duration > duration {
        return false;
    }

    match strategy {
        VestingStrategy::Linear => epoch_duration == 0 && epoch_count == 0,
        VestingStrategy::LinearEpoch => {
            if epoch_duration == 0 || epoch_count == 0 {
                return false;
            }
            epoch_duration.checked_mul(epoch_count as u64) == Some(duration)
        }
    }
}

/// Number of whole epochs elapsed at `timestamp`, capped at epoch_count
///
/// Formula: min(floor((t - start) / epoch_duration), epoch_count)
pub fn elapsed_epochs(schedule: &VestingSchedule, timestamp: u64) -> u32 {
    if timestamp <= schedule.start || schedule.epoch_duration == 0 {
        return 0;
    }

    let epochs = (timestamp - schedule.start) / schedule.epoch_duration;
    if epochs >= schedule.epoch_count as u64 {
        schedule.epoch_count
    } else {
        epochs as u32
    }
}

/// Amount vested at `timestamp`, ignoring what was already released
///
/// Linear:      total × min(t - start, duration) / duration
/// LinearEpoch: total × elapsed_epochs / epoch_count
///
/// Nothing is vested before the cliff ends.
///
/// Example (epoch):
/// - total: 1,000, epoch_count: 4, epoch_duration: 100, start: 0
/// - t = 250: 2 epochs → 500 (unchanged until t = 300)
pub fn vested_amount(schedule: &VestingSchedule, timestamp: u64) -> Option<i128> {
    let cliff_end = schedule.start.checked_add(schedule.cliff_duration)?;
    if timestamp < cliff_end || timestamp <= schedule.start {
        return Some(0);
    }

    match schedule.strategy {
        VestingStrategy::Linear => {
            let elapsed = timestamp - schedule.start;
            if elapsed >= schedule.duration {
                return Some(schedule.total_amount);
            }
            schedule
                .total_amount
                .checked_mul(elapsed as i128)?
                .checked_div(schedule.duration as i128)
        }
        VestingStrategy::LinearEpoch => {
            if schedule.epoch_count == 0 {
                return None;
            }
            let epochs = elapsed_epochs(schedule, timestamp);
            schedule
                .total_amount
                .checked_mul(epochs as i128)?
                .checked_div(schedule.epoch_count as i128)
        }
    }
}

/// Amount that a release at `timestamp` would pay out
pub fn releasable_amount(schedule: &VestingSchedule, timestamp: u64) -> Option<i128> {
    let vested = vested_amount(schedule, timestamp)?;
    Some(vested.saturating_sub(schedule.released_amount).max(0))
}
