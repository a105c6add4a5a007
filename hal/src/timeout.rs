//! # Bounded waits
//!
//! Hardware status flags are waited on with [`poll_until()`], which gives up after a fixed number
//! of polls instead of spinning forever on hardware that will never answer.

use embedded_hal::delay::DelayNs;

/// How long to keep polling a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollLimit {
    /// Number of polls before giving up. At least one poll is always made
    pub max_polls: u32,
    /// Delay between polls (ns). Zero spins
    pub interval_ns: u32,
}

impl PollLimit {
    pub const fn new(max_polls: u32, interval_ns: u32) -> Self {
        Self {
            max_polls,
            interval_ns,
        }
    }

    /// Poll back to back without delaying
    pub const fn spin(max_polls: u32) -> Self {
        Self::new(max_polls, 0)
    }

    /// Lower bound on the time spent before giving up (ns)
    pub const fn budget_ns(&self) -> u64 {
        self.max_polls as u64 * self.interval_ns as u64
    }
}

/// The flag never came up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimedOut {
    pub polls: u32,
}

/// Poll `ready` until it returns true or the limit runs out.
///
/// Returns the number of polls it took.
pub fn poll_until<D: DelayNs>(
    delay: &mut D,
    limit: PollLimit,
    mut ready: impl FnMut() -> bool,
) -> Result<u32, TimedOut> {
    let max_polls = limit.max_polls.max(1);

    for poll in 1..=max_polls {
        if ready() {
            return Ok(poll);
        }

        if limit.interval_ns > 0 {
            delay.delay_ns(limit.interval_ns);
        }
    }

    Err(TimedOut { polls: max_polls })
}
