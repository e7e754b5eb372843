use brt_core::{Clock, MonotonicSecs};
use tracing::warn;

/// `CLOCK_MONOTONIC` in whole seconds: immune to wall-clock changes, and
/// comparable across restarts of the process within one boot.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> MonotonicSecs {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `ts` is a valid, exclusively borrowed timespec for the call.
        let rc = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
        if rc != 0 {
            warn!("clock_gettime(CLOCK_MONOTONIC) failed: {}", std::io::Error::last_os_error());
            return 0;
        }
        u64::try_from(ts.tv_sec).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_goes_backwards() {
        let clock = MonotonicClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
