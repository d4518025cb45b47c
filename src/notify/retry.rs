use std::fmt::Display;
use std::thread;
use std::time::Duration;

use tracing::warn;

/// Runs `op` up to `attempts` times, sleeping `delay` between failures.
///
/// `op` receives the 1-based attempt number. On success returns the value
/// and the attempt that produced it; otherwise the last error.
pub fn with_fixed_delay<T, E, F>(attempts: u32, delay: Duration, mut op: F) -> Result<(T, u32), E>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok((value, attempt)),
            Err(e) if attempt < attempts => {
                warn!(attempt, of = attempts, error = %e, "attempt failed, retrying");
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
