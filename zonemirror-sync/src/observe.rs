//! Timing instrumentation for the slow parts of a pass.

use std::time::Instant;

/// Run `f`, logging how long it took under `label`.
pub fn timed<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let started = Instant::now();
    let result = f();
    tracing::debug!("{label} took {:.3}s", started.elapsed().as_secs_f64());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_returns_the_closure_value() {
        let value = timed("answer", || 41 + 1);
        assert_eq!(value, 42);
    }

    #[test]
    fn timed_passes_results_through() {
        let ok: Result<&str, ()> = timed("fetch", || Ok("body"));
        assert_eq!(ok, Ok("body"));
    }
}
