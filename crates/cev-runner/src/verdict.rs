use cev_core::Verdict;
use cev_resource::ResourceStats;

/// What a runner hands back: the judgment plus the telemetry collected
/// while the child ran.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub verdict: Verdict,
    pub stats: ResourceStats,
}

impl RunOutcome {
    pub fn new(verdict: Verdict, stats: ResourceStats) -> Self {
        Self { verdict, stats }
    }
}

/// Render a timeout in seconds the way it appears in verdict strings:
/// the shortest decimal that round-trips, so `3.0` rather than `3`.
pub(crate) fn format_secs(secs: f64) -> String {
    format!("{secs:?}")
}

/// Upper bound on a caller-supplied timeout. Anything longer is
/// indistinguishable from a hang for an evaluation harness.
const MAX_TIMEOUT_SECS: f64 = 86_400.0;

/// Clamp a caller-supplied timeout into a valid Duration.
pub(crate) fn timeout_window(secs: f64) -> std::time::Duration {
    std::time::Duration::from_secs_f64(secs.clamp(0.0, MAX_TIMEOUT_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_seconds_keep_a_decimal_point() {
        assert_eq!(format_secs(3.0), "3.0");
        assert_eq!(format_secs(5.0), "5.0");
        assert_eq!(format_secs(8.0), "8.0");
    }

    #[test]
    fn fractional_seconds_stay_short() {
        assert_eq!(format_secs(2.5), "2.5");
        assert_eq!(format_secs(0.1), "0.1");
    }

    #[test]
    fn timeout_window_clamps_extremes() {
        assert_eq!(timeout_window(-1.0), std::time::Duration::ZERO);
        assert_eq!(timeout_window(3.0), std::time::Duration::from_secs(3));
        // Absurd values must not panic Duration construction.
        assert_eq!(
            timeout_window(1e300),
            std::time::Duration::from_secs_f64(MAX_TIMEOUT_SECS)
        );
    }
}
