//! Comparison helpers shared by the probe families.

use super::ProbeStatus;

/// Soft limit derived from a hard limit and a 0..=1 coefficient, rounded up.
///
/// Products that land on a whole number up to float error (`100 × 0.55`
/// evaluates to `55.00000000000001`) are not bumped to the next integer.
pub fn high_watermark(limit: u64, coefficient: f64) -> u64 {
    let product = limit as f64 * coefficient;
    let slack = product.abs() * 4.0 * f64::EPSILON;
    (product - slack).ceil().max(0.0) as u64
}

/// Classify usage of a bounded resource.
///
/// `used >= limit` is Unhealthy, `used >= watermark` is Warning, anything
/// lower is Healthy.
pub fn watermark_status(used: u64, limit: u64, watermark: u64) -> ProbeStatus {
    if used >= limit {
        ProbeStatus::Unhealthy
    } else if used >= watermark {
        ProbeStatus::Warning
    } else {
        ProbeStatus::Healthy
    }
}

/// Unhealthy when the adverse condition holds, Healthy otherwise.
pub fn flag_status(adverse: bool) -> ProbeStatus {
    if adverse {
        ProbeStatus::Unhealthy
    } else {
        ProbeStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watermark_rounds_up() {
        assert_eq!(high_watermark(1024, 0.9), 922);
        assert_eq!(high_watermark(10, 0.5), 5);
        assert_eq!(high_watermark(10, 0.55), 6);
        assert_eq!(high_watermark(0, 0.9), 0);
    }

    #[test]
    fn exact_products_are_not_rounded_past() {
        assert_eq!(high_watermark(100, 0.55), 55);
        assert_eq!(high_watermark(100, 0.7), 70);
        assert_eq!(high_watermark(1000, 0.29), 290);
        assert_eq!(watermark_status(55, 100, high_watermark(100, 0.55)), ProbeStatus::Warning);
        assert_eq!(watermark_status(54, 100, high_watermark(100, 0.55)), ProbeStatus::Healthy);
    }

    #[test]
    fn watermark_status_boundaries() {
        // limit 100, watermark 90
        assert_eq!(watermark_status(89, 100, 90), ProbeStatus::Healthy);
        assert_eq!(watermark_status(90, 100, 90), ProbeStatus::Warning);
        assert_eq!(watermark_status(99, 100, 90), ProbeStatus::Warning);
        assert_eq!(watermark_status(100, 100, 90), ProbeStatus::Unhealthy);
        assert_eq!(watermark_status(150, 100, 90), ProbeStatus::Unhealthy);
    }

    #[test]
    fn zero_limit_is_exhausted() {
        assert_eq!(watermark_status(0, 0, 0), ProbeStatus::Unhealthy);
        assert_eq!(watermark_status(5, 0, 0), ProbeStatus::Unhealthy);
    }

    #[test]
    fn flag() {
        assert_eq!(flag_status(true), ProbeStatus::Unhealthy);
        assert_eq!(flag_status(false), ProbeStatus::Healthy);
    }
}
