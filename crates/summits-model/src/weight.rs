//! Flow weights and share distribution
//!
//! Weights are 16-bit. The share of each flow into an aim is its weight over
//! the total of all those weights plus the aim's own loop weight.

/// Largest weight
pub const MAX_WEIGHT: u16 = u16::MAX;

/// Loop weight of a fresh aim (about half of the range)
pub const DEFAULT_LOOP_WEIGHT: u16 = 0x7000;

/// Weight of a freshly drawn flow
pub const DEFAULT_FLOW_WEIGHT: u16 = 0x7fff;

/// Clamp any integer into the weight range
#[inline]
#[must_use]
pub fn clamp_weight(w: i64) -> u16 {
    u16::try_from(w.clamp(0, i64::from(MAX_WEIGHT))).unwrap_or(MAX_WEIGHT)
}

/// Clamp a float weight (e.g. from a slider) into the weight range
///
/// NaN clamps to zero.
#[inline]
#[must_use]
pub fn clamp_weight_f64(w: f64) -> u16 {
    if w.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let clamped = w.round().clamp(0.0, f64::from(MAX_WEIGHT)) as u16;
    clamped
}

/// Result of distributing shares over one aim's inflows
#[derive(Debug, Clone, PartialEq)]
pub struct ShareSplit {
    /// Share retained by the aim itself
    pub loop_share: f64,
    /// Share per inflow, in input order
    pub shares: Vec<f64>,
}

impl ShareSplit {
    /// Sum of all shares including the loop share
    #[must_use]
    pub fn total(&self) -> f64 {
        self.loop_share + self.shares.iter().sum::<f64>()
    }
}

/// Normalize `weights` and `loop_weight` over their total
///
/// A zero total gives every share zero.
#[must_use]
pub fn distribute(loop_weight: u16, weights: &[u16]) -> ShareSplit {
    let total: u64 =
        u64::from(loop_weight) + weights.iter().map(|&w| u64::from(w)).sum::<u64>();

    if total == 0 {
        return ShareSplit {
            loop_share: 0.0,
            shares: vec![0.0; weights.len()],
        };
    }

    #[allow(clippy::cast_precision_loss)]
    let total = total as f64;
    ShareSplit {
        loop_share: f64::from(loop_weight) / total,
        shares: weights.iter().map(|&w| f64::from(w) / total).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_weight(-5), 0);
        assert_eq!(clamp_weight(70_000), MAX_WEIGHT);
        assert_eq!(clamp_weight(1234), 1234);
        assert_eq!(clamp_weight_f64(-0.5), 0);
        assert_eq!(clamp_weight_f64(1e9), MAX_WEIGHT);
        assert_eq!(clamp_weight_f64(f64::NAN), 0);
        assert_eq!(clamp_weight_f64(41.6), 42);
    }

    #[test]
    fn loop_only() {
        let split = distribute(DEFAULT_LOOP_WEIGHT, &[]);
        assert_eq!(split.loop_share, 1.0);
        assert!(split.shares.is_empty());
    }

    #[test]
    fn split_sums_to_one() {
        let split = distribute(100, &[100, 200]);
        assert!((split.loop_share - 0.25).abs() < 1e-12);
        assert!((split.shares[1] - 0.5).abs() < 1e-12);
        assert!((split.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_total_is_all_zero() {
        let split = distribute(0, &[0, 0]);
        assert_eq!(split.loop_share, 0.0);
        assert_eq!(split.shares, vec![0.0, 0.0]);
    }
}
