//! Range Filter
//!
//! Three-sample ring buffer with a median readout, used to knock out the
//! single-sample spikes an HC-SR04 produces on soft or angled surfaces.
//!
//! # Startup
//! The slots start at zero. Until three samples have been pushed the median is
//! taken over the remaining zero slots, which biases the first two readings
//! toward zero (reads as "obstructed"). [`RangeFilter::is_primed`] tells the
//! caller when that transient is over.

/// Number of samples the filter holds
pub const WINDOW: usize = 3;

/// Ring buffer of the most recent distance samples (cm)
#[derive(Debug, Clone, Default)]
pub struct RangeFilter {
    values: [f32; WINDOW],
    cursor: usize,
    pushed: u32,
}

impl RangeFilter {
    pub const fn new() -> Self {
        Self {
            values: [0.0; WINDOW],
            cursor: 0,
            pushed: 0,
        }
    }

    /// Stores a sample, overwriting the oldest one
    pub fn push(&mut self, value: f32) {
        self.cursor = (self.cursor + 1) % WINDOW;
        self.values[self.cursor] = value;
        self.pushed = self.pushed.saturating_add(1);
    }

    /// Median of the three slots, in ring order
    pub fn median(&self) -> f32 {
        median_of_three(self.values[0], self.values[1], self.values[2])
    }

    /// True once every slot holds a real sample
    pub fn is_primed(&self) -> bool {
        self.pushed >= WINDOW as u32
    }
}

/// Middle value of three samples
///
/// Compares the signs of the pairwise differences: `b` is the median when it
/// lies strictly between `a` and `c`, `c` when `a` is an extreme, otherwise `a`.
/// Ties fall through to one of the equal values, so the result is always the
/// true median.
pub fn median_of_three(a: f32, b: f32, c: f32) -> f32 {
    let ab = a - b;
    let bc = b - c;
    let ac = a - c;
    if ab * bc > 0.0 {
        return b;
    }
    if ab * ac > 0.0 {
        return c;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_all_orderings() {
        let orderings = [
            (1.0, 2.0, 3.0),
            (1.0, 3.0, 2.0),
            (2.0, 1.0, 3.0),
            (2.0, 3.0, 1.0),
            (3.0, 1.0, 2.0),
            (3.0, 2.0, 1.0),
        ];
        for (a, b, c) in orderings {
            assert_eq!(median_of_three(a, b, c), 2.0, "({a}, {b}, {c})");
        }
        assert_eq!(median_of_three(5.0, 1.0, 3.0), 3.0);
    }

    #[test]
    fn median_handles_ties_and_negatives() {
        assert_eq!(median_of_three(-2.0, -2.0, 4.0), -2.0);
        assert_eq!(median_of_three(4.0, -2.0, -2.0), -2.0);
        assert_eq!(median_of_three(-2.0, 4.0, -2.0), -2.0);
        assert_eq!(median_of_three(7.0, 7.0, 7.0), 7.0);
        assert_eq!(median_of_three(-5.0, -1.0, -3.0), -3.0);
        assert_eq!(median_of_three(0.5, 0.25, 0.75), 0.5);
    }

    #[test]
    fn filter_evicts_oldest_sample() {
        let mut filter = RangeFilter::new();
        filter.push(10.0);
        filter.push(12.0);
        assert!(!filter.is_primed());
        filter.push(11.0);
        assert!(filter.is_primed());
        assert_eq!(filter.median(), 11.0);

        // 10 drops out, leaving [12, 11, 9]
        filter.push(9.0);
        assert_eq!(filter.median(), 11.0);
        filter.push(30.0);
        assert_eq!(filter.median(), 11.0);
        filter.push(31.0);
        assert_eq!(filter.median(), 30.0);
    }

    #[test]
    fn startup_transient_reads_low() {
        let mut filter = RangeFilter::new();
        filter.push(80.0);
        // two zero slots left
        assert_eq!(filter.median(), 0.0);
        filter.push(90.0);
        assert_eq!(filter.median(), 80.0);
    }
}
