/// A closed range of ray parameters `[min, max]`.
///
/// Hit queries treat the interval as open: a hit at exactly `min` or `max`
/// is rejected (see [`Interval::surrounds`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Returns true if x is strictly within the interval (min, max) (exclusive).
    pub fn surrounds(&self, x: f32) -> bool {
        self.min < x && x < self.max
    }

    /// Same interval with `max` lowered to `t`.
    ///
    /// Used by closest-hit searches to shrink the search range.
    #[inline]
    pub fn with_max(&self, t: f32) -> Interval {
        Interval::new(self.min, t)
    }
}
