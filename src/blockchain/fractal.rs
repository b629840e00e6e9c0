use rand::Rng;
use serde::{Deserialize, Serialize};

/// A point in the synthetic 3-D space that modulates local mining difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractalCoordinate {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl FractalCoordinate {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Random coordinate with every component drawn uniformly from [0, 1].
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            a: rng.gen_range(0.0..=1.0),
            b: rng.gen_range(0.0..=1.0),
            c: rng.gen_range(0.0..=1.0),
        }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &FractalCoordinate) -> f64 {
        let da = self.a - other.a;
        let db = self.b - other.b;
        let dc = self.c - other.c;
        (da * da + db * db + dc * dc).sqrt()
    }

    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.a, self.b, self.c)
    }
}

impl Default for FractalCoordinate {
    fn default() -> Self {
        Self::origin()
    }
}

#[cfg(test)]
mod tests {
    use super::FractalCoordinate;

    #[test]
    fn generated_components_are_in_unit_range() {
        for _ in 0..100 {
            let c = FractalCoordinate::generate();
            assert!((0.0..=1.0).contains(&c.a));
            assert!((0.0..=1.0).contains(&c.b));
            assert!((0.0..=1.0).contains(&c.c));
        }
    }

    #[test]
    fn distance_is_euclidean() {
        let p = FractalCoordinate::new(1.0, 2.0, 2.0);
        assert_eq!(FractalCoordinate::origin().distance(&p), 3.0);
        assert_eq!(p.distance(&p), 0.0);
    }

    #[test]
    fn out_of_range_values_are_kept() {
        let hotspot = FractalCoordinate::new(300.0, 700.0, 200.0);
        assert_eq!(hotspot.as_tuple(), (300.0, 700.0, 200.0));
    }
}
