/// 2D affine matrix in canvas order, mapping
/// `(x, y) -> (a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// The transform that applies `other` first, then `self`.
    pub fn compose(&self, other: &Transform) -> Transform {
        Transform {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// `None` for singular matrices.
    pub fn invert(&self) -> Option<Transform> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Transform {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_point(p: (f64, f64), x: f64, y: f64) {
        assert_abs_diff_eq!(p.0, x, epsilon = 1e-9);
        assert_abs_diff_eq!(p.1, y, epsilon = 1e-9);
    }

    #[test]
    fn apply_matches_canvas_convention() {
        // Axis swap with vertical flip, as used by the spectrum plot
        let m = Transform::new(0.0, -2.0, 3.0, 0.0, 0.0, 512.0);
        assert_point(m.apply(255.0, 10.0), 30.0, 2.0);
        assert_point(m.apply(0.0, 0.0), 0.0, 512.0);
    }

    #[test]
    fn compose_applies_right_operand_first() {
        let scale = Transform::new(2.0, 0.0, 0.0, 3.0, 0.0, 0.0);
        let shift = Transform::new(1.0, 0.0, 0.0, 1.0, 5.0, -1.0);
        let m = shift.compose(&scale);
        assert_point(m.apply(1.0, 1.0), 7.0, 2.0);
        let n = scale.compose(&shift);
        assert_point(n.apply(1.0, 1.0), 12.0, 0.0);
    }

    #[test]
    fn inverse_round_trips() {
        let m = Transform::new(1.5, 0.25, -0.75, 2.0, 10.0, -4.0);
        let inv = m.invert().unwrap();
        let (x, y) = m.apply(3.0, -7.0);
        assert_point(inv.apply(x, y), 3.0, -7.0);
        let id = m.compose(&inv);
        assert_abs_diff_eq!(id.a, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(id.d, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(id.e, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn singular_has_no_inverse() {
        assert!(Transform::new(0.0, 0.0, 0.0, 0.0, 1.0, 1.0).invert().is_none());
        assert_eq!(Transform::default(), Transform::identity());
    }
}
