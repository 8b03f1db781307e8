// The VRFieldOfView struct represents a field of view,
// as given by 4 half-angles in degrees measured from the eye's forward axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct VRFieldOfView {
    pub up_degrees: f64,
    pub right_degrees: f64,
    pub down_degrees: f64,
    pub left_degrees: f64,
}

impl Default for VRFieldOfView {
    fn default() -> VRFieldOfView {
        VRFieldOfView::symmetric(45.0)
    }
}

impl VRFieldOfView {
    pub fn symmetric(degrees: f64) -> VRFieldOfView {
        VRFieldOfView {
            up_degrees: degrees,
            right_degrees: degrees,
            down_degrees: degrees,
            left_degrees: degrees,
        }
    }

    /// Builds a field of view from positive tangent half-angles, the unit
    /// both runtimes report projections in.
    pub fn from_tangents(up: f32, right: f32, down: f32, left: f32) -> VRFieldOfView {
        VRFieldOfView {
            up_degrees: (up as f64).atan().to_degrees(),
            right_degrees: (right as f64).atan().to_degrees(),
            down_degrees: (down as f64).atan().to_degrees(),
            left_degrees: (left as f64).atan().to_degrees(),
        }
    }

    /// Tangents of the half-angles as `(up, right, down, left)`.
    pub fn tangents(&self) -> (f32, f32, f32, f32) {
        (self.up_degrees.to_radians().tan() as f32,
         self.right_degrees.to_radians().tan() as f32,
         self.down_degrees.to_radians().tan() as f32,
         self.left_degrees.to_radians().tan() as f32)
    }

    pub fn frustum(&self, near: f32, far: f32) -> Frustum {
        let (up, right, down, left) = self.tangents();
        Frustum {
            left: -left * near,
            right: right * near,
            bottom: -down * near,
            top: up * near,
            near: near,
            far: far,
        }
    }
}

/// Asymmetric viewing volume of one eye. The side planes are given at the
/// near plane, ready for a glFrustum-style camera.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialization", derive(Deserialize, Serialize))]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Frustum {
    pub fn to_array(&self) -> [f32; 6] {
        [self.left, self.right, self.bottom, self.top, self.near, self.far]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frustum_scales_tangents_by_near() {
        let fov = VRFieldOfView::from_tangents(1.0, 0.5, 1.0, 2.0);
        let f = fov.frustum(0.1, 100.0);
        assert!((f.left + 0.2).abs() < 1e-5);
        assert!((f.right - 0.05).abs() < 1e-5);
        assert!((f.bottom + 0.1).abs() < 1e-5);
        assert!((f.top - 0.1).abs() < 1e-5);
        assert_eq!(f.near, 0.1);
        assert_eq!(f.far, 100.0);
    }

    #[test]
    fn default_is_a_right_angle_cone() {
        let (up, right, down, left) = VRFieldOfView::default().tangents();
        for t in &[up, right, down, left] {
            assert!((t - 1.0).abs() < 1e-5);
        }
    }
}
