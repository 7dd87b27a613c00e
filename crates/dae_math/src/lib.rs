// Re-export glam for convenience
pub use glam::*;

// Transform helpers for the COLLADA transform primitives
mod transform;
pub use transform::Mat4Ext;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_mat4_ext_reexported() {
        let m = Mat4::from_axis_angle_degrees(Vec3::Z, 0.0);
        assert_eq!(m, Mat4::IDENTITY);
    }
}
