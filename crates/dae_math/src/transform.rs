// Transform utilities for Mat4
//
// Builds glam::Mat4 values from the operand layouts used by COLLADA
// <matrix>, <lookat> and <rotate> elements.

use glam::{Mat4, Vec3, Vec4};

/// Extension trait for Mat4 to construct matrices from COLLADA transform operands.
pub trait Mat4Ext {
    /// Build a matrix from 16 values listed row by row (the `<matrix>` layout).
    /// glam stores columns, so the array is read as columns and transposed.
    fn from_row_major(values: &[f32; 16]) -> Mat4;

    /// Build the placement matrix of an object at `eye` looking towards `target`.
    ///
    /// Columns are `right`, `up`, `-dir` and `eye`, where `dir` is the
    /// normalized view direction and `right = dir x up`. The up vector is
    /// normalized but not re-orthogonalized against `dir`.
    fn from_look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Rotation of `degrees` around `axis`. A zero-length axis yields identity.
    fn from_axis_angle_degrees(axis: Vec3, degrees: f32) -> Mat4;

    /// Flatten back to the row-by-row layout.
    fn to_row_major(&self) -> [f32; 16];
}

impl Mat4Ext for Mat4 {
    fn from_row_major(values: &[f32; 16]) -> Mat4 {
        Mat4::from_cols_array(values).transpose()
    }

    fn from_look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let up = up.normalize_or_zero();
        let dir = (target - eye).normalize_or_zero();
        let right = dir.cross(up).normalize_or_zero();

        Mat4::from_cols(
            right.extend(0.0),
            up.extend(0.0),
            (-dir).extend(0.0),
            Vec4::new(eye.x, eye.y, eye.z, 1.0),
        )
    }

    fn from_axis_angle_degrees(axis: Vec3, degrees: f32) -> Mat4 {
        match axis.try_normalize() {
            Some(axis) => Mat4::from_axis_angle(axis, degrees.to_radians()),
            None => Mat4::IDENTITY,
        }
    }

    fn to_row_major(&self) -> [f32; 16] {
        self.transpose().to_cols_array()
    }
}
