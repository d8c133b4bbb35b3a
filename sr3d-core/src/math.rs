/// Clip-space helpers shared by the traverser and the host camera code
use nalgebra::{Matrix4, Vector4};

use crate::aabb::AABBox;

/// Out-code bits, one per violated clip plane
pub const OUT_LEFT: u8 = 0x01; // x < -w
pub const OUT_RIGHT: u8 = 0x02; // x > w
pub const OUT_BOTTOM: u8 = 0x04; // y < -w
pub const OUT_TOP: u8 = 0x08; // y > w
pub const OUT_NEAR: u8 = 0x10; // z < -w
pub const OUT_FAR: u8 = 0x20; // z > w

/// All six plane bits set
pub const OUT_ALL: u8 = 0x3F;

/// Classify a clip-space position against the six frustum planes.
pub fn calc_out_code(pos: &Vector4<f32>) -> u8 {
    let (x, y, z, w) = (pos.x, pos.y, pos.z, pos.w);

    let mut code = 0;
    if x < -w {
        code |= OUT_LEFT;
    } else if x > w {
        code |= OUT_RIGHT;
    }
    if y < -w {
        code |= OUT_BOTTOM;
    } else if y > w {
        code |= OUT_TOP;
    }
    if z < -w {
        code |= OUT_NEAR;
    } else if z > w {
        code |= OUT_FAR;
    }

    code
}

/// Return the nth (0..8) corner of `aabb` transformed by `matrix`.
///
/// Corners are enumerated by treating the low three bits of `nth` as
/// max/min selectors for x, y and z.
pub fn transform_aabb_corner(aabb: &AABBox, matrix: &Matrix4<f32>, nth: usize) -> Vector4<f32> {
    let dx = if nth & 0x01 != 0 { aabb.max.x - aabb.min.x } else { 0.0 };
    let dy = if nth & 0x02 != 0 { aabb.max.y - aabb.min.y } else { 0.0 };
    let dz = if nth & 0x04 != 0 { aabb.max.z - aabb.min.z } else { 0.0 };

    matrix * Vector4::new(aabb.min.x + dx, aabb.min.y + dy, aabb.min.z + dz, 1.0)
}
