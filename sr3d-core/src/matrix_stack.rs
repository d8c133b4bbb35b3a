/// Fixed-depth stack of accumulated model transforms
use nalgebra::{Matrix4, UnitQuaternion, Vector3};

/// Deepest scene-graph nesting the stack supports. Pushing past this is a
/// programming error and panics.
pub const MAX_STACK_SIZE: usize = 32;

/// Accumulated rotation+translation transforms for hierarchical traversal.
/// Slot 0 starts as identity; the host may overwrite the current top with a
/// camera (view) matrix before traversing.
pub struct MatrixStack {
    stack: [Matrix4<f32>; MAX_STACK_SIZE],
    head: usize,
}

impl MatrixStack {
    pub fn new() -> Self {
        Self {
            stack: [Matrix4::identity(); MAX_STACK_SIZE],
            head: 0,
        }
    }

    /// Compose a local transform (translation ∘ rotation, no scale) onto the
    /// current top and push the result.
    pub fn push_transform(&mut self, rotation: &UnitQuaternion<f32>, position: &Vector3<f32>) {
        assert!(
            self.head + 1 < MAX_STACK_SIZE,
            "matrix stack exceeded {} levels",
            MAX_STACK_SIZE
        );
        let local = Matrix4::new_translation(position) * rotation.to_homogeneous();
        self.stack[self.head + 1] = self.stack[self.head] * local;
        self.head += 1;
    }

    /// The current accumulated transform. Valid until the next push or pop.
    pub fn current_matrix(&self) -> &Matrix4<f32> {
        &self.stack[self.head]
    }

    /// Mutable access to the top, used by hosts to load a camera matrix.
    pub fn current_matrix_mut(&mut self) -> &mut Matrix4<f32> {
        &mut self.stack[self.head]
    }

    /// Remove the top; a no-op at depth 0.
    pub fn pop(&mut self) {
        if self.head > 0 {
            self.head -= 1;
        }
    }
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_push_pop_round_trip() {
        let mut stack = MatrixStack::new();
        let rotation = UnitQuaternion::from_euler_angles(0.1, 0.2, 0.3);
        let position = Vector3::new(1.0, 2.0, 3.0);

        for _ in 0..4 {
            stack.push_transform(&rotation, &position);
        }
        for _ in 0..4 {
            stack.pop();
        }

        // bit-identical identity at depth 0
        assert_eq!(*stack.current_matrix(), Matrix4::identity());
    }

    #[test]
    fn test_pop_at_depth_zero_is_noop() {
        let mut stack = MatrixStack::new();
        stack.pop();
        assert_eq!(*stack.current_matrix(), Matrix4::identity());
    }

    #[test]
    fn test_push_composes_translations() {
        let mut stack = MatrixStack::new();
        let identity = UnitQuaternion::identity();
        stack.push_transform(&identity, &Vector3::new(1.0, 0.0, 0.0));
        stack.push_transform(&identity, &Vector3::new(0.0, 2.0, 0.0));

        let expected = Matrix4::new_translation(&Vector3::new(1.0, 2.0, 0.0));
        assert_relative_eq!(*stack.current_matrix(), expected, epsilon = 1e-6);
    }

    #[test]
    #[should_panic(expected = "matrix stack exceeded")]
    fn test_overflow_panics() {
        let mut stack = MatrixStack::new();
        let rotation = UnitQuaternion::identity();
        let position = Vector3::zeros();
        for _ in 0..MAX_STACK_SIZE {
            stack.push_transform(&rotation, &position);
        }
    }
}
