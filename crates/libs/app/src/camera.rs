use crate::controls::{Controls, MoveAction};
use crate::types::*;

const MOVE_SPEED: f32 = 0.05;
const DRAG_SENSITIVITY: f32 = 0.005;

const WORLD_UP: Vec3 = Vec3::new(0., 1., 0.);

/// First-person camera bound to the window it reads input from.
///
/// `update` is the only mutating entry point; it reports whether the
/// derived inverse(projection * view) differs from the previous step's,
/// which is what consumers use to restart temporal accumulation.
pub struct Camera {
    projection: Mat4,
    view: Mat4,
    projection_view: Mat4,
    inverse_projection_view: Mat4,
    /// Cursor position latched while the primary button is held.
    drag_anchor: Option<[f32; 2]>,
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        let eye = Point::new(0.0, 0.75, -1.0);
        let target = Point::new(0.0, 0.75, 1.0);

        let projection = Mat4::new_perspective(width / height, 45f32.to_radians(), 0.02, 300.0);
        let view = Mat4::look_at_rh(&eye, &target, &WORLD_UP);

        let projection_view = projection * view;
        let inverse_projection_view = projection_view.try_inverse().unwrap();

        Self {
            projection,
            view,
            projection_view,
            inverse_projection_view,
            drag_anchor: None,
        }
    }

    pub fn projection_view(&self) -> Mat4 {
        self.projection_view
    }

    pub fn inverse_projection_view(&self) -> Mat4 {
        self.inverse_projection_view
    }

    /// Advances the camera one step from the input snapshot.
    ///
    /// Returns true iff the recomputed inverse(projection * view) differs
    /// from the previous one by exact equality. The matrix comparison is the
    /// authoritative change signal; no dirty flag is derived from the input
    /// checks themselves.
    pub fn update(&mut self, controls: &Controls) -> bool {
        // camera basis in world space, from the inverted view transform
        let transform = self.view.try_inverse().unwrap();

        let left = column3(&transform, 0);
        let up = column3(&transform, 1);
        let front = column3(&transform, 2);
        let position = column3(&transform, 3);

        let translate = match controls.move_action() {
            Some(MoveAction::StrafeLeft) => left * MOVE_SPEED,
            Some(MoveAction::StrafeRight) => -left * MOVE_SPEED,
            Some(MoveAction::Forward) => front * MOVE_SPEED,
            Some(MoveAction::Backward) => -front * MOVE_SPEED,
            None => Vec3::zeros(),
        };

        if controls.primary_held {
            let cursor = controls.cursor_position;

            if let Some(anchor) = self.drag_anchor {
                let delta = [anchor[0] - cursor[0], anchor[1] - cursor[1]];

                let rot_y = (front + up * (delta[1] * DRAG_SENSITIVITY)).normalize();
                let rot_x = (front + left * (delta[0] * DRAG_SENSITIVITY)).normalize();
                let target = position - front - rot_y - rot_x;

                self.view = Mat4::look_at_rh(
                    &Point::from(position),
                    &Point::from(target),
                    &WORLD_UP,
                );
            }

            // re-latch so the next step sees the delta from here
            self.drag_anchor = Some(cursor);
        } else {
            self.drag_anchor = None;
        }

        self.view *= Mat4::new_translation(&translate);

        let projection_view = self.projection * self.view;
        let inverse_projection_view = projection_view.try_inverse().unwrap();

        let changed = inverse_projection_view != self.inverse_projection_view;
        self.projection_view = projection_view;
        self.inverse_projection_view = inverse_projection_view;

        changed
    }
}

fn column3(m: &Mat4, index: usize) -> Vec3 {
    Vec3::new(m[(0, index)], m[(1, index)], m[(2, index)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::{ElementState, VirtualKeyCode};

    fn press(controls: Controls, key: VirtualKeyCode) -> Controls {
        controls.with_key(key, ElementState::Pressed)
    }

    fn camera() -> Camera {
        Camera::new(800.0, 600.0)
    }

    /// World-space backward axis of the camera (third basis column).
    fn backward(camera: &Camera) -> Vec3 {
        let transform = camera.view.try_inverse().unwrap();
        column3(&transform, 2)
    }

    #[test]
    fn first_idle_update_reports_unchanged() {
        let mut camera = camera();
        assert!(!camera.update(&Controls::default()));
    }

    #[test]
    fn idle_updates_are_idempotent() {
        let mut camera = camera();
        let controls = Controls::default();

        camera.update(&controls);
        let matrix = camera.inverse_projection_view();

        assert!(!camera.update(&controls));
        assert_eq!(camera.inverse_projection_view(), matrix);
    }

    #[test]
    fn movement_key_changes_the_matrix_until_released() {
        let mut camera = camera();
        let forward = press(Controls::default(), VirtualKeyCode::W);

        assert!(camera.update(&forward));
        assert!(camera.update(&forward));
        assert!(!camera.update(&Controls::default()));
    }

    #[test]
    fn simultaneous_keys_resolve_like_the_highest_priority_alone() {
        let mut all_keys = camera();
        let mut strafe_only = camera();

        let mut controls = Controls::default();
        for key in [
            VirtualKeyCode::A,
            VirtualKeyCode::D,
            VirtualKeyCode::W,
            VirtualKeyCode::S,
        ] {
            controls = press(controls, key);
        }

        all_keys.update(&controls);
        strafe_only.update(&press(Controls::default(), VirtualKeyCode::A));

        assert_eq!(
            all_keys.inverse_projection_view(),
            strafe_only.inverse_projection_view()
        );
    }

    #[test]
    fn horizontal_drag_changes_yaw_but_not_pitch() {
        let mut camera = camera();

        let mut controls = Controls::default();
        controls.primary_held = true;
        controls.cursor_position = [100.0, 100.0];

        // first dragging step only latches the anchor
        assert!(!camera.update(&controls));
        let level = backward(&camera);
        assert!(level.y.abs() < 1e-6);

        controls.cursor_position = [90.0, 100.0];
        assert!(camera.update(&controls));

        let turned = backward(&camera);
        assert!(turned.y.abs() < 1e-6, "pitch moved: {}", turned.y);
        assert!(turned.x.abs() > 1e-4, "yaw did not move");
    }

    #[test]
    fn vertical_drag_changes_pitch_but_not_yaw() {
        let mut camera = camera();

        let mut controls = Controls::default();
        controls.primary_held = true;
        controls.cursor_position = [100.0, 100.0];
        camera.update(&controls);

        controls.cursor_position = [100.0, 110.0];
        assert!(camera.update(&controls));

        let tilted = backward(&camera);
        assert!(tilted.x.abs() < 1e-6, "yaw moved: {}", tilted.x);
        assert!(tilted.y.abs() > 1e-4, "pitch did not move");
    }

    #[test]
    fn releasing_the_drag_stops_reporting_change() {
        let mut camera = camera();

        let mut controls = Controls::default();
        controls.primary_held = true;
        controls.cursor_position = [50.0, 50.0];
        camera.update(&controls);
        controls.cursor_position = [60.0, 40.0];
        assert!(camera.update(&controls));

        controls.primary_held = false;
        assert!(!camera.update(&controls));
    }
}
