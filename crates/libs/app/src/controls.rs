use winit::event::{ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent};

/// One translation step, resolved from the movement keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAction {
    StrafeLeft,
    StrafeRight,
    Forward,
    Backward,
}

/// Movement keys in priority order. Only the first pressed entry takes
/// effect on a step; later entries are ignored while it is held.
const MOVE_BINDINGS: [(VirtualKeyCode, MoveAction); 4] = [
    (VirtualKeyCode::A, MoveAction::StrafeLeft),
    (VirtualKeyCode::D, MoveAction::StrafeRight),
    (VirtualKeyCode::W, MoveAction::Forward),
    (VirtualKeyCode::S, MoveAction::Backward),
];

/// Snapshot of the input state the camera reads once per step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Controls {
    pressed: [bool; MOVE_BINDINGS.len()],
    pub primary_held: bool,
    pub cursor_position: [f32; 2],
}

impl Controls {
    pub fn handle_event(self, event: &Event<()>) -> Self {
        let mut new_state = self;

        if let Event::WindowEvent { event, .. } = event {
            match event {
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => {
                    if let Some(slot) = MOVE_BINDINGS.iter().position(|(bound, _)| bound == key) {
                        new_state.pressed[slot] = *state == ElementState::Pressed;
                    }
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    if *button == MouseButton::Left {
                        new_state.primary_held = *state == ElementState::Pressed;
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    new_state.cursor_position = [position.x as f32, position.y as f32];
                }
                _ => {}
            }
        }

        new_state
    }

    /// Resolves the movement keys against the priority table.
    pub fn move_action(&self) -> Option<MoveAction> {
        MOVE_BINDINGS
            .iter()
            .zip(self.pressed.iter())
            .find_map(|((_, action), pressed)| pressed.then_some(*action))
    }
}

#[cfg(test)]
impl Controls {
    pub(crate) fn with_key(mut self, key: VirtualKeyCode, state: ElementState) -> Self {
        let slot = MOVE_BINDINGS
            .iter()
            .position(|(bound, _)| *bound == key)
            .expect("key has no movement binding");
        self.pressed[slot] = state == ElementState::Pressed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_pressed(keys: &[VirtualKeyCode]) -> Controls {
        keys.iter().fold(Controls::default(), |controls, key| {
            controls.with_key(*key, ElementState::Pressed)
        })
    }

    #[test]
    fn no_keys_no_movement() {
        assert_eq!(Controls::default().move_action(), None);
    }

    #[test]
    fn single_key_resolves_to_its_action() {
        use VirtualKeyCode::*;
        assert_eq!(
            with_pressed(&[A]).move_action(),
            Some(MoveAction::StrafeLeft)
        );
        assert_eq!(
            with_pressed(&[D]).move_action(),
            Some(MoveAction::StrafeRight)
        );
        assert_eq!(with_pressed(&[W]).move_action(), Some(MoveAction::Forward));
        assert_eq!(with_pressed(&[S]).move_action(), Some(MoveAction::Backward));
    }

    #[test]
    fn first_pressed_binding_wins() {
        use VirtualKeyCode::*;
        assert_eq!(
            with_pressed(&[W, S]).move_action(),
            Some(MoveAction::Forward)
        );
        assert_eq!(
            with_pressed(&[D, W, S]).move_action(),
            Some(MoveAction::StrafeRight)
        );
        assert_eq!(
            with_pressed(&[A, D, W, S]).move_action(),
            Some(MoveAction::StrafeLeft)
        );
    }
}
