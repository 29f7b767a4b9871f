//! Translation of winit window events for native hosts.

use ::winit::dpi::PhysicalPosition;
use ::winit::event::{ElementState, MouseButton as WinitMouseButton};
use glam::Vec2;

use super::{MouseButton, PointerEvent, PointerPhase};

pub fn mouse_button_from_winit(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::LEFT),
        WinitMouseButton::Middle => Some(MouseButton::MIDDLE),
        WinitMouseButton::Right => Some(MouseButton::RIGHT),
        WinitMouseButton::Other(index) => u8::try_from(index).ok().map(MouseButton::new),
    }
}

pub fn pointer_phase(state: ElementState) -> PointerPhase {
    match state {
        ElementState::Pressed => PointerPhase::Pressed,
        ElementState::Released => PointerPhase::Released,
    }
}

/// Pointer event for a `WindowEvent::MouseInput`, given the last cursor position.
pub fn pointer_button_event(
    state: ElementState,
    button: WinitMouseButton,
    cursor: PhysicalPosition<f64>,
) -> Option<PointerEvent> {
    Some(PointerEvent {
        phase: pointer_phase(state),
        position: cursor_position(cursor),
        button: mouse_button_from_winit(button)?,
    })
}

/// Pointer event for a `WindowEvent::CursorMoved`.
pub fn pointer_moved_event(cursor: PhysicalPosition<f64>) -> PointerEvent {
    PointerEvent::moved(cursor_position(cursor))
}

fn cursor_position(cursor: PhysicalPosition<f64>) -> Vec2 {
    Vec2::new(cursor.x as f32, cursor.y as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_map_to_pointer_numbering() {
        assert_eq!(
            mouse_button_from_winit(WinitMouseButton::Right),
            Some(MouseButton::RIGHT)
        );
        assert_eq!(
            mouse_button_from_winit(WinitMouseButton::Other(4)),
            Some(MouseButton::new(4))
        );
        assert_eq!(mouse_button_from_winit(WinitMouseButton::Other(900)), None);
    }

    #[test]
    fn mouse_input_becomes_pointer_event() {
        let event = pointer_button_event(
            ElementState::Released,
            WinitMouseButton::Left,
            PhysicalPosition::new(12.5, 40.0),
        )
        .unwrap();
        assert_eq!(event.phase, PointerPhase::Released);
        assert_eq!(event.position, Vec2::new(12.5, 40.0));
        assert_eq!(event.button, MouseButton::LEFT);
    }
}
