//! Ray sources: pointing devices and tracked controllers.
//!
//! Both producers end in the same place, a world-space [`Ray`] paired with
//! an [`ActionKind`]. The pointer side needs a little state to tell clicks
//! from drags; controllers are stateless.

pub mod winit;

use glam::{Mat4, Vec2};
use serde::{Deserialize, Serialize};

use crate::ray::{ActionKind, Ray};

/// Identifier for a mouse button, numbered like DOM pointer events (left
/// button is zero, right button is two).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const MIDDLE: Self = Self(1);
    pub const RIGHT: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Accepts `left`, `middle`, `right` or `mouseN` (1-based, `mouse` alone
    /// is the left button).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "left" | "primary" => Some(Self::LEFT),
            "middle" => Some(Self::MIDDLE),
            "right" | "secondary" => Some(Self::RIGHT),
            _ => parse_mouse_button(name),
        }
    }

    /// Primary selects, secondary moves, anything else does nothing.
    pub fn action(self) -> Option<ActionKind> {
        match self {
            Self::LEFT => Some(ActionKind::Select),
            Self::RIGHT => Some(ActionKind::Move),
            _ => None,
        }
    }
}

fn parse_mouse_button(name: &str) -> Option<MouseButton> {
    if name.len() < 5 || !name.is_char_boundary(5) {
        return None;
    }
    if !name[..5].eq_ignore_ascii_case("mouse") {
        return None;
    }
    let suffix = &name[5..];
    if suffix.is_empty() {
        return Some(MouseButton::LEFT);
    }
    let index = suffix.parse::<u8>().ok()?;
    let index = index.saturating_sub(1);
    Some(MouseButton::new(index))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    Pressed,
    Moved,
    Released,
}

/// Pointer event in window pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub position: Vec2,
    pub button: MouseButton,
}

impl PointerEvent {
    pub fn pressed(position: Vec2, button: MouseButton) -> Self {
        Self {
            phase: PointerPhase::Pressed,
            position,
            button,
        }
    }

    pub fn released(position: Vec2, button: MouseButton) -> Self {
        Self {
            phase: PointerPhase::Released,
            position,
            button,
        }
    }

    pub fn moved(position: Vec2) -> Self {
        Self {
            phase: PointerPhase::Moved,
            position,
            button: MouseButton::LEFT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerSignal {
    Select,
    Squeeze,
}

impl ControllerSignal {
    pub fn action(self) -> ActionKind {
        match self {
            ControllerSignal::Select => ActionKind::Select,
            ControllerSignal::Squeeze => ActionKind::Move,
        }
    }
}

/// Button signal from a tracked controller. `pose` is relative to the
/// visitor rig, like the poses reported by XR runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerEvent {
    pub index: u8,
    pub signal: ControllerSignal,
    pub tracked: bool,
    pub pose: Mat4,
}

impl ControllerEvent {
    /// World ray and action, or `None` when the controller is not tracked.
    pub fn to_action(&self, rig: &Mat4) -> Option<(Ray, ActionKind)> {
        if !self.tracked {
            return None;
        }
        Some((Ray::from_pose(&(*rig * self.pose)), self.signal.action()))
    }
}

/// Everything the host can feed into the interaction core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Controller(ControllerEvent),
    /// The platform is about to show its context menu.
    ContextMenu,
}

/// What a pointer event amounts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerIntent {
    /// Sample hover at this screen position.
    Hover(Vec2),
    /// A click at this screen position.
    Action(Vec2, ActionKind),
    None,
}

/// Turns raw press/move/release events into hovers and clicks.
///
/// A release counts as a click only when it lands strictly within
/// `click_radius` pixels of the matching press, so drags that turn the
/// camera never select anything.
#[derive(Debug, Clone)]
pub struct PointerAdapter {
    click_radius: f32,
    pressed_at: Option<Vec2>,
}

impl PointerAdapter {
    pub fn new(click_radius: f32) -> Self {
        Self {
            click_radius,
            pressed_at: None,
        }
    }

    pub fn handle(&mut self, event: &PointerEvent) -> PointerIntent {
        match event.phase {
            PointerPhase::Pressed => {
                self.pressed_at = Some(event.position);
                PointerIntent::None
            }
            PointerPhase::Moved => PointerIntent::Hover(event.position),
            PointerPhase::Released => {
                let Some(pressed_at) = self.pressed_at.take() else {
                    return PointerIntent::None;
                };
                if pressed_at.distance(event.position) >= self.click_radius {
                    return PointerIntent::None;
                }
                match event.button.action() {
                    Some(action) => PointerIntent::Action(event.position, action),
                    None => PointerIntent::None,
                }
            }
        }
    }

    /// Forgets a pending press.
    pub fn reset(&mut self) {
        self.pressed_at = None;
    }
}
