//! Hover state machine.
//!
//! The state is a plain value. [`HoverState::transition`] reads the scene but
//! never mutates it; it returns the next state and the visual effects the
//! caller has to apply, in order. Leaving a target always emits the effect
//! that restores the value saved when the target was entered.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::scene::{ObjectId, Scene};

/// What the pointer is over, as far as hovering is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    Nothing,
    Interactable(ObjectId),
    Button(ObjectId),
}

/// Spotlight intensity saved before highlighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedIntensity {
    pub light: ObjectId,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HoverState {
    #[default]
    Idle,
    Interactable {
        object: ObjectId,
        /// `None` when the artwork has no paired spotlight.
        saved: Option<SavedIntensity>,
    },
    Button {
        button: ObjectId,
        saved_tint: Vec3,
    },
}

/// Cursor affordance shown by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoverEffect {
    SetIntensity { light: ObjectId, intensity: f32 },
    SetTint { object: ObjectId, color: Vec3 },
    SetCursor(Cursor),
}

/// Strength of the hover highlights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverStyle {
    /// Multiplier applied to a hovered artwork's spotlight.
    pub highlight_factor: f32,
    /// HSL lightness added to a hovered button's tint.
    pub lighten: f32,
}

impl Default for HoverStyle {
    fn default() -> Self {
        Self {
            highlight_factor: 2.5,
            lighten: 0.2,
        }
    }
}

impl HoverState {
    pub fn target(&self) -> HoverTarget {
        match *self {
            HoverState::Idle => HoverTarget::Nothing,
            HoverState::Interactable { object, .. } => HoverTarget::Interactable(object),
            HoverState::Button { button, .. } => HoverTarget::Button(button),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, HoverState::Idle)
    }

    /// Moves to `target`, returning the new state and the effects to apply.
    ///
    /// Hovering the current target again is a no-op.
    pub fn transition(
        self,
        target: HoverTarget,
        scene: &Scene,
        style: &HoverStyle,
    ) -> (HoverState, Vec<HoverEffect>) {
        if self.target() == target {
            return (self, Vec::new());
        }

        let mut effects = Vec::with_capacity(3);
        let restored = self.restore_effect();
        effects.extend(restored);

        let next = match target {
            HoverTarget::Nothing => HoverState::Idle,
            HoverTarget::Interactable(object) if scene.contains(object) => {
                let saved = scene
                    .get(object)
                    .and_then(|o| o.spotlight)
                    .and_then(|light| {
                        let intensity = pending_intensity(restored, light)
                            .or_else(|| scene.get(light)?.light.map(|l| l.intensity))?;
                        Some(SavedIntensity { light, intensity })
                    });
                if let Some(saved) = saved {
                    effects.push(HoverEffect::SetIntensity {
                        light: saved.light,
                        intensity: saved.intensity * style.highlight_factor,
                    });
                }
                HoverState::Interactable { object, saved }
            }
            HoverTarget::Button(button) => match scene.get(button) {
                Some(object) => {
                    let saved_tint = object.color;
                    effects.push(HoverEffect::SetTint {
                        object: button,
                        color: lighten(saved_tint, style.lighten),
                    });
                    HoverState::Button { button, saved_tint }
                }
                None => HoverState::Idle,
            },
            HoverTarget::Interactable(_) => HoverState::Idle,
        };

        match (self.is_idle(), next.is_idle()) {
            (true, true) => {}
            (_, true) => effects.push(HoverEffect::SetCursor(Cursor::Default)),
            (_, false) => effects.push(HoverEffect::SetCursor(Cursor::Pointer)),
        }
        (next, effects)
    }

    /// Returns to `Idle`, restoring whatever was saved.
    pub fn clear(self, scene: &Scene, style: &HoverStyle) -> (HoverState, Vec<HoverEffect>) {
        self.transition(HoverTarget::Nothing, scene, style)
    }

    fn restore_effect(&self) -> Option<HoverEffect> {
        match *self {
            HoverState::Idle => None,
            HoverState::Interactable { saved, .. } => saved.map(|saved| HoverEffect::SetIntensity {
                light: saved.light,
                intensity: saved.intensity,
            }),
            HoverState::Button { button, saved_tint } => Some(HoverEffect::SetTint {
                object: button,
                color: saved_tint,
            }),
        }
    }
}

/// Two artworks may share a spotlight; the value being restored right now
/// is the one to save again, not the highlighted value still in the scene.
fn pending_intensity(restored: Option<HoverEffect>, light: ObjectId) -> Option<f32> {
    match restored {
        Some(HoverEffect::SetIntensity { light: l, intensity }) if l == light => Some(intensity),
        _ => None,
    }
}

/// Adds `delta` to the HSL lightness of an RGB color.
pub fn lighten(color: Vec3, delta: f32) -> Vec3 {
    let (h, s, l) = rgb_to_hsl(color);
    hsl_to_rgb(h, s, (l + delta).clamp(0.0, 1.0))
}

fn rgb_to_hsl(color: Vec3) -> (f32, f32, f32) {
    let max = color.max_element();
    let min = color.min_element();
    let lightness = (max + min) / 2.0;
    if (max - min).abs() <= f32::EPSILON {
        return (0.0, 0.0, lightness);
    }
    let delta = max - min;
    let saturation = if lightness <= 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min)
    };
    let hue = if max == color.x {
        (color.y - color.z) / delta + if color.y < color.z { 6.0 } else { 0.0 }
    } else if max == color.y {
        (color.z - color.x) / delta + 2.0
    } else {
        (color.x - color.y) / delta + 4.0
    };
    (hue / 6.0, saturation, lightness)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    if s <= f32::EPSILON {
        return Vec3::splat(l);
    }
    let q = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Vec3::new(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}
