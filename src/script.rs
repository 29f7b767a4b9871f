//! Scripted input for headless runs.
//!
//! A script is a JSON file with a list of `steps`, each tagged by `type`:
//!
//! ```json
//! { "steps": [
//!     { "type": "complete_intro" },
//!     { "type": "click", "x": 640, "y": 360 },
//!     { "type": "controller", "signal": "squeeze", "position": [0, 1.2, 0], "pitch": -40 }
//! ] }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use log::debug;
use serde::Deserialize;

use crate::app::Gallery;
use crate::input::{ControllerEvent, ControllerSignal, InputEvent, MouseButton, PointerEvent};
use crate::interaction::InteractionEvent;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    PointerDown {
        x: f32,
        y: f32,
        #[serde(default = "default_button")]
        button: String,
    },
    PointerUp {
        x: f32,
        y: f32,
        #[serde(default = "default_button")]
        button: String,
    },
    /// Press and release on the same pixel.
    Click {
        x: f32,
        y: f32,
        #[serde(default = "default_button")]
        button: String,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    ContextMenu,
    /// Controller pose relative to the rig; angles in degrees.
    Controller {
        signal: ControllerSignal,
        #[serde(default)]
        index: u8,
        #[serde(default = "default_tracked")]
        tracked: bool,
        #[serde(default)]
        position: Vec3,
        #[serde(default)]
        yaw: f32,
        #[serde(default)]
        pitch: f32,
    },
    /// Camera orientation in degrees.
    Look {
        yaw: f32,
        pitch: f32,
    },
    Frames {
        count: usize,
    },
    Resize {
        width: u32,
        height: u32,
    },
    CompleteIntro,
}

fn default_button() -> String {
    "left".to_string()
}

fn default_tracked() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputScript {
    pub steps: Vec<ScriptStep>,
}

impl InputScript {
    pub fn from_json(source: &str) -> Result<Self> {
        let script: InputScript = serde_json::from_str(source)?;
        if script.steps.is_empty() {
            bail!("input script contains no steps");
        }
        for step in &script.steps {
            match step {
                ScriptStep::PointerDown { button, .. }
                | ScriptStep::PointerUp { button, .. }
                | ScriptStep::Click { button, .. } => {
                    parse_button(button)?;
                }
                _ => {}
            }
        }
        Ok(script)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read input script {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("invalid input script {}", path.display()))
    }

    /// Feeds every step to the gallery and collects the events it produced.
    pub fn replay(&self, gallery: &mut Gallery) -> Result<Vec<InteractionEvent>> {
        let mut events = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            debug!("Script step {index}: {step:?}");
            run_step(gallery, step)?;
            events.extend(gallery.core_mut().drain_events());
        }
        Ok(events)
    }
}

fn run_step(gallery: &mut Gallery, step: &ScriptStep) -> Result<()> {
    match step {
        ScriptStep::PointerDown { x, y, button } => {
            let event = PointerEvent::pressed(Vec2::new(*x, *y), parse_button(button)?);
            gallery.core_mut().handle_input(InputEvent::Pointer(event));
        }
        ScriptStep::PointerUp { x, y, button } => {
            let event = PointerEvent::released(Vec2::new(*x, *y), parse_button(button)?);
            gallery.core_mut().handle_input(InputEvent::Pointer(event));
        }
        ScriptStep::Click { x, y, button } => {
            let position = Vec2::new(*x, *y);
            let button = parse_button(button)?;
            let core = gallery.core_mut();
            core.handle_input(InputEvent::Pointer(PointerEvent::pressed(position, button)));
            core.handle_input(InputEvent::Pointer(PointerEvent::released(position, button)));
        }
        ScriptStep::PointerMove { x, y } => {
            let event = PointerEvent::moved(Vec2::new(*x, *y));
            gallery.core_mut().handle_input(InputEvent::Pointer(event));
        }
        ScriptStep::ContextMenu => {
            gallery.core_mut().handle_input(InputEvent::ContextMenu);
        }
        ScriptStep::Controller {
            signal,
            index,
            tracked,
            position,
            yaw,
            pitch,
        } => {
            let rotation = Quat::from_euler(
                EulerRot::YXZ,
                yaw.to_radians(),
                pitch.to_radians(),
                0.0,
            );
            let event = ControllerEvent {
                index: *index,
                signal: *signal,
                tracked: *tracked,
                pose: Mat4::from_rotation_translation(rotation, *position),
            };
            gallery.core_mut().handle_input(InputEvent::Controller(event));
        }
        ScriptStep::Look { yaw, pitch } => {
            gallery
                .core_mut()
                .look(yaw.to_radians(), pitch.to_radians());
        }
        ScriptStep::Frames { count } => {
            for _ in 0..*count {
                gallery.frame();
            }
        }
        ScriptStep::Resize { width, height } => gallery.resize(*width, *height),
        ScriptStep::CompleteIntro => {
            gallery.finish_intro();
        }
    }
    Ok(())
}

fn parse_button(name: &str) -> Result<MouseButton> {
    MouseButton::from_name(name).with_context(|| format!("unknown mouse button '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GalleryConfig;
    use crate::narration::NullNarrator;
    use crate::role::FLOOR_NAME;
    use crate::scene::{Scene, SceneObject, Shape};

    fn gallery() -> Gallery {
        let mut scene = Scene::new();
        scene.add(
            SceneObject::new(FLOOR_NAME)
                .with_shape(Shape::Plane {
                    width: 60.0,
                    height: 60.0,
                })
                .with_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
            None,
        );
        Gallery::new(scene, GalleryConfig::default(), NullNarrator, false)
    }

    #[test]
    fn rejects_empty_scripts_and_unknown_buttons() {
        assert!(InputScript::from_json(r#"{ "steps": [] }"#).is_err());
        let err = InputScript::from_json(
            r#"{ "steps": [{ "type": "click", "x": 1, "y": 1, "button": "wheel" }] }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("wheel"));
    }

    #[test]
    fn parses_every_step_kind() {
        let script = InputScript::from_json(
            r#"{ "steps": [
                { "type": "complete_intro" },
                { "type": "frames", "count": 3 },
                { "type": "resize", "width": 800, "height": 600 },
                { "type": "look", "yaw": 0, "pitch": -30 },
                { "type": "pointer_move", "x": 400, "y": 300 },
                { "type": "pointer_down", "x": 400, "y": 300, "button": "right" },
                { "type": "pointer_up", "x": 401, "y": 300, "button": "right" },
                { "type": "context_menu" },
                { "type": "controller", "signal": "select", "position": [0, 1, 0] }
            ] }"#,
        )
        .unwrap();
        assert_eq!(script.steps.len(), 9);
        assert_eq!(
            script.steps[8],
            ScriptStep::Controller {
                signal: ControllerSignal::Select,
                index: 0,
                tracked: true,
                position: Vec3::new(0.0, 1.0, 0.0),
                yaw: 0.0,
                pitch: 0.0,
            }
        );
    }

    #[test]
    fn input_during_the_intro_is_dropped() {
        let mut gallery = gallery();
        let script = InputScript::from_json(
            r#"{ "steps": [
                { "type": "controller", "signal": "squeeze", "position": [0, 1.2, 0], "pitch": -45 }
            ] }"#,
        )
        .unwrap();
        let events = script.replay(&mut gallery).unwrap();
        assert!(events.is_empty());
        assert_eq!(gallery.core().rig_position(), Vec3::new(0.0, 0.0, 50.0));
    }

    #[test]
    fn squeeze_after_the_intro_teleports() {
        let mut gallery = gallery();
        let intro = InputScript::from_json(r#"{ "steps": [{ "type": "complete_intro" }] }"#)
            .unwrap();
        let events = intro.replay(&mut gallery).unwrap();
        assert!(events.contains(&InteractionEvent::Resumed));
        let before = gallery.core().rig_position();

        let script = InputScript::from_json(
            r#"{ "steps": [
                { "type": "controller", "signal": "squeeze", "position": [0, 1.2, 0], "pitch": -45 }
            ] }"#,
        )
        .unwrap();
        let events = script.replay(&mut gallery).unwrap();
        let moved = events.iter().find_map(|event| match event {
            InteractionEvent::RigMoved(position) => Some(*position),
            _ => None,
        });
        let moved = moved.expect("rig should move");
        // Ray from 1.2 m up at 45 degrees lands 1.2 m ahead.
        assert!((moved.z - (before.z - 1.2)).abs() < 1e-3);
        assert!(moved.x.abs() < 1e-4);
    }
}
