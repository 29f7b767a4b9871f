//! Detail panel shown when an artwork is selected.
//!
//! The panel is a small subtree of the scene: an image plane, two text
//! blocks and a row of buttons, parented to a root placed in front of the
//! visitor. Only one panel exists at a time; [`PanelState`] tracks it.

use glam::{Quat, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::artwork::ArtworkMetadata;
use crate::config::PanelConfig;
use crate::scene::{ObjectId, Scene, SceneObject, Shape, Transform};

pub const PANEL_NAME: &str = "InfoPanel";
pub const UNTITLED: &str = "Sin Título";
pub const NO_DESCRIPTION: &str = "...";

/// Pixels per scene unit of the text textures.
const TEXT_PIXELS_PER_UNIT: f32 = 500.0;
const TEXT_PADDING: f32 = 40.0;
const LINE_SPACING: f32 = 12.0;

const CONTENT_DEPTH: f32 = 0.05;
const IMAGE_Y: f32 = 0.6;
const RIGHT_COLUMN_X: f32 = 1.9;
const TITLE_Y: f32 = 1.2;
const DESCRIPTION_Y: f32 = 0.4;
const BUTTON_ROW_Y: f32 = -0.3;
const BUTTON_SPACING: f32 = 0.4;
const CLOSE_Y: f32 = -0.9;

/// Behaviour carried by a panel button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonAction {
    ZoomIn,
    ZoomOut,
    ResetZoom,
    Narrate,
    Close,
}

impl ButtonAction {
    pub const ALL: [ButtonAction; 5] = [
        ButtonAction::ZoomOut,
        ButtonAction::ResetZoom,
        ButtonAction::ZoomIn,
        ButtonAction::Narrate,
        ButtonAction::Close,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ButtonAction::ZoomIn => "➕",
            ButtonAction::ZoomOut => "➖",
            ButtonAction::ResetZoom => "⟲",
            ButtonAction::Narrate => "🔊 LECTURA",
            ButtonAction::Close => "❌ CERRAR VISTA",
        }
    }

    fn object_name(self) -> &'static str {
        match self {
            ButtonAction::ZoomIn => "ZoomIn",
            ButtonAction::ZoomOut => "ZoomOut",
            ButtonAction::ResetZoom => "ResetZoom",
            ButtonAction::Narrate => "Narrate",
            ButtonAction::Close => "Close",
        }
    }

    fn tint(self) -> Vec3 {
        match self {
            ButtonAction::ZoomIn | ButtonAction::ZoomOut => hex(0x44ff44),
            ButtonAction::ResetZoom => hex(0x4444ff),
            ButtonAction::Narrate => hex(0xaaaaaa),
            ButtonAction::Close => hex(0xff4444),
        }
    }

    fn position(self) -> Vec3 {
        let (x, y) = match self {
            ButtonAction::ZoomOut => (RIGHT_COLUMN_X - BUTTON_SPACING, BUTTON_ROW_Y),
            ButtonAction::ResetZoom => (RIGHT_COLUMN_X, BUTTON_ROW_Y),
            ButtonAction::ZoomIn => (RIGHT_COLUMN_X + BUTTON_SPACING, BUTTON_ROW_Y),
            ButtonAction::Narrate => (-RIGHT_COLUMN_X, BUTTON_ROW_Y),
            ButtonAction::Close => (0.0, CLOSE_Y),
        };
        Vec3::new(x, y, CONTENT_DEPTH)
    }
}

fn hex(value: u32) -> Vec3 {
    Vec3::new(
        ((value >> 16) & 0xff) as f32 / 255.0,
        ((value >> 8) & 0xff) as f32 / 255.0,
        (value & 0xff) as f32 / 255.0,
    )
}

/// Word-wrapped text laid out on a texture, with its size in scene units.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

impl TextBlock {
    /// Wraps `text` to `max_width` pixels at `font_size`.
    ///
    /// Glyph widths are estimated: narrow for ASCII, a full em for anything
    /// else (emoji, symbols).
    pub fn layout(text: &str, font_size: f32, max_width: f32) -> Self {
        let mut lines = Vec::new();
        let mut line = String::new();
        for word in text.split(' ') {
            let candidate = format!("{line}{word} ");
            if text_width(&candidate, font_size) > max_width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line = format!("{word} ");
            } else {
                line = candidate;
            }
        }
        lines.push(line);

        let width = (max_width + TEXT_PADDING) / TEXT_PIXELS_PER_UNIT;
        let height = (lines.len() as f32 * (font_size + LINE_SPACING) + TEXT_PADDING)
            / TEXT_PIXELS_PER_UNIT;
        Self {
            lines,
            width,
            height,
        }
    }

    pub fn text(&self) -> String {
        self.lines.concat().trim_end().to_string()
    }
}

fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars()
        .map(|c| if c.is_ascii() { 0.55 } else { 1.0 })
        .sum::<f32>()
        * font_size
}

/// Scene objects and content of the open panel.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPanel {
    /// Artwork the panel was opened for.
    pub source: ObjectId,
    pub artwork: ArtworkMetadata,
    pub root: ObjectId,
    pub image: ObjectId,
    pub buttons: Vec<(ButtonAction, ObjectId)>,
    pub title: TextBlock,
    pub description: TextBlock,
    pub zoom: f32,
}

impl OpenPanel {
    pub fn button(&self, action: ButtonAction) -> Option<ObjectId> {
        self.buttons
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, id)| *id)
    }

    /// Applies a zoom action to the image plane and returns the new scale.
    /// Non-zoom actions leave the scale untouched.
    pub fn apply_zoom(
        &mut self,
        scene: &mut Scene,
        action: ButtonAction,
        config: &PanelConfig,
    ) -> f32 {
        self.zoom = next_zoom(self.zoom, action, config);
        if let Some(image) = scene.get_mut(self.image) {
            image.transform.scale = Vec3::splat(self.zoom);
        }
        self.zoom
    }
}

/// Zoom level after `action`. Zooming in never exceeds the configured
/// maximum, zooming out never drops below the minimum.
pub fn next_zoom(current: f32, action: ButtonAction, config: &PanelConfig) -> f32 {
    match action {
        ButtonAction::ZoomIn => (current * config.zoom_in_factor).min(config.max_zoom),
        ButtonAction::ZoomOut => (current * config.zoom_out_factor).max(config.min_zoom),
        ButtonAction::ResetZoom => 1.0,
        ButtonAction::Narrate | ButtonAction::Close => current,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PanelState {
    #[default]
    Closed,
    Open(OpenPanel),
}

impl PanelState {
    pub fn is_open(&self) -> bool {
        matches!(self, PanelState::Open(_))
    }

    pub fn as_open(&self) -> Option<&OpenPanel> {
        match self {
            PanelState::Open(panel) => Some(panel),
            PanelState::Closed => None,
        }
    }

    pub fn as_open_mut(&mut self) -> Option<&mut OpenPanel> {
        match self {
            PanelState::Open(panel) => Some(panel),
            PanelState::Closed => None,
        }
    }

    /// Root of the open panel's subtree, used to restrict ray casts.
    pub fn root(&self) -> Option<ObjectId> {
        self.as_open().map(|panel| panel.root)
    }
}

/// Where the panel goes: `distance` ahead of the rig along the horizontal
/// facing direction, at eye height, turned so its front faces the rig.
pub fn placement(rig: Vec3, facing: Vec3, config: &PanelConfig) -> Transform {
    let flat = Vec3::new(facing.x, 0.0, facing.z);
    let forward = flat.try_normalize().unwrap_or(Vec3::NEG_Z);
    let mut position = rig + forward * config.distance;
    position.y = config.eye_height;

    let to_rig = Vec3::new(rig.x - position.x, 0.0, rig.z - position.z);
    let yaw = to_rig.x.atan2(to_rig.z);
    Transform {
        position,
        rotation: Quat::from_rotation_y(yaw),
        scale: Vec3::ONE,
    }
}

/// Builds the panel subtree for `artwork` and adds it to the scene.
pub fn build(
    scene: &mut Scene,
    source: ObjectId,
    artwork: &ArtworkMetadata,
    transform: Transform,
    config: &PanelConfig,
) -> OpenPanel {
    let mut root_object = SceneObject::new(PANEL_NAME);
    root_object.transform = transform;
    let root = scene.add(root_object, None);
    let content = scene.add(SceneObject::new(format!("{PANEL_NAME}/Content")), Some(root));

    let image_width = config.image_width;
    let image_tint = if artwork.src.is_some() {
        Vec3::ONE
    } else {
        hex(0xff00ff)
    };
    let image = scene.add(
        SceneObject::new(format!("{PANEL_NAME}/Image"))
            .with_shape(Shape::Plane {
                width: image_width,
                height: image_width * artwork.aspect_ratio(),
            })
            .with_position(Vec3::new(0.0, IMAGE_Y, CONTENT_DEPTH))
            .with_color(image_tint),
        Some(content),
    );

    let title = TextBlock::layout(artwork.title.as_deref().unwrap_or(UNTITLED), 50.0, 600.0);
    add_text(scene, content, "Title", &title, TITLE_Y);
    let description = TextBlock::layout(
        artwork.description.as_deref().unwrap_or(NO_DESCRIPTION),
        25.0,
        600.0,
    );
    add_text(scene, content, "Description", &description, DESCRIPTION_Y);

    let buttons = ButtonAction::ALL
        .iter()
        .map(|&action| {
            let label = TextBlock::layout(action.label(), 40.0, 200.0);
            let id = scene.add(
                SceneObject::new(format!("{PANEL_NAME}/{}", action.object_name()))
                    .with_shape(Shape::Plane {
                        width: label.width,
                        height: label.height,
                    })
                    .with_position(action.position())
                    .with_color(action.tint())
                    .with_button(action),
                Some(content),
            );
            (action, id)
        })
        .collect();

    debug!(
        "Built panel for {:?} at ({:.2}, {:.2}, {:.2})",
        artwork.title, transform.position.x, transform.position.y, transform.position.z
    );
    OpenPanel {
        source,
        artwork: artwork.clone(),
        root,
        image,
        buttons,
        title,
        description,
        zoom: 1.0,
    }
}

fn add_text(scene: &mut Scene, parent: ObjectId, name: &str, block: &TextBlock, y: f32) {
    scene.add(
        SceneObject::new(format!("{PANEL_NAME}/{name}"))
            .with_shape(Shape::Plane {
                width: block.width,
                height: block.height,
            })
            .with_position(Vec3::new(RIGHT_COLUMN_X, y, CONTENT_DEPTH)),
        Some(parent),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    fn config() -> PanelConfig {
        PanelConfig::default()
    }

    #[test]
    fn zoom_is_clamped_and_resettable() {
        let config = config();
        let mut zoom = 1.0;
        for _ in 0..10 {
            zoom = next_zoom(zoom, ButtonAction::ZoomIn, &config);
        }
        assert_eq!(zoom, 3.0);
        for _ in 0..10 {
            zoom = next_zoom(zoom, ButtonAction::ZoomOut, &config);
        }
        assert_eq!(zoom, 0.5);
        assert_eq!(next_zoom(zoom, ButtonAction::ResetZoom, &config), 1.0);
        assert_eq!(next_zoom(0.7, ButtonAction::Narrate, &config), 0.7);
    }

    #[test]
    fn zoom_in_twice_then_reset_restores_scale() {
        let config = config();
        let mut scene = Scene::new();
        let artwork = ArtworkMetadata::default();
        let mut panel = build(
            &mut scene,
            ObjectId::from_raw(0),
            &artwork,
            Transform::default(),
            &config,
        );
        panel.apply_zoom(&mut scene, ButtonAction::ZoomIn, &config);
        let scale = panel.apply_zoom(&mut scene, ButtonAction::ZoomIn, &config);
        assert!((scale - 1.44).abs() < 1e-5);
        panel.apply_zoom(&mut scene, ButtonAction::ResetZoom, &config);
        assert_eq!(
            scene.get(panel.image).unwrap().transform.scale,
            Vec3::ONE
        );
    }

    #[test]
    fn placement_faces_the_rig() {
        let transform = placement(Vec3::new(0.0, 0.0, 20.0), Vec3::NEG_Z, &config());
        assert!((transform.position - Vec3::new(0.0, 1.6, 18.5)).length() < 1e-5);
        let front = transform.rotation * Vec3::Z;
        assert!((front - Vec3::Z).length() < 1e-5);

        // Looking straight down still yields a valid placement.
        let down = placement(Vec3::ZERO, Vec3::NEG_Y, &config());
        assert!((down.position - Vec3::new(0.0, 1.6, -1.5)).length() < 1e-5);

        let sideways = placement(Vec3::ZERO, Vec3::new(1.0, -0.5, 0.0), &config());
        assert!((sideways.position - Vec3::new(1.5, 1.6, 0.0)).length() < 1e-5);
        let front = sideways.rotation * Vec3::Z;
        assert!((front - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn build_uses_placeholders_for_missing_metadata() {
        let mut scene = Scene::new();
        let panel = build(
            &mut scene,
            ObjectId::from_raw(0),
            &ArtworkMetadata::default(),
            Transform::default(),
            &config(),
        );
        assert_eq!(panel.title.text(), UNTITLED);
        assert_eq!(panel.description.text(), NO_DESCRIPTION);
        let image = scene.get(panel.image).unwrap();
        assert_eq!(image.color, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(
            image.shape,
            Shape::Plane {
                width: 2.0,
                height: 2.0
            }
        );
        assert_eq!(panel.buttons.len(), 5);
        for (action, id) in &panel.buttons {
            assert_eq!(scene.role(*id), Role::Button);
            assert_eq!(scene.get(*id).unwrap().button, Some(*action));
            assert!(scene.is_descendant_of(*id, panel.root));
        }
        assert_eq!(scene.role(panel.image), Role::None);
    }

    #[test]
    fn image_keeps_the_artwork_aspect_ratio() {
        let artwork = ArtworkMetadata {
            src: Some("starry.jpg".into()),
            width: Some(4.0),
            height: Some(3.0),
            ..ArtworkMetadata::default()
        };
        let mut scene = Scene::new();
        let panel = build(
            &mut scene,
            ObjectId::from_raw(0),
            &artwork,
            Transform::default(),
            &config(),
        );
        let image = scene.get(panel.image).unwrap();
        assert_eq!(image.color, Vec3::ONE);
        assert_eq!(
            image.shape,
            Shape::Plane {
                width: 2.0,
                height: 1.5
            }
        );
    }

    #[test]
    fn text_layout_wraps_long_lines() {
        let short = TextBlock::layout("Sunset", 50.0, 600.0);
        assert_eq!(short.lines.len(), 1);
        assert!((short.width - 640.0 / 500.0).abs() < 1e-6);
        assert!((short.height - 102.0 / 500.0).abs() < 1e-6);

        let long = TextBlock::layout(
            "a long description that certainly does not fit on a single line of text",
            25.0,
            200.0,
        );
        assert!(long.lines.len() > 1);
        assert!(long.lines.iter().all(|line| !line.is_empty()));
        assert_eq!(
            long.text(),
            "a long description that certainly does not fit on a single line of text"
        );
    }
}
