//! The interaction core.
//!
//! [`InteractionCore`] owns the scene and is the only place hover and panel
//! state change. Hosts feed it [`InputEvent`]s (or rays directly, through
//! [`InteractionCore::handle_ray`]) and call [`InteractionCore::update_frame`]
//! once per frame; what happened is reported through an outbox of
//! [`InteractionEvent`]s.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use log::{debug, info};

use crate::app::ViewportProvider;
use crate::config::GalleryConfig;
use crate::gate::InteractionGate;
use crate::hit::{CastOutcome, HitTester};
use crate::hover::{Cursor, HoverEffect, HoverState, HoverStyle, HoverTarget};
use crate::input::{InputEvent, PointerAdapter, PointerIntent};
use crate::narration::{self, NarrationToggle, Narrator, NullNarrator};
use crate::overlay::{Dimmer, TeleportMarker};
use crate::panel::{self, ButtonAction, PanelState};
use crate::ray::{screen_to_ndc, ActionKind, Ray};
use crate::role::Role;
use crate::scene::{ObjectId, Scene};
use crate::teleport::{Camera, VisitorRig};

/// Something the host may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    CursorChanged(Cursor),
    PanelOpened { artwork: ObjectId, panel: ObjectId },
    PanelClosed { artwork: ObjectId },
    ZoomChanged(f32),
    Narration(NarrationToggle),
    RigMoved(Vec3),
    DimmerToggled(bool),
    MarkerMoved(Vec3),
    MarkerHidden,
    Suspended,
    Resumed,
}

/// Whether the host should run its default handling for an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResponse {
    Continue,
    PreventDefault,
}

pub struct InteractionCore {
    scene: Scene,
    rig: VisitorRig,
    dimmer: Dimmer,
    marker: TeleportMarker,
    tester: HitTester,
    pointer: PointerAdapter,
    hover: HoverState,
    hover_style: HoverStyle,
    cursor: Cursor,
    panel: PanelState,
    gate: Box<dyn InteractionGate>,
    narrator: Box<dyn Narrator>,
    viewport: Arc<dyn ViewportProvider>,
    config: GalleryConfig,
    suspended: bool,
    events: Vec<InteractionEvent>,
}

impl InteractionCore {
    /// Takes ownership of the scene and installs the rig (at `rig_start`
    /// unless the scene brings its own), the dimmer and the teleport marker.
    ///
    /// The core starts ungated and without narration; see
    /// [`with_gate`](Self::with_gate) and [`with_narrator`](Self::with_narrator).
    pub fn new(
        mut scene: Scene,
        config: GalleryConfig,
        viewport: Arc<dyn ViewportProvider>,
        rig_start: Vec3,
    ) -> Self {
        let rig = VisitorRig::install(&mut scene, rig_start, Camera::from_config(&config.camera));
        let dimmer = Dimmer::install(&mut scene, rig.root, config.camera.eye_height);
        let marker = TeleportMarker::install(&mut scene, config.interaction.marker_lift);
        info!("Interaction core ready with {} scene objects", scene.len());
        Self {
            scene,
            rig,
            dimmer,
            marker,
            tester: HitTester::new(),
            pointer: PointerAdapter::new(config.interaction.click_radius),
            hover: HoverState::Idle,
            hover_style: config.interaction.hover_style(),
            cursor: Cursor::Default,
            panel: PanelState::Closed,
            gate: Box::new(|| false),
            narrator: Box::new(NullNarrator),
            viewport,
            config,
            suspended: false,
            events: Vec::new(),
        }
    }

    pub fn with_gate(mut self, gate: impl InteractionGate + 'static) -> Self {
        self.suspended = gate.is_suspended();
        self.gate = Box::new(gate);
        self
    }

    pub fn with_narrator(mut self, narrator: impl Narrator + 'static) -> Self {
        self.narrator = Box::new(narrator);
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene access for the host's own animation (doors, intro).
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn rig(&self) -> &VisitorRig {
        &self.rig
    }

    pub fn rig_position(&self) -> Vec3 {
        self.rig.position(&self.scene)
    }

    pub fn hover(&self) -> HoverState {
        self.hover
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    pub fn dimmer(&self) -> Dimmer {
        self.dimmer
    }

    pub fn marker(&self) -> TeleportMarker {
        self.marker
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Points the visitor camera (radians).
    pub fn look(&mut self, yaw: f32, pitch: f32) {
        self.rig.camera.look(yaw, pitch);
    }

    /// Takes every event produced since the last call.
    pub fn drain_events(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Camera ray through a window pixel.
    pub fn pointer_ray(&self, screen: Vec2) -> Ray {
        let (width, height) = self.viewport.viewport_size();
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let ndc = screen_to_ndc(screen, (width, height));
        self.rig.camera_ray(&self.scene, ndc, aspect)
    }

    /// Per-frame hook: notices gate transitions.
    pub fn update_frame(&mut self) {
        self.sync_gate();
    }

    pub fn handle_input(&mut self, event: InputEvent) -> InputResponse {
        if let InputEvent::ContextMenu = event {
            return InputResponse::PreventDefault;
        }
        if self.sync_gate() {
            debug!("Input ignored while interaction is suspended");
            return InputResponse::Continue;
        }
        match event {
            InputEvent::Pointer(pointer) => match self.pointer.handle(&pointer) {
                PointerIntent::Hover(screen) => {
                    let ray = self.pointer_ray(screen);
                    self.hover_ray(&ray);
                }
                PointerIntent::Action(screen, action) => {
                    let ray = self.pointer_ray(screen);
                    self.handle_ray(&ray, action);
                }
                PointerIntent::None => {}
            },
            InputEvent::Controller(controller) => {
                let rig = self.rig.matrix(&self.scene);
                match controller.to_action(&rig) {
                    Some((ray, action)) => self.handle_ray(&ray, action),
                    None => debug!("Ignoring untracked controller {}", controller.index),
                }
            }
            InputEvent::ContextMenu => {}
        }
        InputResponse::Continue
    }

    /// Dispatches a select or move ray.
    pub fn handle_ray(&mut self, ray: &Ray, action: ActionKind) {
        if self.sync_gate() {
            return;
        }

        if let Some(root) = self.panel.root() {
            if action == ActionKind::Select {
                if let CastOutcome::Hit(hit) = self.tester.resolve(&self.scene, ray, Some(root)) {
                    self.press_button(hit.target);
                }
            } else {
                debug!("Move ignored while a panel is open");
            }
            return;
        }

        match self.tester.resolve(&self.scene, ray, None) {
            CastOutcome::Miss => {}
            CastOutcome::Blocked(hit) => {
                debug!("{action:?} blocked by obstacle at {:.2}", hit.distance);
            }
            CastOutcome::Hit(hit) => match (action, hit.role) {
                (ActionKind::Select, Role::Interactable) => self.open_panel(hit.target),
                (ActionKind::Move, Role::Floor) => {
                    let position = self.rig.teleport(&mut self.scene, hit.hit.point);
                    self.events.push(InteractionEvent::RigMoved(position));
                }
                _ => {}
            },
        }
    }

    /// Updates hover state and the teleport marker for a pointer ray.
    pub fn hover_ray(&mut self, ray: &Ray) {
        if self.sync_gate() {
            return;
        }

        let panel = self.panel.root();
        let sample = self.tester.sample_hover(&self.scene, ray, panel);
        match sample.floor {
            Some(point) if panel.is_none() => {
                let position = self.marker.place(&mut self.scene, point);
                self.events.push(InteractionEvent::MarkerMoved(position));
            }
            _ => self.hide_marker(),
        }
        self.set_hover(sample.target);
    }

    /// Closes the open panel, if any: stops narration, clears hover, removes
    /// the panel and hides the dimmer.
    pub fn close_panel(&mut self) {
        let PanelState::Open(open) = std::mem::take(&mut self.panel) else {
            return;
        };
        self.narrator.cancel();
        self.clear_hover();
        self.scene.remove(open.root);
        if self.dimmer.set_visible(&mut self.scene, false) {
            self.events.push(InteractionEvent::DimmerToggled(false));
        }
        info!("Closed panel for {:?}", open.artwork.title);
        self.events.push(InteractionEvent::PanelClosed {
            artwork: open.source,
        });
    }

    fn open_panel(&mut self, artwork: ObjectId) {
        let metadata = self
            .scene
            .get(artwork)
            .and_then(|object| object.artwork.clone())
            .unwrap_or_default();
        self.clear_hover();

        let rig = self.rig_position();
        let placement = panel::placement(rig, self.rig.camera.forward(), &self.config.panel);
        let open = panel::build(&mut self.scene, artwork, &metadata, placement, &self.config.panel);
        info!(
            "Opened panel for {:?} at ({:.2}, {:.2}, {:.2})",
            metadata.title, placement.position.x, placement.position.y, placement.position.z
        );

        self.hide_marker();
        if self.dimmer.set_visible(&mut self.scene, true) {
            self.events.push(InteractionEvent::DimmerToggled(true));
        }
        self.events.push(InteractionEvent::PanelOpened {
            artwork,
            panel: open.root,
        });
        self.panel = PanelState::Open(open);
    }

    fn press_button(&mut self, button: ObjectId) {
        let Some(action) = self.scene.get(button).and_then(|object| object.button) else {
            return;
        };
        debug!("Panel button {action:?}");
        match action {
            ButtonAction::ZoomIn | ButtonAction::ZoomOut | ButtonAction::ResetZoom => {
                if let Some(open) = self.panel.as_open_mut() {
                    let zoom = open.apply_zoom(&mut self.scene, action, &self.config.panel);
                    self.events.push(InteractionEvent::ZoomChanged(zoom));
                }
            }
            ButtonAction::Narrate => {
                if let Some(open) = self.panel.as_open() {
                    let text = open.artwork.narration_text();
                    let outcome = narration::toggle(
                        self.narrator.as_mut(),
                        &text,
                        &self.config.narration.language,
                    );
                    self.events.push(InteractionEvent::Narration(outcome));
                }
            }
            ButtonAction::Close => self.close_panel(),
        }
    }

    /// Re-reads the gate. Entering suspension closes the panel; while
    /// suspended hover stays idle and the marker hidden.
    fn sync_gate(&mut self) -> bool {
        let suspended = self.gate.is_suspended();
        if suspended != self.suspended {
            self.suspended = suspended;
            if suspended {
                info!("Interaction suspended");
                self.close_panel();
                self.pointer.reset();
                self.events.push(InteractionEvent::Suspended);
            } else {
                info!("Interaction resumed");
                self.events.push(InteractionEvent::Resumed);
            }
        }
        if suspended {
            self.clear_hover();
            self.hide_marker();
        }
        suspended
    }

    fn set_hover(&mut self, target: HoverTarget) {
        let (next, effects) = self.hover.transition(target, &self.scene, &self.hover_style);
        self.apply_hover(next, effects);
    }

    fn clear_hover(&mut self) {
        let (next, effects) = self.hover.clear(&self.scene, &self.hover_style);
        self.apply_hover(next, effects);
    }

    fn apply_hover(&mut self, next: HoverState, effects: Vec<HoverEffect>) {
        self.hover = next;
        for effect in effects {
            self.apply_hover_effect(effect);
        }
    }

    fn apply_hover_effect(&mut self, effect: HoverEffect) {
        match effect {
            HoverEffect::SetIntensity { light, intensity } => {
                if let Some(light) = self.scene.get_mut(light).and_then(|o| o.light.as_mut()) {
                    light.intensity = intensity;
                }
            }
            HoverEffect::SetTint { object, color } => {
                if let Some(object) = self.scene.get_mut(object) {
                    object.color = color;
                }
            }
            HoverEffect::SetCursor(cursor) => {
                if cursor != self.cursor {
                    self.cursor = cursor;
                    self.events.push(InteractionEvent::CursorChanged(cursor));
                }
            }
        }
    }

    fn hide_marker(&mut self) {
        if self.marker.hide(&mut self.scene) {
            self.events.push(InteractionEvent::MarkerHidden);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::StaticViewport;
    use crate::artwork::ArtworkMetadata;
    use crate::gate::GateHandle;
    use crate::input::{ControllerEvent, ControllerSignal, MouseButton, PointerEvent};
    use crate::narration::RecordingNarrator;
    use crate::role::{FLOOR_NAME, OBSTACLE_NAME};
    use crate::scene::{SceneObject, Shape, SpotLight};
    use glam::{Mat4, Quat};

    const RIG: Vec3 = Vec3::new(0.0, 0.0, 20.0);
    const EYE: Vec3 = Vec3::new(0.0, 1.6, 20.0);

    struct Gallery {
        core: InteractionCore,
        painting: ObjectId,
        light: ObjectId,
        gate: GateHandle,
        narrator: RecordingNarrator,
    }

    /// Painting 3 units ahead of the eye, a floor 60 units wide, a wall to
    /// the left. The visitor stands at z=20 looking down -Z.
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
        let mount = scene.add(
            SceneObject::new("mount").with_position(Vec3::new(0.0, 1.6, 17.0)),
            None,
        );
        let light = scene.add(
            SceneObject::new("spot")
                .with_position(Vec3::new(0.0, 2.0, 1.0))
                .with_light(SpotLight { intensity: 2.0 }),
            Some(mount),
        );
        let painting = scene.add(
            SceneObject::new("painting")
                .with_shape(Shape::Plane {
                    width: 1.0,
                    height: 1.0,
                })
                .with_artwork(ArtworkMetadata {
                    title: Some("Sunset".into()),
                    description: Some("Oil on canvas".into()),
                    width: Some(1.0),
                    height: Some(1.0),
                    ..ArtworkMetadata::default()
                }),
            Some(mount),
        );
        scene.add(
            SceneObject::new(OBSTACLE_NAME)
                .with_shape(Shape::Cuboid {
                    size: Vec3::new(0.5, 4.0, 4.0),
                })
                .with_position(Vec3::new(-2.0, 2.0, 20.0)),
            None,
        );
        scene.link_spotlights();

        let gate = GateHandle::new(false);
        let narrator = RecordingNarrator::new();
        let core = InteractionCore::new(
            scene,
            GalleryConfig::default(),
            Arc::new(StaticViewport::new(1280, 720)),
            RIG,
        )
        .with_gate(gate.clone())
        .with_narrator(narrator.clone());
        Gallery {
            core,
            painting,
            light,
            gate,
            narrator,
        }
    }

    fn ray_to(target: Vec3) -> Ray {
        Ray::new(EYE, target - EYE)
    }

    fn forward() -> Ray {
        Ray::new(EYE, Vec3::NEG_Z)
    }

    fn intensity(core: &InteractionCore, light: ObjectId) -> f32 {
        core.scene().get(light).unwrap().light.unwrap().intensity
    }

    fn open(g: &mut Gallery) {
        g.core.handle_ray(&forward(), ActionKind::Select);
        assert!(g.core.panel().is_open());
    }

    fn press(g: &mut Gallery, action: ButtonAction) {
        let button = g.core.panel().as_open().unwrap().button(action).unwrap();
        let center = g.core.scene().world_position(button);
        g.core.handle_ray(&ray_to(center), ActionKind::Select);
    }

    #[test]
    fn select_on_artwork_opens_panel_in_front_of_the_visitor() {
        let mut g = gallery();
        g.core.handle_ray(&forward(), ActionKind::Select);

        let (source, panel) = {
            let open = g.core.panel().as_open().expect("panel open");
            (open.source, open.root)
        };
        assert_eq!(source, g.painting);
        let root = g.core.scene().get(panel).unwrap();
        assert!((root.transform.position - Vec3::new(0.0, 1.6, 18.5)).length() < 1e-5);
        assert!(g.core.dimmer().is_visible(g.core.scene()));

        let events = g.core.drain_events();
        assert!(events.contains(&InteractionEvent::DimmerToggled(true)));
        assert!(events.contains(&InteractionEvent::PanelOpened {
            artwork: g.painting,
            panel,
        }));
    }

    #[test]
    fn suspended_gate_discards_everything() {
        let mut g = gallery();
        g.gate.set_suspended(true);
        g.core.update_frame();
        g.core.drain_events();

        g.core.handle_ray(&forward(), ActionKind::Select);
        g.core.handle_ray(&ray_to(Vec3::new(0.0, 0.0, 15.0)), ActionKind::Move);
        g.core.hover_ray(&forward());

        assert!(!g.core.panel().is_open());
        assert_eq!(g.core.rig_position(), RIG);
        assert!(g.core.hover().is_idle());
        assert_eq!(intensity(&g.core, g.light), 2.0);
        assert!(g.core.drain_events().is_empty());
    }

    #[test]
    fn suspension_closes_the_open_panel() {
        let mut g = gallery();
        open(&mut g);
        g.core.drain_events();

        g.gate.set_suspended(true);
        g.core.update_frame();
        assert!(!g.core.panel().is_open());
        assert!(!g.core.dimmer().is_visible(g.core.scene()));
        let events = g.core.drain_events();
        assert!(events.contains(&InteractionEvent::PanelClosed { artwork: g.painting }));
        assert_eq!(events.last(), Some(&InteractionEvent::Suspended));

        g.gate.set_suspended(false);
        g.core.update_frame();
        assert_eq!(g.core.drain_events(), vec![InteractionEvent::Resumed]);
    }

    #[test]
    fn zoom_buttons_scale_the_image() {
        let mut g = gallery();
        open(&mut g);
        press(&mut g, ButtonAction::ZoomIn);
        press(&mut g, ButtonAction::ZoomIn);
        let open = g.core.panel().as_open().unwrap();
        assert!((open.zoom - 1.44).abs() < 1e-5);

        press(&mut g, ButtonAction::ResetZoom);
        let open = g.core.panel().as_open().unwrap();
        assert_eq!(open.zoom, 1.0);
        assert_eq!(
            g.core.scene().get(open.image).unwrap().transform.scale,
            Vec3::ONE
        );
    }

    #[test]
    fn narrate_toggles_and_close_cancels() {
        let mut g = gallery();
        open(&mut g);
        press(&mut g, ButtonAction::Narrate);
        let spoken = g.narrator.spoken();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].text, "Sunset. Oil on canvas");
        assert_eq!(spoken[0].language, "es-ES");
        assert!(g.narrator.is_speaking());

        press(&mut g, ButtonAction::Close);
        assert!(!g.core.panel().is_open());
        assert!(!g.narrator.is_speaking());
        assert!(g.narrator.cancels() >= 1);
        assert!(!g.core.dimmer().is_visible(g.core.scene()));
    }

    #[test]
    fn closing_removes_the_panel_subtree() {
        let mut g = gallery();
        let before = g.core.scene().len();
        open(&mut g);
        assert!(g.core.scene().len() > before);
        g.core.close_panel();
        assert_eq!(g.core.scene().len(), before);
        // Closing twice is harmless.
        g.core.close_panel();
    }

    #[test]
    fn open_panel_blocks_teleport_and_world_selection() {
        let mut g = gallery();
        open(&mut g);
        g.core.handle_ray(&ray_to(Vec3::new(0.0, 0.0, 15.0)), ActionKind::Move);
        assert_eq!(g.core.rig_position(), RIG);
        assert!(g.core.panel().is_open());
    }

    #[test]
    fn move_on_floor_teleports_the_rig() {
        let mut g = gallery();
        let target = Vec3::new(1.5, 0.0, 12.0);
        g.core.handle_ray(&ray_to(target), ActionKind::Move);
        let rig = g.core.rig_position();
        assert!((rig.x - 1.5).abs() < 1e-4);
        assert!((rig.z - 12.0).abs() < 1e-4);
        assert_eq!(rig.y, 0.0);
    }

    #[test]
    fn obstacle_in_front_of_the_floor_blocks_teleport() {
        let mut g = gallery();
        // Wall at x=-2 sits between the eye and this floor point.
        g.core
            .handle_ray(&ray_to(Vec3::new(-8.0, 0.0, 20.0)), ActionKind::Move);
        assert_eq!(g.core.rig_position(), RIG);
    }

    #[test]
    fn hovering_the_artwork_brightens_and_restores_its_light() {
        let mut g = gallery();
        g.core.hover_ray(&forward());
        assert_eq!(g.core.hover().target(), HoverTarget::Interactable(g.painting));
        assert_eq!(intensity(&g.core, g.light), 5.0);
        assert_eq!(g.core.cursor(), Cursor::Pointer);

        g.core.hover_ray(&ray_to(Vec3::new(1.0, 0.0, 14.0)));
        assert!(g.core.hover().is_idle());
        assert_eq!(intensity(&g.core, g.light), 2.0);
        assert_eq!(g.core.cursor(), Cursor::Default);
        let marker = g.core.marker().position(g.core.scene()).unwrap();
        assert!((marker - Vec3::new(1.0, 0.02, 14.0)).length() < 1e-4);

        // Nothing at all under the pointer hides the marker.
        g.core.hover_ray(&Ray::new(EYE, Vec3::Y));
        assert_eq!(g.core.marker().position(g.core.scene()), None);
    }

    #[test]
    fn hovering_a_button_lightens_it_and_leaving_restores_it() {
        let mut g = gallery();
        open(&mut g);
        let close = g
            .core
            .panel()
            .as_open()
            .unwrap()
            .button(ButtonAction::Close)
            .unwrap();
        let tint = g.core.scene().get(close).unwrap().color;

        let center = g.core.scene().world_position(close);
        g.core.hover_ray(&ray_to(center));
        assert_eq!(g.core.hover().target(), HoverTarget::Button(close));
        assert_ne!(g.core.scene().get(close).unwrap().color, tint);
        assert_eq!(g.core.marker().position(g.core.scene()), None);

        g.core.hover_ray(&Ray::new(EYE, Vec3::Y));
        assert!(g.core.hover().is_idle());
        assert_eq!(g.core.scene().get(close).unwrap().color, tint);
    }

    #[test]
    fn pointer_clicks_go_through_the_camera() {
        let mut g = gallery();
        let centre = Vec2::new(640.0, 360.0);
        g.core
            .handle_input(InputEvent::Pointer(PointerEvent::pressed(centre, MouseButton::LEFT)));
        g.core.handle_input(InputEvent::Pointer(PointerEvent::released(
            centre + Vec2::new(3.0, 0.0),
            MouseButton::LEFT,
        )));
        assert!(g.core.panel().is_open());
        assert_eq!(
            g.core.handle_input(InputEvent::ContextMenu),
            InputResponse::PreventDefault
        );
    }

    #[test]
    fn controllers_select_from_their_pose() {
        let mut g = gallery();
        let mut event = ControllerEvent {
            index: 1,
            signal: ControllerSignal::Select,
            tracked: false,
            pose: Mat4::from_translation(Vec3::new(0.0, 1.6, 0.0)),
        };
        g.core.handle_input(InputEvent::Controller(event));
        assert!(!g.core.panel().is_open());

        event.tracked = true;
        g.core.handle_input(InputEvent::Controller(event));
        assert!(g.core.panel().is_open());
    }
}
