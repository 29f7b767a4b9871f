use std::sync::Arc;

use glam::Vec3;
use log::info;
use parking_lot::RwLock;

use crate::config::GalleryConfig;
use crate::gate::{Doors, GateHandle, IntroSequence};
use crate::hover::HoverState;
use crate::interaction::InteractionCore;
use crate::narration::Narrator;
use crate::panel::PanelState;
use crate::scene::{ObjectId, Scene};

/// Provides viewport dimensions for pointer rays.
pub trait ViewportProvider: Send + Sync {
    fn viewport_size(&self) -> (u32, u32);
}

/// Simple viewport that always reports the same resolution.
#[derive(Debug, Clone, Copy)]
pub struct StaticViewport {
    pub width: u32,
    pub height: u32,
}

impl StaticViewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ViewportProvider for StaticViewport {
    fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl<T> ViewportProvider for Arc<T>
where
    T: ViewportProvider + ?Sized,
{
    fn viewport_size(&self) -> (u32, u32) {
        (**self).viewport_size()
    }
}

/// Viewport that follows window resizes.
#[derive(Debug)]
pub struct WindowViewport {
    size: RwLock<(u32, u32)>,
}

impl WindowViewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: RwLock::new((width, height)),
        }
    }

    pub fn update(&self, width: u32, height: u32) {
        *self.size.write() = (width.max(1), height.max(1));
    }
}

impl ViewportProvider for WindowViewport {
    fn viewport_size(&self) -> (u32, u32) {
        *self.size.read()
    }
}

/// The interaction core plus the frame-driven parts around it: the
/// entrance sequence, the doors and the resizable viewport.
pub struct Gallery {
    core: InteractionCore,
    viewport: Arc<WindowViewport>,
    intro: IntroSequence,
    doors: Option<Doors>,
}

impl Gallery {
    pub fn new(
        scene: Scene,
        config: GalleryConfig,
        narrator: impl Narrator + 'static,
        skip_intro: bool,
    ) -> Self {
        let viewport = Arc::new(WindowViewport::new(
            config.viewport.width,
            config.viewport.height,
        ));
        let doors = Doors::find(&scene, &config.intro);
        let gate = GateHandle::default();
        let mut intro = IntroSequence::new(&config.intro, gate.clone());
        let start = config.intro.start;

        let mut core = InteractionCore::new(scene, config, viewport.clone(), start)
            .with_gate(gate)
            .with_narrator(narrator);
        if skip_intro {
            let rig = core.rig().clone();
            intro.skip(core.scene_mut(), &rig);
            core.update_frame();
            core.drain_events();
        }
        Self {
            core,
            viewport,
            intro,
            doors,
        }
    }

    pub fn core(&self) -> &InteractionCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut InteractionCore {
        &mut self.core
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.viewport.update(width, height);
    }

    pub fn intro_running(&self) -> bool {
        self.intro.is_running()
    }

    /// Advances the intro and the doors by one frame, then lets the core
    /// notice gate changes.
    pub fn frame(&mut self) {
        let rig = self.core.rig().clone();
        self.intro.advance(self.core.scene_mut(), &rig);
        let opening = self.intro_running();
        if let Some(doors) = &self.doors {
            let position = self.core.rig_position();
            doors.update(self.core.scene_mut(), position, opening);
        }
        self.core.update_frame();
    }

    /// Runs frames until the intro is over. Returns how many it took.
    pub fn finish_intro(&mut self) -> usize {
        let mut frames = 0;
        while self.intro_running() {
            self.frame();
            frames += 1;
        }
        if frames > 0 {
            info!("Intro completed after {frames} frames");
        }
        frames
    }
}

pub fn print_final_state(gallery: &Gallery) {
    let core = gallery.core();
    let scene = core.scene();
    let rig = core.rig_position();
    println!("Final state:");
    println!(" - rig pos=({:.2}, {:.2}, {:.2})", rig.x, rig.y, rig.z);
    match core.panel() {
        PanelState::Closed => println!(" - panel closed"),
        PanelState::Open(open) => println!(
            " - panel open title=\"{}\" zoom={:.2}",
            open.title.text(),
            open.zoom
        ),
    }
    match core.hover() {
        HoverState::Idle => println!(" - hover idle"),
        HoverState::Interactable { object, .. } => {
            println!(" - hover artwork {}", object_name(scene, object))
        }
        HoverState::Button { button, .. } => {
            println!(" - hover button {}", object_name(scene, button))
        }
    }
    match core.marker().position(scene) {
        Some(Vec3 { x, y, z }) => println!(" - marker at ({x:.2}, {y:.2}, {z:.2})"),
        None => println!(" - marker hidden"),
    }
}

fn object_name(scene: &Scene, id: ObjectId) -> &str {
    scene.get(id).map_or("<removed>", |object| object.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{DOOR_LEFT_NAME, DOOR_RIGHT_NAME};
    use crate::narration::NullNarrator;
    use crate::scene::SceneObject;

    fn scene_with_doors() -> Scene {
        let mut scene = Scene::new();
        scene.add(
            SceneObject::new(DOOR_LEFT_NAME).with_position(Vec3::new(-1.125, 2.0, 25.0)),
            None,
        );
        scene.add(
            SceneObject::new(DOOR_RIGHT_NAME).with_position(Vec3::new(1.125, 2.0, 25.0)),
            None,
        );
        scene
    }

    #[test]
    fn window_viewport_clamps_to_one_pixel() {
        let viewport = WindowViewport::new(800, 600);
        viewport.update(0, 0);
        assert_eq!(viewport.viewport_size(), (1, 1));
    }

    #[test]
    fn intro_suspends_the_core_until_it_ends() {
        let mut gallery = Gallery::new(
            scene_with_doors(),
            GalleryConfig::default(),
            NullNarrator,
            false,
        );
        assert!(gallery.core().is_suspended());
        assert_eq!(gallery.core().rig_position(), Vec3::new(0.0, 0.0, 50.0));

        let frames = gallery.finish_intro();
        assert!(frames > 390);
        assert!(!gallery.core().is_suspended());
        assert!((gallery.core().rig_position().z - 20.0).abs() < 0.1);
    }

    #[test]
    fn skipping_the_intro_starts_inside() {
        let gallery = Gallery::new(Scene::new(), GalleryConfig::default(), NullNarrator, true);
        assert!(!gallery.core().is_suspended());
        assert!(!gallery.intro_running());
        assert_eq!(gallery.core().rig_position(), Vec3::new(0.0, 0.0, 20.0));
    }
}
