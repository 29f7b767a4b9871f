//! Helper objects owned by the interaction core: the dimmer shown behind an
//! open panel and the ring marking where a teleport would land.

use glam::{Quat, Vec3};

use crate::role::DIMMER_NAME;
use crate::scene::{ObjectId, Scene, SceneObject, Shape};

pub const MARKER_NAME: &str = "TeleportMarker";

const DIMMER_RADIUS: f32 = 2.0;
const MARKER_SIZE: f32 = 0.5;

/// Dark sphere around the visitor's head. Visible exactly while a panel is open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimmer {
    pub object: ObjectId,
}

impl Dimmer {
    pub fn install(scene: &mut Scene, rig: ObjectId, eye_height: f32) -> Self {
        let object = scene.add(
            SceneObject::new(DIMMER_NAME)
                .with_shape(Shape::Sphere {
                    radius: DIMMER_RADIUS,
                })
                .with_position(Vec3::new(0.0, eye_height, 0.0))
                .with_color(Vec3::ZERO)
                .hidden(),
            Some(rig),
        );
        Self { object }
    }

    pub fn is_visible(&self, scene: &Scene) -> bool {
        scene.get(self.object).is_some_and(|o| o.visible)
    }

    /// Returns true when the visibility actually changed.
    pub fn set_visible(&self, scene: &mut Scene, visible: bool) -> bool {
        match scene.get_mut(self.object) {
            Some(object) if object.visible != visible => {
                object.visible = visible;
                true
            }
            _ => false,
        }
    }
}

/// Flat ring lying on the floor under the pointer. Never hit by rays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeleportMarker {
    pub object: ObjectId,
    lift: f32,
}

impl TeleportMarker {
    pub fn install(scene: &mut Scene, lift: f32) -> Self {
        let object = scene.add(
            SceneObject::new(MARKER_NAME)
                .with_shape(Shape::Plane {
                    width: MARKER_SIZE,
                    height: MARKER_SIZE,
                })
                .with_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2))
                .non_raycastable()
                .hidden(),
            None,
        );
        Self { object, lift }
    }

    /// Current position if the marker is shown.
    pub fn position(&self, scene: &Scene) -> Option<Vec3> {
        scene
            .get(self.object)
            .filter(|o| o.visible)
            .map(|o| o.transform.position)
    }

    /// Shows the marker just above `point` and returns where it went.
    pub fn place(&self, scene: &mut Scene, point: Vec3) -> Vec3 {
        let position = point + Vec3::Y * self.lift;
        if let Some(marker) = scene.get_mut(self.object) {
            marker.transform.position = position;
            marker.visible = true;
        }
        position
    }

    /// Returns true when the marker was visible.
    pub fn hide(&self, scene: &mut Scene) -> bool {
        match scene.get_mut(self.object) {
            Some(marker) if marker.visible => {
                marker.visible = false;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ray::Ray;
    use crate::role::RIG_NAME;

    #[test]
    fn dimmer_hangs_under_the_rig_and_is_never_hit() {
        let mut scene = Scene::new();
        let rig = scene.add(
            SceneObject::new(RIG_NAME).with_position(Vec3::new(0.0, 0.0, 20.0)),
            None,
        );
        let dimmer = Dimmer::install(&mut scene, rig, 1.6);
        assert!(!dimmer.is_visible(&scene));
        assert!(dimmer.set_visible(&mut scene, true));
        assert!(!dimmer.set_visible(&mut scene, true));
        assert!(scene.role(dimmer.object).is_excluded());
        assert_eq!(
            scene.world_position(dimmer.object),
            Vec3::new(0.0, 1.6, 20.0)
        );
    }

    #[test]
    fn marker_is_lifted_and_not_raycastable() {
        let mut scene = Scene::new();
        let marker = TeleportMarker::install(&mut scene, 0.02);
        assert_eq!(marker.position(&scene), None);

        let placed = marker.place(&mut scene, Vec3::new(1.0, 0.0, -3.0));
        assert_eq!(placed, Vec3::new(1.0, 0.02, -3.0));
        assert_eq!(marker.position(&scene), Some(placed));

        let ray = Ray::new(Vec3::new(1.0, 5.0, -3.0), Vec3::NEG_Y);
        assert!(scene.intersect(&ray, None).is_empty());

        assert!(marker.hide(&mut scene));
        assert!(!marker.hide(&mut scene));
    }
}
