//! Visitor rig, camera and floor teleport.

use glam::{Mat4, Vec2, Vec3};
use log::{debug, info};

use crate::config::CameraConfig;
use crate::ray::Ray;
use crate::role::RIG_NAME;
use crate::scene::{ObjectId, Scene, SceneObject};

/// First-person camera carried by the rig.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Height of the eye above the rig origin.
    pub eye_height: f32,
    /// Rotation around the world Y axis in radians; zero looks down `-Z`.
    pub yaw: f32,
    /// Rotation around the camera's X axis in radians; positive looks up.
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl Camera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            eye_height: config.eye_height,
            yaw: 0.0,
            pitch: 0.0,
            fov: config.fov.to_radians(),
            near: config.near,
            far: config.far,
        }
    }

    /// Direction the camera looks in.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            -self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            -self.yaw.cos() * self.pitch.cos(),
        )
    }

    /// Points the camera; pitch is kept short of straight up or down.
    pub fn look(&mut self, yaw: f32, pitch: f32) {
        let limit = 89f32.to_radians();
        self.yaw = yaw;
        self.pitch = pitch.clamp(-limit, limit);
    }

    pub fn view_matrix(&self, eye: Vec3) -> Mat4 {
        Mat4::look_at_rh(eye, eye + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, aspect.max(0.01), self.near, self.far)
    }
}

/// The visitor's root object. Everything under it (camera, controllers,
/// dimmer) moves with it and is never hit by the visitor's own rays.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitorRig {
    pub root: ObjectId,
    pub camera: Camera,
}

impl VisitorRig {
    /// Uses the scene's `VisitorRig` object, or creates one at `start`.
    pub fn install(scene: &mut Scene, start: Vec3, camera: Camera) -> Self {
        let root = match scene.find_by_name(RIG_NAME) {
            Some(root) => {
                debug!("Using visitor rig from scene");
                root
            }
            None => scene.add(SceneObject::new(RIG_NAME).with_position(start), None),
        };
        Self { root, camera }
    }

    /// Rig origin on the ground.
    pub fn position(&self, scene: &Scene) -> Vec3 {
        scene.world_position(self.root)
    }

    /// Places the rig origin at a world position, whatever the rig's parent.
    pub fn set_position(&self, scene: &mut Scene, position: Vec3) {
        let local = match scene.get(self.root).and_then(SceneObject::parent) {
            Some(parent) => scene
                .world_matrix(parent)
                .inverse()
                .transform_point3(position),
            None => position,
        };
        if let Some(rig) = scene.get_mut(self.root) {
            rig.transform.position = local;
        }
    }

    pub fn eye(&self, scene: &Scene) -> Vec3 {
        self.position(scene) + Vec3::Y * self.camera.eye_height
    }

    /// World transform of the rig, used to place tracked controllers.
    pub fn matrix(&self, scene: &Scene) -> Mat4 {
        scene.world_matrix(self.root)
    }

    /// Camera ray through a point in normalized device coordinates.
    pub fn camera_ray(&self, scene: &Scene, ndc: Vec2, aspect: f32) -> Ray {
        let view = self.camera.view_matrix(self.eye(scene));
        let projection = self.camera.projection_matrix(aspect);
        Ray::from_ndc(ndc, &view, &projection)
    }

    /// Moves the rig horizontally onto `point`. The rig keeps its height.
    /// Returns the new rig position.
    pub fn teleport(&self, scene: &mut Scene, point: Vec3) -> Vec3 {
        let current = self.position(scene);
        let offset = teleport_offset(current, point);
        // Adding the offset back can round; land on the hit's x/z exactly.
        let target = Vec3::new(point.x, current.y + offset.y, point.z);
        self.set_position(scene, target);
        info!(
            "Teleported to ({:.2}, {:.2}, {:.2})",
            target.x, target.y, target.z
        );
        target
    }
}

/// Horizontal offset that carries `rig` over `point`.
pub fn teleport_offset(rig: Vec3, point: Vec3) -> Vec3 {
    let mut offset = point - rig;
    offset.y = 0.0;
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn teleport_keeps_height_and_lands_on_the_hit() {
        let mut scene = Scene::new();
        let rig = VisitorRig::install(&mut scene, Vec3::new(0.3, 0.0, 20.0), Camera::default());
        let point = Vec3::new(-7.1, 0.001, 3.3);
        let landed = rig.teleport(&mut scene, point);
        assert_eq!(landed.x, point.x);
        assert_eq!(landed.z, point.z);
        assert_eq!(landed.y, 0.0);
        assert_eq!(rig.position(&scene), landed);
    }

    #[test]
    fn nested_rig_teleports_in_world_space() {
        let mut scene = Scene::new();
        let outer = scene.add(
            SceneObject::new("Outer").with_position(Vec3::new(10.0, 0.0, 0.0)),
            None,
        );
        scene.add(SceneObject::new(RIG_NAME), Some(outer));
        let rig = VisitorRig::install(&mut scene, Vec3::ZERO, Camera::default());
        assert_eq!(rig.position(&scene), Vec3::new(10.0, 0.0, 0.0));

        let landed = rig.teleport(&mut scene, Vec3::new(2.0, 0.0, 3.0));
        assert_eq!(landed, Vec3::new(2.0, 0.0, 3.0));
        assert!((rig.position(&scene) - landed).length() < 1e-5);
        let local = scene.get(rig.root).unwrap().transform.position;
        assert!((local - Vec3::new(-8.0, 0.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn existing_rig_is_reused() {
        let mut scene = Scene::new();
        let existing = scene.add(
            SceneObject::new(RIG_NAME).with_position(Vec3::new(1.0, 0.0, 2.0)),
            None,
        );
        let rig = VisitorRig::install(&mut scene, Vec3::ZERO, Camera::default());
        assert_eq!(rig.root, existing);
        assert_eq!(rig.eye(&scene), Vec3::new(1.0, 1.6, 2.0));
    }

    #[test]
    fn camera_forward_follows_yaw_and_pitch() {
        let mut camera = Camera::default();
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-6);
        camera.look(FRAC_PI_2, 0.0);
        assert!((camera.forward() - Vec3::NEG_X).length() < 1e-6);
        camera.look(0.0, 2.0);
        assert!(camera.forward().y < 1.0 && camera.forward().y > 0.99);
    }

    #[test]
    fn centre_ray_starts_at_the_eye() {
        let mut scene = Scene::new();
        let rig = VisitorRig::install(&mut scene, Vec3::new(0.0, 0.0, 20.0), Camera::default());
        let ray = rig.camera_ray(&scene, Vec2::ZERO, 16.0 / 9.0);
        assert!((ray.origin - Vec3::new(0.0, 1.6, 20.0)).length() < 1e-4);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
    }
}
