use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// What the visitor asked for when the ray was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Primary click or controller trigger.
    Select,
    /// Secondary click or controller squeeze.
    Move,
}

/// A ray in world space. The direction is always normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at distance `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray pointing down the `-Z` axis of a world transform, the way tracked
    /// controllers aim.
    pub fn from_pose(pose: &Mat4) -> Self {
        let (_, rotation, translation) = pose.to_scale_rotation_translation();
        Self::new(translation, rotation * Vec3::NEG_Z)
    }

    /// Ray from the camera through a point given in normalized device
    /// coordinates (`-1..1`, y up).
    pub fn from_ndc(ndc: Vec2, view: &Mat4, projection: &Mat4) -> Self {
        let inv_proj = projection.inverse();
        let ray_eye = inv_proj.project_point3(Vec3::new(ndc.x, ndc.y, -1.0));
        let ray_eye = Vec3::new(ray_eye.x, ray_eye.y, -1.0);

        let inv_view = view.inverse();
        let direction = inv_view.transform_vector3(ray_eye);
        let origin = inv_view.transform_point3(Vec3::ZERO);
        Self::new(origin, direction)
    }
}

/// Converts a pixel position into normalized device coordinates.
pub fn screen_to_ndc(screen: Vec2, viewport: (u32, u32)) -> Vec2 {
    let width = viewport.0.max(1) as f32;
    let height = viewport.1.max(1) as f32;
    Vec2::new(
        (2.0 * screen.x) / width - 1.0,
        1.0 - (2.0 * screen.y) / height,
    )
}
