//! Ray casts against the scene with the exclusion and priority rules of the
//! interaction core.
//!
//! Hits are always consumed in ascending distance order. The only way a hit
//! is skipped is through the filter pipeline:
//!
//! 1. dimmer and rig hits are dropped unconditionally;
//! 2. while a panel is open only the panel subtree is considered;
//! 3. otherwise an obstacle in front suppresses everything behind it.

use glam::Vec3;

use crate::hover::HoverTarget;
use crate::ray::Ray;
use crate::role::Role;
use crate::scene::{ObjectId, Scene};

/// One intersection between a ray and a scene object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub object: ObjectId,
    /// World-space intersection point.
    pub point: Vec3,
    pub distance: f32,
}

/// A hit together with the role resolved for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedHit {
    pub hit: Hit,
    pub role: Role,
    /// Object carrying the behaviour (the button for a button label).
    pub target: ObjectId,
}

/// Result of a filtered cast used by select and move actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CastOutcome {
    /// Nothing left after filtering.
    Miss,
    /// The nearest hit is an obstacle; nothing behind it may be acted on.
    Blocked(Hit),
    Hit(ResolvedHit),
}

/// What a pointer-move ray is over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverSample {
    pub target: HoverTarget,
    /// Nearest unobstructed floor point, for the teleport marker.
    pub floor: Option<Vec3>,
}

impl HoverSample {
    const NOTHING: Self = Self {
        target: HoverTarget::Nothing,
        floor: None,
    };
}

/// Casts rays, reusing one hit buffer across calls.
#[derive(Debug, Default)]
pub struct HitTester {
    hits: Vec<Hit>,
}

impl HitTester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distance-sorted hits with dimmer and rig hits removed. When `panel`
    /// is set only the panel subtree is intersected.
    pub fn cast(&mut self, scene: &Scene, ray: &Ray, panel: Option<ObjectId>) -> &[Hit] {
        scene.intersect_into(ray, panel, &mut self.hits);
        self.hits.retain(|hit| !scene.role(hit.object).is_excluded());
        &self.hits
    }

    /// Resolves the hit that decides a select or move action.
    pub fn resolve(&mut self, scene: &Scene, ray: &Ray, panel: Option<ObjectId>) -> CastOutcome {
        let hits = self.cast(scene, ray, panel);
        if panel.is_some() {
            return hits
                .iter()
                .filter_map(|hit| resolve(scene, *hit))
                .find(|resolved| resolved.role == Role::Button)
                .map_or(CastOutcome::Miss, CastOutcome::Hit);
        }

        let Some(first) = hits.first().copied() else {
            return CastOutcome::Miss;
        };
        match resolve(scene, first) {
            Some(resolved) if resolved.role == Role::Obstacle => CastOutcome::Blocked(first),
            Some(resolved) => CastOutcome::Hit(resolved),
            None => CastOutcome::Miss,
        }
    }

    /// Works out what the pointer hovers.
    ///
    /// Inside an open panel only buttons count. In the world, hits are cut
    /// at the first obstacle; an interactable anywhere before that cut wins
    /// over a floor, even a nearer one, so artwork highlighting does not
    /// flicker because of the floor in front of it.
    pub fn sample_hover(
        &mut self,
        scene: &Scene,
        ray: &Ray,
        panel: Option<ObjectId>,
    ) -> HoverSample {
        if panel.is_some() {
            return match self.resolve(scene, ray, panel) {
                CastOutcome::Hit(resolved) => HoverSample {
                    target: HoverTarget::Button(resolved.target),
                    floor: None,
                },
                _ => HoverSample::NOTHING,
            };
        }

        let mut interactable = None;
        let mut floor = None;
        for resolved in self.cast(scene, ray, None).iter().filter_map(|h| resolve(scene, *h)) {
            match resolved.role {
                Role::Obstacle => break,
                Role::Interactable if interactable.is_none() => {
                    interactable = Some(resolved.target)
                }
                Role::Floor if floor.is_none() => floor = Some(resolved.hit.point),
                _ => {}
            }
        }

        match interactable {
            Some(object) => HoverSample {
                target: HoverTarget::Interactable(object),
                floor: None,
            },
            None => HoverSample {
                target: HoverTarget::Nothing,
                floor,
            },
        }
    }
}

fn resolve(scene: &Scene, hit: Hit) -> Option<ResolvedHit> {
    scene.classification(hit.object).map(|class| ResolvedHit {
        hit,
        role: class.role,
        target: class.target,
    })
}
