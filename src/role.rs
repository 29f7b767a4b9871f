//! Semantic roles of scene objects.
//!
//! Environment builders tag objects through names (`WorldFloor`, `Obstacle`,
//! `GlobalDimmer`, `VisitorRig`) or an explicit tag. The role of an object is
//! resolved once, when it is inserted into the [`Scene`](crate::scene::Scene),
//! from its own tags and the already-resolved role of its parent.

use serde::{Deserialize, Serialize};

use crate::scene::{ObjectId, SceneObject};

pub const FLOOR_NAME: &str = "WorldFloor";
pub const OBSTACLE_NAME: &str = "Obstacle";
pub const DIMMER_NAME: &str = "GlobalDimmer";
pub const RIG_NAME: &str = "VisitorRig";

/// What an object means to the interaction core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Walkable surface, eligible as a teleport destination.
    Floor,
    /// Blocks hover, selection and teleport of anything behind it.
    Obstacle,
    /// Carries artwork metadata and opens a detail panel when selected.
    Interactable,
    /// Panel control carrying an action.
    Button,
    /// Full-view overlay shown behind an open panel. Never hit.
    Dimmer,
    /// Part of the visitor's own subtree. Never hit.
    Rig,
    None,
}

impl Role {
    /// Roles dropped from every hit list before any other filtering.
    pub fn is_excluded(self) -> bool {
        matches!(self, Role::Dimmer | Role::Rig)
    }
}

/// Resolved role together with the object that carries the behaviour.
///
/// For most objects `target` is the object itself; a mesh nested under a
/// button resolves to the button so that hitting the label selects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub role: Role,
    pub target: ObjectId,
}

/// Classifies a freshly inserted object given its parent's classification.
pub fn classify(
    id: ObjectId,
    object: &SceneObject,
    parent: Option<Classification>,
) -> Classification {
    let parent_role = parent.map(|p| p.role);
    let own = |role| Classification { role, target: id };

    if parent_role == Some(Role::Rig) || has_tag(object, RIG_NAME, "rig") {
        return own(Role::Rig);
    }
    if has_tag(object, DIMMER_NAME, "dimmer") {
        return own(Role::Dimmer);
    }
    if parent_role == Some(Role::Obstacle) || has_tag(object, OBSTACLE_NAME, "obstacle") {
        return own(Role::Obstacle);
    }
    if object.button.is_some() {
        return own(Role::Button);
    }
    if let Some(parent) = parent.filter(|p| p.role == Role::Button) {
        return parent;
    }
    if object.artwork.is_some() {
        return own(Role::Interactable);
    }
    if has_tag(object, FLOOR_NAME, "floor") {
        return own(Role::Floor);
    }
    own(Role::None)
}

fn has_tag(object: &SceneObject, name: &str, tag: &str) -> bool {
    object.name == name
        || object
            .tag
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case(tag))
}
