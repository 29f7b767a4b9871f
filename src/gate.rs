//! Interaction gate and the entrance sequence that drives it.
//!
//! While the gate reports suspended the interaction core discards input.
//! The only producer shipped here is [`IntroSequence`], which keeps the gate
//! closed while it walks the visitor in through the entrance.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Vec3;
use log::{debug, info};

use crate::config::IntroConfig;
use crate::scene::{ObjectId, Scene};
use crate::teleport::VisitorRig;

pub const DOOR_LEFT_NAME: &str = "DoorLeft";
pub const DOOR_RIGHT_NAME: &str = "DoorRight";

/// Capability query consulted before every input and every frame.
pub trait InteractionGate {
    fn is_suspended(&self) -> bool;
}

impl<F> InteractionGate for F
where
    F: Fn() -> bool,
{
    fn is_suspended(&self) -> bool {
        self()
    }
}

/// Shared suspension flag. Clones observe the same value.
#[derive(Debug, Clone, Default)]
pub struct GateHandle {
    suspended: Arc<AtomicBool>,
}

impl GateHandle {
    pub fn new(suspended: bool) -> Self {
        Self {
            suspended: Arc::new(AtomicBool::new(suspended)),
        }
    }

    pub fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Release);
    }
}

impl InteractionGate for GateHandle {
    fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }
}

/// Linear walk of the rig from the street to inside the gallery.
#[derive(Debug, Clone)]
pub struct IntroSequence {
    start: Vec3,
    target: Vec3,
    step: f32,
    progress: f32,
    running: bool,
    gate: GateHandle,
}

impl IntroSequence {
    /// Starts the sequence and suspends `gate` until it finishes.
    pub fn new(config: &IntroConfig, gate: GateHandle) -> Self {
        gate.set_suspended(true);
        Self {
            start: config.start,
            target: config.target,
            step: config.step,
            progress: 0.0,
            running: true,
            gate,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn progress(&self) -> f32 {
        self.progress.min(1.0)
    }

    /// Advances one frame. Returns true while the sequence is still running.
    pub fn advance(&mut self, scene: &mut Scene, rig: &VisitorRig) -> bool {
        if !self.running {
            return false;
        }
        self.progress += self.step;
        if self.progress <= 1.0 {
            rig.set_position(scene, self.start.lerp(self.target, self.progress));
        } else {
            self.running = false;
            self.gate.set_suspended(false);
            info!("Intro finished, interaction enabled");
        }
        self.running
    }

    /// Ends the sequence immediately with the rig at the target.
    pub fn skip(&mut self, scene: &mut Scene, rig: &VisitorRig) {
        if self.running {
            rig.set_position(scene, self.target);
            self.progress = 1.0;
            self.running = false;
            self.gate.set_suspended(false);
            debug!("Intro skipped");
        }
    }
}

/// Sliding entrance doors that open while the intro passes through them.
#[derive(Debug, Clone)]
pub struct Doors {
    left: ObjectId,
    right: ObjectId,
    entrance: Vec3,
    threshold: f32,
    speed: f32,
    open_x: f32,
    closed_x: f32,
}

impl Doors {
    /// Finds `DoorLeft` and `DoorRight`; both must exist.
    pub fn find(scene: &Scene, config: &IntroConfig) -> Option<Self> {
        Some(Self {
            left: scene.find_by_name(DOOR_LEFT_NAME)?,
            right: scene.find_by_name(DOOR_RIGHT_NAME)?,
            entrance: config.entrance,
            threshold: config.door_threshold,
            speed: config.door_speed,
            open_x: config.door_open_x,
            closed_x: config.door_closed_x,
        })
    }

    /// Moves both doors one step: towards open while `opening` and the rig
    /// is near the entrance, towards closed otherwise.
    pub fn update(&self, scene: &mut Scene, rig_position: Vec3, opening: bool) {
        let near = rig_position.distance(self.entrance) < self.threshold;
        let step = if opening && near {
            DoorStep::Open
        } else {
            DoorStep::Close
        };
        self.slide(scene, self.left, -1.0, step);
        self.slide(scene, self.right, 1.0, step);
    }

    pub fn offsets(&self, scene: &Scene) -> Option<(f32, f32)> {
        let left = scene.get(self.left)?.transform.position.x;
        let right = scene.get(self.right)?.transform.position.x;
        Some((left, right))
    }

    fn slide(&self, scene: &mut Scene, door: ObjectId, side: f32, step: DoorStep) {
        let Some(object) = scene.get_mut(door) else {
            return;
        };
        // Work on the distance from the centre line; `side` restores the sign.
        let x = object.transform.position.x * side;
        let x = match step {
            DoorStep::Open if x < self.open_x => x + self.speed,
            DoorStep::Close if x > self.closed_x => x - self.speed,
            _ => x,
        };
        object.transform.position.x = x * side;
    }
}

#[derive(Debug, Clone, Copy)]
enum DoorStep {
    Open,
    Close,
}
