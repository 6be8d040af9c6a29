pub mod kinematic;

pub use self::kinematic::KinematicWorld;

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn dot(&self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn scale(&self, s: f32) -> Vec2 {
        Vec2::new(self.x * s, self.y * s)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Identifies an agent inside the simulation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentId {
    Real,
    Imaginary(usize),
}

/// Pose of one limb relative to its agent's body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimbPose {
    pub angle: f32,
}

/// Full body pose: world position, heading and every limb's relative pose.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPose {
    pub position: Vec2,
    pub orientation: f32,
    pub limbs: Vec<LimbPose>,
}

/// The physics/collision collaborator. Bodies are owned by the implementor;
/// the co-evolution core only reads poses and writes actuator rates.
pub trait Simulation {
    /// Integrates motion for one time quantum.
    fn step(&mut self, dt: f32);

    fn agent_position(&self, agent: AgentId) -> Vec2;

    fn agent_orientation(&self, agent: AgentId) -> f32;

    fn set_limb_actuator_rate(&mut self, agent: AgentId, limb: usize, rate: f32);

    fn limb_pose(&self, agent: AgentId, limb: usize) -> LimbPose;

    /// Places `agent` at `pose` shifted by `offset` in world space.
    fn set_agent_pose(&mut self, agent: AgentId, pose: &AgentPose, offset: Vec2);

    /// Zeroes every velocity and actuator rate of `agent`.
    fn halt_agent_motion(&mut self, agent: AgentId);

    /// Number of imaginary bodies the world was created with.
    fn imaginary_count(&self) -> usize;

    fn agent_pose(&self, agent: AgentId, limb_count: usize) -> AgentPose {
        AgentPose {
            position: self.agent_position(agent),
            orientation: self.agent_orientation(agent),
            limbs: (0..limb_count)
                .map(|limb| self.limb_pose(agent, limb))
                .collect(),
        }
    }
}
