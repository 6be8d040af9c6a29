use super::{AgentId, AgentPose, LimbPose, Simulation, Vec2};
use std::f32::consts::PI;

// Forward speed produced per unit of grounded sweep rate.
const STRIDE_GAIN: f32 = 30.0;
const TURN_GAIN: f32 = 0.4;
// Fraction of speed kept between steps.
const DAMPING: f32 = 0.8;

#[derive(Debug, Clone, Default)]
struct Joint {
    angle: f32,
    rate: f32,
}

#[derive(Debug, Clone)]
struct Body {
    position: Vec2,
    orientation: f32,
    speed: f32,
    yaw_rate: f32,
    joints: Vec<Joint>,
}

impl Body {
    fn new(position: Vec2, limb_count: usize) -> Self {
        Self {
            position,
            orientation: 0.0,
            speed: 0.0,
            yaw_rate: 0.0,
            joints: vec![Joint::default(); limb_count],
        }
    }

    fn integrate(&mut self, dt: f32) {
        let mut left = 0.0;
        let mut right = 0.0;

        for (i, joint) in self.joints.iter_mut().enumerate() {
            let grounded = joint.angle.cos();
            if grounded > 0.0 {
                // A grounded foot pushes the body opposite to its sweep
                let push = -joint.rate * grounded * STRIDE_GAIN;
                if i % 2 == 0 {
                    left += push;
                } else {
                    right += push;
                }
            }
            joint.angle = wrap_angle(joint.angle + joint.rate * dt);
        }

        self.speed = self.speed * DAMPING + (left + right) * (1.0 - DAMPING);
        self.yaw_rate = self.yaw_rate * DAMPING
            + (right - left) / STRIDE_GAIN * TURN_GAIN * (1.0 - DAMPING);

        self.orientation = wrap_angle(self.orientation + self.yaw_rate * dt);
        self.position = self.position + Vec2::from_angle(self.orientation).scale(self.speed * dt);
    }
}

fn wrap_angle(a: f32) -> f32 {
    let mut a = a % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Deterministic stand-in for a physics engine: limbs are single revolute
/// joints, grounded feet (`cos(angle) > 0`) generate thrust, and left/right
/// thrust asymmetry yaws the body. Imaginary agents never interact with the
/// real one.
#[derive(Debug, Clone)]
pub struct KinematicWorld {
    limb_count: usize,
    real: Body,
    imaginary: Vec<Body>,
    elapsed: f32,
}

impl KinematicWorld {
    pub fn new(limb_count: usize, imaginary_count: usize, real_start: Vec2) -> Self {
        Self {
            limb_count,
            real: Body::new(real_start, limb_count),
            imaginary: (0..imaginary_count)
                .map(|_| Body::new(Vec2::ZERO, limb_count))
                .collect(),
            elapsed: 0.0,
        }
    }

    pub fn limb_count(&self) -> usize {
        self.limb_count
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn body(&self, agent: AgentId) -> &Body {
        match agent {
            AgentId::Real => &self.real,
            AgentId::Imaginary(i) => &self.imaginary[i],
        }
    }

    fn body_mut(&mut self, agent: AgentId) -> &mut Body {
        match agent {
            AgentId::Real => &mut self.real,
            AgentId::Imaginary(i) => &mut self.imaginary[i],
        }
    }
}

impl Simulation for KinematicWorld {
    fn step(&mut self, dt: f32) {
        self.real.integrate(dt);
        for body in &mut self.imaginary {
            body.integrate(dt);
        }
        self.elapsed += dt;
    }

    fn agent_position(&self, agent: AgentId) -> Vec2 {
        self.body(agent).position
    }

    fn agent_orientation(&self, agent: AgentId) -> f32 {
        self.body(agent).orientation
    }

    fn set_limb_actuator_rate(&mut self, agent: AgentId, limb: usize, rate: f32) {
        self.body_mut(agent).joints[limb].rate = rate;
    }

    fn limb_pose(&self, agent: AgentId, limb: usize) -> LimbPose {
        LimbPose {
            angle: self.body(agent).joints[limb].angle,
        }
    }

    fn set_agent_pose(&mut self, agent: AgentId, pose: &AgentPose, offset: Vec2) {
        let body = self.body_mut(agent);
        body.position = pose.position + offset;
        body.orientation = pose.orientation;
        for (joint, limb) in body.joints.iter_mut().zip(&pose.limbs) {
            joint.angle = limb.angle;
        }
    }

    fn halt_agent_motion(&mut self, agent: AgentId) {
        let body = self.body_mut(agent);
        body.speed = 0.0;
        body.yaw_rate = 0.0;
        for joint in &mut body.joints {
            joint.rate = 0.0;
        }
    }

    fn imaginary_count(&self) -> usize {
        self.imaginary.len()
    }
}
