use crate::config::{HeadingMode, WorldParams};
use crate::consts::{FITNESS_DECIMALS, NOT_FIT};
use crate::genome::{Genome, Population};
use crate::sim::{AgentPose, Simulation, Vec2};

#[inline(always)]
pub fn round_fitness(value: f32) -> f32 {
    let scale = 10f32.powi(FITNESS_DECIMALS);
    (value * scale).round() / scale
}

/// Maps displacement since generation start to a scalar score.
/// Movement against (or perpendicular to) the sanctioned heading scores
/// `NOT_FIT` rather than a negative value, so arg-max selection stays well defined.
#[derive(Debug, Clone, Copy)]
pub struct FitnessEvaluator {
    pub heading: f32,
    pub mode: HeadingMode,
}

impl FitnessEvaluator {
    pub fn new(heading: f32, mode: HeadingMode) -> Self {
        Self { heading, mode }
    }

    pub fn target_direction(&self, start: &AgentPose) -> Vec2 {
        match self.mode {
            HeadingMode::World => Vec2::from_angle(self.heading),
            HeadingMode::Body => Vec2::from_angle(start.orientation + self.heading),
        }
    }

    pub fn evaluate(&self, start: &AgentPose, current: Vec2) -> f32 {
        let displacement = current - start.position;
        if displacement.dot(self.target_direction(start)) > 0.0 {
            round_fitness(displacement.length())
        } else {
            NOT_FIT
        }
    }

    /// Signed distance travelled from `origin` along the world heading.
    pub fn progress(&self, origin: Vec2, position: Vec2) -> f32 {
        (position - origin).dot(Vec2::from_angle(self.heading))
    }

    /// Scores every member against the pose captured at its generation start.
    /// Members without a captured start pose score `NOT_FIT`.
    pub fn score_population<S: Simulation>(&self, sim: &S, population: &Population) -> Vec<f32> {
        population
            .agents
            .iter()
            .map(|agent| match &agent.start {
                Some(start) => self.evaluate(start, sim.agent_position(agent.id)),
                None => NOT_FIT,
            })
            .collect()
    }
}

impl From<&WorldParams> for FitnessEvaluator {
    fn from(w: &WorldParams) -> Self {
        FitnessEvaluator::new(w.target_heading, w.heading_mode)
    }
}

/// Per-generation scores plus the running epoch best.
#[derive(Debug, Clone, Default)]
pub struct FitnessRecord {
    pub scores: Vec<f32>,
    pub current_best: f32,
    pub current_fittest: Option<usize>,
    pub epoch_best: f32,
    pub epoch_fittest: Option<usize>,
    /// Copy of the epoch-best genome, kept even if its owner is later overwritten.
    pub epoch_best_genome: Option<Genome>,
    /// Set once a member scores above `NOT_FIT` during the current epoch.
    pub ever_fit: Vec<bool>,
}

impl FitnessRecord {
    pub fn new(size: usize) -> Self {
        Self {
            scores: vec![NOT_FIT; size],
            current_best: NOT_FIT,
            current_fittest: None,
            epoch_best: NOT_FIT,
            epoch_fittest: None,
            epoch_best_genome: None,
            ever_fit: vec![false; size],
        }
    }

    pub fn reset_epoch(&mut self) {
        let size = self.scores.len();
        *self = FitnessRecord::new(size);
    }

    /// Stores this generation's scores and updates current/epoch bests.
    pub fn record(&mut self, scores: &[f32], genomes: &[Genome]) {
        assert_eq!(scores.len(), genomes.len(), "fitness/genome count mismatch");
        if self.scores.len() != scores.len() {
            *self = FitnessRecord::new(scores.len());
        }
        self.scores.copy_from_slice(scores);

        self.current_best = NOT_FIT;
        self.current_fittest = None;
        for (i, &s) in scores.iter().enumerate() {
            if s > NOT_FIT {
                self.ever_fit[i] = true;
            }
            if s > self.current_best {
                self.current_best = s;
                self.current_fittest = Some(i);
            }
        }

        if let Some(idx) = self.current_fittest {
            if self.current_best > self.epoch_best {
                self.epoch_best = self.current_best;
                self.epoch_fittest = Some(idx);
                self.epoch_best_genome = Some(genomes[idx].clone());
            }
        }
    }

    pub fn any_fit_this_epoch(&self) -> bool {
        self.ever_fit.iter().any(|&f| f)
    }

    /// The epoch-best genome, or `empty` when no member was ever fit.
    pub fn fittest_genome_or(&self, empty: Genome) -> Genome {
        self.epoch_best_genome.clone().unwrap_or(empty)
    }
}
