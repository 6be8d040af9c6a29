use crate::config::RateParams;
use crate::sim::{AgentId, AgentPose};
use fastrand::Rng;
use serde::{Deserialize, Serialize};

/// Flattened actuator-rate vector of one agent, limb-major then sequence position.
pub type Genome = Vec<f32>;

/// The legal actuator-rate set: `min, min + step, ...` up to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateDomain {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl RateDomain {
    pub fn new(min: f32, max: f32, step: f32) -> Self {
        assert!(step > 0.0 && max >= min, "empty rate domain");
        Self { min, max, step }
    }

    /// Number of lattice points in the domain.
    pub fn levels(&self) -> usize {
        ((self.max - self.min) / self.step + 1e-4).floor() as usize + 1
    }

    pub fn sample(&self, rng: &mut Rng) -> f32 {
        self.min + rng.usize(0..self.levels()) as f32 * self.step
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Rounds a mutation delta onto the lattice spacing, halves to even.
    pub fn quantize(&self, delta: f32) -> f32 {
        (delta / self.step).round_ties_even() * self.step
    }
}

impl From<&RateParams> for RateDomain {
    fn from(p: &RateParams) -> Self {
        RateDomain::new(p.rate_min, p.rate_max, p.rate_step)
    }
}

/// Per-limb rate sequence, replayed once per generation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Limb {
    pub experience: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub limbs: Vec<Limb>,
    /// Pose captured at generation start; fitness measures displacement from it.
    pub start: Option<AgentPose>,
}

impl Agent {
    pub fn new(id: AgentId, limb_count: usize, seq_len: usize) -> Self {
        Self {
            id,
            limbs: vec![
                Limb {
                    experience: vec![0.0; seq_len],
                };
                limb_count
            ],
            start: None,
        }
    }

    pub fn limb_count(&self) -> usize {
        self.limbs.len()
    }

    pub fn genome_len(&self, seq_len: usize) -> usize {
        self.limbs.len() * seq_len
    }

    pub fn reinitialize_with_random_values(
        &mut self,
        seq_len: usize,
        domain: &RateDomain,
        rng: &mut Rng,
    ) {
        for limb in &mut self.limbs {
            limb.experience.clear();
            limb.experience
                .extend((0..seq_len).map(|_| domain.sample(rng)));
        }
    }

    pub fn values(&self) -> Genome {
        self.limbs
            .iter()
            .flat_map(|l| l.experience.iter().copied())
            .collect()
    }

    /// Writes `values` back into the limbs. Out-of-domain entries are replaced
    /// by a fresh random legal rate, never clamped to the boundary.
    /// Returns how many entries were resampled.
    pub fn set_values_with_clamping(
        &mut self,
        values: &[f32],
        seq_len: usize,
        domain: &RateDomain,
        rng: &mut Rng,
    ) -> usize {
        assert_eq!(
            values.len(),
            self.genome_len(seq_len),
            "genome length mismatch for {:?}",
            self.id
        );

        let mut repaired = 0;
        for (limb, chunk) in self.limbs.iter_mut().zip(values.chunks(seq_len)) {
            limb.experience.clear();
            for &v in chunk {
                if domain.contains(v) {
                    limb.experience.push(v);
                } else {
                    limb.experience.push(domain.sample(rng));
                    repaired += 1;
                }
            }
        }
        repaired
    }

    pub fn empty_motor_rates_experience(&self, seq_len: usize) -> Genome {
        vec![0.0; self.genome_len(seq_len)]
    }

    /// Rate of every limb at sequence position `seq_num`.
    pub fn rates_at(&self, seq_num: usize) -> impl Iterator<Item = f32> + '_ {
        self.limbs.iter().map(move |l| l.experience[seq_num])
    }
}

/// The imaginary agents searched over by differential evolution.
#[derive(Debug, Clone)]
pub struct Population {
    pub agents: Vec<Agent>,
}

impl Population {
    pub fn new(size: usize, limb_count: usize, seq_len: usize) -> Self {
        Self {
            agents: (0..size)
                .map(|i| Agent::new(AgentId::Imaginary(i), limb_count, seq_len))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Consistent snapshot of every member's genome.
    pub fn genomes(&self) -> Vec<Genome> {
        self.agents.iter().map(Agent::values).collect()
    }

    pub fn reinitialize_all(&mut self, seq_len: usize, domain: &RateDomain, rng: &mut Rng) {
        for agent in &mut self.agents {
            agent.reinitialize_with_random_values(seq_len, domain, rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain() -> RateDomain {
        RateDomain::new(-2.0, 2.0, 1.0)
    }

    #[test]
    fn test_levels_and_sampling() {
        let d = domain();
        assert_eq!(d.levels(), 5);
        let mut rng = Rng::with_seed(7);
        for _ in 0..200 {
            let v = d.sample(&mut rng);
            assert!(d.contains(v));
            assert_eq!(v, v.round(), "sample {} is off-lattice", v);
        }
    }

    #[test]
    fn test_quantize_rounds_halves_to_even() {
        let d = domain();
        assert_eq!(d.quantize(0.5), 0.0);
        assert_eq!(d.quantize(1.5), 2.0);
        assert_eq!(d.quantize(2.5), 2.0);
        assert_eq!(d.quantize(-1.5), -2.0);
        assert_eq!(d.quantize(0.6), 1.0);

        let half = RateDomain::new(-1.0, 1.0, 0.5);
        assert_eq!(half.quantize(0.25), 0.0);
        assert_eq!(half.quantize(0.75), 1.0);
    }

    #[test]
    fn test_values_are_limb_major() {
        let mut agent = Agent::new(AgentId::Real, 2, 3);
        agent.limbs[0].experience = vec![1.0, 2.0, 3.0];
        agent.limbs[1].experience = vec![-1.0, -2.0, 0.0];
        assert_eq!(agent.values(), vec![1.0, 2.0, 3.0, -1.0, -2.0, 0.0]);
    }

    #[test]
    fn test_repair_resamples_instead_of_clamping() {
        let d = domain();
        let mut agent = Agent::new(AgentId::Imaginary(0), 1, 4);
        let mut rng = Rng::with_seed(3);
        let repaired = agent.set_values_with_clamping(&[0.0, 9.0, -7.0, 1.0], 4, &d, &mut rng);
        assert_eq!(repaired, 2);
        let v = agent.values();
        assert_eq!(v[0], 0.0);
        assert_eq!(v[3], 1.0);
        assert!(d.contains(v[1]) && d.contains(v[2]));
    }

    #[test]
    #[should_panic(expected = "genome length mismatch")]
    fn test_wrong_length_fails_fast() {
        let d = domain();
        let mut agent = Agent::new(AgentId::Real, 2, 3);
        let mut rng = Rng::with_seed(1);
        agent.set_values_with_clamping(&[0.0; 5], 3, &d, &mut rng);
    }

    #[test]
    fn test_empty_experience_shape() {
        let agent = Agent::new(AgentId::Real, 4, 3);
        let empty = agent.empty_motor_rates_experience(3);
        assert_eq!(empty.len(), 12);
        assert!(empty.iter().all(|&v| v == 0.0));
    }
}
