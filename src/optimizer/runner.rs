use crate::genome::{Agent, Genome, RateDomain};
use crate::sim::Simulation;
use fastrand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerStatus {
    Running,
    /// Every repetition of the sequence has been played; the generation can be scored.
    Complete,
}

/// Plays each agent's rate sequence one position per tick, `max_seq_repetitions` times.
#[derive(Debug, Clone)]
pub struct SequenceRunner {
    seq_len: usize,
    max_seq_repetitions: usize,
    seq_num: usize,
    repeat_seq: usize,
}

impl SequenceRunner {
    pub fn new(seq_len: usize, max_seq_repetitions: usize) -> Self {
        assert!(seq_len > 0 && max_seq_repetitions > 0, "empty sequence schedule");
        Self {
            seq_len,
            max_seq_repetitions,
            seq_num: 0,
            repeat_seq: 0,
        }
    }

    pub fn repeat_seq(&self) -> usize {
        self.repeat_seq
    }

    /// Ticks needed for one full generation.
    pub fn duration(&self) -> usize {
        self.seq_len * self.max_seq_repetitions
    }

    pub fn reset(&mut self) {
        self.seq_num = 0;
        self.repeat_seq = 0;
    }

    /// Seeds every agent's experience from `cache` when present, otherwise at random.
    pub fn begin_generation(
        &mut self,
        agents: &mut [Agent],
        cache: Option<&[Genome]>,
        domain: &RateDomain,
        rng: &mut Rng,
    ) {
        self.reset();
        match cache {
            Some(genomes) => {
                for (agent, genome) in agents.iter_mut().zip(genomes) {
                    agent.set_values_with_clamping(genome, self.seq_len, domain, rng);
                }
            }
            None => {
                for agent in agents.iter_mut() {
                    agent.reinitialize_with_random_values(self.seq_len, domain, rng);
                }
            }
        }
    }

    /// Applies the current sequence position to every limb and advances.
    pub fn step<S: Simulation>(&mut self, sim: &mut S, agents: &[Agent]) -> RunnerStatus {
        if self.repeat_seq >= self.max_seq_repetitions {
            return RunnerStatus::Complete;
        }

        for agent in agents {
            for (limb, rate) in agent.rates_at(self.seq_num).enumerate() {
                sim.set_limb_actuator_rate(agent.id, limb, rate);
            }
        }

        self.seq_num += 1;
        if self.seq_num == self.seq_len {
            self.seq_num = 0;
            self.repeat_seq += 1;
        }

        if self.repeat_seq >= self.max_seq_repetitions {
            RunnerStatus::Complete
        } else {
            RunnerStatus::Running
        }
    }
}
