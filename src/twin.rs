use crate::fitness::FitnessRecord;
use crate::genome::{Agent, Genome, Population, RateDomain};
use crate::sim::{AgentId, Simulation, Vec2};
use fastrand::Rng;
use tracing::info;

/// Copies the real agent's current pose into every imaginary agent, shifted by
/// `offset`. Each imaginary agent is halted and its start pose reset to the
/// copied (offset) pose so displacement is measured from there.
pub fn sync_imaginary_from_real<S: Simulation>(
    sim: &mut S,
    real: &Agent,
    population: &mut Population,
    offset: Vec2,
) {
    let pose = sim.agent_pose(AgentId::Real, real.limb_count());

    for agent in &mut population.agents {
        sim.set_agent_pose(agent.id, &pose, offset);
        sim.halt_agent_motion(agent.id);
        agent.start = Some(sim.agent_pose(agent.id, agent.limb_count()));
    }

    info!(
        "🪞 Twins synced to real pose ({:.2}, {:.2}) @ {:.3} rad",
        pose.position.x, pose.position.y, pose.orientation
    );
}

/// Captures the generation start pose of `agents` without moving them.
pub fn capture_start_poses<S: Simulation>(sim: &S, agents: &mut [Agent]) {
    for agent in agents {
        agent.start = Some(sim.agent_pose(agent.id, agent.limb_count()));
    }
}

/// Loads the epoch's fittest genome (or the all-zero genome when none was fit)
/// into the real agent and returns the genome adopted.
pub fn adopt_fittest(
    real: &mut Agent,
    record: &FitnessRecord,
    seq_len: usize,
    domain: &RateDomain,
    rng: &mut Rng,
) -> Genome {
    let genome = record.fittest_genome_or(real.empty_motor_rates_experience(seq_len));
    real.set_values_with_clamping(&genome, seq_len, domain, rng);

    match record.epoch_fittest {
        Some(idx) => info!(
            "🏆 Real agent adopts genome of twin #{} (fitness {:.2})",
            idx, record.epoch_best
        ),
        None => info!("🕳️  No fit twin this epoch. Real agent adopts the empty genome."),
    }
    genome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::KinematicWorld;

    #[test]
    fn test_adopt_undetermined_yields_zero_genome() {
        let domain = RateDomain::new(-2.0, 2.0, 1.0);
        let mut rng = Rng::with_seed(9);
        let mut real = Agent::new(AgentId::Real, 4, 3);
        real.reinitialize_with_random_values(3, &domain, &mut rng);

        let record = FitnessRecord::new(4);
        let adopted = adopt_fittest(&mut real, &record, 3, &domain, &mut rng);

        assert_eq!(adopted, vec![0.0; 12]);
        assert_eq!(real.values(), vec![0.0; 12]);
    }

    #[test]
    fn test_sync_resets_start_pose() {
        let mut world = KinematicWorld::new(2, 4, Vec2::new(5.0, 1.0));
        let real = Agent::new(AgentId::Real, 2, 3);
        let mut pop = Population::new(4, 2, 3);

        sync_imaginary_from_real(&mut world, &real, &mut pop, Vec2::new(0.0, 10.0));

        for agent in &pop.agents {
            let start = agent.start.as_ref().expect("start pose captured");
            assert_eq!(start.position, Vec2::new(5.0, 11.0));
            assert_eq!(world.agent_position(agent.id), Vec2::new(5.0, 11.0));
        }
    }
}
