use fastrand::Rng;
use gaitforge::genome::{Agent, Population, RateDomain};
use gaitforge::optimizer::{DeParams, DifferentialEvolution};
use gaitforge::sim::AgentId;
use proptest::prelude::*;

// --- STRATEGIES ---

prop_compose! {
    fn arb_domain()(
        min in -4i32..=0,
        span in 1i32..=6,
        half_step in any::<bool>()
    ) -> RateDomain {
        let step = if half_step { 0.5 } else { 1.0 };
        RateDomain::new(min as f32, (min + span) as f32, step)
    }
}

prop_compose! {
    fn arb_scores(size: usize)(
        raw in proptest::collection::vec(prop_oneof![Just(0.0f32), 0.01f32..50.0], size)
    ) -> Vec<f32> {
        raw.into_iter().map(gaitforge::fitness::round_fitness).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_rates_stay_in_domain(
        domain in arb_domain(),
        seed in any::<u64>(),
        scores in arb_scores(6),
        generations in 1usize..6
    ) {
        let seq_len = 3;
        let mut pop = Population::new(6, 2, seq_len);
        let mut rng = Rng::with_seed(seed);
        pop.reinitialize_all(seq_len, &domain, &mut rng);

        let mut de = DifferentialEvolution::new(DeParams::default(), 6, Some(seed));
        for _ in 0..generations {
            de.evolve(&mut pop, &scores, seq_len, &domain);
            for agent in &pop.agents {
                for limb in &agent.limbs {
                    prop_assert_eq!(limb.experience.len(), seq_len);
                    prop_assert!(limb.experience.iter().all(|&v| domain.contains(v)));
                }
            }
        }
    }

    #[test]
    fn prop_elite_is_preserved(seed in any::<u64>(), scores in arb_scores(5)) {
        let domain = RateDomain::new(-2.0, 2.0, 1.0);
        let seq_len = 4;
        let mut pop = Population::new(5, 2, seq_len);
        let mut rng = Rng::with_seed(seed);
        pop.reinitialize_all(seq_len, &domain, &mut rng);
        let before = pop.genomes();

        let mut de = DifferentialEvolution::new(DeParams::default(), 5, Some(seed));
        let summary = de.evolve(&mut pop, &scores, seq_len, &domain);

        if let Some(elite) = summary.fittest {
            prop_assert_eq!(pop.agents[elite].values(), before[elite].clone());
        } else {
            prop_assert!(summary.bulk_reinit);
        }
    }

    #[test]
    fn prop_beta_never_grows_within_epoch(seed in any::<u64>(), generations in 1usize..120) {
        let domain = RateDomain::new(-2.0, 2.0, 1.0);
        let mut pop = Population::new(4, 1, 2);
        let mut de = DifferentialEvolution::new(DeParams::default(), 4, Some(seed));
        let floor = DeParams::default().beta_floor;

        let mut last = de.v_beta();
        for g in 0..generations {
            let scores = [(g % 3) as f32, 0.0, 1.0, 0.0];
            de.evolve(&mut pop, &scores, 2, &domain);
            prop_assert!(de.v_beta() <= last);
            prop_assert!(de.v_beta() >= floor);
            last = de.v_beta();
        }
    }

    #[test]
    fn prop_legal_genome_round_trips(
        domain in arb_domain(),
        seed in any::<u64>(),
        limbs in 1usize..5,
        seq_len in 1usize..8
    ) {
        let mut rng = Rng::with_seed(seed);
        let mut agent = Agent::new(AgentId::Real, limbs, seq_len);
        agent.reinitialize_with_random_values(seq_len, &domain, &mut rng);

        let genome = agent.values();
        let repaired = agent.set_values_with_clamping(&genome, seq_len, &domain, &mut rng);

        prop_assert_eq!(repaired, 0);
        prop_assert_eq!(agent.values(), genome);
    }
}
