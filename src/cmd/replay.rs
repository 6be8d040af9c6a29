use crate::reports;
use clap::parser::ValueSource;
use clap::{ArgMatches, Args};
use gaitforge::config::Config;
use gaitforge::consts::NOT_FIT;
use gaitforge::error::{GaitForgeError, GfResult};
use gaitforge::fitness::FitnessEvaluator;
use gaitforge::genome::{Agent, RateDomain};
use gaitforge::history::{HistoryLog, RunShape};
use gaitforge::optimizer::{RunnerStatus, SequenceRunner};
use gaitforge::sim::{AgentId, KinematicWorld, Simulation, Vec2};
use gaitforge::twin;
use std::slice;

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(long)]
    pub history: String,

    /// Trial to replay. Defaults to the last real generation.
    #[arg(short = 't', long)]
    pub trial: Option<usize>,
}

const SHAPE_FLAGS: [&str; 5] = [
    "limb_count",
    "seq_len",
    "max_seq_repetitions",
    "motor_exec_ticks",
    "time_step",
];

/// Shape flags typed on this command line.
fn explicit_shape_flags(matches: &ArgMatches) -> Vec<&'static str> {
    SHAPE_FLAGS
        .into_iter()
        .filter(|id| matches.value_source(id) == Some(ValueSource::CommandLine))
        .collect()
}

pub fn run(args: ReplayArgs, config: Config, matches: &ArgMatches) -> GfResult<()> {
    let log = HistoryLog::load_json(&args.history)?;
    let record = match args.trial {
        Some(t) => log.get(t),
        None => log.last_real().or_else(|| log.last()),
    }
    .ok_or_else(|| GaitForgeError::Validation(format!("no such trial in {}", args.history)))?;

    let requested = RunShape::from(&config);
    let shape = match &log.shape {
        Some(recorded) => recorded.reconcile(&requested, &explicit_shape_flags(matches))?,
        None => {
            println!("⚠️  {} records no genome shape, using flags", args.history);
            requested
        }
    };
    if record.genome.is_empty() || record.genome.len() != shape.genome_len() {
        return Err(GaitForgeError::Validation(format!(
            "genome of length {} does not fit {} limbs x {} steps",
            record.genome.len(),
            shape.limb_count,
            shape.seq_len
        )));
    }
    let (limbs, seq_len) = (shape.limb_count, shape.seq_len);

    let domain = RateDomain::from(&config.rates);
    let evaluator = FitnessEvaluator::from(&config.world);
    let mut rng = fastrand::Rng::with_seed(config.schedule.seed.unwrap_or(0));
    let mut world = KinematicWorld::new(
        limbs,
        0,
        Vec2::new(config.world.real_start_x, config.world.real_start_y),
    );

    let mut real = Agent::new(AgentId::Real, limbs, seq_len);
    let repaired = real.set_values_with_clamping(&record.genome, seq_len, &domain, &mut rng);
    if repaired > 0 {
        println!("⚠️  {} rates fell outside the domain and were resampled", repaired);
    }
    twin::capture_start_poses(&world, slice::from_mut(&mut real));

    let mut runner = SequenceRunner::new(seq_len, shape.max_seq_repetitions);
    let dt = shape.time_step;
    loop {
        let status = runner.step(&mut world, slice::from_ref(&real));
        for _ in 0..=shape.motor_exec_ticks {
            world.step(dt);
        }
        if status == RunnerStatus::Complete {
            break;
        }
    }
    world.halt_agent_motion(AgentId::Real);

    reports::print_genome_grid(&format!("trial {}", record.trial), &record.genome, seq_len);

    let fitness = match &real.start {
        Some(start) => evaluator.evaluate(start, world.agent_position(AgentId::Real)),
        None => NOT_FIT,
    };
    println!(
        "\n🎯 Replayed fitness {:.2} (recorded {:.2}) over {:.2}s simulated",
        fitness,
        record.fitness,
        world.elapsed()
    );
    Ok(())
}
