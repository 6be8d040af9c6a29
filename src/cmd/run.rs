use crate::reports;
use clap::Args;
use gaitforge::api::{Coevolution, ProgressCallback, TickReport};
use gaitforge::config::Config;
use gaitforge::error::GfResult;
use gaitforge::sim::{KinematicWorld, Vec2};
use std::time::Instant;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(short = 'T', long, default_value_t = 500_000)]
    pub max_ticks: u64,

    #[arg(long)]
    pub history_json: Option<String>,

    #[arg(long)]
    pub history_csv: Option<String>,
}

struct ConsoleProgress {
    seq_len: usize,
    debug: bool,
}

impl ProgressCallback for ConsoleProgress {
    fn on_progress(&self, report: &TickReport) -> bool {
        if let Some(fitness) = report.real_fitness {
            println!(
                "🚶 Tick {:>7} | real generation fitness {:.2}",
                report.tick, fitness
            );
        }
        if self.debug {
            if let (Some(gen), Some(genome)) = (&report.generation, &report.best_genome) {
                reports::print_genome_grid(
                    &format!("epoch best after gen {} ({:.2})", gen.generation, gen.epoch_best),
                    genome,
                    self.seq_len,
                );
            }
        }
        true
    }
}

pub fn run(args: RunArgs, config: Config, debug: bool) -> GfResult<()> {
    config.validate()?;
    let world = KinematicWorld::new(
        config.world.limb_count,
        config.evolution.population_size,
        Vec2::new(config.world.real_start_x, config.world.real_start_y),
    );

    println!(
        "🔥 Co-evolving {} twins, {} limbs, {} rate steps (x{} repetitions)",
        config.evolution.population_size,
        config.world.limb_count,
        config.schedule.seq_len,
        config.schedule.max_seq_repetitions
    );

    let seq_len = config.schedule.seq_len;
    let finish_line = config.schedule.finish_line;
    let mut coevolution = Coevolution::new(config, world)?;

    let start = Instant::now();
    let outcome = coevolution.run(args.max_ticks, &ConsoleProgress { seq_len, debug });
    let elapsed = start.elapsed().as_secs_f32();

    reports::print_generation_report(coevolution.history());
    reports::print_genome_grid("fittest", &outcome.best_genome, seq_len);
    reports::print_run_summary(&outcome, finish_line);
    println!(
        "⏱️  {} ticks in {:.2}s ({:.0} ticks/s)",
        outcome.ticks,
        elapsed,
        outcome.ticks as f32 / elapsed.max(1e-6)
    );

    if let Some(path) = &args.history_json {
        coevolution.history().write_json(path)?;
        println!("💾 History written to {}", path);
    }
    if let Some(path) = &args.history_csv {
        coevolution.history().write_csv(path)?;
        println!("💾 History written to {}", path);
    }
    Ok(())
}
