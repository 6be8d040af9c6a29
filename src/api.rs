use crate::config::Config;
use crate::consts::NOT_FIT;
use crate::error::{GaitForgeError, GfResult};
use crate::fitness::FitnessEvaluator;
use crate::genome::{Agent, Genome, Population, RateDomain};
use crate::history::{HistoryLog, RunShape, TrialRecord};
use crate::optimizer::{
    DeParams, DifferentialEvolution, GenerationSummary, RunnerStatus, SequenceRunner,
};
use crate::scheduler::{Phase, PhaseScheduler, Signal};
use crate::sim::{AgentId, Simulation, Vec2};
use crate::twin;
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use std::slice;
use strum_macros::Display;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    /// The real agent crossed the finish line.
    Succeeded,
    /// `max_cycles` elapsed without reaching the finish line.
    Exhausted,
    /// The progress callback asked to stop.
    Aborted,
}

/// What one [`Coevolution::tick`] did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    /// Phase after the tick.
    pub phase: Phase,
    pub outcome: RunStatus,
    /// Set when an imaginary generation was scored and evolved this tick.
    pub generation: Option<GenerationSummary>,
    /// Epoch-best genome, set alongside `generation`.
    pub best_genome: Option<Genome>,
    /// Set when the real agent finished its generation this tick.
    pub real_fitness: Option<f32>,
}

impl TickReport {
    pub fn is_generation_boundary(&self) -> bool {
        self.generation.is_some() || self.real_fitness.is_some()
    }
}

pub trait ProgressCallback: Send + Sync {
    /// Called on every generation boundary. Return false to abort the run.
    fn on_progress(&self, report: &TickReport) -> bool;
}

impl<F> ProgressCallback for F
where
    F: Fn(&TickReport) -> bool + Send + Sync,
{
    fn on_progress(&self, report: &TickReport) -> bool {
        self(report)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub ticks: u64,
    pub cycles: usize,
    /// Real agent's distance along the world heading from its starting point.
    pub real_progress: f32,
    pub best_genome: Genome,
}

/// Drives imaginary evolution and real execution against a simulation.
pub struct Coevolution<S: Simulation> {
    config: Config,
    sim: S,
    population: Population,
    real: Agent,
    engine: DifferentialEvolution,
    imaginary_runner: SequenceRunner,
    real_runner: SequenceRunner,
    scheduler: PhaseScheduler,
    evaluator: FitnessEvaluator,
    domain: RateDomain,
    offset: Vec2,
    origin: Vec2,
    generation_in_progress: bool,
    runner_done: bool,
    adopted: Genome,
    status: RunStatus,
    ticks: u64,
    history: HistoryLog,
    rng: Rng,
}

impl<S: Simulation> Coevolution<S> {
    pub fn new(config: Config, sim: S) -> GfResult<Self> {
        config.validate()?;
        let s = &config.schedule;
        let w = &config.world;
        let size = config.evolution.population_size;

        let rng = match s.seed {
            Some(seed) => Rng::with_seed(seed.wrapping_add(9999)),
            None => Rng::new(),
        };

        let mut this = Self {
            population: Population::new(size, w.limb_count, s.seq_len),
            real: Agent::new(AgentId::Real, w.limb_count, s.seq_len),
            engine: DifferentialEvolution::new(
                DeParams::from(&config.evolution),
                size,
                s.seed,
            ),
            imaginary_runner: SequenceRunner::new(s.seq_len, s.max_seq_repetitions),
            real_runner: SequenceRunner::new(s.seq_len, s.max_seq_repetitions),
            scheduler: PhaseScheduler::new(s.max_generations, s.motor_exec_ticks),
            evaluator: FitnessEvaluator::from(w),
            domain: RateDomain::from(&config.rates),
            offset: Vec2::new(w.imaginary_offset_x, w.imaginary_offset_y),
            origin: Vec2::new(w.real_start_x, w.real_start_y),
            generation_in_progress: false,
            runner_done: false,
            adopted: Vec::new(),
            status: RunStatus::Running,
            ticks: 0,
            history: HistoryLog::with_shape(RunShape::from(&config)),
            rng,
            config,
            sim,
        };

        let (size, seq_len, gens, reps) = (
            this.config.evolution.population_size,
            this.config.schedule.seq_len,
            this.config.schedule.max_generations,
            this.config.schedule.max_seq_repetitions,
        );
        this.initialize_epoch(size, seq_len, gens, reps)?;
        Ok(this)
    }

    /// (Re)builds the population and schedule for a fresh imaginary phase.
    /// The real agent keeps its current pose.
    pub fn initialize_epoch(
        &mut self,
        population_size: usize,
        seq_len: usize,
        max_generations: usize,
        max_seq_repetitions: usize,
    ) -> GfResult<()> {
        let mut config = self.config.clone();
        config.evolution.population_size = population_size;
        config.schedule.seq_len = seq_len;
        config.schedule.max_generations = max_generations;
        config.schedule.max_seq_repetitions = max_seq_repetitions;
        config.validate()?;

        if self.sim.imaginary_count() < population_size {
            return Err(GaitForgeError::Precondition(format!(
                "simulation hosts {} imaginary bodies but population_size is {}",
                self.sim.imaginary_count(),
                population_size
            )));
        }

        for agent in &self.population.agents {
            self.sim.halt_agent_motion(agent.id);
        }
        self.sim.halt_agent_motion(AgentId::Real);

        let limbs = config.world.limb_count;
        self.population = Population::new(population_size, limbs, seq_len);
        self.real = Agent::new(AgentId::Real, limbs, seq_len);
        self.engine = DifferentialEvolution::new(
            DeParams::from(&config.evolution),
            population_size,
            Some(self.rng.u64(..)),
        );
        self.imaginary_runner = SequenceRunner::new(seq_len, max_seq_repetitions);
        self.real_runner = SequenceRunner::new(seq_len, max_seq_repetitions);
        self.scheduler = PhaseScheduler::new(max_generations, config.schedule.motor_exec_ticks);
        self.generation_in_progress = false;
        self.runner_done = false;
        self.adopted = self.real.empty_motor_rates_experience(seq_len);
        self.status = RunStatus::Running;
        self.history.shape = Some(RunShape::from(&config));
        self.config = config;

        info!(
            "🧬 Epoch initialized: {} twins x {} limbs x {} steps, {} generations",
            population_size, limbs, seq_len, max_generations
        );
        Ok(())
    }

    /// Advances the schedule by one simulation tick. The caller steps the
    /// simulation before each call.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport {
            tick: self.ticks,
            phase: self.scheduler.phase(),
            outcome: self.status,
            generation: None,
            best_genome: None,
            real_fitness: None,
        };
        if self.status != RunStatus::Running {
            return report;
        }
        self.ticks += 1;

        match self.scheduler.phase() {
            Phase::ImaginaryMotorExec | Phase::RealMotorExec => {
                self.scheduler.motor_tick();
            }
            Phase::ImaginaryGeneration => self.imaginary_generation_tick(&mut report),
            Phase::RealGeneration => self.real_generation_tick(&mut report),
        }

        report.tick = self.ticks;
        report.phase = self.scheduler.phase();
        report.outcome = self.status;
        report
    }

    fn imaginary_generation_tick(&mut self, report: &mut TickReport) {
        let seq_len = self.config.schedule.seq_len;

        if self.generation_in_progress && self.runner_done {
            let scores = self.evaluator.score_population(&self.sim, &self.population);
            let summary = self
                .engine
                .evolve(&mut self.population, &scores, seq_len, &self.domain);
            let best_genome = self.fittest_genome();

            self.history.push(TrialRecord {
                trial: 0,
                cycle: self.scheduler.cycle(),
                generation: summary.generation,
                phase: Phase::ImaginaryGeneration,
                best_fitness: summary.epoch_best,
                fittest: summary.fittest,
                fitness: summary.best_fitness,
                genome: best_genome.clone(),
            });
            report.generation = Some(summary);
            report.best_genome = Some(best_genome);
            self.generation_in_progress = false;

            if self.scheduler.complete_generation() {
                self.begin_real_generation();
                return;
            }
        }

        if !self.generation_in_progress {
            twin::sync_imaginary_from_real(
                &mut self.sim,
                &self.real,
                &mut self.population,
                self.offset,
            );
            self.imaginary_runner.begin_generation(
                &mut self.population.agents,
                self.engine.cached_genomes(),
                &self.domain,
                &mut self.rng,
            );
            self.generation_in_progress = true;
        }

        let status = self.imaginary_runner.step(&mut self.sim, &self.population.agents);
        self.runner_done = status == RunnerStatus::Complete;
        self.scheduler.signal(Signal::StepApplied);
    }

    fn begin_real_generation(&mut self) {
        let seq_len = self.config.schedule.seq_len;
        for agent in &self.population.agents {
            self.sim.halt_agent_motion(agent.id);
        }

        self.adopted = twin::adopt_fittest(
            &mut self.real,
            self.engine.record(),
            seq_len,
            &self.domain,
            &mut self.rng,
        );
        twin::capture_start_poses(&self.sim, slice::from_mut(&mut self.real));
        self.real_runner.reset();

        let status = self
            .real_runner
            .step(&mut self.sim, slice::from_ref(&self.real));
        self.runner_done = status == RunnerStatus::Complete;
        self.scheduler.signal(Signal::EpochComplete);
        info!(
            "🚶 Real agent executing cycle {} genome",
            self.scheduler.cycle()
        );
    }

    fn real_generation_tick(&mut self, report: &mut TickReport) {
        if !self.runner_done {
            let status = self
                .real_runner
                .step(&mut self.sim, slice::from_ref(&self.real));
            self.runner_done = status == RunnerStatus::Complete;
            self.scheduler.signal(Signal::StepApplied);
            return;
        }

        self.sim.halt_agent_motion(AgentId::Real);
        let position = self.sim.agent_position(AgentId::Real);
        let fitness = match &self.real.start {
            Some(start) => self.evaluator.evaluate(start, position),
            None => NOT_FIT,
        };
        let record = self.engine.record();
        self.history.push(TrialRecord {
            trial: 0,
            cycle: self.scheduler.cycle(),
            generation: self.scheduler.generation(),
            phase: Phase::RealGeneration,
            best_fitness: record.epoch_best,
            fittest: record.epoch_fittest,
            fitness,
            genome: self.adopted.clone(),
        });
        report.real_fitness = Some(fitness);

        let progress = self.real_progress();
        self.scheduler.complete_cycle();
        info!(
            "📍 Cycle {} done: real fitness {:.2}, progress {:.2}/{:.2}",
            self.scheduler.cycle(),
            fitness,
            progress,
            self.config.schedule.finish_line
        );

        if progress >= self.config.schedule.finish_line {
            info!("🏁 Finish line reached after {} cycles", self.scheduler.cycle());
            self.status = RunStatus::Succeeded;
        } else if self.scheduler.cycle() >= self.config.schedule.max_cycles {
            info!("⌛ Cycle limit {} reached", self.config.schedule.max_cycles);
            self.status = RunStatus::Exhausted;
        } else {
            self.engine.reset_epoch();
            self.generation_in_progress = false;
            self.runner_done = false;
            self.scheduler.signal(Signal::RealGenerationComplete);
        }
    }

    /// Steps the simulation and the schedule until the run ends or `max_ticks`
    /// elapse. `callback` sees every generation boundary.
    pub fn run<CB: ProgressCallback>(&mut self, max_ticks: u64, callback: &CB) -> RunOutcome {
        let dt = self.config.schedule.time_step;
        let mut elapsed = 0;

        while self.status == RunStatus::Running && elapsed < max_ticks {
            self.sim.step(dt);
            let report = self.tick();
            elapsed += 1;

            if report.is_generation_boundary() && !callback.on_progress(&report) {
                self.abort();
            }
        }

        RunOutcome {
            status: self.status,
            ticks: self.ticks,
            cycles: self.scheduler.cycle(),
            real_progress: self.real_progress(),
            best_genome: self.fittest_genome(),
        }
    }

    /// Stops the run and discards the in-flight generation.
    pub fn abort(&mut self) {
        self.imaginary_runner.reset();
        self.real_runner.reset();
        self.generation_in_progress = false;
        self.runner_done = false;
        for agent in &self.population.agents {
            self.sim.halt_agent_motion(agent.id);
        }
        self.sim.halt_agent_motion(AgentId::Real);
        self.status = RunStatus::Aborted;
        info!("🛑 Run aborted at tick {}", self.ticks);
    }

    /// The epoch's fittest genome, or all zeros when no twin was fit.
    pub fn fittest_genome(&self) -> Genome {
        let len = self.config.world.limb_count * self.config.schedule.seq_len;
        self.engine.record().fittest_genome_or(vec![0.0; len])
    }

    pub fn epoch_best_fitness(&self) -> f32 {
        self.engine.record().epoch_best
    }

    pub fn real_progress(&self) -> f32 {
        self.evaluator
            .progress(self.origin, self.sim.agent_position(AgentId::Real))
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn cycle(&self) -> usize {
        self.scheduler.cycle()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn v_beta(&self) -> f32 {
        self.engine.v_beta()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn simulation(&self) -> &S {
        &self.sim
    }

    pub fn simulation_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }
}
