use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use gaitforge::api::{RunOutcome, RunStatus};
use gaitforge::history::HistoryLog;
use gaitforge::scheduler::Phase;

fn rate_cell(rate: f32) -> Cell {
    let cell = Cell::new(format!("{:+.0}", rate)).set_alignment(CellAlignment::Center);
    if rate > 0.0 {
        cell.fg(Color::Green)
    } else if rate < 0.0 {
        cell.fg(Color::Red)
    } else {
        cell
    }
}

/// One row per limb, one column per sequence position.
pub fn print_genome_grid(name: &str, genome: &[f32], seq_len: usize) {
    println!("\nGenome: {}", name);
    if seq_len == 0 || genome.is_empty() {
        println!("(empty)");
        return;
    }

    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    let mut header = vec![Cell::new("Limb").add_attribute(Attribute::Bold)];
    header.extend((0..seq_len).map(|i| {
        Cell::new(format!("t{}", i)).set_alignment(CellAlignment::Center)
    }));
    table.add_row(header);

    for (limb, chunk) in genome.chunks(seq_len).enumerate() {
        let mut row = vec![Cell::new(format!("#{}", limb))];
        row.extend(chunk.iter().map(|&r| rate_cell(r)));
        table.add_row(row);
    }
    println!("{}", table);
}

pub fn print_generation_report(history: &HistoryLog) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Trial").add_attribute(Attribute::Bold),
        Cell::new("Cycle"),
        Cell::new("Gen"),
        Cell::new("Phase"),
        Cell::new("Fitness").fg(Color::Cyan),
        Cell::new("Epoch Best").add_attribute(Attribute::Bold),
        Cell::new("Fittest"),
    ]);

    for i in [0, 1, 2, 4, 5, 6] {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for t in &history.trials {
        let phase_cell = match t.phase {
            Phase::RealGeneration => Cell::new("real").fg(Color::Yellow),
            _ => Cell::new("imaginary"),
        };
        let fittest = t
            .fittest
            .map(|i| format!("#{}", i))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(t.trial),
            Cell::new(t.cycle),
            Cell::new(t.generation),
            phase_cell,
            Cell::new(format!("{:.2}", t.fitness)).fg(Color::Cyan),
            Cell::new(format!("{:.2}", t.best_fitness)).add_attribute(Attribute::Bold),
            Cell::new(fittest),
        ]);
    }
    println!("\n{}", table);
}

pub fn print_run_summary(outcome: &RunOutcome, finish_line: f32) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    let status = match outcome.status {
        RunStatus::Succeeded => Cell::new(outcome.status).fg(Color::Green),
        RunStatus::Aborted => Cell::new(outcome.status).fg(Color::Red),
        _ => Cell::new(outcome.status).fg(Color::Yellow),
    };

    table.add_row(vec![Cell::new("Status").add_attribute(Attribute::Bold), status]);
    table.add_row(vec![Cell::new("Ticks"), Cell::new(outcome.ticks)]);
    table.add_row(vec![Cell::new("Cycles"), Cell::new(outcome.cycles)]);
    table.add_row(vec![
        Cell::new("Progress"),
        Cell::new(format!("{:.2} / {:.2}", outcome.real_progress, finish_line)),
    ]);
    println!("\n{}", table);
}
