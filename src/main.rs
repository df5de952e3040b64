//! Pipeline Hazard Simulator CLI.
//!
//! Loads a configuration, builds a program (from a TOML listing or at
//! random), runs it through the five-stage pipeline and prints the cycle
//! table and statistics.
//!
//! # Usage
//!
//! 1. **Program Mode**: `pipesim --program programs/load_use.toml`
//! 2. **Random Mode**: `pipesim --random 10 --seed 7 --forwarding false`
//!
//! Pass `--json` for a machine-readable report instead of the text table.

use std::path::Path;
use std::process;

use clap::Parser;

extern crate pipeline_sim;

use pipeline_sim::common::Result;
use pipeline_sim::config::Config;
use pipeline_sim::core::generator::count_adjacent_dependencies;
use pipeline_sim::core::instruction::Stage;
use pipeline_sim::core::pipeline::signals::ForwardSource;
use pipeline_sim::core::{InstructionGenerator, PipelineEngine, SimulationOptions};
use pipeline_sim::sim::loader;
use pipeline_sim::sim::report::Report;
use pipeline_sim::stats::CycleRecord;

const DEFAULT_CONFIG: &str = "configs/default.toml";

/// Command-line arguments for the pipeline simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Five-Stage Pipeline Hazard Simulator")]
struct Args {
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: String,

    /// TOML program listing.
    #[arg(short, long, conflicts_with = "random")]
    program: Option<String>,

    /// Generate a random program of this length.
    #[arg(short, long)]
    random: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    forwarding: Option<bool>,

    #[arg(long)]
    max_cycles: Option<u64>,

    #[arg(long)]
    trace: bool,

    #[arg(long)]
    json: bool,
}

/// Main entry point for the pipeline simulator.
///
/// Any loader error is fatal and exits with status 1.
fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = if args.config == DEFAULT_CONFIG && !Path::new(DEFAULT_CONFIG).exists() {
        Config::default()
    } else {
        loader::load_config(&args.config)?
    };

    if let Some(seed) = args.seed {
        config.generator.seed = Some(seed);
    }
    if let Some(fwd) = args.forwarding {
        config.pipeline.forwarding = fwd;
    }
    if let Some(max) = args.max_cycles {
        config.general.max_cycles = max;
    }
    config.general.trace |= args.trace;

    let mut gen = InstructionGenerator::from_config(&config.generator);
    let program = match &args.program {
        Some(path) => loader::load_program(path, &mut gen)?,
        None => gen.random_program(args.random.unwrap_or(config.generator.count)),
    };

    let mut engine = PipelineEngine::from_config(&config);
    let history = engine.simulate(program.clone(), SimulationOptions::from_config(&config));

    if args.json {
        println!("{}", Report::new(&engine, &program).to_json()?);
        return Ok(());
    }

    print_banner(&config);

    println!("Program ({} instructions)", program.len());
    println!("--------------------");
    for inst in &program {
        println!("  {:<5} {:<18} ; {}", inst.id(), inst.to_string(), inst.describe());
    }
    println!(
        "  adjacent dependencies: {}",
        count_adjacent_dependencies(&program)
    );
    println!("--------------------");

    print_cycle_table(&history);

    if !engine.is_drained() {
        println!(
            "\n[*] Stopped at cycle ceiling ({} cycles), {} instruction(s) still live",
            config.general.max_cycles,
            engine.instructions().len()
        );
    }

    engine.stats().print();
    Ok(())
}

fn print_banner(config: &Config) {
    println!("Global Configuration");
    println!("--------------------");
    println!("General:");
    println!("  Trace:              {}", config.general.trace);
    println!("  Max Cycles:         {}", config.general.max_cycles);
    println!("Pipeline:");
    println!(
        "  Forwarding:         {}",
        if config.pipeline.forwarding {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    println!("Generator:");
    println!("  Registers:          R0-R{}", config.generator.registers.saturating_sub(1));
    match config.generator.seed {
        Some(seed) => println!("  Seed:               {}", seed),
        None => println!("  Seed:               (entropy)"),
    }
    println!("--------------------");
}

fn print_cycle_table(history: &[CycleRecord]) {
    print!("{:>5} ", "Cycle");
    for stage in Stage::PIPELINE {
        print!("| {:<5}", stage);
    }
    println!("| Notes");

    for row in history {
        print!("{:>5} ", row.cycle);
        for stage in Stage::PIPELINE {
            let cell = row.at(stage).map_or_else(|| "--".to_string(), |id| id.to_string());
            print!("| {:<5}", cell);
        }

        let mut notes = Vec::new();
        if row.stalled {
            notes.push("STALL".to_string());
        }
        if row.bubble {
            notes.push("BUBBLE".to_string());
        }
        for (name, src) in [("A", row.forwarding.a), ("B", row.forwarding.b)] {
            if src != ForwardSource::None {
                notes.push(format!("FWD {}<-{}", name, src.label()));
            }
        }
        println!("| {}", notes.join(" "));
    }
}
