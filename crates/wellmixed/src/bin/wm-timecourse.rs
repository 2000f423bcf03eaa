use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use colored::*;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use wm_kinetics::ensemble::{Timecourse, derive_seed};
use wm_kinetics::{GillespieSsa, SimulationError, TauLeap};

use wellmixed::simulation_parsers::{EnsembleParameters, OutputGrid};
use wellmixed::system_parsers::read_system_input;

#[derive(Debug, Parser)]
#[command(name = "wm-timecourse")]
#[command(version, about = "Ensemble-averaged time course of a reaction network")]
pub struct Cli {
    /// Input file (JSON system description), or "-" for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// Use tau-leaping with this leap size instead of the exact method.
    #[arg(long, value_name = "DT")]
    dt: Option<f64>,

    /// Backup/Store the timecourse in this file.
    #[arg(long, value_name = "FILE")]
    timecourse: Option<PathBuf>,

    #[command(flatten, next_help_heading = "Ensemble parameters")]
    ensemble: EnsembleParameters,

    #[command(flatten, next_help_heading = "Simulation parameters")]
    simulation: OutputGrid,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    cli.simulation.validate()?;

    let system = read_system_input(&cli.input)?;
    let times = cli.simulation.output_times();
    let seed = cli.ensemble.base_seed();

    println!(
        "Output after {} simulations: \n - {:?}\n - seed {}",
        cli.ensemble.num_sims, cli.simulation, seed
    );
    println!("Species: {}", system.network.species_names().join(", ").green());

    println!("Simulation progress:");
    let pb = ProgressBar::new(cli.ensemble.num_sims);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let timecourses: Vec<Result<Timecourse, SimulationError>> = (0..cli.ensemble.num_sims)
        .into_par_iter()
        .map_init(
            || pb.clone(), // each thread gets a clone
            |pb, run| {
                let mut rng = ChaCha8Rng::seed_from_u64(derive_seed(seed, run));
                let trajectory = match cli.dt {
                    Some(dt) => TauLeap::new(&system.network, &system.initial, &system.params, dt)?
                        .sample(&mut rng, cli.simulation.t_end, &times),
                    None => GillespieSsa::new(&system.network, &system.initial, &system.params)?
                        .sample(&mut rng, cli.simulation.t_end, &times),
                }?;
                let mut timecourse = Timecourse::new(&times, system.network.species_names());
                timecourse.add_trajectory(&trajectory);
                pb.inc(1);
                Ok(timecourse)
            },
        )
        .collect();
    pb.finish_with_message("All simulations complete!");

    let mut master = Timecourse::new(&times, system.network.species_names());
    for timecourse in timecourses {
        master.merge(timecourse?);
    }

    println!("Final Timecourse:\n{}", master);

    if let Some(path) = cli.timecourse {
        let json = serde_json::to_string_pretty(&master)?;
        std::fs::write(path, json)?;
    }

    Ok(())
}
