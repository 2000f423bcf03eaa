use anyhow::Result;
use clap::Parser;
use colored::*;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use wm_kinetics::GillespieSsa;

use wellmixed::simulation_parsers::OutputGrid;
use wellmixed::system_parsers::read_system_input;

#[derive(Debug, Parser)]
#[command(name = "wm-trajectory")]
#[command(version, about = "Single exact trajectory of a reaction network")]
pub struct Cli {
    /// Input file (JSON system description), or "-" for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// Seed for the random number stream. Random if not given.
    #[arg(long)]
    seed: Option<u64>,

    #[command(flatten, next_help_heading = "Simulation parameters")]
    simulation: OutputGrid,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    cli.simulation.validate()?;

    let system = read_system_input(&cli.input)?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    println!("{} {}", "# seed:".yellow(), seed);
    print!("{:>16} {:>10}", "time".cyan(), "reaction".cyan());
    for name in system.network.species_names() {
        print!(" {:>10}", name.green());
    }
    println!();

    print!("{:>16.8e} {:>10}", 0.0, "-");
    for &count in &system.initial {
        print!(" {:>10}", count);
    }
    println!();

    let mut simulator = GillespieSsa::new(&system.network, &system.initial, &system.params)?;
    simulator.simulate(&mut rng, cli.simulation.t_end, |t, reaction, state| {
        print!("{:>16.8e} {:>10}", t, reaction);
        for &count in state {
            print!(" {:>10}", count);
        }
        println!();
    })?;

    Ok(())
}
