use anyhow::Result;
use clap::Parser;
use colored::*;

use wm_kinetics::{Rk4, solve_deterministic};

use wellmixed::simulation_parsers::OutputGrid;
use wellmixed::system_parsers::read_system_input;

#[derive(Debug, Parser)]
#[command(name = "wm-ode")]
#[command(version, about = "Deterministic mass-action rate equations of a reaction network")]
pub struct Cli {
    /// Input file (JSON system description), or "-" for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// Integrator step size.
    #[arg(long, default_value_t = 0.01)]
    dt: f64,

    #[command(flatten, next_help_heading = "Simulation parameters")]
    simulation: OutputGrid,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    cli.simulation.validate()?;

    let system = read_system_input(&cli.input)?;
    let times = cli.simulation.output_times();
    let solver = Rk4::new(cli.dt)?;

    let trajectory = solve_deterministic(
        &system.network,
        &system.initial_concentrations(),
        &system.params,
        cli.simulation.t_end,
        &times,
        &solver,
    )?;

    print!("{:>13}", "time".cyan());
    for name in system.network.species_names() {
        print!(" {:>14}", name.green());
    }
    println!();
    for (t, state) in trajectory.iter() {
        print!("{:>13.6}", t);
        for &x in state {
            print!(" {:>14.6}", x);
        }
        println!();
    }

    Ok(())
}
