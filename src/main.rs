use std::path::PathBuf;
use std::process;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "terrain_generator")]
#[command(about = "Generate procedural terrain maps from a parameter document")]
struct Args {
    /// Path to the JSON parameter file
    #[arg(short, long, default_value = "generation_parameters.json")]
    parameters: PathBuf,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = terrain_generator::generation::run(&args.parameters) {
        eprintln!("Generation failed: {err}");
        process::exit(1);
    }
}
