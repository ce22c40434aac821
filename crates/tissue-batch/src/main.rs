// ─────────────────────────────────────────────────────────────────────
// Tissue Scatter — Command-Line Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! `tissue-scatter run` for a single configuration, `tissue-scatter sweep`
//! for a grid scan written to `.npz`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tissue_batch::sweep::{run_sweep, SweepGrid};
use tissue_core::driver::scatter;
use tissue_types::config::{RunConfig, ScatterConfig, SimulationSettings};

#[derive(Parser)]
#[command(name = "tissue-scatter")]
#[command(about = "Monte-Carlo photon transport through skin, muscle and bone", long_about = None)]
struct Cli {
    /// JSON run configuration; flags below override its fields
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Engine overrides shared by both subcommands.
#[derive(Args)]
struct EngineArgs {
    /// Photons per seeding batch
    #[arg(long, global = true)]
    batch_size: Option<usize>,

    /// Iteration cap
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    /// Wall-clock cap in seconds
    #[arg(long, global = true)]
    max_wall_time: Option<f64>,

    /// Seed for a reproducible run
    #[arg(long, global = true)]
    seed: Option<u64>,
}

/// Tissue and detector overrides.
#[derive(Args)]
struct TissueArgs {
    /// Wavelength [nm]
    #[arg(long)]
    wavelength: Option<f64>,

    /// Distance to detector 1 [cm]
    #[arg(long)]
    distance_1: Option<f64>,

    /// Distance to detector 2 [cm]
    #[arg(long)]
    distance_2: Option<f64>,

    /// Source and detector half-width [cm]
    #[arg(long)]
    half_width: Option<f64>,

    #[arg(long)]
    thickness_skin: Option<f64>,

    #[arg(long)]
    thickness_muscle: Option<f64>,

    #[arg(long)]
    thickness_bone: Option<f64>,

    /// Hemoglobin concentration
    #[arg(long)]
    concentration: Option<f64>,

    /// Oxygenated fraction of hemoglobin (0-1)
    #[arg(long)]
    ratio: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and print the outcome as JSON
    Run {
        #[command(flatten)]
        tissue: TissueArgs,

        /// Exit with an error unless the run converged
        #[arg(long)]
        require_convergence: bool,
    },

    /// Scan wavelength x concentration x ratio and write an .npz table
    Sweep {
        #[arg(long, default_value = "660")]
        wavelength_start: f64,
        #[arg(long, default_value = "940")]
        wavelength_end: f64,
        #[arg(long, default_value = "1")]
        wavelength_steps: usize,

        #[arg(long, default_value = "0.15")]
        concentration_start: f64,
        #[arg(long, default_value = "0.15")]
        concentration_end: f64,
        #[arg(long, default_value = "1")]
        concentration_steps: usize,

        #[arg(long, default_value = "0.9")]
        ratio_start: f64,
        #[arg(long, default_value = "0.9")]
        ratio_end: f64,
        #[arg(long, default_value = "1")]
        ratio_steps: usize,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<RunConfig> {
    match path {
        Some(p) => {
            let display = p.display().to_string();
            RunConfig::from_file(&display).with_context(|| format!("loading {display}"))
        }
        None => Ok(RunConfig {
            scatter: ScatterConfig::reference(),
            simulation: SimulationSettings::default(),
        }),
    }
}

fn apply_engine(settings: &mut SimulationSettings, args: &EngineArgs) {
    if let Some(v) = args.batch_size {
        settings.batch_size = v;
    }
    if let Some(v) = args.max_iterations {
        settings.max_iterations = v;
    }
    if args.max_wall_time.is_some() {
        settings.max_wall_time_s = args.max_wall_time;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
}

fn apply_tissue(config: &mut ScatterConfig, args: &TissueArgs) {
    let overrides = [
        (&mut config.wavelength_nm, args.wavelength),
        (&mut config.distance_to_detector_1, args.distance_1),
        (&mut config.distance_to_detector_2, args.distance_2),
        (&mut config.half_width, args.half_width),
        (&mut config.thickness_skin, args.thickness_skin),
        (&mut config.thickness_muscle, args.thickness_muscle),
        (&mut config.thickness_bone, args.thickness_bone),
        (&mut config.concentration_blood, args.concentration),
        (&mut config.ratio_oxygen, args.ratio),
    ];
    for (field, value) in overrides {
        if let Some(v) = value {
            *field = v;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut run_config = load_config(cli.config.as_ref())?;
    apply_engine(&mut run_config.simulation, &cli.engine);

    match cli.command {
        Commands::Run {
            tissue,
            require_convergence,
        } => {
            apply_tissue(&mut run_config.scatter, &tissue);
            let outcome = scatter(&run_config.scatter, &run_config.simulation)
                .context("simulation failed")?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if require_convergence {
                outcome.into_converged()?;
            }
        }
        Commands::Sweep {
            wavelength_start,
            wavelength_end,
            wavelength_steps,
            concentration_start,
            concentration_end,
            concentration_steps,
            ratio_start,
            ratio_end,
            ratio_steps,
            output,
        } => {
            let grid = SweepGrid::linear(
                (wavelength_start, wavelength_end, wavelength_steps),
                (concentration_start, concentration_end, concentration_steps),
                (ratio_start, ratio_end, ratio_steps),
            );
            let table = run_sweep(&run_config.scatter, &run_config.simulation, &grid)
                .context("sweep failed")?;
            table
                .write_npz(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            log::info!(
                "wrote {} ({} of {} points converged)",
                output.display(),
                table.converged_points(),
                grid.len()
            );
        }
    }
    Ok(())
}
