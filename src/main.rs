use clap::{Parser, Subcommand};
use isochrone_islands::sample::read_samples_csv;
use isochrone_islands::utils::result_to_geojson;
use isochrone_islands::{IslandPipeline, IsochroneError, PipelineConfig};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "isochrone-islands",
    about = "Turn travel time samples into nested isochrone islands"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bin, cluster and outline samples, writing a GeoJSON FeatureCollection
    Run {
        /// CSV with lng,lat,travel_time_seconds columns
        #[arg(long)]
        samples: PathBuf,
        /// TOML pipeline configuration
        #[arg(long)]
        config: PathBuf,
        /// GeoJSON destination, stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        max_bands: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Process bands on separate threads
        #[arg(long)]
        concurrent: bool,
    },
    /// Print the destination lattice from the configuration as lng,lat CSV
    Lattice {
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli.command) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), IsochroneError> {
    match command {
        Command::Run {
            samples,
            config,
            output,
            max_bands,
            seed,
            concurrent,
        } => {
            let mut config = PipelineConfig::from_toml_file(&config)?;
            if let Some(seed) = seed {
                config.seed = seed;
            }
            let pipeline = IslandPipeline::new(&config)?;
            log::info!(
                "processing {} with cutoffs {:?} and epsilon {}",
                config.data_name(),
                pipeline.schedule().as_slice(),
                pipeline.epsilon()
            );

            let samples = read_samples_csv(File::open(&samples)?)?;
            let result = if concurrent {
                pipeline.run_concurrently(&samples, max_bands)?
            } else {
                pipeline.run(&samples, max_bands)?
            };
            if result.failed_islands() > 0 {
                log::warn!(
                    "{} islands have no boundary and are left out of the output",
                    result.failed_islands()
                );
            }

            let geojson = result_to_geojson(&result).to_string();
            match output {
                Some(path) => {
                    let mut file = File::create(&path)?;
                    file.write_all(geojson.as_bytes())?;
                    log::info!("wrote {}", path.display());
                }
                None => println!("{}", geojson),
            }
            Ok(())
        }
        Command::Lattice { config } => {
            let config = PipelineConfig::from_toml_file(&config)?;
            let lattice = config.lattice.as_ref().ok_or_else(|| {
                IsochroneError::Configuration("no [lattice] section in configuration".to_string())
            })?;
            let lattice = lattice.build()?;
            log::info!("{} lattice points, epsilon {}", lattice.len(), lattice.epsilon());

            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["lng", "lat"])?;
            for point in lattice.points() {
                writer.write_record([point.lng.to_string(), point.lat.to_string()])?;
            }
            writer.flush()?;
            Ok(())
        }
    }
}
