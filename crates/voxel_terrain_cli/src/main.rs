//! Terrain generator.
//!
//! Loads a `TerrainConfig` from TOML (or uses the defaults), builds every
//! chunk once with the selected strategy and logs the build report.
//!
//! ```text
//! RUST_LOG=info terrain_gen --config terrain.toml --strategy cpu_threaded --threads 8
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use voxel_terrain::{
  DensityField, GenerationStrategy, LayeredNoiseTerrain, SphereDensity, TerrainBuildContext, TerrainConfig,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
  CpuSync,
  CpuThreaded,
  CpuGpuHybrid,
  GpuResident,
}

impl From<StrategyArg> for GenerationStrategy {
  fn from(arg: StrategyArg) -> Self {
    match arg {
      StrategyArg::CpuSync => GenerationStrategy::CpuSync,
      StrategyArg::CpuThreaded => GenerationStrategy::CpuThreaded,
      StrategyArg::CpuGpuHybrid => GenerationStrategy::CpuGpuHybrid,
      StrategyArg::GpuResident => GenerationStrategy::GpuResident,
    }
  }
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum DensityArg {
  /// Layered noise terrain from the config's noise parameters.
  #[default]
  Noise,
  /// Sphere filling 40% of the smallest terrain extent.
  Sphere,
}

/// Chunked Marching Cubes terrain generator.
#[derive(Parser, Debug)]
#[command(name = "terrain_gen")]
#[command(about = "Generates a chunked Marching Cubes terrain and reports the build")]
struct Args {
  /// Path to a TerrainConfig TOML file (defaults when omitted).
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Override the configured generation strategy.
  #[arg(short, long, value_enum)]
  strategy: Option<StrategyArg>,

  /// Worker threads for the threaded strategy (0 = one per core).
  #[arg(short, long)]
  threads: Option<usize>,

  /// Density source.
  #[arg(short, long, value_enum, default_value_t = DensityArg::Noise)]
  density: DensityArg,

  /// Log the derived chunk layout before building.
  #[arg(long)]
  log_parameters: bool,
}

fn density_field(kind: DensityArg, config: &TerrainConfig) -> Arc<dyn DensityField> {
  match kind {
    DensityArg::Noise => Arc::new(LayeredNoiseTerrain::from_config(config)),
    DensityArg::Sphere => {
      let smallest = config.terrain_size.iter().copied().fold(f32::INFINITY, f32::min);
      Arc::new(SphereDensity::at_origin(smallest * 0.4))
    }
  }
}

fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  let args = Args::parse();

  let mut config = match &args.config {
    Some(path) => {
      TerrainConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))?
    }
    None => TerrainConfig::default(),
  };
  if let Some(strategy) = args.strategy {
    config = config.with_strategy(strategy.into());
  }
  if let Some(threads) = args.threads {
    config = config.with_worker_threads(threads);
  }
  config.log_terrain_parameters |= args.log_parameters;

  let field = density_field(args.density, &config);
  let mut terrain = TerrainBuildContext::new(config, field).context("Invalid terrain configuration")?;
  let report = terrain.build();

  tracing::info!(
    completed = report.completed_chunks,
    total = report.total_chunks,
    vertices = report.vertices,
    density_failures = report.density_failures,
    degenerate_triangles = report.degenerate_triangles,
    "build report"
  );
  for (coord, err) in &report.failed {
    tracing::warn!(chunk = %coord, %err, "chunk has no geometry");
  }

  if report.is_complete() {
    Ok(())
  } else {
    anyhow::bail!("{} of {} chunks failed", report.failed.len(), report.total_chunks)
  }
}
