use anyhow::{Context, Result};
use cbdc_map::config::MapConfig;
use cbdc_map::data::{FallbackWorld, FileFeatureSource};
use cbdc_map::logging;
use cbdc_map::map::{OrientationSource, Transform};
use cbdc_map::palette::{display_names, status_color_scale, Category, Dimension};
use cbdc_map::MapGraph;
use clap::{Parser, Subcommand};
use log::{debug, warn};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "World-map projections and category palettes as JSON")]
struct Args {
    /// JSON config file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// trace, debug, info, warn, error or off
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project features for a viewport and print path descriptors
    Project {
        #[arg(long)]
        width: f64,

        #[arg(long)]
        height: f64,

        /// Force the two-hemisphere layout
        #[arg(long, conflicts_with = "wide")]
        vertical: bool,

        /// Force the single world layout
        #[arg(long)]
        wide: bool,

        /// Zoom factor
        #[arg(long, default_value_t = 1.0)]
        k: f64,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f64,
    },

    /// Print the harmonic colour scale for a list of category names
    Palette {
        #[arg(long, default_value_t = Dimension::Country)]
        dimension: Dimension,

        names: Vec<String>,
    },

    /// Print the fixed status colour scale
    Status,

    /// Print display labels for category keys
    Labels,
}

#[derive(Serialize)]
struct ProjectOutput<'a> {
    projections: &'a [cbdc_map::map::FittedProjection],
    live: &'a [cbdc_map::map::Projection],
    paths: &'a [Vec<cbdc_map::map::PathDescriptor>],
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = args.log_level.as_deref().unwrap_or(logging::default_log_level());
    let _logger = logging::init_logging(level)?;

    let config = match &args.config {
        Some(path) => MapConfig::from_path(path).with_context(|| format!("loading config {}", path.display()))?,
        None => MapConfig::default(),
    };
    debug!("config: {config:?}");

    match args.command {
        Command::Project { width, height, vertical, wide, k, x, y } => {
            let mut graph = MapGraph::new(&config)?;

            let source = FileFeatureSource::from_config(&config.data);
            if source.exists() {
                graph.load_features(source);
            } else {
                warn!(
                    "{} not found, using the built-in world outline",
                    config.data.world_path.display()
                );
                graph.load_features(FallbackWorld);
            }

            graph.batch(|b| {
                if vertical {
                    b.set_orientation(OrientationSource::Fixed(true));
                } else if wide {
                    b.set_orientation(OrientationSource::Fixed(false));
                }
                b.set_viewport_size(width, height)?;
                b.set_transform(Transform::new(k, x, y)?)
            })?;
            graph.wait_feature_load();

            print_json(&ProjectOutput {
                projections: graph.projections(),
                live: graph.live_projections(),
                paths: graph.projected_data(),
            })?;
        }
        Command::Palette { dimension, names } => {
            let mut graph = MapGraph::new(&config)?;
            graph.set_categories(dimension, names.into_iter().map(Category::new).collect());
            print_json(graph.color_scale(dimension))?;
        }
        Command::Status => print_json(&status_color_scale())?,
        Command::Labels => {
            let labels: serde_json::Map<String, serde_json::Value> = display_names()
                .into_iter()
                .map(|(key, label)| (key.to_string(), label.into()))
                .collect();
            print_json(&labels)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{out}");
    Ok(())
}
