// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use canonical_error::{CanonicalError, internal_error};
use clap::Parser;
use log::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry, EnvFilter};

use tess_waldo::mast_client::{DEFAULT_MAST_URL, MastClient};
use tess_waldo::mosaic_plot::{MosaicLayout, PlotSettings, render_image, save_png};
use tess_waldo::observation_table::to_json;
use tess_waldo::target_locator::{LocatorSettings, TargetLocation};
use tess_waldo::tess_point_subprocess::TessPointSubprocess;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about=None)]
struct Args {
    /// Name of the target, e.g. "Pi Men" or "TIC 261136679".
    target: String,

    /// Where to write the camera mosaic image (PNG).
    #[arg(long, default_value = "waldo.png")]
    output: PathBuf,

    /// Also write the observation table to this JSON file.
    #[arg(long)]
    table: Option<PathBuf>,

    /// Python interpreter that has the tess-point package installed.
    #[arg(long, default_value = "python3")]
    python: String,

    /// Base URL of the MAST services.
    #[arg(long, default_value = DEFAULT_MAST_URL)]
    mast_url: String,

    /// Timeout for each MAST request, seconds. Omit to wait indefinitely.
    #[arg(long, value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Highest sector whose camera layout is supported.
    #[arg(long, default_value = "13")]
    max_sector: u32,

    /// Warn when the catalog match is farther than this from the target,
    /// arcseconds.
    #[arg(long, default_value = "0.2")]
    max_match_distance: f64,

    /// Width of the image and height of each camera panel, pixels.
    #[arg(long, default_value = "600")]
    panel_size: u32,
}

// Adapted from
// https://stackoverflow.com/questions/72313616/using-claps-deriveparser-how-can-i-accept-a-stdtimeduration
fn parse_duration(arg: &str)
                  -> Result<Duration, Box<dyn std::error::Error + Send + Sync>> {
    let seconds = arg.parse()?;
    Ok(Duration::try_from_secs_f32(seconds)?)
}

fn run(args: &Args) -> Result<(), CanonicalError> {
    let mast = MastClient::new(&args.mast_url, args.timeout)?;
    let tess_point = TessPointSubprocess::new(&args.python);
    let settings = LocatorSettings {
        max_sector: args.max_sector,
        max_match_distance_arcsec: args.max_match_distance,
    };
    let location = TargetLocation::locate(&args.target, &mast, &tess_point, &mast, &settings)?;
    for obs in location.observations() {
        info!("Sector {:2} camera {} ccd {} col {:8.2} row {:8.2} ({})",
              obs.sector, obs.camera, obs.ccd, obs.col_pix, obs.row_pix,
              location.availability(obs.sector));
    }

    if let Some(table_path) = &args.table {
        fs::write(table_path, to_json(&location)?).map_err(|e| internal_error(
            format!("Could not write file {:?}: {:?}", table_path, e).as_str()))?;
        info!("Wrote observation table to {:?}", table_path);
    }

    let plot_settings = PlotSettings {
        panel_size: args.panel_size,
        ..Default::default()
    };
    let layout = MosaicLayout::new(&location, &plot_settings)?;
    let image = render_image(&layout, &plot_settings)?;
    save_png(&image, &args.output)
}

fn main() -> ExitCode {
    registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();
    let args = Args::parse();
    info!("Locating {:?}", args.target);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}
