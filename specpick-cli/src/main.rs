//! specpick command-line interface.
//!
//! Loads an IFU cube, builds an extraction session, applies spaxel
//! selections, and writes the extracted spectrum or a picker image.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::redundant_closure_for_method_calls,
    clippy::too_many_lines
)]

mod colormap;
mod render;
mod util;

use clap::{ArgAction, Parser, Subcommand};
use colormap::Colormap;
use specpick_core::{collapsed_image, DisplayNorm, ExtractorConfig, SpectrumSession, Stretch};
use specpick_io::{load_cube, load_mask, save_mask, write_spectrum, CubeLoadOptions};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    SpecpickIo(#[from] specpick_io::Error),

    #[error("{0}")]
    Core(#[from] specpick_core::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    Argument(String),
}

/// A spaxel given as `Y,X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelArg {
    y: usize,
    x: usize,
}

/// A rectangle of spaxels given as `Y0:Y1,X0:X1` (half-open).
#[derive(Debug, Clone, PartialEq, Eq)]
struct BoxArg {
    rows: Range<usize>,
    cols: Range<usize>,
}

fn parse_index(s: &str) -> std::result::Result<usize, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("{s:?} is not a non-negative integer"))
}

fn parse_pixel(s: &str) -> std::result::Result<PixelArg, String> {
    let (y, x) = s
        .split_once(',')
        .ok_or_else(|| format!("expected Y,X but got {s:?}"))?;
    Ok(PixelArg {
        y: parse_index(y)?,
        x: parse_index(x)?,
    })
}

fn parse_range(s: &str) -> std::result::Result<Range<usize>, String> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| format!("expected START:END but got {s:?}"))?;
    let range = parse_index(start)?..parse_index(end)?;
    if range.is_empty() {
        return Err(format!("empty range {s:?}"));
    }
    Ok(range)
}

fn parse_box(s: &str) -> std::result::Result<BoxArg, String> {
    let (rows, cols) = s
        .split_once(',')
        .ok_or_else(|| format!("expected Y0:Y1,X0:X1 but got {s:?}"))?;
    Ok(BoxArg {
        rows: parse_range(rows)?,
        cols: parse_range(cols)?,
    })
}

/// Spaxel selection and spectrum extraction for IFU data cubes.
#[derive(Parser)]
#[command(name = "specpick")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by commands that open a cube.
#[derive(clap::Args, Clone, Debug)]
struct CubeArgs {
    /// Input cube (FITS, or HDF5 with the `hdf5` feature)
    input: PathBuf,

    /// JSON configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Flux extension name
    #[arg(long)]
    sci: Option<String>,

    /// Error extension name
    #[arg(long)]
    err: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show shape, units, and wavelength coverage of a cube
    Info {
        #[command(flatten)]
        cube: CubeArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract the summed spectrum of selected spaxels
    Extract {
        #[command(flatten)]
        cube: CubeArgs,

        /// Output table (.ecsv or .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Toggle one spaxel, as Y,X (repeatable)
        #[arg(long = "pixel", value_parser = parse_pixel)]
        pixels: Vec<PixelArg>,

        /// Select a half-open box, as Y0:Y1,X0:X1 (repeatable)
        #[arg(long = "box", value_parser = parse_box)]
        boxes: Vec<BoxArg>,

        /// Start from a saved selection mask
        #[arg(long)]
        mask_file: Option<PathBuf>,

        /// Save the final selection mask as JSON
        #[arg(long)]
        save_mask: Option<PathBuf>,

        /// Source redshift
        #[arg(long)]
        redshift: Option<f64>,

        /// Write a quicklook plot of the spectrum
        #[arg(long)]
        plot: Option<PathBuf>,

        /// Label spaxels with sky coordinates
        #[arg(long)]
        sky: bool,
    },

    /// Render the picker image with the selection overlaid
    Picker {
        #[command(flatten)]
        cube: CubeArgs,

        /// Output PNG
        #[arg(short, long)]
        output: PathBuf,

        /// Colormap (gist_gray, hot, viridis, RdBu)
        #[arg(long)]
        cmap: Option<String>,

        /// Stretch (linear, sqrt, log, asinh)
        #[arg(long)]
        stretch: Option<Stretch>,

        /// Lower display cut
        #[arg(long, requires = "vmax")]
        vmin: Option<f64>,

        /// Upper display cut
        #[arg(long, requires = "vmin")]
        vmax: Option<f64>,

        /// Selection mask to overlay
        #[arg(long)]
        mask_file: Option<PathBuf>,

        /// Output pixels per spaxel
        #[arg(long, default_value = "8")]
        scale: u32,

        /// Sum over wavelength instead of taking the median
        #[arg(long)]
        sum: bool,
    },
}

fn resolve_config(args: &CubeArgs) -> Result<ExtractorConfig> {
    let mut config = match &args.config {
        Some(path) => ExtractorConfig::from_file(path)?,
        None => ExtractorConfig::default(),
    };
    if args.sci.is_some() || args.err.is_some() {
        let sci = args.sci.clone().unwrap_or_else(|| config.sci_extension.clone());
        let err = args.err.clone().unwrap_or_else(|| config.err_extension.clone());
        config = config.with_extensions(sci, err);
    }
    Ok(config)
}

/// Loads the cube and starts a session. With `picker_sum` the picker image is
/// the finite sum over wavelength instead of the median.
fn open_session(
    args: &CubeArgs,
    config: ExtractorConfig,
    picker_sum: bool,
) -> Result<SpectrumSession> {
    let start = Instant::now();
    let cube = load_cube(&args.input, &CubeLoadOptions::from(&config))?;
    log::info!(
        "loaded {} in {:.2}s",
        args.input.display(),
        start.elapsed().as_secs_f64()
    );
    let picker = picker_sum.then(|| collapsed_image(cube.data()));
    Ok(SpectrumSession::new(cube, config, picker)?)
}

fn plot_path(output: &Path) -> PathBuf {
    output.with_extension("png")
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli.command) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Info { cube, json } => {
            let config = resolve_config(&cube)?;
            let session = open_session(&cube, config, false)?;
            let loaded = session.cube();
            let (nz, ny, nx) = loaded.shape();
            let axes = session.wavelengths();
            let range = axes.observed.range();
            let center = loaded
                .celestial_wcs()
                .map(|wcs| {
                    wcs.pixel_to_sky((ny.saturating_sub(1) / 2) as f64, (nx.saturating_sub(1) / 2) as f64)
                });

            if json {
                let summary = serde_json::json!({
                    "file": cube.input.display().to_string(),
                    "shape": [nz, ny, nx],
                    "flux_unit": loaded.flux_unit().symbol(),
                    "wavelength_unit": axes.observed.unit.symbol(),
                    "wavelength_range": range.map(|(lo, hi)| [lo, hi]),
                    "pixar_sr": loaded.pixel_area_sr(),
                    "center_sky": center.map(|c| [c.ra_deg, c.dec_deg]),
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("File: {}", cube.input.display());
                println!("Shape: {} x {} x {} (spectral, y, x)", nz, ny, nx);
                println!("Flux unit: {}", loaded.flux_unit());
                if let Some((lo, hi)) = range {
                    println!(
                        "Wavelength: {:.6} - {:.6} {}",
                        lo, hi, axes.observed.unit
                    );
                }
                if let Some(area) = loaded.pixel_area_sr() {
                    println!("PIXAR_SR: {:e}", area);
                }
                if let Some(sky) = center {
                    println!(
                        "Center spaxel: RA {:.6}, Dec {:+.6}",
                        sky.ra_deg, sky.dec_deg
                    );
                }
            }
        }

        Commands::Extract {
            cube,
            output,
            pixels,
            boxes,
            mask_file,
            save_mask: save_mask_path,
            redshift,
            plot,
            sky,
        } => {
            let mut config = resolve_config(&cube)?;
            if let Some(z) = redshift {
                config = config.with_redshift(z);
            }
            if let Some(path) = &output {
                config = config.with_output_path(path.display().to_string());
            }
            if plot.is_some() {
                config = config.with_plot_output(true);
            }
            if sky {
                config = config.with_celestial_coordinates(true);
            }

            let mut session = open_session(&cube, config, false)?;
            if let Some(path) = &mask_file {
                session.replace_selection(load_mask(path)?)?;
            }
            for b in &boxes {
                session.select_box(b.rows.clone(), b.cols.clone())?;
            }
            for p in &pixels {
                let state = session.toggle(p.y, p.x)?;
                log::info!(
                    "{} {}",
                    session.pixel_label(p.y, p.x),
                    if state { "selected" } else { "deselected" }
                );
            }

            let count = session.current_mask().count();
            let spectrum = session.commit()?.clone();

            let out = PathBuf::from(&session.config().output_path);
            let format = write_spectrum(&out, &spectrum)?;
            println!(
                "Extracted {} channels from {} spaxel(s) -> {} ({:?})",
                spectrum.len(),
                count,
                out.display(),
                format
            );

            if session.config().plot_output {
                let path = plot.unwrap_or_else(|| plot_path(&out));
                render::render_spectrum(&spectrum).save(&path)?;
                println!("Plot: {}", path.display());
            }
            if let Some(path) = save_mask_path {
                save_mask(&path, session.current_mask())?;
                println!("Mask: {}", path.display());
            }
        }

        Commands::Picker {
            cube,
            output,
            cmap,
            stretch,
            vmin,
            vmax,
            mask_file,
            scale,
            sum,
        } => {
            let mut config = resolve_config(&cube)?;
            if let Some(name) = cmap {
                config = config.with_colormap(name);
            }
            if let (Some(lo), Some(hi)) = (vmin, vmax) {
                config = config.with_norm(DisplayNorm::new(lo, hi, stretch.unwrap_or_default()));
            }
            let colormap: Colormap = config.colormap.parse().map_err(CliError::Argument)?;

            let mut session = open_session(&cube, config, sum)?;
            if let Some(path) = &mask_file {
                session.replace_selection(load_mask(path)?)?;
            }

            let norm = match (session.norm(), stretch) {
                (Some(norm), Some(s)) => Some(DisplayNorm::new(norm.vmin, norm.vmax, s)),
                (norm, _) => norm.copied(),
            };
            let selection = mask_file.as_ref().map(|_| session.current_mask());
            let png = render::render_picker(
                session.picker_image(),
                norm.as_ref(),
                colormap,
                selection,
                scale,
            )?;
            png.save(&output)?;
            println!(
                "Picker image {}x{} ({}) -> {}",
                png.width(),
                png.height(),
                colormap,
                output.display()
            );
        }
    }

    Ok(())
}
