//! Command-line interface for antenna pattern plotting.

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{LineStyle, ParameterUpdate, PlotterConfig};
use crate::core::writers::write_stats_csv;
use crate::session::Session;

#[derive(Parser)]
#[command(name = "antenna-pattern")]
#[command(about = "Antenna radiation pattern normalization and plotting", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Normalization flags shared by rendering and statistics.
#[derive(Args, Debug, Clone)]
struct NormalizeArgs {
    /// Constant added to every sample in manual mode
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<f64>,
    /// Enable the manual offset
    #[arg(long)]
    manual: bool,
    /// Disable peak normalization and rotation
    #[arg(long)]
    no_auto: bool,
}

impl NormalizeArgs {
    fn apply(&self, update: &mut ParameterUpdate) {
        if let Some(offset) = self.offset {
            update.offset_value = offset;
        }
        if self.manual {
            update.offset_manual = true;
        }
        if self.no_auto {
            update.offset_auto = false;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render one or more pattern files into a single image
    Render {
        /// Gain files, one value per line
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Series colors in order (names or #rrggbb), repeatable
        #[arg(long = "color")]
        colors: Vec<String>,
        #[command(flatten)]
        normalize: NormalizeArgs,
        /// Radius scale factor
        #[arg(long)]
        scale: Option<f64>,
        /// Line style: solid, dashed, dotted, dashdot
        #[arg(long)]
        style: Option<LineStyle>,
        /// Line thickness in pixels
        #[arg(long)]
        thickness: Option<f64>,
        /// Render interpolated 3D surfaces instead of polar curves
        #[arg(long = "3d")]
        surface: bool,
        /// 3D view azimuth in degrees
        #[arg(long, allow_hyphen_values = true)]
        azimuth: Option<f64>,
        /// 3D view elevation in degrees
        #[arg(long, allow_hyphen_values = true)]
        elevation: Option<f64>,
        /// Write the image here instead of a fresh graph_<id>.png
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip legend and axis text
        #[arg(long)]
        no_text: bool,
    },

    /// Peak gain and angle of each file
    Stats {
        /// Gain files, one value per line
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        normalize: NormalizeArgs,
        /// Also write the statistics to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Count, range, mean and first samples of a file
    Preview {
        /// Gain file
        file: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Write the effective configuration as YAML
    InitConfig {
        /// Destination YAML file
        output: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Logging first so config loading can report
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let config = match &cli.config {
        Some(path) => match PlotterConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {:#}, using defaults",
                    path.display(),
                    e
                );
                PlotterConfig::default()
            }
        },
        None => PlotterConfig::default(),
    };

    match cli.command {
        Commands::Render {
            files,
            colors,
            normalize,
            scale,
            style,
            thickness,
            surface,
            azimuth,
            elevation,
            output,
            no_text,
        } => {
            let mut config = config;
            if no_text {
                config.render.draw_text = false;
            }
            let session = Session::new(config);
            let mut update = ParameterUpdate::from(session.params());
            normalize.apply(&mut update);
            if let Some(scale) = scale {
                update.scale_factor = scale;
            }
            if let Some(style) = style {
                update.line_style = style;
            }
            if let Some(thickness) = thickness {
                update.line_thickness = thickness;
            }
            update.is_3d = update.is_3d || surface;
            update.azimuth = azimuth.or(update.azimuth);
            update.elevation = elevation.or(update.elevation);

            cmd_render(session, files, colors, &update, output);
        }
        Commands::Stats {
            files,
            normalize,
            csv,
            json,
        } => {
            let mut session = Session::new(config);
            let mut update = ParameterUpdate::from(session.params());
            normalize.apply(&mut update);
            if let Err(e) = session.set_params(&update) {
                error!("{}", e);
                std::process::exit(1);
            }
            cmd_stats(session, files, csv.as_deref(), json);
        }
        Commands::Preview { file, json } => {
            cmd_preview(&Session::new(config), &file, json);
        }
        Commands::InitConfig { output } => match config.to_yaml(&output) {
            Ok(()) => println!("Wrote configuration to {}", output.display()),
            Err(e) => {
                error!("Failed to write {}: {:#}", output.display(), e);
                std::process::exit(1);
            }
        },
    }
}

fn cmd_render(
    mut session: Session,
    files: Vec<PathBuf>,
    colors: Vec<String>,
    update: &ParameterUpdate,
    output: Option<PathBuf>,
) {
    let start = Instant::now();

    if let Err(e) = session.load_files(files) {
        error!("{}", e);
        std::process::exit(1);
    }
    for color in colors {
        session.add_color(color);
    }
    if let Err(e) = session.set_params(update) {
        error!("{}", e);
        std::process::exit(1);
    }

    let params = session.params().clone();
    println!("Rendering {} file(s)...", session.files().len());
    println!("Projection: {:?}", params.projection);
    println!("Normalization: {:?}", params.normalization_mode());

    let spinner = create_spinner("Drawing...");

    let result = match &output {
        Some(path) => session.export(path).map(|legend| (path.clone(), legend)),
        None => session
            .render()
            .map(|artifact| (artifact.path, artifact.legend)),
    };

    spinner.finish_and_clear();

    match result {
        Ok((path, legend)) => {
            let legend_lines: Vec<(String, String)> = legend
                .iter()
                .map(|e| (e.label.clone(), format!("{} ({})", e.file, e.color)))
                .collect();

            let mut items = vec![
                ("Output image", path.display().to_string()),
                ("Series", legend.len().to_string()),
                ("Scale", params.scale_factor.to_string()),
                ("Line style", params.line_style.to_string()),
            ];
            if params.is_3d() {
                items.push(("Azimuth", format!("{}°", params.azimuth)));
                items.push(("Elevation", format!("{}°", params.elevation)));
            }
            items.extend(legend_lines.iter().map(|(k, v)| (k.as_str(), v.clone())));
            items.push(("Duration", format!("{:.2?}", start.elapsed())));

            print_summary("Render Complete", &items);
        }
        Err(e) => {
            error!("Render failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_stats(mut session: Session, files: Vec<PathBuf>, csv: Option<&Path>, json: bool) {
    if let Err(e) = session.load_files(files) {
        error!("{}", e);
        std::process::exit(1);
    }

    let stats = match session.stats() {
        Ok(stats) => stats,
        Err(e) => {
            error!("Statistics failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = csv {
        match write_stats_csv(path, &stats) {
            Ok(()) => info!("Wrote statistics to {}", path.display()),
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
    }

    if json {
        match serde_json::to_string_pretty(&stats) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("Failed to serialize statistics: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let items: Vec<(&str, String)> = stats
        .iter()
        .map(|s| {
            (
                s.file.as_str(),
                format!("{:.2} dB at {:.1}°", s.peak_gain, s.peak_angle_degrees),
            )
        })
        .collect();
    print_summary("Peak Statistics", &items);
}

fn cmd_preview(session: &Session, file: &Path, json: bool) {
    let preview = match session.preview(file) {
        Ok(p) => p,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&preview) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("Failed to serialize preview: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let sample: Vec<String> = preview.sample.iter().map(|v| format!("{:.2}", v)).collect();
    let suffix = if preview.truncated { ", ..." } else { "" };

    print_summary(
        "Data Preview",
        &[
            ("File", preview.file_name.clone()),
            ("Points", preview.points.to_string()),
            ("Min", format!("{:.3}", preview.min)),
            ("Max", format!("{:.3}", preview.max)),
            ("Mean", format!("{:.3}", preview.mean)),
            ("First samples", format!("{}{}", sample.join(", "), suffix)),
        ],
    );
}
