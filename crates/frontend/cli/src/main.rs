use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use overlay_core::logging::{LogCategory, LogConfig, LogLevel};
use overlay_core::{PixelFormat, Rgb, Surface};
use overlay_ui::{EventOutcome, OverlaySettings, OverlayStack, SimulatedMachine};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

mod script;

use script::Step;

/// Stand-in for the emulated picture under the overlays
const BACKDROP: Rgb = Rgb::new(0x20, 0x20, 0x20);

#[derive(Parser)]
#[command(name = "ovl", about = "Drive the emulator overlays headlessly")]
struct Args {
    /// Display color depth in bits per pixel: 16 or 32
    #[arg(long, default_value_t = 16)]
    depth: u8,

    /// Display width in pixels
    #[arg(long, default_value_t = 320)]
    width: u32,

    /// Display height in pixels
    #[arg(long, default_value_t = 240)]
    height: u32,

    /// Key binding settings (JSON); defaults are used when absent
    #[arg(long)]
    settings: Option<PathBuf>,

    /// JSON list of input steps to replay
    #[arg(long)]
    script: Option<PathBuf>,

    /// Write the last rendered frame to this PNG file
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Write the final machine state here instead of stdout
    #[arg(long)]
    state: Option<PathBuf>,

    /// Global overlay log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Per-category log level, e.g. --log menu=debug (repeatable)
    #[arg(long = "log", value_name = "CATEGORY=LEVEL")]
    log: Vec<String>,

    /// Send overlay logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report<'a> {
    steps_run: usize,
    frames: u32,
    exit_requested: bool,
    menu_active: bool,
    pointer_enabled: bool,
    pointer_position: (f32, f32),
    machine: &'a SimulatedMachine,
}

fn parse_level(name: &str) -> Result<LogLevel> {
    LogLevel::from_str(name).ok_or_else(|| anyhow!("Unknown log level: {}", name))
}

fn configure_logging(args: &Args) -> Result<()> {
    let config = LogConfig::global();
    config.set_global_level(parse_level(&args.log_level)?);

    for spec in &args.log {
        let (category, level) = spec
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected CATEGORY=LEVEL, got {}", spec))?;
        let category = LogCategory::from_str(category)
            .ok_or_else(|| anyhow!("Unknown log category: {}", category))?;
        config.set_level(category, parse_level(level)?);
    }

    if let Some(path) = &args.log_file {
        config
            .set_log_file(path.clone())
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
    }
    Ok(())
}

/// Convert a display surface to 8-bit RGB and write it as PNG
fn dump_png(surface: &Surface, path: &Path) -> Result<()> {
    let format = surface.format();
    let mut data = Vec::with_capacity(surface.width() as usize * surface.height() as usize * 3);
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            let rgb = format.unmap(surface.get_pixel(x, y));
            data.extend_from_slice(&[rgb.r, rgb.g, rgb.b]);
        }
    }

    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), surface.width(), surface.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    configure_logging(&args)?;

    if args.width == 0 || args.height == 0 {
        bail!("Display size must be non-zero");
    }
    let format = PixelFormat::from_depth(args.depth)?;

    let settings = match &args.settings {
        Some(path) => OverlaySettings::load(path),
        None => OverlaySettings::default(),
    };
    let steps = match &args.script {
        Some(path) => script::load(path)?,
        None => Vec::new(),
    };

    let mut machine = SimulatedMachine::new();
    let mut overlays = OverlayStack::new(args.depth, &settings)?;
    let mut display = Surface::new(args.width, args.height, format);
    let backdrop = display.map_rgb(BACKDROP);
    display.fill(backdrop);

    let mut frames = 0u32;
    let mut steps_run = 0usize;
    let mut exit_requested = false;

    'script: for (i, step) in steps.iter().enumerate() {
        steps_run = i + 1;
        if let Step::Frames { count } = step {
            for _ in 0..*count {
                display.fill(backdrop);
                overlays.render(&mut display, &mut machine);
                frames += 1;
            }
            continue;
        }

        for event in step.events()? {
            match overlays.handle_event(&event, &mut machine) {
                EventOutcome::Exit => {
                    log::info!("Exit requested at step {}", i);
                    exit_requested = true;
                    break 'script;
                }
                EventOutcome::Ignored => {
                    log::debug!("Step {}: {:?} reached the machine", i, event);
                }
                EventOutcome::Consumed => {}
            }
        }
    }

    // Always finish with the overlays composited on the last frame
    if frames == 0 {
        overlays.render(&mut display, &mut machine);
    }

    if let Some(path) = &args.dump {
        dump_png(&display, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote frame to {}", path.display());
    }

    let report = Report {
        steps_run,
        frames,
        exit_requested,
        menu_active: overlays.menu.is_active(),
        pointer_enabled: overlays.pointer.is_enabled(),
        pointer_position: overlays.pointer.position(),
        machine: &machine,
    };
    let json = serde_json::to_string_pretty(&report)?;
    match &args.state {
        Some(path) => {
            let mut f = File::create(path)?;
            writeln!(f, "{}", json)?;
        }
        None => writeln!(io::stdout(), "{}", json)?,
    }

    overlays.deinit();
    LogConfig::global().clear_log_file();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["ovl"]);
        assert_eq!(args.depth, 16);
        assert_eq!((args.width, args.height), (320, 240));
        assert_eq!(args.log_level, "warn");
        assert!(args.log.is_empty());
    }

    #[test]
    fn test_args_repeatable_log_flag() {
        let args = Args::parse_from([
            "ovl",
            "--depth",
            "32",
            "--log",
            "menu=debug",
            "--log",
            "pointer=trace",
        ]);
        assert_eq!(args.depth, 32);
        assert_eq!(args.log, vec!["menu=debug", "pointer=trace"]);
    }

    #[test]
    fn test_dump_png_writes_file() {
        let mut surface = Surface::new(4, 2, PixelFormat::Rgb565);
        let blue = surface.map_rgb(Rgb::BLUE);
        surface.fill(blue);

        let path = std::env::temp_dir().join("ovl_dump_test.png");
        dump_png(&surface, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        std::fs::remove_file(&path).unwrap();
    }
}
