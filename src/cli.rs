// ============================================================================
// SpriteFE CLI: headless frame rendering via command-line arguments
// ============================================================================
//
// Usage examples:
//   SpriteFE -i walk_*.png -o frame2.png --frame 2 --onion --prev 2
//   SpriteFE -i sheet.png -o zoomed.png --zoom 3 --checker 8
//   SpriteFE -i a.png b.png -o out.png --blend multiply --no-tiled-bg
//
// Every input image becomes one frame of a single RGB layer. The composed
// frame is written with the `image` crate (format from the output extension).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use thiserror::Error;

use crate::document::{Document, OnionSkin};
use crate::raster::{PixelFormat, Raster};
use crate::render::checkerboard::{self, CheckerboardConfig, CheckerboardType};
use crate::render::{BlendMode, RenderEngine};
use crate::settings::{IniSettings, SettingsError};
use crate::sprite::{Cel, FrameNumber, LayerId, Sprite};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("no input files matched the given pattern(s)")]
    NoInputs,
    #[error("could not load '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("could not save '{path}': {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("unknown blend mode '{0}'")]
    UnknownBlendMode(String),
    #[error("frame {frame} is out of range (sprite has {count} frames)")]
    FrameOutOfRange { frame: FrameNumber, count: u32 },
    #[error("render target {width}x{height} could not be allocated")]
    Allocation { width: u32, height: u32 },
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// SpriteFE headless frame renderer.
#[derive(Parser, Debug)]
#[command(
    name = "SpriteFE",
    about = "Render one frame of a sprite built from image files",
    long_about = "Stack the input images as the frames of a one-layer sprite and\n\
                  render a frame at an integer zoom, with optional onion skin\n\
                  and checkerboard background.\n\n\
                  Example:\n  \
                  SpriteFE -i walk_*.png -o out.png --frame 1 --zoom 2 --onion"
)]
pub struct CliArgs {
    /// Input image(s), one per frame. Glob patterns accepted (e.g. "walk_*.png").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output image path. The format is inferred from the extension.
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Frame to render (0-based).
    #[arg(long, default_value_t = 0)]
    pub frame: FrameNumber,

    /// Zoom level; every sprite pixel becomes a 2^ZOOM square.
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=5))]
    pub zoom: u32,

    /// Horizontal scroll in output pixels.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub source_x: i32,

    /// Vertical scroll in output pixels.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub source_y: i32,

    /// Output width (defaults to the sprite width at the chosen zoom).
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height (defaults to the sprite height at the chosen zoom).
    #[arg(long)]
    pub height: Option<u32>,

    /// Blend mode of the layer: normal, multiply, screen, ...
    #[arg(long, default_value = "normal")]
    pub blend: String,

    /// Draw neighbouring frames as translucent ghosts.
    #[arg(long)]
    pub onion: bool,

    /// Number of previous frames shown by the onion skin.
    #[arg(long, default_value_t = 1)]
    pub prev: u32,

    /// Number of following frames shown by the onion skin.
    #[arg(long, default_value_t = 0)]
    pub next: u32,

    /// Opacity of the nearest ghost.
    #[arg(long, default_value_t = 68)]
    pub opacity_base: u8,

    /// Opacity lost per additional frame of distance.
    #[arg(long, default_value_t = 28)]
    pub opacity_step: u8,

    /// Clear to transparent instead of drawing the checkerboard.
    #[arg(long)]
    pub no_tiled_bg: bool,

    /// Checkerboard tile size (overrides the settings file).
    #[arg(long, value_parser = ["16", "8", "4", "2"])]
    pub checker: Option<String>,

    /// Settings file holding the checkerboard options.
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Log debug output and per-step timing.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the CLI and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    match run_inner(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_inner(args: &CliArgs) -> Result<(), CliError> {
    let start = Instant::now();

    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        return Err(CliError::NoInputs);
    }

    let mut frames = Vec::with_capacity(inputs.len());
    for path in &inputs {
        let img = image::open(path)
            .map_err(|source| CliError::Load { path: path.clone(), source })?
            .into_rgba8();
        log::debug!("loaded {} ({}x{})", path.display(), img.width(), img.height());
        frames.push(Raster::Rgb(img));
    }

    let blend_mode =
        BlendMode::from_name(&args.blend).ok_or_else(|| CliError::UnknownBlendMode(args.blend.clone()))?;

    let (mut document, layer) = build_document(frames, blend_mode);
    document.onion_skin = OnionSkin {
        enabled: args.onion,
        prev_frames: args.prev,
        next_frames: args.next,
        opacity_base: args.opacity_base,
        opacity_step: args.opacity_step,
    };

    let sprite = &document.sprite;
    if args.frame > sprite.last_frame() {
        return Err(CliError::FrameOutOfRange { frame: args.frame, count: sprite.frame_count() });
    }

    let checker = checker_config(args.settings.as_deref(), args.checker.as_deref())?;

    let width = args.width.unwrap_or_else(|| sprite.width() << args.zoom);
    let height = args.height.unwrap_or_else(|| sprite.height() << args.zoom);

    let engine = RenderEngine::new(&document, layer, args.frame).with_checkerboard(checker);
    let image = engine
        .render_sprite(args.source_x, args.source_y, width, height, args.frame, args.zoom, !args.no_tiled_bg)
        .ok_or(CliError::Allocation { width, height })?;

    image
        .save(&args.output)
        .map_err(|source| CliError::Save { path: args.output.clone(), source })?;

    log::info!(
        "rendered frame {} of {} -> {} ({:.0}ms)",
        args.frame,
        sprite.frame_count(),
        args.output.display(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// One RGB layer with one cel per frame, sized to the largest frame.
fn build_document(frames: Vec<Raster>, blend_mode: BlendMode) -> (Document, Option<LayerId>) {
    let width = frames.iter().map(Raster::width).max().unwrap_or(1);
    let height = frames.iter().map(Raster::height).max().unwrap_or(1);

    let mut sprite = Sprite::new(PixelFormat::Rgb, width, height);
    let layer = sprite.add_image_layer(None, "Layer 1");
    if let Some(id) = layer {
        if let Some(img) = sprite.layer_mut(id).and_then(|l| l.as_image_mut()) {
            img.blend_mode = blend_mode;
        }
        for (frame, raster) in frames.into_iter().enumerate() {
            let index = sprite.add_image(raster);
            sprite.set_cel(id, frame as FrameNumber, Cel::new(index));
        }
    }
    (Document::new(sprite), layer)
}

/// Checkerboard settings: the settings file (if any) loaded into the
/// process-wide config, then the `--checker` override.
fn checker_config(settings: Option<&Path>, checker: Option<&str>) -> Result<CheckerboardConfig, CliError> {
    if let Some(path) = settings {
        let store = IniSettings::load(path)?;
        checkerboard::load_config(&store);
    }
    let mut config = checkerboard::config();
    if let Some(kind) = checker.and_then(|s| s.parse().ok()).and_then(CheckerboardType::from_tile_size) {
        config.kind = kind;
    }
    Ok(config)
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
/// Glob matches are sorted so numbered frames load in order.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched: Vec<PathBuf> = entries.flatten().collect();
                if matched.is_empty() {
                    log::warn!("pattern '{}' matched no files", pattern);
                }
                matched.sort();
                for entry in matched {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                }
            }
            Err(e) => {
                log::warn!("invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}
