//! Command line arguments

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use lumen_renderer::{RenderMode, RenderSettings, ScenePreset};

/// Parses the command line into [Arguments]
pub fn parse_args() -> Arguments {
    Arguments::parse()
}

/// Scenes selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneArg {
    Showcase,
    BookCover,
    Lights,
}

impl From<SceneArg> for ScenePreset {
    fn from(scene: SceneArg) -> Self {
        match scene {
            SceneArg::Showcase => ScenePreset::Showcase,
            SceneArg::BookCover => ScenePreset::BookCover,
            SceneArg::Lights => ScenePreset::Lights,
        }
    }
}

/// Render a scene progressively and write the converged frame to disk.
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Arguments {
    /// The path to write the final frame into
    #[clap(
        short,
        long,
        value_parser = valid_image_file,
        default_value = "lumen.png",
        value_name = "FILE"
    )]
    pub output: PathBuf,

    /// The preset scene to render
    #[clap(short, long, value_enum, default_value_t = SceneArg::Showcase)]
    pub scene: SceneArg,

    /// JSON render settings; built-in defaults when omitted
    #[clap(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// OBJ model shown in the showcase scene instead of the box
    #[clap(long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Override the number of passes per pixel
    #[clap(short = 'n', long = "samples", value_name = "NUM")]
    pub samples: Option<u32>,

    /// Shift the bounce limit by this amount (clamped to 0..=5000)
    #[clap(short, long, allow_hyphen_values = true, value_name = "DELTA")]
    pub bounces: Option<i64>,

    /// Render into the big buffer
    #[clap(long)]
    pub hires: bool,

    /// Flat albedo preview
    #[clap(long)]
    pub fast: bool,

    /// Paint the focus plane as a cyan band
    #[clap(long)]
    pub show_focus: bool,

    /// Focus on the center of the view before rendering
    #[clap(long)]
    pub autofocus: bool,

    /// Spend the whole sample budget in one tick
    #[clap(long)]
    pub all_at_once: bool,

    /// Write every Nth progressive frame next to the output
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..), value_name = "N")]
    pub snapshot_every: Option<u32>,

    /// Simulated seconds per tick
    #[clap(long, default_value_t = 1.0 / 60.0, value_name = "SECONDS")]
    pub tick: f64,

    /// The seed used for pseudorandom number generation
    #[clap(long)]
    pub seed: Option<u64>,
}

impl Arguments {
    /// Fold command line overrides into loaded settings.
    pub fn apply_to(&self, settings: &mut RenderSettings) {
        if let Some(samples) = self.samples {
            settings.samples_limit = samples;
        }
        if self.all_at_once {
            settings.render_mode = RenderMode::AllAtOnce;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
    }
}

/// Checks whether the output path names an image format this build can write
fn valid_image_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    match image::ImageFormat::from_path(&path).and_then(valid_image_format) {
        Ok(_) => Ok(path),
        Err(e) => Err(e.to_string()),
    }
}

fn valid_image_format(format: image::ImageFormat) -> image::ImageResult<()> {
    use image::{error, ImageOutputFormat};
    match ImageOutputFormat::from(format) {
        ImageOutputFormat::Unsupported(_) => Err(error::ImageError::Unsupported(
            error::UnsupportedError::from(error::ImageFormatHint::from(format)),
        )),
        _ => Ok(()),
    }
}
