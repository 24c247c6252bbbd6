//! Pipeline parameters from command-line flags and shell settings.

use clap::Args;
use color_eyre::eyre::{Result, WrapErr, bail};
use malldir_pipeline::{PipelineParameters, RectilinearSnap};

/// One flag per pipeline parameter.
#[derive(Debug, Args)]
pub struct ParamArgs {
    /// Canny low threshold (0-255).
    #[arg(long, default_value_t = PipelineParameters::DEFAULT_CANNY_LOW)]
    canny_low: u8,

    /// Canny high threshold (0-255).
    #[arg(long, default_value_t = PipelineParameters::DEFAULT_CANNY_HIGH)]
    canny_high: u8,

    /// Simplification tolerance as a percentage (0-20) of each contour's perimeter.
    #[arg(long, default_value_t = PipelineParameters::DEFAULT_APPROX_EPSILON_PERCENT)]
    approx_epsilon_percent: f64,

    /// Minimum enclosed area in pixels.
    #[arg(long, default_value_t = PipelineParameters::DEFAULT_MIN_AREA)]
    min_area: u32,

    /// Longest side of the processed image; larger images are downscaled.
    #[arg(long, default_value_t = PipelineParameters::DEFAULT_MAX_DIMENSION, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    max_dimension: u32,

    /// Blur a grayscale copy instead of binarizing (photographs, faint scans).
    #[arg(long)]
    no_binarize: bool,

    /// Invert the binarized mask.
    #[arg(long)]
    invert_binary: bool,

    /// Side of the square opening kernel; 0 disables.
    #[arg(long, default_value_t = PipelineParameters::DEFAULT_MORPH_KERNEL_SIZE)]
    morph_kernel_size: u8,

    /// Snap near-axis edges to exact right angles.
    #[arg(long)]
    rectilinear: bool,

    /// Angle tolerance in degrees for --rectilinear.
    #[arg(long, default_value_t = RectilinearSnap::DEFAULT_ANGLE_TOLERANCE_DEG)]
    angle_tolerance: f64,

    /// Grid spacing in pixels for --rectilinear; 0 disables.
    #[arg(long, default_value_t = RectilinearSnap::DEFAULT_GRID_SNAP)]
    grid_snap: f64,

    /// Full parameter set as a JSON string.
    ///
    /// When provided, all other parameter flags are ignored. Missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

impl ParamArgs {
    /// Assemble the parameter set.
    ///
    /// # Errors
    ///
    /// Fails if `--config-json` is not a valid parameter set.
    pub fn to_parameters(&self) -> Result<PipelineParameters> {
        if let Some(json) = &self.config_json {
            return serde_json::from_str(json).wrap_err("Error parsing --config-json");
        }

        Ok(PipelineParameters {
            canny_low: self.canny_low,
            canny_high: self.canny_high,
            approx_epsilon_percent: self.approx_epsilon_percent,
            min_area: self.min_area,
            max_dimension: self.max_dimension,
            binarize: !self.no_binarize,
            invert_binary: self.invert_binary,
            morph_kernel_size: self.morph_kernel_size,
            rectilinear: self.rectilinear.then_some(RectilinearSnap {
                angle_tolerance_deg: self.angle_tolerance,
                grid_snap: self.grid_snap,
            }),
        })
    }
}

/// Names accepted by [`apply_setting`].
pub const SETTING_NAMES: &[&str] = &[
    "canny_low",
    "canny_high",
    "approx_epsilon_percent",
    "min_area",
    "max_dimension",
    "binarize",
    "invert_binary",
    "morph_kernel_size",
    "rectilinear",
    "angle_tolerance",
    "grid_snap",
];

/// Change one parameter by name from its textual value.
///
/// Setting `angle_tolerance` or `grid_snap` turns rectilinear snapping on.
///
/// # Errors
///
/// Fails for an unknown name or a value that does not parse.
pub fn apply_setting(params: &mut PipelineParameters, name: &str, value: &str) -> Result<()> {
    let number = |what: &str| -> Result<f64> {
        value
            .parse::<f64>()
            .wrap_err_with(|| format!("{what} expects a number, got {value:?}"))
    };
    let integer = |what: &str| -> Result<u32> {
        value
            .parse::<u32>()
            .wrap_err_with(|| format!("{what} expects a whole number, got {value:?}"))
    };
    let byte = |what: &str| -> Result<u8> {
        value
            .parse::<u8>()
            .wrap_err_with(|| format!("{what} expects 0-255, got {value:?}"))
    };

    match name {
        "canny_low" => params.canny_low = byte(name)?,
        "canny_high" => params.canny_high = byte(name)?,
        "approx_epsilon_percent" | "epsilon" => params.approx_epsilon_percent = number(name)?,
        "min_area" => params.min_area = integer(name)?,
        "max_dimension" => params.max_dimension = integer(name)?,
        "binarize" => params.binarize = parse_bool(value)?,
        "invert_binary" => params.invert_binary = parse_bool(value)?,
        "morph_kernel_size" => params.morph_kernel_size = byte(name)?,
        "rectilinear" => {
            params.rectilinear = parse_bool(value)?.then(|| params.rectilinear.unwrap_or_default());
        }
        "angle_tolerance" => {
            let mut snap = params.rectilinear.unwrap_or_default();
            snap.angle_tolerance_deg = number(name)?;
            params.rectilinear = Some(snap);
        }
        "grid_snap" => {
            let mut snap = params.rectilinear.unwrap_or_default();
            snap.grid_snap = number(name)?;
            params.rectilinear = Some(snap);
        }
        other => bail!(
            "unknown parameter {other:?}; expected one of: {}",
            SETTING_NAMES.join(", ")
        ),
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => bail!("expected on/off, got {value:?}"),
    }
}
