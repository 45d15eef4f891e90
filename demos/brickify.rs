#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{
    fmt::Debug,
    fs::File,
    io::BufReader,
    ops::RangeBounds,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use anyhow::{bail, Context};
use brickquant::{
    report::CsvFileSink, MosaicConfig, MosaicSession, PaletteStore, RenderStatus, UnitMode,
};
use clap::Parser;
use image::{imageops, RgbImage};

/// Turns an image into a brick mosaic and writes the parts list.
#[derive(Parser)]
struct Options {
    /// The palette table (id, name, rgb, is_trans columns).
    palette: PathBuf,

    /// The source image.
    input: PathBuf,

    /// Output width in centimetres.
    #[arg(value_parser = parse_width_cm)]
    width: f64,

    /// Use units twice the base size.
    #[arg(long)]
    coarse: bool,

    /// Where to save the mosaic image.
    #[arg(short, long, default_value = "mosaic.png")]
    output: PathBuf,

    /// Where to save the bill of materials.
    #[arg(long, default_value = "bom.csv")]
    bom: PathBuf,

    /// Also save a preview scaled up to the width of the source image.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// A TOML file with mosaic settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// The number of threads to use. `0` lets the thread pool decide.
    #[arg(short, long, default_value_t = 0)]
    threads: u8,

    /// Print timings and debug logging.
    #[arg(long)]
    verbose: bool,
}

/// Millimetres per centimetre.
const MM_PER_CM: f64 = 10.0;

fn parse_float_in_range(s: &str, range: impl RangeBounds<f64> + Debug) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in {range:?}"))
    }
}

/// Parse a width in centimetres, rounded to two decimals, and ensure it is in `4.0..=1000.0`
fn parse_width_cm(s: &str) -> Result<f64, String> {
    parse_float_in_range(s, 4.0..=1000.0).map(|cm| (cm * 100.0).round() / 100.0)
}

fn main() -> ExitCode {
    let options = Options::parse();

    let filter = if options.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Err(e) = run(&options) {
        eprintln!("{e:#}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(feature = "threads")]
fn run(options: &Options) -> anyhow::Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(usize::from(options.threads))
        .build()
        .context("failed to build thread pool")?;

    pool.install(|| brickify(options))
}

#[cfg(not(feature = "threads"))]
fn run(options: &Options) -> anyhow::Result<()> {
    brickify(options)
}

fn brickify(options: &Options) -> anyhow::Result<()> {
    let verbose = options.verbose;

    macro_rules! time {
        ($name: literal, $val: expr) => {
            if verbose {
                let time = std::time::Instant::now();
                let value = $val;
                println!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    let config = match &options.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            MosaicConfig::from_toml_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => MosaicConfig::default(),
    };

    let palette = time!("load palette", {
        let file = File::open(&options.palette)
            .with_context(|| format!("failed to open {}", options.palette.display()))?;
        PaletteStore::from_csv_reader(BufReader::new(file))
            .with_context(|| format!("invalid palette {}", options.palette.display()))?
    });

    let image = time!(
        "read image",
        image::open(&options.input)
            .with_context(|| format!("failed to read {}", options.input.display()))?
            .into_rgb8()
    );

    let mut session =
        MosaicSession::new(Arc::new(palette), config).with_sink(CsvFileSink::new(&options.bom));

    let mode = if options.coarse { UnitMode::Coarse } else { UnitMode::Fine };

    match time!("render", session.render(&image, options.width * MM_PER_CM, mode)) {
        RenderStatus::Rendered => (),
        RenderStatus::Unchanged(rejection) => bail!("nothing rendered: {rejection}"),
        RenderStatus::Failed(failure) => return Err(failure).context("render failed"),
    }

    let Some(rendered) = session.last_render() else {
        bail!("no render available");
    };

    let saved = time!(
        "save images",
        save_images(
            rendered.mosaic.image(),
            &options.output,
            options.preview.as_deref(),
            image.width(),
        )?
    );
    if !saved {
        log::warn!("the mosaic has no pieces, no image was written");
    }

    let plan = &rendered.plan;
    println!("Output width: {} cm", plan.physical_width / MM_PER_CM);
    println!("Output height: {} cm", plan.physical_height / MM_PER_CM);
    println!("Pieces: {plan}");

    Ok(())
}

/// Saves `mosaic` to `output` and, if given, its preview scaled to `source_width`.
///
/// A grid with a zero dimension has no image to save; returns `false` in that case.
fn save_images(
    mosaic: &RgbImage,
    output: &Path,
    preview_path: Option<&Path>,
    source_width: u32,
) -> anyhow::Result<bool> {
    if mosaic.width() == 0 || mosaic.height() == 0 {
        return Ok(false);
    }

    mosaic
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    if let Some(path) = preview_path {
        preview(mosaic, source_width)
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(true)
}

/// Scales `mosaic` up to `width` pixels, keeping each unit a solid block.
fn preview(mosaic: &RgbImage, width: u32) -> RgbImage {
    let height = u64::from(width) * u64::from(mosaic.height()) / u64::from(mosaic.width());
    let height = u32::try_from(height).unwrap_or(u32::MAX);
    imageops::resize(mosaic, width, height, imageops::FilterType::Nearest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brickquant::PaletteRecord;
    use image::Rgb;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("brickify-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn zero_piece_grid_writes_no_images() {
        let palette = PaletteStore::load([PaletteRecord::new("4", "Red", "C91A09", "f")]).unwrap();
        let mut session = MosaicSession::new(Arc::new(palette), MosaicConfig::default());
        let source = RgbImage::from_pixel(100, 5, Rgb([200, 20, 10]));
        assert!(matches!(
            session.render(&source, 40.0, UnitMode::Fine),
            RenderStatus::Rendered
        ));

        let rendered = session.last_render().unwrap();
        assert_eq!(rendered.plan.to_string(), "0 (5x0)");

        let dir = temp_dir("empty");
        let output = dir.join("mosaic.png");
        let preview_path = dir.join("preview.png");
        let saved = save_images(
            rendered.mosaic.image(),
            &output,
            Some(&preview_path),
            source.width(),
        )
        .unwrap();

        assert!(!saved);
        assert!(!output.exists());
        assert!(!preview_path.exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn saves_mosaic_and_scaled_preview() {
        let mosaic = RgbImage::from_fn(4, 2, |x, _| Rgb([0, 0, (x * 60) as u8]));

        let dir = temp_dir("preview");
        let output = dir.join("mosaic.png");
        let preview_path = dir.join("preview.png");
        assert!(save_images(&mosaic, &output, Some(&preview_path), 40).unwrap());

        assert_eq!(image::open(&output).unwrap().into_rgb8(), mosaic);
        let preview = image::open(&preview_path).unwrap().into_rgb8();
        assert_eq!(preview.dimensions(), (40, 20));
        assert_eq!(preview.get_pixel(39, 19), mosaic.get_pixel(3, 1));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
