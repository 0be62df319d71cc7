use std::{path::PathBuf, process::ExitCode, time::Instant};

use clap::Parser;
use log::{info, LevelFilter};

use otsu_regions::segment::{
    load_gray, save_label_png, save_mask_png, segment_gray_image, SegmentImageError,
};
use otsu_regions::{
    RegionError, SegmentConfig, SegmentIoError, SegmentParams, SegmentReport, Segmentation,
    TimingsMs,
};
use otsu_regions_core::init_with_level;

/// Segment a grayscale image into intensity regions with multi-level Otsu
/// thresholding.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Input image; decoded and converted to 8-bit grayscale.
    image: PathBuf,

    /// Number of intensity regions.
    #[arg(short = 'k', long, default_value_t = 4)]
    classes: u8,

    /// Write a JSON report to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write a color-mapped label image to this path.
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Write per-class `mask_<label>.png` files into this directory.
    #[arg(long)]
    masks: Option<PathBuf>,

    /// Include the 256-bin histogram in the JSON report.
    #[arg(long)]
    histogram: bool,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Segment(#[from] SegmentImageError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Report(#[from] SegmentIoError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = init_with_level(level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Cli) -> Result<(), CliError> {
    let run_start = Instant::now();

    let stage_start = Instant::now();
    let img = load_gray(&args.image)?;
    let load_ms = elapsed_ms(stage_start);
    info!(
        "loaded {} ({}x{} px)",
        args.image.display(),
        img.width(),
        img.height()
    );

    let params = SegmentParams {
        classes: args.classes,
        keep_histogram: args.histogram,
    };
    let stage_start = Instant::now();
    let seg = segment_gray_image(&img, params)?;
    let segment_ms = elapsed_ms(stage_start);

    println!(
        "{}x{} image, {} classes",
        img.width(),
        img.height(),
        args.classes
    );
    println!("thresholds: {:?}", seg.thresholds);
    for stats in &seg.class_stats {
        println!(
            "class {}: {} px ({:.1}%), mean {:.1}",
            stats.label,
            stats.pixels,
            100.0 * stats.fraction,
            stats.mean
        );
    }

    let stage_start = Instant::now();
    if let Some(path) = args.labels.as_ref() {
        save_label_png(&seg.labels, path)?;
        println!("wrote label image to {}", path.display());
    }

    if let Some(dir) = args.masks.as_ref() {
        std::fs::create_dir_all(dir)?;
        let masks = seg.masks()?;
        for (class, mask) in masks.iter().enumerate() {
            save_mask_png(mask, dir.join(format!("mask_{class}.png")))?;
        }
        println!("wrote {} mask images to {}", masks.len(), dir.display());
    }
    let write_ms = elapsed_ms(stage_start);

    if let Some(path) = args.report.as_ref() {
        let timings = TimingsMs {
            load_image: load_ms,
            segment: segment_ms,
            write_outputs: write_ms,
            total: elapsed_ms(run_start),
        };
        let report =
            build_report(args, img.width() as usize, img.height() as usize, &seg, timings);
        report.write_json(path)?;
        println!("wrote report JSON to {}", path.display());
    }

    Ok(())
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Assemble a report equivalent to a config-driven run of the same flags.
fn build_report(
    args: &Cli,
    width: usize,
    height: usize,
    seg: &Segmentation,
    timings: TimingsMs,
) -> SegmentReport {
    let cfg = SegmentConfig {
        image_path: args.image.to_string_lossy().into_owned(),
        params: Some(SegmentParams {
            classes: args.classes,
            keep_histogram: args.histogram,
        }),
        output_path: args.report.as_ref().map(|p| path_string(p)),
        label_path: args.labels.as_ref().map(|p| path_string(p)),
        mask_dir: args.masks.as_ref().map(|p| path_string(p)),
    };

    let mut report = SegmentReport::new(&cfg, None, width, height);
    report.set_segmentation(seg);
    report.timings_ms = timings;
    report.label_path = cfg.label_path.clone();
    report.mask_paths = args.masks.as_ref().map(|dir| {
        (0..seg.labels.classes)
            .map(|class| dir.join(format!("mask_{class}.png")))
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    });
    report
}

fn path_string(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}
