use std::{
    env,
    path::PathBuf,
    time::Instant,
};

use otsu_regions::segment::{load_gray, save_label_png, save_mask_png, segment_gray_image};
use otsu_regions::{SegmentConfig, SegmentReport, Segmentation, TimingsMs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = parse_config_path();
    let cfg = SegmentConfig::load_json(&config_path)?;
    let t_total = Instant::now();

    let (img, load_image_ms) = timed_result(|| load_gray(&cfg.image_path))?;

    let params = cfg.params.clone().unwrap_or_default();
    let (seg_result, segment_ms) = timed_value(|| segment_gray_image(&img, params));

    let mut report = SegmentReport::new(
        &cfg,
        Some(config_path.as_path()),
        img.width() as usize,
        img.height() as usize,
    );

    let mut write_outputs_ms = 0;
    match seg_result {
        Ok(seg) => {
            let (outputs, elapsed) = timed_value(|| write_outputs(&cfg, &seg));
            write_outputs_ms = elapsed;
            match outputs {
                Ok((label_path, mask_paths)) => {
                    report.label_path = label_path;
                    report.mask_paths = mask_paths;
                }
                Err(err) => eprintln!("failed to write image outputs: {err}"),
            }
            report.set_segmentation(&seg);
        }
        Err(err) => report.set_error(&err),
    }

    report.timings_ms = TimingsMs {
        load_image: load_image_ms,
        segment: segment_ms,
        write_outputs: write_outputs_ms,
        total: t_total.elapsed().as_millis() as u64,
    };

    let output_path = cfg.output_path();
    report.write_json(&output_path)?;
    println!("wrote report JSON to {}", output_path.display());

    Ok(())
}

fn parse_config_path() -> PathBuf {
    env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("testdata/segment_config.json"))
}

fn write_outputs(
    cfg: &SegmentConfig,
    seg: &Segmentation,
) -> Result<(Option<String>, Option<Vec<String>>), Box<dyn std::error::Error>> {
    let mut label_path = None;
    if let Some(path) = cfg.label_path.as_ref() {
        save_label_png(&seg.labels, path)?;
        println!("wrote label image to {path}");
        label_path = Some(path.clone());
    }

    let mut mask_paths = None;
    if let Some(dir) = cfg.mask_dir.as_ref() {
        std::fs::create_dir_all(dir)?;
        let masks = seg.masks()?;
        let mut written = Vec::with_capacity(masks.len());
        for (class, mask) in masks.iter().enumerate() {
            let Some(path) = cfg.mask_path(class as u8) else {
                continue;
            };
            save_mask_png(mask, &path)?;
            written.push(path.to_string_lossy().into_owned());
        }
        println!("wrote {} mask images", written.len());
        mask_paths = Some(written);
    }

    Ok((label_path, mask_paths))
}

fn timed_result<T, E, F: FnOnce() -> Result<T, E>>(f: F) -> Result<(T, u64), E> {
    let start = Instant::now();
    let value = f()?;
    let elapsed = start.elapsed().as_millis() as u64;
    Ok((value, elapsed))
}

fn timed_value<T, F: FnOnce() -> T>(f: F) -> (T, u64) {
    let start = Instant::now();
    let value = f();
    let elapsed = start.elapsed().as_millis() as u64;
    (value, elapsed)
}
