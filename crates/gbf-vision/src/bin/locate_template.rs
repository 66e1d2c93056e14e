//! Run the matcher on a saved screenshot.
//! Usage: cargo run -p gbf-vision --features cli --bin locate_template -- \
//!     <screenshot.png> <template.png> [--all] [--edges] [--threshold 0.8] [--method ccoeff|ccorr|sqdiff] [output_dir]

use anyhow::{bail, Context, Result};
use gbf_capture::{crop_region, Region};
use gbf_vision::{MatchMethod, Template, TemplateMatcher};
use std::path::PathBuf;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <screenshot.png> <template.png> [--all] [--edges] [--threshold 0.8] [--method ccoeff|ccorr|sqdiff] [output_dir]",
            args[0]
        );
        std::process::exit(1);
    }

    let screenshot_path = PathBuf::from(&args[1]);
    let template_path = PathBuf::from(&args[2]);
    let mut find_all = false;
    let mut edges = false;
    let mut threshold = 0.8;
    let mut method = MatchMethod::default();
    let mut output_dir = PathBuf::from("./debug_output");

    let mut rest = args[3..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--all" => find_all = true,
            "--edges" => edges = true,
            "--threshold" => {
                threshold = rest
                    .next()
                    .context("--threshold needs a value")?
                    .parse()
                    .context("--threshold must be a number")?;
            }
            "--method" => {
                method = match rest.next().map(String::as_str) {
                    Some("ccoeff") => MatchMethod::CorrelationCoefficientNormed,
                    Some("ccorr") => MatchMethod::CrossCorrelationNormed,
                    Some("sqdiff") => MatchMethod::SquaredDifferenceNormed,
                    other => bail!("Unknown method {:?}", other),
                };
            }
            dir => output_dir = PathBuf::from(dir),
        }
    }
    let _ = std::fs::create_dir_all(&output_dir);

    println!("Loading screenshot: {}", screenshot_path.display());
    let frame = image::open(&screenshot_path)
        .with_context(|| format!("Failed to open {}", screenshot_path.display()))?
        .to_rgba8();
    println!("Screenshot size: {}x{}", frame.width(), frame.height());

    let name = template_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "template".to_string());
    let template = Template::new(
        name.clone(),
        image::open(&template_path)
            .with_context(|| format!("Failed to open {}", template_path.display()))?
            .to_luma8(),
    );
    let (tw, th) = template.dimensions();
    println!("Template {}: {}x{}", name, tw, th);

    let gray = image::imageops::grayscale(&frame);
    let matcher = TemplateMatcher::new(method);

    let hits = if find_all {
        println!("\n=== find_all ({:?}, threshold {}) ===", method, threshold);
        matcher.match_all(&gray, &template, threshold, edges)
    } else {
        println!("\n=== find ({:?}, threshold {}) ===", method, threshold);
        vec![matcher.match_template(&gray, &template, threshold, edges)]
    };

    for (i, hit) in hits.iter().enumerate() {
        println!(
            "  #{}: center={} score={:.4} matched={}",
            i, hit.location, hit.score, hit.matched
        );
        if hit.matched {
            let crop = crop_region(&frame, &Region::centered(hit.location.x, hit.location.y, tw, th));
            let _ = crop.save(output_dir.join(format!("{}_{}.png", name, i)));
        }
    }
    if hits.is_empty() {
        println!("  no instances");
    }

    println!("\nDebug images saved to: {}", output_dir.display());
    Ok(())
}
