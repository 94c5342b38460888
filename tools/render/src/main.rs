//! CLI driver: run a plate-tectonics simulation and write PNG debug images
//! (heightmap, plate ownership, crust age) to an output directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use litho_core::{Lithosphere, WorldParams, NO_OWNER};

#[derive(Parser, Debug)]
#[command(name = "render", about = "Run a plate-tectonics simulation and render PNGs")]
struct Args {
    #[arg(short, long, default_value_t = 3)]
    seed: u32,

    #[arg(long, default_value_t = 512)]
    width: u32,

    #[arg(long, default_value_t = 512)]
    height: u32,

    /// Iterations to run; 0 runs until the simulation finishes.
    #[arg(long, default_value_t = 0)]
    steps: u32,

    #[arg(long, default_value_t = 0.65)]
    sea_level: f32,

    #[arg(long, default_value_t = 10)]
    plates: u32,

    #[arg(long, default_value_t = 2)]
    cycles: u32,

    #[arg(short, long, default_value = "data/render")]
    out_dir: PathBuf,
}

/// One visually distinct color per plate index.
fn plate_color(owner: u32) -> [u8; 3] {
    if owner == NO_OWNER {
        return [0, 0, 0];
    }
    const PALETTE: [[u8; 3]; 10] = [
        [220, 50, 50],
        [70, 130, 180],
        [210, 180, 140],
        [255, 140, 0],
        [150, 50, 200],
        [60, 179, 113],
        [255, 215, 0],
        [176, 196, 222],
        [205, 92, 92],
        [0, 139, 139],
    ];
    PALETTE[owner as usize % PALETTE.len()]
}

/// Elevation → hypsometric tint: blues below the continent base, greens
/// and browns above it.
fn height_color(h: f32, max_height: f32) -> [u8; 3] {
    if h < 1.0 {
        let t = (h / 1.0).clamp(0.0, 1.0);
        [0, (60.0 + 120.0 * t) as u8, (130.0 + 125.0 * t) as u8]
    } else {
        let t = ((h - 1.0) / (max_height - 1.0).max(0.001)).clamp(0.0, 1.0);
        let r = (80.0 + 150.0 * t) as u8;
        let g = (140.0 - 60.0 * t) as u8;
        [r, g, (50.0 * (1.0 - t)) as u8]
    }
}

fn save_rgb(
    path: &Path,
    width: u32,
    height: u32,
    pixel: impl Fn(usize) -> [u8; 3],
) -> Result<()> {
    let mut img = image::RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let [r, g, b] = pixel((y * width + x) as usize);
            img.put_pixel(x, y, image::Rgb([r, g, b]));
        }
    }
    img.save(path)
        .with_context(|| format!("failed to save {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let params = WorldParams {
        seed: args.seed,
        width: args.width,
        height: args.height,
        sea_level: args.sea_level,
        num_plates: args.plates,
        num_cycles: args.cycles,
        ..WorldParams::default()
    };

    println!(
        "Simulating {}x{} world, {} plates, seed {}…",
        args.width, args.height, args.plates, args.seed
    );
    let mut lithosphere = Lithosphere::new(&params)?;

    let mut iterations = 0u32;
    while !lithosphere.is_finished() && (args.steps == 0 || iterations < args.steps) {
        lithosphere.step();
        iterations += 1;
        if iterations % 100 == 0 {
            println!(
                "  step {iterations}: {} plates, cycle {}",
                lithosphere.plate_count(),
                lithosphere.cycle_count()
            );
        }
    }
    println!("Done after {iterations} steps.");

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("cannot create {}", args.out_dir.display()))?;

    let width = lithosphere.width();
    let height = lithosphere.height();

    let topo = lithosphere.topography();
    let max_height = topo.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    save_rgb(&args.out_dir.join("heightmap.png"), width, height, |i| {
        height_color(topo[i], max_height)
    })?;

    let owners = lithosphere.plate_map();
    save_rgb(&args.out_dir.join("plates.png"), width, height, |i| {
        plate_color(owners[i])
    })?;

    let ages = lithosphere.age_map();
    let newest = lithosphere.iteration_count().max(1);
    save_rgb(&args.out_dir.join("age.png"), width, height, |i| {
        let t = ages[i] as f32 / newest as f32;
        let c = (255.0 * t.clamp(0.0, 1.0)) as u8;
        [c, c / 2, 255 - c]
    })?;

    // Plate summary for eyeballing drift and mass distribution.
    for i in 0..lithosphere.plate_count() {
        let plate = lithosphere.plate(i);
        let v = plate.velocity_unit();
        println!(
            "plate {i}: mass {:.1}, speed {:.3}, heading ({:+.2}, {:+.2}), {}x{} at ({}, {})",
            plate.mass(),
            plate.speed(),
            v.x,
            v.y,
            plate.bounds().width(),
            plate.bounds().height(),
            plate.bounds().left(),
            plate.bounds().top(),
        );
    }

    Ok(())
}
