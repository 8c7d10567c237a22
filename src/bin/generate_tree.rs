//! Tree generation utility
//!
//! Grows L-system trees into a voxel volume and reports what was written.
//!
//! Usage:
//!     generate_tree [OPTIONS]
//!
//! Options:
//!     -s, --style <STYLE>     Tree style: oak, pine, birch, maple (default: oak)
//!     -c, --config <FILE>     Load tree parameters from a JSON file instead
//!     -n, --count <N>         Number of trees to grow (default: 1)
//!     --seed <SEED>           Base seed for RNG (default: 12345)
//!     --size <N>              Edge length of the cubic volume (default: 64)
//!     --anchor <X,Y,Z>        Tree root inside the volume (default: base centre)
//!     --expand <N>            Print generation N of the grammar and exit
//!     --save-config <FILE>    Write the selected parameters as JSON and exit
//!     -o, --output <FILE>     Write reports and voxel writes as JSON
//!     -h, --help              Show this help message

use std::env;
use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;

use sylva::core::{logging, IVec3, SeededRandom};
use sylva::voxel::{
    BlockPalette, GenerationReport, RecordingVolume, TreeGenerator, TreeParams, TreeStyle, VoxelWrite,
};
use sylva::math::GridAabb;

/// Longest grammar generation `--expand` will print
const EXPAND_LIMIT: usize = 1 << 20;

fn print_help() {
    eprintln!("generate_tree - L-system tree generation utility");
    eprintln!();
    eprintln!("Usage: generate_tree [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    -s, --style <STYLE>     Tree style: oak, pine, birch, maple (default: oak)");
    eprintln!("    -c, --config <FILE>     Load tree parameters from a JSON file instead");
    eprintln!("    -n, --count <N>         Number of trees to grow (default: 1)");
    eprintln!("    --seed <SEED>           Base seed for RNG (default: 12345)");
    eprintln!("    --size <N>              Edge length of the cubic volume (default: 64)");
    eprintln!("    --anchor <X,Y,Z>        Tree root inside the volume (default: base centre)");
    eprintln!("    --expand <N>            Print generation N of the grammar and exit");
    eprintln!("    --save-config <FILE>    Write the selected parameters as JSON and exit");
    eprintln!("    -o, --output <FILE>     Write reports and voxel writes as JSON");
    eprintln!("    -h, --help              Show this help message");
    eprintln!();
    eprintln!("Example:");
    eprintln!("    generate_tree -s pine --seed 42 -o pine.json");
    eprintln!("    generate_tree -c my_tree.json --expand 3");
}

#[derive(Debug)]
struct Args {
    style: TreeStyle,
    config: Option<PathBuf>,
    count: u32,
    seed: u64,
    size: i32,
    anchor: Option<IVec3>,
    expand: Option<u32>,
    save_config: Option<PathBuf>,
    output: Option<PathBuf>,
}

fn parse_anchor(value: &str) -> Result<IVec3, String> {
    let parts: Vec<i32> = value
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("Invalid anchor: {}", value))?;
    match parts.as_slice() {
        [x, y, z] => Ok(IVec3::new(*x, *y, *z)),
        _ => Err(format!("Anchor needs three components: {}", value)),
    }
}

fn next_value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str, String> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing value for {}", flag))
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut parsed = Args {
        style: TreeStyle::Oak,
        config: None,
        count: 1,
        seed: 12345,
        size: 64,
        anchor: None,
        expand: None,
        save_config: None,
        output: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-s" | "--style" => {
                parsed.style = next_value(&args, &mut i)?
                    .parse::<TreeStyle>()
                    .map_err(|e| e.to_string())?;
            }
            "-c" | "--config" => parsed.config = Some(PathBuf::from(next_value(&args, &mut i)?)),
            "-n" | "--count" => {
                let v = next_value(&args, &mut i)?;
                parsed.count = v.parse().map_err(|_| format!("Invalid count: {}", v))?;
            }
            "--seed" => {
                let v = next_value(&args, &mut i)?;
                parsed.seed = v.parse().map_err(|_| format!("Invalid seed: {}", v))?;
            }
            "--size" => {
                let v = next_value(&args, &mut i)?;
                parsed.size = v
                    .parse::<i32>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| format!("Invalid size: {}", v))?;
            }
            "--anchor" => parsed.anchor = Some(parse_anchor(next_value(&args, &mut i)?)?),
            "--expand" => {
                let v = next_value(&args, &mut i)?;
                parsed.expand = Some(v.parse().map_err(|_| format!("Invalid generation: {}", v))?);
            }
            "--save-config" => parsed.save_config = Some(PathBuf::from(next_value(&args, &mut i)?)),
            "-o" | "--output" => parsed.output = Some(PathBuf::from(next_value(&args, &mut i)?)),
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    Ok(parsed)
}

/// One grown tree as written to `--output`
#[derive(Serialize)]
struct TreeExport {
    seed: u64,
    anchor: IVec3,
    report: GenerationReport,
    writes: Vec<VoxelWrite>,
}

#[derive(Serialize)]
struct Export<'a> {
    params: &'a TreeParams,
    region: GridAabb,
    trees: Vec<TreeExport>,
}

fn run(args: Args) -> sylva::core::Result<()> {
    let params = match &args.config {
        Some(path) => TreeParams::load(path)?,
        None => TreeParams::from_style(args.style),
    };

    if let Some(path) = &args.save_config {
        params.save(path)?;
        println!("Saved parameters to {}", path.display());
        return Ok(());
    }

    let generator = TreeGenerator::new(params)?;

    if let Some(n) = args.expand {
        let mut rng = SeededRandom::new(args.seed);
        let symbols = generator.grammar().generation(n, &mut rng, EXPAND_LIMIT)?;
        println!("{}", symbols);
        return Ok(());
    }

    let region = GridAabb::from_origin_size(IVec3::ZERO, IVec3::splat(args.size));
    let anchor = args
        .anchor
        .unwrap_or(IVec3::new(args.size / 2, 0, args.size / 2));
    let palette = BlockPalette::with_defaults();

    println!("Tree Generation Utility");
    println!("=======================");
    match &args.config {
        Some(path) => println!("Config: {}", path.display()),
        None => println!("Style: {}", args.style),
    }
    println!("Trees: {}", args.count);
    println!("Base seed: {}", args.seed);
    println!("Volume: {}^3, anchor {:?}", args.size, anchor);
    println!();

    let start = Instant::now();
    let mut trees = Vec::with_capacity(args.count as usize);

    for i in 0..args.count {
        let seed = args.seed.wrapping_add(i as u64).wrapping_mul(0x517cc1b727220a95);
        let mut volume = RecordingVolume::new(region);
        let mut rng = SeededRandom::new(seed);
        let report = generator.generate(&mut volume, &palette, &mut rng, anchor)?;

        if report.clipped > 0 {
            log::warn!(
                "tree {} (seed {}): {} writes fell outside the volume",
                i, seed, report.clipped
            );
        }
        println!(
            "  tree {}: {} voxels ({} bark, {} leaf), {} segments, depth {}",
            i,
            report.writes,
            report.bark_writes,
            report.leaf_writes,
            report.segments,
            report.max_depth_reached,
        );

        trees.push(TreeExport {
            seed,
            anchor,
            report,
            writes: volume.into_writes(),
        });
    }

    let elapsed = start.elapsed();
    println!();
    println!("Summary:");
    println!("  Trees generated: {}", trees.len());
    println!(
        "  Total voxels: {}",
        trees.iter().map(|t| t.report.writes as u64).sum::<u64>()
    );
    println!("  Total time: {:.2}s", elapsed.as_secs_f64());

    if let Some(path) = &args.output {
        let export = Export {
            params: generator.params(),
            region,
            trees,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&export)?)?;
        println!("  Output: {}", path.display());
    }

    Ok(())
}

fn main() {
    logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
