//! meshnorm CLI - vertex normal estimation from the command line.
//!
//! Usage: meshnorm [-v...] <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `meshnorm --help` for available commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use meshnorm::algo::normals::{compute_face_normals, NormalOptions};
use meshnorm::algo::Progress;
use meshnorm::io;
use meshnorm::transform::{GenerateMeshNormals, Pipeline, Transform};

#[derive(Parser)]
#[command(name = "meshnorm")]
#[command(author, version, about = "Vertex normal estimation CLI", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Compute per-vertex normals and save them with the mesh
    Normals {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file (use .ply to keep per-vertex normals)
        output: PathBuf,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Apply registered transforms by name, in order
    Apply {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Transform functional name (repeatable)
        #[arg(short, long = "transform", required = true)]
        transforms: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG still overrides the flag-derived level
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => cmd_info(&input)?,
        Commands::Normals {
            input,
            output,
            sequential,
        } => cmd_normals(&input, &output, sequential)?,
        Commands::Apply {
            input,
            output,
            transforms,
        } => cmd_apply(&input, &output, &transforms)?,
    }

    Ok(())
}

/// Create a progress reporter that prints phase updates on stderr.
fn create_progress() -> Progress {
    Progress::new(|current, total, message| {
        if total == 0 {
            return;
        }
        let bar_width = 30;
        let filled = (current.min(total) * bar_width) / total;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {}/{} {:<32}", bar, space, current, total, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", data.num_vertices());

    let Some(faces) = data.faces() else {
        println!("Faces: none (point cloud)");
        return Ok(());
    };
    println!("Faces: {}", faces.len());

    let face_normals = compute_face_normals(&data.positions, faces, &NormalOptions::default())?;
    let degenerate = face_normals.iter().filter(|n| n.norm() == 0.0).count();
    println!("Degenerate faces: {}", degenerate);

    let mut referenced = vec![false; data.num_vertices()];
    for face in faces {
        for &v in face {
            referenced[v] = true;
        }
    }
    let isolated = referenced.iter().filter(|&&r| !r).count();
    println!("Isolated vertices: {}", isolated);

    println!(
        "Vertex normals: {}",
        if data.normals().is_some() { "present" } else { "absent" }
    );

    Ok(())
}

fn cmd_normals(input: &Path, output: &Path, sequential: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut data = io::load(input)?;

    println!("Loaded: {} vertices, {} faces", data.num_vertices(), data.num_faces());

    let mode = if sequential { "sequential" } else { "parallel" };
    let options = NormalOptions::default().with_parallel(!sequential);
    let transform = GenerateMeshNormals::with_options(options).with_progress(create_progress());

    println!("Estimating vertex normals ({})...", mode);
    let start = Instant::now();
    transform.apply(&mut data)?;
    let elapsed = start.elapsed();

    if let Some(normals) = data.normals() {
        let zero = normals.iter().filter(|n| n.norm() == 0.0).count();
        if zero > 0 {
            log::warn!("{} vertices have no normal direction", zero);
        }
    }

    io::save(&data, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_apply(
    input: &Path,
    output: &Path,
    transforms: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::from_names(transforms)?;
    let mut data = io::load(input)?;

    log::info!("applying {:?}", pipeline.names());
    let start = Instant::now();
    pipeline.apply(&mut data)?;
    let elapsed = start.elapsed();

    io::save(&data, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
