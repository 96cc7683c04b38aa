// navmerge - navmesh input builder
// Entrypoint for:
// - build:       merge scene geometry per navmesh and hand it to the generator
// - triangulate: convert a raw quad mesh into a clean triangle mesh

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};

use navmerge::DEFAULT_PREVIEW_SCALE;
use navmerge::bounds::DEFAULT_TILE_RADIUS;
use navmerge::builder::{NavmeshBuilder, NavmeshConfig};
use navmerge::export::{ExportAdapter, write_obj_with_normals};
use navmerge::merge::{DEFAULT_TERRAIN_PADDING, MeshMerger};
use navmerge::mesh::triangulate;
use navmerge::scene::{RawMeshDescription, Scene, SceneDescription};
use navmerge_shared::config::Config;
use navmerge_shared::log::{initialize_logging, map_log_level};
use navmerge_shared::{DEFAULT_CONFIG, ENV_PREFIX};

#[derive(Parser, Debug)]
#[command(name = "navmerge")]
#[command(about = "Scene geometry merger for navmesh generation")]
#[command(version)]
struct Cli {
    /// Console log level override (0=Error, 1=Warn, 2=Info, 3=Debug, 4=Trace)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<i32>,

    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge scene geometry for every navmesh and export it
    Build(BuildArgs),
    /// Triangulate a raw quad mesh
    Triangulate(TriangulateArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Scene description (JSON)
    #[arg(short = 's', long = "scene")]
    scene: PathBuf,

    /// Navmesh generator configuration (JSON)
    #[arg(long = "navmesh-config", default_value = "navmesh.json")]
    navmesh_config: PathBuf,

    /// Output directory
    #[arg(short = 'o', long = "output", default_value = "./out")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct TriangulateArgs {
    /// Raw quad mesh (JSON: vertices + quads)
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output OBJ file
    #[arg(short = 'o', long = "output", default_value = "mesh.obj")]
    output: PathBuf,
}

/// Merge settings read from the configuration file
#[derive(Clone, Copy, Debug)]
struct MergeSettings {
    preview_scale: f32,
    tile_radius: f32,
    terrain_padding: f32,
}

impl MergeSettings {
    fn from_config(config: &Config) -> Self {
        Self {
            preview_scale: config.get_float_default("Merge.PreviewScale", DEFAULT_PREVIEW_SCALE),
            tile_radius: config.get_float_default("Merge.TileRadius", DEFAULT_TILE_RADIUS),
            terrain_padding: config
                .get_float_default("Merge.TerrainPadding", DEFAULT_TERRAIN_PADDING),
        }
    }
}

/// A missing config file is fine; every key has a default
fn load_config(path: &str) -> anyhow::Result<Config> {
    let path = Path::new(path);
    if !path.exists() {
        return Ok(Config::new(ENV_PREFIX));
    }
    Config::load(path, ENV_PREFIX)
        .with_context(|| format!("Failed to load configuration {}", path.display()))
}

fn init_logging(config: &Config, log_level: Option<i32>) {
    let level = match log_level {
        Some(level) => map_log_level(level).to_string(),
        None => config.get_string_default("LogLevel", "info"),
    };
    let log_dir = config.get_string("LogsDir");
    initialize_logging(
        if log_dir.is_empty() { None } else { Some(log_dir.as_str()) },
        &level,
    );
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn run_build(args: BuildArgs, settings: MergeSettings) -> anyhow::Result<()> {
    if !args.scene.exists() {
        bail!("Scene file does not exist: {}", args.scene.display());
    }

    let description: SceneDescription = read_json(&args.scene)?;
    let base_dir = args.scene.parent().unwrap_or_else(|| Path::new("."));
    let scene = Scene::from_description(&description, base_dir, settings.preview_scale)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;

    let navmesh_config = if args.navmesh_config.exists() {
        read_json(&args.navmesh_config)?
    } else {
        tracing::info!(
            "{} not found, using default navmesh configuration",
            args.navmesh_config.display()
        );
        NavmeshConfig::default()
    };

    tracing::info!(
        "Build: mode={:?} preview_scale={} tile_radius={} terrain_padding={}",
        scene.mode,
        settings.preview_scale,
        settings.tile_radius,
        settings.terrain_padding
    );

    let builder = NavmeshBuilder::new(
        settings.tile_radius,
        MeshMerger::new(settings.terrain_padding),
        settings.preview_scale,
    );
    let mut adapter = ExportAdapter::new(&args.output);
    let built = builder.build_all(&scene, &navmesh_config, &mut adapter)?;

    for navmesh in &built {
        tracing::info!(
            "Navmesh '{}': {} vertices, {} triangles -> {}",
            navmesh.name,
            navmesh.vertex_count,
            navmesh.triangle_count,
            navmesh.root.obj_path.display()
        );
    }

    tracing::info!("Build complete: {} navmesh(es).", built.len());
    Ok(())
}

fn run_triangulate(args: TriangulateArgs) -> anyhow::Result<()> {
    let description: RawMeshDescription = read_json(&args.input)?;
    let raw = description.to_raw_mesh();
    let mesh = triangulate(&raw)
        .with_context(|| format!("Failed to triangulate {}", args.input.display()))?;

    tracing::info!(
        "Triangulated {} quads into {} triangles ({} degenerate removed)",
        raw.quads.len(),
        mesh.triangle_count(),
        raw.quads.len() * 2 - mesh.triangle_count()
    );

    let vertices: Vec<[f32; 3]> = mesh.vertices().iter().map(|v| v.to_array()).collect();
    let normals: Vec<[f32; 3]> = mesh.normals().iter().map(|n| n.to_array()).collect();

    let file = fs::File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut writer = BufWriter::new(file);
    write_obj_with_normals(&mut writer, &vertices, &normals, mesh.indices())?;
    writer.flush()?;

    tracing::info!("Wrote {}", args.output.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    init_logging(&config, cli.log_level);
    if config.filename().as_os_str().is_empty() {
        tracing::info!("No configuration file at {}, using defaults", cli.config);
    } else {
        tracing::info!("Using configuration {}", config.filename().display());
    }

    match cli.command {
        Command::Build(args) => run_build(args, MergeSettings::from_config(&config)),
        Command::Triangulate(args) => run_triangulate(args),
    }
}
