//! LBSM CLI
//!
//! Inspect LBSM skinned-mesh containers.

use clap::{Parser, Subcommand, ValueEnum};
use lbsm::{
    parse_container, CoordinatePreset, DecoderConfig, ImageCrateDecoder, MeshBuffers, Scene,
    UvOrigin,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lbsm")]
#[command(author, version, about = "Inspect LBSM skinned-mesh containers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct DecodeArgs {
    /// Input .lbsm file
    input: PathBuf,

    /// Coordinate convention to convert into
    #[arg(long, value_enum, default_value = "native")]
    target: TargetArg,

    /// UV origin to convert into
    #[arg(long, value_enum, default_value = "lower-left")]
    uv_origin: UvOriginArg,

    /// Reject buffer views referenced by name
    #[arg(long)]
    strict_references: bool,
}

impl DecodeArgs {
    fn config(&self) -> DecoderConfig {
        DecoderConfig::default()
            .with_target(self.target.into())
            .with_target_uv_origin(self.uv_origin.into())
            .with_name_references(!self.strict_references)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the chunks of a container
    Chunks {
        /// Input .lbsm file
        input: PathBuf,
    },

    /// Show a summary of the scene and every mesh
    Info {
        #[command(flatten)]
        args: DecodeArgs,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode every texture and write it out as PNG
    Textures {
        #[command(flatten)]
        args: DecodeArgs,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TargetArg {
    /// Left-handed, Y-up, Z-forward
    Native,
    /// Right-handed, Y-up, X mirrored
    Gltf,
    /// Right-handed, Y-up, Z back
    ZBack,
}

impl From<TargetArg> for CoordinatePreset {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Native => CoordinatePreset::EngineNative,
            TargetArg::Gltf => CoordinatePreset::InterchangeYUp,
            TargetArg::ZBack => CoordinatePreset::ZBack,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum UvOriginArg {
    UpperLeft,
    LowerLeft,
}

impl From<UvOriginArg> for UvOrigin {
    fn from(arg: UvOriginArg) -> Self {
        match arg {
            UvOriginArg::UpperLeft => UvOrigin::UpperLeft,
            UvOriginArg::LowerLeft => UvOrigin::LowerLeft,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chunks { input } => show_chunks(&input)?,
        Commands::Info { args, json } => show_info(&args, json)?,
        Commands::Textures { args, output } => export_textures(&args, &output)?,
    }

    Ok(())
}

fn show_chunks(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(input)?;
    let container = parse_container(&bytes)?;

    println!("Container {:?}", input);
    println!("  Version: {}", container.version);
    println!("  Total length: {} bytes", container.total_length);
    for chunk in &container.chunks {
        println!(
            "  - {:<4} at {:>8}: {} bytes",
            chunk.chunk_type.to_string(),
            chunk.offset,
            chunk.payload.len()
        );
    }

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SceneSummary {
    version: u32,
    asset_version: String,
    source: String,
    transform: lbsm::Transform,
    bones: usize,
    materials: Vec<lbsm::MaterialDescriptor>,
    textures: Vec<String>,
    meshes: Vec<MeshSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MeshSummary {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    vertices: usize,
    triangles: usize,
    sub_meshes: usize,
    joints: usize,
    blend_shapes: Vec<String>,
    bounds: Option<lbsm::BoundingBox>,
}

impl MeshSummary {
    fn from_buffers(mesh: &MeshBuffers<'_>) -> Self {
        Self {
            name: mesh.name.clone(),
            error: None,
            vertices: mesh.vertex_count,
            triangles: mesh.triangle_count(),
            sub_meshes: mesh.sub_meshes.len(),
            joints: mesh.bind_poses.len(),
            blend_shapes: mesh.blend_shapes.iter().map(|b| b.name.clone()).collect(),
            bounds: mesh.bounds,
        }
    }

    fn failed(name: &str, error: &lbsm::LbsmError) -> Self {
        Self {
            name: name.to_string(),
            error: Some(error.to_string()),
            vertices: 0,
            triangles: 0,
            sub_meshes: 0,
            joints: 0,
            blend_shapes: Vec::new(),
            bounds: None,
        }
    }
}

fn show_info(args: &DecodeArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(&args.input)?;
    let scene = Scene::parse(&bytes, &args.config())?;

    let meshes: Vec<MeshSummary> = scene
        .meshes()
        .zip(&scene.document().meshes)
        .map(|(result, declared)| match result {
            Ok(mesh) => MeshSummary::from_buffers(&mesh),
            Err(e) => MeshSummary::failed(&declared.name, &e),
        })
        .collect();

    let summary = SceneSummary {
        version: scene.version(),
        asset_version: scene.document().asset.version.clone(),
        source: scene.source_coordinate_system().axes.to_string(),
        transform: *scene.transform(),
        bones: scene.skeleton().len(),
        materials: scene.materials().to_vec(),
        textures: scene.textures().iter().map(|t| t.name.clone()).collect(),
        meshes,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\nScene Info:");
    println!("  Container version: {}", summary.version);
    println!("  Asset version: {}", summary.asset_version);
    println!(
        "  Source axes: {} (uv origin {})",
        summary.source,
        scene.source_coordinate_system().uv_origin
    );
    println!(
        "  Transform: {:?}{}",
        summary.transform.reflection(),
        if summary.transform.flips_uv() { ", flip V" } else { "" }
    );
    println!("  Bones: {}", summary.bones);
    println!("  Materials: {}", summary.materials.len());
    println!("  Textures: {}", summary.textures.len());
    println!("  Meshes: {}", summary.meshes.len());
    for mesh in &summary.meshes {
        match &mesh.error {
            Some(error) => println!("  - {}: FAILED ({})", mesh.name, error),
            None => println!(
                "  - {}: {} vertices, {} triangles, {} submeshes, {} joints, {} blend shapes",
                mesh.name,
                mesh.vertices,
                mesh.triangles,
                mesh.sub_meshes,
                mesh.joints,
                mesh.blend_shapes.len()
            ),
        }
    }

    Ok(())
}

fn export_textures(args: &DecodeArgs, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(&args.input)?;
    let scene = Scene::parse(&bytes, &args.config())?;
    fs::create_dir_all(output)?;

    for (i, texture) in scene.textures().iter().enumerate() {
        let decoded = texture.decode(&ImageCrateDecoder)?;
        let name = if texture.name.is_empty() {
            format!("texture_{}", i)
        } else {
            texture.name.replace(['/', '\\'], "_")
        };
        let path = output.join(format!("{}.png", name));
        image::save_buffer(
            &path,
            &decoded.pixels,
            decoded.width,
            decoded.height,
            image::ColorType::Rgba8,
        )?;
        println!("Exported {}x{} texture to {:?}", decoded.width, decoded.height, path);
    }

    Ok(())
}
