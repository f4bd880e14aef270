use anyhow::Context;
use arbor_common::{Color, NodeId, Transform};
use arbor_math::{Box3, DVec3};
use arbor_render::{GeometryHandle, RecordingBackend, Viewport};
use arbor_scene::{BASIC_FRAGMENT_SHADER, Camera, FrameStats, Material, Mesh, NodeKind, Scene};
use arbor_tools::{SceneInspector, SceneSummary};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Marker that makes the recording backend reject a program.
const BROKEN_SHADER: &str = "#error broken";

#[derive(Parser)]
#[command(name = "arbor-cli", about = "CLI tool for arbor scene graph operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Build the demo scene and render frames into a recording backend
    Demo {
        #[command(flatten)]
        scene: DemoArgs,
        /// Number of frames to render
        #[arg(short, long, default_value = "1")]
        frames: u32,
        /// Print the backend transcript of the last frame
        #[arg(short, long)]
        transcript: bool,
        /// Print stats and scene summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the demo scene tree
    Tree {
        #[command(flatten)]
        scene: DemoArgs,
    },
    /// Print details of one node of the demo scene
    Inspect {
        #[command(flatten)]
        scene: DemoArgs,
        /// Node id to inspect
        id: u64,
    },
}

#[derive(Args)]
struct DemoArgs {
    /// Number of meshes in the row
    #[arg(short, long, default_value = "8")]
    meshes: usize,
    /// Distance between neighbouring meshes
    #[arg(long, default_value = "3.0")]
    spacing: f64,
    /// Vertical field of view in degrees
    #[arg(long, default_value = "50.0")]
    fov: f64,
    /// Give the mesh at this index a shader the backend rejects
    #[arg(long)]
    fail: Option<usize>,
}

#[derive(Serialize)]
struct DemoReport {
    frames: Vec<FrameStats>,
    summary: SceneSummary,
}

/// A row of cubes along x, each with a small tagged child, watched by a
/// camera on the +z side.
fn build_scene(args: &DemoArgs) -> anyhow::Result<Scene> {
    let mut scene = Scene::new();
    scene.set_background(Color::from_rgba8(20, 24, 32, 255));
    scene.set_viewport(Some(Viewport::new(0, 0, 1280, 720)));

    let width = args.spacing * args.meshes.saturating_sub(1) as f64;
    for i in 0..args.meshes {
        let material = if args.fail == Some(i) {
            Material::new(BROKEN_SHADER, BASIC_FRAGMENT_SHADER)
        } else {
            let shade = i as f32 / args.meshes.max(1) as f32;
            Material::basic(Color::rgba(shade, 0.5, 1.0 - shade, 1.0))
        };
        let cube = Mesh::new(
            GeometryHandle(i as u64),
            Box3::new(DVec3::splat(-0.5), DVec3::splat(0.5)),
            material,
        );
        let id = scene.add(cube);
        let x = i as f64 * args.spacing - width / 2.0;
        scene.set_transform(id, Transform::from_position(DVec3::new(x, 0.0, 0.0)))?;
        scene.set_tag(id, &format!("cube-{i}"))?;

        let marker = scene.spawn(NodeKind::Group);
        scene.add_child(id, marker)?;
        scene.set_transform(marker, Transform::from_position(DVec3::new(0.0, 1.0, 0.0)))?;
        scene.set_tag(marker, "top")?;
    }

    let camera = Camera::perspective(args.fov, 1280.0 / 720.0, 0.1, 100.0)?;
    let camera = scene.add(camera);
    scene.set_tag(camera, "camera")?;
    scene.set_transform(camera, Transform::from_position(DVec3::new(0.0, 4.0, 12.0)))?;
    scene.look_at(camera, DVec3::ZERO)?;
    scene.set_active_camera(camera)?;
    Ok(scene)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("arbor-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", arbor_common::crate_info());
            println!("math: {}", arbor_math::crate_info());
            println!("render: {}", arbor_render::crate_info());
            println!("scene: {}", arbor_scene::crate_info());
            println!("tools: {}", arbor_tools::crate_info());
        }
        Commands::Demo {
            scene: args,
            frames,
            transcript,
            json,
        } => {
            let mut scene = build_scene(&args)?;
            scene.on_enter();
            let mut backend = RecordingBackend::new();
            backend.fail_programs_containing(BROKEN_SHADER);
            let mut stats = Vec::new();
            for frame in 0..frames.max(1) {
                backend.take_calls();
                scene.update();
                let frame_stats = scene
                    .render(&mut backend)
                    .with_context(|| format!("rendering frame {frame}"))?;
                tracing::info!(frame, rendered = frame_stats.rendered, culled = frame_stats.culled, "frame done");
                stats.push(frame_stats);
            }
            scene.on_exit();

            let summary = SceneInspector::summary(&scene);
            if json {
                let report = DemoReport {
                    frames: stats,
                    summary,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{summary}");
                for (frame, s) in stats.iter().enumerate() {
                    println!(
                        "frame {frame}: visited={} culled={} hidden={} rendered={} failed={} skipped={}",
                        s.visited, s.culled, s.hidden, s.rendered, s.failed, s.skipped
                    );
                }
                if transcript {
                    print!("{}", backend.transcript());
                }
            }
        }
        Commands::Tree { scene: args } => {
            let scene = build_scene(&args)?;
            print!("{}", SceneInspector::tree(&scene));
        }
        Commands::Inspect { scene: args, id } => {
            let scene = build_scene(&args)?;
            let info = SceneInspector::inspect_node(&scene, NodeId(id))
                .with_context(|| format!("no node {}", NodeId(id)))?;
            println!("{info}");
        }
    }

    Ok(())
}
