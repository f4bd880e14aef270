use std::hint::black_box;
use std::time::Instant;

use arbor_common::{Color, NodeId, Transform};
use arbor_math::Box3;
use arbor_render::{GeometryHandle, RecordingBackend};
use arbor_scene::{Camera, Material, Mesh, Scene};
use glam::DVec3;

fn cube(geometry: u64) -> Mesh {
    Mesh::new(
        GeometryHandle(geometry),
        Box3::new(DVec3::splat(-0.5), DVec3::splat(0.5)),
        Material::basic(Color::WHITE),
    )
}

fn with_camera(scene: &mut Scene) {
    let camera = scene.add(Camera::perspective(60.0, 1.0, 0.1, 500.0).expect("valid lens"));
    scene
        .set_transform(camera, Transform::from_position(DVec3::new(0.0, 0.0, 100.0)))
        .expect("camera exists");
    scene.set_active_camera(camera).expect("camera exists");
}

/// `count` meshes on a grid under the root; roughly half fall outside the view.
fn make_wide(count: usize) -> Scene {
    let mut scene = Scene::new();
    with_camera(&mut scene);
    let side = (count as f64).sqrt().ceil() as usize;
    for i in 0..count {
        let x = (i % side) as f64 * 4.0 - side as f64;
        let y = (i / side) as f64 * 4.0 - side as f64;
        let mesh = scene.add(cube(i as u64));
        scene
            .set_transform(mesh, Transform::from_position(DVec3::new(x, y, 0.0)))
            .expect("mesh exists");
    }
    scene
}

/// A single chain of `depth` meshes.
fn make_deep(depth: usize) -> Scene {
    let mut scene = Scene::new();
    with_camera(&mut scene);
    let mut parent: NodeId = scene.root();
    for i in 0..depth {
        let mesh = scene.spawn(cube(i as u64));
        scene.add_child(parent, mesh).expect("both nodes exist");
        scene
            .set_transform(mesh, Transform::from_position(DVec3::new(0.0, 0.0, -0.1)))
            .expect("mesh exists");
        parent = mesh;
    }
    scene
}

fn bench_render(label: &str, mut scene: Scene, iterations: usize) {
    let mut backend = RecordingBackend::new();
    // first frame creates programs
    let stats = scene.render(&mut backend).expect("frame renders");

    let start = Instant::now();
    for _ in 0..iterations {
        backend.take_calls();
        let _ = black_box(scene.render(black_box(&mut backend)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  {label} (visited {}, culled {}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}",
        stats.visited, stats.culled
    );
}

fn bench_world_transform(depth: usize, iterations: usize) {
    let scene = make_deep(depth);
    let leaf = scene
        .descendants(scene.root())
        .last()
        .copied()
        .expect("chain has a leaf");

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = black_box(scene.world_transform(black_box(leaf)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  world_transform (depth {depth}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn main() {
    println!("=== Traversal Benchmarks ===");
    println!();

    println!("[wide]");
    bench_render("wide 1k", make_wide(1_000), 200);
    bench_render("wide 10k", make_wide(10_000), 20);
    println!();

    println!("[deep]");
    bench_render("deep 100", make_deep(100), 1_000);
    bench_render("deep 1k", make_deep(1_000), 100);
    println!();

    println!("[world transform]");
    bench_world_transform(10, 100_000);
    bench_world_transform(100, 10_000);
}
