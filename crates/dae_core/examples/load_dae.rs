//! Example: Load and inspect a COLLADA file.
//!
//! Run with: cargo run --example load_dae -- path/to/scene.dae [--json]

use std::env;

use anyhow::Context;
use dae_core::collada::{load_dae, ColladaDocument, NodeId};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: load_dae <path-to-dae-file> [--json]");
        println!("\nExamples:");
        println!("  cargo run --example load_dae -- duck.dae");
        println!("  cargo run --example load_dae -- duck.dae --json");
        return Ok(());
    }

    let path = &args[1];
    let doc = load_dae(path).with_context(|| format!("loading {}", path))?;

    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("\n=== {} ===", path);
    println!("Version: {:?}", doc.asset.version);
    println!("Up axis: {:?}, unit: {} m", doc.asset.up_axis, doc.asset.unit_size);
    if let Some(generator) = doc.asset.generator() {
        println!("Generator: {}", generator);
    }

    println!("\n--- Meshes ---");
    for (id, mesh) in &doc.meshes {
        println!(
            "  {} - {} vertices, {} faces, {} submeshes",
            id,
            mesh.vertex_count(),
            mesh.face_count(),
            mesh.sub_meshes.len()
        );
        println!(
            "       Has normals: {}, texcoord sets: {}",
            mesh.has_normals(),
            mesh.tex_coord_set_count()
        );
    }

    println!("\n--- Materials ---");
    for (id, material) in &doc.materials {
        println!("  {} ({}) -> effect {}", id, material.name, material.effect);
    }

    println!("\n--- Controllers ---");
    for (id, controller) in &doc.controllers {
        println!(
            "  {} {:?} on {} - {} weighted vertices",
            id,
            controller.controller_type,
            controller.mesh_id,
            controller.weight_counts.len()
        );
    }

    println!("\nLights: {}, cameras: {}, images: {}", doc.lights.len(), doc.cameras.len(), doc.images.len());

    let mut channels = Vec::new();
    doc.animations.collect_channels_recursively(&mut channels);
    println!("Animation channels: {}, clips: {}", channels.len(), doc.animation_clips.len());

    if let Some(root) = doc.root {
        println!("\n--- Scene ---");
        print_node(&doc, root, 1);
    }

    Ok(())
}

fn print_node(doc: &ColladaDocument, id: NodeId, depth: usize) {
    let Some(node) = doc.node(id) else {
        return;
    };

    let pos = doc.world_transform(id).transform_point3(dae_math::Vec3::ZERO);
    println!(
        "{}{} at ({:.2}, {:.2}, {:.2}) - {} meshes, {} lights, {} cameras",
        "  ".repeat(depth),
        if node.name.is_empty() { &node.id } else { &node.name },
        pos.x,
        pos.y,
        pos.z,
        node.meshes.len(),
        node.lights.len(),
        node.cameras.len()
    );
    for child in &node.children {
        print_node(doc, *child, depth + 1);
    }
}
