//! Integration tests for model loading.

use std::path::Path;

use lantern_resources::MeshData;

#[test]
fn test_load_cube_obj() {
    let model_path = Path::new("../../assets/models/cube.obj");

    // Skip test if file doesn't exist (CI environment may not have assets)
    if !model_path.exists() {
        println!("Skipping test: model file not found at {:?}", model_path);
        return;
    }

    let mesh = MeshData::load_obj(model_path).expect("Failed to load OBJ model");

    assert!(!mesh.vertices.is_empty(), "Mesh should have vertices");
    assert!(!mesh.indices.is_empty(), "Mesh should have indices");
    assert_eq!(
        mesh.indices.len() % 3,
        0,
        "Index count should be a multiple of 3 (triangulated)"
    );

    // De-duplication must never produce out-of-range indices
    let max_index = *mesh.indices.iter().max().unwrap() as usize;
    assert!(
        max_index < mesh.vertices.len(),
        "Index {} out of range for {} vertices",
        max_index,
        mesh.vertices.len()
    );

    // A cube with per-face normals has at most 24 distinct corners; shared
    // corners must have been collapsed below the raw index count
    assert!(
        mesh.vertices.len() < mesh.indices.len(),
        "De-duplication should collapse shared vertices"
    );

    println!(
        "Loaded cube: {} unique vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
}

#[test]
fn test_load_missing_file_is_an_error() {
    let result = MeshData::load_obj(Path::new("../../assets/models/does_not_exist.obj"));
    assert!(result.is_err());
}
