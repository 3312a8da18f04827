//! OBJ mesh loading.
//!
//! Parses Wavefront OBJ files with `tobj` and produces indexed vertex data.
//! Identical vertices (same position, color, normal, and UV) are collapsed
//! through a hash map keyed on the float bit patterns, so heavily shared
//! corners are stored once.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

use glam::{Vec2, Vec3};
use tracing::{debug, info};

use crate::error::{ResourceError, ResourceResult};

/// A single mesh vertex on the CPU side.
///
/// Mirrors the GPU vertex layout: position, color, normal, UV.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeshVertex {
    pub position: Vec3,
    pub color: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl MeshVertex {
    fn to_bits(self) -> [u32; 11] {
        [
            self.position.x.to_bits(),
            self.position.y.to_bits(),
            self.position.z.to_bits(),
            self.color.x.to_bits(),
            self.color.y.to_bits(),
            self.color.z.to_bits(),
            self.normal.x.to_bits(),
            self.normal.y.to_bits(),
            self.normal.z.to_bits(),
            self.uv.x.to_bits(),
            self.uv.y.to_bits(),
        ]
    }
}

// Equality and hashing use the exact float bit patterns: two vertices are
// interchangeable only when every component matches bit-for-bit, which is
// what OBJ de-duplication needs. Comparing bits keeps Eq consistent with
// Hash (float == would conflate 0.0 and -0.0 while their hashes differ).
impl PartialEq for MeshVertex {
    fn eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl Eq for MeshVertex {}

impl Hash for MeshVertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bits().hash(state);
    }
}

/// Indexed mesh data loaded from a model file.
#[derive(Debug, Default)]
pub struct MeshData {
    /// De-duplicated vertices.
    pub vertices: Vec<MeshVertex>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Loads mesh data from a Wavefront OBJ file.
    ///
    /// All models in the file are merged into a single indexed mesh.
    /// Missing attributes default to zero (normals/UVs) or white (color).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or contains no meshes.
    pub fn load_obj(path: &Path) -> ResourceResult<Self> {
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|e| ResourceError::ObjLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if models.is_empty() {
            return Err(ResourceError::NoMeshes(path.to_path_buf()));
        }

        let mut data = Self::default();
        let mut unique: HashMap<MeshVertex, u32> = HashMap::new();

        for model in &models {
            let mesh = &model.mesh;

            for &index in &mesh.indices {
                let vertex = Self::read_vertex(mesh, index as usize);

                let next = data.vertices.len() as u32;
                let slot = *unique.entry(vertex).or_insert_with(|| {
                    data.vertices.push(vertex);
                    next
                });
                data.indices.push(slot);
            }

            debug!(
                "Merged OBJ model '{}': {} indices",
                model.name,
                mesh.indices.len()
            );
        }

        info!(
            "Loaded '{}': {} unique vertices, {} triangles",
            path.display(),
            data.vertices.len(),
            data.indices.len() / 3
        );

        Ok(data)
    }

    /// Reads one vertex out of the unified tobj attribute arrays.
    fn read_vertex(mesh: &tobj::Mesh, index: usize) -> MeshVertex {
        let position = Vec3::new(
            mesh.positions[3 * index],
            mesh.positions[3 * index + 1],
            mesh.positions[3 * index + 2],
        );

        let color = if mesh.vertex_color.len() >= 3 * (index + 1) {
            Vec3::new(
                mesh.vertex_color[3 * index],
                mesh.vertex_color[3 * index + 1],
                mesh.vertex_color[3 * index + 2],
            )
        } else {
            Vec3::ONE
        };

        let normal = if mesh.normals.len() >= 3 * (index + 1) {
            Vec3::new(
                mesh.normals[3 * index],
                mesh.normals[3 * index + 1],
                mesh.normals[3 * index + 2],
            )
        } else {
            Vec3::ZERO
        };

        let uv = if mesh.texcoords.len() >= 2 * (index + 1) {
            Vec2::new(mesh.texcoords[2 * index], mesh.texcoords[2 * index + 1])
        } else {
            Vec2::ZERO
        };

        MeshVertex {
            position,
            color,
            normal,
            uv,
        }
    }

    /// Number of unique vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vertices_hash_equal() {
        let a = MeshVertex {
            position: Vec3::new(1.0, 2.0, 3.0),
            color: Vec3::ONE,
            normal: Vec3::Y,
            uv: Vec2::new(0.5, 0.5),
        };
        let b = a;

        let mut map = HashMap::new();
        map.insert(a, 0u32);
        assert_eq!(map.get(&b), Some(&0));
    }

    #[test]
    fn test_differing_uv_is_a_distinct_vertex() {
        let a = MeshVertex {
            position: Vec3::ONE,
            color: Vec3::ONE,
            normal: Vec3::Y,
            uv: Vec2::ZERO,
        };
        let b = MeshVertex {
            uv: Vec2::new(1.0, 0.0),
            ..a
        };

        assert_ne!(a, b);
        let mut map = HashMap::new();
        map.insert(a, 0u32);
        assert_eq!(map.get(&b), None);
    }

    #[test]
    fn test_negative_zero_is_not_positive_zero() {
        // Bit-pattern equality treats -0.0 and 0.0 as distinct, keeping Eq
        // consistent with the bit-based Hash.
        let a = MeshVertex {
            position: Vec3::new(0.0, 0.0, 0.0),
            ..Default::default()
        };
        let b = MeshVertex {
            position: Vec3::new(-0.0, 0.0, 0.0),
            ..Default::default()
        };
        assert_ne!(a, b);

        let mut map = HashMap::new();
        map.insert(a, 0u32);
        map.insert(b, 1u32);
        assert_eq!(map.len(), 2);
    }
}
