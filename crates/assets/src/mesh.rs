use serde::{Deserialize, Serialize};

/// One mesh vertex. UVs drive the shell noise lattice, so every generator
/// must produce a continuous 0..1 parameterization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Immutable triangle mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat square on the XZ plane centred at the origin, facing +Y.
    pub fn plane(size: f32, subdivisions: u32) -> Self {
        let cells = subdivisions.max(1);
        let side = cells + 1;
        let half = size * 0.5;
        let mut vertices = Vec::with_capacity((side * side) as usize);
        for z in 0..side {
            for x in 0..side {
                let u = x as f32 / cells as f32;
                let v = z as f32 / cells as f32;
                vertices.push(MeshVertex {
                    position: [-half + u * size, 0.0, -half + v * size],
                    normal: [0.0, 1.0, 0.0],
                    uv: [u, v],
                });
            }
        }

        let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
        for z in 0..cells {
            for x in 0..cells {
                let i0 = z * side + x;
                let i1 = i0 + 1;
                let i2 = i0 + side;
                let i3 = i2 + 1;
                // Counter-clockwise seen from +Y.
                indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
            }
        }

        Self {
            name: format!("plane_{size}_{cells}"),
            vertices,
            indices,
        }
    }

    /// Latitude/longitude sphere. The seam column is duplicated so UVs stay continuous.
    pub fn uv_sphere(radius: f32, sectors: u32, stacks: u32) -> Self {
        let sectors = sectors.max(3);
        let stacks = stacks.max(2);
        let mut vertices = Vec::with_capacity(((sectors + 1) * (stacks + 1)) as usize);
        for stack in 0..=stacks {
            let v = stack as f32 / stacks as f32;
            let phi = v * std::f32::consts::PI;
            for sector in 0..=sectors {
                let u = sector as f32 / sectors as f32;
                let theta = u * std::f32::consts::TAU;
                let normal = [phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()];
                vertices.push(MeshVertex {
                    position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                    normal,
                    uv: [u, v],
                });
            }
        }

        let row = sectors + 1;
        let mut indices = Vec::with_capacity((sectors * stacks * 6) as usize);
        for stack in 0..stacks {
            for sector in 0..sectors {
                let a = stack * row + sector;
                let b = a + row;
                if stack != 0 {
                    indices.extend_from_slice(&[a, a + 1, b]);
                }
                if stack != stacks - 1 {
                    indices.extend_from_slice(&[a + 1, b + 1, b]);
                }
            }
        }

        Self {
            name: format!("uv_sphere_{radius}_{sectors}x{stacks}"),
            vertices,
            indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_counts() {
        let mesh = Mesh::plane(2.0, 4);
        assert_eq!(mesh.vertex_count(), 25);
        assert_eq!(mesh.triangle_count(), 32);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn plane_zero_subdivisions_is_one_quad() {
        let mesh = Mesh::plane(1.0, 0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let mesh = Mesh::uv_sphere(0.5, 16, 8);
        for v in &mesh.vertices {
            let [x, y, z] = v.position;
            let r = (x * x + y * y + z * z).sqrt();
            assert!((r - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn sphere_indices_in_bounds() {
        let mesh = Mesh::uv_sphere(1.0, 12, 6);
        let n = mesh.vertex_count() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
        assert_eq!(mesh.indices.len() % 3, 0);
        // Poles contribute one triangle per sector, other stacks two.
        assert_eq!(mesh.triangle_count(), (12 * 6 * 2 - 2 * 12) as usize);
    }
}
