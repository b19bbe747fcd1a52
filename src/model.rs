use anyhow::{anyhow, ensure, Context, Result};
use glam::{Mat4, Quat, Vec3};
use gltf::mesh::Mode;
use std::path::Path;

pub type NodeId = usize;

/// Flat-colored triangle in the owning node's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub color: Vec3,
}

impl Triangle {
    pub fn transformed(&self, matrix: &Mat4) -> Triangle {
        Triangle {
            positions: [
                matrix.transform_point3(self.positions[0]),
                matrix.transform_point3(self.positions[1]),
                matrix.transform_point3(self.positions[2]),
            ],
            color: self.color,
        }
    }

    pub fn centroid(&self) -> Vec3 {
        (self.positions[0] + self.positions[1] + self.positions[2]) / 3.0
    }

    /// Unit normal following the vertex winding, or zero for degenerate triangles.
    pub fn normal(&self) -> Vec3 {
        let [a, b, c] = self.positions;
        (b - a).cross(c - a).normalize_or_zero()
    }
}

#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub triangles: Vec<Triangle>,
}

impl ModelNode {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            parent: None,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            triangles: Vec::new(),
        }
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_triangles(mut self, triangles: Vec<Triangle>) -> Self {
        self.triangles = triangles;
        self
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Loaded model: a node hierarchy where every parent precedes its children.
#[derive(Debug, Clone)]
pub struct ModelGraph {
    label: String,
    nodes: Vec<ModelNode>,
}

impl ModelGraph {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), nodes: Vec::new() }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Appends `node` under `parent`. Panics-free: an unknown parent makes the node a root.
    pub fn add_node(&mut self, mut node: ModelNode, parent: Option<NodeId>) -> NodeId {
        node.parent = parent.filter(|&p| p < self.nodes.len());
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn node(&self, id: NodeId) -> Option<&ModelNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut ModelNode> {
        self.nodes.get_mut(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.nodes.iter().map(|node| node.triangles.len()).sum()
    }

    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|node| node.name.as_deref() == Some(name))
    }

    /// World matrix of `id` when the whole model is placed by `model`.
    pub fn world_matrix(&self, id: NodeId, model: Mat4) -> Option<Mat4> {
        let node = self.nodes.get(id)?;
        let parent = match node.parent {
            Some(parent) => self.world_matrix(parent, model)?,
            None => model,
        };
        Some(parent * node.local_matrix())
    }

    /// Every triangle of the model in world space.
    pub fn world_triangles(&self, model: Mat4) -> Vec<Triangle> {
        let mut matrices: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        let mut out = Vec::with_capacity(self.triangle_count());
        for node in &self.nodes {
            let parent = node.parent.and_then(|p| matrices.get(p).copied()).unwrap_or(model);
            let world = parent * node.local_matrix();
            matrices.push(world);
            out.extend(node.triangles.iter().map(|tri| tri.transformed(&world)));
        }
        out
    }

    pub fn load_gltf(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let (document, buffers, _images) = gltf::import(path_ref)
            .with_context(|| format!("Failed to import glTF from {}", path_ref.display()))?;
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| anyhow!("No scenes found in {}", path_ref.display()))?;
        let mut graph = ModelGraph::new(path_ref.display().to_string());
        for node in scene.nodes() {
            graph.import_gltf_node(&node, None, &buffers, path_ref)?;
        }
        ensure!(graph.triangle_count() > 0, "No triangle geometry found in {}", path_ref.display());
        log::info!(
            "[model] Loaded {} ({} nodes, {} triangles)",
            path_ref.display(),
            graph.node_count(),
            graph.triangle_count()
        );
        Ok(graph)
    }

    fn import_gltf_node(
        &mut self,
        node: &gltf::Node<'_>,
        parent: Option<NodeId>,
        buffers: &[gltf::buffer::Data],
        path: &Path,
    ) -> Result<()> {
        let (translation, rotation, scale) = node.transform().decomposed();
        let mut triangles = Vec::new();
        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if primitive.mode() != Mode::Triangles {
                    continue;
                }
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
                let positions: Vec<Vec3> = reader
                    .read_positions()
                    .ok_or_else(|| anyhow!("POSITION attribute missing in {}", path.display()))?
                    .map(Vec3::from_array)
                    .collect();
                let indices: Vec<u32> = reader
                    .read_indices()
                    .map(|it| it.into_u32().collect())
                    .unwrap_or_else(|| (0..positions.len() as u32).collect());
                let [r, g, b, _] = primitive.material().pbr_metallic_roughness().base_color_factor();
                let color = Vec3::new(r, g, b);
                for tri in indices.chunks_exact(3) {
                    let corners = [tri[0], tri[1], tri[2]].map(|i| positions.get(i as usize).copied());
                    if let [Some(a), Some(b), Some(c)] = corners {
                        triangles.push(Triangle { positions: [a, b, c], color });
                    }
                }
            }
        }
        let mut model_node = ModelNode::new(node.name()).with_triangles(triangles);
        model_node.translation = Vec3::from_array(translation);
        model_node.rotation = Quat::from_array(rotation);
        model_node.scale = Vec3::from_array(scale);
        let id = self.add_node(model_node, parent);
        for child in node.children() {
            self.import_gltf_node(&child, Some(id), buffers, path)?;
        }
        Ok(())
    }

    /// Built-in low-poly aircraft, nose along +X, with a spinning `"Propeller"` node.
    pub fn procedural_aircraft() -> Self {
        let hull = Vec3::new(0.75, 0.77, 0.8);
        let trim = Vec3::new(0.78, 0.2, 0.18);
        let glass = Vec3::new(0.35, 0.55, 0.75);
        let dark = Vec3::new(0.18, 0.18, 0.2);

        let mut graph = ModelGraph::new("procedural aircraft");
        let fuselage = graph.add_node(
            ModelNode::new(Some("Fuselage"))
                .with_triangles(box_triangles(Vec3::new(-2.5, -0.5, -0.5), Vec3::new(2.2, 0.5, 0.5), hull)),
            None,
        );
        graph.add_node(
            ModelNode::new(Some("Canopy"))
                .with_triangles(box_triangles(Vec3::new(0.9, 0.5, -0.3), Vec3::new(1.5, 0.75, 0.3), glass)),
            Some(fuselage),
        );
        graph.add_node(
            ModelNode::new(Some("Wing"))
                .with_triangles(box_triangles(Vec3::new(0.0, -0.06, -3.2), Vec3::new(1.0, 0.06, 3.2), trim)),
            Some(fuselage),
        );
        graph.add_node(
            ModelNode::new(Some("Stabilizer")).with_triangles(box_triangles(
                Vec3::new(-2.5, -0.05, -1.3),
                Vec3::new(-1.9, 0.05, 1.3),
                trim,
            )),
            Some(fuselage),
        );
        graph.add_node(
            ModelNode::new(Some("Fin"))
                .with_triangles(box_triangles(Vec3::new(-2.5, 0.5, -0.05), Vec3::new(-1.9, 1.5, 0.05), trim)),
            Some(fuselage),
        );
        graph.add_node(
            ModelNode::new(Some("Cowling")).with_triangles(box_triangles(
                Vec3::new(2.2, -0.38, -0.38),
                Vec3::new(2.6, 0.38, 0.38),
                dark,
            )),
            Some(fuselage),
        );
        let mut blades =
            box_triangles(Vec3::new(-0.03, -1.1, -0.08), Vec3::new(0.03, 1.1, 0.08), dark);
        blades.extend(box_triangles(Vec3::new(-0.06, -0.12, -0.12), Vec3::new(0.06, 0.12, 0.12), trim));
        graph.add_node(
            ModelNode::new(Some("Propeller"))
                .with_translation(Vec3::new(2.65, 0.0, 0.0))
                .with_triangles(blades),
            Some(fuselage),
        );
        graph
    }
}

/// Twelve triangles covering the axis-aligned box `[min, max]`.
pub fn box_triangles(min: Vec3, max: Vec3, color: Vec3) -> Vec<Triangle> {
    let corner = |x: bool, y: bool, z: bool| {
        Vec3::new(if x { max.x } else { min.x }, if y { max.y } else { min.y }, if z { max.z } else { min.z })
    };
    let faces = [
        [corner(true, false, false), corner(true, true, false), corner(true, true, true), corner(true, false, true)],
        [corner(false, false, true), corner(false, true, true), corner(false, true, false), corner(false, false, false)],
        [corner(false, true, false), corner(false, true, true), corner(true, true, true), corner(true, true, false)],
        [corner(false, false, true), corner(false, false, false), corner(true, false, false), corner(true, false, true)],
        [corner(false, false, true), corner(true, false, true), corner(true, true, true), corner(false, true, true)],
        [corner(true, false, false), corner(false, false, false), corner(false, true, false), corner(true, true, false)],
    ];
    faces
        .iter()
        .flat_map(|&[a, b, c, d]| {
            [Triangle { positions: [a, b, c], color }, Triangle { positions: [a, c, d], color }]
        })
        .collect()
}
