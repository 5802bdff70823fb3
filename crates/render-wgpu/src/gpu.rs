use bytemuck::{Pod, Zeroable};
use crate::shaders;
use glam::{Mat4, Vec4};
use shellfur_assets::{AssetStore, Mesh};
use shellfur_common::{Color, MeshHandle};
use shellfur_ecs::ComponentStore;
use shellfur_kernel::Scene;
use shellfur_render::{PreviewDraw, ShaderSurfaces, props};
use std::collections::BTreeMap;
use wgpu::util::DeviceExt;

/// The global surface as the shell shader reads it.
///
/// Field order and grouping mirror `ShellUniforms` in the WGSL source.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShellUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub shell_color: [f32; 4],
    pub direction: [f32; 4],
    pub wind: [f32; 4],
    /// shell_length, distance_attenuation, density, thickness
    pub shape: [f32; 4],
    /// curvature, displacement_strength, occlusion_attenuation, occlusion_bias
    pub shading: [f32; 4],
    /// noise_min, noise_max, shell_count, time
    pub misc: [f32; 4],
}

impl ShellUniforms {
    /// Pack whatever is currently on the global surface. Missing scalars read
    /// as zero, a missing color as white and a missing count as one.
    pub fn from_surfaces(surfaces: &ShaderSurfaces, view_proj: Mat4, time: f32) -> Self {
        let global = surfaces.global();
        let float = |name: &str| global.get_float(name).unwrap_or(0.0);
        let vector = |name: &str| global.get_vector(name).unwrap_or(Vec4::ZERO).to_array();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            shell_color: global
                .get_color(props::SHELL_COLOR)
                .unwrap_or(Color::WHITE)
                .to_array(),
            direction: vector(props::SHELL_DIRECTION),
            wind: vector(props::WIND_DIR_CHANGE_SPEED),
            shape: [
                float(props::SHELL_LENGTH),
                float(props::SHELL_DISTANCE_ATTENUATION),
                float(props::DENSITY),
                float(props::THICKNESS),
            ],
            shading: [
                float(props::CURVATURE),
                float(props::DISPLACEMENT_STRENGTH),
                float(props::ATTENUATION),
                float(props::OCCLUSION_BIAS),
            ],
            misc: [
                float(props::NOISE_MIN),
                float(props::NOISE_MAX),
                global.get_int(props::SHELL_COUNT).unwrap_or(1) as f32,
                time,
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
    uv: [f32; 2],
}

/// One shell as the GPU sees it: the model matrix and `_ShellIndex`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShellInstanceData {
    pub model: [[f32; 4]; 4],
    pub shell_index: u32,
    _pad: [u32; 3],
}

impl ShellInstanceData {
    pub fn new(model: Mat4, shell_index: u32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            shell_index,
            _pad: [0; 3],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GridVertex {
    position: [f32; 3],
    color: [f32; 4],
}

/// Group every tagged renderable by mesh, in stable scene order.
///
/// Renderables without a shell tag are not shells and are skipped.
pub fn collect_shell_instances(
    scene: &Scene,
    components: &ComponentStore,
    surfaces: &ShaderSurfaces,
) -> BTreeMap<MeshHandle, Vec<ShellInstanceData>> {
    let mut batches: BTreeMap<MeshHandle, Vec<ShellInstanceData>> = BTreeMap::new();
    for (entity, renderable) in components.renderables() {
        let Some(tag) = surfaces.instance_tag(*entity) else {
            continue;
        };
        let Some(world) = scene.world_transform(*entity) else {
            continue;
        };
        batches
            .entry(renderable.mesh)
            .or_default()
            .push(ShellInstanceData::new(world.to_matrix(), tag.shell_index));
    }
    for batch in batches.values_mut() {
        batch.sort_by_key(|i| i.shell_index);
    }
    batches
}

fn gpu_vertices(mesh: &Mesh) -> Vec<Vertex> {
    mesh.vertices
        .iter()
        .map(|v| Vertex {
            position: v.position,
            normal: v.normal,
            uv: v.uv,
        })
        .collect()
}

/// Generate grid floor line vertices.
fn grid_mesh(half_extent: i32, spacing: f32) -> Vec<GridVertex> {
    let mut verts = Vec::new();
    let color = [0.3, 0.3, 0.3, 1.0];
    let extent = half_extent as f32 * spacing;

    for i in -half_extent..=half_extent {
        let offset = i as f32 * spacing;
        verts.push(GridVertex {
            position: [-extent, 0.0, offset],
            color,
        });
        verts.push(GridVertex {
            position: [extent, 0.0, offset],
            color,
        });
        verts.push(GridVertex {
            position: [offset, 0.0, -extent],
            color,
        });
        verts.push(GridVertex {
            position: [offset, 0.0, extent],
            color,
        });
    }
    verts
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// What one frame draws.
pub struct ShellFrame<'a> {
    pub scene: &'a Scene,
    pub components: &'a ComponentStore,
    pub assets: &'a AssetStore,
    pub surfaces: &'a ShaderSurfaces,
    pub view_proj: Mat4,
    pub time: f32,
    pub preview: Option<PreviewDraw>,
}

/// wgpu renderer for shell fur plus a grid floor.
///
/// Each mesh is uploaded once on first use. Shells of one mesh go out as a
/// single instanced draw.
pub struct WgpuShellRenderer {
    shell_pipeline: wgpu::RenderPipeline,
    preview_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    grid_vertex_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    meshes: BTreeMap<MeshHandle, GpuMesh>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4,
    7 => Uint32,
];

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
];

impl WgpuShellRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("shell_uniform_buffer"),
            contents: bytemuck::bytes_of(&ShellUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shell_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shell_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shell_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let mesh_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<ShellInstanceData>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &INSTANCE_ATTRIBUTES,
            },
        ];
        let depth_state = wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        };
        let color_targets = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        // Shells are seen from both sides once they bend, so no culling.
        let shell_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shell_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SHELL_SHADER.into()),
        });
        let shell_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shell_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shell_shader,
                entry_point: Some("vs_shell"),
                compilation_options: Default::default(),
                buffers: &mesh_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shell_shader,
                entry_point: Some("fs_shell"),
                compilation_options: Default::default(),
                targets: &color_targets,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state.clone()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let preview_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("preview_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PREVIEW_SHADER.into()),
        });
        let preview_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("preview_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &preview_shader,
                entry_point: Some("vs_preview"),
                compilation_options: Default::default(),
                buffers: &mesh_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &preview_shader,
                entry_point: Some("fs_preview"),
                compilation_options: Default::default(),
                targets: &color_targets,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_state.clone()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::GRID_SHADER.into()),
        });
        let grid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &grid_shader,
                entry_point: Some("vs_grid"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GridVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &grid_shader,
                entry_point: Some("fs_grid"),
                compilation_options: Default::default(),
                targets: &color_targets,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(depth_state),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let grid_verts = grid_mesh(20, 1.0);
        let grid_vertex_count = grid_verts.len() as u32;
        let grid_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_vertex_buffer"),
            contents: bytemuck::cast_slice(&grid_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Room for a full 256-shell stack on a few bodies plus the preview.
        let max_instances = 4096u32;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shell_instance_buffer"),
            size: (max_instances as u64) * std::mem::size_of::<ShellInstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            shell_pipeline,
            preview_pipeline,
            grid_pipeline,
            uniform_buffer,
            uniform_bind_group,
            grid_vertex_buffer,
            grid_vertex_count,
            instance_buffer,
            max_instances,
            meshes: BTreeMap::new(),
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    fn ensure_mesh(&mut self, device: &wgpu::Device, assets: &AssetStore, handle: MeshHandle) -> bool {
        if self.meshes.contains_key(&handle) {
            return true;
        }
        let Some(mesh) = assets.get_mesh(handle) else {
            tracing::warn!(?handle, "renderable mesh is not registered, skipped");
            return false;
        };
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(&gpu_vertices(mesh)),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_index_buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        tracing::debug!(?handle, name = %mesh.name, vertices = mesh.vertex_count(), "uploaded mesh");
        self.meshes.insert(
            handle,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: mesh.indices.len() as u32,
            },
        );
        true
    }

    /// Render one frame: grid floor, every shell batch, then the preview if any.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        frame: &ShellFrame<'_>,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&ShellUniforms::from_surfaces(
                frame.surfaces,
                frame.view_proj,
                frame.time,
            )),
        );

        // Flatten the batches into one instance buffer, remembering each range.
        let batches = collect_shell_instances(frame.scene, frame.components, frame.surfaces);
        let mut instances: Vec<ShellInstanceData> = Vec::new();
        let mut draws: Vec<(MeshHandle, std::ops::Range<u32>)> = Vec::new();
        for (mesh, batch) in batches {
            if !self.ensure_mesh(device, frame.assets, mesh) {
                continue;
            }
            let room = self.max_instances as usize - instances.len();
            let start = instances.len() as u32;
            instances.extend(batch.into_iter().take(room));
            draws.push((mesh, start..instances.len() as u32));
        }
        let mut preview_draw = None;
        if let Some(preview) = frame.preview {
            if instances.len() < self.max_instances as usize
                && self.ensure_mesh(device, frame.assets, preview.mesh)
            {
                let slot = instances.len() as u32;
                instances.push(ShellInstanceData::new(preview.transform.to_matrix(), 0));
                preview_draw = Some((preview.mesh, slot..slot + 1));
            }
        }

        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("shell_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shell_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.08,
                            g: 0.09,
                            b: 0.12,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_pipeline(&self.grid_pipeline);
            pass.set_vertex_buffer(0, self.grid_vertex_buffer.slice(..));
            pass.draw(0..self.grid_vertex_count, 0..1);

            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            pass.set_pipeline(&self.shell_pipeline);
            for (mesh, range) in &draws {
                if let Some(gpu) = self.meshes.get(mesh) {
                    pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                    pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..gpu.index_count, 0, range.clone());
                }
            }

            if let Some((mesh, range)) = &preview_draw {
                if let Some(gpu) = self.meshes.get(mesh) {
                    pass.set_pipeline(&self.preview_pipeline);
                    pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                    pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..gpu.index_count, 0, range.clone());
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use shellfur_common::{EntityId, MaterialHandle, Transform};
    use shellfur_ecs::Renderable;
    use shellfur_render::ShellTag;

    #[test]
    fn gpu_struct_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<ShellUniforms>(), 160);
        assert_eq!(std::mem::size_of::<ShellInstanceData>(), 80);
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn uniforms_pack_global_surface() {
        let mut surfaces = ShaderSurfaces::new();
        surfaces.set_int(props::SHELL_COUNT, 32);
        surfaces.set_float(props::SHELL_LENGTH, 0.2);
        surfaces.set_float(props::DENSITY, 50.0);
        surfaces.set_float(props::CURVATURE, 2.0);
        surfaces.set_float(props::NOISE_MAX, 0.9);
        surfaces.set_color(props::SHELL_COLOR, Color::new(0.1, 0.2, 0.3, 1.0));
        surfaces.set_vector(props::SHELL_DIRECTION, Vec4::new(0.0, -1.0, 0.0, 0.0));

        let u = ShellUniforms::from_surfaces(&surfaces, Mat4::IDENTITY, 2.5);
        assert_eq!(u.view_proj, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(u.shape, [0.2, 0.0, 50.0, 0.0]);
        assert_eq!(u.shading[0], 2.0);
        assert_eq!(u.misc, [0.0, 0.9, 32.0, 2.5]);
        assert_eq!(u.shell_color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(u.direction, [0.0, -1.0, 0.0, 0.0]);
        assert_eq!(u.wind, [0.0; 4]);
    }

    #[test]
    fn empty_surface_packs_safe_defaults() {
        let u = ShellUniforms::from_surfaces(&ShaderSurfaces::new(), Mat4::IDENTITY, 0.0);
        assert_eq!(u.misc[2], 1.0);
        assert_eq!(u.shell_color, [1.0; 4]);
    }

    #[test]
    fn collect_groups_tagged_renderables_by_mesh() {
        let mut scene = Scene::new();
        let mut components = ComponentStore::new();
        let mut surfaces = ShaderSurfaces::new();
        let owner = scene.spawn(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        let material = MaterialHandle(9);

        for index in (0..3u32).rev() {
            let shell = scene.spawn_child(owner, Transform::IDENTITY).unwrap();
            components.set_renderable(shell, Renderable { mesh: MeshHandle(1), material });
            surfaces.set_instance_tag(shell, ShellTag::new(index));
        }
        let untagged = scene.spawn(Transform::default());
        components.set_renderable(untagged, Renderable { mesh: MeshHandle(2), material });
        components.set_renderable(EntityId::new(), Renderable { mesh: MeshHandle(1), material });

        let batches = collect_shell_instances(&scene, &components, &surfaces);
        assert_eq!(batches.len(), 1);
        let batch = &batches[&MeshHandle(1)];
        let indices: Vec<u32> = batch.iter().map(|i| i.shell_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(batch[0].model[3], [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn grid_covers_both_axes() {
        let verts = grid_mesh(2, 1.0);
        assert_eq!(verts.len(), 5 * 4);
    }
}
