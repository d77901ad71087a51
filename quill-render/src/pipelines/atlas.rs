//! Atlas render pipeline: one indexed draw of the frame's batched
//! triangles, textured by the single-channel coverage atlas.
//!
//! Vertex and index buffers start small and grow (to the next power of
//! two) when a frame's batch outgrows them.

use quill_text::CoverageBitmap;
use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType, BlendState,
    Buffer, BufferAddress, BufferBindingType, BufferDescriptor, BufferUsages, ColorTargetState,
    ColorWrites, Device, ErrorFilter, Extent3d, FilterMode, FragmentState, FrontFace, IndexFormat,
    MultisampleState, PipelineCompilationOptions, PipelineLayoutDescriptor, PolygonMode,
    PrimitiveState, PrimitiveTopology, Queue, RenderPass, RenderPipeline,
    RenderPipelineDescriptor, SamplerBindingType, SamplerDescriptor, ShaderModuleDescriptor,
    ShaderStages, Texture, TextureDescriptor, TextureDimension, TextureFormat, TextureSampleType,
    TextureUsages, TextureViewDimension, VertexState,
};

use crate::batch::BatchRenderer;
use crate::renderer::RenderError;
use crate::vertex::{CameraUniform, Vertex};

const MIN_BUFFER_SIZE: BufferAddress = 4096;

/// Owns the wgpu pipeline, growable buffers, atlas texture and bind groups.
pub struct AtlasPipeline {
    pipeline: RenderPipeline,

    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,

    camera_buffer: Buffer,
    camera_bind_group: BindGroup,

    atlas_texture: Texture,
    atlas_bind_group: BindGroup,
}

impl AtlasPipeline {
    /// Compile the shader, build the pipeline and upload `atlas`.
    ///
    /// Shader and pipeline creation run inside a validation error scope;
    /// any driver diagnostic becomes [`RenderError::ShaderCompile`].
    pub async fn new(
        device: &Device,
        queue: &Queue,
        target_format: TextureFormat,
        atlas: &CoverageBitmap,
    ) -> Result<Self, RenderError> {
        // ── Camera bind group layout (group 0) ──────────────────
        let camera_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("atlas_camera_bgl"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // ── Atlas bind group layout (group 1) ───────────────────
        let atlas_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("atlas_texture_bgl"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("atlas_pipeline_layout"),
            bind_group_layouts: &[&camera_bgl, &atlas_bgl],
            push_constant_ranges: &[],
        });

        device.push_error_scope(ErrorFilter::Validation);
        let pipeline = create_pipeline(device, &pipeline_layout, target_format);
        if let Some(error) = device.pop_error_scope().await {
            return Err(RenderError::ShaderCompile(error.to_string()));
        }

        let vertex_buffer =
            create_buffer(device, "atlas_vb", MIN_BUFFER_SIZE, BufferUsages::VERTEX);
        let index_buffer = create_buffer(device, "atlas_ib", MIN_BUFFER_SIZE, BufferUsages::INDEX);

        let camera_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("atlas_camera_ub"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("atlas_camera_bg"),
            layout: &camera_bgl,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // ── Atlas texture ───────────────────────────────────────
        let atlas_texture = device.create_texture(&TextureDescriptor {
            label: Some("coverage_atlas"),
            size: Extent3d {
                width: atlas.width(),
                height: atlas.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::R8Unorm,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let atlas_view = atlas_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let atlas_sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("coverage_atlas_sampler"),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            ..Default::default()
        });

        let atlas_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("atlas_texture_bg"),
            layout: &atlas_bgl,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(&atlas_view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::Sampler(&atlas_sampler),
                },
            ],
        });

        let pipeline = Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count: 0,
            camera_buffer,
            camera_bind_group,
            atlas_texture,
            atlas_bind_group,
        };
        pipeline.upload_atlas(queue, atlas);

        log::info!(
            "Atlas pipeline ready ({}×{} coverage texture, target {target_format:?})",
            atlas.width(),
            atlas.height(),
        );
        Ok(pipeline)
    }

    // ───────────────────── Upload ─────────────────────────────────

    /// Copy the coverage bitmap into the `R8Unorm` texture.
    pub fn upload_atlas(&self, queue: &Queue, atlas: &CoverageBitmap) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.atlas_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            atlas.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(atlas.width()), // one byte per texel
                rows_per_image: Some(atlas.height()),
            },
            Extent3d {
                width: atlas.width(),
                height: atlas.height(),
                depth_or_array_layers: 1,
            },
        );
    }

    /// Upload the batch's vertices and indices, growing buffers as needed.
    pub fn upload_batch(&mut self, device: &Device, queue: &Queue, batch: &BatchRenderer) {
        let vertices = batch.vertex_bytes();
        let indices = batch.index_bytes();

        grow_buffer(
            device,
            &mut self.vertex_buffer,
            "atlas_vb",
            vertices.len(),
            BufferUsages::VERTEX,
        );
        grow_buffer(
            device,
            &mut self.index_buffer,
            "atlas_ib",
            indices.len(),
            BufferUsages::INDEX,
        );

        if !vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, vertices);
        }
        if !indices.is_empty() {
            queue.write_buffer(&self.index_buffer, 0, indices);
        }
        self.index_count = batch.index_count();
    }

    pub fn upload_camera(&self, queue: &Queue, camera: &CameraUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
    }

    // ───────────────────── Draw ───────────────────────────────────

    /// Record the single indexed draw for the uploaded batch.
    pub fn draw(&self, pass: &mut RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_bind_group(1, &self.atlas_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }

    /// Indices recorded by the last upload.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_buffer_size(&self) -> BufferAddress {
        self.vertex_buffer.size()
    }

    pub fn index_buffer_size(&self) -> BufferAddress {
        self.index_buffer.size()
    }
}

fn create_pipeline(
    device: &Device,
    layout: &wgpu::PipelineLayout,
    target_format: TextureFormat,
) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("atlas_shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/atlas.wgsl").into()),
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("atlas_pipeline"),
        layout: Some(layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: PipelineCompilationOptions::default(),
            buffers: &[Vertex::layout()],
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: PipelineCompilationOptions::default(),
            targets: &[Some(ColorTargetState {
                format: target_format,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_buffer(device: &Device, label: &str, size: BufferAddress, usage: BufferUsages) -> Buffer {
    device.create_buffer(&BufferDescriptor {
        label: Some(label),
        size,
        usage: usage | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Replace `buffer` with a larger one if `needed` bytes do not fit.
fn grow_buffer(
    device: &Device,
    buffer: &mut Buffer,
    label: &str,
    needed: usize,
    usage: BufferUsages,
) {
    let needed = needed as BufferAddress;
    if needed <= buffer.size() {
        return;
    }
    let size = grown_size(needed);
    log::debug!("Growing {label} from {} to {size} bytes", buffer.size());
    *buffer = create_buffer(device, label, size, usage);
}

fn grown_size(needed: BufferAddress) -> BufferAddress {
    needed.next_power_of_two().max(MIN_BUFFER_SIZE)
}

// ===================================================================
// Tests
// ===================================================================
