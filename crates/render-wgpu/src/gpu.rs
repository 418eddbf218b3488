use std::num::NonZeroU64;

use lantern_assets::{AssetStore, Submesh, ATTR_NORMAL, ATTR_POSITION, ATTR_UV};
use lantern_common::{GpuLimits, LimitsError, TextureHandle};
use lantern_scene::EntitySet;
use lantern_uniform::{SceneUniformWriter, ENTITY_RECORD_SIZE};
use wgpu::util::DeviceExt;

use crate::error::RenderError;
use crate::shaders;

/// Query and validate the device limits that size the uniform buffers.
pub fn device_limits(device: &wgpu::Device) -> Result<GpuLimits, LimitsError> {
    let limits = device.limits();
    GpuLimits::new(
        limits.max_uniform_buffer_binding_size,
        limits.min_uniform_buffer_offset_alignment,
    )
}

/// The interleaved layout the forward pipeline consumes: position, normal,
/// uv at offsets 0/12/24, 32 bytes per vertex.
const VERTEX_STRIDE: u32 = 32;
const REQUIRED_ATTRIBUTES: [(u32, u32, u32); 3] = [
    (ATTR_POSITION, 3, 0),
    (ATTR_NORMAL, 3, 12),
    (ATTR_UV, 2, 24),
];

/// Reject a submesh the pipeline cannot draw. Runs at upload time so a
/// malformed asset never reaches a draw call.
fn validate_submesh(mesh_name: &str, submesh: &Submesh) -> Result<(), RenderError> {
    for (location, components, offset) in REQUIRED_ATTRIBUTES {
        let attr = submesh.layout.attribute(location).ok_or_else(|| {
            RenderError::MissingVertexAttribute {
                mesh: mesh_name.to_owned(),
                location,
            }
        })?;
        if attr.components != components {
            return Err(RenderError::AttributeComponentMismatch {
                mesh: mesh_name.to_owned(),
                location,
                got: attr.components,
                want: components,
            });
        }
        if attr.offset != offset {
            return Err(RenderError::UnsupportedVertexLayout {
                mesh: mesh_name.to_owned(),
                stride: submesh.layout.stride,
            });
        }
    }
    if submesh.layout.stride != VERTEX_STRIDE {
        return Err(RenderError::UnsupportedVertexLayout {
            mesh: mesh_name.to_owned(),
            stride: submesh.layout.stride,
        });
    }
    Ok(())
}

struct GpuSubmesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    /// Material's albedo texture, resolved at upload; `None` falls back to
    /// the entity's fallback texture at draw time.
    texture: Option<TextureHandle>,
}

struct GpuModel {
    submeshes: Vec<GpuSubmesh>,
}

/// Forward renderer over the scene uniform layout.
///
/// Owns the GPU twins of the writer's two buffers and uploads only the byte
/// ranges the writer marked dirty since the previous frame.
pub struct ForwardRenderer {
    pipeline: wgpu::RenderPipeline,
    global_buffer: wgpu::Buffer,
    entity_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    entity_bind_group: wgpu::BindGroup,
    texture_bind_groups: Vec<wgpu::BindGroup>,
    models: Vec<GpuModel>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl ForwardRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        writer: &SceneUniformWriter,
        store: &AssetStore,
    ) -> Result<Self, RenderError> {
        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global_uniform_buffer"),
            size: writer.global_bytes().len() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let entity_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("entity_uniform_buffer"),
            size: writer.entity_bytes().len() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("global_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // One 128-byte record per bind, selected by dynamic offset. This is
        // the renderer-side half of the entity offset contract.
        let record_size = NonZeroU64::new(u64::from(ENTITY_RECORD_SIZE))
            .expect("entity record size is non-zero");
        let entity_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("entity_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(record_size),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global_bind_group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });
        let entity_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("entity_bind_group"),
            layout: &entity_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &entity_buffer,
                    offset: 0,
                    size: Some(record_size),
                }),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("albedo_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let texture_bind_groups = store
            .textures()
            .iter()
            .map(|desc| {
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(&desc.name),
                    size: wgpu::Extent3d {
                        width: 1,
                        height: 1,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8UnormSrgb,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                });
                queue.write_texture(
                    texture.as_image_copy(),
                    &desc.rgba,
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: None,
                        rows_per_image: None,
                    },
                    wgpu::Extent3d {
                        width: 1,
                        height: 1,
                        depth_or_array_layers: 1,
                    },
                );
                let view = texture.create_view(&Default::default());
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&desc.name),
                    layout: &texture_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                })
            })
            .collect();

        let models = Self::upload_models(device, store)?;

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("forward_pipeline_layout"),
            bind_group_layouts: &[&global_layout, &entity_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("forward_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::FORWARD_SHADER.into()),
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("forward_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: u64::from(VERTEX_STRIDE),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x2,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);
        tracing::info!(
            textures = store.textures().len(),
            models = store.model_count(),
            "forward renderer ready"
        );

        Ok(Self {
            pipeline,
            global_buffer,
            entity_buffer,
            global_bind_group,
            entity_bind_group,
            texture_bind_groups,
            models,
            depth_texture,
            surface_format,
        })
    }

    fn upload_models(
        device: &wgpu::Device,
        store: &AssetStore,
    ) -> Result<Vec<GpuModel>, RenderError> {
        let mut models = Vec::with_capacity(store.model_count());
        for handle in 0..store.model_count() {
            let model = store.model(lantern_common::ModelHandle(handle as u32))?;
            let mesh = store.mesh(model.mesh)?;
            let mut submeshes = Vec::with_capacity(mesh.submeshes.len());
            for (submesh, material_handle) in mesh.submeshes.iter().zip(&model.materials) {
                validate_submesh(&mesh.name, submesh)?;
                let material = store.material(*material_handle)?;
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&mesh.name),
                    contents: bytemuck::cast_slice(&submesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&mesh.name),
                    contents: bytemuck::cast_slice(&submesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                submeshes.push(GpuSubmesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: submesh.indices.len() as u32,
                    texture: material.albedo_texture,
                });
            }
            models.push(GpuModel { submeshes });
        }
        Ok(models)
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Flush the byte ranges the writer touched since the last upload.
    pub fn upload(&self, queue: &wgpu::Queue, writer: &mut SceneUniformWriter) {
        if let Some(range) = writer.take_global_dirty() {
            queue.write_buffer(
                &self.global_buffer,
                range.start as u64,
                &writer.global_bytes()[range],
            );
        }
        if let Some(range) = writer.take_entity_dirty() {
            queue.write_buffer(
                &self.entity_buffer,
                range.start as u64,
                &writer.entity_bytes()[range],
            );
        }
    }

    /// Draw every entity. Records are selected purely by the dynamic offset
    /// each entity carries from the uniform writer.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        entities: &EntitySet,
    ) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("forward_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("forward_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.06,
                            g: 0.07,
                            b: 0.1,
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

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.global_bind_group, &[]);
            for entity in entities.iter() {
                let Some(model) = self.models.get(entity.model.0 as usize) else {
                    tracing::warn!(model = entity.model.0, "entity references unknown model");
                    continue;
                };
                pass.set_bind_group(1, &self.entity_bind_group, &[entity.buffer_offset]);
                for submesh in &model.submeshes {
                    let texture = submesh.texture.unwrap_or(entity.fallback_texture);
                    let Some(bind) = self.texture_bind_groups.get(texture.0 as usize) else {
                        tracing::warn!(texture = texture.0, "unknown texture handle");
                        continue;
                    };
                    pass.set_bind_group(2, bind, &[]);
                    pass.set_vertex_buffer(0, submesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(submesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..submesh.index_count, 0, 0..1);
                }
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
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
