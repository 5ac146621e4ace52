use std::collections::{HashMap, HashSet};
use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::draw::{DrawCmd, DrawList, SpriteCmd};
use crate::render::{RenderCtx, RenderTarget};
use crate::texture::{Texture, TextureId, TextureStore};

use super::common::{premul_alpha_blend, QuadVertex, ViewportUniform, QUAD_INDICES, QUAD_VERTICES};

// ── uploaded texture ──────────────────────────────────────────────────────

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Consecutive sprites sharing one texture: one draw call.
#[derive(Debug, Clone, PartialEq)]
struct Batch {
    texture: TextureId,
    instances: Range<u32>,
}

// ── renderer ──────────────────────────────────────────────────────────────

/// Renderer for `DrawCmd::Sprite`.
///
/// Textures are uploaded from the [`TextureStore`] on first use and kept per
/// [`TextureId`]; copies whose id has left the store are dropped each frame.
/// Paint order is the draw list's order: runs of sprites with the same texture
/// are instanced together, and a texture change starts a new draw call.
/// Textures larger than the device's `max_texture_dimension_2d` are never
/// uploaded; their sprites are skipped with a one-time warning.
pub struct SpriteRenderer {
    // pipeline
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    globals_layout: Option<wgpu::BindGroupLayout>,
    texture_layout: Option<wgpu::BindGroupLayout>,

    // group 0: viewport + sampler
    globals: Option<wgpu::BindGroup>,
    viewport_ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,

    // group 1: per texture
    textures: HashMap<TextureId, GpuTexture>,
    oversized: HashSet<TextureId>,

    // geometry
    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,
    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    // per-frame scratch, reused
    instances: Vec<SpriteInstance>,
    batches: Vec<Batch>,
}

impl Default for SpriteRenderer {
    fn default() -> Self {
        Self {
            pipeline_format: None,
            pipeline: None,
            globals_layout: None,
            texture_layout: None,
            globals: None,
            viewport_ubo: None,
            sampler: None,
            textures: HashMap::new(),
            oversized: HashSet::new(),
            quad_vbo: None,
            quad_ibo: None,
            instance_vbo: None,
            instance_capacity: 0,
            instances: Vec::new(),
            batches: Vec::new(),
        }
    }
}

impl SpriteRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of textures currently resident on the GPU.
    pub fn resident_textures(&self) -> usize {
        self.textures.len()
    }

    /// Renders all `DrawCmd::Sprite` entries in `draw_list`, in order.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        draw_list: &DrawList,
        store: &TextureStore,
    ) {
        self.textures.retain(|id, _| store.contains(*id));
        self.oversized.retain(|id| store.contains(*id));

        let max_dim = ctx.device.limits().max_texture_dimension_2d;
        build_batches(
            draw_list,
            store,
            max_dim,
            &mut self.oversized,
            &mut self.instances,
            &mut self.batches,
        );
        if self.instances.is_empty() {
            return;
        }

        // ── mutable operations before any immutable borrows ────────────────
        self.ensure_pipeline(ctx);
        self.ensure_globals(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_instance_capacity(ctx, self.instances.len());
        for i in 0..self.batches.len() {
            let id = self.batches[i].texture;
            if !self.textures.contains_key(&id) {
                if let Some(tex) = store.get(id) {
                    self.upload(ctx, id, tex);
                }
            }
        }

        let Some(ubo) = self.viewport_ubo.as_ref() else { return; };
        ctx.queue.write_buffer(
            ubo,
            0,
            bytemuck::bytes_of(&ViewportUniform::new(ctx.viewport.width, ctx.viewport.height)),
        );
        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return; };
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&self.instances));

        // ── immutable borrows ──────────────────────────────────────────────
        let Some(pipeline) = self.pipeline.as_ref() else { return; };
        let Some(globals) = self.globals.as_ref() else { return; };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return; };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return; };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("gas sprite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, globals, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);

        for batch in &self.batches {
            let Some(gpu_tex) = self.textures.get(&batch.texture) else { continue; };
            rpass.set_bind_group(1, &gpu_tex.bind_group, &[]);
            rpass.draw_indexed(0..6, 0, batch.instances.clone());
        }
    }

    // ── texture upload ─────────────────────────────────────────────────────

    fn upload(&mut self, ctx: &RenderCtx<'_>, id: TextureId, tex: &Texture) {
        let Some(layout) = self.texture_layout.as_ref() else { return; };

        let size = wgpu::Extent3d {
            width: tex.width.max(1),
            height: tex.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("gas sprite texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if tex.width > 0 && tex.height > 0 {
            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &tex.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * tex.width),
                    rows_per_image: Some(tex.height),
                },
                size,
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gas sprite texture bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });

        log::debug!("uploaded {id:?} ({}x{})", tex.width, tex.height);
        self.textures.insert(id, GpuTexture { _texture: texture, bind_group });
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gas sprite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sprite.wgsl").into()),
        });

        let globals_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gas sprite globals bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: ViewportUniform::min_binding_size(),
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

        let texture_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gas sprite texture bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("gas sprite pipeline layout"),
            bind_group_layouts: &[&globals_layout, &texture_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("gas sprite pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout(), SpriteInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        // Texture bind groups were built against the old layout.
        self.textures.clear();
        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.globals_layout = Some(globals_layout);
        self.texture_layout = Some(texture_layout);
        self.globals = None;
        self.viewport_ubo = None;
    }

    fn ensure_globals(&mut self, ctx: &RenderCtx<'_>) {
        if self.globals.is_some() && self.viewport_ubo.is_some() {
            return;
        }
        let Some(layout) = self.globals_layout.as_ref() else { return; };

        let sampler = self.sampler.get_or_insert_with(|| {
            ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("gas sprite sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            })
        });

        let viewport_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gas sprite viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gas sprite globals"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: viewport_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        self.viewport_ubo = Some(viewport_ubo);
        self.globals = Some(globals);
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }
        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gas sprite quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("gas sprite quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(64);
        let new_size = (new_cap * std::mem::size_of::<SpriteInstance>()) as u64;
        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gas sprite instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

/// Flattens the draw list into instances plus same-texture runs.
///
/// Sprites whose texture is no longer in the store, or exceeds `max_dim` on
/// either side, are skipped. Oversized ids are recorded in `oversized`.
fn build_batches(
    draw_list: &DrawList,
    store: &TextureStore,
    max_dim: u32,
    oversized: &mut HashSet<TextureId>,
    instances: &mut Vec<SpriteInstance>,
    batches: &mut Vec<Batch>,
) {
    instances.clear();
    batches.clear();

    for cmd in draw_list.iter() {
        let DrawCmd::Sprite(sprite) = cmd;
        let Ok((w, h)) = store.size(sprite.texture) else { continue };
        if w > max_dim || h > max_dim {
            if oversized.insert(sprite.texture) {
                log::warn!(
                    "{:?} is {w}x{h}, over the device limit of {max_dim}; not drawn",
                    sprite.texture
                );
            }
            continue;
        }

        let index = instances.len() as u32;
        instances.push(SpriteInstance::from_cmd(sprite));

        match batches.last_mut() {
            Some(last) if last.texture == sprite.texture => last.instances.end = index + 1,
            _ => batches.push(Batch {
                texture: sprite.texture,
                instances: index..index + 1,
            }),
        }
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

/// Instance data layout (40 bytes):
///
///  offset  0  center  [f32; 2]   loc 1
///  offset  8  size    [f32; 2]   loc 2
///  offset 16  rot     [f32; 2]   loc 3  (cos, sin)
///  offset 24  tint    [f32; 4]   loc 4
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq)]
struct SpriteInstance {
    center: [f32; 2],
    size: [f32; 2],
    rot: [f32; 2],
    tint: [f32; 4],
}

impl SpriteInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x2, // center
        2 => Float32x2, // size
        3 => Float32x2, // rot
        4 => Float32x4  // tint
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }

    fn from_cmd(cmd: &SpriteCmd) -> Self {
        let (sin, cos) = cmd.rotation.to_radians().sin_cos();
        Self {
            center: [cmd.center.x, cmd.center.y],
            size: [cmd.size.x, cmd.size.y],
            rot: [cos, sin],
            tint: cmd.tint.to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;
    use crate::paint::Color;

    fn store_with(n: usize) -> (TextureStore, Vec<TextureId>) {
        let mut store = TextureStore::new();
        let ids = (0..n)
            .map(|_| store.insert(Texture::from_premul_rgba(1, 1, vec![255; 4]).unwrap()))
            .collect();
        (store, ids)
    }

    fn sprite(texture: TextureId, x: f32) -> SpriteCmd {
        SpriteCmd {
            texture,
            center: Vec2::new(x, 0.0),
            size: Vec2::splat(8.0),
            rotation: 0.0,
            tint: Color::WHITE,
        }
    }

    #[test]
    fn runs_of_one_texture_share_a_batch() {
        let (store, ids) = store_with(2);
        let mut list = DrawList::new();
        for (tex, x) in [(ids[0], 0.0), (ids[0], 1.0), (ids[1], 2.0), (ids[0], 3.0)] {
            list.push_sprite(sprite(tex, x));
        }

        let (mut instances, mut batches) = (Vec::new(), Vec::new());
        build_batches(&list, &store, 8192, &mut HashSet::new(), &mut instances, &mut batches);

        assert_eq!(instances.len(), 4);
        assert_eq!(
            batches,
            vec![
                Batch { texture: ids[0], instances: 0..2 },
                Batch { texture: ids[1], instances: 2..3 },
                Batch { texture: ids[0], instances: 3..4 },
            ]
        );
        let xs: Vec<f32> = instances.iter().map(|i| i.center[0]).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn removed_textures_are_skipped() {
        let (mut store, ids) = store_with(2);
        store.remove(ids[1]);
        let mut list = DrawList::new();
        list.push_sprite(sprite(ids[1], 0.0));
        list.push_sprite(sprite(ids[0], 1.0));

        let (mut instances, mut batches) = (Vec::new(), Vec::new());
        build_batches(&list, &store, 8192, &mut HashSet::new(), &mut instances, &mut batches);
        assert_eq!(instances.len(), 1);
        assert_eq!(batches, vec![Batch { texture: ids[0], instances: 0..1 }]);
    }

    #[test]
    fn textures_over_the_device_limit_are_skipped() {
        let mut store = TextureStore::new();
        let wide = store.insert(Texture::from_premul_rgba(4, 1, vec![255; 16]).unwrap());
        let small = store.insert(Texture::from_premul_rgba(2, 2, vec![255; 16]).unwrap());
        let mut list = DrawList::new();
        list.push_sprite(sprite(wide, 0.0));
        list.push_sprite(sprite(small, 1.0));
        list.push_sprite(sprite(wide, 2.0));

        let mut oversized = HashSet::new();
        let (mut instances, mut batches) = (Vec::new(), Vec::new());
        build_batches(&list, &store, 2, &mut oversized, &mut instances, &mut batches);
        assert_eq!(batches, vec![Batch { texture: small, instances: 0..1 }]);
        assert_eq!(oversized, HashSet::from([wide]));

        build_batches(&list, &store, 4, &mut oversized, &mut instances, &mut batches);
        assert_eq!(instances.len(), 3);
    }

    #[test]
    fn rotation_is_encoded_as_cos_sin() {
        let mut cmd = sprite(TextureId(0), 0.0);
        cmd.rotation = 90.0;
        let inst = SpriteInstance::from_cmd(&cmd);
        assert!(inst.rot[0].abs() < 1e-6);
        assert!((inst.rot[1] - 1.0).abs() < 1e-6);
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 40);
    }
}
