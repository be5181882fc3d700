//! Offscreen wgpu canvas.
//!
//! Draw calls are recorded during the frame and replayed in a single render
//! pass at [`Canvas::end_frame`], after which the color target is read back
//! into an image.

use std::ops::Range;

use glam::Vec4;
use image::RgbaImage;
use pollster::FutureExt;
use wgpu::util::DeviceExt;

use crate::canvas::{Canvas, ColorVertex, DepthMode, TexVertex};
use crate::error::{RenderError, RenderResult};

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const DEPTH_MODES: [DepthMode; 3] = [DepthMode::Write, DepthMode::TestOnly, DepthMode::Always];

fn depth_index(mode: DepthMode) -> usize {
    match mode {
        DepthMode::Write => 0,
        DepthMode::TestOnly => 1,
        DepthMode::Always => 2,
    }
}

/// Row pitch of a readback buffer, padded to the copy alignment.
#[must_use]
pub fn aligned_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Creates a vertex buffer from data.
fn create_vertex_buffer<T: bytemuck::Pod>(device: &wgpu::Device, data: &[T], label: &str) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

#[derive(Debug, Clone)]
enum DrawCommand {
    Colored { range: Range<u32>, depth: DepthMode },
    Textured { texture: usize, range: Range<u32>, depth: DepthMode },
}

struct Targets {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

impl Targets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("meteoplot color target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("meteoplot depth target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Self {
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
        }
    }
}

/// A wgpu render target without a window.
pub struct GpuCanvas {
    device: wgpu::Device,
    queue: wgpu::Queue,
    width: u32,
    height: u32,
    targets: Targets,
    colored_pipelines: Vec<wgpu::RenderPipeline>,
    textured_pipelines: Vec<wgpu::RenderPipeline>,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    background: Vec4,
    colored: Vec<ColorVertex>,
    textured: Vec<TexVertex>,
    textures: Vec<RgbaImage>,
    commands: Vec<DrawCommand>,
    last_frame: Option<RgbaImage>,
}

impl std::fmt::Debug for GpuCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuCanvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("commands", &self.commands.len())
            .finish_non_exhaustive()
    }
}

impl GpuCanvas {
    /// Creates a headless canvas, blocking on adapter and device creation.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        Self::new_async(width, height).block_on()
    }

    /// Creates a headless canvas.
    pub async fn new_async(width: u32, height: u32) -> RenderResult<Self> {
        let (width, height) = (width.max(1), height.max(1));
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::AdapterCreationFailed)?;
        log::info!("using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("meteoplot device (headless)"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("textured bind group layout"),
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

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("repeat sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let colored_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("colored shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/colored.wgsl").into()),
        });
        let textured_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("textured shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/textured.wgsl").into()),
        });

        let colored_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("colored pipeline layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });
        let textured_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("textured pipeline layout"),
            bind_group_layouts: &[&texture_layout],
            push_constant_ranges: &[],
        });

        let colored_attributes = wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x4];
        let colored_buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ColorVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &colored_attributes,
        }];
        let textured_attributes = [
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 16,
                shader_location: 1,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 32,
                shader_location: 2,
            },
        ];
        let textured_buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TexVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &textured_attributes,
        }];

        let colored_pipelines = DEPTH_MODES
            .iter()
            .map(|mode| create_pipeline(&device, &colored_layout, &colored_shader, &colored_buffers, *mode, "colored pipeline"))
            .collect();
        let textured_pipelines = DEPTH_MODES
            .iter()
            .map(|mode| create_pipeline(&device, &textured_layout, &textured_shader, &textured_buffers, *mode, "textured pipeline"))
            .collect();

        let targets = Targets::new(&device, width, height);
        Ok(Self {
            device,
            queue,
            width,
            height,
            targets,
            colored_pipelines,
            textured_pipelines,
            texture_layout,
            sampler,
            background: Vec4::ONE,
            colored: Vec::new(),
            textured: Vec::new(),
            textures: Vec::new(),
            commands: Vec::new(),
            last_frame: None,
        })
    }

    fn upload_texture(&self, image: &RgbaImage) -> wgpu::BindGroup {
        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("meteoplot image texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("meteoplot image bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn push_range<T>(list: &mut Vec<T>, vertices: &[T]) -> Range<u32>
    where
        T: Copy,
    {
        let start = list.len() as u32;
        list.extend_from_slice(vertices);
        start..list.len() as u32
    }

    fn read_back(&self) -> RenderResult<RgbaImage> {
        let bytes_per_row = aligned_bytes_per_row(self.width);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("meteoplot readback buffer"),
            size: u64::from(bytes_per_row) * u64::from(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.targets.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| RenderError::BufferMapFailed)?
            .map_err(|_| RenderError::BufferMapFailed)?;

        let data = slice.get_mapped_range();
        let row_bytes = (self.width * 4) as usize;
        let mut pixels = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height {
            let start = (row * bytes_per_row) as usize;
            pixels.extend_from_slice(&data[start..start + row_bytes]);
        }
        drop(data);
        buffer.unmap();

        RgbaImage::from_raw(self.width, self.height, pixels)
            .ok_or(RenderError::Screenshot(crate::screenshot::ScreenshotError::InvalidImageData))
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    buffers: &[wgpu::VertexBufferLayout<'_>],
    depth: DepthMode,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
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
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: depth.writes(),
            depth_compare: if depth.tests() {
                wgpu::CompareFunction::LessEqual
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

impl Canvas for GpuCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        self.width = width.max(1);
        self.height = height.max(1);
        self.targets = Targets::new(&self.device, self.width, self.height);
        self.last_frame = None;
        log::debug!("gpu canvas resized to {}x{}", self.width, self.height);
        Ok(())
    }

    fn begin_frame(&mut self, background: Vec4) {
        self.background = background;
        self.colored.clear();
        self.textured.clear();
        self.textures.clear();
        self.commands.clear();
    }

    fn draw_triangles(&mut self, vertices: &[ColorVertex], depth: DepthMode) {
        if vertices.len() < 3 {
            return;
        }
        let range = Self::push_range(&mut self.colored, vertices);
        self.commands.push(DrawCommand::Colored { range, depth });
    }

    fn draw_textured(
        &mut self,
        texture: &RgbaImage,
        vertices: &[TexVertex],
        depth: DepthMode,
    ) -> RenderResult<()> {
        let max = self.device.limits().max_texture_dimension_2d;
        if texture.width() == 0 || texture.height() == 0 || texture.width() > max || texture.height() > max {
            return Err(RenderError::Texture(format!(
                "unsupported texture size {}x{}",
                texture.width(),
                texture.height()
            )));
        }
        if vertices.len() < 3 {
            return Ok(());
        }
        let range = Self::push_range(&mut self.textured, vertices);
        self.textures.push(texture.clone());
        self.commands.push(DrawCommand::Textured {
            texture: self.textures.len() - 1,
            range,
            depth,
        });
        Ok(())
    }

    fn read_depth(&self, _x: u32, _y: u32) -> Option<f32> {
        None
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        let colored_buffer = (!self.colored.is_empty())
            .then(|| create_vertex_buffer(&self.device, &self.colored, "colored vertices"));
        let textured_buffer = (!self.textured.is_empty())
            .then(|| create_vertex_buffer(&self.device, &self.textured, "textured vertices"));
        let bind_groups: Vec<wgpu::BindGroup> = self.textures.iter().map(|t| self.upload_texture(t)).collect();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("meteoplot frame encoder"),
            });
        {
            let bg = self.background.as_dvec4();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("meteoplot frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: bg.x,
                            g: bg.y,
                            b: bg.z,
                            a: bg.w,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for command in &self.commands {
                match command {
                    DrawCommand::Colored { range, depth } => {
                        let Some(buffer) = &colored_buffer else { continue };
                        pass.set_pipeline(&self.colored_pipelines[depth_index(*depth)]);
                        pass.set_vertex_buffer(0, buffer.slice(..));
                        pass.draw(range.clone(), 0..1);
                    }
                    DrawCommand::Textured { texture, range, depth } => {
                        let (Some(buffer), Some(group)) = (&textured_buffer, bind_groups.get(*texture)) else {
                            continue;
                        };
                        pass.set_pipeline(&self.textured_pipelines[depth_index(*depth)]);
                        pass.set_bind_group(0, group, &[]);
                        pass.set_vertex_buffer(0, buffer.slice(..));
                        pass.draw(range.clone(), 0..1);
                    }
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        log::debug!("gpu frame submitted with {} draw calls", self.commands.len());

        self.last_frame = Some(self.read_back()?);
        self.commands.clear();
        self.textures.clear();
        Ok(())
    }

    fn snapshot(&mut self) -> RenderResult<RgbaImage> {
        self.last_frame.clone().ok_or(RenderError::NoContext)
    }
}
