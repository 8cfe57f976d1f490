use std::sync::Arc;

use nyanbounce_platform::{OverlaySurface, Result, ScreenSize};
use tracing::{info, warn};
use wgpu::CompositeAlphaMode;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Fullscreen, Window, WindowAttributes, WindowLevel};

use crate::box_err;

pub const OVERLAY_TITLE: &str = "Nyanbounce Overlay";

/// Borderless, transparent, always-on-top fullscreen window.
pub fn overlay_attributes() -> WindowAttributes {
    let attributes = Window::default_attributes()
        .with_title(OVERLAY_TITLE)
        .with_decorations(false)
        .with_transparent(true)
        .with_resizable(false)
        .with_window_level(WindowLevel::AlwaysOnTop)
        .with_fullscreen(Some(Fullscreen::Borderless(None)));
    #[cfg(target_os = "windows")]
    let attributes = {
        use winit::platform::windows::WindowAttributesExtWindows;
        attributes.with_skip_taskbar(true)
    };
    attributes
}

pub fn create_overlay_window(event_loop: &ActiveEventLoop) -> Result<Arc<Window>> {
    let window = event_loop
        .create_window(overlay_attributes())
        .map_err(box_err)?;
    Ok(Arc::new(window))
}

/// Size of the monitor the overlay landed on, falling back to the window itself.
pub fn screen_size(window: &Window) -> ScreenSize {
    let size = window
        .current_monitor()
        .map(|monitor| monitor.size())
        .unwrap_or_else(|| window.inner_size());
    ScreenSize::new(size.width.max(1), size.height.max(1))
}

/// Alpha modes that let the desktop show through, best first.
const SEE_THROUGH_MODES: [CompositeAlphaMode; 2] = [
    CompositeAlphaMode::PreMultiplied,
    CompositeAlphaMode::PostMultiplied,
];

/// Picks a compositing mode that keeps transparent pixels transparent, if the
/// surface offers one.
pub fn choose_alpha_mode(supported: &[CompositeAlphaMode]) -> Option<CompositeAlphaMode> {
    SEE_THROUGH_MODES
        .into_iter()
        .find(|mode| supported.contains(mode))
}

/// Frames are premultiplied; a post-multiplying compositor wants them straight.
fn fragment_entry(alpha_mode: CompositeAlphaMode) -> &'static str {
    match alpha_mode {
        CompositeAlphaMode::PostMultiplied => "fs_straight",
        _ => "fs_premultiplied",
    }
}

/// `wgpu` surface that blits one screen-sized premultiplied RGBA frame per repaint.
pub struct WgpuOverlay {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    texture: wgpu::Texture,
    frame_size: ScreenSize,
}

impl WgpuOverlay {
    pub fn new(window: Arc<Window>, frame_size: ScreenSize) -> Result<Self> {
        let surface_size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window).map_err(box_err)?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(box_err)?;
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("nyanbounce-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: Default::default(),
            experimental_features: Default::default(),
        }))
        .map_err(box_err)?;

        let max_side = device.limits().max_texture_dimension_2d;
        if frame_size.width > max_side || frame_size.height > max_side {
            return Err(
                format!("a {frame_size} frame exceeds the GPU limit of {max_side} pixels").into(),
            );
        }

        let caps = surface.get_capabilities(&adapter);
        // Unorm keeps the frame bytes as they are.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or("surface reports no texture formats")?;
        let alpha_mode = match choose_alpha_mode(&caps.alpha_modes) {
            Some(mode) => mode,
            None => {
                warn!(
                    supported = ?caps.alpha_modes,
                    "surface cannot composite with the desktop; the overlay will be opaque"
                );
                caps.alpha_modes
                    .first()
                    .copied()
                    .unwrap_or(CompositeAlphaMode::Opaque)
            }
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: surface_size.width.max(1),
            height: surface_size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("overlay-frame"),
            size: wgpu::Extent3d {
                width: frame_size.width,
                height: frame_size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("overlay-bind-group-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("overlay-bind-group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("overlay.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("overlay-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("overlay-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(fragment_entry(alpha_mode)),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        info!(
            "overlay surface {frame_size} (window {}x{}, {format:?}, {alpha_mode:?})",
            surface_size.width, surface_size.height
        );
        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            bind_group,
            texture,
            frame_size,
        })
    }
}

impl OverlaySurface for WgpuOverlay {
    fn present(&mut self, rgba: &[u8]) -> Result<()> {
        let ScreenSize { width, height } = self.frame_size;
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(format!("frame is {} bytes, surface expects {expected}", rgba.len()).into());
        }
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            self.texture.size(),
        );

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // Skip this frame; the next repaint uses the fresh configuration.
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(err) => return Err(box_err(err)),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("overlay-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("overlay-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        Ok(())
    }
}
