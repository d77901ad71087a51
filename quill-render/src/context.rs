//! GPU context: owns `wgpu::Device`, `Queue`, and optional `Surface`.
//!
//! Two construction paths:
//!
//! 1. **Headless** (`GpuContext::new_headless`): no window, no surface.
//!    Used for tests, benchmarks, and off-screen rendering.
//!
//! 2. **Windowed** (`GpuContext::new_with_surface`): requires a
//!    `raw_window_handle`-compatible window.  Used by `quill-desktop`.

use thiserror::Error;
use wgpu::{
    Adapter, Device, DeviceDescriptor, Extent3d, Instance, InstanceDescriptor, Queue,
    RequestAdapterOptions, Surface, SurfaceConfiguration, Texture, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsages,
};

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Device, queue and (when windowed) the configured surface.
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    pub adapter: Adapter,
    /// Present only when rendering to a window.
    pub surface: Option<Surface<'static>>,
    pub surface_config: Option<SurfaceConfiguration>,
    pub surface_format: TextureFormat,
}

/// Adapter plus device/queue, optionally compatible with `surface`.
async fn open_device(
    instance: &Instance,
    surface: Option<&Surface<'_>>,
    label: &str,
) -> Result<(Adapter, Device, Queue), GpuError> {
    let adapter = instance
        .request_adapter(&RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuError::NoAdapter)?;

    let descriptor = DeviceDescriptor {
        label: Some(label),
        ..Default::default()
    };
    let (device, queue) = adapter.request_device(&descriptor, None).await?;
    Ok((adapter, device, queue))
}

/// VSync configuration preferring an sRGB format.
fn surface_config(
    surface: &Surface<'_>,
    adapter: &Adapter,
    width: u32,
    height: u32,
) -> Result<SurfaceConfiguration, GpuError> {
    let caps = surface.get_capabilities(adapter);
    let format = caps
        .formats
        .iter()
        .copied()
        .find(TextureFormat::is_srgb)
        .or_else(|| caps.formats.first().copied())
        .ok_or_else(|| GpuError::Surface("surface reports no formats".into()))?;

    Ok(SurfaceConfiguration {
        usage: TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode: wgpu::PresentMode::Fifo,
        desired_maximum_frame_latency: 2,
        alpha_mode: caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: Vec::new(),
    })
}

impl GpuContext {
    /// Off-screen context; targets use `Rgba8UnormSrgb` so they can be read back.
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = Instance::new(&InstanceDescriptor::default());
        let (adapter, device, queue) = open_device(&instance, None, "quill-headless").await?;

        log::info!("Headless GPU context on {}", adapter.get_info().name);

        Ok(Self {
            device,
            queue,
            adapter,
            surface: None,
            surface_config: None,
            surface_format: TextureFormat::Rgba8UnormSrgb,
        })
    }

    /// Context presenting to `window`, configured at `width × height`.
    pub async fn new_with_surface<W>(window: W, width: u32, height: u32) -> Result<Self, GpuError>
    where
        W: wgpu::WasmNotSendSync + Into<wgpu::SurfaceTarget<'static>>,
    {
        let instance = Instance::new(&InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .map_err(|e| GpuError::Surface(e.to_string()))?;
        let (adapter, device, queue) =
            open_device(&instance, Some(&surface), "quill-windowed").await?;

        let config = surface_config(&surface, &adapter, width, height)?;
        surface.configure(&device, &config);

        log::info!(
            "GPU surface {}×{} ({:?}) on {}",
            config.width,
            config.height,
            config.format,
            adapter.get_info().name
        );

        Ok(Self {
            device,
            queue,
            adapter,
            surface_format: config.format,
            surface: Some(surface),
            surface_config: Some(config),
        })
    }

    /// Reconfigure the surface; the next flush projects onto the new size.
    /// Ignored when headless or when either side is zero (minimized).
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let (Some(surface), Some(config)) = (&self.surface, &mut self.surface_config) else {
            return;
        };
        config.width = width;
        config.height = height;
        surface.configure(&self.device, config);
        log::debug!("Surface resized to {width}×{height}");
    }

    /// Viewport used for projection; `(0, 0)` when headless.
    pub fn surface_size(&self) -> (u32, u32) {
        match &self.surface_config {
            Some(c) => (c.width, c.height),
            None => (0, 0),
        }
    }

    /// Off-screen color target in the context's surface format.
    pub fn create_target_texture(&self, width: u32, height: u32) -> Texture {
        self.device.create_texture(&TextureDescriptor {
            label: Some("quill_offscreen_target"),
            size: Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: self.surface_format,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }
}

// ===================================================================
// Tests
// ===================================================================
