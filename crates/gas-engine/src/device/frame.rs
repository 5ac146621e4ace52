/// A single acquired swapchain frame.
///
/// Short-lived: hand it back through [`Gpu::submit`](super::Gpu::submit)
/// promptly, since holding the surface texture blocks the next acquisition.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
