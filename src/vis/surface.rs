/// Token for one pending frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// A point moving across the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Hue in degrees, `[0, 360)`.
    pub hue: f64,
}

/// A 2-D drawing surface driven by the host's refresh cycle.
///
/// `request_frame` asks the host to call back once on its next refresh
/// (the host then hands the handle to `VisualizationLoop::on_frame`).
/// `cancel_frame` withdraws a request that has not fired yet.
pub trait Surface {
    /// Width and height in surface units.
    fn size(&self) -> (f64, f64);

    fn clear(&mut self);

    fn draw_particle(&mut self, particle: &Particle);

    fn request_frame(&mut self) -> FrameHandle;

    fn cancel_frame(&mut self, handle: FrameHandle);
}
