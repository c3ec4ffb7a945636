use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::vis::{
    frequency::ActiveFrequency,
    surface::{FrameHandle, Particle, Surface},
};

/*
Particle Loop
=============

    ┌──────┐  note-on (request frame)   ┌─────────┐
    │ Idle │ ─────────────────────────→ │ Running │ ──┐ frame: clear, move,
    └──────┘                            └─────────┘   │ bounce, draw,
       ↑     silence / teardown              │  ↑─────┘ request next frame
       └──── (cancel frame, clear) ──────────┘

Every note-on re-seeds the particle set at the surface centre: each particle
gets a random direction and hue, and a speed proportional to the note's
frequency, so higher notes burst outward faster. Only the Idle → Running
transition requests a frame; while running, each frame requests its own
successor, so there is exactly one pending request at a time.

A frame callback that arrives with a stale handle (it was already in flight
when the chain was cancelled) is ignored. Cancelling while Idle does nothing,
so the host never sees a double cancel.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running(FrameHandle),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisConfig {
    /// Particles seeded per note-on.
    pub particles: usize,
    /// Surface units per frame, per Hz of the triggering note.
    pub speed_per_hz: f64,
    /// Hue rotation in degrees per frame, per Hz of the sounding note.
    pub hue_drift_per_hz: f64,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self {
            particles: 48,
            speed_per_hz: 0.01,
            hue_drift_per_hz: 0.01,
        }
    }
}

pub struct VisualizationLoop {
    state: LoopState,
    particles: Vec<Particle>,
    config: VisConfig,
    frequency: ActiveFrequency,
    rng: Pcg32,
    frames: u64,
}

impl VisualizationLoop {
    pub fn new(config: VisConfig, frequency: ActiveFrequency, seed: u64) -> Self {
        Self {
            state: LoopState::Idle,
            particles: Vec::with_capacity(config.particles),
            config,
            frequency,
            rng: Pcg32::seed_from_u64(seed),
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running(_))
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Frames rendered since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// A note started: burst new particles and make sure the frame chain runs.
    pub fn on_note_on<S: Surface>(&mut self, frequency: f32, surface: &mut S) {
        self.seed(frequency as f64, surface.size());
        if self.state == LoopState::Idle {
            self.state = LoopState::Running(surface.request_frame());
            log::debug!("visualization running");
        }
    }

    /// Render one frame. Returns false if `handle` is not the pending request.
    pub fn on_frame<S: Surface>(&mut self, handle: FrameHandle, surface: &mut S) -> bool {
        match self.state {
            LoopState::Running(pending) if pending == handle => {}
            _ => return false,
        }

        let (width, height) = surface.size();
        let drift = self
            .frequency
            .get()
            .map_or(0.0, |hz| hz as f64 * self.config.hue_drift_per_hz);

        surface.clear();
        self.step(width, height, drift);
        for particle in &self.particles {
            surface.draw_particle(particle);
        }

        self.frames += 1;
        self.state = LoopState::Running(surface.request_frame());
        true
    }

    /// Everything released: cancel the chain and wipe the surface.
    pub fn on_silence<S: Surface>(&mut self, surface: &mut S) {
        if let LoopState::Running(pending) = self.state {
            surface.cancel_frame(pending);
            surface.clear();
            self.particles.clear();
            self.state = LoopState::Idle;
            log::debug!("visualization idle");
        }
    }

    pub fn teardown<S: Surface>(&mut self, surface: &mut S) {
        self.on_silence(surface);
    }

    fn seed(&mut self, frequency: f64, (width, height): (f64, f64)) {
        let speed = frequency * self.config.speed_per_hz;
        self.particles.clear();
        for _ in 0..self.config.particles {
            let angle = self.rng.gen_range(0.0..TAU);
            self.particles.push(Particle {
                x: width / 2.0,
                y: height / 2.0,
                vx: speed * angle.cos(),
                vy: speed * angle.sin(),
                hue: self.rng.gen_range(0.0..360.0),
            });
        }
    }

    /// Integrate positions one frame and bounce off the edges.
    pub fn step(&mut self, width: f64, height: f64, hue_drift: f64) {
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            reflect(&mut p.x, &mut p.vx, width);
            reflect(&mut p.y, &mut p.vy, height);
            p.hue = (p.hue + hue_drift).rem_euclid(360.0);
        }
    }
}

#[inline]
fn reflect(pos: &mut f64, vel: &mut f64, max: f64) {
    if *pos < 0.0 {
        *pos = -*pos;
        *vel = -*vel;
    } else if *pos > max {
        *pos = 2.0 * max - *pos;
        *vel = -*vel;
    }
    // A particle faster than the surface is wide would still be outside
    *pos = pos.clamp(0.0, max);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TestSurface {
        next: u64,
        pending: Option<FrameHandle>,
        requests: usize,
        cancels: usize,
        drawn: usize,
        clears: usize,
    }

    impl Surface for TestSurface {
        fn size(&self) -> (f64, f64) {
            (200.0, 100.0)
        }

        fn clear(&mut self) {
            self.clears += 1;
            self.drawn = 0;
        }

        fn draw_particle(&mut self, _particle: &Particle) {
            self.drawn += 1;
        }

        fn request_frame(&mut self) -> FrameHandle {
            self.next += 1;
            self.requests += 1;
            let handle = FrameHandle(self.next);
            self.pending = Some(handle);
            handle
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            assert_eq!(self.pending, Some(handle), "cancelled a handle that was not pending");
            self.pending = None;
            self.cancels += 1;
        }
    }

    fn vis() -> VisualizationLoop {
        VisualizationLoop::new(VisConfig::default(), ActiveFrequency::new(), 7)
    }

    #[test]
    fn note_on_seeds_at_centre_with_scaled_speed() {
        let mut surface = TestSurface::default();
        let mut vis = vis();

        vis.on_note_on(261.63, &mut surface);

        assert_eq!(vis.particles().len(), 48);
        for p in vis.particles() {
            assert_eq!((p.x, p.y), (100.0, 50.0));
            let speed = (p.vx * p.vx + p.vy * p.vy).sqrt();
            assert!((speed - 2.6163).abs() < 1e-3, "speed = {speed}");
            assert!((0.0..360.0).contains(&p.hue));
        }
        assert!(vis.is_running());
        assert_eq!(surface.requests, 1);
    }

    #[test]
    fn second_note_reseeds_without_new_chain() {
        let mut surface = TestSurface::default();
        let mut vis = vis();

        vis.on_note_on(261.63, &mut surface);
        vis.on_note_on(523.25, &mut surface);

        assert_eq!(surface.requests, 1);
        let p = vis.particles()[0];
        let speed = (p.vx * p.vx + p.vy * p.vy).sqrt();
        assert!((speed - 5.2325).abs() < 1e-3);
    }

    #[test]
    fn frame_draws_and_chains() {
        let mut surface = TestSurface::default();
        let mut vis = vis();
        vis.on_note_on(440.0, &mut surface);

        let handle = surface.pending.unwrap();
        assert!(vis.on_frame(handle, &mut surface));

        assert_eq!(surface.drawn, 48);
        assert_eq!(surface.requests, 2);
        assert_ne!(surface.pending, Some(handle));
        assert_eq!(vis.frames(), 1);
    }

    #[test]
    fn stale_frame_is_ignored() {
        let mut surface = TestSurface::default();
        let mut vis = vis();
        vis.on_note_on(440.0, &mut surface);
        let stale = surface.pending.unwrap();
        vis.on_silence(&mut surface);

        assert!(!vis.on_frame(stale, &mut surface));
        assert_eq!(surface.drawn, 0);
    }

    #[test]
    fn silence_cancels_once_and_clears() {
        let mut surface = TestSurface::default();
        let mut vis = vis();
        vis.on_note_on(440.0, &mut surface);

        vis.on_silence(&mut surface);
        vis.on_silence(&mut surface);
        vis.teardown(&mut surface);

        assert_eq!(surface.cancels, 1);
        assert_eq!(surface.clears, 1);
        assert!(vis.particles().is_empty());
        assert_eq!(vis.state(), LoopState::Idle);
    }

    #[test]
    fn particles_bounce_off_edges() {
        let mut vis = vis();
        vis.particles.push(Particle {
            x: 199.0,
            y: 1.0,
            vx: 3.0,
            vy: -2.0,
            hue: 359.0,
        });

        vis.step(200.0, 100.0, 2.0);

        let p = vis.particles()[0];
        assert_eq!((p.x, p.vx), (198.0, -3.0));
        assert_eq!((p.y, p.vy), (1.0, 2.0));
        assert!((p.hue - 1.0).abs() < 1e-9);
    }
}
