//! Mono to binaural rendering of a single positioned source.
//!
//! The HRTF engine itself is a capability ([`BinauralRenderer`]); this module
//! owns the per-source state, the sample format conversion and the
//! head-tracking rotation. [`PanningRenderer`] is a built-in fallback.

use crate::utils;
use std::f32::consts::FRAC_PI_2;
use thiserror::Error;

pub const SUPPORTED_SAMPLE_RATES: [u32; 3] = [24000, 44100, 48000];
pub const DEFAULT_DIRECTION: [f32; 3] = [0.0, 0.0, -1.0];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    #[error("unsupported sample rate {0}, expected 24000, 44100 or 48000")]
    UnsupportedSampleRate(u32),
    #[error("frame size must be non-zero")]
    InvalidFrameSize,
    #[error("binaural renderer error: {0}")]
    Renderer(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSettings {
    pub sample_rate: u32,
    pub frame_size: usize,
}

impl AudioSettings {
    pub fn new(sample_rate: u32, frame_size: usize) -> Result<AudioSettings, AudioError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
            return Err(AudioError::UnsupportedSampleRate(sample_rate));
        }
        if frame_size == 0 {
            return Err(AudioError::InvalidFrameSize);
        }
        Ok(AudioSettings {
            sample_rate: sample_rate,
            frame_size: frame_size,
        })
    }
}

/// How the renderer picks between measured directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    Bilinear,
}

impl Default for Interpolation {
    fn default() -> Interpolation {
        Interpolation::Bilinear
    }
}

pub trait BinauralRenderer {
    fn create_effect(&self, settings: &AudioSettings) -> Result<Box<dyn BinauralEffect>, AudioError>;
}

pub trait BinauralEffect {
    /// Renders `input` arriving from `direction` (unit vector, listener frame)
    /// into `output`, interleaved stereo of twice the input length.
    fn apply(&mut self, input: &[f32], direction: [f32; 3], interpolation: Interpolation, output: &mut [f32]);
}

/// Constant-power stereo panning on the azimuth of the source.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanningRenderer;

// Azimuth grid used for nearest-neighbour lookups.
const NEAREST_STEP_DEGREES: f32 = 15.0;

struct PanningEffect;

impl BinauralRenderer for PanningRenderer {
    fn create_effect(&self, _settings: &AudioSettings) -> Result<Box<dyn BinauralEffect>, AudioError> {
        Ok(Box::new(PanningEffect))
    }
}

impl PanningEffect {
    fn gains(direction: [f32; 3], interpolation: Interpolation) -> (f32, f32) {
        // Azimuth in [-90, 90] degrees, positive to the right.
        let mut azimuth = direction[0].max(-1.0).min(1.0).asin().to_degrees();
        if interpolation == Interpolation::Nearest {
            azimuth = (azimuth / NEAREST_STEP_DEGREES).round() * NEAREST_STEP_DEGREES;
        }
        let theta = (azimuth / 90.0 + 1.0) * FRAC_PI_2 / 2.0;
        (theta.cos(), theta.sin())
    }
}

impl BinauralEffect for PanningEffect {
    fn apply(&mut self, input: &[f32], direction: [f32; 3], interpolation: Interpolation, output: &mut [f32]) {
        let (left, right) = PanningEffect::gains(direction, interpolation);
        for (sample, frame) in input.iter().zip(output.chunks_mut(2)) {
            frame[0] = sample * left;
            if let Some(r) = frame.get_mut(1) {
                *r = sample * right;
            }
        }
    }
}

/// One mono source rendered binaurally for a head-tracked listener.
pub struct MonoBinauralSource {
    renderer: Box<dyn BinauralRenderer>,
    effect: Option<Box<dyn BinauralEffect>>,
    settings: Option<AudioSettings>,
    direction: [f32; 3],
    interpolation: Interpolation,
    listener_orientation: [f32; 4],
    input: Vec<f32>,
    output: Vec<f32>,
}

impl MonoBinauralSource {
    pub fn new(renderer: Box<dyn BinauralRenderer>) -> MonoBinauralSource {
        MonoBinauralSource {
            renderer: renderer,
            effect: None,
            settings: None,
            direction: DEFAULT_DIRECTION,
            interpolation: Interpolation::default(),
            listener_orientation: [0.0, 0.0, 0.0, 1.0],
            input: Vec::new(),
            output: Vec::new(),
        }
    }

    pub fn set_direction(&mut self, direction: [f32; 3]) {
        self.direction = direction;
    }

    pub fn direction(&self) -> [f32; 3] {
        self.direction
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    /// Head orientation of the listener, `[x, y, z, w]` in tracking space.
    pub fn set_listener_orientation(&mut self, orientation: [f32; 4]) {
        self.listener_orientation = utils::normalize_quat(orientation);
    }

    pub fn settings(&self) -> Option<AudioSettings> {
        self.settings
    }

    pub fn buffer_capacity(&self) -> usize {
        self.input.len()
    }

    /// (Re)creates the effect and the scratch buffers. A failure leaves the
    /// source silent until the next successful setup.
    pub fn setup(&mut self, settings: AudioSettings) -> Result<(), AudioError> {
        if self.settings == Some(settings) && self.effect.is_some() {
            return Ok(());
        }
        self.effect = None;
        self.settings = None;
        let effect = self.renderer.create_effect(&settings)?;
        self.input.resize(settings.frame_size, 0.0);
        self.output.resize(settings.frame_size * 2, 0.0);
        self.effect = Some(effect);
        self.settings = Some(settings);
        debug!("Binaural source set up at {} Hz, {} frames", settings.sample_rate, settings.frame_size);
        Ok(())
    }

    /// Direction of the source in the listener frame.
    pub fn listener_direction(&self) -> [f32; 3] {
        let [x, y, z] = self.direction;
        let norm = (x * x + y * y + z * z).sqrt();
        let direction = if norm.is_finite() && norm > 1e-6 {
            [x / norm, y / norm, z / norm]
        } else {
            DEFAULT_DIRECTION
        };
        utils::rotate_vector(utils::conjugate_quat(self.listener_orientation), direction)
    }

    pub fn process(&mut self, input: &[f64], left: &mut [f64], right: &mut [f64]) {
        let frames = input.len().min(left.len()).min(right.len());
        let direction = self.listener_direction();
        let effect = match self.effect {
            Some(ref mut effect) => effect,
            None => {
                silence(left);
                silence(right);
                return;
            }
        };
        let chunk = self.input.len();

        let mut start = 0;
        while start < frames {
            let n = chunk.min(frames - start);
            for (dst, src) in self.input[..n].iter_mut().zip(&input[start..start + n]) {
                *dst = *src as f32;
            }
            effect.apply(&self.input[..n], direction, self.interpolation, &mut self.output[..n * 2]);
            for (i, frame) in self.output[..n * 2].chunks(2).enumerate() {
                left[start + i] = frame[0] as f64;
                right[start + i] = frame[1] as f64;
            }
            start += n;
        }
        silence(&mut left[frames..]);
        silence(&mut right[frames..]);
    }
}

fn silence(buffer: &mut [f64]) {
    for sample in buffer.iter_mut() {
        *sample = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(frame_size: usize) -> MonoBinauralSource {
        let mut source = MonoBinauralSource::new(Box::new(PanningRenderer));
        source.setup(AudioSettings::new(48000, frame_size).unwrap()).unwrap();
        source
    }

    #[test]
    fn unsupported_sample_rate_is_rejected() {
        assert_eq!(AudioSettings::new(22050, 64), Err(AudioError::UnsupportedSampleRate(22050)));
        assert_eq!(AudioSettings::new(44100, 0), Err(AudioError::InvalidFrameSize));
        assert!(AudioSettings::new(24000, 64).is_ok());
    }

    #[test]
    fn silent_until_set_up() {
        let mut source = MonoBinauralSource::new(Box::new(PanningRenderer));
        let mut left = [1.0; 4];
        let mut right = [1.0; 4];
        source.process(&[0.5; 4], &mut left, &mut right);
        assert_eq!(left, [0.0; 4]);
        assert_eq!(right, [0.0; 4]);
    }

    #[test]
    fn buffers_follow_frame_size() {
        let mut source = source(64);
        assert_eq!(source.buffer_capacity(), 64);
        source.setup(AudioSettings::new(48000, 256).unwrap()).unwrap();
        assert_eq!(source.buffer_capacity(), 256);
    }

    #[test]
    fn front_source_is_centered() {
        let mut source = source(8);
        let mut left = [0.0; 8];
        let mut right = [0.0; 8];
        source.process(&[1.0; 8], &mut left, &mut right);
        for (l, r) in left.iter().zip(&right) {
            assert!((l - r).abs() < 1e-6);
            assert!((l - 0.70710677).abs() < 1e-5);
        }
    }

    #[test]
    fn panning_follows_direction() {
        let mut source = source(4);
        source.set_direction([2.0, 0.0, 0.0]);
        let mut left = [0.0; 10];
        let mut right = [0.0; 10];
        // Longer than one frame: processed in chunks.
        source.process(&[1.0; 10], &mut left, &mut right);
        assert!(left.iter().all(|l| l.abs() < 1e-6));
        assert!(right.iter().all(|r| (r - 1.0).abs() < 1e-6));
    }

    #[test]
    fn head_rotation_moves_the_source() {
        let mut source = source(4);
        // Listener turned 90 degrees to the left: a source in front is now on the right.
        source.set_listener_orientation([0.0, 0.70710677, 0.0, 0.70710677]);
        let direction = source.listener_direction();
        assert!((direction[0] - 1.0).abs() < 1e-5);
        assert!(direction[2].abs() < 1e-5);
    }

    #[test]
    fn nearest_snaps_to_grid() {
        let (l, r) = PanningEffect::gains([0.1, 0.0, -0.99], Interpolation::Nearest);
        assert!((l - r).abs() < 1e-6);
        let (l, r) = PanningEffect::gains([0.1, 0.0, -0.99], Interpolation::Bilinear);
        assert!(r > l);
    }
}
