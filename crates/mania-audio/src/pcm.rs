/// Decoded song audio: interleaved f32 samples in [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct Pcm {
    /// Interleaved sample data [L, R, L, R, ...]
    pub samples: Vec<f32>,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl Pcm {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Silent mono buffer of the given length.
    pub fn silence(duration_ms: f64, sample_rate: u32) -> Self {
        let frames = (duration_ms.max(0.0) / 1000.0 * f64::from(sample_rate)).round() as usize;
        Self::new(vec![0.0; frames], 1, sample_rate)
    }

    /// Non-empty samples with valid parameters.
    pub fn validate(&self) -> bool {
        !self.samples.is_empty() && self.channels > 0 && self.sample_rate > 0
    }

    /// Number of frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / usize::from(self.channels)
    }

    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_frames() as f64 * 1000.0 / f64::from(self.sample_rate)
    }
}
