//! Audio sources: anything that yields mono 16-bit frames

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{Error, Result};

/// One block of mono signed 16-bit samples
pub type Frame = Vec<i16>;

/// Samples per frame unless configured otherwise
pub const DEFAULT_FRAME_SAMPLES: usize = 2048;

/// A producer of audio frames for one listening attempt at a time
///
/// `open` starts delivery, `next_frame` yields frames until the source is
/// exhausted (`None`) and `close` releases it. A source must be reusable:
/// `open` after `close` starts a fresh attempt.
#[async_trait]
pub trait AudioSource: Send {
    /// Sample rate of delivered frames in Hz
    fn sample_rate(&self) -> u32;

    /// Start delivering frames
    ///
    /// # Errors
    ///
    /// Returns error if the underlying device or file cannot be opened
    async fn open(&mut self) -> Result<()>;

    /// Next frame, or `None` once the source has no more audio
    ///
    /// Must be cancel-safe: dropping the future loses no delivered frame.
    async fn next_frame(&mut self) -> Option<Result<Frame>>;

    /// Stop delivering frames and release the device
    fn close(&mut self);
}

/// Converts a sample in `-1.0..=1.0` to 16-bit PCM
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Groups a sample stream into fixed-size frames
#[derive(Debug)]
pub(crate) struct FrameChunker {
    frame_samples: usize,
    pending: Frame,
}

impl FrameChunker {
    pub(crate) fn new(frame_samples: usize) -> Self {
        let frame_samples = frame_samples.max(1);
        Self {
            frame_samples,
            pending: Vec::with_capacity(frame_samples),
        }
    }

    /// Add one sample, returning a frame once it is full
    pub(crate) fn push(&mut self, sample: i16) -> Option<Frame> {
        self.pending.push(sample);
        if self.pending.len() < self.frame_samples {
            return None;
        }
        Some(std::mem::replace(
            &mut self.pending,
            Vec::with_capacity(self.frame_samples),
        ))
    }

    /// Take whatever is buffered as a short final frame
    pub(crate) fn flush(&mut self) -> Option<Frame> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

/// Replays a WAV file as if it were a microphone
///
/// Multi-channel audio is averaged down to mono. The whole file is decoded
/// on construction; each `open` replays it from the start.
#[derive(Debug)]
pub struct WavSource {
    path: PathBuf,
    sample_rate: u32,
    samples: Vec<i16>,
    frame_samples: usize,
    position: Option<usize>,
}

impl WavSource {
    /// Decode a WAV file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or uses an unsupported
    /// sample format (only 16-bit integer and 32-bit float are accepted)
    pub fn from_file(path: &Path, frame_samples: usize) -> Result<Self> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        let interleaved: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Int, 16) => reader
                .into_samples::<i16>()
                .collect::<std::result::Result<_, _>>()?,
            (hound::SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .map(|s| s.map(f32_to_i16))
                .collect::<std::result::Result<_, _>>()?,
            (format, bits) => {
                return Err(Error::Audio(format!(
                    "unsupported WAV format {format:?} {bits}-bit in {}",
                    path.display()
                )));
            }
        };

        let samples = downmix(&interleaved, channels);

        tracing::debug!(
            path = %path.display(),
            sample_rate = spec.sample_rate,
            channels,
            samples = samples.len(),
            "wav source loaded"
        );

        Ok(Self {
            path: path.to_path_buf(),
            sample_rate: spec.sample_rate,
            samples,
            frame_samples: frame_samples.max(1),
            position: None,
        })
    }

    /// Duration of the decoded audio in seconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate.max(1))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Average interleaved channels into mono
fn downmix(interleaved: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().copied().map(i32::from).sum();
            let len = i32::try_from(frame.len()).unwrap_or(1);
            i16::try_from(sum / len).unwrap_or_default()
        })
        .collect()
}

#[async_trait]
impl AudioSource for WavSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn open(&mut self) -> Result<()> {
        self.position = Some(0);
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<Result<Frame>> {
        let start = self.position?;
        if start >= self.samples.len() {
            return None;
        }
        let end = (start + self.frame_samples).min(self.samples.len());
        self.position = Some(end);
        Some(Ok(self.samples[start..end].to_vec()))
    }

    fn close(&mut self) {
        self.position = None;
    }
}
