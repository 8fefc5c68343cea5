//! Audio capture from microphone

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample, StreamConfig};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use super::devices::{DeviceSelector, select_input_device};
use super::source::{AudioSource, Frame, FrameChunker, f32_to_i16};
use crate::{Error, Result};

/// Frames buffered between the capture thread and the listener
const FRAME_QUEUE: usize = 32;

type FrameSender = mpsc::Sender<Result<Frame>>;

/// Captures mono 16-bit frames from an input device
///
/// The cpal stream lives on a dedicated thread for the duration of each
/// `open`/`close` cycle, so the microphone is only held while listening.
pub struct MicrophoneSource {
    selector: DeviceSelector,
    device_name: String,
    config: StreamConfig,
    sample_format: cpal::SampleFormat,
    frame_samples: usize,
    frames: Option<mpsc::Receiver<Result<Frame>>>,
    worker: Option<CaptureWorker>,
    overruns: Arc<AtomicUsize>,
}

struct CaptureWorker {
    stop: std_mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl CaptureWorker {
    fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            tracing::error!("audio capture thread panicked");
        }
    }
}

impl MicrophoneSource {
    /// Select an input device and probe its format
    ///
    /// `sample_rate` overrides the device default.
    ///
    /// # Errors
    ///
    /// Returns error if no matching device exists or it reports no input
    /// configuration
    pub fn new(
        selector: DeviceSelector,
        sample_rate: Option<u32>,
        frame_samples: usize,
    ) -> Result<Self> {
        let host = cpal::default_host();
        let device = select_input_device(&host, &selector)?;
        let device_name = device.name().unwrap_or_default();

        let default = device
            .default_input_config()
            .map_err(|e| Error::Audio(e.to_string()))?;

        let config = StreamConfig {
            channels: default.channels(),
            sample_rate: sample_rate.map_or_else(|| default.sample_rate(), cpal::SampleRate),
            buffer_size: cpal::BufferSize::Default,
        };

        tracing::debug!(
            device = %device_name,
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            format = ?default.sample_format(),
            "microphone selected"
        );

        Ok(Self {
            selector,
            device_name,
            config,
            sample_format: default.sample_format(),
            frame_samples: frame_samples.max(1),
            frames: None,
            worker: None,
            overruns: Arc::new(AtomicUsize::new(0)),
        })
    }

    #[must_use]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Check if currently capturing
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        self.worker.is_some()
    }
}

#[async_trait]
impl AudioSource for MicrophoneSource {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    async fn open(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }

        let (frame_tx, frame_rx) = mpsc::channel(FRAME_QUEUE);
        let (init_tx, init_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();

        let settings = CaptureSettings {
            selector: self.selector.clone(),
            config: self.config.clone(),
            sample_format: self.sample_format,
            frame_samples: self.frame_samples,
            overruns: Arc::clone(&self.overruns),
        };

        let handle = thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || run_capture(&settings, frame_tx, init_tx, &stop_rx))?;
        let worker = CaptureWorker {
            stop: stop_tx,
            handle,
        };

        match init_rx.await {
            Ok(Ok(())) => {
                self.frames = Some(frame_rx);
                self.worker = Some(worker);
                tracing::debug!(device = %self.device_name, "audio capture started");
                Ok(())
            }
            Ok(Err(e)) => {
                worker.stop();
                Err(e)
            }
            Err(_) => {
                worker.stop();
                Err(Error::Audio("capture thread exited during startup".to_string()))
            }
        }
    }

    async fn next_frame(&mut self) -> Option<Result<Frame>> {
        let frames = self.frames.as_mut()?;
        match frames.recv().await {
            Some(frame) => Some(frame),
            None => {
                self.frames = None;
                Some(Err(Error::Audio("microphone stream ended".to_string())))
            }
        }
    }

    fn close(&mut self) {
        self.frames = None;
        if let Some(worker) = self.worker.take() {
            worker.stop();
            tracing::debug!("audio capture stopped");
        }

        let overruns = self.overruns.swap(0, Ordering::Relaxed);
        if overruns > 0 {
            tracing::warn!(frames = overruns, "audio frames dropped, listener fell behind");
        }
    }
}

impl Drop for MicrophoneSource {
    fn drop(&mut self) {
        self.close();
    }
}

struct CaptureSettings {
    selector: DeviceSelector,
    config: StreamConfig,
    sample_format: cpal::SampleFormat,
    frame_samples: usize,
    overruns: Arc<AtomicUsize>,
}

/// Body of the capture thread: build the stream, report, park until stopped
fn run_capture(
    settings: &CaptureSettings,
    frame_tx: FrameSender,
    init_tx: oneshot::Sender<Result<()>>,
    stop_rx: &std_mpsc::Receiver<()>,
) {
    let stream = match start_stream(settings, frame_tx) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = init_tx.send(Err(e));
            return;
        }
    };
    let _ = init_tx.send(Ok(()));

    // Returns on an explicit stop or when the owner is dropped
    let _ = stop_rx.recv();
    drop(stream);
}

fn start_stream(settings: &CaptureSettings, frame_tx: FrameSender) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = select_input_device(&host, &settings.selector)?;
    let config = &settings.config;
    let chunker = FrameChunker::new(settings.frame_samples);
    let overruns = Arc::clone(&settings.overruns);

    let stream = match settings.sample_format {
        cpal::SampleFormat::F32 => {
            build_stream::<f32>(&device, config, chunker, frame_tx, overruns)
        }
        cpal::SampleFormat::I16 => {
            build_stream::<i16>(&device, config, chunker, frame_tx, overruns)
        }
        cpal::SampleFormat::U16 => {
            build_stream::<u16>(&device, config, chunker, frame_tx, overruns)
        }
        other => {
            return Err(Error::Audio(format!("unsupported sample format {other:?}")));
        }
    }
    .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;
    Ok(stream)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut chunker: FrameChunker,
    frame_tx: FrameSender,
    overruns: Arc<AtomicUsize>,
) -> std::result::Result<cpal::Stream, cpal::BuildStreamError>
where
    T: Sample + SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let channels = usize::from(config.channels.max(1));
    let error_tx = frame_tx.clone();

    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            for frame in data.chunks(channels) {
                let sum: f32 = frame.iter().map(|s| s.to_sample::<f32>()).sum();
                #[allow(clippy::cast_precision_loss)]
                let mono = sum / frame.len() as f32;

                if let Some(full) = chunker.push(f32_to_i16(mono))
                    && let Err(TrySendError::Full(_)) = frame_tx.try_send(Ok(full))
                {
                    overruns.fetch_add(1, Ordering::Relaxed);
                }
            }
        },
        move |err| {
            tracing::error!(error = %err, "audio capture error");
            let _ = error_tx.try_send(Err(Error::Audio(err.to_string())));
        },
        None,
    )
}
