//! Microphone and recognizer troubleshooting modes

use std::io::Write;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::voice::{
    AudioSource, Hypothesis, RecognitionSession, deadline_after, list_input_devices, meter_line,
    rms,
};

/// Print every input device, marking the default
///
/// # Errors
///
/// Returns error if devices cannot be enumerated or output fails
pub fn print_input_devices(out: &mut dyn Write) -> Result<usize> {
    let devices = list_input_devices()?;
    if devices.is_empty() {
        writeln!(out, "No audio input devices found")?;
        return Ok(0);
    }

    writeln!(out, "Audio input devices (* = default):")?;
    for device in &devices {
        writeln!(out, "{device}")?;
    }
    Ok(devices.len())
}

/// Print live hypotheses from the recognizer
///
/// Partial results overwrite one line; finalized results each get their
/// own line. Returns the number of finalized results.
///
/// # Errors
///
/// Returns error if the source, recognizer or output fails
pub async fn test_microphone(
    session: &mut RecognitionSession,
    source: &mut dyn AudioSource,
    duration: Duration,
    cancel: &CancellationToken,
    out: &mut (dyn Write + Send),
) -> Result<usize> {
    writeln!(
        out,
        "Speak into the microphone for {}s (Ctrl+C to stop)...",
        duration.as_secs()
    )?;

    let mut finals = 0;
    let mut write_error = None;
    session
        .transcribe_live(source, duration, cancel, |hypothesis| {
            let written = match hypothesis {
                Hypothesis::Partial(text) => {
                    write!(out, "\r  ... {text}").and_then(|()| out.flush())
                }
                Hypothesis::Final(text) => {
                    finals += 1;
                    writeln!(out, "\r  >>> {text}")
                }
            };
            if let Err(e) = written
                && write_error.is_none()
            {
                write_error = Some(e);
            }
        })
        .await?;

    if let Some(e) = write_error {
        return Err(e.into());
    }
    writeln!(out, "\nHeard {finals} phrase(s)")?;
    Ok(finals)
}

/// Totals from a level meter run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevelSummary {
    pub frames: usize,
    pub peak: f64,
    pub frames_above_threshold: usize,
}

/// Show a running RMS meter for each frame
///
/// Runs until `duration` elapses (forever when `None`), `cancel` fires or
/// the source is exhausted.
///
/// # Errors
///
/// Returns error if the source or output fails
pub async fn level_meter(
    source: &mut dyn AudioSource,
    threshold: f64,
    duration: Option<Duration>,
    cancel: &CancellationToken,
    out: &mut (dyn Write + Send),
) -> Result<LevelSummary> {
    writeln!(out, "Input level (threshold {threshold:.0}, Ctrl+C to stop):")?;
    source.open().await?;

    let outcome = meter_frames(source, threshold, duration, cancel, out).await;
    source.close();

    let summary = outcome?;
    writeln!(
        out,
        "\nPeak {:.1} over {} frames, {} above threshold",
        summary.peak, summary.frames, summary.frames_above_threshold
    )?;
    Ok(summary)
}

async fn meter_frames(
    source: &mut dyn AudioSource,
    threshold: f64,
    duration: Option<Duration>,
    cancel: &CancellationToken,
    out: &mut (dyn Write + Send),
) -> Result<LevelSummary> {
    let deadline = duration.map(|d| deadline_after(Instant::now(), d));
    let mut summary = LevelSummary::default();

    loop {
        let frame = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = sleep_until(deadline) => break,
            frame = source.next_frame() => frame,
        };
        let Some(frame) = frame else { break };

        let level = rms(&frame?);
        summary.frames += 1;
        summary.peak = summary.peak.max(level);
        if level >= threshold {
            summary.frames_above_threshold += 1;
        }

        write!(out, "\r{}", meter_line(level, threshold))?;
        out.flush()?;
    }

    Ok(summary)
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
