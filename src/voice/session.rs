//! One bounded listening attempt over an audio source

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::recognizer::{Recognizer, Utterance};
use super::source::AudioSource;
use crate::Result;

/// Stand-in for a deadline too far away to represent
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `start + after`, saturating instead of overflowing
pub(crate) fn deadline_after(start: Instant, after: Duration) -> Instant {
    start
        .checked_add(after)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}

/// Open `source` unless `cancel` fires first
///
/// Returns `false` when cancelled. The source is closed on every path that
/// does not leave it open.
async fn open_or_cancel(source: &mut dyn AudioSource, cancel: &CancellationToken) -> Result<bool> {
    let opened = tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        opened = source.open() => Some(opened),
    };

    match opened {
        Some(Ok(())) => Ok(true),
        Some(Err(e)) => {
            source.close();
            Err(e)
        }
        None => {
            tracing::debug!("cancelled while opening audio source");
            source.close();
            Ok(false)
        }
    }
}

/// Why a listening attempt ended without a phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoResultReason {
    /// The timeout elapsed first
    Timeout,
    /// Shutdown was requested
    Cancelled,
    /// The audio source ran out (file replay)
    EndOfStream,
}

/// Outcome of a listening attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionResult {
    /// First non-empty finalized phrase, verbatim
    Phrase(String),
    NoResult(NoResultReason),
}

/// Hypotheses surfaced by live transcription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hypothesis {
    Partial(String),
    Final(String),
}

/// Drives a recognizer over an audio source
///
/// The phrases it can return are limited to whatever grammar the
/// recognizer was loaded with.
pub struct RecognitionSession {
    recognizer: Box<dyn Recognizer>,
    min_confidence: f32,
}

impl RecognitionSession {
    #[must_use]
    pub fn new(recognizer: Box<dyn Recognizer>, min_confidence: f32) -> Self {
        Self {
            recognizer,
            min_confidence,
        }
    }

    /// Listen until a phrase is finalized, `timeout` elapses, `cancel`
    /// fires or the source is exhausted
    ///
    /// The source is opened on entry and always closed on return.
    /// Cancellation is observed while opening as well as while listening.
    /// Empty and low-confidence results do not end the attempt.
    ///
    /// # Errors
    ///
    /// Returns error if the source cannot be opened, yields an error, or
    /// the recognizer fails
    pub async fn listen(
        &mut self,
        source: &mut dyn AudioSource,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<RecognitionResult> {
        if cancel.is_cancelled() {
            return Ok(RecognitionResult::NoResult(NoResultReason::Cancelled));
        }

        self.recognizer.reset();
        if !open_or_cancel(source, cancel).await? {
            return Ok(RecognitionResult::NoResult(NoResultReason::Cancelled));
        }
        tracing::debug!(timeout_ms = timeout.as_millis(), "listening");

        let outcome = self
            .feed(source, deadline_after(Instant::now(), timeout), cancel)
            .await;
        source.close();
        outcome
    }

    async fn feed(
        &mut self,
        source: &mut dyn AudioSource,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<RecognitionResult> {
        loop {
            let frame = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return Ok(RecognitionResult::NoResult(NoResultReason::Cancelled));
                }
                () = tokio::time::sleep_until(deadline) => {
                    tracing::debug!("listen timed out");
                    return Ok(RecognitionResult::NoResult(NoResultReason::Timeout));
                }
                frame = source.next_frame() => frame,
            };

            let Some(frame) = frame else {
                let flushed = self.recognizer.finish();
                return Ok(self.accept_utterance(flushed).map_or(
                    RecognitionResult::NoResult(NoResultReason::EndOfStream),
                    RecognitionResult::Phrase,
                ));
            };

            if self.recognizer.accept(&frame?)? {
                let utterance = self.recognizer.current_result();
                if let Some(text) = self.accept_utterance(utterance) {
                    return Ok(RecognitionResult::Phrase(text));
                }
            }
        }
    }

    /// Apply the empty-text and confidence gates
    fn accept_utterance(&self, utterance: Utterance) -> Option<String> {
        if utterance.text.trim().is_empty() {
            return None;
        }
        if let Some(confidence) = utterance.confidence
            && confidence < self.min_confidence
        {
            tracing::info!(
                text = %utterance.text,
                confidence,
                "low confidence result ignored"
            );
            return None;
        }
        tracing::debug!(text = %utterance.text, confidence = ?utterance.confidence, "phrase finalized");
        Some(utterance.text)
    }

    /// Stream hypotheses to `on_hypothesis` for `duration` or until
    /// cancelled, without ending at the first phrase
    ///
    /// Partial hypotheses are reported only when they change.
    ///
    /// # Errors
    ///
    /// Returns error if the source or recognizer fails
    pub async fn transcribe_live<F>(
        &mut self,
        source: &mut dyn AudioSource,
        duration: Duration,
        cancel: &CancellationToken,
        mut on_hypothesis: F,
    ) -> Result<()>
    where
        F: FnMut(Hypothesis) + Send,
    {
        self.recognizer.reset();
        if !open_or_cancel(source, cancel).await? {
            return Ok(());
        }
        let deadline = deadline_after(Instant::now(), duration);
        let mut last_partial = String::new();

        let outcome = loop {
            let frame = tokio::select! {
                biased;
                () = cancel.cancelled() => break Ok(()),
                () = tokio::time::sleep_until(deadline) => break Ok(()),
                frame = source.next_frame() => frame,
            };

            let frame = match frame {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => break Err(e),
                None => {
                    let text = self.recognizer.finish().text;
                    if !text.trim().is_empty() {
                        on_hypothesis(Hypothesis::Final(text));
                    }
                    break Ok(());
                }
            };

            match self.recognizer.accept(&frame) {
                Ok(true) => {
                    let text = self.recognizer.current_result().text;
                    last_partial.clear();
                    if !text.trim().is_empty() {
                        on_hypothesis(Hypothesis::Final(text));
                    }
                }
                Ok(false) => {
                    let partial = self.recognizer.partial_result();
                    if !partial.is_empty() && partial != last_partial {
                        on_hypothesis(Hypothesis::Partial(partial.clone()));
                        last_partial = partial;
                    }
                }
                Err(e) => break Err(e),
            }
        };

        source.close();
        outcome
    }
}
