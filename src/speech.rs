//! Speech capture and playback capability interface.
//!
//! The session drives an external speech engine through [`SpeechAdapter`]
//! and receives its lifecycle notifications as [`SpeechEvent`]s on a
//! channel, so a test double can simulate recognition results and synthesis
//! completion deterministically.

use crate::config::SpeechConfig;
use crate::error::Result;

/// Events emitted by the speech engine back to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Capture started.
    CaptureStarted,
    /// Capture ended (expectedly or not).
    CaptureEnded,
    /// A recognized utterance.
    Utterance {
        text: String,
        /// Whether the recognizer considers this result final.
        is_final: bool,
    },
    /// Capture-side error. Non-fatal; the session resets state.
    CaptureError(String),
    /// Playback of the current utterance finished.
    PlaybackFinished,
    /// Playback-side error. Treated like a completed playback.
    PlaybackError(String),
}

/// A synthesis voice advertised by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP-47 style language tag, e.g. `en-US`.
    pub lang: String,
}

/// A playback request handed to the engine.
#[derive(Debug, Clone)]
pub struct SpeakRequest {
    pub text: String,
    /// Preferred voice name, resolved via [`select_voice`].
    pub voice: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl SpeakRequest {
    /// Build a request from config, resolving the voice from the engine's
    /// advertised list.
    pub fn new(text: impl Into<String>, config: &SpeechConfig, voices: &[Voice]) -> Self {
        Self {
            text: text.into(),
            voice: select_voice(voices, &config.preferred_lang).map(|v| v.name.clone()),
            rate: config.rate,
            pitch: config.pitch,
            volume: config.volume,
        }
    }
}

/// Capability interface over the platform speech engine.
///
/// Implementations push [`SpeechEvent`]s to the channel supplied at
/// construction. All methods are non-blocking; completion is reported via
/// events.
pub trait SpeechAdapter: Send + Sync {
    /// Whether speech capture exists in this runtime at all.
    ///
    /// When `false` the session logs a one-time warning and runs text-only.
    fn capture_available(&self) -> bool;

    /// Begin (or resume) continuous capture.
    fn start_capture(&self) -> Result<()>;

    /// Abort capture immediately, discarding any partial recognition.
    fn abort_capture(&self);

    /// Begin speaking. Completion arrives as `PlaybackFinished` or
    /// `PlaybackError`.
    fn speak(&self, request: SpeakRequest) -> Result<()>;

    /// Cancel any in-flight or queued playback immediately.
    fn cancel_speech(&self);

    /// Voices the engine can synthesize with.
    fn voices(&self) -> Vec<Voice>;
}

/// Choose a playback voice.
///
/// Preference order: first voice tagged with the preferred language, else a
/// named high-quality voice, else the first advertised voice.
pub fn select_voice<'a>(voices: &'a [Voice], preferred_lang: &str) -> Option<&'a Voice> {
    const QUALITY_MARKERS: [&str; 3] = ["Google", "Microsoft", "Native"];

    voices
        .iter()
        .find(|v| v.lang.starts_with(preferred_lang))
        .or_else(|| {
            voices
                .iter()
                .find(|v| QUALITY_MARKERS.iter().any(|m| v.name.contains(m)))
        })
        .or_else(|| voices.first())
}

/// Speech adapter for environments without a speech engine.
///
/// Capture is unavailable; playback completes immediately so the session's
/// speaking state still cycles correctly in text-only operation.
pub struct NullSpeech {
    events: tokio::sync::mpsc::UnboundedSender<SpeechEvent>,
}

impl NullSpeech {
    pub fn new(events: tokio::sync::mpsc::UnboundedSender<SpeechEvent>) -> Self {
        Self { events }
    }
}

impl SpeechAdapter for NullSpeech {
    fn capture_available(&self) -> bool {
        false
    }

    fn start_capture(&self) -> Result<()> {
        Ok(())
    }

    fn abort_capture(&self) {}

    fn speak(&self, _request: SpeakRequest) -> Result<()> {
        let _ = self.events.send(SpeechEvent::PlaybackFinished);
        Ok(())
    }

    fn cancel_speech(&self) {}

    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    fn voice(name: &str, lang: &str) -> super::Voice {
        super::Voice {
            name: name.to_owned(),
            lang: lang.to_owned(),
        }
    }

    use super::select_voice;

    #[test]
    fn prefers_language_tagged_voice() {
        let voices = [
            voice("Google Deutsch", "de-DE"),
            voice("Plain English", "en-GB"),
        ];
        assert_eq!(
            select_voice(&voices, "en").map(|v| v.name.as_str()),
            Some("Plain English")
        );
    }

    #[test]
    fn falls_back_to_quality_voice() {
        let voices = [voice("Basique", "fr-FR"), voice("Microsoft Hortense", "fr-FR")];
        assert_eq!(
            select_voice(&voices, "en").map(|v| v.name.as_str()),
            Some("Microsoft Hortense")
        );
    }

    #[test]
    fn falls_back_to_first_voice() {
        let voices = [voice("Solo", "ja-JP")];
        assert_eq!(
            select_voice(&voices, "en").map(|v| v.name.as_str()),
            Some("Solo")
        );
    }

    #[test]
    fn empty_list_yields_none() {
        assert!(select_voice(&[], "en").is_none());
    }
}
