//! Shared test doubles used across multiple test modules.
//!
//! Consolidates the recording system bridge and the scripted speech adapter
//! so dispatcher and session tests exercise collaborators the same way.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{AssistantError, Result};
use crate::speech::{SpeakRequest, SpeechAdapter, SpeechEvent, Voice};
use crate::system::SystemBridge;

/// System bridge that records every call instead of touching the host.
///
/// In the default mode all backend operations succeed; [`failing`] flips
/// them to errors so fallback paths can be exercised.
///
/// [`failing`]: RecordingBridge::failing
#[derive(Default)]
pub struct RecordingBridge {
    fail_backend: bool,
    created: Mutex<Vec<(String, String)>>,
    launched: Mutex<Vec<String>>,
    downloaded: Mutex<Vec<(String, String)>>,
    urls: Mutex<Vec<String>>,
}

impl RecordingBridge {
    /// Make `create_file` and `open_application` fail.
    pub fn failing(mut self) -> Self {
        self.fail_backend = true;
        self
    }

    pub fn created_files(&self) -> Vec<(String, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn launched_apps(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<(String, String)> {
        self.downloaded.lock().unwrap().clone()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SystemBridge for RecordingBridge {
    async fn create_file(&self, name: &str, content: &str) -> Result<()> {
        if self.fail_backend {
            return Err(AssistantError::Backend("no backend".to_owned()));
        }
        self.created
            .lock()
            .unwrap()
            .push((name.to_owned(), content.to_owned()));
        Ok(())
    }

    async fn open_application(&self, name: &str) -> Result<()> {
        if self.fail_backend {
            return Err(AssistantError::Backend("no backend".to_owned()));
        }
        self.launched.lock().unwrap().push(name.to_owned());
        Ok(())
    }

    fn download_file(&self, name: &str, content: &str) {
        self.downloaded
            .lock()
            .unwrap()
            .push((name.to_owned(), content.to_owned()));
    }

    fn open_url(&self, url: &str) {
        self.urls.lock().unwrap().push(url.to_owned());
    }
}

/// Speech adapter double with deterministic, recordable behavior.
///
/// Capture start/abort and playback are recorded; playback completion is
/// emitted immediately unless `hold_playback` is set, in which case the
/// test finishes it explicitly with [`finish_playback`].
///
/// [`finish_playback`]: ScriptedSpeech::finish_playback
pub struct ScriptedSpeech {
    events: UnboundedSender<SpeechEvent>,
    capture_available: bool,
    hold_playback: bool,
    spoken: Mutex<Vec<String>>,
    capture_starts: Mutex<u32>,
    capture_aborts: Mutex<u32>,
    cancels: Mutex<u32>,
}

impl ScriptedSpeech {
    pub fn new(events: UnboundedSender<SpeechEvent>) -> Self {
        Self {
            events,
            capture_available: true,
            hold_playback: false,
            spoken: Mutex::new(Vec::new()),
            capture_starts: Mutex::new(0),
            capture_aborts: Mutex::new(0),
            cancels: Mutex::new(0),
        }
    }

    /// Simulate a runtime without speech capture.
    pub fn without_capture(mut self) -> Self {
        self.capture_available = false;
        self
    }

    /// Keep playback open until [`finish_playback`] is called.
    ///
    /// [`finish_playback`]: ScriptedSpeech::finish_playback
    pub fn holding_playback(mut self) -> Self {
        self.hold_playback = true;
        self
    }

    /// Push a recognized utterance, as the engine would.
    pub fn recognize(&self, text: &str) {
        let _ = self.events.send(SpeechEvent::Utterance {
            text: text.to_owned(),
            is_final: true,
        });
    }

    /// Complete a held playback.
    pub fn finish_playback(&self) {
        let _ = self.events.send(SpeechEvent::PlaybackFinished);
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn capture_starts(&self) -> u32 {
        *self.capture_starts.lock().unwrap()
    }

    pub fn capture_aborts(&self) -> u32 {
        *self.capture_aborts.lock().unwrap()
    }

    pub fn cancels(&self) -> u32 {
        *self.cancels.lock().unwrap()
    }
}

impl SpeechAdapter for ScriptedSpeech {
    fn capture_available(&self) -> bool {
        self.capture_available
    }

    fn start_capture(&self) -> Result<()> {
        *self.capture_starts.lock().unwrap() += 1;
        let _ = self.events.send(SpeechEvent::CaptureStarted);
        Ok(())
    }

    fn abort_capture(&self) {
        *self.capture_aborts.lock().unwrap() += 1;
    }

    fn speak(&self, request: SpeakRequest) -> Result<()> {
        self.spoken.lock().unwrap().push(request.text);
        if !self.hold_playback {
            let _ = self.events.send(SpeechEvent::PlaybackFinished);
        }
        Ok(())
    }

    fn cancel_speech(&self) {
        *self.cancels.lock().unwrap() += 1;
    }

    fn voices(&self) -> Vec<Voice> {
        vec![Voice {
            name: "Scripted English".to_owned(),
            lang: "en-US".to_owned(),
        }]
    }
}
