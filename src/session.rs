//! Conversation session state machine.
//!
//! A single task owns the transcript and the listening/speaking flags and
//! drives everything through one `select!` loop: control events from the
//! front end, lifecycle events from the speech adapter, completion events
//! from spawned dispatches, and delayed capture restarts posted back by
//! timer tasks. Front ends observe the session through a broadcast channel
//! of [`SessionNotice`]s and never touch the state directly.
//!
//! Dispatch admission is single-flight: while one utterance is being
//! executed, further non-stop utterances are dropped. Stop phrases bypass
//! the guard so an interrupt always lands immediately; an in-flight LLM
//! call still runs to completion and its answer is logged.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::canned;
use crate::config::{SessionConfig, SpeechConfig};
use crate::dispatch::{rules, Control, DispatchOutcome, Dispatcher};
use crate::speech::{SpeakRequest, SpeechAdapter, SpeechEvent};
use crate::transcript::{EntryKind, Transcript, TranscriptEntry};

/// Observable session state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFlags {
    pub listening: bool,
    pub speaking: bool,
    /// Continuous capture mode: restart recognition whenever it ends.
    pub continuous: bool,
}

/// Events accepted by the session task.
///
/// `DispatchDone` and `RestartCapture` are posted internally by spawned
/// tasks; front ends use the rest via [`SessionHandle`].
#[derive(Debug)]
pub enum SessionEvent {
    /// A typed command from the front end.
    TextCommand(String),
    /// Toggle continuous capture on or off.
    ToggleListening,
    DispatchDone(DispatchOutcome),
    RestartCapture,
}

/// Broadcast notifications for front ends.
#[derive(Debug, Clone)]
pub enum SessionNotice {
    /// A transcript entry was appended.
    Entry(TranscriptEntry),
    /// The listening/speaking/continuous flags changed.
    Flags(SessionFlags),
    /// A dispatch is (or is no longer) in flight.
    Processing(bool),
    /// Out-of-band progress line from a long-running dispatch.
    Progress(String),
}

/// Cloneable handle for driving a running session.
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    notices: broadcast::Sender<SessionNotice>,
    cancel: CancellationToken,
}

impl SessionHandle {
    pub fn submit_text(&self, text: impl Into<String>) {
        let _ = self.events.send(SessionEvent::TextCommand(text.into()));
    }

    pub fn toggle_listening(&self) {
        let _ = self.events.send(SessionEvent::ToggleListening);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// The session task state. Constructed once, consumed by [`Session::run`].
pub struct Session {
    dispatcher: Arc<Dispatcher>,
    speech: Arc<dyn SpeechAdapter>,
    config: SessionConfig,
    speech_config: SpeechConfig,
    transcript: Transcript,
    flags: SessionFlags,
    busy: bool,
    warned_no_capture: bool,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    speech_rx: mpsc::UnboundedReceiver<SpeechEvent>,
    progress_rx: mpsc::UnboundedReceiver<String>,
    notices: broadcast::Sender<SessionNotice>,
    cancel: CancellationToken,
}

impl Session {
    /// Wire up a session.
    ///
    /// `speech_rx` carries the adapter's events; the adapter must have been
    /// constructed with the sending half. The dispatcher's progress channel
    /// is attached here so progress lines surface as notices.
    pub fn new(
        dispatcher: Dispatcher,
        speech: Arc<dyn SpeechAdapter>,
        speech_rx: mpsc::UnboundedReceiver<SpeechEvent>,
        config: SessionConfig,
        speech_config: SpeechConfig,
    ) -> (Self, SessionHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (notices, _) = broadcast::channel(64);
        let cancel = CancellationToken::new();

        let handle = SessionHandle {
            events: events_tx.clone(),
            notices: notices.clone(),
            cancel: cancel.clone(),
        };
        let session = Self {
            dispatcher: Arc::new(dispatcher.with_progress(progress_tx)),
            speech,
            config,
            speech_config,
            transcript: Transcript::new(),
            flags: SessionFlags::default(),
            busy: false,
            warned_no_capture: false,
            events_tx,
            events_rx,
            speech_rx,
            progress_rx,
            notices,
            cancel,
        };
        (session, handle)
    }

    /// Run the session until the handle is shut down.
    pub async fn run(mut self) {
        if self.config.greet_on_start {
            self.greet();
        }

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("session shutting down");
                    self.speech.cancel_speech();
                    self.speech.abort_capture();
                    break;
                }
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                Some(event) = self.speech_rx.recv() => self.handle_speech_event(event),
                Some(line) = self.progress_rx.recv() => {
                    let _ = self.notices.send(SessionNotice::Progress(line));
                }
            }
        }
    }

    fn greet(&mut self) {
        let greeting = canned::random_greeting();
        self.push_entry(EntryKind::System, "⚡ ORBIT ONLINE");
        self.speak(format!("{greeting} I am Orbit, your AI assistant."));
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TextCommand(text) => self.handle_utterance(text),
            SessionEvent::ToggleListening => self.toggle_listening(),
            SessionEvent::DispatchDone(outcome) => self.finish_dispatch(outcome),
            SessionEvent::RestartCapture => self.restart_capture(),
        }
    }

    fn handle_speech_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::CaptureStarted => {
                self.flags.listening = true;
                self.publish_flags();
            }
            SpeechEvent::CaptureEnded => {
                self.flags.listening = false;
                self.publish_flags();
                if self.flags.continuous && !self.flags.speaking {
                    self.schedule_restart(self.config.capture_restart_delay_ms);
                }
            }
            SpeechEvent::Utterance { text, is_final } => {
                if is_final {
                    self.handle_utterance(text);
                }
            }
            SpeechEvent::CaptureError(reason) => {
                warn!(%reason, "capture error");
                self.flags.listening = false;
                self.publish_flags();
                if self.flags.continuous {
                    self.schedule_restart(self.config.stop_restart_delay_ms);
                }
            }
            SpeechEvent::PlaybackFinished | SpeechEvent::PlaybackError(_) => {
                if let SpeechEvent::PlaybackError(reason) = &event {
                    warn!(%reason, "playback error");
                }
                self.flags.speaking = false;
                self.publish_flags();
                if self.flags.continuous && !self.flags.listening {
                    self.restart_capture();
                }
            }
        }
    }

    /// Admit one utterance: log it, short-circuit stops, and spawn the
    /// dispatch unless one is already in flight.
    fn handle_utterance(&mut self, text: String) {
        let cmd = text.trim().to_lowercase();
        if cmd.is_empty() {
            return;
        }
        self.push_entry(EntryKind::User, text.trim());

        // Stops bypass the single-flight guard; an interrupt must always
        // land even while a dispatch runs.
        if rules::is_stop(&cmd) {
            self.stop_speaking();
            self.push_entry(EntryKind::System, "⏹️ Stopped - Now Listening");
            return;
        }

        if self.busy {
            debug!(%cmd, "dispatch in flight, dropping utterance");
            return;
        }
        self.busy = true;
        let _ = self.notices.send(SessionNotice::Processing(true));

        let dispatcher = Arc::clone(&self.dispatcher);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = dispatcher.execute(&cmd).await;
            let _ = tx.send(SessionEvent::DispatchDone(outcome));
        });
    }

    fn finish_dispatch(&mut self, outcome: DispatchOutcome) {
        self.busy = false;
        let _ = self.notices.send(SessionNotice::Processing(false));
        self.push_entry(outcome.kind, outcome.text);
        match outcome.control {
            Some(Control::Stop) => self.stop_speaking(),
            None => {
                if let Some(text) = outcome.speak {
                    self.speak(text);
                }
            }
        }
    }

    fn toggle_listening(&mut self) {
        if self.flags.continuous {
            self.stop_listening();
        } else {
            self.start_listening();
        }
    }

    fn start_listening(&mut self) {
        if !self.speech.capture_available() {
            if !self.warned_no_capture {
                self.warned_no_capture = true;
                self.push_entry(
                    EntryKind::Error,
                    "Speech recognition not available in this runtime",
                );
                self.push_entry(EntryKind::System, "💡 Use text input instead");
            }
            return;
        }
        self.flags.continuous = true;
        self.push_entry(EntryKind::System, "🎤 Listening...");
        if let Err(e) = self.speech.start_capture() {
            warn!(error = %e, "failed to start capture");
            self.flags.continuous = false;
        }
        self.publish_flags();
    }

    fn stop_listening(&mut self) {
        self.flags.continuous = false;
        self.flags.listening = false;
        self.speech.abort_capture();
        self.publish_flags();
    }

    /// Start speaking. Capture pauses while speech plays and resumes when
    /// the adapter reports playback completion.
    fn speak(&mut self, text: String) {
        let request = SpeakRequest::new(text, &self.speech_config, &self.speech.voices());
        self.flags.speaking = true;
        if self.flags.listening {
            self.speech.abort_capture();
            self.flags.listening = false;
        }
        self.publish_flags();
        if let Err(e) = self.speech.speak(request) {
            warn!(error = %e, "speech synthesis failed");
            self.flags.speaking = false;
            self.publish_flags();
        }
    }

    /// Cancel playback immediately and restart capture after a short delay.
    fn stop_speaking(&mut self) {
        self.speech.cancel_speech();
        self.flags.speaking = false;
        self.publish_flags();
        if self.flags.continuous {
            self.speech.abort_capture();
            self.flags.listening = false;
            self.schedule_restart(self.config.stop_restart_delay_ms);
        }
    }

    fn schedule_restart(&self, delay_ms: u64) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            let _ = tx.send(SessionEvent::RestartCapture);
        });
    }

    fn restart_capture(&mut self) {
        if !self.flags.continuous || self.flags.speaking {
            return;
        }
        if let Err(e) = self.speech.start_capture() {
            warn!(error = %e, "failed to restart capture");
        }
    }

    fn push_entry(&mut self, kind: EntryKind, text: impl Into<String>) {
        let entry = self.transcript.push(kind, text);
        let _ = self.notices.send(SessionNotice::Entry(entry));
    }

    fn publish_flags(&self) {
        let _ = self.notices.send(SessionNotice::Flags(self.flags));
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::LlmConfig;
    use crate::llm::LlmClient;
    use crate::test_utils::{RecordingBridge, ScriptedSpeech};
    use std::time::Duration;
    use tokio::time::timeout;

    struct Harness {
        handle: SessionHandle,
        notices: broadcast::Receiver<SessionNotice>,
        speech: Arc<ScriptedSpeech>,
        bridge: Arc<RecordingBridge>,
    }

    fn start_session(speech_builder: impl FnOnce(ScriptedSpeech) -> ScriptedSpeech) -> Harness {
        let llm = LlmClient::new(LlmConfig {
            api_url: "http://127.0.0.1:9".to_owned(),
            api_key: "test-key".to_owned(),
            api_key_env: None,
            max_attempts: 2,
            ..LlmConfig::default()
        });
        let bridge = Arc::new(RecordingBridge::default());
        let dispatcher = Dispatcher::new(llm, bridge.clone());

        let (speech_tx, speech_rx) = mpsc::unbounded_channel();
        let speech = Arc::new(speech_builder(ScriptedSpeech::new(speech_tx)));

        let config = SessionConfig {
            greet_on_start: false,
            ..SessionConfig::default()
        };
        let (session, handle) = Session::new(
            dispatcher,
            speech.clone(),
            speech_rx,
            config,
            SpeechConfig::default(),
        );
        let notices = handle.subscribe();
        tokio::spawn(session.run());
        Harness {
            handle,
            notices,
            speech,
            bridge,
        }
    }

    async fn next_entry(notices: &mut broadcast::Receiver<SessionNotice>) -> TranscriptEntry {
        loop {
            let notice = timeout(Duration::from_secs(5), notices.recv())
                .await
                .expect("notice timeout")
                .expect("notice channel closed");
            if let SessionNotice::Entry(entry) = notice {
                return entry;
            }
        }
    }

    #[tokio::test]
    async fn text_command_logs_user_then_outcome_and_speaks() {
        let mut h = start_session(|s| s);
        h.handle.submit_text("what time is it");

        let user = next_entry(&mut h.notices).await;
        assert_eq!(user.kind, EntryKind::User);
        assert_eq!(user.text, "what time is it");

        let outcome = next_entry(&mut h.notices).await;
        assert_eq!(outcome.kind, EntryKind::System);
        assert!(outcome.text.starts_with("⏰ "));

        let spoken = h.speech.spoken_texts();
        assert_eq!(spoken.len(), 1);
        assert!(spoken[0].starts_with("It is "));
    }

    #[tokio::test]
    async fn greeting_is_spoken_once_on_start() {
        let llm = LlmClient::new(LlmConfig {
            api_url: "http://127.0.0.1:9".to_owned(),
            api_key: "test-key".to_owned(),
            api_key_env: None,
            ..LlmConfig::default()
        });
        let bridge = Arc::new(RecordingBridge::default());
        let (speech_tx, speech_rx) = mpsc::unbounded_channel();
        let speech = Arc::new(ScriptedSpeech::new(speech_tx));
        let (session, handle) = Session::new(
            Dispatcher::new(llm, bridge),
            speech.clone(),
            speech_rx,
            SessionConfig::default(),
            SpeechConfig::default(),
        );
        let mut notices = handle.subscribe();
        tokio::spawn(session.run());

        let banner = next_entry(&mut notices).await;
        assert_eq!(banner.text, "⚡ ORBIT ONLINE");
        let spoken = h_spoken(&speech).await;
        assert!(spoken[0].ends_with("I am Orbit, your AI assistant."));
    }

    async fn h_spoken(speech: &Arc<ScriptedSpeech>) -> Vec<String> {
        for _ in 0..50 {
            let spoken = speech.spoken_texts();
            if !spoken.is_empty() {
                return spoken;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        speech.spoken_texts()
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_speech_and_restarts_capture_after_delay() {
        let mut h = start_session(|s| s.holding_playback());
        h.handle.toggle_listening();
        let listening = next_entry(&mut h.notices).await;
        assert_eq!(listening.text, "🎤 Listening...");
        assert_eq!(h.speech.capture_starts(), 1);

        h.handle.submit_text("hello");
        let _user = next_entry(&mut h.notices).await;
        let _greeting_ack = next_entry(&mut h.notices).await;
        // Playback is held open: the session is speaking now.

        h.handle.submit_text("stop");
        let stop_user = next_entry(&mut h.notices).await;
        assert_eq!(stop_user.text, "stop");
        let stopped = next_entry(&mut h.notices).await;
        assert_eq!(stopped.text, "⏹️ Stopped - Now Listening");
        assert_eq!(h.speech.cancels(), 1);

        // The restart timer fires under the paused clock.
        for _ in 0..50 {
            if h.speech.capture_starts() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(h.speech.capture_starts() >= 2, "capture restarted after stop");
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_dispatch_is_dropped() {
        let mut h = start_session(|s| s);
        // Both miss every local rule and the knowledge base, so each would
        // need the (unreachable) LLM; the first occupies the dispatch slot
        // through its retry backoff, the second must be dropped.
        h.handle.submit_text("ponder the nature of marmalade");
        h.handle.submit_text("ponder the nature of jam");

        let mut entries = Vec::new();
        for _ in 0..3 {
            entries.push(next_entry(&mut h.notices).await);
        }
        assert_eq!(entries[0].kind, EntryKind::User);
        assert_eq!(entries[1].kind, EntryKind::User);
        // Only one outcome entry: the second utterance never dispatched.
        assert_eq!(entries[2].kind, EntryKind::Error);
        assert!(entries[2].text.starts_with("Unable to process:"));

        // No further entries arrive for the dropped utterance.
        tokio::time::sleep(Duration::from_secs(2)).await;
        while let Ok(notice) = h.notices.try_recv() {
            assert!(
                !matches!(notice, SessionNotice::Entry(_)),
                "unexpected extra entry: {notice:?}"
            );
        }
    }

    #[tokio::test]
    async fn missing_capture_warns_once_and_stays_text_only() {
        let mut h = start_session(|s| s.without_capture());
        h.handle.toggle_listening();
        let warning = next_entry(&mut h.notices).await;
        assert_eq!(warning.kind, EntryKind::Error);
        assert!(warning.text.contains("not available"));
        let hint = next_entry(&mut h.notices).await;
        assert!(hint.text.contains("text input"));
        assert_eq!(h.speech.capture_starts(), 0);

        // Second toggle stays silent; a text command still works.
        h.handle.toggle_listening();
        h.handle.submit_text("tell me a joke");
        let user = next_entry(&mut h.notices).await;
        assert_eq!(user.text, "tell me a joke");
        let joke = next_entry(&mut h.notices).await;
        assert!(joke.text.starts_with("😂 "));
        let _ = h.bridge;
    }

    #[tokio::test]
    async fn recognized_utterance_dispatches_like_text() {
        let mut h = start_session(|s| s);
        h.speech.recognize("what is python");
        let user = next_entry(&mut h.notices).await;
        assert_eq!(user.kind, EntryKind::User);
        let answer = next_entry(&mut h.notices).await;
        assert!(answer.text.starts_with("💡 "));
    }
}
