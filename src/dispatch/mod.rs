//! Intent dispatch: classification plus execution.
//!
//! [`Dispatcher::execute`] takes one normalized utterance through the rule
//! cascade and runs the winning intent against the collaborators (system
//! bridge, LLM client, knowledge base). Every dispatch produces exactly one
//! transcript entry, at most one speech directive, and optionally a control
//! action for the session loop. Long-running branches report progress
//! out-of-band so the transcript invariant holds.

pub mod rules;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::canned;
use crate::knowledge;
use crate::llm::LlmClient;
use crate::snippets;
use crate::system::SystemBridge;
use crate::transcript::EntryKind;

pub use rules::{classify, Intent, QueryShape};

/// Control action the session loop must take after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Cancel speech and restart capture.
    Stop,
}

/// Result of executing one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub kind: EntryKind,
    pub text: String,
    /// Text to hand to the speech adapter, when the intent speaks.
    pub speak: Option<String>,
    pub control: Option<Control>,
}

impl DispatchOutcome {
    fn system(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::System,
            text: text.into(),
            speak: None,
            control: None,
        }
    }

    fn spoken(text: impl Into<String>, speak: impl Into<String>) -> Self {
        Self {
            speak: Some(speak.into()),
            ..Self::system(text)
        }
    }

    fn error(text: impl Into<String>, speak: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Error,
            text: text.into(),
            speak: Some(speak.into()),
            control: None,
        }
    }
}

/// Executes classified intents. Cheap to construct; holds shared handles
/// only.
pub struct Dispatcher {
    llm: LlmClient,
    bridge: Arc<dyn SystemBridge>,
    progress: Option<mpsc::UnboundedSender<String>>,
}

impl Dispatcher {
    pub fn new(llm: LlmClient, bridge: Arc<dyn SystemBridge>) -> Self {
        Self {
            llm,
            bridge,
            progress: None,
        }
    }

    /// Attach a channel for out-of-band progress lines ("Thinking...").
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<String>) -> Self {
        self.progress = Some(tx);
        self
    }

    fn report(&self, text: &str) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(text.to_owned());
        }
    }

    /// Run one utterance through the cascade and execute the winning
    /// intent. Never fails; unrecoverable paths surface as an error entry.
    pub async fn execute(&self, raw: &str) -> DispatchOutcome {
        let cmd = raw.trim().to_lowercase();
        let intent = rules::classify(&cmd);
        debug!(?intent, "classified utterance");

        match intent {
            Intent::Stop => DispatchOutcome {
                control: Some(Control::Stop),
                ..DispatchOutcome::system("⏹️ Stopped - Now Listening")
            },
            Intent::CreateFile { name, content } => self.create_file(&name, &content).await,
            Intent::GenerateCode {
                language,
                algorithm,
            } => self.generate_code(&language, &algorithm),
            Intent::Joke => {
                let joke = canned::random_joke();
                DispatchOutcome::spoken(format!("😂 {joke}"), joke)
            }
            Intent::Fact => {
                let fact = canned::random_fact();
                DispatchOutcome::spoken(format!("💡 {fact}"), fact)
            }
            Intent::Quote => {
                let quote = canned::random_quote();
                DispatchOutcome::spoken(format!("✨ {quote}"), quote)
            }
            Intent::Time => {
                let time = canned::current_time();
                DispatchOutcome::spoken(format!("⏰ {time}"), format!("It is {time}"))
            }
            Intent::Date => {
                let date = canned::current_date();
                DispatchOutcome::spoken(format!("📅 {date}"), format!("Today is {date}"))
            }
            Intent::Greeting => DispatchOutcome::spoken("Greeting", "Ready"),
            Intent::Thanks => DispatchOutcome::spoken("Ack", "Welcome"),
            Intent::Calculate { expr, value } => {
                let result = crate::calc::format_value(value);
                DispatchOutcome::spoken(
                    format!("🔢 {expr} = {result}"),
                    format!("Result: {result}"),
                )
            }
            Intent::PlayRandomSong => self.media_search(canned::random_song()),
            Intent::MediaSearch { query } => self.media_search(&query),
            Intent::OpenApp { name } => self.open_app(&name).await,
            Intent::CloseApp { name } => DispatchOutcome::system(format!(
                "💡 I can't close {name} from here. Use a task manager."
            )),
            Intent::OpenSite { url, name } => {
                self.bridge.open_url(url);
                DispatchOutcome::spoken(format!("✓ {name}"), format!("Opening {name}"))
            }
            Intent::ListFiles => DispatchOutcome::spoken(
                "💡 Need a system backend for file listing",
                "I need a system backend to list your files",
            ),
            Intent::ListMusic => DispatchOutcome::spoken(
                "💡 Need a system backend for local music",
                "I need a system backend to access your local music",
            ),
            Intent::DocumentAnalysis => self.analyze_document(&cmd).await,
            Intent::Query { text, shape } => self.answer_query(&text, shape, &cmd).await,
            Intent::EmptyQuery => self.absolute_fallback(&cmd).await,
        }
    }

    async fn create_file(&self, name: &str, content: &str) -> DispatchOutcome {
        match self.bridge.create_file(name, content).await {
            Ok(()) => {
                DispatchOutcome::spoken(format!("✓ File: {name}"), format!("Created {name}"))
            }
            Err(e) => {
                // No backend: hand the content over as a download instead.
                warn!(%name, error = %e, "file creation failed, falling back to download");
                self.bridge.download_file(name, content);
                DispatchOutcome::system(format!("✓ Downloaded: {name}"))
            }
        }
    }

    fn generate_code(&self, language: &str, algorithm: &str) -> DispatchOutcome {
        let ext = snippets::extension_for(language);
        let content = snippets::snippet_for(algorithm);
        let filename = format!("orbit_{}.{ext}", chrono::Local::now().timestamp_millis());
        self.bridge.download_file(&filename, content);
        DispatchOutcome::spoken(
            format!("✓ {} file", ext.to_uppercase()),
            format!("Generated {ext} file"),
        )
    }

    fn media_search(&self, query: &str) -> DispatchOutcome {
        let url = format!(
            "https://www.youtube.com/results?search_query={}",
            urlencoding::encode(query)
        );
        self.bridge.open_url(&url);
        DispatchOutcome::spoken(
            format!("▶ YouTube: {query}"),
            format!("Playing {query} on YouTube"),
        )
    }

    async fn open_app(&self, name: &str) -> DispatchOutcome {
        match self.bridge.open_application(name).await {
            Ok(()) => {
                DispatchOutcome::spoken(format!("✓ {name} launched"), format!("Opening {name}"))
            }
            Err(e) => {
                warn!(%name, error = %e, "application launch failed");
                DispatchOutcome::system(format!("Need a system backend to open {name}"))
            }
        }
    }

    /// Document-analysis prompts go to the LLM verbatim, no stripping.
    async fn analyze_document(&self, cmd: &str) -> DispatchOutcome {
        self.report("📄 Analyzing Document...");
        let reply = self.llm.ask(cmd).await;
        match reply.answer() {
            Some(answer) => DispatchOutcome::spoken(format!("💡 {answer}"), answer.to_owned()),
            None => {
                let reason = reply
                    .failure()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "could not process document".to_owned());
                DispatchOutcome::error(
                    format!("LLM error: {reason}"),
                    format!("Let me analyze that document. {reason}"),
                )
            }
        }
    }

    async fn answer_query(&self, query: &str, shape: QueryShape, raw: &str) -> DispatchOutcome {
        // Curated knowledge first: no network round-trip for the basics.
        if let Some(answer) = knowledge::lookup(query) {
            return DispatchOutcome::spoken(format!("💡 {answer}"), answer.to_owned());
        }

        self.report("🤖 Thinking...");
        let prompt = format_prompt(query, shape);
        let reply = self.llm.ask(&prompt).await;
        match reply.answer() {
            Some(answer) => DispatchOutcome::spoken(format!("💡 {answer}"), answer.to_owned()),
            None => {
                debug!(attempts = reply.attempts, "formatted query failed, retrying raw");
                self.absolute_fallback(raw).await
            }
        }
    }

    /// Last resort: send the raw utterance once; a second failure is
    /// unrecoverable.
    async fn absolute_fallback(&self, raw: &str) -> DispatchOutcome {
        self.report("🤖 Processing...");
        let reply = self.llm.ask(raw).await;
        match reply.answer() {
            Some(answer) => DispatchOutcome::spoken(format!("💡 {answer}"), answer.to_owned()),
            None => DispatchOutcome::error(
                format!("Unable to process: {raw}"),
                "I could not process that request. Try asking a question or uploading a document.",
            ),
        }
    }
}

/// Wrap a query in the response-format template its shape calls for.
fn format_prompt(query: &str, shape: QueryShape) -> String {
    match shape {
        QueryShape::Code => format!(
            "Provide code for: {query}\n\n\
             Please provide:\n\
             1. Complete, production-ready, optimized code\n\
             2. Step-by-step explanation\n\
             3. Time Complexity Analysis\n\
             4. Space Complexity Analysis\n\
             5. Example usage/test case\n\
             6. Alternative approaches\n\n\
             Format code in clear blocks with language hints."
        ),
        QueryShape::Tabular => format!(
            "{query}\n\n\
             Please format as a well-structured table or organized list \
             with clear headers and proper formatting."
        ),
        QueryShape::Direct | QueryShape::Plain => query.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::LlmConfig;
    use crate::test_utils::RecordingBridge;

    fn dispatcher(bridge: Arc<RecordingBridge>) -> Dispatcher {
        // Unroutable endpoint: every test here must resolve without the LLM.
        let config = LlmConfig {
            api_url: "http://127.0.0.1:9".to_owned(),
            api_key: "test-key".to_owned(),
            api_key_env: None,
            max_attempts: 1,
            ..LlmConfig::default()
        };
        Dispatcher::new(LlmClient::new(config), bridge)
    }

    #[tokio::test]
    async fn time_dispatch_speaks_and_logs_clock() {
        let bridge = Arc::new(RecordingBridge::default());
        let outcome = dispatcher(bridge).execute("what time is it").await;
        assert_eq!(outcome.kind, EntryKind::System);
        assert!(outcome.text.starts_with("⏰ "));
        let spoken = outcome.speak.unwrap();
        assert!(spoken.starts_with("It is "));
        assert!(spoken.ends_with("AM") || spoken.ends_with("PM"));
    }

    #[tokio::test]
    async fn stop_sets_control_without_speech() {
        let bridge = Arc::new(RecordingBridge::default());
        let outcome = dispatcher(bridge).execute("stop").await;
        assert_eq!(outcome.control, Some(Control::Stop));
        assert_eq!(outcome.speak, None);
    }

    #[tokio::test]
    async fn file_creation_uses_bridge() {
        let bridge = Arc::new(RecordingBridge::default());
        let outcome = dispatcher(bridge.clone())
            .execute("create notes.txt and write hello world in it")
            .await;
        assert_eq!(outcome.text, "✓ File: notes.txt");
        assert_eq!(outcome.speak.as_deref(), Some("Created notes.txt"));
        let files = bridge.created_files();
        assert_eq!(files, vec![("notes.txt".to_owned(), "hello world".to_owned())]);
    }

    #[tokio::test]
    async fn file_creation_falls_back_to_download() {
        let bridge = Arc::new(RecordingBridge::default().failing());
        let outcome = dispatcher(bridge.clone())
            .execute("create notes.txt and write hello world in it")
            .await;
        assert_eq!(outcome.text, "✓ Downloaded: notes.txt");
        assert_eq!(outcome.speak, None);
        assert_eq!(
            bridge.downloads(),
            vec![("notes.txt".to_owned(), "hello world".to_owned())]
        );
    }

    #[tokio::test]
    async fn code_generation_downloads_snippet() {
        let bridge = Arc::new(RecordingBridge::default());
        let outcome = dispatcher(bridge.clone())
            .execute("generate a python file with kadane")
            .await;
        assert_eq!(outcome.text, "✓ PY file");
        assert_eq!(outcome.speak.as_deref(), Some("Generated py file"));
        let downloads = bridge.downloads();
        assert_eq!(downloads.len(), 1);
        assert!(downloads[0].0.ends_with(".py"));
        assert!(downloads[0].1.contains("max_sum"));
    }

    #[tokio::test]
    async fn media_search_opens_encoded_url() {
        let bridge = Arc::new(RecordingBridge::default());
        let outcome = dispatcher(bridge.clone())
            .execute("play bohemian rhapsody on youtube")
            .await;
        assert_eq!(outcome.text, "▶ YouTube: bohemian rhapsody");
        assert_eq!(
            bridge.opened_urls(),
            vec!["https://www.youtube.com/results?search_query=bohemian%20rhapsody".to_owned()]
        );
    }

    #[tokio::test]
    async fn app_launch_failure_reports_backend_need() {
        let bridge = Arc::new(RecordingBridge::default().failing());
        let outcome = dispatcher(bridge).execute("open firefox").await;
        assert_eq!(outcome.kind, EntryKind::System);
        assert_eq!(outcome.text, "Need a system backend to open firefox");
        assert_eq!(outcome.speak, None);
    }

    #[tokio::test]
    async fn site_navigation_opens_url() {
        let bridge = Arc::new(RecordingBridge::default());
        let outcome = dispatcher(bridge.clone()).execute("go to github").await;
        assert_eq!(outcome.text, "✓ GitHub");
        assert_eq!(outcome.speak.as_deref(), Some("Opening GitHub"));
        assert_eq!(bridge.opened_urls(), vec!["https://github.com".to_owned()]);
    }

    #[tokio::test]
    async fn knowledge_lookup_short_circuits_llm() {
        // The LLM endpoint is unroutable; an answer proves the curated
        // knowledge base handled it locally.
        let bridge = Arc::new(RecordingBridge::default());
        let outcome = dispatcher(bridge).execute("what is python").await;
        assert_eq!(outcome.kind, EntryKind::System);
        assert!(outcome.text.starts_with("💡 "));
    }

    #[tokio::test]
    async fn arithmetic_formats_integral_result() {
        let bridge = Arc::new(RecordingBridge::default());
        let outcome = dispatcher(bridge).execute("calculate 6 * 7").await;
        assert_eq!(outcome.text, "🔢 6 * 7 = 42");
        assert_eq!(outcome.speak.as_deref(), Some("Result: 42"));
    }

    #[test]
    fn code_prompt_carries_formatting_instructions() {
        let prompt = format_prompt("dijkstra", QueryShape::Code);
        assert!(prompt.starts_with("Provide code for: dijkstra"));
        assert!(prompt.contains("Time Complexity Analysis"));
        let plain = format_prompt("dijkstra", QueryShape::Plain);
        assert_eq!(plain, "dijkstra");
    }
}
