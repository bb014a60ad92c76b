//! Orbit: voice-and-text conversational assistant core.
//!
//! This crate provides the command-processing core of a conversational
//! assistant: Utterance → Intent rules → Local handler or LLM → Response
//!
//! # Architecture
//!
//! A session task owns all conversation state and is driven by async
//! channel events:
//! - **Intent dispatch**: An ordered, first-match-wins rule cascade over
//!   compiled patterns classifies each utterance (`dispatch::rules`), and a
//!   dispatcher executes the winning intent against the collaborators
//! - **Session**: A state machine over listening/speaking/continuous flags
//!   with single-flight dispatch admission and a capped transcript
//! - **LLM client**: Retrying HTTP client with class-specific exponential
//!   backoff for open questions and document analysis
//! - **Collaborators**: Speech engine, system backend, and document parsing
//!   sit behind capability traits so any front end can plug in

pub mod calc;
pub mod canned;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod normalize;
pub mod session;
pub mod snippets;
pub mod speech;
pub mod system;
pub mod transcript;

#[cfg(test)]
pub mod test_utils;

pub use config::AssistantConfig;
pub use dispatch::{classify, DispatchOutcome, Dispatcher, Intent};
pub use error::{AssistantError, Result};
pub use llm::{LlmClient, LlmReply};
pub use session::{Session, SessionHandle, SessionNotice};
pub use speech::{NullSpeech, SpeechAdapter, SpeechEvent};
pub use system::{NoBackend, SystemBridge};
