//! Ordered intent rule cascade.
//!
//! [`classify`] evaluates rule categories in a fixed total order; the first
//! match wins and no two categories fire for one utterance. Order is
//! correctness here: narrow, unambiguous patterns (stop, file operations,
//! canned responses) come before the broad LLM catch-all so common commands
//! never incur a network round-trip.

use crate::calc;
use crate::normalize::{correct_spelling, expand_abbreviations};
use regex::Regex;
use std::sync::LazyLock;

/// Applications the assistant may launch by name.
pub const APP_ALLOWLIST: &str =
    "firefox|chrome|notepad|calculator|explorer|terminal|cmd|vscode|discord|gedit|sublime|atom";

/// Known external sites: key, URL, display name. Keys are matched as
/// substrings alongside the lowercased display name.
pub const SITES: &[(&str, &str, &str)] = &[
    ("youtube", "https://youtube.com", "YouTube"),
    ("google", "https://google.com", "Google"),
    ("facebook", "https://facebook.com", "Facebook"),
    ("instagram", "https://instagram.com", "Instagram"),
    ("twitter", "https://twitter.com", "X"),
    ("linkedin", "https://linkedin.com", "LinkedIn"),
    ("github", "https://github.com", "GitHub"),
    ("amazon", "https://amazon.com", "Amazon"),
    ("stackoverflow", "https://stackoverflow.com", "Stack Overflow"),
    ("reddit", "https://reddit.com", "Reddit"),
    ("wikipedia", "https://wikipedia.org", "Wikipedia"),
    ("medium", "https://medium.com", "Medium"),
    ("geeksforgeeks", "https://geeksforgeeks.org", "GeeksforGeeks"),
    ("geeks for geeks", "https://geeksforgeeks.org", "GeeksforGeeks"),
    ("dev.to", "https://dev.to", "Dev.to"),
];

/// Response-formatting shape detected for a generic LLM query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    /// Code/algorithm request — full code-answer template.
    Code,
    /// Table/list/comparison request — structured-output instruction.
    Tabular,
    /// Direct who/what/when/where/why/how question — sent as-is.
    Direct,
    /// Anything else — sent as-is.
    Plain,
}

/// A classified utterance. Variants are listed in evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Interrupt: cancel speech, restart capture.
    Stop,
    /// Create a named file with literal content.
    CreateFile { name: String, content: String },
    /// Generate a code file for a language, optionally naming an algorithm.
    GenerateCode { language: String, algorithm: String },
    Joke,
    Fact,
    Quote,
    Time,
    Date,
    Greeting,
    Thanks,
    /// Arithmetic already evaluated during classification (evaluation
    /// errors fall through to later rules instead of surfacing).
    Calculate { expr: String, value: f64 },
    /// "Play a song/music" with no title — pick one at random.
    PlayRandomSong,
    /// Explicit media search with an extracted query (> 2 chars).
    MediaSearch { query: String },
    OpenApp { name: String },
    /// Close requests report a capability limitation, never attempted.
    CloseApp { name: String },
    OpenSite {
        url: &'static str,
        name: &'static str,
    },
    ListFiles,
    ListMusic,
    /// Document-analysis marker detected — route verbatim to the LLM.
    DocumentAnalysis,
    /// Generic knowledge query after verb stripping and normalization.
    Query { text: String, shape: QueryShape },
    /// Stripping/normalization left nothing — absolute fallback with the
    /// raw utterance.
    EmptyQuery,
}

macro_rules! rule {
    ($name:ident, $pattern:literal) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new($pattern).unwrap_or_else(|e| panic!("invalid rule pattern: {e}"))
        });
    };
}

rule!(STOP, r"(?:stop|pause|cancel|quiet|hush|silence|shut)");
rule!(
    CREATE_FILE_TEST,
    r"create\s+(?:a\s+)?(?:file\s+)?(?:named\s+)?(\S+)\s+(?:and\s+)?(?:write|add|put)"
);
rule!(
    CREATE_FILE_EXTRACT,
    r#"create\s+(?:a\s+)?(?:file\s+)?(?:named\s+)?(\S+)\s+(?:and\s+)?(?:write|add|put)\s+(?:the\s+)?(?:text\s+)?["']?([^"']+?)["']?(?:\s+(?:in it|to it|inside it|to the file))?\s*$"#
);
rule!(
    CODE_FILE,
    r"(?:create|make|generate)\s+(?:a\s+)?(?:python|javascript|java|cpp|html|css)\s+(?:file|code)"
);
rule!(CODE_LANG, r"(?:python|javascript|java|cpp|html|css)");
rule!(CODE_ALGO, r"(?:with|for)\s+(.+)");
rule!(JOKE, r"(?:tell|give)\s+(?:me\s+)?(?:a\s+)?joke");
rule!(FACT, r"(?:tell|give)\s+(?:me\s+)?(?:a\s+)?fact");
rule!(QUOTE, r"(?:tell|give)\s+(?:me\s+)?(?:a\s+)?quote");
rule!(TIME, r"(?:time|hour|minute)");
rule!(DATE, r"(?:date|day)");
rule!(GREETING, r"^(?:hello|hi|hey|greetings)$");
rule!(THANKS, r"(?:thank|thanks)");
rule!(MATH, r"(?:calculate|math|compute)\s+(.+)");
rule!(
    MUSIC_GENERIC,
    r"play\s+(?:a\s+)?(?:song|music)|^music$|listen\s+to\s+(?:a\s+)?(?:song|music)"
);
rule!(
    MEDIA_TEST,
    r"(?:play|listen)\s+.*\s+on\s+youtube|(?:play|listen)\s+(?:to\s+)?(?:a\s+)?(?:song|music|video|track)\s+(.+)"
);
rule!(
    MEDIA_EXTRACT,
    r"(?:play|listen)\s+(?:to\s+)?(?:a\s+)?(?:song\s+|music\s+|video\s+|track\s+)?(.+?)(?:\s+on\s+youtube)?$"
);
rule!(MEDIA_TYPE_SUFFIX, r"\s+(?:song|music|video|track)$");
rule!(LIST_FILES, r"(?:list|show)\s+(?:my\s+)?(?:local\s+)?(?:files|documents)");
rule!(LOCAL_MUSIC, r"(?:play|listen to)\s+(?:my\s+)?local|(?:list|show)\s+(?:my\s+)?music");
rule!(QUESTION_STEM, r"^(?:who|what|when|where|why|how)\s+");

// Leading-verb strippers for the generic query, applied in order.
rule!(STRIP_FOR, r"^(?:code\s+)?for\s+");
rule!(
    STRIP_VERBS,
    r"^(?:tell|show|give|explain|describe|discuss|design|create|make|build|generate|write|code)\s+(?:me\s+)?(?:a\s+)?(?:something\s+)?(?:about\s+)?"
);
rule!(STRIP_QUESTION, r"^(?:who|what|when|where|why|how)\s+(?:is|are|the|a|an)?\s*");
rule!(STRIP_SEARCH, r"^(?:search|find|look\s+up|google|define|ask|question)\s+(?:me\s+)?(?:for\s+)?");

static APP_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:open|launch|start)\s+({APP_ALLOWLIST})"))
        .unwrap_or_else(|e| panic!("invalid rule pattern: {e}"))
});
static APP_CLOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"close\s+({APP_ALLOWLIST})"))
        .unwrap_or_else(|e| panic!("invalid rule pattern: {e}"))
});

/// Returns `true` for interrupt/stop phrases. Exposed separately so the
/// session can short-circuit a stop even while a dispatch is in flight.
pub fn is_stop(cmd: &str) -> bool {
    STOP.is_match(cmd)
}

/// Classify a normalized (lowercased, trimmed) utterance.
pub fn classify(cmd: &str) -> Intent {
    // 1. Interrupt.
    if is_stop(cmd) {
        return Intent::Stop;
    }

    // 2. File creation with content. The outer test is deliberately looser
    // than the extractor; a failed extraction falls through.
    if CREATE_FILE_TEST.is_match(cmd) {
        if let Some(caps) = CREATE_FILE_EXTRACT.captures(cmd) {
            return Intent::CreateFile {
                name: caps[1].to_owned(),
                content: caps[2].trim().to_owned(),
            };
        }
    }

    // 3. Code-file generation.
    if CODE_FILE.is_match(cmd) {
        let language = CODE_LANG
            .find(cmd)
            .map(|m| m.as_str().to_owned())
            .unwrap_or_else(|| "python".to_owned());
        let algorithm = CODE_ALGO
            .captures(cmd)
            .map(|caps| strip_algo_noise(&caps[1]))
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| crate::snippets::DEFAULT_ALGORITHM.to_owned());
        return Intent::GenerateCode {
            language,
            algorithm,
        };
    }

    // 4. Canned responses.
    if JOKE.is_match(cmd) {
        return Intent::Joke;
    }
    if FACT.is_match(cmd) {
        return Intent::Fact;
    }
    if QUOTE.is_match(cmd) {
        return Intent::Quote;
    }
    if TIME.is_match(cmd) {
        return Intent::Time;
    }
    if DATE.is_match(cmd) {
        return Intent::Date;
    }
    if GREETING.is_match(cmd) {
        return Intent::Greeting;
    }
    if THANKS.is_match(cmd) {
        return Intent::Thanks;
    }

    // 5. Arithmetic. The remainder must stay inside the arithmetic
    // alphabet, and evaluation errors fall through silently.
    if let Some(caps) = MATH.captures(cmd) {
        let expr = caps[1].trim().to_owned();
        if calc::is_arithmetic(&expr) {
            if let Ok(value) = calc::eval(&expr) {
                return Intent::Calculate { expr, value };
            }
        }
    }

    // 6. Media search: generic request first, then explicit query.
    if MUSIC_GENERIC.is_match(cmd) {
        return Intent::PlayRandomSong;
    }
    if MEDIA_TEST.is_match(cmd) {
        if let Some(caps) = MEDIA_EXTRACT.captures(cmd) {
            let query = MEDIA_TYPE_SUFFIX.replace(caps[1].trim(), "").trim().to_owned();
            if query.len() > 2 {
                return Intent::MediaSearch { query };
            }
        }
    }

    // 7. Local applications. Close requests report a limitation.
    if let Some(caps) = APP_OPEN.captures(cmd) {
        return Intent::OpenApp {
            name: caps[1].to_owned(),
        };
    }
    if let Some(caps) = APP_CLOSE.captures(cmd) {
        return Intent::CloseApp {
            name: caps[1].to_owned(),
        };
    }

    // 8. Known sites: navigation verb + site name co-occurrence.
    if cmd.contains("open") || cmd.contains("go to") {
        for (key, url, name) in SITES {
            if cmd.contains(key) || cmd.contains(&name.to_lowercase()) {
                return Intent::OpenSite { url, name };
            }
        }
    }

    // 9. Capability stubs.
    if LIST_FILES.is_match(cmd) {
        return Intent::ListFiles;
    }
    if LOCAL_MUSIC.is_match(cmd) {
        return Intent::ListMusic;
    }

    // 10. Document analysis markers — verbatim to the LLM.
    if is_document_analysis(cmd) {
        return Intent::DocumentAnalysis;
    }

    // 11. Generic knowledge/LLM query.
    let shape = detect_shape(cmd);
    let query = strip_query(cmd);
    let query = expand_abbreviations(&correct_spelling(&query));
    let query = query.trim().to_owned();
    if query.len() > 1 {
        Intent::Query { text: query, shape }
    } else {
        Intent::EmptyQuery
    }
}

fn is_document_analysis(cmd: &str) -> bool {
    cmd.contains("document analysis")
        || cmd.contains("document information")
        || cmd.contains("full document content")
        || cmd.contains("document file:")
        || (cmd.contains("user request") && cmd.contains("document"))
}

fn detect_shape(cmd: &str) -> QueryShape {
    let is_code = ["code", "algorithm", "algo", "function", "program", "dsa"]
        .iter()
        .any(|k| cmd.contains(k));
    let is_table = ["table", "list", "compare", "design"]
        .iter()
        .any(|k| cmd.contains(k));
    if is_code {
        QueryShape::Code
    } else if is_table {
        QueryShape::Tabular
    } else if QUESTION_STEM.is_match(cmd) {
        QueryShape::Direct
    } else {
        QueryShape::Plain
    }
}

fn strip_query(cmd: &str) -> String {
    let q = STRIP_FOR.replace(cmd, "");
    let q = STRIP_VERBS.replace(&q, "");
    let q = STRIP_QUESTION.replace(&q, "");
    let q = STRIP_SEARCH.replace(&q, "");
    q.trim().to_owned()
}

fn strip_algo_noise(raw: &str) -> String {
    raw.split_whitespace()
        .filter(|w| !matches!(*w, "with" | "for" | "a" | "an" | "code"))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_owned()
}
