//! Typo correction and abbreviation expansion applied before LLM dispatch.
//!
//! Both passes are deterministic whole-word rewrites; running either on an
//! already-normalised string returns it unchanged.

/// Edit distance between two words (insert/delete/substitute, unit cost).
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=a.len()).collect();
    let mut cur = vec![0usize; a.len() + 1];

    for (i, bc) in b.iter().enumerate() {
        cur[0] = i + 1;
        for (j, ac) in a.iter().enumerate() {
            cur[j + 1] = if ac == bc {
                prev[j]
            } else {
                prev[j].min(prev[j + 1]).min(cur[j]) + 1
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[a.len()]
}

/// Find the option closest to `input` by summed per-word edit distance.
///
/// Returns `None` when even the best candidate is further than half the
/// input length (minimum tolerance of 2), mirroring a "no good match" cutoff.
pub fn find_best_match<'a>(input: &str, options: &'a [&'a str]) -> Option<&'a str> {
    if options.is_empty() {
        return None;
    }

    let input_words: Vec<String> = input
        .to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect();

    let mut best = options[0];
    let mut best_distance = usize::MAX;

    for option in options {
        let option_words: Vec<String> = option
            .to_lowercase()
            .split_whitespace()
            .map(str::to_owned)
            .collect();
        let mut total = 0usize;
        for iw in &input_words {
            let min = option_words
                .iter()
                .map(|ow| levenshtein(iw, ow))
                .min()
                .unwrap_or(iw.len());
            total += min;
        }
        if total < best_distance {
            best_distance = total;
            best = option;
        }
    }

    let tolerance = (input.len() / 2).max(2);
    (best_distance <= tolerance).then_some(best)
}

/// Common command typo corrections (whole-word, case-insensitive, lowers the text).
const CORRECTIONS: &[(&str, &str)] = &[
    ("kadanes", "kadane"),
    ("algorithim", "algorithm"),
    ("algo", "algorithm"),
    ("pyramod", "pyramid"),
    ("reciursive", "recursive"),
    ("sory", "sorry"),
    ("pls", "please"),
    ("thx", "thanks"),
    ("wht", "what"),
];

/// Abbreviation expansions (whole-word, case-insensitive).
const EXPANSIONS: &[(&str, &str)] = &[
    ("algo", "algorithm"),
    ("df", "dataframe"),
    ("db", "database"),
    ("api", "API"),
    ("ui", "user interface"),
    ("ux", "user experience"),
    ("ml", "machine learning"),
    ("ai", "artificial intelligence"),
    ("io", "input output"),
    ("cpu", "processor"),
];

fn rewrite_words(text: &str, table: &[(&str, &str)]) -> String {
    text.split_whitespace()
        .map(|word| {
            // Separate trailing punctuation so "thx!" still matches "thx".
            let trimmed = word.trim_end_matches(|c: char| !c.is_alphanumeric());
            let tail = &word[trimmed.len()..];
            let lower = trimmed.to_lowercase();
            match table.iter().find(|(from, _)| *from == lower) {
                Some((_, to)) => format!("{to}{tail}"),
                None => word.to_owned(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Apply the typo-correction table. Lowercases the text.
pub fn correct_spelling(text: &str) -> String {
    rewrite_words(&text.to_lowercase(), CORRECTIONS)
}

/// Expand common abbreviations. Preserves the case of untouched words.
pub fn expand_abbreviations(text: &str) -> String {
    rewrite_words(text, EXPANSIONS)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn corrects_known_typos() {
        assert_eq!(correct_spelling("wht is kadanes"), "what is kadane");
        assert_eq!(correct_spelling("thx pls"), "thanks please");
    }

    #[test]
    fn expands_abbreviations() {
        assert_eq!(
            expand_abbreviations("explain ml and ai"),
            "explain machine learning and artificial intelligence"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = expand_abbreviations(&correct_spelling("wht is ml algo"));
        let twice = expand_abbreviations(&correct_spelling(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn already_clean_text_unchanged() {
        let text = "explain quicksort in detail";
        assert_eq!(correct_spelling(text), text);
        assert_eq!(expand_abbreviations(text), text);
    }

    #[test]
    fn best_match_respects_tolerance() {
        let options = ["quicksort", "fibonacci", "kadane"];
        assert_eq!(find_best_match("quicksrot", &options), Some("quicksort"));
        assert_eq!(find_best_match("zzzzzzzzzzzzzzzzzzzzzz", &options), None);
    }
}
