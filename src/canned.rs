//! Locally generated responses: jokes, facts, quotes, greetings, song picks,
//! and wall-clock time/date strings. No network involved.

use chrono::Local;
use rand::seq::SliceRandom;

pub const JOKES: &[&str] = &[
    "Why do programmers prefer dark mode? Because light attracts bugs!",
    "How many programmers does it take to change a lightbulb? None, that's a hardware problem!",
];

pub const FACTS: &[&str] = &[
    "Python was named after Monty Python!",
    "JavaScript was created in 10 days!",
];

pub const QUOTES: &[&str] =
    &["Innovation distinguishes between a leader and a follower. - Steve Jobs"];

/// Startup greetings, spoken once per session.
pub const GREETINGS: &[&str] = &[
    "Welcome back, champion! Ready to conquer your day?",
    "Hey hero! Let's make today absolutely legendary!",
    "Rise and shine, legend! Your greatness awaits!",
    "Good to see you again, champion! Time to shine!",
    "Welcome, superstar! Let's achieve something amazing today!",
    "Greetings, hero! Let's make magic happen!",
    "Welcome, brilliant mind! Let's do something extraordinary!",
    "Hey genius! Ready to amaze yourself today?",
    "Welcome back, you absolute legend! Ready to be legendary?",
    "Hey brilliant one! Your brain is about to do something amazing!",
];

/// Titles used when the user asks for "a song" without naming one.
pub const POPULAR_SONGS: &[&str] = &[
    "Bohemian Rhapsody",
    "Imagine",
    "Yesterday",
    "Stairway to Heaven",
    "Hotel California",
    "Hey Jude",
    "Let It Be",
    "Smells Like Teen Spirit",
    "Shape of You",
    "Someone Like You",
];

fn pick(pool: &[&'static str]) -> &'static str {
    pool.choose(&mut rand::thread_rng()).copied().unwrap_or("")
}

pub fn random_joke() -> &'static str {
    pick(JOKES)
}

pub fn random_fact() -> &'static str {
    pick(FACTS)
}

pub fn random_quote() -> &'static str {
    pick(QUOTES)
}

pub fn random_greeting() -> &'static str {
    pick(GREETINGS)
}

pub fn random_song() -> &'static str {
    pick(POPULAR_SONGS)
}

/// Current wall-clock time as `HH:MM AM/PM`.
pub fn current_time() -> String {
    Local::now().format("%I:%M %p").to_string()
}

/// Current date as weekday, month and day, e.g. `Monday, August 31`.
pub fn current_date() -> String {
    Local::now().format("%A, %B %-d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_is_twelve_hour_clock() {
        let t = current_time();
        // HH:MM AM or HH:MM PM
        assert!(t.ends_with("AM") || t.ends_with("PM"), "got {t}");
        let hhmm = &t[..t.len() - 3];
        let (h, m) = hhmm.split_once(':').expect("colon");
        let h: u32 = h.parse().expect("hour");
        let m: u32 = m.parse().expect("minute");
        assert!((1..=12).contains(&h));
        assert!(m < 60);
    }

    #[test]
    fn date_contains_weekday() {
        let d = current_date();
        let weekdays = [
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
            "Sunday",
        ];
        assert!(weekdays.iter().any(|w| d.starts_with(w)), "got {d}");
    }

    #[test]
    fn pools_are_non_empty() {
        assert!(!random_joke().is_empty());
        assert!(!random_fact().is_empty());
        assert!(!random_quote().is_empty());
        assert!(!random_greeting().is_empty());
        assert!(!random_song().is_empty());
    }
}
