//! Eisenhower quadrant classification.
//!
//! A task's priority bucket is derived from its two flags and never stored on
//! its own. Assigning a bucket overwrites both flags at once.
//!
//! | important | urgent | quadrant          | key  | remote code |
//! |-----------|--------|-------------------|------|-------------|
//! | true      | true   | important+urgent  | `uv` | `Q1`        |
//! | true      | false  | important         | `v`  | `Q2`        |
//! | false     | true   | urgent            | `u`  | `Q3`        |
//! | false     | false  | neither           | `o`  | `Q4`        |

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    #[serde(rename = "uv")]
    ImportantUrgent,
    #[serde(rename = "v")]
    Important,
    #[serde(rename = "u")]
    Urgent,
    #[serde(rename = "o")]
    Neither,
}

impl Quadrant {
    /// Matrix order: top-left to bottom-right.
    pub const ALL: [Quadrant; 4] = [Quadrant::ImportantUrgent, Quadrant::Important, Quadrant::Urgent, Quadrant::Neither];

    /// Bucket for a pair of flags. Inverse of [`Quadrant::flags`].
    pub fn classify(important: bool, urgent: bool) -> Self {
        match (important, urgent) {
            (true, true) => Quadrant::ImportantUrgent,
            (true, false) => Quadrant::Important,
            (false, true) => Quadrant::Urgent,
            (false, false) => Quadrant::Neither,
        }
    }

    /// The `(important, urgent)` pair this quadrant stands for.
    pub fn flags(self) -> (bool, bool) {
        match self {
            Quadrant::ImportantUrgent => (true, true),
            Quadrant::Important => (true, false),
            Quadrant::Urgent => (false, true),
            Quadrant::Neither => (false, false),
        }
    }

    /// Parses a bucket key. Accepts the short keys and the long names;
    /// anything else is `None` and callers treat it as a no-op.
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "uv" | "important+urgent" => Some(Quadrant::ImportantUrgent),
            "v" | "important" => Some(Quadrant::Important),
            "u" | "urgent" => Some(Quadrant::Urgent),
            "o" | "neither" => Some(Quadrant::Neither),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Quadrant::ImportantUrgent => "uv",
            Quadrant::Important => "v",
            Quadrant::Urgent => "u",
            Quadrant::Neither => "o",
        }
    }

    /// Single-column encoding used by the remote backend.
    pub fn remote_code(self) -> &'static str {
        match self {
            Quadrant::ImportantUrgent => "Q1",
            Quadrant::Important => "Q2",
            Quadrant::Urgent => "Q3",
            Quadrant::Neither => "Q4",
        }
    }

    /// Total decoding of the remote column: absent or unknown means `Neither`.
    pub fn from_remote_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some("Q1") => Quadrant::ImportantUrgent,
            Some("Q2") => Quadrant::Important,
            Some("Q3") => Quadrant::Urgent,
            _ => Quadrant::Neither,
        }
    }

    /// 2 for both flags, 1 for exactly one, 0 for neither.
    pub fn priority_score(self) -> u8 {
        match self {
            Quadrant::ImportantUrgent => 2,
            Quadrant::Important | Quadrant::Urgent => 1,
            Quadrant::Neither => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quadrant::ImportantUrgent => "⭐⚡ Important + Urgent",
            Quadrant::Important => "⭐ Important",
            Quadrant::Urgent => "⚡ Urgent",
            Quadrant::Neither => "• Other",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quadrant::ImportantUrgent => "important+urgent",
            Quadrant::Important => "important",
            Quadrant::Urgent => "urgent",
            Quadrant::Neither => "neither",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_and_flags_are_mutual_inverses() {
        for q in Quadrant::ALL {
            let (important, urgent) = q.flags();
            assert_eq!(Quadrant::classify(important, urgent), q);
        }
        for important in [true, false] {
            for urgent in [true, false] {
                assert_eq!(Quadrant::classify(important, urgent).flags(), (important, urgent));
            }
        }
    }

    #[test]
    fn parse_accepts_short_and_long_keys() {
        assert_eq!(Quadrant::parse("uv"), Some(Quadrant::ImportantUrgent));
        assert_eq!(Quadrant::parse("important+urgent"), Some(Quadrant::ImportantUrgent));
        assert_eq!(Quadrant::parse(" V "), Some(Quadrant::Important));
        assert_eq!(Quadrant::parse("neither"), Some(Quadrant::Neither));
        assert_eq!(Quadrant::parse("q1"), None);
        assert_eq!(Quadrant::parse(""), None);
    }

    #[test]
    fn remote_code_defaults_to_neither() {
        assert_eq!(Quadrant::from_remote_code(Some("Q2")), Quadrant::Important);
        assert_eq!(Quadrant::from_remote_code(Some("Q9")), Quadrant::Neither);
        assert_eq!(Quadrant::from_remote_code(None), Quadrant::Neither);
        for q in Quadrant::ALL {
            assert_eq!(Quadrant::from_remote_code(Some(q.remote_code())), q);
        }
    }

    #[test]
    fn priority_scores() {
        assert_eq!(Quadrant::ImportantUrgent.priority_score(), 2);
        assert_eq!(Quadrant::Important.priority_score(), 1);
        assert_eq!(Quadrant::Urgent.priority_score(), 1);
        assert_eq!(Quadrant::Neither.priority_score(), 0);
    }
}
