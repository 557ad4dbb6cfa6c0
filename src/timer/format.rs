//! Workout format classification

use serde::{Deserialize, Serialize};

/// Discrete workout format derived from a free-text label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormatTag {
    ForTime,
    Amrap,
    Emom,
    Tabata,
    Other,
}

impl FormatTag {
    /// Classify a format label by case-insensitive substring match.
    ///
    /// Checks run in order and the first match wins: "amrap", "emom",
    /// "tabata", then "for time". Anything else is `Other`.
    pub fn classify(label: &str) -> Self {
        let label = label.to_lowercase();

        if label.contains("amrap") {
            FormatTag::Amrap
        } else if label.contains("emom") {
            FormatTag::Emom
        } else if label.contains("tabata") {
            FormatTag::Tabata
        } else if label.contains("for time") {
            FormatTag::ForTime
        } else {
            FormatTag::Other
        }
    }

    pub fn is_amrap(self) -> bool {
        self == FormatTag::Amrap
    }

    pub fn is_emom(self) -> bool {
        self == FormatTag::Emom
    }

    pub fn is_tabata(self) -> bool {
        self == FormatTag::Tabata
    }

    /// One-line guidance shown under the timer
    pub fn instructions(self) -> &'static str {
        match self {
            FormatTag::Amrap => "Complete as many rounds as possible. Tap + after each round.",
            FormatTag::Emom => {
                "Complete the work at the start of each minute. Timer beeps every minute."
            }
            FormatTag::Tabata => "20 seconds work, 10 seconds rest. 8 rounds total.",
            FormatTag::ForTime | FormatTag::Other => "Complete the workout as fast as possible.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_labels() {
        assert_eq!(FormatTag::classify("3 Rounds AMRAP"), FormatTag::Amrap);
        assert_eq!(FormatTag::classify("21-15-9 For Time"), FormatTag::ForTime);
        assert_eq!(FormatTag::classify("EMOM x 20"), FormatTag::Emom);
        assert_eq!(FormatTag::classify("Tabata squats"), FormatTag::Tabata);
    }

    #[test]
    fn unmatched_label_is_other() {
        assert_eq!(FormatTag::classify("Chipper"), FormatTag::Other);
        assert_eq!(FormatTag::classify(""), FormatTag::Other);
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(FormatTag::classify("emom then amrap"), FormatTag::Amrap);
        assert_eq!(FormatTag::classify("Tabata-style EMOM"), FormatTag::Emom);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(FormatTag::classify("aMrAp 12"), FormatTag::Amrap);
        assert_eq!(FormatTag::classify("ROUNDS FOR TIME"), FormatTag::ForTime);
    }

    #[test]
    fn flags_follow_tag() {
        assert!(FormatTag::Amrap.is_amrap());
        assert!(!FormatTag::Amrap.is_emom());
        assert!(FormatTag::Tabata.is_tabata());
        assert!(!FormatTag::Other.is_tabata());
    }
}
