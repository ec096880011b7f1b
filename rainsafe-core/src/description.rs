//! Keyword analysis of free-text report descriptions.
//!
//! Used to suggest a severity to submitters and triagers. The threshold
//! evaluator does not read this; it only trusts the water-level descriptor.

use serde::Serialize;

use crate::model::Severity;

// Whole words only, each base form listed with its inflections.
const HIGH_RISK_WORDS: &[&str] = &[
    "stick", "sticks", "stuck", "sticking",
    "submerge", "submerges", "submerged", "submerging",
    "block", "blocks", "blocked", "blocking",
    "trap", "traps", "trapped", "trapping",
    "enter", "enters", "entered", "entering",
    "dangerous",
    "impassable",
    "wash", "washes", "washed", "washing",
    "collapse", "collapses", "collapsed", "collapsing",
];

const MEDIUM_RISK_WORDS: &[&str] = &[
    "rise", "rises", "rose", "risen", "rising",
    "overflow", "overflows", "overflowed", "overflowing",
    "waterlog", "waterlogged", "waterlogging",
    "struggle", "struggles", "struggled", "struggling",
    "difficult",
    "stagnant",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptionAnalysis {
    pub severity: Severity,
    /// Words that triggered the severity, deduplicated, in order of appearance.
    pub actionable_words: Vec<String>,
}


pub fn analyze_description(description: &str) -> DescriptionAnalysis {
    let mut severity = Severity::Low;
    let mut actionable_words: Vec<String> = Vec::new();

    let lowered = description.to_lowercase();
    let words = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty());

    for word in words {
        let hit = if HIGH_RISK_WORDS.contains(&word) {
            severity = Severity::High;
            true
        } else if MEDIUM_RISK_WORDS.contains(&word) {
            if severity != Severity::High {
                severity = Severity::Moderate;
            }
            true
        } else {
            false
        };

        if hit && !actionable_words.iter().any(|w| w == word) {
            actionable_words.push(word.to_string());
        }
    }

    DescriptionAnalysis { severity, actionable_words }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calm_description_is_low() {
        let a = analyze_description("Some puddles near the bus stop");
        assert_eq!(a.severity, Severity::Low);
        assert!(a.actionable_words.is_empty());
    }

    #[test]
    fn medium_keywords() {
        let a = analyze_description("Drain is overflowing and water keeps rising");
        assert_eq!(a.severity, Severity::Moderate);
        assert_eq!(a.actionable_words, vec!["overflowing", "rising"]);
    }

    #[test]
    fn high_keyword_wins_regardless_of_order() {
        let a = analyze_description("Cars stuck, road impassable. Water rising fast");
        assert_eq!(a.severity, Severity::High);
        assert!(a.actionable_words.contains(&"stuck".to_string()));
        assert!(a.actionable_words.contains(&"impassable".to_string()));
        assert!(a.actionable_words.contains(&"rising".to_string()));
    }

    #[test]
    fn words_sharing_a_prefix_do_not_trigger() {
        for text in [
            "Washroom at the station is closed",
            "Traffic slow on Washington street",
            "Entertainment district is quiet",
            "Roses in the park look fine",
            "Blockchain meetup cancelled",
        ] {
            let a = analyze_description(text);
            assert_eq!(a.severity, Severity::Low, "{text}");
            assert!(a.actionable_words.is_empty(), "{text}");
        }
    }

    #[test]
    fn inflected_forms_still_match() {
        let a = analyze_description("Bus washed away, water entered shops, river rose overnight");
        assert_eq!(a.severity, Severity::High);
        assert_eq!(a.actionable_words, vec!["washed", "entered", "rose"]);
    }

    #[test]
    fn repeated_words_are_reported_once() {
        let a = analyze_description("Blocked. Blocked! BLOCKED");
        assert_eq!(a.actionable_words, vec!["blocked"]);
    }
}
