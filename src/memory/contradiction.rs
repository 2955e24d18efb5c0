//! Surface heuristics for spotting a new statement that disagrees with a
//! stored one. Semantic closeness is decided by the caller; this module only
//! says *why* two close texts might conflict.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::types::Memory;

const NEGATIONS: &[&str] = &[
    "not", "never", "no longer", "don't", "doesn't", "isn't", "won't", "stopped", "can't", "no",
];

const OPPOSITES: &[(&str, &str)] = &[
    ("like", "dislike"),
    ("love", "hate"),
    ("prefer", "avoid"),
    ("always", "never"),
    ("enable", "disable"),
    ("use", "stop using"),
    ("yes", "no"),
    ("true", "false"),
];

static NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").ok());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictReason {
    NegationMismatch,
    OpposingTerms { term: String, opposite: String },
    DifferentFigures { existing: Vec<String>, new: Vec<String> },
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::NegationMismatch => write!(f, "only one statement is negated"),
            ConflictReason::OpposingTerms { term, opposite } => {
                write!(f, "'{term}' vs '{opposite}'")
            }
            ConflictReason::DifferentFigures { existing, new } => {
                write!(f, "figures differ ({} vs {})", existing.join(", "), new.join(", "))
            }
        }
    }
}

/// A stored memory close to the new content, with any conflict signals.
#[derive(Debug, Clone, Serialize)]
pub struct ContradictionCandidate {
    pub memory: Memory,
    pub similarity: f64,
    pub reasons: Vec<ConflictReason>,
}

impl ContradictionCandidate {
    pub fn is_likely_conflict(&self) -> bool {
        !self.reasons.is_empty()
    }
}

/// Lowercase, keep letters/digits/apostrophes, pad with spaces so phrase
/// lookups can match on word boundaries.
fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .replace('\u{2019}', "'")
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect();
    format!(" {} ", cleaned.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn has_term(normalized: &str, term: &str) -> bool {
    normalized.contains(&format!(" {term} "))
}

fn is_negated(normalized: &str) -> bool {
    NEGATIONS.iter().any(|n| has_term(normalized, n))
}

fn figures(text: &str) -> BTreeSet<String> {
    match NUMBER.as_ref() {
        Some(re) => re.find_iter(text).map(|m| m.as_str().to_string()).collect(),
        None => BTreeSet::new(),
    }
}

/// Every heuristic that fires for `existing` vs `new`.
pub fn conflict_reasons(existing: &str, new: &str) -> Vec<ConflictReason> {
    let (a, b) = (normalize(existing), normalize(new));
    let mut reasons = Vec::new();

    if is_negated(&a) != is_negated(&b) {
        reasons.push(ConflictReason::NegationMismatch);
    }

    for (term, opposite) in OPPOSITES {
        let forward = has_term(&a, term) && has_term(&b, opposite);
        let backward = has_term(&a, opposite) && has_term(&b, term);
        if forward || backward {
            reasons.push(ConflictReason::OpposingTerms {
                term: term.to_string(),
                opposite: opposite.to_string(),
            });
        }
    }

    let (fa, fb) = (figures(existing), figures(new));
    if !fa.is_empty() && !fb.is_empty() && fa != fb {
        reasons.push(ConflictReason::DifferentFigures {
            existing: fa.into_iter().collect(),
            new: fb.into_iter().collect(),
        });
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_mismatch_fires_one_sided() {
        let reasons = conflict_reasons("Joshua drinks coffee", "Joshua no longer drinks coffee");
        assert!(reasons.contains(&ConflictReason::NegationMismatch));
        assert!(conflict_reasons("I don't use tabs", "I won't use tabs").is_empty());
    }

    #[test]
    fn curly_apostrophes_count_as_negation() {
        let reasons = conflict_reasons("Crystal likes the logo", "Crystal doesn\u{2019}t like the logo");
        assert!(reasons.contains(&ConflictReason::NegationMismatch));
    }

    #[test]
    fn opposing_terms_in_either_direction() {
        let reasons = conflict_reasons("We always deploy on Friday", "We never deploy on Friday");
        assert!(reasons.iter().any(|r| matches!(
            r,
            ConflictReason::OpposingTerms { term, opposite } if term == "always" && opposite == "never"
        )));

        let reasons = conflict_reasons("Avoid ORMs in the API", "Prefer ORMs in the API");
        assert!(reasons
            .iter()
            .any(|r| matches!(r, ConflictReason::OpposingTerms { term, .. } if term == "prefer")));
    }

    #[test]
    fn phrase_terms_match_on_word_boundaries() {
        let reasons = conflict_reasons("We use Redis for sessions", "We stop using Redis for sessions");
        assert!(reasons
            .iter()
            .any(|r| matches!(r, ConflictReason::OpposingTerms { term, .. } if term == "use")));
        // "user" is not "use"
        assert!(conflict_reasons("The user count", "The user count").is_empty());
    }

    #[test]
    fn different_figures() {
        let reasons = conflict_reasons("Pricing is 49 per month", "Pricing is 59 per month");
        assert_eq!(
            reasons,
            vec![ConflictReason::DifferentFigures {
                existing: vec!["49".into()],
                new: vec!["59".into()],
            }]
        );
        assert!(conflict_reasons("Pricing is 49", "The price is 49").is_empty());
        assert!(conflict_reasons("Pricing is 49", "Pricing is cheap").is_empty());
    }

    #[test]
    fn display_is_readable() {
        let r = ConflictReason::OpposingTerms {
            term: "love".into(),
            opposite: "hate".into(),
        };
        assert_eq!(r.to_string(), "'love' vs 'hate'");
    }
}
