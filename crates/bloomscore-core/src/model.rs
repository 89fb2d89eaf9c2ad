//! Core data model types for bloomscore.
//!
//! Questions come from the spreadsheet, course outcomes and modules come
//! from the declared course design. Everything downstream is derived from
//! these types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tag used for a question whose CO or module could not be read.
pub const UNASSIGNED: &str = "unassigned";

/// One of the six Bloom's taxonomy levels.
///
/// Declaration order is the canonical order, most to least cognitively
/// complex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BloomLevel {
    Create,
    Evaluate,
    Analyze,
    Apply,
    Understand,
    Remember,
}

impl BloomLevel {
    /// All levels in canonical order (create first, remember last).
    pub const CANONICAL: [BloomLevel; 6] = [
        BloomLevel::Create,
        BloomLevel::Evaluate,
        BloomLevel::Analyze,
        BloomLevel::Apply,
        BloomLevel::Understand,
        BloomLevel::Remember,
    ];

    /// Lowercase level name.
    pub fn name(self) -> &'static str {
        match self {
            BloomLevel::Create => "create",
            BloomLevel::Evaluate => "evaluate",
            BloomLevel::Analyze => "analyze",
            BloomLevel::Apply => "apply",
            BloomLevel::Understand => "understand",
            BloomLevel::Remember => "remember",
        }
    }

    /// Position in the canonical list (0 = create).
    pub fn canonical_index(self) -> usize {
        self as usize
    }

    /// Cognitive complexity, 6 for create down to 1 for remember.
    pub fn complexity(self) -> u8 {
        6 - self as u8
    }

    /// A representative verb for phrasing suggestions.
    pub fn example_verb(self) -> &'static str {
        match self {
            BloomLevel::Create => "design",
            BloomLevel::Evaluate => "justify",
            BloomLevel::Analyze => "compare",
            BloomLevel::Apply => "solve",
            BloomLevel::Understand => "explain",
            BloomLevel::Remember => "define",
        }
    }
}

impl fmt::Display for BloomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BloomLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(BloomLevel::Create),
            "evaluate" => Ok(BloomLevel::Evaluate),
            "analyze" | "analyse" => Ok(BloomLevel::Analyze),
            "apply" => Ok(BloomLevel::Apply),
            "understand" => Ok(BloomLevel::Understand),
            "remember" => Ok(BloomLevel::Remember),
            other => Err(format!("unknown Bloom's level: {other}")),
        }
    }
}

/// How a question's extracted level compares with its CO target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Remark {
    Matches,
    Higher,
    Lower,
}

impl Remark {
    /// Compare an extracted level against the target level.
    pub fn compare(extracted: BloomLevel, target: BloomLevel) -> Self {
        match extracted.complexity().cmp(&target.complexity()) {
            std::cmp::Ordering::Equal => Remark::Matches,
            std::cmp::Ordering::Greater => Remark::Higher,
            std::cmp::Ordering::Less => Remark::Lower,
        }
    }

    /// Numeric alignment code: 1 matches, 2 higher, 3 lower.
    pub fn q_score(self) -> u8 {
        match self {
            Remark::Matches => 1,
            Remark::Higher => 2,
            Remark::Lower => 3,
        }
    }

    /// Inverse of [`Remark::q_score`].
    pub fn from_q_score(score: u8) -> Option<Self> {
        match score {
            1 => Some(Remark::Matches),
            2 => Some(Remark::Higher),
            3 => Some(Remark::Lower),
            _ => None,
        }
    }

    /// Remark text shown alongside each question.
    pub fn text(self) -> &'static str {
        match self {
            Remark::Matches => "Matches Expected Blooms Level",
            Remark::Higher => "Higher than Expected Blooms Level",
            Remark::Lower => "Lower than Expected Blooms Level",
        }
    }
}

impl fmt::Display for Remark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// A single exam question, as read from one spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Question text.
    pub text: String,
    /// Marks allotted; 0 when the cell was missing or invalid.
    pub marks: f64,
    /// CO key (`CO<n>`) or [`UNASSIGNED`].
    pub co: String,
    /// Module key (`M<n>`, a verbatim module name, or [`UNASSIGNED`]).
    pub module: String,
    /// Free-form question type tag.
    pub question_type: String,
    /// Lexicon verbs found in the text, in order of first appearance.
    pub verbs: Vec<String>,
    /// The verb that decided the extracted level.
    pub highest_verb: Option<String>,
    /// Extracted level; `None` when unclassified.
    pub level: Option<BloomLevel>,
    /// Alignment against the CO target, set during scoring.
    pub remark: Option<Remark>,
    /// Spreadsheet columns the engine does not interpret.
    pub extra: BTreeMap<String, String>,
}

impl Question {
    /// Returns `true` if no lexicon verb was found in the text.
    pub fn is_unclassified(&self) -> bool {
        self.level.is_none()
    }

    pub fn q_score(&self) -> Option<u8> {
        self.remark.map(Remark::q_score)
    }
}

/// A declared course outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOutcome {
    /// Key in `CO<n>` form.
    pub key: String,
    /// The `<n>` of the key.
    pub number: u32,
    /// Declared weight in percent.
    pub weight: f64,
    /// Declared target level names, lowercased. Only the first counts.
    pub blooms: Vec<String>,
}

impl CourseOutcome {
    /// The primary target level, if it names a canonical level.
    pub fn target(&self) -> Option<BloomLevel> {
        self.blooms.first().and_then(|b| b.parse().ok())
    }
}

/// A declared course module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Key in `M<n>` form, or the verbatim module name.
    pub key: String,
    /// Declared teaching hours.
    pub hours: f64,
}

impl Module {
    /// Whether a question's module tag refers to this module.
    pub fn matches_tag(&self, tag: &str) -> bool {
        self.key.eq_ignore_ascii_case(tag)
    }
}

/// The declared learning design of a course: outcomes and modules, in the
/// order they were declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseDesign {
    pub outcomes: Vec<CourseOutcome>,
    pub modules: Vec<Module>,
    /// Keys declared more than once; the later declaration won.
    #[serde(skip)]
    pub duplicate_keys: Vec<String>,
}

impl CourseDesign {
    /// Look up an outcome by its `CO<n>` key.
    pub fn outcome(&self, key: &str) -> Option<&CourseOutcome> {
        self.outcomes.iter().find(|co| co.key.eq_ignore_ascii_case(key))
    }

    /// Sum of all declared CO weights.
    pub fn total_weight(&self) -> f64 {
        self.outcomes.iter().map(|co| co.weight).sum()
    }

    /// Sum of all declared module hours.
    pub fn total_hours(&self) -> f64 {
        self.modules.iter().map(|m| m.hours).sum()
    }

    /// Primary target of every outcome, in declaration order.
    pub fn primary_targets(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter_map(|co| co.blooms.first().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty() && self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_display_and_parse() {
        assert_eq!(BloomLevel::Analyze.to_string(), "analyze");
        assert_eq!("Apply".parse::<BloomLevel>().unwrap(), BloomLevel::Apply);
        assert_eq!("analyse".parse::<BloomLevel>().unwrap(), BloomLevel::Analyze);
        assert_eq!(" REMEMBER ".parse::<BloomLevel>().unwrap(), BloomLevel::Remember);
        assert!("synthesis".parse::<BloomLevel>().is_err());
    }

    #[test]
    fn canonical_order_runs_most_to_least_complex() {
        let complexities: Vec<u8> = BloomLevel::CANONICAL.iter().map(|l| l.complexity()).collect();
        assert_eq!(complexities, vec![6, 5, 4, 3, 2, 1]);
        assert_eq!(BloomLevel::Create.canonical_index(), 0);
        assert_eq!(BloomLevel::Remember.canonical_index(), 5);
    }

    #[test]
    fn remark_from_levels() {
        assert_eq!(Remark::compare(BloomLevel::Apply, BloomLevel::Apply), Remark::Matches);
        assert_eq!(Remark::compare(BloomLevel::Create, BloomLevel::Analyze), Remark::Higher);
        assert_eq!(Remark::compare(BloomLevel::Understand, BloomLevel::Apply), Remark::Lower);
    }

    #[test]
    fn remark_text_is_a_function_of_q_score() {
        for score in 1..=3 {
            let remark = Remark::from_q_score(score).unwrap();
            assert_eq!(remark.q_score(), score);
        }
        assert_eq!(Remark::from_q_score(1).unwrap().text(), "Matches Expected Blooms Level");
        assert!(Remark::from_q_score(0).is_none());
        assert!(Remark::from_q_score(4).is_none());
    }

    #[test]
    fn outcome_target_uses_first_level_only() {
        let co = CourseOutcome {
            key: "CO1".into(),
            number: 1,
            weight: 50.0,
            blooms: vec!["apply".into(), "create".into()],
        };
        assert_eq!(co.target(), Some(BloomLevel::Apply));

        let unknown = CourseOutcome {
            blooms: vec!["synthesis".into(), "apply".into()],
            ..co
        };
        assert_eq!(unknown.target(), None);
    }
}
