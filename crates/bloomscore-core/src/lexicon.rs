//! Verb lexicon and question classifier.
//!
//! A question's cognitive level is decided by the action verbs in its text.
//! The lexicon maps each verb to one canonical Bloom's level; matching is
//! case-insensitive and bounded by word boundaries, so "Design" matches
//! `design` but "redesigned" does not.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;
use crate::model::BloomLevel;

/// Built-in verb list. Each verb appears under exactly one level.
const BUILTIN_VERBS: &[(BloomLevel, &[&str])] = &[
    (
        BloomLevel::Create,
        &[
            "assemble", "build", "compose", "construct", "create", "design", "develop",
            "devise", "formulate", "generate", "hypothesize", "invent", "originate", "plan",
            "propose", "synthesize", "come up with", "put together",
        ],
    ),
    (
        BloomLevel::Evaluate,
        &[
            "appraise", "argue", "assess", "conclude", "criticize", "critique", "decide",
            "defend", "evaluate", "judge", "justify", "prioritize", "rank", "rate",
            "recommend", "support", "validate", "verify",
        ],
    ),
    (
        BloomLevel::Analyze,
        &[
            "analyse", "analyze", "categorize", "compare", "contrast", "deduce", "diagram",
            "differentiate", "discriminate", "dissect", "distinguish", "examine", "inspect",
            "investigate", "organize", "relate", "break down",
        ],
    ),
    (
        BloomLevel::Apply,
        &[
            "apply", "calculate", "compute", "demonstrate", "determine", "employ", "execute",
            "find", "implement", "modify", "operate", "practice", "prepare", "show",
            "simulate", "solve", "use", "make use of",
        ],
    ),
    (
        BloomLevel::Understand,
        &[
            "classify", "describe", "discuss", "explain", "express", "extend", "illustrate",
            "indicate", "infer", "interpret", "outline", "paraphrase", "predict", "report",
            "restate", "review", "summarize", "translate",
        ],
    ),
    (
        BloomLevel::Remember,
        &[
            "cite", "define", "enumerate", "identify", "label", "list", "locate", "match",
            "memorize", "name", "quote", "recall", "recognize", "record", "repeat",
            "reproduce", "state", "what is",
        ],
    ),
];

static BUILTIN: Lazy<Lexicon> = Lazy::new(|| {
    let entries = BUILTIN_VERBS
        .iter()
        .flat_map(|(level, verbs)| verbs.iter().map(move |v| (v.to_string(), *level)));
    Lexicon::from_entries(entries).expect("built-in lexicon compiles")
});

/// The outcome of classifying one question text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    /// Distinct verbs found, in order of first appearance.
    pub verbs: Vec<String>,
    /// The verb with the most complex level; earliest wins ties.
    pub highest_verb: Option<String>,
    /// Level of `highest_verb`.
    pub level: Option<BloomLevel>,
}

/// An immutable verb → level mapping with a compiled matcher.
#[derive(Debug, Clone)]
pub struct Lexicon {
    verbs: BTreeMap<String, BloomLevel>,
    pattern: Regex,
}

impl Lexicon {
    /// The built-in lexicon, compiled once per process.
    pub fn builtin() -> &'static Lexicon {
        &BUILTIN
    }

    /// Build a lexicon from `(verb, level)` pairs. Later pairs replace
    /// earlier ones for the same verb.
    pub fn from_entries<I>(entries: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (String, BloomLevel)>,
    {
        let verbs: BTreeMap<String, BloomLevel> = entries
            .into_iter()
            .map(|(verb, level)| (normalize_verb(&verb), level))
            .filter(|(verb, _)| !verb.is_empty())
            .collect();
        let pattern = compile(verbs.keys())?;
        Ok(Self { verbs, pattern })
    }

    /// A copy of this lexicon with extra verbs merged in. Level names are
    /// parsed case-insensitively.
    pub fn with_overrides(
        &self,
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut entries: Vec<(String, BloomLevel)> =
            self.verbs.iter().map(|(v, l)| (v.clone(), *l)).collect();
        for (verb, level) in overrides {
            let level: BloomLevel = level.parse().map_err(|_| ConfigError::UnknownLevel {
                verb: verb.clone(),
                level: level.clone(),
            })?;
            entries.push((verb.clone(), level));
        }
        Ok(Self::from_entries(entries)?)
    }

    /// Level for a single verb.
    pub fn level_of(&self, verb: &str) -> Option<BloomLevel> {
        self.verbs.get(&normalize_verb(verb)).copied()
    }

    /// All verbs mapped to `level`, alphabetically.
    pub fn verbs_for(&self, level: BloomLevel) -> impl Iterator<Item = &str> {
        self.verbs
            .iter()
            .filter(move |(_, l)| **l == level)
            .map(|(v, _)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.verbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    /// Find lexicon verbs in `text` and pick the most complex one.
    pub fn classify(&self, text: &str) -> Classification {
        let mut result = Classification::default();
        if self.verbs.is_empty() {
            return result;
        }

        for m in self.pattern.find_iter(text) {
            let verb = normalize_verb(m.as_str());
            let Some(&level) = self.verbs.get(&verb) else {
                continue;
            };
            if result.verbs.contains(&verb) {
                continue;
            }
            if result.level.map_or(true, |best| level.complexity() > best.complexity()) {
                result.level = Some(level);
                result.highest_verb = Some(verb.clone());
            }
            result.verbs.push(verb);
        }

        result
    }
}

/// Lowercase and collapse inner whitespace.
fn normalize_verb(verb: &str) -> String {
    verb.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One alternation over every verb, longest first so multi-word verbs win
/// over their prefixes.
fn compile<'a>(verbs: impl Iterator<Item = &'a String>) -> Result<Regex, regex::Error> {
    let mut alternatives: Vec<String> = verbs
        .map(|v| {
            v.split(' ')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect();
    alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    if alternatives.is_empty() {
        // Never matches.
        return Regex::new(r"\b\B");
    }
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_verbs_are_unique() {
        let total: usize = BUILTIN_VERBS.iter().map(|(_, verbs)| verbs.len()).sum();
        assert_eq!(Lexicon::builtin().len(), total, "a verb is listed under two levels");
    }

    #[test]
    fn classify_single_verb() {
        let c = Lexicon::builtin().classify("Explain the process");
        assert_eq!(c.verbs, vec!["explain"]);
        assert_eq!(c.highest_verb.as_deref(), Some("explain"));
        assert_eq!(c.level, Some(BloomLevel::Understand));
    }

    #[test]
    fn classify_picks_most_complex_verb() {
        let c = Lexicon::builtin().classify("Define a stack and design a queue using two stacks.");
        assert_eq!(c.verbs, vec!["define", "design"]);
        assert_eq!(c.highest_verb.as_deref(), Some("design"));
        assert_eq!(c.level, Some(BloomLevel::Create));
    }

    #[test]
    fn classify_is_case_insensitive_and_word_bounded() {
        let lexicon = Lexicon::builtin();
        assert_eq!(lexicon.classify("DESIGN a parser").level, Some(BloomLevel::Create));
        assert_eq!(lexicon.classify("The redesigned relabeling").level, None);
    }

    #[test]
    fn classify_multi_word_verbs() {
        let c = Lexicon::builtin().classify("What is   recursion?");
        assert_eq!(c.verbs, vec!["what is"]);
        assert_eq!(c.level, Some(BloomLevel::Remember));

        let c = Lexicon::builtin().classify("Break down the algorithm into phases");
        assert_eq!(c.highest_verb.as_deref(), Some("break down"));
    }

    #[test]
    fn classify_without_verbs_is_unclassified() {
        let c = Lexicon::builtin().classify("Binary trees: 10 marks");
        assert!(c.verbs.is_empty());
        assert!(c.highest_verb.is_none());
        assert!(c.level.is_none());
    }

    #[test]
    fn tie_keeps_first_verb() {
        let c = Lexicon::builtin().classify("Compare and contrast TCP with UDP");
        assert_eq!(c.highest_verb.as_deref(), Some("compare"));
        assert_eq!(c.level, Some(BloomLevel::Analyze));
    }

    #[test]
    fn overrides_add_and_replace_verbs() {
        let mut overrides = BTreeMap::new();
        overrides.insert("sketch".to_string(), "Create".to_string());
        overrides.insert("list".to_string(), "understand".to_string());
        let lexicon = Lexicon::builtin().with_overrides(&overrides).unwrap();

        assert_eq!(lexicon.level_of("sketch"), Some(BloomLevel::Create));
        assert_eq!(lexicon.level_of("List"), Some(BloomLevel::Understand));
        assert_eq!(Lexicon::builtin().level_of("sketch"), None);
    }

    #[test]
    fn override_with_unknown_level_fails() {
        let mut overrides = BTreeMap::new();
        overrides.insert("ponder".to_string(), "contemplate".to_string());
        let err = Lexicon::builtin().with_overrides(&overrides).unwrap_err();
        assert!(err.to_string().contains("contemplate"));
    }

    #[test]
    fn empty_lexicon_matches_nothing() {
        let lexicon = Lexicon::from_entries(Vec::new()).unwrap();
        assert!(lexicon.is_empty());
        assert!(lexicon.classify("Design and explain").level.is_none());
    }

    #[test]
    fn verbs_for_level() {
        let verbs: Vec<&str> = Lexicon::builtin().verbs_for(BloomLevel::Create).collect();
        assert!(verbs.contains(&"design"));
        assert!(!verbs.contains(&"explain"));
    }
}
