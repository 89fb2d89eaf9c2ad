//! Question spreadsheet ingestion.
//!
//! Reads question rows from a CSV export of the paper's spreadsheet and
//! classifies each one. Headers are matched loosely (`Question`, `Marks`,
//! `CO`, `Module`, `QT`); any other column is carried through untouched.
//! Bad cells never fail the batch: marks fall back to 0 and tags to
//! `unassigned`.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::IngestError;
use crate::lexicon::Lexicon;
use crate::model::{Question, UNASSIGNED};
use crate::sequence::first_number;

/// Which column holds which field.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnMap {
    question: usize,
    marks: Option<usize>,
    co: Option<usize>,
    module: Option<usize>,
    question_type: Option<usize>,
    extra: Vec<(usize, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Question,
    Marks,
    Co,
    Module,
    QuestionType,
}

/// Field a header names, with its match strength: 0 for a full name, 1 for
/// a short alias that only counts when no full name is present.
fn header_field(key: &str) -> Option<(Field, u8)> {
    match key {
        "question" | "questions" | "questiontext" => Some((Field::Question, 0)),
        "q" => Some((Field::Question, 1)),
        "marks" | "mark" | "maxmarks" | "totalmarks" => Some((Field::Marks, 0)),
        "score" | "points" => Some((Field::Marks, 1)),
        "co" | "cos" | "courseoutcome" | "outcome" => Some((Field::Co, 0)),
        "module" | "modules" | "unit" => Some((Field::Module, 0)),
        "m" => Some((Field::Module, 1)),
        "qt" | "questiontype" => Some((Field::QuestionType, 0)),
        "type" => Some((Field::QuestionType, 1)),
        _ => None,
    }
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> std::result::Result<Self, IngestError> {
        let fields: Vec<Option<(Field, u8)>> = headers
            .iter()
            .map(|h| header_field(&header_key(h)))
            .collect();
        // Strongest match wins, then the leftmost column.
        let pick = |field: Field| {
            fields
                .iter()
                .enumerate()
                .filter_map(|(idx, f)| match f {
                    Some((f, strength)) if *f == field => Some((*strength, idx)),
                    _ => None,
                })
                .min()
                .map(|(_, idx)| idx)
        };

        let question = pick(Field::Question).ok_or(IngestError::MissingColumn("Question"))?;
        let marks = pick(Field::Marks);
        let co = pick(Field::Co);
        let module = pick(Field::Module);
        let question_type = pick(Field::QuestionType);

        for (column, name, fallback) in [
            (marks, "Marks", "every question counts 0 marks"),
            (co, "CO", "every question is unassigned"),
            (module, "Module", "every question is unassigned"),
        ] {
            if column.is_none() {
                tracing::warn!("no {name} column found, {fallback}");
            }
        }

        let chosen = [Some(question), marks, co, module, question_type];
        let extra = headers
            .iter()
            .enumerate()
            .filter(|(idx, h)| !chosen.contains(&Some(*idx)) && !h.trim().is_empty())
            .map(|(idx, h)| (idx, h.trim().to_string()))
            .collect();

        Ok(Self {
            question,
            marks,
            co,
            module,
            question_type,
            extra,
        })
    }
}

/// Lowercased header with everything but letters stripped, so `"Q. Type"`
/// and `"q_type"` both read as `qtype`.
fn header_key(header: &str) -> String {
    header
        .chars()
        .filter(char::is_ascii_alphabetic)
        .collect::<String>()
        .to_lowercase()
}

/// Read and classify all question rows, preserving row order.
pub fn read_questions<R: Read>(
    reader: R,
    lexicon: &Lexicon,
) -> std::result::Result<Vec<Question>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Ok(Vec::new());
    }
    let columns = ColumnMap::from_headers(&headers)?;

    let mut questions = Vec::new();
    for (idx, record) in rdr.byte_records().enumerate() {
        let row = idx + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(IngestError::Read(e)),
            Err(e) => {
                tracing::warn!("row {row}: unreadable, skipping: {e}");
                continue;
            }
        };
        let cells: Vec<String> = record
            .iter()
            .map(|c| String::from_utf8_lossy(c).trim().to_string())
            .collect();
        if cells.iter().all(String::is_empty) {
            continue;
        }
        questions.push(question_from_row(row, &cells, &columns, lexicon));
    }

    tracing::debug!(rows = questions.len(), "ingested question rows");
    Ok(questions)
}

/// Read and classify all question rows from a CSV file.
pub fn load_questions(path: &Path, lexicon: &Lexicon) -> Result<Vec<Question>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open question sheet: {}", path.display()))?;
    read_questions(file, lexicon)
        .with_context(|| format!("failed to read question sheet: {}", path.display()))
}

fn question_from_row(
    row: usize,
    cells: &[String],
    columns: &ColumnMap,
    lexicon: &Lexicon,
) -> Question {
    let cell = |idx: Option<usize>| {
        idx.and_then(|i| cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    };

    let text = cell(Some(columns.question)).to_string();
    let raw_marks = cell(columns.marks);
    let marks = parse_marks(raw_marks).unwrap_or_else(|| {
        if !raw_marks.is_empty() {
            tracing::warn!("row {row}: invalid marks '{raw_marks}', using 0");
        }
        0.0
    });
    let co = normalize_co_tag(cell(columns.co));
    let module = normalize_module_tag(cell(columns.module));
    if co == UNASSIGNED && !cell(columns.co).is_empty() {
        tracing::warn!("row {row}: unreadable CO tag '{}'", cell(columns.co));
    }

    let classification = lexicon.classify(&text);
    let extra = columns
        .extra
        .iter()
        .map(|(idx, name)| (name.clone(), cell(Some(*idx)).to_string()))
        .collect::<BTreeMap<_, _>>();

    Question {
        text,
        marks,
        co,
        module,
        question_type: cell(columns.question_type).to_string(),
        verbs: classification.verbs,
        highest_verb: classification.highest_verb,
        level: classification.level,
        remark: None,
        extra,
    }
}

/// Parse a marks cell: `"5"`, `" 2.5 "`, `"10 marks"`, `"4M"`.
/// Negative or non-numeric values yield `None`.
pub fn parse_marks(raw: &str) -> Option<f64> {
    let lower = raw.trim().to_lowercase();
    let number = lower
        .strip_suffix("marks")
        .or_else(|| lower.strip_suffix("mark"))
        .or_else(|| lower.strip_suffix('m'))
        .unwrap_or(&lower)
        .trim();
    number
        .parse::<f64>()
        .ok()
        .filter(|m| m.is_finite() && *m >= 0.0)
}

/// `"CO2"`, `"co 2"`, `"2"` → `CO2`; anything without a number → `unassigned`.
pub fn normalize_co_tag(raw: &str) -> String {
    match first_number(raw) {
        Some(n) => format!("CO{n}"),
        None => UNASSIGNED.to_string(),
    }
}

/// `"M1"`, `"Module 1"`, `"1"` → `M1`; a name without a number is kept
/// verbatim; an empty cell → `unassigned`.
pub fn normalize_module_tag(raw: &str) -> String {
    let raw = raw.trim();
    match first_number(raw) {
        Some(n) => format!("M{n}"),
        None if !raw.is_empty() => raw.to_string(),
        None => UNASSIGNED.to_string(),
    }
}
