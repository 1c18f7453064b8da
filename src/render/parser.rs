//! Placeholder block parser.
//!
//! A block marks one user-fillable field inside otherwise literal text:
//!
//! ```text
//! #############
//! title: Customer name
//! description: Full legal name, as printed on the contract
//! #############
//! ```
//!
//! Blocks are numbered by position (`field-1`, `field-2`, ...), so inserting
//! or removing a block renumbers every block after it.

use regex::Regex;
use serde::Serialize;
use std::{collections::HashMap, fmt, ops::Range, sync::LazyLock};

/// Delimiter run that opens and closes a block.
pub const DELIMITER: &str = "#############";

static BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#############\s*title:\s*([^\n]+)\s*description:\s*([^#]+)\s*#############")
        .expect("block pattern is valid")
});

/// A user-fillable field discovered in a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// A recognized block together with its byte range in the source.
#[derive(Debug, Clone)]
pub struct Block {
    pub field: Field,
    pub span: Range<usize>,
}

/// Scan `input` left to right for well-formed blocks.
///
/// Partial blocks (no closing delimiter, missing `title:` or `description:`)
/// do not match and are treated as literal text.
pub fn blocks(input: &str) -> Vec<Block> {
    BLOCK
        .captures_iter(input)
        .enumerate()
        .map(|(i, caps)| Block {
            field: Field {
                id: format!("field-{}", i + 1),
                title: caps[1].trim().to_owned(),
                description: caps[2].trim().to_owned(),
            },
            span: caps.get(0).map_or(0..0, |m| m.range()),
        })
        .collect()
}

/// Fields of every block in `input`, in document order.
pub fn extract_fields(input: &str) -> Vec<Field> {
    blocks(input).into_iter().map(|b| b.field).collect()
}

/// Escape `text` so it matches itself literally inside a pattern.
pub fn escape_literal(text: &str) -> String {
    regex::escape(text)
}

/// Pattern that matches the block `field` was extracted from.
///
/// Built from the trimmed title and description, so it only finds the
/// block while that text is unchanged.
pub fn field_pattern(field: &Field) -> String {
    format!(
        r"{DELIMITER}\s*title:\s*{}\s*description:\s*{}\s*{DELIMITER}",
        escape_literal(&field.title),
        escape_literal(&field.description),
    )
}

/// Something in a template that parses but is likely a mistake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// Two blocks share title and description; filling may hit the wrong one.
    DuplicateBlock { first: String, second: String },
    /// A delimiter run outside any recognized block (1-based line).
    StrayDelimiter { line: usize },
}

impl Issue {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateBlock { .. })
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateBlock { first, second } => {
                write!(f, "{second} repeats the title and description of {first}")
            }
            Self::StrayDelimiter { line } => {
                write!(f, "line {line}: delimiter is not part of a complete block")
            }
        }
    }
}

/// Report duplicate blocks and delimiters that belong to no block.
pub fn lint(input: &str) -> Vec<Issue> {
    let blocks = blocks(input);
    let mut issues = Vec::new();

    let mut seen: HashMap<(&str, &str), &str> = HashMap::new();
    for b in &blocks {
        let key = (b.field.title.as_str(), b.field.description.as_str());
        match seen.get(&key) {
            Some(first) => issues.push(Issue::DuplicateBlock {
                first: (*first).to_owned(),
                second: b.field.id.clone(),
            }),
            None => {
                seen.insert(key, &b.field.id);
            }
        }
    }

    let mut last_stray_line = None;
    for (at, _) in input.match_indices(DELIMITER) {
        let end = at + DELIMITER.len();
        let claimed = blocks
            .iter()
            .any(|b| at < b.span.end && end > b.span.start);
        if claimed {
            continue;
        }
        let line = input[..at].matches('\n').count() + 1;
        // A long run of `#` yields several delimiters on one line.
        if last_stray_line != Some(line) {
            issues.push(Issue::StrayDelimiter { line });
            last_stray_line = Some(line);
        }
    }

    issues
}
