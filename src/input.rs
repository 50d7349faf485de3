//! Line-oriented preference input: `<id>,<cost_1>,...,<cost_n>`.

use std::io::{self, BufRead};

use thiserror::Error;
use tracing::debug;

use crate::model::entity::{Cost, Participant, MAX_COST};

/// Sample document printed by `--example`.
pub const EXAMPLE: &str = "\
jack,1,5,6,2,3
jill,6,2,4,6,2
paul,3,3,5,2,1
will,2,9,7,4,3
jenn,5,6,3,7,1
";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("preference count in line #{line} is different from previous: {found} != {expected} (previous)")]
    FieldCount { line: usize, found: usize, expected: usize },

    #[error("line #{line}, column {column}: '{value}' is not an integer cost")]
    InvalidCost { line: usize, column: usize, value: String },

    #[error("line #{line}, column {column}: cost {value} is outside [-{MAX_COST}, {MAX_COST}]")]
    CostOutOfRange { line: usize, column: usize, value: Cost },

    #[error("line #{line}: participant '{id}' has no preferences")]
    MissingPreferences { line: usize, id: String },

    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// Parses a single non-empty line.
pub fn parse_line(line: usize, text: &str) -> Result<Participant, ParseError> {
    let mut fields = text.split(',').map(str::trim);
    let id = fields.next().unwrap_or_default().to_string();
    let preferences = fields
        .enumerate()
        .map(|(i, field)| -> Result<Cost, ParseError> {
            let value = field.parse::<Cost>().map_err(|_| ParseError::InvalidCost {
                line,
                column: i + 2,
                value: field.to_string(),
            })?;
            if value.unsigned_abs() > MAX_COST.unsigned_abs() {
                return Err(ParseError::CostOutOfRange { line, column: i + 2, value });
            }
            Ok(value)
        })
        .collect::<Result<Vec<_>, _>>()?;
    if preferences.is_empty() {
        return Err(ParseError::MissingPreferences { line, id });
    }
    Ok(Participant::new(id, preferences))
}

/// Reads all participants. Blank lines are skipped; every other line must
/// carry as many costs as the first one.
pub fn read_participants<R: BufRead>(reader: R) -> Result<Vec<Participant>, ParseError> {
    let mut participants: Vec<Participant> = Vec::new();
    for (index, text) in reader.lines().enumerate() {
        let text = text?;
        if text.trim().is_empty() {
            continue;
        }
        let line = index + 1;
        let participant = parse_line(line, &text)?;
        if let Some(first) = participants.first() {
            if participant.preferences.len() != first.preferences.len() {
                return Err(ParseError::FieldCount {
                    line,
                    found: participant.preferences.len(),
                    expected: first.preferences.len(),
                });
            }
        }
        participants.push(participant);
    }
    debug!(count = participants.len(), "read participants");
    Ok(participants)
}
