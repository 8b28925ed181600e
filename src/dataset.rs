//! Tabular ingestion and typed experiment records
//!
//! A [`Table`] is a header row plus string cells, read with the `csv` crate.
//! Typed records ([`Participant`], [`Response`], [`FluencyEntry`]) are parsed
//! from tables only after every required column has been checked.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::labels::{Condition, Phase};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};
use std::path::Path;

pub const RESPONSES: &str = "responses";
pub const PARTICIPANTS: &str = "participants";
pub const FLUENCY: &str = "fluency";

/// In-memory table of named string columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    /// Read a headed CSV stream; cells are trimmed
    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self::new(name, headers, rows))
    }

    pub fn from_path(name: &str, path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(name, file)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column, or a [`AnalysisError::Schema`] naming it
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| AnalysisError::schema(&self.name, column))
    }

    /// Fail on the first required column that is absent
    pub fn require(&self, columns: &[&str]) -> Result<Vec<usize>> {
        columns.iter().map(|c| self.column_index(c)).collect()
    }

    /// Copy of this table with one column rewritten cell by cell
    pub fn map_column(&self, column: &str, f: impl Fn(&str) -> String) -> Result<Self> {
        let idx = self.column_index(column)?;
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                if let Some(cell) = row.get_mut(idx) {
                    *cell = f(cell);
                }
                row
            })
            .collect();
        Ok(Self::new(&self.name, self.headers.clone(), rows))
    }
}

/// Cell accessor tolerant of short (ragged) rows
fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// One experiment subject, with raw self-report fields kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub workerid: String,
    pub condition: Condition,
    pub attention_check: String,
    pub pre_creative: f64,
    pub post_creative: f64,
    pub pre_ai_sentiment: String,
    pub post_ai_sentiment: String,
    pub difficulty: String,
    pub helpfulness: String,
}

impl Participant {
    pub fn parse_table(table: &Table, config: &AnalysisConfig) -> Result<Vec<Self>> {
        let cols = &config.columns;
        let idx = table.require(&cols.all())?;
        let [id, cond, attn, pre_c, post_c, pre_ai, post_ai, diff, help] = idx[..] else {
            unreachable!("require returns one index per requested column")
        };

        let mut seen = BTreeSet::new();
        let mut participants = Vec::with_capacity(table.len());
        for row in table.rows() {
            let workerid = cell(row, id).to_string();
            if !seen.insert(workerid.clone()) {
                return Err(AnalysisError::DuplicateKey {
                    table: table.name().to_string(),
                    key: workerid,
                });
            }

            participants.push(Self {
                condition: config
                    .labels
                    .condition
                    .resolve(&cols.condition, cell(row, cond))?,
                attention_check: cell(row, attn).to_string(),
                pre_creative: parse_number(&cols.pre_creative, cell(row, pre_c))?,
                post_creative: parse_number(&cols.post_creative, cell(row, post_c))?,
                pre_ai_sentiment: cell(row, pre_ai).to_string(),
                post_ai_sentiment: cell(row, post_ai).to_string(),
                difficulty: cell(row, diff).to_string(),
                helpfulness: cell(row, help).to_string(),
                workerid,
            });
        }

        Ok(participants)
    }
}

/// One trial attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub workerid: String,
    pub phase: Phase,
    pub condition: Condition,
    pub is_correct: bool,
}

impl Response {
    /// Required columns; the id column follows the configured `workerid`
    pub fn columns(config: &AnalysisConfig) -> [&str; 4] {
        [
            config.columns.workerid.as_str(),
            "phase",
            "condition",
            "is_correct",
        ]
    }

    pub fn parse_table(table: &Table, config: &AnalysisConfig) -> Result<Vec<Self>> {
        let idx = table.require(&Self::columns(config))?;
        let [id, phase, cond, correct] = idx[..] else {
            unreachable!("require returns one index per requested column")
        };

        table
            .rows()
            .iter()
            .map(|row| -> Result<Self> {
                Ok(Self {
                    workerid: cell(row, id).to_string(),
                    phase: config.labels.phase.resolve("phase", cell(row, phase))?,
                    condition: config
                        .labels
                        .condition
                        .resolve("condition", cell(row, cond))?,
                    is_correct: parse_bool("is_correct", cell(row, correct))?,
                })
            })
            .collect()
    }
}

/// One word listed during the verbal-fluency task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FluencyEntry {
    pub workerid: String,
}

impl FluencyEntry {
    pub fn parse_table(table: &Table, config: &AnalysisConfig) -> Result<Vec<Self>> {
        let id = table.column_index(&config.columns.workerid)?;
        Ok(table
            .rows()
            .iter()
            .map(|row| Self {
                workerid: cell(row, id).to_string(),
            })
            .collect())
    }
}

/// A response with its participant's verbal-fluency score broadcast onto it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResponse {
    pub workerid: String,
    pub phase: Phase,
    pub condition: Condition,
    pub is_correct: bool,
    pub verbal_fluency: f64,
}

/// Count fluency entries per participant; participants without entries score 0
pub fn fluency_scores(
    participants: &[Participant],
    entries: &[FluencyEntry],
) -> BTreeMap<String, u32> {
    let mut scores: BTreeMap<String, u32> = participants
        .iter()
        .map(|p| (p.workerid.clone(), 0))
        .collect();

    for entry in entries {
        if let Some(count) = scores.get_mut(&entry.workerid) {
            *count += 1;
        }
    }

    scores
}

/// Attach each response's participant fluency score (0 when unknown)
pub fn join_fluency(
    responses: &[Response],
    scores: &BTreeMap<String, u32>,
) -> Vec<ScoredResponse> {
    responses
        .iter()
        .map(|r| ScoredResponse {
            workerid: r.workerid.clone(),
            phase: r.phase,
            condition: r.condition,
            is_correct: r.is_correct,
            verbal_fluency: f64::from(scores.get(&r.workerid).copied().unwrap_or(0)),
        })
        .collect()
}

fn parse_number(column: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AnalysisError::invalid(column, raw))
}

fn parse_bool(column: &str, raw: &str) -> Result<bool> {
    match raw {
        "1" | "true" | "True" | "TRUE" => Ok(true),
        "0" | "false" | "False" | "FALSE" => Ok(false),
        _ => Err(AnalysisError::invalid(column, raw)),
    }
}

/// The three raw input tables of one analysis
#[derive(Debug, Clone)]
pub struct RawTables {
    pub participants: Table,
    pub responses: Table,
    pub fluency: Table,
}

impl RawTables {
    pub fn from_paths(participants: &Path, responses: &Path, fluency: &Path) -> Result<Self> {
        Ok(Self {
            participants: Table::from_path(PARTICIPANTS, participants)?,
            responses: Table::from_path(RESPONSES, responses)?,
            fluency: Table::from_path(FLUENCY, fluency)?,
        })
    }
}
