use std::fmt;
use std::io::Read;

use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{EmploymentType, JobDraft, JobRequirements, SalaryRange, Workplace};

pub const DEFAULT_CURRENCY: &str = "EUR";

/// A rejected CSV row. `line` is the 1-based line number in the upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub line: u64,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

#[derive(Debug)]
pub enum ImportError {
    Csv(csv::Error),
    Rows(Vec<RowError>),
    Empty,
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Csv(err) => write!(f, "failed to read CSV: {err}"),
            ImportError::Rows(rows) => {
                write!(f, "{} row(s) rejected", rows.len())?;
                for row in rows {
                    write!(f, "; {row}")?;
                }
                Ok(())
            }
            ImportError::Empty => write!(f, "CSV upload contains no jobs"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Csv(err) => Some(err),
            ImportError::Rows(_) | ImportError::Empty => None,
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Csv(err)
    }
}

/// Rows that parsed, keyed by line, next to the rows that did not.
#[derive(Debug, Default)]
pub(crate) struct ParsedUpload {
    pub(crate) drafts: Vec<(u64, JobDraft)>,
    pub(crate) errors: Vec<RowError>,
}

/// Parse every row into a draft, collecting per-row failures instead of
/// stopping at the first one. Only unreadable or empty uploads fail outright.
pub(crate) fn parse_drafts<R: Read>(reader: R) -> Result<ParsedUpload, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut drafts = Vec::new();
    let mut errors = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let parsed = record
            .deserialize::<JobRow>(Some(&headers))
            .map_err(|err| err.to_string())
            .and_then(JobRow::into_draft);

        match parsed {
            Ok(draft) => drafts.push((line, draft)),
            Err(message) => errors.push(RowError { line, message }),
        }
    }

    if drafts.is_empty() && errors.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(ParsedUpload { drafts, errors })
}

#[derive(Debug, Deserialize)]
struct JobRow {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    location: String,
    employment_type: String,
    workplace: String,
    #[serde(default)]
    skills: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    min_experience_years: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    salary_min: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    salary_max: Option<String>,
}

impl JobRow {
    fn into_draft(self) -> Result<JobDraft, String> {
        let employment_type: EmploymentType = self.employment_type.parse()?;
        let workplace: Workplace = self.workplace.parse()?;
        let min_experience_years = parse_number("min_experience_years", self.min_experience_years)?;

        let salary = match (
            parse_number("salary_min", self.salary_min)?,
            parse_number("salary_max", self.salary_max)?,
        ) {
            (Some(min), Some(max)) => Some(SalaryRange {
                min,
                max,
                currency: DEFAULT_CURRENCY.to_string(),
            }),
            (None, None) => None,
            _ => return Err("salary_min and salary_max must be given together".to_string()),
        };

        Ok(JobDraft {
            title: self.title,
            description: self.description,
            location: self.location,
            employment_type,
            workplace,
            requirements: JobRequirements {
                skills: self.skills.split(';').map(str::to_string).collect(),
                min_experience_years: min_experience_years.unwrap_or_default(),
                ..JobRequirements::default()
            },
            salary,
        })
    }
}

fn parse_number(column: &str, value: Option<String>) -> Result<Option<u32>, String> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| format!("{column} must be a whole number, got `{raw}`"))
        })
        .transpose()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
