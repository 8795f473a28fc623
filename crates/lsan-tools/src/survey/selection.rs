use super::table::{ResponseTable, SubjectId};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Which subjects to keep from a response table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectSelector {
    Ids(Vec<SubjectId>),
    /// Newline-delimited file of subject identifiers.
    File(PathBuf),
}

impl SubjectSelector {
    /// Interpret command-line input: anything shaped like a path (a separator
    /// or a `.txt`/`.csv`/`.tsv` extension) must be an existing ID file,
    /// anything else is a comma-separated list of IDs. A bare `101` is always
    /// an ID, even when a file of that name exists.
    pub fn parse(raw: &str) -> Result<Self, SelectionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SelectionError::InvalidSubjectSelector {
                selector: raw.to_string(),
                reason: "no subjects given".to_string(),
            });
        }

        if looks_like_path(trimmed) {
            let path = Path::new(trimmed);
            if !path.is_file() {
                return Err(SelectionError::InvalidSubjectSelector {
                    selector: raw.to_string(),
                    reason: "no such subject ID file".to_string(),
                });
            }
            return Ok(Self::File(path.to_path_buf()));
        }

        let ids: Vec<SubjectId> = trimmed
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(SubjectId::from)
            .collect();

        if ids.is_empty() {
            return Err(SelectionError::InvalidSubjectSelector {
                selector: raw.to_string(),
                reason: "no subject IDs in comma-separated list".to_string(),
            });
        }

        Ok(Self::Ids(ids))
    }

    pub fn resolve(&self) -> Result<Vec<SubjectId>, SelectionError> {
        match self {
            Self::Ids(ids) => Ok(ids.clone()),
            Self::File(path) => {
                info!(path = %path.display(), "reading subject IDs from file");
                let contents = fs::read_to_string(path).map_err(|err| {
                    SelectionError::InvalidSubjectSelector {
                        selector: path.display().to_string(),
                        reason: err.to_string(),
                    }
                })?;
                Ok(contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(SubjectId::from)
                    .collect())
            }
        }
    }
}

fn looks_like_path(raw: &str) -> bool {
    raw.contains(['/', '\\'])
        || [".txt", ".csv", ".tsv"]
            .iter()
            .any(|extension| raw.ends_with(extension))
}

impl ResponseTable {
    /// Keep only the selected subjects, in selector order.
    pub fn select(&self, selector: &SubjectSelector) -> Result<ResponseTable, SelectionError> {
        let ids = selector.resolve()?;
        let mut seen = HashSet::with_capacity(ids.len());
        let mut rows = Vec::with_capacity(ids.len());

        for id in ids {
            let row = self
                .row_of(&id)
                .ok_or_else(|| SelectionError::UnknownSubject(id.clone()))?;
            if !seen.insert(row) {
                return Err(SelectionError::DuplicateSubject(id));
            }
            rows.push(row);
        }

        info!(
            selected = rows.len(),
            available = self.n_subjects(),
            "selected subjects"
        );
        Ok(self.take_rows(&rows))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("invalid subject selector '{selector}': {reason}")]
    InvalidSubjectSelector { selector: String, reason: String },
    #[error("subject '{0}' is not in the response table")]
    UnknownSubject(SubjectId),
    #[error("subject '{0}' is selected more than once")]
    DuplicateSubject(SubjectId),
}
