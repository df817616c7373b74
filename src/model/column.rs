use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::task::{TaskStatus, UnknownStatus};

/// A visible board column. `CANCELED` has no column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Column {
    Pending,
    InProgress,
    Completed,
}

impl Column {
    /// Columns in display order (left to right)
    pub const ALL: [Column; 3] = [Column::Pending, Column::InProgress, Column::Completed];

    /// The status a task has while it sits in this column
    pub fn status(self) -> TaskStatus {
        match self {
            Column::Pending => TaskStatus::Pending,
            Column::InProgress => TaskStatus::InProgress,
            Column::Completed => TaskStatus::Completed,
        }
    }

    /// The column a status renders in, if any
    pub fn for_status(status: TaskStatus) -> Option<Column> {
        match status {
            TaskStatus::Pending => Some(Column::Pending),
            TaskStatus::InProgress => Some(Column::InProgress),
            TaskStatus::Completed => Some(Column::Completed),
            TaskStatus::Canceled => None,
        }
    }

    pub fn label(self) -> &'static str {
        self.status().label()
    }

    /// Position in display order
    pub fn index(self) -> usize {
        match self {
            Column::Pending => 0,
            Column::InProgress => 1,
            Column::Completed => 2,
        }
    }

    pub fn from_index(idx: usize) -> Option<Column> {
        Self::ALL.get(idx).copied()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status().as_str())
    }
}

/// Error for a column name that is not a visible column
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColumnParseError {
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
    #[error("{0} has no column on the board")]
    NotOnBoard(TaskStatus),
}

impl FromStr for Column {
    type Err = ColumnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status: TaskStatus = s.parse()?;
        Column::for_status(status).ok_or(ColumnParseError::NotOnBoard(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_status_round_trip() {
        for column in Column::ALL {
            assert_eq!(Column::for_status(column.status()), Some(column));
        }
        assert_eq!(Column::for_status(TaskStatus::Canceled), None);
    }

    #[test]
    fn test_column_from_str() {
        assert_eq!("IN_PROGRESS".parse::<Column>(), Ok(Column::InProgress));
        assert_eq!(
            "canceled".parse::<Column>(),
            Err(ColumnParseError::NotOnBoard(TaskStatus::Canceled))
        );
        assert!("nope".parse::<Column>().is_err());
    }

    #[test]
    fn test_column_index_order() {
        assert_eq!(Column::from_index(0), Some(Column::Pending));
        assert_eq!(Column::from_index(2), Some(Column::Completed));
        assert_eq!(Column::from_index(3), None);
        assert_eq!(Column::Completed.index(), 2);
    }
}
