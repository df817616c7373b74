use crate::model::task::{Task, TaskPayload, TaskStatus};

pub const MIN_TITLE_LEN: usize = 2;
pub const MIN_DETAILS_LEN: usize = 5;
pub const MIN_AUTHOR_LEN: usize = 5;

/// A field of the create/edit form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Title,
    Details,
    Author,
    Status,
}

impl FormField {
    /// Fields in form order
    pub const ALL: [FormField; 4] = [
        FormField::Title,
        FormField::Details,
        FormField::Author,
        FormField::Status,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::Details => "details",
            FormField::Author => "author",
            FormField::Status => "status",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Details => "Details",
            FormField::Author => "Author",
            FormField::Status => "Status",
        }
    }

    pub fn next(self) -> FormField {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> FormField {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

/// Every failing field of a form submission
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("invalid task: {}", join_messages(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Message for one field, if that field failed
    pub fn message_for(&self, field: FormField) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn push(&mut self, field: FormField, message: String) {
        self.errors.push(FieldError { field, message });
    }
}


/// Raw create/edit form input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub details: String,
    pub author: String,
    /// Status wire name; empty when nothing is selected
    pub status: String,
}

impl TaskForm {
    /// An empty create form with `PENDING` preselected
    pub fn blank() -> Self {
        TaskForm {
            status: TaskStatus::Pending.as_str().to_string(),
            ..Default::default()
        }
    }

    /// An edit form prefilled with the task's current values
    pub fn from_task(task: &Task) -> Self {
        TaskForm {
            title: task.title.clone(),
            details: task.details.clone(),
            author: task.author.clone(),
            status: task
                .status
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    /// Mutable access to a text field; `None` for the status selector
    pub fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Title => Some(&mut self.title),
            FormField::Details => Some(&mut self.details),
            FormField::Author => Some(&mut self.author),
            FormField::Status => None,
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Details => &self.details,
            FormField::Author => &self.author,
            FormField::Status => &self.status,
        }
    }

    /// Step the status selector forward or backward through all four values
    pub fn cycle_status(&mut self, forward: bool) {
        let next = match self.status.parse::<TaskStatus>() {
            Ok(s) if forward => s.next(),
            Ok(s) => s.prev(),
            Err(_) => TaskStatus::Pending,
        };
        self.status = next.as_str().to_string();
    }

    /// Check every field and build the request payload. All failures are
    /// reported together.
    pub fn validate(&self) -> Result<TaskPayload, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        check_min_len(&mut errors, FormField::Title, &self.title, MIN_TITLE_LEN);
        check_min_len(&mut errors, FormField::Details, &self.details, MIN_DETAILS_LEN);
        check_min_len(&mut errors, FormField::Author, &self.author, MIN_AUTHOR_LEN);

        let status = match self.status.parse::<TaskStatus>() {
            Ok(s) => Some(s),
            Err(_) => {
                errors.push(
                    FormField::Status,
                    "status must be one of PENDING, IN_PROGRESS, COMPLETED, CANCELED".into(),
                );
                None
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TaskPayload {
            title: Some(self.title.clone()),
            details: Some(self.details.clone()),
            author: Some(self.author.clone()),
            status,
        })
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    let parts: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    parts.join("; ")
}

/// Lengths are UTF-16 code units, the way the web form counts them: an emoji
/// outside the Basic Multilingual Plane counts twice.
fn check_min_len(errors: &mut ValidationErrors, field: FormField, value: &str, min: usize) {
    if value.encode_utf16().count() < min {
        errors.push(
            field,
            format!("{} must be at least {} characters", field.name(), min),
        );
    }
}
