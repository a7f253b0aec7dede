//! Editor commands: every mutation of an in-progress CV goes through `EditorState::apply`.
//!
//! A command either applies completely or fails with `CommandError` and leaves the
//! state untouched. Any successful command marks the state dirty until it is saved.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::cv::{
    CertificationEntry, CvDocument, CvRow, EducationEntry, LanguageEntry, ProjectEntry,
    SkillEntry, Template, WorkEntry,
};

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown field '{field}' in {section}")]
    UnknownField { section: &'static str, field: String },

    #[error("{section} has no item at index {index} (length {len})")]
    IndexOutOfRange {
        section: &'static str,
        index: usize,
        len: usize,
    },

    #[error("field '{field}' expects a {expected}")]
    InvalidValue { field: String, expected: &'static str },
}

/// List sections of a CV that hold repeatable items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Experience,
    Education,
    Projects,
    Skills,
    Languages,
    Certifications,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CvCommand {
    SetPersonalField { field: String, value: String },
    SetSummary { value: String },
    AddItem { section: Section },
    UpdateItem {
        section: Section,
        index: usize,
        field: String,
        value: Value,
    },
    RemoveItem { section: Section, index: usize },
    MoveItem { section: Section, from: usize, to: usize },
    SetTemplate { template: Template },
    ReplaceDocument { document: CvDocument },
}

// ────────────────────────────────────────────────────────────────────────────
// Section items
// ────────────────────────────────────────────────────────────────────────────

trait SectionItem: Default {
    const SECTION: &'static str;

    fn set_field(&mut self, field: &str, value: &Value) -> Result<(), CommandError>;
}

fn text(field: &str, value: &Value) -> Result<String, CommandError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        _ => Err(CommandError::InvalidValue {
            field: field.to_string(),
            expected: "string",
        }),
    }
}

fn flag(field: &str, value: &Value) -> Result<bool, CommandError> {
    value.as_bool().ok_or_else(|| CommandError::InvalidValue {
        field: field.to_string(),
        expected: "boolean",
    })
}

fn unknown<T: SectionItem>(field: &str) -> CommandError {
    CommandError::UnknownField {
        section: T::SECTION,
        field: field.to_string(),
    }
}

impl SectionItem for WorkEntry {
    const SECTION: &'static str = "experience";

    fn set_field(&mut self, field: &str, value: &Value) -> Result<(), CommandError> {
        match field {
            "position" => self.position = text(field, value)?,
            "company" => self.company = text(field, value)?,
            "location" => self.location = text(field, value)?,
            "startDate" => self.start_date = text(field, value)?,
            "endDate" => self.end_date = text(field, value)?,
            "current" => self.current = flag(field, value)?,
            "description" => self.description = text(field, value)?,
            _ => return Err(unknown::<Self>(field)),
        }
        Ok(())
    }
}

impl SectionItem for EducationEntry {
    const SECTION: &'static str = "education";

    fn set_field(&mut self, field: &str, value: &Value) -> Result<(), CommandError> {
        match field {
            "degree" => self.degree = text(field, value)?,
            "institution" => self.institution = text(field, value)?,
            "location" => self.location = text(field, value)?,
            "startDate" => self.start_date = text(field, value)?,
            "endDate" => self.end_date = text(field, value)?,
            "description" => self.description = text(field, value)?,
            _ => return Err(unknown::<Self>(field)),
        }
        Ok(())
    }
}

impl SectionItem for ProjectEntry {
    const SECTION: &'static str = "projects";

    fn set_field(&mut self, field: &str, value: &Value) -> Result<(), CommandError> {
        match field {
            "name" => self.name = text(field, value)?,
            "link" => self.link = text(field, value)?,
            "description" => self.description = text(field, value)?,
            _ => return Err(unknown::<Self>(field)),
        }
        Ok(())
    }
}

impl SectionItem for SkillEntry {
    const SECTION: &'static str = "skills";

    fn set_field(&mut self, field: &str, value: &Value) -> Result<(), CommandError> {
        match field {
            "name" => self.name = text(field, value)?,
            "level" => self.level = text(field, value)?,
            _ => return Err(unknown::<Self>(field)),
        }
        Ok(())
    }
}

impl SectionItem for LanguageEntry {
    const SECTION: &'static str = "languages";

    fn set_field(&mut self, field: &str, value: &Value) -> Result<(), CommandError> {
        match field {
            "name" => self.name = text(field, value)?,
            "proficiency" => self.proficiency = text(field, value)?,
            _ => return Err(unknown::<Self>(field)),
        }
        Ok(())
    }
}

impl SectionItem for CertificationEntry {
    const SECTION: &'static str = "certifications";

    fn set_field(&mut self, field: &str, value: &Value) -> Result<(), CommandError> {
        match field {
            "name" => self.name = text(field, value)?,
            "issuer" => self.issuer = text(field, value)?,
            "date" => self.date = text(field, value)?,
            _ => return Err(unknown::<Self>(field)),
        }
        Ok(())
    }
}

fn check_index<T: SectionItem>(items: &[T], index: usize) -> Result<(), CommandError> {
    if index < items.len() {
        Ok(())
    } else {
        Err(CommandError::IndexOutOfRange {
            section: T::SECTION,
            index,
            len: items.len(),
        })
    }
}

fn update_item<T: SectionItem>(
    items: &mut [T],
    index: usize,
    field: &str,
    value: &Value,
) -> Result<(), CommandError> {
    check_index(items, index)?;
    items[index].set_field(field, value)
}

fn remove_item<T: SectionItem>(items: &mut Vec<T>, index: usize) -> Result<(), CommandError> {
    check_index(items, index)?;
    items.remove(index);
    Ok(())
}

fn move_item<T: SectionItem>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), CommandError> {
    check_index(items, from)?;
    check_index(items, to)?;
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

/// Runs `$body` with `$items` bound to the vector behind `$section`.
macro_rules! with_section {
    ($doc:expr, $section:expr, |$items:ident| $body:expr) => {
        match $section {
            Section::Experience => {
                let $items = &mut $doc.experience;
                $body
            }
            Section::Education => {
                let $items = &mut $doc.education;
                $body
            }
            Section::Projects => {
                let $items = &mut $doc.projects;
                $body
            }
            Section::Skills => {
                let $items = &mut $doc.skills;
                $body
            }
            Section::Languages => {
                let $items = &mut $doc.languages;
                $body
            }
            Section::Certifications => {
                let $items = &mut $doc.certifications;
                $body
            }
        }
    };
}

// ────────────────────────────────────────────────────────────────────────────
// Editor state
// ────────────────────────────────────────────────────────────────────────────

/// The in-progress CV handed explicitly to whoever needs it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub title: String,
    pub document: CvDocument,
    pub template: Template,
    pub is_dirty: bool,
}

impl EditorState {
    pub fn new(title: String, document: CvDocument, template: Template) -> Self {
        Self {
            title,
            document,
            template,
            is_dirty: false,
        }
    }

    /// Loads a stored row. Unparseable data or template names fall back to defaults.
    pub fn from_row(row: &CvRow) -> Self {
        let document = CvDocument::from_value(&row.data).unwrap_or_else(|e| {
            tracing::warn!(cv_id = %row.id, "stored CV data did not parse, starting empty: {e}");
            CvDocument::default()
        });
        let template = row.template.parse::<Template>().unwrap_or_else(|e| {
            tracing::warn!(cv_id = %row.id, "{e}; using classic");
            Template::default()
        });
        Self::new(row.title.clone(), document, template)
    }

    pub fn apply(&mut self, command: CvCommand) -> Result<(), CommandError> {
        let doc = &mut self.document;
        match command {
            CvCommand::SetPersonalField { field, value } => {
                let p = &mut doc.personal;
                let slot = match field.as_str() {
                    "fullName" => &mut p.full_name,
                    "jobTitle" => &mut p.job_title,
                    "email" => &mut p.email,
                    "phone" => &mut p.phone,
                    "location" => &mut p.location,
                    "website" => &mut p.website,
                    "linkedin" => &mut p.linkedin,
                    other => {
                        return Err(CommandError::UnknownField {
                            section: "personal",
                            field: other.to_string(),
                        })
                    }
                };
                *slot = value;
            }
            CvCommand::SetSummary { value } => doc.summary = value,
            CvCommand::AddItem { section } => with_section!(doc, section, |items| {
                items.push(Default::default())
            }),
            CvCommand::UpdateItem {
                section,
                index,
                field,
                value,
            } => with_section!(doc, section, |items| {
                update_item(items, index, &field, &value)?
            }),
            CvCommand::RemoveItem { section, index } => {
                with_section!(doc, section, |items| remove_item(items, index)?)
            }
            CvCommand::MoveItem { section, from, to } => {
                with_section!(doc, section, |items| move_item(items, from, to)?)
            }
            CvCommand::SetTemplate { template } => self.template = template,
            CvCommand::ReplaceDocument { document } => *doc = document,
        }
        self.is_dirty = true;
        Ok(())
    }

    pub fn mark_saved(&mut self) {
        self.is_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_with_two_jobs() -> EditorState {
        let mut state = EditorState::default();
        state.apply(CvCommand::AddItem { section: Section::Experience }).unwrap();
        state.apply(CvCommand::AddItem { section: Section::Experience }).unwrap();
        state
            .apply(CvCommand::UpdateItem {
                section: Section::Experience,
                index: 0,
                field: "company".to_string(),
                value: json!("First"),
            })
            .unwrap();
        state
            .apply(CvCommand::UpdateItem {
                section: Section::Experience,
                index: 1,
                field: "company".to_string(),
                value: json!("Second"),
            })
            .unwrap();
        state.mark_saved();
        state
    }

    #[test]
    fn test_set_personal_field_marks_dirty() {
        let mut state = EditorState::default();
        assert!(!state.is_dirty);
        state
            .apply(CvCommand::SetPersonalField {
                field: "fullName".to_string(),
                value: "Ada".to_string(),
            })
            .unwrap();
        assert_eq!(state.document.personal.full_name, "Ada");
        assert!(state.is_dirty);
        state.mark_saved();
        assert!(!state.is_dirty);
    }

    #[test]
    fn test_unknown_personal_field_is_rejected() {
        let mut state = EditorState::default();
        let err = state
            .apply(CvCommand::SetPersonalField {
                field: "age".to_string(),
                value: "40".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, CommandError::UnknownField { section: "personal", .. }));
        assert!(!state.is_dirty);
    }

    #[test]
    fn test_update_item_sets_boolean_field() {
        let mut state = state_with_two_jobs();
        state
            .apply(CvCommand::UpdateItem {
                section: Section::Experience,
                index: 1,
                field: "current".to_string(),
                value: json!(true),
            })
            .unwrap();
        assert!(state.document.experience[1].current);
    }

    #[test]
    fn test_update_item_wrong_type_leaves_state_untouched() {
        let mut state = state_with_two_jobs();
        let before = state.clone();
        let err = state
            .apply(CvCommand::UpdateItem {
                section: Section::Experience,
                index: 0,
                field: "current".to_string(),
                value: json!("yes"),
            })
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::InvalidValue {
                field: "current".to_string(),
                expected: "boolean"
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_index_out_of_range() {
        let mut state = state_with_two_jobs();
        let err = state
            .apply(CvCommand::RemoveItem {
                section: Section::Experience,
                index: 5,
            })
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::IndexOutOfRange {
                section: "experience",
                index: 5,
                len: 2
            }
        );
        assert!(!state.is_dirty);
    }

    #[test]
    fn test_unknown_item_field() {
        let mut state = EditorState::default();
        state.apply(CvCommand::AddItem { section: Section::Skills }).unwrap();
        let err = state
            .apply(CvCommand::UpdateItem {
                section: Section::Skills,
                index: 0,
                field: "years".to_string(),
                value: json!("5"),
            })
            .unwrap_err();
        assert!(matches!(err, CommandError::UnknownField { section: "skills", .. }));
    }

    #[test]
    fn test_move_and_remove_items() {
        let mut state = state_with_two_jobs();
        state
            .apply(CvCommand::MoveItem {
                section: Section::Experience,
                from: 1,
                to: 0,
            })
            .unwrap();
        assert_eq!(state.document.experience[0].company, "Second");

        state
            .apply(CvCommand::RemoveItem {
                section: Section::Experience,
                index: 0,
            })
            .unwrap();
        assert_eq!(state.document.experience.len(), 1);
        assert_eq!(state.document.experience[0].company, "First");
    }

    #[test]
    fn test_set_template_and_replace_document() {
        let mut state = state_with_two_jobs();
        state
            .apply(CvCommand::SetTemplate {
                template: Template::Creative,
            })
            .unwrap();
        assert_eq!(state.template, Template::Creative);

        state
            .apply(CvCommand::ReplaceDocument {
                document: CvDocument::default(),
            })
            .unwrap();
        assert!(state.document.experience.is_empty());
    }

    #[test]
    fn test_null_clears_text_field() {
        let mut state = state_with_two_jobs();
        state
            .apply(CvCommand::UpdateItem {
                section: Section::Experience,
                index: 0,
                field: "company".to_string(),
                value: Value::Null,
            })
            .unwrap();
        assert!(state.document.experience[0].company.is_empty());
    }

    #[test]
    fn test_command_json_shape() {
        let command: CvCommand = serde_json::from_value(json!({
            "type": "updateItem",
            "section": "education",
            "index": 0,
            "field": "degree",
            "value": "BSc"
        }))
        .unwrap();
        assert!(matches!(
            command,
            CvCommand::UpdateItem {
                section: Section::Education,
                ..
            }
        ));
    }
}
