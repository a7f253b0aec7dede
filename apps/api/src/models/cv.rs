use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Persisted row
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvRow {
    pub id: Uuid,
    pub title: String,
    pub template: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing projection of `cvs` (no document payload).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvSummaryRow {
    pub id: Uuid,
    pub title: String,
    pub template: String,
    pub updated_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Templates
// ────────────────────────────────────────────────────────────────────────────

/// Visual template a CV is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Classic,
    Modern,
    Minimal,
    Creative,
}

impl Template {
    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Classic => "classic",
            Template::Modern => "modern",
            Template::Minimal => "minimal",
            Template::Creative => "creative",
        }
    }

    /// Only the classic template pushes blocks across virtual page boundaries.
    /// The others flow continuously and are clipped into pages as-is.
    pub fn paginates(&self) -> bool {
        matches!(self, Template::Classic)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Template::Classic),
            "modern" => Ok(Template::Modern),
            "minimal" => Ok(Template::Minimal),
            "creative" => Ok(Template::Creative),
            other => Err(format!("unknown template '{other}'")),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

/// The full CV as edited in the browser form and stored as JSONB.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvDocument {
    pub personal: PersonalInfo,
    pub summary: String,
    pub experience: Vec<WorkEntry>,
    pub education: Vec<EducationEntry>,
    pub projects: Vec<ProjectEntry>,
    pub skills: Vec<SkillEntry>,
    pub languages: Vec<LanguageEntry>,
    pub certifications: Vec<CertificationEntry>,
}

impl CvDocument {
    /// Parses the JSONB column, tolerating documents saved by older clients
    /// (missing sections fall back to empty).
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub job_title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub website: String,
    pub linkedin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkEntry {
    pub position: String,
    pub company: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    /// Rich text from the editor widget (light HTML).
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectEntry {
    pub name: String,
    pub link: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillEntry {
    pub name: String,
    pub level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LanguageEntry {
    pub name: String,
    pub proficiency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificationEntry {
    pub name: String,
    pub issuer: String,
    pub date: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_parse_is_case_insensitive() {
        assert_eq!("Classic".parse::<Template>().unwrap(), Template::Classic);
        assert_eq!(" modern ".parse::<Template>().unwrap(), Template::Modern);
        assert!("fancy".parse::<Template>().is_err());
    }

    #[test]
    fn test_only_classic_paginates() {
        assert!(Template::Classic.paginates());
        assert!(!Template::Modern.paginates());
        assert!(!Template::Minimal.paginates());
        assert!(!Template::Creative.paginates());
    }

    #[test]
    fn test_document_accepts_partial_json() {
        let doc = CvDocument::from_value(&json!({
            "personal": { "fullName": "Ada Lovelace" },
            "experience": [{ "position": "Analyst", "current": true }]
        }))
        .unwrap();
        assert_eq!(doc.personal.full_name, "Ada Lovelace");
        assert_eq!(doc.experience.len(), 1);
        assert!(doc.experience[0].current);
        assert!(doc.education.is_empty());
        assert!(doc.summary.is_empty());
    }

    #[test]
    fn test_document_serializes_camel_case() {
        let mut doc = CvDocument::default();
        doc.personal.job_title = "Engineer".to_string();
        let value = doc.to_value();
        assert_eq!(value["personal"]["jobTitle"], "Engineer");
    }
}
