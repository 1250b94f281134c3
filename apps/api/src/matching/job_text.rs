use crate::errors::AppError;
use crate::matching::models::JobPosting;
use crate::vector_store::{Metadata, VectorRecord};

/// The text a job posting is embedded from:
/// `"<title>. Jobdesk: <description>. Requirements: <r1>, <r2>"`.
/// Title and requirements are left out when absent.
pub fn embedding_text(posting: &JobPosting) -> String {
    let description = posting.description.trim().trim_end_matches('.');
    let mut text = match posting.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => format!("{title}. Jobdesk: {description}."),
        _ => format!("Jobdesk: {description}."),
    };

    let requirements: Vec<&str> = posting
        .requirements
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect();
    if !requirements.is_empty() {
        text.push_str(" Requirements: ");
        text.push_str(&requirements.join(", "));
    }
    text
}

pub fn validate(posting: &JobPosting) -> Result<(), AppError> {
    if posting.job_id.trim().is_empty() {
        return Err(AppError::Validation("jobId cannot be empty".to_string()));
    }
    if posting.description.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "job '{}' has an empty description",
            posting.job_id
        )));
    }
    Ok(())
}

/// The job-collection record for an embedded posting.
pub fn to_record(posting: &JobPosting, text: String, vector: Vec<f32>) -> VectorRecord {
    let mut metadata = Metadata::new();
    if let Some(title) = posting.title.as_deref().filter(|t| !t.trim().is_empty()) {
        metadata.insert("title".to_string(), title.trim().into());
    }
    VectorRecord {
        id: posting.job_id.trim().to_string(),
        vector,
        document: Some(text),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(title: Option<&str>, requirements: &[&str]) -> JobPosting {
        JobPosting {
            job_id: "j1".to_string(),
            title: title.map(str::to_string),
            description: "Build and operate payment APIs.".to_string(),
            requirements: requirements.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_embedding_text_with_title_and_requirements() {
        let text = embedding_text(&posting(Some("Backend Engineer"), &["Go", " ", "PostgreSQL"]));
        assert_eq!(
            text,
            "Backend Engineer. Jobdesk: Build and operate payment APIs. Requirements: Go, PostgreSQL"
        );
    }

    #[test]
    fn test_embedding_text_without_optional_parts() {
        assert_eq!(
            embedding_text(&posting(None, &[])),
            "Jobdesk: Build and operate payment APIs."
        );
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut p = posting(None, &[]);
        p.description = "  ".to_string();
        assert!(matches!(validate(&p), Err(AppError::Validation(_))));

        let mut p = posting(None, &[]);
        p.job_id = String::new();
        assert!(matches!(validate(&p), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_record_carries_title_metadata() {
        let record = to_record(&posting(Some("Backend Engineer"), &[]), "t".into(), vec![1.0]);
        assert_eq!(record.id, "j1");
        assert_eq!(record.metadata["title"], "Backend Engineer");
        assert!(to_record(&posting(None, &[]), "t".into(), vec![1.0]).metadata.is_empty());
    }
}
