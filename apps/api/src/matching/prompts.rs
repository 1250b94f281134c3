// Prompts for CV analysis and cover-letter generation.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, LANGUAGE_INSTRUCTION};

pub const ANALYSIS_SYSTEM_ROLE: &str =
    "You are an expert talent acquisition analyst. You compare a candidate's CV \
    against a job posting and give concrete advice for improving the CV for that posting.";

/// Analysis prompt template. Replace `{cv_text}` and `{job_description}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Compare the CV below against the job posting.

Return a JSON object with this EXACT schema:
{
  "relevance_score": 72,
  "matched_skills": ["Go", "PostgreSQL"],
  "gap_skills": ["Kubernetes"],
  "suggestions": ["Add the Kubernetes deployment work from your last role to the skills section"],
  "analysis_explanation": "One paragraph on overall fit, key strengths and critical gaps.",
  "skill_scores": {"Go": 85, "Kubernetes": 10}
}

Scoring rules for relevance_score (0-100):
- Technical skills match: 40%
- Experience relevance: 35%
- Education and certifications: 15%
- Soft skills and culture fit: 10%

Rules:
- matched_skills: requirements the CV gives evidence for.
- gap_skills: requirements the CV does not show. Never invent experience.
- suggestions: at most 5 immediate CV edits, not long-term learning plans.
- skill_scores: one entry per job requirement, 0 meaning no evidence in the CV.

CV:
{cv_text}

JOB POSTING:
{job_description}"#;

pub const COVER_LETTER_SYSTEM_ROLE: &str =
    "You are a senior career coach and copywriter. You write personalised, \
    ATS-friendly cover letters grounded strictly in the candidate's CV.";

/// Cover-letter prompt template. Replace `{cv_text}`, `{job_description}`,
/// `{current_date}` and `{specific_request}` before sending.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a cover letter for the candidate below applying to the job posting.

Output format:
- Plain text only. No markdown, no HTML, no code fences.
- Separate paragraphs with one blank line.
- Start with the date line "{current_date}", then the salutation.
- Three to four body paragraphs, under 400 words in total.
- End with a sign-off line followed by the candidate's name on the next line.

Content rules:
- Use only facts present in the CV. Never invent employers, numbers or skills.
- Mirror the job posting's key requirements where the CV supports them.

Additional request from the candidate: {specific_request}

CV:
{cv_text}

JOB POSTING:
{job_description}"#;

pub fn analysis_system() -> String {
    format!("{ANALYSIS_SYSTEM_ROLE}\n\n{LANGUAGE_INSTRUCTION}\n\n{JSON_ONLY_INSTRUCTION}")
}

pub fn analysis_prompt(cv_text: &str, job_description: &str) -> String {
    fill_template(
        ANALYSIS_PROMPT_TEMPLATE,
        &[("cv_text", cv_text), ("job_description", job_description)],
    )
}

pub fn cover_letter_system() -> String {
    format!("{COVER_LETTER_SYSTEM_ROLE}\n\n{LANGUAGE_INSTRUCTION}")
}

pub fn cover_letter_prompt(
    cv_text: &str,
    job_description: &str,
    current_date: &str,
    specific_request: Option<&str>,
) -> String {
    let request = specific_request
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("none");
    fill_template(
        COVER_LETTER_PROMPT_TEMPLATE,
        &[
            ("current_date", current_date),
            ("specific_request", request),
            ("cv_text", cv_text),
            ("job_description", job_description),
        ],
    )
}

/// Substitutes `{name}` placeholders in a single pass over `template`.
/// Inserted values are never rescanned. Unknown braces are copied as-is.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = values.iter().find(|(name, _)| {
            after
                .strip_prefix(name)
                .is_some_and(|tail| tail.starts_with('}'))
        });
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &after[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
