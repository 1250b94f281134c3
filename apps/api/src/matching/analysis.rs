//! Maps free-form model output onto the `AnalysisReport` schema.
//!
//! Required keys: `relevance_score` (or `cv_relevance_score`), `matched_skills`,
//! `gap_skills`. Anything else is optional. Output that cannot be mapped becomes
//! `AnalysisOutcome::Unparsed` carrying the raw text.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::llm_client::strip_code_fences;
use crate::matching::models::{AnalysisOutcome, AnalysisReport};

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(alias = "cv_relevance_score")]
    relevance_score: Score,
    matched_skills: Vec<String>,
    gap_skills: Vec<String>,
    #[serde(default)]
    suggestions: Vec<RawSuggestion>,
    #[serde(default, alias = "analysis_explanation")]
    explanation: Option<String>,
    #[serde(default, alias = "skill_identification_dict")]
    skill_scores: BTreeMap<String, Score>,
}

/// A score given as a JSON number or as a numeric string such as `"85"`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(try_from = "ScoreRepr")]
struct Score(f64);

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScoreRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<ScoreRepr> for Score {
    type Error = String;

    fn try_from(repr: ScoreRepr) -> Result<Self, Self::Error> {
        let value = match repr {
            ScoreRepr::Number(n) => n,
            ScoreRepr::Text(text) => {
                let trimmed = text.trim().trim_end_matches('%').trim_end();
                trimmed
                    .parse::<f64>()
                    .map_err(|_| format!("score {text:?} is not a number"))?
            }
        };
        if !value.is_finite() {
            return Err(format!("score {value} is not finite"));
        }
        Ok(Score(value))
    }
}

/// Models sometimes return suggestions as `{keypoint, explanation}` objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSuggestion {
    Text(String),
    Detailed {
        keypoint: String,
        #[serde(default, alias = "penjelasan")]
        explanation: Option<String>,
    },
}

impl RawSuggestion {
    fn into_text(self) -> String {
        match self {
            RawSuggestion::Text(text) => text,
            RawSuggestion::Detailed {
                keypoint,
                explanation: Some(explanation),
            } if !explanation.trim().is_empty() => format!("{keypoint}: {explanation}"),
            RawSuggestion::Detailed { keypoint, .. } => keypoint,
        }
    }
}

pub fn parse_analysis(
    raw_text: &str,
    cv_id: Option<String>,
    job_id: Option<String>,
) -> AnalysisOutcome {
    let unparsed = |reason: String| AnalysisOutcome::Unparsed {
        raw_text: raw_text.trim().to_string(),
        reason,
    };

    let Some(json) = extract_json_object(strip_code_fences(raw_text)) else {
        return unparsed("no JSON object in model output".to_string());
    };

    let raw: RawAnalysis = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => return unparsed(e.to_string()),
    };

    AnalysisOutcome::Parsed(AnalysisReport {
        cv_id,
        job_id,
        relevance_score: to_percent(raw.relevance_score.0),
        matched_skills: clean_list(raw.matched_skills),
        gap_skills: clean_list(raw.gap_skills),
        suggestions: clean_list(raw.suggestions.into_iter().map(RawSuggestion::into_text).collect()),
        explanation: raw.explanation.filter(|e| !e.trim().is_empty()),
        skill_scores: raw
            .skill_scores
            .into_iter()
            .map(|(skill, score)| (skill, to_percent(score.0)))
            .collect(),
    })
}

/// The text from the first `{` to the last `}`, inclusive.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn to_percent(score: f64) -> u8 {
    score.clamp(0.0, 100.0).round() as u8
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
