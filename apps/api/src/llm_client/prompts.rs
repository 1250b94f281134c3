// Shared prompt fragments.
// Each module that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Output must follow the language the candidate wrote their CV in.
pub const LANGUAGE_INSTRUCTION: &str = "\
    Detect the primary language of the CV and write EVERY output field in that language. \
    Ignore the language of the job posting. Never mix languages.";
