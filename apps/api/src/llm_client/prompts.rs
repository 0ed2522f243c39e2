// Shared prompt fragments.
// Each module that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting instructions.

/// Opening line used by every interview prompt.
pub const INTERVIEWER_PERSONA: &str = "Act as an expert technical interviewer and recruiter.";

/// Instruction appended to prompts whose reply must be machine-parseable JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction for replies parsed as a numbered list.
pub const NUMBERED_LIST_INSTRUCTION: &str = "\
    Write each question on its own line, prefixed with its number and a period \
    (for example \"1. \"). Do not add headings or commentary between questions.";
