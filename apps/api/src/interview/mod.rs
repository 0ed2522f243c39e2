// Interview preparation: turns resume text plus job context into interview
// questions and a skill-proficiency assessment.
// All model calls go through llm_client; no direct Gemini calls here.

pub mod handlers;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompts;
