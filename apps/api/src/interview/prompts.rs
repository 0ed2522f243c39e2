// All LLM prompt templates for the interview pipeline.
// Reuses cross-cutting fragments from llm_client::prompts.
//
// The question template asks for a numbered list; parser::parse_questions
// depends on that format. Change both together.

use crate::interview::models::GenerationRequest;
use crate::llm_client::prompts::{
    INTERVIEWER_PERSONA, JSON_ONLY_INSTRUCTION, NUMBERED_LIST_INSTRUCTION,
};

const NO_JOB_DESCRIPTION: &str = "(not provided; infer typical requirements for the role)";

/// Question generation template.
/// Placeholders: {persona}, {role}, {document_text}, {job_description}, {format_instruction}
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"{persona} Analyze this resume and job description for a {role} position.

Candidate Resume:
{document_text}

Job Description:
{job_description}

Generate exactly 10 technical interview questions that:
1. Focus on overlapping technical requirements between the resume and the job description
2. Probe areas where the resume's experience directly matches the job description's key requirements
3. Explore technologies mentioned in both documents (prioritizing the job description's primary tech stack)
4. Highlight important job requirements that are missing or weak in the resume
5. Include scenario-based questions grounded in the candidate's stated experience

Format requirements:
- Order the questions by relevance to the job description, most relevant first
- Include at least 2 questions about potential skill gaps
- Avoid generic questions; reference specific technologies and experiences
- {format_instruction}"#;

/// Skill assessment template.
/// Placeholders: {persona}, {role}, {document_text}, {job_description}, {json_instruction}
pub const SKILL_PROMPT_TEMPLATE: &str = r#"{persona} Assess the technical skills in the following resume for a {role} position.

Candidate Resume:
{document_text}

Job Description:
{job_description}

Instructions:
1. Identify the technical skills mentioned in the resume.
2. Rate each skill's proficiency as a whole-number percentage from 0 to 100, based on context, experience and frequency of mention.
3. Order the skills by relevance to the {role} position, most relevant first.

Respond with ONLY this structure:
{
  "skills": [
    { "skill": "JavaScript", "proficiency": "92%" },
    { "skill": "React", "proficiency": "88%" }
  ]
}

{json_instruction}"#;

/// Builds the question generation prompt. Pure: identical input, identical output.
pub fn build_question_prompt(request: &GenerationRequest) -> String {
    fill_template(
        QUESTION_PROMPT_TEMPLATE,
        &[
            ("persona", INTERVIEWER_PERSONA),
            ("role", request.role.trim()),
            ("document_text", request.document_text.trim()),
            ("job_description", job_description_or_default(request)),
            ("format_instruction", NUMBERED_LIST_INSTRUCTION),
        ],
    )
}

/// Builds the skill assessment prompt. Pure: identical input, identical output.
pub fn build_skill_prompt(request: &GenerationRequest) -> String {
    fill_template(
        SKILL_PROMPT_TEMPLATE,
        &[
            ("persona", INTERVIEWER_PERSONA),
            ("role", request.role.trim()),
            ("document_text", request.document_text.trim()),
            ("job_description", job_description_or_default(request)),
            ("json_instruction", JSON_ONLY_INSTRUCTION),
        ],
    )
}

fn job_description_or_default(request: &GenerationRequest) -> &str {
    let jd = request.job_description.trim();
    if jd.is_empty() {
        NO_JOB_DESCRIPTION
    } else {
        jd
    }
}

/// Substitutes `{name}` placeholders in a single pass, so braces inside the
/// substituted values (resume text often has them) are never re-expanded.
/// Unknown `{...}` sequences are copied through untouched.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match replaced {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
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
