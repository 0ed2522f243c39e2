//! Response parsing: turns raw model text into artifacts.
//!
//! The model is not guaranteed to follow the prompt's format, so neither
//! parser fails: malformed lines and entries are dropped and the result may
//! be shorter than requested, or empty.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::interview::models::{
    BestEffort, QuestionSet, SkillAssessment, SkillRating, MAX_QUESTIONS,
};
use crate::llm_client::strip_json_fences;

/// `12. text`: a leading integer, a period, then the question.
fn numbered_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+\.\s*(?P<text>.*)$").expect("valid regex"))
}

/// One skill per line, after markdown emphasis is removed:
/// `Skill: 85%`, `- Skill: Proficiency 85`, `2. Skill : 85 %`,
/// `Skill (Proficiency: 85%)`. A bare number after the colon needs a `%`.
fn skill_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)
            ^\s*(?:[-•+]\s*|\d+\.\s*)?
            (?P<skill>[^:()]+?)\s*
            (?:
                \(\s*proficiency\s*:?\s*(?P<paren>\d{1,3}(?:\.\d+)?)\s*%?\s*\)
              | :\s*proficiency\s*(?:of\s*|:\s*)?(?P<keyword>\d{1,3}(?:\.\d+)?)\s*%?
              | :\s*(?P<pct>\d{1,3}(?:\.\d+)?)\s*%
            )",
        )
        .expect("valid regex")
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Questions
// ────────────────────────────────────────────────────────────────────────────

/// Keeps numbered-list lines in order, strips the numbering, and truncates
/// to the first `MAX_QUESTIONS`. Never pads.
pub fn parse_questions(raw: &str) -> QuestionSet {
    let questions: Vec<String> = raw
        .lines()
        .filter_map(|line| numbered_line().captures(line))
        .filter_map(|caps| {
            let text = caps.name("text")?.as_str().trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .take(MAX_QUESTIONS)
        .collect();

    debug!("Parsed {} question(s)", questions.len());
    BestEffort::new(questions)
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkillPayload {
    Wrapped { skills: Vec<serde_json::Value> },
    Bare(Vec<serde_json::Value>),
}

#[derive(Debug, Deserialize)]
struct RawSkill {
    skill: String,
    proficiency: RawProficiency,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawProficiency {
    Number(f64),
    Text(String),
}

impl RawProficiency {
    fn percentage(&self) -> Option<u8> {
        match self {
            RawProficiency::Number(n) => to_percentage(*n),
            RawProficiency::Text(s) => {
                let digits = s.trim().trim_end_matches('%').trim();
                to_percentage(digits.parse::<f64>().ok()?)
            }
        }
    }
}

fn to_percentage(value: f64) -> Option<u8> {
    if !(0.0..=100.0).contains(&value) {
        return None;
    }
    Some(value.round() as u8)
}

/// Decodes the structured `{"skills": [...]}` shape when present, otherwise
/// scans free text for `skill: NN%` lines.
pub fn parse_skills(raw: &str) -> SkillAssessment {
    // An empty structured decode (say, a stray `[1]` in prose) still lets
    // the line scan run.
    if let Some(skills) = decode_structured(raw).filter(|skills| !skills.is_empty()) {
        debug!("Parsed {} skill(s) from structured reply", skills.len());
        return skills;
    }

    let skills = scan_skill_lines(raw);
    debug!("Parsed {} skill(s) from free-text reply", skills.len());
    skills
}

fn decode_structured(raw: &str) -> Option<SkillAssessment> {
    let text = strip_json_fences(raw);

    let payload = serde_json::from_str::<SkillPayload>(text)
        .ok()
        .or_else(|| first_embedded_payload(text))?;

    let raw_skills = match payload {
        SkillPayload::Wrapped { skills } => skills,
        SkillPayload::Bare(skills) => skills,
    };

    // Entries are decoded one by one so a single malformed item only drops itself.
    let skills = raw_skills
        .into_iter()
        .filter_map(|value| serde_json::from_value::<RawSkill>(value).ok())
        .filter_map(|raw| {
            let proficiency = raw.proficiency.percentage()?;
            SkillRating::new(clean_skill_name(&raw.skill), proficiency)
        })
        .collect();

    Some(BestEffort::new(skills))
}

/// Decodes the first JSON value that opens at a `{` or `[` in `text`,
/// ignoring preamble before it and commentary after it.
fn first_embedded_payload(text: &str) -> Option<SkillPayload> {
    let mut starts: Vec<usize> = [text.find('{'), text.find('[')]
        .into_iter()
        .flatten()
        .collect();
    starts.sort_unstable();

    starts.into_iter().find_map(|start| {
        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<SkillPayload>()
            .next()?
            .ok()
    })
}

fn scan_skill_lines(raw: &str) -> SkillAssessment {
    let skills = raw
        .lines()
        .filter_map(|line| {
            let line = strip_emphasis(line);
            let caps = skill_line().captures(&line)?;
            let skill = clean_skill_name(caps.name("skill")?.as_str());
            let pct = ["paren", "keyword", "pct"]
                .iter()
                .find_map(|name| caps.name(name))?
                .as_str()
                .parse::<f64>()
                .ok()?;
            SkillRating::new(skill, to_percentage(pct)?)
        })
        .collect();
    BestEffort::new(skills)
}

/// Drops markdown bold/italic markers (`**`, `*`, `__`).
fn strip_emphasis(line: &str) -> String {
    line.replace("__", "").replace('*', "")
}

fn clean_skill_name(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| matches!(c, '*' | '"' | '`' | '_'))
        .trim()
        .to_string()
}
