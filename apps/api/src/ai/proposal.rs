//! Proposal (cover letter) generation.
//!
//! Template path: one of three tone templates, stretched by the requested length.
//! LLM path: the same inputs rendered into a prompt; any LLM failure falls back
//! to the template text.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ai::prompts::{PROPOSAL_PROMPT_TEMPLATE, PROPOSAL_SYSTEM};
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, PLAIN_TEXT_SYSTEM};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Professional,
    Enthusiastic,
    Confident,
}

impl Tone {
    const ALL: [Tone; 3] = [Tone::Professional, Tone::Enthusiastic, Tone::Confident];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Enthusiastic => "enthusiastic",
            Tone::Confident => "confident",
        }
    }

    /// The requested tone, or a random one when none was asked for.
    pub fn pick(requested: Option<Tone>) -> Tone {
        requested.unwrap_or_else(|| Tone::ALL[rand::random_range(0..Tone::ALL.len())])
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("Unknown tone '{s}'. Expected professional, enthusiastic or confident"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    Short,
    #[default]
    Medium,
    Long,
}

impl Length {
    pub fn target_words(&self) -> u32 {
        match self {
            Length::Short => 80,
            Length::Medium => 160,
            Length::Long => 280,
        }
    }
}

impl FromStr for Length {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Length::Short),
            "medium" => Ok(Length::Medium),
            "long" => Ok(Length::Long),
            other => Err(format!("Unknown length '{other}'. Expected short, medium or long")),
        }
    }
}

/// Everything a proposal may mention about the candidate and the job.
#[derive(Debug, Clone)]
pub struct ProposalContext {
    pub candidate_name: String,
    pub job_title: String,
    pub company: Option<String>,
    pub job_description: String,
    pub matched_skills: Vec<String>,
    pub other_skills: Vec<String>,
}

impl ProposalContext {
    fn company_or_team(&self) -> &str {
        self.company.as_deref().unwrap_or("your team")
    }
}

/// Joins skills as "A", "A and B" or "A, B and C".
fn join_skills(skills: &[String]) -> String {
    match skills {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Renders the template proposal for a tone and length.
pub fn render_template(ctx: &ProposalContext, tone: Tone, length: Length) -> String {
    let company = ctx.company_or_team();
    let title = &ctx.job_title;
    let matched = join_skills(&ctx.matched_skills);

    let opening = match tone {
        Tone::Professional => format!(
            "Dear Hiring Manager,\n\nI am writing to apply for the {title} position at {company}."
        ),
        Tone::Enthusiastic => format!(
            "Hello {company} team!\n\nI was thrilled to see the {title} opening and would love to be part of it."
        ),
        Tone::Confident => format!(
            "Dear Hiring Team,\n\nI am the right person for the {title} role at {company}, and I would like to show you why."
        ),
    };

    let skills_line = if matched.is_empty() {
        "I am a quick learner and ready to build the skills this role calls for.".to_string()
    } else {
        match tone {
            Tone::Professional => format!("My experience with {matched} aligns closely with your requirements."),
            Tone::Enthusiastic => format!("I have been working hands-on with {matched}, and I enjoy it a lot!"),
            Tone::Confident => format!("I bring practical, proven skills in {matched}."),
        }
    };

    let mut paragraphs = vec![opening, skills_line];

    if length != Length::Short {
        let extra = join_skills(&ctx.other_skills);
        if !extra.is_empty() {
            paragraphs.push(format!(
                "Beyond the core requirements, I also work with {extra}, which I can put to use on your projects."
            ));
        }
        paragraphs.push(format!(
            "I am eager to contribute to {company} and to keep growing alongside an experienced team."
        ));
    }

    if length == Length::Long {
        paragraphs.push(
            "I take ownership of my work, communicate early when something is blocked, and value clear, \
             well-tested results. I would welcome the chance to discuss how I can help your team reach its goals."
                .to_string(),
        );
    }

    let closing = match tone {
        Tone::Professional => format!("Thank you for your consideration.\n\nSincerely,\n{}", ctx.candidate_name),
        Tone::Enthusiastic => format!("Thanks so much for reading, I hope to hear from you soon!\n\nBest,\n{}", ctx.candidate_name),
        Tone::Confident => format!("I look forward to discussing the impact I can make.\n\nRegards,\n{}", ctx.candidate_name),
    };
    paragraphs.push(closing);

    paragraphs.join("\n\n")
}

/// Builds the `(prompt, system)` pair for the LLM path.
pub fn build_prompt(ctx: &ProposalContext, tone: Tone, length: Length) -> (String, String) {
    let none = || "none listed".to_string();
    let matched = Some(join_skills(&ctx.matched_skills)).filter(|s| !s.is_empty());
    let other = Some(join_skills(&ctx.other_skills)).filter(|s| !s.is_empty());

    let prompt = PROPOSAL_PROMPT_TEMPLATE
        .replace("{name}", &ctx.candidate_name)
        .replace("{job_title}", &ctx.job_title)
        .replace("{company}", ctx.company_or_team())
        .replace("{matched}", &matched.unwrap_or_else(none))
        .replace("{other}", &other.unwrap_or_else(none))
        .replace("{tone}", tone.as_str())
        .replace("{words}", &length.target_words().to_string())
        .replace("{description}", &ctx.job_description);

    let system = format!("{PROPOSAL_SYSTEM} {GROUNDING_INSTRUCTION} {PLAIN_TEXT_SYSTEM}");
    (prompt, system)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ProposalContext {
        ProposalContext {
            candidate_name: "Ada Lovelace".to_string(),
            job_title: "Backend Intern".to_string(),
            company: Some("Acme".to_string()),
            job_description: "Build APIs in Rust.".to_string(),
            matched_skills: vec!["Rust".to_string(), "SQL".to_string()],
            other_skills: vec!["Figma".to_string()],
        }
    }

    #[test]
    fn test_join_skills_forms() {
        assert_eq!(join_skills(&[]), "");
        assert_eq!(join_skills(&["A".into()]), "A");
        assert_eq!(join_skills(&["A".into(), "B".into(), "C".into()]), "A, B and C");
    }

    #[test]
    fn test_template_mentions_job_company_and_skills() {
        let text = render_template(&ctx(), Tone::Professional, Length::Medium);
        assert!(text.contains("Backend Intern"));
        assert!(text.contains("Acme"));
        assert!(text.contains("Rust and SQL"));
        assert!(text.ends_with("Ada Lovelace"));
    }

    #[test]
    fn test_tones_produce_different_text() {
        let a = render_template(&ctx(), Tone::Professional, Length::Short);
        let b = render_template(&ctx(), Tone::Enthusiastic, Length::Short);
        let c = render_template(&ctx(), Tone::Confident, Length::Short);
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_length_grows_text() {
        let short = render_template(&ctx(), Tone::Confident, Length::Short);
        let medium = render_template(&ctx(), Tone::Confident, Length::Medium);
        let long = render_template(&ctx(), Tone::Confident, Length::Long);
        assert!(short.len() < medium.len());
        assert!(medium.len() < long.len());
        assert!(!short.contains("Figma"));
        assert!(medium.contains("Figma"));
    }

    #[test]
    fn test_no_matched_skills_still_renders() {
        let mut c = ctx();
        c.matched_skills.clear();
        c.company = None;
        let text = render_template(&c, Tone::Professional, Length::Short);
        assert!(text.contains("quick learner"));
        assert!(text.contains("your team"));
    }

    #[test]
    fn test_pick_honours_requested_tone() {
        assert_eq!(Tone::pick(Some(Tone::Confident)), Tone::Confident);
        assert!(Tone::ALL.contains(&Tone::pick(None)));
    }

    #[test]
    fn test_prompt_fills_every_placeholder() {
        let (prompt, system) = build_prompt(&ctx(), Tone::Enthusiastic, Length::Long);
        assert!(!prompt.contains('{'));
        assert!(prompt.contains("about 280 words"));
        assert!(system.contains("Do NOT invent"));
    }

    #[test]
    fn test_parse_tone_and_length() {
        assert_eq!("Confident".parse::<Tone>().unwrap(), Tone::Confident);
        assert!("snarky".parse::<Tone>().is_err());
        assert_eq!("LONG".parse::<Length>().unwrap(), Length::Long);
    }
}
