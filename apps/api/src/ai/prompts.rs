// Prompt constants for proposal generation.
// Cross-cutting fragments come from llm_client::prompts.

/// System prompt for cover-letter generation.
pub const PROPOSAL_SYSTEM: &str = "You are a career coach who writes concise, \
    specific cover letters for students applying to jobs and internships.";

/// Replace `{name}`, `{job_title}`, `{company}`, `{matched}`, `{other}`,
/// `{tone}` and `{words}` before sending.
pub const PROPOSAL_PROMPT_TEMPLATE: &str = r#"Write a cover letter for the application below.

Candidate: {name}
Role: {job_title} at {company}
Skills the role asks for that the candidate has: {matched}
Other candidate skills: {other}

Tone: {tone}
Length: about {words} words.

Job description:
{description}
"#;
