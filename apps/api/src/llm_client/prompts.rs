// Cross-cutting prompt fragments. Feature-specific prompts live next to the
// feature (see ai/prompts.rs).

/// Appended to every system prompt that produces user-facing prose.
pub const PLAIN_TEXT_SYSTEM: &str = "Respond with the requested text only. \
    Do NOT wrap it in markdown code fences. \
    Do NOT add a preamble, explanations or apologies.";

/// Keeps generated text inside what the candidate's profile supports.
pub const GROUNDING_INSTRUCTION: &str = "\
    Only mention skills and experience listed in the candidate profile below. \
    Do NOT invent employers, degrees, metrics or years of experience.";
