pub mod handlers;
pub mod insights;
pub mod matching;
pub mod prompts;
pub mod proposal;
