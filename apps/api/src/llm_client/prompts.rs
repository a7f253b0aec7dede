// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it;
// this file only holds the cross-cutting pieces.

/// Keeps rewrites honest: wording may change, facts may not.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    CRITICAL: Only rephrase what the candidate wrote. \
    Do NOT add employers, numbers, technologies, dates or achievements that are not in the input. \
    If the input is vague, keep it vague rather than inventing specifics.";
