//! Prompts for CV text improvement.
//!
//! The model must answer with `{"text": "..."}` JSON only.

pub const IMPROVE_SYSTEM: &str = "\
You are an experienced CV editor. You rewrite a single piece of CV text so it reads \
clearly, concisely and professionally, in an active voice and with strong action verbs.\n\
\n\
Respond with valid JSON only: {\"text\": \"...\"}\n\
Do NOT use markdown code fences. Do NOT add any explanation outside the JSON object.";

pub const IMPROVE_PROMPT_TEMPLATE: &str = "\
Improve the following {kind_label} from a CV.\n\
\n\
TEXT:\n\
{text}\n\
\n\
GUIDELINES:\n\
{guidelines}\n\
- Answer in {language}.\n\
- Keep any HTML list markup (<ul>, <li>) if the input uses it.\n\
{no_invention}\n\
\n\
Return JSON only: {\"text\": \"improved text here\"}";

pub const SUMMARY_GUIDELINES: &str = "\
- Two to four sentences.\n\
- Lead with the role and years of experience if given.\n\
- Mention the strongest skills or outcomes stated in the text.";

pub const EXPERIENCE_GUIDELINES: &str = "\
- Start each point with an action verb in the past tense (present tense for a current role).\n\
- Prefer outcomes over duties.\n\
- Keep quantified results exactly as written.";

pub const PROJECT_GUIDELINES: &str = "\
- Say what was built, with what, and what it achieved.\n\
- One to three sentences or bullet points.";

pub const GENERIC_GUIDELINES: &str = "\
- Fix grammar and spelling.\n\
- Remove filler words.";
