// Cross-cutting prompt fragments shared by every LLM caller.

/// System prompt fragment for plain-text structured critiques.
pub const PLAIN_TEXT_SYSTEM: &str = "You are a precise, structured assistant. \
    Respond in plain text only. \
    Separate sections with a single blank line. \
    Do NOT use tables, HTML or code fences. \
    Do NOT include apologies or disclaimers.";
