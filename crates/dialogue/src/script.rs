//! Scripted assistant messages and reply parsing.

use url::Url;

/// Opening message of the dialogue.
pub const PROMPT_COMPETITORS: &str = "Before we start the audit: are there competitor sites you'd \
     like compared against? List them separated by commas, or say \"no\" to skip.";

/// Second message, after competitors are collected.
pub const PROMPT_MARKET: &str = "Got it. Which market should the audit focus on? \
     Say \"no\" to use the site's default market.";

/// Final message while the job is being created.
pub const PROMPT_SUBMITTING: &str = "Perfect — starting your audit now. This can take a few minutes.";

/// Parse the competitors reply.
///
/// A reply containing "no" or "skip" (case-insensitive) means no
/// competitors. Otherwise the reply is comma-split, trimmed, empty tokens
/// dropped, and each token normalized to an absolute URL.
pub fn parse_competitors(reply: &str) -> Vec<String> {
    let lowered = reply.to_lowercase();
    if lowered.contains("no") || lowered.contains("skip") {
        return Vec::new();
    }

    reply
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(normalize_competitor)
        .collect()
}

/// Parse the market reply: "no"/"skip" (exact, case-insensitive) means no
/// market preference; anything else is stored verbatim (trimmed) — the
/// backend interprets the descriptor, the client does not validate it.
pub fn parse_market(reply: &str) -> Option<String> {
    let trimmed = reply.trim();
    let lowered = trimmed.to_lowercase();
    if lowered == "no" || lowered == "skip" {
        return None;
    }
    Some(trimmed.to_string())
}

/// Prefix `https://` when the token has no scheme and looks like a host
/// (contains a dot). Tokens that already parse as absolute URLs pass
/// through verbatim.
fn normalize_competitor(token: &str) -> String {
    if Url::parse(token).is_ok() {
        return token.to_string();
    }
    if token.contains('.') {
        return format!("https://{token}");
    }
    token.to_string()
}
