//! Helpers for picking structured content out of model replies

/// Body of the first fenced code block, if the reply has one.
///
/// Accepts ```` ```yaml ````, ```` ```yml ```` and bare ```` ``` ```` fences. An
/// unterminated fence runs to the end of the reply.
pub(crate) fn fenced_block(reply: &str) -> Option<&str> {
    let start = reply.find("```")?;
    let after_fence = &reply[start + 3..];
    // Skip the info string (`yaml`, `yml`, ...) up to the end of the line
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(after_fence.len());
    let body = &after_fence[body_start..];
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    Some(body.trim())
}

/// Replace typographic apostrophes the model likes to emit
pub(crate) fn normalize_apostrophes(text: &str) -> String {
    text.replace(['\u{2019}', '\u{2018}'], "'")
}
