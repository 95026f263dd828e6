const EXPO_TOKEN_PREFIXES: [&str; 2] = ["ExponentPushToken[", "ExpoPushToken["];

/// Accepts `ExponentPushToken[...]` and `ExpoPushToken[...]` with a non-empty,
/// single-line inner part.
pub fn is_valid_expo_token(token: &str) -> bool {
    EXPO_TOKEN_PREFIXES.iter().any(|prefix| {
        token
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(']'))
            .is_some_and(|inner| {
                !inner.is_empty()
                    && !inner
                        .chars()
                        .any(|c| matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}'))
            })
    })
}

/// Shortens a token for log output.
pub fn redact_token(token: &str) -> &str {
    match token.char_indices().nth(20) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}
