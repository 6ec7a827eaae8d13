//! Choice normalization and the deterministic fallback answer policy.

use easyapply_core_types::eq_ignore_case;

/// Answer used for free-text questions when the oracle gives nothing usable.
pub const FALLBACK_SENTINEL: &str = "NA";

/// Deterministic answer used when the oracle is unavailable or its output is unusable.
///
/// Prefers a literal "yes" choice, then the first choice, then [`FALLBACK_SENTINEL`].
pub fn fallback_answer(choices: &[String]) -> String {
    choices
        .iter()
        .find(|choice| eq_ignore_case(choice.trim(), "yes"))
        .or_else(|| choices.first())
        .cloned()
        .unwrap_or_else(|| FALLBACK_SENTINEL.to_string())
}

/// Maps a raw answer onto one of `choices`.
///
/// Case-insensitive exact match first, then substring containment in either direction,
/// else the first choice. The containment step is lenient: "Yes" also matches
/// "Yes, remote". With no choices the trimmed answer is returned as-is.
pub fn normalize_choice(raw: &str, choices: &[String]) -> String {
    let Some(first) = choices.first() else {
        return raw.trim().to_string();
    };

    let unquoted = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();

    if let Some(exact) = choices
        .iter()
        .find(|choice| eq_ignore_case(choice.trim(), unquoted))
    {
        return exact.clone();
    }

    let pick = unquoted.to_lowercase();

    choices
        .iter()
        .find(|choice| {
            let lowered = choice.trim().to_lowercase();
            !lowered.is_empty() && (pick.contains(&lowered) || lowered.contains(&pick))
        })
        .unwrap_or(first)
        .clone()
}
