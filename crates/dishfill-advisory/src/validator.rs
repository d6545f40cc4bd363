//! Validation boundary for language model output
//!
//! The only place third-party text is turned into values the rest of the
//! system uses. Nothing returned from here is outside contract.
//!
//! Numeric grammar, after trimming and removing an optional code fence:
//!   [+|-] digits [. digits] [whitespace] [%]
//! The value must lie in [0, 100] and is rounded half away from zero to an
//! integer, so "57", " 42% " and "34.29" are accepted while "-3", "137",
//! "abc" and "about 40%" are not.

use dishfill_types::AdvisoryError;

/// Longest suggestion passed through, in characters
pub const MAX_SUGGESTION_CHARS: usize = 280;

const RAW_PREVIEW_CHARS: usize = 60;

/// Parse an overall percentage answer
pub fn validate_numeric(raw: &str) -> Result<u8, AdvisoryError> {
    let text = strip_code_fence(raw).trim();
    let token = text.strip_suffix('%').map(str::trim_end).unwrap_or(text);

    if !is_number_token(token) {
        return Err(AdvisoryError::ParseError(preview(raw)));
    }

    let value: f64 = token
        .parse()
        .map_err(|_| AdvisoryError::ParseError(preview(raw)))?;

    if !(0.0..=100.0).contains(&value) {
        return Err(AdvisoryError::InvalidRange(value));
    }

    Ok(value.round() as u8)
}

/// Accept a suggestion: trimmed, non-empty, length-capped
pub fn validate_text(raw: &str) -> Result<String, AdvisoryError> {
    let text = strip_code_fence(raw).trim();
    if text.is_empty() {
        return Err(AdvisoryError::EmptyResponse);
    }

    if text.chars().count() <= MAX_SUGGESTION_CHARS {
        return Ok(text.to_string());
    }

    let capped: String = text.chars().take(MAX_SUGGESTION_CHARS).collect();
    Ok(capped.trim_end().to_string())
}

/// Remove a surrounding markdown code fence, if any
pub fn strip_code_fence(response: &str) -> &str {
    let response = response.trim();

    if let Some(rest) = response.strip_prefix("```") {
        if let Some(body) = rest.strip_suffix("```") {
            // Drop an info string such as ```text on the opening line
            return match body.find('\n') {
                Some(newline) => &body[newline + 1..],
                None => body,
            };
        }
    }

    response
}

/// Optional sign, one or more digits, optional fraction with at least one digit
fn is_number_token(token: &str) -> bool {
    let unsigned = token
        .strip_prefix('-')
        .or_else(|| token.strip_prefix('+'))
        .unwrap_or(token);

    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    all_digits(whole) && fraction.map_or(true, all_digits)
}

fn preview(raw: &str) -> String {
    let truncated: String = raw.chars().take(RAW_PREVIEW_CHARS).collect();
    if raw.chars().count() > RAW_PREVIEW_CHARS {
        format!("{truncated}...")
    } else {
        truncated
    }
}
