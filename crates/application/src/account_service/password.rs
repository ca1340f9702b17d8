use metasync_core::{AppError, AppResult};

const PASSWORD_LENGTH: usize = 12;
const MAX_ATTEMPTS: usize = 64;
// 64 symbols so every random byte maps without modulo bias.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@";

/// Generates a random password containing upper, lower, digit, and symbol
/// characters.
pub(super) fn generate_password() -> AppResult<String> {
    for _ in 0..MAX_ATTEMPTS {
        let mut bytes = [0u8; PASSWORD_LENGTH];
        getrandom::fill(&mut bytes).map_err(|error| {
            AppError::Internal(format!("failed to generate account password: {error}"))
        })?;

        let candidate: String = bytes
            .iter()
            .map(|byte| ALPHABET[usize::from(*byte) % ALPHABET.len()] as char)
            .collect();

        if covers_all_classes(&candidate) {
            return Ok(candidate);
        }
    }

    Err(AppError::Internal(
        "failed to generate account password with required character classes".to_owned(),
    ))
}

fn covers_all_classes(candidate: &str) -> bool {
    candidate.chars().any(|value| value.is_ascii_uppercase())
        && candidate.chars().any(|value| value.is_ascii_lowercase())
        && candidate.chars().any(|value| value.is_ascii_digit())
        && candidate.chars().any(|value| !value.is_ascii_alphanumeric())
}
