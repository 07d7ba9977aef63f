//! Input validation for registration and uploads.

/// Characters allowed in a password besides ASCII letters and digits.
const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum filename length kept for logging.
const MAX_LOGGED_FILENAME: usize = 255;

/// Returned when a password fails [`is_strong_password`].
pub const WEAK_PASSWORD_MESSAGE: &str =
    "Password too weak. Must be 8+ chars, include uppercase, lowercase, number, special char.";

/// Check the registration password policy.
///
/// At least 8 characters drawn only from `[A-Za-z0-9@$!%*?&]`, with at least
/// one lowercase letter, one uppercase letter, one digit and one of `@$!%*?&`.
pub fn is_strong_password(password: &str) -> bool {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return false;
    }

    let is_special = |c: char| PASSWORD_SPECIALS.contains(c);
    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || is_special(c))
    {
        return false;
    }

    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(is_special)
}

/// Sanitize a client-supplied filename for safe logging.
pub fn sanitize_filename(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_LOGGED_FILENAME)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_passwords() {
        assert!(is_strong_password("Str0ng!pass"));
        assert!(is_strong_password("aB3$aB3$"));
    }

    #[test]
    fn test_weak_passwords() {
        // too short
        assert!(!is_strong_password("aB3$aB3"));
        // missing classes
        assert!(!is_strong_password("alllower1!"));
        assert!(!is_strong_password("ALLUPPER1!"));
        assert!(!is_strong_password("NoDigits!!"));
        assert!(!is_strong_password("NoSpecial12"));
        // characters outside the allowed set
        assert!(!is_strong_password("Str0ng!pass#"));
        assert!(!is_strong_password("Str0ng! pass"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("clip\n\r.mp4"), "clip.mp4");
        assert_eq!(sanitize_filename(&"a".repeat(400)).len(), 255);
    }
}
