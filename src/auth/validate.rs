pub const MAX_SEARCH_LEN: usize = 100;

/// Validate an email: must contain '@' and '.', max 254 chars.
pub fn validate_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some("Email is required".to_string());
    }
    if trimmed.len() > 254 {
        return Some("Email must be at most 254 characters".to_string());
    }
    if !trimmed.contains('@') || !trimmed.contains('.') {
        return Some("Please enter a valid email address".to_string());
    }
    None
}

/// First problem with a login form, if any.
pub fn validate_login(email: &str, password: &str) -> Option<String> {
    if let Some(err) = validate_email(email) {
        return Some(err);
    }
    if password.is_empty() {
        return Some("Password is required".to_string());
    }
    None
}

/// Search terms are trimmed and capped; longer input is cut at a char boundary.
pub fn normalize_search(term: &str) -> String {
    term.trim().chars().take(MAX_SEARCH_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_form() {
        assert_eq!(validate_login("", "x").as_deref(), Some("Email is required"));
        assert!(validate_login("owner", "x").is_some());
        assert_eq!(validate_login("owner@example.com", "").as_deref(), Some("Password is required"));
        assert!(validate_login("owner@example.com", "pw").is_none());
    }

    #[test]
    fn search_is_trimmed_and_capped() {
        assert_eq!(normalize_search("  naan "), "naan");
        assert_eq!(normalize_search(&"é".repeat(200)).chars().count(), MAX_SEARCH_LEN);
    }

    #[test]
    fn search_cap_keeps_the_leading_characters() {
        let exact = "a".repeat(MAX_SEARCH_LEN);
        assert_eq!(normalize_search(&exact), exact);

        let long = format!("{exact}biryani");
        assert_eq!(normalize_search(&long), exact);

        // Trimming happens before the cap, so padding never eats into it.
        let padded = format!("   {exact}   ");
        assert_eq!(normalize_search(&padded), exact);
    }
}
