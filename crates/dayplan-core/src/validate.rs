//! Credential and profile field validation.
//!
//! Rules are checked together and the failures newline-joined into one
//! [`PlannerError::Validation`], so a form with three bad fields reports
//! all three at once.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PlannerError, Result};

fn email_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"))
}

fn field_errors(name: &str, email: &str, password: &str) -> Vec<&'static str> {
    let mut errors = Vec::new();
    if name.chars().count() <= 2 {
        errors.push("Please enter at least 3 characters for the name field.");
    }
    if email.chars().count() <= 5 || !email_shape().is_match(email) {
        errors.push("Email is too short or incorrect.");
    }
    if password.chars().count() <= 8 {
        errors.push("Please enter at least 9 characters for the password field.");
    }
    errors
}

/// Validate a registration form.
///
/// An entirely empty form short-circuits with its own message; otherwise
/// every failing field contributes one line.
pub fn registration(name: &str, email: &str, password: &str) -> Result<()> {
    if name.is_empty() && email.is_empty() && password.is_empty() {
        return Err(PlannerError::Validation(
            "All fields are empty. Please fill in everything".to_string(),
        ));
    }
    let errors = field_errors(name, email, password);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(PlannerError::Validation(errors.join("\n")))
    }
}

/// Validate edited profile fields. Same rules as registration, without
/// the all-empty short-circuit (a profile form is never fully empty).
pub fn profile(name: &str, email: &str, password: &str) -> Result<()> {
    let errors = field_errors(name, email, password);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(PlannerError::Validation(errors.join("\n")))
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: Result<()>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn valid_registration_passes() {
        registration("Ann", "ann@x.com", "password1").unwrap();
    }

    #[test]
    fn all_empty_short_circuits() {
        let msg = message(registration("", "", ""));
        assert_eq!(msg, "All fields are empty. Please fill in everything");
    }

    #[test]
    fn short_name_rejected() {
        let msg = message(registration("An", "ann@x.com", "password1"));
        assert_eq!(msg, "Please enter at least 3 characters for the name field.");
    }

    #[test]
    fn short_or_malformed_email_rejected() {
        let msg = message(registration("Ann", "a@b.c", "password1"));
        assert_eq!(msg, "Email is too short or incorrect.");

        let msg = message(registration("Ann", "not-an-email", "password1"));
        assert_eq!(msg, "Email is too short or incorrect.");
    }

    #[test]
    fn short_password_rejected() {
        let msg = message(registration("Ann", "ann@x.com", "12345678"));
        assert_eq!(
            msg,
            "Please enter at least 9 characters for the password field."
        );
    }

    #[test]
    fn failures_are_newline_joined() {
        let msg = message(registration("An", "bad", "short"));
        let lines: Vec<&str> = msg.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("name"));
        assert!(lines[1].contains("Email"));
        assert!(lines[2].contains("password"));
    }

    #[test]
    fn boundary_lengths() {
        // Three-character name and nine-character password are the
        // shortest accepted values.
        registration("Ann", "ann@x.com", "123456789").unwrap();
        assert!(registration("An", "ann@x.com", "123456789").is_err());
        assert!(registration("Ann", "ann@x.com", "12345678").is_err());
    }

    #[test]
    fn profile_skips_the_all_empty_check() {
        // Empty fields still fail, but per-field rather than with the
        // registration short-circuit.
        let msg = message(profile("", "", ""));
        assert!(msg.lines().count() == 3);
    }
}
