use std::collections::HashSet;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::options::PasswordOptions;

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Checks a candidate password against the policy, collecting every violation
pub fn validate_password(options: &PasswordOptions, password: &str) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if password.chars().count() < options.required_length {
        errors.push(format!(
            "Passwords must be at least {} characters.",
            options.required_length
        ));
    }
    if options.require_non_alphanumeric && password.chars().all(|c| c.is_alphanumeric()) {
        errors.push("Passwords must have at least one non alphanumeric character.".to_string());
    }
    if options.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Passwords must have at least one digit ('0'-'9').".to_string());
    }
    if options.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
        errors.push("Passwords must have at least one lowercase ('a'-'z').".to_string());
    }
    if options.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
        errors.push("Passwords must have at least one uppercase ('A'-'Z').".to_string());
    }
    let unique: HashSet<char> = password.chars().collect();
    if unique.len() < options.required_unique_chars {
        errors.push(format!(
            "Passwords must use at least {} different characters.",
            options.required_unique_chars
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_roundtrip() {
        let hash = hash_password("Pa$$w0rd").unwrap();
        assert_ne!(hash, "Pa$$w0rd");
        assert!(verify_password("Pa$$w0rd", &hash).unwrap());
        assert!(!verify_password("pa$$w0rd", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn default_policy_accepts_strong_password() {
        assert!(validate_password(&PasswordOptions::default(), "Str0ng!").is_ok());
    }

    #[test]
    fn default_policy_reports_every_violation() {
        let errors = validate_password(&PasswordOptions::default(), "abc").unwrap_err();
        // length, non-alphanumeric, digit, uppercase
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn unique_chars_requirement() {
        let options = PasswordOptions {
            required_unique_chars: 5,
            ..PasswordOptions::default()
        };
        let errors = validate_password(&options, "Aa1!Aa1!").unwrap_err();
        assert_eq!(errors, vec!["Passwords must use at least 5 different characters."]);

        assert!(validate_password(&options, "Ab1!c").is_ok());
    }
}
