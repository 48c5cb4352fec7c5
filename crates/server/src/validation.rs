use std::collections::BTreeMap;

use serde::Deserialize;

/// Field name to messages, as returned under `errors` in a 422 response.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

const PASSWORD_SPECIALS: &str = "@$!%*?&";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn push(errors: &mut FieldErrors, field: &'static str, message: &str) {
    errors.entry(field).or_default().push(message.to_string());
}

/// Needs an `@` with something before it and a dot somewhere after it.
fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        let username_len = self.username.chars().count();
        if username_len == 0 {
            push(&mut errors, "username", "Username is required");
        } else if !(6..=20).contains(&username_len) {
            push(&mut errors, "username", "Username must be 6 to 20 characters");
        }

        if self.email.trim().is_empty() {
            push(&mut errors, "email", "Email is required");
        } else if !is_valid_email(self.email.trim()) {
            push(&mut errors, "email", "Email is not valid");
        }

        let pw = &self.password;
        if pw.is_empty() {
            push(&mut errors, "password", "Password is required");
        } else {
            if pw.chars().count() < 8 {
                push(&mut errors, "password", "Password must be at least 8 characters");
            }
            if !pw.chars().any(|c| c.is_ascii_uppercase()) {
                push(&mut errors, "password", "Password needs an uppercase letter");
            }
            if !pw.chars().any(|c| c.is_ascii_lowercase()) {
                push(&mut errors, "password", "Password needs a lowercase letter");
            }
            if !pw.chars().any(|c| c.is_ascii_digit()) {
                push(&mut errors, "password", "Password needs a digit");
            }
            if !pw.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
                push(
                    &mut errors,
                    "password",
                    &format!("Password needs one of {PASSWORD_SPECIALS}"),
                );
            }
        }

        if self.confirm_password != self.password {
            push(&mut errors, "confirmPassword", "Passwords do not match");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.email.trim().is_empty() {
            push(&mut errors, "email", "Email is required");
        }
        if self.password.is_empty() {
            push(&mut errors, "password", "Password is required");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
