use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::store::Account;

pub const MIN_PASSWORD_CHARS: usize = 6;

/// Field name → message. Keys are form field names or `general`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, &'static str>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Submitted login form.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// Trims the username; the password is taken verbatim.
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self
    }

    /// Presence checks that run before the account store is consulted.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if self.username.is_empty() {
            errors.add("username", "Username is required.");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required.");
        }
        errors
    }
}

/// Submitted signup form.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl SignupForm {
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.username = self.username.trim().to_string();
        self
    }

    /// Collects every failing field. `username_taken` is only consulted
    /// when a username was given.
    pub fn validate(&self, username_taken: bool) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if self.first_name.is_empty() {
            errors.add("first_name", "Name is required.");
        }
        if self.last_name.is_empty() {
            errors.add("last_name", "Surname is required.");
        }
        if self.username.is_empty() {
            errors.add("username", "Account is required.");
        } else if username_taken {
            errors.add("username", "This account already exists.");
        }
        if self.password.is_empty() {
            errors.add("password", "Password is required.");
        } else if self.password.chars().count() < MIN_PASSWORD_CHARS {
            errors.add("password", "Password must be at least 6 characters.");
        }
        errors
    }
}

/// Public part of an account.
#[derive(Debug, Clone, Serialize)]
pub struct PublicAccount {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Account> for PublicAccount {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            username: a.username,
            first_name: a.first_name,
            last_name: a.last_name,
            created_at: a.created_at,
        }
    }
}

/// Page payload handed to the templating layer.
#[derive(Debug, Serialize)]
pub struct Page {
    pub template: &'static str,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub form_values: BTreeMap<&'static str, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicAccount>,
}

impl Page {
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            errors: FieldErrors::default(),
            form_values: BTreeMap::new(),
            user: None,
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_value(mut self, field: &'static str, value: &str) -> Self {
        self.form_values.insert(field, value.to_string());
        self
    }

    pub fn with_user(mut self, user: PublicAccount) -> Self {
        self.user = Some(user);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(first: &str, last: &str, user: &str, pass: &str) -> SignupForm {
        SignupForm {
            first_name: first.into(),
            last_name: last.into(),
            username: user.into(),
            password: pass.into(),
        }
        .normalized()
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = LoginForm::default().normalized().validate();
        assert_eq!(errors.get("username"), Some("Username is required."));
        assert_eq!(errors.get("password"), Some("Password is required."));
        assert!(errors.get("general").is_none());
    }

    #[test]
    fn login_username_of_spaces_counts_as_missing() {
        let form = LoginForm {
            username: "   ".into(),
            password: "secret".into(),
        }
        .normalized();
        let errors = form.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("username").is_some());
    }

    #[test]
    fn signup_collects_every_missing_field() {
        let errors = signup("", " ", "", "").validate(false);
        assert_eq!(errors.get("first_name"), Some("Name is required."));
        assert_eq!(errors.get("last_name"), Some("Surname is required."));
        assert_eq!(errors.get("username"), Some("Account is required."));
        assert_eq!(errors.get("password"), Some("Password is required."));
    }

    #[test]
    fn signup_reports_taken_username() {
        let errors = signup("Ana", "Silva", "ana", "longenough").validate(true);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("username"), Some("This account already exists."));
    }

    #[test]
    fn signup_short_password_fails_even_when_rest_is_valid() {
        for short in ["a", "abcde", "çççç"] {
            let errors = signup("Ana", "Silva", "ana", short).validate(false);
            assert_eq!(
                errors.get("password"),
                Some("Password must be at least 6 characters.")
            );
            assert_eq!(errors.len(), 1);
        }
        assert!(signup("Ana", "Silva", "ana", "abcdef").validate(false).is_empty());
    }

    #[test]
    fn page_serialization_skips_empty_parts() {
        let json = serde_json::to_value(Page::new("login.html")).unwrap();
        assert_eq!(json, serde_json::json!({ "template": "login.html" }));

        let mut errors = FieldErrors::default();
        errors.add("general", "Invalid credentials. Please try again.");
        let json = serde_json::to_value(
            Page::new("login.html")
                .with_errors(errors)
                .with_value("username", "ana"),
        )
        .unwrap();
        assert_eq!(json["errors"]["general"], "Invalid credentials. Please try again.");
        assert_eq!(json["form_values"]["username"], "ana");
    }
}
