use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::constants::MIN_PASSWORD_LENGTH;
use crate::error::{AppError, AppResult};
use crate::models::SkillLevel;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

#[derive(Debug, Clone, Serialize)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl FormField {
    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: "text",
            placeholder: None,
            required: true,
            min_length: None,
            options: Vec::new(),
            value: None,
        }
    }

    pub fn of_kind(mut self, kind: &'static str) -> Self {
        self.kind = kind;
        self
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn skill_level(selected: SkillLevel) -> Self {
        Self {
            kind: "select",
            options: SkillLevel::ALL
                .iter()
                .map(|level| SelectOption { value: level.as_str(), label: level.label() })
                .collect(),
            value: Some(selected.as_str().to_string()),
            ..Self::text("skill_level", "Skill Level")
        }
    }
}

/// Rejects blank required inputs, naming the first offender.
pub fn require_filled(fields: &[(&str, &str)]) -> AppResult<()> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((label, _)) => Err(AppError::Validation(format!("{label} is required"))),
        None => Ok(()),
    }
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(AppError::Validation("Please enter a valid email address".to_string()))
    }
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password should be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_filled_names_first_blank() {
        let err = require_filled(&[("Name", "Ann"), ("City", "  "), ("Address", "")]).unwrap_err();
        assert_eq!(err.to_string(), "City is required");
        assert!(require_filled(&[("Name", "Ann")]).is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("you@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_validate_password_min_length() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_skill_level_field_lists_all_levels() {
        let field = FormField::skill_level(SkillLevel::Advanced);
        assert_eq!(field.kind, "select");
        assert_eq!(field.options.len(), 4);
        assert_eq!(field.value.as_deref(), Some("advanced"));
    }
}
