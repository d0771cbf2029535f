//! Field validators shared by registration, uploads and edits.
//!
//! Single-field validators return `bool`; [`validate_school_data`] collects
//! every failing message so a form can show them all at once.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{
    MAX_IMAGE_SIZE, MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH, MIN_PLACE_NAME_LENGTH,
    MIN_USERNAME_LENGTH, MIN_YEAR,
};
use crate::error::ValidationError;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid username regex"));

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn validate_username(username: &str) -> bool {
    let trimmed = username.trim();
    let len = trimmed.chars().count();
    (MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) && USERNAME_RE.is_match(trimmed)
}

pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

pub fn validate_place_name(name: &str) -> bool {
    name.trim().chars().count() >= MIN_PLACE_NAME_LENGTH
}

pub fn validate_year(year: i32, current_year: i32) -> bool {
    (MIN_YEAR..=current_year).contains(&year)
}

/// Image payloads are embedded data URIs: `data:image/<type>;base64,<data>`.
pub fn validate_image_url(image_url: &str) -> Result<(), String> {
    if image_url.trim().is_empty() {
        return Err("Please select an image".to_string());
    }

    let Some(rest) = image_url.strip_prefix("data:image/") else {
        return Err("Image must be an embedded image data URI".to_string());
    };
    let Some((_mime, payload)) = rest.split_once(";base64,") else {
        return Err("Image must be an embedded image data URI".to_string());
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| "Image data is corrupted".to_string())?;

    if bytes.is_empty() {
        return Err("Image data is empty".to_string());
    }
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(format!(
            "Image must be smaller than {}MB",
            MAX_IMAGE_SIZE / (1024 * 1024)
        ));
    }
    Ok(())
}

pub fn username_message() -> String {
    format!(
        "Username must be {MIN_USERNAME_LENGTH}-{MAX_USERNAME_LENGTH} characters and contain only letters, numbers, and underscores"
    )
}

pub fn password_message() -> String {
    format!("Password must be at least {MIN_PASSWORD_LENGTH} characters")
}

/// Borrowed view of the fields every upload carries.
#[derive(Debug, Clone, Copy)]
pub struct SchoolData<'a> {
    pub school_name: &'a str,
    pub city: &'a str,
    pub country: &'a str,
    pub year: i32,
    pub image_url: &'a str,
}

pub fn validate_school_data(data: &SchoolData<'_>, current_year: i32) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    if !validate_place_name(data.school_name) {
        errors.push("School name must be at least 2 characters".to_string());
    }
    if !validate_place_name(data.city) {
        errors.push("City must be at least 2 characters".to_string());
    }
    if !validate_place_name(data.country) {
        errors.push("Country must be at least 2 characters".to_string());
    }
    if !validate_year(data.year, current_year) {
        errors.push(format!("Year must be between {MIN_YEAR} and {current_year}"));
    }
    if let Err(e) = validate_image_url(data.image_url) {
        errors.push(e);
    }

    ValidationError::check(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn data<'a>(school: &'a str, city: &'a str, country: &'a str, year: i32) -> SchoolData<'a> {
        SchoolData {
            school_name: school,
            city,
            country,
            year,
            image_url: PIXEL,
        }
    }

    #[test]
    fn usernames() {
        assert!(validate_username("alice_01"));
        assert!(validate_username("  bob  "));
        assert!(!validate_username("al"));
        assert!(!validate_username("a".repeat(21).as_str()));
        assert!(!validate_username("bad-name"));
        assert!(!validate_username(""));
    }

    #[test]
    fn emails() {
        assert!(validate_email("alice@x.com"));
        assert!(validate_email(" alice@x.com "));
        assert!(!validate_email("alice@x"));
        assert!(!validate_email("alice x@y.com"));
        assert!(!validate_email("@x.com"));
    }

    #[test]
    fn passwords_and_years() {
        assert!(validate_password("secret1"));
        assert!(!validate_password("short"));
        assert!(validate_year(1900, 2024));
        assert!(validate_year(2024, 2024));
        assert!(!validate_year(1899, 2024));
        assert!(!validate_year(2025, 2024));
    }

    #[test]
    fn image_must_be_a_data_uri() {
        assert!(validate_image_url(PIXEL).is_ok());
        assert_eq!(validate_image_url("").unwrap_err(), "Please select an image");
        assert!(validate_image_url("https://example.com/a.png").is_err());
        assert!(validate_image_url("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(validate_image_url("data:image/png;base64,***").is_err());
    }

    #[test]
    fn school_data_collects_every_error() {
        let err = validate_school_data(&data("L", " ", "", 1850), 2024).unwrap_err();
        assert_eq!(err.messages.len(), 4);
        assert_eq!(err.messages[0], "School name must be at least 2 characters");
        assert_eq!(err.messages[3], "Year must be between 1900 and 2024");
    }

    #[test]
    fn school_data_accepts_valid_payload() {
        assert!(validate_school_data(&data("Lincoln High", "Springfield", "US", 2010), 2024).is_ok());
    }
}
