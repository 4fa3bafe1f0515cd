//! # Validation Module
//!
//! Field-level validators shared by the booking, settlement and catalog
//! rules.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard form checks (immediate feedback)                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - runs before any database call                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite NOT NULL / UNIQUE / CHECK constraints                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted free-text name.
pub const MAX_NAME_LEN: usize = 200;

/// Service durations are booked in 5-minute increments.
pub const DURATION_STEP_MINUTES: i64 = 5;

// =============================================================================
// String Validators
// =============================================================================

/// Returns the trimmed value, or `Required` when missing or blank.
pub fn non_blank(value: Option<&str>, field: &str) -> ValidationResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::required(field)),
    }
}

/// Validates a display name (service, product, category, employee).
///
/// ## Example
/// ```rust
/// use trim_core::validation::validate_name;
///
/// assert!(validate_name("Skin Fade", "name").is_ok());
/// assert!(validate_name("  ", "name").is_err());
/// ```
pub fn validate_name(name: &str, field: &str) -> ValidationResult<String> {
    let name = non_blank(Some(name), field)?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(name)
}

/// Minimal email shape check: one `@` with text on both sides and a dot in
/// the domain. Returns the lowercased address.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = non_blank(Some(email), "email")?.to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::invalid("email", "not an email address"));
    }
    Ok(email)
}

/// Passwords need at least 8 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < 8 {
        return Err(ValidationError::invalid("password", "must be at least 8 characters"));
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Prices may be zero (complimentary) but never negative.
pub fn validate_price_cents(cents: i64, field: &str) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Quantities start at 1.
pub fn validate_quantity(quantity: i64, field: &str) -> ValidationResult<()> {
    if quantity < 1 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Stock levels are non-negative.
pub fn validate_stock(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Service duration: a positive multiple of 5 minutes.
///
/// ## Example
/// ```rust
/// use trim_core::validation::validate_duration_minutes;
///
/// assert!(validate_duration_minutes(45).is_ok());
/// assert!(validate_duration_minutes(0).is_err());
/// assert!(validate_duration_minutes(32).is_err());
/// ```
pub fn validate_duration_minutes(minutes: i64) -> ValidationResult<()> {
    if minutes <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "durationMinutes".to_string(),
        });
    }
    if minutes % DURATION_STEP_MINUTES != 0 {
        return Err(ValidationError::invalid(
            "durationMinutes",
            "must be a multiple of 5",
        ));
    }
    Ok(())
}

/// Tax percent between 0 and 100 inclusive.
pub fn validate_tax_percent(percent: f64) -> ValidationResult<()> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "taxPercent".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
