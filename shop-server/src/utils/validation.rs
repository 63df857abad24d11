//! Input validation helpers
//!
//! Text limits and field checks shared by the API handlers. SQLite TEXT
//! has no length enforcement, so every free-text input passes through here.

use shared::error::{AppError, ErrorCode};
use shared::models::{OrderCreate, ShippingAddress, SiteSettings};

use crate::orders::OrderError;

// ── Text length limits ──────────────────────────────────────────────

/// Names: product, user, recipient
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: city, state, category, tracking location
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Street addresses
pub const MAX_ADDRESS_LEN: usize = 500;

/// Product descriptions
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Line items per order
pub const MAX_ORDER_LINES: usize = 50;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Minimal shape check: one `@` with text on both sides and a dot in the domain
pub fn validate_email(email: &str) -> Result<(), AppError> {
    validate_required_text(email, "email", MAX_EMAIL_LEN)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(AppError::validation("email is not a valid address"));
    }
    Ok(())
}

/// Profile addresses
pub const MAX_PROFILE_ADDRESS_LEN: usize = 200;

/// Reduce a phone number to its ten national digits.
///
/// Spaces, `-`, `.` and parentheses are ignored. A `+91`, `91` or `0`
/// prefix in front of the ten digits is accepted and dropped.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let trimmed = phone.trim();
    let (plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return None,
        }
    }
    let national = match (plus, digits.len()) {
        (false, 10) => digits.as_str(),
        (true, 12) | (false, 12) => digits.strip_prefix("91")?,
        (false, 11) => digits.strip_prefix('0')?,
        _ => return None,
    };
    Some(national.to_string())
}

/// Ten national digits once separators and the country prefix are removed
pub fn is_valid_phone(phone: &str) -> bool {
    normalize_phone(phone).is_some()
}

/// Six ASCII digits, not starting with 0
pub fn is_valid_pincode(pincode: &str) -> bool {
    pincode.len() == 6
        && pincode.bytes().all(|b| b.is_ascii_digit())
        && !pincode.starts_with('0')
}

pub fn validate_shipping_address(addr: &ShippingAddress) -> Result<(), AppError> {
    validate_required_text(&addr.name, "shipping_address.name", MAX_NAME_LEN)?;
    validate_required_text(&addr.address, "shipping_address.address", MAX_ADDRESS_LEN)?;
    validate_required_text(&addr.city, "shipping_address.city", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&addr.state, "shipping_address.state", MAX_SHORT_TEXT_LEN)?;
    if !is_valid_phone(&addr.phone) {
        return Err(AppError::validation(
            "shipping_address.phone must be a 10 digit number",
        ));
    }
    if !is_valid_pincode(&addr.pincode) {
        return Err(AppError::validation(
            "shipping_address.pincode must be 6 digits and not start with 0",
        ));
    }
    Ok(())
}

fn settings_invalid(message: String) -> AppError {
    AppError::with_message(ErrorCode::SettingsInvalid, message)
}

/// Testimonial ratings in 1..=5, unique non-empty ids per section
pub fn validate_site_settings(settings: &SiteSettings) -> Result<(), AppError> {
    fn unique_ids<'a>(
        section: &str,
        ids: impl Iterator<Item = &'a str>,
    ) -> Result<(), AppError> {
        let mut seen = std::collections::HashSet::new();
        for id in ids {
            if id.trim().is_empty() {
                return Err(settings_invalid(format!("{section}: id must not be empty")));
            }
            if !seen.insert(id) {
                return Err(settings_invalid(format!("{section}: duplicate id '{id}'")));
            }
        }
        Ok(())
    }

    unique_ids("banners", settings.banners.iter().map(|b| b.id.as_str()))?;
    unique_ids("stats", settings.stats.iter().map(|s| s.id.as_str()))?;
    unique_ids("deals", settings.deals.iter().map(|d| d.id.as_str()))?;
    unique_ids("categories", settings.categories.iter().map(|c| c.id.as_str()))?;
    unique_ids("navbar_items", settings.navbar_items.iter().map(|n| n.id.as_str()))?;

    let mut testimonial_ids = std::collections::HashSet::new();
    for t in &settings.testimonials {
        if !(1..=5).contains(&t.rating) {
            return Err(settings_invalid(format!(
                "testimonials: rating of '{}' must be between 1 and 5",
                t.name
            )));
        }
        if !testimonial_ids.insert(t.id) {
            return Err(settings_invalid(format!(
                "testimonials: duplicate id {}",
                t.id
            )));
        }
    }

    for deal in &settings.deals {
        if chrono::DateTime::parse_from_rfc3339(&deal.end_time).is_err() {
            return Err(settings_invalid(format!(
                "deals: end_time of '{}' must be an RFC 3339 timestamp",
                deal.id
            )));
        }
    }
    Ok(())
}

// ── Validation helpers (Order actions) ──────────────────────────────

/// Validate a checkout request before any stock is touched
pub fn validate_order_create(req: &OrderCreate) -> Result<(), OrderError> {
    if req.items.is_empty() {
        return Err(OrderError::Validation("order must contain at least one item".into()));
    }
    if req.items.len() > MAX_ORDER_LINES {
        return Err(OrderError::Validation(format!(
            "order has {} lines, max {MAX_ORDER_LINES}",
            req.items.len()
        )));
    }
    if let Some(line) = req.items.iter().find(|l| l.quantity < 1) {
        return Err(OrderError::Validation(format!(
            "quantity for product {} must be at least 1",
            line.product_id
        )));
    }
    validate_shipping_address(&req.shipping_address).map_err(OrderError::from)?;
    validate_optional_text(&req.notes, "notes", MAX_NOTE_LEN).map_err(OrderError::from)?;
    Ok(())
}
