//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::input::buttons::BUTTON_COUNT;

/// Longest controller name accepted during identification.
pub const MAX_CONTROLLER_NAME_LEN: usize = 32;

/// Validates a controller display name: 1 to 32 printable characters.
///
/// # Examples
///
/// ```ignore
/// validate_controller_name("left pad") // Ok
/// validate_controller_name("")         // Err - empty
/// ```
pub fn validate_controller_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_CONTROLLER_NAME_LEN {
        let mut err = ValidationError::new("controller_name_length");
        err.message = Some(
            format!(
                "Controller name must be 1 to {MAX_CONTROLLER_NAME_LEN} characters (got {len})"
            )
            .into(),
        );
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("controller_name_format");
        err.message = Some("Controller name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a 1-based physical button number.
pub fn validate_button(button: u8) -> Result<(), ValidationError> {
    if !(1..=BUTTON_COUNT).contains(&button) {
        let mut err = ValidationError::new("button_range");
        err.message = Some(format!("Button must be between 1 and {BUTTON_COUNT} (got {button})").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_names() {
        assert!(validate_controller_name("pad").is_ok());
        assert!(validate_controller_name("Fruit Jam buttons").is_ok());
        assert!(validate_controller_name("").is_err());
        assert!(validate_controller_name(&"x".repeat(33)).is_err());
        assert!(validate_controller_name("tab\there").is_err());
    }

    #[test]
    fn button_numbers() {
        assert!(validate_button(1).is_ok());
        assert!(validate_button(3).is_ok());
        assert!(validate_button(0).is_err());
        assert!(validate_button(4).is_err());
    }
}
