//! Identifier validation command.

use logiport_core::validate;

use super::print_line;
use crate::error::CliError;

/// Validate `identifier` and print its normalized form.
pub fn run(identifier: &str) -> Result<(), CliError> {
    let check = validate(identifier);
    match check.error_message() {
        None => {
            print_line(&check.normalized);
            Ok(())
        }
        Some(message) => Err(CliError::InvalidIdentifier(message)),
    }
}
