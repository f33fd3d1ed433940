//! Shop-level settings: receipt header and UI language.

use tracing::info;

use crate::error::CoreResult;
use crate::types::{AppState, Language, StoreDetails};
use crate::validation::{validate_name, validate_phone};

/// Replaces the store details wholesale.
pub fn update_store_details(state: &mut AppState, details: StoreDetails) -> CoreResult<()> {
    validate_name(&details.name)?;
    validate_phone(&details.phone)?;

    info!(name = %details.name, has_logo = details.logo.is_some(), "Store details updated");
    state.store_details = details;
    Ok(())
}

pub fn set_language(state: &mut AppState, language: Language) {
    state.language = language;
}

/// Flips between English and Bangla, returning the new value.
pub fn toggle_language(state: &mut AppState) -> Language {
    state.language = state.language.toggled();
    state.language
}
