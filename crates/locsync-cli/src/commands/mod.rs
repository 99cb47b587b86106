pub mod add_key;
pub mod check;
pub mod extract_keys;
pub mod schema;
pub mod sync;

use locsync_config::SyncConfig;
use locsync_provider::{DisabledTranslator, HttpTranslator, Translator};

/// The HTTP provider when translation is wanted. Building it checks the
/// provider preconditions, so a disabled provider or missing key fails here
/// before any catalog is read.
pub(crate) fn translator_for(config: &SyncConfig, translate: bool) -> color_eyre::Result<Box<dyn Translator>> {
    if !translate {
        return Ok(Box::new(DisabledTranslator));
    }
    let translator = HttpTranslator::from_config(config)?;
    tracing::debug!(event = "translator_ready", settings = ?translator.settings());
    Ok(Box::new(translator))
}
