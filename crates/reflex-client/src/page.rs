//! What the hosting page provides: element ids, session identity, the
//! anti-forgery token and an optional config override.

use reflex_core::config::GameConfig;

use crate::diag;

pub const GAME_AREA_ID: &str = "game-area";
pub const SCORE_ID: &str = "score";
pub const COMBO_ID: &str = "combo";
pub const TIME_ID: &str = "time";
pub const SESSION_ID_INPUT: &str = "session-id";
/// Attribute on the game area holding a JSON `GameConfig` override.
pub const CONFIG_ATTR: &str = "data-config";
/// CSS class given to every target element.
pub const TARGET_CLASS: &str = "target";

/// Config from the page's JSON override, or defaults when it is absent or
/// unusable.
pub fn config_from_attr(raw: Option<&str>) -> GameConfig {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return GameConfig::default();
    };
    match GameConfig::from_json_str(raw) {
        Ok(config) => config,
        Err(e) => {
            diag::console_warn!("Ignoring {CONFIG_ATTR}: {e}");
            GameConfig::default()
        },
    }
}

/// Seed for target placement from a `Math.random()` sample.
pub fn seed_from_unit(sample: f64) -> u64 {
    (sample.clamp(0.0, 1.0) * u64::MAX as f64) as u64
}

#[cfg(target_family = "wasm")]
pub use browser::PageContext;

#[cfg(target_family = "wasm")]
mod browser {
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlDocument, HtmlInputElement};

    use reflex_core::config::GameConfig;
    use reflex_core::csrf::{CSRF_FORM_FIELD, resolve_token};
    use reflex_core::session::SessionId;

    use super::{CONFIG_ATTR, GAME_AREA_ID, SESSION_ID_INPUT, config_from_attr};

    /// Inputs read once at load.
    pub struct PageContext {
        pub session_id: SessionId,
        pub csrf_token: Option<String>,
        pub config: GameConfig,
    }

    impl PageContext {
        pub fn read(document: &Document) -> Result<Self, JsValue> {
            let session_id = document
                .get_element_by_id(SESSION_ID_INPUT)
                .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                .map(|input| input.value())
                .ok_or_else(|| JsValue::from_str("missing #session-id input"))?;

            let config_attr = document
                .get_element_by_id(GAME_AREA_ID)
                .and_then(|el| el.get_attribute(CONFIG_ATTR));

            Ok(Self {
                session_id: SessionId::new(session_id),
                csrf_token: csrf_token(document),
                config: config_from_attr(config_attr.as_deref()),
            })
        }
    }

    fn csrf_token(document: &Document) -> Option<String> {
        let cookies = document
            .dyn_ref::<HtmlDocument>()
            .and_then(|doc| doc.cookie().ok())
            .unwrap_or_default();
        let selector = format!("[name={CSRF_FORM_FIELD}]");
        let form_field = document
            .query_selector(&selector)
            .ok()
            .flatten()
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value());
        resolve_token(&cookies, form_field.as_deref())
    }
}
