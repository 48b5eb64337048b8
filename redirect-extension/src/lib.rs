//! Redirect Extension
//!
//! WebExtension background adapter. Compiled to `wasm32`, it registers the
//! watch and player `onBeforeRequest` listeners and drives the browser's
//! `tabs` API on behalf of `redirect-core`.

pub mod console;

#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(target_arch = "wasm32")]
pub use browser::{start, BrowserHost};

/// `management.getSelf().installType` of an unpacked extension
pub const DEVELOPMENT_INSTALL_TYPE: &str = "development";

pub fn is_development_install_type(install_type: &str) -> bool {
    install_type == DEVELOPMENT_INSTALL_TYPE
}
