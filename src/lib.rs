pub mod api;
pub mod components;
pub mod dispatcher;
pub mod interaction;
pub mod loader;
pub mod scrub;
pub mod state;
pub mod timers;
pub mod transform;
pub mod types;
pub mod viewport_sync;

use wasm_bindgen::prelude::wasm_bindgen;

use crate::components::app::App;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    leptos::mount::mount_to_body(App);
}
