use leptos::prelude::*;

use crate::components::viewport::InteractionViewport;
use crate::state::AppState;

#[component]
pub fn App() -> impl IntoView {
    let state = AppState::new();
    provide_context(state);

    view! {
        <div class="app">
            <MainArea />
        </div>
    }
}

#[component]
fn MainArea() -> impl IntoView {
    view! {
        <div class="main">
            <div class="toolbar">
                <span style="color: #666">"Lightbox"</span>
            </div>
            <InteractionViewport />
        </div>
    }
}
