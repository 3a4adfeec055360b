//! Add-bookmark form bound to the dashboard draft.

#[cfg(test)]
#[path = "bookmark_form_test.rs"]
mod tests;

use leptos::prelude::*;

use crate::state::dashboard::DashboardState;

fn submit_label(adding: bool) -> &'static str {
    if adding { "Adding..." } else { "Add" }
}

/// Title and URL inputs plus the submit button. The button stays disabled
/// while a create is in flight or either field is blank.
#[component]
pub fn BookmarkForm(state: RwSignal<DashboardState>, on_submit: Callback<()>) -> impl IntoView {
    let on_form_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if state.with_untracked(|s| s.adding) {
            return;
        }
        on_submit.run(());
    };

    view! {
        <form class="bookmark-form" on:submit=on_form_submit>
            <input
                class="bookmark-form__title"
                type="text"
                placeholder="Title"
                prop:value=move || state.with(|s| s.draft.title.clone())
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    state.update(|s| s.draft.title = value);
                }
            />
            <input
                class="bookmark-form__url"
                type="text"
                placeholder="https://example.com"
                prop:value=move || state.with(|s| s.draft.url.clone())
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    state.update(|s| s.draft.url = value);
                }
            />
            <button
                class="btn bookmark-form__submit"
                type="submit"
                disabled=move || !state.with(DashboardState::can_submit)
            >
                {move || submit_label(state.with(|s| s.adding))}
            </button>
        </form>
    }
}
