//! One bookmark in the dashboard list.

use leptos::prelude::*;

use crate::net::types::Bookmark;
use crate::util::links::safe_href;

/// Title, link and delete button. Non-web URLs render as plain text.
#[component]
pub fn BookmarkRow(bookmark: Bookmark, on_delete: Callback<String>) -> impl IntoView {
    let Bookmark { id, title, url, .. } = bookmark;
    let link = match safe_href(&url) {
        Some(href) => view! {
            <a class="bookmark-row__url" href=href target="_blank" rel="noopener noreferrer">
                {url}
            </a>
        }
        .into_any(),
        None => view! { <span class="bookmark-row__url bookmark-row__url--inert">{url}</span> }.into_any(),
    };

    view! {
        <div class="bookmark-row">
            <div class="bookmark-row__body">
                <p class="bookmark-row__title">{title}</p>
                {link}
            </div>
            <button
                class="btn bookmark-row__delete"
                on:click=move |_| on_delete.run(id.clone())
                title="Delete bookmark"
            >
                "Delete"
            </button>
        </div>
    }
}
