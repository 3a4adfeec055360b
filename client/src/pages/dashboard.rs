//! Dashboard page: viewer identity, add form and the live bookmark list.
//!
//! SYSTEM CONTEXT
//! ==============
//! This is the authenticated landing route. The page owns the view state
//! signal and one `DashboardSync` running as a local task. Event handlers
//! only push `DashboardIntent`s into a channel; the task consumes them.
//! The platform client comes from the context `App` provides.
//! Unmounting closes the `ViewScope`, which stops the change feed and drops
//! any result still in flight.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;

use futures::channel::mpsc;
use leptos::prelude::*;
#[cfg(feature = "hydrate")]
use leptos_router::NavigateOptions;
#[cfg(feature = "hydrate")]
use leptos_router::hooks::use_navigate;

use crate::components::bookmark_form::BookmarkForm;
use crate::components::bookmark_row::BookmarkRow;
use crate::net::types::Bookmark;
use crate::state::dashboard::DashboardState;
use crate::sync::{DashboardIntent, ViewScope};

type IntentSender = StoredValue<mpsc::UnboundedSender<DashboardIntent>>;

fn send_intent(sender: IntentSender, intent: DashboardIntent) {
    sender.with_value(|tx| {
        if tx.unbounded_send(intent).is_err() {
            log::debug!("dashboard intent dropped: synchronizer stopped");
        }
    });
}

/// Create intent from the current draft.
fn create_intent(state: &DashboardState) -> DashboardIntent {
    DashboardIntent::Create { title: state.draft.title.clone(), url: state.draft.url.clone() }
}

/// The rendered list, isolated from draft and flag changes so typing in the
/// form leaves the rows alone.
fn bookmark_items(state: RwSignal<DashboardState>) -> Memo<Vec<Bookmark>> {
    Memo::new(move |_| state.with(|s| s.bookmarks.items.clone()))
}

fn row_key(bookmark: &Bookmark) -> String {
    bookmark.id.clone()
}

fn loading_text(state: &DashboardState) -> String {
    state.notice.clone().unwrap_or_else(|| "Loading...".to_owned())
}

/// Dashboard page. Redirects to login when there is no session.
#[component]
pub fn DashboardPage() -> impl IntoView {
    let state = RwSignal::new(DashboardState::default());
    let scope = ViewScope::new();
    let (tx, rx) = mpsc::unbounded::<DashboardIntent>();
    let sender: IntentSender = StoredValue::new(tx);

    {
        let scope = scope.clone();
        on_cleanup(move || scope.close());
    }

    #[cfg(feature = "hydrate")]
    leptos::task::spawn_local(run_dashboard(
        crate::net::api::use_platform::<crate::net::supabase::SupabaseClient>(),
        state,
        scope,
        rx,
        use_navigate(),
    ));
    #[cfg(not(feature = "hydrate"))]
    let _ = (scope, rx);

    let on_submit = Callback::new(move |()| send_intent(sender, state.with_untracked(create_intent)));
    let on_delete = Callback::new(move |id: String| send_intent(sender, DashboardIntent::Delete { id }));
    let on_logout = move |_| send_intent(sender, DashboardIntent::Logout);
    let items = bookmark_items(state);

    view! {
        <Show
            when=move || !state.with(|s| s.loading)
            fallback=move || {
                view! {
                    <div class="dashboard-page dashboard-page--loading">
                        <p>{move || state.with(loading_text)}</p>
                    </div>
                }
            }
        >
            <div class="dashboard-page">
                <header class="dashboard-page__header">
                    <div>
                        <h1>"Dashboard"</h1>
                        <p class="dashboard-page__viewer">
                            "Logged in as: "
                            {move || state.with(|s| s.viewer_email().unwrap_or_default().to_owned())}
                        </p>
                    </div>
                    <button class="btn dashboard-page__logout" on:click=on_logout>
                        "Logout"
                    </button>
                </header>

                <BookmarkForm state=state on_submit=on_submit />

                <Show when=move || state.with(|s| s.notice.is_some())>
                    <p class="dashboard-page__notice">
                        {move || state.with(|s| s.notice.clone()).unwrap_or_default()}
                    </p>
                </Show>

                <section class="bookmark-list">
                    <Show when=move || items.with(Vec::is_empty)>
                        <p class="bookmark-list__empty">"No bookmarks yet."</p>
                    </Show>
                    <For
                        each=move || items.get()
                        key=row_key
                        children=move |bookmark| view! { <BookmarkRow bookmark=bookmark on_delete=on_delete /> }
                    />
                </section>
            </div>
        </Show>
    }
}

/// Session guard, then the intent loop, then navigation on logout.
#[cfg(feature = "hydrate")]
async fn run_dashboard<P, N>(
    source: Result<crate::net::api::PlatformSource<P>, crate::net::error::PlatformError>,
    state: RwSignal<DashboardState>,
    scope: ViewScope,
    intents: mpsc::UnboundedReceiver<DashboardIntent>,
    navigate: N,
) where
    P: crate::net::platform::Platform + 'static,
    N: Fn(&str, NavigateOptions) + Clone + 'static,
{
    use std::rc::Rc;

    use crate::sync::{Activation, BrowserSpawner, DashboardSync, LoopExit};
    use crate::util::links::LOGIN_PATH;

    let platform = match async { source?.get().await }.await {
        Ok(platform) => platform,
        Err(e) => {
            log::error!("platform unavailable: {e}");
            state.update(|s| s.notice = Some(format!("Could not reach the bookmark service: {e}")));
            return;
        }
    };

    let sync = DashboardSync::new(platform, state, scope, Rc::new(BrowserSpawner));
    match sync.activate().await {
        Activation::Ready => {}
        Activation::Redirect => {
            navigate(LOGIN_PATH, NavigateOptions::default());
            return;
        }
        Activation::Cancelled => return,
    }

    let on_rejected = Rc::new(|reason: crate::util::validate::ValidationError| {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(&reason.to_string());
        }
    });
    if sync.run_intents(intents, on_rejected).await == LoopExit::LoggedOut {
        navigate(LOGIN_PATH, NavigateOptions::default());
    }
}
