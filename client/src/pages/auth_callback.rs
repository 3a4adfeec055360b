//! OAuth return route: stores the session from the redirect fragment and
//! moves on to the dashboard.

#[cfg(test)]
#[path = "auth_callback_test.rs"]
mod tests;

use leptos::prelude::*;
#[cfg(feature = "hydrate")]
use leptos_router::NavigateOptions;
#[cfg(feature = "hydrate")]
use leptos_router::hooks::use_navigate;

use crate::util::links::LOGIN_PATH;

/// What the callback view is showing.
#[cfg_attr(not(feature = "hydrate"), allow(dead_code))]
#[derive(Clone, Debug, PartialEq, Eq)]
enum CallbackStatus {
    Working,
    Failed(String),
}

impl CallbackStatus {
    fn message(&self) -> String {
        match self {
            Self::Working => "Signing you in...".to_owned(),
            Self::Failed(reason) => format!("Sign-in failed: {reason}"),
        }
    }
}

#[component]
pub fn AuthCallbackPage() -> impl IntoView {
    let status = RwSignal::new(CallbackStatus::Working);

    #[cfg(feature = "hydrate")]
    {
        let navigate = use_navigate();
        let source = crate::net::api::use_platform::<crate::net::supabase::SupabaseClient>();
        leptos::task::spawn_local(async move {
            match complete_redirect(source).await {
                Ok(()) => {
                    let options = NavigateOptions { replace: true, ..NavigateOptions::default() };
                    navigate(crate::util::links::DASHBOARD_PATH, options);
                }
                Err(e) => {
                    log::warn!("oauth callback failed: {e}");
                    let reason = match e {
                        crate::net::error::PlatformError::OAuth(reason) => reason,
                        other => other.to_string(),
                    };
                    status.set(CallbackStatus::Failed(reason));
                }
            }
        });
    }

    view! {
        <main class="callback-page">
            <p class="callback-page__status">{move || status.get().message()}</p>
            <Show when=move || matches!(status.get(), CallbackStatus::Failed(_))>
                <a class="callback-page__back" href=LOGIN_PATH>"Back to login"</a>
            </Show>
        </main>
    }
}

#[cfg(feature = "hydrate")]
async fn complete_redirect(
    source: Result<crate::net::api::PlatformSource<crate::net::supabase::SupabaseClient>, crate::net::error::PlatformError>,
) -> Result<(), crate::net::error::PlatformError> {
    use crate::net::error::PlatformError;

    let location = web_sys::window()
        .ok_or_else(|| PlatformError::Config("no browser window".to_owned()))?
        .location();
    let mut fragment = location.hash().unwrap_or_default();
    if fragment.trim_start_matches('#').is_empty() {
        fragment = location.search().unwrap_or_default();
    }
    let client = source?.get().await?;
    client.complete_oauth_redirect(&fragment).await?;
    Ok(())
}
