//! Landing page with the single OAuth sign-in action.

#[cfg(test)]
#[path = "login_test.rs"]
mod tests;

use leptos::prelude::*;

const DEFAULT_PROVIDER: &str = "google";

/// Button text for `provider`, e.g. `google` -> `Login with Google`.
fn login_label(provider: &str) -> String {
    let mut chars = provider.chars();
    match chars.next() {
        Some(first) => format!("Login with {}{}", first.to_uppercase(), chars.as_str()),
        None => "Login".to_owned(),
    }
}

#[cfg(any(test, feature = "hydrate"))]
fn login_failed_message(error: &impl std::fmt::Display) -> String {
    format!("Could not start sign-in: {error}")
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let provider = RwSignal::new(DEFAULT_PROVIDER.to_owned());
    let busy = RwSignal::new(false);
    let info = RwSignal::new(String::new());

    #[cfg(feature = "hydrate")]
    let source = crate::net::api::use_platform::<crate::net::supabase::SupabaseClient>();
    #[cfg(feature = "hydrate")]
    {
        let source = source.clone();
        leptos::task::spawn_local(async move {
            match async { source?.get().await }.await {
                Ok(client) => provider.set(client.provider().to_owned()),
                Err(e) => log::warn!("platform config unavailable: {e}"),
            }
        });
    }

    let on_login = move |_| {
        if busy.get() {
            return;
        }
        busy.set(true);
        info.set(String::new());

        #[cfg(feature = "hydrate")]
        let source = source.clone();
        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            if let Err(e) = start_login(source).await {
                log::warn!("oauth redirect failed: {e}");
                info.set(login_failed_message(&e));
                busy.set(false);
            }
        });
    };

    view! {
        <main class="login-page">
            <button class="login-button" on:click=on_login disabled=move || busy.get()>
                {move || login_label(&provider.get())}
            </button>
            <Show when=move || !info.get().is_empty()>
                <p class="login-message">{move || info.get()}</p>
            </Show>
        </main>
    }
}

/// Send the browser to the provider's consent screen.
#[cfg(feature = "hydrate")]
async fn start_login(
    source: Result<crate::net::api::PlatformSource<crate::net::supabase::SupabaseClient>, crate::net::error::PlatformError>,
) -> Result<(), crate::net::error::PlatformError> {
    use crate::net::error::PlatformError;
    use crate::net::platform::AuthApi;

    let client = source?.get().await?;
    let origin = crate::util::links::current_origin()
        .ok_or_else(|| PlatformError::Config("no page origin".to_owned()))?;
    let redirect_to = crate::util::links::callback_url(&origin);
    client.sign_in_with_oauth(client.provider(), &redirect_to).await
}
