use super::*;

#[test]
fn create_intent_uses_current_draft() {
    let mut state = DashboardState::default();
    state.draft.title = "Example".to_owned();
    state.draft.url = "https://example.com".to_owned();

    assert_eq!(
        create_intent(&state),
        DashboardIntent::Create { title: "Example".to_owned(), url: "https://example.com".to_owned() }
    );
}

#[test]
fn loading_text_defaults_to_progress() {
    assert_eq!(loading_text(&DashboardState::default()), "Loading...");
}

#[test]
fn loading_text_shows_startup_failure() {
    let state = DashboardState { notice: Some("Could not reach the bookmark service".to_owned()), ..DashboardState::default() };
    assert_eq!(loading_text(&state), "Could not reach the bookmark service");
}

fn bookmark(id: &str, title: &str) -> Bookmark {
    Bookmark {
        id: id.to_owned(),
        title: title.to_owned(),
        url: "https://example.com".to_owned(),
        user_id: Some("user-1".to_owned()),
        created_at: "2026-01-01T00:00:00Z".to_owned(),
    }
}

#[test]
fn row_key_follows_id_not_title() {
    assert_ne!(row_key(&bookmark("bm-1", "Same")), row_key(&bookmark("bm-2", "Same")));
    assert_eq!(row_key(&bookmark("bm-1", "Old")), row_key(&bookmark("bm-1", "Renamed")));
}

#[test]
fn typing_in_the_form_does_not_touch_the_list() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let state = RwSignal::new(DashboardState::default());
    let items = bookmark_items(state);
    let renders = Arc::new(AtomicUsize::new(0));
    let counter = renders.clone();
    let rows = Memo::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        items.with(Vec::len)
    });

    assert_eq!(rows.get(), 0);
    state.update(|s| s.draft.title.push_str("Exam"));
    state.update(|s| s.adding = true);
    assert_eq!(rows.get(), 0);
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    state.update(|s| {
        let ticket = s.bookmarks.begin_fetch();
        assert!(s.bookmarks.apply(ticket, vec![bookmark("bm-1", "Example")]));
    });
    assert_eq!(rows.get(), 1);
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}
