use super::*;

#[test]
fn callback_url_joins_origin() {
    assert_eq!(callback_url("https://markbook.app"), "https://markbook.app/auth/callback");
    assert_eq!(callback_url("http://localhost:3000/"), "http://localhost:3000/auth/callback");
}

#[test]
fn safe_href_allows_web_schemes() {
    assert_eq!(safe_href("https://example.com"), Some("https://example.com".to_owned()));
    assert_eq!(safe_href("http://example.com/a?b"), Some("http://example.com/a?b".to_owned()));
}

#[test]
fn safe_href_blocks_script_schemes() {
    assert_eq!(safe_href("javascript:alert(1)"), None);
    assert_eq!(safe_href("data:text/html,hi"), None);
    assert_eq!(safe_href("not a url"), None);
}

#[test]
fn current_origin_is_none_off_browser() {
    assert_eq!(current_origin(), None);
}
