use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::Dispose;

use super::*;

#[test]
fn shared_cell_reads_and_writes() {
    let cell = Rc::new(RefCell::new(1_u32));
    let other = cell.clone();

    assert_eq!(cell.modify(|v| {
        *v += 1;
        *v
    }), Some(2));
    assert_eq!(other.inspect(|v| *v), Some(2));
}

#[test]
fn signal_store_round_trips_values() {
    let signal = RwSignal::new(String::from("a"));
    signal.modify(|s| s.push('b'));
    assert_eq!(signal.inspect(Clone::clone), Some("ab".to_owned()));
}

#[test]
fn disposed_signal_reports_gone() {
    let signal = RwSignal::new(0_u8);
    signal.dispose();
    assert_eq!(signal.modify(|v| *v += 1), None);
    assert_eq!(signal.inspect(|v| *v), None);
}
