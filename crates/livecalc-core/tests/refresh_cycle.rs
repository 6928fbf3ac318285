//! Refresh cycles driven the way a host editor drives them: notifications
//! drained from the surface, time advanced by hand.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use livecalc_core::{
    BufferSurface, CycleOutcome, EditingSurface, MathRenderer, RefreshController, RefreshOptions,
    Selection, SkipReason,
};
use pretty_assertions::assert_eq;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Forward pending surface notifications to the controller.
fn pump(ctl: &mut RefreshController, surface: &mut BufferSurface, now: Instant) {
    for _ in 0..surface.take_notifications() {
        ctl.content_changed(now);
    }
}

struct CountingRenderer(Arc<AtomicUsize>);

impl MathRenderer for CountingRenderer {
    fn render(&self, latex: &str) -> String {
        self.0.fetch_add(1, Ordering::SeqCst);
        format!("<em>{}</em>", latex)
    }
}

#[test]
fn test_plain_text_never_replaced() {
    let start = Instant::now();
    let mut surface = BufferSurface::new("");
    let mut ctl = RefreshController::attach(&mut surface, RefreshOptions::default()).unwrap();

    surface.edit("<p>Nothing to compute here.</p>");
    pump(&mut ctl, &mut surface, start);
    assert_eq!(
        ctl.poll(start + ms(300), &mut surface),
        CycleOutcome::Skipped(SkipReason::NoPlaceholders)
    );
    assert_eq!(surface.replace_count(), 0);
}

#[test]
fn test_debounce_coalesces_bursts() {
    let start = Instant::now();
    let mut surface = BufferSurface::new("");
    let mut ctl = RefreshController::attach(&mut surface, RefreshOptions::default()).unwrap();

    surface.edit("<p>{1</p>");
    pump(&mut ctl, &mut surface, start);
    surface.edit("<p>{1+</p>");
    pump(&mut ctl, &mut surface, start + ms(200));
    surface.edit("<p>{1+1}</p>");
    pump(&mut ctl, &mut surface, start + ms(400));

    assert_eq!(ctl.poll(start + ms(500), &mut surface), CycleOutcome::NotDue);
    assert!(ctl.poll(start + ms(700), &mut surface).applied());
    assert_eq!(surface.replace_count(), 1);
    assert_eq!(surface.content(), "<p>2</p>");
}

#[test]
fn test_own_replacement_is_not_an_edit() {
    let start = Instant::now();
    let mut surface = BufferSurface::new("");
    let mut ctl = RefreshController::attach(&mut surface, RefreshOptions::default()).unwrap();

    surface.edit("<p>{6*7} and {oops +}</p>");
    pump(&mut ctl, &mut surface, start);
    assert!(ctl.poll(start + ms(300), &mut surface).applied());

    // The replacement raised a notification of its own.
    pump(&mut ctl, &mut surface, start + ms(301));
    assert_eq!(
        ctl.poll(start + ms(601), &mut surface),
        CycleOutcome::Skipped(SkipReason::OwnReplacement)
    );
    assert_eq!(surface.replace_count(), 1);
    assert_eq!(ctl.last_applied(), Some(surface.content()));
}

#[test]
fn test_rendered_snapshot_is_stable_for_a_fresh_controller() {
    let start = Instant::now();
    let mut surface = BufferSurface::new("<p>{6*7} and {oops +} and {$$x$$}</p>");
    let mut first = RefreshController::attach(&mut surface, RefreshOptions::default()).unwrap();
    assert!(first.refresh_now(start, &mut surface).applied());
    let rendered = surface.content().to_string();
    first.teardown(&mut surface);

    let mut second = RefreshController::attach(&mut surface, RefreshOptions::default()).unwrap();
    let outcome = second.refresh_now(start, &mut surface);
    assert!(!outcome.applied());
    assert_eq!(surface.content(), rendered);
    assert_eq!(surface.replace_count(), 1);
}

#[test]
fn test_stray_closing_brace_is_unchanged() {
    let mut surface = BufferSurface::new("<p>a } b</p>");
    let mut ctl = RefreshController::attach(&mut surface, RefreshOptions::default()).unwrap();
    assert_eq!(
        ctl.refresh_now(Instant::now(), &mut surface),
        CycleOutcome::Skipped(SkipReason::Unchanged)
    );
}

#[test]
fn test_cache_spans_cycles() {
    let start = Instant::now();
    let renders = Arc::new(AtomicUsize::new(0));
    let mut surface = BufferSurface::new("");
    let mut ctl = RefreshController::attach(&mut surface, RefreshOptions::default())
        .unwrap()
        .with_renderer(Box::new(CountingRenderer(renders.clone())));

    surface.edit("<p>{$$x$$}</p>");
    ctl.refresh_now(start, &mut surface);
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    let next = format!("{} <p>{{$$x$$}} {{$$x$$}}</p>", surface.content());
    surface.edit(next);
    ctl.refresh_now(start, &mut surface);
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert_eq!(surface.content(), "<p><em>x</em></p> <p><em>x</em> <em>x</em></p>");

    let next = format!("{} {{$$x $$}}", surface.content());
    surface.edit(next);
    ctl.refresh_now(start, &mut surface);
    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(ctl.cache().len(), 2);
}

#[test]
fn test_selection_survives_length_change() {
    let start = Instant::now();
    let mut surface = BufferSurface::new("");
    let mut ctl = RefreshController::attach(&mut surface, RefreshOptions::default()).unwrap();

    surface.edit("<p>Total {100 * 3 + 21}</p>");
    surface.set_selection(Selection::caret(5));
    pump(&mut ctl, &mut surface, start);

    match ctl.poll(start + ms(300), &mut surface) {
        CycleOutcome::Applied(cycle) => assert_eq!(cycle.selection, Selection::new(5, 5)),
        other => panic!("expected a replacement, got {:?}", other),
    }
    assert_eq!(surface.content(), "<p>Total 321</p>");
    assert_eq!(surface.selection(), Selection::new(5, 5));
}

#[test]
fn test_tables_and_functions_in_one_document() {
    let mut surface = BufferSurface::new(
        "<table><tr><th>Qty</th><th>Price</th></tr>\
         <tr><td>2</td><td>4.5</td></tr>\
         <tr><td>3</td><td>1.25</td></tr></table>\
         <p>Items: {sum(table1[A2:A3])}, with tax {withTax(sum(table1[B2:B3]))}</p>",
    );
    let mut ctl = RefreshController::attach(&mut surface, RefreshOptions::default())
        .unwrap()
        .with_functions("fn withTax(x) { x * 1.2 }")
        .unwrap();

    match ctl.refresh_now(Instant::now(), &mut surface) {
        CycleOutcome::Applied(cycle) => assert_eq!((cycle.placeholders, cycle.failures), (2, 0)),
        other => panic!("expected a replacement, got {:?}", other),
    }
    assert!(surface.content().ends_with("<p>Items: 5, with tax 6.9</p>"));
}
