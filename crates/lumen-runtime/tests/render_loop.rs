//! Frames through the full loop against a headless terminal: diff
//! minimality, regions, key routing and render requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use lumen_core::{Identity, KeyCode, KeyEvent, KeyEventKind, StateKey, StateWriter};
use lumen_layout::Alignment;
use lumen_render::HeadlessTerminal;
use lumen_render::ansi::DIM;
use lumen_runtime::{KeyOutcome, RenderLoop, RenderLoopConfig};
use lumen_widgets::prelude::*;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code)
}

fn lines_view(model: &Arc<Mutex<Vec<String>>>) -> AnyView {
    let lines = model.lock().unwrap().clone();
    VStack::new()
        .children(lines.into_iter().map(Text::new))
        .boxed()
}

// ── Diffing ──────────────────────────────────────────────────────────────

#[test]
fn one_changed_line_costs_one_write() {
    let model = Arc::new(Mutex::new(
        (0..24).map(|i| format!("line {i}")).collect::<Vec<_>>(),
    ));
    let m = Arc::clone(&model);
    let mut rl = RenderLoop::new(
        HeadlessTerminal::new(40, 24),
        RenderLoopConfig::default(),
        move || lines_view(&m),
    );

    let first = rl.render().unwrap();
    assert_eq!(first.main.rows_written, 24);
    assert!(first.status_bar.is_none());

    model.lock().unwrap()[7] = "changed".into();
    rl.terminal_mut().take_writes();
    let second = rl.render().unwrap();
    assert_eq!(second.main.rows_written, 1);
    assert_eq!(second.main.rows_skipped, 23);

    let writes = rl.terminal().writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].row, 7);
    assert_eq!(rl.terminal().plain_rows()[7].trim_end(), "changed");
    assert_eq!(rl.frame_count(), 2);
}

#[test]
fn resize_repaints_every_row() {
    let mut rl = RenderLoop::new(
        HeadlessTerminal::new(20, 6),
        RenderLoopConfig::default(),
        || Text::new("steady").boxed(),
    );
    rl.render().unwrap();
    assert_eq!(rl.render().unwrap().main.rows_written, 0);

    rl.terminal_mut().resize(30, 10);
    rl.resize(30, 10);
    assert_eq!(rl.diff_generations().0, 1);
    let stats = rl.render().unwrap();
    assert_eq!(stats.main.rows_written, 10);
    assert_eq!(rl.terminal().plain_rows()[0].len(), 30);
}

#[test]
fn failed_write_forces_full_repaint() {
    let mut rl = RenderLoop::new(
        HeadlessTerminal::new(10, 3),
        RenderLoopConfig::default(),
        || Text::new("x").boxed(),
    );
    rl.terminal_mut().set_fail_writes(true);
    assert!(rl.render().is_err());

    rl.terminal_mut().set_fail_writes(false);
    assert_eq!(rl.render().unwrap().main.rows_written, 3);
}

// ── Regions ──────────────────────────────────────────────────────────────

#[test]
fn status_bar_takes_bottom_rows() {
    let mut rl = RenderLoop::new(
        HeadlessTerminal::new(20, 5),
        RenderLoopConfig::default(),
        || Text::new("body").boxed(),
    )
    .with_status_bar(|| Text::new("status").boxed());

    let stats = rl.render().unwrap();
    assert_eq!(stats.main.rows_written, 4);
    assert_eq!(stats.status_bar.map(|s| s.rows_written), Some(1));

    let rows = rl.terminal().plain_rows();
    assert!(rows[0].starts_with("body"));
    assert!(rows[4].starts_with("status"));
    let theme = lumen_widgets::Theme::default();
    assert!(rl.terminal().row(4).unwrap().starts_with(&theme.status_bar));
}

#[test]
fn status_bar_alignment_and_height_clamp() {
    let config = RenderLoopConfig::default()
        .status_bar_height(3)
        .status_bar_alignment(Alignment::Trailing);
    let mut rl = RenderLoop::new(HeadlessTerminal::new(20, 2), config, || {
        Text::new("body").boxed()
    })
    .with_status_bar(|| Text::new("status").boxed());

    let stats = rl.render().unwrap();
    // Status bar gets every row of a terminal shorter than it asks for.
    assert_eq!(stats.main.rows_written, 0);
    assert_eq!(stats.status_bar.map(|s| s.rows_written), Some(2));
    assert_eq!(rl.terminal().plain_rows()[0], format!("{:>20}", "status"));
}

#[test]
fn dimming_never_reaches_status_bar() {
    let mut rl = RenderLoop::new(
        HeadlessTerminal::new(20, 3),
        RenderLoopConfig::default(),
        || Text::new("body").boxed(),
    )
    .with_status_bar(|| Text::new("status").boxed());

    rl.render().unwrap();
    assert!(!rl.terminal().row(0).unwrap().contains(DIM));

    rl.set_main_dimmed(true);
    assert!(rl.render_if_requested().unwrap().is_some());
    assert!(rl.terminal().row(0).unwrap().contains(DIM));
    assert!(!rl.terminal().row(2).unwrap().contains(DIM));
}

#[test]
fn removed_views_are_evicted() {
    let show_field = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&show_field);
    let mut rl = RenderLoop::new(
        HeadlessTerminal::new(30, 4),
        RenderLoopConfig::default(),
        move || {
            let mut stack = VStack::new().child(Text::new("title"));
            if flag.load(Ordering::SeqCst) {
                stack = stack.child(TextField::new("name"));
            }
            stack.boxed()
        },
    );

    assert_eq!(rl.render().unwrap().evicted, 0);
    assert_eq!(rl.render().unwrap().evicted, 0);
    let before = rl.storage().lock().len();
    assert!(before > 0);

    show_field.store(false, Ordering::SeqCst);
    let stats = rl.render().unwrap();
    assert!(stats.evicted > 0);
    assert!(rl.storage().lock().len() < before);
    assert_eq!(rl.focus().focused_id(), None);
}

// ── Key routing ──────────────────────────────────────────────────────────

fn button_loop(presses: &Arc<AtomicUsize>) -> RenderLoop<HeadlessTerminal> {
    let presses = Arc::clone(presses);
    RenderLoop::new(
        HeadlessTerminal::new(20, 3),
        RenderLoopConfig::default(),
        move || {
            let presses = Arc::clone(&presses);
            VStack::new()
                .child(Button::new("Go", move || {
                    presses.fetch_add(1, Ordering::SeqCst);
                })
                .focus_id("go"))
                .child(Button::new("Stop", || {}).focus_id("stop"))
                .boxed()
        },
    )
}

#[test]
fn focused_control_gets_keys_first() {
    let presses = Arc::new(AtomicUsize::new(0));
    let mut rl = button_loop(&presses);
    rl.render().unwrap();
    assert_eq!(rl.focus().focused_id(), Some("go"));

    assert_eq!(rl.dispatch_key(&key(KeyCode::Enter)), KeyOutcome::Handled);
    assert_eq!(presses.load(Ordering::SeqCst), 1);

    assert_eq!(rl.dispatch_key(&key(KeyCode::Tab)), KeyOutcome::FocusMoved);
    assert_eq!(rl.focus().focused_id(), Some("stop"));
    assert_eq!(rl.dispatch_key(&key(KeyCode::BackTab)), KeyOutcome::FocusMoved);
    assert_eq!(rl.focus().focused_id(), Some("go"));
}

#[test]
fn escape_releases_focus_once() {
    let presses = Arc::new(AtomicUsize::new(0));
    let mut rl = button_loop(&presses);
    rl.render().unwrap();

    assert_eq!(rl.dispatch_key(&key(KeyCode::Escape)), KeyOutcome::FocusMoved);
    assert_eq!(rl.focus().focused_id(), None);
    assert_eq!(rl.dispatch_key(&key(KeyCode::Escape)), KeyOutcome::Unhandled);

    // Nothing focused: Enter goes nowhere.
    assert_eq!(rl.dispatch_key(&key(KeyCode::Enter)), KeyOutcome::Unhandled);
    assert_eq!(presses.load(Ordering::SeqCst), 0);

    // Released focus stays released across frames.
    rl.render().unwrap();
    assert_eq!(rl.focus().focused_id(), None);
}

#[test]
fn releases_are_ignored() {
    let presses = Arc::new(AtomicUsize::new(0));
    let mut rl = button_loop(&presses);
    rl.render().unwrap();

    let release = key(KeyCode::Enter).with_kind(KeyEventKind::Release);
    assert_eq!(rl.dispatch_key(&release), KeyOutcome::Unhandled);
    assert_eq!(presses.load(Ordering::SeqCst), 0);
}

#[test]
fn tab_navigation_can_be_disabled() {
    let mut rl = RenderLoop::new(
        HeadlessTerminal::new(20, 3),
        RenderLoopConfig::default().tab_navigation(false).autofocus(false),
        || Button::new("Go", || {}).focus_id("go").boxed(),
    );
    rl.render().unwrap();
    assert_eq!(rl.focus().focused_id(), None);
    assert_eq!(rl.dispatch_key(&key(KeyCode::Tab)), KeyOutcome::Unhandled);
}

#[test]
fn global_handlers_catch_unfocused_keys() {
    let quit = Arc::new(AtomicBool::new(false));
    let q = Arc::clone(&quit);
    let mut rl = RenderLoop::new(
        HeadlessTerminal::new(20, 3),
        RenderLoopConfig::default(),
        move || {
            let q = Arc::clone(&q);
            Text::new("press q")
                .on_key(move |k| {
                    if k.is_char('q') {
                        q.store(true, Ordering::SeqCst);
                        true
                    } else {
                        false
                    }
                })
                .boxed()
        },
    );
    rl.render().unwrap();

    assert_eq!(
        rl.dispatch_key(&key(KeyCode::Char('z'))),
        KeyOutcome::Unhandled
    );
    assert!(!quit.load(Ordering::SeqCst));
    assert_eq!(rl.dispatch_key(&key(KeyCode::Char('q'))), KeyOutcome::Handled);
    assert!(quit.load(Ordering::SeqCst));
}

#[test]
fn typing_into_a_field_shows_on_next_frame() {
    let mut rl = RenderLoop::new(
        HeadlessTerminal::new(30, 2),
        RenderLoopConfig::default(),
        || TextField::new("name").focus_id("name").boxed(),
    );
    rl.render().unwrap();
    for c in "ada".chars() {
        assert_eq!(rl.dispatch_key(&key(KeyCode::Char(c))), KeyOutcome::Handled);
    }
    assert!(rl.render_if_requested().unwrap().is_some());
    assert!(rl.terminal().plain_rows()[0].starts_with("ada"));
}

// ── Render requests ──────────────────────────────────────────────────────

#[test]
fn render_only_when_requested() {
    let presses = Arc::new(AtomicUsize::new(0));
    let mut rl = button_loop(&presses);
    rl.render().unwrap();
    assert!(rl.render_if_requested().unwrap().is_none());

    rl.dispatch_key(&key(KeyCode::Enter));
    assert!(rl.render_if_requested().unwrap().is_some());
    assert!(rl.render_if_requested().unwrap().is_none());

    let requester = rl.requester();
    std::thread::spawn(move || requester.request_render())
        .join()
        .unwrap();
    assert!(rl.render_if_requested().unwrap().is_some());
    assert_eq!(rl.frame_count(), 3);
}

#[test]
fn unhandled_keys_do_not_request_frames() {
    let mut rl = RenderLoop::new(
        HeadlessTerminal::new(20, 3),
        RenderLoopConfig::default(),
        || Text::new("static").boxed(),
    );
    rl.render().unwrap();
    assert_eq!(rl.dispatch_key(&key(KeyCode::Char('x'))), KeyOutcome::Unhandled);
    assert!(rl.render_if_requested().unwrap().is_none());
}

// ── Callbacks writing state ──────────────────────────────────────────────

fn counter_slot(rl: &RenderLoop<HeadlessTerminal>) -> StateKey {
    let key = StateKey::new(Identity::root("counters").child("Clicks", 0), 0);
    rl.storage().lock().insert(key.clone(), 0_u32);
    key
}

type SharedWriter = Arc<Mutex<Option<(StateWriter, StateKey)>>>;

fn bump(slot: &SharedWriter) {
    if let Some((writer, key)) = slot.lock().unwrap().as_ref() {
        assert!(writer.update::<u32, _>(key, |n| *n += 1));
    }
}

#[test]
fn appear_actions_can_write_state() {
    let slot: SharedWriter = Arc::default();
    let s = Arc::clone(&slot);
    let mut rl = RenderLoop::new(
        HeadlessTerminal::new(20, 2),
        RenderLoopConfig::default(),
        move || {
            let s = Arc::clone(&s);
            Text::new("hi").on_appear(move || bump(&s)).boxed()
        },
    );
    let clicks = counter_slot(&rl);
    *slot.lock().unwrap() = Some((rl.storage().writer(rl.requester()), clicks.clone()));

    rl.render().unwrap();
    assert_eq!(rl.storage().lock().get::<u32>(&clicks), Some(&1));
    assert!(rl.render_if_requested().unwrap().is_some());
    assert_eq!(rl.storage().lock().get::<u32>(&clicks), Some(&1));
}

#[test]
fn button_actions_can_write_state() {
    let slot: SharedWriter = Arc::default();
    let s = Arc::clone(&slot);
    let mut rl = RenderLoop::new(
        HeadlessTerminal::new(20, 2),
        RenderLoopConfig::default(),
        move || {
            let s = Arc::clone(&s);
            Button::new("Add", move || bump(&s)).focus_id("add").boxed()
        },
    );
    let clicks = counter_slot(&rl);
    *slot.lock().unwrap() = Some((rl.storage().writer(rl.requester()), clicks.clone()));

    rl.render().unwrap();
    assert_eq!(rl.dispatch_key(&key(KeyCode::Enter)), KeyOutcome::Handled);
    assert_eq!(rl.dispatch_key(&key(KeyCode::Enter)), KeyOutcome::Handled);
    assert_eq!(rl.storage().lock().get::<u32>(&clicks), Some(&2));

    // The button's own state survives being dispatched to.
    rl.render().unwrap();
    assert_eq!(rl.focus().focused_id(), Some("add"));
    assert_eq!(rl.dispatch_key(&key(KeyCode::Enter)), KeyOutcome::Handled);
    assert_eq!(rl.storage().lock().get::<u32>(&clicks), Some(&3));
}

// ── Tracing ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
}

struct SpanCapture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct CaptureHandle {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureHandle {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let message = visitor
            .0
            .into_iter()
            .find(|(name, _)| name == "message")
            .map(|(_, value)| value)
            .unwrap_or_default();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
        });
    }
}

fn with_captured_tracing<F: FnOnce()>(f: F) -> CaptureHandle {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = SpanCapture {
        spans: Arc::clone(&spans),
        events: Arc::clone(&events),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    CaptureHandle { spans, events }
}

#[test]
fn frames_are_traced() {
    let handle = with_captured_tracing(|| {
        let mut rl = RenderLoop::new(
            HeadlessTerminal::new(12, 4),
            RenderLoopConfig::default(),
            || Text::new("traced").boxed(),
        );
        rl.render().unwrap();
        rl.resize(16, 4);
        rl.render().unwrap();
    });

    let frames: Vec<_> = handle
        .spans()
        .into_iter()
        .filter(|s| s.name == "render_frame")
        .collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].fields.get("frame").map(String::as_str), Some("0"));
    assert_eq!(frames[1].fields.get("width").map(String::as_str), Some("16"));

    assert!(
        handle
            .events()
            .iter()
            .any(|e| e.level == tracing::Level::INFO && e.message.contains("terminal resized"))
    );
}
