//! A small form: text entry, a picker, a background save with a spinner,
//! and a modal confirmation. Tab moves focus, Escape releases it, Ctrl+C
//! quits.
//!
//! Run with `cargo run -p lumen --example form`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lumen::prelude::*;
use lumen::{RenderLoopConfig, TaskPriority};

#[derive(Default)]
struct Form {
    name: String,
    color: Option<&'static str>,
    saving: bool,
    confirm_quit: bool,
    saved: Vec<String>,
}

type Model = Arc<Mutex<Form>>;

fn body(model: &Model, quit: &QuitHandle) -> AnyView {
    let form = model.lock().unwrap_or_else(|e| e.into_inner());

    let name_field = {
        let model = Arc::clone(model);
        TextField::new("your name")
            .initial_text(form.name.clone())
            .focus_id("name")
            .on_change(move |text| {
                model.lock().unwrap_or_else(|e| e.into_inner()).name = text.to_owned();
            })
    };

    let color_picker = {
        let model = Arc::clone(model);
        ["red", "green", "blue"]
            .into_iter()
            .fold(
                Picker::new(move |color: &'static str| {
                    model.lock().unwrap_or_else(|e| e.into_inner()).color = Some(color);
                }),
                |picker, color| picker.option(color, color),
            )
            .selection(form.color)
            .focus_id("color")
    };

    let save = {
        let model = Arc::clone(model);
        Button::new("Save", move || {
            model.lock().unwrap_or_else(|e| e.into_inner()).saving = true;
        })
        .focus_id("save")
        .disabled(form.saving || form.name.is_empty())
    };

    let ask_quit = {
        let model = Arc::clone(model);
        Button::new("Quit", move || {
            model.lock().unwrap_or_else(|e| e.into_inner()).confirm_quit = true;
        })
        .focus_id("quit")
    };

    let mut page = VStack::new()
        .spacing(1)
        .child(Text::new("Profile").style("\x1b[1m"))
        .child(HStack::new().spacing(1).child(Text::new("Name:")).child(name_field))
        .child(color_picker)
        .child(HStack::new().child(save).child(Spacer::new()).child(ask_quit));

    if form.saving {
        let model = Arc::clone(model);
        page = page.child(
            Spinner::new()
                .label("saving")
                .task(TaskPriority::Background, move |task| {
                    if task.cancellation().wait_timeout(Duration::from_secs(1)) {
                        return;
                    }
                    let mut form = model.lock().unwrap_or_else(|e| e.into_inner());
                    let entry = format!("{} ({})", form.name, form.color.unwrap_or("no color"));
                    form.saved.push(entry);
                    form.saving = false;
                    drop(form);
                    task.writer().request_render();
                }),
        );
    }
    page = page.children(form.saved.iter().map(|entry| Text::new(format!("saved: {entry}"))));

    let mut screen = ZStack::new()
        .alignment(Alignment::Center, Alignment::Leading)
        .child(page.padding(Sides::all(1)));

    if form.confirm_quit {
        let quit = quit.clone();
        let model = Arc::clone(model);
        screen = screen.child(
            VStack::new()
                .spacing(1)
                .child(Text::new("Really quit?"))
                .child(
                    HStack::new()
                        .spacing(2)
                        .child(Button::new("Yes", move || quit.quit()).focus_id("yes"))
                        .child(
                            Button::new("No", move || {
                                model.lock().unwrap_or_else(|e| e.into_inner()).confirm_quit =
                                    false;
                            })
                            .focus_id("no"),
                        ),
                )
                .padding(Sides::all(1))
                .background("\x1b[48;5;238m")
                .modal_section("confirm"),
        );
    }
    screen.boxed()
}

fn main() -> lumen::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let model: Model = Arc::default();
    let quit = QuitHandle::default();

    let content_quit = quit.clone();
    App::new(move || body(&model, &content_quit))
        .with_quit_handle(quit)
        .config(RenderLoopConfig::default().background_code("\x1b[48;5;234m"))
        .status_bar(|| {
            HStack::new()
                .child(Text::new(" Tab: next field"))
                .child(Spacer::new())
                .child(Text::new("Ctrl+C: quit "))
                .boxed()
        })
        .run()
}
