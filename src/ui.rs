use crossbeam_channel::Receiver;
use eframe::egui;
use egui::text::{CCursor, CCursorRange};
use egui::text_edit::TextEditOutput;
use egui::{Align, Align2, Id, Layout, Order, Pos2, RichText, Stroke};
use egui_phosphor::regular;
use noctis::gateway::{Dispatcher, TranslationReply};
use noctis::geometry::{Point, Rect, Size, Viewport};
use noctis::host::{HostEvent, Key as HostKey, Region, ROOT_NAME};
use noctis::languages::{self, AUTO, LANGUAGES};
use noctis::logger;
use noctis::selection::{HostDocument, LiveSelection, SelectionRange};
use noctis::session::{SessionId, SessionStatus, TranslationSession};
use noctis::Overlay;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

const PAGE_ID: &str = "noctis-page";
const SESSION_WIDTH: f32 = 340.0;

/// The page the user selects in, as the overlay sees it.
struct PageDocument {
    text: String,
    selection: Option<LiveSelection>,
    viewport: Viewport,
    pending_restore: Option<SelectionRange>,
}

impl HostDocument for PageDocument {
    fn live_selection(&self) -> Option<LiveSelection> {
        self.selection.clone()
    }

    fn restore_selection(&mut self, range: SelectionRange) {
        self.pending_restore = Some(range);
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}

enum Intent {
    Source(SessionId, String),
    Target(SessionId, String),
    Close(SessionId),
}

struct NoctisApp {
    page: PageDocument,
    overlay: Overlay<Dispatcher>,
    replies: Receiver<TranslationReply>,
    style: Arc<egui::Style>,
    last_range: Option<SelectionRange>,
    last_scroll: Option<egui::Vec2>,
    last_screen: Option<egui::Rect>,
}

fn point(p: Pos2) -> Point {
    Point::new(p.x, p.y)
}

fn to_rect(r: egui::Rect) -> Rect {
    Rect::new(r.min.y, r.min.x, r.width(), r.height())
}

/// Style scope of every overlay layer. Applied inside the overlay's areas
/// only, so the page keeps its own look and the overlay ignores the page's.
fn overlay_style() -> egui::Style {
    let mut style = egui::Style { visuals: egui::Visuals::dark(), ..Default::default() };
    style.spacing.item_spacing = egui::vec2(6.0, 4.0);
    style.spacing.button_padding = egui::vec2(6.0, 3.0);
    style.visuals.window_rounding = egui::Rounding::same(6.0);
    style
}

fn install_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);

    // native language labels need CJK glyphs
    let candidates = [
        r"C:\Windows\Fonts\msyh.ttc",
        r"C:\Windows\Fonts\simsun.ttc",
        "/System/Library/Fonts/PingFang.ttc",
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    ];
    match candidates.iter().find_map(|path| fs::read(path).ok().map(|bytes| (path, bytes))) {
        Some((path, bytes)) => {
            fonts.font_data.insert("cjk".to_owned(), egui::FontData::from_owned(bytes));
            for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                fonts.families.entry(family).or_default().push("cjk".to_owned());
            }
            logger::info(&format!("Loaded CJK font: {path}"));
        }
        None => logger::warn("No CJK font found; some language labels may render as squares"),
    }
    ctx.set_fonts(fonts);
}

/// Host events for this frame, straight from egui's raw input.
fn collect_events(ctx: &egui::Context) -> Vec<HostEvent> {
    ctx.input(|i| {
        i.events
            .iter()
            .filter_map(|ev| match ev {
                egui::Event::PointerButton { pos, pressed: true, .. } => Some(HostEvent::PointerDown(point(*pos))),
                egui::Event::PointerButton { pos, pressed: false, .. } => Some(HostEvent::PointerUp(point(*pos))),
                egui::Event::Key { key: egui::Key::Escape, pressed: true, .. } => Some(HostEvent::KeyDown(HostKey::Escape)),
                egui::Event::Key { pressed: true, .. } => Some(HostEvent::KeyDown(HostKey::Other)),
                egui::Event::Key { pressed: false, .. } => Some(HostEvent::KeyUp),
                _ => None,
            })
            .collect()
    })
}

/// Reads the selection out of the page's text edit. Falls back to the
/// stored cursor state so a click that moves focus to the overlay does not
/// lose the selection.
fn read_selection(text: &str, output: &TextEditOutput, clip: egui::Rect) -> Option<LiveSelection> {
    let (a, b) = match output.cursor_range {
        Some(r) => (r.primary.ccursor, r.secondary.ccursor),
        None => {
            let r = output.state.cursor.char_range()?;
            (r.primary, r.secondary)
        }
    };
    let (start, end) = if a.index <= b.index { (a, b) } else { (b, a) };
    if start.index == end.index {
        return None;
    }

    let selected: String = text.chars().skip(start.index).take(end.index - start.index).collect();

    let offset = output.galley_pos.to_vec2();
    let first = output.galley.from_ccursor(start);
    let last = output.galley.from_ccursor(end);
    let mut bounds = output
        .galley
        .pos_from_cursor(&first)
        .union(output.galley.pos_from_cursor(&last))
        .translate(offset);
    if first.rcursor.row != last.rcursor.row {
        let full = output.galley.rect.translate(offset);
        bounds.min.x = full.min.x;
        bounds.max.x = full.max.x;
    }
    let visible = bounds.intersect(clip);
    let rect = visible.is_positive().then(|| to_rect(visible));

    Some(LiveSelection { text: selected, rect, range: SelectionRange::new(start.index, end.index) })
}

fn restore(ctx: &egui::Context, output: &TextEditOutput, range: SelectionRange) {
    let mut state = output.state.clone();
    state
        .cursor
        .set_char_range(Some(CCursorRange::two(CCursor::new(range.start()), CCursor::new(range.end()))));
    state.store(ctx, output.response.id);
}

/// Renders the page and returns the scroll offset.
fn render_page(ui: &mut egui::Ui, page: &mut PageDocument) -> egui::Vec2 {
    let scroll = egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
        let mut text: &str = page.text.as_str();
        let output = egui::TextEdit::multiline(&mut text)
            .id(Id::new(PAGE_ID))
            .frame(false)
            .desired_width(f32::INFINITY)
            .show(ui);
        if let Some(range) = page.pending_restore.take() {
            restore(ui.ctx(), &output, range);
        }
        page.selection = read_selection(&page.text, &output, ui.clip_rect());
    });
    scroll.state.offset
}

fn source_label(session: &TranslationSession) -> String {
    if session.source_lang() == AUTO {
        session.auto_label().to_string()
    } else {
        languages::label(session.source_lang()).to_string()
    }
}

fn session_widget(ui: &mut egui::Ui, session: &TranslationSession, intents: &mut Vec<Intent>) {
    let id = session.id();
    egui::Frame::popup(ui.style()).show(ui, |ui| {
        ui.set_width(SESSION_WIDTH);
        ui.horizontal(|ui| {
            let mut source = session.source_lang().to_string();
            egui::ComboBox::from_id_source(("noctis-source", id.get()))
                .selected_text(source_label(session))
                .width(120.0)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut source, AUTO.to_string(), session.auto_label());
                    for lang in LANGUAGES {
                        ui.selectable_value(&mut source, lang.code.to_string(), lang.label);
                    }
                });
            if source != session.source_lang() {
                intents.push(Intent::Source(id, source));
            }

            ui.label(regular::ARROW_RIGHT);

            let mut target = session.target_lang().to_string();
            egui::ComboBox::from_id_source(("noctis-target", id.get()))
                .selected_text(languages::label(session.target_lang()))
                .width(120.0)
                .show_ui(ui, |ui| {
                    for lang in LANGUAGES {
                        ui.selectable_value(&mut target, lang.code.to_string(), lang.label);
                    }
                });
            if target != session.target_lang() {
                intents.push(Intent::Target(id, target));
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.small_button(regular::X).on_hover_text("Close").clicked() {
                    intents.push(Intent::Close(id));
                }
                if let (SessionStatus::Done, Some(result)) = (session.status(), session.result_text()) {
                    if ui.small_button(regular::COPY).on_hover_text("Copy").clicked() {
                        let copied = result.to_string();
                        ui.output_mut(|o| o.copied_text = copied);
                    }
                }
            });
        });

        ui.label(RichText::new(session.bound_text()).weak().italics());
        ui.separator();

        let line = session.status_line();
        match session.status() {
            SessionStatus::Error => ui.colored_label(ui.visuals().error_fg_color, line),
            SessionStatus::Pending => ui.label(RichText::new(line).weak()),
            _ => ui.label(line),
        };
    });
}

impl NoctisApp {
    fn new(text: String, overlay: Overlay<Dispatcher>, replies: Receiver<TranslationReply>) -> Self {
        Self {
            page: PageDocument { text, selection: None, viewport: Viewport::default(), pending_restore: None },
            overlay,
            replies,
            style: Arc::new(overlay_style()),
            last_range: None,
            last_scroll: None,
            last_screen: None,
        }
    }

    fn dispatch_host_events(&mut self, mut events: Vec<HostEvent>, scroll: egui::Vec2, screen: egui::Rect) {
        let range = self.page.selection.as_ref().map(|s| s.range);
        if range != self.last_range {
            self.last_range = range;
            events.push(HostEvent::SelectionChange);
        }
        if self.last_scroll.replace(scroll).is_some_and(|prev| prev != scroll) {
            events.push(HostEvent::Scroll);
        }
        if self.last_screen.replace(screen).is_some_and(|prev| prev != screen) {
            events.push(HostEvent::Resize);
        }
        for event in events {
            self.overlay.handle_event(event, &self.page);
        }
        self.overlay.end_of_task(&self.page);
    }

    fn show_popover(&mut self, ctx: &egui::Context) {
        if !self.overlay.popover().is_visible() {
            self.overlay.host_mut().set_region(Region::Popover, None);
            return;
        }
        let state = self.overlay.popover().visual_state();
        let pos = match (state.placement, state.anchor_rect) {
            (Some(p), _) => egui::pos2(p.left.round(), p.top.round()),
            (None, Some(anchor)) => egui::pos2(anchor.left, anchor.top),
            (None, None) => return,
        };

        let style = Arc::clone(&self.style);
        let shown = egui::Area::new(Id::new((ROOT_NAME, "popover")))
            .order(Order::Foreground)
            .fixed_pos(pos)
            .show(ctx, |ui| {
                ui.set_style(style);
                egui::Frame::popup(ui.style())
                    .show(ui, |ui| ui.button(RichText::new(regular::TRANSLATE).size(16.0)).on_hover_text("Translate").clicked())
                    .inner
            });

        let rect = shown.response.rect;
        self.overlay.host_mut().set_region(Region::Popover, Some(to_rect(rect)));
        self.overlay.on_frame(Size::new(rect.width(), rect.height()), &self.page);

        if let Some(caret) = self.overlay.popover().placement().map(|p| p.caret) {
            let painter = ctx.layer_painter(egui::LayerId::new(Order::Foreground, Id::new((ROOT_NAME, "caret"))));
            let (x, y) = (caret.left.round(), caret.top.round());
            let half = noctis::geometry::CARET_WIDTH / 2.0;
            // tip touches the selection; flipped when the box sits below
            let dir = if caret.rotation_degrees == 0.0 { -1.0 } else { 1.0 };
            let points = vec![
                egui::pos2(x, y + dir * half),
                egui::pos2(x + 2.0 * half, y + dir * half),
                egui::pos2(x + half, y),
            ];
            painter.add(egui::Shape::convex_polygon(points, self.style.visuals.window_fill, Stroke::NONE));
        }

        if shown.inner {
            if let Some(id) = self.overlay.activate(&mut self.page) {
                logger::info(&format!("Popover activated, session {id}"));
            }
        }
    }

    fn show_sessions(&mut self, ctx: &egui::Context) {
        if self.overlay.sessions().is_empty() {
            self.overlay.host_mut().set_region(Region::Sessions, None);
            return;
        }
        let mut intents = Vec::new();
        let style = Arc::clone(&self.style);
        let sessions = self.overlay.sessions();
        let shown = egui::Area::new(Id::new((ROOT_NAME, "sessions")))
            .order(Order::Foreground)
            .anchor(Align2::RIGHT_TOP, egui::vec2(-12.0, 12.0))
            .show(ctx, |ui| {
                ui.set_style(style);
                egui::ScrollArea::vertical().max_height(ctx.screen_rect().height() - 24.0).show(ui, |ui| {
                    for session in sessions.iter() {
                        session_widget(ui, session, &mut intents);
                        ui.add_space(6.0);
                    }
                });
            });
        self.overlay.host_mut().set_region(Region::Sessions, Some(to_rect(shown.response.rect)));

        for intent in intents {
            match intent {
                Intent::Source(id, lang) => self.overlay.set_source_lang(id, &lang),
                Intent::Target(id, lang) => self.overlay.set_target_lang(id, &lang),
                Intent::Close(id) => {
                    self.overlay.close_session(id);
                }
            }
        }
    }
}

impl eframe::App for NoctisApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(reply) = self.replies.try_recv() {
            self.overlay.apply_reply(reply);
        }
        if self.overlay.sessions().any_pending() {
            // backup for a missed wake-up
            ctx.request_repaint_after(Duration::from_millis(120));
        }

        let events = collect_events(ctx);
        let screen = ctx.screen_rect();
        self.page.viewport = Viewport::new(screen.width(), screen.height());

        let page = &mut self.page;
        let scroll = egui::CentralPanel::default().show(ctx, |ui| render_page(ui, page)).inner;

        self.dispatch_host_events(events, scroll, screen);
        self.show_popover(ctx);
        self.show_sessions(ctx);

        if self.overlay.popover().is_visible() && self.overlay.popover().placement().is_none() {
            // placement happens once the box has been measured
            ctx.request_repaint();
        }
    }
}

pub fn run(text: String, overlay: Overlay<Dispatcher>, replies: Receiver<TranslationReply>) -> anyhow::Result<()> {
    logger::info("Main UI: starting event loop");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Noctis")
            .with_inner_size([900.0, 640.0])
            .with_always_on_top()
            .with_visible(true),
        ..Default::default()
    };
    let result = eframe::run_native(
        "Noctis",
        native_options,
        Box::new(move |cc| {
            install_fonts(&cc.egui_ctx);
            let ctx = cc.egui_ctx.clone();
            overlay.sink().set_waker(Arc::new(move || ctx.request_repaint()));
            Box::new(NoctisApp::new(text, overlay, replies))
        }),
    );
    match result {
        Ok(()) => {
            logger::info("Main UI: event loop exited");
            Ok(())
        }
        Err(e) => {
            logger::error(&format!("Main UI error: {e}"));
            Err(anyhow::anyhow!("UI error: {e}"))
        }
    }
}
