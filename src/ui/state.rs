use std::collections::HashSet;
use std::path::{Path, PathBuf};
use winit::keyboard::NamedKey;

use crate::category::Categories;
use crate::cli::HELP_KEYS;
use crate::content::{load_default_image, render, DecodedImage, Rendered};
use crate::error::{BrowseError, Result};
use crate::files::{classify, ContentKind};
use crate::opener::{open_externally, Companion};
use crate::tree::{NodeId, Tree};
use crate::ui::render::{
    text_width, truncate_to_width, Canvas, Rect, BG_COLOR, GLYPH_H, GLYPH_W,
};
use crate::view::ViewState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const LIST_W: u32 = 320;
const HEADER_H: u32 = 24;
const BAR_H: u32 = 40;
const PAD: u32 = 8;
const TEXT_SCALE: u32 = 2;
const ROW_H: u32 = GLYPH_H * TEXT_SCALE + 6;
const INDENT: u32 = 16;
const BUTTON_W: u32 = 120;
const BUTTON_GAP: u32 = 8;
const WHEEL_LINES: f32 = 3.0;
const TAB_WIDTH: usize = 4;

const WHITE: (u8, u8, u8, u8) = (255, 255, 255, 255);
const DIM: (u8, u8, u8, u8) = (160, 160, 160, 255);
const ERROR_RED: (u8, u8, u8, u8) = (255, 80, 80, 255);

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Tree,
    Categories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Previous,
    Next,
    Refresh,
    Companion,
    Exit,
}

const BUTTONS: [(Action, &str); 5] = [
    (Action::Previous, "Previous"),
    (Action::Next, "Next"),
    (Action::Refresh, "Refresh"),
    (Action::Companion, "Companion"),
    (Action::Exit, "Exit"),
];

#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub header: Rect,
    pub list: Rect,
    pub content: Rect,
    pub bar: Rect,
    pub buttons: [Rect; 5],
    pub status: Rect,
}

impl Layout {
    pub fn compute(w: u32, h: u32) -> Self {
        let body_h = h.saturating_sub(BAR_H);
        let list_w = LIST_W.min(w);
        let bar_y = body_h as i32;
        let buttons = std::array::from_fn(|i| {
            let x = (BUTTON_GAP + i as u32 * (BUTTON_W + BUTTON_GAP)) as i32;
            Rect::new(x, bar_y + 6, BUTTON_W, BAR_H - 12)
        });
        let status_x = BUTTON_GAP + 5 * (BUTTON_W + BUTTON_GAP);
        Self {
            header: Rect::new(0, 0, list_w, HEADER_H),
            list: Rect::new(0, HEADER_H as i32, list_w, body_h.saturating_sub(HEADER_H)),
            content: Rect::new(list_w as i32, 0, w - list_w, body_h),
            bar: Rect::new(0, bar_y, w, BAR_H),
            buttons,
            status: Rect::new(status_x as i32, bar_y, w.saturating_sub(status_x), BAR_H),
        }
    }

    /// Size available to a rendered image inside the content pane.
    pub fn viewport(&self) -> (u32, u32) {
        (
            self.content.w.saturating_sub(2 * PAD),
            self.content.h.saturating_sub(2 * PAD),
        )
    }

    pub fn visible_rows(&self) -> usize {
        (self.list.h.saturating_sub(PAD) / ROW_H) as usize
    }

    fn row_at(&self, y: f64) -> Option<usize> {
        let top = self.list.y as f64 + (PAD / 2) as f64;
        if y < top {
            return None;
        }
        Some(((y - top) / ROW_H as f64) as usize)
    }
}

// ---------------------------------------------------------------------------
// Displayed content
// ---------------------------------------------------------------------------

pub enum Displayed {
    Image(DecodedImage),
    Text(Vec<String>),
}

pub struct Status {
    pub text: String,
    pub error: bool,
}

fn text_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.replace('\t', &" ".repeat(TAB_WIDTH)))
        .collect()
}

// ---------------------------------------------------------------------------
// Browser state
// ---------------------------------------------------------------------------

pub struct BrowserState {
    pub mode: Mode,
    pub tree: Tree,
    pub categories: Categories,
    pub view: ViewState,
    /// Highlighted row in the list pane.
    pub cursor: usize,
    pub list_scroll: usize,
    pub text_scroll: usize,
    pub displayed: Option<Displayed>,
    /// File behind `displayed`, re-rendered when the pane is resized.
    pub displayed_path: Option<PathBuf>,
    pub default_image: PathBuf,
    pub companion: Option<Companion>,
    pub opener: fn(&Path) -> Result<()>,
    pub status: Option<Status>,
    pub layout: Option<Layout>,
    pub show_help: bool,
    pub mouse_pos: (f64, f64),

    // Keys that were just pressed this frame
    pub keys_pressed: HashSet<NamedKey>,
    pub chars_pressed: HashSet<char>,

    // Mouse wheel accumulator for this frame
    pub wheel_y: f32,
}

impl BrowserState {
    pub fn new(
        mode: Mode,
        tree: Tree,
        categories: Categories,
        default_image: PathBuf,
        companion: Option<Companion>,
    ) -> Self {
        Self {
            mode,
            tree,
            categories,
            view: ViewState::Empty,
            cursor: 0,
            list_scroll: 0,
            text_scroll: 0,
            displayed: None,
            displayed_path: None,
            default_image,
            companion,
            opener: open_externally,
            status: None,
            layout: None,
            show_help: false,
            mouse_pos: (0.0, 0.0),
            keys_pressed: HashSet::new(),
            chars_pressed: HashSet::new(),
            wheel_y: 0.0,
        }
    }

    /// Load both controllers and show the default image.
    pub fn startup(&mut self) {
        if let Err(e) = self.tree.reload() {
            self.report(e);
        }
        if let Err(e) = self.categories.refresh() {
            self.report(e);
        }
        self.show_default();
    }

    fn report(&mut self, e: BrowseError) {
        log::warn!("{}", e);
        self.status = Some(Status {
            text: e.to_string(),
            error: true,
        });
    }

    fn note(&mut self, text: String) {
        self.status = Some(Status { text, error: false });
    }

    fn viewport(&self) -> Option<(u32, u32)> {
        self.layout.map(|l| l.viewport())
    }

    /// Record a new framebuffer size. Returns true if the content pane changed
    /// size and the current image was rendered again.
    pub fn set_size(&mut self, w: u32, h: u32) -> bool {
        let layout = Layout::compute(w, h);
        let changed = self.layout.map(|l| l.viewport()) != Some(layout.viewport());
        self.layout = Some(layout);
        if !changed || !matches!(self.displayed, Some(Displayed::Image(_))) {
            return false;
        }
        match self.displayed_path.clone() {
            Some(path) => self.show_file(&path),
            None => self.show_default(),
        }
        true
    }

    // -----------------------------------------------------------------------
    // Content
    // -----------------------------------------------------------------------

    pub fn show_default(&mut self) {
        let img = load_default_image(&self.default_image, self.viewport());
        self.displayed = Some(Displayed::Image(img));
        self.displayed_path = None;
        self.text_scroll = 0;
    }

    /// Render `path` into the content pane, or hand it to the external opener.
    pub fn show_file(&mut self, path: &Path) {
        let outcome = render(path, self.viewport(), &self.default_image);
        if let Some(e) = outcome.failure {
            self.report(e);
        } else {
            self.status = None;
        }
        match outcome.content {
            Rendered::Image(img) => {
                if self.status.is_none() {
                    self.note(format!(
                        "{}x{} | {} | {:.1} KB",
                        img.width,
                        img.height,
                        img.format_name,
                        img.file_size as f64 / 1024.0,
                    ));
                }
                self.displayed = Some(Displayed::Image(img));
                self.displayed_path = Some(path.to_path_buf());
                self.text_scroll = 0;
            }
            Rendered::Text(text) => {
                self.displayed = Some(Displayed::Text(text_lines(&text)));
                self.displayed_path = Some(path.to_path_buf());
                self.text_scroll = 0;
            }
            Rendered::OpenExternally(path) => match (self.opener)(&path) {
                Ok(()) => self.note(format!("Opened {} externally", path.display())),
                Err(e) => self.report(e),
            },
        }
    }

    fn show_category_image(&mut self) {
        match self.categories.current_image(&self.view).map(Path::to_path_buf) {
            Some(path) => self.show_file(&path),
            None => self.show_default(),
        }
    }

    // -----------------------------------------------------------------------
    // List pane
    // -----------------------------------------------------------------------

    pub fn rows(&self) -> Vec<NodeId> {
        self.tree.visible_rows()
    }

    pub fn row_count(&self) -> usize {
        match self.mode {
            Mode::Tree => self.tree.visible_rows().len(),
            Mode::Categories => self.categories.list().len(),
        }
    }

    fn ensure_cursor_visible(&mut self) {
        let visible = self.layout.map_or(usize::MAX, |l| l.visible_rows().max(1));
        if self.cursor < self.list_scroll {
            self.list_scroll = self.cursor;
        } else if visible != usize::MAX && self.cursor >= self.list_scroll + visible {
            self.list_scroll = self.cursor + 1 - visible;
        }
    }

    /// Highlight row `i` and act on it: files are displayed, categories jump
    /// to their first image, directories only become selected.
    pub fn select_row(&mut self, i: usize) {
        self.select_row_with(i, true);
    }

    /// Like `select_row`, but files that would go to the external opener are
    /// only highlighted unless `launch` is set.
    fn select_row_with(&mut self, i: usize, launch: bool) {
        if i >= self.row_count() {
            return;
        }
        self.cursor = i;
        self.ensure_cursor_visible();
        match self.mode {
            Mode::Tree => {
                let id = self.rows()[i];
                self.view = ViewState::Node(id);
                if let Some(path) = self.tree.selected_file(id).map(Path::to_path_buf) {
                    if launch || classify(&path) != ContentKind::Other {
                        self.show_file(&path);
                    }
                }
            }
            Mode::Categories => {
                let name = self.categories.list()[i].name.clone();
                self.view = self.categories.select(&self.view, &name);
                self.show_category_image();
            }
        }
    }

    fn move_cursor(&mut self, delta: i64) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        let target = (self.cursor as i64 + delta).clamp(0, count as i64 - 1) as usize;
        if target != self.cursor || self.view == ViewState::Empty {
            self.select_row_with(target, false);
        }
    }

    fn sync_cursor(&mut self) {
        if let Some(id) = self.view.node() {
            if let Some(pos) = self.rows().iter().position(|&r| r == id) {
                self.cursor = pos;
            }
        }
        self.cursor = self.cursor.min(self.row_count().saturating_sub(1));
        self.ensure_cursor_visible();
    }

    fn cursor_node(&self) -> Option<NodeId> {
        match self.mode {
            Mode::Tree => self.rows().get(self.cursor).copied(),
            Mode::Categories => None,
        }
    }

    /// Enter on a row: directories expand, files are selected with the
    /// external opener allowed.
    pub fn activate_row(&mut self, i: usize) {
        let Some(&id) = self.rows().get(i) else { return };
        if self.tree.node(id).is_some_and(|n| n.is_dir()) {
            self.expand_row(i);
        } else {
            self.select_row(i);
        }
    }

    pub fn expand_row(&mut self, i: usize) {
        let Some(&id) = self.rows().get(i) else { return };
        if let Err(e) = self.tree.expand(id) {
            self.report(e);
        }
        self.sync_cursor();
    }

    pub fn toggle_row(&mut self, i: usize) {
        let Some(&id) = self.rows().get(i) else { return };
        if let Err(e) = self.tree.toggle(id) {
            self.report(e);
        }
        self.sync_cursor();
    }

    /// Collapse the highlighted directory, or move to its parent.
    pub fn collapse_or_parent(&mut self) {
        let Some(id) = self.cursor_node() else { return };
        let open = self.tree.node(id).is_some_and(|n| n.is_open());
        if open {
            self.tree.collapse(id);
            self.sync_cursor();
        } else if let Some(parent) = self.tree.parent_of(id) {
            if let Some(pos) = self.rows().iter().position(|&r| r == parent) {
                self.select_row(pos);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    pub fn next(&mut self) {
        let view = self.categories.next(&self.view);
        if view != self.view {
            self.view = view;
            self.show_category_image();
        }
    }

    pub fn previous(&mut self) {
        let view = self.categories.previous(&self.view);
        if view != self.view {
            self.view = view;
            self.show_category_image();
        }
    }

    pub fn refresh(&mut self) {
        match self.mode {
            Mode::Tree => {
                if let Err(e) = self.tree.reload() {
                    self.report(e);
                }
                self.view = ViewState::Empty;
                self.cursor = 0;
                self.list_scroll = 0;
                self.show_default();
            }
            Mode::Categories => {
                if let Err(e) = self.categories.refresh() {
                    self.report(e);
                }
                if self.categories.current_image(&self.view).is_none() {
                    self.view = ViewState::Empty;
                    self.show_default();
                } else {
                    self.show_category_image();
                }
                self.cursor = match self.view.category() {
                    Some((name, _)) => self
                        .categories
                        .list()
                        .iter()
                        .position(|c| c.name == name)
                        .unwrap_or(0),
                    None => 0,
                };
                self.ensure_cursor_visible();
            }
        }
    }

    pub fn switch_mode(&mut self) {
        self.mode = match self.mode {
            Mode::Tree => Mode::Categories,
            Mode::Categories => Mode::Tree,
        };
        self.view = ViewState::Empty;
        self.cursor = 0;
        self.list_scroll = 0;
        self.show_default();
    }

    pub fn open_selected(&mut self) {
        let path = self
            .cursor_node()
            .and_then(|id| self.tree.selected_file(id))
            .or_else(|| self.categories.current_image(&self.view))
            .map(Path::to_path_buf);
        if let Some(path) = path {
            match (self.opener)(&path) {
                Ok(()) => self.note(format!("Opened {} externally", path.display())),
                Err(e) => self.report(e),
            }
        }
    }

    pub fn launch_companion(&mut self) {
        let Some(companion) = &self.companion else {
            self.note("No companion command configured".to_string());
            return;
        };
        match companion.launch() {
            Ok(pid) => self.note(format!("Companion started (pid {})", pid)),
            Err(e) => self.report(e),
        }
    }

    /// Returns true if the app should quit.
    pub fn perform(&mut self, action: Action) -> bool {
        match action {
            Action::Previous => self.previous(),
            Action::Next => self.next(),
            Action::Refresh => self.refresh(),
            Action::Companion => self.launch_companion(),
            Action::Exit => return true,
        }
        false
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    pub fn is_key_pressed_named(&self, k: NamedKey) -> bool {
        self.keys_pressed.contains(&k)
    }

    pub fn is_char_pressed(&self, c: char) -> bool {
        self.chars_pressed.contains(&c)
    }

    /// Handle a left click. Returns true if the app should quit.
    pub fn click(&mut self, x: f64, y: f64) -> bool {
        let Some(layout) = self.layout else { return false };

        if let Some(&(action, _)) = BUTTONS
            .iter()
            .zip(layout.buttons.iter())
            .find(|(_, r)| r.contains(x, y))
            .map(|(b, _)| b)
        {
            return self.perform(action);
        }

        if layout.list.contains(x, y) {
            let Some(row) = layout.row_at(y) else { return false };
            let i = row + self.list_scroll;
            if i >= self.row_count() {
                return false;
            }
            let on_marker = match self.mode {
                Mode::Tree => self.tree.node(self.rows()[i]).is_some_and(|n| {
                    let marker_end = PAD + n.depth as u32 * INDENT + 2 * GLYPH_W * TEXT_SCALE;
                    n.has_expander() && x < marker_end as f64
                }),
                Mode::Categories => false,
            };
            if on_marker {
                self.cursor = i;
                self.toggle_row(i);
            } else {
                self.select_row(i);
            }
        }
        false
    }

    /// Run the per-frame logic for queued input. Returns true if the app
    /// should quit.
    pub fn update(&mut self) -> bool {
        if self.is_key_pressed_named(NamedKey::Escape) || self.is_char_pressed('q') {
            return true;
        }

        if self.is_key_pressed_named(NamedKey::ArrowDown) {
            self.move_cursor(1);
        }
        if self.is_key_pressed_named(NamedKey::ArrowUp) {
            self.move_cursor(-1);
        }
        if self.mode == Mode::Tree {
            if self.is_key_pressed_named(NamedKey::ArrowRight) {
                self.expand_row(self.cursor);
            }
            if self.is_key_pressed_named(NamedKey::Enter) {
                self.activate_row(self.cursor);
            }
            if self.is_key_pressed_named(NamedKey::ArrowLeft) {
                self.collapse_or_parent();
            }
        }

        if self.is_key_pressed_named(NamedKey::Space) || self.is_char_pressed('n') {
            self.next();
        }
        if self.is_key_pressed_named(NamedKey::Backspace) || self.is_char_pressed('p') {
            self.previous();
        }
        if self.is_key_pressed_named(NamedKey::F5) || self.is_char_pressed('r') {
            self.refresh();
        }
        if self.is_char_pressed('o') {
            self.open_selected();
        }
        if self.is_char_pressed('l') {
            self.launch_companion();
        }
        if self.is_key_pressed_named(NamedKey::Tab) {
            self.switch_mode();
        }
        if self.is_char_pressed('?') {
            self.show_help = !self.show_help;
        }

        if self.wheel_y.abs() > 0.1 {
            let lines = (self.wheel_y.abs() * WHEEL_LINES).round() as usize;
            let down = self.wheel_y < 0.0;
            let over_list = self
                .layout
                .is_some_and(|l| l.list.contains(self.mouse_pos.0, self.mouse_pos.1));
            if over_list {
                let max = self.row_count().saturating_sub(1);
                self.list_scroll = scroll(self.list_scroll, lines, down, max);
            } else if let Some(Displayed::Text(text)) = &self.displayed {
                let max = text.len().saturating_sub(1);
                self.text_scroll = scroll(self.text_scroll, lines, down, max);
            }
        }

        // Clear per-frame input state
        self.keys_pressed.clear();
        self.chars_pressed.clear();
        self.wheel_y = 0.0;

        false
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    pub fn render(&self, canvas: &mut Canvas) {
        canvas.clear(BG_COLOR);
        let layout = Layout::compute(canvas.width, canvas.height);

        self.render_list(canvas, &layout);
        self.render_content(canvas, &layout);
        self.render_bar(canvas, &layout);

        if self.show_help {
            canvas.fill_rect(canvas.full(), (0, 0, 0, 200));
            let clip = canvas.full();
            let mut y = 20;
            for line in HELP_KEYS.lines() {
                canvas.draw_text(line, 20, y, TEXT_SCALE, clip, WHITE);
                y += 24;
            }
        }
    }

    fn render_list(&self, canvas: &mut Canvas, layout: &Layout) {
        canvas.fill_rect(layout.header, (20, 20, 20, 255));
        canvas.fill_rect(layout.list, (24, 24, 24, 255));
        let title = match self.mode {
            Mode::Tree => format!("Tree: {}", self.tree.root().display()),
            Mode::Categories => format!("Categories: {}", self.categories.base_dir().display()),
        };
        let title = truncate_to_width(&title, layout.header.w.saturating_sub(2 * PAD), TEXT_SCALE);
        canvas.draw_text(&title, PAD as i32, 5, TEXT_SCALE, layout.header, DIM);

        let labels: Vec<(u32, String)> = match self.mode {
            Mode::Tree => self
                .rows()
                .into_iter()
                .filter_map(|id| self.tree.node(id))
                .map(|n| {
                    let marker = match (n.has_expander(), n.is_open()) {
                        (true, true) => "- ",
                        (true, false) => "+ ",
                        (false, _) => "  ",
                    };
                    (n.depth as u32 * INDENT, format!("{}{}", marker, n.name))
                })
                .collect(),
            Mode::Categories => self
                .categories
                .list()
                .iter()
                .map(|c| (0, format!("{} ({})", c.name, c.images.len())))
                .collect(),
        };

        let top = layout.list.y + (PAD / 2) as i32;
        for (slot, (i, (indent, label))) in labels
            .iter()
            .enumerate()
            .skip(self.list_scroll)
            .take(layout.visible_rows())
            .enumerate()
        {
            let y = top + (slot as u32 * ROW_H) as i32;
            if i == self.cursor && self.view != ViewState::Empty {
                canvas.fill_rect(Rect::new(0, y, layout.list.w, ROW_H), (60, 90, 140, 255));
            }
            let x = (PAD + indent) as i32;
            let max_w = layout.list.w.saturating_sub(PAD + indent);
            let label = truncate_to_width(label, max_w, TEXT_SCALE);
            canvas.draw_text(&label, x, y + 3, TEXT_SCALE, layout.list, WHITE);
        }
    }

    fn render_content(&self, canvas: &mut Canvas, layout: &Layout) {
        let pane = layout.content;
        match &self.displayed {
            Some(Displayed::Image(img)) => {
                let x0 = pane.x + (pane.w as i32 - img.width as i32) / 2;
                let y0 = pane.y + (pane.h as i32 - img.height as i32) / 2;
                canvas.blit(&img.rgba_bytes, img.width, img.height, x0, y0, pane);
            }
            Some(Displayed::Text(lines)) => {
                let line_h = (GLYPH_H * TEXT_SCALE + 4) as i32;
                let mut y = pane.y + PAD as i32;
                for line in lines.iter().skip(self.text_scroll) {
                    if y > pane.y + pane.h as i32 {
                        break;
                    }
                    canvas.draw_text(line, pane.x + PAD as i32, y, TEXT_SCALE, pane, WHITE);
                    y += line_h;
                }
            }
            None => {}
        }
    }

    fn render_bar(&self, canvas: &mut Canvas, layout: &Layout) {
        canvas.fill_rect(layout.bar, (16, 16, 16, 255));
        let clip = canvas.full();
        for ((_, label), r) in BUTTONS.iter().zip(layout.buttons.iter()) {
            canvas.fill_rect(*r, (50, 50, 50, 255));
            canvas.outline_rect(*r, (110, 110, 110, 255));
            let tw = text_width(label.len(), TEXT_SCALE) as i32;
            let tx = r.x + (r.w as i32 - tw) / 2;
            let ty = r.y + (r.h as i32 - (GLYPH_H * TEXT_SCALE) as i32) / 2;
            canvas.draw_text(label, tx, ty, TEXT_SCALE, clip, WHITE);
        }
        if let Some(status) = &self.status {
            let color = if status.error { ERROR_RED } else { DIM };
            let text = truncate_to_width(&status.text, layout.status.w.saturating_sub(PAD), TEXT_SCALE);
            let ty = layout.status.y + (BAR_H - GLYPH_H * TEXT_SCALE) as i32 / 2;
            canvas.draw_text(&text, layout.status.x, ty, TEXT_SCALE, layout.status, color);
        }
    }
}

fn scroll(pos: usize, lines: usize, down: bool, max: usize) -> usize {
    if down {
        (pos + lines).min(max)
    } else {
        pos.saturating_sub(lines)
    }
}
