/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into the `front` buffer (array of Cell)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The playfield is projected onto a terminal viewport that keeps the
/// world's 4:3 aspect (terminal cells are about twice as tall as wide).
/// World y grows upward, terminal rows grow downward.

use std::io::{self, BufWriter, Write};
use std::ops::Range;

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use thiserror::Error;

use crate::domain::entity::Facing;
use crate::domain::geometry::{Rect, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::sim::session::GameSession;
use crate::sim::world::WorldState;
use super::atlas::{AssetError, Sprite, SpriteAtlas};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells. Using the
    /// same RGB for `Clear` and every blank cell avoids seams between rows
    /// on VTE-based terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Differs from any real cell, so every position gets diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn bg_at(&self, x: usize, y: usize) -> Color {
        self.get(x, y).bg
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        self.put_str(self.width.saturating_sub(len) / 2, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, x: Range<usize>, bg: Color) {
        for cx in x {
            self.set(cx, y, Cell::new(' ', Color::White, bg));
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect()
    }
}

// ── Viewport: world units → terminal cells ──

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Viewport {
    x0: usize,
    y0: usize,
    cols: usize,
    rows: usize,
}

impl Viewport {
    /// Largest 4:3 field that fits `avail_w × avail_h` cells, centered horizontally.
    fn fit(avail_w: usize, avail_h: usize, y0: usize) -> Self {
        let rows = avail_h.min(avail_w * 3 / 8).max(1);
        let cols = (rows * 8 / 3).min(avail_w).max(1);
        Viewport { x0: avail_w.saturating_sub(cols) / 2, y0, cols, rows }
    }

    fn col_span(&self, left: f32, right: f32) -> Range<usize> {
        let sx = PLAYFIELD_WIDTH / self.cols as f32;
        let n = self.cols as f32;
        let c0 = (left / sx).floor().clamp(0.0, n) as usize;
        let c1 = (right / sx).ceil().clamp(0.0, n) as usize;
        c0..c1
    }

    fn row_span(&self, bottom: f32, top: f32) -> Range<usize> {
        let sy = PLAYFIELD_HEIGHT / self.rows as f32;
        let n = self.rows as f32;
        let r0 = (n - (top / sy).ceil()).clamp(0.0, n) as usize;
        let r1 = (n - (bottom / sy).floor()).clamp(0.0, n) as usize;
        r0..r1
    }

    /// Cells covered by `rect`, plus the world-to-sprite scale so clipped
    /// rects still sample the right part of the art.
    fn project(&self, rect: &Rect) -> Projection {
        Projection {
            cols: self.col_span(rect.left, rect.right()),
            rows: self.row_span(rect.bottom, rect.top()),
            rect: *rect,
            sx: PLAYFIELD_WIDTH / self.cols as f32,
            sy: PLAYFIELD_HEIGHT / self.rows as f32,
            total_rows: self.rows,
        }
    }
}

struct Projection {
    cols: Range<usize>,
    rows: Range<usize>,
    rect: Rect,
    sx: f32,
    sy: f32,
    total_rows: usize,
}

impl Projection {
    /// Normalized sprite coordinates for the center of cell (c, r).
    fn uv(&self, c: usize, r: usize) -> (f32, f32) {
        let wx = (c as f32 + 0.5) * self.sx;
        let wy = (self.total_rows as f32 - r as f32 - 0.5) * self.sy;
        let u = ((wx - self.rect.left) / self.rect.width).clamp(0.0, 1.0);
        let v = ((self.rect.top() - wy) / self.rect.height).clamp(0.0, 1.0);
        (u, v)
    }
}

fn mirror_char(ch: char) -> char {
    match ch {
        '/' => '\\',
        '\\' => '/',
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        other => other,
    }
}

// ── Palette ──

const SKY: Color = Color::Rgb { r: 40, g: 60, b: 110 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const TITLE: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const HIGHLIGHT: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const HIGHLIGHT_BG: Color = Color::Rgb { r: 30, g: 60, b: 30 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

// ── Renderer ──

const HUD_ROW: usize = 0;
const FIELD_ROW: usize = 1;
/// HUD + message + help rows.
const RESERVED_ROWS: usize = 3;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Screen {
    Selecting,
    Playing,
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
    atlas: SpriteAtlas,
    frame: u64,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new(atlas: SpriteAtlas) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
            atlas,
            frame: 0,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the terminal
    /// reports key releases.
    pub fn init(&mut self) -> Result<bool, RenderError> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }
        log::debug!("keyboard enhancement: {}", self.enhanced_keys);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.set_size(tw as usize, th as usize);
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn set_size(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, world: &WorldState) -> Result<(), RenderError> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.set_size(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        let screen = if world.is_playing() { Screen::Playing } else { Screen::Selecting };
        if self.last_screen != Some(screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(screen);
        }

        self.compose(world)?;
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        self.frame = self.frame.wrapping_add(1);
        Ok(())
    }

    fn compose(&mut self, world: &WorldState) -> Result<(), AssetError> {
        self.front.clear();
        match world.session() {
            Some(session) => {
                self.compose_game(world, session)?;
                if world.paused {
                    self.compose_pause_overlay();
                }
            }
            None => self.compose_selection(world)?,
        }
        self.compose_message(world);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Never ResetColor here: the terminal default may differ from BASE_BG.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: game screen ──

    fn field(&self) -> Viewport {
        Viewport::fit(self.term_w, self.term_h.saturating_sub(RESERVED_ROWS), FIELD_ROW)
    }

    fn compose_game(&mut self, w: &WorldState, s: &GameSession) -> Result<(), AssetError> {
        let vp = self.field();

        // HUD
        self.front.fill_row(HUD_ROW, 0..self.front.width, HUD_BG);
        let left = format!(" {}", s.avatar().name);
        self.front.put_str(vp.x0, HUD_ROW, &left, Color::White, HUD_BG);
        let right = format!("Score: {}   Time: {} ", s.score, s.remaining.max(0.0) as u32);
        let rx = (vp.x0 + vp.cols).saturating_sub(right.chars().count());
        self.front.put_str(rx, HUD_ROW, &right, TITLE, HUD_BG);
        if w.paused {
            self.front.put_centered(HUD_ROW, "PAUSED", HIGHLIGHT, HUD_BG);
        }

        // Sky
        for r in 0..vp.rows {
            self.front.fill_row(vp.y0 + r, vp.x0..vp.x0 + vp.cols, SKY);
        }

        for tile in &s.level.tiles {
            if let Some(path) = tile.tile.image() {
                let sprite = self.atlas.get(path)?.clone();
                self.blit(&vp, &tile.bounds(), &sprite, false);
            }
        }

        for obj in &s.objects {
            let sprite = self.atlas.get(obj.image)?.clone();
            self.blit(&vp, &obj.bounds(), &sprite, false);
        }

        let sprite = self.atlas.get(s.player.image())?.clone();
        let mirrored = s.player.facing == Facing::Left;
        self.blit(&vp, &s.player.bounds(), &sprite, mirrored);

        // Help
        let help_row = vp.y0 + vp.rows + 1;
        let help = " ←/→ A/D: Walk   ↑/W/Space: Jump   P/F1: Pause   ESC: Back   │  Pad: D-pad, A: Jump";
        self.front.put_str(vp.x0, help_row, help, Color::DarkGrey, Color::Reset);
        Ok(())
    }

    /// Draw `sprite` stretched over the cells that `rect` covers. Blank art
    /// cells are transparent unless the sprite carries its own background.
    fn blit(&mut self, vp: &Viewport, rect: &Rect, sprite: &Sprite, mirrored: bool) {
        let proj = vp.project(rect);
        for r in proj.rows.clone() {
            for c in proj.cols.clone() {
                let (u, v) = proj.uv(c, r);
                let u = if mirrored { 1.0 - u } else { u };
                let mut ch = sprite.sample(u, v);
                if mirrored { ch = mirror_char(ch); }

                let (x, y) = (vp.x0 + c, vp.y0 + r);
                match sprite.bg {
                    Some(bg) => self.front.set(x, y, Cell::new(ch, sprite.fg, bg)),
                    None if ch != ' ' => {
                        let bg = self.front.bg_at(x, y);
                        self.front.set(x, y, Cell::new(ch, sprite.fg, bg));
                    }
                    None => {}
                }
            }
        }
    }

    fn compose_pause_overlay(&mut self) {
        let vp = self.field();
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let blink = (self.frame / 15) % 2 == 0;

        let box_w = 32_usize.min(vp.cols);
        let box_h = 7_usize.min(vp.rows);
        let box_x = vp.x0 + vp.cols.saturating_sub(box_w) / 2;
        let box_y = vp.y0 + vp.rows.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            self.front.fill_row(y, box_x..box_x + box_w, dim);
        }

        let label = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        let key_c = Color::Rgb { r: 100, g: 200, b: 255 };
        self.front.put_str(box_x + (box_w.saturating_sub(12)) / 2, box_y + 1, label, TITLE, dim);
        self.front.put_str(box_x + 3, box_y + 3, "P / F1   Resume", key_c, dim);
        self.front.put_str(box_x + 3, box_y + 4, "ESC      Back to selection", key_c, dim);
    }

    // ── Compose: selection screen ──

    fn compose_selection(&mut self, w: &WorldState) -> Result<(), AssetError> {
        let sel = w.selection();
        let highlighted = sel.highlighted();

        self.front.put_centered(1, "╔════════════════════════════╗", TITLE, Color::Reset);
        self.front.put_centered(2, "║     Select a Character     ║", TITLE, Color::Reset);
        self.front.put_centered(3, "╚════════════════════════════╝", TITLE, Color::Reset);

        // Portrait, each art char drawn 3 wide and 2 tall
        let sprite = self.atlas.get(highlighted.stand_image)?.clone();
        let (pw, ph) = (sprite.width() * 3, sprite.height() * 2);
        let px = self.front.width.saturating_sub(pw) / 2;
        let py = 5;
        for y in 0..ph {
            for x in 0..pw {
                let ch = sprite.rows[y / 2][x / 3];
                if ch != ' ' {
                    self.front.set(px + x, py + y, Cell::new(ch, sprite.fg, Color::Reset));
                }
            }
        }

        // Name strip
        let strip_row = py + ph + 1;
        let blink = (self.frame / 10) % 2 == 0;
        let names: Vec<String> = sel.catalog().iter().map(|a| format!("  {}  ", a.name)).collect();
        let strip_w: usize = names.iter().map(|n| n.chars().count()).sum::<usize>() + 4;
        let mut x = self.front.width.saturating_sub(strip_w) / 2;
        self.front.put_str(x, strip_row, if blink { "◀ " } else { "  " }, HIGHLIGHT, Color::Reset);
        x += 2;
        for (i, name) in names.iter().enumerate() {
            if i == sel.highlighted_index() {
                self.front.put_str(x, strip_row, name, HIGHLIGHT, HIGHLIGHT_BG);
            } else {
                self.front.put_str(x, strip_row, name, Color::DarkGrey, Color::Reset);
            }
            x += name.chars().count();
        }
        self.front.put_str(x, strip_row, if blink { " ▶" } else { "  " }, HIGHLIGHT, Color::Reset);

        // Catch preview
        let obj = self.atlas.get(highlighted.object_image)?.clone();
        let catches = format!("Catches: {}", obj.rows.first().map(|r| r.iter().collect::<String>()).unwrap_or_default());
        self.front.put_centered(strip_row + 2, &catches, obj.fg, Color::Reset);

        // Results
        let mut row = strip_row + 4;
        if let Some(last) = &w.last_result {
            let how = if last.timed_out { "time's up" } else { "left early" };
            let line = format!("Last round: {} caught {} ({how})", last.avatar.name, last.score);
            self.front.put_centered(row, &line, Color::White, Color::Reset);
            row += 1;
            let best = format!("Best: {}", w.best_score);
            self.front.put_centered(row, &best, TITLE, Color::Reset);
        }

        let footer = self.term_h.saturating_sub(1);
        if footer > row {
            let help = "←/→: Choose   ENTER: Start   ESC: Quit   │  Pad: D-pad, Start";
            self.front.put_centered(footer, help, Color::DarkGrey, Color::Reset);
        }
        Ok(())
    }

    fn compose_message(&mut self, w: &WorldState) {
        if w.message.is_empty() { return; }
        let row = self.term_h.saturating_sub(2);
        if row <= HUD_ROW { return; }
        let msg = format!(" ◈ {} ", w.message);
        self.front.fill_row(row, 0..self.front.width, MSG_BG);
        self.front.put_str(0, row, &msg, Color::Black, MSG_BG);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionTuning;
    use crate::sim::world::SelectInput;

    fn renderer(w: usize, h: usize) -> Renderer {
        let mut r = Renderer::new(SpriteAtlas::builtin());
        r.set_size(w, h);
        r
    }

    fn screen_text(r: &Renderer) -> String {
        (0..r.front.height).map(|y| r.front.row_text(y)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn viewport_keeps_aspect() {
        let vp = Viewport::fit(120, 30, 1);
        assert_eq!((vp.cols, vp.rows), (80, 30));
        assert_eq!(vp.x0, 20);

        let narrow = Viewport::fit(40, 30, 1);
        assert_eq!((narrow.cols, narrow.rows), (40, 15));
    }

    #[test]
    fn rows_flip_world_y() {
        let vp = Viewport { x0: 0, y0: 0, cols: 80, rows: 30 };
        // 20 world units per row; the floor row is the last terminal row
        assert_eq!(vp.row_span(0.0, 20.0), 29..30);
        assert_eq!(vp.row_span(580.0, 600.0), 0..1);
        // 10 world units per column
        assert_eq!(vp.col_span(106.0, 154.0), 10..16);
    }

    #[test]
    fn offscreen_rect_is_clipped() {
        let vp = Viewport { x0: 0, y0: 0, cols: 80, rows: 30 };
        assert_eq!(vp.row_span(584.0, 616.0), 0..1);
        assert!(vp.col_span(-50.0, -10.0).is_empty());
    }

    #[test]
    fn mirroring_swaps_slants() {
        let s: String = "(/|\\)".chars().map(mirror_char).collect();
        assert_eq!(s, ")\\|/(");
    }

    #[test]
    fn selection_screen_shows_title_and_names() {
        let mut r = renderer(100, 30);
        let world = WorldState::new(SessionTuning::default(), 0);
        r.compose(&world).unwrap();
        let text = screen_text(&r);
        assert!(text.contains("Select a Character"));
        assert!(text.contains("Female"));
        assert!(text.contains("Robot"));
        assert!(!text.contains("Last round"));
    }

    #[test]
    fn game_screen_shows_hud() {
        let mut r = renderer(100, 30);
        let mut world = WorldState::new(SessionTuning::default(), 0);
        world.select(SelectInput::Next);
        world.select(SelectInput::Confirm);
        r.compose(&world).unwrap();
        let hud = r.front.row_text(HUD_ROW);
        assert!(hud.contains("Male"));
        assert!(hud.contains("Score: 0"));
        assert!(hud.contains("Time: 30"));
    }

    #[test]
    fn results_show_after_session() {
        let mut r = renderer(100, 30);
        let mut world = WorldState::new(SessionTuning::default(), 0);
        world.select(SelectInput::Confirm);
        world.quit_session();
        r.compose(&world).unwrap();
        let text = screen_text(&r);
        assert!(text.contains("Last round: Female caught 0 (left early)"));
        assert!(text.contains("Best: 0"));
    }

    #[test]
    fn missing_sprite_is_an_error() {
        let mut r = Renderer::new(SpriteAtlas::empty());
        r.set_size(100, 30);
        let world = WorldState::new(SessionTuning::default(), 0);
        assert!(matches!(r.compose(&world), Err(AssetError::NotFound(_))));
    }
}
