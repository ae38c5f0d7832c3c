/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The world is drawn at one terminal row and two columns per tile, so a
/// pixel position maps to a cell with `Camera::world_to_view`.

use std::io::{self, BufWriter, Write};
use std::time::Instant;

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::tile::TileKind;
use crate::sim::scores::{format_elapsed, ScoreRecord};
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every "empty" cell. Clearing with the
    /// same colour keeps row gaps on VTE terminals from showing through.
    const BASE_BG: Color = Color::Rgb { r: 14, g: 18, b: 32 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel that differs from any real cell; forces a full repaint.
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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

/// Terminal columns per world tile.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 24, g: 40, b: 72 };
const MSG_BG: Color = Color::Rgb { r: 170, g: 210, b: 240 };
const GOLD: Color = Color::Rgb { r: 255, g: 210, b: 80 };
const HI: Color = Color::Rgb { r: 140, g: 230, b: 255 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Draw one frame. `now` feeds the jump-charge meter.
    pub fn render(&mut self, world: &mut WorldState, now: Instant) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Viewport in tiles: HUD + gap above, message + help below.
        let reserved_rows = MAP_ROW + 3;
        let view_w = (self.term_w / CELL_W).max(1);
        let view_h = self.term_h.saturating_sub(reserved_rows).max(1);
        if (world.camera.view_w, world.camera.view_h) != (view_w, view_h) {
            world.camera.view_w = view_w;
            world.camera.view_h = view_h;
            let center = world.player.body.rect().center();
            world.camera.center_on(center, world.tilemap.tile_size());
        }

        let phase_changed = self.last_phase != Some(world.phase);
        if phase_changed {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        match world.phase {
            Phase::LevelSelect => self.compose_level_select(world),
            Phase::Playing => self.compose_game(world, now),
            Phase::Won => self.compose_summary(world),
        }
        if world.paused && world.phase == Phase::Playing {
            self.compose_pause_overlay(world);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colours; ResetColor would fall back to the terminal's own.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
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

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState, now: Instant) {
        let cam = &w.camera;
        let ts = w.tilemap.tile_size();

        // ── HUD row ──
        let hud = format!(
            " {}   Time {}   Jumps {} ",
            w.level_name,
            format_elapsed(w.steps, w.fps),
            w.player.total_jumps,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
        if let Some(power) = w.player.charge_power_preview(now) {
            let bar_x = hud.chars().count() + 1;
            let filled = (power * 10.0).round() as usize;
            let bar: String = (0..10).map(|i| if i < filled { '█' } else { '·' }).collect();
            self.front.put_str(bar_x, HUD_ROW, &format!("[{bar}]"), GOLD, HUD_BG);
        }

        // ── Tiles (camera viewport) ──
        let row_of = |vy: usize| MAP_ROW + vy;
        for tile in w.tilemap.tiles() {
            let (px, py) = ((tile.pos.x * ts as i32) as f64, (tile.pos.y * ts as i32) as f64);
            if let Some((vx, vy)) = cam.world_to_view(px, py, ts) {
                self.draw_tile(tile.kind, vx * CELL_W, row_of(vy), false);
            }
        }
        for deco in w.tilemap.offgrid() {
            if let Some((vx, vy)) = cam.world_to_view(deco.pos.x, deco.pos.y, ts) {
                self.draw_tile(deco.kind, vx * CELL_W, row_of(vy), true);
            }
        }

        // ── Player sprite ──
        let (ox, oy) = w.player.render_offset();
        let pos = w.player.position();
        let frame = w.player.frame();
        let flip = w.player.flip();
        for (i, line) in frame.rows.iter().enumerate() {
            let py = pos.y + oy as f64 + (i as u32 * ts) as f64;
            if let Some((vx, vy)) = cam.world_to_view(pos.x + ox as f64, py, ts) {
                let glyphs: String = if flip {
                    line.chars().rev().map(mirror).collect()
                } else {
                    line.to_string()
                };
                let col = vx * CELL_W;
                let row = row_of(vy);
                for (j, ch) in glyphs.chars().enumerate() {
                    if ch != ' ' {
                        let bg = self.front.get(col + j, row).bg;
                        self.front.set(col + j, row, Cell::new(ch, HI, bg));
                    }
                }
            }
        }

        // ── Message bar ──
        let msg_row = MAP_ROW + cam.view_h;
        if !w.message.is_empty() && msg_row < self.front.height {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" {} ", w.message), Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = msg_row + 1;
        if help_row < self.front.height {
            let help = " ←→/AD:Move  Space/W:Hold to charge, release to jump  P:Pause  R:Restart  Esc:Levels";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn draw_tile(&mut self, kind: TileKind, col: usize, row: usize, decorative: bool) {
        if row < MAP_ROW {
            return;
        }
        let (glyph, fg, bg) = tile_look(kind);
        let (fg, bg) = if decorative { (dim(fg), Color::Reset) } else { (fg, bg) };
        for (j, ch) in glyph.chars().take(CELL_W).enumerate() {
            self.front.set(col + j, row, Cell::new(ch, fg, bg));
        }
    }

    fn compose_level_select(&mut self, w: &WorldState) {
        let title = [
            r"  ___               _     _           ",
            r" | __| _ ___ ___ __| |_  | |_  ___ _ __ ",
            r" | _| '_/ _ (_-<(_-<  _| | ' \/ _ \ '_ \",
            r" |_||_| \___/__//__/\__| |_||_\___/ .__/",
            r"                                  |_|   ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 1 + i, line, HI, Color::Reset);
        }
        self.front.put_str(4, 7, "LEVEL SELECT", GOLD, Color::Reset);

        let list_top = 9;
        let cursor_bg = Color::Rgb { r: 30, g: 55, b: 90 };
        for (idx, name) in w.level_names.iter().enumerate() {
            let row = list_top + idx;
            if row >= self.front.height { break; }
            let label = format!("{:>3}. {}", idx + 1, name);
            if idx == w.select_cursor {
                for x in 2..40.min(self.front.width) {
                    self.front.set(x, row, Cell::new(' ', Color::White, cursor_bg));
                }
                self.front.put_str(2, row, "▸", GOLD, cursor_bg);
                self.front.put_str(3, row, &label, HI, cursor_bg);
            } else {
                self.front.put_str(3, row, &label, Color::White, Color::Reset);
            }
        }

        let footer_row = list_top + w.level_names.len() + 1;
        self.front.put_str(2, footer_row, "  ENTER: Play   ↑↓: Select   Ctrl+C: Quit", Color::DarkGrey, Color::Reset);
        if !w.message.is_empty() {
            self.front.put_str(2, footer_row + 2, &format!("  {}", w.message), GOLD, Color::Reset);
        }
    }

    fn compose_summary(&mut self, w: &WorldState) {
        let box_art = [
            "╔══════════════════════════════╗",
            "║        LEVEL  CLEARED        ║",
            "╚══════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 2 + i, l, GOLD, Color::Reset);
        }
        let time = format_elapsed(w.steps, w.fps);
        self.front.put_str(6, 6, &format!("Level   {}", w.level_name), Color::White, Color::Reset);
        self.front.put_str(6, 7, &format!("Time    {time}"), Color::White, Color::Reset);
        self.front.put_str(6, 8, &format!("Jumps   {}", w.player.total_jumps), Color::White, Color::Reset);

        if w.score_saved {
            self.front.put_str(6, 10, "Best runs on this level:", HI, Color::Reset);
            for (i, rec) in best_runs(&w.leaderboard, &w.level_name, 8).iter().enumerate() {
                let line = format!("{:>2}. {:<16} {}  {:>4} jumps", i + 1, rec.user_name, rec.time, rec.total_jumps);
                self.front.put_str(6, 11 + i, &line, Color::White, Color::Reset);
            }
            self.front.put_str(6, 20, "▸ ENTER / ESC: Level select", HI, Color::Reset);
        } else {
            self.front.put_str(6, 10, &format!("Name: {}_", w.name_entry), GOLD, Color::Reset);
            self.front.put_str(6, 12, "▸ ENTER: Save   ESC: Skip", Color::DarkGrey, Color::Reset);
        }
        if !w.message.is_empty() {
            self.front.put_str(6, 22, &w.message, GOLD, Color::Reset);
        }
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let bg = Color::Rgb { r: 30, g: 30, b: 40 };
        let cam = &w.camera;
        let view_cols = cam.view_w * CELL_W;
        let box_w = 30_usize.min(view_cols);
        let box_h = 7_usize.min(cam.view_h);
        let box_x = view_cols.saturating_sub(box_w) / 2;
        let box_y = MAP_ROW + cam.view_h.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, bg));
            }
        }
        self.front.put_str(box_x + 11, box_y + 1, "PAUSED", GOLD, bg);
        self.front.put_str(box_x + 3, box_y + 3, "P    Resume", HI, bg);
        self.front.put_str(box_x + 3, box_y + 4, "R    Restart level", HI, bg);
        self.front.put_str(box_x + 3, box_y + 5, "Esc  Level select", HI, bg);
    }
}

/// Glyph pair and colours for a tile.
fn tile_look(kind: TileKind) -> (&'static str, Color, Color) {
    let rgb = |r, g, b| Color::Rgb { r, g, b };
    match kind {
        TileKind::Grass          => ("\"\"", rgb(120, 220, 90), rgb(80, 52, 30)),
        TileKind::Stone          => ("▓▓", rgb(150, 150, 160), rgb(80, 80, 90)),
        TileKind::EvilPurple     => ("▒▒", rgb(170, 70, 200), rgb(70, 20, 90)),
        TileKind::PyramidYellow  => ("▒▒", rgb(230, 200, 90), rgb(140, 110, 40)),
        TileKind::EmeraldGreen   => ("▒▒", rgb(60, 210, 130), rgb(20, 100, 60)),
        TileKind::DiamondBlue    => ("▒▒", rgb(120, 200, 250), rgb(40, 90, 150)),
        TileKind::CastleBlue     => ("[]", rgb(110, 140, 230), rgb(40, 55, 120)),
        TileKind::GrassPurple    => ("\"\"", rgb(210, 130, 250), rgb(70, 35, 70)),
        TileKind::GrassThickSnow => ("≈≈", rgb(255, 255, 255), rgb(200, 212, 230)),
        TileKind::PlainSnow      => ("~~", rgb(255, 255, 255), rgb(160, 172, 196)),
        TileKind::Ice            => ("//", rgb(220, 245, 255), rgb(110, 180, 225)),
        TileKind::WinTiles       => ("**", rgb(255, 230, 90), rgb(130, 95, 10)),
    }
}

fn dim(c: Color) -> Color {
    match c {
        Color::Rgb { r, g, b } => Color::Rgb { r: r / 2, g: g / 2, b: b / 2 },
        other => other,
    }
}

/// Horizontal mirror of a sprite glyph.
fn mirror(ch: char) -> char {
    match ch {
        '/' => '\\',
        '\\' => '/',
        '<' => '>',
        '>' => '<',
        '(' => ')',
        ')' => '(',
        other => other,
    }
}

/// Runs on `level`, fastest first; ties go to fewer jumps.
fn best_runs<'a>(records: &'a [ScoreRecord], level: &str, limit: usize) -> Vec<&'a ScoreRecord> {
    let mut runs: Vec<&ScoreRecord> = records.iter().filter(|r| r.level == level).collect();
    runs.sort_by(|a, b| {
        let key = |r: &ScoreRecord| (r.time.len(), r.time.clone(), r.total_jumps);
        key(a).cmp(&key(b))
    });
    runs.truncate(limit);
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, time: &str, jumps: u32, level: &str) -> ScoreRecord {
        ScoreRecord { user_name: name.into(), time: time.into(), total_jumps: jumps, level: level.into() }
    }

    #[test]
    fn best_runs_sorts_by_time_then_jumps() {
        let records = vec![
            rec("slow", "02:10", 5, "Tutorial"),
            rec("other", "00:01", 1, "Winter Wilds"),
            rec("fast", "00:59", 30, "Tutorial"),
            rec("tidy", "00:59", 12, "Tutorial"),
            rec("marathon", "100:00", 1, "Tutorial"),
        ];
        let names: Vec<&str> = best_runs(&records, "Tutorial", 3).iter().map(|r| r.user_name.as_str()).collect();
        assert_eq!(names, vec!["tidy", "fast", "slow"]);
    }

    #[test]
    fn mirror_flips_slants_and_brackets() {
        let flipped: String = "/|".chars().rev().map(mirror).collect();
        assert_eq!(flipped, "|\\");
        assert_eq!(mirror('('), ')');
        assert_eq!(mirror('o'), 'o');
    }

    #[test]
    fn every_tile_has_a_two_column_glyph() {
        for kind in TileKind::ALL {
            assert_eq!(tile_look(kind).0.chars().count(), CELL_W, "{kind}");
        }
    }

    #[test]
    fn framebuffer_clips_out_of_range_writes() {
        let mut fb = FrameBuffer::new(4, 2);
        fb.put_str(2, 1, "abc", Color::White, Color::Reset);
        assert_eq!(fb.get(3, 1).ch, 'b');
        fb.set(9, 9, Cell::new('x', Color::White, Color::Reset));
        assert!(fb.get(9, 9) == Cell::BLANK);
        assert!(fb.get(2, 1).bg == Cell::BASE_BG);
    }
}
