use crate::care::Action;
use crate::model::{Side, Subject, GAME_HEIGHT, GAME_WIDTH};
use crate::project::{scale_rect, ArcadeView, BarColor, CareView, CellRect, Rect, StatBar};
use crossterm::{
    cursor,
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    #[cfg(test)]
    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        if x < self.w && y < self.h {
            Some(self.cells[self.idx(x, y)])
        } else {
            None
        }
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            *c = Cell {
                bg,
                ..Cell::default()
            };
        }
    }
    fn fill(&mut self, r: CellRect, ch: char, fg: Color) {
        for y in r.y..r.y.saturating_add(r.h) {
            for x in r.x..r.x.saturating_add(r.w) {
                self.set(
                    x,
                    y,
                    Cell {
                        ch,
                        fg,
                        bg: Color::Black,
                    },
                );
            }
        }
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    /// Whether the terminal reports key release events.
    pub(crate) key_release: bool,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let key_release = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if key_release {
            execute!(
                out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            key_release,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        if self.key_release {
            queue!(self.out, PopKeyboardEnhancementFlags)?;
        }
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Text helpers
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

fn draw_centered(buf: &mut CellBuffer, y: u16, s: &str, fg: Color) {
    let len = s.chars().count() as u16;
    let x = buf.w.saturating_sub(len) / 2;
    draw_text(buf, x, y, s, fg, Color::Black);
}

fn bar(percent: u8, width: usize) -> String {
    let fill = (percent.min(100) as usize * width + 50) / 100;
    let mut s = String::new();
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

pub(crate) fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str) {
    let w = buf.w;
    let h = buf.h;

    let bw = 60.min(w.saturating_sub(4));
    let bh = 12.min(h.saturating_sub(4));
    if bw < 4 || bh < 4 {
        return;
    }

    let x0 = (w - bw) / 2;
    let y0 = (h - bh) / 2;

    let edge = |ch| Cell {
        ch,
        fg: Color::White,
        bg: Color::Black,
    };
    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            buf.set(x, y, edge(' '));
        }
    }
    for x in x0..x0 + bw {
        buf.set(x, y0, edge('─'));
        buf.set(x, y0 + bh - 1, edge('─'));
    }
    for y in y0..y0 + bh {
        buf.set(x0, y, edge('│'));
        buf.set(x0 + bw - 1, y, edge('│'));
    }
    buf.set(x0, y0, edge('┌'));
    buf.set(x0 + bw - 1, y0, edge('┐'));
    buf.set(x0, y0 + bh - 1, edge('└'));
    buf.set(x0 + bw - 1, y0 + bh - 1, edge('┘'));

    draw_text(buf, x0 + 2, y0 + 1, title, Color::Yellow, Color::Black);

    let mut yy = y0 + 3;
    for line in body.lines() {
        if yy >= y0 + bh - 1 {
            break;
        }
        draw_text(buf, x0 + 2, yy, line, Color::White, Color::Black);
        yy += 1;
    }
}

/* -----------------------------
   Scenes
------------------------------ */

fn bar_color(c: BarColor, enable_color: bool) -> Color {
    if !enable_color {
        return Color::White;
    }
    match c {
        BarColor::Good => Color::Green,
        BarColor::Fair => Color::Yellow,
        BarColor::Poor => Color::Red,
    }
}

fn pulse_glyph(a: Action) -> &'static str {
    match a {
        Action::Feed => "*munch*",
        Action::Play => "*boing*",
        Action::Rest => "*zzz*",
    }
}

fn draw_stat_bar(buf: &mut CellBuffer, y: u16, b: &StatBar, enable_color: bool) {
    let line = format!(
        "{:<10} {} {:>5} {:>4}%",
        b.label,
        bar(b.percent, 20),
        b.score_text,
        b.percent
    );
    draw_text(buf, 2, y, &line, bar_color(b.color, enable_color), Color::Black);
}

pub(crate) fn draw_care(buf: &mut CellBuffer, v: &CareView, enable_color: bool) {
    let fg = Color::White;
    let bg = Color::Black;
    draw_text(buf, 1, 0, &format!("Care  |  {}", v.title), fg, bg);

    for (i, b) in v.bars.iter().enumerate() {
        draw_stat_bar(buf, 2 + i as u16 * 2, b, enable_color);
    }

    draw_text(buf, 2, 9, &v.status, Color::Cyan, bg);

    if !v.selected {
        draw_text(buf, 2, 2, "Pick a pet from the roster first.", Color::Red, bg);
    }

    let pulses: Vec<String> = v
        .pulses
        .iter()
        .map(|a| format!("{} {}", a.label(), pulse_glyph(*a)))
        .collect();
    if !pulses.is_empty() {
        let hi = if enable_color { Color::Magenta } else { fg };
        draw_text(buf, 2, 11, &pulses.join("  "), hi, bg);
    }

    let help = if v.locked {
        "Enter claim advantage | Backspace keep playing | esc back"
    } else {
        "Keys: f feed | p play | r rest | esc back | q quit"
    };
    draw_text(buf, 1, buf.h.saturating_sub(1), help, fg, bg);

    if v.locked {
        draw_center_box(
            buf,
            "Milestone!",
            &format!(
                "{}\n\nEnter: claim an advantage for your pet.\nBackspace: keep playing without it.",
                v.status
            ),
        );
    }
}

pub(crate) fn draw_arcade(buf: &mut CellBuffer, v: &ArcadeView, enable_color: bool) {
    let fg = Color::White;
    let bg = Color::Black;
    let name = v.name.as_deref().unwrap_or("You");
    draw_text(
        buf,
        1,
        0,
        &format!("Arcade  |  {name} {} : {} CPU", v.score.0, v.score.1),
        fg,
        bg,
    );

    // playfield between the header and the footer
    let top = 2u16;
    let rows = buf.h.saturating_sub(top + 2);
    let cols = buf.w;
    if rows == 0 || cols == 0 {
        return;
    }
    let to_cells = |r: Rect| {
        let c = scale_rect(r, GAME_WIDTH, GAME_HEIGHT, cols, rows);
        CellRect { y: c.y + top, ..c }
    };

    for x in 0..cols {
        buf.set(x, top - 1, Cell { ch: '─', fg: Color::DarkGrey, bg });
        buf.set(x, top + rows, Cell { ch: '─', fg: Color::DarkGrey, bg });
    }
    for y in (top..top + rows).step_by(2) {
        buf.set(cols / 2, y, Cell { ch: '┆', fg: Color::DarkGrey, bg });
    }

    let (mine, theirs, ball) = if enable_color {
        (Color::Green, Color::Red, Color::Yellow)
    } else {
        (fg, fg, fg)
    };
    buf.fill(to_cells(v.player), '█', mine);
    buf.fill(to_cells(v.opponent), '█', theirs);
    buf.fill(to_cells(v.ball), '●', ball);

    if let Some(banner) = &v.banner {
        let tone = match (enable_color, v.game_over, v.winner) {
            (false, _, _) => fg,
            (true, true, Some(Side::Player)) => Color::Green,
            (true, true, _) => Color::Red,
            (true, false, _) => Color::Yellow,
        };
        draw_centered(buf, top + rows / 2, banner, tone);
    }

    draw_text(
        buf,
        1,
        buf.h.saturating_sub(1),
        "Keys: ↑↓ / w s move | space serve | esc back | q quit",
        fg,
        bg,
    );
}

pub(crate) fn draw_roster(buf: &mut CellBuffer, pets: &[Subject], cursor: usize, note: &str) {
    let fg = Color::White;
    let bg = Color::Black;
    draw_text(buf, 1, 0, "petplay  |  Choose a pet", fg, bg);

    if pets.is_empty() {
        draw_text(buf, 2, 2, "No pets found for this owner.", Color::Red, bg);
    }
    for (i, p) in pets.iter().enumerate() {
        let selected = i == cursor;
        let line = format!(
            "{} {:<18} Advantage {}",
            if selected { ">" } else { " " },
            p.name,
            p.advantage
        );
        draw_text(
            buf,
            2,
            2 + i as u16,
            &line,
            if selected { Color::Yellow } else { fg },
            bg,
        );
    }
    if !note.is_empty() {
        draw_text(buf, 2, 3 + pets.len() as u16, note, Color::Cyan, bg);
    }

    draw_text(
        buf,
        1,
        buf.h.saturating_sub(1),
        "Keys: ↑↓ select | enter care | a arcade | h help | q quit",
        fg,
        bg,
    );
}

pub(crate) const HELP_TEXT: &str = "Care: F feed, P play, R rest. Stats fall over time.\n\
    Tired pets will not eat or play; hungry ones won't play.\n\
    Push the total past 25 to earn an advantage.\n\n\
    Arcade: first to 5. Advantage grows your paddle.\n\
    Hold up/down or W/S to move, Space to serve.\n\n\
    Esc or H to close help.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatTriple;
    use crate::project::stat_bars;

    fn row(buf: &CellBuffer, y: u16) -> String {
        (0..buf.w).filter_map(|x| buf.get(x, y)).map(|c| c.ch).collect()
    }

    #[test]
    fn bar_rounds_to_width() {
        assert_eq!(bar(0, 10), "[          ]");
        assert_eq!(bar(50, 10), "[█████     ]");
        assert_eq!(bar(100, 4), "[████]");
    }

    #[test]
    fn care_scene_shows_bars_status_and_pulses() {
        let mut buf = CellBuffer::new(80, 24);
        let v = CareView {
            title: "Rex  |  Advantage 1".into(),
            bars: stat_bars(&StatTriple::new(8, 6, 4)),
            status: "Rex is a bit sleepy.".into(),
            pulses: vec![Action::Feed],
            selected: true,
            locked: false,
        };
        draw_care(&mut buf, &v, true);
        assert!(row(&buf, 0).contains("Rex  |  Advantage 1"));
        assert!(row(&buf, 2).contains("8/10"));
        assert!(row(&buf, 9).contains("a bit sleepy"));
        assert!(row(&buf, 11).contains("Feed *munch*"));
        assert_eq!(buf.get(2, 2).unwrap().fg, Color::Green);
    }

    fn mid_rally() -> ArcadeView {
        ArcadeView {
            ball: Rect {
                x: 300.0,
                y: 200.0,
                w: 12.0,
                h: 12.0,
            },
            player: Rect {
                x: 20.0,
                y: 160.0,
                w: 10.0,
                h: 80.0,
            },
            opponent: Rect {
                x: 570.0,
                y: 160.0,
                w: 10.0,
                h: 80.0,
            },
            score: (1, 2),
            game_over: false,
            winner: None,
            banner: None,
            name: Some("Rex".into()),
        }
    }

    fn screen(buf: &CellBuffer) -> String {
        (0..buf.h).map(|y| row(buf, y)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn arcade_scene_draws_header_paddles_and_ball() {
        let mut buf = CellBuffer::new(62, 24);
        draw_arcade(&mut buf, &mid_rally(), true);
        assert!(row(&buf, 0).contains("Rex 1 : 2 CPU"));
        let drawn = screen(&buf);
        assert!(drawn.contains('█'));
        assert!(drawn.contains('●'));
        assert_eq!(buf.get(2, 10).unwrap().ch, '█');
        assert_eq!(buf.get(2, 10).unwrap().fg, Color::Green);
    }

    #[test]
    fn arcade_scene_draws_inside_a_tiny_terminal() {
        let mut buf = CellBuffer::new(3, 3);
        draw_arcade(&mut buf, &mid_rally(), false);
        assert_eq!(row(&buf, 0), "Arc");
        assert!(!screen(&buf).contains('█'));
    }
}
