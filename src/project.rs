//! Pure projection from game state to what the screen shows. Nothing here
//! mutates a game; the renderer only ever sees these views.

use crate::arcade::Arcade;
use crate::care::{Action, CareGame};
use crate::model::{ArcadeMode, CareMode, Side, Stat, StatTriple, STAT_MAX};
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BarColor {
    Good,
    Fair,
    Poor,
}

impl BarColor {
    pub(crate) fn for_value(v: u8) -> Self {
        if v >= 7 {
            BarColor::Good
        } else if v >= 4 {
            BarColor::Fair
        } else {
            BarColor::Poor
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StatBar {
    pub(crate) label: &'static str,
    pub(crate) score_text: String,
    pub(crate) percent: u8,
    pub(crate) color: BarColor,
}

pub(crate) fn stat_bars(stats: &StatTriple) -> Vec<StatBar> {
    Stat::ALL
        .iter()
        .map(|&stat| {
            let v = stats.get(stat);
            StatBar {
                label: stat.label(),
                score_text: format!("{v}/{STAT_MAX}"),
                percent: (v as u32 * 100 / STAT_MAX as u32) as u8,
                color: BarColor::for_value(v),
            }
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CareView {
    pub(crate) title: String,
    pub(crate) bars: Vec<StatBar>,
    pub(crate) status: String,
    pub(crate) pulses: Vec<Action>,
    pub(crate) selected: bool,
    pub(crate) locked: bool,
}

pub(crate) fn project_care(game: &CareGame) -> CareView {
    let title = match game.subject() {
        Some(s) => format!("{}  |  Advantage {}", s.name, s.advantage),
        None => "No pet selected".to_string(),
    };
    let selected = game.mode() != CareMode::Unselected;
    CareView {
        title,
        bars: if selected {
            stat_bars(&game.stats())
        } else {
            Vec::new()
        },
        status: game.status().to_string(),
        pulses: game.pulses().collect(),
        selected,
        locked: game.mode() == CareMode::Locked,
    }
}

/// Axis-aligned rectangle in playfield units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rect {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) w: f32,
    pub(crate) h: f32,
}

/// Same rectangle in terminal cells, clipped to the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CellRect {
    pub(crate) x: u16,
    pub(crate) y: u16,
    pub(crate) w: u16,
    pub(crate) h: u16,
}

/// Maps a playfield rectangle onto a `cols` x `rows` cell grid that covers
/// a `field_w` x `field_h` playfield. Every visible object keeps at least
/// one cell.
pub(crate) fn scale_rect(r: Rect, field_w: f32, field_h: f32, cols: u16, rows: u16) -> CellRect {
    if cols == 0 || rows == 0 {
        return CellRect {
            x: 0,
            y: 0,
            w: 0,
            h: 0,
        };
    }
    let sx = cols as f32 / field_w;
    let sy = rows as f32 / field_h;
    let x0 = (r.x * sx).floor().clamp(0.0, (cols - 1) as f32);
    let y0 = (r.y * sy).floor().clamp(0.0, (rows - 1) as f32);
    let x1 = ((r.x + r.w) * sx).ceil().clamp(x0 + 1.0, cols as f32);
    let y1 = ((r.y + r.h) * sy).ceil().clamp(y0 + 1.0, rows as f32);
    CellRect {
        x: x0 as u16,
        y: y0 as u16,
        w: (x1 - x0) as u16,
        h: (y1 - y0) as u16,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ArcadeView {
    pub(crate) ball: Rect,
    pub(crate) player: Rect,
    pub(crate) opponent: Rect,
    pub(crate) score: (u32, u32),
    pub(crate) game_over: bool,
    pub(crate) winner: Option<Side>,
    pub(crate) banner: Option<String>,
    pub(crate) name: Option<String>,
}

pub(crate) fn project_arcade<R: Rng>(game: &Arcade<R>) -> ArcadeView {
    let b = game.ball();
    let p = game.player();
    let o = game.opponent();
    let name = game.subject().map(|s| s.name.clone());
    let banner = match (game.mode(), game.winner()) {
        (ArcadeMode::Idle, _) if name.is_none() => Some("Pick a pet first".to_string()),
        (ArcadeMode::Idle, _) => Some("Press Space to serve".to_string()),
        (ArcadeMode::GameOver, Some(Side::Player)) => Some(format!(
            "{} wins! Space to play again",
            name.as_deref().unwrap_or("You")
        )),
        (ArcadeMode::GameOver, _) => Some("The computer wins. Space to play again".to_string()),
        (ArcadeMode::Running, _) => None,
    };
    ArcadeView {
        ball: Rect {
            x: b.x,
            y: b.y,
            w: b.size,
            h: b.size,
        },
        player: Rect {
            x: p.x,
            y: p.y,
            w: p.width,
            h: p.height,
        },
        opponent: Rect {
            x: o.x,
            y: o.y,
            w: o.width,
            h: o.height,
        },
        score: (game.score().player, game.score().opponent),
        game_over: game.mode() == ArcadeMode::GameOver,
        winner: game.winner(),
        banner,
        name,
    }
}
