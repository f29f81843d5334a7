use serde::{Deserialize, Serialize};

pub(crate) const STAT_MAX: u8 = 10;
pub(crate) const MILESTONE_TOTAL: u32 = 25;

pub(crate) const GAME_WIDTH: f32 = 600.0;
pub(crate) const GAME_HEIGHT: f32 = 400.0;
pub(crate) const BALL_SIZE: f32 = 12.0;
pub(crate) const PADDLE_WIDTH: f32 = 10.0;
pub(crate) const PADDLE_MARGIN: f32 = 20.0;
pub(crate) const OPPONENT_PADDLE_HEIGHT: f32 = 80.0;
pub(crate) const PLAYER_BASE_HEIGHT: f32 = 80.0;
pub(crate) const PLAYER_HEIGHT_PER_ADVANTAGE: f32 = 8.0;
pub(crate) const PLAYER_MAX_HEIGHT: f32 = 200.0;
pub(crate) const WINNING_SCORE: u32 = 5;

/// The pet record both games operate on. Owned by the store; the games only
/// ever hold a snapshot of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Subject {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) advantage: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Stat {
    Satiety,
    Happiness,
    Alertness,
}

impl Stat {
    pub(crate) const ALL: [Stat; 3] = [Stat::Satiety, Stat::Happiness, Stat::Alertness];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Stat::Satiety => "Satiety",
            Stat::Happiness => "Happiness",
            Stat::Alertness => "Alertness",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) struct StatTriple {
    pub(crate) satiety: u8,
    pub(crate) happiness: u8,
    pub(crate) alertness: u8,
}

impl StatTriple {
    pub(crate) const NEUTRAL: StatTriple = StatTriple {
        satiety: 5,
        happiness: 5,
        alertness: 5,
    };

    #[cfg(test)]
    pub(crate) fn new(satiety: u8, happiness: u8, alertness: u8) -> Self {
        Self {
            satiety: satiety.min(STAT_MAX),
            happiness: happiness.min(STAT_MAX),
            alertness: alertness.min(STAT_MAX),
        }
    }

    pub(crate) fn get(&self, stat: Stat) -> u8 {
        match stat {
            Stat::Satiety => self.satiety,
            Stat::Happiness => self.happiness,
            Stat::Alertness => self.alertness,
        }
    }

    pub(crate) fn total(&self) -> u32 {
        self.satiety as u32 + self.happiness as u32 + self.alertness as u32
    }

    /// Applies signed deltas, clamping every component into `0..=STAT_MAX`.
    pub(crate) fn shifted(&self, satiety: i8, happiness: i8, alertness: i8) -> Self {
        Self {
            satiety: shift(self.satiety, satiety),
            happiness: shift(self.happiness, happiness),
            alertness: shift(self.alertness, alertness),
        }
    }
}

fn shift(v: u8, delta: i8) -> u8 {
    (v as i16 + delta as i16).clamp(0, STAT_MAX as i16) as u8
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CareMode {
    Unselected,
    Active,
    Locked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ArcadeMode {
    Idle,
    Running,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Player,
    Opponent,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Ball {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) vx: f32,
    pub(crate) vy: f32,
    pub(crate) size: f32,
}

impl Ball {
    pub(crate) fn centered() -> Self {
        Self {
            x: (GAME_WIDTH - BALL_SIZE) / 2.0,
            y: (GAME_HEIGHT - BALL_SIZE) / 2.0,
            vx: 0.0,
            vy: 0.0,
            size: BALL_SIZE,
        }
    }

    pub(crate) fn center_y(&self) -> f32 {
        self.y + self.size / 2.0
    }

    pub(crate) fn center_x(&self) -> f32 {
        self.x + self.size / 2.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Paddle {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl Paddle {
    pub(crate) fn player(height: f32) -> Self {
        Self {
            x: PADDLE_MARGIN,
            y: (GAME_HEIGHT - height) / 2.0,
            width: PADDLE_WIDTH,
            height,
        }
    }

    pub(crate) fn opponent() -> Self {
        Self {
            x: GAME_WIDTH - PADDLE_MARGIN - PADDLE_WIDTH,
            y: (GAME_HEIGHT - OPPONENT_PADDLE_HEIGHT) / 2.0,
            width: PADDLE_WIDTH,
            height: OPPONENT_PADDLE_HEIGHT,
        }
    }

    pub(crate) fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Moves the paddle so its center sits at `cy`, kept inside the playfield.
    pub(crate) fn center_on(&mut self, cy: f32) {
        self.y = cy - self.height / 2.0;
        self.clamp_to_field();
    }

    pub(crate) fn clamp_to_field(&mut self) {
        self.y = self.y.clamp(0.0, (GAME_HEIGHT - self.height).max(0.0));
    }

    pub(crate) fn overlaps(&self, ball: &Ball) -> bool {
        ball.x < self.x + self.width
            && ball.x + ball.size > self.x
            && ball.y < self.y + self.height
            && ball.y + ball.size > self.y
    }
}

pub(crate) fn player_paddle_height(advantage: i32) -> f32 {
    let bonus = advantage.max(0) as f32 * PLAYER_HEIGHT_PER_ADVANTAGE;
    (PLAYER_BASE_HEIGHT + bonus).min(PLAYER_MAX_HEIGHT)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Score {
    pub(crate) player: u32,
    pub(crate) opponent: u32,
}

impl Score {
    pub(crate) fn award(&mut self, side: Side) {
        match side {
            Side::Player => self.player += 1,
            Side::Opponent => self.opponent += 1,
        }
    }

    pub(crate) fn winner(&self) -> Option<Side> {
        if self.player >= WINNING_SCORE {
            Some(Side::Player)
        } else if self.opponent >= WINNING_SCORE {
            Some(Side::Opponent)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifted_clamps_both_ends() {
        let s = StatTriple::new(9, 1, 10).shifted(3, -2, 5);
        assert_eq!(s, StatTriple::new(10, 0, 10));
    }

    #[test]
    fn new_clamps_above_max() {
        assert_eq!(StatTriple::new(30, 11, 4), StatTriple::new(10, 10, 4));
    }

    #[test]
    fn player_height_grows_with_advantage_and_caps() {
        assert_eq!(player_paddle_height(0), PLAYER_BASE_HEIGHT);
        assert_eq!(player_paddle_height(-3), PLAYER_BASE_HEIGHT);
        assert_eq!(player_paddle_height(2), PLAYER_BASE_HEIGHT + 16.0);
        assert_eq!(player_paddle_height(1000), PLAYER_MAX_HEIGHT);
    }

    #[test]
    fn center_on_stays_in_field() {
        let mut p = Paddle::opponent();
        p.center_on(0.0);
        assert_eq!(p.y, 0.0);
        p.center_on(GAME_HEIGHT);
        assert_eq!(p.y, GAME_HEIGHT - p.height);
        p.center_on(200.0);
        assert_eq!(p.center_y(), 200.0);
    }

    #[test]
    fn winner_at_threshold() {
        let mut s = Score::default();
        for _ in 0..WINNING_SCORE - 1 {
            s.award(Side::Opponent);
        }
        assert_eq!(s.winner(), None);
        s.award(Side::Opponent);
        assert_eq!(s.winner(), Some(Side::Opponent));
    }
}
