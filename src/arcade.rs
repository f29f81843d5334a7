//! Pong-style arcade game: one ball, the pet's paddle on the left, an AI
//! paddle on the right, first to five.

use crate::ai::OpponentAi;
use crate::clock::{Clock, Scheduler};
use crate::model::{
    player_paddle_height, ArcadeMode, Ball, Paddle, Score, Side, Subject, GAME_HEIGHT, GAME_WIDTH,
};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info};

pub(crate) const PLAYER_STEP: f32 = 8.0;
pub(crate) const SERVE_VX: f32 = 5.0;
pub(crate) const SERVE_VY: f32 = 3.0;
pub(crate) const BOUNCE_COEFFICIENT: f32 = 6.0;
pub(crate) const PLAYER_SPEEDUP: f32 = 2.0;
pub(crate) const OPPONENT_SPEEDUP: f32 = 1.0;
pub(crate) const PLAYER_MIN_VX: f32 = 5.0;
pub(crate) const OPPONENT_MIN_VX: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Up,
    Down,
}

/// Point-of-contact bounce: the further from the paddle's centre the ball
/// lands, the steeper it leaves. The ball is pushed flush against the
/// paddle face so one contact is only counted once.
pub(crate) fn deflect(ball: &mut Ball, paddle: &Paddle, side: Side) {
    let diff = ball.center_y() - paddle.center_y();
    ball.vy = diff / (paddle.height / 2.0) * BOUNCE_COEFFICIENT;
    let speed = ball.vx.abs();
    match side {
        Side::Player => {
            ball.vx = (speed + PLAYER_SPEEDUP).max(PLAYER_MIN_VX);
            ball.x = paddle.x + paddle.width;
        }
        Side::Opponent => {
            ball.vx = -(speed + OPPONENT_SPEEDUP).max(OPPONENT_MIN_VX);
            ball.x = paddle.x - ball.size;
        }
    }
}

/// Whether the ball's leading edge passed the paddle's facing side between
/// `prev_x` and its current position while vertically level with it.
fn crossed_face(ball: &Ball, prev_x: f32, paddle: &Paddle, side: Side) -> bool {
    let level = ball.y < paddle.y + paddle.height && ball.y + ball.size > paddle.y;
    if !level {
        return false;
    }
    match side {
        Side::Player => {
            let face = paddle.x + paddle.width;
            prev_x >= face && ball.x < face
        }
        Side::Opponent => {
            let face = paddle.x;
            prev_x + ball.size <= face && ball.x + ball.size > face
        }
    }
}

pub(crate) struct Arcade<R: Rng = StdRng> {
    subject: Option<Subject>,
    mode: ArcadeMode,
    ball: Ball,
    player: Paddle,
    opponent: Paddle,
    score: Score,
    serving: bool,
    held_up: bool,
    held_down: bool,
    winner: Option<Side>,
    ai: OpponentAi,
    rng: R,
    clock: Clock,
    disposed: bool,
    revision: u64,
}

impl<R: Rng> Arcade<R> {
    pub(crate) fn new(period: Duration, rng: R) -> Self {
        Self {
            subject: None,
            mode: ArcadeMode::Idle,
            ball: Ball::centered(),
            player: Paddle::player(player_paddle_height(0)),
            opponent: Paddle::opponent(),
            score: Score::default(),
            serving: false,
            held_up: false,
            held_down: false,
            winner: None,
            ai: OpponentAi::default(),
            rng,
            clock: Clock::new(period),
            disposed: false,
            revision: 0,
        }
    }

    pub(crate) fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    pub(crate) fn mode(&self) -> ArcadeMode {
        self.mode
    }

    pub(crate) fn ball(&self) -> &Ball {
        &self.ball
    }

    pub(crate) fn player(&self) -> &Paddle {
        &self.player
    }

    pub(crate) fn opponent(&self) -> &Paddle {
        &self.opponent
    }

    pub(crate) fn score(&self) -> Score {
        self.score
    }

    #[cfg(test)]
    pub(crate) fn serving(&self) -> bool {
        self.serving
    }

    pub(crate) fn winner(&self) -> Option<Side> {
        self.winner
    }

    #[cfg(test)]
    pub(crate) fn clock(&self) -> &Clock {
        &self.clock
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    fn notify_changed(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Attaches the pet whose advantage sizes the player's paddle. Any game
    /// in progress is abandoned.
    pub(crate) fn bind(&mut self, subject: Subject) {
        if self.disposed {
            return;
        }
        self.player = Paddle::player(player_paddle_height(subject.advantage));
        self.subject = Some(subject);
        self.to_idle();
    }

    pub(crate) fn unbind(&mut self) {
        if self.disposed {
            return;
        }
        self.subject = None;
        self.to_idle();
    }

    fn to_idle(&mut self) {
        self.release_all();
        self.clock.stop();
        self.mode = ArcadeMode::Idle;
        self.score = Score::default();
        self.winner = None;
        self.serving = false;
        self.ball = Ball::centered();
        self.opponent = Paddle::opponent();
        self.notify_changed();
    }

    pub(crate) fn start(&mut self) -> bool {
        if self.disposed || self.mode != ArcadeMode::Idle {
            return false;
        }
        self.begin()
    }

    pub(crate) fn restart(&mut self) -> bool {
        if self.disposed || self.mode != ArcadeMode::GameOver {
            return false;
        }
        self.begin()
    }

    fn begin(&mut self) -> bool {
        let Some(advantage) = self.subject.as_ref().map(|s| s.advantage) else {
            return false;
        };
        self.player = Paddle::player(player_paddle_height(advantage));
        self.opponent = Paddle::opponent();
        self.release_all();
        self.score = Score::default();
        self.winner = None;
        self.reset_ball();
        self.mode = ArcadeMode::Running;
        self.clock.stop();
        self.clock.start();
        info!(advantage, paddle = self.player.height, "arcade: match started");
        self.notify_changed();
        true
    }

    pub(crate) fn key_down(&mut self, dir: Direction) {
        self.set_held(dir, true);
    }

    pub(crate) fn key_up(&mut self, dir: Direction) {
        self.set_held(dir, false);
    }

    /// Drops both direction keys, as if they had been released.
    pub(crate) fn release_all(&mut self) {
        self.held_up = false;
        self.held_down = false;
    }

    fn set_held(&mut self, dir: Direction, held: bool) {
        if self.disposed {
            return;
        }
        match dir {
            Direction::Up => self.held_up = held,
            Direction::Down => self.held_down = held,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_held(&self, dir: Direction) -> bool {
        match dir {
            Direction::Up => self.held_up,
            Direction::Down => self.held_down,
        }
    }

    pub(crate) fn advance(&mut self, dt: Duration) {
        if self.disposed {
            return;
        }
        self.clock.advance(dt);
        while self.clock.take_tick() {
            self.tick();
        }
    }

    pub(crate) fn tick(&mut self) {
        if self.disposed || self.mode != ArcadeMode::Running {
            return;
        }
        self.move_player();

        let prev_x = self.ball.x;
        self.ball.x += self.ball.vx;
        self.ball.y += self.ball.vy;
        self.bounce_walls();

        self.ai
            .steer(&mut self.rng, &mut self.opponent, &self.ball, self.serving);

        self.collide_paddles(prev_x);
        self.check_score();
        self.notify_changed();
    }

    fn move_player(&mut self) {
        let mut dy = 0.0;
        if self.held_up {
            dy -= PLAYER_STEP;
        }
        if self.held_down {
            dy += PLAYER_STEP;
        }
        self.player.y += dy;
        self.player.clamp_to_field();
    }

    fn bounce_walls(&mut self) {
        if self.ball.y < 0.0 {
            self.ball.y = 0.0;
            self.ball.vy = -self.ball.vy;
        } else if self.ball.y + self.ball.size > GAME_HEIGHT {
            self.ball.y = GAME_HEIGHT - self.ball.size;
            self.ball.vy = -self.ball.vy;
        }
    }

    /// Overlap at the new position, or a crossing of the paddle face during
    /// this tick, counts as a hit. Fast balls would otherwise tunnel.
    fn collide_paddles(&mut self, prev_x: f32) {
        if self.ball.vx < 0.0
            && (self.player.overlaps(&self.ball)
                || crossed_face(&self.ball, prev_x, &self.player, Side::Player))
        {
            deflect(&mut self.ball, &self.player, Side::Player);
            debug!(vx = self.ball.vx, vy = self.ball.vy, "arcade: player return");
        } else if self.ball.vx > 0.0
            && (self.opponent.overlaps(&self.ball)
                || crossed_face(&self.ball, prev_x, &self.opponent, Side::Opponent))
        {
            deflect(&mut self.ball, &self.opponent, Side::Opponent);
            self.serving = false;
            debug!(vx = self.ball.vx, vy = self.ball.vy, "arcade: opponent return");
        }
    }

    fn check_score(&mut self) {
        let scorer = if self.ball.x > GAME_WIDTH {
            Side::Player
        } else if self.ball.x + self.ball.size < 0.0 {
            Side::Opponent
        } else {
            return;
        };
        self.score.award(scorer);
        info!(
            ?scorer,
            player = self.score.player,
            opponent = self.score.opponent,
            "arcade: point"
        );
        self.reset_ball();

        if let Some(winner) = self.score.winner() {
            self.winner = Some(winner);
            self.mode = ArcadeMode::GameOver;
            self.clock.stop();
            info!(?winner, "arcade: game over");
        }
    }

    /// Re-centres the ball with a random direction on both axes and hands
    /// the opponent a guaranteed return.
    pub(crate) fn reset_ball(&mut self) {
        let mut ball = Ball::centered();
        ball.vx = if self.rng.gen_bool(0.5) {
            SERVE_VX
        } else {
            -SERVE_VX
        };
        ball.vy = if self.rng.gen_bool(0.5) {
            SERVE_VY
        } else {
            -SERVE_VY
        };
        self.ball = ball;
        self.serving = true;
    }

    pub(crate) fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.clock.stop();
        self.release_all();
        self.disposed = true;
    }
}

impl<R: Rng> Drop for Arcade<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}
