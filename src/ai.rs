use crate::model::{Ball, Paddle, GAME_WIDTH};
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum AiMove {
    /// Serve tracking: centre snapped onto the ball.
    Snap,
    /// Moved by the given signed amount toward the noisy target.
    Step(f32),
    /// Reacting, but chose (or rolled) not to move.
    Hold,
    /// Ball is not coming this way.
    Idle,
}

/// Opponent paddle policy. Perfect tracking while a serve is in flight so
/// the serve always comes back, then a sloppy tracker that only wakes up
/// when the ball is in its half and heading its way.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OpponentAi {
    pub(crate) step: f32,
    pub(crate) dead_zone: f32,
    pub(crate) noise: f32,
    pub(crate) reaction: f64,
}

impl Default for OpponentAi {
    fn default() -> Self {
        Self {
            step: 6.0,
            dead_zone: 8.0,
            noise: 30.0,
            reaction: 0.8,
        }
    }
}

impl OpponentAi {
    pub(crate) fn steer<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        paddle: &mut Paddle,
        ball: &Ball,
        serving: bool,
    ) -> AiMove {
        if serving {
            paddle.center_on(ball.center_y());
            return AiMove::Snap;
        }
        if ball.vx <= 0.0 || ball.center_x() <= GAME_WIDTH / 2.0 {
            return AiMove::Idle;
        }

        let target = ball.center_y() + rng.gen_range(-self.noise..self.noise);
        let reacts = rng.gen_bool(self.reaction);
        let mv = self.decide(paddle.center_y(), target, reacts);
        if let AiMove::Step(dy) = mv {
            paddle.y += dy;
            paddle.clamp_to_field();
        }
        mv
    }

    pub(crate) fn decide(&self, paddle_center: f32, target: f32, reacts: bool) -> AiMove {
        if !reacts {
            return AiMove::Hold;
        }
        let gap = target - paddle_center;
        if gap.abs() <= self.dead_zone {
            AiMove::Hold
        } else {
            AiMove::Step(self.step.copysign(gap))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GAME_HEIGHT;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ball_at(cx: f32, cy: f32, vx: f32) -> Ball {
        let mut b = Ball::centered();
        b.x = cx - b.size / 2.0;
        b.y = cy - b.size / 2.0;
        b.vx = vx;
        b.vy = 2.0;
        b
    }

    fn always() -> StepRng {
        StepRng::new(0, 0)
    }

    fn never() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn serve_snaps_to_ball_center() {
        let ai = OpponentAi::default();
        let mut rng = StdRng::seed_from_u64(3);
        for (vx, cy) in [(5.0, 120.0), (-5.0, 260.0), (0.0, 200.0)] {
            let mut p = Paddle::opponent();
            let b = ball_at(GAME_WIDTH / 2.0, cy, vx);
            assert_eq!(ai.steer(&mut rng, &mut p, &b, true), AiMove::Snap);
            assert_eq!(p.center_y(), b.center_y());
        }
    }

    #[test]
    fn ignores_ball_moving_away() {
        let ai = OpponentAi::default();
        let mut p = Paddle::opponent();
        let before = p;
        let b = ball_at(GAME_WIDTH * 0.8, 30.0, -4.0);
        assert_eq!(ai.steer(&mut always(), &mut p, &b, false), AiMove::Idle);
        assert_eq!(p, before);
    }

    #[test]
    fn ignores_ball_in_far_half() {
        let ai = OpponentAi::default();
        let mut p = Paddle::opponent();
        let b = ball_at(GAME_WIDTH * 0.3, 30.0, 6.0);
        assert_eq!(ai.steer(&mut always(), &mut p, &b, false), AiMove::Idle);
    }

    #[test]
    fn moves_one_step_toward_target_when_it_reacts() {
        let ai = OpponentAi::default();
        let mut p = Paddle::opponent();
        p.center_on(100.0);
        let b = ball_at(GAME_WIDTH * 0.8, 320.0, 6.0);
        assert_eq!(ai.steer(&mut always(), &mut p, &b, false), AiMove::Step(6.0));
        assert_eq!(p.center_y(), 106.0);

        p.center_on(350.0);
        let b = ball_at(GAME_WIDTH * 0.8, 40.0, 6.0);
        assert_eq!(ai.steer(&mut always(), &mut p, &b, false), AiMove::Step(-6.0));
        assert_eq!(p.center_y(), 344.0);
    }

    #[test]
    fn holds_when_the_reaction_roll_fails() {
        let ai = OpponentAi::default();
        let mut p = Paddle::opponent();
        p.center_on(100.0);
        let before = p;
        let b = ball_at(GAME_WIDTH * 0.8, 320.0, 6.0);
        assert_eq!(ai.steer(&mut never(), &mut p, &b, false), AiMove::Hold);
        assert_eq!(p, before);
    }

    #[test]
    fn dead_zone_suppresses_jitter() {
        let ai = OpponentAi::default();
        assert_eq!(ai.decide(100.0, 108.0, true), AiMove::Hold);
        assert_eq!(ai.decide(100.0, 92.0, true), AiMove::Hold);
        assert_eq!(ai.decide(100.0, 109.0, true), AiMove::Step(6.0));
        assert_eq!(ai.decide(100.0, 300.0, false), AiMove::Hold);
    }

    #[test]
    fn tracking_stays_inside_the_field() {
        let ai = OpponentAi::default();
        let mut p = Paddle::opponent();
        p.y = GAME_HEIGHT - p.height - 1.0;
        let b = ball_at(GAME_WIDTH * 0.8, GAME_HEIGHT + 200.0, 6.0);
        ai.steer(&mut always(), &mut p, &b, false);
        assert_eq!(p.y, GAME_HEIGHT - p.height);
    }

    #[test]
    fn seeded_reaction_rate_is_roughly_eighty_percent() {
        let ai = OpponentAi::default();
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        let b = ball_at(GAME_WIDTH * 0.8, 390.0, 6.0);
        let mut moved = 0;
        for _ in 0..1_000 {
            let mut p = Paddle::opponent();
            p.center_on(60.0);
            if matches!(ai.steer(&mut rng, &mut p, &b, false), AiMove::Step(_)) {
                moved += 1;
            }
        }
        assert!((700..=900).contains(&moved), "moved {moved} times");
    }
}
