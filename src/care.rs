//! The idle care game: three bounded stats, a slow decay clock, three
//! actions and a milestone that locks play until the owner either claims an
//! advantage for the pet or lets it go.

use crate::clock::{Clock, Deferred, Scheduler};
use crate::model::{CareMode, StatTriple, Subject, MILESTONE_TOTAL};
use crate::storage::SubjectStore;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Action {
    Feed,
    Play,
    Rest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Rejection {
    TooSleepy,
    TooHungry,
}

impl Action {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Action::Feed => "Feed",
            Action::Play => "Play",
            Action::Rest => "Rest",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Action::Feed => "eat",
            Action::Play => "play",
            Action::Rest => "rest",
        }
    }

    /// Pure rule: the stats after this action, or why it cannot happen.
    pub(crate) fn apply(self, s: &StatTriple) -> Result<StatTriple, Rejection> {
        match self {
            Action::Feed => {
                if s.alertness <= 2 {
                    return Err(Rejection::TooSleepy);
                }
                Ok(s.shifted(3, 1, -1))
            }
            Action::Play => {
                if s.alertness <= 2 {
                    return Err(Rejection::TooSleepy);
                }
                if s.satiety <= 2 {
                    return Err(Rejection::TooHungry);
                }
                Ok(s.shifted(-2, 3, -2))
            }
            Action::Rest => Ok(s.shifted(-2, -1, 5)),
        }
    }
}

impl Rejection {
    pub(crate) fn message(self, action: Action, name: &str) -> String {
        match self {
            Rejection::TooSleepy => format!("{name} is too sleepy to {}.", action.verb()),
            Rejection::TooHungry => format!("{name} is too hungry to {}.", action.verb()),
        }
    }
}

/// Mood line for the current stats. Hunger outranks sleepiness, which
/// outranks happiness.
pub(crate) fn status_for(s: &StatTriple, name: &str) -> String {
    if s.satiety <= 2 {
        format!("{name} is starving!")
    } else if s.satiety < 5 {
        format!("{name} is a bit hungry.")
    } else if s.alertness <= 2 {
        format!("{name} can barely keep their eyes open.")
    } else if s.alertness < 5 {
        format!("{name} is a bit sleepy.")
    } else if s.happiness <= 2 {
        format!("{name} is miserable.")
    } else if s.happiness < 5 {
        format!("{name} is a bit bored.")
    } else {
        format!("{name} is doing great.")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ActOutcome {
    Ignored,
    Rejected(Rejection),
    Applied,
    Milestone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CommitOutcome {
    Ignored,
    Saved,
    Failed,
}

pub(crate) struct CareGame {
    subject: Option<Subject>,
    stats: StatTriple,
    mode: CareMode,
    status: String,
    pulses: BTreeMap<Action, u32>,
    pending: Deferred<Action>,
    clock: Clock,
    pulse_delay: Duration,
    disposed: bool,
    revision: u64,
}

impl CareGame {
    pub(crate) fn new(period: Duration, pulse_delay: Duration) -> Self {
        Self {
            subject: None,
            stats: StatTriple::default(),
            mode: CareMode::Unselected,
            status: "Pick a pet to care for.".to_string(),
            pulses: BTreeMap::new(),
            pending: Deferred::default(),
            clock: Clock::new(period),
            pulse_delay,
            disposed: false,
            revision: 0,
        }
    }

    pub(crate) fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    pub(crate) fn stats(&self) -> StatTriple {
        self.stats
    }

    pub(crate) fn mode(&self) -> CareMode {
        self.mode
    }

    pub(crate) fn status(&self) -> &str {
        &self.status
    }

    #[cfg(test)]
    pub(crate) fn clock(&self) -> &Clock {
        &self.clock
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn pulses(&self) -> impl Iterator<Item = Action> + '_ {
        self.pulses.keys().copied()
    }

    fn notify_changed(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn name(&self) -> &str {
        self.subject.as_ref().map(|s| s.name.as_str()).unwrap_or("")
    }

    fn refresh_status(&mut self) {
        self.status = status_for(&self.stats, self.name());
    }

    pub(crate) fn select(&mut self, subject: Subject) {
        if self.disposed {
            return;
        }
        info!(
            subject_id = subject.id,
            name = %subject.name,
            decay_every_ms = self.clock.period().as_millis() as u64,
            "care game: subject selected"
        );
        self.subject = Some(subject);
        self.stats = StatTriple::NEUTRAL;
        self.mode = CareMode::Active;
        self.clear_pulses();
        self.refresh_status();
        self.clock.stop();
        self.clock.start();
        self.notify_changed();
    }

    pub(crate) fn deselect(&mut self) {
        if self.disposed {
            return;
        }
        self.subject = None;
        self.stats = StatTriple::default();
        self.mode = CareMode::Unselected;
        self.clear_pulses();
        self.clock.stop();
        self.status = "Pick a pet to care for.".to_string();
        self.notify_changed();
    }

    /// Feeds host time in: drains due decay ticks, then due pulse expiries.
    pub(crate) fn advance(&mut self, dt: Duration) {
        if self.disposed {
            return;
        }
        self.clock.advance(dt);
        while self.clock.take_tick() {
            self.tick();
        }
        for action in self.pending.advance(dt) {
            self.expire_pulse(action);
        }
    }

    pub(crate) fn tick(&mut self) {
        if self.disposed || self.mode != CareMode::Active {
            return;
        }
        self.apply_decay();
    }

    pub(crate) fn apply_decay(&mut self) {
        if self.mode != CareMode::Active {
            return;
        }
        self.stats = self.stats.shifted(-1, -1, -1);
        self.refresh_status();
        self.notify_changed();
    }

    pub(crate) fn act(&mut self, action: Action) -> ActOutcome {
        if self.disposed || self.mode != CareMode::Active {
            return ActOutcome::Ignored;
        }
        match action.apply(&self.stats) {
            Err(rejection) => {
                self.status = rejection.message(action, self.name());
                debug!(?action, ?rejection, "care action rejected");
                self.notify_changed();
                ActOutcome::Rejected(rejection)
            }
            Ok(next) => {
                self.stats = next;
                self.refresh_status();
                *self.pulses.entry(action).or_insert(0) += 1;
                self.pending.schedule(self.pulse_delay, action);
                debug!(?action, total = next.total(), "care action applied");

                let outcome = if self.check_milestone() {
                    ActOutcome::Milestone
                } else {
                    ActOutcome::Applied
                };
                self.notify_changed();
                outcome
            }
        }
    }

    fn check_milestone(&mut self) -> bool {
        if self.mode == CareMode::Locked || self.stats.total() <= MILESTONE_TOTAL {
            return false;
        }
        self.mode = CareMode::Locked;
        self.clock.stop();
        self.status = format!(
            "{} is thriving! Claim an advantage or keep playing.",
            self.name()
        );
        info!(total = self.stats.total(), "care game: milestone reached");
        true
    }

    /// Asks the store to bump the subject's advantage. On any failure the
    /// game still unlocks so the owner is never stuck; the stats are kept,
    /// so the next successful action re-locks and offers the claim again.
    pub(crate) fn commit(&mut self, store: &mut dyn SubjectStore) -> CommitOutcome {
        if self.disposed || self.mode != CareMode::Locked {
            return CommitOutcome::Ignored;
        }
        let Some(id) = self.subject.as_ref().map(|s| s.id) else {
            return CommitOutcome::Ignored;
        };

        let outcome = match store.increment_advantage(id) {
            Ok(Some(refreshed)) => {
                info!(
                    subject_id = id,
                    advantage = refreshed.advantage,
                    "care game: advantage claimed"
                );
                self.status = format!(
                    "{} gained an advantage (now {})!",
                    refreshed.name, refreshed.advantage
                );
                self.subject = Some(refreshed);
                self.stats = StatTriple::NEUTRAL;
                CommitOutcome::Saved
            }
            Ok(None) => {
                warn!(subject_id = id, "care game: store no longer knows this subject");
                self.status = format!("Could not save {}'s advantage.", self.name());
                CommitOutcome::Failed
            }
            Err(e) => {
                warn!(subject_id = id, error = %e, "care game: advantage save failed");
                self.status = format!("Could not save {}'s advantage.", self.name());
                CommitOutcome::Failed
            }
        };
        self.resume();
        outcome
    }

    pub(crate) fn cancel(&mut self) {
        if self.disposed || self.mode != CareMode::Locked {
            return;
        }
        self.stats = StatTriple::NEUTRAL;
        self.refresh_status();
        self.resume();
    }

    fn resume(&mut self) {
        self.mode = CareMode::Active;
        self.clock.start();
        self.notify_changed();
    }

    fn expire_pulse(&mut self, action: Action) {
        if self.disposed {
            return;
        }
        if let Some(n) = self.pulses.get_mut(&action) {
            *n -= 1;
            if *n == 0 {
                self.pulses.remove(&action);
            }
            self.notify_changed();
        }
    }

    fn clear_pulses(&mut self) {
        self.pulses.clear();
        self.pending.cancel_all();
    }

    pub(crate) fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.clock.stop();
        self.clear_pulses();
        self.disposed = true;
    }
}

impl Drop for CareGame {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn rex() -> Subject {
        Subject {
            id: 1,
            name: "Rex".to_string(),
            advantage: 0,
        }
    }

    fn game() -> CareGame {
        let mut g = CareGame::new(Duration::from_secs(5), Duration::from_millis(1200));
        g.select(rex());
        g
    }

    fn with_stats(stats: StatTriple) -> CareGame {
        let mut g = game();
        g.stats = stats;
        g
    }

    fn locked_game() -> CareGame {
        let mut g = with_stats(StatTriple::new(10, 10, 10));
        assert_eq!(g.act(Action::Feed), ActOutcome::Milestone);
        g
    }

    #[test]
    fn decay_never_goes_below_zero() {
        for v in 0..=10 {
            let mut g = with_stats(StatTriple::new(v, v / 2, 10 - v));
            for _ in 0..12 {
                g.apply_decay();
            }
            assert_eq!(g.stats(), StatTriple::new(0, 0, 0));
        }
    }

    #[test]
    fn decay_is_inert_unless_active() {
        let mut g = CareGame::new(Duration::from_secs(5), Duration::from_secs(1));
        g.apply_decay();
        assert_eq!(g.stats(), StatTriple::default());

        let mut g = locked_game();
        let before = g.stats();
        g.apply_decay();
        g.advance(Duration::from_secs(60));
        assert_eq!(g.stats(), before);
    }

    #[test]
    fn clock_drives_decay_every_period() {
        let mut g = game();
        g.advance(Duration::from_millis(4_999));
        assert_eq!(g.stats(), StatTriple::NEUTRAL);
        g.advance(Duration::from_millis(1));
        assert_eq!(g.stats(), StatTriple::new(4, 4, 4));
    }

    #[test]
    fn feed_when_sleepy_changes_nothing() {
        let start = StatTriple::new(4, 6, 2);
        let mut g = with_stats(start);
        assert_eq!(
            g.act(Action::Feed),
            ActOutcome::Rejected(Rejection::TooSleepy)
        );
        assert_eq!(g.stats(), start);
        assert_eq!(g.status(), "Rex is too sleepy to eat.");
    }

    #[test]
    fn play_when_hungry_reports_hunger_not_sleep() {
        let start = StatTriple::new(2, 5, 6);
        let mut g = with_stats(start);
        assert_eq!(
            g.act(Action::Play),
            ActOutcome::Rejected(Rejection::TooHungry)
        );
        assert_eq!(g.stats(), start);
        assert_eq!(g.status(), "Rex is too hungry to play.");
    }

    #[test]
    fn play_checks_sleepiness_first() {
        assert_eq!(
            Action::Play.apply(&StatTriple::new(1, 5, 1)),
            Err(Rejection::TooSleepy)
        );
    }

    #[test]
    fn rest_always_applies_and_clamps() {
        assert_eq!(
            Action::Rest.apply(&StatTriple::new(1, 0, 8)),
            Ok(StatTriple::new(0, 0, 10))
        );
    }

    #[test]
    fn plays_lock_exactly_once_at_first_crossing() {
        let mut g = with_stats(StatTriple::new(10, 10, 10));
        let outcomes: Vec<_> = (0..3).map(|_| g.act(Action::Play)).collect();
        assert_eq!(
            outcomes,
            vec![ActOutcome::Milestone, ActOutcome::Ignored, ActOutcome::Ignored]
        );
        assert_eq!(g.stats(), StatTriple::new(8, 10, 8));
        assert_eq!(g.mode(), CareMode::Locked);
        assert!(!g.clock().is_running());
    }

    #[test]
    fn total_of_exactly_the_threshold_does_not_lock() {
        let mut g = with_stats(StatTriple::new(10, 6, 10));
        assert_eq!(g.act(Action::Play), ActOutcome::Applied);
        assert_eq!(g.stats(), StatTriple::new(8, 9, 8));
        assert_eq!(g.stats().total(), MILESTONE_TOTAL);
        assert_eq!(g.mode(), CareMode::Active);
    }

    #[test]
    fn neutral_start_locks_on_first_action_past_threshold() {
        let mut g = game();
        let plan = [
            (Action::Feed, 18),
            (Action::Feed, 20),
            (Action::Rest, 22),
            (Action::Feed, 24),
            (Action::Rest, 24),
        ];
        for (action, total) in plan {
            assert_eq!(g.act(action), ActOutcome::Applied);
            assert_eq!(g.stats().total(), total);
            assert_eq!(g.mode(), CareMode::Active);
        }
        assert_eq!(g.act(Action::Feed), ActOutcome::Milestone);
        assert_eq!(g.stats(), StatTriple::new(10, 7, 9));
        assert_eq!(g.mode(), CareMode::Locked);
    }

    #[test]
    fn commit_success_resets_and_resumes() {
        let mut store = MemoryStore::with("me", vec![rex()]);
        let mut g = locked_game();

        assert_eq!(g.commit(&mut store), CommitOutcome::Saved);
        assert_eq!(g.stats(), StatTriple::NEUTRAL);
        assert_eq!(g.mode(), CareMode::Active);
        assert!(g.clock().is_running());
        assert_eq!(g.subject().unwrap().advantage, 1);
        assert_eq!(store.increments, 1);
    }

    #[test]
    fn cancel_resets_without_touching_the_store() {
        let store = MemoryStore::with("me", vec![rex()]);
        let mut g = locked_game();
        g.cancel();
        assert_eq!(g.stats(), StatTriple::NEUTRAL);
        assert_eq!(g.mode(), CareMode::Active);
        assert!(g.clock().is_running());
        assert_eq!(store.increments, 0);
        assert_eq!(g.subject().unwrap().advantage, 0);
    }

    #[test]
    fn failed_commit_unlocks_without_increment() {
        let mut store = MemoryStore::with("me", vec![rex()]);
        store.fail = true;
        let mut g = locked_game();
        let locked_stats = g.stats();

        assert_eq!(g.commit(&mut store), CommitOutcome::Failed);
        assert_eq!(g.mode(), CareMode::Active);
        assert!(g.clock().is_running());
        assert_eq!(g.stats(), locked_stats);
        assert_eq!(g.subject().unwrap().advantage, 0);
        assert_eq!(g.status(), "Could not save Rex's advantage.");
    }

    #[test]
    fn commit_with_unknown_subject_fails_softly() {
        let mut store = MemoryStore::default();
        let mut g = locked_game();
        assert_eq!(g.commit(&mut store), CommitOutcome::Failed);
        assert_eq!(g.mode(), CareMode::Active);
    }

    #[test]
    fn commit_and_cancel_are_ignored_unless_locked() {
        let mut store = MemoryStore::with("me", vec![rex()]);
        let mut g = game();
        assert_eq!(g.commit(&mut store), CommitOutcome::Ignored);
        g.cancel();
        assert_eq!(store.increments, 0);
        assert_eq!(g.mode(), CareMode::Active);
    }

    #[test]
    fn unselected_game_is_inert() {
        let mut g = CareGame::new(Duration::from_secs(5), Duration::from_secs(1));
        assert_eq!(g.act(Action::Rest), ActOutcome::Ignored);
        g.advance(Duration::from_secs(60));
        assert_eq!(g.mode(), CareMode::Unselected);
        assert_eq!(g.revision(), 0);
    }

    #[test]
    fn deselect_clears_everything() {
        let mut g = game();
        g.act(Action::Feed);
        g.deselect();
        assert_eq!(g.mode(), CareMode::Unselected);
        assert_eq!(g.stats(), StatTriple::default());
        assert!(g.subject().is_none());
        assert!(!g.clock().is_running());
        assert_eq!(g.pulses().count(), 0);
    }

    #[test]
    fn pulse_clears_after_delay() {
        let mut g = game();
        g.act(Action::Feed);
        assert_eq!(g.pulses().collect::<Vec<_>>(), vec![Action::Feed]);
        g.advance(Duration::from_millis(1_199));
        assert_eq!(g.pulses().count(), 1);
        g.advance(Duration::from_millis(1));
        assert_eq!(g.pulses().count(), 0);
    }

    #[test]
    fn overlapping_pulses_clear_with_the_last_one() {
        let mut g = game();
        g.act(Action::Rest);
        g.advance(Duration::from_millis(600));
        g.act(Action::Rest);
        g.advance(Duration::from_millis(600));
        assert_eq!(g.pulses().count(), 1);
        g.advance(Duration::from_millis(600));
        assert_eq!(g.pulses().count(), 0);
    }

    #[test]
    fn disposed_game_discards_everything() {
        let mut g = game();
        g.act(Action::Feed);
        let rev = g.revision();
        let stats = g.stats();
        g.dispose();
        assert!(!g.clock().is_running());
        g.advance(Duration::from_secs(30));
        assert_eq!(g.act(Action::Rest), ActOutcome::Ignored);
        assert_eq!(g.stats(), stats);
        assert_eq!(g.revision(), rev);
    }

    #[test]
    fn feed_then_decay_moves_status_from_sleepy_to_hungry() {
        let mut g = game();
        assert_eq!(g.act(Action::Feed), ActOutcome::Applied);
        assert_eq!(g.stats(), StatTriple::new(8, 6, 4));
        assert_eq!(g.status(), "Rex is a bit sleepy.");

        let period = g.clock().period();
        for _ in 0..3 {
            g.advance(period);
            assert_ne!(g.status(), "Rex is a bit hungry.");
        }
        assert_eq!(g.stats(), StatTriple::new(5, 3, 1));
        g.advance(period);
        assert_eq!(g.stats(), StatTriple::new(4, 2, 0));
        assert_eq!(g.status(), "Rex is a bit hungry.");
    }

    #[test]
    fn status_tiers_follow_precedence() {
        assert_eq!(status_for(&StatTriple::new(2, 0, 0), "A"), "A is starving!");
        assert_eq!(status_for(&StatTriple::new(4, 0, 0), "A"), "A is a bit hungry.");
        assert_eq!(
            status_for(&StatTriple::new(5, 0, 2), "A"),
            "A can barely keep their eyes open."
        );
        assert_eq!(status_for(&StatTriple::new(5, 0, 4), "A"), "A is a bit sleepy.");
        assert_eq!(status_for(&StatTriple::new(5, 2, 5), "A"), "A is miserable.");
        assert_eq!(status_for(&StatTriple::new(5, 4, 5), "A"), "A is a bit bored.");
        assert_eq!(status_for(&StatTriple::NEUTRAL, "A"), "A is doing great.");
    }
}
