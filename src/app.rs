use crate::arcade::{Arcade, Direction};
use crate::care::{CareGame, CommitOutcome};
use crate::config::{Paths, Settings};
use crate::input::{collect_input_nonblocking, map_event_to_command, Command};
use crate::model::{ArcadeMode, Subject};
use crate::project::{project_arcade, project_care};
use crate::render::{draw_arcade, draw_care, draw_center_box, draw_roster, Terminal, HELP_TEXT};
use crate::storage::{starter_subjects, JsonStore, MemoryStore, SubjectStore};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How long a pressed arrow counts as held when the terminal cannot report
/// key releases.
const HOLD_PULSE: Duration = Duration::from_millis(120);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scene {
    Roster,
    Care,
    Arcade,
    Help,
}

#[derive(Default)]
struct HeldKeys {
    up_until: Option<Instant>,
    down_until: Option<Instant>,
}

impl HeldKeys {
    fn slot(&mut self, dir: Direction) -> &mut Option<Instant> {
        match dir {
            Direction::Up => &mut self.up_until,
            Direction::Down => &mut self.down_until,
        }
    }

    /// Directions whose pulse ran out at `now`.
    fn expire(&mut self, now: Instant) -> Vec<Direction> {
        let mut out = Vec::new();
        for dir in [Direction::Up, Direction::Down] {
            let slot = self.slot(dir);
            if slot.is_some_and(|until| now >= until) {
                *slot = None;
                out.push(dir);
            }
        }
        out
    }
}

pub(crate) struct App {
    settings: Settings,
    store: Box<dyn SubjectStore>,
    pets: Vec<Subject>,
    cursor: usize,
    note: String,
    scene: Scene,
    help_return: Scene,
    care: CareGame,
    arcade: Arcade,
    held: HeldKeys,
    term: Terminal,
    should_quit: bool,
    ui_rev: u64,
    drawn: Option<(Scene, u64, u64, u64)>,
}

impl App {
    fn init(settings: Settings, paths: &Paths) -> anyhow::Result<Self> {
        let mut note = String::new();
        let store: Box<dyn SubjectStore> =
            match JsonStore::open(&paths.roster_path, &settings.owner_id) {
                Ok(s) => Box::new(s),
                Err(e) => {
                    warn!(
                        path = %paths.roster_path.display(),
                        error = %e,
                        "roster unreadable, playing without saving"
                    );
                    note = format!("Roster unreadable ({e}). Progress will not be saved.");
                    Box::new(MemoryStore::with(&settings.owner_id, starter_subjects()))
                }
            };
        let pets = store.load_subjects(&settings.owner_id)?;
        info!(owner_id = %settings.owner_id, pets = pets.len(), "roster loaded");

        let care = CareGame::new(settings.care_period(), settings.pulse_delay());
        let arcade = Arcade::new(settings.arcade_period(), StdRng::seed_from_u64(settings.seed));

        let term = Terminal::begin()?;

        Ok(Self {
            settings,
            store,
            pets,
            cursor: 0,
            note,
            scene: Scene::Roster,
            help_return: Scene::Roster,
            care,
            arcade,
            held: HeldKeys::default(),
            term,
            should_quit: false,
            ui_rev: 0,
            drawn: None,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);

        let mut last_frame = Instant::now();

        while !self.should_quit {
            if self.term.resize_if_needed()? {
                self.drawn = None;
            }

            // input
            let events = collect_input_nonblocking(frame_dt)?;
            for ev in events {
                if let Some(cmd) = map_event_to_command(self.scene, &ev) {
                    self.handle(cmd, Instant::now());
                    if self.should_quit {
                        break;
                    }
                }
            }

            let now = Instant::now();
            for dir in self.held.expire(now) {
                self.arcade.key_up(dir);
            }

            // clocks
            let real_dt = now.saturating_duration_since(last_frame);
            last_frame = now;
            self.care.advance(real_dt);
            self.arcade.advance(real_dt);

            self.render_if_changed()?;

            spin_sleep(frame_dt, Instant::now());
        }
        Ok(())
    }

    fn handle(&mut self, cmd: Command, now: Instant) {
        self.ui_rev += 1;
        match cmd {
            Command::Quit => self.should_quit = true,
            Command::HelpToggle => {
                if self.scene == Scene::Help {
                    self.scene = self.help_return;
                } else {
                    if self.scene == Scene::Arcade {
                        self.release_paddle();
                    }
                    self.help_return = self.scene;
                    self.scene = Scene::Help;
                }
            }
            Command::Back => match self.scene {
                Scene::Help => self.scene = self.help_return,
                Scene::Care => {
                    self.care.deselect();
                    self.back_to_roster();
                }
                Scene::Arcade => {
                    self.release_paddle();
                    self.arcade.unbind();
                    self.back_to_roster();
                }
                Scene::Roster => {}
            },
            Command::RosterMove(delta) => {
                let len = self.pets.len() as i32;
                if len > 0 {
                    self.cursor = (self.cursor as i32 + delta).rem_euclid(len) as usize;
                }
            }
            Command::OpenCare => {
                if let Some(pet) = self.pets.get(self.cursor).cloned() {
                    self.care.select(pet);
                    self.scene = Scene::Care;
                }
            }
            Command::OpenArcade => {
                if let Some(pet) = self.pets.get(self.cursor).cloned() {
                    self.arcade.bind(pet);
                    self.scene = Scene::Arcade;
                }
            }
            Command::Care(action) => {
                self.care.act(action);
            }
            Command::Commit => {
                if self.care.commit(self.store.as_mut()) == CommitOutcome::Saved {
                    if let Some(fresh) = self.care.subject().cloned() {
                        if let Some(p) = self.pets.iter_mut().find(|p| p.id == fresh.id) {
                            *p = fresh;
                        }
                    }
                }
            }
            Command::Cancel => self.care.cancel(),
            Command::Hold(dir) => {
                self.arcade.key_down(dir);
                if !self.term.key_release {
                    *self.held.slot(dir) = Some(now + HOLD_PULSE);
                }
            }
            Command::Release(dir) => {
                self.arcade.key_up(dir);
                *self.held.slot(dir) = None;
            }
            Command::Serve => match self.arcade.mode() {
                ArcadeMode::Idle => {
                    self.arcade.start();
                }
                ArcadeMode::GameOver => {
                    self.arcade.restart();
                }
                ArcadeMode::Running => {}
            },
        }
    }

    /// Lets go of both paddle keys; releases that arrive in another scene
    /// would otherwise never reach the arcade.
    fn release_paddle(&mut self) {
        self.arcade.release_all();
        self.held = HeldKeys::default();
    }

    fn back_to_roster(&mut self) {
        self.scene = Scene::Roster;
        match self.store.load_subjects(&self.settings.owner_id) {
            Ok(pets) => {
                self.pets = pets;
                self.cursor = self.cursor.min(self.pets.len().saturating_sub(1));
            }
            Err(e) => {
                warn!(error = %e, "could not reload roster");
                self.note = format!("Could not reload pets: {e}");
            }
        }
    }

    fn render_if_changed(&mut self) -> anyhow::Result<()> {
        let key = (
            self.scene,
            self.care.revision(),
            self.arcade.revision(),
            self.ui_rev,
        );
        if self.drawn == Some(key) {
            return Ok(());
        }

        let buf = &mut self.term.cur;
        buf.clear(crossterm::style::Color::Black);
        let color = self.settings.enable_color;

        let base = if self.scene == Scene::Help {
            self.help_return
        } else {
            self.scene
        };
        match base {
            Scene::Roster | Scene::Help => draw_roster(buf, &self.pets, self.cursor, &self.note),
            Scene::Care => draw_care(buf, &project_care(&self.care), color),
            Scene::Arcade => draw_arcade(buf, &project_arcade(&self.arcade), color),
        }
        if self.scene == Scene::Help {
            draw_center_box(buf, "How to play", HELP_TEXT);
        }

        self.term.present(true)?;
        self.drawn = Some(key);
        Ok(())
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        self.care.dispose();
        self.arcade.dispose();
        self.term.end()
    }
}

pub(crate) fn run(settings: Settings, paths: &Paths) -> anyhow::Result<()> {
    let mut app = App::init(settings, paths)?;
    let res = app.run();
    app.shutdown()?;
    res
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
