use crate::app::Scene;
use crate::arcade::Direction;
use crate::care::Action;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
    pub(crate) kind: KeyEventKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Quit,
    HelpToggle,
    Back,
    RosterMove(i32),
    OpenCare,
    OpenArcade,
    Care(Action),
    Commit,
    Cancel,
    Hold(Direction),
    Release(Direction),
    Serve,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            out.push(InputEvent {
                key: k.code,
                mods: k.modifiers,
                kind: k.kind,
            });
            if out.len() >= 32 {
                break;
            }
        }
    }
    Ok(out)
}

fn direction(key: KeyCode) -> Option<Direction> {
    match key {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Direction::Down),
        _ => None,
    }
}

pub(crate) fn map_event_to_command(scene: Scene, ev: &InputEvent) -> Option<Command> {
    // Only the arcade paddle cares about releases, including ones that land
    // while help is open over it.
    if ev.kind == KeyEventKind::Release {
        return match scene {
            Scene::Arcade | Scene::Help => direction(ev.key).map(Command::Release),
            _ => None,
        };
    }

    // Global
    if matches!(ev.key, KeyCode::Char('c')) && ev.mods.contains(KeyModifiers::CONTROL) {
        return Some(Command::Quit);
    }
    match ev.key {
        KeyCode::Char('q') | KeyCode::Char('Q') => return Some(Command::Quit),
        KeyCode::Char('h') | KeyCode::Char('H') => return Some(Command::HelpToggle),
        KeyCode::Esc => return Some(Command::Back),
        _ => {}
    }

    match scene {
        Scene::Roster => match ev.key {
            KeyCode::Up => Some(Command::RosterMove(-1)),
            KeyCode::Down => Some(Command::RosterMove(1)),
            KeyCode::Enter => Some(Command::OpenCare),
            KeyCode::Char('a') | KeyCode::Char('A') => Some(Command::OpenArcade),
            _ => None,
        },
        Scene::Care => match ev.key {
            KeyCode::Char('f') | KeyCode::Char('F') => Some(Command::Care(Action::Feed)),
            KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::Care(Action::Play)),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Care(Action::Rest)),
            KeyCode::Enter => Some(Command::Commit),
            KeyCode::Backspace => Some(Command::Cancel),
            _ => None,
        },
        Scene::Arcade => match ev.key {
            KeyCode::Char(' ') | KeyCode::Enter => Some(Command::Serve),
            key => direction(key).map(Command::Hold),
        },
        Scene::Help => None,
    }
}
