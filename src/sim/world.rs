/// World: the top-level state machine.
///
/// ```text
///   Selecting ──confirm──▶ Playing ──time up / quit──▶ Selecting
/// ```
///
/// Exactly one mode is active. Selection input is routed only to the
/// selection screen and frame input only to the running session, so the
/// same key never drives both.
///
/// A finished session returns to the selection screen with the same avatar
/// highlighted but not committed; play resumes only after a new confirm.

use crate::config::SessionTuning;
use crate::domain::entity::FrameInput;
use crate::domain::selection::{Direction, SelectionController};
use super::event::GameEvent;
use super::session::{GameSession, SessionSummary};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SelectInput {
    Previous,
    Next,
    Confirm,
}

pub enum Mode {
    Selecting(SelectionController),
    Playing {
        selection: SelectionController,
        session: GameSession,
    },
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Selecting(SelectionController::new())
    }
}

pub struct WorldState {
    pub mode: Mode,
    pub tuning: SessionTuning,
    pub paused: bool,
    /// Result of the most recent session, shown on the selection screen.
    pub last_result: Option<SessionSummary>,
    pub best_score: u32,
    pub sessions_played: u64,
    /// Status line text, cleared when `message_timer` runs out.
    pub message: String,
    pub message_timer: u32,
    base_seed: u64,
}

/// Ticks a status message stays up (about two seconds at 60 Hz).
const MESSAGE_TICKS: u32 = 120;

impl WorldState {
    pub fn new(tuning: SessionTuning, base_seed: u64) -> Self {
        WorldState {
            mode: Mode::default(),
            tuning,
            paused: false,
            last_result: None,
            best_score: 0,
            sessions_played: 0,
            message: String::new(),
            message_timer: 0,
            base_seed,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.mode, Mode::Playing { .. })
    }

    pub fn session(&self) -> Option<&GameSession> {
        match &self.mode {
            Mode::Playing { session, .. } => Some(session),
            Mode::Selecting(_) => None,
        }
    }

    pub fn selection(&self) -> &SelectionController {
        match &self.mode {
            Mode::Selecting(selection) | Mode::Playing { selection, .. } => selection,
        }
    }

    /// Selection-screen input. Ignored while playing.
    pub fn select(&mut self, input: SelectInput) -> Vec<GameEvent> {
        let Mode::Selecting(selection) = &mut self.mode else { return vec![]; };
        match input {
            SelectInput::Previous => selection.advance(Direction::Previous),
            SelectInput::Next => selection.advance(Direction::Next),
            SelectInput::Confirm => return self.start_session(),
        }
        vec![]
    }

    /// Per-frame update while playing. Ends the session when time runs out.
    pub fn tick(&mut self, dt: f32, input: FrameInput) -> Vec<GameEvent> {
        if self.paused { return vec![]; }
        let Mode::Playing { session, .. } = &mut self.mode else { return vec![]; };

        let mut events = session.step(dt, input);
        if session.is_finished() {
            events.extend(self.end_session());
        }
        events
    }

    /// Abandon the running session and go back to selection.
    pub fn quit_session(&mut self) -> Vec<GameEvent> {
        if !self.is_playing() { return vec![]; }
        self.end_session()
    }

    pub fn set_message(&mut self, text: impl Into<String>) {
        self.message = text.into();
        self.message_timer = MESSAGE_TICKS;
    }

    /// Count down the status message. Runs in every mode, paused or not.
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.is_playing() {
            self.paused = !self.paused;
        }
    }

    fn start_session(&mut self) -> Vec<GameEvent> {
        let mut selection = match std::mem::take(&mut self.mode) {
            Mode::Selecting(selection) => selection,
            playing => {
                self.mode = playing;
                return vec![];
            }
        };

        debug_assert!(!selection.is_committed());
        let avatar = selection.confirm();
        let seed = self.base_seed.wrapping_add(self.sessions_played);
        self.sessions_played += 1;
        let session = GameSession::start(avatar, self.tuning.clone(), seed);
        self.mode = Mode::Playing { selection, session };
        self.paused = false;
        self.set_message(format!("Go, {}!", avatar.name));
        vec![GameEvent::SessionStarted { avatar: avatar.name }]
    }

    fn end_session(&mut self) -> Vec<GameEvent> {
        let (mut selection, session) = match std::mem::take(&mut self.mode) {
            Mode::Playing { selection, session } => (selection, session),
            selecting => {
                self.mode = selecting;
                return vec![];
            }
        };

        let summary = session.end();
        debug_assert_eq!(selection.committed(), Some(summary.avatar));
        selection.reset();
        let mut msg = if summary.timed_out {
            format!("Time's up! {} caught {}", summary.avatar.name, summary.score)
        } else {
            String::from("Round abandoned")
        };
        if summary.score > self.best_score {
            msg.push_str(" New best!");
        }
        self.set_message(msg);
        self.best_score = self.best_score.max(summary.score);
        self.last_result = Some(summary);
        self.mode = Mode::Selecting(selection);
        self.paused = false;
        vec![GameEvent::SessionEnded { score: summary.score }]
    }
}
