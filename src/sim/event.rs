/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and messages.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    SessionStarted { avatar: &'static str },
    Jumped,
    ObjectSpawned { id: u64, x: f32 },
    ObjectCaught { id: u64, score: u32 },
    ObjectMissed { id: u64 },
    TimeUp { score: u32 },
    SessionEnded { score: u32 },
}
