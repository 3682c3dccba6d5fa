/// GameSession: one timed playthrough, from avatar confirmation to timeout.
///
/// `step` processing order:
///   1. Player update (velocity from input, jump impulse, clamp, animation)
///   2. Spawn (accumulate time, one object per elapsed interval)
///   3. Falling objects (move, spin, cull far below the player)
///   4. Catches (player overlap → remove + score)
///   5. Clock (count down, clamp at zero, signal time up once)
///
/// There is no gravity: a jump sets an upward velocity that stays until the
/// clamp at the top of the playfield holds the player in place.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::SessionTuning;
use crate::domain::avatar::{Avatar, CATALOG};
use crate::domain::entity::{Facing, FallingObject, FrameInput, Player};
use crate::domain::geometry::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use super::event::GameEvent;
use super::level::LevelGeometry;

pub struct GameSession {
    pub player: Player,
    pub level: LevelGeometry,
    pub objects: Vec<FallingObject>,
    pub score: u32,
    /// Seconds left on the session clock. Never negative.
    pub remaining: f32,
    pub spawn_timer: f32,
    pub tuning: SessionTuning,
    pub tick: u64,
    finished: bool,
    next_object_id: u64,
    rng: Pcg32,
}

/// What is left of a session after `end()`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSummary {
    pub avatar: &'static Avatar,
    pub score: u32,
    /// `true` if the clock ran out, `false` if play was cut short.
    pub timed_out: bool,
}

impl GameSession {
    pub fn start(avatar: &'static Avatar, tuning: SessionTuning, seed: u64) -> Self {
        let (sx, sy) = tuning.spawn_point;
        log::info!("session start: avatar={} seed={seed}", avatar.name);
        GameSession {
            player: Player::new(avatar, sx, sy),
            level: LevelGeometry::build(),
            objects: Vec::new(),
            score: 0,
            remaining: tuning.time_budget,
            spawn_timer: 0.0,
            tuning,
            tick: 0,
            finished: false,
            next_object_id: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn avatar(&self) -> &'static Avatar {
        self.player.avatar
    }

    /// Has the clock reached zero?
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance the session by `dt` seconds. No-op once finished.
    pub fn step(&mut self, dt: f32, input: FrameInput) -> Vec<GameEvent> {
        if self.finished { return vec![]; }

        let dt = dt.max(0.0);
        let mut events: Vec<GameEvent> = Vec::new();
        self.tick += 1;

        resolve_player(self, dt, input, &mut events);
        resolve_spawn(self, dt, &mut events);
        let player_bottom = self.player.bounds().bottom;
        advance_objects(
            &mut self.objects,
            Some(player_bottom),
            self.tuning.max_fall_distance,
            &mut events,
        );
        resolve_catches(self, &mut events);
        resolve_clock(self, dt, &mut events);

        events
    }

    /// Tear the session down and report the result.
    pub fn end(self) -> SessionSummary {
        log::info!(
            "session end: avatar={} score={} ticks={} timed_out={}",
            self.player.avatar.name, self.score, self.tick, self.finished,
        );
        SessionSummary {
            avatar: self.player.avatar,
            score: self.score,
            timed_out: self.finished,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player(s: &mut GameSession, dt: f32, input: FrameInput, events: &mut Vec<GameEvent>) {
    let t = &s.tuning;
    let p = &mut s.player;

    match input.horizontal {
        Some(Facing::Left) => {
            p.vx = -t.move_speed;
            p.facing = Facing::Left;
        }
        Some(Facing::Right) => {
            p.vx = t.move_speed;
            p.facing = Facing::Right;
        }
        None => p.vx = 0.0,
    }

    if input.jump {
        p.vy = t.jump_impulse;
        events.push(GameEvent::Jumped);
    }

    p.x += p.vx;
    p.y += p.vy;

    // Keep the whole sprite on screen; edges sit on pixel 0 and size - 1.
    let (dx, dy) = p.bounds().clamp_offset(PLAYFIELD_WIDTH - 1.0, PLAYFIELD_HEIGHT - 1.0);
    p.x += dx;
    p.y += dy;

    if p.vx != 0.0 {
        p.anim.advance(dt, t.animation_interval);
    } else {
        p.anim.rest();
    }
}

// ══════════════════════════════════════════════════════════════
// Spawn
// ══════════════════════════════════════════════════════════════

fn resolve_spawn(s: &mut GameSession, dt: f32, events: &mut Vec<GameEvent>) {
    s.spawn_timer += dt;
    if s.spawn_timer < s.tuning.spawn_interval { return; }
    // One spawn per tick; the carried remainder never exceeds one interval.
    s.spawn_timer = (s.spawn_timer - s.tuning.spawn_interval).min(s.tuning.spawn_interval);

    let x = s.rng.random_range(0.0..PLAYFIELD_WIDTH);
    let image = CATALOG[s.rng.random_range(0..CATALOG.len())].object_image;
    let id = s.next_object_id;
    s.next_object_id += 1;

    s.objects.push(FallingObject::new(
        id, image, x, PLAYFIELD_HEIGHT,
        s.tuning.fall_speed, s.tuning.spin_rate,
    ));
    log::debug!("spawn #{id} {image} at x={x:.1}");
    events.push(GameEvent::ObjectSpawned { id, x });
}

// ══════════════════════════════════════════════════════════════
// Falling objects
// ══════════════════════════════════════════════════════════════

/// Move every object one tick, then drop those whose top edge is more
/// than `max_fall` below `player_bottom`. Without a player nothing is
/// culled.
pub fn advance_objects(
    objects: &mut Vec<FallingObject>,
    player_bottom: Option<f32>,
    max_fall: f32,
    events: &mut Vec<GameEvent>,
) {
    for obj in objects.iter_mut() {
        obj.tick();
    }

    let Some(bottom) = player_bottom else { return };
    let floor = bottom - max_fall;
    objects.retain(|obj| {
        let keep = obj.bounds().top() >= floor;
        if !keep {
            events.push(GameEvent::ObjectMissed { id: obj.id });
        }
        keep
    });
}

// ══════════════════════════════════════════════════════════════
// Catches
// ══════════════════════════════════════════════════════════════

fn resolve_catches(s: &mut GameSession, events: &mut Vec<GameEvent>) {
    let player_box = s.player.bounds();
    let mut score = s.score;

    s.objects.retain(|obj| {
        if !obj.bounds().intersects(&player_box) { return true; }
        score = score.saturating_add(1);
        log::debug!("caught #{} score={score}", obj.id);
        events.push(GameEvent::ObjectCaught { id: obj.id, score });
        false
    });

    s.score = score;
}

// ══════════════════════════════════════════════════════════════
// Clock
// ══════════════════════════════════════════════════════════════

fn resolve_clock(s: &mut GameSession, dt: f32, events: &mut Vec<GameEvent>) {
    s.remaining = (s.remaining - dt).max(0.0);
    if s.remaining <= 0.0 {
        s.finished = true;
        events.push(GameEvent::TimeUp { score: s.score });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn session() -> GameSession {
        GameSession::start(&CATALOG[0], SessionTuning::default(), 42)
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn right() -> FrameInput {
        FrameInput { horizontal: Some(Facing::Right), jump: false }
    }

    #[test]
    fn start_state() {
        let s = session();
        assert_eq!((s.player.x, s.player.y), (130.0, 120.0));
        assert_eq!(s.score, 0);
        assert_eq!(s.remaining, 30.0);
        assert!(s.objects.is_empty());
        assert_eq!(s.level, LevelGeometry::build());
        assert!(!s.is_finished());
        assert_eq!(s.avatar().name, "Female");
    }

    #[test]
    fn spawn_once_per_interval_with_carry() {
        let mut s = session();
        let mut spawned = 0;
        for _ in 0..3 {
            let ev = s.step(0.4, idle());
            spawned += ev.iter().filter(|e| matches!(e, GameEvent::ObjectSpawned { .. })).count();
        }
        assert_eq!(spawned, 1);
        assert_eq!(s.objects.len(), 1);
        assert!((s.spawn_timer - 0.2).abs() < 1e-5);
    }

    #[test]
    fn spawn_is_one_object_even_for_long_ticks() {
        let mut s = session();
        s.step(2.5, idle());
        assert_eq!(s.objects.len(), 1);
        assert_eq!(s.spawn_timer, 1.0);
        // The capped carry yields exactly one more spawn on the next tick
        s.step(0.0, idle());
        assert_eq!(s.objects.len(), 2);
        assert_eq!(s.spawn_timer, 0.0);
    }

    #[test]
    fn short_interval_keeps_spawn_timer_bounded() {
        let tuning = SessionTuning { spawn_interval: 0.005, ..SessionTuning::default() };
        let mut s = GameSession::start(&CATALOG[0], tuning, 42);
        for _ in 0..600 {
            let ev = s.step(0.016, idle());
            let spawned = ev.iter().filter(|e| matches!(e, GameEvent::ObjectSpawned { .. })).count();
            assert_eq!(spawned, 1);
            assert!(s.spawn_timer <= 0.005);
        }
    }

    #[test]
    fn spawn_images_cover_whole_catalog() {
        let tuning = SessionTuning { time_budget: 100.0, ..SessionTuning::default() };
        let mut s = GameSession::start(&CATALOG[0], tuning, 42);
        let mut seen = HashSet::new();
        for _ in 0..60 {
            let ev = s.step(1.0, idle());
            if ev.iter().any(|e| matches!(e, GameEvent::ObjectSpawned { .. })) {
                if let Some(obj) = s.objects.last() {
                    seen.insert(obj.image);
                }
            }
        }
        for avatar in CATALOG.iter() {
            assert!(seen.contains(avatar.object_image), "{} never spawned", avatar.object_image);
        }
        assert!(seen.iter().any(|img| *img != CATALOG[0].object_image));
    }

    #[test]
    fn spawned_objects_start_on_top_edge() {
        let mut s = session();
        let images: Vec<&str> = CATALOG.iter().map(|a| a.object_image).collect();
        for _ in 0..50 {
            s.step(1.0, idle());
        }
        assert!(!s.objects.is_empty());
        for obj in &s.objects {
            assert!(obj.x >= 0.0 && obj.x < PLAYFIELD_WIDTH);
            assert!(obj.y <= PLAYFIELD_HEIGHT);
            assert!(images.contains(&obj.image));
        }
    }

    #[test]
    fn horizontal_input_moves_and_release_stops() {
        let mut s = session();
        s.step(0.0, right());
        assert_eq!(s.player.x, 135.0);
        assert_eq!(s.player.facing, Facing::Right);
        s.step(0.0, FrameInput { horizontal: Some(Facing::Left), jump: false });
        assert_eq!(s.player.x, 130.0);
        assert_eq!(s.player.facing, Facing::Left);
        s.step(0.0, idle());
        assert_eq!(s.player.x, 130.0);
        assert_eq!(s.player.vx, 0.0);
    }

    #[test]
    fn right_edge_clamps_to_799() {
        let mut s = session();
        s.player.x = PLAYFIELD_WIDTH - 1.0 - 24.0;
        assert_eq!(s.player.bounds().right(), 799.0);
        s.step(0.0, right());
        assert_eq!(s.player.bounds().right(), 799.0);
    }

    #[test]
    fn left_edge_clamps_to_zero() {
        let mut s = session();
        s.player.x = 26.0;
        s.step(0.0, FrameInput { horizontal: Some(Facing::Left), jump: false });
        assert_eq!(s.player.bounds().left, 0.0);
    }

    #[test]
    fn jump_rises_until_top_clamp() {
        let mut s = session();
        let ev = s.step(0.0, FrameInput { horizontal: None, jump: true });
        assert!(ev.contains(&GameEvent::Jumped));
        assert_eq!(s.player.y, 130.0);
        // No gravity: upward velocity persists
        s.step(0.0, idle());
        assert_eq!(s.player.y, 140.0);
        for _ in 0..100 {
            s.step(0.0, idle());
        }
        assert_eq!(s.player.bounds().top(), 599.0);
    }

    #[test]
    fn walking_animates_and_release_rests() {
        let mut s = session();
        s.step(0.2, right());
        assert_eq!(s.player.anim.frame, 1);
        assert_eq!(s.player.image(), CATALOG[0].walk_images[1]);
        s.step(0.2, idle());
        assert_eq!(s.player.anim.frame, 0);
        assert_eq!(s.player.image(), CATALOG[0].stand_image);
    }

    #[test]
    fn overlapping_object_scores_once() {
        let mut s = session();
        s.objects.push(FallingObject::new(7, "Objects/male.png", 130.0, 125.0, 5.0, 2.0));
        let ev = s.step(0.0, idle());
        assert_eq!(s.score, 1);
        assert!(s.objects.is_empty());
        assert!(ev.contains(&GameEvent::ObjectCaught { id: 7, score: 1 }));

        let ev = s.step(0.0, idle());
        assert_eq!(s.score, 1);
        assert!(ev.is_empty());
    }

    #[test]
    fn simultaneous_catches_all_score() {
        let mut s = session();
        s.objects.push(FallingObject::new(1, "Objects/male.png", 120.0, 125.0, 5.0, 2.0));
        s.objects.push(FallingObject::new(2, "Objects/robot.png", 140.0, 110.0, 5.0, 2.0));
        s.objects.push(FallingObject::new(3, "Objects/robot.png", 500.0, 110.0, 5.0, 2.0));
        s.step(0.0, idle());
        assert_eq!(s.score, 2);
        assert_eq!(s.objects.len(), 1);
        assert_eq!(s.objects[0].id, 3);
    }

    #[test]
    fn far_below_objects_are_culled_once() {
        let mut s = session();
        // Player bottom = 88, cull line = -212
        s.objects.push(FallingObject::new(1, "Objects/male.png", 600.0, -240.0, 5.0, 2.0));
        s.objects.push(FallingObject::new(2, "Objects/male.png", 600.0, -190.0, 5.0, 2.0));
        let ev = s.step(0.0, idle());
        assert_eq!(ev, vec![GameEvent::ObjectMissed { id: 1 }]);
        assert_eq!(s.objects.len(), 1);
        assert_eq!(s.score, 0);

        let ev = s.step(0.0, idle());
        assert!(!ev.contains(&GameEvent::ObjectMissed { id: 1 }));
    }

    #[test]
    fn no_player_means_no_culling() {
        let mut objects = vec![FallingObject::new(1, "Objects/female.png", 400.0, 600.0, 5.0, 2.0)];
        let mut events = Vec::new();
        for _ in 0..1000 {
            advance_objects(&mut objects, None, 300.0, &mut events);
        }
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].y, 600.0 - 5000.0);
        assert!(events.is_empty());
    }

    #[test]
    fn clock_clamps_and_times_up_once() {
        let mut s = session();
        s.step(29.5, idle());
        assert!((s.remaining - 0.5).abs() < 1e-5);
        assert!(!s.is_finished());

        let ev = s.step(1.0, idle());
        assert_eq!(s.remaining, 0.0);
        assert!(s.is_finished());
        assert_eq!(ev.iter().filter(|e| matches!(e, GameEvent::TimeUp { .. })).count(), 1);

        let ev = s.step(1.0, idle());
        assert!(ev.is_empty());
        assert_eq!(s.remaining, 0.0);
    }

    #[test]
    fn exact_budget_finishes() {
        let mut s = session();
        let ev = s.step(30.0, idle());
        assert_eq!(s.remaining, 0.0);
        assert!(ev.contains(&GameEvent::TimeUp { score: 0 }));
    }

    #[test]
    fn end_reports_score() {
        let mut s = session();
        s.objects.push(FallingObject::new(1, "Objects/male.png", 130.0, 120.0, 5.0, 2.0));
        s.step(0.0, idle());
        let summary = s.end();
        assert_eq!(summary.score, 1);
        assert!(!summary.timed_out);
        assert_eq!(summary.avatar.name, "Female");
    }

    #[test]
    fn same_seed_same_spawns() {
        let mut a = session();
        let mut b = session();
        for _ in 0..20 {
            a.step(0.5, right());
            b.step(0.5, right());
        }
        let xs_a: Vec<f32> = a.objects.iter().map(|o| o.x).collect();
        let xs_b: Vec<f32> = b.objects.iter().map(|o| o.x).collect();
        assert_eq!(xs_a, xs_b);
        assert_eq!(a.score, b.score);
    }
}
