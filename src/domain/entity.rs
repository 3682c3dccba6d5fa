/// Entities: Player (with walk animation) and FallingObject.

use super::avatar::{Avatar, WALK_FRAMES};
use super::geometry::Rect;

pub const PLAYER_WIDTH: f32 = 48.0;
pub const PLAYER_HEIGHT: f32 = 64.0;
pub const OBJECT_SIZE: f32 = 32.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Frame input: horizontal movement is continuous (held key),
/// jump is edge-triggered (fresh press).
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub horizontal: Option<Facing>,
    pub jump: bool,
}

/// Walk-cycle state: `(frame, elapsed)`.
///
/// Frame 0 is the stand pose; frames `1..WALK_FRAMES` show the matching
/// walk image. The image is always derived from the frame, never stored.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Animation {
    pub frame: usize,
    pub elapsed: f32,
}

impl Animation {
    /// Accumulate `dt`; step one frame once `interval` has passed.
    pub fn advance(&mut self, dt: f32, interval: f32) {
        self.elapsed += dt;
        if self.elapsed >= interval {
            self.elapsed -= interval;
            self.frame = (self.frame + 1) % WALK_FRAMES;
        }
    }

    /// Back to the stand pose.
    pub fn rest(&mut self) {
        self.frame = 0;
        self.elapsed = 0.0;
    }

    pub fn image(&self, avatar: &Avatar) -> &'static str {
        if self.frame == 0 {
            avatar.stand_image
        } else {
            avatar.walk_images[self.frame]
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub avatar: &'static Avatar,
    /// Center position.
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: Facing,
    pub anim: Animation,
}

impl Player {
    pub fn new(avatar: &'static Avatar, x: f32, y: f32) -> Self {
        Player {
            avatar,
            x, y,
            vx: 0.0,
            vy: 0.0,
            facing: Facing::Right,
            anim: Animation::default(),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.x, self.y, PLAYER_WIDTH, PLAYER_HEIGHT)
    }

    pub fn image(&self) -> &'static str {
        self.anim.image(self.avatar)
    }
}

#[derive(Clone, Debug)]
pub struct FallingObject {
    pub id: u64,
    pub image: &'static str,
    pub x: f32,
    pub y: f32,
    /// Units per tick, negative = downward.
    pub vy: f32,
    /// Degrees.
    pub angle: f32,
    /// Degrees per tick.
    pub spin: f32,
}

impl FallingObject {
    pub fn new(id: u64, image: &'static str, x: f32, y: f32, fall_speed: f32, spin: f32) -> Self {
        FallingObject { id, image, x, y, vy: -fall_speed, angle: 0.0, spin }
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.x, self.y, OBJECT_SIZE, OBJECT_SIZE)
    }

    /// Advance one tick.
    pub fn tick(&mut self) {
        self.y += self.vy;
        self.angle = (self.angle + self.spin) % 360.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::avatar::CATALOG;

    #[test]
    fn animation_cycles_through_walk_frames() {
        let avatar = &CATALOG[0];
        let mut anim = Animation::default();
        assert_eq!(anim.image(avatar), avatar.stand_image);

        anim.advance(0.1, 0.2);
        assert_eq!(anim.frame, 0);
        anim.advance(0.1, 0.2);
        assert_eq!(anim.frame, 1);
        assert_eq!(anim.image(avatar), avatar.walk_images[1]);

        for _ in 0..(WALK_FRAMES - 1) {
            anim.advance(0.2, 0.2);
        }
        // Wrapped back to the stand pose at cycle start
        assert_eq!(anim.frame, 0);
        assert_eq!(anim.image(avatar), avatar.stand_image);
    }

    #[test]
    fn animation_steps_once_per_advance() {
        let mut anim = Animation::default();
        anim.advance(0.5, 0.2);
        assert_eq!(anim.frame, 1);
        assert!((anim.elapsed - 0.3).abs() < 1e-5);
    }

    #[test]
    fn rest_returns_to_stand() {
        let mut anim = Animation { frame: 4, elapsed: 0.15 };
        anim.rest();
        assert_eq!(anim, Animation::default());
    }

    #[test]
    fn player_bounds_follow_center() {
        let p = Player::new(&CATALOG[1], 130.0, 120.0);
        let b = p.bounds();
        assert_eq!(b.left, 106.0);
        assert_eq!(b.bottom, 88.0);
        assert_eq!(p.image(), CATALOG[1].stand_image);
    }

    #[test]
    fn falling_object_moves_and_spins() {
        let mut obj = FallingObject::new(1, "Objects/male.png", 400.0, 600.0, 5.0, 2.0);
        obj.tick();
        obj.tick();
        assert_eq!(obj.y, 590.0);
        assert_eq!(obj.angle, 4.0);
        assert_eq!(obj.bounds().top(), 606.0);
    }
}
