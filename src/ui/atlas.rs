/// Sprite atlas: resolves image path keys to terminal sprites.
///
/// The simulation refers to images only by path. The atlas owns the
/// terminal rendition of every known path; asking for anything else is an
/// `AssetError::NotFound` that the caller must surface.

use std::collections::HashMap;

use crossterm::style::Color;
use thiserror::Error;

use crate::domain::avatar::{Avatar, CATALOG, WALK_FRAMES};
use crate::domain::tile::Tile;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("image not found: {0}")]
    NotFound(String),
}

/// A small block of text art. Every row has the same number of chars.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sprite {
    pub fg: Color,
    pub bg: Option<Color>,
    pub rows: Vec<Vec<char>>,
}

impl Sprite {
    fn new(fg: Color, bg: Option<Color>, lines: &[&str]) -> Self {
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let rows = lines
            .iter()
            .map(|l| {
                let mut row: Vec<char> = l.chars().collect();
                row.resize(width, ' ');
                row
            })
            .collect();
        Sprite { fg, bg, rows }
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Char at normalized position `(u, v)`, both in `[0, 1)`, `v = 0` on top.
    pub fn sample(&self, u: f32, v: f32) -> char {
        let (w, h) = (self.width(), self.height());
        if w == 0 || h == 0 { return ' '; }
        let col = ((u * w as f32) as usize).min(w - 1);
        let row = ((v * h as f32) as usize).min(h - 1);
        self.rows[row][col]
    }
}

// ── Built-in art ──

struct Look {
    head: &'static str,
    torso: &'static str,
    waist: &'static str,
    fg: Color,
    object: char,
    object_fg: Color,
}

fn look(avatar: &Avatar) -> Look {
    match avatar.id {
        "female" => Look {
            head: "(@)", torso: "/|\\", waist: "/_\\",
            fg: Color::Rgb { r: 255, g: 120, b: 200 },
            object: '♥', object_fg: Color::Rgb { r: 255, g: 60, b: 120 },
        },
        "male" => Look {
            head: "(o)", torso: "/|\\", waist: " | ",
            fg: Color::Rgb { r: 90, g: 170, b: 255 },
            object: '♦', object_fg: Color::Rgb { r: 80, g: 140, b: 255 },
        },
        _ => Look {
            head: "[=]", torso: "|#|", waist: "|_|",
            fg: Color::Rgb { r: 190, g: 190, b: 200 },
            object: '⚙', object_fg: Color::Rgb { r: 200, g: 200, b: 60 },
        },
    }
}

const STAND_LEGS: &str = "| |";
const WALK_LEGS: [&str; WALK_FRAMES] = ["| |", "/ |", "/ \\", "| \\", "| |", "| \\", "/ \\"];

pub struct SpriteAtlas {
    sprites: HashMap<String, Sprite>,
}

impl SpriteAtlas {
    pub fn empty() -> Self {
        SpriteAtlas { sprites: HashMap::new() }
    }

    /// Atlas with art for every catalog image and every tile.
    pub fn builtin() -> Self {
        let mut atlas = Self::empty();
        for avatar in &CATALOG {
            let l = look(avatar);
            atlas.insert(
                avatar.stand_image,
                Sprite::new(l.fg, None, &[l.head, l.torso, l.waist, STAND_LEGS]),
            );
            for (path, legs) in avatar.walk_images.iter().zip(WALK_LEGS) {
                atlas.insert(path, Sprite::new(l.fg, None, &[l.head, l.torso, l.waist, legs]));
            }
            let obj = l.object.to_string();
            atlas.insert(avatar.object_image, Sprite::new(l.object_fg, None, &[&obj]));
        }
        if let Some(path) = Tile::Platform.image() {
            atlas.insert(path, Sprite::new(
                Color::Rgb { r: 90, g: 200, b: 70 },
                Some(Color::Rgb { r: 110, g: 75, b: 40 }),
                &["▀"],
            ));
        }
        if let Some(path) = Tile::Crate.image() {
            atlas.insert(path, Sprite::new(
                Color::Rgb { r: 230, g: 170, b: 90 },
                Some(Color::Rgb { r: 130, g: 80, b: 30 }),
                &["▒"],
            ));
        }
        atlas
    }

    pub fn insert(&mut self, path: &str, sprite: Sprite) {
        self.sprites.insert(path.to_string(), sprite);
    }

    pub fn get(&self, path: &str) -> Result<&Sprite, AssetError> {
        self.sprites.get(path).ok_or_else(|| AssetError::NotFound(path.to_string()))
    }

    /// Resolve every path up front; fails on the first unknown one.
    pub fn preload<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> Result<usize, AssetError> {
        let mut count = 0;
        for path in paths {
            self.get(path)?;
            count += 1;
        }
        log::debug!("preloaded {count} sprites");
        Ok(count)
    }
}

/// Every image the game can ask for.
pub fn required_images() -> impl Iterator<Item = &'static str> {
    CATALOG
        .iter()
        .flat_map(|a| a.images())
        .chain([Tile::Platform, Tile::Crate].into_iter().filter_map(Tile::image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_required_image() {
        let atlas = SpriteAtlas::builtin();
        let n = atlas.preload(required_images()).unwrap();
        assert_eq!(n, CATALOG.len() * (WALK_FRAMES + 2) + 2);
    }

    #[test]
    fn unknown_path_is_not_found() {
        let atlas = SpriteAtlas::builtin();
        assert_eq!(
            atlas.get("Players/Zombie/zombie_stand.png"),
            Err(AssetError::NotFound("Players/Zombie/zombie_stand.png".into())),
        );
    }

    #[test]
    fn preload_stops_at_missing_image() {
        let atlas = SpriteAtlas::empty();
        let err = atlas.preload(required_images()).unwrap_err();
        assert_eq!(err, AssetError::NotFound("Players/Female/female_stand.png".into()));
        assert_eq!(err.to_string(), "image not found: Players/Female/female_stand.png");
    }

    #[test]
    fn sprite_rows_are_padded() {
        let s = Sprite::new(Color::White, None, &["ab", "c"]);
        assert_eq!(s.width(), 2);
        assert_eq!(s.rows[1], vec!['c', ' ']);
    }

    #[test]
    fn sample_maps_corners() {
        let s = Sprite::new(Color::White, None, &["ab", "cd"]);
        assert_eq!(s.sample(0.0, 0.0), 'a');
        assert_eq!(s.sample(0.99, 0.0), 'b');
        assert_eq!(s.sample(0.0, 0.99), 'c');
        assert_eq!(s.sample(1.0, 1.0), 'd');
    }

    #[test]
    fn walk_frames_differ_from_stand() {
        let atlas = SpriteAtlas::builtin();
        let robot = &CATALOG[2];
        let stand = atlas.get(robot.stand_image).unwrap();
        let walk = atlas.get(robot.walk_images[2]).unwrap();
        assert_eq!(stand.rows[0], walk.rows[0]);
        assert_ne!(stand.rows[3], walk.rows[3]);
    }
}
