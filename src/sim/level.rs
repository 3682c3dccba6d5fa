/// Level geometry built from the fixed ASCII layout.
///
/// ## Tile legend:
///   '#' = Platform    'X' = Crate    ' ' = Empty
///
/// Row 0 of the layout sits at the bottom of the world (y-up), each tile
/// covers a `TILE_SIZE` square, and tile `(row, col)` is centered at
/// `(col * TILE_SIZE + TILE_SIZE / 2, row * TILE_SIZE + TILE_SIZE / 2)`.

use crate::domain::geometry::Rect;
use crate::domain::tile::Tile;

pub const TILE_SIZE: f32 = 64.0;

pub const LEVEL_LAYOUT: [&str; 14] = [
    "#########################",
    "                        #",
    "                        #",
    "                        #",
    "                        #",
    "                        #",
    "                        #",
    "                        #",
    "                        #",
    "                        #",
    "                        #",
    "                        #",
    "                        #",
    "#########################",
];

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct PlacedTile {
    pub tile: Tile,
    pub row: usize,
    pub col: usize,
    pub x: f32,
    pub y: f32,
}

impl PlacedTile {
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.x, self.y, TILE_SIZE, TILE_SIZE)
    }
}

/// Static platform tiles, ordered row by row, column by column.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelGeometry {
    pub tiles: Vec<PlacedTile>,
}

impl LevelGeometry {
    pub fn build() -> Self {
        Self::from_rows(&LEVEL_LAYOUT)
    }

    pub fn from_rows(rows: &[&str]) -> Self {
        let mut tiles = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                let tile = Tile::from_char(ch);
                if !tile.is_solid() { continue; }
                tiles.push(PlacedTile {
                    tile,
                    row,
                    col,
                    x: col as f32 * TILE_SIZE + TILE_SIZE / 2.0,
                    y: row as f32 * TILE_SIZE + TILE_SIZE / 2.0,
                });
            }
        }
        LevelGeometry { tiles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_tile_count() {
        let level = LevelGeometry::build();
        // Two full rows of 25 plus the right wall on the 12 rows between
        assert_eq!(level.tiles.len(), 25 * 2 + 12);
        assert!(level.tiles.iter().all(|t| t.tile == Tile::Platform));
    }

    #[test]
    fn tile_positions() {
        let level = LevelGeometry::build();
        let first = level.tiles[0];
        assert_eq!((first.row, first.col), (0, 0));
        assert_eq!((first.x, first.y), (32.0, 32.0));

        let wall = level.tiles.iter().find(|t| t.row == 1).unwrap();
        assert_eq!(wall.col, 24);
        assert_eq!((wall.x, wall.y), (24.0 * 64.0 + 32.0, 96.0));
    }

    #[test]
    fn crates_are_recognised() {
        let level = LevelGeometry::from_rows(&[" X#", "   "]);
        let kinds: Vec<Tile> = level.tiles.iter().map(|t| t.tile).collect();
        assert_eq!(kinds, vec![Tile::Crate, Tile::Platform]);
    }

    #[test]
    fn rebuild_is_identical() {
        assert_eq!(LevelGeometry::build(), LevelGeometry::build());
    }
}
