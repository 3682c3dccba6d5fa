/// Tile types of the level layout.
/// Properties are queried via methods, so tile semantics stay here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Platform, // '#'
    Crate,    // 'X'
}

impl Tile {
    pub fn from_char(ch: char) -> Tile {
        match ch {
            '#' => Tile::Platform,
            'X' => Tile::Crate,
            _ => Tile::Empty,
        }
    }

    /// Does this tile produce a sprite in the level geometry?
    pub fn is_solid(self) -> bool {
        !matches!(self, Tile::Empty)
    }

    /// Image key for solid tiles.
    pub fn image(self) -> Option<&'static str> {
        match self {
            Tile::Platform => Some(":resources:images/tiles/grassMid.png"),
            Tile::Crate => Some(":resources:images/tiles/boxCrate_double.png"),
            Tile::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend() {
        assert_eq!(Tile::from_char('#'), Tile::Platform);
        assert_eq!(Tile::from_char('X'), Tile::Crate);
        assert_eq!(Tile::from_char(' '), Tile::Empty);
        assert_eq!(Tile::from_char('?'), Tile::Empty);
    }

    #[test]
    fn only_solid_tiles_have_images() {
        assert!(Tile::Empty.image().is_none());
        assert!(Tile::Platform.image().is_some());
        assert!(Tile::Crate.is_solid());
    }
}
