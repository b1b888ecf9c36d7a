use crate::constants::TILE_SIZE;
use crate::types::CollisionClass;

/// Two tile layers over a pixel grid. Rows are strings of one char per tile:
/// `.` walkable, `#` wall, `~` abyss, `^` trap, space for no tile at all.
#[derive(Clone, Debug)]
pub struct TileMap {
    width_tiles: i32,
    height_tiles: i32,
    layers: [Vec<Vec<char>>; 2],
}

fn class_of(tile: char) -> Option<CollisionClass> {
    match tile {
        '.' => Some(CollisionClass::Walkable),
        '#' => Some(CollisionClass::Wall),
        '~' => Some(CollisionClass::Abyss),
        '^' => Some(CollisionClass::Trap),
        _ => None,
    }
}

impl TileMap {
    pub fn from_rows(rows: &[&str]) -> Self {
        Self::from_layers(rows, &[])
    }

    pub fn from_layers(ground: &[&str], overlay: &[&str]) -> Self {
        let width_tiles = ground.iter().map(|row| row.len()).max().unwrap_or(0) as i32;
        let height_tiles = ground.len() as i32;
        let build = |rows: &[&str]| -> Vec<Vec<char>> {
            rows.iter().map(|row| row.chars().collect()).collect()
        };
        Self {
            width_tiles,
            height_tiles,
            layers: [build(ground), build(overlay)],
        }
    }

    pub fn width_tiles(&self) -> i32 {
        self.width_tiles
    }

    pub fn height_tiles(&self) -> i32 {
        self.height_tiles
    }

    pub fn width_px(&self) -> i32 {
        self.width_tiles * TILE_SIZE
    }

    pub fn height_px(&self) -> i32 {
        self.height_tiles * TILE_SIZE
    }

    /// Collision class of the pixel at `(x, y)` on one layer. `None` when the
    /// pixel is off the map or the layer carries no tile there.
    pub fn check_col(&self, x: i32, y: i32, layer: usize) -> Option<CollisionClass> {
        if x < 0 || y < 0 {
            return None;
        }
        let tile_x = (x / TILE_SIZE) as usize;
        let tile_y = (y / TILE_SIZE) as usize;
        let rows = self.layers.get(layer)?;
        let row = rows.get(tile_y)?;
        row.get(tile_x).copied().and_then(class_of)
    }

    /// Test helper used across the crate: rewrite one tile in place.
    pub fn set_tile(&mut self, layer: usize, tile_x: i32, tile_y: i32, tile: char) {
        if layer >= self.layers.len() || tile_x < 0 || tile_y < 0 {
            return;
        }
        let rows = &mut self.layers[layer];
        while rows.len() <= tile_y as usize {
            rows.push(Vec::new());
        }
        let row = &mut rows[tile_y as usize];
        while row.len() <= tile_x as usize {
            row.push(' ');
        }
        row[tile_x as usize] = tile;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_pixels_by_tile() {
        let map = TileMap::from_rows(&["#.~", "^.."]);
        assert_eq!(map.check_col(0, 0, 0), Some(CollisionClass::Wall));
        assert_eq!(map.check_col(33, 10, 0), Some(CollisionClass::Walkable));
        assert_eq!(map.check_col(64, 31, 0), Some(CollisionClass::Abyss));
        assert_eq!(map.check_col(0, 32, 0), Some(CollisionClass::Trap));
    }

    #[test]
    fn off_map_and_missing_layer_are_none() {
        let map = TileMap::from_rows(&["..", ".."]);
        assert_eq!(map.check_col(-1, 0, 0), None);
        assert_eq!(map.check_col(0, 200, 0), None);
        assert_eq!(map.check_col(0, 0, 1), None);
        assert_eq!(map.check_col(0, 0, 5), None);
    }

    #[test]
    fn overlay_layer_reads_independently() {
        let map = TileMap::from_layers(&["..", ".."], &[" #"]);
        assert_eq!(map.check_col(0, 0, 1), None);
        assert_eq!(map.check_col(40, 8, 1), Some(CollisionClass::Wall));
        assert_eq!(map.check_col(40, 8, 0), Some(CollisionClass::Walkable));
    }

    #[test]
    fn set_tile_overwrites_in_place() {
        let mut map = TileMap::from_rows(&["..", ".."]);
        map.set_tile(0, 1, 1, '#');
        assert_eq!(map.check_col(40, 40, 0), Some(CollisionClass::Wall));
    }
}
