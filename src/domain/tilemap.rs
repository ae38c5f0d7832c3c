/// Tilemap: sparse grid of placed tiles + free-form decorations.
///
/// ## Two tile layers
///
///   - grid tiles: keyed by `GridPos` (`"x;y"` in level files). A key
///     identifies exactly one tile; writing the same cell again replaces it.
///   - off-grid tiles: decorations at pixel positions. Never collide.
///
/// ## Collision queries
///
/// `physics_rects()` returns every solid tile map-wide.
/// `physics_rects_near(area)` only visits the grid cells under `area`
/// (plus a one-cell margin). Callers pass an area that covers everything a
/// body can touch during a step, so both queries resolve collisions the same.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::geom::{Rect, Vec2};
use super::tile::TileKind;
use crate::error::LevelError;

pub const DEFAULT_TILE_SIZE: u32 = 16;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        GridPos { x, y }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.x, self.y)
    }
}

impl FromStr for GridPos {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || LevelError::BadKey(s.to_string());
        let (x, y) = s.split_once(';').ok_or_else(bad)?;
        Ok(GridPos {
            x: x.trim().parse().map_err(|_| bad())?,
            y: y.trim().parse().map_err(|_| bad())?,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tile {
    pub kind: TileKind,
    pub variant: u32,
    pub pos: GridPos,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct OffgridTile {
    pub kind: TileKind,
    pub variant: u32,
    pub pos: Vec2,
}

#[derive(Clone, Debug)]
pub struct Tilemap {
    tile_size: u32,
    tiles: HashMap<GridPos, Tile>,
    offgrid: Vec<OffgridTile>,
}

// ── Level file schema ──

/// On-disk level layout. Field names follow the level file format.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LevelFile {
    pub tilemap: BTreeMap<String, TileRecord>,
    pub tile_size: u32,
    pub offgrid: Vec<OffgridRecord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TileRecord {
    #[serde(rename = "type")]
    pub kind: TileKind,
    pub variant: u32,
    pub pos: [i32; 2],
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OffgridRecord {
    #[serde(rename = "type")]
    pub kind: TileKind,
    pub variant: u32,
    pub pos: [f64; 2],
}

impl Tilemap {
    pub fn new(tile_size: u32) -> Self {
        Tilemap {
            tile_size,
            tiles: HashMap::new(),
            offgrid: Vec::new(),
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.offgrid.is_empty()
    }

    // ── Grid tiles ──

    /// Insert or overwrite the tile at `pos`.
    pub fn set_tile(&mut self, kind: TileKind, variant: u32, pos: GridPos) {
        self.tiles.insert(pos, Tile { kind, variant, pos });
    }

    #[allow(dead_code)]
    pub fn remove_tile(&mut self, pos: GridPos) -> Option<Tile> {
        self.tiles.remove(&pos)
    }

    pub fn tile_at(&self, pos: GridPos) -> Option<&Tile> {
        self.tiles.get(&pos)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    #[allow(dead_code)]
    /// Grid cell containing a pixel coordinate.
    pub fn grid_pos_of(&self, px: f64, py: f64) -> GridPos {
        let ts = self.tile_size as f64;
        GridPos::new((px / ts).floor() as i32, (py / ts).floor() as i32)
    }

    /// Pixel rect covered by a grid cell.
    pub fn cell_rect(&self, pos: GridPos) -> Rect {
        let ts = self.tile_size as i32;
        Rect::new(pos.x * ts, pos.y * ts, ts, ts)
    }

    #[allow(dead_code)]
    /// Grid-space bounds of all placed tiles: (min, max) inclusive.
    pub fn bounds(&self) -> Option<(GridPos, GridPos)> {
        let mut it = self.tiles.keys();
        let first = *it.next()?;
        Some(it.fold((first, first), |(lo, hi), p| {
            (
                GridPos::new(lo.x.min(p.x), lo.y.min(p.y)),
                GridPos::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }

    // ── Off-grid tiles ──

    pub fn add_offgrid(&mut self, kind: TileKind, variant: u32, pos: Vec2) {
        self.offgrid.push(OffgridTile { kind, variant, pos });
    }

    #[allow(dead_code)]
    /// Remove the first decoration equal to `tile`. Returns whether one was removed.
    pub fn remove_offgrid(&mut self, tile: &OffgridTile) -> bool {
        match self.offgrid.iter().position(|t| t == tile) {
            Some(idx) => {
                self.offgrid.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn offgrid(&self) -> &[OffgridTile] {
        &self.offgrid
    }

    #[allow(dead_code)]
    /// Decorations whose tile-sized box contains the pixel point.
    pub fn offgrid_at(&self, px: f64, py: f64) -> Vec<OffgridTile> {
        let ts = self.tile_size as i32;
        self.offgrid
            .iter()
            .filter(|t| Rect::from_pos(t.pos, ts, ts).contains_point(px, py))
            .copied()
            .collect()
    }

    // ── Collision geometry ──

    #[allow(dead_code)]
    /// Every solid tile on the map as `(rect, kind)`, in row-major order.
    pub fn physics_rects(&self) -> Vec<(Rect, TileKind)> {
        let mut solid: Vec<&Tile> = self.tiles.values().filter(|t| t.kind.is_solid()).collect();
        solid.sort_by_key(|t| (t.pos.y, t.pos.x));
        solid.into_iter().map(|t| (self.cell_rect(t.pos), t.kind)).collect()
    }

    /// Solid tiles in the cells under `area`, widened by one cell, row-major.
    pub fn physics_rects_near(&self, area: Rect) -> Vec<(Rect, TileKind)> {
        let ts = self.tile_size as i32;
        let x0 = area.left().div_euclid(ts) - 1;
        let x1 = (area.right() - 1).div_euclid(ts) + 1;
        let y0 = area.top().div_euclid(ts) - 1;
        let y1 = (area.bottom() - 1).div_euclid(ts) + 1;

        let mut rects = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                if let Some(t) = self.tiles.get(&GridPos::new(x, y)) {
                    if t.kind.is_solid() {
                        rects.push((self.cell_rect(t.pos), t.kind));
                    }
                }
            }
        }
        rects
    }

    // ── Level file conversion ──

    pub fn to_level_file(&self) -> LevelFile {
        LevelFile {
            tilemap: self
                .tiles
                .values()
                .map(|t| {
                    (t.pos.to_string(), TileRecord {
                        kind: t.kind,
                        variant: t.variant,
                        pos: [t.pos.x, t.pos.y],
                    })
                })
                .collect(),
            tile_size: self.tile_size,
            offgrid: self
                .offgrid
                .iter()
                .map(|t| OffgridRecord {
                    kind: t.kind,
                    variant: t.variant,
                    pos: [t.pos.x, t.pos.y],
                })
                .collect(),
        }
    }

    /// Build a map from its file form. Every key must match its tile's `pos`
    /// and the tile size must be positive.
    pub fn from_level_file(file: LevelFile) -> Result<Self, LevelError> {
        if file.tile_size == 0 {
            return Err(LevelError::ZeroTileSize);
        }
        let mut map = Tilemap::new(file.tile_size);
        for (key, rec) in file.tilemap {
            let pos: GridPos = key.parse()?;
            if pos.x != rec.pos[0] || pos.y != rec.pos[1] {
                return Err(LevelError::KeyMismatch { key, x: rec.pos[0], y: rec.pos[1] });
            }
            map.set_tile(rec.kind, rec.variant, pos);
        }
        for rec in file.offgrid {
            map.add_offgrid(rec.kind, rec.variant, Vec2::new(rec.pos[0], rec.pos[1]));
        }
        Ok(map)
    }
}

impl Default for Tilemap {
    fn default() -> Self {
        Tilemap::new(DEFAULT_TILE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_map() -> Tilemap {
        let mut map = Tilemap::new(16);
        for x in 0..10 {
            map.set_tile(TileKind::Stone, 0, GridPos::new(x, 5));
        }
        map
    }

    #[test]
    fn grid_key_format() {
        assert_eq!(GridPos::new(3, -4).to_string(), "3;-4");
        assert_eq!("3;-4".parse::<GridPos>().unwrap(), GridPos::new(3, -4));
        assert!("3,4".parse::<GridPos>().is_err());
        assert!("a;4".parse::<GridPos>().is_err());
    }

    #[test]
    fn set_tile_overwrites() {
        let mut map = Tilemap::new(16);
        let p = GridPos::new(1, 1);
        map.set_tile(TileKind::Grass, 0, p);
        map.set_tile(TileKind::Ice, 2, p);
        assert_eq!(map.len(), 1);
        let t = map.tile_at(p).unwrap();
        assert_eq!((t.kind, t.variant), (TileKind::Ice, 2));
    }

    #[test]
    fn remove_missing_tile_is_noop() {
        let mut map = floor_map();
        assert!(map.remove_tile(GridPos::new(99, 99)).is_none());
        assert_eq!(map.len(), 10);
        assert!(map.remove_tile(GridPos::new(0, 5)).is_some());
        assert_eq!(map.len(), 9);
    }

    #[test]
    fn offgrid_add_remove_by_value() {
        let mut map = Tilemap::new(16);
        map.add_offgrid(TileKind::Grass, 1, Vec2::new(10.5, 20.0));
        map.add_offgrid(TileKind::Stone, 0, Vec2::new(40.0, 0.0));
        let target = OffgridTile { kind: TileKind::Grass, variant: 1, pos: Vec2::new(10.5, 20.0) };
        assert!(map.remove_offgrid(&target));
        assert!(!map.remove_offgrid(&target));
        assert_eq!(map.offgrid().len(), 1);
    }

    #[test]
    fn offgrid_hit_test() {
        let mut map = Tilemap::new(16);
        map.add_offgrid(TileKind::Grass, 0, Vec2::new(100.0, 100.0));
        assert_eq!(map.offgrid_at(108.0, 108.0).len(), 1);
        assert!(map.offgrid_at(90.0, 108.0).is_empty());
    }

    #[test]
    fn offgrid_never_collides() {
        let mut map = Tilemap::new(16);
        map.add_offgrid(TileKind::Stone, 0, Vec2::new(0.0, 0.0));
        assert!(map.physics_rects().is_empty());
        assert!(map.physics_rects_near(Rect::new(0, 0, 16, 16)).is_empty());
    }

    #[test]
    fn physics_rects_are_tile_sized() {
        let map = floor_map();
        let rects = map.physics_rects();
        assert_eq!(rects.len(), 10);
        assert_eq!(rects[0], (Rect::new(0, 80, 16, 16), TileKind::Stone));
    }

    #[test]
    fn windowed_query_matches_full_query_locally() {
        let map = floor_map();
        let area = Rect::new(20, 60, 16, 28);
        let near = map.physics_rects_near(area);
        let all = map.physics_rects();
        // Every solid rect overlapping the area is found by both
        for r in all.iter().filter(|(r, _)| r.overlaps(&area.inflate(16, 16))) {
            assert!(near.contains(r));
        }
        // Far-away tiles are skipped
        assert!(near.len() < all.len());
    }

    #[test]
    fn window_handles_negative_coordinates() {
        let mut map = Tilemap::new(16);
        map.set_tile(TileKind::Grass, 0, GridPos::new(-1, -1));
        let near = map.physics_rects_near(Rect::new(-10, -10, 4, 4));
        assert_eq!(near, vec![(Rect::new(-16, -16, 16, 16), TileKind::Grass)]);
    }

    #[test]
    fn bounds_cover_all_tiles() {
        let mut map = floor_map();
        map.set_tile(TileKind::Ice, 0, GridPos::new(-2, 9));
        assert_eq!(map.bounds(), Some((GridPos::new(-2, 5), GridPos::new(9, 9))));
        assert_eq!(Tilemap::new(16).bounds(), None);
    }

    #[test]
    fn level_file_round_trip() {
        let mut map = Tilemap::new(24);
        map.set_tile(TileKind::Grass, 2, GridPos::new(3, 4));
        map.set_tile(TileKind::WinTiles, 0, GridPos::new(-1, 0));
        map.add_offgrid(TileKind::PlainSnow, 1, Vec2::new(12.5, 7.25));

        let back = Tilemap::from_level_file(map.to_level_file()).unwrap();
        assert_eq!(back.tile_size(), 24);
        assert_eq!(back.len(), 2);
        assert_eq!(
            back.tile_at(GridPos::new(3, 4)),
            Some(&Tile { kind: TileKind::Grass, variant: 2, pos: GridPos::new(3, 4) })
        );
        assert_eq!(back.offgrid(), map.offgrid());
    }

    #[test]
    fn key_mismatch_is_rejected() {
        let mut file = Tilemap::new(16).to_level_file();
        file.tilemap.insert("1;1".into(), TileRecord {
            kind: TileKind::Stone,
            variant: 0,
            pos: [2, 1],
        });
        assert!(matches!(
            Tilemap::from_level_file(file),
            Err(LevelError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn zero_tile_size_is_rejected() {
        let mut file = Tilemap::new(16).to_level_file();
        file.tile_size = 0;
        assert!(matches!(Tilemap::from_level_file(file), Err(LevelError::ZeroTileSize)));
    }
}
