/// Level catalogue and loader.
///
/// ## Sources (in menu order):
///   1. Built-in tutorial (embedded ASCII map, always available)
///   2. Campaign levels, read from `<levels_dir>/<name>.json`
///
/// A campaign level whose file is missing falls back to the tutorial so
/// the menu never dead-ends; a file that exists but fails to parse is
/// reported instead.
///
/// ## Tile legend (embedded maps):
///   '#' = Grass          '=' = Stone           'I' = Ice
///   'S' = Deep snow      '*' = Plain snow      'W' = Win tiles
///   'C' = Castle blue    'E' = Evil purple     'U' = Purple grass
///   'G' = Emerald green  'D' = Diamond blue    'Y' = Pyramid yellow
///   'P' = Player spawn   ' ' = Empty

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::GameConfig;
use crate::domain::geom::Vec2;
use crate::domain::tile::TileKind;
use crate::domain::tilemap::{GridPos, Tilemap, DEFAULT_TILE_SIZE};
use crate::error::LevelError;
use super::save::load_level_file;
use super::step::restart_level;
use super::world::WorldState;

pub const CAMPAIGN: [&str; 3] = ["Galactic Tower", "Winter Wilds", "Corrupted Fields"];

pub const TUTORIAL_NAME: &str = "Tutorial";

const TUTORIAL: &[&str] = &[
    "=                                      =",
    "=                                      =",
    "=                                      =",
    "=                             WWWWWW   =",
    "=                                      =",
    "=                                      =",
    "=                     #####            =",
    "=                                      =",
    "=                                      =",
    "=            IIIIIIII                  =",
    "=                                      =",
    "=                                      =",
    "=      ####                 SSSS       =",
    "=                                      =",
    "=  P                                   =",
    "=============****=======================",
];

pub enum LevelSource {
    Embedded(&'static [&'static str]),
    File(PathBuf),
}

pub struct LevelDef {
    pub name: String,
    pub source: LevelSource,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Every selectable level, tutorial first.
pub fn catalogue(config: &GameConfig) -> Vec<LevelDef> {
    let mut levels = vec![LevelDef {
        name: TUTORIAL_NAME.to_string(),
        source: LevelSource::Embedded(TUTORIAL),
    }];
    levels.extend(CAMPAIGN.iter().map(|name| LevelDef {
        name: name.to_string(),
        source: LevelSource::File(config.levels_dir.join(format!("{name}.json"))),
    }));
    levels
}

pub fn level_names(config: &GameConfig) -> Vec<String> {
    catalogue(config).into_iter().map(|l| l.name).collect()
}

/// Load level `idx` of the catalogue into the world and start playing it.
pub fn load_level(world: &mut WorldState, idx: usize, config: &GameConfig) -> Result<(), LevelError> {
    let levels = catalogue(config);
    let Some(def) = levels.get(idx) else {
        return Err(LevelError::NoSuchLevel(idx));
    };

    let start = Vec2::new(config.player.start.0, config.player.start.1);
    // Scores are filed under the map actually played.
    let (map, spawn, name, note) = match &def.source {
        LevelSource::Embedded(rows) => {
            let (map, spawn) = embedded_map(rows, config);
            (map, spawn, def.name.as_str(), None)
        }
        LevelSource::File(path) => match load_level_file(path) {
            Ok(map) => (map, start, def.name.as_str(), None),
            Err(LevelError::NotFound { path }) => {
                warn!(level = %def.name, path = %path.display(), "level_file_missing; using tutorial");
                let (map, spawn) = embedded_map(TUTORIAL, config);
                (map, spawn, TUTORIAL_NAME, Some("level file missing - playing the tutorial map"))
            }
            Err(e) => return Err(e),
        },
    };

    world.tilemap = map;
    world.spawn = spawn;
    world.level_name = name.to_string();
    world.select_cursor = idx;
    restart_level(world);
    world.set_message(note.unwrap_or(name), 120);
    info!(level = %name, tiles = world.tilemap.len(), "level_loaded");
    Ok(())
}

/// Parse a tile diagram. Unknown characters are empty space.
/// Returns the map and the cell marked `P`, if any.
pub fn parse_ascii(rows: &[&str], tile_size: u32) -> (Tilemap, Option<GridPos>) {
    let mut map = Tilemap::new(tile_size);
    let mut spawn = None;
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let pos = GridPos::new(x as i32, y as i32);
            let kind = match ch {
                '#' => TileKind::Grass,
                '=' => TileKind::Stone,
                'I' => TileKind::Ice,
                'S' => TileKind::GrassThickSnow,
                '*' => TileKind::PlainSnow,
                'W' => TileKind::WinTiles,
                'C' => TileKind::CastleBlue,
                'E' => TileKind::EvilPurple,
                'U' => TileKind::GrassPurple,
                'G' => TileKind::EmeraldGreen,
                'D' => TileKind::DiamondBlue,
                'Y' => TileKind::PyramidYellow,
                'P' => {
                    spawn = Some(pos);
                    continue;
                }
                _ => continue,
            };
            map.set_tile(kind, 0, pos);
        }
    }
    (map, spawn)
}

/// Top-left pixel that stands a body of `size` on the bottom of `cell`.
pub fn spawn_point(cell: GridPos, tile_size: u32, size: (i32, i32)) -> Vec2 {
    let ts = tile_size as i32;
    Vec2::new((cell.x * ts) as f64, ((cell.y + 1) * ts - size.1) as f64)
}

fn embedded_map(rows: &[&str], config: &GameConfig) -> (Tilemap, Vec2) {
    let (map, cell) = parse_ascii(rows, DEFAULT_TILE_SIZE);
    let spawn = match cell {
        Some(cell) => spawn_point(cell, map.tile_size(), config.player.size),
        None => Vec2::new(config.player.start.0, config.player.start.1),
    };
    (map, spawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::animation::AnimationLibrary;
    use crate::sim::save::save_level_file;
    use crate::sim::world::Phase;
    use tempfile::TempDir;

    fn config_in(dir: &std::path::Path) -> GameConfig {
        let mut config = GameConfig::default();
        config.levels_dir = dir.to_path_buf();
        config
    }

    fn world(config: &GameConfig) -> WorldState {
        WorldState::new(config, AnimationLibrary::builtin().unwrap())
    }

    #[test]
    fn legend_maps_to_tiles() {
        let (map, spawn) = parse_ascii(&["P I", "=SW"], 16);
        assert_eq!(spawn, Some(GridPos::new(0, 0)));
        assert_eq!(map.len(), 4);
        assert_eq!(map.tile_at(GridPos::new(2, 0)).map(|t| t.kind), Some(TileKind::Ice));
        assert_eq!(map.tile_at(GridPos::new(1, 1)).map(|t| t.kind), Some(TileKind::GrassThickSnow));
        assert_eq!(map.tile_at(GridPos::new(2, 1)).map(|t| t.kind), Some(TileKind::WinTiles));
        assert!(map.tile_at(GridPos::new(0, 0)).is_none());
    }

    #[test]
    fn spawn_stands_on_cell_bottom() {
        let p = spawn_point(GridPos::new(3, 14), 16, (16, 28));
        assert_eq!(p, Vec2::new(48.0, 212.0));
    }

    #[test]
    fn tutorial_is_well_formed() {
        let width = TUTORIAL[0].len();
        assert!(TUTORIAL.iter().all(|r| r.len() == width));
        let (map, spawn) = parse_ascii(TUTORIAL, 16);
        assert!(spawn.is_some());
        assert!(map.tiles().any(|t| t.kind == TileKind::WinTiles));
    }

    #[test]
    fn catalogue_lists_tutorial_then_campaign() {
        let config = GameConfig::default();
        assert_eq!(
            level_names(&config),
            vec!["Tutorial", "Galactic Tower", "Winter Wilds", "Corrupted Fields"]
        );
    }

    #[test]
    fn campaign_level_loads_from_levels_dir() {
        let temp = TempDir::new().expect("tempdir");
        let config = config_in(temp.path());
        let mut map = Tilemap::new(16);
        map.set_tile(TileKind::Ice, 0, GridPos::new(0, 15));
        save_level_file(&temp.path().join("Winter Wilds.json"), &map).unwrap();

        let mut w = world(&config);
        load_level(&mut w, 2, &config).unwrap();
        assert_eq!(w.level_name, "Winter Wilds");
        assert_eq!(w.tilemap.len(), 1);
        assert_eq!(w.player.position(), Vec2::new(1.0, 200.0));
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn missing_campaign_file_falls_back_to_tutorial() {
        let temp = TempDir::new().expect("tempdir");
        let config = config_in(temp.path());
        let mut w = world(&config);
        load_level(&mut w, 1, &config).unwrap();
        assert_eq!(w.level_name, TUTORIAL_NAME);
        assert_eq!(w.select_cursor, 1);
        assert_eq!(w.tilemap.len(), parse_ascii(TUTORIAL, 16).0.len());
        assert!(w.message.contains("tutorial"));
    }

    #[test]
    fn broken_campaign_file_is_reported() {
        let temp = TempDir::new().expect("tempdir");
        let config = config_in(temp.path());
        std::fs::write(temp.path().join("Corrupted Fields.json"), "not json").unwrap();
        let mut w = world(&config);
        assert!(matches!(load_level(&mut w, 3, &config), Err(LevelError::Parse { .. })));
        assert_eq!(w.phase, Phase::LevelSelect);
    }

    #[test]
    fn index_past_catalogue_is_an_error() {
        let config = GameConfig::default();
        let mut w = world(&config);
        assert!(matches!(load_level(&mut w, 9, &config), Err(LevelError::NoSuchLevel(9))));
    }
}
