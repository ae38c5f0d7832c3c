/// Level files on disk.
///
/// ## File format:
///   JSON, one object per level:
///   ```text
///   { "tilemap":  { "x;y": { "type": "grass", "variant": 0, "pos": [x, y] }, ... },
///     "tile_size": 16,
///     "offgrid":  [ { "type": "Castle-blue", "variant": 1, "pos": [12.5, 40.0] }, ... ] }
///   ```
///
/// Writes go to `<name>.tmp` first and are renamed over the target, so a
/// crash mid-save never leaves a truncated level behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::tilemap::{LevelFile, Tilemap, DEFAULT_TILE_SIZE};
use crate::error::LevelError;

// ══════════════════════════════════════════════════════════════
// Load
// ══════════════════════════════════════════════════════════════

pub fn load_level_file(path: &Path) -> Result<Tilemap, LevelError> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LevelError::NotFound { path: path.to_path_buf() }
        } else {
            LevelError::Io { path: path.to_path_buf(), source }
        }
    })?;
    let file: LevelFile = serde_json::from_str(&text)
        .map_err(|source| LevelError::Parse { path: path.to_path_buf(), source })?;
    let map = Tilemap::from_level_file(file)?;
    debug!(path = %path.display(), tiles = map.len(), "level_file_loaded");
    Ok(map)
}

#[allow(dead_code)]
/// Like `load_level_file`, but a missing file is an empty map.
/// Any other failure is still reported.
pub fn load_or_empty(path: &Path) -> Result<Tilemap, LevelError> {
    match load_level_file(path) {
        Err(LevelError::NotFound { .. }) => Ok(Tilemap::new(DEFAULT_TILE_SIZE)),
        other => other,
    }
}

// ══════════════════════════════════════════════════════════════
// Save
// ══════════════════════════════════════════════════════════════

#[allow(dead_code)]
pub fn save_level_file(path: &Path, map: &Tilemap) -> Result<(), LevelError> {
    let io_err = |source| LevelError::Io { path: path.to_path_buf(), source };
    let json = serde_json::to_string(&map.to_level_file())
        .map_err(|source| LevelError::Parse { path: path.to_path_buf(), source })?;
    write_text_atomic(path, &json).map_err(io_err)?;
    info!(path = %path.display(), tiles = map.len(), "level_file_saved");
    Ok(())
}

#[allow(dead_code)]
fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, text)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("level.json");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geom::Vec2;
    use crate::domain::tile::TileKind;
    use crate::domain::tilemap::GridPos;
    use tempfile::TempDir;

    fn sample() -> Tilemap {
        let mut map = Tilemap::new(16);
        map.set_tile(TileKind::Grass, 2, GridPos::new(3, 4));
        map.set_tile(TileKind::Ice, 0, GridPos::new(-1, 7));
        map.add_offgrid(TileKind::CastleBlue, 1, Vec2::new(12.5, 40.0));
        map
    }

    #[test]
    fn saved_level_loads_back() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("levels").join("Winter Wilds.json");
        let map = sample();
        save_level_file(&path, &map).unwrap();

        let loaded = load_level_file(&path).unwrap();
        assert_eq!(loaded.tile_size(), 16);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.tile_at(GridPos::new(3, 4)).map(|t| (t.kind, t.variant)), Some((TileKind::Grass, 2)));
        assert_eq!(loaded.offgrid(), map.offgrid());
        assert!(!temp.path().join("levels").join("Winter Wilds.json.tmp").exists());
    }

    #[test]
    fn save_overwrites_existing_file() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("map.json");
        save_level_file(&path, &sample()).unwrap();
        save_level_file(&path, &Tilemap::new(24)).unwrap();
        let loaded = load_level_file(&path).unwrap();
        assert_eq!(loaded.tile_size(), 24);
        assert!(loaded.is_empty());
    }

    #[test]
    fn missing_file_is_not_found() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("nope.json");
        assert!(matches!(load_level_file(&path), Err(LevelError::NotFound { .. })));
        let empty = load_or_empty(&path).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.tile_size(), DEFAULT_TILE_SIZE);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("bad.json");
        fs::write(&path, "{ \"tilemap\": [1, 2").unwrap();
        assert!(matches!(load_level_file(&path), Err(LevelError::Parse { .. })));
        assert!(matches!(load_or_empty(&path), Err(LevelError::Parse { .. })));
    }

    #[test]
    fn unknown_tile_type_fails_the_load() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("odd.json");
        fs::write(
            &path,
            r#"{"tilemap": {"0;0": {"type": "lava", "variant": 0, "pos": [0, 0]}}, "tile_size": 16, "offgrid": []}"#,
        )
        .unwrap();
        assert!(load_level_file(&path).is_err());
    }

    #[test]
    fn mismatched_key_fails_the_load() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("skew.json");
        fs::write(
            &path,
            r#"{"tilemap": {"1;0": {"type": "grass", "variant": 0, "pos": [0, 0]}}, "tile_size": 16, "offgrid": []}"#,
        )
        .unwrap();
        assert!(matches!(load_level_file(&path), Err(LevelError::KeyMismatch { .. })));
    }

    #[test]
    fn zero_tile_size_fails_the_load() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("flat.json");
        fs::write(
            &path,
            r#"{"tilemap": {"0;0": {"type": "stone", "variant": 0, "pos": [0, 0]}}, "tile_size": 0, "offgrid": []}"#,
        )
        .unwrap();
        assert!(matches!(load_level_file(&path), Err(LevelError::ZeroTileSize)));
        assert!(matches!(load_or_empty(&path), Err(LevelError::ZeroTileSize)));
    }
}
