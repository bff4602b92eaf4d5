//! Loading of the position input list.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::types::WorkItem;

#[derive(Debug, Deserialize)]
struct PositionFile {
    positions: Vec<WorkItem>,
}

/// Load the ordered `{id, fen}` list from a `{ "positions": [...] }` document.
pub fn load_positions(path: &Path) -> Result<Vec<WorkItem>> {
    let content = fs::read_to_string(path)?;
    let file: PositionFile = serde_json::from_str(&content)?;
    Ok(file.positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_positions_preserves_order() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("positions.json");
        fs::write(
            &path,
            r#"{"positions":[{"id":518,"fen":"fen-a"},{"id":1,"fen":"fen-b"}]}"#,
        )
        .expect("write");

        let items = load_positions(&path).expect("load");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, 518);
        assert_eq!(items[1].fen, "fen-b");
    }

    #[test]
    fn test_load_positions_missing_file_is_error() {
        let dir = TempDir::new().expect("temp dir");
        assert!(load_positions(&dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_load_positions_malformed_json_is_error() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("positions.json");
        fs::write(&path, "[]").expect("write");
        assert!(load_positions(&path).is_err());
    }
}
