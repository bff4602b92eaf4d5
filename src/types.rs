//! Shared data model for the batch analyzer.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// One position waiting to be analyzed, as loaded from the input list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Stable position identifier, unique within the input list.
    pub id: u32,
    /// Position description in FEN notation.
    pub fen: String,
}

/// A single ranked principal variation retained for a position.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PvLine {
    /// Space-separated move sequence in UCI notation.
    pub moves: String,
    /// Evaluation in pawns from the side to move. Mate scores are
    /// saturated to +-9999.
    pub eval: f64,
    /// Moves to mate when the engine reports a forced mate.
    #[serde(default)]
    pub mate: Option<i32>,
}

// Mate sentinels persist as the integer 9999/-9999; centipawn scores keep
// their fractional pawn value.
impl Serialize for PvLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PvLine", 3)?;
        state.serialize_field("moves", &self.moves)?;
        match self.mate {
            Some(_) => state.serialize_field("eval", &(self.eval as i64))?,
            None => state.serialize_field("eval", &self.eval)?,
        }
        state.serialize_field("mate", &self.mate)?;
        state.end()
    }
}

/// Completed analysis for one position. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionEval {
    /// The analyzed position.
    pub fen: String,
    /// Maximum search depth observed across all ranks.
    pub depth: u32,
    /// Principal variations in rank order, at most MultiPV entries.
    pub pvs: Vec<PvLine>,
    /// When the analysis finished.
    pub analyzed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_eval_serializes_camel_case() {
        let eval = PositionEval {
            fen: "startpos".to_string(),
            depth: 30,
            pvs: vec![PvLine {
                moves: "e2e4 e7e5".to_string(),
                eval: 0.35,
                mate: None,
            }],
            analyzed_at: Utc::now(),
        };

        let json = serde_json::to_string(&eval).expect("serialize");
        assert!(json.contains("\"analyzedAt\""));
        assert!(json.contains("\"pvs\""));
        assert!(json.contains("\"mate\":null"));
    }

    #[test]
    fn test_mate_eval_serializes_as_integer() {
        let pv = PvLine {
            moves: "d2d4".to_string(),
            eval: -9999.0,
            mate: Some(-4),
        };
        let json = serde_json::to_string(&pv).expect("serialize");
        assert!(json.contains("\"eval\":-9999,"), "got {json}");
        assert!(json.contains("\"mate\":-4"));
    }

    #[test]
    fn test_centipawn_eval_serializes_fractional() {
        let pv = PvLine {
            moves: "e2e4".to_string(),
            eval: 0.35,
            mate: None,
        };
        let json = serde_json::to_string(&pv).expect("serialize");
        assert!(json.contains("\"eval\":0.35"));
    }

    #[test]
    fn test_pv_line_mate_defaults_to_none() {
        let pv: PvLine =
            serde_json::from_str(r#"{"moves":"d2d4","eval":9999.0}"#).expect("deserialize");
        assert_eq!(pv.mate, None);
    }
}
