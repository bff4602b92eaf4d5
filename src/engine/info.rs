//! Parsing of UCI `info` output lines.
//!
//! Engine output mid-search is noisy: currmove updates, hashfull stats,
//! lines without a score. Parsing returns an explicit `Option` and callers
//! drop `None` lines without affecting session state.

use std::collections::BTreeMap;

use crate::types::PvLine;

/// Display sentinel for forced-mate scores.
const MATE_EVAL: f64 = 9999.0;

/// One parsed principal-variation info line.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoLine {
    /// Search depth the line was reported at.
    pub depth: u32,
    /// Variant rank (`multipv`), 1 when the engine omits it.
    pub multipv: u32,
    /// Evaluation in pawns, saturated to +-9999 for mates.
    pub eval: f64,
    /// Moves to mate, when the score was a mate count.
    pub mate: Option<i32>,
    /// Move sequence after the `pv` marker.
    pub moves: String,
}

impl InfoLine {
    fn into_pv(self) -> PvLine {
        PvLine {
            moves: self.moves,
            eval: self.eval,
            mate: self.mate,
        }
    }
}

/// Returns the token following `key`, if present.
fn field<'a>(tokens: &'a [&'a str], key: &str) -> Option<&'a str> {
    tokens
        .iter()
        .position(|t| *t == key)
        .and_then(|idx| tokens.get(idx + 1))
        .copied()
}

/// Parse a single engine output line into an [`InfoLine`].
///
/// Only lines carrying a `depth` field, a `pv` marker, and a score are of
/// interest; everything else yields `None`.
pub fn parse_info(line: &str) -> Option<InfoLine> {
    if !line.starts_with("info ") {
        return None;
    }

    let pv_start = line.find(" pv ")?;
    let moves = line[pv_start + 4..].trim().to_string();
    if moves.is_empty() {
        return None;
    }

    let tokens: Vec<&str> = line[..pv_start].split_whitespace().collect();
    let depth: u32 = field(&tokens, "depth")?.parse().ok()?;
    let multipv: u32 = match field(&tokens, "multipv") {
        Some(raw) => raw.parse().ok()?,
        None => 1,
    };

    if let Some(raw) = field(&tokens, "cp") {
        let cp: i32 = raw.parse().ok()?;
        return Some(InfoLine {
            depth,
            multipv,
            eval: f64::from(cp) / 100.0,
            mate: None,
            moves,
        });
    }

    if let Some(raw) = field(&tokens, "mate") {
        let mate: i32 = raw.parse().ok()?;
        let eval = if mate > 0 { MATE_EVAL } else { -MATE_EVAL };
        return Some(InfoLine {
            depth,
            multipv,
            eval,
            mate: Some(mate),
            moves,
        });
    }

    // Bound-only or score-less line: not a usable variant.
    None
}

/// Accumulates info lines for one search, keeping the deepest line per rank.
#[derive(Debug, Default)]
pub struct PvCollector {
    retained: BTreeMap<u32, InfoLine>,
    max_depth: u32,
}

impl PvCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one parsed line, replacing the retained line for its rank
    /// when the new depth is at least as high. Ties keep the newest line.
    pub fn observe(&mut self, info: InfoLine) {
        self.max_depth = self.max_depth.max(info.depth);
        match self.retained.get(&info.multipv) {
            Some(prev) if prev.depth > info.depth => {}
            _ => {
                self.retained.insert(info.multipv, info);
            }
        }
    }

    /// Maximum depth observed across all ranks so far.
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Emit the retained variants for ranks `1..=k` in rank order, together
    /// with the final depth. Ranks never observed are omitted.
    pub fn finish(self, k: u32) -> (Vec<PvLine>, u32) {
        let depth = self.max_depth;
        let pvs = self
            .retained
            .into_iter()
            .filter(|(rank, _)| *rank >= 1 && *rank <= k)
            .map(|(_, info)| info.into_pv())
            .collect();
        (pvs, depth)
    }
}
