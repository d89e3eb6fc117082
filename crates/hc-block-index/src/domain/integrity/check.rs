//! Genesis-to-head integrity scan.
//!
//! The scan is single-pass and strictly upward: a level is checked against
//! the already-corrected level below it, so a repair at level `n` is visible
//! when level `n + 1` is recomputed.

use crate::domain::entities::{BlockInfo, IntegrityCheckResult, IntegrityReport};
use crate::domain::errors::IndexError;
use shared_types::{Hash, U256};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// The two header fields the scan needs to relink a record to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLink {
    pub parent_hash: Hash,
    pub difficulty: U256,
}

/// Read access to the persisted index, as seen by the integrity scan.
pub trait LevelSource {
    /// Level record, `None` if no record exists.
    fn level(&self, number: u64) -> Result<Option<Vec<BlockInfo>>, IndexError>;

    /// Parent linkage of a stored header, `None` if the header is unknown.
    fn header_link(&self, hash: &Hash) -> Result<Option<HeaderLink>, IndexError>;
}

/// Result of a scan plus the records that must be written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityOutcome {
    pub result: IntegrityCheckResult,
    pub report: IntegrityReport,
    /// Levels whose content changed, in their corrected form.
    pub repaired: BTreeMap<u64, Vec<BlockInfo>>,
    /// Head the main-chain flags now lead to.
    pub head: Option<Hash>,
}

impl IntegrityOutcome {
    fn unrecoverable(result: IntegrityCheckResult, mut report: IntegrityReport, level: u64) -> Self {
        report.failed_level = Some(level);
        Self {
            result,
            report,
            repaired: BTreeMap::new(),
            head: None,
        }
    }
}

/// Scan `size` levels of `source`.
///
/// `stored_best` is the persisted best-block hash; among records sharing the
/// greatest cumulative difficulty it is kept as head, otherwise the lowest
/// level and then the earliest position in the level wins.
pub fn check_integrity<S: LevelSource>(
    source: &S,
    size: u64,
    stored_best: Option<Hash>,
) -> Result<IntegrityOutcome, IndexError> {
    let mut report = IntegrityReport::new();

    let genesis_level = match source.level(0)? {
        Some(infos) if !infos.is_empty() => infos,
        _ => {
            warn!("[hc-index] Integrity check: genesis level is missing");
            return Ok(IntegrityOutcome::unrecoverable(
                IntegrityCheckResult::MissingGenesis,
                report,
                0,
            ));
        }
    };

    let mut levels: Vec<Vec<BlockInfo>> = Vec::with_capacity(size.max(1) as usize);
    // parents[n][i] is the position of the parent of levels[n][i] in levels[n - 1].
    let mut parents: Vec<Vec<usize>> = Vec::with_capacity(size.max(1) as usize);
    let mut dirty: Vec<bool> = Vec::with_capacity(size.max(1) as usize);

    // Genesis: cumulative difficulty equals own difficulty.
    let mut genesis_level = genesis_level;
    let mut genesis_dirty = false;
    for info in genesis_level.iter_mut() {
        let link = match source.header_link(&info.hash)? {
            Some(link) => link,
            None => {
                warn!("[hc-index] Integrity check: genesis header is missing");
                return Ok(IntegrityOutcome::unrecoverable(
                    IntegrityCheckResult::MissingGenesis,
                    report,
                    0,
                ));
            }
        };
        if info.cumulative_difficulty != link.difficulty {
            warn!(
                "[hc-index] Repaired cumulative difficulty at level 0: {} -> {}",
                info.cumulative_difficulty, link.difficulty
            );
            info.cumulative_difficulty = link.difficulty;
            report.difficulties_repaired += 1;
            genesis_dirty = true;
        }
    }
    parents.push(vec![0; genesis_level.len()]);
    levels.push(genesis_level);
    dirty.push(genesis_dirty);
    report.levels_scanned = 1;

    for number in 1..size {
        let mut infos = match source.level(number)? {
            Some(infos) if !infos.is_empty() => infos,
            _ => {
                warn!("[hc-index] Integrity check: level {} is missing", number);
                return Ok(IntegrityOutcome::unrecoverable(
                    IntegrityCheckResult::MissingLevel,
                    report,
                    number,
                ));
            }
        };

        let below = &levels[(number - 1) as usize];
        let mut level_parents = Vec::with_capacity(infos.len());
        let mut level_dirty = false;

        for info in infos.iter_mut() {
            let parent_pos = match source.header_link(&info.hash)? {
                Some(link) => below
                    .iter()
                    .position(|p| p.hash == link.parent_hash)
                    .map(|pos| (pos, link.difficulty)),
                None => None,
            };
            let (pos, difficulty) = match parent_pos {
                Some(found) => found,
                None => {
                    warn!(
                        "[hc-index] Integrity check: block {:02x?} at level {} cannot be linked to its parent",
                        &info.hash[..4],
                        number
                    );
                    return Ok(IntegrityOutcome::unrecoverable(
                        IntegrityCheckResult::MissingLevel,
                        report,
                        number,
                    ));
                }
            };

            let expected = below[pos].cumulative_difficulty.saturating_add(difficulty);
            if info.cumulative_difficulty != expected {
                warn!(
                    "[hc-index] Repaired cumulative difficulty at level {}: {} -> {}",
                    number, info.cumulative_difficulty, expected
                );
                info.cumulative_difficulty = expected;
                report.difficulties_repaired += 1;
                level_dirty = true;
            }
            level_parents.push(pos);
        }

        levels.push(infos);
        parents.push(level_parents);
        dirty.push(level_dirty);
        report.levels_scanned += 1;
    }

    let (head_level, head_pos) = select_head(&levels, stored_best);
    let head = levels[head_level][head_pos].hash;

    // Expected flags: exactly the ancestry of the head.
    let mut on_chain: Vec<Option<usize>> = vec![None; levels.len()];
    let mut pos = head_pos;
    for level in (0..=head_level).rev() {
        on_chain[level] = Some(pos);
        pos = parents[level][pos];
    }

    for (level, infos) in levels.iter_mut().enumerate() {
        for (i, info) in infos.iter_mut().enumerate() {
            let expected = on_chain[level] == Some(i);
            if info.is_main_chain != expected {
                debug!(
                    "[hc-index] Repaired main-chain flag at level {}: {} -> {}",
                    level, info.is_main_chain, expected
                );
                info.is_main_chain = expected;
                report.flags_repaired += 1;
                dirty[level] = true;
            }
        }
    }

    report.head = Some(head);

    let repaired: BTreeMap<u64, Vec<BlockInfo>> = levels
        .into_iter()
        .enumerate()
        .filter(|(level, _)| dirty[*level])
        .map(|(level, infos)| (level as u64, infos))
        .collect();

    let result = if report.has_repairs() || stored_best != Some(head) {
        IntegrityCheckResult::Fixed
    } else {
        IntegrityCheckResult::Correct
    };

    Ok(IntegrityOutcome {
        result,
        report,
        repaired,
        head: Some(head),
    })
}

/// Position of the head among all scanned records.
fn select_head(levels: &[Vec<BlockInfo>], stored_best: Option<Hash>) -> (usize, usize) {
    let mut best = (0usize, 0usize);
    let mut best_difficulty = U256::zero();
    let mut found = false;

    for (level, infos) in levels.iter().enumerate() {
        for (i, info) in infos.iter().enumerate() {
            if !found || info.cumulative_difficulty > best_difficulty {
                best = (level, i);
                best_difficulty = info.cumulative_difficulty;
                found = true;
            }
        }
    }

    if let Some(stored) = stored_best {
        for (level, infos) in levels.iter().enumerate() {
            if let Some(i) = infos
                .iter()
                .position(|info| info.hash == stored && info.cumulative_difficulty == best_difficulty)
            {
                return (level, i);
            }
        }
    }

    best
}
