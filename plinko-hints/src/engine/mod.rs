//! The hint lifecycle state machine.
//!
//! One [`HintEngine`] owns every hint the client holds over a database of
//! `n` fixed-size entries split into `c = n / w` blocks of `w` entries.
//! Each block gets its own invertible PRF over the hint index space, so
//! that for any database coordinate the set of hints touching it can be
//! enumerated in one `inverse` call; both streaming construction and
//! online updates lean on that.
//!
//! The engine is single-writer: every method runs to completion, and
//! read-only snapshots ([`HintEngine::stats`], [`HintEngine::to_bytes`])
//! are safe between mutations.

pub mod persist;


use std::collections::{HashMap, HashSet};

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{debug, warn};

use plinko_crypto::iprf::Iprf;
use plinko_crypto::prf::PrfKey256;
use plinko_crypto::subset::SubsetGen;
use plinko_crypto::{kdf, pmns, subset};

use crate::hint::{BackupHint, BlockSet, Parity, PromotedHint, RegularHint};

#[derive(Debug, Error)]
/// Engine construction and initialization errors.
pub enum Error {
    /// The database must split evenly into non-empty blocks.
    #[error("invalid geometry: {entries} entries do not split into blocks of {block_size}")]
    InvalidGeometry { entries: u64, block_size: u32 },
    /// At least one hint is needed for the engine to be of any use.
    #[error("hint budget is empty (lambda = {lambda}, queries = {queries})")]
    EmptyHintBudget { lambda: u32, queries: u32 },
    /// Propagated from the multinomial sampler (block size must be a
    /// power of two).
    #[error(transparent)]
    Sampler(#[from] pmns::Error),
    /// Propagated from subset generation.
    #[error(transparent)]
    Subset(#[from] subset::Error),
}

/// Engine geometry and hint budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// Database size in entries (`n`); must be a multiple of
    /// `block_size`.
    pub entries: u64,
    /// Entries per block (`w`); must be a power of two.
    pub block_size: u32,
    /// Security parameter; the engine holds `lambda * block_size`
    /// regular hints.
    pub lambda: u32,
    /// Queries served before a refresh is due; the engine holds this
    /// many backup hints.
    pub queries: u32,
}

impl Params {
    /// Number of blocks (`c`).
    pub fn blocks(&self) -> u32 {
        (self.entries / u64::from(self.block_size)) as u32
    }

    /// Number of regular hints.
    pub fn num_regular(&self) -> usize {
        self.lambda as usize * self.block_size as usize
    }

    /// Number of backup hints.
    pub fn num_backup(&self) -> usize {
        self.queries as usize
    }

    /// Size of the hint index space each per-block iPRF maps onto block
    /// offsets.
    pub fn hint_domain(&self) -> u64 {
        (self.num_regular() + self.num_backup()) as u64
    }
}

/// Everything a client needs to turn one hint into one private query.
#[derive(Debug, Clone)]
pub struct HintPlan {
    /// Index of the hint backing this plan; feed it back into
    /// [`HintEngine::consume_hint`] once the query completes.
    pub hint_index: usize,
    /// Blocks the hint covers.
    pub blocks: BlockSet,
    /// Per-block offsets, indexed by block number (length `c`; entries
    /// for uncovered blocks are padding).
    pub offsets: Vec<u32>,
    /// The hint's parity at planning time.
    pub parity: Parity,
    /// Whether the plan is backed by a promoted hint.
    pub promoted: bool,
}

/// Read-only snapshot of the hint inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintStats {
    /// Regular hints the engine was built with.
    pub total_regular: usize,
    /// Regular hints not yet consumed.
    pub available_regular: usize,
    /// Regular hints consumed so far.
    pub consumed_regular: usize,
    /// Backup hints the engine was built with.
    pub total_backup: usize,
    /// Promoted hints currently live.
    pub available_promoted: usize,
    /// Backups still waiting for promotion.
    pub remaining_backup: usize,
    /// Completed queries held in the cache.
    pub cached_queries: usize,
    /// Queries the engine can still answer before the client must
    /// refresh its hints.
    pub queries_before_refresh: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CachedQuery {
    value: Parity,
    hint_index: usize,
}

/// The hint state machine. See the crate docs for the lifecycle.
#[derive(Clone)]
pub struct HintEngine {
    params: Params,
    /// One iPRF per block, indexed by block number.
    iprfs: Vec<Iprf>,
    subsets: SubsetGen,
    regular: Vec<Option<RegularHint>>,
    backup: Vec<Option<BackupHint>>,
    promoted: Vec<Option<PromotedHint>>,
    next_backup: usize,
    consumed: HashSet<usize>,
    cache: HashMap<u64, CachedQuery>,
    /// Query index -> promoted slot born from it. A promoted hint covers
    /// its own query index at an overridden offset that preimage
    /// enumeration cannot see, so updates there need a direct route.
    promotions: HashMap<u64, usize>,
}

impl HintEngine {
    /// Build an empty engine: iPRFs and the subset generator are derived
    /// from the master key, hint slots stay vacant until
    /// [`HintEngine::initialize_hints`].
    pub fn new(params: Params, master_key: &PrfKey256) -> Result<Self, Error> {
        if params.entries == 0
            || params.block_size == 0
            || params.entries % u64::from(params.block_size) != 0
        {
            return Err(Error::InvalidGeometry {
                entries: params.entries,
                block_size: params.block_size,
            });
        }
        if params.hint_domain() == 0 {
            return Err(Error::EmptyHintBudget {
                lambda: params.lambda,
                queries: params.queries,
            });
        }

        let blocks = params.blocks();
        let mut iprfs = Vec::with_capacity(blocks as usize);
        for block in 0..blocks {
            let key = kdf::derive_block_key(master_key, block);
            iprfs.push(Iprf::new(
                &key,
                params.hint_domain(),
                u64::from(params.block_size),
            )?);
        }

        Ok(Self {
            params,
            iprfs,
            subsets: SubsetGen::new(&kdf::master_half(master_key)),
            regular: vec![None; params.num_regular()],
            backup: vec![None; params.num_backup()],
            promoted: vec![None; params.num_backup()],
            next_backup: 0,
            consumed: HashSet::new(),
            cache: HashMap::new(),
            promotions: HashMap::new(),
        })
    }

    /// The geometry the engine was built with.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Draw every hint's block subset and zero its parities.
    ///
    /// Regular hint `j` gets `c/2 + 1` blocks from seed `j`; backup `k`
    /// gets `c/2` blocks from seed `num_regular + k`. Seeds are stable,
    /// so a restored engine regenerates identical subsets.
    pub fn initialize_hints(&mut self) -> Result<(), Error> {
        let blocks = self.params.blocks();
        let regular_size = blocks / 2 + 1;
        let backup_size = blocks / 2;
        let num_regular = self.regular.len();

        for j in 0..num_regular {
            let subset = self.subsets.generate(j as u64, regular_size, blocks)?;
            self.regular[j] = Some(RegularHint {
                blocks: subset,
                parity: Parity::ZERO,
            });
        }
        for k in 0..self.backup.len() {
            let subset =
                self.subsets
                    .generate((num_regular + k) as u64, backup_size, blocks)?;
            self.backup[k] = Some(BackupHint {
                blocks: subset,
                parity_in: Parity::ZERO,
                parity_out: Parity::ZERO,
            });
        }

        debug!(
            regular = num_regular,
            backup = self.backup.len(),
            "hint subsets initialized"
        );
        Ok(())
    }

    /// Fold one database entry into every hint that touches it.
    ///
    /// Meant to be called once per entry while streaming the database at
    /// build time. Out-of-range indices are skipped.
    pub fn process_entry(&mut self, index: u64, value: Parity) {
        let Some((block, offset)) = self.locate(index) else {
            return;
        };

        let num_regular = self.regular.len();
        for hint_index in self.iprfs[block as usize].inverse(u64::from(offset)) {
            let hint_index = hint_index as usize;
            if hint_index < num_regular {
                if let Some(hint) = self.regular[hint_index].as_mut() {
                    if hint.blocks.contains(&block) {
                        hint.parity ^= value;
                    }
                }
            } else if let Some(hint) = self.backup[hint_index - num_regular].as_mut() {
                if hint.blocks.contains(&block) {
                    hint.parity_in ^= value;
                } else {
                    hint.parity_out ^= value;
                }
            }
        }
    }

    /// Plan a private query for the entry at `(block, offset)`.
    ///
    /// Candidate hints are the preimages of `offset` under the block's
    /// iPRF, shuffled with fresh OS entropy on every call so the chosen
    /// hint index is independent of the enumeration order; repeated calls
    /// on the same coordinate may return different plans. `None` means no
    /// live hint covers the coordinate, a normal protocol event; the
    /// caller falls back or refreshes.
    ///
    /// # Panics
    ///
    /// Panics if `block` or `offset` is outside the database geometry.
    pub fn get_hint(&self, block: u32, offset: u32) -> Option<HintPlan> {
        assert!(
            block < self.params.blocks(),
            "block {block} outside database of {} blocks",
            self.params.blocks()
        );
        assert!(
            offset < self.params.block_size,
            "offset {offset} outside block of size {}",
            self.params.block_size
        );

        let mut candidates = self.iprfs[block as usize].inverse(u64::from(offset));
        candidates.shuffle(&mut OsRng);

        let num_regular = self.regular.len();

        for &candidate in &candidates {
            let hint_index = candidate as usize;
            if hint_index >= num_regular || self.consumed.contains(&hint_index) {
                continue;
            }
            let Some(hint) = self.regular[hint_index].as_ref() else {
                continue;
            };
            if !hint.blocks.contains(&block) {
                continue;
            }
            return Some(HintPlan {
                hint_index,
                blocks: hint.blocks.clone(),
                offsets: self.hint_offsets(candidate),
                parity: hint.parity,
                promoted: false,
            });
        }

        for &candidate in &candidates {
            let hint_index = candidate as usize;
            if hint_index < num_regular {
                continue;
            }
            let Some(hint) = self.promoted[hint_index - num_regular].as_ref() else {
                continue;
            };
            let pivot_block = (hint.query_index / u64::from(self.params.block_size)) as u32;
            let pivot_offset = (hint.query_index % u64::from(self.params.block_size)) as u32;
            if block == pivot_block {
                // only the pivot offset is valid in the pivot block; the
                // hint's natural offset there was replaced at promotion
                if offset != pivot_offset {
                    continue;
                }
            } else if !hint.blocks.contains(&block) {
                continue;
            }

            let mut offsets = self.hint_offsets(candidate);
            offsets[pivot_block as usize] = pivot_offset;
            let mut covered = hint.blocks.clone();
            covered.insert(pivot_block);

            return Some(HintPlan {
                hint_index,
                blocks: covered,
                offsets,
                parity: hint.parity,
                promoted: true,
            });
        }

        None
    }

    /// Record a completed query and retire the hint that served it.
    ///
    /// `value` is the plaintext entry recovered at `query_index`. If a
    /// regular hint was spent, the next backup in line is promoted into a
    /// query-specific hint; consuming a promoted hint only caches.
    ///
    /// # Panics
    ///
    /// Panics if `hint_index` or `query_index` is out of range.
    pub fn consume_hint(&mut self, hint_index: usize, query_index: u64, value: Parity) {
        let num_regular = self.regular.len();
        assert!(
            hint_index < num_regular + self.backup.len(),
            "hint index {hint_index} outside hint domain"
        );
        assert!(
            query_index < self.params.entries,
            "query index {query_index} outside database of {} entries",
            self.params.entries
        );

        self.cache.insert(query_index, CachedQuery { value, hint_index });

        if hint_index >= num_regular {
            // a promoted hint answered; it stays live for re-reads
            return;
        }

        self.consumed.insert(hint_index);

        if self.next_backup >= self.backup.len() {
            warn!("regular hint consumed with no backup left to promote");
            return;
        }
        let slot = self.next_backup;
        self.next_backup += 1;
        let Some(backup) = self.backup[slot].take() else {
            return;
        };

        let block = (query_index / u64::from(self.params.block_size)) as u32;
        let promoted = if backup.blocks.contains(&block) {
            // keep the half that excludes the query block; its parity is
            // untouched by the offset override at the pivot
            PromotedHint {
                blocks: self.complement(&backup.blocks),
                query_index,
                parity: backup.parity_out ^ value,
            }
        } else {
            PromotedHint {
                blocks: backup.blocks,
                query_index,
                parity: backup.parity_in ^ value,
            }
        };
        self.promoted[slot] = Some(promoted);
        self.promotions.insert(query_index, slot);

        debug!(slot, query_index, "backup hint promoted");
    }

    /// Apply an XOR delta at `index` to every hint covering it.
    ///
    /// Commutative with other updates and with the build stream;
    /// out-of-range indices are skipped. Cached query results stay valid:
    /// their owning hints absorb the delta, so the stored plaintext is
    /// untouched.
    pub fn update_hint(&mut self, index: u64, delta: Parity) {
        let Some((block, offset)) = self.locate(index) else {
            return;
        };

        let num_regular = self.regular.len();
        for hint_index in self.iprfs[block as usize].inverse(u64::from(offset)) {
            let hint_index = hint_index as usize;
            if hint_index < num_regular {
                if let Some(hint) = self.regular[hint_index].as_mut() {
                    if hint.blocks.contains(&block) {
                        hint.parity ^= delta;
                    }
                }
            } else {
                let slot = hint_index - num_regular;
                if let Some(hint) = self.promoted[slot].as_mut() {
                    if hint.blocks.contains(&block) {
                        hint.parity ^= delta;
                    }
                }
                if let Some(hint) = self.backup[slot].as_mut() {
                    if hint.blocks.contains(&block) {
                        hint.parity_in ^= delta;
                    } else {
                        hint.parity_out ^= delta;
                    }
                }
            }
        }

        // A promoted hint covers its own query index at an overridden
        // offset the preimage walk above cannot see; patch it directly.
        // The cached plaintext for that query stays untouched, which is
        // exactly what keeps it valid.
        if let Some(&slot) = self.promotions.get(&index) {
            if let Some(hint) = self.promoted[slot].as_mut() {
                if hint.query_index == index {
                    hint.parity ^= delta;
                }
            }
        }
    }

    /// Plaintext of a previously completed query, if any.
    ///
    /// Cached values stay correct across [`HintEngine::update_hint`]
    /// calls; they reflect the database at the time of the query.
    pub fn get_cached(&self, index: u64) -> Option<Parity> {
        self.cache.get(&index).map(|cached| cached.value)
    }

    /// Index of the hint that answered the cached query at `index`, if
    /// any. Lets the enclosing client correlate retries and telemetry
    /// with hint consumption.
    pub fn cached_owner(&self, index: u64) -> Option<usize> {
        self.cache.get(&index).map(|cached| cached.hint_index)
    }

    /// Snapshot of the hint inventory.
    pub fn stats(&self) -> HintStats {
        let available_promoted = self.promoted.iter().flatten().count();
        let available_regular = self.regular.len() - self.consumed.len();

        HintStats {
            total_regular: self.regular.len(),
            available_regular,
            consumed_regular: self.consumed.len(),
            total_backup: self.backup.len(),
            available_promoted,
            remaining_backup: self.backup.len() - self.next_backup,
            cached_queries: self.cache.len(),
            queries_before_refresh: available_regular + available_promoted,
        }
    }

    /// Split an absolute index into `(block, offset)`; `None` if it lies
    /// outside the database.
    fn locate(&self, index: u64) -> Option<(u32, u32)> {
        if index >= self.params.entries {
            return None;
        }
        let width = u64::from(self.params.block_size);
        Some(((index / width) as u32, (index % width) as u32))
    }

    /// The offset at which hint `hint_index` touches each block, indexed
    /// by block number.
    fn hint_offsets(&self, hint_index: u64) -> Vec<u32> {
        self.iprfs
            .iter()
            .map(|iprf| iprf.forward(hint_index) as u32)
            .collect()
    }

    /// Blocks outside `subset`.
    fn complement(&self, subset: &BlockSet) -> BlockSet {
        (0..self.params.blocks())
            .filter(|block| !subset.contains(block))
            .collect()
    }
}
