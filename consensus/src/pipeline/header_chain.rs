use crate::errors::{RuleError, RuleResult};
use crate::model::stores::chain::{ChainStore, StagingChainStore};
use crate::params::Params;
use crate::pipeline::notifier::{ChainNotifier, HeadNotifier};
use ferra_consensus_core::api::counters::ProcessingCounters;
use ferra_consensus_core::header::Header;
use ferra_database::prelude::{StoreError, StoreResultExtensions};
use itertools::Itertools;
use log::{error, info};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The fork-choice outcome of a header-chain insertion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Whether the inserted chain became the canonical one
    pub new_canonical: bool,
    /// Whether canonical pointers at or below the previous head were rewritten
    pub reorg: bool,
    /// The highest number at which the old and new canonical chains agree
    pub fork_block: u64,
}

/// The header-chain insertion pipeline. A single logical writer drives
/// `insert_header_chain` at any time; store reads stay safe for concurrent
/// readers throughout.
pub struct HeaderChain {
    store: Arc<ChainStore>,
    params: Params,
    counters: Arc<ProcessingCounters>,
    notifier: ChainNotifier,
    tie_break_rng: Mutex<Box<dyn RngCore + Send>>,
}

impl HeaderChain {
    pub fn new(
        store: Arc<ChainStore>,
        params: Params,
        counters: Arc<ProcessingCounters>,
        notifier: Option<Arc<dyn HeadNotifier>>,
    ) -> RuleResult<Self> {
        store.init(&params)?;
        Ok(Self {
            store,
            params,
            counters,
            notifier: ChainNotifier::new(notifier),
            tie_break_rng: Mutex::new(Box::new(StdRng::from_entropy())),
        })
    }

    /// Replaces the tie-break RNG. Tests use this to force a coin outcome.
    pub fn with_tie_break_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.tie_break_rng = Mutex::new(Box::new(rng));
        self
    }

    pub fn store(&self) -> &Arc<ChainStore> {
        &self.store
    }

    /// Integrates a verified, internally linked, ascending batch of headers
    /// into the chain and resolves fork choice against the current head.
    /// `verification_time` is how long the preceding verification took and is
    /// only reported in the import summary.
    pub fn insert_header_chain(&self, headers: &[Arc<Header>], verification_time: Duration) -> RuleResult<InsertOutcome> {
        let start = Instant::now();
        self.counters.headers_submitted.fetch_add(headers.len() as u64, Ordering::Relaxed);

        // Ignore the prefix we already consider canonical
        let mut skip = 0;
        let mut walking_canonical_prefix = true;
        for header in headers {
            if self.params.is_bad_hash(header.hash) {
                let err = RuleError::BlacklistedHash(header.hash);
                error!(
                    "\n########## BAD BLOCK #########\n\nNumber: {}\nHash: {}\n\nError: {}\n##############################",
                    header.number, header.hash, err
                );
                return Err(err);
            }
            if walking_canonical_prefix && self.store.canonical_hash(header.number).optional()? == Some(header.hash) {
                skip += 1;
            } else {
                walking_canonical_prefix = false;
            }
        }
        let headers = &headers[skip..];
        if headers.is_empty() {
            return Ok(InsertOutcome::default());
        }

        let first = &headers[0];
        let last = &headers[headers.len() - 1];

        let parent = self
            .store
            .header(first.number.wrapping_sub(1), first.parent_hash)
            .optional()?
            .ok_or(RuleError::UnknownParent { hash: first.parent_hash, number: first.number })?;
        // A stored header without a stored TD is corruption, so this read is
        // not converted into a rule error
        let parent_td = self.store.td(parent.number, parent.hash)?;

        for (prev, next) in headers.iter().tuple_windows() {
            if next.parent_hash != prev.hash {
                return Err(RuleError::BrokenChain { number: next.number, expected: prev.hash, got: next.parent_hash });
            }
        }
        let extern_td = headers.iter().fold(parent_td, |td, header| td + header.difficulty);

        let head_hash = self.store.head_hash()?;
        let head_number = self.store.header_number(head_hash)?;
        let local_td = self.store.td(head_number, head_hash)?;

        let mut new_canonical = extern_td > local_td;
        if !new_canonical && extern_td == local_td {
            if last.number > head_number {
                new_canonical = true;
            } else if last.number == head_number {
                // An equal-work tip of equal height wins a fair coin flip,
                // keeping the replacement choice unpredictable to miners
                new_canonical = self.tie_break_rng.lock().gen_bool(0.5);
            }
        }

        // A deep fork diverges strictly before this batch
        let deep_fork =
            new_canonical && self.store.canonical_hash(first.number.wrapping_sub(1)).optional()? != Some(first.parent_hash);

        let mut staging = self.store.staging();
        let mut td = parent_td;
        let mut fork_block = 0u64;
        let mut fork_found = false;
        let mut ignored = 0u64;
        for header in headers {
            // Known headers are skipped below but still contribute difficulty,
            // so subsequent blocks see the right running TD
            td += header.difficulty;
            if !new_canonical && staging.has_header(header.number, header.hash)? {
                ignored += 1;
                continue;
            }
            if new_canonical && !deep_fork {
                match staging.canonical_hash(header.number)? {
                    Some(canonical_hash) if canonical_hash != header.hash => {
                        if !fork_found {
                            fork_block = header.number - 1;
                            fork_found = true;
                        }
                    }
                    _ => {
                        // No conflicting entry at this number; the known-equal
                        // point advances until a divergence is seen
                        if !fork_found {
                            fork_block = header.number;
                        }
                    }
                }
            }
            if new_canonical {
                staging.write_canonical(header.number, header.hash);
            }
            staging.write_header(Arc::clone(header));
            staging.write_td(header.number, header.hash, td);
        }
        self.counters.highest_header_number.fetch_max(last.number, Ordering::Relaxed);

        if deep_fork {
            fork_block = self.rewrite_canonical_ancestors(&mut staging, &parent)?;
        }

        let reorg = new_canonical && fork_block < head_number;
        if reorg {
            // Delete any canonical number assignments above the new head
            for number in last.number + 1..=head_number {
                staging.delete_canonical(number);
            }
        }

        if new_canonical {
            staging.write_number(last.hash, last.number);
            staging.write_head(last.hash);
        }

        staging.commit()?;

        self.counters.headers_inserted.fetch_add(headers.len() as u64 - ignored, Ordering::Relaxed);
        self.counters.headers_ignored.fetch_add(ignored, Ordering::Relaxed);
        if reorg {
            self.counters.reorg_counts.fetch_add(1, Ordering::Relaxed);
        }

        let since = start.elapsed();
        let rate = headers.len() as f64 / (since.as_secs_f64() + verification_time.as_secs_f64()).max(f64::EPSILON);
        let mut context = format!(
            "count {}, insertion {:?}, verification {:?}, number {}, hash {}, blk/sec {:.1}",
            headers.len(),
            since,
            verification_time,
            last.number,
            last.hash,
            rate
        );
        if ignored > 0 {
            context += &format!(", ignored {ignored}");
        }
        if reorg {
            context += &format!(", reorg true, fork block {fork_block}");
        }
        info!("Imported new block headers: {context}");

        if new_canonical {
            self.notifier.notify_head_advance(&self.store, head_number, last.number)?;
        }

        Ok(InsertOutcome { new_canonical, reorg, fork_block })
    }

    /// Walks backwards from `parent` (the header just before the batch),
    /// rewriting canonical pointers until the walked hash already matches the
    /// canonical entry at its number. Returns the fork block found there.
    /// The walk reads through the staging overlay and can cross any depth.
    fn rewrite_canonical_ancestors(&self, staging: &mut StagingChainStore<'_>, parent: &Header) -> RuleResult<u64> {
        let mut fork_number = parent.number - 1;
        let mut fork_hash = parent.parent_hash;
        while staging.canonical_hash(fork_number)? != Some(fork_hash) {
            staging.write_canonical(fork_number, fork_hash);
            let fork_header = staging.header(fork_number, fork_hash).optional()?.ok_or_else(|| {
                StoreError::DataInconsistency(format!("stored chain is missing ancestor {fork_hash} at number {fork_number}"))
            })?;
            fork_number = fork_header.number - 1;
            fork_hash = fork_header.parent_hash;
        }
        staging.write_canonical(parent.number, parent.hash);
        Ok(fork_number)
    }
}
