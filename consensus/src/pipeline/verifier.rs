use crate::errors::{RuleError, RuleResult};
use crate::model::stores::chain::ChainStore;
use crossbeam_channel::{select, Receiver, Sender};
use ferra_consensus_core::api::counters::ProcessingCounters;
use ferra_consensus_core::api::verification::{
    BlockError, HeaderRequest, HeaderResponse, VerificationError, VerifyHeaderRequest, VerifyResult,
};
use ferra_consensus_core::header::Header;
use ferra_database::prelude::StoreResultExtensions;
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// The channel trio connecting the coordinator to an external consensus
/// engine. No component holds a back-reference; requests and responses are
/// correlated by id.
#[derive(Clone)]
pub struct EngineChannels {
    pub verify_requests: Sender<VerifyHeaderRequest>,
    pub verify_results: Receiver<VerifyResult>,
    pub header_requests: Receiver<HeaderRequest>,
    pub header_responses: Sender<HeaderResponse>,
}

/// Drives parallel header verification through an external engine while
/// servicing the engine's demands for ancestor headers out of the store.
pub struct HeaderVerifier {
    store: Arc<ChainStore>,
    engine: EngineChannels,
    shutdown: Receiver<()>,
    counters: Arc<ProcessingCounters>,
}

impl HeaderVerifier {
    pub fn new(store: Arc<ChainStore>, engine: EngineChannels, shutdown: Receiver<()>, counters: Arc<ProcessingCounters>) -> Self {
        Self { store, engine, shutdown, counters }
    }

    /// Verifies a linked batch of headers, seal-checking every `check_freq`-th
    /// one (the last header is always seal-checked; `check_freq == 0` skips
    /// seal checks entirely). Returns once the engine has reported every
    /// header, or with the first engine error.
    pub fn verify_header_chain(
        &self,
        headers: &[Arc<Header>],
        check_freq: usize,
        deadline: Option<Instant>,
    ) -> RuleResult<()> {
        if headers.is_empty() {
            return Ok(());
        }
        let request = VerifyHeaderRequest {
            id: rand::random(),
            headers: headers.to_vec(),
            seals: seal_bitmap(headers.len(), check_freq),
            deadline,
        };
        self.engine.verify_requests.send(request).map_err(|_| RuleError::EngineDisconnected)?;

        let mut verified = HashSet::with_capacity(headers.len());
        loop {
            select! {
                recv(self.engine.verify_results) -> result => {
                    let result = result.map_err(|_| RuleError::EngineDisconnected)?;
                    if let Some(err) = result.err {
                        return Err(err.into());
                    }
                    // The engine may re-report a hash; each one counts once
                    if verified.insert(result.hash) && verified.len() == headers.len() {
                        return Ok(());
                    }
                }
                recv(self.engine.header_requests) -> request => {
                    let request = request.map_err(|_| RuleError::EngineDisconnected)?;
                    let response = self.collect_ancestors(request)?;
                    self.engine.header_responses.send(response).map_err(|_| RuleError::EngineDisconnected)?;
                }
                recv(self.shutdown) -> _ => {
                    return Err(RuleError::Cancelled);
                }
            }
        }
    }

    /// Walks backwards from the request's highest block, collecting the
    /// demanded ancestors in descending-number order
    fn collect_ancestors(&self, request: HeaderRequest) -> RuleResult<HeaderResponse> {
        self.counters.ancestor_requests.fetch_add(1, Ordering::Relaxed);

        let mut wanted = request.number_wanted;
        if request.highest_number + 1 < wanted {
            wanted = request.highest_number + 1;
        }

        let mut headers = Vec::with_capacity(wanted as usize);
        let mut hash = request.highest_hash;
        let mut number = request.highest_number;
        for _ in 0..wanted {
            match self.store.header(number, hash).optional()? {
                Some(header) => {
                    hash = header.parent_hash;
                    headers.push(header);
                    number = number.saturating_sub(1);
                }
                None => {
                    return Ok(HeaderResponse {
                        id: request.id,
                        headers: Vec::new(),
                        block_error: Some(BlockError { hash, number, error: VerificationError::UnknownParent(hash) }),
                    });
                }
            }
        }
        Ok(HeaderResponse { id: request.id, headers, block_error: None })
    }
}

/// `seals[i * check_freq]` is set for `i = 0..len / check_freq` and the final
/// index is always set; a zero `check_freq` leaves the whole bitmap unset
fn seal_bitmap(len: usize, check_freq: usize) -> Vec<bool> {
    let mut seals = vec![false; len];
    if check_freq != 0 && len > 0 {
        for i in 0..len / check_freq {
            seals[(i * check_freq).min(len - 1)] = true;
        }
        seals[len - 1] = true;
    }
    seals
}
