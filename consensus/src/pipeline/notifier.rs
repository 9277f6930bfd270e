use crate::errors::{RuleError, RuleResult};
use crate::model::stores::chain::ChainStore;
use ferra_consensus_core::header::Header;
use ferra_database::prelude::StoreResultExtensions;
use log::warn;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Downstream observer of canonical head advancement (RPC, subscribers).
pub trait HeadNotifier: Send + Sync {
    /// Invoked synchronously, in strictly ascending block-number order.
    /// Implementations must return quickly or hand off to a bounded buffer.
    fn on_new_header(&self, header: Arc<Header>);
}

/// Walks the committed canonical chain forward and delivers each new header
/// to the registered notifier, once per canonical advance.
pub struct ChainNotifier {
    notifier: Option<Arc<dyn HeadNotifier>>,
    missing_notifier_warned: AtomicBool,
}

impl ChainNotifier {
    pub fn new(notifier: Option<Arc<dyn HeadNotifier>>) -> Self {
        Self { notifier, missing_notifier_warned: AtomicBool::new(false) }
    }

    /// Delivers the canonical headers in `(from, to]`, reading them back from
    /// the store after the commit that produced them. A missing header inside
    /// the range signals store corruption.
    pub fn notify_head_advance(&self, store: &ChainStore, from: u64, to: u64) -> RuleResult<()> {
        let Some(notifier) = &self.notifier else {
            if !self.missing_notifier_warned.swap(true, Ordering::Relaxed) {
                warn!("No head notifier is registered, canonical head notifications are dropped");
            }
            return Ok(());
        };
        for number in from + 1..=to {
            let hash = store.canonical_hash(number).optional()?.ok_or(RuleError::MissingCanonicalHeader(number))?;
            let header = store.header(number, hash).optional()?.ok_or(RuleError::MissingCanonicalHeader(number))?;
            notifier.on_new_header(header);
        }
        Ok(())
    }
}
