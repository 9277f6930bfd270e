pub mod header_chain;
pub mod notifier;
pub mod verifier;
