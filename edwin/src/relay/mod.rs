//! Low-latency transaction relay submission.
//!
//! Chains that offer an out-of-band relay (Solana's Jito block engine in
//! this toolkit) accept fully signed transactions over JSON-RPC in exchange
//! for a small tip to the relay operator, trading a fixed cost for faster
//! inclusion than the standard broadcast path.
//!
//! Submission is atomic from this layer's point of view: the relay's
//! response decides success or failure and nothing is retried here. Relays
//! deduplicate by signature, so callers may safely resubmit an identical
//! signed payload on their own schedule.

mod jito;

pub use jito::JitoRelay;
