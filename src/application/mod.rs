//! Application layer driving one transfer flow on tokio.
//!
//! `TransferSession` wraps the synchronous `TransferFlow` with the async work it
//! needs: account verification and the processing delay. Both run as spawned
//! tasks whose results are discarded if the flow has moved on.

pub mod session;
