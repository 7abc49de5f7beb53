pub mod assembler;
pub mod client;
pub mod dispatcher;
pub mod reconcile;

pub use assembler::{assemble, AssembledResult};
pub use client::{ClassificationClient, ClassifyOutcome, RetryPolicy};
pub use dispatcher::{BatchDispatcher, DispatchSettings, DispatchStats};
pub use reconcile::{ReconcileReport, ReconcileSettings, ReconcileStatus, Reconciler};
