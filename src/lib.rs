//! Remote print queue for a pen plotter.
//!
//! Remote clients submit SVG drawings over HTTP; the host keeps them in an
//! ordered queue and hands one job at a time to the plotter once the operator
//! has marked it ready.

pub mod config;
pub mod device;
pub mod error;
pub mod queue;
pub mod simulator;
pub mod web;

pub use error::{QueueError, QueueResult};
pub use queue::{start_queue, QueueHandle};
