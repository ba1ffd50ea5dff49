//! Worker Layer - Background Task Processing
//!
//! 实现 ScratchGcWorker，定期清理临时目录

mod scratch_gc;

pub use scratch_gc::{ScratchGcConfig, ScratchGcWorker};
