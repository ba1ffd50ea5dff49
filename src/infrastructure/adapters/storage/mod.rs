//! Storage Adapter - 临时文件存储实现

mod scratch_dir;

pub use scratch_dir::ScratchDir;
