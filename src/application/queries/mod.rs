//! 应用层 - 查询
//!
//! 嵌入类操作：只调用嵌入模型，不产生文件

mod embed_queries;

pub mod handlers;

pub use embed_queries::*;
