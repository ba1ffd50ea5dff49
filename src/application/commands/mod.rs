//! 应用层 - 命令
//!
//! 生成类操作：调用生成模型并产出音频文件

mod generate_commands;

pub mod handlers;

pub use generate_commands::*;
