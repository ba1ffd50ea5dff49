//! 应用服务 - 命令与查询共用的流程

mod track_renderer;
mod upload_loader;

pub use track_renderer::{RenderSettings, RenderedTrack, TrackRenderer};
pub use upload_loader::{UploadLoader, UploadedAudio};
