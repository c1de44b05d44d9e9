mod extractor;
mod types;
mod ytdlp;

pub use extractor::Extractor;
pub use types::{DownloadRequest, VideoInfo};
pub use ytdlp::YtDlpExtractor;
