use serde::{Deserialize, Serialize};
use serde_json::Value;

const STUB_TITLE: &str = "Test Video - If you see this, the deployment is working!";
const STUB_THUMBNAIL: &str = "https://via.placeholder.com/640x360.png?text=Test+Thumbnail";

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub resolution: Option<String>,
    pub format_note: Option<String>,
    pub filesize: Option<u64>,
    pub url: String,
}

impl FormatDescriptor {
    /// Copies the fields we expose out of one raw yt-dlp format entry.
    /// Entries without a usable `url` are rejected.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let url = raw["url"].as_str().filter(|u| !u.is_empty())?;

        Some(Self {
            format_id: string_field(raw, "format_id"),
            ext: string_field(raw, "ext"),
            resolution: string_field(raw, "resolution"),
            format_note: string_field(raw, "format_note"),
            filesize: raw["filesize"]
                .as_u64()
                .or_else(|| raw["filesize"].as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            url: url.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub formats: Vec<FormatDescriptor>,
}

impl VideoInfo {
    pub fn from_raw(raw: &Value) -> Self {
        let formats = raw["formats"]
            .as_array()
            .map(|formats| formats.iter().filter_map(FormatDescriptor::from_raw).collect())
            .unwrap_or_default();

        Self {
            title: string_field(raw, "title"),
            thumbnail: string_field(raw, "thumbnail"),
            formats,
        }
    }

    /// Canned payload served in stub mode.
    pub fn stub() -> Self {
        Self {
            title: Some(STUB_TITLE.to_string()),
            thumbnail: Some(STUB_THUMBNAIL.to_string()),
            formats: vec![
                FormatDescriptor {
                    format_id: None,
                    ext: Some("mp4".to_string()),
                    resolution: Some("720p".to_string()),
                    format_note: Some("Test Format 1".to_string()),
                    filesize: Some(12345678),
                    url: "#".to_string(),
                },
                FormatDescriptor {
                    format_id: None,
                    ext: Some("webm".to_string()),
                    resolution: Some("1080p".to_string()),
                    format_note: Some("Test Format 2".to_string()),
                    filesize: Some(23456789),
                    url: "#".to_string(),
                },
            ],
        }
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw[key].as_str().map(|s| s.to_string())
}
