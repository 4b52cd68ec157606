use serde::Deserialize;

/// Identity and locator of one camera. Immutable once the chunk is loaded.
#[derive(Debug, PartialEq, Clone)]
pub struct CameraDescriptor {
    /// Opaque stable identifier, unique inside a chunk.
    pub cam_id: String,
    /// Human label, source of the filesystem slug.
    pub code: String,
    /// Free-form description, only used in log lines.
    pub title: Option<String>,
    /// Locator handed to the fetcher.
    pub fetch_endpoint: String,
}

/// Raw chunk record as found on disk, before validation.
#[derive(Debug, Deserialize)]
pub(crate) struct CameraRecord {
    pub cam_id: Option<String>,
    pub code: Option<String>,
    pub title: Option<String>,
    #[serde(alias = "fetch_endpoint")]
    pub expand_url: Option<String>,
}

/// Headers the HTTP fetcher sends with every request.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub user_agent: String,
    pub referer: Option<String>,
    pub origin: Option<String>,
    pub accept: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: String::from(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome Safari",
            ),
            referer: None,
            origin: None,
            accept: String::from("image/avif,image/webp,image/*,*/*;q=0.8"),
        }
    }
}
