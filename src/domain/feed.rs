use serde::{Deserialize, Serialize};

/// Controls which parts of an item feed into its fingerprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HashingOptions {
    /// Keep the query string when normalizing the item link.
    ///
    /// Most feeds attach volatile tracking parameters, so the default is to
    /// strip the query; feeds that distinguish items only by query string
    /// (e.g. `?p=123` permalinks) need this turned on.
    #[serde(default)]
    pub keep_query: bool,
    /// Mix the item content into the fingerprint, so edited items notify again.
    #[serde(default)]
    pub hash_content: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedDescriptor {
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub hashing: HashingOptions,
    /// Literal substring rewrites applied to category names before they are
    /// turned into hashtags.
    #[serde(default = "default_tag_remaps")]
    pub tag_remaps: Vec<(String, String)>,
}

impl FeedDescriptor {
    pub fn new(url: String) -> Self {
        Self {
            url,
            enabled: true,
            hashing: HashingOptions::default(),
            tag_remaps: default_tag_remaps(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Category names that can never survive hashtag character mapping verbatim.
pub fn default_tag_remaps() -> Vec<(String, String)> {
    vec![
        ("*nix".to_string(), "unix".to_string()),
        ("c++".to_string(), "cpp".to_string()),
    ]
}
