/// A single normalized feed entry, reduced to what notification and
/// deduplication need.
#[derive(Debug, Clone, Default)]
pub struct Item {
    pub title: Option<String>,
    pub link: Option<String>,
    pub content: Option<String>,
    pub categories: Vec<String>,
}
