/// One entry of a fetched feed, reduced to what delivery needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub link: String,
    pub title: String,
    pub categories: Vec<String>,
}

impl FeedItem {
    pub fn new(link: String, title: String) -> Self {
        Self {
            link,
            title,
            categories: Vec::new(),
        }
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }
}
