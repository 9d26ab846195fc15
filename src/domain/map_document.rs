// Map document domain model

/// A fully rendered, self-contained map page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDocument {
    html: String,
}

impl MapDocument {
    pub fn new(html: String) -> Self {
        Self { html }
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }
}
