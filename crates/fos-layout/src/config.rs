//! Layout Configuration

use serde::{Deserialize, Serialize};

/// Inline layout configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Embedding requests that would reach this level are ignored
    pub max_embedding_level: u8,

    /// Clean lines scanned when resynchronizing after an edit
    pub resync_lookahead: usize,

    /// Boxes without text still take part in vertical alignment
    pub strict_mode: bool,

    /// Paged media; `None` lays out on one continuous canvas
    pub pagination: Option<Pagination>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_embedding_level: 61,
            resync_lookahead: 8,
            strict_mode: true,
            pagination: None,
        }
    }
}

impl LayoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_embedding_level(mut self, level: u8) -> Self {
        self.max_embedding_level = level;
        self
    }

    pub fn with_resync_lookahead(mut self, lines: usize) -> Self {
        self.resync_lookahead = lines;
        self
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

/// Page geometry and how far the enclosing block lets lines move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Page height in pixels, pages start at y = 0
    pub page_height: i32,
    /// The enclosing block accepts a break forced by `page-break-inside: avoid`
    pub can_clear_normal: bool,
    /// The enclosing block accepts a break forced by orphans or widows
    pub can_clear_harder: bool,
}

impl Pagination {
    pub fn new(page_height: i32) -> Self {
        Self {
            page_height,
            can_clear_normal: false,
            can_clear_harder: false,
        }
    }

    /// Top of the first page starting strictly below `y`
    pub fn page_top_after(&self, y: i32) -> i32 {
        if self.page_height <= 0 {
            return y;
        }
        (y.div_euclid(self.page_height) + 1) * self.page_height
    }

    /// Whether a page boundary falls inside `(top, bottom)`
    pub fn crosses_page_break(&self, top: i32, bottom: i32) -> bool {
        self.page_height > 0 && self.page_top_after(top) < bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LayoutConfig::default();
        assert_eq!(config.max_embedding_level, 61);
        assert_eq!(config.resync_lookahead, 8);
        assert!(config.strict_mode);
        assert!(config.pagination.is_none());
    }

    #[test]
    fn test_builders() {
        let config = LayoutConfig::new()
            .with_strict_mode(false)
            .with_resync_lookahead(3)
            .with_pagination(Pagination::new(100));
        assert!(!config.strict_mode);
        assert_eq!(config.resync_lookahead, 3);
        assert_eq!(config.pagination.map(|p| p.page_height), Some(100));
    }

    #[test]
    fn test_page_tops() {
        let pages = Pagination::new(100);
        assert_eq!(pages.page_top_after(0), 100);
        assert_eq!(pages.page_top_after(99), 100);
        assert_eq!(pages.page_top_after(100), 200);
        assert!(pages.crosses_page_break(90, 110));
        assert!(!pages.crosses_page_break(80, 100));
        assert!(!pages.crosses_page_break(100, 150));
    }

    #[test]
    fn test_json_config() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{"strict_mode": false, "pagination": {"page_height": 300, "can_clear_normal": true, "can_clear_harder": false}}"#)
                .unwrap();
        assert!(!config.strict_mode);
        assert_eq!(config.max_embedding_level, 61);
        assert_eq!(config.pagination.map(|p| p.can_clear_normal), Some(true));
    }
}
