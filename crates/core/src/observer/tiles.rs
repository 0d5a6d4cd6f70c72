//! The accumulated set of observed tiles.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::classifier::{ResolutionTier, TileRecord};

/// Every accepted tile URL plus the high-resolution subset.
///
/// `high` is always a subset of `all`: high resolution is a grading of an
/// observed tile, not a separate discovery channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedTiles {
    all: HashSet<String>,
    high: HashSet<String>,
}

impl ObservedTiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an already classified URL. Returns `true` if it was new.
    pub fn insert(&mut self, url: &str, tier: ResolutionTier) -> bool {
        let is_new = self.all.insert(url.to_string());
        if tier == ResolutionTier::High {
            self.high.insert(url.to_string());
        }
        is_new
    }

    pub fn contains(&self, url: &str) -> bool {
        self.all.contains(url)
    }

    pub fn tier_of(&self, url: &str) -> Option<ResolutionTier> {
        if self.high.contains(url) {
            Some(ResolutionTier::High)
        } else if self.all.contains(url) {
            Some(ResolutionTier::Basic)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn high_count(&self) -> usize {
        self.high.len()
    }

    pub fn basic_count(&self) -> usize {
        self.all.len() - self.high.len()
    }

    pub fn urls(&self) -> &HashSet<String> {
        &self.all
    }

    pub fn high_urls(&self) -> &HashSet<String> {
        &self.high
    }

    /// Records for every observed tile, sorted by URL.
    pub fn records(&self) -> Vec<TileRecord> {
        let mut urls: Vec<&String> = self.all.iter().collect();
        urls.sort();
        urls.into_iter()
            .map(|url| {
                let tier = if self.high.contains(url) {
                    ResolutionTier::High
                } else {
                    ResolutionTier::Basic
                };
                TileRecord::new(url.clone(), tier)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::TileClassifier;

    fn observe(tiles: &mut ObservedTiles, classifier: &TileClassifier, url: &str) -> bool {
        match classifier.classify(url) {
            Some(tier) => tiles.insert(url, tier),
            None => false,
        }
    }

    #[test]
    fn test_record_deduplicates() {
        let classifier = TileClassifier::default();
        let mut tiles = ObservedTiles::new();

        assert!(observe(&mut tiles, &classifier, "https://cdn.test/tiles/cf_01.jpg"));
        assert!(!observe(&mut tiles, &classifier, "https://cdn.test/tiles/cf_01.jpg"));
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles.high_count(), 1);
        assert_eq!(tiles.basic_count(), 0);
    }

    #[test]
    fn test_record_ignores_non_tiles() {
        let classifier = TileClassifier::default();
        let mut tiles = ObservedTiles::new();

        assert!(!observe(&mut tiles, &classifier, "https://cdn.test/player.js"));
        assert!(tiles.is_empty());
    }

    #[test]
    fn test_high_is_subset_of_all() {
        let classifier = TileClassifier::default();
        let mut tiles = ObservedTiles::new();
        for url in [
            "https://cdn.test/tiles/cf_01.jpg",
            "https://cdn.test/tiles/interior/basic_a.jpg",
            "https://cdn.test/exteriorlevel2/c1.jpg",
            "https://cdn.test/tiles/c0_l_2_0_0.jpg",
        ] {
            observe(&mut tiles, &classifier, url);
        }

        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles.high_count(), 2);
        assert_eq!(tiles.basic_count(), 2);
        assert!(tiles.high_urls().is_subset(tiles.urls()));
    }

    #[test]
    fn test_tier_of() {
        let mut tiles = ObservedTiles::new();
        tiles.insert("https://cdn.test/tiles/a.jpg", ResolutionTier::Basic);
        tiles.insert("https://cdn.test/tiles/cf_1.jpg", ResolutionTier::High);

        assert_eq!(
            tiles.tier_of("https://cdn.test/tiles/a.jpg"),
            Some(ResolutionTier::Basic)
        );
        assert_eq!(
            tiles.tier_of("https://cdn.test/tiles/cf_1.jpg"),
            Some(ResolutionTier::High)
        );
        assert_eq!(tiles.tier_of("https://cdn.test/tiles/b.jpg"), None);
    }

    #[test]
    fn test_records_are_sorted_and_named() {
        let mut tiles = ObservedTiles::new();
        tiles.insert("https://cdn.test/tiles/z.jpg", ResolutionTier::Basic);
        tiles.insert("https://cdn.test/tiles/cf_01.jpg?v=2", ResolutionTier::High);

        let records = tiles.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].file_name, "high_cf_01.jpg");
        assert_eq!(records[1].file_name, "basic_z.jpg");
    }
}
