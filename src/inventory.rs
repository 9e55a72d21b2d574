//! One item store per category type

use crate::category::CategoryType;
use crate::error::StoreResult;
use crate::image_processor::ImageProcessor;
use crate::store::ItemStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Item counts for the overview page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySummary {
    pub total: usize,
    pub counts: BTreeMap<CategoryType, usize>,
}

/// The set of category stores shared by all request handlers
#[derive(Debug)]
pub struct Inventory {
    figures: ItemStore,
    clothing: ItemStore,
    goods: ItemStore,
}

impl Inventory {
    /// Create stores for every category with tables under `data_dir`
    pub fn new(data_dir: &Path, images: ImageProcessor) -> Self {
        Self {
            figures: ItemStore::new(CategoryType::Figures, data_dir, images.clone()),
            clothing: ItemStore::new(CategoryType::Clothing, data_dir, images.clone()),
            goods: ItemStore::new(CategoryType::Goods, data_dir, images),
        }
    }

    pub fn store(&self, category: CategoryType) -> &ItemStore {
        match category {
            CategoryType::Figures => &self.figures,
            CategoryType::Clothing => &self.clothing,
            CategoryType::Goods => &self.goods,
        }
    }

    /// Total and per-category item counts
    pub fn summary(&self) -> StoreResult<InventorySummary> {
        let mut counts = BTreeMap::new();
        for category in CategoryType::all() {
            counts.insert(*category, self.store(*category).load()?.len());
        }
        Ok(InventorySummary {
            total: counts.values().sum(),
            counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ItemFields;
    use tempfile::TempDir;

    fn named(name: &str) -> ItemFields {
        ItemFields::from([("name".to_string(), name.to_string())])
    }

    #[test]
    fn each_category_has_its_own_table() {
        let temp_dir = TempDir::new().unwrap();
        let inventory = Inventory::new(temp_dir.path(), ImageProcessor::new(temp_dir.path()));

        for category in CategoryType::all() {
            let store = inventory.store(*category);
            assert_eq!(store.category(), *category);
            assert_eq!(
                store.path(),
                temp_dir.path().join(format!("{}.csv", category.as_str()))
            );
        }
    }

    #[test]
    fn summary_counts_items_per_category() {
        let temp_dir = TempDir::new().unwrap();
        let inventory = Inventory::new(temp_dir.path(), ImageProcessor::new(temp_dir.path()));

        let figures = inventory.store(CategoryType::Figures);
        figures.create(&named("Miku"), None).unwrap();
        figures.create(&named("Rin"), None).unwrap();
        inventory
            .store(CategoryType::Goods)
            .create(&named("Mug"), None)
            .unwrap();

        let summary = inventory.summary().unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.counts[&CategoryType::Figures], 2);
        assert_eq!(summary.counts[&CategoryType::Clothing], 0);
        assert_eq!(summary.counts[&CategoryType::Goods], 1);
    }

    #[test]
    fn summary_serializes_with_slugs() {
        let temp_dir = TempDir::new().unwrap();
        let inventory = Inventory::new(temp_dir.path(), ImageProcessor::new(temp_dir.path()));

        let json = serde_json::to_string(&inventory.summary().unwrap()).unwrap();
        assert!(json.contains("\"total\":0"));
        assert!(json.contains("\"figures\":0"));
    }
}
