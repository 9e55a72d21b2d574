//! Per-category item store backed by one CSV table
//!
//! Every operation re-reads the table from disk; nothing is cached between
//! calls. Mutations rewrite the whole table while holding the store's write
//! lock, so two writers in this process can never drop each other's rows.

use crate::category::CategoryType;
use crate::error::{StoreError, StoreResult};
use crate::image_processor::{ImageProcessor, ImageUpload};
use crate::item::{format_price, parse_price, sort_items, Item, COLUMNS};
use crate::stats::{calculate_price_stats, CategoryStats, TotalStats};
use crate::table::Table;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Raw field values keyed by column name, as submitted by a form
pub type ItemFields = HashMap<String, String>;

/// Request keys that identify the target and are never written as columns
const CONTROL_KEYS: [&str; 2] = ["item_type", "item_id"];

/// Text fields filled from the submitted form, empty when not supplied
const TEXT_FIELDS: [&str; 8] = [
    "name",
    "category",
    "purchase_date",
    "arrival_date",
    "purchase_channel",
    "condition",
    "remark",
    "sold_date",
];

/// Repository over one category's table
#[derive(Debug)]
pub struct ItemStore {
    category: CategoryType,
    path: PathBuf,
    images: ImageProcessor,
    write_lock: Mutex<()>,
}

impl ItemStore {
    /// Create a store for `category` whose table lives at `<data_dir>/<slug>.csv`
    pub fn new(category: CategoryType, data_dir: &Path, images: ImageProcessor) -> Self {
        let path = data_dir.join(format!("{}.csv", category.as_str()));
        Self {
            category,
            path,
            images,
            write_lock: Mutex::new(()),
        }
    }

    pub fn category(&self) -> CategoryType {
        self.category
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all items, newest purchase first, dateless items last, ties by name.
    ///
    /// A missing or empty table loads as no items.
    pub fn load(&self) -> StoreResult<Vec<Item>> {
        let table = Table::read(&self.path)?;

        let mut items: Vec<Item> = table
            .rows
            .iter()
            .filter_map(|row| {
                let item = Item::from_row(&table.headers, row);
                if item.is_none() {
                    log::warn!(
                        "Skipping row without an integer id in {}: {:?}",
                        self.path.display(),
                        row
                    );
                }
                item
            })
            .collect();

        sort_items(&mut items);
        Ok(items)
    }

    /// Distinct non-empty sub-categories, sorted ascending
    pub fn categories(&self) -> StoreResult<Vec<String>> {
        let items = self.load()?;
        let set: BTreeSet<String> = items
            .into_iter()
            .map(|item| item.category)
            .filter(|category| !category.is_empty())
            .collect();
        Ok(set.into_iter().collect())
    }

    /// Look an item up by id; `"7"` and `7` address the same row.
    ///
    /// Uses the same row lookup as `update`, so both agree on what exists.
    pub fn get_by_id<K: Display>(&self, id: K) -> StoreResult<Option<Item>> {
        let table = Table::read(&self.path)?;
        Ok(table
            .find_row(&id.to_string())
            .and_then(|row| Item::from_row(&table.headers, &table.rows[row])))
    }

    /// Append a new item and return its id.
    ///
    /// Unsupplied fields take their defaults (empty text, 0 for prices,
    /// no sold price). `main_category` is always the category label.
    /// An unparsable price aborts the whole request before anything is written.
    pub fn create(&self, fields: &ItemFields, image: Option<&ImageUpload>) -> StoreResult<u64> {
        let mut values: HashMap<&str, String> = HashMap::new();

        for field in TEXT_FIELDS {
            values.insert(field, supplied(fields, field).unwrap_or_default());
        }
        values.insert("main_category", self.category.label().to_string());

        for field in ["purchase_price", "shipping_fee"] {
            let price = match supplied(fields, field) {
                Some(raw) => parse_price(field, &raw)?.unwrap_or(0.0),
                None => 0.0,
            };
            values.insert(field, format_price(price));
        }

        let sold_price = match supplied(fields, "sold_price") {
            Some(raw) => parse_price("sold_price", &raw)?,
            None => None,
        };
        values.insert("sold_price", sold_price.map(format_price).unwrap_or_default());

        let _guard = self.lock_writes();
        let mut table = Table::read(&self.path)?;
        for column in COLUMNS {
            table.ensure_column(column);
        }
        let new_id = match table.max_id() {
            Some(max) => max.checked_add(1).ok_or_else(|| {
                StoreError::Validation(format!("{} table has no ids left after {}", self.category, max))
            })?,
            None => 1,
        };

        let image_name = match image.filter(|upload| !upload.is_empty()) {
            Some(upload) => self.images.process(self.category, upload)?,
            None => String::new(),
        };
        values.insert("image", image_name);

        table.push_row(|column| {
            if column == "id" {
                new_id.to_string()
            } else {
                values.get(column).cloned().unwrap_or_default()
            }
        });
        table.write(&self.path)?;

        log::info!(
            "Created {} item {} ({})",
            self.category,
            new_id,
            values.get("name").map(String::as_str).unwrap_or("")
        );
        Ok(new_id)
    }

    /// Overwrite fields of an existing item.
    ///
    /// Keys that name an existing column are written verbatim; unknown keys,
    /// the control keys and `id` are ignored. A missing id fails without
    /// touching the table.
    pub fn update<K: Display>(
        &self,
        id: K,
        fields: &ItemFields,
        image: Option<&ImageUpload>,
    ) -> StoreResult<()> {
        let id = id.to_string();

        let _guard = self.lock_writes();
        let mut table = Table::read(&self.path)?;
        let row = table.find_row(&id).ok_or_else(|| StoreError::NotFound {
            category: self.category.to_string(),
            id: id.clone(),
        })?;

        let mut written = 0;
        for (key, value) in fields {
            if key == "id" || CONTROL_KEYS.contains(&key.as_str()) {
                continue;
            }
            match table.column(key) {
                Some(column) => {
                    table.set(row, column, value.clone());
                    written += 1;
                }
                None => log::debug!("Ignoring unknown field '{}' for {}", key, self.category),
            }
        }

        if let Some(upload) = image.filter(|upload| !upload.is_empty()) {
            let image_name = self.images.process(self.category, upload)?;
            let column = table.ensure_column("image");
            table.set(row, column, image_name);
        }

        table.write(&self.path)?;
        log::info!(
            "Updated {} item {} ({} fields)",
            self.category,
            id,
            written
        );
        Ok(())
    }

    /// Purchase/sale totals overall and per sub-category
    pub fn price_stats(&self) -> StoreResult<(TotalStats, BTreeMap<String, CategoryStats>)> {
        let items = self.load()?;
        Ok(calculate_price_stats(&items))
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// The submitted value of `field`, if present and not blank
fn supplied(fields: &ItemFields, field: &str) -> Option<String> {
    fields
        .get(field)
        .filter(|value| !value.trim().is_empty())
        .cloned()
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
