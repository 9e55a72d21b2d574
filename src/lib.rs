//! Storage Manager - household collectibles tracker
//!
//! Keeps figures, clothing and goods in one CSV table per category and
//! serves a small web UI for browsing, creating and editing items.
//! Uploaded photos are downscaled and re-encoded as WebP.

pub mod category;
pub mod error;
pub mod image_processor;
pub mod inventory;
pub mod item;
pub mod stats;
pub mod store;
pub mod table;
pub mod web;

pub use category::CategoryType;
pub use error::{StoreError, StoreResult};
pub use image_processor::{secure_filename, ImageProcessor, ImageUpload};
pub use inventory::{Inventory, InventorySummary};
pub use item::Item;
pub use stats::{calculate_price_stats, CategoryStats, TotalStats};
pub use store::{ItemFields, ItemStore};
