//! Purchase and sale totals, overall and per sub-category

use crate::item::Item;
use serde::Serialize;
use std::collections::BTreeMap;

/// Totals across every item of a category table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TotalStats {
    /// Sum of purchase price plus shipping fee
    pub total_purchase_price: f64,
    /// Sum of sold prices of sold items
    pub total_sold_price: f64,
    pub total_count: usize,
    pub sold_count: usize,
}

/// Totals for one sub-category
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    pub purchase_price: f64,
    pub sold_price: f64,
    pub count: usize,
    pub sold_count: usize,
}

/// Aggregate purchase and sale figures.
///
/// Items with a blank sub-category count toward the totals only.
pub fn calculate_price_stats(items: &[Item]) -> (TotalStats, BTreeMap<String, CategoryStats>) {
    let mut total = TotalStats {
        total_count: items.len(),
        ..TotalStats::default()
    };
    let mut by_category: BTreeMap<String, CategoryStats> = BTreeMap::new();

    for item in items {
        let cost = item.total_cost();
        let sold_price = item.sold_price.filter(|_| item.is_sold());

        total.total_purchase_price += cost;
        if let Some(price) = sold_price {
            total.total_sold_price += price;
            total.sold_count += 1;
        }

        if item.category.is_empty() {
            continue;
        }
        let bucket = by_category.entry(item.category.clone()).or_default();
        bucket.purchase_price += cost;
        bucket.count += 1;
        if let Some(price) = sold_price {
            bucket.sold_price += price;
            bucket.sold_count += 1;
        }
    }

    (total, by_category)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(category: &str, purchase: Option<f64>, shipping: Option<f64>, sold: Option<f64>) -> Item {
        Item {
            id: 1,
            name: String::new(),
            main_category: String::new(),
            category: category.to_string(),
            purchase_price: purchase,
            shipping_fee: shipping,
            purchase_date: None,
            arrival_date: String::new(),
            purchase_channel: String::new(),
            condition: String::new(),
            remark: String::new(),
            sold_price: sold,
            sold_date: String::new(),
            image: String::new(),
        }
    }

    #[test]
    fn totals_include_shipping_and_sales() {
        let items = vec![
            item("", Some(100.0), Some(10.0), None),
            item("", Some(50.0), Some(0.0), Some(80.0)),
        ];
        let (total, _) = calculate_price_stats(&items);

        assert_eq!(total.total_purchase_price, 160.0);
        assert_eq!(total.total_sold_price, 80.0);
        assert_eq!(total.sold_count, 1);
        assert_eq!(total.total_count, 2);
    }

    #[test]
    fn missing_prices_count_as_zero() {
        let items = vec![item("scale", None, None, None), item("scale", Some(20.0), None, None)];
        let (total, _) = calculate_price_stats(&items);
        assert_eq!(total.total_purchase_price, 20.0);
    }

    #[test]
    fn nan_sold_price_is_unsold() {
        let items = vec![item("scale", Some(1.0), None, Some(f64::NAN))];
        let (total, categories) = calculate_price_stats(&items);
        assert_eq!(total.sold_count, 0);
        assert_eq!(total.total_sold_price, 0.0);
        assert_eq!(categories["scale"].sold_count, 0);
    }

    #[test]
    fn zero_sold_price_is_a_sale() {
        let items = vec![item("gift", Some(30.0), None, Some(0.0))];
        let (total, categories) = calculate_price_stats(&items);
        assert_eq!(total.sold_count, 1);
        assert_eq!(categories["gift"].sold_count, 1);
    }

    #[test]
    fn per_category_buckets_skip_blank_category() {
        let items = vec![
            item("nendoroid", Some(40.0), Some(5.0), Some(60.0)),
            item("nendoroid", Some(35.0), None, None),
            item("scale", Some(200.0), Some(20.0), None),
            item("", Some(999.0), None, Some(1.0)),
        ];
        let (total, categories) = calculate_price_stats(&items);

        assert_eq!(categories.len(), 2);
        assert_eq!(
            categories["nendoroid"],
            CategoryStats {
                purchase_price: 80.0,
                sold_price: 60.0,
                count: 2,
                sold_count: 1,
            }
        );
        assert_eq!(categories["scale"].purchase_price, 220.0);
        assert_eq!(categories["scale"].sold_count, 0);

        assert_eq!(total.total_purchase_price, 1299.0);
        assert_eq!(total.sold_count, 2);
        assert_eq!(total.total_count, 4);
    }

    #[test]
    fn empty_input_gives_zeroes() {
        let (total, categories) = calculate_price_stats(&[]);
        assert_eq!(total, TotalStats::default());
        assert!(categories.is_empty());
    }
}
