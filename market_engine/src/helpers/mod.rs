//! Formatting helpers for system-generated notifications.

use mkt_common::Money;

use crate::db_types::OrderItem;

/// Renders the body of the message sent to a seller when an order containing their products is placed.
/// `items` must already be narrowed to the seller's portion of the order.
pub fn seller_order_summary(order_id: i64, items: &[OrderItem]) -> String {
    let mut lines = Vec::with_capacity(items.len() + 2);
    lines.push(format!("New order #{order_id} contains {} of your item(s):", items.len()));
    for item in items {
        lines.push(format!(
            "- {} x {} @ {} = {}",
            item.product_name,
            item.quantity,
            item.unit_price,
            item.line_total()
        ));
    }
    let subtotal: Money = items.iter().map(OrderItem::line_total).sum();
    lines.push(format!("Subtotal: {subtotal}"));
    lines.join("\n")
}

#[cfg(test)]
mod test {
    use mkt_common::Money;

    use super::*;
    use crate::db_types::OrderItem;

    #[test]
    fn summary_lists_each_line_and_subtotal() {
        let items = vec![
            OrderItem {
                id: 1,
                order_id: 9,
                product_id: 1,
                seller_id: 2,
                product_name: "Apples".into(),
                quantity: 3,
                unit_price: Money::from(1500),
            },
            OrderItem {
                id: 2,
                order_id: 9,
                product_id: 4,
                seller_id: 2,
                product_name: "Honey".into(),
                quantity: 1,
                unit_price: Money::from(9000),
            },
        ];
        let summary = seller_order_summary(9, &items);
        assert!(summary.contains("order #9"));
        assert!(summary.contains("Apples x 3"));
        assert!(summary.contains("Honey x 1"));
        assert!(summary.ends_with("Subtotal: 13500krw"));
    }
}
