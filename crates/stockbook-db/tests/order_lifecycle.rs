//! End-to-end order flows against an in-memory database: totals, stock
//! movement on create and edit, rollback and delete rules.

mod common;

use common::{fixture, purchase_line, sale_line};
use rust_decimal_macros::dec;
use stockbook_core::{
    CoreError, MinStockPolicy, OrderFilter, SaleLineInput, TaxRate, ValidationError, MAX_STOCK,
};
use stockbook_db::DbError;

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn purchase_create_computes_totals_and_receives_stock() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 0, None).await;

    let purchase = fx
        .db
        .purchasing()
        .create(&fx.purchase(10, "23", vec![purchase_line(widget.id, 10, dec!(2.50))]))
        .await
        .unwrap();

    assert_eq!(purchase.subtotal, dec!(25.00));
    assert_eq!(purchase.discount_amount, dec!(2.50));
    assert_eq!(purchase.tax_amount, dec!(5.18));
    assert_eq!(purchase.total, dec!(27.68));

    // Persisted values match what was returned
    let stored = fx.db.purchases().get_by_id(purchase.id).await.unwrap().unwrap();
    assert_eq!(stored.total.to_string(), "27.68");

    let lines = fx.db.purchases().lines(purchase.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].line_total, dec!(25.00));

    let product = fx.db.products().get_by_id(widget.id).await.unwrap().unwrap();
    assert_eq!(product.stock, 10);
    assert_eq!(product.reference_cost, dec!(2.50));
    assert_eq!(product.stock_minimum, Some(9));
}

#[tokio::test]
async fn purchase_create_keeps_higher_minimum() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 50, Some(45)).await;

    fx.db
        .purchasing()
        .create(&fx.purchase(0, "0", vec![purchase_line(widget.id, 2, dec!(1.00))]))
        .await
        .unwrap();

    // 90% of 52 is 46, above 45
    assert_eq!(fx.stock(widget.id).await, (52, Some(46)));

    let gadget = fx.product("Gadget", 50, Some(49)).await;
    fx.db
        .purchasing()
        .create(&fx.purchase(0, "0", vec![purchase_line(gadget.id, 1, dec!(1.00))]))
        .await
        .unwrap();

    // 90% of 51 is 45, below 49
    assert_eq!(fx.stock(gadget.id).await, (51, Some(49)));
}

#[tokio::test]
async fn sale_create_consumes_stock_with_line_discounts() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 20, None).await;

    let mut line = sale_line(widget.id, 2, dec!(10.00));
    line.discount_percentage = dec!(10);

    let sale = fx
        .db
        .selling(MinStockPolicy::Soft)
        .create(&fx.sale(dec!(3.00), "10", vec![line]))
        .await
        .unwrap();

    // 18.00 - 3.00 = 15.00, tax 1.50
    assert_eq!(sale.subtotal, dec!(18.00));
    assert_eq!(sale.discount_amount, dec!(3.00));
    assert_eq!(sale.tax_amount, dec!(1.50));
    assert_eq!(sale.total, dec!(16.50));
    assert_eq!(sale.tax_percentage, dec!(10));

    let lines = fx.db.sales().lines(sale.id).await.unwrap();
    assert_eq!(lines[0].line_total, dec!(18.00));
    assert_eq!(fx.stock(widget.id).await.0, 18);
}

#[tokio::test]
async fn sale_discount_larger_than_subtotal_floors_base_at_zero() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 5, None).await;

    let sale = fx
        .db
        .selling(MinStockPolicy::Soft)
        .create(&fx.sale(dec!(50.00), "23", vec![sale_line(widget.id, 1, dec!(10.00))]))
        .await
        .unwrap();

    assert_eq!(sale.tax_amount, dec!(0.00));
    assert_eq!(sale.total, dec!(0.00));
}

#[tokio::test]
async fn empty_orders_have_zero_totals_and_move_no_stock() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 7, Some(3)).await;

    let purchase = fx.db.purchasing().create(&fx.purchase(10, "23", vec![])).await.unwrap();
    assert_eq!(purchase.subtotal, dec!(0));
    assert_eq!(purchase.discount_amount, dec!(0));
    assert_eq!(purchase.tax_amount, dec!(0));
    assert_eq!(purchase.total, dec!(0));

    let sale = fx
        .db
        .selling(MinStockPolicy::Hard)
        .create(&fx.sale(dec!(0), "23", vec![]))
        .await
        .unwrap();
    assert_eq!(sale.total, dec!(0));

    assert_eq!(fx.stock(widget.id).await, (7, Some(3)));
}

#[tokio::test]
async fn invalid_tax_text_means_no_tax_on_create() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 0, None).await;

    let purchase = fx
        .db
        .purchasing()
        .create(&fx.purchase(0, "abc", vec![purchase_line(widget.id, 1, dec!(10.00))]))
        .await
        .unwrap();

    assert_eq!(purchase.tax_amount, dec!(0));
    assert_eq!(purchase.total, dec!(10.00));
}

#[tokio::test]
async fn sale_tax_percentage_is_stored_as_entered() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 5, None).await;
    let sales = fx.db.selling(MinStockPolicy::Soft);

    let mut input = fx.sale(dec!(0), "23.50", vec![sale_line(widget.id, 1, dec!(10.00))]);
    let sale = sales.create(&input).await.unwrap();

    assert_eq!(sale.tax_percentage.to_string(), "23.50");
    assert_eq!(sale.tax_amount, dec!(2.35));
    assert_eq!(sale.total, dec!(12.35));

    let stored = fx.db.sales().get_by_id(sale.id).await.unwrap().unwrap();
    assert_eq!(stored.tax_percentage.to_string(), "23.50");

    input.tax_percentage = "7.0".to_string();
    input.lines[0].id = Some(fx.db.sales().lines(sale.id).await.unwrap()[0].id);
    let edited = sales.edit(sale.id, &input).await.unwrap();
    assert_eq!(edited.tax_percentage.to_string(), "7.0");
    assert_eq!(edited.tax_amount, dec!(0.70));
}

// =============================================================================
// Stock Rules
// =============================================================================

#[tokio::test]
async fn sale_beyond_stock_is_rejected_and_nothing_is_saved() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 5, None).await;

    let err = fx
        .db
        .selling(MinStockPolicy::Soft)
        .create(&fx.sale(dec!(0), "23", vec![sale_line(widget.id, 7, dec!(1.00))]))
        .await
        .unwrap_err();

    match &err {
        DbError::Domain(CoreError::InsufficientStock {
            product_id,
            available,
            requested,
            ..
        }) => {
            assert_eq!(*product_id, widget.id);
            assert_eq!(*available, 5);
            assert_eq!(*requested, 7);
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }
    assert!(err.user_message().contains("Widget"));

    assert_eq!(fx.stock(widget.id).await.0, 5);
    assert_eq!(fx.db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn lines_on_the_same_product_consume_stock_in_turn() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 5, None).await;

    let err = fx
        .db
        .selling(MinStockPolicy::Soft)
        .create(&fx.sale(
            dec!(0),
            "23",
            vec![sale_line(widget.id, 3, dec!(1.00)), sale_line(widget.id, 3, dec!(1.00))],
        ))
        .await
        .unwrap_err();

    // The first line leaves 2, so the second line is the one that fails
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock {
            available: 2,
            requested: 3,
            ..
        })
    ));
    assert_eq!(fx.stock(widget.id).await.0, 5);
    assert_eq!(fx.db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn purchase_past_stock_limit_is_rejected() {
    let fx = fixture().await;
    let widget = fx.product("Widget", MAX_STOCK, None).await;

    let err = fx
        .db
        .purchasing()
        .create(&fx.purchase(0, "23", vec![purchase_line(widget.id, 1, dec!(1.00))]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DbError::Domain(CoreError::StockLimitExceeded { max: MAX_STOCK, .. })
    ));
    assert_eq!(fx.stock(widget.id).await.0, MAX_STOCK);
    assert_eq!(fx.db.purchases().count().await.unwrap(), 0);
}

#[tokio::test]
async fn soft_policy_lowers_minimum() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 10, Some(8)).await;

    fx.db
        .selling(MinStockPolicy::Soft)
        .create(&fx.sale(dec!(0), "0", vec![sale_line(widget.id, 5, dec!(1.00))]))
        .await
        .unwrap();

    assert_eq!(fx.stock(widget.id).await, (5, Some(5)));
}

#[tokio::test]
async fn hard_policy_rejects_sale_below_minimum() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 10, Some(8)).await;

    let err = fx
        .db
        .selling(MinStockPolicy::Hard)
        .create(&fx.sale(dec!(0), "0", vec![sale_line(widget.id, 5, dec!(1.00))]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DbError::Domain(CoreError::BelowMinimumStock {
            resulting: 5,
            minimum: 8,
            ..
        })
    ));
    assert_eq!(fx.stock(widget.id).await, (10, Some(8)));
    assert_eq!(fx.db.sales().count().await.unwrap(), 0);

    // Staying at or above the minimum is fine
    fx.db
        .selling(MinStockPolicy::Hard)
        .create(&fx.sale(dec!(0), "0", vec![sale_line(widget.id, 2, dec!(1.00))]))
        .await
        .unwrap();
    assert_eq!(fx.stock(widget.id).await, (8, Some(8)));
}

#[tokio::test]
async fn failing_line_rolls_back_earlier_lines() {
    let fx = fixture().await;
    let plenty = fx.product("Plenty", 10, None).await;
    let scarce = fx.product("Scarce", 5, None).await;

    let err = fx
        .db
        .selling(MinStockPolicy::Soft)
        .create(&fx.sale(
            dec!(0),
            "23",
            vec![
                sale_line(plenty.id, 2, dec!(1.00)),
                sale_line(scarce.id, 9, dec!(1.00)),
            ],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
    assert_eq!(fx.stock(plenty.id).await.0, 10);
    assert_eq!(fx.stock(scarce.id).await.0, 5);
    assert_eq!(fx.db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_product_aborts_purchase() {
    let fx = fixture().await;

    let err = fx
        .db
        .purchasing()
        .create(&fx.purchase(0, "23", vec![purchase_line(999, 1, dec!(1.00))]))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(999))));
    assert_eq!(fx.db.purchases().count().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_counterparty_is_not_found() {
    let fx = fixture().await;
    let mut input = fx.purchase(0, "23", vec![]);
    input.supplier_id = 404;

    let err = fx.db.purchasing().create(&input).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_write() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 5, None).await;

    let err = fx
        .db
        .purchasing()
        .create(&fx.purchase(0, "23", vec![purchase_line(widget.id, 0, dec!(1.00))]))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Domain(CoreError::InvalidLine { line: 1, .. })));
    assert_eq!(fx.db.purchases().count().await.unwrap(), 0);
}

#[tokio::test]
async fn oversized_amounts_are_rejected_as_invalid_lines() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 5, None).await;
    let huge = dec!(100000000000000000000000);

    let err = fx
        .db
        .purchasing()
        .create(&fx.purchase(0, "23", vec![purchase_line(widget.id, 1_000_000, huge)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InvalidLine {
            line: 1,
            source: ValidationError::TooLarge { .. }
        })
    ));

    let err = fx
        .db
        .selling(MinStockPolicy::Soft)
        .create(&fx.sale(dec!(0), "23", vec![sale_line(widget.id, 1_000_000, huge)]))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InvalidLine { line: 1, .. })));

    assert_eq!(fx.stock(widget.id).await.0, 5);
    assert_eq!(fx.db.purchases().count().await.unwrap(), 0);
    assert_eq!(fx.db.sales().count().await.unwrap(), 0);
}

// =============================================================================
// Edit
// =============================================================================

#[tokio::test]
async fn purchase_edit_applies_only_the_quantity_delta() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 0, None).await;

    let purchase = fx
        .db
        .purchasing()
        .create(&fx.purchase(0, "0", vec![purchase_line(widget.id, 5, dec!(1.00))]))
        .await
        .unwrap();

    // Sell most of it so that undoing the full 5 would go negative
    fx.db
        .selling(MinStockPolicy::Soft)
        .create(&fx.sale(dec!(0), "0", vec![sale_line(widget.id, 4, dec!(2.00))]))
        .await
        .unwrap();
    assert_eq!(fx.stock(widget.id).await.0, 1);

    let line_id = fx.db.purchases().lines(purchase.id).await.unwrap()[0].id;
    let mut line = purchase_line(widget.id, 8, dec!(1.00));
    line.id = Some(line_id);

    let edited = fx
        .db
        .purchasing()
        .edit(purchase.id, &fx.purchase(0, "0", vec![line]))
        .await
        .unwrap();

    assert_eq!(fx.stock(widget.id).await.0, 4);
    assert_eq!(edited.total, dec!(8.00));

    // Still one line, same id
    let lines = fx.db.purchases().lines(purchase.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].id, line_id);
    assert_eq!(lines[0].line_total, dec!(8.00));
}

#[tokio::test]
async fn sale_edit_applies_only_the_quantity_delta() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 20, None).await;
    let sales = fx.db.selling(MinStockPolicy::Soft);

    let sale = sales
        .create(&fx.sale(dec!(0), "0", vec![sale_line(widget.id, 5, dec!(1.00))]))
        .await
        .unwrap();
    assert_eq!(fx.stock(widget.id).await.0, 15);

    let line_id = fx.db.sales().lines(sale.id).await.unwrap()[0].id;
    let mut line = sale_line(widget.id, 8, dec!(1.00));
    line.id = Some(line_id);

    sales
        .edit(sale.id, &fx.sale(dec!(0), "0", vec![line]))
        .await
        .unwrap();
    assert_eq!(fx.stock(widget.id).await.0, 12);
}

#[tokio::test]
async fn purchase_edit_swapping_product_moves_stock() {
    let fx = fixture().await;
    let a = fx.product("A", 0, None).await;
    let b = fx.product("B", 0, None).await;

    let purchase = fx
        .db
        .purchasing()
        .create(&fx.purchase(0, "0", vec![purchase_line(a.id, 4, dec!(1.00))]))
        .await
        .unwrap();
    assert_eq!(fx.stock(a.id).await.0, 4);

    let line_id = fx.db.purchases().lines(purchase.id).await.unwrap()[0].id;
    let mut line = purchase_line(b.id, 4, dec!(1.00));
    line.id = Some(line_id);

    fx.db
        .purchasing()
        .edit(purchase.id, &fx.purchase(0, "0", vec![line]))
        .await
        .unwrap();

    // A's minimum (3 after the receipt) follows its stock down
    assert_eq!(fx.stock(a.id).await, (0, Some(0)));
    assert_eq!(fx.stock(b.id).await.0, 4);
}

#[tokio::test]
async fn sale_edit_swapping_product_moves_stock() {
    let fx = fixture().await;
    let a = fx.product("A", 10, None).await;
    let b = fx.product("B", 10, None).await;
    let sales = fx.db.selling(MinStockPolicy::Hard);

    let sale = sales
        .create(&fx.sale(dec!(0), "0", vec![sale_line(a.id, 4, dec!(1.00))]))
        .await
        .unwrap();

    let line_id = fx.db.sales().lines(sale.id).await.unwrap()[0].id;
    let mut line = sale_line(b.id, 4, dec!(1.00));
    line.id = Some(line_id);

    sales
        .edit(sale.id, &fx.sale(dec!(0), "0", vec![line]))
        .await
        .unwrap();

    assert_eq!(fx.stock(a.id).await.0, 10);
    assert_eq!(fx.stock(b.id).await.0, 6);
}

#[tokio::test]
async fn edit_removing_and_adding_lines() {
    let fx = fixture().await;
    let a = fx.product("A", 0, None).await;
    let b = fx.product("B", 0, None).await;
    let c = fx.product("C", 0, None).await;

    let purchase = fx
        .db
        .purchasing()
        .create(&fx.purchase(
            0,
            "0",
            vec![
                purchase_line(a.id, 5, dec!(1.00)),
                purchase_line(b.id, 3, dec!(1.00)),
            ],
        ))
        .await
        .unwrap();

    let lines = fx.db.purchases().lines(purchase.id).await.unwrap();
    let mut keep = purchase_line(a.id, 5, dec!(1.00));
    keep.id = Some(lines[0].id);

    fx.db
        .purchasing()
        .edit(
            purchase.id,
            &fx.purchase(0, "0", vec![keep, purchase_line(c.id, 2, dec!(3.00))]),
        )
        .await
        .unwrap();

    assert_eq!(fx.stock(a.id).await.0, 5);
    assert_eq!(fx.stock(b.id).await.0, 0);
    assert_eq!(fx.stock(c.id).await.0, 2);

    let after = fx.db.purchases().lines(purchase.id).await.unwrap();
    assert_eq!(after.len(), 2);
    assert!(after.iter().all(|l| l.product_id != b.id));
}

#[tokio::test]
async fn sale_edit_removing_a_line_returns_its_stock() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 10, None).await;
    let sales = fx.db.selling(MinStockPolicy::Soft);

    let sale = sales
        .create(&fx.sale(dec!(0), "0", vec![sale_line(widget.id, 6, dec!(1.00))]))
        .await
        .unwrap();
    assert_eq!(fx.stock(widget.id).await.0, 4);

    let edited = sales.edit(sale.id, &fx.sale(dec!(0), "0", vec![])).await.unwrap();

    assert_eq!(fx.stock(widget.id).await.0, 10);
    assert_eq!(edited.total, dec!(0));
}

#[tokio::test]
async fn failed_edit_leaves_order_and_stock_untouched() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 10, None).await;
    let sales = fx.db.selling(MinStockPolicy::Soft);

    let sale = sales
        .create(&fx.sale(dec!(1.00), "23", vec![sale_line(widget.id, 4, dec!(5.00))]))
        .await
        .unwrap();

    let line_id = fx.db.sales().lines(sale.id).await.unwrap()[0].id;
    let mut line = sale_line(widget.id, 40, dec!(5.00));
    line.id = Some(line_id);

    let err = sales
        .edit(sale.id, &fx.sale(dec!(2.00), "10", vec![line]))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

    let stored = fx.db.sales().get_by_id(sale.id).await.unwrap().unwrap();
    assert_eq!(stored.discount_amount, dec!(1.00));
    assert_eq!(stored.tax_percentage, dec!(23));
    assert_eq!(stored.total, sale.total);

    let lines = fx.db.sales().lines(sale.id).await.unwrap();
    assert_eq!(lines[0].quantity, 4);
    assert_eq!(fx.stock(widget.id).await.0, 6);
}

#[tokio::test]
async fn edit_with_foreign_line_id_is_rejected() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 0, None).await;
    let service = fx.db.purchasing();

    let first = service
        .create(&fx.purchase(0, "0", vec![purchase_line(widget.id, 1, dec!(1.00))]))
        .await
        .unwrap();
    let second = service
        .create(&fx.purchase(0, "0", vec![purchase_line(widget.id, 1, dec!(1.00))]))
        .await
        .unwrap();

    let foreign_id = fx.db.purchases().lines(second.id).await.unwrap()[0].id;
    let mut line = purchase_line(widget.id, 50, dec!(1.00));
    line.id = Some(foreign_id);

    let err = service
        .edit(first.id, &fx.purchase(0, "0", vec![line]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DbError::Domain(CoreError::LineNotInOrder { order: "purchase", .. })
    ));
    assert_eq!(fx.stock(widget.id).await.0, 2);
}

#[tokio::test]
async fn edit_of_missing_order_is_not_found() {
    let fx = fixture().await;
    let err = fx
        .db
        .selling(MinStockPolicy::Soft)
        .edit(77, &fx.sale(dec!(0), "0", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

#[tokio::test]
async fn unparseable_tax_on_edit_keeps_existing_tax() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 10, None).await;
    let sales = fx.db.selling(MinStockPolicy::Soft);

    let sale = sales
        .create(&fx.sale(dec!(0), "23", vec![sale_line(widget.id, 1, dec!(10.00))]))
        .await
        .unwrap();
    assert_eq!(sale.tax_amount, dec!(2.30));

    let line_id = fx.db.sales().lines(sale.id).await.unwrap()[0].id;
    let line = SaleLineInput {
        id: Some(line_id),
        ..sale_line(widget.id, 2, dec!(10.00))
    };

    let edited = sales
        .edit(sale.id, &fx.sale(dec!(0), "abc", vec![line]))
        .await
        .unwrap();

    assert_eq!(edited.subtotal, dec!(20.00));
    assert_eq!(edited.tax_amount, dec!(2.30));
    assert_eq!(edited.total, dec!(22.30));
    assert_eq!(edited.tax_percentage, dec!(23));
}

// =============================================================================
// Totals
// =============================================================================

#[tokio::test]
async fn recompute_totals_is_idempotent() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 0, None).await;

    let purchase = fx
        .db
        .purchasing()
        .create(&fx.purchase(7, "23", vec![purchase_line(widget.id, 3, dec!(3.33))]))
        .await
        .unwrap();

    let rate = TaxRate::parse_percentage("23");
    let once = fx.db.purchasing().recompute_totals(purchase.id, rate).await.unwrap();
    let twice = fx.db.purchasing().recompute_totals(purchase.id, rate).await.unwrap();

    assert_eq!(once.subtotal, purchase.subtotal);
    assert_eq!(once.total, purchase.total);
    assert_eq!(
        (once.subtotal, once.discount_amount, once.tax_amount, once.total),
        (twice.subtotal, twice.discount_amount, twice.tax_amount, twice.total)
    );
}

#[tokio::test]
async fn recompute_without_rate_preserves_tax_and_zero_rate_clears_it() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 10, None).await;
    let sales = fx.db.selling(MinStockPolicy::Soft);

    let sale = sales
        .create(&fx.sale(dec!(0), "23", vec![sale_line(widget.id, 1, dec!(10.00))]))
        .await
        .unwrap();

    let kept = sales.recompute_totals(sale.id, None).await.unwrap();
    assert_eq!(kept.tax_amount, dec!(2.30));

    let cleared = sales
        .recompute_totals(sale.id, Some(TaxRate::zero()))
        .await
        .unwrap();
    assert_eq!(cleared.tax_amount, dec!(0.00));
    assert_eq!(cleared.total, dec!(10.00));
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test]
async fn deleting_orders_cascades_lines_and_keeps_stock() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 10, None).await;

    let purchase = fx
        .db
        .purchasing()
        .create(&fx.purchase(0, "0", vec![purchase_line(widget.id, 5, dec!(1.00))]))
        .await
        .unwrap();
    let sale = fx
        .db
        .selling(MinStockPolicy::Soft)
        .create(&fx.sale(dec!(0), "0", vec![sale_line(widget.id, 3, dec!(1.00))]))
        .await
        .unwrap();
    assert_eq!(fx.stock(widget.id).await.0, 12);

    fx.db.purchasing().delete(purchase.id).await.unwrap();
    fx.db.selling(MinStockPolicy::Soft).delete(sale.id).await.unwrap();

    assert!(fx.db.purchases().get_by_id(purchase.id).await.unwrap().is_none());
    assert!(fx.db.purchases().lines(purchase.id).await.unwrap().is_empty());
    assert!(fx.db.sales().lines(sale.id).await.unwrap().is_empty());
    assert_eq!(fx.stock(widget.id).await.0, 12);

    let err = fx.db.purchasing().delete(purchase.id).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

#[tokio::test]
async fn referenced_records_cannot_be_deleted() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 10, None).await;

    fx.db
        .purchasing()
        .create(&fx.purchase(0, "0", vec![purchase_line(widget.id, 1, dec!(1.00))]))
        .await
        .unwrap();
    fx.db
        .selling(MinStockPolicy::Soft)
        .create(&fx.sale(dec!(0), "0", vec![sale_line(widget.id, 1, dec!(1.00))]))
        .await
        .unwrap();

    let product_err = fx.db.products().delete(widget.id).await.unwrap_err();
    assert!(matches!(product_err, DbError::ForeignKeyViolation { .. }));
    assert_eq!(
        product_err.user_message(),
        "Cannot delete, still referenced by other records"
    );

    let supplier_err = fx.db.suppliers().delete(fx.supplier_id).await.unwrap_err();
    assert!(matches!(supplier_err, DbError::ForeignKeyViolation { .. }));

    let customer_err = fx.db.customers().delete(fx.customer_id).await.unwrap_err();
    assert!(matches!(customer_err, DbError::ForeignKeyViolation { .. }));

    assert!(fx.db.products().get_by_id(widget.id).await.unwrap().is_some());
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn list_filters_by_counterparty_newest_first() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 100, None).await;
    let other = fx.db.customers().insert("Other", None).await.unwrap();
    let sales = fx.db.selling(MinStockPolicy::Soft);

    let mut older = fx.sale(dec!(0), "0", vec![sale_line(widget.id, 1, dec!(1.00))]);
    older.occurred_at -= chrono::Duration::days(2);
    let older = sales.create(&older).await.unwrap();
    let newer = sales
        .create(&fx.sale(dec!(0), "0", vec![sale_line(widget.id, 1, dec!(1.00))]))
        .await
        .unwrap();

    let mut for_other = fx.sale(dec!(0), "0", vec![sale_line(widget.id, 1, dec!(1.00))]);
    for_other.customer_id = other.id;
    sales.create(&for_other).await.unwrap();

    let listed = fx
        .db
        .sales()
        .list(&OrderFilter {
            counterparty_id: Some(fx.customer_id),
            ..Default::default()
        })
        .await
        .unwrap();

    let ids: Vec<i64> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    let limited = fx
        .db
        .sales()
        .list(&OrderFilter {
            limit: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn dashboard_reflects_orders() {
    let fx = fixture().await;
    let widget = fx.product("Widget", 10, Some(8)).await;
    let gadget = fx.product("Gadget", 10, None).await;
    let sales = fx.db.selling(MinStockPolicy::Soft);

    sales
        .create(&fx.sale(
            dec!(0),
            "0",
            vec![
                sale_line(widget.id, 3, dec!(2.50)),
                sale_line(gadget.id, 1, dec!(4.00)),
            ],
        ))
        .await
        .unwrap();

    let today = chrono::Utc::now().date_naive();
    let summary = fx.db.dashboard().summary(today).await.unwrap();
    assert_eq!(summary.sales_today, dec!(11.50));
    assert_eq!(summary.sale_count_today, 1);
    assert_eq!(summary.product_count, 2);
    assert_eq!(summary.low_stock_count, 1);

    let low = fx.db.dashboard().low_stock(10).await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].product_id, widget.id);
    assert_eq!((low[0].stock, low[0].stock_minimum), (7, 7));

    let top = fx.db.dashboard().top_selling(1).await.unwrap();
    assert_eq!(top[0].product_id, widget.id);
    assert_eq!(top[0].quantity_sold, 3);

    let days = fx.db.dashboard().daily_sales(today, 7).await.unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[6], (today, dec!(11.50)));
    assert_eq!(days[0].1, dec!(0));
}
