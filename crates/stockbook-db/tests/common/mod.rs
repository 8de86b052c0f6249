//! Shared fixtures for the order integration tests.

#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use stockbook_core::{
    NewProduct, NewSupplier, Product, PurchaseInput, PurchaseLineInput, SaleInput, SaleLineInput,
};
use stockbook_db::{Database, DbConfig};

pub struct Fixture {
    pub db: Database,
    pub supplier_id: i64,
    pub customer_id: i64,
}

/// In-memory database with one supplier and one customer.
pub async fn fixture() -> Fixture {
    with_database(Database::new(DbConfig::in_memory()).await.unwrap()).await
}

pub async fn with_database(db: Database) -> Fixture {
    let supplier = db
        .suppliers()
        .insert(&NewSupplier {
            name: "Acme".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let customer = db.customers().insert("Walk-in", None).await.unwrap();

    Fixture {
        db,
        supplier_id: supplier.id,
        customer_id: customer.id,
    }
}

impl Fixture {
    pub async fn product(&self, name: &str, stock: i64, minimum: Option<i64>) -> Product {
        self.db
            .products()
            .insert(&NewProduct {
                name: name.to_string(),
                description: None,
                category_id: None,
                supplier_id: None,
                reference_cost: Decimal::ONE,
                margin_percentage: Decimal::ZERO,
                stock,
                stock_minimum: Some(minimum.unwrap_or(0)),
            })
            .await
            .unwrap()
    }

    /// `(stock, stock_minimum)` as currently stored.
    pub async fn stock(&self, product_id: i64) -> (i64, Option<i64>) {
        let p = self.db.products().get_by_id(product_id).await.unwrap().unwrap();
        (p.stock, p.stock_minimum)
    }

    pub fn purchase(
        &self,
        discount: i64,
        tax: &str,
        lines: Vec<PurchaseLineInput>,
    ) -> PurchaseInput {
        PurchaseInput {
            supplier_id: self.supplier_id,
            occurred_at: Utc::now(),
            discount_percentage: discount,
            tax_percentage: tax.to_string(),
            lines,
        }
    }

    pub fn sale(
        &self,
        discount_amount: Decimal,
        tax: &str,
        lines: Vec<SaleLineInput>,
    ) -> SaleInput {
        SaleInput {
            customer_id: self.customer_id,
            occurred_at: Utc::now(),
            discount_percentage: 0,
            discount_amount,
            tax_percentage: tax.to_string(),
            lines,
        }
    }
}

pub fn purchase_line(product_id: i64, quantity: i64, unit_price: Decimal) -> PurchaseLineInput {
    PurchaseLineInput {
        id: None,
        product_id,
        quantity,
        unit_price,
    }
}

pub fn sale_line(product_id: i64, quantity: i64, unit_price: Decimal) -> SaleLineInput {
    SaleLineInput {
        id: None,
        product_id,
        quantity,
        unit_price,
        discount_percentage: Decimal::ZERO,
    }
}
