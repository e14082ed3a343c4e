use tabex_core::{ColumnDescriptor, Record, Value};

/// Demo record exported by the `tabex` binary.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub stock: i64,
}

impl Record for Product {
    const TYPE_NAME: &'static str = "Product";

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::integer("Id"),
            ColumnDescriptor::text("Name"),
            ColumnDescriptor::decimal("Price"),
            ColumnDescriptor::integer("Stock"),
        ]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.name.as_str().into(),
            self.price.into(),
            self.stock.into(),
        ]
    }
}

/// Synthetic catalogue: ids `1..=count`, price `100 + id`, stock `id`.
pub fn generate_products(count: u32) -> Vec<Product> {
    (1..=i64::from(count))
        .map(|i| Product {
            id: i,
            name: format!("Product {i}"),
            price: 100.0 + i as f64,
            stock: i,
        })
        .collect()
}
