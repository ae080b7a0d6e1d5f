// Store catalog agent
//
// Design decisions:
// - Prices cross the schema boundary in major units (19.99) and are stored as
//   integer cents; conversion happens here, never in the store
// - Inventory checks cover active products only
// - Stock and price validation lives in the store so every caller gets the
//   same in-band messages

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use siteward_core::{
    Agent, Capability, CapabilitySet, HostContext, NewProduct, ParamKind, ParamSpec, Product,
    ProductPatch, ProductStatus, Tool, ToolArguments, ToolOutcome, ToolSchema,
};

use crate::common::{limit_arg, require_u64, MAX_LIST_LIMIT};

const SYSTEM_PROMPT: &str = r#"# Store Assistant

You manage the site's product catalog and inventory.

## What you can do

- List products, optionally filtered by status
- Inspect a single product
- Create products (they start as drafts unless told otherwise)
- Update product details, prices, stock, and status
- Check inventory for products that are low or out of stock

## Guidelines

- Quote prices in major units (19.99), never cents
- Create new products as drafts and let the user activate them
- Confirm before changing a price or archiving a product
- When stock runs low, report the affected products and suggest reorder
  quantities
"#;

/// Default low-stock threshold for inventory checks
const LOW_STOCK_THRESHOLD: u64 = 5;

fn product_json(product: &Product) -> Value {
    json!({
        "id": product.id,
        "name": product.name,
        "description": product.description,
        "sku": product.sku,
        "price": product.price_cents as f64 / 100.0,
        "stock_quantity": product.stock_quantity,
        "status": product.status,
        "created_at": product.created_at,
        "updated_at": product.updated_at,
    })
}

fn price_to_cents(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

/// Builtin agent gated on `manage_catalog`
pub struct StoreAssistantAgent;

#[async_trait]
impl Agent for StoreAssistantAgent {
    fn id(&self) -> &str {
        "store-assistant"
    }

    fn name(&self) -> &str {
        "Store Assistant"
    }

    fn description(&self) -> &str {
        "Manages the product catalog and inventory"
    }

    fn icon(&self) -> &str {
        "shopping-cart"
    }

    fn category(&self) -> &str {
        "commerce"
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn required_capabilities(&self) -> CapabilitySet {
        CapabilitySet::of([Capability::manage_catalog()])
    }

    fn welcome_message(&self) -> Option<String> {
        Some("I can manage products, prices, and stock levels. What do you need?".to_string())
    }

    fn suggested_prompts(&self) -> Vec<String> {
        vec![
            "List active products".to_string(),
            "Which products are low on stock?".to_string(),
            "Create a draft product".to_string(),
        ]
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(ListProductsTool),
            Arc::new(GetProductTool),
            Arc::new(CreateProductTool),
            Arc::new(UpdateProductTool),
            Arc::new(CheckInventoryTool),
        ]
    }

    async fn ensure_ready(&self, host: &HostContext) -> Result<(), String> {
        if host.catalog.is_some() {
            Ok(())
        } else {
            Err("The commerce catalog is not active".to_string())
        }
    }
}

// ============================================================================
// Tools
// ============================================================================

struct ListProductsTool;

#[async_trait]
impl Tool for ListProductsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("list_products", "List catalog products, ordered by id")
            .param(
                ParamSpec::optional("status", ParamKind::String, "Filter by status")
                    .one_of(["draft", "active", "archived"]),
            )
            .param(
                ParamSpec::optional("limit", ParamKind::Integer, "Maximum number of products")
                    .default_value(json!(20)),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.catalog.as_ref() else {
            return ToolOutcome::failure("The commerce catalog is not active");
        };
        let status = match args.str("status").map(str::parse::<ProductStatus>) {
            None => None,
            Some(Ok(status)) => Some(status),
            Some(Err(message)) => return ToolOutcome::failure(message),
        };

        match store.list_products(status, limit_arg(&args, 20)).await {
            Ok(products) => {
                let listed: Vec<Value> = products.iter().map(product_json).collect();
                ToolOutcome::success(json!({ "products": listed, "count": listed.len() }))
            }
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct GetProductTool;

#[async_trait]
impl Tool for GetProductTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("get_product", "Fetch a single product").param(ParamSpec::required(
            "product_id",
            ParamKind::Integer,
            "Id of the product",
        ))
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.catalog.as_ref() else {
            return ToolOutcome::failure("The commerce catalog is not active");
        };
        let id = match require_u64(&args, "product_id") {
            Ok(id) => id,
            Err(message) => return ToolOutcome::failure(message),
        };

        match store.get_product(id).await {
            Ok(Some(product)) => ToolOutcome::success(json!({ "product": product_json(&product) })),
            Ok(None) => ToolOutcome::failure(format!("Product not found: {id}")),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct CreateProductTool;

#[async_trait]
impl Tool for CreateProductTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("create_product", "Create a new product")
            .param(ParamSpec::required("name", ParamKind::String, "Product name"))
            .param(ParamSpec::required(
                "price",
                ParamKind::Number,
                "Price in major units, for example 19.99",
            ))
            .param(ParamSpec::optional(
                "description",
                ParamKind::String,
                "Product description",
            ))
            .param(ParamSpec::optional(
                "stock_quantity",
                ParamKind::Integer,
                "Initial stock on hand; defaults to 0",
            ))
            .param(ParamSpec::optional(
                "sku",
                ParamKind::String,
                "Stock keeping unit; generated when omitted",
            ))
            .param(
                ParamSpec::optional("status", ParamKind::String, "Initial status; defaults to draft")
                    .one_of(["draft", "active", "archived"]),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.catalog.as_ref() else {
            return ToolOutcome::failure("The commerce catalog is not active");
        };
        let Some(price) = args.f64("price") else {
            return ToolOutcome::failure("Missing required parameter: price");
        };
        let status = match args.str("status").map(str::parse::<ProductStatus>) {
            None => None,
            Some(Ok(status)) => Some(status),
            Some(Err(message)) => return ToolOutcome::failure(message),
        };

        let new = NewProduct {
            name: args.str("name").unwrap_or_default().to_string(),
            description: args.str("description").unwrap_or_default().to_string(),
            sku: args.str("sku").map(str::to_string),
            price_cents: price_to_cents(price),
            stock_quantity: args.i64("stock_quantity").unwrap_or(0),
            status,
        };

        match store.create_product(new).await {
            Ok(product) => ToolOutcome::success(json!({ "product": product_json(&product) })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct UpdateProductTool;

#[async_trait]
impl Tool for UpdateProductTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new("update_product", "Update fields of an existing product")
            .param(ParamSpec::required(
                "product_id",
                ParamKind::Integer,
                "Id of the product to update",
            ))
            .param(ParamSpec::optional("name", ParamKind::String, "New name"))
            .param(ParamSpec::optional(
                "description",
                ParamKind::String,
                "New description",
            ))
            .param(ParamSpec::optional(
                "price",
                ParamKind::Number,
                "New price in major units",
            ))
            .param(ParamSpec::optional(
                "stock_quantity",
                ParamKind::Integer,
                "New stock on hand",
            ))
            .param(
                ParamSpec::optional("status", ParamKind::String, "New status")
                    .one_of(["draft", "active", "archived"]),
            )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.catalog.as_ref() else {
            return ToolOutcome::failure("The commerce catalog is not active");
        };
        let id = match require_u64(&args, "product_id") {
            Ok(id) => id,
            Err(message) => return ToolOutcome::failure(message),
        };
        let status = match args.str("status").map(str::parse::<ProductStatus>) {
            None => None,
            Some(Ok(status)) => Some(status),
            Some(Err(message)) => return ToolOutcome::failure(message),
        };

        let patch = ProductPatch {
            name: args.str("name").map(str::to_string),
            description: args.str("description").map(str::to_string),
            price_cents: args.f64("price").map(price_to_cents),
            stock_quantity: args.i64("stock_quantity"),
            status,
        };

        match store.update_product(id, patch).await {
            Ok(product) => ToolOutcome::success(json!({ "product": product_json(&product) })),
            Err(e) => ToolOutcome::host_error(e),
        }
    }
}

struct CheckInventoryTool;

#[async_trait]
impl Tool for CheckInventoryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "check_inventory",
            "Report active products that are low on stock or out of stock",
        )
        .param(
            ParamSpec::optional(
                "threshold",
                ParamKind::Integer,
                "Stock level at or below which a product counts as low",
            )
            .default_value(json!(LOW_STOCK_THRESHOLD)),
        )
    }

    async fn execute(&self, args: ToolArguments, host: &HostContext) -> ToolOutcome {
        let Some(store) = host.catalog.as_ref() else {
            return ToolOutcome::failure("The commerce catalog is not active");
        };
        let threshold = if args.has("threshold") {
            match require_u64(&args, "threshold") {
                Ok(t) => t as i64,
                Err(message) => return ToolOutcome::failure(message),
            }
        } else {
            LOW_STOCK_THRESHOLD as i64
        };

        let products = match store
            .list_products(Some(ProductStatus::Active), MAX_LIST_LIMIT)
            .await
        {
            Ok(products) => products,
            Err(e) => return ToolOutcome::host_error(e),
        };

        let out_of_stock: Vec<Value> = products
            .iter()
            .filter(|p| p.stock_quantity == 0)
            .map(product_json)
            .collect();
        let low_stock: Vec<Value> = products
            .iter()
            .filter(|p| p.stock_quantity > 0 && p.stock_quantity <= threshold)
            .map(product_json)
            .collect();

        ToolOutcome::success(json!({
            "threshold": threshold,
            "checked": products.len(),
            "out_of_stock": out_of_stock,
            "low_stock": low_stock,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use siteward_core::{CatalogStore, InMemoryCatalogStore};

    fn host() -> (HostContext, InMemoryCatalogStore) {
        let store = InMemoryCatalogStore::new();
        let host = HostContext::new().with_catalog(Arc::new(store.clone()));
        (host, store)
    }

    fn product(id: u64, name: &str, status: ProductStatus, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id,
            name: name.to_string(),
            description: String::new(),
            sku: format!("sku-{id}"),
            price_cents: 1000,
            stock_quantity: stock,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_price_to_cents_rounds_to_the_nearest_cent() {
        assert_eq!(price_to_cents(19.99), 1999);
        assert_eq!(price_to_cents(0.0), 0);
        assert_eq!(price_to_cents(10.0), 1000);
        assert_eq!(price_to_cents(1.005), 100);
    }

    #[tokio::test]
    async fn test_create_product_converts_price_and_defaults() {
        let (host, _store) = host();
        let tool = CreateProductTool;
        let args = tool
            .schema()
            .check_args(&json!({ "name": "Mug", "price": 19.99 }))
            .unwrap();

        let outcome = tool.execute(args, &host).await;
        let ToolOutcome::Success(payload) = outcome else {
            panic!("expected success");
        };
        assert_eq!(payload["product"]["price"], 19.99);
        assert_eq!(payload["product"]["status"], "draft");
        assert_eq!(payload["product"]["sku"], "sku-1");
        assert_eq!(payload["product"]["stock_quantity"], 0);
    }

    #[tokio::test]
    async fn test_create_product_rejects_negative_price_in_band() {
        let (host, _store) = host();
        let tool = CreateProductTool;
        let args = tool
            .schema()
            .check_args(&json!({ "name": "Mug", "price": -1.0 }))
            .unwrap();

        let outcome = tool.execute(args, &host).await;
        assert!(matches!(
            &outcome,
            ToolOutcome::Failure(msg) if msg == "Price must be non-negative"
        ));
    }

    #[tokio::test]
    async fn test_create_product_reports_duplicate_sku() {
        let (host, _store) = host();
        let tool = CreateProductTool;
        let request = json!({ "name": "Mug", "price": 5.0, "sku": "MUG-1" });

        let args = tool.schema().check_args(&request).unwrap();
        let first = tool.execute(args, &host).await;
        assert!(first.is_success());

        let args = tool.schema().check_args(&request).unwrap();
        let second = tool.execute(args, &host).await;
        assert!(matches!(
            &second,
            ToolOutcome::Failure(msg) if msg == "SKU already in use: MUG-1"
        ));
    }

    #[tokio::test]
    async fn test_update_product_changes_price() {
        let (host, store) = host();
        store
            .seed([product(1, "Mug", ProductStatus::Active, 10)])
            .await;

        let tool = UpdateProductTool;
        let args = tool
            .schema()
            .check_args(&json!({ "product_id": 1, "price": 12.5 }))
            .unwrap();
        let outcome = tool.execute(args, &host).await;
        let ToolOutcome::Success(payload) = outcome else {
            panic!("expected success");
        };
        assert_eq!(payload["product"]["price"], 12.5);

        let stored = store.get_product(1).await.unwrap().unwrap();
        assert_eq!(stored.price_cents, 1250);
    }

    #[tokio::test]
    async fn test_check_inventory_splits_by_threshold_and_skips_drafts() {
        let (host, store) = host();
        store
            .seed([
                product(1, "Empty", ProductStatus::Active, 0),
                product(2, "Low", ProductStatus::Active, 3),
                product(3, "Plenty", ProductStatus::Active, 50),
                product(4, "Draft Empty", ProductStatus::Draft, 0),
            ])
            .await;

        let tool = CheckInventoryTool;
        let args = tool.schema().check_args(&json!({})).unwrap();
        let outcome = tool.execute(args, &host).await;
        let ToolOutcome::Success(payload) = outcome else {
            panic!("expected success");
        };
        assert_eq!(payload["checked"], 3);
        assert_eq!(payload["out_of_stock"].as_array().unwrap().len(), 1);
        assert_eq!(payload["out_of_stock"][0]["name"], "Empty");
        assert_eq!(payload["low_stock"].as_array().unwrap().len(), 1);
        assert_eq!(payload["low_stock"][0]["name"], "Low");
    }

    #[tokio::test]
    async fn test_get_missing_product_is_in_band() {
        let (host, _store) = host();
        let tool = GetProductTool;
        let args = tool
            .schema()
            .check_args(&json!({ "product_id": 77 }))
            .unwrap();
        let outcome = tool.execute(args, &host).await;
        assert!(matches!(&outcome, ToolOutcome::Failure(msg) if msg == "Product not found: 77"));
    }
}
