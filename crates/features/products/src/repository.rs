use crate::domain::{DigitalProduct, ProductCategory};
use crate::error::{ProductError, ProductErrorExt};
use whub_database::{Database, SurrealValue, Table};
use whub_kernel::badge::StatusBadge;
use whub_kernel::domain::constants::PRODUCT;

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct ProductRow {
    key: String,
    professional_id: String,
    title: String,
    description: String,
    category: String,
    price: f64,
    currency: String,
    cover_image_url: Option<String>,
    file_url: Option<String>,
    preview_url: Option<String>,
    duration_minutes: Option<i64>,
    pages: Option<i64>,
    tags: Vec<String>,
    is_active: bool,
    sales_count: i64,
    created_at: String,
    updated_at: String,
}

impl From<&DigitalProduct> for ProductRow {
    fn from(p: &DigitalProduct) -> Self {
        Self {
            key: p.id.clone(),
            professional_id: p.professional_id.clone(),
            title: p.title.clone(),
            description: p.description.clone(),
            category: p.category.to_string(),
            price: p.price,
            currency: p.currency.clone(),
            cover_image_url: p.cover_image_url.clone(),
            file_url: p.file_url.clone(),
            preview_url: p.preview_url.clone(),
            duration_minutes: p.duration_minutes,
            pages: p.pages,
            tags: p.tags.clone(),
            is_active: p.is_active,
            sales_count: p.sales_count,
            created_at: p.created_at.clone(),
            updated_at: p.updated_at.clone(),
        }
    }
}

impl TryFrom<ProductRow> for DigitalProduct {
    type Error = ProductError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category: ProductCategory = row.category.parse().map_err(|_| {
            ProductError::from(format!("unknown category '{}' on {}", row.category, row.key))
        })?;
        Ok(Self {
            id: row.key,
            professional_id: row.professional_id,
            title: row.title,
            description: row.description,
            category,
            price: row.price,
            currency: row.currency,
            cover_image_url: row.cover_image_url,
            file_url: row.file_url,
            preview_url: row.preview_url,
            duration_minutes: row.duration_minutes,
            pages: row.pages,
            tags: row.tags,
            is_active: row.is_active,
            sales_count: row.sales_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
            badge: row.is_active.badge(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    table: Table<ProductRow>,
}

impl ProductRepository {
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self { table: Table::new(database, PRODUCT) }
    }

    pub async fn list(&self) -> Result<Vec<DigitalProduct>, ProductError> {
        let rows = self.table.all().await.context("Listing products")?;
        rows.into_iter().map(DigitalProduct::try_from).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Option<DigitalProduct>, ProductError> {
        let row = self.table.find(id).await.context("Loading product")?;
        row.map(DigitalProduct::try_from).transpose()
    }

    pub async fn insert(&self, product: &DigitalProduct) -> Result<(), ProductError> {
        self.table.insert(product.into()).await.context("Storing product")
    }

    pub async fn update(&self, product: &DigitalProduct) -> Result<bool, ProductError> {
        self.table.replace(&product.id, product.into()).await.context("Updating product")
    }

    /// Adds one sale in place. Returns `false` when the product does not exist.
    pub async fn increment_sales(&self, id: &str) -> Result<bool, ProductError> {
        self.table.increment(id, "sales_count").await.context("Recording product sale")
    }

    pub async fn delete(&self, id: &str) -> Result<Option<DigitalProduct>, ProductError> {
        let row = self.table.remove(id).await.context("Deleting product")?;
        row.map(DigitalProduct::try_from).transpose()
    }
}
