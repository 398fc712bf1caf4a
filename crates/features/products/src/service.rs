use crate::domain::{
    CreateProduct, DigitalProduct, ProductFields, ProductList, ProductQuery, ProductStats,
};
use crate::error::ProductError;
use crate::repository::ProductRepository;
use tracing::info;
use whub_kernel::clock;
use whub_kernel::domain::config::MarketplaceConfig;
use whub_kernel::listing::Page;
use whub_kernel::safe_nanoid;

pub async fn create(
    repo: &ProductRepository,
    input: CreateProduct,
    config: &MarketplaceConfig,
) -> Result<DigitalProduct, ProductError> {
    input.validate()?;

    let product = input.into_product(safe_nanoid!(), &config.currency, &clock::now_timestamp());
    repo.insert(&product).await?;
    info!(
        id = %product.id,
        professional_id = %product.professional_id,
        category = %product.category,
        "Product created"
    );
    Ok(product)
}

/// Statistics cover every product, filters only narrow the items.
pub async fn list(
    repo: &ProductRepository,
    query: &ProductQuery,
    config: &MarketplaceConfig,
) -> Result<ProductList, ProductError> {
    query.validate()?;
    let all = repo.list().await?;
    let stats = ProductStats::compute(&all, clock::today(), config.stats_window_days);

    let page = Page::new(query.offset, query.limit, config);
    let (items, total) = page.apply(query.apply(all)?);
    Ok(ProductList { items, total, offset: page.offset, limit: page.limit, stats })
}

pub async fn get(repo: &ProductRepository, id: &str) -> Result<DigitalProduct, ProductError> {
    repo.get(id).await?.ok_or_else(|| not_found(id))
}

pub async fn update(
    repo: &ProductRepository,
    id: &str,
    fields: ProductFields,
    config: &MarketplaceConfig,
) -> Result<DigitalProduct, ProductError> {
    fields.validate()?;
    let mut product = get(repo, id).await?;

    product.apply(fields, &config.currency, &clock::now_timestamp());
    save(repo, &product).await?;
    info!(id, "Product updated");
    Ok(product)
}

pub async fn set_active(
    repo: &ProductRepository,
    id: &str,
    is_active: bool,
) -> Result<DigitalProduct, ProductError> {
    let mut product = get(repo, id).await?;

    product.set_active(is_active, &clock::now_timestamp());
    save(repo, &product).await?;
    info!(id, is_active, "Product activation changed");
    Ok(product)
}

/// Counts one sale; inactive products are not for sale.
pub async fn record_sale(
    repo: &ProductRepository,
    id: &str,
) -> Result<DigitalProduct, ProductError> {
    let product = get(repo, id).await?;
    if !product.is_active {
        return Err(ProductError::Conflict {
            message: format!("product {id} is inactive and cannot be sold").into(),
            context: None,
        });
    }

    if !repo.increment_sales(id).await? {
        return Err(not_found(id));
    }
    let product = get(repo, id).await?;
    info!(id, sales_count = product.sales_count, "Product sale recorded");
    Ok(product)
}

pub async fn delete(repo: &ProductRepository, id: &str) -> Result<DigitalProduct, ProductError> {
    let removed = repo.delete(id).await?.ok_or_else(|| not_found(id))?;
    info!(id, "Product deleted");
    Ok(removed)
}

async fn save(repo: &ProductRepository, product: &DigitalProduct) -> Result<(), ProductError> {
    if repo.update(product).await? { Ok(()) } else { Err(not_found(&product.id)) }
}

fn not_found(id: &str) -> ProductError {
    ProductError::NotFound { message: format!("product {id}").into(), context: None }
}
