use crate::domain::{CostSummary, PlatformTool, StatusCounts, ToolInput, ToolList, ToolQuery};
use crate::error::PlatformError;
use crate::repository::ToolRepository;
use tracing::info;
use whub_kernel::clock;
use whub_kernel::domain::config::MarketplaceConfig;
use whub_kernel::listing::Page;
use whub_kernel::safe_nanoid;

pub async fn create(
    repo: &ToolRepository,
    input: ToolInput,
    config: &MarketplaceConfig,
) -> Result<PlatformTool, PlatformError> {
    input.validate()?;

    let tool = input.into_tool(safe_nanoid!(), &config.currency, &clock::now_timestamp());
    repo.insert(&tool).await?;
    info!(
        id = %tool.id,
        name = %tool.name,
        monthly_cost = tool.monthly_cost,
        "Platform tool added"
    );
    Ok(tool)
}

pub async fn list(
    repo: &ToolRepository,
    query: &ToolQuery,
    config: &MarketplaceConfig,
) -> Result<ToolList, PlatformError> {
    let all = repo.list().await?;
    let stats = StatusCounts::compute(&all);

    let page = Page::new(query.offset, query.limit, config);
    let (items, total) = page.apply(query.apply(all));
    Ok(ToolList { items, total, offset: page.offset, limit: page.limit, stats })
}

pub async fn summary(
    repo: &ToolRepository,
    config: &MarketplaceConfig,
) -> Result<CostSummary, PlatformError> {
    let tools = repo.list().await?;
    Ok(CostSummary::compute(&tools, clock::today(), config.renewal_horizon_days))
}

pub async fn get(repo: &ToolRepository, id: &str) -> Result<PlatformTool, PlatformError> {
    repo.get(id).await?.ok_or_else(|| not_found(id))
}

pub async fn update(
    repo: &ToolRepository,
    id: &str,
    input: ToolInput,
    config: &MarketplaceConfig,
) -> Result<PlatformTool, PlatformError> {
    input.validate()?;
    let mut tool = get(repo, id).await?;

    tool.apply(input, &config.currency, &clock::now_timestamp());
    if !repo.update(&tool).await? {
        return Err(not_found(id));
    }
    info!(id, status = %tool.status, "Platform tool updated");
    Ok(tool)
}

pub async fn delete(repo: &ToolRepository, id: &str) -> Result<PlatformTool, PlatformError> {
    let removed = repo.delete(id).await?.ok_or_else(|| not_found(id))?;
    info!(id, "Platform tool deleted");
    Ok(removed)
}

fn not_found(id: &str) -> PlatformError {
    PlatformError::NotFound { message: format!("platform tool {id}").into(), context: None }
}
