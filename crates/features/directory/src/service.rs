use crate::domain::{Listing, ListingInput, ListingKind, ListingList, ListingQuery, ListingStats};
use crate::error::DirectoryError;
use crate::repository::ListingRepository;
use tracing::info;
use whub_kernel::clock;
use whub_kernel::domain::config::MarketplaceConfig;
use whub_kernel::links::ContactLinks;
use whub_kernel::listing::Page;
use whub_kernel::safe_nanoid;

pub async fn create(
    repo: &ListingRepository,
    kind: ListingKind,
    input: ListingInput,
) -> Result<Listing, DirectoryError> {
    input.validate()?;

    let listing = input.into_listing(safe_nanoid!(), kind, &clock::now_timestamp());
    repo.insert(&listing).await?;
    info!(id = %listing.id, %kind, "Listing created");
    Ok(listing)
}

/// Statistics cover every listing of the kind, filters only narrow the items.
pub async fn list(
    repo: &ListingRepository,
    kind: ListingKind,
    query: &ListingQuery,
    config: &MarketplaceConfig,
) -> Result<ListingList, DirectoryError> {
    query.validate()?;
    let all = repo.list(kind).await?;
    let stats = ListingStats::compute(&all, clock::today(), config.stats_window_days);

    let page = Page::new(query.offset, query.limit, config);
    let (items, total) = page.apply(query.apply(all)?);
    Ok(ListingList { items, total, offset: page.offset, limit: page.limit, stats })
}

/// A listing reached through another kind's prefix does not exist there.
pub async fn get(
    repo: &ListingRepository,
    kind: ListingKind,
    id: &str,
) -> Result<Listing, DirectoryError> {
    repo.get(id).await?.filter(|l| l.kind == kind).ok_or_else(|| not_found(kind, id))
}

pub async fn update(
    repo: &ListingRepository,
    kind: ListingKind,
    id: &str,
    input: ListingInput,
) -> Result<Listing, DirectoryError> {
    input.validate()?;
    let mut listing = get(repo, kind, id).await?;

    listing.apply(input, &clock::now_timestamp());
    if !repo.update(&listing).await? {
        return Err(not_found(kind, id));
    }
    info!(id, %kind, "Listing updated");
    Ok(listing)
}

pub async fn set_active(
    repo: &ListingRepository,
    kind: ListingKind,
    id: &str,
    is_active: bool,
) -> Result<Listing, DirectoryError> {
    let mut listing = get(repo, kind, id).await?;

    listing.set_active(is_active, &clock::now_timestamp());
    if !repo.update(&listing).await? {
        return Err(not_found(kind, id));
    }
    info!(id, %kind, is_active, "Listing activation changed");
    Ok(listing)
}

pub async fn delete(
    repo: &ListingRepository,
    kind: ListingKind,
    id: &str,
) -> Result<Listing, DirectoryError> {
    let listing = get(repo, kind, id).await?;
    repo.delete(id).await?;
    info!(id, %kind, "Listing deleted");
    Ok(listing)
}

/// Contact links with a WhatsApp greeting naming the listing.
pub async fn contact(
    repo: &ListingRepository,
    kind: ListingKind,
    id: &str,
) -> Result<ContactLinks, DirectoryError> {
    let listing = get(repo, kind, id).await?;
    Ok(listing.contact_links(Some(&listing.greeting())))
}

pub(crate) fn not_found(kind: ListingKind, id: &str) -> DirectoryError {
    DirectoryError::NotFound {
        message: format!("{} {id}", kind.label().to_lowercase()).into(),
        context: None,
    }
}

pub(crate) fn unknown_kind(segment: &str) -> DirectoryError {
    DirectoryError::NotFound {
        message: format!("no directory at /api/{segment}").into(),
        context: None,
    }
}
