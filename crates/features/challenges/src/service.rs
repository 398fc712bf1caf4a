use crate::domain::{
    Challenge, ChallengeFields, ChallengeList, ChallengeQuery, ChallengeStats, ChallengeStatus,
    CreateChallenge,
};
use crate::error::ChallengeError;
use crate::repository::{ChallengeRepository, ResourceRepository};
use crate::resources::{self, ChallengeResource, ResourceInput};
use tracing::info;
use whub_kernel::clock;
use whub_kernel::domain::config::MarketplaceConfig;
use whub_kernel::listing::Page;
use whub_kernel::safe_nanoid;

pub async fn create(
    repo: &ChallengeRepository,
    input: CreateChallenge,
    config: &MarketplaceConfig,
) -> Result<Challenge, ChallengeError> {
    input.validate()?;

    let challenge = input.into_challenge(
        safe_nanoid!(),
        &config.currency,
        clock::today(),
        &clock::now_timestamp(),
    );
    repo.insert(&challenge).await?;
    info!(id = %challenge.id, created_by = %challenge.created_by, "Challenge created");
    Ok(challenge)
}

pub async fn list(
    repo: &ChallengeRepository,
    query: &ChallengeQuery,
    config: &MarketplaceConfig,
) -> Result<ChallengeList, ChallengeError> {
    let today = clock::today();
    let mut all = repo.list().await?;
    for challenge in &mut all {
        challenge.refresh(today);
    }
    let stats = ChallengeStats::compute(&all, today, config.stats_window_days);

    let page = Page::new(query.offset, query.limit, config);
    let (items, total) = page.apply(query.apply(all));
    Ok(ChallengeList { items, total, offset: page.offset, limit: page.limit, stats })
}

pub async fn get(repo: &ChallengeRepository, id: &str) -> Result<Challenge, ChallengeError> {
    let mut challenge = repo.get(id).await?.ok_or_else(|| not_found(id))?;
    challenge.refresh(clock::today());
    Ok(challenge)
}

pub async fn update(
    repo: &ChallengeRepository,
    id: &str,
    fields: ChallengeFields,
    config: &MarketplaceConfig,
) -> Result<Challenge, ChallengeError> {
    fields.validate()?;
    let mut challenge = get(repo, id).await?;

    challenge.apply(fields, &config.currency, &clock::now_timestamp());
    challenge.refresh(clock::today());
    if !repo.update(&challenge).await? {
        return Err(not_found(id));
    }
    info!(id, "Challenge updated");
    Ok(challenge)
}

pub async fn set_status(
    repo: &ChallengeRepository,
    id: &str,
    status: ChallengeStatus,
) -> Result<Challenge, ChallengeError> {
    let mut challenge = get(repo, id).await?;

    challenge.set_status(status, &clock::now_timestamp());
    if !repo.update(&challenge).await? {
        return Err(not_found(id));
    }
    info!(id, %status, "Challenge status changed");
    Ok(challenge)
}

/// Deletes a challenge together with its resources.
pub async fn delete(
    repo: &ChallengeRepository,
    resources: &ResourceRepository,
    id: &str,
) -> Result<Challenge, ChallengeError> {
    ensure_challenge(repo, id).await?;
    resources.delete_for_challenge(id).await?;
    let removed = repo.delete(id).await?.ok_or_else(|| not_found(id))?;
    info!(id, "Challenge deleted");
    Ok(removed)
}

pub async fn list_resources(
    repo: &ChallengeRepository,
    resources: &ResourceRepository,
    challenge_id: &str,
) -> Result<Vec<ChallengeResource>, ChallengeError> {
    ensure_challenge(repo, challenge_id).await?;
    let mut items = resources.for_challenge(challenge_id).await?;
    resources::sort(&mut items);
    Ok(items)
}

pub async fn add_resource(
    repo: &ChallengeRepository,
    resources: &ResourceRepository,
    challenge_id: &str,
    input: ResourceInput,
    config: &MarketplaceConfig,
) -> Result<ChallengeResource, ChallengeError> {
    input.validate(config.max_attachment_bytes)?;
    ensure_challenge(repo, challenge_id).await?;

    let existing = resources.for_challenge(challenge_id).await?;
    let resource = input.into_resource(
        safe_nanoid!(),
        challenge_id,
        resources::next_position(&existing),
        &clock::now_timestamp(),
    );
    resources.insert(&resource).await?;
    info!(
        id = %resource.id,
        challenge_id,
        kind = %resource.resource_type,
        "Challenge resource added"
    );
    Ok(resource)
}

pub async fn update_resource(
    resources: &ResourceRepository,
    challenge_id: &str,
    resource_id: &str,
    input: ResourceInput,
    config: &MarketplaceConfig,
) -> Result<ChallengeResource, ChallengeError> {
    input.validate(config.max_attachment_bytes)?;
    let mut resource = owned_resource(resources, challenge_id, resource_id).await?;

    input.apply_to(&mut resource, &clock::now_timestamp());
    if !resources.update(&resource).await? {
        return Err(resource_not_found(resource_id));
    }
    info!(id = resource_id, challenge_id, "Challenge resource updated");
    Ok(resource)
}

pub async fn delete_resource(
    resources: &ResourceRepository,
    challenge_id: &str,
    resource_id: &str,
) -> Result<ChallengeResource, ChallengeError> {
    let resource = owned_resource(resources, challenge_id, resource_id).await?;
    resources.delete(resource_id).await?;
    info!(id = resource_id, challenge_id, "Challenge resource deleted");
    Ok(resource)
}

async fn ensure_challenge(repo: &ChallengeRepository, id: &str) -> Result<(), ChallengeError> {
    repo.get(id).await?.map(|_| ()).ok_or_else(|| not_found(id))
}

/// A resource reached through another challenge's path does not exist there.
async fn owned_resource(
    resources: &ResourceRepository,
    challenge_id: &str,
    resource_id: &str,
) -> Result<ChallengeResource, ChallengeError> {
    resources
        .get(resource_id)
        .await?
        .filter(|r| r.challenge_id == challenge_id)
        .ok_or_else(|| resource_not_found(resource_id))
}

fn not_found(id: &str) -> ChallengeError {
    ChallengeError::NotFound { message: format!("challenge {id}").into(), context: None }
}

fn resource_not_found(id: &str) -> ChallengeError {
    ChallengeError::NotFound { message: format!("resource {id}").into(), context: None }
}
