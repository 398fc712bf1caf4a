use crate::domain::{
    ApplicationList, ApplicationQuery, ApplicationStats, ProfessionalApplication, ReviewApplication,
    ReviewRefusal, SubmitApplication,
};
use crate::error::ApplicationError;
use crate::repository::ApplicationRepository;
use tracing::info;
use whub_kernel::clock;
use whub_kernel::domain::config::MarketplaceConfig;
use whub_kernel::listing::Page;
use whub_kernel::safe_nanoid;

/// Stores a new pending application.
///
/// A second pending application for the same email is a conflict; reviewed ones do not block
/// re-applying.
pub async fn submit(
    repo: &ApplicationRepository,
    input: SubmitApplication,
) -> Result<ProfessionalApplication, ApplicationError> {
    input.validate()?;

    if repo.by_email(&input.email).await?.iter().any(ProfessionalApplication::is_pending) {
        return Err(pending_conflict(&input.email));
    }

    let application = input.into_application(safe_nanoid!(), &clock::now_timestamp());
    if !repo.insert_unless_pending(&application).await? {
        return Err(pending_conflict(&application.email));
    }
    info!(id = %application.id, profession = %application.profession, "Application submitted");
    Ok(application)
}

pub async fn list(
    repo: &ApplicationRepository,
    query: &ApplicationQuery,
    config: &MarketplaceConfig,
) -> Result<ApplicationList, ApplicationError> {
    let all = repo.list().await?;
    let stats = ApplicationStats::compute(&all, clock::today(), config.stats_window_days);

    let page = Page::new(query.offset, query.limit, config);
    let (items, total) = page.apply(query.apply(all)?);
    Ok(ApplicationList { items, total, offset: page.offset, limit: page.limit, stats })
}

pub async fn get(
    repo: &ApplicationRepository,
    id: &str,
) -> Result<ProfessionalApplication, ApplicationError> {
    repo.get(id).await?.ok_or_else(|| not_found(id))
}

pub async fn review(
    repo: &ApplicationRepository,
    id: &str,
    review: &ReviewApplication,
    reviewer: Option<&str>,
) -> Result<ProfessionalApplication, ApplicationError> {
    let mut application = get(repo, id).await?;

    application.review(review, reviewer, &clock::now_timestamp()).map_err(|refusal| match refusal {
        ReviewRefusal::Invalid(errors) => ApplicationError::from(errors),
        ReviewRefusal::AlreadyReviewed(status) => ApplicationError::Conflict {
            message: format!("application {id} is already {status}").into(),
            context: None,
        },
    })?;

    if !repo.update(&application).await? {
        return Err(not_found(id));
    }
    info!(id, status = %application.status, "Application reviewed");
    Ok(application)
}

pub async fn delete(
    repo: &ApplicationRepository,
    id: &str,
) -> Result<ProfessionalApplication, ApplicationError> {
    let removed = repo.delete(id).await?.ok_or_else(|| not_found(id))?;
    info!(id, "Application deleted");
    Ok(removed)
}

fn not_found(id: &str) -> ApplicationError {
    ApplicationError::NotFound { message: id.to_owned().into(), context: None }
}

fn pending_conflict(email: &str) -> ApplicationError {
    ApplicationError::Conflict {
        message: format!("a pending application already exists for {}", email.trim()).into(),
        context: None,
    }
}
