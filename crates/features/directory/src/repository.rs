use crate::domain::{Listing, ListingKind, ScheduleSlot};
use crate::error::{DirectoryError, DirectoryErrorExt};
use whub_database::{Database, SurrealValue, Table};
use whub_kernel::badge::StatusBadge;
use whub_kernel::domain::constants::LISTING;
use whub_kernel::domain::schedule::Weekdays;
use whub_kernel::links::ContactLinks;

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct SlotRow {
    days: Vec<String>,
    opens: String,
    closes: String,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct ListingRow {
    key: String,
    kind: String,
    name: String,
    description: String,
    address: String,
    city: String,
    state: Option<String>,
    country: String,
    phone: Option<String>,
    email: Option<String>,
    whatsapp: Option<String>,
    instagram: Option<String>,
    website: Option<String>,
    image_url: Option<String>,
    gallery: Vec<String>,
    categories: Vec<String>,
    price_range: Option<String>,
    schedule: Vec<SlotRow>,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl From<&ScheduleSlot> for SlotRow {
    fn from(slot: &ScheduleSlot) -> Self {
        Self {
            days: slot.days.day_names().into_iter().map(str::to_owned).collect(),
            opens: slot.opens.clone(),
            closes: slot.closes.clone(),
        }
    }
}

impl SlotRow {
    fn into_slot(self, key: &str) -> Result<ScheduleSlot, DirectoryError> {
        let mut days = Weekdays::empty();
        for name in &self.days {
            days |= name
                .parse::<Weekdays>()
                .map_err(|e| DirectoryError::from(format!("{e} on listing {key}")))?;
        }
        Ok(ScheduleSlot { days, opens: self.opens, closes: self.closes })
    }
}

impl From<&Listing> for ListingRow {
    fn from(l: &Listing) -> Self {
        Self {
            key: l.id.clone(),
            kind: l.kind.to_string(),
            name: l.name.clone(),
            description: l.description.clone(),
            address: l.address.clone(),
            city: l.city.clone(),
            state: l.state.clone(),
            country: l.country.clone(),
            phone: l.phone.clone(),
            email: l.email.clone(),
            whatsapp: l.whatsapp.clone(),
            instagram: l.instagram.clone(),
            website: l.website.clone(),
            image_url: l.image_url.clone(),
            gallery: l.gallery.clone(),
            categories: l.categories.clone(),
            price_range: l.price_range.clone(),
            schedule: l.schedule.iter().map(SlotRow::from).collect(),
            is_active: l.is_active,
            created_at: l.created_at.clone(),
            updated_at: l.updated_at.clone(),
        }
    }
}

impl TryFrom<ListingRow> for Listing {
    type Error = DirectoryError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        let kind: ListingKind = row
            .kind
            .parse()
            .map_err(|_| {
                DirectoryError::from(format!("unknown listing kind '{}' on {}", row.kind, row.key))
            })?;
        let schedule = row
            .schedule
            .into_iter()
            .map(|slot| slot.into_slot(&row.key))
            .collect::<Result<_, _>>()?;

        let mut listing = Self {
            id: row.key,
            kind,
            name: row.name,
            description: row.description,
            address: row.address,
            city: row.city,
            state: row.state,
            country: row.country,
            phone: row.phone,
            email: row.email,
            whatsapp: row.whatsapp,
            instagram: row.instagram,
            website: row.website,
            image_url: row.image_url,
            gallery: row.gallery,
            categories: row.categories,
            price_range: row.price_range,
            schedule,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            badge: row.is_active.badge(),
            links: ContactLinks::default(),
        };
        listing.refresh();
        Ok(listing)
    }
}

/// Persistence of listings of every kind.
#[derive(Debug, Clone)]
pub struct ListingRepository {
    table: Table<ListingRow>,
}

impl ListingRepository {
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self { table: Table::new(database, LISTING) }
    }

    pub async fn list(&self, kind: ListingKind) -> Result<Vec<Listing>, DirectoryError> {
        let rows = self.table.find_by("kind", kind.to_string()).await.context("Listing directory")?;
        rows.into_iter().map(Listing::try_from).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Option<Listing>, DirectoryError> {
        let row = self.table.find(id).await.context("Loading listing")?;
        row.map(Listing::try_from).transpose()
    }

    pub async fn insert(&self, listing: &Listing) -> Result<(), DirectoryError> {
        self.table.insert(listing.into()).await.context("Storing listing")
    }

    pub async fn update(&self, listing: &Listing) -> Result<bool, DirectoryError> {
        self.table.replace(&listing.id, listing.into()).await.context("Updating listing")
    }

    pub async fn delete(&self, id: &str) -> Result<(), DirectoryError> {
        self.table.remove_by("key", id).await.context("Deleting listing")
    }
}
