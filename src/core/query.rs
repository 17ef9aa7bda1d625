//! Land record listing, lookup and map search.
//!
//! Fixed columns are filterable; custom fields only contribute display columns. Which
//! custom fields appear is decided by their visibility flags at query time.

use crate::{
    core::{
        attributes::AttributeBag,
        field::{self, Visibility},
        land::attribute_bag,
        render::{self, DetailEntry},
    },
    entities::{Certificate, CertificateModel, Land, LandModel, certificate, land},
    errors::{Error, Result},
};
use sea_orm::{Condition, PaginatorTrait, QueryOrder, QuerySelect, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Default number of rows per page.
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Fixed-column filters for the land listing. Empty strings are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandFilter {
    /// Rights number substring
    pub rights_number: Option<String>,
    /// Survey letter substring
    pub survey_letter: Option<String>,
    /// Substring of either owner column
    pub owner: Option<String>,
    /// Rights type substring
    pub rights_type: Option<String>,
    /// Parcel number substring
    pub parcel_number: Option<String>,
    /// Exact region code
    pub region_code: Option<String>,
    /// Exact district
    pub district: Option<String>,
    /// Exact village
    pub village: Option<String>,
    /// Exact registration year
    pub year: Option<i32>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|text| text.trim()).filter(|text| !text.is_empty())
}

impl LandFilter {
    fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        let substrings = [
            (land::Column::RightsNumber, &self.rights_number),
            (land::Column::SurveyLetter, &self.survey_letter),
            (land::Column::RightsType, &self.rights_type),
            (land::Column::ParcelNumber, &self.parcel_number),
        ];
        for (column, value) in substrings {
            if let Some(text) = non_empty(value.as_ref()) {
                condition = condition.add(column.contains(text));
            }
        }

        let exact = [
            (land::Column::RegionCode, &self.region_code),
            (land::Column::District, &self.district),
            (land::Column::Village, &self.village),
        ];
        for (column, value) in exact {
            if let Some(text) = non_empty(value.as_ref()) {
                condition = condition.add(column.eq(text));
            }
        }

        if let Some(owner) = non_empty(self.owner.as_ref()) {
            condition = condition.add(
                Condition::any()
                    .add(land::Column::PrimaryOwner.contains(owner))
                    .add(land::Column::SecondaryOwner.contains(owner)),
            );
        }
        if let Some(year) = self.year {
            condition = condition.add(land::Column::Year.eq(year));
        }

        condition
    }
}

/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, starting at 1
    pub page: u64,
    /// Rows per page
    pub per_page: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// A custom-field column of the land table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListColumn {
    /// Attribute-bag key
    pub key: String,
    /// Column heading
    pub label: String,
}

/// One row of the land table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandRow {
    /// The stored record
    pub land: LandModel,
    /// Display text per custom-field column, aligned with [`LandTable::columns`]
    pub cells: Vec<String>,
    /// Number of certificates attached to the record
    pub certificate_count: u64,
}

/// A page of the land table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandTable {
    /// List-visible custom fields, in render order
    pub columns: Vec<ListColumn>,
    /// Rows of this page
    pub rows: Vec<LandRow>,
    /// Current page, starting at 1
    pub page: u64,
    /// Rows per page
    pub per_page: u64,
    /// Rows matching the filter across all pages
    pub total: u64,
    /// Number of pages
    pub total_pages: u64,
}

async fn certificate_counts<C>(db: &C, land_ids: Vec<i64>) -> Result<HashMap<i64, u64>>
where
    C: ConnectionTrait,
{
    if land_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let counts: Vec<(i64, i64)> = Certificate::find()
        .select_only()
        .column(certificate::Column::LandId)
        .column_as(certificate::Column::Id.count(), "certificate_count")
        .filter(certificate::Column::LandId.is_in(land_ids))
        .group_by(certificate::Column::LandId)
        .into_tuple()
        .all(db)
        .await?;

    counts
        .into_iter()
        .map(|(land_id, count)| -> Result<(i64, u64)> { Ok((land_id, u64::try_from(count)?)) })
        .collect()
}

/// Lists land records matching `filter`, ordered by district then village.
///
/// Each row carries the display text of every list-visible custom field (`-` when the
/// record has no value) and its certificate count.
pub async fn list_lands(
    db: &DatabaseConnection,
    filter: &LandFilter,
    page: PageRequest,
) -> Result<LandTable> {
    let per_page = page.per_page.max(1);
    let page_number = page.page.max(1);

    let fields = field::list_active_fields(db, Visibility::List).await?;
    let paginator = Land::find()
        .filter(filter.condition())
        .order_by_asc(land::Column::District)
        .order_by_asc(land::Column::Village)
        .order_by_asc(land::Column::Id)
        .paginate(db, per_page);

    let totals = paginator.num_items_and_pages().await?;
    let lands = paginator.fetch_page(page_number - 1).await?;
    let counts = certificate_counts(db, lands.iter().map(|land| land.id).collect()).await?;

    let rows = lands
        .into_iter()
        .map(|land| {
            let bag = attribute_bag(&land);
            let cells = fields
                .iter()
                .map(|field| render::list_cell(field, bag.get(&field.key)))
                .collect();
            LandRow {
                certificate_count: counts.get(&land.id).copied().unwrap_or_default(),
                cells,
                land,
            }
        })
        .collect();

    debug!(
        "Listed page {} of {} ({} matching lands)",
        page_number, totals.number_of_pages, totals.number_of_items
    );

    Ok(LandTable {
        columns: fields
            .into_iter()
            .map(|field| ListColumn {
                key: field.key,
                label: field.label,
            })
            .collect(),
        rows,
        page: page_number,
        per_page,
        total: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}

/// Distinct non-empty villages recorded for `district`, sorted.
pub async fn list_villages(db: &DatabaseConnection, district: &str) -> Result<Vec<String>> {
    Land::find()
        .select_only()
        .column(land::Column::Village)
        .distinct()
        .filter(land::Column::District.eq(district))
        .filter(land::Column::Village.is_not_null())
        .filter(land::Column::Village.ne(""))
        .order_by_asc(land::Column::Village)
        .into_tuple::<String>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// A land record with everything its detail view shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandDetail {
    /// The stored record
    pub land: LandModel,
    /// Attached certificates, newest first
    pub certificates: Vec<CertificateModel>,
    /// Detail-visible custom fields that have a value
    pub attributes: Vec<DetailEntry>,
}

async fn certificates_for(db: &DatabaseConnection, land_id: i64) -> Result<Vec<CertificateModel>> {
    Certificate::find()
        .filter(certificate::Column::LandId.eq(land_id))
        .order_by_desc(certificate::Column::CreatedAt)
        .order_by_desc(certificate::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Certificates of every land in `land_ids`, grouped by land and newest first.
async fn certificates_by_land(
    db: &DatabaseConnection,
    land_ids: Vec<i64>,
) -> Result<HashMap<i64, Vec<CertificateModel>>> {
    if land_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let certificates = Certificate::find()
        .filter(certificate::Column::LandId.is_in(land_ids))
        .order_by_desc(certificate::Column::CreatedAt)
        .order_by_desc(certificate::Column::Id)
        .all(db)
        .await?;

    let mut grouped: HashMap<i64, Vec<CertificateModel>> = HashMap::new();
    for found in certificates {
        grouped.entry(found.land_id).or_default().push(found);
    }
    Ok(grouped)
}

/// Loads the detail view of a land record.
///
/// # Errors
/// Returns `LandNotFound` if no record has this id.
pub async fn land_detail(db: &DatabaseConnection, land_id: i64) -> Result<LandDetail> {
    let land = Land::find_by_id(land_id)
        .one(db)
        .await?
        .ok_or(Error::LandNotFound { id: land_id })?;

    let fields = field::list_active_fields(db, Visibility::Detail).await?;
    let attributes = render::detail_entries(&fields, &attribute_bag(&land));
    let certificates = certificates_for(db, land_id).await?;

    Ok(LandDetail {
        land,
        certificates,
        attributes,
    })
}

/// A land record that can be drawn on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLand {
    /// The stored record
    pub land: LandModel,
    /// Polygon as `[longitude, latitude]` pairs
    pub coordinates: Vec<[f64; 2]>,
    /// Centroid
    pub coordinate: [f64; 2],
    /// Attached certificates, newest first
    pub certificates: Vec<CertificateModel>,
    /// Detail-visible custom fields that have a value
    pub attributes: Vec<DetailEntry>,
}

/// Every land record that has both a polygon and a centroid.
///
/// Records whose stored geometry cannot be read as coordinate pairs are skipped with a
/// warning.
pub async fn list_mappable_lands(db: &DatabaseConnection) -> Result<Vec<MapLand>> {
    let lands = Land::find()
        .filter(land::Column::Coordinates.is_not_null())
        .filter(land::Column::Coordinate.is_not_null())
        .order_by_asc(land::Column::Id)
        .all(db)
        .await?;
    let fields = field::list_active_fields(db, Visibility::Detail).await?;
    let mut certificates =
        certificates_by_land(db, lands.iter().map(|land| land.id).collect()).await?;

    let mut mappable = Vec::with_capacity(lands.len());
    for land in lands {
        let geometry = land
            .coordinates
            .clone()
            .zip(land.coordinate.clone())
            .map(|(polygon, centroid)| {
                Ok::<_, serde_json::Error>((
                    serde_json::from_value::<Vec<[f64; 2]>>(polygon)?,
                    serde_json::from_value::<[f64; 2]>(centroid)?,
                ))
            });
        let (coordinates, coordinate) = match geometry {
            Some(Ok(geometry)) => geometry,
            Some(Err(err)) => {
                warn!("Skipping land {} with unreadable geometry: {}", land.id, err);
                continue;
            }
            None => continue,
        };

        let bag: AttributeBag = attribute_bag(&land);
        mappable.push(MapLand {
            coordinates,
            coordinate,
            certificates: certificates.remove(&land.id).unwrap_or_default(),
            attributes: render::detail_entries(&fields, &bag),
            land,
        });
    }

    Ok(mappable)
}
