use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::codec;

/// Known palette keys a label color may take. Anything else resolves to a
/// random pick at creation time.
pub const COLOR_PALETTE: [&str; 8] = [
    "red", "orange", "yellow", "green", "blue", "purple", "pink", "gray",
];

/// Resolve a requested color to a palette key, falling back to a random one
/// when the request is absent or not a known key.
pub fn resolve_color(requested: Option<&str>) -> String {
    match requested {
        Some(color) if COLOR_PALETTE.contains(&color) => color.to_string(),
        _ => COLOR_PALETTE
            .choose(&mut rand::thread_rng())
            .unwrap_or(&COLOR_PALETTE[0])
            .to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(with = "codec::date")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "codec::opt_date", default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

/// Labels carry no foreign keys, so the hydrated view is the entity itself.
pub type Label = LabelEntity;

/// Creation input; everything else is populated by the DAO.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLabel {
    pub name: String,
    pub color: Option<String>,
}

/// Update input. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct LabelPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}
