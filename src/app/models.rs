//! Data models for the catalog
//!
//! This module defines the core data structures exchanged with the catalog:
//! the full [`Item`], the [`ItemSummary`] returned by listings, and the
//! [`ItemPayload`] sent on create and update.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::constants::schema;

/// Ordered field map sent to the catalog on create/update
pub type ItemPayload = Map<String, Value>;

/// A catalog entry describing a downloadable card/lore package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Server-internal identifier, never sent back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Unique item name
    pub name: String,
    /// Names of the items this one depends on, in declaration order
    #[serde(default, deserialize_with = "null_as_default")]
    pub deps: Vec<String>,
    /// Search tags
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Optional image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Free-form description
    #[serde(default, deserialize_with = "null_as_default")]
    pub desc: String,
    /// URL of the lorebook payload
    #[serde(default, deserialize_with = "null_as_default")]
    pub file: String,
    /// Target service, e.g. "NAI"
    #[serde(default, deserialize_with = "null_as_default")]
    pub service: String,
    /// Server-assigned creation timestamp
    #[serde(default)]
    pub date_created: Option<String>,
    /// Server-assigned update timestamp
    #[serde(default)]
    pub date_updated: Option<String>,
}

impl Item {
    /// Image URL if one is set and non-blank
    pub fn image_url(&self) -> Option<&str> {
        self.image
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Convert into an update payload, dropping the server-internal `id`
    pub fn to_payload(&self) -> serde_json::Result<ItemPayload> {
        match serde_json::to_value(self)? {
            Value::Object(mut map) => {
                map.remove(schema::ID_FIELD);
                Ok(map)
            }
            // Item always serializes to an object
            _ => Ok(ItemPayload::new()),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "    Name: {}", self.name)?;
        writeln!(
            f,
            "    ============================================================"
        )?;
        writeln!(f, "    Description: {}", self.desc)?;
        writeln!(f, "    Tags: {}", self.tags.join(", "))?;
        writeln!(f, "    Depends on: {}", self.deps.join(", "))?;
        writeln!(f, "    Image: {}", self.image.as_deref().unwrap_or(""))?;
        writeln!(f, "    File: {}", self.file)?;
        writeln!(
            f,
            "    Date created: {}",
            self.date_created.as_deref().unwrap_or("")
        )?;
        write!(
            f,
            "    Date updated: {}",
            self.date_updated.as_deref().unwrap_or("")
        )
    }
}

/// Element of a catalog listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    /// Unique item name
    pub name: String,
    /// Search tags, when the listing includes them
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Description, when the listing includes it
    #[serde(default, deserialize_with = "null_as_default")]
    pub desc: String,
}

/// Read an explicit `null` as the field's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Whether `field` belongs to the item schema
pub fn is_schema_field(field: &str) -> bool {
    schema::ITEM_FIELDS.contains(&field)
}
