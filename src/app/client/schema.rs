//! Item schema validation
//!
//! The catalog publishes its item schema at `<root>docs` under
//! `urls["/"]["scheme"]`. The client refuses to run against a server whose
//! field set differs from [`ITEM_FIELDS`](crate::constants::ITEM_FIELDS),
//! and refuses to send payloads carrying unknown keys.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::app::models::{is_schema_field, ItemPayload};
use crate::constants::schema;
use crate::errors::{ClientError, ClientResult};

/// Compare the server-declared schema in a docs document with the local one
///
/// The server's `id` field is ignored.
///
/// # Errors
///
/// `SchemaUnreadable` if the document has no schema at the expected path,
/// `SchemaMismatch` if the key sets differ
pub fn check_schema(docs: &Value) -> ClientResult<()> {
    let remote = docs
        .get("urls")
        .and_then(|urls| urls.get("/"))
        .and_then(|root| root.get("scheme"))
        .and_then(Value::as_object)
        .ok_or_else(|| ClientError::SchemaUnreadable {
            reason: "no scheme at urls./.scheme".to_string(),
        })?;

    let remote: BTreeSet<&str> = remote
        .keys()
        .map(String::as_str)
        .filter(|key| *key != schema::ID_FIELD)
        .collect();
    let local: BTreeSet<&str> = schema::ITEM_FIELDS.iter().copied().collect();

    if remote == local {
        return Ok(());
    }

    Err(ClientError::SchemaMismatch {
        missing: local.difference(&remote).map(|s| s.to_string()).collect(),
        unexpected: remote.difference(&local).map(|s| s.to_string()).collect(),
    })
}

/// Reject a payload carrying any key outside the item schema
pub fn validate_fields(data: &ItemPayload) -> ClientResult<()> {
    match data.keys().find(|key| !is_schema_field(key)) {
        Some(field) => Err(ClientError::InvalidField {
            field: field.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(fields: &[&str]) -> Value {
        let scheme: serde_json::Map<String, Value> = fields
            .iter()
            .map(|field| (field.to_string(), json!("str")))
            .collect();
        json!({"urls": {"/": {"scheme": scheme}}})
    }

    #[test]
    fn test_matching_schema_ignores_id() {
        let mut fields = schema::ITEM_FIELDS.to_vec();
        fields.push("id");
        assert!(check_schema(&docs(&fields)).is_ok());
    }

    #[test]
    fn test_schema_mismatch_reports_both_sides() {
        let mut fields: Vec<&str> = schema::ITEM_FIELDS
            .iter()
            .copied()
            .filter(|f| *f != "service")
            .collect();
        fields.push("rating");

        match check_schema(&docs(&fields)) {
            Err(ClientError::SchemaMismatch {
                missing,
                unexpected,
            }) => {
                assert_eq!(missing, vec!["service"]);
                assert_eq!(unexpected, vec!["rating"]);
            }
            other => panic!("Expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_scheme_path() {
        let result = check_schema(&json!({"urls": {}}));
        assert!(matches!(result, Err(ClientError::SchemaUnreadable { .. })));
    }

    #[test]
    fn test_validate_fields() {
        let mut data = ItemPayload::new();
        data.insert("name".to_string(), json!("remilia"));
        data.insert("tags".to_string(), json!(["touhou"]));
        assert!(validate_fields(&data).is_ok());

        data.insert("id".to_string(), json!(3));
        match validate_fields(&data) {
            Err(ClientError::InvalidField { field }) => assert_eq!(field, "id"),
            other => panic!("Expected InvalidField, got {:?}", other),
        }
    }
}
