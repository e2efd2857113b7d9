//! Lorebook compilation
//!
//! Merges the lorebooks of a resolved bundle into a single document. The
//! first requested package provides the template: its top-level settings and
//! lists are kept, and every package's `entries` and `categories` are appended
//! in bundle order. The template package is part of the bundle too, so its
//! lists appear twice in the result.

use std::path::Path;

use serde_json::{Map, Value};

use crate::app::package::PackageBundle;
use crate::errors::{PackageError, PackageResult};
use crate::logging::ChannelLogger;

const LOG: ChannelLogger = ChannelLogger::new("compile");

/// Lorebook list fields merged by compilation
const MERGED_FIELDS: [&str; 2] = ["entries", "categories"];

/// Compile every package of `bundle`, using `first`'s payload as template
pub fn compile_bundle(bundle: &PackageBundle, first: &str) -> PackageResult<Value> {
    let payload = bundle
        .payload(first)
        .ok_or_else(|| PackageError::MissingPayload {
            name: first.to_string(),
        })?;
    let template = parse_lorebook(first, payload)?;
    compile_lorebook(template, bundle)
}

/// Fold every package's `entries` and `categories` into `template`
///
/// The template must carry both lists. Packages without a payload are skipped.
pub fn compile_lorebook(template: Map<String, Value>, bundle: &PackageBundle) -> PackageResult<Value> {
    let mut compiled = template;

    for (name, payload) in bundle.iter() {
        let Some(payload) = payload else {
            LOG.warn(format!("Package {} has no lorebook, skipping it", name));
            LOG.user_warn(format!("Package {} has no lorebook, skipping it", name));
            continue;
        };

        let mut lorebook = parse_lorebook(name, payload)?;
        for field in MERGED_FIELDS {
            let items = take_list(name, &mut lorebook, field)?;
            match compiled.get_mut(field) {
                Some(Value::Array(merged)) => merged.extend(items),
                _ => {
                    return Err(PackageError::InvalidLorebook {
                        package: "template".to_string(),
                        reason: format!("missing '{}' list", field),
                    })
                }
            }
        }
    }

    LOG.info(format!("Compiled {} packages", bundle.len()));
    Ok(Value::Object(compiled))
}

/// Write a compiled lorebook to `path`
pub fn write_lorebook(path: &Path, lorebook: &Value) -> PackageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec(lorebook)?)?;
    Ok(())
}

fn parse_lorebook(name: &str, payload: &[u8]) -> PackageResult<Map<String, Value>> {
    match serde_json::from_slice(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(PackageError::InvalidLorebook {
            package: name.to_string(),
            reason: "not a JSON object".to_string(),
        }),
        Err(e) => Err(PackageError::InvalidLorebook {
            package: name.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn take_list(name: &str, lorebook: &mut Map<String, Value>, field: &str) -> PackageResult<Vec<Value>> {
    match lorebook.remove(field) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(PackageError::InvalidLorebook {
            package: name.to_string(),
            reason: format!("missing '{}' list", field),
        }),
    }
}
