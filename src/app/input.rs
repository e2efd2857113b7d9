//! Item data entry for upload and update
//!
//! Item fields come either from a YAML file or from interactive prompts. Both
//! sources go through the same normalisation: comma-separated `tags` and
//! `deps` become lists, and every falsy value is dropped so that omitted
//! fields are left untouched by a partial update.

use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::Value;

use crate::app::models::ItemPayload;
use crate::errors::{InputError, InputResult};
use crate::logging::ChannelLogger;

const LOG: ChannelLogger = ChannelLogger::new("input");

/// Prompt label and payload key, in prompt order
const PROMPTS: [(&str, &str); 7] = [
    ("name", "name"),
    ("dependencies", "deps"),
    ("tags", "tags"),
    ("image url", "image"),
    ("description", "desc"),
    ("file url", "file"),
    ("service", "service"),
];

/// Fields holding comma-separated lists when entered as text
const LIST_FIELDS: [&str; 2] = ["tags", "deps"];

/// Read item data from `file`, or prompt for it on the terminal
pub fn collect_item_data(file: Option<&Path>) -> InputResult<ItemPayload> {
    let data = match file {
        Some(path) => load_item_file(path)?,
        None => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            prompt_item_data(&mut stdin.lock(), &mut stdout.lock())?
        }
    };
    Ok(normalize(data))
}

/// Prompt for every item field in order, trimming each answer
///
/// End of input answers the remaining prompts with empty strings.
pub fn prompt_item_data<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> InputResult<ItemPayload> {
    let mut data = ItemPayload::new();

    for (label, key) in PROMPTS {
        write!(output, "{}: ", label)?;
        output.flush()?;

        let mut line = String::new();
        input.read_line(&mut line)?;
        data.insert(key.to_string(), Value::String(line.trim().to_string()));
    }

    Ok(data)
}

/// Load a YAML mapping of item fields
pub fn load_item_file(path: &Path) -> InputResult<ItemPayload> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&content).map_err(|source| InputError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(InputError::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}

/// Split list fields given as text and drop falsy values
pub fn normalize(mut data: ItemPayload) -> ItemPayload {
    for field in LIST_FIELDS {
        if let Some(Value::String(text)) = data.get(field) {
            if !text.is_empty() {
                let items = split_list(text);
                data.insert(field.to_string(), items);
            }
        }
    }

    LOG.debug(format!("{} keys before purging empty values", data.len()));
    data.retain(|_, value| !is_falsy(value));
    LOG.debug(format!("{} keys after purging empty values", data.len()));

    data
}

fn split_list(text: &str) -> Value {
    Value::Array(
        text.split(',')
            .map(|part| Value::String(part.trim().to_string()))
            .collect(),
    )
}

/// Null, false, zero, and empty strings, lists or mappings
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn prompted(answers: &[&str]) -> ItemPayload {
        let mut input = Cursor::new(answers.join("\n") + "\n");
        let mut output = Vec::new();
        normalize(prompt_item_data(&mut input, &mut output).unwrap())
    }

    #[test]
    fn test_prompts_drop_empty_fields() {
        let data = prompted(&["remilia", "", "a,b", "", "", "", ""]);

        assert_eq!(
            Value::Object(data),
            json!({"name": "remilia", "tags": ["a", "b"]})
        );
    }

    #[test]
    fn test_prompt_labels_in_order() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        prompt_item_data(&mut input, &mut output).unwrap();

        let shown = String::from_utf8(output).unwrap();
        assert_eq!(
            shown,
            "name: dependencies: tags: image url: description: file url: service: "
        );
    }

    #[test]
    fn test_prompts_trim_answers() {
        let data = prompted(&["  sakuya ", " gensokyo , mansion", "maid", "", "", "", " NAI "]);

        assert_eq!(data["name"], json!("sakuya"));
        assert_eq!(data["deps"], json!(["gensokyo", "mansion"]));
        assert_eq!(data["service"], json!("NAI"));
    }

    #[test]
    fn test_yaml_lists_kept() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("item.yaml");
        std::fs::write(
            &path,
            "name: remilia\ntags:\n  - touhou\n  - vampire\ndeps: gensokyo, mansion\ndesc: ''\n",
        )
        .unwrap();

        let data = normalize(load_item_file(&path).unwrap());

        assert_eq!(data["tags"], json!(["touhou", "vampire"]));
        assert_eq!(data["deps"], json!(["gensokyo", "mansion"]));
        assert!(!data.contains_key("desc"));
    }

    #[test]
    fn test_yaml_must_be_mapping() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("item.yaml");
        std::fs::write(&path, "- remilia\n- sakuya\n").unwrap();

        assert!(matches!(
            load_item_file(&path),
            Err(InputError::NotAMapping { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("item.yaml");
        std::fs::write(&path, "name: [unclosed\n").unwrap();

        assert!(matches!(load_item_file(&path), Err(InputError::Yaml { .. })));
    }

    #[test]
    fn test_falsy_values() {
        assert!(is_falsy(&json!(null)));
        assert!(is_falsy(&json!(false)));
        assert!(is_falsy(&json!(0)));
        assert!(is_falsy(&json!("")));
        assert!(is_falsy(&json!([])));
        assert!(is_falsy(&json!({})));
        assert!(!is_falsy(&json!("x")));
        assert!(!is_falsy(&json!(1)));
        assert!(!is_falsy(&json!([""])));
    }
}
