use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shape of the `content_templates.fields` jsonb column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateFields {
    #[serde(rename = "inputFields", default)]
    pub input_fields: Vec<Value>,
    #[serde(rename = "outputFields", default)]
    pub output_fields: Vec<Value>,
}

impl TemplateFields {
    /// Tolerates null, missing keys and malformed column contents
    pub fn from_column(value: Option<Value>) -> Self {
        value
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    pub fn input_names(&self) -> Vec<String> {
        field_names(&self.input_fields)
    }

    pub fn output_names(&self) -> Vec<String> {
        field_names(&self.output_fields)
    }
}

fn field_names(fields: &[Value]) -> Vec<String> {
    fields
        .iter()
        .filter_map(|f| f.get("name").and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Replace the stored `fields` column with top-level `inputFields`/`outputFields`
pub fn flatten_template_row(mut row: Map<String, Value>) -> Map<String, Value> {
    let fields = TemplateFields::from_column(row.remove("fields"));
    row.insert("inputFields".into(), Value::Array(fields.input_fields));
    row.insert("outputFields".into(), Value::Array(fields.output_fields));
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_fields_column() {
        let row = json!({
            "id": "t1",
            "name": "Article",
            "fields": { "inputFields": [{"name": "topic"}], "outputFields": [{"name": "body"}] }
        });
        let flat = flatten_template_row(row.as_object().cloned().unwrap());
        assert!(flat.get("fields").is_none());
        assert_eq!(flat["inputFields"][0]["name"], "topic");
        assert_eq!(flat["outputFields"][0]["name"], "body");
    }

    #[test]
    fn missing_fields_default_to_empty_lists() {
        let flat = flatten_template_row(json!({"id": "t1", "fields": null}).as_object().cloned().unwrap());
        assert_eq!(flat["inputFields"], json!([]));
        assert_eq!(flat["outputFields"], json!([]));
    }

    #[test]
    fn names_skip_unnamed_fields() {
        let fields = TemplateFields {
            input_fields: vec![json!({"name": "topic"}), json!({"label": "x"}), json!({"name": ""})],
            output_fields: vec![],
        };
        assert_eq!(fields.input_names(), vec!["topic".to_string()]);
    }
}
