//! Template loading and management

use protoscaffold_common::{naming, GeneratorError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

pub const BIZ_TEMPLATE: &str = "biz.go";
pub const DATA_REPO_TEMPLATE: &str = "data_repo.go";
pub const DATA_MODEL_TEMPLATE: &str = "data_model.go";

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("upper_camel", upper_camel_filter);
    tera.register_filter("lower_camel", lower_camel_filter);
    tera.register_filter("package_name", package_name_filter);
    tera.register_filter("clean_type", clean_type_filter);
    tera.register_filter("go_type", go_type_filter);

    let templates = [
        (BIZ_TEMPLATE, include_str!("../templates/biz.go.tera")),
        (DATA_REPO_TEMPLATE, include_str!("../templates/data_repo.go.tera")),
        (DATA_MODEL_TEMPLATE, include_str!("../templates/data_model.go.tera")),
    ];
    for (name, source) in templates {
        tera.add_raw_template(name, source).map_err(|e| {
            GeneratorError::Generation(format!("Failed to load {} template: {}", name, e))
        })?;
    }

    Ok(tera)
}

fn string_arg<'a>(value: &'a Value, filter: &str) -> tera::Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| tera::Error::msg(format!("{} filter expects a string", filter)))
}

/// Filter to convert snake_case to UpperCamelCase
fn upper_camel_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = string_arg(value, "upper_camel")?;
    Ok(Value::String(naming::to_upper_camel_case(s)))
}

/// Filter to convert snake_case to lowerCamelCase
fn lower_camel_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = string_arg(value, "lower_camel")?;
    Ok(Value::String(naming::to_lower_camel_case(s)))
}

/// Filter to reduce an import path to its package name
fn package_name_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = string_arg(value, "package_name")?;
    Ok(Value::String(naming::package_name(s)))
}

/// Filter to strip package qualification from a type reference
fn clean_type_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = string_arg(value, "clean_type")?;
    Ok(Value::String(naming::clean_type_name(s)))
}

/// Filter to convert a normalized field type token to a Go type
fn go_type_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = string_arg(value, "go_type")?;
    Ok(Value::String(go_type(s)))
}

fn go_type(field_type: &str) -> String {
    if let Some(element) = field_type.strip_prefix("[]") {
        return format!("[]{}", go_type(element));
    }

    let go = match field_type {
        "double" | "float64" => "float64",
        "float" | "float32" => "float32",
        "int32" | "sint32" | "sfixed32" => "int32",
        "int64" | "sint64" | "sfixed64" => "int64",
        "uint32" | "fixed32" => "uint32",
        "uint64" | "fixed64" => "uint64",
        "bool" => "bool",
        "string" => "string",
        "bytes" => "[]byte",
        other => return format!("*{}", other),
    };
    go.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_load() {
        let tera = load_templates().unwrap();
        let names: Vec<_> = tera.get_template_names().collect();
        assert!(names.contains(&BIZ_TEMPLATE));
        assert!(names.contains(&DATA_REPO_TEMPLATE));
        assert!(names.contains(&DATA_MODEL_TEMPLATE));
    }

    #[test]
    fn test_go_type() {
        assert_eq!(go_type("string"), "string");
        assert_eq!(go_type("[]string"), "[]string");
        assert_eq!(go_type("double"), "float64");
        assert_eq!(go_type("bytes"), "[]byte");
        assert_eq!(go_type("[]bytes"), "[][]byte");
        assert_eq!(go_type("Address"), "*Address");
        assert_eq!(go_type("[]LineItem"), "[]*LineItem");
    }

    #[test]
    fn test_filters_reject_non_strings() {
        let args = HashMap::new();
        assert!(upper_camel_filter(&Value::Bool(true), &args).is_err());
        assert_eq!(
            lower_camel_filter(&Value::String("create_user".to_string()), &args).unwrap(),
            Value::String("createUser".to_string())
        );
        assert_eq!(
            package_name_filter(&Value::String("internal/domain".to_string()), &args).unwrap(),
            Value::String("domain".to_string())
        );
    }
}
