//! Compiles a flat validation-rule map into a nested object schema.
//!
//! Rule keys come in three shapes: a plain field name, `field.*` for an array
//! of scalars, and `field.*.sub` for an array of objects. A field claimed by
//! either wildcard form is no longer processed as a plain field; its plain
//! entry (if present) still contributes required-ness and `minItems` /
//! `maxItems` bounds to the wrapping array schema.
//!
//! Rule values are ordered token lists (or a `|`-delimited string). Tokens
//! fold left-to-right into a schema: the first type-determining token wins
//! the base kind, and subsequent bound tokens land on length or magnitude
//! facets depending on that kind.

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use crate::registry::{FieldOverlay, RuleValue};
use crate::schema::SchemaNode;

/// Compile a rule map plus a per-field metadata overlay into an object
/// schema. Overlay keys are plain field names, or `parent.child` for members
/// of an array-of-object field.
pub fn compile(
    rules: &IndexMap<String, RuleValue>,
    overlay: &IndexMap<String, FieldOverlay>,
) -> SchemaNode {
    debug!("Compiling rule schema ({} rule keys)", rules.len());

    // Partition keys into the three shapes
    let mut plain: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut scalar_arrays: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut object_arrays: IndexMap<String, IndexMap<String, Vec<String>>> = IndexMap::new();

    for (key, value) in rules {
        if let Some((parent, child)) = key.split_once(".*.") {
            object_arrays
                .entry(parent.to_string())
                .or_default()
                .insert(child.to_string(), value.tokens());
        } else if let Some(parent) = key.strip_suffix(".*") {
            scalar_arrays.insert(parent.to_string(), value.tokens());
        } else {
            plain.insert(key.clone(), value.tokens());
        }
    }

    let mut properties: IndexMap<String, SchemaNode> = IndexMap::new();
    let mut required: Vec<String> = Vec::new();

    // Plain fields; skip any field claimed by a wildcard form
    for (field, tokens) in &plain {
        if object_arrays.contains_key(field) || scalar_arrays.contains_key(field) {
            continue;
        }

        let (schema, field_required) = compile_field(tokens, overlay.get(field));
        properties.insert(field.clone(), schema);
        if field_required {
            required.push(field.clone());
        }
    }

    // Array-of-object parents
    for (parent, children) in &object_arrays {
        let parent_tokens = plain.get(parent).cloned().unwrap_or_default();

        let mut child_properties: IndexMap<String, SchemaNode> = IndexMap::new();
        let mut child_required: Vec<String> = Vec::new();

        for (child, tokens) in children {
            let overlay_key = format!("{}.{}", parent, child);
            let (schema, field_required) = compile_field(tokens, overlay.get(&overlay_key));
            child_properties.insert(child.clone(), schema);
            if field_required {
                child_required.push(child.clone());
            }
        }

        let mut array_schema =
            SchemaNode::array(SchemaNode::object(child_properties, child_required));
        copy_item_bounds(&mut array_schema, &parent_tokens);

        properties.insert(parent.clone(), array_schema);
        if is_required(&parent_tokens) {
            required.push(parent.clone());
        }
    }

    // Array-of-scalar parents; the object form wins if both were declared
    for (parent, item_tokens) in &scalar_arrays {
        if object_arrays.contains_key(parent) {
            continue;
        }

        let parent_tokens = plain.get(parent).cloned().unwrap_or_default();
        let mut array_schema = SchemaNode::array(parse_tokens(item_tokens));
        copy_item_bounds(&mut array_schema, &parent_tokens);

        properties.insert(parent.clone(), array_schema);
        if is_required(&parent_tokens) {
            required.push(parent.clone());
        }
    }

    SchemaNode::object(properties, required)
}

/// Compile one field's token list, applying description extraction and the
/// overlay. Returns the schema and whether the field is required.
fn compile_field(tokens: &[String], overlay: Option<&FieldOverlay>) -> (SchemaNode, bool) {
    let mut tokens = tokens.to_vec();
    let embedded = extract_description(&mut tokens);
    let has_embedded = embedded.is_some();

    let mut schema = parse_tokens(&tokens);
    if let Some(description) = embedded {
        // An embedded description beats the overlay's
        schema.description = Some(description);
    }
    if let Some(overlay) = overlay {
        overlay.apply(&mut schema, has_embedded);
    }

    (schema, is_required(&tokens))
}

/// Pull an embedded `description` entry out of the token list, supporting
/// both the associative `description:text` form and the positional
/// `description` token followed by its value.
fn extract_description(tokens: &mut Vec<String>) -> Option<String> {
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] == "description" {
            if i + 1 < tokens.len() {
                let value = tokens.remove(i + 1);
                tokens.remove(i);
                return Some(value);
            }
            tokens.remove(i);
            return None;
        }
        if let Some(rest) = tokens[i].strip_prefix("description:") {
            let value = rest.to_string();
            tokens.remove(i);
            return Some(value);
        }
        i += 1;
    }
    None
}

/// Whether the token list marks the field required. Any token beginning with
/// `required` counts, which conservatively covers `required_if` variants.
fn is_required(tokens: &[String]) -> bool {
    tokens
        .iter()
        .any(|t| t == "required" || t.starts_with("required"))
}

/// Copy `min:`/`max:` bounds from a parent's plain rule entry onto an array
/// schema as `minItems`/`maxItems`.
fn copy_item_bounds(schema: &mut SchemaNode, parent_tokens: &[String]) {
    for token in parent_tokens {
        if let Some((name, rest)) = token.split_once(':') {
            let first = rest.split(',').next().unwrap_or("");
            match name {
                "min" => {
                    if let Ok(n) = first.parse::<u64>() {
                        schema.min_items = Some(n);
                    }
                }
                "max" => {
                    if let Ok(n) = first.parse::<u64>() {
                        schema.max_items = Some(n);
                    }
                }
                _ => {}
            }
        }
    }
}

/// Fold an ordered token list into a schema.
fn parse_tokens(tokens: &[String]) -> SchemaNode {
    let mut schema = SchemaNode::string();
    let mut kind_fixed = false;

    for token in tokens {
        let (name, rest) = match token.split_once(':') {
            Some((name, rest)) => (name, Some(rest)),
            None => (token.as_str(), None),
        };
        let params: Vec<&str> = rest.map(|r| r.split(',').collect()).unwrap_or_default();

        match name {
            "integer" | "int" => {
                fix_kind(&mut schema, &mut kind_fixed, "integer");
            }
            "numeric" | "number" => {
                fix_kind(&mut schema, &mut kind_fixed, "number");
            }
            "boolean" | "bool" => {
                fix_kind(&mut schema, &mut kind_fixed, "boolean");
            }
            "array" => {
                if fix_kind(&mut schema, &mut kind_fixed, "array") {
                    schema.items = Some(Box::new(SchemaNode::string()));
                }
            }
            "string" => {
                fix_kind(&mut schema, &mut kind_fixed, "string");
            }
            "email" => schema.format = Some("email".to_string()),
            "url" => schema.format = Some("uri".to_string()),
            "date" => schema.format = Some("date".to_string()),
            "date_format" => schema.format = Some("date-time".to_string()),
            "uuid" => schema.format = Some("uuid".to_string()),
            "ip" | "ipv4" => schema.format = Some("ipv4".to_string()),
            "ipv6" => schema.format = Some("ipv6".to_string()),
            "json" => schema.format = Some("json".to_string()),
            "timezone" => schema.format = Some("timezone".to_string()),
            "file" | "image" => {
                fix_kind(&mut schema, &mut kind_fixed, "string");
                schema.schema_type = Some("string".to_string());
                schema.format = Some("binary".to_string());
                if schema.description.is_none() {
                    schema.description = Some(if name == "image" {
                        "Image file upload".to_string()
                    } else {
                        "File upload".to_string()
                    });
                }
            }
            "mimes" => {
                if schema.format.is_none() {
                    schema.format = Some("binary".to_string());
                }
                let hint = format!("Allowed mime types: {}", params.join(", "));
                schema.description = Some(match schema.description.take() {
                    Some(existing) => format!("{} ({})", existing, hint),
                    None => hint,
                });
            }
            "alpha" => {
                fix_kind(&mut schema, &mut kind_fixed, "string");
                schema.pattern = Some("^[a-zA-Z]+$".to_string());
            }
            "alpha_dash" => {
                fix_kind(&mut schema, &mut kind_fixed, "string");
                schema.pattern = Some("^[a-zA-Z0-9_-]+$".to_string());
            }
            "alpha_num" => {
                fix_kind(&mut schema, &mut kind_fixed, "string");
                schema.pattern = Some("^[a-zA-Z0-9]+$".to_string());
            }
            "digits" => {
                if let Some(n) = params.first() {
                    fix_kind(&mut schema, &mut kind_fixed, "string");
                    schema.pattern = Some(format!("^[0-9]{{{}}}$", n));
                }
            }
            "digits_between" => {
                if params.len() >= 2 {
                    fix_kind(&mut schema, &mut kind_fixed, "string");
                    schema.pattern = Some(format!("^[0-9]{{{},{}}}$", params[0], params[1]));
                }
            }
            "min" => {
                if let Some(n) = parse_bound(&params) {
                    apply_min(&mut schema, n);
                }
            }
            "max" => {
                if let Some(n) = parse_bound(&params) {
                    apply_max(&mut schema, n);
                }
            }
            "between" => {
                if params.len() >= 2 {
                    if let (Ok(lo), Ok(hi)) = (params[0].parse::<i64>(), params[1].parse::<i64>())
                    {
                        apply_min(&mut schema, lo);
                        apply_max(&mut schema, hi);
                    }
                }
            }
            "size" => {
                if let Some(n) = parse_bound(&params) {
                    apply_min(&mut schema, n);
                    apply_max(&mut schema, n);
                }
            }
            "gt" => {
                if let Some(n) = parse_bound(&params) {
                    if is_string_kind(&schema) {
                        // Exclusive bounds shift by one on lengths
                        schema.min_length = Some((n + 1).max(0) as u64);
                    } else {
                        schema.minimum = Some(n);
                        schema.exclusive_minimum = Some(true);
                    }
                }
            }
            "gte" => {
                if let Some(n) = parse_bound(&params) {
                    apply_min(&mut schema, n);
                }
            }
            "lt" => {
                if let Some(n) = parse_bound(&params) {
                    if is_string_kind(&schema) {
                        schema.max_length = Some((n - 1).max(0) as u64);
                    } else {
                        schema.maximum = Some(n);
                        schema.exclusive_maximum = Some(true);
                    }
                }
            }
            "lte" => {
                if let Some(n) = parse_bound(&params) {
                    apply_max(&mut schema, n);
                }
            }
            "in" => {
                let values: Vec<Value> = params.iter().map(|p| coerce_enum_value(p)).collect();
                if is_boolean_pair(&values) {
                    // `in:true,false` describes a boolean, not a string pair
                    schema.schema_type = Some("boolean".to_string());
                    kind_fixed = true;
                }
                schema.enum_values = Some(values);
            }
            "not_in" => {
                let values: Vec<Value> = params.iter().map(|p| coerce_enum_value(p)).collect();
                schema.not = Some(Box::new(SchemaNode {
                    enum_values: Some(values),
                    ..SchemaNode::default()
                }));
            }
            "starts_with" => {
                let escaped: Vec<String> = params.iter().map(|p| regex_escape(p)).collect();
                schema.pattern = Some(format!("^({})", escaped.join("|")));
            }
            "ends_with" => {
                let escaped: Vec<String> = params.iter().map(|p| regex_escape(p)).collect();
                schema.pattern = Some(format!("({})$", escaped.join("|")));
            }
            "regex" => {
                // Raw pattern, commas and all
                if let Some(pattern) = rest {
                    schema.pattern = Some(pattern.to_string());
                }
            }
            // Required-ness is governed solely by the required-family check
            "nullable" => {}
            _ => {}
        }
    }

    schema
}

/// Set the base kind if no type-determining token has claimed it yet.
/// Returns whether this call fixed the kind.
fn fix_kind(schema: &mut SchemaNode, kind_fixed: &mut bool, kind: &str) -> bool {
    if *kind_fixed {
        return false;
    }
    schema.schema_type = Some(kind.to_string());
    *kind_fixed = true;
    true
}

fn is_string_kind(schema: &SchemaNode) -> bool {
    schema.schema_type.as_deref() == Some("string")
}

fn parse_bound(params: &[&str]) -> Option<i64> {
    params.first().and_then(|p| p.parse::<i64>().ok())
}

/// Length bound for string kinds, magnitude bound otherwise.
fn apply_min(schema: &mut SchemaNode, n: i64) {
    if is_string_kind(schema) {
        schema.min_length = Some(n.max(0) as u64);
    } else {
        schema.minimum = Some(n);
    }
}

fn apply_max(schema: &mut SchemaNode, n: i64) {
    if is_string_kind(schema) {
        schema.max_length = Some(n.max(0) as u64);
    } else {
        schema.maximum = Some(n);
    }
}

/// Coerce an `in:`/`not_in:` parameter to its natural JSON literal.
fn coerce_enum_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = raw.parse::<i64>() {
                Value::from(n)
            } else if let Ok(f) = raw.parse::<f64>() {
                Value::from(f)
            } else {
                Value::String(raw.to_string())
            }
        }
    }
}

/// Exactly `{true, false}` in either order
fn is_boolean_pair(values: &[Value]) -> bool {
    values.len() == 2
        && values.contains(&Value::Bool(true))
        && values.contains(&Value::Bool(false))
}

fn regex_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
