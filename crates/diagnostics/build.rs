//! Build script for generating rule identity tables at compile time.
//!
//! This script reads `spec/rules.jsonc` and generates Rust files:
//! - `generated_codes.rs`: public constants mapping rule constant names to their IDs
//! - `generated_explain.rs`: match expression mapping IDs to their descriptions
//! - `generated_common_names.rs`: match expression mapping IDs to human-readable names
//! - `generated_severity.rs`: ID → default severity lookup
//! - `generated_templates.rs`: (ID, variant) → message template lookup

use cmdlint_jsonc_strip::jsonc_to_json;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    let spec_path = Path::new("spec/rules.jsonc");
    println!("cargo:rerun-if-changed={}", spec_path.display());

    let raw = fs::read_to_string(spec_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", spec_path.display()));

    let spec: serde_json::Value =
        serde_json::from_str(&jsonc_to_json(&raw)).expect("failed to parse rules.jsonc as JSON");

    let entries = spec["diagnostics"]
        .as_array()
        .expect("rules.jsonc: expected `diagnostics` array");

    let out_dir = env::var("OUT_DIR").unwrap();
    let out_path = Path::new(&out_dir);

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    let header = "// Auto-generated from spec/rules.jsonc. DO NOT EDIT.\n\n";
    let mut codes = String::from(header);
    let mut explain = String::from("match id {\n");
    let mut common_names = String::from("match id {\n");
    let mut severity = String::from("match id {\n");
    let mut templates = String::from("match (id, variant) {\n");

    for (i, entry) in entries.iter().enumerate() {
        let field = |key: &str| str_field(entry, key, i);
        let id = field("id");
        let const_name = field("constName");

        assert!(
            !const_name.is_empty()
                && const_name
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
                && const_name.as_bytes()[0].is_ascii_uppercase(),
            "diagnostics[{i}] (id={id}): constName '{const_name}' is not a valid SCREAMING_SNAKE_CASE identifier"
        );
        assert!(
            seen_ids.insert(id.to_string()),
            "diagnostics[{i}]: duplicate id '{id}'"
        );
        assert!(
            seen_names.insert(const_name.to_string()),
            "diagnostics[{i}] (id={id}): duplicate constName '{const_name}'"
        );

        codes.push_str(&format!("/// {}\n", field("summary")));
        codes.push_str(&format!("pub const {const_name}: &str = \"{id}\";\n\n"));

        explain.push_str(&format!(
            "    \"{id}\" => Some(\"{}\"),\n",
            escape_rust_string_literal(field("description"))
        ));
        common_names.push_str(&format!(
            "    \"{id}\" => Some(\"{}\"),\n",
            escape_rust_string_literal(field("commonName"))
        ));

        let sev_rs = match field("severity") {
            "error" => "Severity::Error",
            "warning" => "Severity::Warning",
            "information" => "Severity::Information",
            "parseerror" => "Severity::ParseError",
            other => panic!("diagnostics[{i}] (id={id}): invalid severity '{other}'"),
        };
        severity.push_str(&format!("    \"{id}\" => Some({sev_rs}),\n"));

        let context_keys: HashSet<&str> = entry["contextKeys"]
            .as_array()
            .unwrap_or_else(|| panic!("diagnostics[{i}] (id={id}) missing `contextKeys`"))
            .iter()
            .map(|k| {
                k.as_str().unwrap_or_else(|| {
                    panic!("diagnostics[{i}] (id={id}) contextKeys entries must be strings")
                })
            })
            .collect();
        if let Some(map) = entry["messageTemplates"].as_object() {
            for (variant, template) in map {
                let template = template.as_str().unwrap_or_else(|| {
                    panic!("diagnostics[{i}] (id={id}) messageTemplates.{variant} must be a string")
                });
                for placeholder in extract_template_placeholders(template) {
                    assert!(
                        context_keys.contains(placeholder.as_str()),
                        "diagnostics[{i}] (id={id}) messageTemplates.{variant} references placeholder '{{{placeholder}}}' not listed in contextKeys"
                    );
                }
                templates.push_str(&format!(
                    "    (\"{id}\", \"{variant}\") => Some(\"{}\"),\n",
                    escape_rust_string_literal(template)
                ));
            }
        }
    }

    for table in [
        &mut explain,
        &mut common_names,
        &mut severity,
        &mut templates,
    ] {
        table.push_str("    _ => None,\n}\n");
    }

    let write = |name: &str, body: &str| {
        fs::write(out_path.join(name), body).unwrap_or_else(|e| panic!("failed to write {name}: {e}"));
    };
    write("generated_codes.rs", &codes);
    write("generated_explain.rs", &explain);
    write("generated_common_names.rs", &common_names);
    write("generated_severity.rs", &severity);
    write("generated_templates.rs", &templates);
}

fn str_field<'a>(entry: &'a serde_json::Value, key: &str, i: usize) -> &'a str {
    entry[key]
        .as_str()
        .unwrap_or_else(|| panic!("diagnostics[{i}] missing `{key}`"))
}

fn escape_rust_string_literal(value: &str) -> String {
    value.chars().flat_map(char::escape_default).collect()
}

fn extract_template_placeholders(template: &str) -> HashSet<String> {
    let mut placeholders = HashSet::new();
    let mut scan_from = 0usize;
    while let Some(open_rel) = template[scan_from..].find('{') {
        let after_open = scan_from + open_rel + 1;
        let Some(close_rel) = template[after_open..].find('}') else {
            break;
        };
        let close = after_open + close_rel;
        let key = template[after_open..close].trim();
        if !key.is_empty() {
            placeholders.insert(key.to_string());
        }
        scan_from = close + 1;
    }
    placeholders
}
