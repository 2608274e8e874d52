use anyhow::{anyhow, Result};
use colored::*;
use std::path::Path;

use crate::config::WardenConfig;

/// Print the effective configuration
pub fn show(config: &WardenConfig, source: &Path, format: &str) -> Result<()> {
    let value = serde_yaml::to_value(config)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(config)?),
        "yaml" => print!("{}", serde_yaml::to_string(config)?),
        _ => {
            println!("{}", "=== Warden Configuration ===".bold());
            println!("{}: {}", "Source".bold(), source.display().to_string().green());
            println!();
            print_yaml_value(&value, 0);
        }
    }

    Ok(())
}

/// Print one configuration value, addressed by a dotted path
pub fn get(config: &WardenConfig, section: &str, format: &str) -> Result<()> {
    let root = serde_yaml::to_value(config)?;
    let parts: Vec<&str> = section.split('.').filter(|p| !p.is_empty()).collect();
    let value = navigate_config_path(&root, &parts)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&value)?),
        "yaml" => print!("{}", serde_yaml::to_string(&value)?),
        _ => print_config_value(section, &value),
    }

    Ok(())
}

/// Navigate through the configuration structure to find a specific value.
/// Sequence entries are addressed by index, e.g. `authentication.0.path`.
fn navigate_config_path(root: &serde_yaml::Value, path: &[&str]) -> Result<serde_yaml::Value> {
    if path.is_empty() {
        return Err(anyhow!("Empty configuration path"));
    }

    let mut current = root;
    for (i, &key) in path.iter().enumerate() {
        let next = match current {
            serde_yaml::Value::Mapping(map) => map.get(key),
            serde_yaml::Value::Sequence(seq) => key.parse::<usize>().ok().and_then(|n| seq.get(n)),
            _ => {
                let partial_path = path[..i].join(".");
                return Err(anyhow!(
                    "Cannot navigate further from '{}': not a mapping",
                    partial_path
                ));
            }
        };

        current = next.ok_or_else(|| {
            let partial_path = path[..=i].join(".");
            anyhow!("Configuration key '{}' not found", partial_path)
        })?;
    }

    Ok(current.clone())
}

/// Print a specific configuration value
fn print_config_value(path: &str, value: &serde_yaml::Value) {
    println!("{}: {}", "Path".bold(), path.cyan());
    println!("{}: {}", "Type".bold(), value_type_name(value).yellow());
    println!("{}:", "Value".bold());
    print_yaml_value(value, 0);
}

/// Get a human-readable name for a YAML value type
fn value_type_name(value: &serde_yaml::Value) -> &str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "boolean",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "array",
        serde_yaml::Value::Mapping(_) => "object",
        serde_yaml::Value::Tagged(_) => "tagged",
    }
}

/// Recursively print a YAML value with indentation
fn print_yaml_value(value: &serde_yaml::Value, indent_level: usize) {
    let indent = "  ".repeat(indent_level);

    match value {
        serde_yaml::Value::Null => println!("{}null", indent),
        serde_yaml::Value::Bool(b) => println!("{}{}", indent, b.to_string().blue()),
        serde_yaml::Value::Number(n) => println!("{}{}", indent, n.to_string().magenta()),
        serde_yaml::Value::String(s) => {
            if s.contains('/') || s.contains('\\') {
                println!("{}{}", indent, s.green());
            } else {
                println!("{}{}", indent, s.yellow());
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for item in seq {
                println!("{}-", indent);
                print_yaml_value(item, indent_level + 1);
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (key, val) in map {
                let key = match key {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => format!("{:?}", other),
                };
                print!("{}{}: ", indent, key.cyan());

                // Print simple values on the same line
                match val {
                    serde_yaml::Value::Null
                    | serde_yaml::Value::Bool(_)
                    | serde_yaml::Value::Number(_)
                    | serde_yaml::Value::String(_) => print_yaml_value(val, 0),
                    _ => {
                        println!();
                        print_yaml_value(val, indent_level + 1);
                    }
                }
            }
        }
        serde_yaml::Value::Tagged(tagged) => {
            println!("{}!{} ", indent, tagged.tag);
            print_yaml_value(&tagged.value, indent_level + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> serde_yaml::Value {
        serde_yaml::from_str(
            r#"
            server:
                host: 127.0.0.1
                port: 3030
            authentication:
                - type: htpasswd
                  path: /etc/warden/users.htpasswd
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_navigate_config_path() {
        let root = sample();

        let result = navigate_config_path(&root, &["server", "port"]).unwrap();
        assert_eq!(result, serde_yaml::Value::Number(3030.into()));

        let result = navigate_config_path(&root, &["authentication", "0", "type"]).unwrap();
        assert_eq!(result, serde_yaml::Value::String("htpasswd".to_string()));

        assert!(navigate_config_path(&root, &["invalid"]).is_err());
        assert!(navigate_config_path(&root, &["server", "port", "deeper"]).is_err());
        assert!(navigate_config_path(&root, &["authentication", "7"]).is_err());
        assert!(navigate_config_path(&root, &[]).is_err());
    }

    #[test]
    fn test_value_type_name() {
        assert_eq!(value_type_name(&serde_yaml::Value::Null), "null");
        assert_eq!(value_type_name(&serde_yaml::Value::Bool(true)), "boolean");
        assert_eq!(
            value_type_name(&serde_yaml::Value::Sequence(vec![])),
            "array"
        );
        assert_eq!(
            value_type_name(&serde_yaml::Value::Mapping(serde_yaml::Mapping::new())),
            "object"
        );
    }
}
