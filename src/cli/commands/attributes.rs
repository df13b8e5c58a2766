//! Attributes command implementation
//!
//! This module implements the `attributes` command, which prints the source
//! columns the field mapping reads for an element key.

use super::{build_mapper, load_checked_config, EXIT_CONFIG, EXIT_FAILED, EXIT_OK};
use crate::core::mapping::{ElementKey, FieldMapper};
use crate::domain::Result;
use clap::Args;
use std::str::FromStr;

/// Arguments for the attributes command
#[derive(Args, Debug)]
pub struct AttributesArgs {
    /// Element key, e.g. `order` or `order|items`
    pub element: String,
}

impl AttributesArgs {
    /// Execute the attributes command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let key = match ElementKey::from_str(&self.element) {
            Ok(key) => key,
            Err(e) => {
                println!("❌ Invalid element key '{}'", self.element);
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let Some(config) = load_checked_config(config_path) else {
            return Ok(EXIT_CONFIG);
        };
        let mapper = build_mapper(&config.mapping);

        match describe(&mapper, &key) {
            Ok(lines) => {
                for line in lines {
                    println!("{line}");
                }
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to read field mapping");
                println!("   Error: {e}");
                Ok(EXIT_FAILED)
            }
        }
    }
}

fn describe(mapper: &FieldMapper, key: &ElementKey) -> Result<Vec<String>> {
    let attributes = mapper.attributes_to_select(key)?;
    let mut lines = vec![format!("📋 Attributes for '{key}' ({}):", attributes.len())];
    lines.extend(attributes.iter().map(|a| format!("  {a}")));

    if let ElementKey::Simple(element) = key {
        let subs = mapper.sub_elements(element)?;
        if !subs.is_empty() {
            lines.push(format!("  sub-elements: {}", subs.join(", ")));
        }
    }
    Ok(lines)
}
