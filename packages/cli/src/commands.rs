//! CLI command execution.
//!
//! Commands:
//! - `block <id|url>` - Show a block's title, type and attributes
//! - `children <id|url>` - List child blocks in order
//! - `rows <collection-id> [--query q]` - List rows of a collection
//! - `set <id|url> <property> <value>` - Update one property
//! - `create <parent-id> --type t [--title text]` - Create a block
//!
//! Every command renders to a string so it can be tested without a
//! terminal.

use chrono::NaiveDate;
use nu_ansi_term::{Color, Style};
use serde_json::{Map, Value};

use pagekit::{table, Block, Client, Identifier, NotionDate, PropertyType, PropertyValue};

use crate::Command;

/// Accept either a bare id or a page URL.
pub fn parse_target(raw: &str) -> pagekit::Result<Identifier> {
    if raw.contains('/') {
        Ok(Identifier::from_url(raw)?)
    } else {
        Ok(Identifier::parse(raw)?)
    }
}

pub fn execute(client: &Client, command: &Command) -> pagekit::Result<String> {
    match command {
        Command::Block { target } => {
            let block = client.get_block(parse_target(target)?)?;
            Ok(render_block(&block))
        }
        Command::Children { target } => {
            let block = client.get_block(parse_target(target)?)?;
            Ok(render_list(&block.children()?))
        }
        Command::Rows { collection, query } => {
            let collection = client.get_collection(parse_target(collection)?)?;
            let rows = collection.list_rows(query.as_deref().unwrap_or_default())?;
            Ok(render_list(&rows))
        }
        Command::Set {
            target,
            property,
            value,
        } => {
            let mut block = client.get_block(parse_target(target)?)?;
            let kind = property_kind(&block, property);
            let value = parse_property_value(value, kind.as_ref()).map_err(|message| {
                pagekit::Error::InvalidValue {
                    name: property.clone(),
                    message,
                }
            })?;
            client.update_record(&mut block, [(property.as_str(), value)])?;
            Ok(format!(
                "{} {} {}",
                Color::Green.paint("ok"),
                Color::Cyan.paint(property),
                block.id()
            ))
        }
        Command::Create {
            parent,
            block_type,
            title,
        } => {
            let parent = client.get_block(parse_target(parent)?)?;
            let mut attributes = Map::new();
            attributes.insert("type".to_string(), Value::from(block_type.as_str()));
            if let Some(title) = title {
                attributes.insert(
                    "properties".to_string(),
                    serde_json::json!({ "title": [[title]] }),
                );
            }
            let id = client.create_record(table::BLOCK, &parent, attributes)?;
            Ok(format!("{} {}", Color::Green.paint("created"), id))
        }
    }
}

fn property_kind(block: &Block<'_>, name: &str) -> Option<PropertyType> {
    if name == "title" {
        return Some(PropertyType::Title);
    }
    block.property(name).ok().map(|p| p.kind().clone())
}

/// Turn command line text into a value for a property of `kind`.
///
/// Dates are `YYYY-MM-DD` or `YYYY-MM-DD..YYYY-MM-DD`; checkboxes accept
/// yes/no/true/false; multi-selects are comma separated. Without a known
/// kind the text is stored as is.
pub fn parse_property_value(
    input: &str,
    kind: Option<&PropertyType>,
) -> Result<PropertyValue, String> {
    let Some(kind) = kind else {
        return Ok(PropertyValue::Text(input.to_string()));
    };

    match kind {
        PropertyType::Date => {
            let date = |s: &str| {
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map_err(|e| format!("'{}' is not a YYYY-MM-DD date: {}", s, e))
            };
            match input.split_once("..") {
                Some((start, end)) => Ok(NotionDate::range(date(start)?, date(end)?).into()),
                None => Ok(date(input)?.into()),
            }
        }
        PropertyType::Number => input
            .trim()
            .parse::<f64>()
            .map(PropertyValue::Number)
            .map_err(|_| format!("'{}' is not a number", input)),
        PropertyType::Checkbox => match input.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "1" => Ok(PropertyValue::Checkbox(true)),
            "no" | "false" | "0" => Ok(PropertyValue::Checkbox(false)),
            other => Err(format!("'{}' is not yes or no", other)),
        },
        PropertyType::Select => Ok(PropertyValue::Select(input.to_string())),
        PropertyType::MultiSelect => Ok(PropertyValue::MultiSelect(
            input
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )),
        _ => Ok(PropertyValue::Text(input.to_string())),
    }
}

pub fn render_block(block: &Block<'_>) -> String {
    let label = Style::new().bold();
    let mut out = format!(
        "{} {}\n{} {}\n{} {}\n",
        label.paint("title:"),
        block.title(),
        label.paint("type:"),
        Color::Yellow.paint(block.block_type()),
        label.paint("id:"),
        block.id()
    );

    let properties = block.properties();
    if !properties.is_empty() {
        out.push_str(&format!("{}\n", label.paint("properties:")));
        for property in properties {
            let value = property.value().map(|v| v.as_text()).unwrap_or_default();
            out.push_str(&format!(
                "  {} ({}): {}\n",
                Color::Cyan.paint(property.name()),
                Color::DarkGray.paint(property.kind().to_string()),
                value
            ));
        }
    }

    let attributes =
        serde_json::to_string_pretty(block.attributes()).unwrap_or_else(|e| e.to_string());
    out.push_str(&format!("{}\n{}", label.paint("attributes:"), attributes));
    out
}

pub fn render_list(blocks: &[Block<'_>]) -> String {
    if blocks.is_empty() {
        return format!("{}", Color::DarkGray.paint("(none)"));
    }
    blocks
        .iter()
        .map(|block| {
            format!(
                "{}  {}  {}",
                Color::DarkGray.paint(block.id().to_string()),
                Color::Yellow.paint(format!("{:<20}", block.block_type())),
                block.title()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_accepts_urls_and_ids() {
        let id =
            parse_target("https://www.notion.so/My-Page-4a5b6c7d8e9f40a1b2c3d4e5f6a7b8c9").unwrap();
        assert_eq!(id.to_string(), "4a5b6c7d-8e9f-40a1-b2c3-d4e5f6a7b8c9");
        assert_eq!(parse_target("4a5b6c7d8e9f40a1b2c3d4e5f6a7b8c9").unwrap(), id);
        assert!(matches!(
            parse_target("xyz"),
            Err(pagekit::Error::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn date_values() {
        let value = parse_property_value("2024-01-01", Some(&PropertyType::Date)).unwrap();
        assert_eq!(
            value,
            PropertyValue::from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );

        let range =
            parse_property_value("2024-01-01..2024-01-03", Some(&PropertyType::Date)).unwrap();
        assert!(matches!(
            range,
            PropertyValue::Date(NotionDate { end: Some(_), .. })
        ));

        assert!(parse_property_value("tomorrow", Some(&PropertyType::Date)).is_err());
    }

    #[test]
    fn scalar_values() {
        assert_eq!(
            parse_property_value("3.5", Some(&PropertyType::Number)).unwrap(),
            PropertyValue::Number(3.5)
        );
        assert!(parse_property_value("lots", Some(&PropertyType::Number)).is_err());
        assert_eq!(
            parse_property_value("Yes", Some(&PropertyType::Checkbox)).unwrap(),
            PropertyValue::Checkbox(true)
        );
        assert_eq!(
            parse_property_value("a, b", Some(&PropertyType::MultiSelect)).unwrap(),
            PropertyValue::MultiSelect(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            parse_property_value("free text", None).unwrap(),
            PropertyValue::Text("free text".to_string())
        );
    }
}
