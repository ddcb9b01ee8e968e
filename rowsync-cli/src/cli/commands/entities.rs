//! `rowsync entities [name]`

use anyhow::Result;
use colored::*;

use crate::schema::{self, EntitySchema, FieldDef};

/// List every entity kind, or the fields of one
pub fn handle_entities_command(name: Option<String>) -> Result<()> {
    match name {
        Some(name) => {
            let schema = EntitySchema::find(&name).ok_or_else(|| {
                anyhow::anyhow!("Unknown entity '{}'. Run 'rowsync entities' to list them.", name)
            })?;
            println!("{}", entity_line(schema));
            println!();
            for field in schema.fields {
                println!("  {}", field_line(field));
            }
        }
        None => {
            println!(
                "{:<14} {:<14} {:<24} {}",
                "ENTITY".bold(),
                "TABLE".bold(),
                "NATURAL KEY".bold(),
                "SOURCE".bold()
            );
            for schema in schema::ALL {
                println!("{}", entity_line(schema));
            }
        }
    }
    Ok(())
}

fn entity_line(schema: &EntitySchema) -> String {
    format!(
        "{:<14} {:<14} {:<24} {} ({} fields) - {}",
        schema.name.bright_green(),
        schema.table,
        schema.key_label(),
        schema.source_relation,
        schema.fields.len(),
        schema.description.dimmed()
    )
}

fn field_line(field: &FieldDef) -> String {
    let mut flags = Vec::new();
    if field.key {
        flags.push("key");
    }
    if field.nullable {
        flags.push("nullable");
    }
    format!(
        "{:<26} {:<28} {:<10} {}",
        field.name,
        field.source,
        field.field_type.label(),
        flags.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{STOCK, VENTE_DETAIL};

    #[test]
    fn test_entity_line_names_key_and_source() {
        colored::control::set_override(false);
        let line = entity_line(&VENTE_DETAIL);
        assert!(line.starts_with("vente_detail"));
        assert!(line.contains("num_vente, id_stock"));
        assert!(line.contains("View_VTE_VENTE_DETAIL_90J (11 fields)"));
    }

    #[test]
    fn test_field_line_flags() {
        let key = field_line(&STOCK.fields[0]);
        assert!(key.starts_with("id_stock"));
        assert!(key.contains("ID_STOCK"));
        assert!(key.trim_end().ends_with("key"));

        let index = STOCK.field_index("date_peremption").unwrap();
        let line = field_line(&STOCK.fields[index]);
        assert!(line.contains("timestamp"));
        assert!(line.trim_end().ends_with("nullable"));
    }

    #[test]
    fn test_unknown_entity_is_an_error() {
        assert!(handle_entities_command(Some("invoices".to_string())).is_err());
    }
}
