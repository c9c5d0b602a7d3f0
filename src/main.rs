use anyhow::Context;
use clap::{Parser, Subcommand};
use course_admin::logic::FieldPath;
use course_admin::{
    init_logging, ApiClient, AppConfig, EntityId, EntityRecord, FilterState, RemoteApi, Resource,
    SessionFile, TableView,
};
use itertools::Itertools;
use log::info;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "course-admin", about = "Administer classes, courses, students and enrollments")]
struct Cli {
    /// Session file holding the bearer token
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    /// Override api.base_url
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List rows, optionally filtered
    List {
        resource: Resource,
        /// Case-insensitive text to look for
        #[arg(long)]
        search: Option<String>,
        /// Fields searched by --search (all fields when omitted)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Exact match criterion, repeatable: --where active=true
        #[arg(long = "where", value_parser = parse_assignment)]
        criteria: Vec<(String, Value)>,
        /// Print these columns tab-separated instead of JSON
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Show one row
    Show {
        resource: Resource,
        #[arg(value_parser = parse_entity_id)]
        id: EntityId,
    },
    /// Create a row from field=value pairs
    Create {
        resource: Resource,
        #[arg(value_parser = parse_assignment, required = true)]
        fields: Vec<(String, Value)>,
    },
    /// Update fields of a row: set enrollments 42 enrollmentProgress=pass
    Set {
        resource: Resource,
        #[arg(value_parser = parse_entity_id)]
        id: EntityId,
        #[arg(value_parser = parse_assignment, required = true)]
        fields: Vec<(String, Value)>,
    },
    /// Delete a row
    Delete {
        resource: Resource,
        #[arg(value_parser = parse_entity_id)]
        id: EntityId,
    },
}

fn parse_entity_id(raw: &str) -> Result<EntityId, String> {
    if raw.trim().is_empty() {
        return Err("id must not be empty".to_string());
    }
    Ok(raw.parse::<EntityId>().unwrap_or_else(|never| match never {}))
}

/// `key=value`, with the value read as JSON when it parses and as text otherwise
fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn into_map(pairs: Vec<(String, Value)>) -> Map<String, Value> {
    pairs.into_iter().collect()
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn column_line(record: &EntityRecord, columns: &[String]) -> String {
    let mut cells = columns.iter().map(|column| match FieldPath(column).extract(record) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    });
    cells.join("\t")
}

fn print_columns(records: &[EntityRecord], columns: &[String]) {
    println!("{}", columns.iter().join("\t"));
    for record in records {
        println!("{}", column_line(record, columns));
    }
}

async fn run(command: Command, api: Arc<dyn RemoteApi>, session: course_admin::Session) -> anyhow::Result<()> {
    match command {
        Command::List {
            resource,
            search,
            fields,
            criteria,
            columns,
        } => {
            let mut view = TableView::new(api, session, resource);
            view.mount().await?;

            let mut filter = FilterState::new().with_search(search.unwrap_or_default(), fields);
            for (field, value) in criteria {
                filter = filter.with_exact(field, value);
            }
            view.set_filter(filter);

            let rows = view.displayed();
            info!("{}: showing {} of {} rows", resource, rows.len(), view.rows().len());
            if columns.is_empty() {
                print_json(&rows)?;
            } else {
                print_columns(&rows, &columns);
            }
        }
        Command::Show { resource, id } => {
            let view = TableView::new(api, session, resource);
            let record = view.reload(&id).await?;
            print_json(&record)?;
        }
        Command::Create { resource, fields } => {
            let view = TableView::new(api, session, resource);
            let record = view.create(into_map(fields)).await?;
            print_json(&record)?;
        }
        Command::Set {
            resource,
            id,
            fields,
        } => {
            let view = TableView::new(api, session, resource);
            view.reload(&id).await?;
            let outcome = view.update_fields(&id, into_map(fields)).await?;
            print_json(&outcome.record)?;
        }
        Command::Delete { resource, id } => {
            let view = TableView::new(api, session, resource);
            view.delete(&id).await?;
            info!("{} {} deleted", resource, id);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    init_logging("info");

    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    if let Some(path) = cli.session {
        config.session.path = Some(path.display().to_string());
    }

    let session_file = SessionFile::new(config.session_path()?);
    let session = session_file
        .load()
        .with_context(|| format!("loading session from {}", session_file.path().display()))?;
    info!(
        "{} as {} against {}",
        env!("CARGO_PKG_NAME"),
        session.display_name(),
        config.api.base_url
    );

    let api: Arc<dyn RemoteApi> = Arc::new(ApiClient::new(&config.api)?);
    run(cli.command, api, session).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("active=false").unwrap(),
            ("active".to_string(), json!(false))
        );
        assert_eq!(
            parse_assignment("enrollmentProgress=pass").unwrap(),
            ("enrollmentProgress".to_string(), json!("pass"))
        );
        assert_eq!(
            parse_assignment("note=a=b").unwrap(),
            ("note".to_string(), json!("a=b"))
        );
        assert!(parse_assignment("=x").is_err());
        assert!(parse_assignment("novalue").is_err());
    }

    #[test]
    fn test_column_line() {
        let record = EntityRecord::new(42)
            .with_field("name", "Ada")
            .with_field("active", true)
            .with_field("student", json!({"email": "ada@example.com"}));
        let columns: Vec<String> = ["id", "name", "active", "student.email", "missing"]
            .iter()
            .map(|c| c.to_string())
            .collect();

        assert_eq!(
            column_line(&record, &columns),
            "42\tAda\ttrue\tada@example.com\t"
        );
    }

    #[test]
    fn test_cli_parses_set_command() {
        let cli = Cli::try_parse_from([
            "course-admin",
            "set",
            "enrollments",
            "42",
            "enrollmentProgress=pass",
            "day2=\"absent\"",
        ])
        .unwrap();

        match cli.command {
            Command::Set {
                resource,
                id,
                fields,
            } => {
                assert_eq!(resource, Resource::Enrollments);
                assert_eq!(id, EntityId::Num(42));
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[1], ("day2".to_string(), json!("absent")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_list_filters() {
        let cli = Cli::try_parse_from([
            "course-admin",
            "list",
            "locations",
            "--search",
            "harbour",
            "--fields",
            "name,city",
            "--where",
            "active=true",
        ])
        .unwrap();

        match cli.command {
            Command::List {
                fields, criteria, ..
            } => {
                assert_eq!(fields, vec!["name".to_string(), "city".to_string()]);
                assert_eq!(criteria, vec![("active".to_string(), json!(true))]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
