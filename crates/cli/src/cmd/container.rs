//! Container commands - create, empty, rename, archive, drop and inspect tables
//!
//! # Usage
//!
//! ```bash
//! snowflake-export create Orders -C OriginEntityCode -C Name -C PlacedAt:datetime
//! snowflake-export rename Orders OrdersOld
//! snowflake-export archive Orders
//! snowflake-export columns Orders
//! ```

use anyhow::Result;
use clap::Args;
use snowflake_export::sanitize::{valid_container_name, valid_data_type_name};
use snowflake_export::{ContainerModel, DataType};

use super::Target;

/// Create command arguments
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Table name
    pub name: String,

    /// Column as NAME or NAME:TYPE (repeatable)
    #[arg(short = 'C', long = "column", value_parser = parse_column, required = true)]
    pub columns: Vec<(String, DataType)>,
}

/// Arguments for commands that take a single table name
#[derive(Args, Debug)]
pub struct NameArgs {
    /// Table name
    pub name: String,
}

/// Rename command arguments
#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Current table name
    pub old_name: String,

    /// New table name
    pub new_name: String,
}

/// Parse `NAME` or `NAME:TYPE`; the type defaults to text
fn parse_column(s: &str) -> Result<(String, DataType), String> {
    let (name, data_type) = match s.split_once(':') {
        Some((name, ty)) => (name, ty.parse::<DataType>().map_err(|e| format!("{}", e))?),
        None => (s, DataType::Text),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("column '{}' has no name", s));
    }
    Ok((name.to_string(), data_type))
}

pub async fn create(target: &Target, args: CreateArgs) -> Result<()> {
    // Names go through the same rules the host applies before creating tables
    let model = args.columns.into_iter().fold(
        ContainerModel::new(valid_container_name(&args.name)),
        |model, (name, ty)| model.with_column(valid_data_type_name(&name), ty),
    );

    target
        .connector
        .create_container(&target.context(), target.connection_id, &model)
        .await?;
    println!("created {} ({} columns)", model.name, model.columns.len());
    Ok(())
}

pub async fn empty(target: &Target, args: NameArgs) -> Result<()> {
    target
        .connector
        .empty_container(&target.context(), target.connection_id, &args.name)
        .await?;
    println!("emptied {}", args.name);
    Ok(())
}

pub async fn rename(target: &Target, args: RenameArgs) -> Result<()> {
    target
        .connector
        .rename_container(
            &target.context(),
            target.connection_id,
            &args.old_name,
            &args.new_name,
        )
        .await?;
    println!("renamed {} to {}", args.old_name, args.new_name);
    Ok(())
}

pub async fn archive(target: &Target, args: NameArgs) -> Result<()> {
    let archived = target
        .connector
        .archive_container(&target.context(), target.connection_id, &args.name)
        .await?;
    println!("archived {} as {}", args.name, archived);
    Ok(())
}

pub async fn remove(target: &Target, args: NameArgs) -> Result<()> {
    target
        .connector
        .remove_container(&target.context(), target.connection_id, &args.name)
        .await?;
    println!("dropped {}", args.name);
    Ok(())
}

pub async fn tables(target: &Target) -> Result<()> {
    let containers = target
        .connector
        .get_containers(&target.context(), target.connection_id)
        .await;
    for container in &containers {
        println!("{}", container.name);
    }
    eprintln!(
        "{} tables on connection '{}'",
        containers.len(),
        target.connection_name
    );
    Ok(())
}

pub async fn columns(target: &Target, args: NameArgs) -> Result<()> {
    let columns = target
        .connector
        .get_data_types(&target.context(), target.connection_id, &args.name)
        .await;
    if columns.is_empty() {
        eprintln!("no columns found for {}", args.name);
        return Ok(());
    }

    let width = columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
    for column in &columns {
        println!(
            "{:<width$}  {}",
            column.name,
            column.raw_data_type,
            width = width
        );
    }
    Ok(())
}
