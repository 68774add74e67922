use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use serde::Serialize;

use resorts_catalog::{Catalog, ImageFailure, WithImages};
use resorts_core::ResortDocument;
use resorts_document::{AttachmentFailure, Stored};

use crate::OutputFormat;
use crate::commands::files::read_upload;

#[derive(Subcommand, Debug)]
pub enum ResortsCommand {
    /// List every resort with its photos.
    List,
    /// Show one resort with its photos.
    Get {
        /// Resort ID.
        id: String,
    },
    /// Create a resort.
    Create {
        /// Resort name.
        #[arg(long)]
        name: String,
        /// Resort description.
        #[arg(long, default_value = "")]
        description: String,
        /// Photo to attach (repeatable).
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
    /// Update a resort. Fields not given keep their current value; photos
    /// with a new name are added, photos with an existing name replaced.
    Update {
        /// Resort ID.
        id: String,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// Photo to attach (repeatable).
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
    /// Delete a resort. Uploaded photos are kept in the object store.
    Delete {
        /// Resort ID.
        id: String,
    },
}

/// Printable form of a resort, including its resolved images.
#[derive(Serialize)]
struct ResortView<'a> {
    id: &'a str,
    #[serde(rename = "resortName")]
    name: &'a str,
    #[serde(rename = "resortDescription")]
    description: &'a str,
    images: &'a [String],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    image_errors: Vec<String>,
}

impl<'a> From<&'a ResortDocument> for ResortView<'a> {
    fn from(doc: &'a ResortDocument) -> Self {
        Self {
            id: &doc.id,
            name: &doc.name,
            description: &doc.description,
            images: &doc.images,
            image_errors: Vec::new(),
        }
    }
}

impl<'a> From<&'a WithImages<ResortDocument>> for ResortView<'a> {
    fn from(item: &'a WithImages<ResortDocument>) -> Self {
        Self {
            image_errors: image_errors(item),
            ..Self::from(&item.document)
        }
    }
}

/// Human-readable reasons why some of a resort's photos are missing.
fn image_errors(item: &WithImages<ResortDocument>) -> Vec<String> {
    match &item.images {
        Ok(set) => set
            .failures
            .iter()
            .map(|ImageFailure { address, error }| format!("{address}: {error}"))
            .collect(),
        Err(e) => vec![format!("attachment feed unreadable: {e}")],
    }
}

pub async fn run(
    catalog: &Catalog<ResortDocument>,
    command: &ResortsCommand,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match command {
        ResortsCommand::List => run_list(catalog, format).await,
        ResortsCommand::Get { id } => run_get(catalog, id, format).await,
        ResortsCommand::Create {
            name,
            description,
            files,
        } => {
            let uploads = files
                .iter()
                .map(|p| read_upload(p))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let stored = catalog
                .create(ResortDocument::new(name, description), uploads)
                .await?;
            print_stored("created", &stored, format)
        }
        ResortsCommand::Update {
            id,
            name,
            description,
            files,
        } => {
            let mut doc = catalog
                .get(id)
                .await?
                .with_context(|| format!("resort '{id}' not found"))?;
            if let Some(name) = name {
                doc.name.clone_from(name);
            }
            if let Some(description) = description {
                doc.description.clone_from(description);
            }
            let uploads = files
                .iter()
                .map(|p| read_upload(p))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let stored = catalog.update(id, doc, uploads).await?;
            print_stored("updated", &stored, format)
        }
        ResortsCommand::Delete { id } => {
            if catalog.delete(id).await? {
                println!("Resort '{id}' deleted.");
            } else {
                println!("Resort '{id}' not found.");
            }
            Ok(())
        }
    }
}

async fn run_list(catalog: &Catalog<ResortDocument>, format: &OutputFormat) -> anyhow::Result<()> {
    let listing = catalog.list_with_images().await;
    match format {
        OutputFormat::Json => {
            let views: Vec<ResortView<'_>> = listing.items.iter().map(ResortView::from).collect();
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
        OutputFormat::Text => {
            println!("{} resorts:", listing.items.len());
            for item in &listing.items {
                let doc = &item.document;
                println!(
                    "  {id} | {name} | {images} photo(s)",
                    id = doc.id,
                    name = doc.name,
                    images = doc.images.len(),
                );
                for error in image_errors(item) {
                    eprintln!("    photo unavailable: {error}");
                }
            }
        }
    }
    if let Some(e) = &listing.interrupted {
        eprintln!("Listing incomplete: {e}");
    }
    Ok(())
}

async fn run_get(
    catalog: &Catalog<ResortDocument>,
    id: &str,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let Some(item) = catalog.get_with_images(id).await? else {
        eprintln!("Resort '{id}' not found.");
        std::process::exit(1);
    };
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&ResortView::from(&item))?);
        }
        OutputFormat::Text => {
            let doc = &item.document;
            println!("ID:          {}", doc.id);
            println!("Name:        {}", doc.name);
            println!("Description: {}", doc.description);
            println!("Photos:      {}", doc.images.len());
            for error in image_errors(&item) {
                eprintln!("  photo unavailable: {error}");
            }
        }
    }
    Ok(())
}

fn print_stored(
    verb: &str,
    stored: &Stored<ResortDocument>,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let failures: Vec<_> = stored
                .attachment_failures
                .iter()
                .map(|f| serde_json::json!({ "name": f.name, "reason": f.reason.to_string() }))
                .collect();
            let out = serde_json::json!({
                "resort": ResortView::from(&stored.document),
                "attachment_failures": failures,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("Resort '{}' {verb}.", stored.document.id);
            for AttachmentFailure { name, reason } in &stored.attachment_failures {
                eprintln!("  photo '{name}' not attached: {reason}");
            }
        }
    }
    Ok(())
}
