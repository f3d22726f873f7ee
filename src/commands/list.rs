//! List site content

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::content::loader::ContentLoader;
use crate::content::{Document, LinkResolver};
use crate::Site;

#[derive(Debug, Serialize)]
struct DocumentRow {
    source: String,
    title: String,
    url: String,
    layout: Option<String>,
}

#[derive(Debug, Serialize)]
struct PermalinkRow {
    output: String,
    sources: Vec<String>,
}

/// List site content by type
pub fn run(site: &Site, content_type: &str, json: bool) -> Result<()> {
    let loader = ContentLoader::new(site)?;
    let (content, _) = loader.load_all();
    let mut documents = content.documents;
    documents.sort_by(|a, b| a.source.cmp(&b.source));

    for failure in &content.failures {
        eprintln!("  ! {}", failure);
    }

    match content_type {
        "document" | "documents" => {
            let rows = document_rows(site, &documents);
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            println!("Documents ({}):", rows.len());
            for row in rows {
                println!("  {} - {} [{}]", row.url, row.title, row.source);
            }
        }
        "link" | "links" => {
            let resolver = LinkResolver::new(&documents, &site.config);
            let table = resolver.link_table();
            if json {
                let map: BTreeMap<_, _> = table.into_iter().collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
                return Ok(());
            }
            println!("Link targets ({}):", table.len());
            for (source, url) in table {
                println!("  {} -> {}", source, url.unwrap_or("(kept as written)"));
            }
        }
        "permalink" | "permalinks" => {
            let rows = permalink_rows(site, &documents);
            let collisions: Vec<_> = rows.iter().filter(|r| r.sources.len() > 1).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
                return Ok(());
            }
            println!("Outputs ({}):", rows.len());
            for row in &rows {
                println!("  {} <- {}", row.output, row.sources.join(", "));
            }
            if !collisions.is_empty() {
                println!("Collisions ({}):", collisions.len());
                for row in collisions {
                    println!(
                        "  {}: keeping {}, skipping {}",
                        row.output,
                        row.sources[0],
                        row.sources[1..].join(", ")
                    );
                }
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: documents, links, permalinks",
                content_type
            );
        }
    }

    Ok(())
}

fn document_rows(site: &Site, documents: &[Document]) -> Vec<DocumentRow> {
    documents
        .iter()
        .map(|doc| DocumentRow {
            source: doc.source.clone(),
            title: doc.title(),
            url: doc.url(&site.config),
            layout: doc.layout(),
        })
        .collect()
}

/// Group documents by output path. Expects `documents` in source order,
/// so the first source of each row is the one that gets published.
fn permalink_rows(site: &Site, documents: &[Document]) -> Vec<PermalinkRow> {
    let mut outputs: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for doc in documents {
        let output = doc.output_path(&site.config).to_string_lossy().replace('\\', "/");
        outputs.entry(output).or_default().push(doc.source.clone());
    }
    outputs
        .into_iter()
        .map(|(output, sources)| PermalinkRow { output, sources })
        .collect()
}
