//! Folio command-line administration.
//!
//! Initializes the database, registers sites and their domains, shows which
//! site a host resolves to and prints a site's webpage tree.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use folio_cms::documents::{ContentTypeRegistry, DocumentService};
use folio_cms::resolver::SiteResolver;
use folio_cms::{FolioConfig, init_logging};
use folio_persistence::backends::sqlite::SqliteBackend;
use folio_persistence::site::{NewSite, SiteDirectory};
use folio_persistence::tenant::SiteId;
use tracing::info;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Multi-site content management core")]
struct Cli {
    #[command(flatten)]
    config: FolioConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or migrate the database schema
    Init,

    /// Register a site
    AddSite {
        /// Display name
        name: String,
        /// Primary authority, e.g. www.example.com
        base_url: String,
        /// Secondary authority
        #[arg(long)]
        staging_url: Option<String>,
    },

    /// Register an alias authority for a site
    AddRedirect { site_id: i64, authority: String },

    /// Show the site serving a host
    Resolve { authority: String },

    /// List sites, or print the webpage tree of the site serving a host
    Tree {
        /// Host to resolve; lists every site when omitted
        authority: Option<String>,
    },
}

/// Opens the SQLite backend named by the configuration.
fn create_backend(config: &FolioConfig) -> anyhow::Result<Arc<SqliteBackend>> {
    info!(database = %config.database_url, "Opening SQLite backend");
    let backend = SqliteBackend::with_config(&config.database_url, config.sqlite_config())?;
    backend.init_schema()?;
    Ok(Arc::new(backend))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config;
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let backend = create_backend(&config)?;

    match cli.command {
        Command::Init => {
            println!("Schema ready at {}", config.database_url);
        }
        Command::AddSite {
            name,
            base_url,
            staging_url,
        } => {
            let mut new_site = NewSite::new(name, base_url);
            if let Some(staging_url) = staging_url {
                new_site = new_site.with_staging_url(staging_url);
            }
            let site = backend.create_site(new_site).await?;
            println!("Created site {} ({})", site.id, site.base_url);
        }
        Command::AddRedirect { site_id, authority } => {
            let domain = backend
                .add_redirected_domain(SiteId::new(site_id), &authority)
                .await?;
            println!("Redirecting {} to site {}", domain.url, domain.site_id);
        }
        Command::Resolve { authority } => {
            let resolver = SiteResolver::new(backend, config.resolver_options());
            let resolved = resolver.resolve(&authority).await?;
            println!(
                "{} -> site {} '{}' ({})",
                authority, resolved.site.id, resolved.site.name, resolved.source
            );
        }
        Command::Tree { authority: None } => {
            for site in backend.list_sites().await? {
                println!("{}\t{}\t{}", site.id, site.name, site.base_url);
                for domain in &site.redirected_domains {
                    println!("\t-> {}", domain.url);
                }
            }
        }
        Command::Tree {
            authority: Some(authority),
        } => {
            let resolver = SiteResolver::new(backend.clone(), config.resolver_options());
            let locator = resolver.locator(authority);
            let site = locator.current_site().await?.clone();
            let tenant = locator.tenant_context().await?;
            let documents = DocumentService::with_config(
                backend,
                Arc::new(ContentTypeRegistry::with_defaults()),
                config.service_config(),
            );

            println!("{} ({})", site.name, site.base_url);
            // Depth-first, children pushed in reverse so they print in order.
            let mut stack: Vec<_> = documents
                .children(&tenant, None)
                .await?
                .into_iter()
                .rev()
                .map(|doc| (doc, 1usize))
                .collect();
            while let Some((doc, depth)) = stack.pop() {
                let status = if doc.is_published() { "" } else { " [draft]" };
                println!(
                    "{}{} /{}{}",
                    "  ".repeat(depth),
                    doc.name,
                    doc.url_segment().unwrap_or_default(),
                    status
                );
                if let Some(id) = doc.id() {
                    let children = documents.children(&tenant, Some(id)).await?;
                    stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
                }
            }
        }
    }

    Ok(())
}
