//! `mkdrawio embed` command implementation.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use clap::Args;
use mkdrawio_config::{CliSettings, Config};
use mkdrawio_embed::{PageTransformer, ViewerAsset};
use rayon::prelude::*;

use crate::error::CliError;
use crate::output::Output;
use crate::site::{self, SitePage};

/// Arguments for the embed command.
#[derive(Args)]
pub(crate) struct EmbedArgs {
    /// Path to configuration file (default: auto-discover mkdrawio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Page source directory (overrides config).
    #[arg(short, long)]
    docs_dir: Option<PathBuf>,

    /// Built site directory to transform in place (overrides config).
    #[arg(short, long)]
    site_dir: Option<PathBuf>,

    /// Diagram file extension to look for in image sources (overrides config).
    #[arg(long)]
    file_extension: Option<String>,

    /// Enable verbose output (show per-diagram warnings and cache activity).
    #[arg(short, long)]
    pub verbose: bool,
}

/// Totals for one run over a site.
#[derive(Debug, Default, PartialEq, Eq)]
struct EmbedSummary {
    pages: usize,
    changed: usize,
    embedded: usize,
    failed: usize,
    /// Pages that could not be read or written.
    page_errors: usize,
}

impl EmbedArgs {
    /// Execute the embed command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the site or viewer asset
    /// cannot be accessed. Unreadable pages are reported and skipped.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            docs_dir: self.docs_dir,
            site_dir: self.site_dir,
            file_extension: self.file_extension,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Docs directory: {}",
            config.site_resolved.docs_dir.display()
        ));
        output.info(&format!(
            "Site directory: {}",
            config.site_resolved.site_dir.display()
        ));

        let summary = embed_site(&config)?;

        output.info(&format!(
            "Processed {} pages, {} changed",
            summary.pages, summary.changed
        ));
        if summary.failed > 0 {
            output.warning(&format!(
                "{} diagram(s) could not be embedded (run with --verbose for details)",
                summary.failed
            ));
        }
        if summary.page_errors > 0 {
            output.warning(&format!(
                "{} page(s) could not be processed and were left as they were",
                summary.page_errors
            ));
        }
        output.success(&format!("Embedded {} diagram(s)", summary.embedded));
        Ok(())
    }
}

/// Transform every page of the configured site and publish the viewer.
fn embed_site(config: &Config) -> Result<EmbedSummary, CliError> {
    let site = &config.site_resolved;
    if !site.site_dir.is_dir() {
        return Err(CliError::Validation(format!(
            "Site directory not found: {}",
            site.site_dir.display()
        )));
    }

    ensure_project_dir(&site.project_dir)?;
    let viewer = ViewerAsset::bootstrap(&site.viewer_dir())?;

    let pages = site::collect_pages(&site.site_dir)?;
    // Rewritten pages reference the viewer, so it must exist before any page changes
    let published = viewer.publish(&site.site_dir)?;
    let transformer = PageTransformer::new(config.drawio.file_extension.as_str());

    let results: Vec<_> = pages
        .par_iter()
        .map(|page| embed_page(&transformer, page, &site.docs_dir, site.use_directory_urls))
        .collect();

    let mut summary = EmbedSummary {
        pages: pages.len(),
        ..EmbedSummary::default()
    };
    for result in results {
        match result {
            Ok(outcome) => {
                summary.changed += usize::from(outcome.changed);
                summary.embedded += outcome.embedded;
                summary.failed += outcome.failed;
            }
            Err(err) => {
                tracing::warn!(error = %err, "skipping page");
                summary.page_errors += 1;
            }
        }
    }

    tracing::info!(
        pages = summary.pages,
        diagrams = transformer.cache().len(),
        viewer = %published.display(),
        "site processed"
    );

    Ok(summary)
}

/// Result of processing a single page file.
struct PageResult {
    changed: bool,
    embedded: usize,
    failed: usize,
}

fn embed_page(
    transformer: &PageTransformer,
    page: &SitePage,
    docs_dir: &Path,
    use_directory_urls: bool,
) -> Result<PageResult, CliError> {
    let page_error = |source| CliError::Page {
        path: page.path.clone(),
        source,
    };

    let html = std::fs::read_to_string(&page.path).map_err(page_error)?;
    let source_dir = site::source_dir_for(docs_dir, &page.dest_path, use_directory_urls);
    let script = ViewerAsset::href_for(&page.dest_path);

    let outcome = transformer.transform_page(&html, &source_dir, &script);
    let changed = matches!(outcome.html, Cow::Owned(_));
    if changed {
        std::fs::write(&page.path, outcome.html.as_bytes()).map_err(page_error)?;
        tracing::info!(page = %page.dest_path, embedded = outcome.embedded, "page updated");
    }

    Ok(PageResult {
        changed,
        embedded: outcome.embedded,
        failed: outcome.failed,
    })
}

/// Ensure the `.mkdrawio/` project directory exists with a `.gitignore`.
fn ensure_project_dir(project_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(project_dir)?;

    let gitignore_path = project_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let _ = std::fs::write(&gitignore_path, "# Automatically created by mkdrawio\n*\n");
    }

    Ok(())
}
