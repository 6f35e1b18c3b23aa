//! Generate static files

use anyhow::Result;

use crate::generator::Generator;
use crate::Spacetraveling;

/// Generate the static site from the configured CMS
pub async fn run(site: &Spacetraveling) -> Result<()> {
    let start = std::time::Instant::now();

    let source = site.content_source()?;
    let generator = Generator::new(site)?;
    let stats = generator.generate(source.as_ref()).await?;

    tracing::info!(
        "Generated {} list pages and {} posts ({} skipped)",
        stats.list_pages,
        stats.posts,
        stats.skipped
    );
    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
