use scraper::{Html, Selector};

use super::error::{SourceError, parse_selector};
use super::genres::element_text;
use super::{ImageBatch, ImageBatchEntry, ImageBatchOutcome};

/// Selectors for the upcoming-releases page.
#[derive(Debug, Clone)]
pub struct UpcomingSelectors {
    pub image: Selector,
    pub date: Selector,
}

impl UpcomingSelectors {
    pub fn parse(image: &str, date: &str) -> Result<Self, SourceError> {
        Ok(Self {
            image: parse_selector(image)?,
            date: parse_selector(date)?,
        })
    }
}

/// Pair the first `max_items` images with the first `max_items` dates.
///
/// Pairs are positional. `available` is the number of complete pairs on the
/// page; at most `min(requested, available)` are returned and images without
/// a `src` are skipped. A page with no pairs at all is unavailable.
pub fn parse_image_batch(
    html: &str,
    selectors: &UpcomingSelectors,
    max_items: usize,
    requested: u32,
) -> ImageBatchOutcome {
    let document = Html::parse_document(html);

    let images: Vec<Option<String>> = document
        .select(&selectors.image)
        .take(max_items)
        .map(|img| {
            img.value()
                .attr("src")
                .map(str::trim)
                .filter(|src| !src.is_empty())
                .map(str::to_string)
        })
        .collect();
    let dates: Vec<String> = document
        .select(&selectors.date)
        .take(max_items)
        .map(|span| element_text(&span))
        .collect();

    let available = images.len().min(dates.len());
    if available == 0 {
        return ImageBatchOutcome::Unavailable;
    }

    let requested = usize::try_from(requested).unwrap_or(usize::MAX);
    let count = requested.min(available);

    let entries = images
        .into_iter()
        .zip(dates)
        .take(count)
        .filter_map(|(image_url, release_date)| {
            image_url.map(|image_url| ImageBatchEntry {
                image_url,
                release_date,
            })
        })
        .collect();

    ImageBatchOutcome::Batch(ImageBatch {
        entries,
        available,
        exceeded_available: requested > available,
    })
}
