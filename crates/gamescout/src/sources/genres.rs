use scraper::{Html, Selector};

/// Collect the trimmed text of every element matching `selector`.
///
/// Elements with no text are dropped.
pub fn parse_genres(html: &str, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .map(|element| element_text(&element))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Text content of an element with surrounding whitespace removed.
pub(super) fn element_text(element: &scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
