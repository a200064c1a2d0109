//! HTML parser for Amazon search results and product detail pages.

use crate::amazon::models::{Asin, Listing, NOT_AVAILABLE, NO_REVIEWS};
use crate::amazon::selectors::{errors, product, search};
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

/// Extracts product identifiers from a rendered search results page.
///
/// Identifiers are returned in document order and may repeat; the caller
/// owns deduplication.
pub fn parse_search_links(html: &str) -> Vec<Asin> {
    let document = Html::parse_document(html);

    document
        .select(&search::PRODUCT_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let asin = Asin::from_href(href);
            if asin.is_none() {
                trace!("Ignoring non-product link: {}", href);
            }
            asin
        })
        .collect()
}

/// Parses a product detail page into a listing for `url`.
///
/// Never fails: each missing field falls back to its placeholder on its own.
pub fn parse_listing(html: &str, url: &str) -> Listing {
    let document = Html::parse_document(html);

    let title = first_text(&document, &product::TITLE);
    let price = parse_price(&document);
    let rating = first_text(&document, &product::RATING);
    let reviews = first_text(&document, &product::REVIEW_COUNT);
    let availability = first_text(&document, &product::AVAILABILITY);

    Listing {
        title: title.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        url: url.to_string(),
        price: price.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        rating: rating.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        reviews: reviews.unwrap_or_else(|| NO_REVIEWS.to_string()),
        availability: availability.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}

/// Returns true for CAPTCHA and "dog" error pages served instead of content.
pub fn is_blocked_page(html: &str) -> bool {
    let document = Html::parse_document(html);
    document.select(&errors::CAPTCHA).next().is_some()
        || document.select(&errors::DOG_PAGE).next().is_some()
}

/// Joins the whole and fractional price parts, e.g. `12,999` + `00` -> `12,999.00`.
fn parse_price(document: &Html) -> Option<String> {
    let whole = first_text(document, &product::PRICE_WHOLE)?;
    // The whole part carries its own decimal point span
    let whole = whole.trim_end_matches('.').trim_end();
    if whole.is_empty() {
        return None;
    }

    let fraction = first_text(document, &product::PRICE_FRACTION).unwrap_or_default();
    Some(format!("{}.{}", whole, fraction))
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().map(element_text).filter(|text| !text.is_empty())
}

/// Element text with whitespace collapsed.
fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}
