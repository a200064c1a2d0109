//! CSS selectors for Amazon HTML parsing.
//!
//! Every selector the harvester relies on lives here. When Amazon changes
//! its markup, capture an HTML sample, update the selector, and add a
//! fixture under `tests/fixtures/`.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for search results pages.
pub mod search {
    use super::*;

    /// Raw CSS for the product link anchors; also used as the browser wait condition.
    pub const PRODUCT_LINK_CSS: &str = "a.a-link-normal.s-no-outline";

    /// Product link anchor on a result card (image link).
    pub static PRODUCT_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(PRODUCT_LINK_CSS).unwrap());
}

/// Selectors for product detail pages.
pub mod product {
    use super::*;

    pub static TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span#productTitle").unwrap());

    /// Integer part of the price, e.g. `12,999.`
    pub static PRICE_WHOLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-price-whole").unwrap());

    pub static PRICE_FRACTION: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-price-fraction").unwrap());

    /// Star rating text, e.g. `4.2 out of 5 stars`.
    pub static RATING: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-icon-alt").unwrap());

    pub static REVIEW_COUNT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#acrCustomerReviewText").unwrap());

    pub static AVAILABILITY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("#availability span").unwrap());
}

/// Selectors for detecting anti-bot pages.
pub mod errors {
    use super::*;

    /// CAPTCHA form.
    pub static CAPTCHA: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "form[action*='validateCaptcha'], \
             img[src*='captcha']",
        )
        .unwrap()
    });

    /// Dog page (Amazon's 503 page). Exact matches only: product images
    /// routinely mention dogs in their alt text.
    pub static DOG_PAGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a[href='/ref=cs_503_link'], \
             img[alt='Dogs of Amazon']",
        )
        .unwrap()
    });
}
