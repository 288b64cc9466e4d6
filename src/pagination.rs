//! This module defines the common functionality for paging the student list.

use maud::{Markup, html};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum students to display per page when not specified in a request.
    pub default_page_size: u64,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 25,
            max_pages: 5,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PaginationIndicator {
    Page(u64),
    CurrPage(u64),
    Ellipsis,
    NextButton(u64),
    BackButton(u64),
}

/// The window of page numbers centred on `curr_page`, clamped to the ends
/// of the page range.
fn page_window(curr_page: u64, page_count: u64, max_pages: u64) -> (u64, u64) {
    if page_count <= max_pages {
        return (1, page_count);
    }

    let half = max_pages / 2;

    if curr_page <= half {
        (1, max_pages)
    } else if curr_page > page_count - half {
        (page_count - max_pages + 1, page_count)
    } else {
        (curr_page - half, curr_page + half)
    }
}

pub fn create_pagination_indicators(
    curr_page: u64,
    page_count: u64,
    max_pages: u64,
) -> Vec<PaginationIndicator> {
    let (window_start, window_end) = page_window(curr_page, page_count, max_pages);

    let mut indicators = Vec::new();

    if curr_page > 1 {
        indicators.push(PaginationIndicator::BackButton(curr_page - 1));
    }

    if window_start > 1 {
        indicators.push(PaginationIndicator::Page(1));
        indicators.push(PaginationIndicator::Ellipsis);
    }

    for page in window_start..=window_end {
        if page == curr_page {
            indicators.push(PaginationIndicator::CurrPage(page));
        } else {
            indicators.push(PaginationIndicator::Page(page));
        }
    }

    if window_end < page_count {
        indicators.push(PaginationIndicator::Ellipsis);
        indicators.push(PaginationIndicator::Page(page_count));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}

const PAGE_LINK_STYLE: &str = "flex items-center justify-center px-3 h-8 leading-tight \
    text-gray-500 bg-white border border-gray-300 hover:bg-gray-100 hover:text-gray-700 \
    dark:bg-gray-800 dark:border-gray-700 dark:text-gray-400 dark:hover:bg-gray-700 \
    dark:hover:text-white";

const CURR_PAGE_STYLE: &str = "flex items-center justify-center px-3 h-8 leading-tight \
    text-blue-600 bg-blue-50 border border-gray-300 dark:bg-gray-700 dark:text-white \
    dark:border-gray-700";

/// Render the pagination indicators as a row of links.
///
/// `page_url` maps a page number to the URL of that page, so callers can
/// carry their other query parameters across page changes.
pub fn pagination_nav(
    indicators: &[PaginationIndicator],
    page_url: impl Fn(u64) -> String,
) -> Markup {
    html!(
        nav aria-label="Pages"
        {
            ul class="inline-flex -space-x-px text-sm"
            {
                @for indicator in indicators
                {
                    li
                    {
                        @match indicator
                        {
                            PaginationIndicator::BackButton(page) =>
                                a href=(page_url(*page)) class=(PAGE_LINK_STYLE) { "Previous" }
                            PaginationIndicator::NextButton(page) =>
                                a href=(page_url(*page)) class=(PAGE_LINK_STYLE) { "Next" }
                            PaginationIndicator::Page(page) =>
                                a href=(page_url(*page)) class=(PAGE_LINK_STYLE) { (page) }
                            PaginationIndicator::CurrPage(page) =>
                                span aria-current="page" class=(CURR_PAGE_STYLE) { (page) }
                            PaginationIndicator::Ellipsis =>
                                span class=(PAGE_LINK_STYLE) { "..." }
                        }
                    }
                }
            }
        }
    )
}
