use std::collections::BTreeSet;
use std::fmt;
use std::num::IntErrorKind;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRangeError {
    #[error("Empty page token at position {position}")]
    EmptyToken { position: usize },
    #[error("Invalid page number: {0:?}")]
    InvalidNumber(String),
    #[error("Invalid page range: {0:?}")]
    InvalidRange(String),
}

/// A single token of a page expression: either `N` or `N-M` (1-based, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl PageRange {
    /// Parse a page range token like "5" or "2-3"
    pub fn parse(s: &str) -> Result<Self, PageRangeError> {
        let s = s.trim();

        if let Some((start_str, end_str)) = s.split_once('-') {
            // "1-2-3" is not a range
            if end_str.contains('-') {
                return Err(PageRangeError::InvalidRange(s.to_string()));
            }
            let start = parse_page_number(start_str)
                .map_err(|_| PageRangeError::InvalidRange(s.to_string()))?;
            let end = parse_page_number(end_str)
                .map_err(|_| PageRangeError::InvalidRange(s.to_string()))?;
            Ok(PageRange {
                start,
                end: Some(end),
            })
        } else {
            Ok(PageRange {
                start: parse_page_number(s)?,
                end: None,
            })
        }
    }

    /// Expand into the 1-based pages that exist in a document of `total_pages`.
    ///
    /// Pages outside `1..=total_pages` are dropped. A reversed range such as
    /// `5-2` yields nothing.
    pub fn expand(&self, total_pages: u32) -> impl Iterator<Item = u32> {
        let end = self.end.unwrap_or(self.start);
        // Clamp before enumerating so `1-4000000000` stays cheap.
        let lo = self.start.max(1);
        let hi = end.min(total_pages);
        lo..=hi
    }
}

/// Numbers too large for `u32` saturate; they are past any page anyway and
/// get dropped by [`PageRange::expand`].
fn parse_page_number(s: &str) -> Result<u32, PageRangeError> {
    let s = s.trim();
    match s.parse::<u32>() {
        Ok(n) => Ok(n),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(u32::MAX),
        Err(_) => Err(PageRangeError::InvalidNumber(s.to_string())),
    }
}

/// Parse a comma-separated list of page ranges like "2-3,5".
///
/// Every token is validated before anything is returned, so one bad token
/// rejects the whole expression.
pub fn parse_page_ranges(s: &str) -> Result<Vec<PageRange>, PageRangeError> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }

    s.split(',')
        .enumerate()
        .map(|(i, part)| {
            if part.trim().is_empty() {
                Err(PageRangeError::EmptyToken { position: i + 1 })
            } else {
                PageRange::parse(part)
            }
        })
        .collect()
}

/// Zero-based page indices selected for removal, ascending and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    indices: BTreeSet<u32>,
}

impl PageSelection {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.indices.contains(&index)
    }

    /// Zero-based indices in ascending order
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().copied()
    }

    /// 1-based page numbers in ascending order
    pub fn page_numbers(&self) -> Vec<u32> {
        self.indices().map(|i| i + 1).collect()
    }

    /// 1-based page numbers that survive removal from a `total_pages` document
    pub fn kept_pages(&self, total_pages: u32) -> Vec<u32> {
        (0..total_pages)
            .filter(|i| !self.contains(*i))
            .map(|i| i + 1)
            .collect()
    }

    /// Canonical expression for this selection, e.g. `[1, 2, 4]` becomes "2-3,5".
    pub fn to_expression(&self) -> String {
        let mut parts = Vec::new();
        let mut iter = self.page_numbers().into_iter().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }
            if start == end {
                parts.push(start.to_string());
            } else {
                parts.push(format!("{}-{}", start, end));
            }
        }
        parts.join(",")
    }
}

impl FromIterator<u32> for PageSelection {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        PageSelection {
            indices: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(&self.to_expression())
        }
    }
}

/// Parse a page expression into the zero-based indices it selects in a
/// document of `total_pages` pages.
pub fn parse_page_selection(s: &str, total_pages: u32) -> Result<PageSelection, PageRangeError> {
    let ranges = parse_page_ranges(s)?;
    Ok(ranges
        .iter()
        .flat_map(|range| range.expand(total_pages))
        .map(|page| page - 1)
        .collect())
}
