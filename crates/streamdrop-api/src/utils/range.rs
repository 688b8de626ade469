//! `Range` request header handling for single byte ranges.
//!
//! Supported forms: `bytes=start-end`, `bytes=start-` and `bytes=-suffix`. Requests for
//! several ranges at once are answered with the whole resource; anything else that cannot
//! be satisfied against the current length is a 416.

use streamdrop_core::AppError;

/// Inclusive byte span within a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` header.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// What to send back for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSelection {
    Full,
    Partial(ByteRange),
}

/// Resolve a `Range` header value against a resource of `len` bytes.
pub fn select_range(header: Option<&str>, len: u64) -> Result<RangeSelection, AppError> {
    let Some(header) = header else {
        return Ok(RangeSelection::Full);
    };
    let unsatisfiable = || AppError::RangeNotSatisfiable { length: len };

    let (unit, set) = header.trim().split_once('=').ok_or_else(unsatisfiable)?;
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return Err(unsatisfiable());
    }
    if set.contains(',') {
        if set.split(',').any(|part| part.trim().is_empty()) {
            return Err(unsatisfiable());
        }
        return Ok(RangeSelection::Full);
    }
    if len == 0 {
        return Err(unsatisfiable());
    }

    let (first, last) = set.trim().split_once('-').ok_or_else(unsatisfiable)?;
    let (first, last) = (first.trim(), last.trim());
    let last_byte = len - 1;

    let range = if first.is_empty() {
        let suffix: u64 = last.parse().map_err(|_| unsatisfiable())?;
        if suffix == 0 {
            return Err(unsatisfiable());
        }
        ByteRange {
            start: len.saturating_sub(suffix),
            end: last_byte,
        }
    } else {
        let start: u64 = first.parse().map_err(|_| unsatisfiable())?;
        let end: u64 = if last.is_empty() {
            last_byte
        } else {
            last.parse().map_err(|_| unsatisfiable())?
        };
        if start > end || start >= len {
            return Err(unsatisfiable());
        }
        ByteRange {
            start,
            end: end.min(last_byte),
        }
    };

    Ok(RangeSelection::Partial(range))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(header: &str, len: u64) -> ByteRange {
        match select_range(Some(header), len).unwrap() {
            RangeSelection::Partial(range) => range,
            RangeSelection::Full => panic!("expected a partial range for {}", header),
        }
    }

    fn rejected(header: &str, len: u64) -> bool {
        matches!(
            select_range(Some(header), len),
            Err(AppError::RangeNotSatisfiable { length }) if length == len
        )
    }

    #[test]
    fn test_no_header_is_full() {
        assert_eq!(select_range(None, 1000).unwrap(), RangeSelection::Full);
    }

    #[test]
    fn test_closed_range() {
        let range = partial("bytes=0-99", 1000);
        assert_eq!(range, ByteRange { start: 0, end: 99 });
        assert_eq!(range.len(), 100);
        assert_eq!(range.content_range(1000), "bytes 0-99/1000");
    }

    #[test]
    fn test_open_ended_range() {
        assert_eq!(partial("bytes=500-", 1000), ByteRange { start: 500, end: 999 });
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(partial("bytes=-100", 1000), ByteRange { start: 900, end: 999 });
        assert_eq!(partial("bytes=-5000", 1000), ByteRange { start: 0, end: 999 });
    }

    #[test]
    fn test_end_past_eof_is_clamped() {
        assert_eq!(partial("bytes=900-5000", 1000), ByteRange { start: 900, end: 999 });
    }

    #[test]
    fn test_last_byte() {
        assert_eq!(partial("bytes=999-999", 1000).len(), 1);
    }

    #[test]
    fn test_unsatisfiable_ranges() {
        assert!(rejected("bytes=2000-", 1000));
        assert!(rejected("bytes=1000-1000", 1000));
        assert!(rejected("bytes=50-10", 1000));
        assert!(rejected("bytes=-0", 1000));
        assert!(rejected("bytes=0-", 0));
        assert!(rejected("items=0-10", 1000));
        assert!(rejected("bytes=abc-", 1000));
        assert!(rejected("bytes", 1000));
        assert!(rejected("bytes=", 1000));
    }

    #[test]
    fn test_multi_range_falls_back_to_full() {
        assert_eq!(
            select_range(Some("bytes=0-1,5-6"), 1000).unwrap(),
            RangeSelection::Full
        );
    }

    #[test]
    fn test_whitespace_and_unit_case_tolerated() {
        assert_eq!(partial(" Bytes = 10 - 19 ", 1000), ByteRange { start: 10, end: 19 });
    }

    #[test]
    fn test_empty_range_list_items_are_rejected() {
        assert!(rejected("bytes=0-99,", 1000));
        assert!(rejected("bytes=,", 1000));
        assert!(rejected("bytes=,0-1", 1000));
        assert_eq!(
            select_range(Some("bytes=0-1, 5-6"), 1000).unwrap(),
            RangeSelection::Full
        );
    }
}
