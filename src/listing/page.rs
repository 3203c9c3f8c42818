use serde::Serialize;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One page of a listing, normalised so `page` and `size` are both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of entries skipped before this page starts
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

/// Lenient positive-integer parse: absent, non-numeric, zero or negative input yields `default`.
pub fn coerce_positive(raw: Option<&str>, default: u32) -> u32 {
    raw.map(str::trim)
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 5).offset(), 10);
    }

    #[test]
    fn offset_does_not_overflow_at_extremes() {
        let page = PageRequest::new(u32::MAX, u32::MAX);
        assert_eq!(page.offset(), u64::from(u32::MAX - 1) * u64::from(u32::MAX));
    }

    #[test]
    fn new_clamps_zero_to_one() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page.page(), 1);
        assert_eq!(page.size(), 1);
    }

    #[test]
    fn coerce_falls_back_on_garbage() {
        assert_eq!(coerce_positive(None, 7), 7);
        assert_eq!(coerce_positive(Some(""), 7), 7);
        assert_eq!(coerce_positive(Some("abc"), 7), 7);
        assert_eq!(coerce_positive(Some("0"), 7), 7);
        assert_eq!(coerce_positive(Some("-4"), 7), 7);
        assert_eq!(coerce_positive(Some("99999999999"), 7), 7);
        assert_eq!(coerce_positive(Some(" 12 "), 7), 12);
    }
}
