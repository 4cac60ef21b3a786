//! Limit/offset paging shared by user and delivery listings.

/// Largest page size accepted by listing endpoints.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Validation failures for paging parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageValidationError {
    /// Requested limit exceeds [`MAX_PAGE_LIMIT`].
    #[error("limit must be at most {max}")]
    LimitTooLarge {
        /// Largest accepted limit.
        max: u32,
    },
}

/// Requested window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    limit: u32,
    offset: u32,
}

impl PageRequest {
    /// Validate a window.
    ///
    /// # Examples
    /// ```
    /// use courier::domain::PageRequest;
    ///
    /// let page = PageRequest::new(50, 100).unwrap();
    /// assert_eq!(page.next_offset(), 150);
    /// ```
    pub fn new(limit: u32, offset: u32) -> Result<Self, PageValidationError> {
        if limit > MAX_PAGE_LIMIT {
            return Err(PageValidationError::LimitTooLarge {
                max: MAX_PAGE_LIMIT,
            });
        }
        Ok(Self { limit, offset })
    }

    /// Maximum number of rows to return.
    pub fn limit(self) -> u32 {
        self.limit
    }

    /// Number of matching rows to skip.
    pub fn offset(self) -> u32 {
        self.offset
    }

    /// Offset of the page that follows this one.
    pub fn next_offset(self) -> u32 {
        self.offset.saturating_add(self.limit)
    }
}
