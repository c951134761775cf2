//! Lazy iteration over row pages.
//!
//! The store answers range and index queries one bounded page at a time.
//! [`PageCursor`] stitches pages into a single forward-only sequence:
//!
//! 1. The first page starts at the requested key.
//! 2. A page shorter than requested is the last one. With a row limit, a
//!    page asks for at most one more row than the limit still needs.
//! 3. Otherwise the next page starts at the last key already emitted, since
//!    range starts are inclusive. Its first row repeats that key and is
//!    dropped. A follow-up page holding only that row ends the scan.
//!
//! A buffer of one row cannot make progress, so cursors require at least
//! [`MIN_BUFFER_SIZE`] rows per page.

use std::fmt;
use std::vec;

use bytes::Bytes;
use colonnade_common::constants::MIN_BUFFER_SIZE;
use colonnade_common::types::KeySlice;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Fetches one page of rows.
pub trait PageSource {
    /// Returns up to `count` rows starting at `start_key` (inclusive; empty
    /// means the start of the range).
    fn fetch_page(&mut self, start_key: &Bytes, count: usize) -> ClientResult<Vec<KeySlice>>;
}

impl<F> PageSource for F
where
    F: FnMut(&Bytes, usize) -> ClientResult<Vec<KeySlice>>,
{
    fn fetch_page(&mut self, start_key: &Bytes, count: usize) -> ClientResult<Vec<KeySlice>> {
        self(start_key, count)
    }
}

/// A forward-only iterator over the rows of a paged query.
pub struct PageCursor<S> {
    source: S,
    buffer_size: usize,
    row_count: Option<usize>,
    keep_empty_rows: bool,
    start_key: Bytes,
    /// Rows of the current page not yet handed out.
    page: vec::IntoIter<KeySlice>,
    /// Last key of the most recent page.
    resume_key: Option<Bytes>,
    /// Raw length of the most recent page.
    last_page_len: usize,
    /// Row count asked of the source for the most recent page.
    last_request: usize,
    pages_fetched: usize,
    rows_emitted: usize,
    done: bool,
}

impl<S: PageSource> PageCursor<S> {
    /// Creates a cursor starting at `start_key`.
    ///
    /// Fails if `buffer_size` is below [`MIN_BUFFER_SIZE`].
    pub fn new(source: S, start_key: Bytes, buffer_size: usize) -> ClientResult<Self> {
        if buffer_size < MIN_BUFFER_SIZE {
            return Err(ClientError::InvalidConfig(format!(
                "buffer_size must be at least {}, got {}",
                MIN_BUFFER_SIZE, buffer_size
            )));
        }
        Ok(Self {
            source,
            buffer_size,
            row_count: None,
            keep_empty_rows: false,
            start_key,
            page: Vec::new().into_iter(),
            resume_key: None,
            last_page_len: 0,
            last_request: 0,
            pages_fetched: 0,
            rows_emitted: 0,
            done: false,
        })
    }

    /// Stops after `limit` rows.
    #[must_use]
    pub fn row_count(mut self, limit: Option<usize>) -> Self {
        self.row_count = limit;
        self
    }

    /// Also yields rows that have no columns left.
    #[must_use]
    pub fn keep_empty_rows(mut self, keep: bool) -> Self {
        self.keep_empty_rows = keep;
        self
    }

    /// Number of pages requested so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Number of rows yielded so far.
    pub fn rows_emitted(&self) -> usize {
        self.rows_emitted
    }

    /// Returns true once the cursor will yield nothing more.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Loads the next page. Returns false when the scan is complete.
    fn advance(&mut self) -> ClientResult<bool> {
        if self.pages_fetched > 0 && self.last_page_len < self.last_request {
            return Ok(false);
        }

        let start = self.resume_key.clone().unwrap_or_else(|| self.start_key.clone());
        let count = self.page_size();
        let mut rows = self.source.fetch_page(&start, count)?;
        self.pages_fetched += 1;
        self.last_request = count;
        self.last_page_len = rows.len();
        debug!(
            page = self.pages_fetched,
            requested = count,
            rows = rows.len(),
            "fetched page"
        );

        if self.resume_key.is_some() && rows.first().map_or(false, |row| row.key == start) {
            rows.remove(0);
        }
        match rows.last() {
            Some(last) => self.resume_key = Some(last.key.clone()),
            None => return Ok(false),
        }
        self.page = rows.into_iter();
        Ok(true)
    }

    /// Rows to request next: the buffer, capped by what the limit still
    /// needs plus the repeated boundary row.
    fn page_size(&self) -> usize {
        match self.row_count {
            Some(limit) => limit
                .saturating_sub(self.rows_emitted)
                .saturating_add(1)
                .min(self.buffer_size)
                .max(MIN_BUFFER_SIZE),
            None => self.buffer_size,
        }
    }
}

impl<S> fmt::Debug for PageCursor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageCursor")
            .field("buffer_size", &self.buffer_size)
            .field("row_count", &self.row_count)
            .field("resume_key", &self.resume_key)
            .field("last_request", &self.last_request)
            .field("pages_fetched", &self.pages_fetched)
            .field("rows_emitted", &self.rows_emitted)
            .field("done", &self.done)
            .finish()
    }
}

impl<S: PageSource> Iterator for PageCursor<S> {
    type Item = ClientResult<KeySlice>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if self.row_count.map_or(false, |limit| self.rows_emitted >= limit) {
                self.done = true;
                return None;
            }

            if let Some(row) = self.page.next() {
                if row.columns.is_empty() && !self.keep_empty_rows {
                    continue;
                }
                self.rows_emitted += 1;
                return Some(Ok(row));
            }

            match self.advance() {
                Ok(true) => continue,
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colonnade_common::types::{Column, ColumnOrSuperColumn};

    fn key(i: u32) -> Bytes {
        Bytes::from(format!("key{:04}", i))
    }

    fn row(i: u32) -> KeySlice {
        KeySlice {
            key: key(i),
            columns: vec![ColumnOrSuperColumn::Column(Column {
                name: Bytes::from_static(b"col"),
                value: Bytes::from_static(b"val"),
                timestamp: 0,
                ttl: None,
            })],
        }
    }

    /// Serves pages from a sorted list of rows, like a key range query.
    fn source(rows: Vec<KeySlice>) -> impl FnMut(&Bytes, usize) -> ClientResult<Vec<KeySlice>> {
        move |start: &Bytes, count: usize| {
            Ok(rows
                .iter()
                .filter(|r| start.is_empty() || r.key >= *start)
                .take(count)
                .cloned()
                .collect())
        }
    }

    fn keys(cursor: PageCursor<impl PageSource>) -> Vec<Bytes> {
        cursor.map(|r| r.unwrap().key).collect()
    }

    #[test]
    fn test_buffer_size_too_small() {
        let err = PageCursor::new(source(vec![]), Bytes::new(), 1).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn test_every_row_once() {
        for n in [0u32, 1, 2, 6, 7, 8, 14, 15, 50] {
            for buffer in [2usize, 3, 7, 100] {
                let rows: Vec<_> = (0..n).map(row).collect();
                let cursor = PageCursor::new(source(rows), Bytes::new(), buffer).unwrap();
                let expected: Vec<_> = (0..n).map(key).collect();
                assert_eq!(keys(cursor), expected, "n={} buffer={}", n, buffer);
            }
        }
    }

    #[test]
    fn test_exact_multiple_ends_on_duplicate_page() {
        let rows: Vec<_> = (0..6).map(row).collect();
        let mut cursor = PageCursor::new(source(rows), Bytes::new(), 3).unwrap();
        assert_eq!(cursor.by_ref().count(), 6);
        // [0,1,2] [2,3,4] [4,5] and done.
        assert_eq!(cursor.pages_fetched(), 3);
    }

    #[test]
    fn test_row_count_limit() {
        let rows: Vec<_> = (0..20).map(row).collect();
        let mut cursor = PageCursor::new(source(rows), Bytes::new(), 3)
            .unwrap()
            .row_count(Some(7));
        assert_eq!(cursor.by_ref().count(), 7);
        assert_eq!(cursor.rows_emitted(), 7);
        assert!(cursor.is_done());
    }

    #[test]
    fn test_row_count_caps_page_size() {
        let rows: Vec<_> = (0..2000).map(row).collect();
        let mut serve = source(rows);
        let mut requested = Vec::new();
        let mut cursor = PageCursor::new(
            |start: &Bytes, count: usize| -> ClientResult<Vec<KeySlice>> {
                requested.push(count);
                serve(start, count)
            },
            Bytes::new(),
            1024,
        )
        .unwrap()
        .row_count(Some(3));
        assert_eq!(cursor.by_ref().count(), 3);
        drop(cursor);
        assert_eq!(requested, vec![4]);
    }

    #[test]
    fn test_row_count_shrinks_follow_up_pages() {
        let rows: Vec<_> = (0..100).map(row).collect();
        let mut serve = source(rows);
        let mut requested = Vec::new();
        let cursor = PageCursor::new(
            |start: &Bytes, count: usize| -> ClientResult<Vec<KeySlice>> {
                requested.push(count);
                serve(start, count)
            },
            Bytes::new(),
            5,
        )
        .unwrap()
        .row_count(Some(11));
        assert_eq!(keys(cursor), (0..11).map(key).collect::<Vec<_>>());
        // 5 rows, then 4 new after the repeat, then 2 more from a page of 3.
        assert_eq!(requested, vec![5, 5, 3]);
    }

    #[test]
    fn test_short_capped_page_ends_scan() {
        let rows: Vec<_> = (0..2).map(row).collect();
        let mut cursor = PageCursor::new(source(rows), Bytes::new(), 50)
            .unwrap()
            .row_count(Some(10));
        assert_eq!(cursor.by_ref().count(), 2);
        assert_eq!(cursor.pages_fetched(), 1);
    }

    #[test]
    fn test_empty_rows_skipped() {
        let mut rows: Vec<_> = (0..10).map(row).collect();
        for i in [0, 3, 4, 9] {
            rows[i].columns.clear();
        }
        let cursor = PageCursor::new(source(rows.clone()), Bytes::new(), 3)
            .unwrap()
            .row_count(Some(5));
        assert_eq!(keys(cursor), vec![key(1), key(2), key(5), key(6), key(7)]);

        let cursor = PageCursor::new(source(rows), Bytes::new(), 3)
            .unwrap()
            .keep_empty_rows(true);
        assert_eq!(cursor.count(), 10);
    }

    #[test]
    fn test_deleted_boundary_row_not_lost() {
        let mut pages = vec![
            vec![row(0), row(1), row(2)],
            // Boundary key 2 was removed before the second fetch.
            vec![row(3), row(4)],
        ]
        .into_iter();
        let cursor = PageCursor::new(
            move |_: &Bytes, _: usize| -> ClientResult<Vec<KeySlice>> {
                Ok(pages.next().unwrap_or_default())
            },
            Bytes::new(),
            3,
        )
        .unwrap();
        assert_eq!(keys(cursor), vec![key(0), key(1), key(2), key(3), key(4)]);
    }

    #[test]
    fn test_error_is_terminal() {
        let mut calls = 0;
        let mut cursor = PageCursor::new(
            move |_: &Bytes, _: usize| -> ClientResult<Vec<KeySlice>> {
                calls += 1;
                if calls == 1 {
                    Ok(vec![row(0), row(1)])
                } else {
                    Err(ClientError::NotFound)
                }
            },
            Bytes::new(),
            2,
        )
        .unwrap();
        assert!(cursor.next().unwrap().is_ok());
        assert!(cursor.next().unwrap().is_ok());
        assert!(cursor.next().unwrap().is_err());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_starts_at_given_key() {
        let rows: Vec<_> = (0..10).map(row).collect();
        let cursor = PageCursor::new(source(rows), key(4), 4).unwrap();
        assert_eq!(keys(cursor), (4..10).map(key).collect::<Vec<_>>());
    }
}
