use std::collections::HashSet;

use serde::Serialize;

use super::TestCase;

pub const PAGE_SIZE: usize = 10;

/// Which half of the test-case list is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Cases created by the most recent generation.
    New,
    #[default]
    Previous,
}

/// Test cases ordered newest first and split by the recently generated ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition<'a> {
    pub new: Vec<&'a TestCase>,
    pub previous: Vec<&'a TestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCasePage<'a> {
    pub bucket: Bucket,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    pub items: &'a [&'a TestCase],
}

/// Number of pages for `len` items; an empty list still has one page.
pub fn total_pages(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE).max(1)
}

/// The 1-based `page` of `items`. Pages past the end, and page 0, are empty.
pub fn page_slice<T>(items: &[T], page: usize) -> &[T] {
    let Some(start) = page.checked_sub(1).and_then(|p| p.checked_mul(PAGE_SIZE)) else {
        return &[];
    };
    if start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}

impl<'a> Partition<'a> {
    pub fn new(cases: &'a [TestCase], recent: &HashSet<String>) -> Self {
        let mut ordered: Vec<&TestCase> = cases.iter().collect();
        // `sort_by` is stable, so equal timestamps keep their input order.
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let (new, previous): (Vec<_>, Vec<_>) = ordered
            .into_iter()
            .partition(|case| recent.contains(&case.id));
        Self { new, previous }
    }

    pub fn bucket(&self, bucket: Bucket) -> &[&'a TestCase] {
        match bucket {
            Bucket::New => &self.new,
            Bucket::Previous => &self.previous,
        }
    }

    pub fn total_pages(&self, bucket: Bucket) -> usize {
        total_pages(self.bucket(bucket).len())
    }

    pub fn page(&self, bucket: Bucket, page: usize) -> TestCasePage<'_> {
        let cases = self.bucket(bucket);
        TestCasePage {
            bucket,
            page,
            total_pages: total_pages(cases.len()),
            total: cases.len(),
            items: page_slice(cases, page),
        }
    }
}

/// Bucket and page selection owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCaseViewState {
    pub bucket: Bucket,
    pub page: usize,
}

impl Default for TestCaseViewState {
    fn default() -> Self {
        Self {
            bucket: Bucket::default(),
            page: 1,
        }
    }
}

impl TestCaseViewState {
    pub fn select_bucket(&mut self, bucket: Bucket) {
        self.bucket = bucket;
        self.page = 1;
    }

    pub fn next_page(&mut self, total_pages: usize) {
        self.page = (self.page + 1).min(total_pages.max(1));
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Pulls the page back into range after the list shrank.
    pub fn clamp(&mut self, total_pages: usize) {
        self.page = self.page.clamp(1, total_pages.max(1));
    }
}
