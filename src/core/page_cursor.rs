use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Which result page an album session asked for last, and how many pages
/// the source reported on its latest successful search.
#[derive(Debug)]
pub struct PageCursor {
    last_page: Option<u32>,
    total_pages: Option<u32>,
    max_pages: Option<u32>,
    rng: StdRng,
}

impl PageCursor {
    pub fn new(max_pages: Option<u32>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            last_page: None,
            total_pages: None,
            max_pages,
            rng,
        }
    }

    pub fn last_page(&self) -> Option<u32> {
        self.last_page
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn record_total(&mut self, total_pages: u32) {
        self.total_pages = Some(total_pages);
    }

    /// `None` is the source's default page, index 0.
    pub fn record_request(&mut self, page: Option<u32>) {
        self.last_page = Some(page.unwrap_or(0));
    }

    /// Page for a "new collection": uniform over `[0, total)` excluding the
    /// previous request whenever more than one page exists. Returns `None`
    /// while no total is known.
    pub fn next_refresh_page(&mut self) -> Option<u32> {
        let total = self.effective_total()?;
        if total == 1 {
            return Some(0);
        }

        let page = match self.last_page {
            Some(last) if last < total => {
                let candidate = self.rng.gen_range(0..total - 1);
                if candidate >= last {
                    candidate + 1
                } else {
                    candidate
                }
            }
            _ => self.rng.gen_range(0..total),
        };
        Some(page)
    }

    fn effective_total(&self) -> Option<u32> {
        let total = self.total_pages?;
        let capped = match self.max_pages {
            Some(max) => total.min(max),
            None => total,
        };
        Some(capped.max(1))
    }
}
