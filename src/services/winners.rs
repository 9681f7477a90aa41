use serde::Serialize;

use crate::dto::round::{PlayerId, sorted_players};

/// One page of the winners showcase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinnersPage {
    /// Winners shown on this page, in ascending order.
    pub items: Vec<PlayerId>,
    /// 1-based page number.
    pub number: usize,
    /// Total number of pages in the showcase.
    pub total: usize,
}

/// What the showcase should do when its page interval elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerStep {
    /// Show the next page.
    Page(WinnersPage),
    /// The last page has been on screen for a full interval.
    Finished,
}

/// Splits the sorted winners into fixed-size pages and walks through them once.
#[derive(Debug, Clone)]
pub struct WinnersPager {
    pages: Vec<Vec<PlayerId>>,
    current: usize,
}

impl WinnersPager {
    /// Sort `winners` and split them into pages of `page_size` (at least one per page).
    ///
    /// An empty list still yields a single empty page so the showcase has something to display.
    pub fn new<'a, I>(winners: I, page_size: usize) -> Self
    where
        I: IntoIterator<Item = &'a PlayerId>,
    {
        let sorted = sorted_players(winners);
        let mut pages: Vec<Vec<PlayerId>> = sorted
            .chunks(page_size.max(1))
            .map(<[PlayerId]>::to_vec)
            .collect();
        if pages.is_empty() {
            pages.push(Vec::new());
        }

        Self { pages, current: 0 }
    }

    /// Page currently on screen.
    pub fn current_page(&self) -> WinnersPage {
        self.page(self.current)
    }

    /// Number of pages.
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    /// Move to the next page, or report that the showcase is over.
    pub fn advance(&mut self) -> PagerStep {
        if self.current + 1 >= self.pages.len() {
            return PagerStep::Finished;
        }
        self.current += 1;
        PagerStep::Page(self.page(self.current))
    }

    fn page(&self, index: usize) -> WinnersPage {
        WinnersPage {
            items: self.pages[index].clone(),
            number: index + 1,
            total: self.pages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn players(count: usize) -> Vec<PlayerId> {
        (0..count).rev().map(|i| format!("player_{i:02}")).collect()
    }

    fn walk(pager: &mut WinnersPager) -> Vec<WinnersPage> {
        let mut shown = vec![pager.current_page()];
        while let PagerStep::Page(page) = pager.advance() {
            shown.push(page);
        }
        shown
    }

    #[test]
    fn twelve_winners_split_five_five_two() {
        let winners = players(12);
        let mut pager = WinnersPager::new(&winners, 5);
        let shown = walk(&mut pager);

        let sizes: Vec<_> = shown.iter().map(|page| page.items.len()).collect();
        assert_eq!(sizes, vec![5, 5, 2]);
        assert!(shown.iter().all(|page| page.total == 3));
        assert_eq!(
            shown.iter().map(|page| page.number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let flattened: Vec<_> = shown.into_iter().flat_map(|page| page.items).collect();
        let unique: HashSet<_> = flattened.iter().collect();
        assert_eq!(flattened.len(), 12);
        assert_eq!(unique.len(), 12);
        let mut expected = winners.clone();
        expected.sort();
        assert_eq!(flattened, expected);
    }

    #[test]
    fn finished_only_after_last_page() {
        let winners = players(6);
        let mut pager = WinnersPager::new(&winners, 5);
        assert!(matches!(pager.advance(), PagerStep::Page(_)));
        assert_eq!(pager.advance(), PagerStep::Finished);
        assert_eq!(pager.advance(), PagerStep::Finished);
    }

    #[test]
    fn single_page_finishes_on_first_advance() {
        let winners = vec!["zoe".to_string(), "amy".to_string()];
        let mut pager = WinnersPager::new(&winners, 5);
        assert_eq!(pager.current_page().items, vec!["amy", "zoe"]);
        assert_eq!(pager.advance(), PagerStep::Finished);
    }

    #[test]
    fn empty_winners_yield_one_empty_page() {
        let pager = WinnersPager::new(&Vec::<PlayerId>::new(), 5);
        assert_eq!(pager.total_pages(), 1);
        assert_eq!(
            pager.current_page(),
            WinnersPage {
                items: Vec::new(),
                number: 1,
                total: 1,
            }
        );
    }
}
