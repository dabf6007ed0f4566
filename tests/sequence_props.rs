use cursorfeed::{FeedConfig, FeedFilter, MemoryFeed, PaginatedFeed, PAGE_SIZE};
use proptest::prelude::*;

fn feed(len: u32, cache_pages: usize) -> PaginatedFeed<MemoryFeed<u32>> {
    PaginatedFeed::new(
        MemoryFeed::new((0..len).collect()),
        FeedFilter::default(),
        FeedConfig::default().with_cache_pages(cache_pages),
    )
}

proptest! {
    #[test]
    fn lookups_match_the_underlying_list(
        len in 0u32..150,
        cache_pages in 0usize..4,
        probes in proptest::collection::vec(0usize..200, 1..40),
    ) {
        let feed = feed(len, cache_pages);
        for index in probes {
            match feed.item_at(index) {
                Ok(item) => prop_assert_eq!(item as usize, index),
                Err(err) => {
                    prop_assert!(err.is_out_of_range(), "unexpected error {}", err);
                    prop_assert!(index >= len as usize);
                }
            }
        }
    }

    #[test]
    fn sequential_scan_fetches_each_page_once(len in 0u32..300) {
        let feed = feed(len, 1);
        let items: Vec<u32> = feed.iter().collect::<Result<_, _>>().unwrap();
        prop_assert_eq!(items.len(), len as usize);

        // Full pages, plus one more page: either the short tail or the empty
        // page that proves the feed ended on a page boundary. A full page
        // fetched with a cursor already reports the end, so no empty fetch
        // follows it.
        let len = len as usize;
        let expected = if len < PAGE_SIZE {
            1
        } else if len % PAGE_SIZE == 0 {
            if len == PAGE_SIZE { 2 } else { len / PAGE_SIZE }
        } else {
            len / PAGE_SIZE + 1
        };
        prop_assert_eq!(feed.capability().fetch_count(), expected);
    }

    #[test]
    fn cursor_table_has_one_slot_past_last_page(len in 1u32..300) {
        let feed = feed(len, 1);
        prop_assert_eq!(feed.size().unwrap(), len as usize);
        let slots = feed.cursor_slots();
        let last = slots.last().unwrap();
        prop_assert!(last.is_terminal());
        prop_assert!(slots[..slots.len() - 1].iter().filter(|slot| slot.is_terminal()).count() <= 1);
    }
}
