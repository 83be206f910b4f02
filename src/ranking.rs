//! Selection of the most rated news within a publication window.

use crate::models::News;
use chrono::NaiveDate;
use itertools::Itertools;
use std::ops::RangeInclusive;

/// Keep records published inside `period` (UTC dates, inclusive), highest
/// score first, at most `count` of them. Equal scores keep their input order.
pub fn most_rated(news: &[News], count: usize, period: &RangeInclusive<NaiveDate>) -> Vec<News> {
    news.iter()
        .filter(|n| period.contains(&n.publication_date.date_naive()))
        .sorted_by(|a, b| b.score().total_cmp(&a.score()))
        .take(count)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::sample_news;
    use chrono::{TimeZone, Utc};

    fn dated(id: u64, favorites: u64, y: i32, m: u32, d: u32) -> News {
        let mut n = sample_news(id);
        n.favorites_count = favorites;
        n.comments_count = 0;
        n.publication_date = Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap();
        n
    }

    fn period() -> RangeInclusive<NaiveDate> {
        NaiveDate::from_ymd_opt(2023, 10, 31).unwrap()..=NaiveDate::from_ymd_opt(2024, 10, 31).unwrap()
    }

    #[test]
    fn test_sorted_by_score_descending() {
        let news = vec![dated(1, 1, 2024, 1, 1), dated(2, 5, 2024, 1, 1), dated(3, 3, 2024, 1, 1)];
        let ids: Vec<u64> = most_rated(&news, 10, &period()).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_filters_by_inclusive_period() {
        let news = vec![
            dated(1, 1, 2023, 10, 30),
            dated(2, 1, 2023, 10, 31),
            dated(3, 1, 2024, 10, 31),
            dated(4, 1, 2024, 11, 1),
        ];
        let mut ids: Vec<u64> = most_rated(&news, 10, &period()).iter().map(|n| n.id).collect();
        ids.sort();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_takes_at_most_count() {
        let news: Vec<News> = (1..=20).map(|i| dated(i, i, 2024, 5, 5)).collect();
        let top = most_rated(&news, 3, &period());
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].id, 20);
        assert!(most_rated(&news, 0, &period()).is_empty());
    }
}
