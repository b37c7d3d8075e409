use crate::model::{Rating, StoreId, UserId};
use engine::Pagination;
use engine::list_criteria::{ListCriteria, ListFilter, Tag};
use engine::selector::{SortKey, contains_text};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingFilter {
    Store(StoreId),
    User(UserId),
    /// Exactly this score.
    Score(u8),
    /// This score or better.
    MinScore(u8),
    HasImages,
    /// Carries this tag, ignoring case.
    Tag(String),
    /// Case-insensitive match on the text or any tag.
    Text(String),
}

impl ListFilter for RatingFilter {
    const MAX_FILTER_COUNT: usize = MAX_FILTER_COUNT;
    type Item = Rating;
    type Criteria = RatingListCriteria;

    fn tag(&self) -> Tag {
        match self {
            RatingFilter::Store(_) => Tag::One,
            RatingFilter::User(_) => Tag::Two,
            RatingFilter::Score(_) => Tag::Four,
            RatingFilter::MinScore(_) => Tag::Eight,
            RatingFilter::HasImages => Tag::Sixteen,
            RatingFilter::Tag(_) => Tag::ThirtyTwo,
            RatingFilter::Text(_) => Tag::SixtyFour,
        }
    }

    fn matches(&self, rating: &Rating) -> bool {
        match self {
            RatingFilter::Store(store_id) => rating.store_id == *store_id,
            RatingFilter::User(user_id) => rating.user_id == *user_id,
            RatingFilter::Score(score) => rating.score == *score,
            RatingFilter::MinScore(score) => rating.score >= *score,
            RatingFilter::HasImages => !rating.images.is_empty(),
            RatingFilter::Tag(tag) => rating.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)),
            RatingFilter::Text(query) => {
                rating.text.as_deref().is_some_and(|t| contains_text(t, query))
                    || rating.tags.iter().any(|t| contains_text(t, query))
                    || query.is_empty()
            }
        }
    }

    fn criteria(pagination: Pagination, default_page_size: u64) -> Self::Criteria {
        RatingListCriteria::new(pagination, default_page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingSort {
    CreatedAt,
    Score,
    Likes,
}

impl SortKey<Rating> for RatingSort {
    fn compare(&self, a: &Rating, b: &Rating) -> Ordering {
        match self {
            RatingSort::CreatedAt => a.created_at.cmp(&b.created_at),
            RatingSort::Score => a.score.cmp(&b.score),
            RatingSort::Likes => a.likes.cmp(&b.likes),
        }
    }
}

pub type RatingListCriteria = ListCriteria<RatingFilter, RatingSort, MAX_FILTER_COUNT>;

const MAX_FILTER_COUNT: usize = 7;
