//! Rating validation.

use crate::error::{EscrowError, EscrowResult};

/// Lowest accepted star count.
pub const MIN_STARS: u8 = 1;
/// Highest accepted star count.
pub const MAX_STARS: u8 = 5;

/// Validate stars and normalize the review. Blank reviews become `None`.
pub fn validate_rating(
    stars: u8,
    review: Option<String>,
    max_review_chars: usize,
) -> EscrowResult<Option<String>> {
    if !(MIN_STARS..=MAX_STARS).contains(&stars) {
        return Err(EscrowError::InvalidRating(stars));
    }

    let review = review.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
    if let Some(text) = &review {
        let chars = text.chars().count();
        if chars > max_review_chars {
            return Err(EscrowError::InvalidInput(format!(
                "review is {chars} characters, limit is {max_review_chars}"
            )));
        }
    }
    Ok(review)
}
