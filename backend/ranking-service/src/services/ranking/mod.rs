//! Ranking Module
//!
//! Weighted aggregation of the per-signal scores into a single content score.
//!
//! # Signals
//! - **Source authority**: static table lookup on the post's domain
//! - **Recency**: banded exponential decay since publish
//! - **Engagement**: log-compressed view/like velocity
//! - **Source diversity** (optional): penalty for over-represented domains

pub mod scorer;

pub use scorer::ContentScorer;
