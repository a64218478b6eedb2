pub mod authority;
pub mod content_ranking;
pub mod distribution;
pub mod diversity;
pub mod ranking;
pub mod signals;

pub use authority::DomainAuthorityTable;
pub use content_ranking::{ContentRankingService, RankingConfiguration};
pub use distribution::SourceDistributionCache;
pub use diversity::DiversityLayer;
pub use ranking::ContentScorer;
