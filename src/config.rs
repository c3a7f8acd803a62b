//! Configuration for team, membership and comment operations.
//!
//! # Example
//!
//! ```rust
//! use doc_teams::config::TeamsConfig;
//!
//! // Use defaults
//! let config = TeamsConfig::default();
//!
//! // Or customize
//! let config = TeamsConfig {
//!     comment_max_length: 2000,
//!     ..Default::default()
//! };
//! assert_eq!(config.name_max_length, 100);
//! ```

/// Input limits enforced before any store access.
///
/// Lengths are counted in characters after trimming surrounding whitespace.
#[derive(Debug, Clone)]
pub struct TeamsConfig {
    /// Minimum length of a team name.
    ///
    /// Default: 2
    pub name_min_length: usize,

    /// Maximum length of a team name.
    ///
    /// Default: 100
    pub name_max_length: usize,

    /// Maximum length of a team description.
    ///
    /// Default: 500
    pub description_max_length: usize,

    /// Maximum length of a comment body.
    ///
    /// Default: 5000
    pub comment_max_length: usize,
}

impl Default for TeamsConfig {
    fn default() -> Self {
        Self {
            name_min_length: 2,
            name_max_length: 100,
            description_max_length: 500,
            comment_max_length: 5000,
        }
    }
}

impl TeamsConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
