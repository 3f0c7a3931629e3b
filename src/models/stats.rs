//! Adherence statistics
//!
//! Derived snapshot; never persisted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdherenceStats {
    pub total_medications: usize,
    pub taken_today: usize,
    /// 0-100, rounded half up
    pub adherence_percentage: u8,
    pub current_streak: u32,
    pub longest_streak: u32,
}
