//! Cache lifetimes per data category
//!
//! Lifetimes are policy, not mechanism: the defaults below are overridable
//! from the config file, and demo mode stretches all of them so live
//! presentations do not hammer the spreadsheet scripts or the AI provider.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default TTL values per data category.
pub struct CacheTtl;

impl CacheTtl {
    // Spreadsheet-derived figures change quarterly
    pub const FINANCIAL: Duration = Duration::from_secs(5 * 60); // 5 min
    pub const CUSTOMER: Duration = Duration::from_secs(5 * 60); // 5 min

    // Model output is expensive and rate limited
    pub const AI_DERIVED: Duration = Duration::from_secs(15 * 60); // 15 min

    pub const STATIC: Duration = Duration::from_secs(60 * 60); // 1 hr

    /// Factor applied to every lifetime while demo mode is on
    pub const DEMO_MULTIPLIER: u32 = 6;
}

/// Logical data categories with their own lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtlCategory {
    Financial,
    Customer,
    AiDerived,
    Static,
}

impl TtlCategory {
    pub const ALL: [TtlCategory; 4] = [
        TtlCategory::Financial,
        TtlCategory::Customer,
        TtlCategory::AiDerived,
        TtlCategory::Static,
    ];
}

impl fmt::Display for TtlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TtlCategory::Financial => "FINANCIAL",
            TtlCategory::Customer => "CUSTOMER",
            TtlCategory::AiDerived => "AI_DERIVED",
            TtlCategory::Static => "STATIC",
        };
        f.write_str(name)
    }
}

/// Process-wide extended-cache switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoMode {
    pub enabled: bool,
    pub multiplier: u32,
}

impl DemoMode {
    pub fn off() -> Self {
        Self {
            enabled: false,
            multiplier: CacheTtl::DEMO_MULTIPLIER,
        }
    }
}

impl Default for DemoMode {
    fn default() -> Self {
        Self::off()
    }
}

/// Table of lifetimes, one per [`TtlCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub financial: Duration,
    pub customer: Duration,
    pub ai_derived: Duration,
    pub static_data: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            financial: CacheTtl::FINANCIAL,
            customer: CacheTtl::CUSTOMER,
            ai_derived: CacheTtl::AI_DERIVED,
            static_data: CacheTtl::STATIC,
        }
    }
}

impl TtlPolicy {
    /// Lifetime for a category.
    pub fn get(&self, category: TtlCategory) -> Duration {
        match category {
            TtlCategory::Financial => self.financial,
            TtlCategory::Customer => self.customer,
            TtlCategory::AiDerived => self.ai_derived,
            TtlCategory::Static => self.static_data,
        }
    }

    /// Every lifetime multiplied by `factor`.
    pub fn scaled(&self, factor: u32) -> Self {
        Self {
            financial: self.financial.saturating_mul(factor),
            customer: self.customer.saturating_mul(factor),
            ai_derived: self.ai_derived.saturating_mul(factor),
            static_data: self.static_data.saturating_mul(factor),
        }
    }

    /// The table in effect for this process.
    ///
    /// Resolved once when the application context is built and never
    /// changed afterwards.
    pub fn active(&self, demo: DemoMode) -> Self {
        if demo.enabled {
            self.scaled(demo.multiplier)
        } else {
            *self
        }
    }
}
