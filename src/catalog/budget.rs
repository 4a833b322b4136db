use std::ops::Bound::{self, Excluded, Included, Unbounded};

/// Named price segments used by `/api/cars-by-budget/:budget`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetRange {
    Under8,
    Under15,
    Under25,
    Under50,
    Above50,
}

const LAKH: f64 = 100_000.0;

impl BudgetRange {
    pub const ALL: [BudgetRange; 5] = [
        Self::Under8,
        Self::Under15,
        Self::Under25,
        Self::Under50,
        Self::Above50,
    ];

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "under-8" => Some(Self::Under8),
            "under-15" => Some(Self::Under15),
            "under-25" => Some(Self::Under25),
            "under-50" => Some(Self::Under50),
            "above-50" => Some(Self::Above50),
            _ => None,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Under8 => "under-8",
            Self::Under15 => "under-15",
            Self::Under25 => "under-25",
            Self::Under50 => "under-50",
            Self::Above50 => "above-50",
        }
    }

    /// Bounds on the lowest variant price; each range starts just above the
    /// previous one's upper bound
    pub fn bounds(&self) -> (Bound<f64>, Bound<f64>) {
        match self {
            Self::Under8 => (Included(LAKH), Included(8.0 * LAKH)),
            Self::Under15 => (Excluded(8.0 * LAKH), Included(15.0 * LAKH)),
            Self::Under25 => (Excluded(15.0 * LAKH), Included(25.0 * LAKH)),
            Self::Under50 => (Excluded(25.0 * LAKH), Included(50.0 * LAKH)),
            Self::Above50 => (Excluded(50.0 * LAKH), Unbounded),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Under8 => "Under 8 Lakh",
            Self::Under15 => "8 - 15 Lakh",
            Self::Under25 => "15 - 25 Lakh",
            Self::Under50 => "25 - 50 Lakh",
            Self::Above50 => "Above 50 Lakh",
        }
    }
}
