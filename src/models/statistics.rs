//! Dashboard statistics shapes

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::serde_two_places;

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD`, both local dates, both optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_clients: i64,
    pub active_memberships: i64,
    #[serde(with = "serde_two_places")]
    pub revenue_total: Decimal,
    #[serde(with = "serde_two_places")]
    pub revenue_memberships: Decimal,
    #[serde(with = "serde_two_places")]
    pub revenue_sales: Decimal,
    pub new_clients: i64,
}

/// Labelled counts for a bar or pie chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
}

impl Distribution {
    pub fn from_pairs(pairs: Vec<(String, i64)>) -> Self {
        let (labels, data) = pairs.into_iter().unzip();
        Self { labels, data }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyRevenue {
    pub labels: Vec<String>,
    pub revenue: Vec<String>,
}

pub const AGE_BUCKETS: [&str; 4] = ["18-25", "26-40", "41-60", "+60"];

/// Bucket index for an age. Under-18s are not charted.
pub fn age_bucket(age: i64) -> Option<usize> {
    match age {
        18..=25 => Some(0),
        26..=40 => Some(1),
        41..=60 => Some(2),
        61.. => Some(3),
        _ => None,
    }
}

pub fn age_distribution(ages: impl IntoIterator<Item = i64>) -> Distribution {
    let mut counts = [0_i64; AGE_BUCKETS.len()];
    for bucket in ages.into_iter().filter_map(age_bucket) {
        counts[bucket] += 1;
    }
    Distribution {
        labels: AGE_BUCKETS.iter().map(|label| label.to_string()).collect(),
        data: counts.to_vec(),
    }
}
