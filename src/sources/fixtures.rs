//! Test fixtures shaped like the extraction script output
//!
//! Import via `use crate::sources::fixtures::*` in test modules.

use serde_json::{Value, json};

use crate::models::{Customer, Subscription};

/// Three BUs. Kandy is 15 points under its margin target, STL 7, Cloudsense 3.6.
pub fn financials_json() -> Value {
    json!({
        "financials": {
            "Cloudsense": {
                "bu": "Cloudsense", "totalRR": 3000000.0, "totalNRR": 500000.0,
                "totalRevenue": 3500000.0, "ebitda": 2100000.0, "netMargin": 60.0,
                "customerCount": 40
            },
            "Kandy": {
                "bu": "Kandy", "totalRR": 2000000.0, "totalNRR": 200000.0,
                "totalRevenue": 2200000.0, "ebitda": 1320000.0, "netMargin": 60.0,
                "customerCount": 30
            },
            "STL": {
                "bu": "STL", "totalRR": 1000000.0, "totalNRR": 100000.0,
                "totalRevenue": 1100000.0, "ebitda": 748000.0, "netMargin": 68.0,
                "customerCount": 20
            }
        }
    })
}

/// Cloudsense far below target and declining, Kandy slightly below, STL healthy.
pub fn dm_json() -> Value {
    json!({
        "business_units": [
            {
                "bu": "Cloudsense", "current_rr": 3000000.0, "prior_rr": 3750000.0,
                "dm_pct": 80.0, "variance": -750000.0, "meets_target": false,
                "ttm_quarters": [
                    {"quarter": "Q4'25", "rr": 760000.0, "dm_pct": 85.0},
                    {"quarter": "Q1'26", "rr": 750000.0, "dm_pct": 82.0}
                ]
            },
            {
                "bu": "Kandy", "current_rr": 2000000.0, "prior_rr": 2300000.0,
                "dm_pct": 87.0, "variance": -300000.0, "meets_target": false,
                "ttm_quarters": []
            },
            {
                "bu": "STL", "current_rr": 1000000.0, "prior_rr": 1040000.0,
                "dm_pct": 96.0, "variance": -40000.0, "meets_target": true,
                "ttm_quarters": []
            }
        ],
        "consolidated": {
            "current_rr": 6000000.0, "prior_rr": 7090000.0, "dm_pct": 84.6,
            "variance": -1090000.0, "meets_target": false, "target": 90.0,
            "ttm_quarters": []
        },
        "forecast": {
            "method": "linear", "avg_quarterly_decline_rate": 1.2,
            "quarters": [
                {"quarter": "Q2'26", "forecasted_rr": 5900000.0,
                 "forecasted_dm_pct": 83.4, "confidence": "medium"}
            ]
        },
        "extracted_at": "2026-04-01T09:00:00Z",
        "fiscal_quarter": "Q1'26"
    })
}

pub fn subscription(will_renew: &str, arr: f64) -> Subscription {
    Subscription {
        sub_id: Some(format!("SUB-{}", arr as u64)),
        arr: Some(arr),
        renewal_qtr: Some("Q2'26".to_string()),
        will_renew: Some(will_renew.to_string()),
        projected_arr: None,
    }
}

pub fn customer(name: &str, bu: &str, rr: f64, nrr: f64, subs: Vec<Subscription>) -> Customer {
    Customer {
        name: name.to_string(),
        bu: bu.to_string(),
        rr,
        nrr,
        total: rr + nrr,
        subscriptions: subs,
    }
}

/// One healthy, one at-risk renewal, one churn signal, one uncertain renewal.
pub fn customers() -> Vec<Customer> {
    vec![
        customer("Globex", "Kandy", 900000.0, 100000.0, vec![subscription("Yes", 900000.0)]),
        customer(
            "Initech",
            "Cloudsense",
            400000.0,
            50000.0,
            vec![subscription("No", 250000.0), subscription("BU decision required", 150000.0)],
        ),
        customer("Hooli", "STL", 0.0, 120000.0, vec![]),
        customer("Umbrella", "STL", 80000.0, 0.0, vec![subscription("TBD", 80000.0)]),
    ]
}
