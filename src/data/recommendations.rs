//! DM% strategy recommendations and the portfolio roll-up

use chrono::{DateTime, Utc};

use super::{DataLayer, keys};
use crate::cache::{GetOptions, TtlCategory, cache_key};
use crate::error::Result;
use crate::models::{
    BuDm, BuPortfolio, ConsolidatedPortfolio, DM_TARGET, DmTrackerData, Effort,
    PortfolioSummary, Priority, Recommendation, RecommendationFilters, RecommendationStatus,
    RecommendationType,
};

/// Quarters per year, for annualizing quarterly figures
const ANNUALIZE: f64 = 4.0;

struct Draft {
    suffix: &'static str,
    priority: Priority,
    kind: RecommendationType,
    title: String,
    description: String,
    rationale: String,
    action: &'static str,
    arr_impact: f64,
    dm_impact: f64,
    effort: Effort,
    timeframe: &'static str,
}

impl Draft {
    fn finish(self, bu: &BuDm, now: DateTime<Utc>) -> Recommendation {
        Recommendation {
            id: format!("{}-{}", bu.bu, self.suffix),
            bu: bu.bu.clone(),
            account_name: None,
            priority: self.priority,
            kind: self.kind,
            status: RecommendationStatus::Pending,
            title: self.title,
            description: self.description,
            rationale: self.rationale,
            suggested_action: self.action.to_string(),
            estimated_arr_impact: self.arr_impact,
            estimated_dm_impact: self.dm_impact,
            estimated_effort: self.effort,
            timeframe: self.timeframe.to_string(),
            created_at: now,
        }
    }
}

fn for_bu(bu: &BuDm) -> Vec<Draft> {
    let gap = bu.gap();
    let below = !bu.meets_target;
    let loss = bu.variance.abs();
    let mut drafts = Vec::new();

    if below && gap > 5.0 {
        drafts.push(Draft {
            suffix: "critical-retention",
            priority: Priority::Critical,
            kind: RecommendationType::Retention,
            title: format!("Urgent: {} Revenue Retention Below Target", bu.bu),
            description: format!(
                "{} DM% is {:.1}%, {:.1} points below the {:.0}% target. Immediate action required to prevent further revenue erosion.",
                bu.bu, bu.dm_pct, gap, DM_TARGET
            ),
            rationale: format!(
                "Current quarterly loss of ${:.0}K indicates systematic retention issues. If the trend continues, annual loss could exceed ${:.0}K.",
                loss / 1000.0,
                loss * ANNUALIZE / 1000.0
            ),
            action: "Run an urgent account health review, identify at-risk customers, put the retention team on the top 10 accounts and start an engagement plan.",
            arr_impact: loss * ANNUALIZE,
            dm_impact: gap * 0.6,
            effort: Effort::High,
            timeframe: "30 days",
        });
    }

    if below && gap > 2.0 && gap <= 5.0 {
        drafts.push(Draft {
            suffix: "high-engagement",
            priority: Priority::High,
            kind: RecommendationType::Engagement,
            title: format!("Increase {} Customer Engagement", bu.bu),
            description: format!(
                "{} DM% is {:.1}%, slightly below target. Proactive engagement can prevent further decline.",
                bu.bu, bu.dm_pct
            ),
            rationale: format!(
                "Current variance of ${:.0}K is an early warning sign. Engagement programs have recovered 3-4 points before.",
                bu.variance / 1000.0
            ),
            action: "Launch a QBR campaign, add product adoption touchpoints and run customer success playbooks for mid-tier accounts.",
            arr_impact: loss * 3.0,
            dm_impact: gap * 0.7,
            effort: Effort::Medium,
            timeframe: "60 days",
        });
    }

    if bu.meets_target && bu.dm_pct > 95.0 {
        drafts.push(Draft {
            suffix: "expansion-upsell",
            priority: Priority::Medium,
            kind: RecommendationType::Expansion,
            title: format!("{} Upsell & Expansion Opportunity", bu.bu),
            description: format!(
                "{} DM% is strong at {:.1}%. Healthy retention creates good conditions for expansion.",
                bu.bu, bu.dm_pct
            ),
            rationale: "Customers with DM% above 95% have much higher expansion win rates.".to_string(),
            action: "Pick the top 20 accounts for upsell, prepare expansion proposals and line up cross-sell with sales.",
            arr_impact: bu.current_rr * 0.15,
            dm_impact: 2.0,
            effort: Effort::Medium,
            timeframe: "Q2'26",
        });
    }

    if let [.., previous, latest] = bu.ttm_quarters.as_slice()
        && latest.dm_pct < previous.dm_pct - 1.0
    {
        drafts.push(Draft {
            suffix: "product-health",
            priority: Priority::High,
            kind: RecommendationType::Product,
            title: format!("{} Product Health Investigation", bu.bu),
            description: format!(
                "{} DM% fell from {:.1}% in {} to {:.1}% in {}.",
                bu.bu, previous.dm_pct, previous.quarter, latest.dm_pct, latest.quarter
            ),
            rationale: "Sequential quarterly decline points at product fit or competitive pressure.".to_string(),
            action: "Survey product satisfaction, review feature adoption and collect customer pain points.",
            arr_impact: bu.current_rr * 0.1,
            dm_impact: 3.0,
            effort: Effort::High,
            timeframe: "90 days",
        });
    }

    if bu.dm_pct >= DM_TARGET && bu.dm_pct < 93.0 {
        drafts.push(Draft {
            suffix: "pricing-review",
            priority: Priority::Low,
            kind: RecommendationType::Pricing,
            title: format!("{} Pricing Strategy Review", bu.bu),
            description: format!(
                "{} DM% is stable at {:.1}%. Review the pricing model to capture more value.",
                bu.bu, bu.dm_pct
            ),
            rationale: "Stable retention leaves room to test pricing changes with little churn risk.".to_string(),
            action: "Compare competitor pricing, run a value-based pricing study and trial tiered pricing with new customers.",
            arr_impact: bu.current_rr * 0.08,
            dm_impact: 1.5,
            effort: Effort::Low,
            timeframe: "Q3'26",
        });
    }

    drafts
}

/// Recommendations for every BU, filtered, most urgent first.
pub fn generate(
    data: &DmTrackerData,
    filters: &RecommendationFilters,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    let mut recs: Vec<Recommendation> = data
        .business_units
        .iter()
        .flat_map(|bu| for_bu(bu).into_iter().map(move |d| d.finish(bu, now)))
        .filter(|rec| filters.matches(rec))
        .collect();

    recs.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(b.estimated_arr_impact.total_cmp(&a.estimated_arr_impact))
    });
    recs
}

fn count(recs: &[&Recommendation], priority: Priority) -> usize {
    recs.iter().filter(|r| r.priority == priority).count()
}

fn portfolio(data: &DmTrackerData, recs: &[Recommendation]) -> PortfolioSummary {

    let business_units: Vec<BuPortfolio> = data
        .business_units
        .iter()
        .map(|bu| {
            let own: Vec<&Recommendation> = recs.iter().filter(|r| r.bu == bu.bu).collect();
            let dm_gap = bu.gap().max(0.0);
            BuPortfolio {
                bu: bu.bu.clone(),
                current_dm: bu.dm_pct,
                target_dm: DM_TARGET,
                dm_gap,
                current_arr: bu.current_rr * ANNUALIZE,
                at_risk_arr: dm_gap / 100.0 * bu.current_rr * ANNUALIZE,
                recommendation_count: own.len(),
                critical_count: count(&own, Priority::Critical),
                high_count: count(&own, Priority::High),
                total_estimated_impact: own.iter().map(|r| r.estimated_arr_impact).sum(),
            }
        })
        .collect();

    let all: Vec<&Recommendation> = recs.iter().collect();
    let consolidated = ConsolidatedPortfolio {
        total_arr: business_units.iter().map(|b| b.current_arr).sum(),
        weighted_dm: data.consolidated.dm_pct,
        target_dm: DM_TARGET,
        total_at_risk_arr: business_units.iter().map(|b| b.at_risk_arr).sum(),
        total_recommendations: recs.len(),
        critical_recommendations: count(&all, Priority::Critical),
        high_recommendations: count(&all, Priority::High),
        total_estimated_impact: recs.iter().map(|r| r.estimated_arr_impact).sum(),
    };

    PortfolioSummary {
        business_units,
        consolidated,
    }
}

impl DataLayer {
    /// Recommendations live twice as long as the financial data they derive from.
    fn strategy_options(&self) -> GetOptions {
        GetOptions::ttl(self.ttl.get(TtlCategory::Financial).saturating_mul(2))
    }

    pub async fn recommendations(
        &self,
        filters: &RecommendationFilters,
    ) -> Result<Vec<Recommendation>> {
        let key = cache_key(keys::RECOMMENDATIONS, filters)?;
        let this = self.clone();
        let filters = filters.clone();

        self.cache
            .get(
                &key,
                move || async move {
                    let dm = this.dm_tracker().await?;
                    let recs = generate(&dm, &filters, Utc::now());
                    log::debug!("Generated {} recommendations", recs.len());
                    Ok(recs)
                },
                self.strategy_options(),
            )
            .await
    }

    /// Up to `limit` critical recommendations, topped up with high ones.
    pub async fn top_urgent_recommendations(&self, limit: usize) -> Result<Vec<Recommendation>> {
        let high = RecommendationFilters::priority(Priority::High);

        let mut critical = match self
            .recommendations(&RecommendationFilters::priority(Priority::Critical))
            .await
        {
            Ok(critical) => critical,
            Err(err) => {
                log::warn!("Critical recommendations unavailable: {}", err);
                let mut recs = self.recommendations(&high).await?;
                recs.truncate(limit);
                return Ok(recs);
            }
        };

        if critical.len() >= limit {
            critical.truncate(limit);
            return Ok(critical);
        }

        match self.recommendations(&high).await {
            Ok(high) => {
                critical.extend(high);
                critical.truncate(limit);
                Ok(critical)
            }
            Err(_) => Ok(critical),
        }
    }

    pub async fn portfolio_summary(&self) -> Result<PortfolioSummary> {
        let this = self.clone();
        self.cache
            .get(
                keys::PORTFOLIO,
                move || async move {
                    let dm = this.dm_tracker().await?;
                    let recs = this.recommendations(&RecommendationFilters::default()).await?;
                    Ok(portfolio(&dm, &recs))
                },
                self.strategy_options(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing;
    use crate::sources::fixtures::dm_json;

    fn fixture() -> DmTrackerData {
        serde_json::from_value(dm_json()).unwrap()
    }

    #[test]
    fn test_fixture_recommendations_in_priority_order() {
        let recs = generate(&fixture(), &RecommendationFilters::default(), Utc::now());

        let ids: Vec<&str> = recs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "Cloudsense-critical-retention",
                "Kandy-high-engagement",
                "Cloudsense-product-health",
                "STL-expansion-upsell",
            ]
        );
        assert_eq!(recs[0].estimated_arr_impact, 3_000_000.0);
        assert_eq!(recs[1].estimated_arr_impact, 900_000.0);
        assert!((recs[0].estimated_dm_impact - 6.0).abs() < 1e-9);
        assert!(recs.iter().all(|r| r.status == RecommendationStatus::Pending));
    }

    #[test]
    fn test_pricing_band() {
        let mut data = fixture();
        data.business_units[2].dm_pct = 91.0;
        let recs = generate(&data, &RecommendationFilters::default(), Utc::now());
        assert!(recs.iter().any(|r| r.id == "STL-pricing-review"));
        assert!(!recs.iter().any(|r| r.id == "STL-expansion-upsell"));
    }

    #[test]
    fn test_filters_apply_before_sort() {
        let filters = RecommendationFilters {
            bu: Some("Cloudsense".to_string()),
            ..Default::default()
        };
        let recs = generate(&fixture(), &filters, Utc::now());
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].kind, RecommendationType::Product);
    }

    #[tokio::test]
    async fn test_filtered_lists_share_tracker_data() {
        let (mock, data) = testing::populated().await;

        let all = data.recommendations(&Default::default()).await.unwrap();
        let high = data
            .recommendations(&RecommendationFilters::priority(Priority::High))
            .await
            .unwrap();

        assert_eq!(all.len(), 4);
        assert_eq!(high.len(), 2);
        assert_eq!(mock.call_counts().await.dm_tracker, 1);
        assert!(
            data.cache()
                .entry_info("dm-strategy:recommendations:all")
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_recommendations_outlive_financials() {
        let (_mock, data) = testing::populated().await;
        data.recommendations(&Default::default()).await.unwrap();

        let info = data
            .cache()
            .entry_info("dm-strategy:recommendations:all")
            .unwrap();
        let financial = data.ttl().get(TtlCategory::Financial);
        assert!(info.ttl_remaining > financial);
    }

    #[tokio::test]
    async fn test_top_urgent_tops_up_with_high() {
        let (_mock, data) = testing::populated().await;

        let top = data.top_urgent_recommendations(2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].priority, Priority::Critical);
        assert_eq!(top[1].id, "Kandy-high-engagement");

        let one = data.top_urgent_recommendations(1).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].priority, Priority::Critical);
    }

    #[tokio::test]
    async fn test_portfolio_summary() {
        let (_mock, data) = testing::populated().await;
        let summary = data.portfolio_summary().await.unwrap();

        let cs = &summary.business_units[0];
        assert_eq!(cs.bu, "Cloudsense");
        assert_eq!(cs.recommendation_count, 2);
        assert_eq!(cs.critical_count, 1);
        assert!((cs.at_risk_arr - 1_200_000.0).abs() < 1e-6);

        let stl = &summary.business_units[2];
        assert_eq!(stl.dm_gap, 0.0);
        assert_eq!(stl.at_risk_arr, 0.0);

        assert_eq!(summary.consolidated.total_arr, 24_000_000.0);
        assert_eq!(summary.consolidated.total_recommendations, 4);
        assert_eq!(summary.consolidated.high_recommendations, 2);
        assert_eq!(summary.consolidated.weighted_dm, 84.6);
    }

    #[tokio::test]
    async fn test_missing_tracker_fails_everything_downstream() {
        let (_mock, data) = testing::empty();
        assert!(data.recommendations(&Default::default()).await.is_err());
        assert!(data.top_urgent_recommendations(3).await.is_err());
        assert!(data.portfolio_summary().await.is_err());
    }
}
