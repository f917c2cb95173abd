//! DM% tracker adapter

use std::sync::Arc;

use super::{DataLayer, keys};
use crate::cache::TtlCategory;
use crate::error::{Error, Result, guard};
use crate::models::DmTrackerData;
use crate::sources::script::{self, DM_SCRIPT};

fn parse_dm(raw: serde_json::Value) -> Result<DmTrackerData> {
    let data: DmTrackerData = serde_json::from_value(raw)
        .map_err(|e| Error::Validation(format!("unexpected DM% tracker shape: {}", e)))?;
    data.validate()?;
    Ok(data)
}

impl DataLayer {
    /// Per-BU and consolidated DM% with the trailing quarters and forecast.
    pub async fn dm_tracker(&self) -> Result<DmTrackerData> {
        let scripts = Arc::clone(&self.sources.scripts);
        self.cache
            .get(
                keys::DM_TRACKER,
                move || {
                    guard(script::ADAPTER, async move {
                        let raw = scripts.extract(DM_SCRIPT, &[]).await?;
                        parse_dm(raw)
                    })
                },
                self.options(TtlCategory::Financial),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing;
    use crate::sources::fixtures::dm_json;
    use serde_json::json;

    #[test]
    fn test_parse_fixture() {
        let data = parse_dm(dm_json()).unwrap();
        assert_eq!(data.business_units.len(), 3);
        assert_eq!(data.fiscal_quarter, "Q1'26");
        assert_eq!(data.business_units[0].ttm_quarters.len(), 2);
        assert!((data.business_units[1].gap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        let err = parse_dm(json!({"units": []})).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("DM% tracker"));
    }

    #[test]
    fn test_parse_rejects_empty_units() {
        let mut raw = dm_json();
        raw["business_units"] = json!([]);
        assert!(parse_dm(raw).unwrap_err().to_string().contains("no business units"));
    }

    #[tokio::test]
    async fn test_cached_within_lifetime() {
        let (mock, data) = testing::populated().await;

        let first = data.dm_tracker().await.unwrap();
        let second = data.dm_tracker().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.call_counts().await.dm_tracker, 1);
    }

    #[tokio::test]
    async fn test_invalid_output_is_not_cached() {
        let (mock, data) = testing::populated().await;
        mock.set_dm(Ok(json!({"business_units": "oops"}))).await;

        assert_eq!(data.dm_tracker().await.unwrap_err().kind(), "validation");

        mock.set_dm(Ok(dm_json())).await;
        assert!(data.dm_tracker().await.is_ok());
        assert_eq!(mock.call_counts().await.dm_tracker, 2);
    }
}
