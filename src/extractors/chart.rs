//! Chart extractor.

use crate::engine::{RawChart, RawShape};
use crate::plugins::extractor::{ExtractionContext, ShapeExtractor};
use crate::plugins::Plugin;
use crate::types::{ChartSeries, ExtractionResult, ShapePayload};
use std::time::Instant;

/// Extracts series, categories and legend state from chart shapes.
pub struct ChartExtractor;

impl ChartExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChartExtractor {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn payload_from_raw(chart: &RawChart) -> ShapePayload {
    ShapePayload::Chart {
        chart_type: chart.chart_type.clone(),
        series: chart
            .series
            .iter()
            .map(|(name, values)| ChartSeries {
                name: name.clone(),
                values: values.clone(),
            })
            .collect(),
        categories: chart.categories.clone(),
        legend: chart.has_legend,
    }
}

impl Plugin for ChartExtractor {
    fn name(&self) -> &str {
        "chart-extractor"
    }

    fn version(&self) -> String {
        "1.0.0".to_string()
    }

    fn description(&self) -> &str {
        "Extracts series, categories, and legend state from charts"
    }
}

impl ShapeExtractor for ChartExtractor {
    fn supported_kinds(&self) -> &[&str] {
        &["chart"]
    }

    fn extract(&self, shape: &RawShape, _ctx: &ExtractionContext) -> ExtractionResult {
        let started = Instant::now();

        match &shape.chart {
            Some(chart) => ExtractionResult::ok(payload_from_raw(chart), started.elapsed().as_millis() as u64),
            None => ExtractionResult::failed(
                format!("chart shape {} has no chart data", shape.index),
                started.elapsed().as_millis() as u64,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_chart() {
        let shape = RawShape {
            kind: "chart".to_string(),
            chart: Some(RawChart {
                chart_type: "bar".to_string(),
                series: vec![("Revenue".to_string(), vec![10.0, 12.5, 9.0])],
                categories: vec!["Q1".to_string(), "Q2".to_string(), "Q3".to_string()],
                has_legend: true,
            }),
            ..Default::default()
        };

        let result = ChartExtractor::new().extract(&shape, &ExtractionContext::default());
        assert!(result.success);

        match result.payload.unwrap() {
            ShapePayload::Chart {
                chart_type,
                series,
                categories,
                legend,
            } => {
                assert_eq!(chart_type, "bar");
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].values, vec![10.0, 12.5, 9.0]);
                assert_eq!(categories.len(), 3);
                assert!(legend);
            }
            other => panic!("expected chart payload, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_fails_without_chart_data() {
        let shape = RawShape {
            kind: "chart".to_string(),
            index: 2,
            ..Default::default()
        };
        let result = ChartExtractor::new().extract(&shape, &ExtractionContext::default());
        assert!(!result.success);
        assert!(result.error.unwrap().contains("no chart data"));
    }
}
