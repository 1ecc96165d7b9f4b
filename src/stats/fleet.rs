use std::collections::HashMap;

use super::summary::{CategorySeries, Summary};

/// Fleet-wide average per move type as computed by the data source.
///
/// These are a comparison anchor. They are taken as delivered, never derived
/// from the locally filtered subset, so the chart can show how a filtered
/// selection sits against the whole fleet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetBaselines {
    order: Vec<String>,
    averages: HashMap<String, f64>,
}

impl FleetBaselines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a baseline; non-finite averages are ignored
    pub fn insert(&mut self, move_type: impl Into<String>, average: f64) {
        let move_type = move_type.into();
        if !average.is_finite() || move_type.is_empty() {
            return;
        }
        if !self.averages.contains_key(&move_type) {
            self.order.push(move_type.clone());
        }
        self.averages.insert(move_type, average);
    }

    pub fn get(&self, move_type: &str) -> Option<f64> {
        self.averages.get(move_type).copied()
    }

    pub fn move_types(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}

impl FromIterator<(String, f64)> for FleetBaselines {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        let mut baselines = FleetBaselines::new();
        for (move_type, average) in iter {
            baselines.insert(move_type, average);
        }
        baselines
    }
}

impl Summary {
    /// Attach fleet averages to the move-type series.
    ///
    /// Move types known only to the fleet are appended as "no data" series so
    /// the anchor stays visible when the filter excludes them.
    pub fn with_fleet_baselines(mut self, baselines: &FleetBaselines) -> Self {
        for series in &mut self.series {
            series.fleet_average = baselines.get(&series.move_type);
        }
        for move_type in baselines.move_types() {
            if !self.series.iter().any(|s| s.move_type == move_type) {
                self.series.push(CategorySeries {
                    move_type: move_type.to_string(),
                    best: None,
                    average: None,
                    best_by: None,
                    fleet_average: baselines.get(move_type),
                });
            }
        }
        self
    }
}
