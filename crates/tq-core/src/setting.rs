//! Pure transitions over [`Setting`]
//!
//! Every configuration edit is an action applied through one reducer,
//! returning a new value. Nothing here validates field names against the
//! column map or touches `active`; both are the backend confirm's job.

use crate::model::{ColumnType, Filter, FilterMode, Metric, MetricMode, Rule, Setting};

/// A single configuration edit
#[derive(Debug, Clone, PartialEq)]
pub enum SettingAction {
    /// Replace the type of exactly one column; order unchanged
    SetColumnType { name: String, dtype: ColumnType },
    /// Rebuild the filter list from an ordered field selection
    SetFilterFields { names: Vec<String> },
    /// Replace the mode of the filter keyed by `index`
    SetFilterMode { index: String, mode: FilterMode },
    /// Replace the row dimension fields
    SetRowDimension { names: Vec<String> },
    /// Replace the column dimension fields
    SetColumnDimension { names: Vec<String> },
    /// Rebuild the metric list from an ordered field selection
    SetMetricFields { names: Vec<String> },
    /// Replace the mode of the metric keyed by `index`
    SetMetricMode { index: String, mode: MetricMode },
    /// Replace the computed-column rules
    SetRules { rules: Vec<Rule> },
}

/// A configuration entry keyed by column name and carrying a mode
///
/// Filters and metrics share the same reconciliation policy; this trait
/// lets [`reconcile`] express it once.
trait Keyed: Clone {
    type Mode: Copy;

    fn index(&self) -> &str;
    fn mode(&self) -> Self::Mode;
    fn build(index: String, mode: Self::Mode) -> Self;
}

impl Keyed for Filter {
    type Mode = FilterMode;

    fn index(&self) -> &str {
        &self.index
    }

    fn mode(&self) -> FilterMode {
        self.mode
    }

    fn build(index: String, mode: FilterMode) -> Self {
        Filter { index, mode }
    }
}

impl Keyed for Metric {
    type Mode = MetricMode;

    fn index(&self) -> &str {
        &self.index
    }

    fn mode(&self) -> MetricMode {
        self.mode
    }

    fn build(index: String, mode: MetricMode) -> Self {
        Metric { index, mode }
    }
}

/// Rebuild a keyed list from a new field selection
///
/// Retained fields keep their current mode, new fields get `default`,
/// deselected fields are dropped. Output order follows `names`.
fn reconcile<K: Keyed>(current: &[K], names: Vec<String>, default: K::Mode) -> Vec<K> {
    names
        .into_iter()
        .map(|name| {
            let mode = current
                .iter()
                .find(|entry| entry.index() == name)
                .map_or(default, |entry| entry.mode());
            K::build(name, mode)
        })
        .collect()
}

/// Replace the mode of the entry keyed by `index`; others unchanged
fn with_mode<K: Keyed>(current: &[K], index: &str, mode: K::Mode) -> Vec<K> {
    current
        .iter()
        .map(|entry| {
            if entry.index() == index {
                K::build(entry.index().to_string(), mode)
            } else {
                entry.clone()
            }
        })
        .collect()
}

impl Setting {
    /// Apply one edit, producing the next configuration
    pub fn apply(&self, action: SettingAction) -> Setting {
        let mut next = self.clone();
        match action {
            SettingAction::SetColumnType { name, dtype } => {
                if let Some(entry) = next.columns.get_mut(&name) {
                    *entry = dtype;
                }
            }
            SettingAction::SetFilterFields { names } => {
                next.filters = reconcile(&self.filters, names, FilterMode::Multi);
            }
            SettingAction::SetFilterMode { index, mode } => {
                next.filters = with_mode(&self.filters, &index, mode);
            }
            SettingAction::SetRowDimension { names } => {
                next.dimensions.rows = names;
            }
            SettingAction::SetColumnDimension { names } => {
                next.dimensions.columns = names;
            }
            SettingAction::SetMetricFields { names } => {
                next.metrics = reconcile(&self.metrics, names, MetricMode::Sum);
            }
            SettingAction::SetMetricMode { index, mode } => {
                next.metrics = with_mode(&self.metrics, &index, mode);
            }
            SettingAction::SetRules { rules } => {
                next.rules = rules;
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn setting() -> Setting {
        let mut columns = IndexMap::new();
        columns.insert("region".to_string(), ColumnType::String);
        columns.insert("amount".to_string(), ColumnType::Int);
        columns.insert("day".to_string(), ColumnType::Date);
        Setting::with_columns(columns)
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_column_type_replaces_one_key() {
        let before = setting();
        let after = before.apply(SettingAction::SetColumnType {
            name: "amount".to_string(),
            dtype: ColumnType::Float,
        });

        assert_eq!(after.columns["amount"], ColumnType::Float);
        assert_eq!(after.columns["region"], ColumnType::String);
        let order: Vec<_> = after.columns.keys().cloned().collect();
        assert_eq!(order, names(&["region", "amount", "day"]));
    }

    #[test]
    fn test_set_column_type_unknown_name_is_noop() {
        let before = setting();
        let after = before.apply(SettingAction::SetColumnType {
            name: "missing".to_string(),
            dtype: ColumnType::Float,
        });
        assert_eq!(after, before);
    }

    #[test]
    fn test_filter_fields_preserve_existing_modes() {
        let step1 = setting().apply(SettingAction::SetFilterFields {
            names: names(&["region", "day"]),
        });
        let step2 = step1.apply(SettingAction::SetFilterMode {
            index: "day".to_string(),
            mode: FilterMode::DateRange,
        });
        // Reselect: drop region, keep day, add amount
        let step3 = step2.apply(SettingAction::SetFilterFields {
            names: names(&["day", "amount"]),
        });

        assert_eq!(
            step3.filters,
            vec![
                Filter {
                    index: "day".to_string(),
                    mode: FilterMode::DateRange,
                },
                Filter {
                    index: "amount".to_string(),
                    mode: FilterMode::Multi,
                },
            ]
        );
    }

    #[test]
    fn test_metric_fields_preserve_existing_modes() {
        let step1 = setting().apply(SettingAction::SetMetricFields {
            names: names(&["amount"]),
        });
        assert_eq!(step1.metrics[0].mode, MetricMode::Sum);

        let step2 = step1.apply(SettingAction::SetMetricMode {
            index: "amount".to_string(),
            mode: MetricMode::Avg,
        });
        let step3 = step2.apply(SettingAction::SetMetricFields {
            names: names(&["amount", "region"]),
        });

        assert_eq!(
            step3.metrics,
            vec![
                Metric {
                    index: "amount".to_string(),
                    mode: MetricMode::Avg,
                },
                Metric {
                    index: "region".to_string(),
                    mode: MetricMode::Sum,
                },
            ]
        );
    }

    #[test]
    fn test_mode_change_targets_one_entry() {
        let base = setting().apply(SettingAction::SetFilterFields {
            names: names(&["region", "day"]),
        });
        let after = base.apply(SettingAction::SetFilterMode {
            index: "region".to_string(),
            mode: FilterMode::Single,
        });

        assert_eq!(after.filters[0].mode, FilterMode::Single);
        assert_eq!(after.filters[1].mode, FilterMode::Multi);
    }

    #[test]
    fn test_dimensions_replace_without_validation() {
        let after = setting()
            .apply(SettingAction::SetRowDimension {
                names: names(&["region", "region"]),
            })
            .apply(SettingAction::SetColumnDimension {
                names: names(&["not_a_column"]),
            });

        // No de-duplication, no validation against the column map
        assert_eq!(after.dimensions.rows, names(&["region", "region"]));
        assert_eq!(after.dimensions.columns, names(&["not_a_column"]));
    }

    #[test]
    fn test_rules_pass_through() {
        let rules = vec![Rule {
            name: "ratio".to_string(),
            calc: "amount / 100".to_string(),
        }];
        let after = setting().apply(SettingAction::SetRules {
            rules: rules.clone(),
        });
        assert_eq!(after.rules, rules);
    }

    #[test]
    fn test_reducer_never_touches_active() {
        let mut before = setting();
        before.active = true;
        let after = before.apply(SettingAction::SetRowDimension {
            names: names(&["region"]),
        });
        assert!(after.active);
    }
}
