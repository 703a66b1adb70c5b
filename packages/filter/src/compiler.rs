//! Compilation of raw client filter fields into storage-level predicates.
//!
//! The client sends a flat string→string map. Empty values mean "not
//! supplied", a non-empty case number overrides everything else, and the
//! textual range fields are swapped out for parsed inclusive ranges keyed
//! by the canonical column names.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::parsing::{parse_date_range, parse_time_range};
use crate::{FilterError, YearWindow};

/// Client filter key for the case-number exact match.
pub const KEY_CASE_NUMBER: &str = "case_number";
/// Client filter key for the station identifier.
pub const KEY_STATION_ID: &str = "StationID";
/// Client filter key for the primary classification.
pub const KEY_PRIMARY_TYPE: &str = "primary_type";
/// Client filter key for the legal act reference.
pub const KEY_ACT: &str = "act";
/// Client filter key carrying a textual `DD/MM/YYYY - DD/MM/YYYY` range.
pub const KEY_DATE_RANGE: &str = "date_range";
/// Client filter key carrying a textual `HH:MM - HH:MM` range.
pub const KEY_TIME_RANGE: &str = "time_range";

/// Station sentinel meaning "no station filter".
pub const STATION_NO_FILTER: i64 = -1;

/// Marker table column names predicates bind to.
pub mod columns {
    /// Case number column.
    pub const CASE_NUMBER: &str = "case_number";
    /// Station identifier column.
    pub const STATION_ID: &str = "station_id";
    /// Primary classification column.
    pub const PRIMARY_TYPE: &str = "primary_type";
    /// Legal act reference column.
    pub const ACT: &str = "act";
    /// Canonical midnight-epoch date column.
    pub const DATE: &str = "date";
    /// Canonical `HHMM` time column.
    pub const TIME: &str = "time";
}

/// A typed value an equality predicate compares against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PredicateValue {
    /// A text column value.
    Text(String),
    /// An integer column value.
    Integer(i64),
}

/// A single storage-level predicate over the marker table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Predicate {
    /// Equality against a column.
    Eq {
        /// Column the predicate binds to.
        column: &'static str,
        /// Value to compare against.
        value: PredicateValue,
    },
    /// Inclusive integer range over a column.
    Between {
        /// Column the predicate binds to.
        column: &'static str,
        /// Inclusive lower bound.
        lower: i64,
        /// Inclusive upper bound.
        upper: i64,
    },
}

/// The compiled predicate set: equality predicates plus at most two
/// inclusive ranges, ready for the storage layer to render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    predicates: Vec<Predicate>,
}

impl FilterSet {
    /// The predicates in this set, in deterministic field order.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Whether the set matches everything (no fields were supplied).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Compiles raw client filter maps into [`FilterSet`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterCompiler {
    window: YearWindow,
}

impl FilterCompiler {
    /// Creates a compiler that resolves date-range years through the given
    /// [`YearWindow`].
    #[must_use]
    pub const fn new(window: YearWindow) -> Self {
        Self { window }
    }

    /// Compiles a raw filter map into a predicate set.
    ///
    /// A non-empty `case_number` short-circuits to a single exact-match
    /// predicate. Otherwise empty fields are dropped, the `-1` station
    /// sentinel is dropped, the textual range fields are parsed and
    /// re-keyed to the canonical `date`/`time` columns, and every
    /// remaining field becomes an equality predicate. The input map is
    /// never mutated.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] if a range or station field is malformed or
    /// a field name is outside the supported set.
    pub fn compile(&self, fields: &BTreeMap<String, String>) -> Result<FilterSet, FilterError> {
        // Case-number precedence: an exact match on the (intended unique)
        // case number makes every other filter redundant.
        if let Some(case_number) = fields.get(KEY_CASE_NUMBER)
            && !case_number.is_empty()
        {
            return Ok(FilterSet {
                predicates: vec![Predicate::Eq {
                    column: columns::CASE_NUMBER,
                    value: PredicateValue::Text(case_number.clone()),
                }],
            });
        }

        let mut predicates = Vec::new();

        for (field, value) in fields {
            if value.is_empty() {
                continue;
            }

            match field.as_str() {
                // Non-empty case numbers short-circuited above; an empty
                // one was dropped like any other omitted field.
                KEY_CASE_NUMBER => {}
                KEY_STATION_ID => {
                    let station_id: i64 =
                        value
                            .parse()
                            .map_err(|_| FilterError::InvalidStationId {
                                value: value.clone(),
                            })?;
                    if station_id != STATION_NO_FILTER {
                        predicates.push(Predicate::Eq {
                            column: columns::STATION_ID,
                            value: PredicateValue::Integer(station_id),
                        });
                    }
                }
                KEY_DATE_RANGE => {
                    let range = parse_date_range(value, self.window)?;
                    predicates.push(Predicate::Between {
                        column: columns::DATE,
                        lower: range.lower_bound,
                        upper: range.upper_bound,
                    });
                }
                KEY_TIME_RANGE => {
                    let range = parse_time_range(value)?;
                    predicates.push(Predicate::Between {
                        column: columns::TIME,
                        lower: i64::from(range.lower_bound),
                        upper: i64::from(range.upper_bound),
                    });
                }
                KEY_PRIMARY_TYPE => predicates.push(Predicate::Eq {
                    column: columns::PRIMARY_TYPE,
                    value: PredicateValue::Text(value.clone()),
                }),
                KEY_ACT => predicates.push(Predicate::Eq {
                    column: columns::ACT,
                    value: PredicateValue::Text(value.clone()),
                }),
                other => {
                    return Err(FilterError::UnknownField {
                        field: other.to_string(),
                    });
                }
            }
        }

        Ok(FilterSet { predicates })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn case_number_short_circuits_every_other_field() {
        let compiler = FilterCompiler::default();
        let set = compiler
            .compile(&fields(&[
                (KEY_CASE_NUMBER, "FIR-2021-0042"),
                (KEY_STATION_ID, "7"),
                (KEY_PRIMARY_TYPE, "THEFT"),
                (KEY_TIME_RANGE, "not even a valid range"),
            ]))
            .unwrap();

        assert_eq!(
            set.predicates(),
            &[Predicate::Eq {
                column: columns::CASE_NUMBER,
                value: PredicateValue::Text("FIR-2021-0042".to_string()),
            }]
        );
    }

    #[test]
    fn empty_fields_are_dropped() {
        let compiler = FilterCompiler::default();
        let set = compiler
            .compile(&fields(&[
                (KEY_CASE_NUMBER, ""),
                (KEY_PRIMARY_TYPE, "ROBBERY"),
                (KEY_ACT, ""),
            ]))
            .unwrap();

        assert_eq!(
            set.predicates(),
            &[Predicate::Eq {
                column: columns::PRIMARY_TYPE,
                value: PredicateValue::Text("ROBBERY".to_string()),
            }]
        );
    }

    #[test]
    fn station_sentinel_drops_station_predicate() {
        let compiler = FilterCompiler::default();
        let set = compiler
            .compile(&fields(&[
                (KEY_STATION_ID, "-1"),
                (KEY_PRIMARY_TYPE, "ASSAULT"),
            ]))
            .unwrap();

        assert!(
            !set.predicates()
                .iter()
                .any(|p| matches!(p, Predicate::Eq { column, .. } if *column == columns::STATION_ID))
        );
    }

    #[test]
    fn station_id_becomes_integer_equality() {
        let compiler = FilterCompiler::default();
        let set = compiler.compile(&fields(&[(KEY_STATION_ID, "12")])).unwrap();

        assert_eq!(
            set.predicates(),
            &[Predicate::Eq {
                column: columns::STATION_ID,
                value: PredicateValue::Integer(12),
            }]
        );
    }

    #[test]
    fn non_numeric_station_id_is_rejected() {
        let compiler = FilterCompiler::default();
        assert!(matches!(
            compiler.compile(&fields(&[(KEY_STATION_ID, "north")])),
            Err(FilterError::InvalidStationId { .. })
        ));
    }

    #[test]
    fn range_fields_are_rekeyed_to_canonical_columns() {
        let compiler = FilterCompiler::new(YearWindow::Literal);
        let set = compiler
            .compile(&fields(&[
                (KEY_DATE_RANGE, "01/06/2021 - 15/06/2021"),
                (KEY_TIME_RANGE, "09:00 - 17:45"),
            ]))
            .unwrap();

        let bound_columns: Vec<&str> = set
            .predicates()
            .iter()
            .map(|p| match p {
                Predicate::Eq { column, .. } | Predicate::Between { column, .. } => *column,
            })
            .collect();
        assert_eq!(bound_columns, vec![columns::DATE, columns::TIME]);
        assert!(set.predicates().iter().all(|p| matches!(
            p,
            Predicate::Between { lower, upper, .. } if lower <= upper
        )));
    }

    #[test]
    fn malformed_range_surfaces_parse_error() {
        let compiler = FilterCompiler::default();
        assert!(matches!(
            compiler.compile(&fields(&[(KEY_TIME_RANGE, "09:00 to 17:45")])),
            Err(FilterError::InvalidRange { .. })
        ));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let compiler = FilterCompiler::default();
        assert!(matches!(
            compiler.compile(&fields(&[("severity", "5")])),
            Err(FilterError::UnknownField { .. })
        ));
    }

    #[test]
    fn empty_request_compiles_to_empty_set() {
        let compiler = FilterCompiler::default();
        let set = compiler.compile(&BTreeMap::new()).unwrap();
        assert!(set.is_empty());
    }
}
