//! Client records and the canonical feature vector the scorer consumes.
//!
//! A record arrives grouped by category (`personal`, `financial`, ...). The
//! scorer only understands one flat row, so records are flattened into a
//! name → value mapping and then reindexed into [`CANONICAL_FEATURES`] order.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::PredictionError;

/// Feature names in the exact column order the model was trained on.
pub const CANONICAL_FEATURES: [&str; 42] = [
    // personal
    "age",
    "gender",
    // financial
    "turn_cur_cr_avg_act_v2",
    "diff_avg_cr_db_turn",
    "curr_rur_amt_cm_avg",
    "dda_rur_amt_curr_v2",
    "loanacc_rur_amt_cm_avg",
    "express_rur_amt_cm_avg",
    "total_rur_amt_cm_avg",
    "profit_income_out_rur_amt_12m",
    "profit_income_out_rur_amt_l2m",
    // credit
    "hdb_bki_total_max_limit",
    "hdb_bki_total_pil_max_limit",
    "hdb_outstand_sum",
    "hdb_ovrd_sum",
    "hdb_bki_total_products",
    "hdb_bki_total_pil_cnt",
    "hdb_bki_total_ip_cnt",
    "hdb_bki_total_max_overdue_sum",
    "hdb_bki_total_pil_max_overdue",
    "hdb_bki_total_pil_max_del90",
    "hdb_bki_active_cc_max_limit",
    "hdb_bki_active_pil_cnt",
    // spending
    "avg_by_category__amount__sum__cashflowcategory_name__supermarkety",
    "avg_6m_restaurants",
    "avg_6m_travel",
    "transaction_category_supermarket_percent_cnt_2m",
    "by_category__amount__sum__eoperation_type_name__perevod_po_nomeru_telefona",
    // employment
    "dp_ils_avg_salary_1y",
    "dp_ils_paymentssum_avg_12m",
    "dp_ewb_last_employment_position",
    "dp_ils_total_seniority",
    "dp_ils_uniq_companies_1y",
    "dp_ils_days_from_last_doc",
    "dp_ils_cnt_changes_1y",
    // additional
    "per_capita_income_rur_amt",
    "label_Above_1M_share_r1",
    "salary_median_in_gex_r1",
    "blacklist_flag",
    "nonresident_flag",
    "client_active_flag",
    "accountsalary_out_flag",
];

/// A single feature value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    /// Un-set value, e.g. a category the encoder could not map.
    Missing,
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    fn from_leaf(name: &str, value: &Value) -> Result<Self, PredictionError> {
        match value {
            Value::Number(n) => n.as_f64().map(Cell::Number).ok_or_else(|| {
                PredictionError::InvalidRecord(format!("field '{name}' is not representable as f64"))
            }),
            Value::String(s) => Ok(Cell::Text(s.clone())),
            Value::Bool(b) => Ok(Cell::Number(if *b { 1.0 } else { 0.0 })),
            Value::Null => Ok(Cell::Missing),
            Value::Array(_) | Value::Object(_) => Err(PredictionError::InvalidRecord(format!(
                "field '{name}' is nested too deeply"
            ))),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s:?}"),
            Cell::Missing => f.write_str("<missing>"),
        }
    }
}

/// Nested client record: each top-level value is a scalar or a group of scalars.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientRecord {
    fields: Map<String, Value>,
}

impl ClientRecord {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build a record from any serializable request payload.
    pub fn from_serializable<T: Serialize>(payload: &T) -> Result<Self, PredictionError> {
        match serde_json::to_value(payload) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(other) => Err(PredictionError::InvalidRecord(format!(
                "expected an object, got {other}"
            ))),
            Err(e) => Err(PredictionError::InvalidRecord(e.to_string())),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Collapse groups into one name → value mapping.
    ///
    /// Inner fields are keyed by their own name, not prefixed with the group.
    /// When two groups share a leaf name the later group overwrites the earlier.
    pub fn flatten(&self) -> Result<HashMap<String, Cell>, PredictionError> {
        let mut flat = HashMap::with_capacity(CANONICAL_FEATURES.len());
        for (key, value) in &self.fields {
            match value {
                Value::Object(group) => {
                    for (name, leaf) in group {
                        flat.insert(name.clone(), Cell::from_leaf(name, leaf)?);
                    }
                }
                scalar => {
                    flat.insert(key.clone(), Cell::from_leaf(key, scalar)?);
                }
            }
        }
        Ok(flat)
    }
}

/// Values aligned one-to-one with [`CANONICAL_FEATURES`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<Cell>,
}

impl FeatureVector {
    /// Reorder a flattened record into canonical order, dropping extra keys.
    pub fn reindex(mut flat: HashMap<String, Cell>) -> Result<Self, PredictionError> {
        let mut values = Vec::with_capacity(CANONICAL_FEATURES.len());
        let mut missing = Vec::new();
        for name in CANONICAL_FEATURES {
            match flat.remove(name) {
                Some(cell) => values.push(cell),
                None => missing.push(name.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(PredictionError::SchemaMismatch { missing });
        }
        Ok(Self { values })
    }

    pub fn from_record(record: &ClientRecord) -> Result<Self, PredictionError> {
        Self::reindex(record.flatten()?)
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        CANONICAL_FEATURES
            .iter()
            .position(|n| *n == name)
            .map(|idx| &self.values[idx])
    }

    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Cell> {
        self.values
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// A record with every canonical feature filled in, grouped like the API payload.
    pub(crate) fn sample_record() -> ClientRecord {
        let value = json!({
            "personal": { "age": 35, "gender": "M" },
            "financial": {
                "turn_cur_cr_avg_act_v2": 1000,
                "diff_avg_cr_db_turn": 50,
                "curr_rur_amt_cm_avg": 2000,
                "dda_rur_amt_curr_v2": 1500,
                "loanacc_rur_amt_cm_avg": 3000,
                "express_rur_amt_cm_avg": 1000,
                "total_rur_amt_cm_avg": 8000,
                "profit_income_out_rur_amt_12m": 50000,
                "profit_income_out_rur_amt_l2m": 40000
            },
            "credit": {
                "hdb_bki_total_max_limit": 100000,
                "hdb_bki_total_pil_max_limit": 80000,
                "hdb_outstand_sum": 50000,
                "hdb_ovrd_sum": 1000,
                "hdb_bki_total_products": 5,
                "hdb_bki_total_pil_cnt": 3,
                "hdb_bki_total_ip_cnt": 2,
                "hdb_bki_total_max_overdue_sum": 500,
                "hdb_bki_total_pil_max_overdue": 200,
                "hdb_bki_total_pil_max_del90": 100,
                "hdb_bki_active_cc_max_limit": 50000,
                "hdb_bki_active_pil_cnt": 2
            },
            "spending": {
                "avg_by_category__amount__sum__cashflowcategory_name__supermarkety": 2000,
                "avg_6m_restaurants": 1000,
                "avg_6m_travel": 500,
                "transaction_category_supermarket_percent_cnt_2m": 0.3,
                "by_category__amount__sum__eoperation_type_name__perevod_po_nomeru_telefona": 500
            },
            "employment": {
                "dp_ils_avg_salary_1y": 50000,
                "dp_ils_paymentssum_avg_12m": 48000,
                "dp_ewb_last_employment_position": "manager",
                "dp_ils_total_seniority": 5,
                "dp_ils_uniq_companies_1y": 2,
                "dp_ils_days_from_last_doc": 30,
                "dp_ils_cnt_changes_1y": 1
            },
            "additional": {
                "per_capita_income_rur_amt": 40000,
                "label_Above_1M_share_r1": 0.1,
                "salary_median_in_gex_r1": 45000,
                "blacklist_flag": 0,
                "nonresident_flag": 0,
                "client_active_flag": 1,
                "accountsalary_out_flag": 1,
                "first_salary_income": 52000
            }
        });
        match value {
            Value::Object(fields) => ClientRecord::from_map(fields),
            _ => unreachable!(),
        }
    }

    fn without(record: &ClientRecord, group: &str, field: &str) -> ClientRecord {
        let mut fields = record.fields().clone();
        if let Some(Value::Object(inner)) = fields.get_mut(group) {
            inner.remove(field);
        }
        ClientRecord::from_map(fields)
    }

    #[test]
    fn canonical_names_are_unique() {
        let mut names: Vec<_> = CANONICAL_FEATURES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 42);
    }

    #[test]
    fn flatten_drops_group_prefixes() {
        let flat = sample_record().flatten().unwrap();
        assert_eq!(flat.get("age"), Some(&Cell::Number(35.0)));
        assert_eq!(flat.get("gender"), Some(&Cell::Text("M".to_string())));
        assert!(!flat.contains_key("personal"));
        assert!(!flat.contains_key("personal.age"));
    }

    #[test]
    fn flatten_emits_top_level_scalars_directly() {
        let record = ClientRecord::from_map(
            json!({ "age": 40, "personal": { "gender": 1 } })
                .as_object()
                .unwrap()
                .clone(),
        );
        let flat = record.flatten().unwrap();
        assert_eq!(flat.get("age"), Some(&Cell::Number(40.0)));
        assert_eq!(flat.get("gender"), Some(&Cell::Number(1.0)));
    }

    #[test]
    fn later_group_overwrites_colliding_leaf() {
        let record = ClientRecord::from_map(
            json!({ "a": { "x": 1 }, "b": { "x": 2 } })
                .as_object()
                .unwrap()
                .clone(),
        );
        let flat = record.flatten().unwrap();
        assert_eq!(flat.get("x"), Some(&Cell::Number(2.0)));
    }

    #[test]
    fn deeply_nested_leaf_is_rejected() {
        let record = ClientRecord::from_map(
            json!({ "personal": { "age": { "years": 3 } } })
                .as_object()
                .unwrap()
                .clone(),
        );
        let err = record.flatten().unwrap_err();
        assert!(matches!(err, PredictionError::InvalidRecord(_)));
    }

    #[test]
    fn reindex_yields_canonical_order() {
        let vector = FeatureVector::from_record(&sample_record()).unwrap();
        let values = vector.values();
        assert_eq!(values.len(), CANONICAL_FEATURES.len());
        assert_eq!(values[0], Cell::Number(35.0));
        assert_eq!(values[1], Cell::Text("M".to_string()));
        assert_eq!(values[11], Cell::Number(100000.0));
        assert_eq!(values[30], Cell::Text("manager".to_string()));
        assert_eq!(values[41], Cell::Number(1.0));
        assert_eq!(
            vector.get("accountsalary_out_flag"),
            Some(&Cell::Number(1.0))
        );
    }

    #[test]
    fn reindex_drops_extraneous_keys() {
        let vector = FeatureVector::from_record(&sample_record()).unwrap();
        assert_eq!(vector.get("first_salary_income"), None);
    }

    #[test]
    fn missing_leaf_is_a_schema_mismatch() {
        let record = without(&sample_record(), "credit", "hdb_ovrd_sum");
        match FeatureVector::from_record(&record) {
            Err(PredictionError::SchemaMismatch { missing }) => {
                assert_eq!(missing, vec!["hdb_ovrd_sum".to_string()]);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_group_reports_all_its_fields_in_order() {
        let mut fields = sample_record().fields().clone();
        fields.remove("personal");
        let err = FeatureVector::from_record(&ClientRecord::from_map(fields)).unwrap_err();
        match err {
            PredictionError::SchemaMismatch { missing } => {
                assert_eq!(missing, vec!["age".to_string(), "gender".to_string()]);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }
}
