use serde::{Deserialize, Serialize};

use crate::encoding::EncodingGap;
use crate::error::PredictionError;
use crate::features::ClientRecord;

/// A category sent either as a numeric code or as its label.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum CategoricalValue {
    Code(f64),
    Label(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PersonalInfo {
    pub age: f64,
    pub gender: CategoricalValue,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FinancialInfo {
    pub turn_cur_cr_avg_act_v2: f64,
    pub diff_avg_cr_db_turn: f64,
    pub curr_rur_amt_cm_avg: f64,
    pub dda_rur_amt_curr_v2: f64,
    pub loanacc_rur_amt_cm_avg: f64,
    pub express_rur_amt_cm_avg: f64,
    pub total_rur_amt_cm_avg: f64,
    pub profit_income_out_rur_amt_12m: f64,
    pub profit_income_out_rur_amt_l2m: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CreditHistory {
    pub hdb_bki_total_max_limit: f64,
    pub hdb_bki_total_pil_max_limit: f64,
    pub hdb_outstand_sum: f64,
    pub hdb_ovrd_sum: f64,
    pub hdb_bki_total_products: f64,
    pub hdb_bki_total_pil_cnt: f64,
    pub hdb_bki_total_ip_cnt: f64,
    pub hdb_bki_total_max_overdue_sum: f64,
    pub hdb_bki_total_pil_max_overdue: f64,
    pub hdb_bki_total_pil_max_del90: f64,
    pub hdb_bki_active_cc_max_limit: f64,
    pub hdb_bki_active_pil_cnt: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[allow(non_snake_case)]
pub struct SpendingInfo {
    pub avg_by_category__amount__sum__cashflowcategory_name__supermarkety: f64,
    pub avg_6m_restaurants: f64,
    pub avg_6m_travel: f64,
    pub transaction_category_supermarket_percent_cnt_2m: f64,
    pub by_category__amount__sum__eoperation_type_name__perevod_po_nomeru_telefona: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmploymentInfo {
    pub dp_ils_avg_salary_1y: f64,
    pub dp_ils_paymentssum_avg_12m: f64,
    pub dp_ewb_last_employment_position: CategoricalValue,
    pub dp_ils_total_seniority: f64,
    pub dp_ils_uniq_companies_1y: f64,
    pub dp_ils_days_from_last_doc: f64,
    pub dp_ils_cnt_changes_1y: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[allow(non_snake_case)]
pub struct AdditionalInfo {
    pub per_capita_income_rur_amt: f64,
    pub label_Above_1M_share_r1: f64,
    pub salary_median_in_gex_r1: f64,
    pub blacklist_flag: f64,
    pub nonresident_flag: f64,
    pub client_active_flag: f64,
    pub accountsalary_out_flag: f64,
    /// Accepted from the front-end but not a model feature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_salary_income: Option<f64>,
}

/// Client data submitted for an income prediction.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClientData {
    pub personal: PersonalInfo,
    pub financial: FinancialInfo,
    pub credit: CreditHistory,
    pub spending: SpendingInfo,
    pub employment: EmploymentInfo,
    pub additional: AdditionalInfo,
}

impl ClientData {
    pub fn to_record(&self) -> Result<ClientRecord, PredictionError> {
        ClientRecord::from_serializable(self)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BatchPredictionRequest {
    pub clients: Vec<ClientData>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PredictionResponse {
    pub predicted_income: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BatchPredictionResponse {
    pub predictions: Vec<PredictionResponse>,
    pub total_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encoding_gaps: Vec<EncodingGap>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub features: Vec<String>,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub version: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scorer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_income: Option<f64>,
    pub input_features: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        ErrorResponse {
            detail: detail.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
