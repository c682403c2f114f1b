use crate::cnpj::{CheckDigits, Cnpj, Decomposition};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CnpjResponse {
    pub cnpj: u64,
    pub region: u8,
    pub branch: u16,
    pub valid: bool,
    pub formatted: String,
}

impl From<Decomposition> for CnpjResponse {
    fn from(d: Decomposition) -> Self {
        Self {
            cnpj: d.cnpj.value(),
            region: d.region.code(),
            branch: d.branch.code(),
            valid: d.valid,
            formatted: d.cnpj.formatted(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ValidationItem {
    pub cnpj: u64,
    pub valid: bool,
}

impl From<Cnpj> for ValidationItem {
    fn from(cnpj: Cnpj) -> Self {
        Self {
            cnpj: cnpj.value(),
            valid: cnpj.is_valid(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CheckDigitsResponse {
    pub base: u64,
    pub check_digits: String,
    pub cnpj: u64,
    pub formatted: String,
}

impl From<CheckDigits> for CheckDigitsResponse {
    fn from(c: CheckDigits) -> Self {
        Self {
            base: c.base,
            check_digits: format!("{}{}", c.digits[0], c.digits[1]),
            cnpj: c.cnpj.value(),
            formatted: c.cnpj.formatted(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub started_at: String,
}
