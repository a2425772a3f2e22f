//! Applicant data structures for credit risk scoring

use serde::{Deserialize, Serialize};

/// Represents one loan applicant to be scored for credit risk.
///
/// Field names follow the German Credit Risk dataset columns; the serde
/// aliases accept the original dataset headers (including the space-separated
/// ones such as "Credit amount").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantRecord {
    /// Age in years
    #[serde(alias = "Age")]
    pub age: i64,

    /// Job category (0 = unskilled non-resident, 1 = unskilled resident,
    /// 2 = skilled, 3 = highly skilled)
    #[serde(alias = "Job")]
    pub job: i64,

    /// Requested credit amount
    #[serde(rename = "credit_amount", alias = "Credit amount")]
    pub credit_amount: f64,

    /// Loan duration in months
    #[serde(alias = "Duration")]
    pub duration: i64,

    /// Sex ("male" / "female")
    #[serde(alias = "Sex")]
    pub sex: String,

    /// Housing situation ("own", "rent", "free")
    #[serde(alias = "Housing")]
    pub housing: String,

    /// Saving accounts level ("little", "moderate", "quite rich", "rich")
    #[serde(rename = "saving_accounts", alias = "Saving accounts")]
    pub saving_accounts: String,

    /// Checking account level ("little", "moderate", "rich")
    #[serde(rename = "checking_account", alias = "Checking account")]
    pub checking_account: String,

    /// Purpose of the loan ("car", "radio/TV", "education", ...)
    #[serde(alias = "Purpose")]
    pub purpose: String,
}

impl ApplicantRecord {
    /// Numeric field values in the fixed column order used at fit time.
    pub fn numeric_values(&self) -> [f64; 4] {
        [
            self.age as f64,
            self.job as f64,
            self.credit_amount,
            self.duration as f64,
        ]
    }

    /// Categorical field values in the fixed column order used at fit time.
    pub fn categorical_values(&self) -> [&str; 5] {
        [
            &self.sex,
            &self.housing,
            &self.saving_accounts,
            &self.checking_account,
            &self.purpose,
        ]
    }
}
