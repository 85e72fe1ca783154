//! EmailRecord — the persisted unit, one per processed email.

use serde::{Deserialize, Serialize};

use crate::channels::FetchedMessage;
use crate::config::AccountConfig;
use crate::extraction::ExtractedFields;

/// One extracted enquiry. Key names match the downstream JSON contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    #[serde(rename = "companyId")]
    pub company_id: i64,
    #[serde(rename = "companyBranchId")]
    pub company_branch_id: i64,
    #[serde(rename = "financialYearId")]
    pub financial_year_id: i64,
    #[serde(rename = "clientId")]
    pub client_id: i64,
    #[serde(rename = "id")]
    pub record_id: i64,
    #[serde(rename = "Sender")]
    pub sender: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    /// ISO-8601.
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Remarks")]
    pub remarks: String,
    #[serde(rename = "Mode_Of_Transport")]
    pub mode_of_transport: String,
    #[serde(rename = "Port_Of_Loading")]
    pub port_of_loading: String,
    #[serde(rename = "Port_Of_Destination")]
    pub port_of_destination: String,
    #[serde(rename = "Container_status")]
    pub container_status: String,
    #[serde(rename = "Weight")]
    pub weight: String,
    #[serde(rename = "Weight_unit")]
    pub weight_unit: String,
    #[serde(rename = "Quantity")]
    pub quantity: String,
    #[serde(rename = "Package Type")]
    pub package_type: String,
    #[serde(rename = "Cargo Type")]
    pub cargo_type: String,
    #[serde(rename = "Size")]
    pub size: String,
}

impl EmailRecord {
    /// Assemble a record from the account ids, the message and its fields.
    pub fn new(account: &AccountConfig, message: &FetchedMessage, fields: ExtractedFields) -> Self {
        Self {
            company_id: account.company_id,
            company_branch_id: account.company_branch_id,
            financial_year_id: account.financial_year_id,
            client_id: account.client_id,
            record_id: account.record_id,
            sender: message.sender.clone(),
            subject: message.subject.clone(),
            date: message.date.to_rfc3339(),
            remarks: message.body_text.clone(),
            mode_of_transport: fields.mode_of_transport,
            port_of_loading: fields.port_of_loading,
            port_of_destination: fields.port_of_destination,
            container_status: fields.container_status,
            weight: fields.weight,
            weight_unit: fields.weight_unit,
            quantity: fields.quantity,
            package_type: fields.package_type,
            cargo_type: fields.cargo_type,
            size: fields.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use secrecy::SecretString;

    use super::*;

    fn account() -> AccountConfig {
        AccountConfig {
            company_id: 1,
            company_branch_id: 2,
            financial_year_id: 3,
            client_id: 7,
            record_id: 6,
            user: "ops@example.com".into(),
            password: SecretString::from("pw"),
            imap_host: "imap.example.com".into(),
            imap_port: 993,
        }
    }

    fn message() -> FetchedMessage {
        FetchedMessage {
            uid: 10,
            subject: "Quote".into(),
            sender: "buyer@example.com".into(),
            date: DateTime::parse_from_rfc3339("2025-10-14T09:30:00+05:30").unwrap(),
            body_text: "2 pallets by truck".into(),
        }
    }

    #[test]
    fn record_uses_contract_key_names() {
        let fields = ExtractedFields {
            mode_of_transport: "Road".into(),
            package_type: "pallets".into(),
            cargo_type: "general".into(),
            ..Default::default()
        };
        let record = EmailRecord::new(&account(), &message(), fields);
        let json = serde_json::to_value(&record).unwrap();

        for key in [
            "companyId",
            "companyBranchId",
            "financialYearId",
            "clientId",
            "id",
            "Sender",
            "Subject",
            "Date",
            "Remarks",
            "Mode_Of_Transport",
            "Port_Of_Loading",
            "Port_Of_Destination",
            "Container_status",
            "Weight",
            "Weight_unit",
            "Quantity",
            "Package Type",
            "Cargo Type",
            "Size",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json.as_object().unwrap().len(), 19);
        assert_eq!(json["id"], 6);
        assert_eq!(json["Package Type"], "pallets");
        assert_eq!(json["Date"], "2025-10-14T09:30:00+05:30");
    }

    #[test]
    fn record_copies_account_ids_and_message() {
        let record = EmailRecord::new(&account(), &message(), ExtractedFields::default());
        assert_eq!(record.client_id, 7);
        assert_eq!(record.sender, "buyer@example.com");
        assert_eq!(record.remarks, "2 pallets by truck");
        assert!(record.weight.is_empty());
    }
}
