use crate::errors::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============ Query Models ============

/// Partial postal address used both in queries and in returned records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street address line.
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
}

/// Person branch of an identity query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonQuery {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub meter_no: Option<String>,
    pub address: Option<Address>,
}

/// Company branch of an identity query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyQuery {
    pub name: Option<String>,
    /// Organisation number.
    pub org_no: Option<String>,
    pub meter_no: Option<String>,
    pub address: Option<Address>,
}

/// Caller-facing request body: exactly one of `person` / `company` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeteringPointRequest {
    pub person: Option<PersonQuery>,
    pub company: Option<CompanyQuery>,
}

/// A validated identity query, either a person or a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentityQuery {
    Person(PersonQuery),
    Company(CompanyQuery),
}

impl IdentityQuery {
    pub fn address(&self) -> Option<&Address> {
        match self {
            IdentityQuery::Person(p) => p.address.as_ref(),
            IdentityQuery::Company(c) => c.address.as_ref(),
        }
    }
}

impl TryFrom<MeteringPointRequest> for IdentityQuery {
    type Error = AppError;

    fn try_from(request: MeteringPointRequest) -> Result<Self, Self::Error> {
        match (request.person, request.company) {
            (Some(person), None) => Ok(IdentityQuery::Person(person)),
            (None, Some(company)) => Ok(IdentityQuery::Company(company)),
            (None, None) => Err(AppError::Validation(
                "either person or company must be supplied".to_string(),
            )),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "person and company cannot both be supplied".to_string(),
            )),
        }
    }
}

/// One query variant produced from an ambiguous input, with its evidence rank.
///
/// Lower `confidence_tier` means stronger evidence; 0 is the strongest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    pub query: IdentityQuery,
    pub confidence_tier: u32,
}

// ============ Result Models ============

/// How meter readings are collected at an installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingType {
    Remote,
    Manual,
    Unread,
    Unknown,
}

impl ReadingType {
    /// Maps a raw meter-reading transmission-type code.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "Z50" => ReadingType::Remote,
            "Z51" => ReadingType::Manual,
            "Z52" => ReadingType::Unread,
            _ => ReadingType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridOwner {
    pub name: Option<String>,
    pub gln: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    pub description: Option<String>,
    /// Unique key of the installation across all results.
    pub metering_point_id: String,
    pub meter_number: Option<String>,
    pub reading_type: ReadingType,
    pub last_meter_reading_date: Option<NaiveDate>,
    pub start_of_supply_duty: Option<NaiveDate>,
}

/// Identity fields as returned by the service, falling back to the queried values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordIdentity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_no: Option<String>,
}

/// One metering point found by the lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeteringRecord {
    #[serde(flatten)]
    pub identity: RecordIdentity,
    pub address: Address,
    pub grid_owner: GridOwner,
    pub installation: Installation,
    pub can_change_supplier_without_reading: bool,
    /// Confidence tier of the candidate that produced this record (triangulation only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_strength: Option<u32>,
}

impl MeteringRecord {
    pub fn metering_point_id(&self) -> &str {
        &self.installation.metering_point_id
    }
}

/// Status codes reported per response entry by the lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCode {
    Found,
    NotFound,
    GridOwnerError,
    NoGridOwnerFound,
    ServiceFault,
    GridOwnerCommunicationFault,
    InvalidRequest,
    Unrecognized(String),
}

impl StatusCode {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "found" => StatusCode::Found,
            "notfound" => StatusCode::NotFound,
            "gridownererror" => StatusCode::GridOwnerError,
            "nogridownerfound" => StatusCode::NoGridOwnerFound,
            "servicefault" | "fault" | "serviceerror" => StatusCode::ServiceFault,
            "gridownercommunicationfault" | "gridownercommunicationerror" => {
                StatusCode::GridOwnerCommunicationFault
            }
            "invalidrequest" => StatusCode::InvalidRequest,
            _ => StatusCode::Unrecognized(raw.trim().to_string()),
        }
    }

    pub fn is_fault(&self) -> bool {
        !matches!(self, StatusCode::Found | StatusCode::NotFound)
    }
}

/// Normalized result of one gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOutcome {
    Found(Vec<MeteringRecord>),
    NotFound,
    ServiceError(String),
}

/// Query parameters for the reading-need endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingNeedParams {
    pub last_reading_date: Option<NaiveDate>,
    pub reading_type: ReadingType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingNeedResponse {
    pub needs_reading: bool,
    pub reading_type: ReadingType,
    pub last_reading_date: Option<NaiveDate>,
}
