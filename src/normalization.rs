//! Converts a decoded lookup response into [`ServiceOutcome`].
//!
//! This is the only place that deals with single-versus-sequence ambiguity and
//! varying nesting depth; everything downstream works with fixed types.

use crate::deep_find::{as_list, deep_find, deep_find_str};
use crate::errors::AppError;
use crate::models::{
    Address, GridOwner, IdentityQuery, Installation, MeteringRecord, ReadingType,
    RecordIdentity, ServiceOutcome, StatusCode,
};
use chrono::NaiveDate;
use serde_json::Value;

fn owned(source: &Value, key: &str) -> Option<String> {
    deep_find_str(source, key).map(str::to_string)
}

/// Accepts `YYYY-MM-DD` with or without a trailing time part.
pub fn parse_service_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn date_field(source: &Value, key: &str) -> Option<NaiveDate> {
    let raw = deep_find_str(source, key)?;
    let parsed = parse_service_date(raw);
    if parsed.is_none() {
        tracing::debug!("Ignoring unparseable {} value: {}", key, raw);
    }
    parsed
}

fn identity_for(customer: &Value, query: &IdentityQuery) -> RecordIdentity {
    match query {
        IdentityQuery::Person(person) => RecordIdentity {
            last_name: owned(customer, "lastname").or_else(|| person.last_name.clone()),
            first_name: owned(customer, "firstname").or_else(|| person.first_name.clone()),
            birth_date: date_field(customer, "birthdate").or(person.birth_date),
            ..Default::default()
        },
        IdentityQuery::Company(company) => RecordIdentity {
            company_name: owned(customer, "companyname").or_else(|| company.name.clone()),
            org_no: owned(customer, "organizationnumber").or_else(|| company.org_no.clone()),
            ..Default::default()
        },
    }
}

fn record_for(
    customer: &Value,
    grid_owner: &GridOwner,
    query: &IdentityQuery,
) -> Option<MeteringRecord> {
    let metering_point_id = owned(customer, "meteringpointid")?;
    let reading_type = deep_find_str(customer, "meterreadingtransmissiontype")
        .map(ReadingType::from_code)
        .unwrap_or(ReadingType::Unknown);

    Some(MeteringRecord {
        identity: identity_for(customer, query),
        address: Address {
            address: owned(customer, "address1"),
            postal_code: owned(customer, "postcode"),
            city: owned(customer, "location"),
        },
        grid_owner: grid_owner.clone(),
        installation: Installation {
            description: owned(customer, "description"),
            metering_point_id,
            meter_number: owned(customer, "meternumber"),
            reading_type,
            last_meter_reading_date: date_field(customer, "lastmeterreadingdate"),
            start_of_supply_duty: date_field(customer, "startofsupplyduty"),
        },
        can_change_supplier_without_reading: false,
        result_strength: None,
    })
}

fn records_for_entry(entry: &Value, query: &IdentityQuery) -> Vec<MeteringRecord> {
    let grid_owner = deep_find(entry, "gridowner")
        .map(|owner| GridOwner {
            name: owned(owner, "name"),
            gln: owned(owner, "gln"),
        })
        .unwrap_or_default();

    let customers = deep_find(entry, "customers").map(as_list).unwrap_or_default();
    customers
        .into_iter()
        .filter_map(|customer| {
            let record = record_for(customer, &grid_owner, query);
            if record.is_none() {
                tracing::warn!(
                    "Dropping customer entry without metering point id (grid owner: {:?})",
                    grid_owner.name
                );
            }
            record
        })
        .collect()
}

/// Builds the outcome from every `response` entry in the decoded tree.
///
/// Any `Found` entry wins; otherwise faults are reported together; otherwise the
/// lookup found nothing.
pub fn normalize_response(tree: &Value, query: &IdentityQuery) -> Result<ServiceOutcome, AppError> {
    let responses = deep_find(tree, "response")
        .ok_or_else(|| AppError::Parse("response element missing".to_string()))?;

    let mut records = Vec::new();
    let mut any_found = false;
    let mut faults = Vec::new();

    for entry in as_list(responses) {
        let raw_code = deep_find_str(entry, "statuscode").unwrap_or("");
        match StatusCode::parse(raw_code) {
            StatusCode::Found => {
                any_found = true;
                records.extend(records_for_entry(entry, query));
            }
            StatusCode::NotFound => {}
            fault => {
                let description = deep_find_str(entry, "statusdescription")
                    .or_else(|| deep_find_str(entry, "statustext"))
                    .unwrap_or("no description");
                tracing::debug!("Lookup entry reported {:?}: {}", fault, description);
                let code = if raw_code.is_empty() { "missing status code" } else { raw_code };
                faults.push(format!("{}: {}", code, description));
            }
        }
    }

    if any_found {
        Ok(ServiceOutcome::Found(records))
    } else if !faults.is_empty() {
        Ok(ServiceOutcome::ServiceError(faults.join("; ")))
    } else {
        Ok(ServiceOutcome::NotFound)
    }
}
