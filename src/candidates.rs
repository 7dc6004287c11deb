//! Candidate query generation.
//!
//! One ambiguous identity is expanded into several narrower queries, each tagged
//! with a confidence tier derived only from which input fields it carries.
//! Candidates whose required fields are missing are never emitted.

use crate::models::{Address, CandidateQuery, CompanyQuery, IdentityQuery, PersonQuery};
use chrono::NaiveDate;

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Street address and postal code pulled from an optional address block.
#[derive(Debug, Default)]
struct AddressParts {
    street: Option<String>,
    postal_code: Option<String>,
}

impl AddressParts {
    fn from_address(address: Option<&Address>) -> Self {
        address
            .map(|a| Self {
                street: present(&a.address),
                postal_code: present(&a.postal_code),
            })
            .unwrap_or_default()
    }

    /// Address for a candidate; city is never sent.
    fn query_address(&self, with_street: bool) -> Option<Address> {
        let street = if with_street { self.street.clone() } else { None };
        if street.is_none() && self.postal_code.is_none() {
            return None;
        }
        Some(Address {
            address: street,
            postal_code: self.postal_code.clone(),
            city: None,
        })
    }
}

struct PersonFields {
    last_name: Option<String>,
    birth_date: Option<NaiveDate>,
    meter_no: Option<String>,
    address: AddressParts,
}

struct CompanyFields {
    name: Option<String>,
    org_no: Option<String>,
    meter_no: Option<String>,
    address: AddressParts,
}

/// Builds the prioritized candidate list for one identity query.
///
/// The order follows the fixed tables for each branch; the triangulator relies on
/// it to break ties between equally ranked results.
pub fn generate_candidates(query: &IdentityQuery) -> Vec<CandidateQuery> {
    let candidates = match query {
        IdentityQuery::Person(person) => person_candidates(person),
        IdentityQuery::Company(company) => company_candidates(company),
    };

    tracing::debug!(
        "Generated {} candidate queries (tiers: {:?})",
        candidates.len(),
        candidates
            .iter()
            .map(|c| c.confidence_tier)
            .collect::<Vec<_>>()
    );

    candidates
}

fn person_candidates(person: &PersonQuery) -> Vec<CandidateQuery> {
    let f = PersonFields {
        last_name: present(&person.last_name),
        birth_date: person.birth_date,
        meter_no: present(&person.meter_no),
        address: AddressParts::from_address(person.address.as_ref()),
    };
    let has_street = f.address.street.is_some();

    let candidate = |tier: u32,
                     last_name: bool,
                     birth_date: bool,
                     meter_no: bool,
                     street: bool| CandidateQuery {
        query: IdentityQuery::Person(PersonQuery {
            last_name: if last_name { f.last_name.clone() } else { None },
            first_name: None,
            birth_date: if birth_date { f.birth_date } else { None },
            meter_no: if meter_no { f.meter_no.clone() } else { None },
            address: f.address.query_address(street),
        }),
        confidence_tier: tier,
    };

    let mut out = Vec::new();
    // Person queries never carry an organisation number.
    if f.last_name.is_some() && f.birth_date.is_some() && has_street {
        out.push(candidate(0, true, true, false, true));
    }
    if f.last_name.is_some() && f.birth_date.is_some() {
        out.push(candidate(1, true, true, false, false));
    }
    if f.last_name.is_some() && has_street {
        out.push(candidate(1, true, false, false, true));
    }
    if f.birth_date.is_some() && has_street {
        out.push(candidate(2, false, true, false, true));
    }
    if f.birth_date.is_some() && f.meter_no.is_some() {
        out.push(candidate(0, false, true, true, false));
    }
    if f.birth_date.is_some() && f.meter_no.is_some() && has_street {
        out.push(candidate(1, true, false, true, true));
    }
    out
}

fn company_candidates(company: &CompanyQuery) -> Vec<CandidateQuery> {
    let f = CompanyFields {
        name: present(&company.name),
        org_no: present(&company.org_no),
        meter_no: present(&company.meter_no),
        address: AddressParts::from_address(company.address.as_ref()),
    };
    let has_street = f.address.street.is_some();

    let candidate =
        |tier: u32, name: bool, org_no: bool, meter_no: bool, street: bool| CandidateQuery {
            query: IdentityQuery::Company(CompanyQuery {
                name: if name { f.name.clone() } else { None },
                org_no: if org_no { f.org_no.clone() } else { None },
                meter_no: if meter_no { f.meter_no.clone() } else { None },
                address: f.address.query_address(street),
            }),
            confidence_tier: tier,
        };

    let mut out = Vec::new();
    if f.org_no.is_some() && f.meter_no.is_some() {
        out.push(candidate(0, false, true, true, false));
    }
    if f.org_no.is_some() && has_street {
        out.push(candidate(0, false, true, false, true));
    }
    if f.org_no.is_some() {
        out.push(candidate(1, false, true, false, false));
    }
    if f.name.is_some() && f.meter_no.is_some() {
        out.push(candidate(1, true, false, true, false));
    }
    if f.name.is_some() && has_street {
        out.push(candidate(2, true, false, false, true));
    }
    out
}
