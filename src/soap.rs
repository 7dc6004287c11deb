use crate::models::{Address, IdentityQuery};
use quick_xml::escape::escape;
use uuid::Uuid;

const GET_METERING_POINT_TEMPLATE: &str = include_str!("templates/get_metering_point.xml");

pub const SOAP_ACTION: &str = "Statnett.Nubix.NubixService:getMeteringPointIdIn";

/// Credentials sent in the envelope header of every request.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub gln: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("gln", &self.gln)
            .finish()
    }
}

fn push_element(out: &mut String, tag: &str, value: Option<&str>) {
    if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
        out.push_str(&format!("<{tag}>{}</{tag}>", escape(v)));
    }
}

fn push_address(out: &mut String, address: Option<&Address>) {
    let Some(address) = address else {
        return;
    };
    let mut inner = String::new();
    push_element(&mut inner, "address1", address.address.as_deref());
    push_element(&mut inner, "postCode", address.postal_code.as_deref());
    push_element(&mut inner, "location", address.city.as_deref());
    if !inner.is_empty() {
        out.push_str(&format!("<address>{}</address>", inner));
    }
}

/// Renders the customer block carrying only the fields present on the query.
fn render_customer(query: &IdentityQuery) -> String {
    let mut out = String::new();
    let tag = match query {
        IdentityQuery::Person(person) => {
            out.push_str("<domesticCustomer>");
            push_element(&mut out, "lastName", person.last_name.as_deref());
            push_element(&mut out, "firstName", person.first_name.as_deref());
            let birth_date = person.birth_date.map(|d| d.format("%Y-%m-%d").to_string());
            push_element(&mut out, "birthDate", birth_date.as_deref());
            push_element(&mut out, "meterNumber", person.meter_no.as_deref());
            "domesticCustomer"
        }
        IdentityQuery::Company(company) => {
            out.push_str("<businessCustomer>");
            push_element(&mut out, "companyName", company.name.as_deref());
            push_element(&mut out, "organizationNumber", company.org_no.as_deref());
            push_element(&mut out, "meterNumber", company.meter_no.as_deref());
            "businessCustomer"
        }
    };
    push_address(&mut out, query.address());
    out.push_str(&format!("</{}>", tag));
    out
}

/// Renders the `getMeteringPointIdIn` envelope for one query.
pub fn render_request(
    query: &IdentityQuery,
    credentials: &Credentials,
    request_id: Uuid,
) -> String {
    GET_METERING_POINT_TEMPLATE
        .replace("{#username#}", &escape(credentials.username.as_str()))
        .replace("{#password#}", &escape(credentials.password.as_str()))
        .replace("{#gln#}", &escape(credentials.gln.as_str()))
        .replace("{#requestId#}", &request_id.to_string())
        .replace("{#customer#}", &render_customer(query))
}
