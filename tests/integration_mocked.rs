/// Integration tests with a mocked Nubix endpoint
/// Exercises the SOAP client end to end without hitting the real service
use chrono::NaiveDate;
use rust_nubix_client::config::Config;
use rust_nubix_client::errors::AppError;
use rust_nubix_client::gateway_client::{MeteringPointGateway, NubixGatewayClient};
use rust_nubix_client::holidays::FixedHolidayCalendar;
use rust_nubix_client::models::{
    Address, IdentityQuery, MeteringPointRequest, PersonQuery, ReadingType, ServiceOutcome,
};
use rust_nubix_client::soap::SOAP_ACTION;
use rust_nubix_client::triangulation::Triangulator;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create test config
fn create_test_config(base_url: String) -> Config {
    Config {
        port: 8080,
        nubix_username: "test_user".to_string(),
        nubix_password: "test_pass".to_string(),
        nubix_gln: "7080000000001".to_string(),
        nubix_service_url: format!("{}/2011/NubixService.svc", base_url),
        nubix_timeout_secs: 5,
        operator_timezone: chrono_tz::Europe::Oslo,
    }
}

fn person_query() -> IdentityQuery {
    IdentityQuery::Person(PersonQuery {
        last_name: Some("Olsen".to_string()),
        birth_date: NaiveDate::from_ymd_opt(1980, 1, 1),
        address: Some(Address {
            address: Some("Storgata 1".to_string()),
            postal_code: Some("0001".to_string()),
            city: None,
        }),
        ..Default::default()
    })
}

fn envelope(responses: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <getMeteringPointIdOut xmlns="Statnett.Nubix">
      <Responses>{}</Responses>
    </getMeteringPointIdOut>
  </s:Body>
</s:Envelope>"#,
        responses
    )
}

fn customer(id: &str, code: &str) -> String {
    format!(
        r#"<DomesticCustomer>
  <LastName>OLSEN</LastName>
  <FirstName>KARI</FirstName>
  <MeterNumber>M-{id}</MeterNumber>
  <Address>
    <Address1>Storgata 1</Address1><PostCode>0001</PostCode><Location>OSLO</Location>
  </Address>
</DomesticCustomer>
<MeteringPoint>
  <MeteringPointId>{id}</MeteringPointId>
  <Description>Bolig</Description>
  <MeterReadingTransmissionType>{code}</MeterReadingTransmissionType>
  <LastMeterReadingDate>2024-01-31T00:00:00</LastMeterReadingDate>
  <StartOfSupplyDuty>2019-05-01</StartOfSupplyDuty>
</MeteringPoint>"#
    )
}

fn found_response(customers: &[String]) -> String {
    let customers: String = customers
        .iter()
        .map(|c| format!("<Customers>{}</Customers>", c))
        .collect();
    format!(
        r#"<Response>
  <ResponseStatus><StatusCode>Found</StatusCode></ResponseStatus>
  <GridOwner><Name>Elvia AS</Name><GLN>7080005051234</GLN></GridOwner>
  {}
</Response>"#,
        customers
    )
}

#[tokio::test]
async fn test_found_single_customer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2011/NubixService.svc"))
        .and(header("SOAPAction", SOAP_ACTION))
        .and(header("Content-Type", "text/xml; charset=utf-8"))
        .and(body_string_contains("<lastName>Olsen</lastName>"))
        .and(body_string_contains("<gln>7080000000001</gln>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope(&found_response(&[
            customer("707057500000000001", "Z51"),
        ]))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = NubixGatewayClient::new(&create_test_config(mock_server.uri())).unwrap();
    let outcome = client.call(&person_query()).await.unwrap();

    let ServiceOutcome::Found(records) = outcome else {
        panic!("expected Found, got {:?}", outcome);
    };
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.metering_point_id(), "707057500000000001");
    assert_eq!(record.installation.reading_type, ReadingType::Manual);
    assert_eq!(record.installation.meter_number.as_deref(), Some("M-707057500000000001"));
    assert_eq!(record.grid_owner.gln.as_deref(), Some("7080005051234"));
    assert_eq!(record.address.city.as_deref(), Some("OSLO"));
    assert_eq!(record.identity.first_name.as_deref(), Some("KARI"));
    assert_eq!(
        record.installation.start_of_supply_duty,
        NaiveDate::from_ymd_opt(2019, 5, 1)
    );
}

#[tokio::test]
async fn test_found_customer_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope(&found_response(&[
            customer("1", "Z50"),
            customer("2", "Z52"),
        ]))))
        .mount(&mock_server)
        .await;

    let client = NubixGatewayClient::new(&create_test_config(mock_server.uri())).unwrap();
    let ServiceOutcome::Found(records) = client.call(&person_query()).await.unwrap() else {
        panic!("expected Found");
    };

    let types: Vec<ReadingType> = records
        .iter()
        .map(|r| r.installation.reading_type)
        .collect();
    assert_eq!(types, vec![ReadingType::Remote, ReadingType::Unread]);
}

#[tokio::test]
async fn test_fault_status_becomes_service_error() {
    let mock_server = MockServer::start().await;

    let body = envelope(
        r#"<Response>
  <ResponseStatus>
    <StatusCode>InvalidRequest</StatusCode>
    <StatusDescription>Postcode &amp; address mismatch</StatusDescription>
  </ResponseStatus>
</Response>"#,
    );
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let client = NubixGatewayClient::new(&create_test_config(mock_server.uri())).unwrap();
    let outcome = client.call(&person_query()).await.unwrap();

    assert_eq!(
        outcome,
        ServiceOutcome::ServiceError("InvalidRequest: Postcode & address mismatch".to_string())
    );
}

#[tokio::test]
async fn test_not_found_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(envelope(concat!(
            "<Response><ResponseStatus><StatusCode>NotFound</StatusCode>",
            "</ResponseStatus></Response>"
        ))))
        .mount(&mock_server)
        .await;

    let client = NubixGatewayClient::new(&create_test_config(mock_server.uri())).unwrap();
    assert_eq!(
        client.call(&person_query()).await.unwrap(),
        ServiceOutcome::NotFound
    );
}

#[tokio::test]
async fn test_http_error_is_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = NubixGatewayClient::new(&create_test_config(mock_server.uri())).unwrap();
    let err = client.call(&person_query()).await.unwrap_err();

    assert!(matches!(err.root(), AppError::Transport(_)));
}

#[tokio::test]
async fn test_unreadable_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>maintenance"))
        .mount(&mock_server)
        .await;

    let client = NubixGatewayClient::new(&create_test_config(mock_server.uri())).unwrap();
    let err = client.call(&person_query()).await.unwrap_err();

    assert!(matches!(err.root(), AppError::Parse(_)));
}

#[tokio::test]
async fn test_triangulation_retries_over_http() {
    let mock_server = MockServer::start().await;

    // The tier-0 candidate is the only one carrying both street and birth date with a last name
    Mock::given(method("POST"))
        .and(body_string_contains(
            "<lastName>Olsen</lastName><birthDate>1980-01-01</birthDate><address><address1>",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(envelope(&found_response(&[customer("42", "Z50")]))),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(6)
        .mount(&mock_server)
        .await;

    let client = NubixGatewayClient::new(&create_test_config(mock_server.uri())).unwrap();
    let triangulator = Triangulator::new(
        Arc::new(client),
        Arc::new(FixedHolidayCalendar::empty()),
        chrono_tz::Europe::Oslo,
    );

    let request = MeteringPointRequest {
        person: match person_query() {
            IdentityQuery::Person(p) => Some(p),
            IdentityQuery::Company(_) => None,
        },
        company: None,
    };
    let records = triangulator.triangulate(request).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].metering_point_id(), "42");
    assert_eq!(records[0].result_strength, Some(0));
    assert!(records[0].can_change_supplier_without_reading);
}
