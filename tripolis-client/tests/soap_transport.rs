//! End-to-end tests against a mock Tripolis SOAP endpoint.
//!
//! These cover the HTTP side of the client: WSDL discovery, the auth header,
//! fault decoding, paging on the wire and raw traces.

use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tripolis_client::api::{Operation, Service, TripolisClient};
use tripolis_client::config::{Credentials, TripolisConfig};
use tripolis_client::services::ContactGroupService;
use tripolis_client::TripolisError;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn wsdl(server: &MockServer, service: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
                  xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/"
                  xmlns:xs="http://www.w3.org/2001/XMLSchema"
                  targetNamespace="http://services.tripolis.com/{service}">
  <wsdl:types>
    <xs:schema>
      <xs:element name="contactGroup" type="ContactGroup" minOccurs="0" maxOccurs="unbounded"/>
    </xs:schema>
  </wsdl:types>
  <wsdl:binding name="{service}Binding" type="{service}">
    <wsdl:operation name="getById"><soap:operation soapAction="urn:getById"/></wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="{service}">
    <wsdl:port name="{service}Port" binding="{service}Binding">
      <soap:address location="{uri}/soap/{service}"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#,
        service = service,
        uri = server.uri()
    )
}

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"><SOAP-ENV:Body>{}</SOAP-ENV:Body></SOAP-ENV:Envelope>"#,
        body
    )
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/xml; charset=utf-8")
        .set_body_string(body)
}

async fn mount_wsdl(server: &MockServer, service: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/soap/{}", service)))
        .respond_with(xml(wsdl(server, service)))
        .expect(1)
        .mount(server)
        .await;
}

fn config(server: &MockServer) -> TripolisConfig {
    TripolisConfig::builder()
        .soap_prefix(format!("{}/soap/", server.uri()))
        .build()
}

fn credentials() -> Credentials {
    Credentials::new("acme", "api-user", "s3cret")
}

#[tokio::test]
async fn test_call_discovers_wsdl_and_sends_auth_header() {
    let _ = env_logger::builder().is_test(true).try_init();
    let server = MockServer::start().await;
    mount_wsdl(&server, "ContactDatabaseService").await;

    Mock::given(method("POST"))
        .and(path("/soap/ContactDatabaseService"))
        .and(header("SOAPAction", "\"urn:getById\""))
        .and(body_string_contains("<username>api-user</username>"))
        .and(body_string_contains("<password>s3cret</password>"))
        .and(body_string_contains("<client>acme</client>"))
        .and(body_string_contains("<ns1:getById><getByIdRequest><id>db1</id></getByIdRequest></ns1:getById>"))
        .respond_with(xml(envelope(
            "<ns1:getByIdResponse><response><contactDatabase><id>db1</id><name>Newsletter</name></contactDatabase></response></ns1:getByIdResponse>",
        )))
        .expect(2)
        .mount(&server)
        .await;

    let client = TripolisClient::connect(Service::ContactDatabase, credentials(), &config(&server)).unwrap();
    let request = json!({"getByIdRequest": {"id": "db1"}});

    let result = client.call(Operation::GetById, &request).await.unwrap();
    assert_eq!(result, json!({"contactDatabase": {"id": "db1", "name": "Newsletter"}}));

    // second call reuses the session: the WSDL mock expects exactly one fetch
    client.call(Operation::GetById, &request).await.unwrap();

    let sent = client.last_request_trace().unwrap();
    assert!(sent.contains("<ns2:authInfo>"));
    let received = client.last_response_trace().unwrap();
    assert!(received.contains("Newsletter"));
}

#[tokio::test]
async fn test_soap_fault_becomes_remote_fault() {
    let server = MockServer::start().await;
    mount_wsdl(&server, "ArticleService").await;

    Mock::given(method("POST"))
        .and(path("/soap/ArticleService"))
        .respond_with(ResponseTemplate::new(500).set_body_string(envelope(
            "<SOAP-ENV:Fault><faultcode>SOAP-ENV:Server</faultcode><faultstring>Validation failed</faultstring>\
             <detail><errorResponse><errors><error><errorCode>401</errorCode><message>label already exists</message>\
             <identifierName>label</identifierName><identifierId>a0</identifierId></error></errors></errorResponse></detail>\
             </SOAP-ENV:Fault>",
        )))
        .mount(&server)
        .await;

    let client = TripolisClient::connect(Service::Article, credentials(), &config(&server)).unwrap();
    let err = client
        .call(Operation::Create, &json!({"createRequest": {"label": "Taken"}}))
        .await
        .unwrap_err();

    let fault = err.fault().expect("fault");
    assert_eq!(fault.code, Some(401));
    assert_eq!(fault.identifier_name.as_deref(), Some("label"));
    assert_eq!(fault.identifier_id.as_deref(), Some("a0"));
    assert!(fault.is_duplicate_of("label"));
}

#[tokio::test]
async fn test_missing_wsdl_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = TripolisClient::connect(Service::Image, credentials(), &config(&server)).unwrap();
    let err = client
        .call(Operation::GetById, &json!({"getByIdRequest": {"id": "i1"}}))
        .await
        .unwrap_err();
    assert!(matches!(err, TripolisError::Transport { .. }));
}

/// Serves `total` contact groups, one page per request, reading the page
/// number from the request body
struct GroupPages {
    total: u32,
    page_size: u32,
    requests: Arc<AtomicU32>,
}

impl Respond for GroupPages {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let body = String::from_utf8_lossy(&request.body);
        let page: u32 = body
            .split("<pageNr>")
            .nth(1)
            .and_then(|rest| rest.split("</pageNr>").next())
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);

        let first = (page.saturating_sub(1)) * self.page_size;
        let last = (page * self.page_size).min(self.total);
        let groups: String = (first..last)
            .map(|i| format!("<contactGroup><id>g{}</id></contactGroup>", i))
            .collect();

        xml(envelope(&format!(
            "<ns1:getByContactDatabaseIdResponse><response><paging><pageNr>{}</pageNr><totalItems>{}</totalItems></paging>\
             <contactGroups>{}</contactGroups></response></ns1:getByContactDatabaseIdResponse>",
            page, self.total, groups
        )))
    }
}

#[tokio::test]
async fn test_paging_over_the_wire() {
    let server = MockServer::start().await;
    mount_wsdl(&server, "ContactGroupService").await;

    let requests = Arc::new(AtomicU32::new(0));
    Mock::given(method("POST"))
        .and(path("/soap/ContactGroupService"))
        .and(body_string_contains("<contactDatabaseId>db1</contactDatabaseId>"))
        .and(body_string_contains("<pageSize>2</pageSize>"))
        .respond_with(GroupPages {
            total: 5,
            page_size: 2,
            requests: requests.clone(),
        })
        .mount(&server)
        .await;

    let config = TripolisConfig::builder()
        .soap_prefix(format!("{}/soap/", server.uri()))
        .page_size(2)
        .build();
    let client = TripolisClient::connect(Service::ContactGroup, credentials(), &config).unwrap();
    let groups = ContactGroupService::new(client.clone(), Some("db1".into()))
        .get_by_contact_database_id(None)
        .await
        .unwrap()
        .unwrap();

    let ids: Vec<&str> = groups.iter().map(|g| g["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["g0", "g1", "g2", "g3", "g4"]);
    assert_eq!(requests.load(Ordering::SeqCst), 3);
    assert!(client.last_request_trace().unwrap().contains("<pageNr>3</pageNr>"));
}

#[tokio::test]
async fn test_single_repeatable_element_stays_a_list() {
    let server = MockServer::start().await;
    mount_wsdl(&server, "ContactGroupService").await;

    Mock::given(method("POST"))
        .and(path("/soap/ContactGroupService"))
        .respond_with(GroupPages {
            total: 1,
            page_size: 400,
            requests: Arc::new(AtomicU32::new(0)),
        })
        .mount(&server)
        .await;

    let client = TripolisClient::connect(Service::ContactGroup, credentials(), &config(&server)).unwrap();
    let result = client
        .paged_call(
            Operation::GetByContactDatabaseId,
            json!({"getByContactDatabaseIdRequest": {"contactDatabaseId": "db1"}}),
        )
        .await
        .unwrap();

    assert_eq!(result["contactGroups"]["contactGroup"], json!([{"id": "g0"}]));
}
