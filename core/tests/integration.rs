//! Create/read lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every core client
//! operation over real HTTP using ureq. Validates that request building and
//! response interpretation agree with the server end to end, for both
//! protocol generations.

use shhh_core::{CreateParams, ExpireToken, HttpMethod, HttpResponse, Outcome, Protocol, ShhhClient};

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// interpret every status.
fn execute(req: shhh_core::HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.url).call(),
        (HttpMethod::Post, Some(body)) => agent
            .post(&req.url)
            .content_type("application/json")
            .send(body.as_bytes()),
        (HttpMethod::Post, None) => agent.post(&req.url).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    HttpResponse::new(status, body)
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn create(client: &ShhhClient, params: &CreateParams) -> Outcome {
    let req = client.build_create_secret(params).unwrap();
    client.parse_create_secret(&execute(req))
}

fn read(link: &str, passphrase: &str, protocol: Protocol) -> Outcome {
    let (client, slug) = ShhhClient::for_link(link, protocol).unwrap();
    let req = client.build_read_secret(&slug, passphrase).unwrap();
    client.parse_read_secret(&execute(req))
}

#[test]
fn create_read_lifecycle() {
    // Step 1: start mock server on a random port; point the client at it
    // through the environment slot.
    let server = start_server();
    let client = ShhhClient::resolve(None, Some(&server), Protocol::Current).unwrap();

    // Step 2: a weak passphrase is rejected field by field.
    let weak = CreateParams::new("top secret", "weak");
    match create(&client, &weak) {
        Outcome::ValidationError { messages } => {
            assert_eq!(messages.len(), 1);
            assert!(messages[0].contains("too weak"), "{messages:?}");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // Step 3: a breached passphrase is only rejected when asked to check.
    let mut breached = CreateParams::new("top secret", "Password123");
    breached.check_breached = true;
    assert!(matches!(create(&client, &breached), Outcome::ValidationError { .. }));

    // Step 4: create for real.
    let params = CreateParams {
        secret: "top secret".to_string(),
        passphrase: "Hunter2Hunter2".to_string(),
        expire: ExpireToken::ThirtyMinutes,
        tries: 3,
        check_breached: true,
    };
    let Outcome::Created { link, expires_on } = create(&client, &params) else {
        panic!("expected created");
    };
    assert!(link.starts_with(&format!("{server}/r/")), "{link}");
    assert!(expires_on.ends_with("UTC"));

    // Step 5: wrong passphrase burns a try.
    let outcome = read(&link, "Wrong1234", Protocol::Current);
    let Outcome::RemoteError { message } = outcome else {
        panic!("expected remote error, got {outcome:?}");
    };
    assert!(message.ends_with("Number of tries remaining: 2"), "{message}");

    // Step 6: correct passphrase reveals the secret.
    assert_eq!(
        read(&link, "Hunter2Hunter2", Protocol::Current),
        Outcome::ReadSuccess {
            message: "top secret".to_string(),
        }
    );

    // Step 7: a second read finds nothing.
    assert!(matches!(
        read(&link, "Hunter2Hunter2", Protocol::Current),
        Outcome::RemoteError { .. }
    ));
}

#[test]
fn legacy_lifecycle() {
    let server = start_server();
    let client = ShhhClient::new(&server, Protocol::Legacy);

    // Legacy servers report errors as one flat string.
    let outcome = create(&client, &CreateParams::new("s", "weak"));
    let Outcome::RemoteError { message } = outcome else {
        panic!("expected remote error, got {outcome:?}");
    };
    assert!(message.contains("too weak"));

    let Outcome::Created { link, .. } = create(&client, &CreateParams::new("legacy secret", "Hunter2Hunter2"))
    else {
        panic!("expected created");
    };

    assert_eq!(
        read(&link, "Hunter2Hunter2", Protocol::Legacy),
        Outcome::ReadSuccess {
            message: "legacy secret".to_string(),
        }
    );
    assert!(matches!(
        read(&link, "Hunter2Hunter2", Protocol::Legacy),
        Outcome::RemoteError { .. }
    ));
}

#[test]
fn unknown_route_is_a_transport_error() {
    let server = start_server();
    let client = ShhhClient::new(&format!("{server}/missing-prefix"), Protocol::Current);
    let outcome = create(&client, &CreateParams::new("s", "Hunter2Hunter2"));
    assert_eq!(outcome, Outcome::TransportError { http_status: 404 });
}
