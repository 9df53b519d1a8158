// ABOUTME: Property tests for request parsing at the webhook boundary.
// ABOUTME: Port mappings and encoded credentials survive arbitrary valid input.

use hookd::source::Credentials;
use hookd::types::{PortBinding, PortBindingError, parse_port_bindings};
use hookd::webhook::{RequestError, decode_auth, encode_auth, parse_request};
use proptest::prelude::*;

proptest! {
    #[test]
    fn valid_mappings_parse_to_their_numbers(host in any::<u16>(), container in any::<u16>()) {
        let binding = PortBinding::parse(&format!("{host}:{container}")).unwrap();
        prop_assert_eq!(binding, PortBinding::new(host, container));
        prop_assert_eq!(binding.to_string(), format!("{host}:{container}"));
    }

    #[test]
    fn out_of_range_ports_are_rejected(port in 65536u32..1_000_000) {
        let spec = format!("{port}:80");
        let is_invalid_port = matches!(
            PortBinding::parse(&spec),
            Err(PortBindingError::InvalidPort { .. })
        );
        prop_assert!(is_invalid_port);
    }

    #[test]
    fn repeating_a_container_port_is_rejected(a in 1u16.., b in 1u16.., container in 1u16..) {
        let specs = [format!("{a}:{container}"), format!("{b}:{container}")];
        prop_assert_eq!(
            parse_port_bindings(&specs),
            Err(PortBindingError::DuplicateContainerPort(container))
        );
    }

    #[test]
    fn distinct_container_ports_keep_their_order(ports in prop::collection::hash_set(1u16.., 0..8)) {
        let ports: Vec<u16> = ports.into_iter().collect();
        let specs: Vec<String> = ports.iter().map(|p| format!("{}:{}", p, p)).collect();
        let parsed = parse_port_bindings(&specs).unwrap();
        let containers: Vec<u16> = parsed.iter().map(|b| b.container_port).collect();
        prop_assert_eq!(containers, ports);
    }

    #[test]
    fn encoded_tokens_decode_back(token in "[A-Za-z0-9_-]{3,40}") {
        let creds = Credentials::Token(token);
        let decoded = decode_auth(&encode_auth(&creds)).unwrap();
        prop_assert_eq!(decoded, Some(creds));
    }

    #[test]
    fn basic_password_may_contain_colons(
        user in "[a-z]{1,12}",
        password in "[a-zA-Z0-9:]{1,20}",
    ) {
        let creds = Credentials::Basic { username: user, password };
        let decoded = decode_auth(&encode_auth(&creds)).unwrap();
        prop_assert_eq!(decoded, Some(creds));
    }

    #[test]
    fn bad_port_fails_before_auth_is_looked_at(garbage in "[^:0-9]{1,10}") {
        // The auth value is not valid base64 either; the port error must win.
        let result = parse_request("github.com/acme/app", "abcd", &[garbage], Some("!!!"));
        let is_port_error = matches!(result, Err(RequestError::Ports(_)));
        prop_assert!(is_port_error);
    }
}
