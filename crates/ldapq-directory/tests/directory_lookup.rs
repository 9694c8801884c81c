//! Integration tests for record lookup.
//!
//! The live tests talk to a real directory and only run when the `LDAPQ_TEST_*` variables are
//! set:
//!
//! - `LDAPQ_TEST_ADDR` - `host:port` of the directory
//! - `LDAPQ_TEST_SUFFIX` - account suffix, e.g. `@corp.example`
//! - `LDAPQ_TEST_BASE_DN` - search base
//! - `LDAPQ_TEST_USER` / `LDAPQ_TEST_PASSWORD` - bind account, also used as the queried account
//! - `LDAPQ_TEST_INSECURE` - set to `1` to skip TLS verification

use std::env;
use std::time::Duration;

use ldapq_directory::{
    account_filter, BindCredentials, DirectoryClient, DirectoryConfig, DirectoryRecord, Error,
    ErrorKind,
};
use tokio::net::TcpListener;

struct LiveSettings {
    addr: String,
    suffix: String,
    base_dn: String,
    user: String,
    password: String,
    insecure: bool,
}

fn live_settings() -> Option<LiveSettings> {
    Some(LiveSettings {
        addr: env::var("LDAPQ_TEST_ADDR").ok()?,
        suffix: env::var("LDAPQ_TEST_SUFFIX").ok()?,
        base_dn: env::var("LDAPQ_TEST_BASE_DN").ok()?,
        user: env::var("LDAPQ_TEST_USER").ok()?,
        password: env::var("LDAPQ_TEST_PASSWORD").ok()?,
        insecure: env::var("LDAPQ_TEST_INSECURE").is_ok_and(|v| v == "1"),
    })
}

fn live_client(settings: &LiveSettings) -> DirectoryClient {
    let config = DirectoryConfig::new(&settings.addr, &settings.base_dn, &settings.suffix)
        .unwrap()
        .with_tls_verification(!settings.insecure);
    DirectoryClient::new(config).unwrap()
}

#[test]
fn record_from_raw_pairs_round_trips_through_accessors() {
    let raw = vec![
        ("cn".to_string(), vec!["Jane Doe".to_string()]),
        ("sAMAccountName".to_string(), vec!["jdoe".to_string()]),
        (
            "distinguishedName".to_string(),
            vec!["CN=Jane Doe,OU=Engineering,DC=corp,DC=example".to_string()],
        ),
        (
            "memberOf".to_string(),
            vec![
                "CN=Admins,OU=Groups,DC=x,DC=y".to_string(),
                "OU=NotAGroup,DC=x".to_string(),
            ],
        ),
    ];
    let record: DirectoryRecord = raw.clone().into_iter().collect();

    for (name, values) in &raw {
        assert_eq!(record.values(name).unwrap(), values.as_slice());
    }
    assert_eq!(record.full_name().unwrap(), "Jane Doe");
    assert_eq!(record.account_name().unwrap(), "jdoe");
    assert_eq!(record.organizational_unit().unwrap(), "Engineering");
    assert_eq!(record.membership(), raw[3].1.as_slice());
    assert_eq!(record.membership_common_names().unwrap(), vec!["Admins"]);
}

#[test]
fn account_filter_shape() {
    assert_eq!(
        account_filter("jdoe"),
        "(&(objectClass=user)(sAMAccountName=jdoe))"
    );
}

#[tokio::test]
async fn silent_server_times_out_as_network_error() {
    // Accepts connections into the backlog and never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = DirectoryConfig::new(format!("ldap://{addr}"), "DC=corp,DC=example", "@corp")
        .unwrap()
        .with_connection_timeout_secs(1)
        .with_operation_timeout_secs(1);
    let client = DirectoryClient::new(config).unwrap();
    let credentials = BindCredentials::new("jdoe", "password");

    let err = tokio::time::timeout(
        Duration::from_secs(10),
        client.fetch_record(&credentials, "jdoe"),
    )
    .await
    .expect("lookup was not bounded by the configured timeouts")
    .unwrap_err();

    assert!(matches!(err, Error::Timeout(_)), "unexpected error: {err:?}");
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.is_transient());
    drop(listener);
}

#[tokio::test]
async fn live_full_record() {
    let Some(settings) = live_settings() else {
        eprintln!("LDAPQ_TEST_* not set, skipping");
        return;
    };

    let client = live_client(&settings);
    let credentials = BindCredentials::new(&settings.user, &settings.password);
    let record = client
        .fetch_record(&credentials, &settings.user)
        .await
        .unwrap();

    assert!(record
        .account_name()
        .unwrap()
        .eq_ignore_ascii_case(&settings.user));
    assert!(!record.full_name().unwrap().is_empty());
}

#[tokio::test]
async fn live_wrong_password_is_auth_error() {
    let Some(settings) = live_settings() else {
        eprintln!("LDAPQ_TEST_* not set, skipping");
        return;
    };

    let client = live_client(&settings);
    let credentials = BindCredentials::new(&settings.user, format!("{}-wrong", settings.password));
    for _ in 0..3 {
        let err = client
            .fetch_record(&credentials, &settings.user)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
    }
}

#[tokio::test]
async fn live_unknown_account_is_not_found() {
    let Some(settings) = live_settings() else {
        eprintln!("LDAPQ_TEST_* not set, skipping");
        return;
    };

    let client = live_client(&settings);
    let credentials = BindCredentials::new(&settings.user, &settings.password);
    let err = client
        .fetch_record(&credentials, "ldapq-no-such-account-7f3a")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");
}
