use credo::trust::TrustStore;
use credo::CredoError;
use tempfile::tempdir;

fn test_certificate_pem() -> String {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
        .expect("certificate should generate");
    certified.cert.pem()
}

#[test]
fn test_open_creates_missing_store() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("truststore.enc");

    let store = TrustStore::open(&path, "changeit").expect("store should open");
    assert!(path.exists());
    assert_eq!(store.certificate_count(), 0);
}

#[test]
fn test_add_certificate_persists_across_reopen() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("truststore.enc");
    let pem = test_certificate_pem();

    let mut store = TrustStore::open(&path, "changeit").expect("store should open");
    store
        .add_certificate(pem.as_bytes(), "test")
        .expect("certificate should add");
    assert_eq!(store.certificate_count(), 1);

    let reopened = TrustStore::open(&path, "changeit").expect("store should reopen");
    assert_eq!(reopened.certificate_count(), 1);
    assert!(reopened.contains("test"));
}

#[test]
fn test_same_alias_overwrites() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("truststore.enc");

    let mut store = TrustStore::open(&path, "changeit").expect("store should open");
    store
        .add_certificate(test_certificate_pem().as_bytes(), "test")
        .expect("first certificate should add");
    store
        .add_certificate(test_certificate_pem().as_bytes(), "test")
        .expect("second certificate should add");

    assert_eq!(store.certificate_count(), 1);
}

#[test]
fn test_distinct_aliases_accumulate() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("truststore.enc");

    let mut store = TrustStore::open(&path, "changeit").expect("store should open");
    store
        .add_certificate(test_certificate_pem().as_bytes(), "gateway")
        .expect("certificate should add");
    store
        .add_certificate(test_certificate_pem().as_bytes(), "mirror")
        .expect("certificate should add");

    assert_eq!(store.certificate_count(), 2);
    assert_eq!(store.aliases(), vec!["gateway", "mirror"]);
}

#[test]
fn test_invalid_certificate_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("truststore.enc");

    let mut store = TrustStore::open(&path, "changeit").expect("store should open");
    let err = store
        .add_certificate(b"definitely not a certificate", "bogus")
        .expect_err("garbage should be rejected");
    assert!(matches!(err, CredoError::CertificateParse(_)));
    assert_eq!(store.certificate_count(), 0);
}

#[test]
fn test_wrong_password_is_corrupt() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("truststore.enc");

    let mut store = TrustStore::open(&path, "first-password").expect("store should open");
    store
        .add_certificate(test_certificate_pem().as_bytes(), "test")
        .expect("certificate should add");

    let err = TrustStore::open(&path, "other-password").expect_err("wrong password");
    assert!(matches!(err, CredoError::TrustStoreCorrupt(_)));
}

#[test]
fn test_garbage_file_is_corrupt() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("truststore.enc");
    std::fs::write(&path, b"junk that is no container").expect("write");

    let err = TrustStore::open(&path, "changeit").expect_err("garbage file");
    assert!(matches!(err, CredoError::TrustStoreCorrupt(_)));
}

#[test]
fn test_change_password_reencrypts() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("truststore.enc");

    let mut store = TrustStore::open(&path, "old-password").expect("store should open");
    store
        .add_certificate(test_certificate_pem().as_bytes(), "test")
        .expect("certificate should add");
    store
        .change_password("new-password")
        .expect("password should change");

    let reopened = TrustStore::open(&path, "new-password").expect("new password works");
    assert!(reopened.contains("test"));

    let err = TrustStore::open(&path, "old-password").expect_err("old password fails");
    assert!(matches!(err, CredoError::TrustStoreCorrupt(_)));
}

#[test]
fn test_client_builder_accepts_stored_certificates() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("truststore.enc");

    let mut store = TrustStore::open(&path, "changeit").expect("store should open");
    store
        .add_certificate(test_certificate_pem().as_bytes(), "test")
        .expect("certificate should add");

    let client = store
        .client_builder(Some("TLSv1.2"))
        .expect("builder should build")
        .build();
    assert!(client.is_ok());
}

#[test]
fn test_client_builder_substitutes_unknown_protocol() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("truststore.enc");

    let store = TrustStore::open(&path, "changeit").expect("store should open");
    // An unsupported protocol name falls back to the transport default
    // instead of failing.
    let builder = store.client_builder(Some("SSLv3"));
    assert!(builder.is_ok());
}
