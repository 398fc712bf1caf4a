use whub_kernel::security::resource::ResourceGuard;

#[test]
fn resource_guard_strips_the_table_prefix() {
    assert_eq!(ResourceGuard::verify("listing:7dHk2mQ", "listing").unwrap(), "7dHk2mQ");
    assert_eq!(ResourceGuard::verify("7dHk2mQ", "listing").unwrap(), "7dHk2mQ");
}

#[test]
fn resource_guard_rejects_foreign_or_malformed_ids() {
    assert!(ResourceGuard::verify("product:7dHk2mQ", "listing").is_err());
    assert!(ResourceGuard::verify("listing:", "listing").is_err());
    assert!(ResourceGuard::verify("", "listing").is_err());
    assert!(ResourceGuard::verify("abc;DELETE", "listing").is_err());
    assert!(ResourceGuard::verify("l0O1", "listing").is_err());
}
