//! Search filter construction.

use ldap3::ldap_escape;

/// Builds the filter that selects a user entry by `sAMAccountName`.
///
/// The account name is escaped, so `j*` matches the literal account `j*` and never acts as a
/// wildcard.
#[must_use]
pub fn account_filter(account_name: &str) -> String {
    format!(
        "(&(objectClass=user)(sAMAccountName={}))",
        ldap_escape(account_name)
    )
}
