//! Directory records and the fields derived from them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    dn::{self, OU_PREFIX},
    Result,
};
use ldapq_core::Error;

/// Group membership attribute.
pub const MEMBER_OF: &str = "memberOf";
/// Common name attribute.
pub const CN: &str = "cn";
/// Distinguished name attribute.
pub const DISTINGUISHED_NAME: &str = "distinguishedName";
/// Short logon name attribute.
pub const SAM_ACCOUNT_NAME: &str = "sAMAccountName";

/// Attribute table of a single directory entry.
///
/// Values keep the order in which the server returned them. Lookups try the exact attribute
/// name first and then fall back to an ASCII case-insensitive match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryRecord {
    attributes: HashMap<String, Vec<String>>,
}

impl DirectoryRecord {
    /// Wraps an attribute table.
    #[must_use]
    pub fn new(attributes: HashMap<String, Vec<String>>) -> Self {
        Self { attributes }
    }

    /// Returns all values for the attribute.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes
            .get(attribute)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
                    .map(|(_, values)| values)
            })
            .map(Vec::as_slice)
    }

    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.values(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }

    /// Returns true if the attribute is part of the record.
    #[must_use]
    pub fn contains(&self, attribute: &str) -> bool {
        self.values(attribute).is_some()
    }

    /// Number of attributes in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if the record has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterates over attributes in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.attributes
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Returns attributes sorted by name.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, &[String])> {
        let mut attributes = self.iter().collect::<Vec<_>>();
        attributes.sort_by(|(a, _), (b, _)| a.cmp(b));
        attributes
    }

    /// Consumes the record and returns the raw attribute table.
    #[must_use]
    pub fn into_inner(self) -> HashMap<String, Vec<String>> {
        self.attributes
    }

    /// Returns the single `cn` value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedValueCount`] when `cn` is absent or has more than one value;
    /// the message reports the actual count.
    pub fn full_name(&self) -> Result<&str> {
        self.single_value(CN)
    }

    /// Returns the single `sAMAccountName` value.
    ///
    /// # Errors
    ///
    /// Same rules as [`DirectoryRecord::full_name`].
    pub fn account_name(&self) -> Result<&str> {
        self.single_value(SAM_ACCOUNT_NAME)
    }

    /// Returns the raw `memberOf` values; empty when the attribute is absent.
    #[must_use]
    pub fn membership(&self) -> &[String] {
        self.values(MEMBER_OF).unwrap_or_default()
    }

    /// Returns the common names of the groups in `memberOf`.
    ///
    /// Values that do not start with `CN=` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttributeNotFound`] when the record has no `memberOf` attribute.
    pub fn membership_common_names(&self) -> Result<Vec<String>> {
        let groups = self
            .values(MEMBER_OF)
            .ok_or_else(|| Error::missing_attribute(MEMBER_OF))?;

        Ok(groups
            .iter()
            .map(String::as_str)
            .filter_map(dn::common_name)
            .map(str::to_string)
            .collect())
    }

    /// Returns the first `OU=` component of `distinguishedName`.
    ///
    /// # Errors
    ///
    /// - [`Error::AttributeNotFound`] when `distinguishedName` is absent
    /// - [`Error::EmptyAttribute`] when it carries no values
    /// - [`Error::MissingComponent`] when no component starts with `OU=`
    pub fn organizational_unit(&self) -> Result<String> {
        let values = self
            .values(DISTINGUISHED_NAME)
            .ok_or_else(|| Error::missing_attribute(DISTINGUISHED_NAME))?;
        let value = values.first().ok_or_else(|| Error::EmptyAttribute {
            attribute: DISTINGUISHED_NAME.to_string(),
        })?;

        dn::first_value_with_prefix(value, OU_PREFIX)
            .map(str::to_string)
            .ok_or_else(|| Error::MissingComponent {
                attribute: DISTINGUISHED_NAME.to_string(),
                prefix: OU_PREFIX.to_string(),
                value: value.clone(),
            })
    }

    fn single_value(&self, attribute: &str) -> Result<&str> {
        match self.values(attribute).unwrap_or_default() {
            [value] => Ok(value.as_str()),
            values => Err(Error::single_value_expected(attribute, values.len())),
        }
    }
}

impl From<HashMap<String, Vec<String>>> for DirectoryRecord {
    fn from(attributes: HashMap<String, Vec<String>>) -> Self {
        Self::new(attributes)
    }
}

impl FromIterator<(String, Vec<String>)> for DirectoryRecord {
    /// Repeated attribute names have their values appended in order.
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut attributes: HashMap<String, Vec<String>> = HashMap::new();
        for (name, values) in iter {
            attributes.entry(name).or_default().extend(values);
        }
        Self { attributes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldapq_core::ErrorKind;

    fn record(pairs: Vec<(&str, Vec<&str>)>) -> DirectoryRecord {
        pairs
            .into_iter()
            .map(|(name, values)| {
                (
                    name.to_string(),
                    values.into_iter().map(str::to_string).collect(),
                )
            })
            .collect()
    }

    fn sample_record() -> DirectoryRecord {
        record(vec![
            ("cn", vec!["Jane Doe"]),
            ("sAMAccountName", vec!["jdoe"]),
            (
                "distinguishedName",
                vec!["CN=Jane Doe,OU=Engineering,DC=corp,DC=example"],
            ),
            (
                "memberOf",
                vec!["CN=Admins,OU=Groups,DC=x,DC=y", "OU=NotAGroup,DC=x"],
            ),
        ])
    }

    #[test]
    fn full_name_single_value() {
        assert_eq!(sample_record().full_name().unwrap(), "Jane Doe");
    }

    #[test]
    fn full_name_zero_and_many_differ() {
        let missing = record(vec![("sn", vec!["Doe"])]).full_name().unwrap_err();
        let many = record(vec![("cn", vec!["Jane", "J. Doe"])]).full_name().unwrap_err();

        assert_eq!(missing.kind(), ErrorKind::Format);
        assert_eq!(many.kind(), ErrorKind::Format);
        assert_eq!(
            missing,
            Error::UnexpectedValueCount {
                attribute: "cn".to_string(),
                expected: 1,
                actual: 0
            }
        );
        assert!(matches!(
            many,
            Error::UnexpectedValueCount { actual: 2, .. }
        ));
        assert_ne!(missing.to_string(), many.to_string());
    }

    #[test]
    fn full_name_present_but_empty() {
        let err = record(vec![("cn", vec![])]).full_name().unwrap_err();
        assert!(matches!(err, Error::UnexpectedValueCount { actual: 0, .. }));
    }

    #[test]
    fn account_name_single_value() {
        assert_eq!(sample_record().account_name().unwrap(), "jdoe");
        assert!(record(vec![]).account_name().is_err());
    }

    #[test]
    fn membership_is_verbatim() {
        let rec = sample_record();
        assert_eq!(
            rec.membership(),
            ["CN=Admins,OU=Groups,DC=x,DC=y", "OU=NotAGroup,DC=x"]
        );
        assert!(record(vec![("cn", vec!["x"])]).membership().is_empty());
    }

    #[test]
    fn membership_common_names_skips_non_cn_values() {
        assert_eq!(
            sample_record().membership_common_names().unwrap(),
            vec!["Admins".to_string()]
        );
    }

    #[test]
    fn membership_common_names_keeps_order() {
        let rec = record(vec![(
            "memberOf",
            vec![
                "CN=Zeta,OU=Groups,DC=x",
                "CN=Alpha,OU=Groups,DC=x",
                "CN=Domain Users,CN=Users,DC=x",
            ],
        )]);
        assert_eq!(
            rec.membership_common_names().unwrap(),
            vec!["Zeta", "Alpha", "Domain Users"]
        );
    }

    #[test]
    fn membership_common_names_requires_attribute() {
        let err = record(vec![("cn", vec!["x"])])
            .membership_common_names()
            .unwrap_err();
        assert_eq!(err, Error::missing_attribute("memberOf"));
        assert_eq!(err.kind(), ErrorKind::Search);

        let empty = record(vec![("memberOf", vec![])]);
        assert!(empty.membership_common_names().unwrap().is_empty());
    }

    #[test]
    fn organizational_unit_from_dn() {
        assert_eq!(sample_record().organizational_unit().unwrap(), "Engineering");
    }

    #[test]
    fn organizational_unit_error_cases_are_distinct() {
        let absent = record(vec![("cn", vec!["x"])]).organizational_unit().unwrap_err();
        let empty = record(vec![("distinguishedName", vec![])])
            .organizational_unit()
            .unwrap_err();
        let no_ou = record(vec![("distinguishedName", vec!["CN=Jane,CN=Users,DC=corp"])])
            .organizational_unit()
            .unwrap_err();

        assert_eq!(absent.kind(), ErrorKind::Search);
        assert!(matches!(absent, Error::AttributeNotFound { .. }));
        assert_eq!(empty.kind(), ErrorKind::Format);
        assert!(matches!(empty, Error::EmptyAttribute { .. }));
        assert_eq!(no_ou.kind(), ErrorKind::Format);
        assert!(matches!(
            no_ou,
            Error::MissingComponent { ref prefix, .. } if prefix == "OU="
        ));
    }

    #[test]
    fn lookup_falls_back_to_case_insensitive_name() {
        let rec = record(vec![("memberof", vec!["CN=Ops,DC=x"]), ("CN", vec!["Ops Bot"])]);
        assert_eq!(rec.membership_common_names().unwrap(), vec!["Ops"]);
        assert_eq!(rec.full_name().unwrap(), "Ops Bot");
    }

    #[test]
    fn record_round_trip_preserves_values() {
        let raw: Vec<(String, Vec<String>)> = vec![
            ("cn".to_string(), vec!["Jane Doe".to_string()]),
            (
                "memberOf".to_string(),
                vec![
                    "CN=B,OU=Groups,DC=x".to_string(),
                    "CN=A,OU=Groups,DC=x".to_string(),
                ],
            ),
            (
                "proxyAddresses".to_string(),
                vec!["SMTP:jane@x".to_string(), "smtp:jd@x".to_string()],
            ),
        ];
        let rec: DirectoryRecord = raw.clone().into_iter().collect();

        for (name, values) in &raw {
            assert_eq!(rec.values(name).unwrap(), values.as_slice());
        }
        assert_eq!(rec.full_name().unwrap(), "Jane Doe");
        assert_eq!(rec.membership(), raw[1].1.as_slice());
        assert_eq!(rec.membership_common_names().unwrap(), vec!["B", "A"]);
        assert_eq!(rec.len(), 3);
    }

    #[test]
    fn repeated_names_are_appended() {
        let rec: DirectoryRecord = vec![
            ("mail".to_string(), vec!["a@x".to_string()]),
            ("mail".to_string(), vec!["b@x".to_string()]),
        ]
        .into_iter()
        .collect();
        assert_eq!(rec.values("mail").unwrap(), ["a@x", "b@x"]);
    }

    #[test]
    fn sorted_orders_by_name() {
        let rec = sample_record();
        let names = rec
            .sorted()
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["cn", "distinguishedName", "memberOf", "sAMAccountName"]
        );
    }

    #[test]
    fn serializes_as_plain_map() {
        let rec = record(vec![("cn", vec!["Jane Doe"])]);
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"cn":["Jane Doe"]}"#);
        let back: DirectoryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }
}
