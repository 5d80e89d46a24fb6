//! User identity

use std::fmt;
use std::str::FromStr;

/// Identifier of a user, backed by a UUID.
///
/// The canonical text form is lowercase and hyphenated
/// (`ab30308e-de0f-47df-9b51-55b9af86213d`). Byte-wise ordering of that text
/// matches the ordering of the underlying value, so stores that persist the
/// text and sort on it agree with [`Ord`] for `UserId`.
///
/// The nil UUID is not a valid user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(uuid::Uuid);

impl UserId {
    /// Generate a fresh random identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use cupid_domain::UserId;
    ///
    /// let a = UserId::random();
    /// let b = UserId::random();
    /// assert_ne!(a, b);
    /// ```
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Build an identifier from its raw 128-bit value
    ///
    /// # Errors
    /// Returns [`InvalidUserId`] for the nil value.
    pub fn from_u128(value: u128) -> Result<Self, InvalidUserId> {
        if value == 0 {
            return Err(InvalidUserId::nil());
        }
        Ok(Self(uuid::Uuid::from_u128(value)))
    }

    /// Parse an identifier from any RFC 4122 textual form
    ///
    /// # Examples
    ///
    /// ```
    /// use cupid_domain::UserId;
    ///
    /// let id = UserId::parse("AB30308E-DE0F-47DF-9B51-55B9AF86213D").unwrap();
    /// assert_eq!(id.to_string(), "ab30308e-de0f-47df-9b51-55b9af86213d");
    /// assert!(UserId::parse("not-a-user").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, InvalidUserId> {
        let uuid = uuid::Uuid::parse_str(s.trim()).map_err(|e| InvalidUserId {
            reason: format!("'{}' is not a UUID: {}", s, e),
        })?;
        if uuid.is_nil() {
            return Err(InvalidUserId::nil());
        }
        Ok(Self(uuid))
    }

    /// Raw 128-bit value
    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for UserId {
    type Err = InvalidUserId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A string that does not identify a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidUserId {
    reason: String,
}

impl InvalidUserId {
    fn nil() -> Self {
        Self {
            reason: "the nil UUID is reserved".to_string(),
        }
    }

    /// Human readable reason
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for InvalidUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid user id: {}", self.reason)
    }
}

impl std::error::Error for InvalidUserId {}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Text ordering agrees with value ordering, which keyset pagination relies on
        #[test]
        fn test_text_order_matches_value_order(a in 1u128.., b in 1u128..) {
            let id_a = UserId::from_u128(a).unwrap();
            let id_b = UserId::from_u128(b).unwrap();

            prop_assert_eq!(id_a.cmp(&id_b), id_a.to_string().cmp(&id_b.to_string()));
            prop_assert_eq!(id_a < id_b, a < b);
        }

        #[test]
        fn test_text_roundtrip(value in 1u128..) {
            let id = UserId::from_u128(value).unwrap();
            prop_assert_eq!(UserId::parse(&id.to_string()).unwrap(), id);
        }
    }
}
