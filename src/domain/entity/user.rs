use serde::{Deserialize, Serialize};

/// UserLookupField はインポート行のユーザーIDを照合する列を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserLookupField {
    #[default]
    Id,
    IdNumber,
    Username,
}

impl std::fmt::Display for UserLookupField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id => write!(f, "id"),
            Self::IdNumber => write!(f, "idnumber"),
            Self::Username => write!(f, "username"),
        }
    }
}

impl UserLookupField {
    pub fn from_str_value(s: &str) -> anyhow::Result<Self> {
        match s {
            "id" => Ok(Self::Id),
            "idnumber" => Ok(Self::IdNumber),
            "username" => Ok(Self::Username),
            _ => anyhow::bail!("invalid user lookup field: {}", s),
        }
    }
}

/// User はユーザーを表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub idnumber: String,
    pub username: String,
}

impl User {
    pub fn new(id: i64, idnumber: &str, username: &str) -> Self {
        Self {
            id,
            idnumber: idnumber.to_string(),
            username: username.to_string(),
        }
    }

    pub fn matches(&self, field: UserLookupField, value: &str) -> bool {
        match field {
            UserLookupField::Id => value.parse::<i64>().is_ok_and(|id| id == self.id),
            UserLookupField::IdNumber => self.idnumber == value,
            UserLookupField::Username => self.username == value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_field_from_str() {
        assert_eq!(UserLookupField::from_str_value("id").unwrap(), UserLookupField::Id);
        assert_eq!(
            UserLookupField::from_str_value("username").unwrap(),
            UserLookupField::Username
        );
        assert!(UserLookupField::from_str_value("email").is_err());
    }

    #[test]
    fn test_matches() {
        let user = User::new(1, "U-1", "alice");
        assert!(user.matches(UserLookupField::Id, "1"));
        assert!(user.matches(UserLookupField::IdNumber, "U-1"));
        assert!(!user.matches(UserLookupField::Username, "bob"));
    }
}
