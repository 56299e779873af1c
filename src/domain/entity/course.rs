use serde::{Deserialize, Serialize};

/// CourseLookupField はインポート行のコースIDを照合する列を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseLookupField {
    #[default]
    Id,
    IdNumber,
    ShortName,
}

impl std::fmt::Display for CourseLookupField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id => write!(f, "id"),
            Self::IdNumber => write!(f, "idnumber"),
            Self::ShortName => write!(f, "shortname"),
        }
    }
}

impl CourseLookupField {
    pub fn from_str_value(s: &str) -> anyhow::Result<Self> {
        match s {
            "id" => Ok(Self::Id),
            "idnumber" => Ok(Self::IdNumber),
            "shortname" => Ok(Self::ShortName),
            _ => anyhow::bail!("invalid course lookup field: {}", s),
        }
    }
}

/// Course はコースを表す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub idnumber: String,
    pub shortname: String,
    pub fullname: String,
}

impl Course {
    pub fn new(id: i64, idnumber: &str, shortname: &str, fullname: &str) -> Self {
        Self {
            id,
            idnumber: idnumber.to_string(),
            shortname: shortname.to_string(),
            fullname: fullname.to_string(),
        }
    }

    /// 指定列の値が一致するかを返す。
    pub fn matches(&self, field: CourseLookupField, value: &str) -> bool {
        match field {
            CourseLookupField::Id => value.parse::<i64>().is_ok_and(|id| id == self.id),
            CourseLookupField::IdNumber => self.idnumber == value,
            CourseLookupField::ShortName => self.shortname == value,
        }
    }
}
