use serde::{Deserialize, Serialize};
use std::fmt;

/// UI field kind derived from a SQL column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Number,
    Date,
    Datetime,
    Select,
    Time,
    String,
}

impl FieldKind {
    pub const ALL: [FieldKind; 6] = [
        FieldKind::Number,
        FieldKind::Date,
        FieldKind::Datetime,
        FieldKind::Select,
        FieldKind::Time,
        FieldKind::String,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Datetime => "datetime",
            FieldKind::Select => "select",
            FieldKind::Time => "time",
            FieldKind::String => "string",
        }
    }

    /// Parse a field kind name as written in a field definition
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL type keyword, with length/precision stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlKeyword {
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    Integer,
    BigInt,
    Date,
    Datetime,
    Timestamp,
    Bit,
    Bool,
    Boolean,
    Time,
    Decimal,
    Float,
    Double,
    /// Any keyword without a dedicated mapping (varchar, text, blob, ...)
    Other(String),
}

impl SqlKeyword {
    /// Parse `varchar(255)`, ` INT `, `decimal(10,2)` and the like
    pub fn parse(sql_type: &str) -> Self {
        let keyword = sql_type
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        match keyword.as_str() {
            "tinyint" => SqlKeyword::TinyInt,
            "smallint" => SqlKeyword::SmallInt,
            "mediumint" => SqlKeyword::MediumInt,
            "int" => SqlKeyword::Int,
            "integer" => SqlKeyword::Integer,
            "bigint" => SqlKeyword::BigInt,
            "date" => SqlKeyword::Date,
            "datetime" => SqlKeyword::Datetime,
            "timestamp" => SqlKeyword::Timestamp,
            "bit" => SqlKeyword::Bit,
            "bool" => SqlKeyword::Bool,
            "boolean" => SqlKeyword::Boolean,
            "time" => SqlKeyword::Time,
            "decimal" => SqlKeyword::Decimal,
            "float" => SqlKeyword::Float,
            "double" => SqlKeyword::Double,
            _ => SqlKeyword::Other(keyword),
        }
    }

    pub fn field_kind(&self) -> FieldKind {
        match self {
            SqlKeyword::TinyInt
            | SqlKeyword::SmallInt
            | SqlKeyword::MediumInt
            | SqlKeyword::Int
            | SqlKeyword::Integer
            | SqlKeyword::BigInt => FieldKind::Number,
            SqlKeyword::Date => FieldKind::Date,
            SqlKeyword::Datetime | SqlKeyword::Timestamp => FieldKind::Datetime,
            SqlKeyword::Bit | SqlKeyword::Bool | SqlKeyword::Boolean => FieldKind::Select,
            SqlKeyword::Time => FieldKind::Time,
            // Fractional numbers are typed in as text
            SqlKeyword::Decimal | SqlKeyword::Float | SqlKeyword::Double => FieldKind::String,
            // Unknown types fall back to a plain text field
            SqlKeyword::Other(_) => FieldKind::String,
        }
    }
}

/// Map a raw SQL column type to a field kind. Never fails.
pub fn classify(sql_type: &str) -> FieldKind {
    SqlKeyword::parse(sql_type).field_kind()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_family() {
        for t in ["tinyint", "smallint", "mediumint", "int", "integer", "bigint"] {
            assert_eq!(classify(t), FieldKind::Number, "{}", t);
        }
        assert_eq!(classify("int(11)"), FieldKind::Number);
        assert_eq!(classify("BIGINT(20) "), FieldKind::Number);
    }

    #[test]
    fn test_temporal_and_boolean_types() {
        assert_eq!(classify("date"), FieldKind::Date);
        assert_eq!(classify("datetime"), FieldKind::Datetime);
        assert_eq!(classify("timestamp"), FieldKind::Datetime);
        assert_eq!(classify("time"), FieldKind::Time);
        assert_eq!(classify("bit(1)"), FieldKind::Select);
        assert_eq!(classify("bool"), FieldKind::Select);
        assert_eq!(classify("boolean"), FieldKind::Select);
    }

    #[test]
    fn test_length_suffix_is_ignored() {
        assert_eq!(classify("varchar(255)"), classify("varchar"));
        assert_eq!(classify("varchar"), FieldKind::String);
        assert_eq!(classify("decimal(10,2)"), FieldKind::String);
    }

    #[test]
    fn test_unknown_types_fall_back_to_string() {
        assert_eq!(SqlKeyword::parse("geometry"), SqlKeyword::Other("geometry".to_string()));
        assert_eq!(classify("geometry"), FieldKind::String);
        assert_eq!(classify(""), FieldKind::String);
        assert_eq!(classify("(("), FieldKind::String);
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in FieldKind::ALL {
            assert_eq!(FieldKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(FieldKind::from_name("table_list"), None);
    }
}
