use std::sync::LazyLock;

use regex::Regex;

/// 数字のみで構成される文字列（ASCII 数字）。
static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("digit pattern must compile"));

/// Unix エポック秒として妥当な桁数。
const TIMESTAMP_WIDTH: usize = 10;

fn is_digits(value: &str) -> bool {
    !value.is_empty() && DIGITS.is_match(value)
}

/// ID 列は空文字列と "0" を未指定として扱う。
fn is_id(value: &str) -> bool {
    value != "0" && is_digits(value)
}

/// タイムスタンプが数値かつ10桁であるかを返す。
/// 範囲や暦の妥当性は検証しない。
pub fn is_valid_timestamp(value: &str) -> bool {
    value.parse::<u64>().is_ok() && value.len() == TIMESTAMP_WIDTH
}

/// インポート行が (userId, courseId, timestamp) の形式を満たすかを検証する。
/// どの列が不正だったかは区別しない。
pub fn validate_import_record<S: AsRef<str>>(fields: &[S]) -> bool {
    let [user_id, course_id, timestamp, ..] = fields else {
        return false;
    };
    let timestamp = timestamp.as_ref();

    is_id(user_id.as_ref())
        && is_id(course_id.as_ref())
        && is_digits(timestamp)
        && is_valid_timestamp(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_record() {
        assert!(validate_import_record(&["1", "10", "1700000000"]));
        assert!(validate_import_record(&["123456", "7", "0000000001"]));
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        assert!(validate_import_record(&["1", "10", "1700000000", "note"]));
    }

    #[test]
    fn test_empty_fields_rejected() {
        assert!(!validate_import_record(&["", "10", "1700000000"]));
        assert!(!validate_import_record(&["1", "", "1700000000"]));
        assert!(!validate_import_record(&["1", "10", ""]));
    }

    #[test]
    fn test_zero_ids_rejected() {
        assert!(!validate_import_record(&["0", "10", "1700000000"]));
        assert!(!validate_import_record(&["1", "0", "1700000000"]));
        assert!(validate_import_record(&["00", "10", "1700000000"]));
        assert!(validate_import_record(&["1", "10", "0000000000"]));
    }

    #[test]
    fn test_non_digit_fields_rejected() {
        assert!(!validate_import_record(&["a1", "10", "1700000000"]));
        assert!(!validate_import_record(&["1", "1.0", "1700000000"]));
        assert!(!validate_import_record(&["1", "10", "abc"]));
        assert!(!validate_import_record(&["-1", "10", "1700000000"]));
        assert!(!validate_import_record(&[" 1", "10", "1700000000"]));
        // 全角数字は数字として扱わない
        assert!(!validate_import_record(&["１", "10", "1700000000"]));
    }

    #[test]
    fn test_timestamp_width() {
        assert!(!validate_import_record(&["1", "10", "170000000"]));
        assert!(!validate_import_record(&["1", "10", "17000000000"]));
        assert!(is_valid_timestamp("1700000000"));
        assert!(!is_valid_timestamp("1e10000000"));
    }

    #[test]
    fn test_short_rows_rejected() {
        assert!(!validate_import_record(&["1", "10"]));
        assert!(!validate_import_record::<&str>(&[]));
    }
}
