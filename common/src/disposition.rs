//! Content-Dispositionヘッダーからのファイル名抽出

use regex::Regex;

/// `filename="..."`（引用符なしも可）からファイル名を取り出す
///
/// 見つからない場合、または空の場合はNone。
pub fn filename_from_disposition(header: &str) -> Option<String> {
    lazy_static::lazy_static! {
        static ref FILENAME_RE: Regex = Regex::new(r#"(?i)\bfilename="?([^";]+)"?"#).unwrap();
    }

    FILENAME_RE
        .captures(header)
        .map(|cap| cap[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquoted_filename() {
        assert_eq!(
            filename_from_disposition("attachment; filename=report_1.json"),
            Some("report_1.json".to_string())
        );
    }

    #[test]
    fn test_quoted_filename() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="report 1.csv""#),
            Some("report 1.csv".to_string())
        );
    }

    #[test]
    fn test_filename_followed_by_parameter() {
        assert_eq!(
            filename_from_disposition("attachment; filename=a.json; size=10"),
            Some("a.json".to_string())
        );
    }

    #[test]
    fn test_missing_filename() {
        assert_eq!(filename_from_disposition("attachment"), None);
        assert_eq!(filename_from_disposition(""), None);
        assert_eq!(filename_from_disposition(r#"attachment; filename="""#), None);
    }
}
