//! Japanese prefecture code utilities.
//!
//! Provides mappings between the two-digit JIS X 0401 prefecture codes
//! used to partition per-region datasets and the prefecture names found in
//! reverse-geocoded addresses.

/// Prefecture codes with their names, in code order.
pub const PREFECTURES: &[(&str, &str)] = &[
    ("01", "北海道"),
    ("02", "青森県"),
    ("03", "岩手県"),
    ("04", "宮城県"),
    ("05", "秋田県"),
    ("06", "山形県"),
    ("07", "福島県"),
    ("08", "茨城県"),
    ("09", "栃木県"),
    ("10", "群馬県"),
    ("11", "埼玉県"),
    ("12", "千葉県"),
    ("13", "東京都"),
    ("14", "神奈川県"),
    ("15", "新潟県"),
    ("16", "富山県"),
    ("17", "石川県"),
    ("18", "福井県"),
    ("19", "山梨県"),
    ("20", "長野県"),
    ("21", "岐阜県"),
    ("22", "静岡県"),
    ("23", "愛知県"),
    ("24", "三重県"),
    ("25", "滋賀県"),
    ("26", "京都府"),
    ("27", "大阪府"),
    ("28", "兵庫県"),
    ("29", "奈良県"),
    ("30", "和歌山県"),
    ("31", "鳥取県"),
    ("32", "島根県"),
    ("33", "岡山県"),
    ("34", "広島県"),
    ("35", "山口県"),
    ("36", "徳島県"),
    ("37", "香川県"),
    ("38", "愛媛県"),
    ("39", "高知県"),
    ("40", "福岡県"),
    ("41", "佐賀県"),
    ("42", "長崎県"),
    ("43", "熊本県"),
    ("44", "大分県"),
    ("45", "宮崎県"),
    ("46", "鹿児島県"),
    ("47", "沖縄県"),
];

/// Maps a two-digit code to the prefecture name.
///
/// Returns `None` for unrecognized codes.
#[must_use]
pub fn name(code: &str) -> Option<&'static str> {
    PREFECTURES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Whether `code` is one of the 47 prefecture codes.
#[must_use]
pub fn is_valid(code: &str) -> bool {
    name(code).is_some()
}

/// Finds the prefecture named in a free-form address.
///
/// Returns the code of the first prefecture (in code order) whose full
/// name occurs anywhere in `address`.
#[must_use]
pub fn code_from_address(address: &str) -> Option<&'static str> {
    PREFECTURES
        .iter()
        .find(|(_, name)| address.contains(name))
        .map(|(code, _)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefecture_count() {
        assert_eq!(PREFECTURES.len(), 47);
    }

    #[test]
    fn codes_are_sequential() {
        for (i, (code, _)) in PREFECTURES.iter().enumerate() {
            assert_eq!(*code, format!("{:02}", i + 1));
        }
    }

    #[test]
    fn name_roundtrip() {
        for (code, prefecture) in PREFECTURES {
            assert_eq!(name(code), Some(*prefecture));
            assert_eq!(code_from_address(prefecture), Some(*code));
        }
    }

    #[test]
    fn finds_prefecture_in_address() {
        assert_eq!(
            code_from_address("日本、〒100-0005 東京都千代田区丸の内１丁目"),
            Some("13")
        );
        assert_eq!(code_from_address("大阪府大阪市北区梅田3丁目"), Some("27"));
        assert_eq!(code_from_address("Somewhere else"), None);
    }

    #[test]
    fn unknown_code() {
        assert_eq!(name("48"), None);
        assert!(!is_valid("00"));
        assert!(is_valid("01"));
    }
}
