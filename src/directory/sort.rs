// 📊 Ranking - deterministic directory order
//
// Keys, compared lexicographically:
// 1. top pick, descending
// 2. alliance rating, descending (missing / non-finite = 0)
// 3. name, ascending, collated for locale "en"
//
// Collation for "en": diacritics and case are ignored at the primary level
// ("Ärgen" sorts with "Argen", before "Zeta"); ties fall back to the
// case-folded name and then the raw name so the order is total.

use super::record::BankRecord;
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Locale the name collation follows
pub const COLLATION_LOCALE: &str = "en";

/// Latin letters with no canonical decomposition and their "en" base letters
const LETTER_FOLDS: &[(char, &str)] = &[
    ('ø', "o"),
    ('ł', "l"),
    ('đ', "d"),
    ('ð', "d"),
    ('ħ', "h"),
    ('ı', "i"),
    ('æ', "ae"),
    ('œ', "oe"),
    ('þ', "th"),
    ('ß', "ss"),
];

/// Lowercase, canonically decomposed, combining marks removed, stroke and
/// ligature letters spelled out
pub fn fold_diacritics(input: &str) -> String {
    let mut folded = String::with_capacity(input.len());
    let letters = input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase);

    for c in letters {
        match LETTER_FOLDS.iter().find(|(letter, _)| *letter == c) {
            Some((_, base)) => folded.push_str(base),
            None => folded.push(c),
        }
    }
    folded
}

/// Name comparison used for ranking
pub fn collate_names(a: &str, b: &str) -> Ordering {
    fold_diacritics(a)
        .cmp(&fold_diacritics(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Full ranking comparator
pub fn compare_ranked(a: &BankRecord, b: &BankRecord) -> Ordering {
    b.top_pick
        .cmp(&a.top_pick)
        .then_with(|| b.rating_score().total_cmp(&a.rating_score()))
        .then_with(|| collate_names(&a.name, &b.name))
}

/// Stable sort: records that compare equal keep their input order
pub fn sort_in_place(records: &mut [BankRecord]) {
    records.sort_by(compare_ranked);
}

pub fn sort(mut records: Vec<BankRecord>) -> Vec<BankRecord> {
    sort_in_place(&mut records);
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(records: &[BankRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_fold_diacritics() {
        assert_eq!(fold_diacritics("Ärgen Bänk"), "argen bank");
        assert_eq!(fold_diacritics("CRÉDIT"), "credit");
        assert_eq!(fold_diacritics("Straße"), "strasse");
        assert_eq!(fold_diacritics("Øko Łąka"), "oko laka");
        assert_eq!(fold_diacritics("Æbleø Œuvre Þing Đak"), "aebleo oeuvre thing dak");
    }

    #[test]
    fn test_locale_name_order() {
        let records = vec![
            BankRecord::new("1", "Zeta Bank"),
            BankRecord::new("2", "Ärgen Bank"),
            BankRecord::new("3", "beta bank"),
            BankRecord::new("4", "Øko Bank"),
            BankRecord::new("5", "Łąka Bank"),
        ];
        assert_eq!(
            names(&sort(records)),
            vec!["Ärgen Bank", "beta bank", "Łąka Bank", "Øko Bank", "Zeta Bank"]
        );
    }

    #[test]
    fn test_top_pick_then_rating_then_name() {
        let records = vec![
            BankRecord::new("1", "Alpha").ranked(false, Some(9.0)),
            BankRecord::new("2", "Bravo").ranked(true, Some(1.0)),
            BankRecord::new("3", "Charlie").ranked(true, Some(5.0)),
            BankRecord::new("4", "Delta").ranked(false, None),
            BankRecord::new("5", "Echo").ranked(false, Some(9.0)),
        ];
        assert_eq!(
            names(&sort(records)),
            vec!["Charlie", "Bravo", "Alpha", "Echo", "Delta"]
        );
    }

    #[test]
    fn test_missing_rating_equals_zero() {
        let records = vec![
            BankRecord::new("1", "Bank B").ranked(false, Some(0.0)),
            BankRecord::new("2", "Bank A").ranked(false, None),
            BankRecord::new("3", "Bank C").ranked(false, Some(f64::NAN)),
        ];
        assert_eq!(names(&sort(records)), vec!["Bank A", "Bank B", "Bank C"]);
    }

    #[test]
    fn test_equal_records_keep_input_order() {
        let records = vec![
            BankRecord::new("first", "Same"),
            BankRecord::new("second", "Same"),
            BankRecord::new("third", "Same"),
        ];
        let ids: Vec<String> = sort(records).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_case_only_difference_is_total() {
        assert_eq!(collate_names("bank", "Bank"), Ordering::Greater);
        assert_eq!(collate_names("Bank", "bank"), Ordering::Less);
        assert_eq!(collate_names("Bank", "Bank"), Ordering::Equal);
    }

    #[test]
    fn test_sort_idempotent() {
        let records = vec![
            BankRecord::new("1", "Öko Bank").ranked(false, Some(2.0)),
            BankRecord::new("2", "oko bank").ranked(false, Some(2.0)),
            BankRecord::new("3", "Alpha").ranked(true, None),
        ];
        let once = sort(records);
        let twice = sort(once.clone());
        assert_eq!(once, twice);
    }
}
