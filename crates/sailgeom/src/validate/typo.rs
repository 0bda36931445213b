//! Keystroke distance between an entered value and a suggested one.

use crate::units::{display_digits, to_canonical_mm, Unit};

/// Levenshtein distance over chars.
pub(crate) fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let sub = prev[j] + usize::from(ca != cb);
            cur[j + 1] = sub.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Edits needed to turn the displayed `entered_mm` into the displayed `suggested_mm`.
/// A transposition of neighbouring digits counts as one edit.
pub(crate) fn keystrokes(entered_mm: f64, suggested_mm: f64, unit: Unit) -> usize {
    let a = display_digits(entered_mm, unit);
    let b = display_digits(suggested_mm, unit);
    if is_adjacent_swap(&a, &b) {
        return 1;
    }
    edit_distance(&a, &b)
}

/// Values (mm) one keystroke away from `mm` as displayed: a digit dropped,
/// a digit inserted, or two neighbouring digits swapped.
pub(crate) fn one_keystroke_variants(mm: f64, unit: Unit) -> Vec<f64> {
    fn push(out: &mut Vec<f64>, chars: &[char], unit: Unit) {
        let s: String = chars.iter().collect();
        if let Some(v) = s.parse::<f64>().ok().and_then(|v| to_canonical_mm(v, unit)) {
            out.push(v);
        }
    }
    let shown: Vec<char> = display_digits(mm, unit).chars().collect();
    let mut out = Vec::new();
    for i in 0..shown.len() {
        if shown[i].is_ascii_digit() {
            let mut c = shown.clone();
            c.remove(i);
            push(&mut out, &c, unit);
        }
    }
    for i in 0..=shown.len() {
        for d in '0'..='9' {
            let mut c = shown.clone();
            c.insert(i, d);
            push(&mut out, &c, unit);
        }
    }
    for i in 1..shown.len() {
        if shown[i - 1] != shown[i] && shown[i - 1].is_ascii_digit() && shown[i].is_ascii_digit() {
            let mut c = shown.clone();
            c.swap(i - 1, i);
            push(&mut out, &c, unit);
        }
    }
    out
}

fn is_adjacent_swap(a: &str, b: &str) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len() != b.len() {
        return false;
    }
    let diff: Vec<usize> = (0..a.len()).filter(|&i| a[i] != b[i]).collect();
    matches!(diff.as_slice(), [i, j] if *j == i + 1 && a[*i] == b[*j] && a[*j] == b[*i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_digit_is_one_edit() {
        assert_eq!(edit_distance("424", "4243"), 1);
        assert_eq!(keystrokes(424.0, 4242.64, Unit::Metric), 1);
    }

    #[test]
    fn swapped_digits_are_one_edit() {
        assert_eq!(edit_distance("3150", "3510"), 2);
        assert_eq!(keystrokes(3150.0, 3510.0, Unit::Metric), 1);
    }

    #[test]
    fn variants_cover_drop_insert_and_swap() {
        let v = one_keystroke_variants(485.0, Unit::Metric);
        assert!(v.contains(&4850.0));
        assert!(v.contains(&45.0));
        assert!(v.contains(&845.0));
        let inch = one_keystroke_variants(10.0 * 25.4, Unit::Imperial);
        assert!(inch.iter().any(|mm| (mm - 100.0 * 25.4).abs() < 1e-9));
    }

    #[test]
    fn unrelated_values_are_far() {
        assert_eq!(keystrokes(4243.0, 5985.0, Unit::Metric), 4);
        assert_eq!(edit_distance("", "12"), 2);
    }
}
