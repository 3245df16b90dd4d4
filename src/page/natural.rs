use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Compares two strings in natural order
///
/// Runs of ASCII digits compare as integers, every other character compares by
/// code point, and a string that runs out first sorts first. Digit runs of any
/// length are supported: leading zeros are skipped and the remaining digits
/// are compared by length, then lexically.
///
/// Strings that only differ in leading zeros are ordered by the first digit
/// run whose zero padding differs (less padding first), then by plain string
/// order, so the result is a total order.
///
/// # Examples
///
/// ```
/// use magz::page::natural_cmp;
/// use std::cmp::Ordering;
///
/// assert_eq!(natural_cmp("page2.jpg", "page10.jpg"), Ordering::Less);
/// ```
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    let mut padding = Ordering::Equal;

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                match compare_numeric(&l_run, &r_run) {
                    Ordering::Equal => {
                        if padding == Ordering::Equal {
                            padding = l_run.len().cmp(&r_run.len());
                        }
                    }
                    other => return other,
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => break,
        }
    }

    padding.then_with(|| a.cmp(b))
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
