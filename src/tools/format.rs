use chrono::{DateTime, Datelike, Timelike, Utc};

/// Expands a dump file name pattern.
///
/// `%n` is the database name, `%Y` (or `%y`) the year, `%m` and `%d` the
/// unpadded month and day, `%H`, `%M` and `%S` the two-digit hour, minute
/// and second, and `%%` a literal `%`. Unknown directives are dropped.
pub fn dump_name(pattern: &str, dbname: &str, tm: DateTime<Utc>) -> String {
    let mut out = String::with_capacity(pattern.len() + dbname.len());
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('n') => out.push_str(dbname),
            Some('Y') | Some('y') => out.push_str(&tm.year().to_string()),
            Some('m') => out.push_str(&tm.month().to_string()),
            Some('d') => out.push_str(&tm.day().to_string()),
            Some('H') => out.push_str(&format!("{:02}", tm.hour())),
            Some('M') => out.push_str(&format!("{:02}", tm.minute())),
            Some('S') => out.push_str(&format!("{:02}", tm.second())),
            _ => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 3, 16, 23, 9, 11).unwrap() + chrono::Duration::nanoseconds(82_859)
    }

    #[test]
    fn test_formats() {
        let cases = [
            ("", ""),
            ("plain", "plain"),
            ("per%%cent", "per%cent"),
            ("%n-thing", "dbname-thing"),
            ("dump/%y/%m/%d-%H-%M-%S-%n", "dump/2014/3/16-23-09-11-dbname"),
            ("%n.json.gz", "dbname.json.gz"),
        ];

        for (pattern, expected) in cases {
            assert_eq!(dump_name(pattern, "dbname", test_time()), expected, "{:?}", pattern);
        }
    }

    #[test]
    fn test_unknown_and_trailing_directives_are_dropped() {
        assert_eq!(dump_name("a%qb", "db", test_time()), "ab");
        assert_eq!(dump_name("db-%", "db", test_time()), "db-");
        assert_eq!(dump_name("%Y %n", "x", test_time()), "2014 x");
    }
}
