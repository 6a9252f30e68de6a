//! Human-readable database summaries.

use crate::models::DbInfo;

const SI_SIZES: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// SI byte count, `8192` renders as `8.2 kB` and `83000000` as `83 MB`.
pub fn human_bytes(n: u64) -> String {
    if n < 10 {
        return format!("{} B", n);
    }
    let mut exp = 0;
    let mut div = 1u64;
    while n / div >= 1000 {
        div *= 1000;
        exp += 1;
    }
    let val = (n as f64 / div as f64 * 10.0 + 0.5).floor() / 10.0;
    if val < 10.0 {
        format!("{:.1} {}", val, SI_SIZES[exp])
    } else {
        format!("{:.0} {}", val, SI_SIZES[exp])
    }
}

/// Thousands separated, `1234567` renders as `1,234,567`.
pub fn comma(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn render_long(db: &str, info: &DbInfo) -> String {
    format!(
        "{}:\n  Space Used:       {}\n  Last Sequence:    {}\n  Header Position:  {}\n  Document Count:   {}\n  Deleted Count:    {}\n\n",
        db,
        human_bytes(info.space_used),
        comma(info.last_seq),
        comma(info.header_pos),
        comma(info.doc_count),
        comma(info.deleted_count),
    )
}

/// One row per database (name, documents, size) under a header, columns
/// aligned with two spaces of padding and a minimum width of eight.
pub fn render_short(rows: &[(String, DbInfo)]) -> String {
    let mut table = vec![
        ["dbname".to_string(), "docs".to_string(), "bytes".to_string()],
        ["-----".to_string(), "-----".to_string(), "-----".to_string()],
    ];
    for (db, info) in rows {
        table.push([db.clone(), comma(info.doc_count), human_bytes(info.space_used)]);
    }
    align(&table)
}

fn align(table: &[[String; 3]]) -> String {
    const MIN_WIDTH: usize = 8;
    const PADDING: usize = 2;

    let width = |col: usize| {
        let widest = table.iter().map(|row| row[col].chars().count()).max().unwrap_or(0);
        (widest + PADDING).max(MIN_WIDTH)
    };
    let (w0, w1) = (width(0), width(1));

    let mut out = String::new();
    for [name, docs, bytes] in table {
        out.push_str(&format!("{:<w0$}{:<w1$}{}\n", name, docs, bytes, w0 = w0, w1 = w1));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn info(space_used: u64, doc_count: u64) -> DbInfo {
        DbInfo {
            space_used,
            last_seq: 1_234_567,
            header_pos: 4096,
            doc_count,
            deleted_count: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(9), "9 B");
        assert_eq!(human_bytes(999), "999 B");
        assert_eq!(human_bytes(1000), "1.0 kB");
        assert_eq!(human_bytes(8192), "8.2 kB");
        assert_eq!(human_bytes(83_000_000), "83 MB");
        assert_eq!(human_bytes(1_500_000_000), "1.5 GB");
    }

    #[test]
    fn test_comma() {
        assert_eq!(comma(0), "0");
        assert_eq!(comma(999), "999");
        assert_eq!(comma(1000), "1,000");
        assert_eq!(comma(1_234_567), "1,234,567");
    }

    #[test]
    fn test_render_long() {
        assert_eq!(
            render_long("metrics", &info(8192, 40)),
            "metrics:\n  Space Used:       8.2 kB\n  Last Sequence:    1,234,567\n  Header Position:  4,096\n  Document Count:   40\n  Deleted Count:    2\n\n"
        );
    }

    #[test]
    fn test_render_short_aligns_columns() {
        let rows = vec![
            ("metrics".to_string(), info(8192, 40)),
            ("wide".to_string(), info(83_000_000, 123_456)),
        ];

        assert_eq!(
            render_short(&rows),
            "dbname   docs     bytes\n\
             -----    -----    -----\n\
             metrics  40       8.2 kB\n\
             wide     123,456  83 MB\n"
        );
    }

    #[test]
    fn test_render_short_empty() {
        assert_eq!(render_short(&[]), "dbname  docs    bytes\n-----   -----   -----\n");
    }
}
