use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearColumn {
    pub index: usize,
    pub label: String,
    pub fiscal_year: i32,
}

/// Header labels made of exactly four ASCII digits, in header order. A
/// repeated label only counts the first time it appears.
pub fn detect_year_columns<S: AsRef<str>>(labels: &[S]) -> Vec<YearColumn> {
    let mut seen = HashSet::new();

    labels
        .iter()
        .enumerate()
        .filter_map(|(index, label)| {
            let label = label.as_ref();
            if !is_year_label(label) || !seen.insert(label) {
                return None;
            }
            let fiscal_year = label.parse::<i32>().ok()?;
            Some(YearColumn {
                index,
                label: label.to_string(),
                fiscal_year,
            })
        })
        .collect()
}

fn is_year_label(label: &str) -> bool {
    label.len() == 4 && label.bytes().all(|byte| byte.is_ascii_digit())
}
