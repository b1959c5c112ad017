use super::{
    builtin,
    Record,
    DEFAULT_SENTINELS,
};
use regex::Regex;

/// Whitespace-separated table rows picked out by a row pattern.
///
/// ```text
/// Slot    PowerID  Online   Mode   State      Power(W)
/// 0       PWR1     Present  DC     Supply      1000.00
/// ```
#[derive(Debug, Clone)]
pub struct TabularSpec {
    header: Option<Regex>,
    row: Regex,
    context: Option<(String, Regex)>,
    columns: Vec<(String, usize)>,
    rest: Option<(String, usize)>,
    min_columns: usize,
    sentinels: &'static [&'static str],
}

impl TabularSpec {
    /// `row` is matched against each trimmed line.
    pub fn new(row: &str) -> Self {
        Self {
            header: None,
            row: builtin(row),
            context: None,
            columns: Vec::new(),
            rest: None,
            min_columns: 0,
            sentinels: DEFAULT_SENTINELS,
        }
    }

    /// Rows are only accepted after a line matching `pattern`.
    pub fn header(mut self, pattern: &str) -> Self {
        self.header = Some(builtin(pattern));
        self
    }

    /// Lines matching `pattern` set `name` on every following row until the next match.
    pub fn context(mut self, name: &str, pattern: &str) -> Self {
        self.context = Some((name.to_string(), builtin(pattern)));
        self
    }

    pub fn column(mut self, name: &str, index: usize) -> Self {
        self.columns.push((name.to_string(), index));
        self.min_columns = self.min_columns.max(index + 1);
        self
    }

    /// Joins every token from `from` onwards with single spaces. Omitted when empty.
    pub fn rest(mut self, name: &str, from: usize) -> Self {
        self.rest = Some((name.to_string(), from));
        self
    }

    pub fn parse(&self, text: &str) -> Vec<Record> {
        let mut records = Vec::new();
        let mut in_table = self.header.is_none();
        let mut context: Option<String> = None;

        for line in text.lines() {
            let line = line.trim();

            if let Some(header) = &self.header {
                if header.is_match(line) {
                    in_table = true;
                    continue;
                }
            }
            if let Some((_, pattern)) = &self.context {
                if let Some(value) = pattern.captures(line).and_then(|caps| caps.get(1)) {
                    context = Some(value.as_str().to_string());
                    continue;
                }
            }
            if !in_table || !self.row.is_match(line) {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < self.min_columns {
                continue;
            }

            let mut record = Record::new();
            for (name, index) in &self.columns {
                record.set_raw(name, tokens[*index], self.sentinels);
            }
            if let Some((name, from)) = &self.rest {
                let rest = tokens.get(*from..).unwrap_or_default().join(" ");
                if !rest.is_empty() {
                    record.set(name.as_str(), rest);
                }
            }
            if let (Some((name, _)), Some(value)) = (&self.context, &context) {
                record.set(name.as_str(), value.as_str());
            }
            records.push(record);
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FANS: &str = "\
Slot  FanID   Online    Status    Speed     Mode     Airflow         Auto Min-Speed
-------------------------------------------------------------------------------
0         1   Present   Normal      40%     Auto     Front-to-Back                -
0         2   Present   Abnormal    --      Auto     Front-to-Back                -
0         3   Absent    -           -       -        -                            -
";

    #[test]
    fn picks_rows_and_columns() {
        let spec = TabularSpec::new(r"^\d+\s+\d+\s+Present")
            .column("fan", 1)
            .column("status", 3)
            .column("speed", 4);

        let records = spec.parse(FANS);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text("fan"), Some("1"));
        assert_eq!(records[0].text("status"), Some("Normal"));
        assert_eq!(records[0].text("speed"), Some("40%"));
        assert!(records[1].is_unavailable("speed"));
    }

    #[test]
    fn rest_column_keeps_descriptions_with_spaces() {
        let text = "\
PHY: Physical
Interface                     PHY     Protocol  Description
100GE1/0/1                    up      up        UPLINK to core 01
10GE1/0/2                     down    down
";
        let spec = TabularSpec::new(r"^\S*GE\S*\s+\S+\s+\S+")
            .header(r"^Interface\s+PHY")
            .column("ifname", 0)
            .column("phy", 1)
            .rest("description", 3);

        let records = spec.parse(text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text("description"), Some("UPLINK to core 01"));
        assert_eq!(records[1].field("description"), None);
    }

    #[test]
    fn context_lines_carry_into_rows() {
        let text = "\
Base-Board, Unit:C, Slot 1
PCB    I2C  Addr  Chl  Status  Minor  Major  Fatal  Adj  Fan  Temp(C)
------------------------------------------------------------------
IPU    0    72    0    NORMAL  75     85     95     0    40   41
Base-Board, Unit:C, Slot 2
IPU    0    73    1    NORMAL  75     85     95     0    40   -5
";
        let spec = TabularSpec::new(r"^\S+\s+\d+\s+\d+\s+\d+\s+\S+\s+\d+")
            .header(r"^PCB\s+I2C\s+Addr\s+Chl")
            .context("slot", r"Base-Board, Unit:C, Slot (\d+)")
            .column("board", 0)
            .column("temp", 10);

        let records = spec.parse(text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text("slot"), Some("1"));
        assert_eq!(records[1].text("slot"), Some("2"));
        assert_eq!(records[1].text("temp"), Some("-5"));
    }
}
