use super::{
    builtin,
    Extractor,
    Record,
};
use regex::Regex;

/// `label : value` output, either as one record or split into blocks.
#[derive(Debug, Clone, Default)]
pub struct KeyValueSpec {
    block: Option<(String, Regex)>,
    fields: Vec<Extractor>,
}

impl KeyValueSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new record at every match of `pattern`. The first capture is stored as `id_field`.
    pub fn blocks(mut self, id_field: &str, pattern: &str) -> Self {
        self.block = Some((id_field.to_string(), builtin(pattern)));
        self
    }

    pub fn field(mut self, extractor: Extractor) -> Self {
        self.fields.push(extractor);
        self
    }

    pub fn colon(self, name: &str, label: &str) -> Self {
        self.field(Extractor::colon(name, label))
    }

    pub fn pattern(self, name: &str, pattern: &str) -> Self {
        self.field(Extractor::pattern(name, pattern))
    }

    pub fn parse(&self, text: &str) -> Vec<Record> {
        let Some((id_field, start)) = &self.block else {
            let record = self.extract(text, Record::new());
            return if record.is_empty() { Vec::new() } else { vec![record] };
        };

        let starts: Vec<(usize, String)> = start
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let id = caps.get(1)?;
                Some((whole.start(), id.as_str().to_string()))
            })
            .collect();

        starts
            .iter()
            .enumerate()
            .map(|(i, (offset, id))| {
                let end = starts.get(i + 1).map_or(text.len(), |(next, _)| *next);
                self.extract(&text[*offset..end], Record::new().with(id_field.as_str(), id.as_str()))
            })
            .collect()
    }

    fn extract(&self, block: &str, mut record: Record) -> Record {
        for field in &self.fields {
            field.apply(block, &mut record);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEERS: &str = r#"
 BGP Peer is 10.0.0.1,  remote AS 65001
 Type: EBGP link
 Peer's description: "TRANSIT-A"
 BGP current state: Established, Up for 24d4h3m2s
 Received total routes: 812345
 Advertised total routes: 12

 BGP Peer is 10.0.0.2,  remote AS 65002
 BGP current state: Active
 Received total routes: 0
"#;

    fn spec() -> KeyValueSpec {
        KeyValueSpec::new()
            .blocks("peer", r"BGP Peer is ([^\s,]+)")
            .pattern("remote_as", r"remote AS (\d+)")
            .pattern("description", r#"Peer's description: "([^"]+)""#)
            .colon("state", "BGP current state")
            .pattern("uptime", r"Up for ([^,\s]+)")
            .colon("received", "Received total routes")
            .colon("advertised", "Advertised total routes")
    }

    #[test]
    fn splits_one_record_per_block() {
        let records = spec().parse(PEERS);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text("peer"), Some("10.0.0.1"));
        assert_eq!(records[0].text("remote_as"), Some("65001"));
        assert_eq!(records[0].text("description"), Some("TRANSIT-A"));
        assert_eq!(records[0].text("state"), Some("Established"));
        assert_eq!(records[0].text("uptime"), Some("24d4h3m2s"));
        assert_eq!(records[0].text("advertised"), Some("12"));
    }

    #[test]
    fn fields_do_not_leak_between_blocks() {
        let records = spec().parse(PEERS);

        assert_eq!(records[1].text("peer"), Some("10.0.0.2"));
        assert_eq!(records[1].field("description"), None);
        assert_eq!(records[1].field("uptime"), None);
        assert_eq!(records[1].field("advertised"), None);
    }

    #[test]
    fn without_blocks_yields_at_most_one_record() {
        let spec = KeyValueSpec::new().pattern("cpu", r"System cpu use rate is\s*:\s*(\d+)%");

        assert_eq!(spec.parse("garbage").len(), 0);
        let records = spec.parse("CPU Usage Stat.\nSystem cpu use rate is : 12%\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number("cpu"), Some(12.0));
    }
}
