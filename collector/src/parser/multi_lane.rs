use super::{
    builtin,
    convert::split_lanes,
    Extractor,
    Record,
    DEFAULT_SENTINELS,
    LANE_COUNT_FIELD,
    LANE_FIELD,
};
use regex::Regex;
use std::collections::BTreeMap;

/// Where the per-lane values of a field come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneLayout {
    /// One line, capture 1 holds `v0|v1|...` with an optional `(Lane0|Lane1|...)` suffix.
    Pipe,
    /// One line per lane, capture 1 is the lane index and capture 2 the value.
    Indexed,
}

#[derive(Debug, Clone)]
struct LaneField {
    name: String,
    pattern: Regex,
    layout: LaneLayout,
}

/// Transceiver-style output: entity-level scalars plus values repeated per lane.
///
/// Produces, per entity, one record holding the scalars and the observed lane count,
/// followed by one record per lane carrying [`LANE_FIELD`].
#[derive(Debug, Clone, Default)]
pub struct MultiLaneSpec {
    section: Option<(String, Regex)>,
    scalars: Vec<Extractor>,
    lanes: Vec<LaneField>,
}

impl MultiLaneSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits the output into one entity per match of `pattern`, named by its first capture.
    pub fn sections(mut self, id_field: &str, pattern: &str) -> Self {
        self.section = Some((id_field.to_string(), builtin(pattern)));
        self
    }

    pub fn scalar(mut self, extractor: Extractor) -> Self {
        self.scalars.push(extractor);
        self
    }

    pub fn lane(mut self, name: &str, layout: LaneLayout, pattern: &str) -> Self {
        self.lanes.push(LaneField {
            name: name.to_string(),
            pattern: builtin(pattern),
            layout,
        });
        self
    }

    pub fn parse(&self, text: &str) -> Vec<Record> {
        let Some((id_field, start)) = &self.section else {
            return self.entity(text, None);
        };

        let starts: Vec<(usize, &str)> = start
            .captures_iter(text)
            .filter_map(|caps| Some((caps.get(0)?.start(), caps.get(1)?.as_str())))
            .collect();

        starts
            .iter()
            .enumerate()
            .flat_map(|(i, (offset, id))| {
                let end = starts.get(i + 1).map_or(text.len(), |(next, _)| *next);
                self.entity(&text[*offset..end], Some((id_field.as_str(), *id)))
            })
            .collect()
    }

    fn entity(&self, text: &str, id: Option<(&str, &str)>) -> Vec<Record> {
        let base = match id {
            Some((field, value)) => Record::new().with(field, value),
            None => Record::new(),
        };

        let mut scalars = base.clone();
        for extractor in &self.scalars {
            extractor.apply(text, &mut scalars);
        }

        let mut lanes: BTreeMap<usize, Record> = BTreeMap::new();
        for field in &self.lanes {
            match field.layout {
                LaneLayout::Pipe => {
                    let Some(raw) = field.pattern.captures(text).and_then(|caps| caps.get(1)) else {
                        continue;
                    };
                    for (lane, value) in split_lanes(raw.as_str()).into_iter().enumerate() {
                        store(&mut lanes, &base, lane, &field.name, value);
                    }
                }
                LaneLayout::Indexed => {
                    for caps in field.pattern.captures_iter(text) {
                        let (Some(lane), Some(value)) = (caps.get(1), caps.get(2)) else {
                            continue;
                        };
                        let Ok(lane) = lane.as_str().parse::<usize>() else {
                            continue;
                        };
                        store(&mut lanes, &base, lane, &field.name, value.as_str());
                    }
                }
            }
        }

        if id.is_none() && scalars.is_empty() && lanes.is_empty() {
            return Vec::new();
        }

        scalars.set(LANE_COUNT_FIELD, lanes.len().to_string());
        let mut records = Vec::with_capacity(lanes.len() + 1);
        records.push(scalars);
        records.extend(lanes.into_values());
        records
    }
}

fn store(lanes: &mut BTreeMap<usize, Record>, base: &Record, lane: usize, name: &str, value: &str) {
    let record = lanes
        .entry(lane)
        .or_insert_with(|| base.clone().with(LANE_FIELD, lane.to_string()));
    if value.trim().is_empty() {
        record.set_unavailable(name);
    } else {
        record.set_raw(name, value, DEFAULT_SENTINELS);
    }
}
