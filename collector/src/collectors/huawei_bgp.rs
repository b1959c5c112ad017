use super::{
    fetch,
    fetch_one,
    number,
    Collector,
};
use crate::{
    discovery::{
        DiscoveryBuilder,
        DiscoveryDocument,
        DiscoveryEntity,
    },
    error::TransportError,
    executor::{
        CommandCost,
        Executor,
    },
    metrics::{
        ItemKey,
        MetricGroup,
        MetricSample,
        MetricValue,
    },
    parser::{
        convert::{
            parse_uptime,
            BGP_STATE,
        },
        KeyValueSpec,
        ParserSpec,
        Record,
    },
};
use lazy_static::lazy_static;

const SESSIONS_KEY: &str = "bgpSessions";

const PEER_COMMANDS: [&str; 2] = ["display bgp ipv6 peer verbose | no-more", "display bgp peer verbose | no-more"];

/// (command, item key, which counter the command prints)
const ROUTE_COMMANDS: [(&str, &str, RouteCounter); 4] = [
    ("display ipv6 routing-table statistics", "hwIPv6RibRoutes", RouteCounter::Summary),
    ("display bgp ipv6 routing-table statistics", "hwIPv6FibRoutes", RouteCounter::Total),
    ("display ip routing-table statistics", "hwIPv4RibRoutes", RouteCounter::Summary),
    ("display bgp routing-table statistics", "hwIPv4FibRoutes", RouteCounter::Total),
];

#[derive(Debug, Clone, Copy)]
enum RouteCounter {
    Summary,
    Total,
}

lazy_static! {
    static ref SUMMARY_PREFIXES: ParserSpec = KeyValueSpec::new()
        .pattern("routes", r"Summary Prefixes\s*:\s*(\d+)")
        .into();
    static ref TOTAL_ROUTES: ParserSpec = KeyValueSpec::new()
        .pattern("routes", r"Total Number of Routes:\s*(\d+)")
        .into();
    static ref PEERS: ParserSpec = KeyValueSpec::new()
        .blocks("peer", r"BGP Peer is ([^\s,]+)")
        .pattern("description", r#"Peer's description: "([^"]+)""#)
        .colon("state", "BGP current state")
        .pattern("uptime", r"Up for ([^,\s]+)")
        .colon("received", "Received total routes")
        .colon("advertised", "Advertised total routes")
        .into();
}

/// Huawei routers: RIB/FIB sizes and per-session BGP state.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuaweiBgpCollector;

impl HuaweiBgpCollector {
    fn peers(&self, executor: &mut Executor<'_>) -> Result<Vec<Record>, TransportError> {
        let mut peers = Vec::new();
        for command in PEER_COMMANDS {
            peers.extend(fetch(executor, command, CommandCost::Heavy, &PEERS)?);
        }
        Ok(peers)
    }

    fn route_samples(&self, executor: &mut Executor<'_>) -> Result<Vec<MetricSample>, TransportError> {
        let mut samples = Vec::new();
        let mut rib = Vec::new();
        let mut fib = Vec::new();

        for (command, key, counter) in ROUTE_COMMANDS {
            let spec: &ParserSpec = match counter {
                RouteCounter::Summary => &SUMMARY_PREFIXES,
                RouteCounter::Total => &TOTAL_ROUTES,
            };
            let routes = fetch_one(executor, command, CommandCost::Light, spec)?
                .text("routes")
                .and_then(|routes| routes.parse::<i64>().ok());
            match counter {
                RouteCounter::Summary => rib.extend(routes),
                RouteCounter::Total => fib.extend(routes),
            }
            samples.push(MetricSample::new(ItemKey::new(key), routes.map(MetricValue::Integer)));
        }

        // Sums of whatever the device reported, zero if it reported nothing.
        for (key, parts) in [("hwIPv4v6RibRoutes", rib), ("hwIPv4v6FibRoutes", fib)] {
            let total = (!parts.is_empty()).then(|| MetricValue::Integer(parts.iter().sum()));
            samples.push(MetricSample::new(ItemKey::new(key), total).or_sentinel(0));
        }
        Ok(samples)
    }
}

impl Collector for HuaweiBgpCollector {
    fn discover(&self, executor: &mut Executor<'_>) -> Result<Vec<DiscoveryDocument>, TransportError> {
        let mut builder = DiscoveryBuilder::new([SESSIONS_KEY]);
        for peer in self.peers(executor)? {
            let Some(address) = peer.text("peer") else {
                continue;
            };
            builder.add(
                SESSIONS_KEY,
                DiscoveryEntity::new()
                    .with("{#DESCRIPTION}", peer.text("description").unwrap_or_default())
                    .with("{#PEER}", address),
            );
        }
        Ok(builder.build())
    }

    fn collect(&self, executor: &mut Executor<'_>) -> Result<Vec<MetricGroup>, TransportError> {
        let routes = self.route_samples(executor)?;

        let mut sessions = Vec::new();
        for peer in self.peers(executor)? {
            // Only described sessions have items on the server.
            let (Some(address), Some(description)) = (peer.text("peer"), peer.text("description")) else {
                continue;
            };
            let key = |name: &str| ItemKey::new(name).quoted(description).param(address);

            // Missing counters, uptime and state all go out as 0.
            sessions.push(MetricSample::new(key("bgpAdvRoutes"), number(&peer, "advertised")).or_sentinel(0));
            sessions.push(MetricSample::new(key("BGPpeerRouter"), number(&peer, "received")).or_sentinel(0));
            sessions.push(
                MetricSample::new(
                    key("hwBgpPeerFsmEstablishedTime"),
                    peer.text("uptime").and_then(parse_uptime).map(MetricValue::Float),
                )
                .or_sentinel(0),
            );
            sessions.push(
                MetricSample::new(
                    key("hwBgpPeerState"),
                    peer.text("state").map(|state| MetricValue::Integer(BGP_STATE.lookup(state))),
                )
                .or_sentinel(BGP_STATE.unknown()),
            );
        }

        Ok(vec![MetricGroup::individual(routes), MetricGroup::individual(sessions)])
    }

    fn name(&self) -> &'static str {
        "huawei-bgp"
    }
}
