//! Serializers for the two output artifacts.
//!
//! Both formats are byte-exact contracts consumed by downstream tooling,
//! so they are written by hand rather than through a serializer framework:
//! the stats JSON keeps one counter per line with tab indentation, and the
//! trace CSV quotes string fields without any internal-quote escaping.

use std::io::Write;

use tally_core::counters::{DriverCounters, FrontendCounters};
use tally_core::entity::LocationResolver;
use tally_core::event::TraceEvent;
use tally_core::Result;

/// Fixed header of the trace CSV artifact.
pub const TRACE_CSV_HEADER: &str =
    "Time,Live,IsEntry,EventName,CounterName,CounterDelta,CounterValue,EntityName,EntityRange";

/// Writes the cumulative stats artifact: a flat JSON object with one
/// counter or timer entry per line.
///
/// Only instantiated counter sets are emitted, frontend first, each in
/// schema declaration order, followed by the supplied timer-group entries.
pub fn write_stats_json<W: Write>(
    out: &mut W,
    frontend: Option<&FrontendCounters>,
    driver: Option<&DriverCounters>,
    timer_entries: &[(String, u64)],
) -> Result<()> {
    write!(out, "{{\n")?;
    let mut delim = "";
    if let Some(c) = frontend {
        for f in FrontendCounters::FIELDS {
            write!(out, "{delim}\t\"{}\": {}", f.name, (f.get)(c))?;
            delim = ",\n";
        }
    }
    if let Some(c) = driver {
        for f in DriverCounters::FIELDS {
            write!(out, "{delim}\t\"{}\": {}", f.name, (f.get)(c))?;
            delim = ",\n";
        }
    }
    for (key, value) in timer_entries {
        write!(out, "{delim}\t\"{key}\": {value}")?;
        delim = ",\n";
    }
    write!(out, "\n}}\n")?;
    out.flush()?;
    Ok(())
}

/// Writes the trace artifact: the fixed CSV header followed by one row per
/// buffered event, in emission order.
///
/// Numeric fields are bare, string fields double-quoted. The entity name
/// is empty for unnamed entities; the range is empty when no resolver is
/// supplied or the resolver cannot place the range.
pub fn write_trace_csv<W: Write>(
    out: &mut W,
    events: &[TraceEvent<'_>],
    resolver: Option<&dyn LocationResolver>,
) -> Result<()> {
    writeln!(out, "{TRACE_CSV_HEADER}")?;
    for e in events {
        let entity_name = e.entity.short_name().unwrap_or_default();
        let entity_range = resolver
            .zip(e.entity.source_range())
            .and_then(|(r, range)| r.render_range(range))
            .unwrap_or_default();
        writeln!(
            out,
            "{},{},\"{}\",\"{}\",\"{}\",{},{},\"{}\",\"{}\"",
            e.time_us,
            e.live_us,
            if e.is_entry { "entry" } else { "exit" },
            e.event_name,
            e.counter_name,
            e.counter_delta,
            e.counter_value,
            entity_name,
            entity_range,
        )?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::entity::{SourceLoc, SourceRange, TraceEntity, TracedDecl};

    #[test]
    fn test_stats_json_shape_and_order() {
        let mut frontend = FrontendCounters::default();
        frontend.num_decls = 12;
        frontend.num_source_lines = 340;

        let mut out = Vec::new();
        write_stats_json(
            &mut out,
            Some(&frontend),
            None,
            &[("time.totals.wall".to_string(), 42)],
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("{\n\t\"Frontend.NumProcessFailures\": 0,\n"));
        assert!(text.ends_with("\t\"time.totals.wall\": 42\n}\n"));
        assert!(text.contains("\t\"Frontend.NumDecls\": 12,\n"));
        // No driver set was instantiated, so no driver keys.
        assert!(!text.contains("Driver."));

        // The artifact must still be well-formed JSON for downstream tools.
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["Frontend.NumSourceLines"], 340);
        assert_eq!(parsed["time.totals.wall"], 42);
    }

    #[test]
    fn test_stats_json_emits_both_schemas_frontend_first() {
        let frontend = FrontendCounters::default();
        let driver = DriverCounters::default();

        let mut out = Vec::new();
        write_stats_json(&mut out, Some(&frontend), Some(&driver), &[]).unwrap();
        let text = String::from_utf8(out).unwrap();

        let f = text.find("Frontend.NumProcessFailures").unwrap();
        let d = text.find("Driver.NumProcessFailures").unwrap();
        assert!(f < d);
        // No trailing comma before the closing brace.
        assert!(text.ends_with(": 0\n}\n"));
    }

    struct Resolver;
    impl LocationResolver for Resolver {
        fn render_range(&self, range: SourceRange) -> Option<String> {
            Some(format!("input.sw:{}:1-input.sw:{}:1", range.start.0, range.end.0))
        }
    }

    struct Named;
    impl TracedDecl for Named {
        fn short_name(&self) -> Option<String> {
            Some("foo".to_string())
        }
        fn source_range(&self) -> Option<SourceRange> {
            Some(SourceRange {
                start: SourceLoc(3),
                end: SourceLoc(9),
            })
        }
    }

    #[test]
    fn test_trace_csv_rows() {
        let decl = Named;
        let events = [
            TraceEvent {
                time_us: 100,
                live_us: 0,
                is_entry: true,
                event_name: "typecheck-decl",
                counter_name: "Frontend.NumDecls",
                counter_delta: 2,
                counter_value: 2,
                entity: TraceEntity::Decl(&decl),
            },
            TraceEvent {
                time_us: 250,
                live_us: 150,
                is_entry: false,
                event_name: "typecheck-decl",
                counter_name: "Frontend.NumDecls",
                counter_delta: 3,
                counter_value: 5,
                entity: TraceEntity::None,
            },
        ];

        let mut out = Vec::new();
        write_trace_csv(&mut out, &events, Some(&Resolver)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], TRACE_CSV_HEADER);
        assert_eq!(
            lines[1],
            "100,0,\"entry\",\"typecheck-decl\",\"Frontend.NumDecls\",2,2,\"foo\",\"input.sw:3:1-input.sw:9:1\""
        );
        // Entity-less exit row has empty name and range fields.
        assert_eq!(
            lines[2],
            "250,150,\"exit\",\"typecheck-decl\",\"Frontend.NumDecls\",3,5,\"\",\"\""
        );
    }

    #[test]
    fn test_trace_csv_without_resolver_leaves_range_empty() {
        let decl = Named;
        let events = [TraceEvent {
            time_us: 1,
            live_us: 0,
            is_entry: false,
            event_name: "ev",
            counter_name: "Frontend.NumDecls",
            counter_delta: 1,
            counter_value: 1,
            entity: TraceEntity::Decl(&decl),
        }];

        let mut out = Vec::new();
        write_trace_csv(&mut out, &events, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(1).unwrap().ends_with("\"foo\",\"\""));
    }
}
