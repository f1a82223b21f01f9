//! Command-line parsing and whole-pipeline tests over temp directories.

#[cfg(test)]
mod fixtures {
    use std::fmt::Write as _;
    use std::fs;
    use std::path::{Path, PathBuf};

    use ct_core::XyPoint;

    pub const NET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<net version="1.16">
    <location netOffset="-395000.00,-4990000.00" convBoundary="0.00,0.00,5000.00,5000.00" origBoundary="7.58,45.00,7.75,45.13" projParameter="+proj=utm +zone=32 +ellps=WGS84 +datum=WGS84 +units=m +no_defs"/>
    <edge id="e0" from="j0" to="j1"/>
</net>
"#;

    pub const OPERATOR_TABLE: &str = "node_id;cell_lat;cell_long;site_name\n\
                                      A;45.07;7.68;TORINO PORTA NUOVA\n\
                                      A;45.07;7.68;TORINO PORTA NUOVA\n\
                                      M;45.46;9.19;MILANO CENTRALE\n\
                                      B;45.08;7.70;TORINO VANCHIGLIA\n";

    pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// An FCD trace with one `<timestep>` per entry.
    pub fn fcd(steps: &[(f64, &[(&str, XyPoint)])]) -> String {
        let mut xml = String::from("<fcd-export>\n");
        for (time, vehicles) in steps {
            writeln!(xml, r#"  <timestep time="{time:.2}">"#).unwrap();
            for (id, p) in *vehicles {
                writeln!(xml, r#"    <vehicle id="{id}" x="{:.2}" y="{:.2}" speed="0.00"/>"#, p.x, p.y).unwrap();
            }
            xml.push_str("  </timestep>\n");
        }
        xml.push_str("</fcd-export>\n");
        xml
    }

    pub fn arg(path: &Path) -> String {
        path.display().to_string()
    }
}

// ── Argument parsing ──────────────────────────────────────────────────────────

#[cfg(test)]
mod cli {
    use clap::Parser;

    use ct_metrics::Analysis;
    use ct_core::SimTime;

    use crate::analysis::AnalysisArgs;
    use crate::association::{AssociationArgs, ResolverKind};
    use crate::logging::default_filter;

    #[test]
    fn verbosity_levels() {
        assert_eq!(default_filter(0), "warn");
        assert_eq!(default_filter(1), "info");
        assert_eq!(default_filter(2), "debug");
        assert_eq!(default_filter(9), "trace");
    }

    #[test]
    fn association_defaults() {
        let args = AssociationArgs::try_parse_from(["sites_association", "--sumo_cfg", "a.sumocfg", "--cell_sites", "10"])
            .unwrap();
        assert_eq!(args.distance, 2_000.0);
        assert_eq!(args.time, 86_400);
        assert_eq!(args.step, 1);
        assert_eq!(args.seed, 42);
        assert_eq!(args.port, 8813);
        assert_eq!(args.resolver, ResolverKind::Rtree);
        assert_eq!(args.output.to_str(), Some("output_vehicles_sites.csv"));
        assert_eq!(args.sites_output.to_str(), Some("output_sites_pos.csv"));

        let config = args.sim_config();
        assert_eq!(config.end_time, Some(SimTime::from_secs(86_400)));
        assert_eq!(config.check_interval_steps, 1);
    }

    #[test]
    fn input_requires_network() {
        let err = AssociationArgs::try_parse_from(["sites_association", "--fcd", "t.xml", "--input", "s.csv"]);
        assert!(err.is_err());
        let ok = AssociationArgs::try_parse_from([
            "sites_association", "--fcd", "t.xml", "--input", "s.csv", "--sumo_net", "n.net.xml",
        ]);
        assert!(ok.is_ok());
    }

    #[test]
    fn exactly_one_source_of_each_kind() {
        for argv in [
            &["sites_association", "--cell_sites", "3"][..],
            &["sites_association", "--fcd", "t.xml"],
            &["sites_association", "--fcd", "t.xml", "--sumo_cfg", "a.sumocfg", "--cell_sites", "3"],
            &["sites_association", "--fcd", "t.xml", "--cell_sites", "3", "--input", "s.csv", "--sumo_net", "n.xml"],
            &["sites_association", "--sumo_cfg", "a.sumocfg", "--cell_sites", "3", "--fcd_geo"],
        ] {
            assert!(AssociationArgs::try_parse_from(argv).is_err(), "{argv:?}");
        }
    }

    #[test]
    fn analysis_flags() {
        let args = AnalysisArgs::try_parse_from(["sites_analysis", "--new_sites", "-i", "a.csv", "b.csv"]).unwrap();
        assert_eq!(args.analysis(), Analysis::NewSites);
        assert_eq!(args.input.len(), 2);
        assert_eq!(args.output.to_str(), Some("output_analysis.csv"));

        assert!(AnalysisArgs::try_parse_from(["sites_analysis", "-i", "a.csv"]).is_err());
        assert!(AnalysisArgs::try_parse_from(["sites_analysis", "--users", "--unique_sites", "-i", "a.csv"]).is_err());
        assert!(AnalysisArgs::try_parse_from(["sites_analysis", "--users"]).is_err());
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod pipeline {
    use std::fs;

    use clap::Parser;

    use ct_core::{CtError, GeoPoint, XyPoint};
    use ct_output::read_events;
    use ct_spatial::CoordinateTransformer;

    use super::fixtures::{arg, fcd, write, NET, OPERATOR_TABLE};
    use crate::analysis::{self, AnalysisArgs};
    use crate::association::{self, AssociationArgs};
    use crate::extraction::{self, ExtractionArgs};

    fn offset(p: XyPoint, dx: f64, dy: f64) -> XyPoint {
        XyPoint::new(p.x + dx, p.y + dy)
    }

    #[test]
    fn extract_associate_analyse() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let raw = write(root, "operator.csv", OPERATOR_TABLE);
        let net = write(root, "city.net.xml", NET);

        // 1. Extraction.
        let sites = root.join("sites/turin.csv");
        let args = ExtractionArgs::try_parse_from([
            "sites_extraction", "-i", &arg(&raw), "-o", &arg(&sites), "--city", "TORINO",
        ])
        .unwrap();
        assert_eq!(extraction::run(&args).unwrap(), 2);

        // 2. Association over a replayed trace placed around the two sites.
        let t = CoordinateTransformer::from_net_file(&net).unwrap();
        let a = t.to_projected(GeoPoint::new(45.07, 7.68));
        let b = t.to_projected(GeoPoint::new(45.08, 7.70));
        let trace = write(
            root,
            "trace.xml",
            &fcd(&[
                (0.0, &[("v0", offset(a, 100.0, 0.0))]),
                (1.0, &[("v0", offset(b, 0.0, 50.0)), ("v1", offset(a, 50_000.0, 0.0))]),
            ]),
        );
        let events = root.join("out/events.csv");
        let args = AssociationArgs::try_parse_from([
            "sites_association",
            "--fcd", &arg(&trace),
            "--input", &arg(&sites),
            "--sumo_net", &arg(&net),
            "--distance", "1000",
            "--output", &arg(&events),
        ])
        .unwrap();
        let summary = association::run(&args).unwrap();
        assert_eq!(summary.events, 3);
        assert_eq!(summary.unassociated_events, 1);

        let log = read_events(&events).unwrap();
        let rows: Vec<_> = log.iter().map(|e| (e.vehicle.as_str(), e.time.as_millis(), e.site.as_deref())).collect();
        assert_eq!(rows, [("v0", 0, Some("A")), ("v0", 1_000, Some("B")), ("v1", 1_000, None)]);
        assert!((log[0].distance - 100.0).abs() < 0.01);

        // 3. Analysis.
        let changes = root.join("out/changes.csv");
        let args = AnalysisArgs::try_parse_from([
            "sites_analysis", "--number_changes", "-i", &arg(&events), "-o", &arg(&changes),
        ])
        .unwrap();
        assert_eq!(analysis::run(&args).unwrap(), 2);
        assert_eq!(fs::read_to_string(&changes).unwrap(), "vehicle_id,count\nv0,2\nv1,0\n");
    }

    #[test]
    fn generated_sites_are_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let net = write(root, "grid.net.xml", NET);
        let centre = XyPoint::new(2_500.0, 2_500.0);
        let trace = write(root, "trace.xml", &fcd(&[(0.0, &[("v0", centre)]), (1.0, &[("v0", centre)])]));

        let mut site_tables = Vec::new();
        for (run, resolver) in [(1, "rtree"), (2, "brute")] {
            let sites_out = root.join(format!("run{run}/sites_pos.csv"));
            let events = root.join(format!("run{run}/events.csv"));
            let args = AssociationArgs::try_parse_from([
                "sites_association",
                "--fcd", &arg(&trace),
                "--cell_sites", "5",
                "--sumo_net", &arg(&net),
                "--distance", "10000",
                "--seed", "7",
                "--resolver", resolver,
                "--sites_output", &arg(&sites_out),
                "--output", &arg(&events),
            ])
            .unwrap();
            let summary = association::run(&args).unwrap();
            assert_eq!(summary.events, 2);
            assert_eq!(summary.unassociated_events, 0);
            site_tables.push((fs::read_to_string(&sites_out).unwrap(), fs::read(&events).unwrap()));
        }

        let (sites, _) = &site_tables[0];
        let lines: Vec<_> = sites.lines().collect();
        assert_eq!(lines[0], "site_id,x,y,lat,long");
        assert_eq!(lines.len(), 6);
        // Geo-referenced network: every generated site has lat/long.
        assert!(lines[1..].iter().all(|l| !l.ends_with(",,")));
        assert_eq!(site_tables[0], site_tables[1]);
    }

    #[test]
    fn generated_sites_need_a_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let trace = write(dir.path(), "trace.xml", &fcd(&[(0.0, &[])]));
        let args = AssociationArgs::try_parse_from([
            "sites_association",
            "--fcd", &arg(&trace),
            "--cell_sites", "3",
            "--output", &arg(&dir.path().join("events.csv")),
        ])
        .unwrap();
        let err = association::run(&args).unwrap_err();
        assert!(matches!(err.downcast_ref::<CtError>(), Some(CtError::Config(_))), "{err:#}");
    }

    #[test]
    fn duplicate_site_fails_before_any_output() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let net = write(root, "n.net.xml", NET);
        let sites = write(root, "sites.csv", "node_id,cell_lat,cell_long\n1,45.07,7.68\n1,45.08,7.70\n");
        let trace = write(root, "trace.xml", &fcd(&[(0.0, &[])]));
        let events = root.join("events.csv");
        let args = AssociationArgs::try_parse_from([
            "sites_association",
            "--fcd", &arg(&trace),
            "--input", &arg(&sites),
            "--sumo_net", &arg(&net),
            "--output", &arg(&events),
        ])
        .unwrap();
        let err = association::run(&args).unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{err:#}");
        assert!(!events.exists());
    }

    #[test]
    fn bad_threshold_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let net = write(root, "n.net.xml", NET);
        let trace = write(root, "trace.xml", &fcd(&[(0.0, &[])]));
        let args = AssociationArgs::try_parse_from([
            "sites_association",
            "--fcd", &arg(&trace),
            "--cell_sites", "2",
            "--sumo_net", &arg(&net),
            "--distance", "0",
            "--sites_output", &arg(&root.join("s.csv")),
            "--output", &arg(&root.join("e.csv")),
        ])
        .unwrap();
        assert!(association::run(&args).is_err());
    }
}
