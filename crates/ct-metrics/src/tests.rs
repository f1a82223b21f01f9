//! Unit and file-level tests for ct-metrics.

#[cfg(test)]
mod helpers {
    use std::io::Cursor;

    use ct_output::{read_events_from, EventRecord};

    pub const HEADER: &str = "vehicle_id,timestamp,site_id,distance,x,y\n";

    /// Parse event-log rows (without header).
    pub fn events(rows: &str) -> Vec<EventRecord> {
        read_events_from(Cursor::new(format!("{HEADER}{rows}")), "events.csv").unwrap()
    }

    pub fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }
}

// ── Users per site ────────────────────────────────────────────────────────────

#[cfg(test)]
mod users {
    use super::helpers::{events, text};
    use crate::{users_per_site, write_users};

    #[test]
    fn two_at_a_one_at_b() {
        let log = events(
            "v0,10,A,1,0,0\n\
             v1,10,A,1,0,0\n\
             v2,10,B,1,0,0\n",
        );
        let rows = users_per_site(&log);
        let got: Vec<_> = rows.iter().map(|r| (r.time.as_millis(), r.site_id.as_str(), r.vehicles)).collect();
        assert_eq!(got, [(10_000, "A", 2), (10_000, "B", 1)]);
    }

    #[test]
    fn no_site_rows_and_repeats_are_not_counted() {
        let log = events(
            "v0,1,,3000,0,0\n\
             v0,1,A,1,0,0\n\
             v0,1,A,1,0,0\n\
             v1,0.5,A,1,0,0\n",
        );
        let mut out = Vec::new();
        write_users(&mut out, &users_per_site(&log)).unwrap();
        assert_eq!(text(out), "timestamp,site_id,number_vehicles\n0.5,A,1\n1,A,1\n");
    }
}

// ── Route and time ────────────────────────────────────────────────────────────

#[cfg(test)]
mod route {
    use std::io::Cursor;

    use ct_core::CtError;

    use super::helpers::text;
    use crate::{read_route_stats, write_route_stats, MetricsError};

    const TRIPINFO: &str = "tripinfo_id;vehicle_arrival;vehicle_depart;vehicle_id;vehicle_routeLength\n\
                            ;120.5;10.00;veh0;1500.25\n\
                            ;;5.00;veh1;\n\
                            p0;30;0;;\n";

    #[test]
    fn stats_in_input_order() {
        let rows = read_route_stats(Cursor::new(TRIPINFO), "tripinfo.csv").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].vehicle_id, "veh0");
        assert_eq!(rows[0].route_length, 1500.25);
        assert_eq!(rows[0].simulation_stay, 110.5);
        // Empty arrival and length read as 0.
        assert_eq!(rows[1].route_length, 0.0);
        assert_eq!(rows[1].simulation_stay, -5.0);

        let mut out = Vec::new();
        write_route_stats(&mut out, &rows).unwrap();
        assert_eq!(
            text(out),
            "vehicle_id,route_length,simulation_stay\nveh0,1500.25,110.5\nveh1,0,-5\n"
        );
    }

    #[test]
    fn non_numeric_field_is_malformed() {
        let input = "vehicle_id;vehicle_routeLength;vehicle_depart;vehicle_arrival\nveh0;far;0;1\n";
        let err = read_route_stats(Cursor::new(input), "trips.csv").unwrap_err();
        assert!(matches!(err, MetricsError::Core(CtError::MalformedInput { line: 2, .. })), "{err}");
    }
}

// ── Per-vehicle counts ────────────────────────────────────────────────────────

#[cfg(test)]
mod vehicles {
    use super::helpers::{events, text};
    use crate::{number_changes, unique_sites, write_vehicle_counts, VehicleCount};

    fn pairs(rows: &[VehicleCount]) -> Vec<(&str, u64)> {
        rows.iter().map(|r| (r.vehicle_id.as_str(), r.count)).collect()
    }

    const LOG: &str = "a,0,S1,1,0,0\n\
                       b,0,,9000,0,0\n\
                       c,0,S1,1,0,0\n\
                       a,1,S2,1,0,0\n\
                       b,1,,9000,0,0\n\
                       c,1,S1,1,0,0\n\
                       a,2,,9000,0,0\n\
                       a,3,S1,1,0,0\n";

    #[test]
    fn unique_sites_skips_vehicles_without_a_site() {
        assert_eq!(pairs(&unique_sites(&events(LOG))), [("a", 2), ("c", 1)]);
    }

    #[test]
    fn changes_count_losses_and_list_zero() {
        // a: none→S1→S2→none→S1 = 4, c: none→S1 = 1, b: never associated.
        assert_eq!(pairs(&number_changes(&events(LOG))), [("a", 4), ("c", 1), ("b", 0)]);
    }

    #[test]
    fn ties_sort_by_vehicle_id() {
        let log = events("z,0,A,1,0,0\ny,0,B,1,0,0\nx,0,C,1,0,0\n");
        let mut out = Vec::new();
        write_vehicle_counts(&mut out, &unique_sites(&log)).unwrap();
        assert_eq!(text(out), "vehicle_id,count\nx,1\ny,1\nz,1\n");
    }
}

// ── Unmet locations ───────────────────────────────────────────────────────────

#[cfg(test)]
mod unmet {
    use std::collections::HashSet;
    use std::io::Cursor;

    use ct_core::SimTime;

    use super::helpers::{events, text};
    use crate::{lane_edge, read_edge_positions, unmet_locations, write_unmet_locations};

    const FCD: &str = "timestep_time;vehicle_id;vehicle_lane;vehicle_x;vehicle_y\n\
                       0.00;;;;\n\
                       1.00;v0;e1_0;7.60;45.00\n\
                       1.00;v1;e2_1;7.70;45.10\n\
                       2.00;v0;e1_1;7.61;45.01\n\
                       2.00;v1;:J3_0_0;7.80;45.20\n\
                       3.00;v1;e2_0;7.71;45.11\n";

    const LOG: &str = "v0,1,,3000,0,0\n\
                       v1,1,,3000,0,0\n\
                       v0,2,,3000,0,0\n\
                       v1,2,A,10,0,0\n\
                       v1,3,,3000,0,0\n\
                       v9,3,,3000,0,0\n";

    #[test]
    fn lane_suffix_is_stripped() {
        assert_eq!(lane_edge("e1_0"), "e1");
        assert_eq!(lane_edge(":J3_0_1"), ":J3_0");
        assert_eq!(lane_edge("plain"), "plain");
        assert_eq!(lane_edge("edge_"), "edge_");
    }

    #[test]
    fn reads_positions_and_skips_empty_timesteps() {
        let pos = read_edge_positions(Cursor::new(FCD), "fcd.csv").unwrap();
        assert_eq!(pos.len(), 5);
        assert_eq!(pos[0].time, SimTime::from_secs(1));
        assert_eq!(pos[0].edge_id, "e1");
        assert_eq!(pos[0].geo.lon, 7.60);
        assert_eq!(pos[0].geo.lat, 45.00);
    }

    #[test]
    fn edge_column_wins_over_lane() {
        let fcd = "timestep_time;vehicle_id;vehicle_edge;vehicle_lane;vehicle_x;vehicle_y\n\
                   1;v0;main;side_0;7;45\n";
        let pos = read_edge_positions(Cursor::new(fcd), "fcd.csv").unwrap();
        assert_eq!(pos[0].edge_id, "main");
    }

    #[test]
    fn aggregates_by_edge() {
        let positions = read_edge_positions(Cursor::new(FCD), "fcd.csv").unwrap();
        let rows = unmet_locations(&events(LOG), &positions);

        let edges: HashSet<_> = rows.iter().map(|r| r.edge_id.as_str()).collect();
        assert_eq!(edges.len(), rows.len());

        let mut out = Vec::new();
        write_unmet_locations(&mut out, &rows).unwrap();
        // e1: v0@1, v0@2 (first at 7.60/45.00); e2: v1@1, v1@3; v9 has no position.
        assert_eq!(text(out), "edge_id,lon,lat,count\ne1,7.6,45,2\ne2,7.7,45.1,2\n");
    }
}

// ── File-backed runs ──────────────────────────────────────────────────────────

#[cfg(test)]
mod analysis {
    use std::fs;

    use ct_core::CtError;

    use crate::{Analysis, MetricsError};

    const LOG: &str = "vehicle_id,timestamp,site_id,distance,x,y\n\
                       v0,10,A,1,0,0\n\
                       v1,10,A,1,0,0\n\
                       v2,10,B,1,0,0\n\
                       v0,11,,3000,0,0\n";

    #[test]
    fn rerun_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("events.csv");
        fs::write(&input, LOG).unwrap();

        for analysis in [Analysis::Users, Analysis::UniqueSites, Analysis::NumberChanges] {
            let first = dir.path().join(format!("out/{}_1.csv", analysis.name()));
            let second = dir.path().join(format!("out/{}_2.csv", analysis.name()));
            analysis.run(&[input.clone()], &first).unwrap();
            analysis.run(&[input.clone()], &second).unwrap();
            assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
        }

        assert_eq!(
            fs::read_to_string(dir.path().join("out/users_1.csv")).unwrap(),
            "timestamp,site_id,number_vehicles\n10,A,2\n10,B,1\n"
        );
    }

    #[test]
    fn new_sites_needs_two_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("events.csv");
        fs::write(&input, LOG).unwrap();
        let err = Analysis::NewSites.run(&[input], &dir.path().join("o.csv")).unwrap_err();
        assert!(matches!(err, MetricsError::Core(CtError::Config(_))));
    }

    #[test]
    fn new_sites_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("events.csv");
        let fcd = dir.path().join("fcd.csv");
        fs::write(&log, LOG).unwrap();
        fs::write(&fcd, "timestep_time;vehicle_id;vehicle_edge;vehicle_x;vehicle_y\n11.00;v0;e7;7.5;45.5\n").unwrap();

        let out = dir.path().join("unmet.csv");
        assert_eq!(Analysis::NewSites.run(&[log, fcd], &out).unwrap(), 1);
        assert_eq!(fs::read_to_string(&out).unwrap(), "edge_id,lon,lat,count\ne7,7.5,45.5,1\n");
    }

    #[test]
    fn missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Analysis::Users
            .run(&[dir.path().join("absent.csv")], &dir.path().join("o.csv"))
            .unwrap_err();
        assert!(matches!(err, MetricsError::Output(_)));
    }
}
