//! Integration tests for ct-output.

#[cfg(test)]
mod helpers {
    use ct_core::{SimTime, SiteIdx, VehicleId, XyPoint};
    use ct_sim::AssociationEvent;

    pub fn event(vehicle: &str, secs_milli: u64, site: Option<u32>, distance: f64) -> AssociationEvent {
        AssociationEvent {
            vehicle: VehicleId::from(vehicle),
            time:    SimTime(secs_milli),
            site:    site.map(SiteIdx),
            distance,
            pos:     XyPoint::new(12.5, -3.0),
        }
    }

    pub fn labels() -> Vec<String> {
        vec!["A".into(), "B".into()]
    }
}

// ── Event log ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod event_log {
    use std::io::Cursor;

    use tempfile::TempDir;

    use ct_core::{CtError, SimTime};
    use ct_sim::EventSink;

    use super::helpers::{event, labels};
    use crate::{read_events, read_events_from, CsvEventWriter, OutputError};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn header_and_rows() {
        let mut w = CsvEventWriter::from_writer(Vec::new(), labels()).unwrap();
        w.append(&[event("v0", 10_000, Some(1), 120.5), event("v1", 10_500, None, 2_500.0)])
            .unwrap();
        w.finish().unwrap();
        assert_eq!(w.rows_written(), 2);

        let text = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "vehicle_id,timestamp,site_id,distance,x,y\n\
             v0,10,B,120.5,12.5,-3\n\
             v1,10.5,,2500,12.5,-3\n"
        );
    }

    #[test]
    fn unknown_site_index_is_rejected() {
        let mut w = CsvEventWriter::from_writer(Vec::new(), labels()).unwrap();
        let err = w.append(&[event("v0", 0, Some(7), 1.0)]).unwrap_err();
        assert!(matches!(err, OutputError::UnknownSite(7)));
    }

    #[test]
    fn bad_site_in_a_batch_writes_nothing() {
        let dir = tmp();
        let path = dir.path().join("events.csv");
        {
            let mut w = CsvEventWriter::create(&path, labels()).unwrap();
            w.append(&[event("v0", 0, Some(0), 1.0)]).unwrap();
            let batch = [event("v1", 1_000, Some(1), 1.0), event("v2", 1_000, Some(9), 1.0)];
            assert!(w.append(&batch).is_err());
            assert_eq!(w.rows_written(), 1);
        }
        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].vehicle.as_str(), "v0");
    }

    #[test]
    fn rows_are_on_disk_after_each_append() {
        let dir = tmp();
        let path = dir.path().join("nested/out/events.csv");
        let mut w = CsvEventWriter::create(&path, labels()).unwrap();
        w.append(&[event("v0", 0, Some(0), 1.0)]).unwrap();

        // Not finished yet: the batch must already be readable.
        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].site.as_deref(), Some("A"));
    }

    #[test]
    fn finish_is_idempotent() {
        let dir = tmp();
        let mut w = CsvEventWriter::create(&dir.path().join("e.csv"), labels()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn read_back_typed() {
        let dir = tmp();
        let path = dir.path().join("events.csv");
        let mut w = CsvEventWriter::create(&path, labels()).unwrap();
        w.append(&[event("flow_0.1", 2_100, None, f64::INFINITY)]).unwrap();
        w.finish().unwrap();

        let events = read_events(&path).unwrap();
        assert_eq!(events[0].vehicle.as_str(), "flow_0.1");
        assert_eq!(events[0].time, SimTime(2_100));
        assert_eq!(events[0].site, None);
        assert_eq!(events[0].distance, f64::INFINITY);
    }

    #[test]
    fn malformed_row_names_line() {
        let log = "vehicle_id,timestamp,site_id,distance,x,y\n\
                   v0,1,A,10,0,0\n\
                   v1,soon,A,10,0,0\n";
        let err = read_events_from(Cursor::new(log), "events.csv").unwrap_err();
        assert!(
            matches!(err, OutputError::Core(CtError::MalformedInput { line: 3, .. })),
            "{err}"
        );
    }

    #[test]
    fn negative_timestamp_is_malformed() {
        let log = "vehicle_id,timestamp,site_id,distance,x,y\nv0,-1,A,10,0,0\n";
        let err = read_events_from(Cursor::new(log), "events.csv").unwrap_err();
        assert!(matches!(err, OutputError::Core(CtError::MalformedInput { line: 2, .. })));
    }
}

// ── Site tables ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod site_tables {
    use ct_core::{GeoPoint, XyPoint};
    use ct_spatial::{CellSite, ExtractedSite, SiteCatalog};

    use crate::{write_extracted_sites, write_site_positions};

    #[test]
    fn site_positions_with_and_without_geo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites_pos.csv");
        let cat = SiteCatalog::from_sites(vec![
            CellSite { id: "0".into(), geo: None, pos: XyPoint::new(10.0, 20.0) },
            CellSite { id: "1".into(), geo: Some(GeoPoint::new(45.5, 7.25)), pos: XyPoint::new(1.0, 2.0) },
        ])
        .unwrap();
        write_site_positions(&path, &cat).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, ["site_id", "x", "y", "lat", "long"]);
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][0], "0");
        assert_eq!(&rows[0][3], "");
        assert_eq!(&rows[1][3], "45.5");
        assert_eq!(&rows[1][4], "7.25");
    }

    #[test]
    fn extracted_sites_load_as_catalog_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/turin.csv");
        let sites = vec![ExtractedSite {
            node_id:   "10".into(),
            cell_lat:  45.07,
            cell_long: 7.68,
            site_name: "TORINO CENTRO".into(),
        }];
        write_extracted_sites(&path, &sites).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "node_id,cell_lat,cell_long,site_name\n10,45.07,7.68,TORINO CENTRO\n");
    }

    #[test]
    fn empty_extraction_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.csv");
        write_extracted_sites(&path, &[]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "node_id,cell_lat,cell_long,site_name\n"
        );
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer {
    use ct_core::{SimTime, Tick};
    use ct_sim::{RunSummary, SimObserver};

    use super::helpers::event;
    use crate::ProgressLogger;

    #[test]
    fn logger_accepts_any_interval() {
        for interval in [0, 1, 3] {
            let mut p = ProgressLogger::new(interval);
            for t in 0..5 {
                p.on_step_end(Tick(t), SimTime::from_secs(t), &[event("v", t * 1_000, None, 1.0)]);
            }
            p.on_sim_end(&RunSummary::default());
        }
    }
}

// ── End to end ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod replay_to_csv {
    use std::io::Cursor;

    use ct_core::{SimConfig, XyPoint};
    use ct_sim::{FcdReplay, SimBuilder};
    use ct_spatial::{CellSite, RTreeResolver, SiteCatalog};

    use crate::{read_events, CsvEventWriter, ProgressLogger};

    const TRACE: &str = r#"<fcd-export>
    <timestep time="0.00">
        <vehicle id="veh0" x="100.00" y="0.00"/>
    </timestep>
    <timestep time="1.00">
        <vehicle id="veh0" x="600.00" y="0.00"/>
        <vehicle id="veh1" x="5000.00" y="0.00"/>
    </timestep>
</fcd-export>
"#;

    #[test]
    fn replayed_trace_lands_in_the_log() {
        let catalog = SiteCatalog::from_sites(vec![
            CellSite { id: "A".into(), geo: None, pos: XyPoint::new(0.0, 0.0) },
            CellSite { id: "B".into(), geo: None, pos: XyPoint::new(1000.0, 0.0) },
        ])
        .unwrap();
        let mut config = SimConfig::with_threshold(500.0);
        config.end_time = None;

        let resolver = RTreeResolver::new(&catalog);
        let controller = FcdReplay::new(Cursor::new(TRACE), false);
        let mut sim = SimBuilder::new(config, controller, resolver).build().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let mut writer = CsvEventWriter::create(&path, catalog.labels()).unwrap();
        let summary = sim.run(&mut writer, &mut ProgressLogger::new(1)).unwrap();
        assert_eq!(summary.events, 3);

        let events = read_events(&path).unwrap();
        let rows: Vec<_> = events
            .iter()
            .map(|e| (e.vehicle.as_str(), e.time.as_millis(), e.site.as_deref()))
            .collect();
        assert_eq!(
            rows,
            [("veh0", 0, Some("A")), ("veh0", 1_000, Some("B")), ("veh1", 1_000, None)]
        );
        assert_eq!(events[1].distance, 400.0);
    }
}
