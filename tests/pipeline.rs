use std::fs;
use std::path::Path;

use chrono::{Days, NaiveDate};
use pitchside::data::filter::filter_dataset;
use pitchside::data::loader::{load_category, load_file};
use pitchside::data::roster::Position;
use pitchside::data::schema::{columns, FromTable, SessionRecord};
use pitchside::{Dashboard, DashboardConfig, Population, Selection, Snapshot, SpeedZone, TimeFrame};

const D: &str = "2020-02-03";
const D1: &str = "2020-02-04";
const D5: &str = "2020-02-08";

fn session_csv(rows: &[(&str, &str, &str, f64)]) -> String {
    let mut out = SessionRecord::REQUIRED.join(",");
    out.push('\n');
    for (name, date, lap, hr_max) in rows {
        let cells: Vec<String> = SessionRecord::REQUIRED
            .iter()
            .map(|col| match *col {
                columns::ATHLETE => name.to_string(),
                columns::DATE => date.to_string(),
                columns::LAP_TIME => lap.to_string(),
                columns::HR_MAX => hr_max.to_string(),
                columns::POWER => "150.5".to_string(),
                _ => "12".to_string(),
            })
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

fn write_tree(root: &Path) {
    let seances = root.join("Seances");
    let rpe = root.join("RPE");
    fs::create_dir(&seances).unwrap();
    fs::create_dir(&rpe).unwrap();

    fs::write(
        seances.join("20200203.csv"),
        session_csv(&[
            ("Lea", D, "1:02:03", 181.0),
            ("Zoe", D1, "58:10", 0.0),
            ("Guest", D5, "1:00:00", 175.0),
        ]),
    )
    .unwrap();
    fs::write(
        seances.join("20200208.csv"),
        session_csv(&[
            ("Lea", D5, "1:10:00", 190.0),
            ("Zoe", D5, "0:55:00", 185.0),
            ("Ina", D1, "0:50:00", 170.0),
        ]),
    )
    .unwrap();
    fs::write(
        rpe.join("a.csv"),
        format!("Nom,Date,RpeMenAp,RpePhyAp\nLea,{D5},4,7\nZoe,{D5},6,5\nGuest,{D5},2,2\n"),
    )
    .unwrap();
    fs::write(
        root.join("postes.csv"),
        "Id,Nom,Position\n1,Lea,AV\n2,Zoe,AR\n3,Ina,AR\n",
    )
    .unwrap();
}

fn config(root: &Path) -> DashboardConfig {
    DashboardConfig {
        data_root: root.to_path_buf(),
        roster_file: root.join("postes.csv"),
        processed_dir: root.join("_processed"),
        ..Default::default()
    }
}

#[test]
fn window_scenario_over_two_files() {
    let tmp = tempfile::tempdir().unwrap();
    write_tree(tmp.path());
    let snapshot = Snapshot::load(&config(tmp.path())).unwrap();

    let sessions = &snapshot.sessions;
    assert_eq!(sessions.len(), 6);
    // file order, then row order
    let names: Vec<_> = sessions.iter().map(|r| r.athlete.as_str()).collect();
    assert_eq!(names, vec!["Lea", "Zoe", "Guest", "Lea", "Zoe", "Ina"]);
    assert_eq!(sessions[0].lap_time, Some(3723));

    assert_eq!(filter_dataset(sessions, 7, None).len(), 6);

    let last = filter_dataset(sessions, 0, None);
    let d5 = NaiveDate::from_ymd_opt(2020, 2, 8).unwrap();
    assert_eq!(last.len(), 3);
    assert!(last.iter().all(|r| r.date == d5));
    assert_eq!(last.latest_date(), Some(d5));
    assert_eq!(d5 - Days::new(5), NaiveDate::from_ymd_opt(2020, 2, 3).unwrap());
}

#[test]
fn unmatched_athletes_only_leave_group_views() {
    let tmp = tempfile::tempdir().unwrap();
    write_tree(tmp.path());
    let snapshot = Snapshot::load(&config(tmp.path())).unwrap();

    let guest = snapshot.sessions.iter().find(|r| r.athlete == "Guest").unwrap();
    assert_eq!(guest.position, None);

    let everyone = filter_dataset(&snapshot.sessions, 31, None);
    assert!(everyone.iter().any(|r| r.athlete == "Guest"));
    let backs = filter_dataset(&snapshot.sessions, 31, Some(Position::Backs));
    assert_eq!(backs.len(), 3);
    assert!(backs.iter().all(|r| r.position == Some(Position::Backs)));
}

#[test]
fn blank_athlete_row_does_not_stop_the_load() {
    let tmp = tempfile::tempdir().unwrap();
    write_tree(tmp.path());
    fs::write(
        tmp.path().join("Seances").join("20200209.csv"),
        session_csv(&[("Lea", D5, "1:00:00", 180.0), ("", D5, "1:00:00", 178.0)]),
    )
    .unwrap();

    let snapshot = Snapshot::load(&config(tmp.path())).unwrap();
    assert_eq!(snapshot.sessions.len(), 8);

    let everyone = filter_dataset(&snapshot.sessions, 31, None);
    let blank: Vec<_> = everyone.iter().filter(|r| r.athlete.is_empty()).collect();
    assert_eq!(blank.len(), 1);
    assert_eq!(blank[0].position, None);

    for group in [Position::Forwards, Position::Backs] {
        let view = filter_dataset(&snapshot.sessions, 31, Some(group));
        assert!(view.iter().all(|r| !r.athlete.is_empty()));
    }
}

#[test]
fn processed_export_reloads_identically() {
    let tmp = tempfile::tempdir().unwrap();
    write_tree(tmp.path());
    let processed = tmp.path().join("_processed");

    let table = load_category(tmp.path(), "Seances", Some(&processed)).unwrap();
    let reloaded = load_file(&processed.join("Seances.csv")).unwrap();
    assert_eq!(reloaded, table);

    let rpe = load_category(tmp.path(), "RPE", Some(&processed)).unwrap();
    assert_eq!(load_file(&processed.join("RPE.csv")).unwrap(), rpe);
}

#[test]
fn renamed_column_fails_before_serving() {
    let tmp = tempfile::tempdir().unwrap();
    write_tree(tmp.path());
    let rpe = tmp.path().join("RPE").join("a.csv");
    fs::write(&rpe, format!("Nom,Date,Mental,RpePhyAp\nLea,{D5},4,7\n")).unwrap();

    let err = Snapshot::load(&config(tmp.path())).unwrap_err();
    let typed = err.downcast_ref::<pitchside::PipelineError>().expect("typed error");
    assert!(matches!(
        typed,
        pitchside::PipelineError::MissingColumn(c) if c == columns::MENTAL_FATIGUE
    ));
}

#[test]
fn dashboard_report_reads_the_shared_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    write_tree(tmp.path());
    let mut cfg = config(tmp.path());
    cfg.save_processed = false;
    let dashboard = Dashboard::new(Snapshot::load(&cfg).unwrap());

    let sel = Selection::new(TimeFrame::Short, Population::All);
    let report = dashboard.report(sel, SpeedZone::Run, 0, 10);
    assert_eq!(report.summary.mental_fatigue, Some(4.0));
    assert_eq!(report.summary.hr_max, Some(183.33));
    assert_eq!(report.table.total_rows, 3);
    assert!(!tmp.path().join("_processed").exists());

    let forwards = dashboard.summary(Selection::new(TimeFrame::Long, Population::Forwards));
    assert_eq!(forwards.physical_rpe, Some(7.0));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["selection"]["population"], "ALL");
    assert_eq!(json["speed_zone_bars"]["zone"], "DPZV14e19");
}

#[test]
fn handlers_run_concurrently_on_one_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    write_tree(tmp.path());
    let snapshot = Snapshot::load(&config(tmp.path())).unwrap();

    let handles: Vec<_> = Population::ALL
        .into_iter()
        .map(|population| {
            let dashboard = Dashboard::new(snapshot.clone());
            std::thread::spawn(move || {
                dashboard
                    .summary(Selection::new(TimeFrame::Long, population))
                    .physical_rpe
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![Some(4.67), Some(7.0), Some(5.0)]);
}
